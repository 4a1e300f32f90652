//! Classifier adapter contract.
//!
//! Each adapter takes a frame by value, may draw on it, and hands it back
//! together with one discrete label. Adapters are chained gaze → head →
//! mobile so the frame that reaches the evidence sink carries every overlay.
//!
//! Adapters must not block longer than one tick and must return their
//! no-detection label instead of failing when nothing is found.

use proctor_hal::Frame;
use proctor_types::{Baseline, GazeLabel, HeadLabel, MobileLabel, PoseAngles};

use crate::head_pose::HeadPoseThresholds;

/// Output of a classifier: the (possibly annotated) frame and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification<L> {
    pub frame: Frame,
    pub label: L,
}

pub trait GazeClassifier {
    /// Classify gaze direction. No eyes found → [`GazeLabel::LookingAtScreen`].
    fn classify(&mut self, frame: Frame) -> Classification<GazeLabel>;
}

pub trait HeadPoseClassifier {
    /// Raw head orientation, or `None` when no face is detected.
    fn estimate(&mut self, frame: &Frame) -> Option<PoseAngles>;

    /// Angle tolerances used by the default [`classify`][Self::classify].
    fn thresholds(&self) -> HeadPoseThresholds {
        HeadPoseThresholds::default()
    }

    /// Classify head direction relative to `baseline`, falling back to the
    /// sentinel neutral when the session is uncalibrated.
    fn classify(&mut self, frame: Frame, baseline: Option<&Baseline>) -> Classification<HeadLabel> {
        let label = match self.estimate(&frame) {
            Some(angles) => self.thresholds().direction(angles, baseline),
            None => HeadLabel::LookingAtScreen,
        };
        Classification { frame, label }
    }
}

pub trait MobileClassifier {
    fn classify(&mut self, frame: Frame) -> Classification<MobileLabel>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPose(Option<PoseAngles>);

    impl HeadPoseClassifier for FixedPose {
        fn estimate(&mut self, _frame: &Frame) -> Option<PoseAngles> {
            self.0
        }
    }

    fn frame() -> Frame {
        Frame {
            seq: 0,
            width: 1,
            height: 1,
            data: vec![9],
        }
    }

    #[test]
    fn no_face_is_no_detection_label() {
        let mut head = FixedPose(None);
        let out = head.classify(frame(), None);
        assert_eq!(out.label, HeadLabel::LookingAtScreen);
        assert_eq!(out.frame.data, vec![9]);
    }

    #[test]
    fn default_classify_uses_baseline() {
        let baseline =
            Baseline::from_samples(&[PoseAngles::new(0.0, 30.0, 0.0)]).expect("one sample");
        let mut head = FixedPose(Some(PoseAngles::new(0.0, 30.0, 0.0)));
        assert_eq!(head.classify(frame(), Some(&baseline)).label, HeadLabel::LookingAtScreen);
        // Uncalibrated: the same reading is far from the sentinel neutral.
        assert_eq!(head.classify(frame(), None).label, HeadLabel::Right);
    }
}
