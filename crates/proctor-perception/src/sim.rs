//! Scripted classifiers for headless tests and demos.
//!
//! A [`Script`] maps a frame's `seq` to an output. Scripts are built from
//! runs of repeated values, which reads naturally when each tick delivers
//! one frame:
//!
//! ```rust
//! use proctor_perception::sim::Script;
//! use proctor_types::MobileLabel;
//!
//! // 3 ticks with a phone in view, then 2 without, then hold the last value.
//! let script = Script::runs([(MobileLabel::Present, 3), (MobileLabel::Absent, 2)]);
//! assert_eq!(script.at(2), Some(&MobileLabel::Present));
//! assert_eq!(script.at(3), Some(&MobileLabel::Absent));
//! assert_eq!(script.at(100), Some(&MobileLabel::Absent));
//! ```

use proctor_hal::Frame;
use proctor_types::{GazeLabel, MobileLabel, PoseAngles};

use crate::classifier::{Classification, GazeClassifier, HeadPoseClassifier, MobileClassifier};

/// What a script does once `seq` runs past its last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEnd {
    /// Keep returning the final step.
    Hold,
    /// Start again from the first step.
    Cycle,
}

/// A sequence of per-frame outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Script<T> {
    steps: Vec<T>,
    end: ScriptEnd,
}

impl<T: Clone> Script<T> {
    pub fn new(steps: Vec<T>, end: ScriptEnd) -> Self {
        Self { steps, end }
    }

    /// Expand `(value, count)` runs into a holding script.
    pub fn runs(runs: impl IntoIterator<Item = (T, usize)>) -> Self {
        let steps = runs
            .into_iter()
            .flat_map(|(value, count)| std::iter::repeat_n(value, count))
            .collect();
        Self::new(steps, ScriptEnd::Hold)
    }

    /// Return the same value forever.
    pub fn constant(value: T) -> Self {
        Self::new(vec![value], ScriptEnd::Hold)
    }

    /// Switch to cycling once the steps are exhausted.
    pub fn cycling(mut self) -> Self {
        self.end = ScriptEnd::Cycle;
        self
    }

    /// Output for frame `seq`, `None` only for an empty script.
    pub fn at(&self, seq: u64) -> Option<&T> {
        let len = self.steps.len();
        if len == 0 {
            return None;
        }
        let idx = usize::try_from(seq).unwrap_or(usize::MAX);
        match self.end {
            ScriptEnd::Hold => self.steps.get(idx.min(len - 1)),
            ScriptEnd::Cycle => self.steps.get(idx % len),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted adapters
// ────────────────────────────────────────────────────────────────────────────

/// Gaze classifier driven by a [`Script`]. Empty scripts look at the screen.
#[derive(Debug, Clone)]
pub struct ScriptedGaze(pub Script<GazeLabel>);

impl GazeClassifier for ScriptedGaze {
    fn classify(&mut self, frame: Frame) -> Classification<GazeLabel> {
        let label = self.0.at(frame.seq).copied().unwrap_or(GazeLabel::LookingAtScreen);
        Classification { frame, label }
    }
}

/// Head-pose estimator driven by a [`Script`] of raw angles (`None` = no face).
#[derive(Debug, Clone)]
pub struct ScriptedHeadPose(pub Script<Option<PoseAngles>>);

impl HeadPoseClassifier for ScriptedHeadPose {
    fn estimate(&mut self, frame: &Frame) -> Option<PoseAngles> {
        self.0.at(frame.seq).copied().flatten()
    }
}

/// Mobile detector driven by a [`Script`]. Empty scripts see no phone.
#[derive(Debug, Clone)]
pub struct ScriptedMobile(pub Script<MobileLabel>);

impl MobileClassifier for ScriptedMobile {
    fn classify(&mut self, frame: Frame) -> Classification<MobileLabel> {
        let label = self.0.at(frame.seq).copied().unwrap_or(MobileLabel::Absent);
        Classification { frame, label }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_types::HeadLabel;

    fn frame(seq: u64) -> Frame {
        Frame {
            seq,
            width: 1,
            height: 1,
            data: vec![],
        }
    }

    #[test]
    fn cycling_script_wraps() {
        let s = Script::runs([(1, 2), (2, 1)]).cycling();
        let got: Vec<_> = (0..6).map(|i| *s.at(i).expect("non-empty")).collect();
        assert_eq!(got, vec![1, 1, 2, 1, 1, 2]);
    }

    #[test]
    fn empty_script_falls_back_to_no_detection() {
        let mut gaze = ScriptedGaze(Script::new(vec![], ScriptEnd::Hold));
        assert_eq!(gaze.classify(frame(0)).label, GazeLabel::LookingAtScreen);
        let mut mobile = ScriptedMobile(Script::new(vec![], ScriptEnd::Hold));
        assert_eq!(mobile.classify(frame(0)).label, MobileLabel::Absent);
    }

    #[test]
    fn scripted_head_pose_feeds_default_classify() {
        let mut head = ScriptedHeadPose(Script::runs([
            (None, 1),
            (Some(PoseAngles::new(0.0, 40.0, 0.0)), 1),
        ]));
        assert_eq!(head.estimate(&frame(0)), None);
        assert_eq!(head.classify(frame(1), None).label, HeadLabel::Right);
    }
}
