//! Head-pose interpretation.
//!
//! Converts raw `(pitch, yaw, roll)` angles into a [`HeadLabel`] by
//! comparing them with a reference orientation:
//!
//! - the session [`Baseline`] when calibration collected samples,
//! - the sentinel [`PoseAngles::ZERO`] otherwise.
//!
//! A deviation counts once it exceeds the axis tolerance. When both yaw and
//! pitch exceed their tolerance, the axis with the larger deviation relative
//! to its tolerance decides the label. Positive yaw turns right, positive
//! pitch tilts up.
//!
//! # Example
//!
//! ```rust
//! use proctor_perception::head_pose::HeadPoseThresholds;
//! use proctor_types::{HeadLabel, PoseAngles};
//!
//! let t = HeadPoseThresholds::default();
//! assert_eq!(t.direction(PoseAngles::new(0.0, -25.0, 0.0), None), HeadLabel::Left);
//! assert_eq!(t.direction(PoseAngles::new(3.0, 4.0, 0.0), None), HeadLabel::LookingAtScreen);
//! ```

use proctor_types::{Baseline, HeadLabel, PoseAngles};

/// Per-axis tolerances, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPoseThresholds {
    pub yaw_deg: f32,
    pub pitch_deg: f32,
}

impl Default for HeadPoseThresholds {
    fn default() -> Self {
        Self {
            yaw_deg: 15.0,
            pitch_deg: 10.0,
        }
    }
}

impl HeadPoseThresholds {
    pub fn direction(&self, angles: PoseAngles, baseline: Option<&Baseline>) -> HeadLabel {
        if !angles.is_finite() {
            return HeadLabel::Other;
        }
        let reference = baseline.map_or(PoseAngles::ZERO, Baseline::angles);
        let d_yaw = angles.yaw - reference.yaw;
        let d_pitch = angles.pitch - reference.pitch;
        let n_yaw = d_yaw.abs() / self.yaw_deg;
        let n_pitch = d_pitch.abs() / self.pitch_deg;

        if n_yaw <= 1.0 && n_pitch <= 1.0 {
            HeadLabel::LookingAtScreen
        } else if n_yaw >= n_pitch {
            if d_yaw < 0.0 { HeadLabel::Left } else { HeadLabel::Right }
        } else if d_pitch > 0.0 {
            HeadLabel::Up
        } else {
            HeadLabel::Down
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn baseline(pitch: f32, yaw: f32) -> Baseline {
        Baseline::from_samples(&[PoseAngles::new(pitch, yaw, 0.0)]).expect("one sample")
    }

    #[test]
    fn four_directions_against_sentinel() {
        let t = HeadPoseThresholds::default();
        assert_eq!(t.direction(PoseAngles::new(0.0, -20.0, 0.0), None), HeadLabel::Left);
        assert_eq!(t.direction(PoseAngles::new(0.0, 20.0, 0.0), None), HeadLabel::Right);
        assert_eq!(t.direction(PoseAngles::new(15.0, 0.0, 0.0), None), HeadLabel::Up);
        assert_eq!(t.direction(PoseAngles::new(-15.0, 0.0, 0.0), None), HeadLabel::Down);
    }

    #[test]
    fn baseline_recenters_classification() {
        let t = HeadPoseThresholds::default();
        let b = baseline(-12.0, 8.0);
        // Slouched, slightly turned candidate looking straight at their own screen.
        let slouched = PoseAngles::new(-12.0, 8.0, 0.0);
        assert_eq!(t.direction(slouched, Some(&b)), HeadLabel::LookingAtScreen);
        assert_eq!(t.direction(slouched, None), HeadLabel::Down);
    }

    #[test]
    fn dominant_axis_wins() {
        let t = HeadPoseThresholds::default();
        // yaw 1.4x tolerance, pitch 2x tolerance → pitch wins
        assert_eq!(t.direction(PoseAngles::new(20.0, 21.0, 0.0), None), HeadLabel::Up);
        // yaw 3x tolerance, pitch 1.5x tolerance → yaw wins
        assert_eq!(t.direction(PoseAngles::new(-15.0, -45.0, 0.0), None), HeadLabel::Left);
    }

    #[test]
    fn non_finite_reading_is_other() {
        let t = HeadPoseThresholds::default();
        assert_eq!(t.direction(PoseAngles::new(f32::NAN, 0.0, 0.0), None), HeadLabel::Other);
    }

    proptest! {
        /// Any reading inside the tolerance box around the baseline is neutral.
        #[test]
        fn prop_within_tolerance_is_neutral(
            bp in -30.0f32..30.0,
            by in -30.0f32..30.0,
            dp in -10.0f32..=10.0,
            dy in -15.0f32..=15.0,
        ) {
            let t = HeadPoseThresholds::default();
            let b = baseline(bp, by);
            let reading =
                PoseAngles::new(b.angles().pitch + dp * 0.99, b.angles().yaw + dy * 0.99, 0.0);
            prop_assert_eq!(t.direction(reading, Some(&b)), HeadLabel::LookingAtScreen);
        }
    }
}
