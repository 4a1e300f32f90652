//! [`CalibrationEngine`] – learns the candidate's neutral head orientation.
//!
//! The engine runs for a fixed wall-clock window. Every raw head-pose sample
//! offered while the window is open is accumulated; when the window closes
//! the coordinate-wise mean becomes the session [`Baseline`]. Zero samples
//! (face never detected) yields `None`, meaning "uncalibrated": callers keep
//! classifying against the sentinel neutral instead of failing.
//!
//! The engine never waits on its own; the orchestrator feeds it one sample
//! per tick and asks [`CalibrationEngine::is_complete`] at each tick, so
//! calibration can never block indefinitely.
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use proctor_perception::calibration::CalibrationEngine;
//! use proctor_types::PoseAngles;
//!
//! let t0 = Instant::now();
//! let mut engine = CalibrationEngine::new(Duration::from_secs(5), t0);
//! engine.offer(Some(PoseAngles::new(2.0, 0.0, 0.0)));
//! engine.offer(None);
//! engine.offer(Some(PoseAngles::new(4.0, 0.0, 0.0)));
//!
//! assert!(!engine.is_complete(t0 + Duration::from_secs(1)));
//! assert!(engine.is_complete(t0 + Duration::from_secs(5)));
//! let baseline = engine.finish().expect("two samples");
//! assert_eq!(baseline.samples(), 2);
//! ```

use std::time::{Duration, Instant};

use proctor_types::{Baseline, PoseAngles};
use tracing::{debug, info, warn};

/// Default calibration window.
pub const DEFAULT_CALIBRATION_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CalibrationEngine {
    window: Duration,
    started_at: Instant,
    samples: Vec<PoseAngles>,
}

impl CalibrationEngine {
    pub fn new(window: Duration, started_at: Instant) -> Self {
        Self {
            window,
            started_at,
            samples: Vec::new(),
        }
    }

    /// Offer the head-pose classifier's raw output for this tick.
    ///
    /// `None` (no face) and non-finite readings are ignored.
    pub fn offer(&mut self, sample: Option<PoseAngles>) {
        match sample {
            Some(angles) if angles.is_finite() => self.samples.push(angles),
            Some(angles) => debug!(?angles, "discarding non-finite calibration sample"),
            None => {}
        }
    }

    /// `true` once the window has fully elapsed at `now`.
    pub fn is_complete(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.window
    }

    /// Time left in the window at `now`.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.window
            .saturating_sub(now.saturating_duration_since(self.started_at))
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Close the window and produce the baseline, if any samples arrived.
    pub fn finish(self) -> Option<Baseline> {
        let baseline = Baseline::from_samples(&self.samples);
        match &baseline {
            Some(b) => info!(samples = b.samples(), angles = ?b.angles(), "calibration complete"),
            None => warn!("calibration collected no samples; continuing uncalibrated"),
        }
        baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_collected_samples() {
        let t0 = Instant::now();
        let mut engine = CalibrationEngine::new(DEFAULT_CALIBRATION_WINDOW, t0);
        engine.offer(Some(PoseAngles::new(1.0, 10.0, -2.0)));
        engine.offer(Some(PoseAngles::new(3.0, 20.0, 2.0)));
        engine.offer(Some(PoseAngles::new(5.0, 30.0, 0.0)));
        let b = engine.finish().expect("samples collected");
        assert!((b.angles().pitch - 3.0).abs() < 1e-5);
        assert!((b.angles().yaw - 20.0).abs() < 1e-5);
        assert!(b.angles().roll.abs() < 1e-5);
    }

    #[test]
    fn zero_samples_is_uncalibrated_not_an_error() {
        let t0 = Instant::now();
        let mut engine = CalibrationEngine::new(DEFAULT_CALIBRATION_WINDOW, t0);
        engine.offer(None);
        engine.offer(None);
        assert_eq!(engine.sample_count(), 0);
        assert!(engine.finish().is_none());
    }

    #[test]
    fn non_finite_samples_are_ignored() {
        let mut engine = CalibrationEngine::new(DEFAULT_CALIBRATION_WINDOW, Instant::now());
        engine.offer(Some(PoseAngles::new(f32::INFINITY, 0.0, 0.0)));
        engine.offer(Some(PoseAngles::new(1.0, 1.0, 1.0)));
        assert_eq!(engine.sample_count(), 1);
    }

    #[test]
    fn window_boundaries() {
        let t0 = Instant::now();
        let engine = CalibrationEngine::new(Duration::from_secs(5), t0);
        assert!(!engine.is_complete(t0 + Duration::from_millis(4_999)));
        assert!(engine.is_complete(t0 + Duration::from_secs(5)));
        assert_eq!(engine.remaining(t0 + Duration::from_secs(2)), Duration::from_secs(3));
        assert_eq!(engine.remaining(t0 + Duration::from_secs(9)), Duration::ZERO);
    }
}
