//! `proctor-perception` – Classifier boundary and calibration.
//!
//! The per-frame classifiers themselves are external; this crate fixes their
//! contract and owns the little bit of perception logic the session needs on
//! top of them.
//!
//! # Modules
//!
//! - [`classifier`] – [`GazeClassifier`][classifier::GazeClassifier],
//!   [`HeadPoseClassifier`][classifier::HeadPoseClassifier] and
//!   [`MobileClassifier`][classifier::MobileClassifier]: frame in,
//!   annotated frame plus discrete label out.
//! - [`head_pose`] – [`HeadPoseThresholds`][head_pose::HeadPoseThresholds]:
//!   maps raw angles to a [`HeadLabel`][proctor_types::HeadLabel] relative
//!   to the session baseline, or to the sentinel neutral when uncalibrated.
//! - [`calibration`] – [`CalibrationEngine`][calibration::CalibrationEngine]:
//!   accumulates raw head-pose samples over a fixed window and averages them
//!   into a [`Baseline`][proctor_types::Baseline].
//! - [`sim`] – scripted classifiers keyed on frame sequence numbers.

pub mod calibration;
pub mod classifier;
pub mod head_pose;
pub mod sim;

pub use calibration::CalibrationEngine;
pub use classifier::{Classification, GazeClassifier, HeadPoseClassifier, MobileClassifier};
pub use head_pose::HeadPoseThresholds;
