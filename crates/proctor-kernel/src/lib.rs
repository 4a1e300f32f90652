//! `proctor-kernel` – Gating & Debouncing
//!
//! The rule-enforcing core of the session controller. Nothing in here does
//! I/O or reads a clock: callers pass labels and instants in, and get
//! decisions out.
//!
//! # Modules
//!
//! - [`coverage_gate`] – [`CoverageGate`][coverage_gate::CoverageGate]:
//!   accumulates the distinct labels seen during an onboarding check and
//!   releases exactly once when every required label has been observed.
//! - [`debounce`] – [`ViolationDebounceEngine`][debounce::ViolationDebounceEngine]:
//!   one [`Debouncer`][debounce::Debouncer] per signal turning noisy
//!   per-frame deviations into at most one [`Violation`][debounce::Violation]
//!   per sustained deviation episode.

pub mod coverage_gate;
pub mod debounce;

pub use coverage_gate::{CoverageGate, EYE_CHECK_LABELS, HEAD_CHECK_LABELS};
pub use debounce::{Debouncer, EpisodeState, Violation, ViolationDebounceEngine};
