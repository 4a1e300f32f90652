//! `proctor-runtime` – The Session Engine
//!
//! Runs one proctoring session end to end on a single cooperative polling
//! loop.
//!
//! # Modules
//!
//! - [`session`] – [`Session`][session::Session]: the stage orchestrator
//!   that drives Calibrating → EyeCheck → HeadCheck → Quiz, wiring together
//!   the device traits from `proctor-hal`, the classifiers from
//!   `proctor-perception`, and the [`CoverageGate`] and
//!   [`ViolationDebounceEngine`] from `proctor-kernel`. Produces a
//!   [`SessionReport`][session::SessionReport].
//! - [`quiz`] – [`QuizEngine`][quiz::QuizEngine]: per-question countdowns
//!   where the last selection before timeout wins, plus the built-in
//!   question bank and JSON bank loading.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export.
//!
//! # Cancellation
//!
//! Cancellation is cooperative. The session checks for it once per tick,
//! right after the input wait and before any side effect, and reports the
//! stage it interrupted in [`SessionResult::Aborted`][proctor_types::SessionResult::Aborted].

pub mod quiz;
pub mod session;
pub mod telemetry;

pub use quiz::{QuizEngine, QuizStep, builtin_bank, load_bank};
pub use session::{Devices, NoopObserver, Session, SessionConfig, SessionObserver, SessionReport};
pub use telemetry::{TracerProviderGuard, init_tracing};

// Re-exported so callers can name the gate and debouncer types without an
// explicit dependency on proctor-kernel.
pub use proctor_kernel::{CoverageGate, ViolationDebounceEngine};
