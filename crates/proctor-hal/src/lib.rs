//! `proctor-hal` – Device boundary
//!
//! Everything the session controller touches outside its own memory goes
//! through a trait defined here, so the engine can run against real devices
//! or fully scripted ones.
//!
//! # Modules
//!
//! - [`camera`] – [`Camera`][camera::Camera]: frame source returning
//!   [`Frame`][camera::Frame]s; a failed capture means "no frame this tick".
//! - [`input`] – [`InputSource`][input::InputSource]: the UI event contract
//!   (`poll(timeout)`), yielding [`InputEvent`][input::InputEvent]s.
//! - [`evidence`] – [`EvidenceSink`][evidence::EvidenceSink]: persists a
//!   frame plus reason tag; [`DirEvidenceSink`][evidence::DirEvidenceSink]
//!   writes `{reason}_{unix_timestamp}.png` files.
//! - [`clock`] – [`Clock`][clock::Clock]: monotonic plus wall time, with a
//!   [`ManualClock`][clock::ManualClock] for deterministic runs.
//! - [`sim`] – scripted camera, input, and in-memory evidence sink for
//!   headless tests and demos.

pub mod camera;
pub mod clock;
pub mod evidence;
pub mod input;
pub mod sim;

pub use camera::{Camera, Frame};
pub use clock::{Clock, ManualClock, SystemClock};
pub use evidence::{DirEvidenceSink, EvidenceSink, artifact_name};
pub use input::{InputEvent, InputSource};
