//! UI/input event contract.
//!
//! The orchestrator calls [`InputSource::poll`] once at the top of every
//! tick. The wait inside `poll` is the only place a session blocks.

use std::time::Duration;

/// An event returned by [`InputSource::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Nothing happened within the timeout.
    Timeout,
    /// The candidate closed the window, pressed Skip, or hit Ctrl-C.
    Cancel,
    /// An answer option was chosen (zero-based).
    Select(usize),
    /// The candidate locked in the current answer before the countdown ends.
    Submit,
}

/// A source of UI events.
pub trait InputSource {
    /// Wait up to `timeout` for the next event.
    fn poll(&mut self, timeout: Duration) -> InputEvent;
}
