//! In-process simulation devices for headless tests and demos.
//!
//! These stand in for the webcam, the UI window, and the evidence directory
//! so a full session can run without any hardware.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use proctor_hal::clock::ManualClock;
//! use proctor_hal::input::{InputEvent, InputSource};
//! use proctor_hal::sim::ScriptedInput;
//!
//! let clock = ManualClock::new();
//! let mut input = ScriptedInput::new(clock.clone())
//!     .at(Duration::from_millis(250), InputEvent::Select(2));
//!
//! assert_eq!(input.poll(Duration::from_millis(200)), InputEvent::Timeout);
//! assert_eq!(input.poll(Duration::from_millis(200)), InputEvent::Select(2));
//! assert_eq!(clock.elapsed(), Duration::from_millis(250));
//! ```

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use proctor_types::ProctorError;

use crate::camera::{Camera, Frame};
use crate::clock::ManualClock;
use crate::evidence::{EvidenceSink, artifact_name};
use crate::input::{InputEvent, InputSource};

// ────────────────────────────────────────────────────────────────────────────
// Stub camera
// ────────────────────────────────────────────────────────────────────────────

/// A simulated camera that returns a blank 4×4 greyscale frame per capture.
///
/// Frame `seq` counts capture attempts, so scripted classifiers keyed on
/// `seq` stay aligned with ticks even when some captures are dropped.
#[derive(Debug, Clone)]
pub struct SimCamera {
    id: String,
    opened: bool,
    next_seq: u64,
    dropped: BTreeSet<u64>,
}

impl SimCamera {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            opened: true,
            next_seq: 0,
            dropped: BTreeSet::new(),
        }
    }

    /// A camera that failed to open.
    pub fn unavailable(id: impl Into<String>) -> Self {
        Self {
            opened: false,
            ..Self::new(id)
        }
    }

    /// Fail the capture attempts with these sequence numbers.
    pub fn dropping(mut self, seqs: impl IntoIterator<Item = u64>) -> Self {
        self.dropped.extend(seqs);
        self
    }
}

impl Camera for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_opened(&self) -> bool {
        self.opened
    }

    fn capture(&mut self) -> Result<Frame, ProctorError> {
        if !self.opened {
            return Err(ProctorError::DeviceUnavailable {
                device: self.id.clone(),
                details: "camera not opened".to_string(),
            });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.dropped.contains(&seq) {
            return Err(ProctorError::CaptureFailed {
                device: self.id.clone(),
                details: format!("simulated drop of frame {seq}"),
            });
        }
        Ok(Frame {
            seq,
            width: 4,
            height: 4,
            data: vec![0u8; 16],
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted input
// ────────────────────────────────────────────────────────────────────────────

/// Replays input events at fixed virtual times and advances a shared
/// [`ManualClock`] on every poll, as if the poll had really waited.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    clock: ManualClock,
    events: VecDeque<(Duration, InputEvent)>,
}

impl ScriptedInput {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            events: VecDeque::new(),
        }
    }

    /// Deliver `event` once virtual time reaches `offset`.
    pub fn at(mut self, offset: Duration, event: InputEvent) -> Self {
        let pos = self.events.partition_point(|(t, _)| *t <= offset);
        self.events.insert(pos, (offset, event));
        self
    }

    /// Number of events not yet delivered.
    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, timeout: Duration) -> InputEvent {
        let now = self.clock.elapsed();
        if let Some(&(at, event)) = self.events.front()
            && at <= now + timeout
        {
            if at > now {
                self.clock.advance(at - now);
            }
            self.events.pop_front();
            return event;
        }
        self.clock.advance(timeout);
        InputEvent::Timeout
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory evidence sink
// ────────────────────────────────────────────────────────────────────────────

/// An artifact captured by [`MemoryEvidenceSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub name: String,
    pub reason: String,
    pub frame_seq: u64,
}

/// Keeps artifacts in memory. Clones share storage so a test can inspect
/// what a session persisted after handing the sink over.
#[derive(Debug, Clone, Default)]
pub struct MemoryEvidenceSink {
    stored: Arc<Mutex<Vec<StoredArtifact>>>,
    failing: bool,
}

impl MemoryEvidenceSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every write fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn artifacts(&self) -> Vec<StoredArtifact> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EvidenceSink for MemoryEvidenceSink {
    fn persist(
        &mut self,
        frame: &Frame,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<String, ProctorError> {
        if self.failing {
            return Err(ProctorError::Evidence("simulated write failure".to_string()));
        }
        let name = artifact_name(reason, at);
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(StoredArtifact {
                name: name.clone(),
                reason: reason.to_string(),
                frame_seq: frame.seq,
            });
        Ok(name)
    }
}
