//! [`ViolationDebounceEngine`] – turns noisy per-frame deviations into
//! durable violations.
//!
//! Each signal (gaze, head, mobile) runs its own [`Debouncer`], a three-state
//! machine:
//!
//! ```text
//!            deviating                 deviating, elapsed >= dwell
//! Neutral ─────────────▶ Pending ──────────────────────────────▶ Emitted
//!    ▲                      │                                       │
//!    └──────── neutral ─────┴────────────── neutral ────────────────┘
//! ```
//!
//! - A return to neutral is a hard reset from any state. Time spent deviating
//!   before the reset never counts towards the next episode.
//! - The tick that starts an episode only records its start time.
//! - `Pending → Emitted` emits exactly one [`Violation`]. An episode that
//!   keeps going, or changes between non-neutral labels, emits nothing more.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use proctor_kernel::debounce::ViolationDebounceEngine;
//! use proctor_types::{Label, MobileLabel};
//!
//! let mut engine = ViolationDebounceEngine::new(Duration::from_secs(3));
//! let t0 = Instant::now();
//! let phone = Label::Mobile(MobileLabel::Present);
//!
//! assert!(engine.on_signal_update(phone, t0).is_none());
//! assert!(engine.on_signal_update(phone, t0 + Duration::from_secs(2)).is_none());
//! assert!(engine.on_signal_update(phone, t0 + Duration::from_secs(3)).is_some());
//! assert!(engine.on_signal_update(phone, t0 + Duration::from_secs(9)).is_none());
//! ```

use std::time::{Duration, Instant};

use proctor_types::{Label, SignalId};
use tracing::{debug, info};

/// Default dwell threshold.
pub const DEFAULT_DWELL: Duration = Duration::from_secs(3);

/// Per-signal episode state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    Neutral,
    /// Deviating since `since`, no artifact yet.
    Pending { since: Instant },
    /// Deviating since `since`, artifact already emitted for this episode.
    Emitted { since: Instant },
}

impl EpisodeState {
    pub fn is_deviating(&self) -> bool {
        !matches!(self, EpisodeState::Neutral)
    }
}

/// Debounce state machine for a single signal.
#[derive(Debug, Clone)]
pub struct Debouncer {
    dwell: Duration,
    state: EpisodeState,
}

impl Debouncer {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            state: EpisodeState::Neutral,
        }
    }

    /// Advance the state machine. Returns the episode start time on the
    /// single update that crosses the dwell threshold.
    pub fn update(&mut self, deviating: bool, now: Instant) -> Option<Instant> {
        if !deviating {
            self.state = EpisodeState::Neutral;
            return None;
        }
        match self.state {
            EpisodeState::Neutral => {
                self.state = EpisodeState::Pending { since: now };
                None
            }
            EpisodeState::Pending { since }
                if now.saturating_duration_since(since) >= self.dwell =>
            {
                self.state = EpisodeState::Emitted { since };
                Some(since)
            }
            EpisodeState::Pending { .. } | EpisodeState::Emitted { .. } => None,
        }
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }
}

/// A debounced violation, ready to be persisted with the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    /// Label observed on the tick the dwell threshold was crossed.
    pub label: Label,
    pub episode_started: Instant,
    pub detected_at: Instant,
}

impl Violation {
    pub fn signal(&self) -> SignalId {
        self.label.signal()
    }

    pub fn reason_tag(&self) -> String {
        self.label.reason_tag()
    }
}

/// The three per-signal debouncers of one session.
#[derive(Debug, Clone)]
pub struct ViolationDebounceEngine {
    gaze: Debouncer,
    head: Debouncer,
    mobile: Debouncer,
}

impl ViolationDebounceEngine {
    /// Same dwell threshold for every signal.
    pub fn new(dwell: Duration) -> Self {
        Self {
            gaze: Debouncer::new(dwell),
            head: Debouncer::new(dwell),
            mobile: Debouncer::new(dwell),
        }
    }

    /// Override the dwell threshold for one signal, resetting its episode.
    pub fn with_dwell(mut self, signal: SignalId, dwell: Duration) -> Self {
        *self.debouncer_mut(signal) = Debouncer::new(dwell);
        self
    }

    /// Feed one classified label. The label's own neutral predicate decides
    /// whether it continues, starts, or ends a deviation episode.
    pub fn on_signal_update(&mut self, label: Label, now: Instant) -> Option<Violation> {
        let signal = label.signal();
        let debouncer = self.debouncer_mut(signal);
        let was_deviating = debouncer.state().is_deviating();
        let fired = debouncer.update(!label.is_neutral(), now);

        match (was_deviating, debouncer.state().is_deviating()) {
            (false, true) => debug!(signal = %signal, ?label, "deviation episode started"),
            (true, false) => debug!(signal = %signal, "signal back to neutral"),
            _ => {}
        }

        fired.map(|episode_started| {
            info!(signal = %signal, ?label, "violation detected");
            Violation {
                label,
                episode_started,
                detected_at: now,
            }
        })
    }

    pub fn state(&self, signal: SignalId) -> EpisodeState {
        self.debouncer(signal).state()
    }

    fn debouncer(&self, signal: SignalId) -> &Debouncer {
        match signal {
            SignalId::Gaze => &self.gaze,
            SignalId::Head => &self.head,
            SignalId::Mobile => &self.mobile,
        }
    }

    fn debouncer_mut(&mut self, signal: SignalId) -> &mut Debouncer {
        match signal {
            SignalId::Gaze => &mut self.gaze,
            SignalId::Head => &mut self.head,
            SignalId::Mobile => &mut self.mobile,
        }
    }
}

impl Default for ViolationDebounceEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DWELL)
    }
}
