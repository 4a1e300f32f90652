//! Terminal input and progress rendering.
//!
//! A single background thread owns stdin and forwards whole lines over a
//! channel. The REPL, the registration prompts and the session's
//! [`InputSource`] all read from that channel, so a line is never split
//! between two readers and every wait can honour a timeout.

use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use colored::Colorize;
use proctor_hal::{InputEvent, InputSource};
use proctor_runtime::SessionObserver;
use proctor_types::{GazeLabel, HeadLabel, Question, Stage, ViolationRecord};
use tracing::{debug, warn};

/// How often blocking prompts re-check the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

// ─────────────────────────────────────────────────────────────────────────────
// Line reader
// ─────────────────────────────────────────────────────────────────────────────

/// Lines typed on stdin, delivered by a background reader thread.
pub struct Lines {
    rx: Receiver<String>,
}

impl Lines {
    /// Start the stdin reader thread. The channel disconnects on EOF.
    pub fn spawn_stdin() -> Rc<Self> {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            warn!(error = %e, "stdin read failed");
                            break;
                        }
                    };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            warn!(error = %e, "failed to start stdin reader; input is disabled");
        }
        Rc::new(Self::from_receiver(rx))
    }

    pub(crate) fn from_receiver(rx: Receiver<String>) -> Self {
        Self { rx }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Block until a line arrives. `None` on EOF or once `shutdown` is set.
    pub fn read_line(&self, shutdown: &AtomicBool) -> Option<String> {
        loop {
            if shutdown.load(Ordering::SeqCst) {
                return None;
            }
            match self.rx.recv_timeout(SHUTDOWN_POLL) {
                Ok(line) => return Some(line),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Print `msg` and read a trimmed answer, returning `default` for an
    /// empty line, EOF, or shutdown.
    pub fn prompt(&self, msg: &str, default: &str, shutdown: &AtomicBool) -> String {
        print!("{msg}");
        io::stdout().flush().ok();
        match self.read_line(shutdown) {
            Some(line) if !line.trim().is_empty() => line.trim().to_string(),
            _ => default.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session input
// ─────────────────────────────────────────────────────────────────────────────

/// Map a typed line to a session event.
///
/// | Input | Event |
/// |---|---|
/// | `1`, `2`, … | `Select(n - 1)` |
/// | `n`, `next` | `Submit` |
/// | `q`, `quit`, `exit`, `skip` | `Cancel` |
pub fn parse_event(line: &str) -> Option<InputEvent> {
    let line = line.trim().to_ascii_lowercase();
    match line.as_str() {
        "n" | "next" => Some(InputEvent::Submit),
        "q" | "quit" | "exit" | "skip" => Some(InputEvent::Cancel),
        other => other
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .map(|n| InputEvent::Select(n - 1)),
    }
}

/// [`InputSource`] over the shared stdin channel.
///
/// Ctrl-C (the `shutdown` flag) and a closed stdin both read as a
/// cancellation.
pub struct ConsoleInput {
    lines: Rc<Lines>,
    shutdown: Arc<AtomicBool>,
}

impl ConsoleInput {
    pub fn new(lines: Rc<Lines>, shutdown: Arc<AtomicBool>) -> Self {
        Self { lines, shutdown }
    }
}

impl InputSource for ConsoleInput {
    fn poll(&mut self, timeout: Duration) -> InputEvent {
        if self.shutdown.load(Ordering::SeqCst) {
            return InputEvent::Cancel;
        }
        match self.lines.recv_timeout(timeout) {
            Ok(line) => parse_event(&line).unwrap_or_else(|| {
                debug!(%line, "ignoring unrecognised input");
                InputEvent::Timeout
            }),
            Err(RecvTimeoutError::Timeout) if self.shutdown.load(Ordering::SeqCst) => {
                InputEvent::Cancel
            }
            Err(RecvTimeoutError::Timeout) => InputEvent::Timeout,
            Err(RecvTimeoutError::Disconnected) => InputEvent::Cancel,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Progress rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Prints session progress. Countdowns are printed once per whole second.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    last_second: Option<u64>,
    last_coverage: usize,
}

impl ConsoleObserver {
    fn tick_second(&mut self, remaining: Duration) -> Option<u64> {
        let second = remaining.as_secs_f64().ceil() as u64;
        (self.last_second != Some(second)).then(|| {
            self.last_second = Some(second);
            second
        })
    }

    fn coverage_grew(&mut self, len: usize) -> bool {
        let grew = len > self.last_coverage;
        self.last_coverage = len;
        grew
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_stage(&mut self, stage: Stage) {
        self.last_second = None;
        self.last_coverage = 0;
        println!();
        let hint = match stage {
            Stage::Calibrating => "Look straight at the screen and keep still.",
            Stage::EyeCheck => "Look left, right, and to the center.",
            Stage::HeadCheck => "Turn your head up, down, left, and right.",
            Stage::Quiz => "Type 1-4 to answer, n for next, q to quit.",
        };
        println!("  {} {}", format!("[{stage}]").bold().cyan(), hint);
    }

    fn on_calibration(&mut self, remaining: Duration, samples: usize) {
        if let Some(second) = self.tick_second(remaining) {
            println!("    calibrating … {second}s left ({samples} samples)");
        }
    }

    fn on_eye_coverage(&mut self, covered: &BTreeSet<GazeLabel>) {
        if self.coverage_grew(covered.len()) {
            let tags: Vec<_> = covered.iter().map(|l| l.tag()).collect();
            println!("    {} {}", "✓".green(), tags.join(", "));
        }
    }

    fn on_head_coverage(&mut self, covered: &BTreeSet<HeadLabel>) {
        if self.coverage_grew(covered.len()) {
            let tags: Vec<_> = covered.iter().map(|l| l.tag()).collect();
            println!("    {} {}", "✓".green(), tags.join(", "));
        }
    }

    fn on_question(&mut self, index: usize, question: &Question) {
        self.last_second = None;
        println!();
        println!("  {} {}", format!("Q{}.", index + 1).bold(), question.prompt.bold());
        for (i, option) in question.options.iter().enumerate() {
            println!("    {}) {}", i + 1, option);
        }
    }

    fn on_countdown(&mut self, _index: usize, remaining: Duration, selection: Option<usize>) {
        if let Some(second) = self.tick_second(remaining)
            && (second % 5 == 0 || second <= 5)
        {
            let chosen = selection.map_or_else(|| "none".to_string(), |s| (s + 1).to_string());
            println!("    {} left · selected: {}", format!("{second}s").yellow(), chosen);
        }
    }

    fn on_violation(&mut self, record: &ViolationRecord) {
        println!(
            "    {} {}",
            "⚠  violation:".red().bold(),
            record.reason.yellow()
        );
    }
}
