//! Timed Quiz Engine.
//!
//! Questions are shown strictly in order, each with its own countdown that
//! starts when the question is shown. While a countdown runs, every
//! selection overwrites the previous one; the selection held when the
//! countdown reaches zero is frozen into an [`AnswerRecord`] (or "no answer"
//! if none was made). An explicit submit freezes early. Unused time is
//! never carried over to the next question.
//!
//! The engine never reads a clock itself. The orchestrator passes `now` into
//! every call, which keeps the engine deterministic under test.
//!
//! # Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use proctor_runtime::quiz::{QuizEngine, QuizStep, builtin_bank};
//!
//! let bank = builtin_bank();
//! let t0 = Instant::now();
//! let mut quiz = QuizEngine::new(&bank[..1], Duration::from_secs(30));
//! quiz.start(t0);
//!
//! quiz.select(0, t0 + Duration::from_secs(1));
//! quiz.select(3, t0 + Duration::from_secs(2));
//! assert!(matches!(
//!     quiz.tick(t0 + Duration::from_secs(30)),
//!     QuizStep::Advanced { next: None, .. }
//! ));
//! assert!(quiz.is_finished());
//! assert_eq!(quiz.transcript().records()[0].selected, Some(3));
//! ```

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use proctor_types::{AnswerRecord, ProctorError, Question, Transcript};
use tracing::{debug, info, warn};

/// Default countdown per question.
pub const DEFAULT_PER_QUESTION: Duration = Duration::from_secs(30);

/// Result of advancing the quiz with [`QuizEngine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    /// The current question is still open.
    Running { question: usize, remaining: Duration },
    /// The current question was frozen and `next` (if any) has started.
    Advanced { frozen: AnswerRecord, next: Option<usize> },
    /// Every question has a frozen record.
    Finished,
}

#[derive(Debug, Clone)]
struct OpenQuestion {
    index: usize,
    deadline: Instant,
    selection: Option<usize>,
}

pub struct QuizEngine<'q> {
    questions: &'q [Question],
    per_question: Duration,
    open: Option<OpenQuestion>,
    transcript: Transcript,
}

impl<'q> QuizEngine<'q> {
    pub fn new(questions: &'q [Question], per_question: Duration) -> Self {
        Self {
            questions,
            per_question,
            open: None,
            transcript: Transcript::new(),
        }
    }

    /// Show the first question and start its countdown.
    ///
    /// Returns `None` for an empty bank, which is immediately finished.
    pub fn start(&mut self, now: Instant) -> Option<usize> {
        if self.open.is_some() || !self.transcript.is_empty() {
            return self.current();
        }
        self.open_question(0, now)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Index of the question currently counting down.
    pub fn current(&self) -> Option<usize> {
        self.open.as_ref().map(|q| q.index)
    }

    pub fn question(&self, index: usize) -> Option<&'q Question> {
        self.questions.get(index)
    }

    /// Time left on the current question.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.open
            .as_ref()
            .map(|q| q.deadline.saturating_duration_since(now))
    }

    /// Selection currently held for the open question.
    pub fn selection(&self) -> Option<usize> {
        self.open.as_ref().and_then(|q| q.selection)
    }

    /// Record `option` as the current answer. Returns `false` when the option
    /// does not exist, no question is open, or the countdown has already hit
    /// zero.
    pub fn select(&mut self, option: usize, now: Instant) -> bool {
        let Some(open) = self.open.as_mut() else {
            return false;
        };
        let options = self.questions[open.index].options.len();
        if option >= options {
            warn!(question = open.index, option, options, "ignoring out-of-range selection");
            return false;
        }
        if now >= open.deadline {
            debug!(question = open.index, option, "selection arrived after countdown expired");
            return false;
        }
        if let Some(previous) = open.selection.replace(option) {
            debug!(question = open.index, previous, option, "selection overwritten");
        }
        true
    }

    /// Freeze the open question before its countdown expires.
    pub fn submit(&mut self, now: Instant) -> QuizStep {
        match &self.open {
            Some(open) if now < open.deadline => self.freeze(false, now),
            _ => self.tick(now),
        }
    }

    /// Freeze the open question if its countdown has reached zero.
    pub fn tick(&mut self, now: Instant) -> QuizStep {
        match &self.open {
            None => QuizStep::Finished,
            Some(open) if now >= open.deadline => self.freeze(true, now),
            Some(open) => QuizStep::Running {
                question: open.index,
                remaining: open.deadline - now,
            },
        }
    }

    pub fn is_finished(&self) -> bool {
        self.open.is_none() && self.transcript.len() == self.questions.len()
    }

    /// Frozen records so far. The open question is never included.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Stop the quiz, discarding the open question's unfrozen selection.
    pub fn abort(self) -> Transcript {
        if let Some(open) = &self.open {
            info!(
                question = open.index,
                discarded = ?open.selection,
                frozen = self.transcript.len(),
                "quiz aborted"
            );
        }
        self.transcript
    }

    fn freeze(&mut self, expired: bool, now: Instant) -> QuizStep {
        let Some(open) = self.open.take() else {
            return QuizStep::Finished;
        };
        let record = AnswerRecord {
            question_index: open.index,
            selected: open.selection,
            expired,
        };
        info!(question = open.index, selected = ?record.selected, expired, "answer frozen");
        self.transcript.freeze(record);
        let next = self.open_question(open.index + 1, now);
        QuizStep::Advanced {
            frozen: record,
            next,
        }
    }

    fn open_question(&mut self, index: usize, now: Instant) -> Option<usize> {
        if index >= self.questions.len() {
            return None;
        }
        self.open = Some(OpenQuestion {
            index,
            deadline: now + self.per_question,
            selection: None,
        });
        Some(index)
    }
}

/// The ten-question bank shipped with the CLI.
pub fn builtin_bank() -> Vec<Question> {
    vec![
        Question::new("What is 2 + 2?", ["1", "2", "3", "4"], 3),
        Question::new("What is the capital of France?", ["Berlin", "London", "Paris", "Rome"], 2),
        Question::new("Which color is a banana?", ["Red", "Blue", "Yellow", "Green"], 2),
        Question::new("Which is a mammal?", ["Shark", "Dolphin", "Octopus", "Tuna"], 1),
        Question::new("Sun rises from?", ["West", "East", "North", "South"], 1),
        Question::new("Which is prime?", ["4", "6", "7", "8"], 2),
        Question::new("5 * 6 = ?", ["11", "30", "24", "20"], 1),
        Question::new("Largest planet?", ["Earth", "Mars", "Jupiter", "Venus"], 2),
        Question::new("Water freezes at?", ["0 C", "100 C", "50 C", "-10 C"], 0),
        Question::new(
            "Which is a programming language?",
            ["HTML", "CSS", "Python", "Photoshop"],
            2,
        ),
    ]
}

/// Load and validate a JSON question bank.
///
/// # Errors
///
/// Returns [`ProctorError::Config`] when the file cannot be read,
/// [`ProctorError::Serialization`] when it is not a JSON array of questions,
/// and [`ProctorError::InvalidQuestion`] for the first question that fails
/// validation.
pub fn load_bank(path: &Path) -> Result<Vec<Question>, ProctorError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| ProctorError::Config(format!("failed to read {}: {e}", path.display())))?;
    let questions: Vec<Question> = serde_json::from_str(&raw)
        .map_err(|e| ProctorError::Serialization(format!("invalid question bank: {e}")))?;
    for q in &questions {
        q.validate()?;
    }
    info!(path = %path.display(), count = questions.len(), "question bank loaded");
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn last_selection_before_timeout_wins() {
        let bank = builtin_bank();
        let t0 = Instant::now();
        let mut quiz = QuizEngine::new(&bank[..2], secs(30));
        assert_eq!(quiz.start(t0), Some(0));

        assert!(quiz.select(0, t0 + secs(5)));
        assert!(quiz.select(1, t0 + secs(29)));
        assert_eq!(quiz.selection(), Some(1));
        assert!(matches!(quiz.tick(t0 + secs(29)), QuizStep::Running { question: 0, .. }));

        match quiz.tick(t0 + secs(30)) {
            QuizStep::Advanced { frozen, next } => {
                assert_eq!(frozen.selected, Some(1));
                assert!(frozen.expired);
                assert_eq!(next, Some(1));
            }
            other => panic!("expected Advanced, got {other:?}"),
        }
    }

    #[test]
    fn no_selection_freezes_no_answer() {
        let bank = builtin_bank();
        let t0 = Instant::now();
        let mut quiz = QuizEngine::new(&bank[..1], secs(10));
        quiz.start(t0);
        assert!(matches!(quiz.tick(t0 + secs(10)), QuizStep::Advanced { next: None, .. }));
        assert!(matches!(quiz.tick(t0 + secs(11)), QuizStep::Finished));
        assert!(quiz.is_finished());
        assert_eq!(quiz.transcript().records()[0].selected, None);
    }

    #[test]
    fn late_and_invalid_selections_are_ignored() {
        let bank = builtin_bank();
        let t0 = Instant::now();
        let mut quiz = QuizEngine::new(&bank[..1], secs(10));
        quiz.start(t0);
        assert!(!quiz.select(4, t0 + secs(1)));
        assert!(quiz.select(2, t0 + secs(2)));
        assert!(!quiz.select(0, t0 + secs(10)));
        quiz.tick(t0 + secs(10));
        assert_eq!(quiz.transcript().records()[0].selected, Some(2));
    }

    #[test]
    fn timers_are_independent_and_restart_per_question() {
        let bank = builtin_bank();
        let t0 = Instant::now();
        let mut quiz = QuizEngine::new(&bank[..2], secs(30));
        quiz.start(t0);
        // Submit early; the next question still gets the full 30 s.
        quiz.select(3, t0 + secs(4));
        assert!(matches!(
            quiz.submit(t0 + secs(5)),
            QuizStep::Advanced { frozen: AnswerRecord { expired: false, .. }, next: Some(1) }
        ));
        assert_eq!(quiz.remaining(t0 + secs(5)), Some(secs(30)));
        assert!(matches!(quiz.tick(t0 + secs(34)), QuizStep::Running { question: 1, .. }));
        assert!(matches!(quiz.tick(t0 + secs(35)), QuizStep::Advanced { next: None, .. }));
    }

    #[test]
    fn changing_one_duration_does_not_change_other_answers() {
        // Identical selection events relative to each question's start.
        fn run(per_question: Duration) -> Transcript {
            let bank = builtin_bank();
            let t0 = Instant::now();
            let mut quiz = QuizEngine::new(&bank[..3], per_question);
            quiz.start(t0);
            let mut start = t0;
            for option in [1, 2, 0] {
                quiz.select(option, start + Duration::from_secs(1));
                start += per_question;
                quiz.tick(start);
            }
            quiz.abort()
        }
        let short = run(secs(5));
        let long = run(secs(45));
        assert_eq!(short, long);
        assert_eq!(short.len(), 3);
    }

    #[test]
    fn abort_discards_open_question() {
        let bank = builtin_bank();
        let t0 = Instant::now();
        let mut quiz = QuizEngine::new(&bank, secs(30));
        quiz.start(t0);
        quiz.select(0, t0 + secs(1));
        quiz.tick(t0 + secs(30));
        quiz.select(2, t0 + secs(31));
        let partial = quiz.abort();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial.records()[0].selected, Some(0));
    }

    #[test]
    fn empty_bank_is_finished_immediately() {
        let mut quiz = QuizEngine::new(&[], secs(30));
        assert_eq!(quiz.start(Instant::now()), None);
        assert!(quiz.is_finished());
        assert!(matches!(quiz.tick(Instant::now()), QuizStep::Finished));
    }

    #[test]
    fn builtin_bank_is_valid() {
        let bank = builtin_bank();
        assert_eq!(bank.len(), 10);
        assert!(bank.iter().all(|q| q.validate().is_ok()));
    }

    #[test]
    fn load_bank_validates_questions() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let good = dir.path().join("good.json");
        fs::write(&good, serde_json::to_string(&builtin_bank()[..2]).unwrap()).unwrap();
        assert_eq!(load_bank(&good).expect("valid bank").len(), 2);

        let bad = dir.path().join("bad.json");
        fs::write(
            &bad,
            r#"[{"prompt":"Q","options":["a","b"],"correct_option_index":0}]"#,
        )
        .unwrap();
        assert!(matches!(load_bank(&bad), Err(ProctorError::InvalidQuestion(_))));

        assert!(matches!(
            load_bank(&dir.path().join("missing.json")),
            Err(ProctorError::Config(_))
        ));
    }
}
