use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Gaze direction produced by the eye-movement classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazeLabel {
    Left,
    Right,
    Center,
    /// No eyes detected, or gaze resolved to the screen.
    LookingAtScreen,
    Other,
}

impl GazeLabel {
    pub fn tag(self) -> &'static str {
        match self {
            GazeLabel::Left => "looking_left",
            GazeLabel::Right => "looking_right",
            GazeLabel::Center => "looking_center",
            GazeLabel::LookingAtScreen => "looking_at_screen",
            GazeLabel::Other => "other",
        }
    }

    /// Center and on-screen gaze are both treated as attentive.
    pub fn is_neutral(self) -> bool {
        matches!(self, GazeLabel::Center | GazeLabel::LookingAtScreen)
    }
}

/// Head direction produced by the head-pose classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadLabel {
    Up,
    Down,
    Left,
    Right,
    /// Within tolerance of the neutral orientation, or no face detected.
    LookingAtScreen,
    Other,
}

impl HeadLabel {
    pub fn tag(self) -> &'static str {
        match self {
            HeadLabel::Up => "looking_up",
            HeadLabel::Down => "looking_down",
            HeadLabel::Left => "looking_left",
            HeadLabel::Right => "looking_right",
            HeadLabel::LookingAtScreen => "looking_at_screen",
            HeadLabel::Other => "other",
        }
    }

    pub fn is_neutral(self) -> bool {
        self == HeadLabel::LookingAtScreen
    }
}

/// Mobile-phone presence produced by the object detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobileLabel {
    Present,
    Absent,
}

impl MobileLabel {
    pub fn tag(self) -> &'static str {
        match self {
            MobileLabel::Present => "present",
            MobileLabel::Absent => "absent",
        }
    }

    pub fn is_neutral(self) -> bool {
        self == MobileLabel::Absent
    }
}

/// The three independently monitored attention signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalId {
    Gaze,
    Head,
    Mobile,
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalId::Gaze => write!(f, "gaze"),
            SignalId::Head => write!(f, "head"),
            SignalId::Mobile => write!(f, "mobile"),
        }
    }
}

/// A single per-frame classification, tagged with the signal it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "signal", content = "label", rename_all = "snake_case")]
pub enum Label {
    Gaze(GazeLabel),
    Head(HeadLabel),
    Mobile(MobileLabel),
}

impl Label {
    pub fn signal(&self) -> SignalId {
        match self {
            Label::Gaze(_) => SignalId::Gaze,
            Label::Head(_) => SignalId::Head,
            Label::Mobile(_) => SignalId::Mobile,
        }
    }

    /// `true` when the label means "attention is within the accepted baseline".
    pub fn is_neutral(&self) -> bool {
        match self {
            Label::Gaze(g) => g.is_neutral(),
            Label::Head(h) => h.is_neutral(),
            Label::Mobile(m) => m.is_neutral(),
        }
    }

    /// Reason tag used to name evidence artifacts, e.g. `head_looking_left`
    /// or `mobile_detected`.
    pub fn reason_tag(&self) -> String {
        match self {
            Label::Gaze(g) => format!("eye_{}", g.tag()),
            Label::Head(h) => format!("head_{}", h.tag()),
            Label::Mobile(_) => "mobile_detected".to_string(),
        }
    }
}

/// Raw head orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseAngles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl PoseAngles {
    /// Sentinel neutral used when a session could not be calibrated.
    pub const ZERO: PoseAngles = PoseAngles {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn is_finite(&self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }
}

/// Learned neutral head orientation, computed once per session.
///
/// Fields are private: a baseline is immutable once calibration completes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    angles: PoseAngles,
    samples: usize,
}

impl Baseline {
    /// Coordinate-wise arithmetic mean of `samples`, or `None` when empty.
    pub fn from_samples(samples: &[PoseAngles]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let (p, y, r) = samples.iter().fold((0.0f64, 0.0f64, 0.0f64), |acc, s| {
            (
                acc.0 + f64::from(s.pitch),
                acc.1 + f64::from(s.yaw),
                acc.2 + f64::from(s.roll),
            )
        });
        Some(Self {
            angles: PoseAngles::new((p / n) as f32, (y / n) as f32, (r / n) as f32),
            samples: samples.len(),
        })
    }

    pub fn angles(&self) -> PoseAngles {
        self.angles
    }

    /// Number of readings that contributed to the mean.
    pub fn samples(&self) -> usize {
        self.samples
    }
}

/// Number of options every question must carry.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A static multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_option_index: usize,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        options: [&str; OPTIONS_PER_QUESTION],
        correct: usize,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_option_index: correct,
        }
    }

    /// Check the schema invariants of a question loaded from outside.
    ///
    /// # Errors
    ///
    /// Returns [`ProctorError::InvalidQuestion`] when the prompt is blank, the
    /// option count is not [`OPTIONS_PER_QUESTION`], or the correct index is
    /// out of range.
    pub fn validate(&self) -> Result<(), ProctorError> {
        if self.prompt.trim().is_empty() {
            return Err(ProctorError::InvalidQuestion("empty prompt".to_string()));
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(ProctorError::InvalidQuestion(format!(
                "'{}' has {} options, expected {}",
                self.prompt,
                self.options.len(),
                OPTIONS_PER_QUESTION
            )));
        }
        if self.correct_option_index >= self.options.len() {
            return Err(ProctorError::InvalidQuestion(format!(
                "'{}' correct_option_index {} out of range",
                self.prompt, self.correct_option_index
            )));
        }
        Ok(())
    }
}

/// The frozen outcome of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    /// Selected option, or `None` for "no answer".
    pub selected: Option<usize>,
    /// `true` when the countdown froze the answer, `false` on early submit.
    pub expired: bool,
}

/// Ordered, append-only sequence of [`AnswerRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    records: Vec<AnswerRecord>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frozen record. Records cannot be edited or removed.
    pub fn freeze(&mut self, record: AnswerRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records whose selection matches the question's correct option.
    pub fn score(&self, questions: &[Question]) -> usize {
        self.records
            .iter()
            .filter(|r| {
                questions
                    .get(r.question_index)
                    .is_some_and(|q| r.selected == Some(q.correct_option_index))
            })
            .count()
    }
}

/// Identity captured by the registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub email: String,
}

impl Candidate {
    /// Build from raw form input, substituting defaults for blank fields.
    pub fn from_form(name: &str, email: &str) -> Self {
        let defaults = Self::default();
        Self {
            name: Some(name.trim())
                .filter(|n| !n.is_empty())
                .map_or(defaults.name, str::to_string),
            email: Some(email.trim())
                .filter(|e| !e.is_empty())
                .map_or(defaults.email, str::to_string),
        }
    }
}

impl Default for Candidate {
    fn default() -> Self {
        Self {
            name: "Candidate".to_string(),
            email: "unknown@example.com".to_string(),
        }
    }
}

/// Non-terminal session stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Calibrating,
    EyeCheck,
    HeadCheck,
    Quiz,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Calibrating => write!(f, "calibrating"),
            Stage::EyeCheck => write!(f, "eye-check"),
            Stage::HeadCheck => write!(f, "head-check"),
            Stage::Quiz => write!(f, "quiz"),
        }
    }
}

/// Why a stage was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbortReason {
    UserCancelled,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::UserCancelled => write!(f, "user-cancelled"),
        }
    }
}

/// Terminal value of a proctoring session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionResult {
    Completed { transcript: Transcript },
    Aborted {
        stage: Stage,
        reason: AbortReason,
        /// Records frozen before the abort; empty unless the quiz had started.
        partial: Transcript,
    },
}

impl SessionResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionResult::Completed { .. })
    }

    pub fn transcript(&self) -> &Transcript {
        match self {
            SessionResult::Completed { transcript } => transcript,
            SessionResult::Aborted { partial, .. } => partial,
        }
    }
}

/// A debounced violation, as recorded in the session report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub id: Uuid,
    pub label: Label,
    pub reason: String,
    pub at: DateTime<Utc>,
    /// Identifier returned by the evidence sink, `None` if persisting failed.
    pub artifact: Option<String>,
}

/// Global error type for device, evidence, and configuration failures.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProctorError {
    #[error("Device Unavailable {device}: {details}")]
    DeviceUnavailable { device: String, details: String },

    #[error("Capture Failed on {device}: {details}")]
    CaptureFailed { device: String, details: String },

    #[error("Evidence Sink Error: {0}")]
    Evidence(String),

    #[error("Invalid Question: {0}")]
    InvalidQuestion(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),
}
