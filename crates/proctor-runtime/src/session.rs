//! [`Session`] – the proctoring session orchestrator.
//!
//! Drives the strictly linear stage machine
//!
//! ```text
//! Calibrating → EyeCheck → HeadCheck → Quiz → Completed
//!      └────────────┴──────────┴─────────┴──→ Aborted(stage)
//! ```
//!
//! from a single cooperative polling loop. Every tick:
//!
//! 1. **Wait** – block on [`InputSource::poll`] for at most one tick. This is
//!    the only blocking point of the session.
//! 2. **Cancel check** – an [`InputEvent::Cancel`] aborts the current stage
//!    before any side effect of this tick happens.
//! 3. **Capture** – fetch a frame; no frame means the rest of the per-frame
//!    work is skipped for this tick.
//! 4. **Classify** – gaze, then head pose, then mobile. Each classifier gets
//!    the previous one's annotated frame.
//! 5. **Debounce** – feed each label into the
//!    [`ViolationDebounceEngine`]; a crossed dwell threshold persists the
//!    annotated frame through the [`EvidenceSink`]. Not run while
//!    calibrating.
//! 6. **Evaluate** – the stage's own rule: calibration window, coverage
//!    gate, or quiz countdown.
//!
//! Violations never abort a stage. Evidence write failures are logged and
//! the violation is still recorded with no artifact.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use proctor_hal::{Camera, Clock, EvidenceSink, Frame, InputEvent, InputSource};
use proctor_kernel::debounce::DEFAULT_DWELL;
use proctor_kernel::{
    CoverageGate, EYE_CHECK_LABELS, HEAD_CHECK_LABELS, Violation, ViolationDebounceEngine,
};
use proctor_perception::calibration::DEFAULT_CALIBRATION_WINDOW;
use proctor_perception::{CalibrationEngine, GazeClassifier, HeadPoseClassifier, MobileClassifier};
use proctor_types::{
    AbortReason, Baseline, Candidate, GazeLabel, HeadLabel, Label, ProctorError, Question,
    SessionResult, Stage, Transcript, ViolationRecord,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::quiz::{DEFAULT_PER_QUESTION, QuizEngine, QuizStep};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Timing knobs for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Length of the calibration window.
    pub calibration_window: Duration,
    /// Minimum length of a deviation episode before it becomes a violation.
    pub dwell: Duration,
    /// Countdown for each quiz question.
    pub per_question: Duration,
    /// Poll timeout while calibrating and during the coverage checks.
    pub check_tick: Duration,
    /// Poll timeout during the quiz.
    pub quiz_tick: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            calibration_window: DEFAULT_CALIBRATION_WINDOW,
            dwell: DEFAULT_DWELL,
            per_question: DEFAULT_PER_QUESTION,
            check_tick: Duration::from_millis(20),
            quiz_tick: Duration::from_millis(200),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Observer hook
// ─────────────────────────────────────────────────────────────────────────────

/// Progress callbacks for a UI. Every method defaults to a no-op.
pub trait SessionObserver {
    fn on_stage(&mut self, _stage: Stage) {}
    fn on_calibration(&mut self, _remaining: Duration, _samples: usize) {}
    fn on_eye_coverage(&mut self, _covered: &BTreeSet<GazeLabel>) {}
    fn on_head_coverage(&mut self, _covered: &BTreeSet<HeadLabel>) {}
    fn on_question(&mut self, _index: usize, _question: &Question) {}
    fn on_countdown(&mut self, _index: usize, _remaining: Duration, _selection: Option<usize>) {}
    fn on_violation(&mut self, _record: &ViolationRecord) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

// ─────────────────────────────────────────────────────────────────────────────
// Devices & report
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the session exclusively owns for its lifetime.
pub struct Devices {
    pub camera: Box<dyn Camera>,
    pub input: Box<dyn InputSource>,
    pub evidence: Box<dyn EvidenceSink>,
    pub clock: Box<dyn Clock>,
    pub gaze: Box<dyn GazeClassifier>,
    pub head: Box<dyn HeadPoseClassifier>,
    pub mobile: Box<dyn MobileClassifier>,
}

/// Outcome of one session, as written to `session_<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub candidate: Candidate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `None` when calibration collected no samples.
    pub baseline: Option<Baseline>,
    pub result: SessionResult,
    pub violations: Vec<ViolationRecord>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Marker for a cancellation observed at the top of a tick.
#[derive(Debug, Clone, Copy)]
struct Cancelled;

struct Tick {
    event: InputEvent,
    now: Instant,
    frame: Option<Frame>,
}

#[derive(Debug, Clone, Copy)]
struct Labels {
    gaze: GazeLabel,
    head: HeadLabel,
}

pub struct Session {
    id: Uuid,
    config: SessionConfig,
    devices: Devices,
    candidate: Candidate,
    observer: Box<dyn SessionObserver>,
    stage: Stage,
    baseline: Option<Baseline>,
    debounce: ViolationDebounceEngine,
    violations: Vec<ViolationRecord>,
}

impl Session {
    /// Take ownership of the devices for a new session.
    ///
    /// # Errors
    ///
    /// Returns [`ProctorError::DeviceUnavailable`] when the camera did not
    /// open. No stage has started at that point.
    pub fn new(
        config: SessionConfig,
        devices: Devices,
        candidate: Candidate,
        observer: Box<dyn SessionObserver>,
    ) -> Result<Self, ProctorError> {
        devices.camera.ensure_opened()?;
        Ok(Self {
            id: Uuid::new_v4(),
            config,
            devices,
            candidate,
            observer,
            stage: Stage::Calibrating,
            baseline: None,
            debounce: ViolationDebounceEngine::new(config.dwell),
            violations: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run every stage to completion or cancellation.
    #[instrument(skip_all, fields(session = %self.id, candidate = %self.candidate.email))]
    pub fn run(mut self, questions: &[Question]) -> SessionReport {
        let started_at = self.devices.clock.wall();
        let mut quiz = QuizEngine::new(questions, self.config.per_question);

        let result = match self.stages(&mut quiz) {
            Ok(()) => SessionResult::Completed {
                transcript: quiz.transcript().clone(),
            },
            Err(Cancelled) => {
                let partial = if self.stage == Stage::Quiz {
                    quiz.abort()
                } else {
                    Transcript::new()
                };
                SessionResult::Aborted {
                    stage: self.stage,
                    reason: AbortReason::UserCancelled,
                    partial,
                }
            }
        };

        match &result {
            SessionResult::Completed { transcript } => info!(
                answered = transcript.len(),
                violations = self.violations.len(),
                "session completed"
            ),
            SessionResult::Aborted { stage, reason, partial } => info!(
                stage = %stage,
                reason = %reason,
                frozen = partial.len(),
                violations = self.violations.len(),
                "session aborted"
            ),
        }

        SessionReport {
            session_id: self.id,
            candidate: self.candidate,
            started_at,
            finished_at: self.devices.clock.wall(),
            baseline: self.baseline,
            result,
            violations: self.violations,
        }
    }

    fn stages(&mut self, quiz: &mut QuizEngine<'_>) -> Result<(), Cancelled> {
        self.baseline = self.calibrate()?;
        self.eye_check()?;
        self.head_check()?;
        self.quiz(quiz)
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        info!(stage = %stage, "entering stage");
        self.observer.on_stage(stage);
    }

    // ── Stages ───────────────────────────────────────────────────────────────

    #[instrument(skip_all)]
    fn calibrate(&mut self) -> Result<Option<Baseline>, Cancelled> {
        self.enter(Stage::Calibrating);
        let mut engine =
            CalibrationEngine::new(self.config.calibration_window, self.devices.clock.now());
        loop {
            let tick = self.tick(self.config.check_tick)?;
            if let Some(frame) = &tick.frame {
                engine.offer(self.devices.head.estimate(frame));
            }
            self.observer
                .on_calibration(engine.remaining(tick.now), engine.sample_count());
            if engine.is_complete(tick.now) {
                return Ok(engine.finish());
            }
        }
    }

    #[instrument(skip_all)]
    fn eye_check(&mut self) -> Result<(), Cancelled> {
        self.enter(Stage::EyeCheck);
        let mut gate = CoverageGate::new(EYE_CHECK_LABELS);
        loop {
            let tick = self.tick(self.config.check_tick)?;
            let Some(frame) = tick.frame else { continue };
            let labels = self.classify(frame, tick.now);
            let released = gate.observe(labels.gaze).is_some();
            self.observer.on_eye_coverage(gate.snapshot());
            if released {
                return Ok(());
            }
        }
    }

    #[instrument(skip_all)]
    fn head_check(&mut self) -> Result<(), Cancelled> {
        self.enter(Stage::HeadCheck);
        if self.baseline.is_none() {
            debug!("head check compares against the uncalibrated neutral pose");
        }
        let mut gate = CoverageGate::new(HEAD_CHECK_LABELS);
        loop {
            let tick = self.tick(self.config.check_tick)?;
            let Some(frame) = tick.frame else { continue };
            let labels = self.classify(frame, tick.now);
            let released = gate.observe(labels.head).is_some();
            self.observer.on_head_coverage(gate.snapshot());
            if released {
                return Ok(());
            }
        }
    }

    #[instrument(skip_all, fields(questions = quiz.question_count()))]
    fn quiz(&mut self, quiz: &mut QuizEngine<'_>) -> Result<(), Cancelled> {
        self.enter(Stage::Quiz);
        if let Some(index) = quiz.start(self.devices.clock.now()) {
            self.announce(quiz, index);
        }
        while !quiz.is_finished() {
            let tick = self.tick(self.config.quiz_tick)?;
            if let Some(frame) = tick.frame {
                self.classify(frame, tick.now);
            }
            let step = match tick.event {
                InputEvent::Select(option) => {
                    quiz.select(option, tick.now);
                    quiz.tick(tick.now)
                }
                InputEvent::Submit => quiz.submit(tick.now),
                InputEvent::Timeout | InputEvent::Cancel => quiz.tick(tick.now),
            };
            match step {
                QuizStep::Running { question, remaining } => {
                    self.observer
                        .on_countdown(question, remaining, quiz.selection());
                }
                QuizStep::Advanced { next: Some(index), .. } => self.announce(quiz, index),
                QuizStep::Advanced { next: None, .. } | QuizStep::Finished => {}
            }
        }
        Ok(())
    }

    fn announce(&mut self, quiz: &QuizEngine<'_>, index: usize) {
        if let Some(question) = quiz.question(index) {
            debug!(question = index, prompt = %question.prompt, "question shown");
            self.observer.on_question(index, question);
        }
    }

    // ── Per-tick pipeline ────────────────────────────────────────────────────

    /// Wait for input, check for cancellation, then capture.
    fn tick(&mut self, timeout: Duration) -> Result<Tick, Cancelled> {
        let event = self.devices.input.poll(timeout);
        if event == InputEvent::Cancel {
            info!(stage = %self.stage, "cancellation received");
            return Err(Cancelled);
        }
        let now = self.devices.clock.now();
        let frame = self.devices.camera.next_frame();
        Ok(Tick { event, now, frame })
    }

    /// Classify one frame and feed every label to the debounce engine.
    fn classify(&mut self, frame: Frame, now: Instant) -> Labels {
        let gaze = self.devices.gaze.classify(frame);
        let head = self
            .devices
            .head
            .classify(gaze.frame, self.baseline.as_ref());
        let mobile = self.devices.mobile.classify(head.frame);

        let labels = [
            Label::Gaze(gaze.label),
            Label::Head(head.label),
            Label::Mobile(mobile.label),
        ];
        for label in labels {
            if let Some(violation) = self.debounce.on_signal_update(label, now) {
                self.record_violation(violation, &mobile.frame);
            }
        }
        Labels {
            gaze: gaze.label,
            head: head.label,
        }
    }

    fn record_violation(&mut self, violation: Violation, frame: &Frame) {
        let reason = violation.reason_tag();
        let at = self.devices.clock.wall();
        let artifact = match self.devices.evidence.persist(frame, &reason, at) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!(reason = %reason, error = %e, "failed to persist evidence");
                None
            }
        };
        let record = ViolationRecord {
            id: Uuid::new_v4(),
            label: violation.label,
            reason,
            at,
            artifact,
        };
        let dwell = violation.detected_at.duration_since(violation.episode_started);
        info!(
            stage = %self.stage,
            reason = %record.reason,
            artifact = ?record.artifact,
            dwell_ms = dwell.as_millis() as u64,
            "violation recorded"
        );
        self.observer.on_violation(&record);
        self.violations.push(record);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::quiz::builtin_bank;
    use proctor_hal::ManualClock;
    use proctor_hal::sim::{MemoryEvidenceSink, ScriptedInput, SimCamera};
    use proctor_perception::sim::{Script, ScriptedGaze, ScriptedHeadPose, ScriptedMobile};
    use proctor_types::{MobileLabel, PoseAngles};

    /// Frames captured during the default 5 s calibration at 20 ms per tick.
    const CALIBRATION_FRAMES: usize = 250;

    fn up() -> Option<PoseAngles> {
        Some(PoseAngles::new(25.0, 0.0, 0.0))
    }
    fn down() -> Option<PoseAngles> {
        Some(PoseAngles::new(-25.0, 0.0, 0.0))
    }
    fn left() -> Option<PoseAngles> {
        Some(PoseAngles::new(0.0, -35.0, 0.0))
    }
    fn right() -> Option<PoseAngles> {
        Some(PoseAngles::new(0.0, 35.0, 0.0))
    }
    fn level() -> Option<PoseAngles> {
        Some(PoseAngles::ZERO)
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    /// A cooperative candidate: covers the eye check on frames 250..=260 and
    /// the head check on frames 261..=280, then sits still.
    fn cooperative_gaze() -> Script<GazeLabel> {
        Script::runs([
            (GazeLabel::LookingAtScreen, CALIBRATION_FRAMES),
            (GazeLabel::Left, 5),
            (GazeLabel::Right, 5),
            (GazeLabel::Center, 1),
        ])
    }

    fn cooperative_head(during_calibration: Option<PoseAngles>) -> Script<Option<PoseAngles>> {
        Script::runs([
            (during_calibration, CALIBRATION_FRAMES),
            (level(), 11),
            (up(), 5),
            (down(), 5),
            (left(), 5),
            (right(), 5),
            (level(), 1),
        ])
    }

    #[derive(Default)]
    struct Recorded {
        stages: Vec<Stage>,
        eye_coverage: Vec<BTreeSet<GazeLabel>>,
        head_coverage: Vec<BTreeSet<HeadLabel>>,
        questions: Vec<usize>,
        violations: usize,
    }

    struct RecordingObserver(Rc<RefCell<Recorded>>);

    impl SessionObserver for RecordingObserver {
        fn on_stage(&mut self, stage: Stage) {
            self.0.borrow_mut().stages.push(stage);
        }
        fn on_eye_coverage(&mut self, covered: &BTreeSet<GazeLabel>) {
            self.0.borrow_mut().eye_coverage.push(covered.clone());
        }
        fn on_head_coverage(&mut self, covered: &BTreeSet<HeadLabel>) {
            self.0.borrow_mut().head_coverage.push(covered.clone());
        }
        fn on_question(&mut self, index: usize, _question: &Question) {
            self.0.borrow_mut().questions.push(index);
        }
        fn on_violation(&mut self, _record: &ViolationRecord) {
            self.0.borrow_mut().violations += 1;
        }
    }

    struct Scenario {
        clock: ManualClock,
        input: ScriptedInput,
        camera: SimCamera,
        gaze: Script<GazeLabel>,
        head: Script<Option<PoseAngles>>,
        mobile: Script<MobileLabel>,
        evidence: MemoryEvidenceSink,
        config: SessionConfig,
        recorded: Rc<RefCell<Recorded>>,
    }

    impl Scenario {
        fn new() -> Self {
            let clock = ManualClock::new();
            Self {
                input: ScriptedInput::new(clock.clone()),
                clock,
                camera: SimCamera::new("sim0"),
                gaze: cooperative_gaze(),
                head: cooperative_head(level()),
                mobile: Script::constant(MobileLabel::Absent),
                evidence: MemoryEvidenceSink::new(),
                config: SessionConfig::default(),
                recorded: Rc::default(),
            }
        }

        fn event(mut self, at_secs: f64, event: InputEvent) -> Self {
            self.input = self.input.at(secs(at_secs), event);
            self
        }

        fn session(self) -> Result<Session, ProctorError> {
            let devices = Devices {
                camera: Box::new(self.camera),
                input: Box::new(self.input),
                evidence: Box::new(self.evidence),
                clock: Box::new(self.clock),
                gaze: Box::new(ScriptedGaze(self.gaze)),
                head: Box::new(ScriptedHeadPose(self.head)),
                mobile: Box::new(ScriptedMobile(self.mobile)),
            };
            Session::new(
                self.config,
                devices,
                Candidate::from_form("Ada", "ada@example.com"),
                Box::new(RecordingObserver(self.recorded)),
            )
        }

        fn run(self, questions: &[Question]) -> SessionReport {
            self.session().expect("sim camera opens").run(questions)
        }
    }

    #[test]
    fn cooperative_candidate_completes_every_stage() {
        let bank = builtin_bank();
        let scenario = Scenario::new()
            .event(10.0, InputEvent::Select(3))
            .event(40.0, InputEvent::Select(1));
        let recorded = scenario.recorded.clone();
        let report = scenario.run(&bank[..2]);

        assert!(report.result.is_completed());
        let selected: Vec<_> = report
            .result
            .transcript()
            .records()
            .iter()
            .map(|r| r.selected)
            .collect();
        assert_eq!(selected, vec![Some(3), Some(1)]);
        assert_eq!(report.result.transcript().score(&bank[..2]), 1);
        assert_eq!(report.baseline.map(|b| b.samples()), Some(CALIBRATION_FRAMES));
        assert!(report.violations.is_empty());
        assert!(report.finished_at > report.started_at);

        let recorded = recorded.borrow();
        assert_eq!(
            recorded.stages,
            vec![Stage::Calibrating, Stage::EyeCheck, Stage::HeadCheck, Stage::Quiz]
        );
        assert_eq!(recorded.questions, vec![0, 1]);
    }

    #[test]
    fn coverage_snapshot_is_shown_on_every_check_tick() {
        let scenario = Scenario::new();
        let recorded = scenario.recorded.clone();
        let report = scenario.run(&builtin_bank()[..1]);
        assert!(report.result.is_completed());

        let recorded = recorded.borrow();
        let eye: Vec<_> = recorded.eye_coverage.iter().map(BTreeSet::len).collect();
        assert_eq!(eye, [vec![1; 5], vec![2; 5], vec![3]].concat());
        assert_eq!(recorded.eye_coverage.last(), Some(&BTreeSet::from(EYE_CHECK_LABELS)));

        let head: Vec<_> = recorded.head_coverage.iter().map(BTreeSet::len).collect();
        assert_eq!(head, [vec![1; 5], vec![2; 5], vec![3; 5], vec![4]].concat());
        assert_eq!(recorded.head_coverage.last(), Some(&BTreeSet::from(HEAD_CHECK_LABELS)));
    }

    #[test]
    fn uncalibrated_session_still_passes_head_check() {
        let mut scenario = Scenario::new();
        scenario.head = cooperative_head(None);
        let report = scenario.run(&builtin_bank()[..1]);

        assert!(report.baseline.is_none());
        assert!(report.result.is_completed());
        assert_eq!(report.result.transcript().records()[0].selected, None);
    }

    #[test]
    fn dropped_calibration_frames_leave_session_uncalibrated() {
        let mut scenario = Scenario::new();
        scenario.camera = SimCamera::new("sim0").dropping(0..CALIBRATION_FRAMES as u64);
        let report = scenario.run(&builtin_bank()[..1]);

        assert!(report.baseline.is_none());
        assert!(report.result.is_completed());
    }

    #[test]
    fn mobile_episodes_yield_two_artifacts() {
        // 3.2 s phone, 0.5 s gap, 4 s phone at 20 ms per frame during an
        // eye check that never completes.
        let mut scenario = Scenario::new().event(20.0, InputEvent::Cancel);
        scenario.gaze = Script::constant(GazeLabel::LookingAtScreen);
        scenario.mobile = Script::runs([
            (MobileLabel::Absent, CALIBRATION_FRAMES),
            (MobileLabel::Present, 160),
            (MobileLabel::Absent, 25),
            (MobileLabel::Present, 200),
            (MobileLabel::Absent, 1),
        ]);
        let evidence = scenario.evidence.clone();
        let recorded = scenario.recorded.clone();
        let report = scenario.run(&builtin_bank());

        assert_eq!(
            report.result,
            SessionResult::Aborted {
                stage: Stage::EyeCheck,
                reason: AbortReason::UserCancelled,
                partial: Transcript::new(),
            }
        );
        assert_eq!(report.violations.len(), 2);
        let artifacts = evidence.artifacts();
        assert_eq!(artifacts.len(), 2);
        for artifact in &artifacts {
            assert_eq!(artifact.reason, "mobile_detected");
            assert!(artifact.name.starts_with("mobile_detected_"));
        }
        assert_eq!(recorded.borrow().violations, 2);
    }

    #[test]
    fn cancel_during_sixth_question_keeps_five_answers() {
        let bank = builtin_bank();
        // The quiz starts at about 5.5 s, so question k is open from roughly
        // 5.5 + 30k to 35.5 + 30k.
        let mut scenario = Scenario::new();
        for k in 0..5 {
            scenario = scenario.event(10.0 + 30.0 * k as f64, InputEvent::Select(k % 4));
        }
        let report = scenario
            .event(160.0, InputEvent::Select(2))
            .event(165.0, InputEvent::Cancel)
            .run(&bank);

        match &report.result {
            SessionResult::Aborted { stage, reason, partial } => {
                assert_eq!(*stage, Stage::Quiz);
                assert_eq!(*reason, AbortReason::UserCancelled);
                assert_eq!(partial.len(), 5);
                for (k, record) in partial.records().iter().enumerate() {
                    assert_eq!(record.question_index, k);
                    assert_eq!(record.selected, Some(k % 4));
                    assert!(record.expired);
                }
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[test]
    fn submit_advances_without_carrying_time_over() {
        let bank = builtin_bank();
        let report = Scenario::new()
            .event(10.0, InputEvent::Select(0))
            .event(11.0, InputEvent::Submit)
            // Question 1 opened at 11 s, so it is still open at 40 s.
            .event(40.0, InputEvent::Select(2))
            .run(&bank[..2]);

        let records = report.result.transcript().records();
        assert_eq!(records.len(), 2);
        assert!(!records[0].expired);
        assert_eq!(records[0].selected, Some(0));
        assert!(records[1].expired);
        assert_eq!(records[1].selected, Some(2));
        // Question 1 expires 30 s after the submit.
        let elapsed = report.finished_at - report.started_at;
        assert!(elapsed >= chrono::Duration::seconds(41));
        assert!(elapsed < chrono::Duration::seconds(42));
    }

    #[test]
    fn cancel_during_calibration() {
        let scenario = Scenario::new().event(1.0, InputEvent::Cancel);
        let recorded = scenario.recorded.clone();
        let report = scenario.run(&builtin_bank());
        assert_eq!(
            report.result,
            SessionResult::Aborted {
                stage: Stage::Calibrating,
                reason: AbortReason::UserCancelled,
                partial: Transcript::new(),
            }
        );
        assert!(report.baseline.is_none());
        assert_eq!(recorded.borrow().stages, vec![Stage::Calibrating]);
    }

    #[test]
    fn violation_during_check_does_not_abort_it() {
        let mut scenario = Scenario::new().event(12.0, InputEvent::Cancel);
        scenario.gaze = Script::constant(GazeLabel::LookingAtScreen);
        scenario.mobile = Script::constant(MobileLabel::Present);
        scenario.evidence = MemoryEvidenceSink::failing();
        let report = scenario.run(&builtin_bank());

        // One continuous episode, persisted nowhere, still recorded.
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].reason, "mobile_detected");
        assert!(report.violations[0].artifact.is_none());
        assert!(matches!(
            report.result,
            SessionResult::Aborted { stage: Stage::EyeCheck, .. }
        ));
    }

    #[test]
    fn no_violations_while_calibrating() {
        let mut scenario = Scenario::new().event(4.0, InputEvent::Cancel);
        scenario.mobile = Script::constant(MobileLabel::Present);
        let evidence = scenario.evidence.clone();
        let report = scenario.run(&builtin_bank());
        assert!(report.violations.is_empty());
        assert!(evidence.artifacts().is_empty());
    }

    #[test]
    fn unavailable_camera_fails_before_any_stage() {
        let mut scenario = Scenario::new();
        scenario.camera = SimCamera::unavailable("sim0");
        let recorded = scenario.recorded.clone();
        assert!(matches!(
            scenario.session(),
            Err(ProctorError::DeviceUnavailable { .. })
        ));
        assert!(recorded.borrow().stages.is_empty());
    }

    #[test]
    fn report_serialises_with_status_tag() {
        let report = Scenario::new()
            .event(1.0, InputEvent::Cancel)
            .run(&builtin_bank());
        let json = serde_json::to_value(&report).expect("serialise");
        assert_eq!(json["result"]["status"], "aborted");
        assert_eq!(json["candidate"]["email"], "ada@example.com");
        let back: SessionReport = serde_json::from_value(json).expect("deserialise");
        assert_eq!(back, report);
    }
}
