//! REPL – Read-Eval-Print Loop for the proctor shell.
//!
//! Supported slash-commands:
//!   /help         – show this list
//!   /settings     – interactively edit `~/.proctor/config.toml`
//!   /start        – register a candidate and run a session
//!   /quit | /exit – exit the CLI

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use proctor_hal::sim::SimCamera;
use proctor_hal::{DirEvidenceSink, SystemClock};
use proctor_perception::sim::{Script, ScriptedGaze, ScriptedHeadPose, ScriptedMobile};
use proctor_runtime::{
    Devices, Session, SessionConfig, SessionReport, builtin_bank, load_bank,
};
use proctor_types::{
    Candidate, GazeLabel, MobileLabel, PoseAngles, ProctorError, Question, SessionResult,
};
use tracing::info;

use crate::config::{self, Config};
use crate::console::{ConsoleInput, ConsoleObserver, Lines};

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled while waiting for input; when set the REPL exits.
pub fn run(lines: Rc<Lines>, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "proctor>".bold().cyan());
        std::io::Write::flush(&mut std::io::stdout()).ok();

        let Some(line) = lines.read_line(&shutdown) else {
            break;
        };
        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }

        match cmd {
            "/help" => cmd_help(),
            "/settings" => cmd_settings(&lines, &shutdown),
            "/start" => cmd_start(&lines, &shutdown),
            "/quit" | "/exit" => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            other => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Proctor Commands".bold().underline());
    println!("  {}  – edit ~/.proctor/config.toml settings", "/settings".bold().cyan());
    println!("  {}     – register and run a proctored quiz", "/start".bold().cyan());
    println!("  {}  – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_settings(lines: &Lines, shutdown: &AtomicBool) {
    let mut cfg = load_config_or_default();

    println!("{}", "Settings Editor".bold().underline());
    println!("  (press Enter to keep the current value)");

    cfg.log_dir = lines.prompt(
        &format!("  Log directory        [{}]: ", cfg.log_dir),
        &cfg.log_dir,
        shutdown,
    );
    cfg.calibration_seconds =
        prompt_number(lines, shutdown, "Calibration seconds ", cfg.calibration_seconds);
    cfg.dwell_seconds = prompt_number(lines, shutdown, "Violation dwell (s)  ", cfg.dwell_seconds);
    cfg.per_question_seconds =
        prompt_number(lines, shutdown, "Seconds per question ", cfg.per_question_seconds);
    cfg.tick_millis = prompt_number(lines, shutdown, "Check tick (ms)      ", cfg.tick_millis);

    let bank = cfg.question_bank.clone().unwrap_or_default();
    let shown = if bank.is_empty() { "built-in" } else { bank.as_str() };
    let answer = lines.prompt(&format!("  Question bank (JSON) [{shown}]: "), &bank, shutdown);
    cfg.question_bank = Some(answer).filter(|p| !p.trim().is_empty());

    match config::save(&cfg) {
        Ok(()) => println!(
            "{} {}",
            "✓ Settings saved to".green(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
}

fn cmd_start(lines: &Rc<Lines>, shutdown: &Arc<AtomicBool>) {
    let cfg = load_config_or_default();

    println!();
    println!("{}", "═══════════════════════════════════════".bold());
    println!("{}", "          Candidate Registration       ".bold().cyan());
    println!("{}", "═══════════════════════════════════════".bold());
    let defaults = Candidate::default();
    let name_default = non_empty_or(&cfg.candidate_name, &defaults.name);
    let email_default = non_empty_or(&cfg.candidate_email, &defaults.email);
    let name = lines.prompt(&format!("  Name  [{name_default}]: "), name_default, shutdown);
    let email = lines.prompt(&format!("  Email [{email_default}]: "), email_default, shutdown);
    let candidate = Candidate::from_form(&name, &email);
    let display_name = candidate.name.clone();

    let questions = match question_bank(&cfg) {
        Ok(q) => q,
        Err(e) => {
            println!("{}: {}", "Question bank error".red(), e);
            return;
        }
    };

    let devices = match demo_devices(&cfg, lines.clone(), shutdown.clone()) {
        Ok(d) => d,
        Err(e) => {
            println!("{}: {}", "Device error".red(), e);
            return;
        }
    };

    let session = match Session::new(
        cfg.session_config(),
        devices,
        candidate,
        Box::new(ConsoleObserver::default()),
    ) {
        Ok(s) => s,
        Err(e) => {
            println!("{}: {}", "Cannot start session".red(), e);
            return;
        }
    };
    println!(
        "  Session {} for {} · {} questions",
        session.id().to_string().dimmed(),
        display_name.bold(),
        questions.len()
    );

    let report = session.run(&questions);
    print_summary(&report, &questions);

    match write_report(&report, cfg.log_dir()) {
        Ok(path) => println!(
            "  {} Report written to {}",
            "✓".green().bold(),
            path.display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error writing report".red(), e),
    }
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Session plumbing
// ─────────────────────────────────────────────────────────────────────────────

fn question_bank(cfg: &Config) -> Result<Vec<Question>, ProctorError> {
    match cfg.question_bank() {
        Some(path) => load_bank(path),
        None => Ok(builtin_bank()),
    }
}

/// Simulated camera and classifiers acting out a cooperative candidate, with
/// real console input, wall-clock time, and evidence written to `log_dir`.
fn demo_devices(
    cfg: &Config,
    lines: Rc<Lines>,
    shutdown: Arc<AtomicBool>,
) -> Result<Devices, ProctorError> {
    let scripts = DemoScripts::new(&cfg.session_config());
    Ok(Devices {
        camera: Box::new(SimCamera::new("sim-webcam")),
        input: Box::new(ConsoleInput::new(lines, shutdown)),
        evidence: Box::new(DirEvidenceSink::new(cfg.log_dir())?),
        clock: Box::new(SystemClock),
        gaze: Box::new(scripts.gaze),
        head: Box::new(scripts.head),
        mobile: Box::new(scripts.mobile),
    })
}

/// Per-frame classifier scripts for the demo candidate.
///
/// Frame indices are derived from the session timings, so the candidate
/// sits still through the whole calibration window, sweeps their eyes and
/// head once the checks open, and briefly shows a phone about 20 s into
/// the quiz.
struct DemoScripts {
    gaze: ScriptedGaze,
    head: ScriptedHeadPose,
    mobile: ScriptedMobile,
}

impl DemoScripts {
    fn new(session: &SessionConfig) -> Self {
        let check = |d: Duration| frames(d, session.check_tick);
        let calibration = check(session.calibration_window);

        let gaze_lead = calibration + check(Duration::from_secs(1));
        let sweep = check(Duration::from_millis(500));
        let eye_done = gaze_lead + 2 * sweep + 1;

        let head_lead = eye_done + check(Duration::from_secs(1));
        let turn = check(Duration::from_millis(300));
        let head_done = head_lead + 3 * turn + 1;

        let phone_at = head_done + frames(Duration::from_secs(20), session.quiz_tick);
        let phone_for = frames(Duration::from_secs(4), session.quiz_tick);

        let level = Some(PoseAngles::ZERO);
        Self {
            gaze: ScriptedGaze(Script::runs([
                (GazeLabel::LookingAtScreen, gaze_lead),
                (GazeLabel::Left, sweep),
                (GazeLabel::Right, sweep),
                (GazeLabel::Center, 1),
            ])),
            head: ScriptedHeadPose(Script::runs([
                (level, head_lead),
                (Some(PoseAngles::new(20.0, 0.0, 0.0)), turn),
                (Some(PoseAngles::new(-20.0, 0.0, 0.0)), turn),
                (Some(PoseAngles::new(0.0, -30.0, 0.0)), turn),
                (Some(PoseAngles::new(0.0, 30.0, 0.0)), 1),
                (level, 1),
            ])),
            mobile: ScriptedMobile(Script::runs([
                (MobileLabel::Absent, phone_at),
                (MobileLabel::Present, phone_for),
                (MobileLabel::Absent, 1),
            ])),
        }
    }
}

/// Ticks needed to cover `span`, at least one.
fn frames(span: Duration, tick: Duration) -> usize {
    let tick = tick.as_secs_f64().max(f64::EPSILON);
    (span.as_secs_f64() / tick).ceil().max(1.0) as usize
}

/// Write `report` as `<dir>/session_<id>.json`.
pub(crate) fn write_report(report: &SessionReport, dir: &Path) -> Result<PathBuf, ProctorError> {
    fs::create_dir_all(dir)
        .map_err(|e| ProctorError::Evidence(format!("failed to create {}: {e}", dir.display())))?;
    let path = dir.join(format!("session_{}.json", report.session_id));
    let raw = serde_json::to_string_pretty(report)
        .map_err(|e| ProctorError::Serialization(e.to_string()))?;
    fs::write(&path, raw)
        .map_err(|e| ProctorError::Evidence(format!("failed to write {}: {e}", path.display())))?;
    info!(path = %path.display(), "session report written");
    Ok(path)
}

fn print_summary(report: &SessionReport, questions: &[Question]) {
    println!();
    println!("{}", "═══════════════════════════════════════".bold());
    match &report.result {
        SessionResult::Completed { transcript } => println!(
            "  {} Quiz complete · score {}/{}",
            "✓".green().bold(),
            transcript.score(questions).to_string().bold(),
            questions.len()
        ),
        SessionResult::Aborted { stage, reason, partial } => println!(
            "  {} Session aborted during {} ({}) · {} answer(s) kept",
            "✗".red().bold(),
            stage.to_string().yellow(),
            reason,
            partial.len()
        ),
    }
    if report.baseline.is_none() {
        println!("  {}", "Calibration collected no samples; ran uncalibrated.".dimmed());
    }
    println!("  Violations recorded: {}", report.violations.len());
    println!("{}", "═══════════════════════════════════════".bold());
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn load_config_or_default() -> Config {
    match config::load() {
        Ok(Some(c)) => c,
        Ok(None) => config::default_with_env(),
        Err(e) => {
            println!("{}: {} – using defaults", "Config error".red(), e);
            config::default_with_env()
        }
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

/// Prompt for a number.  Keeps `current` on Enter or on unparseable input.
fn prompt_number<T>(lines: &Lines, shutdown: &AtomicBool, label: &str, current: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    let raw = lines.prompt(&format!("  {label} [{current}]: "), &current.to_string(), shutdown);
    match raw.parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            println!(
                "  {} '{}' is not a valid number, keeping {}",
                "Warning:".yellow(),
                raw,
                current
            );
            current
        }
    }
}
