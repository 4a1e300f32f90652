//! `proctor-cli` – Proctor Command Line Interface
//!
//! The `proctor` binary:
//!
//! 1. Checks for `~/.proctor/config.toml`; runs a **First-Run Wizard** when the
//!    file is absent.
//! 2. Drops the user into an **interactive REPL** with slash-commands
//!    (`/start`, `/settings`, `/help`, `/quit`).
//! 3. Intercepts **Ctrl-C**: a running session is cancelled at its next tick
//!    and its report is still written before the CLI exits.

mod config;
mod console;
mod repl;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use tracing::{info, warn};

use crate::console::Lines;

fn main() {
    // RUST_LOG filters, PROCTOR_LOG_FORMAT=json switches to JSON lines and
    // OTEL_EXPORTER_OTLP_ENDPOINT enables span export. User-facing output
    // stays on println!.
    let telemetry = proctor_runtime::init_tracing("proctor");
    if telemetry.is_exporting() {
        info!("exporting session spans over OTLP");
    }

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – cancelling …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(
            error = %e,
            "Failed to install Ctrl-C handler; Ctrl-C will not cancel a running session"
        );
    }

    let lines = Lines::spawn_stdin();

    // ── First-Run Wizard ──────────────────────────────────────────────────
    match config::load() {
        Ok(None) => run_first_run_wizard(&lines, &shutdown),
        Ok(Some(_)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
        }
    }

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(lines, shutdown);
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard(lines: &Lines, shutdown: &AtomicBool) {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║       Proctor First-Run Wizard       ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up the proctor.\n");

    let mut cfg = config::Config::default();

    cfg.log_dir = lines.prompt(
        &format!("  Evidence and report directory [{}]: ", cfg.log_dir),
        &cfg.log_dir,
        shutdown,
    );

    let raw = lines.prompt(
        &format!("  Seconds per question [{}]: ", cfg.per_question_seconds),
        &cfg.per_question_seconds.to_string(),
        shutdown,
    );
    if let Ok(secs) = raw.parse::<u64>() {
        cfg.per_question_seconds = secs;
    }

    let raw = lines.prompt(
        &format!("  Violation dwell in seconds [{}]: ", cfg.dwell_seconds),
        &cfg.dwell_seconds.to_string(),
        shutdown,
    );
    if let Ok(secs) = raw.parse::<f64>()
        && secs.is_finite()
        && secs >= 0.0
    {
        cfg.dwell_seconds = secs;
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"    ___                __            "#.bold().cyan());
    println!("{}", r#"   / _ \_______  ____/ /____  ____  "#.bold().cyan());
    println!("{}", r#"  / ___/ __/ _ \/ __/ __/ _ \/ __/  "#.bold().cyan());
    println!("{}", r#" /_/  /_/  \___/\__/\__/\___/_/     "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Proctor".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Webcam-proctored quiz sessions");
    println!();
}
