//! Configuration Vault – reads/writes `~/.proctor/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use proctor_runtime::SessionConfig;
use proctor_types::ProctorError;
use serde::{Deserialize, Serialize};

/// Persisted settings stored in `~/.proctor/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory receiving evidence artifacts and session reports.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_calibration_seconds")]
    pub calibration_seconds: f64,

    /// How long a deviation must last before it is recorded as a violation.
    #[serde(default = "default_dwell_seconds")]
    pub dwell_seconds: f64,

    #[serde(default = "default_per_question_seconds")]
    pub per_question_seconds: u64,

    /// Poll interval while calibrating and during the eye and head checks.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    #[serde(default = "default_quiz_tick_millis")]
    pub quiz_tick_millis: u64,

    /// JSON question bank; the built-in bank is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_bank: Option<String>,

    /// Pre-filled registration name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub candidate_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub candidate_email: String,
}

fn default_log_dir() -> String {
    "log".to_string()
}
fn default_calibration_seconds() -> f64 {
    5.0
}
fn default_dwell_seconds() -> f64 {
    3.0
}
fn default_per_question_seconds() -> u64 {
    30
}
fn default_tick_millis() -> u64 {
    20
}
fn default_quiz_tick_millis() -> u64 {
    200
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            calibration_seconds: default_calibration_seconds(),
            dwell_seconds: default_dwell_seconds(),
            per_question_seconds: default_per_question_seconds(),
            tick_millis: default_tick_millis(),
            quiz_tick_millis: default_quiz_tick_millis(),
            question_bank: None,
            candidate_name: String::new(),
            candidate_email: String::new(),
        }
    }
}

impl Config {
    /// Timing knobs for the session engine. Out-of-range values fall back to
    /// the defaults.
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            calibration_window: seconds(self.calibration_seconds)
                .unwrap_or(defaults.calibration_window),
            dwell: seconds(self.dwell_seconds).unwrap_or(defaults.dwell),
            per_question: Duration::from_secs(self.per_question_seconds),
            check_tick: Duration::from_millis(self.tick_millis.max(1)),
            quiz_tick: Duration::from_millis(self.quiz_tick_millis.max(1)),
        }
    }

    pub fn log_dir(&self) -> &Path {
        Path::new(&self.log_dir)
    }

    pub fn question_bank(&self) -> Option<&Path> {
        self.question_bank
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(Path::new)
    }
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

fn parse_seconds(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Return the path to `~/.proctor/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".proctor").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, ProctorError> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, ProctorError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        ProctorError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| ProctorError::Config(format!("failed to parse config: {e}")))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Defaults with the `PROCTOR_*` overrides applied, for when no config file
/// could be loaded.
pub fn default_with_env() -> Config {
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg);
    cfg
}

/// Apply `PROCTOR_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `PROCTOR_LOG_DIR` | `log_dir` |
/// | `PROCTOR_CALIBRATION_SECONDS` | `calibration_seconds` |
/// | `PROCTOR_DWELL_SECONDS` | `dwell_seconds` |
/// | `PROCTOR_PER_QUESTION_SECONDS` | `per_question_seconds` |
/// | `PROCTOR_TICK_MILLIS` | `tick_millis` |
/// | `PROCTOR_QUESTION_BANK` | `question_bank` |
///
/// Unparseable numbers are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("PROCTOR_LOG_DIR") {
        cfg.log_dir = v;
    }
    if let Ok(v) = std::env::var("PROCTOR_CALIBRATION_SECONDS")
        && let Some(secs) = parse_seconds(&v)
    {
        cfg.calibration_seconds = secs;
    }
    if let Ok(v) = std::env::var("PROCTOR_DWELL_SECONDS")
        && let Some(secs) = parse_seconds(&v)
    {
        cfg.dwell_seconds = secs;
    }
    if let Ok(v) = std::env::var("PROCTOR_PER_QUESTION_SECONDS")
        && let Ok(secs) = v.trim().parse::<u64>()
    {
        cfg.per_question_seconds = secs;
    }
    if let Ok(v) = std::env::var("PROCTOR_TICK_MILLIS")
        && let Ok(millis) = v.trim().parse::<u64>()
    {
        cfg.tick_millis = millis;
    }
    if let Ok(v) = std::env::var("PROCTOR_QUESTION_BANK") {
        cfg.question_bank = Some(v);
    }
}

/// Save the config to disk, creating `~/.proctor/` if necessary.
pub fn save(cfg: &Config) -> Result<(), ProctorError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), ProctorError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ProctorError::Config(format!("failed to create config directory: {e}")))?;
        // Restrict the config directory to the owner only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                ProctorError::Config(format!("failed to set config directory permissions: {e}"))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| ProctorError::Serialization(format!("failed to serialize config: {e}")))?;
    let write_err = |e: std::io::Error| {
        ProctorError::Config(format!("failed to write config at {}: {e}", path.display()))
    };
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}
