//! Evidence sink – persists a frame together with the reason it was flagged.
//!
//! Artifact names follow `{reason}_{unix_timestamp}.png`, one file per
//! emitted violation. Frames are written verbatim; encoding the image is the
//! capture driver's job.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use proctor_types::ProctorError;
use tracing::info;

use crate::camera::Frame;

/// Extension of every evidence artifact.
pub const ARTIFACT_EXTENSION: &str = "png";

/// Build the artifact file name for `reason` at `at`.
///
/// ```
/// use chrono::DateTime;
/// use proctor_hal::evidence::artifact_name;
///
/// let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
/// assert_eq!(artifact_name("mobile_detected", at), "mobile_detected_1700000000.png");
/// ```
pub fn artifact_name(reason: &str, at: DateTime<Utc>) -> String {
    format!("{reason}_{}.{ARTIFACT_EXTENSION}", at.timestamp())
}

/// Destination for violation evidence.
pub trait EvidenceSink {
    /// Persist `frame` under `reason` and return an artifact identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProctorError::Evidence`] when the artifact cannot be written.
    /// Callers log the error and carry on.
    fn persist(
        &mut self,
        frame: &Frame,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<String, ProctorError>;
}

/// Writes each artifact as a file inside a directory.
#[derive(Debug, Clone)]
pub struct DirEvidenceSink {
    dir: PathBuf,
}

impl DirEvidenceSink {
    /// Create the sink, creating `dir` if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`ProctorError::Evidence`] when the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ProctorError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            ProctorError::Evidence(format!("failed to create {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pick a path that does not overwrite an earlier artifact from the same
    /// second.
    fn free_path(&self, reason: &str, at: DateTime<Utc>) -> PathBuf {
        let path = self.dir.join(artifact_name(reason, at));
        if !path.exists() {
            return path;
        }
        (1u32..)
            .map(|n| {
                self.dir
                    .join(format!("{reason}_{}_{n}.{ARTIFACT_EXTENSION}", at.timestamp()))
            })
            .find(|p| !p.exists())
            .unwrap_or(path)
    }
}

impl EvidenceSink for DirEvidenceSink {
    fn persist(
        &mut self,
        frame: &Frame,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<String, ProctorError> {
        let path = self.free_path(reason, at);
        fs::write(&path, &frame.data).map_err(|e| {
            ProctorError::Evidence(format!("failed to write {}: {e}", path.display()))
        })?;
        info!(artifact = %path.display(), "violation evidence saved");
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame {
            seq: 7,
            width: 1,
            height: 1,
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn writes_named_artifact() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut sink = DirEvidenceSink::new(dir.path().join("log")).expect("sink");
        let at = DateTime::from_timestamp(1_700_000_123, 0).expect("ts");

        let id = sink.persist(&frame(), "mobile_detected", at).expect("persist");
        assert!(id.ends_with("mobile_detected_1700000123.png"));
        assert_eq!(std::fs::read(&id).expect("read back"), vec![1, 2, 3]);
    }

    #[test]
    fn same_second_artifacts_do_not_overwrite() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut sink = DirEvidenceSink::new(dir.path()).expect("sink");
        let at = DateTime::from_timestamp(1_700_000_000, 0).expect("ts");

        let first = sink.persist(&frame(), "head_looking_left", at).expect("first");
        let second = sink.persist(&frame(), "head_looking_left", at).expect("second");
        assert_ne!(first, second);
        assert!(second.ends_with("head_looking_left_1700000000_1.png"));
    }

    #[test]
    fn missing_directory_is_an_evidence_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut sink = DirEvidenceSink::new(dir.path().join("gone")).expect("sink");
        std::fs::remove_dir(sink.dir()).expect("remove");
        let at = DateTime::from_timestamp(1_700_000_000, 0).expect("ts");
        assert!(matches!(
            sink.persist(&frame(), "eye_looking_left", at),
            Err(ProctorError::Evidence(_))
        ));
    }
}
