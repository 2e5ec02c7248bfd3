//! Summary artifact lifecycle.
//!
//! A published summary is backed by a temporary `.html` file that a viewer can
//! open in isolation. The manager owns the only live file; publishing a new
//! summary deletes the previous one in the same step.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::Url;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::conversation::MessageId;

/// Result type for artifact operations.
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Errors creating an artifact handle.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Creating or writing the backing file failed.
    #[error("failed to write summary document in {dir}: {source}")]
    Io {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The live artifact: document text plus the file backing it.
#[derive(Debug)]
struct LiveArtifact {
    message_id: MessageId,
    document: String,
    created_at: DateTime<Utc>,
    handle: NamedTempFile,
}

impl LiveArtifact {
    fn info(&self) -> ArtifactInfo {
        ArtifactInfo {
            message_id: self.message_id,
            document: self.document.clone(),
            path: self.handle.path().to_path_buf(),
            created_at: self.created_at,
        }
    }
}

/// Snapshot of the active artifact handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactInfo {
    /// Message the summary belongs to.
    pub message_id: MessageId,
    /// Sanitized document text.
    pub document: String,
    /// Backing file. Only valid while this artifact is active.
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl ArtifactInfo {
    /// `file://` URL of the backing file, percent-encoded.
    ///
    /// Relative paths cannot form a file URL and are returned with the
    /// scheme prefixed as-is.
    pub fn url(&self) -> String {
        Url::from_file_path(&self.path)
            .map(String::from)
            .unwrap_or_else(|()| format!("file://{}", self.path.display()))
    }
}

/// Owner of the single summary artifact slot.
#[derive(Debug)]
pub struct ArtifactManager {
    dir: PathBuf,
    active: Option<LiveArtifact>,
}

impl Default for ArtifactManager {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl ArtifactManager {
    /// Create a manager that writes artifacts into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            active: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replace the active artifact with `document` for `message_id`.
    ///
    /// The new file is written first. If that fails the previous artifact stays
    /// active; otherwise the previous file is deleted before returning.
    pub fn publish(
        &mut self,
        document: impl Into<String>,
        message_id: MessageId,
    ) -> ArtifactResult<ArtifactInfo> {
        let document = document.into();
        let handle = self.write_handle(&document)?;

        let replacement = LiveArtifact {
            message_id,
            document,
            created_at: Utc::now(),
            handle,
        };
        let info = replacement.info();

        if let Some(previous) = self.active.replace(replacement) {
            close_artifact(previous);
        }

        info!(
            "published summary for message {} at {}",
            message_id,
            info.path.display()
        );
        Ok(info)
    }

    /// The active artifact, if any.
    pub fn current(&self) -> Option<ArtifactInfo> {
        self.active.as_ref().map(LiveArtifact::info)
    }

    /// Whether the active artifact belongs to `message_id`.
    pub fn is_active_for(&self, message_id: MessageId) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.message_id == message_id)
    }

    /// Drop the active artifact and delete its file.
    pub fn release(&mut self) {
        if let Some(previous) = self.active.take() {
            close_artifact(previous);
        }
    }

    fn write_handle(&self, document: &str) -> ArtifactResult<NamedTempFile> {
        let io_err = |source| ArtifactError::Io {
            dir: self.dir.clone(),
            source,
        };

        let mut handle = tempfile::Builder::new()
            .prefix("summary-")
            .suffix(".html")
            .tempfile_in(&self.dir)
            .map_err(io_err)?;
        handle.write_all(document.as_bytes()).map_err(io_err)?;
        handle.flush().map_err(io_err)?;
        Ok(handle)
    }
}

impl Drop for ArtifactManager {
    fn drop(&mut self) {
        self.release();
    }
}

fn close_artifact(artifact: LiveArtifact) {
    let path = artifact.handle.path().to_path_buf();
    if let Err(e) = artifact.handle.close() {
        warn!("failed to remove summary file {}: {}", path.display(), e);
    } else {
        debug!("released summary for message {}", artifact.message_id);
    }
}
