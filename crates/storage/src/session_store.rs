//! Session file store

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use dms::SessionSummary;
use tracing::{debug, info};

use crate::StorageError;

/// File name prefix of saved sessions
pub const FILE_PREFIX: &str = "drowsiness_session_";

const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Directory of `drowsiness_session_<YYYYMMDD_HHMMSS>.json` files
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a summary saved at `saved_at` is written to
    pub fn path_for(&self, saved_at: DateTime<Local>) -> PathBuf {
        self.dir.join(format!(
            "{}{}.json",
            FILE_PREFIX,
            saved_at.format(FILE_TIMESTAMP_FORMAT)
        ))
    }

    /// Write a summary as pretty-printed JSON
    ///
    /// A second save within the same second overwrites the first.
    pub fn save(&self, summary: &SessionSummary, saved_at: DateTime<Local>) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let path = self.path_for(saved_at);
        let json = serde_json::to_string_pretty(summary)?;
        fs::write(&path, json).map_err(|e| io_error(&path, e))?;

        info!("Session data saved to {}", path.display());
        Ok(path)
    }

    /// Read a saved summary back
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SessionSummary, StorageError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
            _ => io_error(path, e),
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Saved session files, oldest first
    pub fn list(&self) -> Result<Vec<PathBuf>, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.dir, e)),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(".json"))
            })
            .collect();

        // the timestamp in the name sorts chronologically
        files.sort();
        debug!("Found {} session files in {}", files.len(), self.dir.display());
        Ok(files)
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
