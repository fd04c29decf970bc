//! Monitor settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use dms::DmsConfig;
use serde::Deserialize;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Host settings read from the same sources as `DmsConfig`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// JSON-lines landmark stream; stdin when unset
    pub input: Option<PathBuf>,
    /// Directory for saved session summaries
    pub session_dir: PathBuf,
    /// External player for the alert sound; log-only alarm when unset
    pub alarm_command: Option<String>,
    pub alarm_args: Vec<String>,
    /// Sound file passed to the player
    pub alarm_sound: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    /// Landmark frames buffered between reader thread and frame loop
    pub frame_buffer: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: None,
            session_dir: PathBuf::from("."),
            alarm_command: None,
            alarm_args: Vec::new(),
            alarm_sound: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            frame_buffer: 64,
        }
    }
}

impl Settings {
    /// Load host settings and DMS thresholds from an optional file plus `DMS_*` env vars
    pub fn load(path: Option<&Path>) -> anyhow::Result<(Self, DmsConfig)> {
        let source = DmsConfig::source(path).context("reading configuration")?;
        let dms = DmsConfig::from_source(&source).context("invalid DMS configuration")?;
        let settings: Settings = source
            .try_deserialize()
            .context("invalid monitor settings")?;
        Ok((settings, dms))
    }
}
