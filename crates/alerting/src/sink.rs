//! Alarm sinks (the "play alert sound" collaborator)

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::AlarmError;

/// Plays the alert once
///
/// Implementations may block; the actuator calls them off the frame loop.
pub trait AlarmSink: Send + Sync + 'static {
    fn play_alert(&self) -> Result<(), AlarmError>;
}

/// Runs an external audio player, e.g. `aplay alarm.wav`
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    args: Vec<String>,
    sound: Option<PathBuf>,
}

impl CommandSink {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            sound: None,
        }
    }

    /// Sound file that must exist before the player is started
    ///
    /// The path is appended to the player arguments.
    pub fn with_sound(mut self, sound: impl Into<PathBuf>) -> Self {
        self.sound = Some(sound.into());
        self
    }
}

impl AlarmSink for CommandSink {
    fn play_alert(&self) -> Result<(), AlarmError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null());

        if let Some(sound) = &self.sound {
            if !sound.exists() {
                return Err(AlarmError::ResourceUnavailable(format!(
                    "sound file {} not found",
                    sound.display()
                )));
            }
            command.arg(sound);
        }

        debug!("Running alarm player {}", self.program);
        let status = command
            .status()
            .map_err(|e| AlarmError::Playback(format!("{}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(AlarmError::Playback(format!("{} exited with {}", self.program, status)))
        }
    }
}

/// Terminal bell plus a log line; used when no player is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AlarmSink for LogSink {
    fn play_alert(&self) -> Result<(), AlarmError> {
        eprint!("\x07");
        warn!("DROWSINESS ALERT!");
        Ok(())
    }
}

/// Test double counting alarm invocations
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that records the call and then reports a missing resource
    pub fn failing() -> Self {
        Self {
            calls: Arc::default(),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AlarmSink for RecordingSink {
    fn play_alert(&self) -> Result<(), AlarmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(AlarmError::ResourceUnavailable("alarm.wav".to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_counts() {
        let sink = RecordingSink::new();
        let handle = sink.clone();
        sink.play_alert().unwrap();
        sink.play_alert().unwrap();
        assert_eq!(handle.calls(), 2);
    }

    #[test]
    fn test_missing_sound_file() {
        let sink = CommandSink::new("aplay", vec!["-q".to_string()])
            .with_sound("/nonexistent/drowsiness/alarm.wav");
        assert!(matches!(sink.play_alert(), Err(AlarmError::ResourceUnavailable(_))));
    }

    #[test]
    fn test_missing_player() {
        let sink = CommandSink::new("definitely-not-an-audio-player-binary", vec![]);
        assert!(matches!(sink.play_alert(), Err(AlarmError::Playback(_))));
    }
}
