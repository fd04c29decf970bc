//! Drowsiness Monitor
//!
//! Runs the DMS pipeline over a landmark stream, raises the alarm on
//! sustained eye closure and saves session summaries.

pub mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alerting::{AlarmActuator, AlarmController, AlarmDecision, AlarmSink, CommandSink, LogSink};
use anyhow::Context;
use chrono::{DateTime, Local};
use dms::{DetectionSession, DmsConfig, FrameStatus};
use landmarks::{JsonlSource, LandmarkFrame, LandmarkService};
use storage::SessionStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

pub use settings::{LogFormat, Settings};

/// Time allowed for a playing alarm to finish at shutdown
const ALARM_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize logging; `RUST_LOG` overrides `level`
pub fn init_logging(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))
}

/// Run the monitor until the landmark stream ends or Ctrl-C
///
/// Returns the path of the final session file, `None` if saving failed.
pub async fn run(settings: Settings, config: DmsConfig) -> anyhow::Result<Option<PathBuf>> {
    let (actuator, alarm_task) = AlarmActuator::spawn(alarm_sink(&settings));
    let mut session = DetectionSession::new(config, AlarmController::new(actuator), Local::now())?;
    let store = SessionStore::new(&settings.session_dir);

    let mut frames = match &settings.input {
        Some(path) => LandmarkService::spawn(
            JsonlSource::open(path).with_context(|| format!("opening {}", path.display()))?,
            settings.frame_buffer,
        ),
        None => {
            info!("Reading landmark frames from stdin");
            LandmarkService::spawn(JsonlSource::stdin(), settings.frame_buffer)
        }
    };

    let mut clock = FrameClock::default();
    let mut snapshot = SnapshotTrigger::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!("Starting detection...");
    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(frame) => handle_frame(&mut session, &mut clock, &frame),
                None => {
                    info!("Landmark stream finished");
                    break;
                }
            },
            _ = &mut ctrl_c => {
                info!("Quitting...");
                break;
            }
            _ = snapshot.recv() => {
                save_snapshot(&session, &store, clock.now());
            }
        }
    }

    let saved = finish(&session, &store, clock.now());

    drop(session);
    if tokio::time::timeout(ALARM_DRAIN_TIMEOUT, alarm_task).await.is_err() {
        warn!("Alarm still playing at shutdown, not waiting for it");
    }

    Ok(saved)
}

fn alarm_sink(settings: &Settings) -> Arc<dyn AlarmSink> {
    match &settings.alarm_command {
        Some(program) => {
            let mut sink = CommandSink::new(program.clone(), settings.alarm_args.clone());
            if let Some(sound) = &settings.alarm_sound {
                sink = sink.with_sound(sound.clone());
            }
            info!("Alarm player: {}", program);
            Arc::new(sink)
        }
        None => {
            info!("No alarm player configured, alerts go to the log");
            Arc::new(LogSink)
        }
    }
}

fn handle_frame(session: &mut DetectionSession, clock: &mut FrameClock, frame: &LandmarkFrame) {
    let first = clock.frames == 0;
    let now = clock.stamp(frame);
    if first && clock.replaying() {
        session.set_start_time(now);
    }
    let analysis = session.process_frame(&frame.faces, now);

    if analysis.alarm == AlarmDecision::Fire {
        warn!(sequence = frame.sequence, "DROWSINESS ALERT!");
    }

    match (analysis.status, analysis.primary) {
        (FrameStatus::Detected, Some(face)) => debug!(
            sequence = frame.sequence,
            ear = ?face.signals.eye_aspect_ratio,
            mar = face.signals.mouth_aspect_ratio,
            head_angle = face.signals.head_angle_degrees,
            level = %face.alert_level,
            faces = frame.faces.len(),
            "Frame processed"
        ),
        _ => debug!(sequence = frame.sequence, "No face detected"),
    }

    if let Some(alert) = analysis.highest_severity_alert() {
        debug!(sequence = frame.sequence, ?alert, "Active alert");
    }
}

fn save_snapshot(session: &DetectionSession, store: &SessionStore, now: DateTime<Local>) -> Option<PathBuf> {
    match store.save(&session.summarize(now), now) {
        Ok(path) => Some(path),
        Err(e) => {
            error!("Failed to save session data: {}", e);
            None
        }
    }
}

fn finish(session: &DetectionSession, store: &SessionStore, now: DateTime<Local>) -> Option<PathBuf> {
    let summary = session.summarize(now);

    info!("=== Final Session Summary ===");
    info!("Session Duration: {:.1} minutes", summary.duration_minutes);
    info!("Total Drowsy Episodes: {}", summary.drowsy_episodes);
    info!("Total Yawns Detected: {}", summary.total_yawns);
    if session.aggregator().ear_history().is_empty() {
        info!("Average Eye Aspect Ratio: no data");
    } else {
        info!("Average Eye Aspect Ratio: {:.3}", summary.average_ear);
        info!(
            "Eye closure ratio: {:.1}%",
            session.aggregator().perclos(session.config().min_ear) * 100.0
        );
    }

    save_snapshot(session, store, now)
}

/// Session time source
///
/// Frames carrying a capture timestamp are processed at that time, so a
/// replayed recording keeps its own timeline; other frames use the wall clock.
#[derive(Debug, Default)]
struct FrameClock {
    frames: u64,
    last_capture: Option<DateTime<Local>>,
}

impl FrameClock {
    fn stamp(&mut self, frame: &LandmarkFrame) -> DateTime<Local> {
        self.frames += 1;
        self.last_capture = frame.captured_at();
        self.last_capture.unwrap_or_else(Local::now)
    }

    /// Whether the latest frame carried its own timestamp
    fn replaying(&self) -> bool {
        self.last_capture.is_some()
    }

    /// Time for summaries: the latest capture time while replaying
    fn now(&self) -> DateTime<Local> {
        self.last_capture.unwrap_or_else(Local::now)
    }
}

/// Manual snapshot request (SIGUSR1 on unix)
struct SnapshotTrigger {
    #[cfg(unix)]
    signal: Option<tokio::signal::unix::Signal>,
}

impl SnapshotTrigger {
    fn new() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let signal = match signal(SignalKind::user_defined1()) {
                Ok(s) => {
                    info!("Send SIGUSR1 to save session data");
                    Some(s)
                }
                Err(e) => {
                    warn!("Manual snapshots unavailable: {}", e);
                    None
                }
            };
            Self { signal }
        }
        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        {
            if let Some(signal) = self.signal.as_mut() {
                if signal.recv().await.is_some() {
                    return;
                }
                self.signal = None;
            }
        }
        std::future::pending::<()>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn eye_json(ear: f64) -> String {
        let h = ear * 5.0;
        format!(
            "[[10,10],[13,{a}],[17,{a}],[20,10],[17,{b}],[13,{b}]]",
            a = 10.0 - h,
            b = 10.0 + h
        )
    }

    fn frame_line(sequence: u64, ear: Option<f64>) -> String {
        match ear {
            Some(ear) => format!(
                "{{\"sequence\":{},\"faces\":[{{\"left_eye\":{e},\"right_eye\":{e}}}]}}",
                sequence,
                e = eye_json(ear)
            ),
            None => format!("{{\"sequence\":{},\"faces\":[]}}", sequence),
        }
    }

    #[tokio::test]
    async fn test_replay_saves_final_summary() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("frames.jsonl");

        let mut lines: Vec<String> = (0..12).map(|i| frame_line(i, Some(0.15))).collect();
        lines.push(frame_line(12, None));
        lines.push(frame_line(13, Some(0.35)));
        fs::write(&input, lines.join("\n")).unwrap();

        let settings = Settings {
            input: Some(input),
            session_dir: dir.path().join("sessions"),
            ..Default::default()
        };

        let saved = run(settings, DmsConfig::default()).await.unwrap().unwrap();
        let summary = SessionStore::new(dir.path().join("sessions")).load(&saved).unwrap();

        assert_eq!(summary.drowsy_episodes, 1);
        assert_eq!(summary.total_yawns, 0);
        assert!((summary.min_ear - 0.15).abs() < 1e-9);
        assert_eq!(summary.yawn_frequency, 0.0);
    }

    /// Open eyes, plus wide-open lips when `yawning`, captured at `timestamp_ms`
    fn timed_line(sequence: u64, timestamp_ms: i64, yawning: bool) -> String {
        let lips = if yawning {
            ",\"top_lip\":[[0,0],[0,0],[0.3,-0.4],[0,0],[0.7,-0.4],[0,0]],\
             \"bottom_lip\":[[1,0],[0,0],[0.7,0.4],[0,0],[0.3,0.4],[0,0]]"
        } else {
            ""
        };
        format!(
            "{{\"sequence\":{},\"timestamp_ms\":{},\"faces\":[{{\"left_eye\":{e},\"right_eye\":{e}{}}}]}}",
            sequence,
            timestamp_ms,
            lips,
            e = eye_json(0.35)
        )
    }

    #[tokio::test]
    async fn test_replay_uses_capture_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("recording.jsonl");

        // ten minutes of frames one second apart, one yawn in the middle
        let base_ms = 1_709_280_000_000;
        let lines: Vec<String> = (0..601)
            .map(|i| timed_line(i, base_ms + i as i64 * 1000, (300..303).contains(&i)))
            .collect();
        fs::write(&input, lines.join("\n")).unwrap();

        let settings = Settings {
            input: Some(input),
            session_dir: dir.path().join("sessions"),
            ..Default::default()
        };

        let saved = run(settings, DmsConfig::default()).await.unwrap().unwrap();
        let summary = SessionStore::new(dir.path().join("sessions")).load(&saved).unwrap();

        assert!((summary.duration_minutes - 10.0).abs() < 1e-9);
        assert_eq!(summary.total_yawns, 1);
        assert!((summary.yawn_frequency - 0.1).abs() < 1e-9);
        let last = LandmarkFrame::new(600, base_ms + 600_000, vec![]).captured_at().unwrap();
        assert_eq!(summary.date, last.naive_local());
    }

    #[test]
    fn test_clock_falls_back_to_wall_time() {
        let mut clock = FrameClock::default();
        let before = Local::now();
        let stamped = clock.stamp(&LandmarkFrame::new(0, 0, vec![]));
        assert!(!clock.replaying());
        assert!(stamped >= before);

        let recorded = LandmarkFrame::new(1, 1_709_280_000_000, vec![]);
        assert_eq!(clock.stamp(&recorded), recorded.captured_at().unwrap());
        assert!(clock.replaying());
        assert_eq!(clock.now(), recorded.captured_at().unwrap());
    }

    #[tokio::test]
    async fn test_missing_input_is_an_error() {
        let settings = Settings {
            input: Some(PathBuf::from("/nonexistent/frames.jsonl")),
            ..Default::default()
        };
        assert!(run(settings, DmsConfig::default()).await.is_err());
    }
}
