//! Driver Monitoring System (DMS)
//!
//! Drowsiness decision core over per-frame facial landmarks:
//! - Eye/mouth/head signal fusion into an alert level
//! - Consecutive-frame debouncing of eye closure and yawns
//! - Edge-triggered alarm per drowsy episode
//! - Session statistics and summaries

pub mod analysis;
pub mod config;
pub mod debounce;
pub mod scorer;
pub mod session;
pub mod state;

pub use analysis::{DmsAlert, FaceAnalysis, FrameAnalysis, FrameStatus};
pub use config::DmsConfig;
pub use debounce::{DebounceOutcome, TemporalDebouncer};
pub use scorer::{FusionThresholds, SignalFusionScorer};
pub use session::{SessionAggregator, SessionStats, SessionSummary};
pub use state::{AlertLevel, DebounceState};

use alerting::{AlarmController, AlarmDecision};
use chrono::{DateTime, Local};
use face_geometry::SignalExtractor;
use landmarks::LandmarkSet;
use thiserror::Error;
use tracing::{debug, info};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// One detection session: debounce state, alarm latch and statistics
///
/// Each camera source owns its own session; nothing is shared between them.
pub struct DetectionSession {
    config: DmsConfig,
    scorer: SignalFusionScorer,
    debouncer: TemporalDebouncer,
    alarm: AlarmController,
    aggregator: SessionAggregator,
    face_absent_frames: u32,
    last_level: Option<AlertLevel>,
}

impl DetectionSession {
    /// Start a session at `start_time`
    pub fn new(
        config: DmsConfig,
        alarm: AlarmController,
        start_time: DateTime<Local>,
    ) -> Result<Self, DmsError> {
        config.validate()?;
        info!(
            "Starting detection session: min_ear={}, consec_frames={}, yawn_threshold={}",
            config.min_ear, config.eye_ar_consec_frames, config.yawn_threshold
        );

        Ok(Self {
            scorer: SignalFusionScorer::new(FusionThresholds::from(&config)),
            debouncer: TemporalDebouncer::new(&config),
            alarm,
            aggregator: SessionAggregator::new(start_time),
            face_absent_frames: 0,
            last_level: None,
            config,
        })
    }

    /// Analyze the faces detected in one frame
    ///
    /// The first face drives debounce, alarm and statistics; further faces
    /// are only measured. With no face at all every counter holds.
    pub fn process_frame(&mut self, faces: &[LandmarkSet], now: DateTime<Local>) -> FrameAnalysis {
        metrics::counter!("dms_frames_total").increment(1);

        let Some((primary, others)) = faces.split_first() else {
            return self.no_face_frame();
        };
        self.face_absent_frames = 0;

        let signals = SignalExtractor::extract(primary);
        let alert_level = self.scorer.classify_signals(&signals);
        self.track_level(alert_level);

        let outcome = self.debouncer.update(&signals);
        let alarm = self.alarm.on_frame(outcome.sustained_closure);

        if let Some(ear) = signals.eye_aspect_ratio {
            self.aggregator.record_frame(ear);
        }
        if alarm == AlarmDecision::Fire {
            self.aggregator.record_drowsy_episode();
            metrics::counter!("dms_drowsy_episodes_total").increment(1);
        }

        let mut alerts = Vec::new();
        if outcome.sustained_closure {
            alerts.push(DmsAlert::Drowsiness);
        }
        if outcome.yawn_confirmed {
            let offset = self.aggregator.elapsed_secs(now);
            self.aggregator.record_yawn(offset);
            metrics::counter!("dms_yawns_total").increment(1);
            info!("Yawn detected at {:.1}s (total {})", offset, self.aggregator.stats().yawn_count);
            alerts.push(DmsAlert::Yawn);
        }
        if signals.head_angle_degrees.abs() > self.config.head_tilt_threshold_degrees {
            alerts.push(DmsAlert::HeadTilt);
        }

        let secondary = others
            .iter()
            .map(|face| {
                let signals = SignalExtractor::extract(face);
                FaceAnalysis {
                    signals,
                    alert_level: self.scorer.classify_signals(&signals),
                }
            })
            .collect();

        FrameAnalysis {
            status: FrameStatus::Detected,
            primary: Some(FaceAnalysis {
                signals,
                alert_level,
            }),
            secondary,
            alarm,
            debounce: self.debounce_state(),
            alerts,
        }
    }

    fn no_face_frame(&mut self) -> FrameAnalysis {
        self.face_absent_frames = self.face_absent_frames.saturating_add(1);
        if self.face_absent_frames == 1 {
            debug!("No face detected, debounce counters held");
        }

        let alerts = if self.face_absent_frames > self.config.face_absent_alert_frames {
            vec![DmsAlert::FaceNotVisible]
        } else {
            vec![]
        };

        FrameAnalysis {
            status: FrameStatus::NoFace,
            primary: None,
            secondary: vec![],
            alarm: if self.alarm.is_active() {
                AlarmDecision::EpisodeActive
            } else {
                AlarmDecision::Idle
            },
            debounce: self.debounce_state(),
            alerts,
        }
    }

    fn track_level(&mut self, level: AlertLevel) {
        if self.last_level != Some(level) {
            info!("Alert level: {}", level);
            metrics::gauge!("dms_alert_level").set(level as u8 as f64);
            self.last_level = Some(level);
        }
    }

    /// Current debounce counters and alarm latch
    pub fn debounce_state(&self) -> DebounceState {
        DebounceState {
            consecutive_low_eye_frames: self.debouncer.low_eye_frames(),
            consecutive_high_mouth_frames: self.debouncer.high_mouth_frames(),
            alarm_active: self.alarm.is_active(),
        }
    }

    /// Session summary as of `now`; accumulation continues afterwards
    pub fn summarize(&self, now: DateTime<Local>) -> SessionSummary {
        self.aggregator.summarize(now)
    }

    /// Move the session clock start, e.g. to the first replayed frame
    pub fn set_start_time(&mut self, start_time: DateTime<Local>) {
        debug!("Session clock starts at {}", start_time);
        self.aggregator.set_start_time(start_time);
    }

    pub fn aggregator(&self) -> &SessionAggregator {
        &self.aggregator
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    /// Consecutive frames without a face
    pub fn face_absent_frames(&self) -> u32 {
        self.face_absent_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use landmarks::{FaceRegion, Point2};

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn eye(ear: f64) -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.3, -ear / 2.0),
            Point2::new(0.6, -ear / 2.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.6, ear / 2.0),
            Point2::new(0.3, ear / 2.0),
        ]
    }

    fn face(ear: f64) -> LandmarkSet {
        LandmarkSet::new()
            .with_region(FaceRegion::LeftEye, eye(ear))
            .with_region(FaceRegion::RightEye, eye(ear))
    }

    fn session() -> DetectionSession {
        DetectionSession::new(DmsConfig::default(), AlarmController::detached(), start()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = DmsConfig {
            yawn_confirm_frames: 0,
            ..Default::default()
        };
        assert!(DetectionSession::new(config, AlarmController::detached(), start()).is_err());
    }

    #[test]
    fn test_no_face_holds_counters() {
        let mut session = session();
        for _ in 0..5 {
            session.process_frame(&[face(0.15)], start());
        }

        let analysis = session.process_frame(&[], start());
        assert_eq!(analysis.status, FrameStatus::NoFace);
        assert_eq!(analysis.alert_level(), None);
        assert_eq!(analysis.debounce.consecutive_low_eye_frames, 5);
        assert_eq!(session.aggregator().ear_history().len(), 5);
    }

    #[test]
    fn test_dropout_does_not_break_closure() {
        let mut session = session();
        for _ in 0..6 {
            session.process_frame(&[face(0.15)], start());
        }
        for _ in 0..3 {
            session.process_frame(&[], start());
        }
        for _ in 0..5 {
            session.process_frame(&[face(0.15)], start());
        }

        let analysis = session.process_frame(&[face(0.15)], start());
        assert_eq!(analysis.alarm, AlarmDecision::Fire);
    }

    #[test]
    fn test_dropout_mid_episode_stays_active() {
        let mut session = session();
        for _ in 0..12 {
            session.process_frame(&[face(0.15)], start());
        }

        let analysis = session.process_frame(&[], start());
        assert_eq!(analysis.status, FrameStatus::NoFace);
        assert_eq!(analysis.alarm, AlarmDecision::EpisodeActive);
        assert!(analysis.debounce.alarm_active);

        let analysis = session.process_frame(&[face(0.35)], start());
        assert_eq!(analysis.alarm, AlarmDecision::Idle);
        assert_eq!(session.process_frame(&[], start()).alarm, AlarmDecision::Idle);
    }

    #[test]
    fn test_face_not_visible_after_threshold() {
        let mut session = session();
        for _ in 0..30 {
            assert!(!session.process_frame(&[], start()).has_alerts());
        }
        let analysis = session.process_frame(&[], start());
        assert_eq!(analysis.alerts, vec![DmsAlert::FaceNotVisible]);

        session.process_frame(&[face(0.35)], start());
        assert_eq!(session.face_absent_frames(), 0);
    }

    #[test]
    fn test_secondary_faces_do_not_touch_state() {
        let mut session = session();
        let analysis = session.process_frame(&[face(0.35), face(0.15)], start());

        assert_eq!(analysis.secondary.len(), 1);
        assert_eq!(analysis.secondary[0].alert_level, AlertLevel::Severe);
        assert_eq!(analysis.alert_level(), Some(AlertLevel::Normal));
        assert_eq!(analysis.debounce.consecutive_low_eye_frames, 0);
        assert_eq!(session.aggregator().ear_history(), &[0.35]);
    }

    #[test]
    fn test_yawn_recorded_with_offset() {
        let mut mouth = vec![Point2::default(); 12];
        mouth[0] = Point2::new(0.0, 0.0);
        mouth[6] = Point2::new(1.0, 0.0);
        mouth[2] = Point2::new(0.3, -0.4);
        mouth[10] = Point2::new(0.3, 0.4);
        mouth[4] = Point2::new(0.7, -0.4);
        mouth[8] = Point2::new(0.7, 0.4);
        let bottom = mouth.split_off(6);
        let yawning = face(0.35)
            .with_region(FaceRegion::TopLip, mouth)
            .with_region(FaceRegion::BottomLip, bottom);

        let mut session = session();
        let t = start() + Duration::seconds(42);
        session.process_frame(&[yawning.clone()], t);
        session.process_frame(&[yawning.clone()], t);
        let analysis = session.process_frame(&[yawning], t);

        assert!(analysis.alerts.contains(&DmsAlert::Yawn));
        assert_eq!(analysis.alert_level(), Some(AlertLevel::Moderate));
        assert_eq!(session.aggregator().yawn_timestamps(), &[42.0]);
        assert_eq!(session.summarize(t).total_yawns, 1);
    }
}
