//! Session statistics and summaries

use chrono::{DateTime, Duration, Local, NaiveDateTime};
use face_geometry::EarStatistics;
use serde::{Deserialize, Serialize};

/// Timestamp format of `SessionSummary::date`
pub const SUMMARY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Raw accumulated data of one detection session (append-only)
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub start_time: DateTime<Local>,
    pub drowsy_episode_count: u32,
    pub yawn_count: u32,
    /// Primary-face EAR of every measured frame
    pub ear_history: Vec<f64>,
    /// Seconds since session start of every confirmed yawn
    pub yawn_timestamps: Vec<f64>,
}

/// Snapshot written at manual save and at shutdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(with = "summary_date")]
    pub date: NaiveDateTime,
    pub duration_minutes: f64,
    pub drowsy_episodes: u32,
    pub total_yawns: u32,
    pub average_ear: f64,
    pub min_ear: f64,
    /// Yawns per minute
    pub yawn_frequency: f64,
}

/// Accumulates confirmed events and EAR history over a session
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    stats: SessionStats,
}

impl SessionAggregator {
    pub fn new(start_time: DateTime<Local>) -> Self {
        Self {
            stats: SessionStats {
                start_time,
                drowsy_episode_count: 0,
                yawn_count: 0,
                ear_history: Vec::new(),
                yawn_timestamps: Vec::new(),
            },
        }
    }

    /// Archive the EAR of a measured frame
    pub fn record_frame(&mut self, ear: f64) {
        self.stats.ear_history.push(ear);
    }

    /// Record a confirmed yawn, `offset_secs` after session start
    pub fn record_yawn(&mut self, offset_secs: f64) {
        self.stats.yawn_count += 1;
        self.stats.yawn_timestamps.push(offset_secs);
    }

    pub fn record_drowsy_episode(&mut self) {
        self.stats.drowsy_episode_count += 1;
    }

    /// Seconds elapsed since session start (never negative)
    pub fn elapsed_secs(&self, now: DateTime<Local>) -> f64 {
        let elapsed = now.signed_duration_since(self.stats.start_time);
        (elapsed.num_milliseconds() as f64 / 1000.0).max(0.0)
    }

    /// Yawns confirmed within `window` before `now`
    pub fn yawns_in_last(&self, window: Duration, now: DateTime<Local>) -> usize {
        let cutoff = self.elapsed_secs(now) - window.num_milliseconds() as f64 / 1000.0;
        self.stats
            .yawn_timestamps
            .iter()
            .filter(|&&t| t >= cutoff)
            .count()
    }

    /// Fraction of archived frames with EAR below `threshold`
    pub fn perclos(&self, threshold: f64) -> f64 {
        EarStatistics::fraction_below(&self.stats.ear_history, threshold)
    }

    /// Primary-face EAR of every measured frame
    pub fn ear_history(&self) -> &[f64] {
        &self.stats.ear_history
    }

    /// Seconds since session start of every confirmed yawn
    pub fn yawn_timestamps(&self) -> &[f64] {
        &self.stats.yawn_timestamps
    }

    /// Move the session start, e.g. to the capture time of the first replayed frame
    pub fn set_start_time(&mut self, start_time: DateTime<Local>) {
        self.stats.start_time = start_time;
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Reduce the accumulated data; state is left untouched
    pub fn summarize(&self, now: DateTime<Local>) -> SessionSummary {
        let duration_minutes = self.elapsed_secs(now) / 60.0;
        let ear = EarStatistics::compute(&self.stats.ear_history);

        let yawn_frequency = if self.stats.yawn_timestamps.is_empty() || duration_minutes <= 0.0 {
            0.0
        } else {
            self.stats.yawn_timestamps.len() as f64 / duration_minutes
        };

        SessionSummary {
            date: now.naive_local(),
            duration_minutes,
            drowsy_episodes: self.stats.drowsy_episode_count,
            total_yawns: self.stats.yawn_count,
            average_ear: ear.mean,
            min_ear: ear.min,
            yawn_frequency,
        }
    }
}

mod summary_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::SUMMARY_DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(SUMMARY_DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, SUMMARY_DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_ear_summary() {
        let mut aggregator = SessionAggregator::new(start());
        for ear in [0.30, 0.25, 0.20] {
            aggregator.record_frame(ear);
        }

        let summary = aggregator.summarize(start() + Duration::minutes(1));
        assert!((summary.average_ear - 0.25).abs() < 1e-12);
        assert!((summary.min_ear - 0.20).abs() < 1e-12);
    }

    #[test]
    fn test_empty_session() {
        let aggregator = SessionAggregator::new(start());
        let summary = aggregator.summarize(start());

        assert_eq!(summary.average_ear, 0.0);
        assert_eq!(summary.min_ear, 0.0);
        assert_eq!(summary.yawn_frequency, 0.0);
        assert_eq!(summary.duration_minutes, 0.0);
    }

    #[test]
    fn test_yawn_frequency() {
        let mut aggregator = SessionAggregator::new(start());
        aggregator.record_yawn(30.0);
        aggregator.record_yawn(90.0);
        aggregator.record_yawn(150.0);
        aggregator.record_drowsy_episode();

        let summary = aggregator.summarize(start() + Duration::minutes(2));
        assert_eq!(summary.total_yawns, 3);
        assert_eq!(summary.drowsy_episodes, 1);
        assert!((summary.duration_minutes - 2.0).abs() < 1e-12);
        assert!((summary.yawn_frequency - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_yawns_at_zero_duration() {
        let mut aggregator = SessionAggregator::new(start());
        aggregator.record_yawn(0.0);
        assert_eq!(aggregator.summarize(start()).yawn_frequency, 0.0);
    }

    #[test]
    fn test_summarize_does_not_reset() {
        let mut aggregator = SessionAggregator::new(start());
        aggregator.record_frame(0.3);
        aggregator.record_yawn(1.0);

        let first = aggregator.summarize(start() + Duration::minutes(1));
        let second = aggregator.summarize(start() + Duration::minutes(1));
        assert_eq!(first, second);
        assert_eq!(aggregator.ear_history(), &[0.3]);
        assert_eq!(aggregator.yawn_timestamps(), &[1.0]);
    }

    #[test]
    fn test_moved_start_time() {
        let mut aggregator = SessionAggregator::new(start());
        aggregator.set_start_time(start() - Duration::minutes(30));
        let summary = aggregator.summarize(start());
        assert!((summary.duration_minutes - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_recent_yawns_and_perclos() {
        let mut aggregator = SessionAggregator::new(start());
        aggregator.record_yawn(10.0);
        aggregator.record_yawn(590.0);
        for ear in [0.1, 0.1, 0.3, 0.3] {
            aggregator.record_frame(ear);
        }

        let now = start() + Duration::minutes(10);
        assert_eq!(aggregator.yawns_in_last(Duration::minutes(1), now), 1);
        assert_eq!(aggregator.yawns_in_last(Duration::minutes(10), now), 2);
        assert_eq!(aggregator.perclos(0.2), 0.5);
    }

    #[test]
    fn test_summary_json_fields() {
        let summary = SessionSummary {
            date: start().naive_local(),
            duration_minutes: 1.5,
            drowsy_episodes: 2,
            total_yawns: 1,
            average_ear: 0.25,
            min_ear: 0.2,
            yawn_frequency: 0.5,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["date"], "2024-03-01 08:00:00");
        assert_eq!(json["duration_minutes"], 1.5);
        assert_eq!(json["drowsy_episodes"], 2);
        assert_eq!(json["total_yawns"], 1);
        assert_eq!(json["average_ear"], 0.25);
        assert_eq!(json["min_ear"], 0.2);
        assert_eq!(json["yawn_frequency"], 0.5);

        let back: SessionSummary = serde_json::from_value(json).unwrap();
        assert_eq!(back, summary);
    }
}
