//! Multi-signal fusion scoring

use face_geometry::FrameSignals;

use crate::config::DmsConfig;
use crate::state::AlertLevel;

/// Thresholds of the additive fusion score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionThresholds {
    pub ear_severe_below: f64,
    pub ear_moderate_below: f64,
    pub ear_mild_below: f64,
    pub mar_above: f64,
    pub head_angle_above: f64,
}

impl Default for FusionThresholds {
    fn default() -> Self {
        Self::from(&DmsConfig::default())
    }
}

impl From<&DmsConfig> for FusionThresholds {
    fn from(config: &DmsConfig) -> Self {
        Self {
            ear_severe_below: config.ear_severe_below,
            ear_moderate_below: config.ear_moderate_below,
            ear_mild_below: config.ear_mild_below,
            mar_above: config.yawn_threshold,
            head_angle_above: config.head_tilt_threshold_degrees,
        }
    }
}

/// Combines EAR, MAR and head angle into an `AlertLevel`
///
/// Each signal adds points independently; the sum is clamped to `Severe`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalFusionScorer {
    thresholds: FusionThresholds,
}

impl SignalFusionScorer {
    pub fn new(thresholds: FusionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, ear: f64, mar: f64, head_angle: f64) -> AlertLevel {
        AlertLevel::from_score(self.eye_score(ear) + self.mouth_score(mar) + self.head_score(head_angle))
    }

    /// Classify a frame; a missing EAR contributes nothing
    pub fn classify_signals(&self, signals: &FrameSignals) -> AlertLevel {
        let eye = signals.eye_aspect_ratio.map_or(0, |ear| self.eye_score(ear));
        AlertLevel::from_score(
            eye + self.mouth_score(signals.mouth_aspect_ratio)
                + self.head_score(signals.head_angle_degrees),
        )
    }

    fn eye_score(&self, ear: f64) -> u32 {
        let t = &self.thresholds;
        if ear < t.ear_severe_below {
            3
        } else if ear < t.ear_moderate_below {
            2
        } else if ear < t.ear_mild_below {
            1
        } else {
            0
        }
    }

    fn mouth_score(&self, mar: f64) -> u32 {
        if mar > self.thresholds.mar_above {
            2
        } else {
            0
        }
    }

    fn head_score(&self, head_angle: f64) -> u32 {
        if head_angle.abs() > self.thresholds.head_angle_above {
            1
        } else {
            0
        }
    }
}
