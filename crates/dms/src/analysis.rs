//! DMS analysis results and alerts

use alerting::AlarmDecision;
use face_geometry::FrameSignals;
use serde::{Deserialize, Serialize};

use crate::state::{AlertLevel, DebounceState};

/// DMS alert types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmsAlert {
    /// Eye closure sustained past the debounce window
    Drowsiness,

    /// A yawn was confirmed this frame
    Yawn,

    /// Head angle beyond the tilt threshold
    HeadTilt,

    /// Face not visible for too long (camera blocked?)
    FaceNotVisible,
}

/// Detection status of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameStatus {
    /// No face this frame; session state was left untouched
    NoFace,
    /// At least one face measured
    Detected,
}

/// Signals and level of one face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceAnalysis {
    pub signals: FrameSignals,
    pub alert_level: AlertLevel,
}

/// Complete per-frame analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub status: FrameStatus,

    /// Primary face (the first one reported by the detector)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<FaceAnalysis>,

    /// Other faces; measured only, never fed into session state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary: Vec<FaceAnalysis>,

    /// Alarm controller decision; no-face frames report the held latch
    pub alarm: AlarmDecision,

    /// Debounce counters after this frame
    pub debounce: DebounceState,

    /// Active alerts
    pub alerts: Vec<DmsAlert>,
}

impl FrameAnalysis {
    /// Fused level of the primary face, `None` on no-face frames
    pub fn alert_level(&self) -> Option<AlertLevel> {
        self.primary.map(|face| face.alert_level)
    }

    /// Check if any alerts are active
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// Get highest severity alert
    pub fn highest_severity_alert(&self) -> Option<DmsAlert> {
        // Priority: Drowsiness > FaceNotVisible > Yawn > HeadTilt
        [
            DmsAlert::Drowsiness,
            DmsAlert::FaceNotVisible,
            DmsAlert::Yawn,
            DmsAlert::HeadTilt,
        ]
        .into_iter()
        .find(|alert| self.alerts.contains(alert))
    }
}
