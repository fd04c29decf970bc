//! Driver state tracking

use serde::{Deserialize, Serialize};

/// Fused drowsiness alert level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AlertLevel {
    #[default]
    Normal = 0,
    Mild = 1,
    Moderate = 2,
    Severe = 3,
}

impl AlertLevel {
    /// Map an additive score onto a level, clamping at `Severe`
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => Self::Normal,
            1 => Self::Mild,
            2 => Self::Moderate,
            _ => Self::Severe,
        }
    }

    /// Status text shown to the driver
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Mild => "MILD DROWSY",
            Self::Moderate => "MODERATE DROWSY",
            Self::Severe => "SEVERE DROWSY",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the debounce counters and alarm latch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DebounceState {
    /// Consecutive frames with EAR below `min_ear`
    pub consecutive_low_eye_frames: u32,
    /// Open-mouth frames counted towards the next yawn confirmation
    pub consecutive_high_mouth_frames: u32,
    /// Alarm already fired for the current closure episode
    pub alarm_active: bool,
}
