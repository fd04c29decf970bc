//! DMS configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Environment variable prefix, e.g. `DMS_MIN_EAR`
pub const ENV_PREFIX: &str = "DMS";

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// EAR below which a frame counts as eyes-closed
    pub min_ear: f64,

    /// Consecutive closed frames before the closure is sustained
    pub eye_ar_consec_frames: u32,

    /// MAR above which the mouth counts as yawning
    pub yawn_threshold: f64,

    /// Consecutive open-mouth frames that confirm one yawn
    pub yawn_confirm_frames: u32,

    /// Head angle magnitude (degrees) that adds to the alert score
    pub head_tilt_threshold_degrees: f64,

    /// Fusion EAR bands: below `ear_severe_below` scores 3,
    /// below `ear_moderate_below` 2, below `ear_mild_below` 1
    pub ear_severe_below: f64,
    pub ear_moderate_below: f64,
    pub ear_mild_below: f64,

    /// Consecutive no-face frames before `FaceNotVisible` is raised
    pub face_absent_alert_frames: u32,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            min_ear: 0.28,
            eye_ar_consec_frames: 12,
            yawn_threshold: 0.6,
            yawn_confirm_frames: 3,
            head_tilt_threshold_degrees: 15.0,
            ear_severe_below: 0.20,
            ear_moderate_below: 0.25,
            ear_mild_below: 0.30,
            face_absent_alert_frames: 30,
        }
    }
}

impl DmsConfig {
    /// Create strict config (earlier alarms)
    pub fn strict() -> Self {
        Self {
            min_ear: 0.30,
            eye_ar_consec_frames: 8,
            yawn_confirm_frames: 2,
            ..Default::default()
        }
    }

    /// Create lenient config (fewer false alarms)
    pub fn lenient() -> Self {
        Self {
            min_ear: 0.25,
            eye_ar_consec_frames: 20,
            yawn_confirm_frames: 5,
            ..Default::default()
        }
    }

    /// Load from an optional TOML/JSON/YAML file overlaid with `DMS_*`
    /// environment variables; unset keys keep their defaults
    pub fn load(path: Option<&Path>) -> Result<Self, DmsError> {
        let source = Self::source(path)?;
        Self::from_source(&source)
    }

    /// Layered config source shared with other settings of the host binary
    pub fn source(path: Option<&Path>) -> Result<config::Config, DmsError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| DmsError::Config(e.to_string()))
    }

    /// Extract and validate the DMS keys of a config source
    pub fn from_source(source: &config::Config) -> Result<Self, DmsError> {
        let config: Self = source
            .clone()
            .try_deserialize()
            .map_err(|e| DmsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the debouncer or scorer cannot work with
    pub fn validate(&self) -> Result<(), DmsError> {
        if self.eye_ar_consec_frames == 0 {
            return Err(DmsError::Config("eye_ar_consec_frames must be at least 1".into()));
        }
        if self.yawn_confirm_frames == 0 {
            return Err(DmsError::Config("yawn_confirm_frames must be at least 1".into()));
        }
        if !(self.ear_severe_below <= self.ear_moderate_below
            && self.ear_moderate_below <= self.ear_mild_below)
        {
            return Err(DmsError::Config(format!(
                "EAR bands must ascend: {} <= {} <= {}",
                self.ear_severe_below, self.ear_moderate_below, self.ear_mild_below
            )));
        }
        let finite = [
            self.min_ear,
            self.yawn_threshold,
            self.head_tilt_threshold_degrees,
            self.ear_severe_below,
            self.ear_moderate_below,
            self.ear_mild_below,
        ];
        if finite.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(DmsError::Config("thresholds must be finite and non-negative".into()));
        }
        Ok(())
    }
}
