//! Per-face frame signals

use landmarks::{FaceRegion, LandmarkSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ratios::{eye_aspect_ratio, head_tilt_degrees, mouth_aspect_ratio};

/// Scalar signals of one face in one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameSignals {
    /// Mean EAR over the eyes that produced a ratio; `None` when neither did
    pub eye_aspect_ratio: Option<f64>,
    /// Mouth aspect ratio; 0.0 when the lips are missing or degenerate
    pub mouth_aspect_ratio: f64,
    /// Whether the lips were measured this frame
    pub mouth_measured: bool,
    /// Nose-tip → chin angle in degrees; 0.0 when either group is missing
    pub head_angle_degrees: f64,
}

impl FrameSignals {
    pub fn new(ear: f64, mar: f64, head_angle_degrees: f64) -> Self {
        Self {
            eye_aspect_ratio: Some(ear),
            mouth_aspect_ratio: mar,
            mouth_measured: true,
            head_angle_degrees,
        }
    }
}

/// Turns a landmark set into `FrameSignals`
///
/// Missing or degenerate regions fall back to neutral values so the other
/// signals of the frame stay usable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalExtractor;

impl SignalExtractor {
    pub fn extract(landmarks: &LandmarkSet) -> FrameSignals {
        let (mouth_aspect_ratio, mouth_measured) = match landmarks.mouth() {
            Some(mouth) => match mouth_aspect_ratio(&mouth) {
                Ok(mar) => (mar, true),
                Err(e) => {
                    debug!("Mouth ratio unavailable: {}", e);
                    (0.0, false)
                }
            },
            None => {
                trace!("Lip landmarks missing");
                (0.0, false)
            }
        };

        FrameSignals {
            eye_aspect_ratio: Self::eye_ratio(landmarks),
            mouth_aspect_ratio,
            mouth_measured,
            head_angle_degrees: head_tilt_degrees(
                landmarks.region(FaceRegion::NoseTip),
                landmarks.region(FaceRegion::Chin),
            ),
        }
    }

    fn eye_ratio(landmarks: &LandmarkSet) -> Option<f64> {
        let ratios: Vec<f64> = [FaceRegion::LeftEye, FaceRegion::RightEye]
            .into_iter()
            .filter_map(|region| {
                let points = landmarks.region(region)?;
                match eye_aspect_ratio(points) {
                    Ok(ear) => Some(ear),
                    Err(e) => {
                        debug!("{:?} ratio unavailable: {}", region, e);
                        None
                    }
                }
            })
            .collect();

        if ratios.is_empty() {
            None
        } else {
            Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
        }
    }
}
