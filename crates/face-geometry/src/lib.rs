//! Facial Geometry Computation
//!
//! Pure functions turning landmark point sets into scalar signals.

mod ratios;
mod signals;
mod statistics;

pub use ratios::{eye_aspect_ratio, head_tilt_degrees, mouth_aspect_ratio, MIN_REFERENCE_DISTANCE};
pub use signals::{FrameSignals, SignalExtractor};
pub use statistics::EarStatistics;

use thiserror::Error;

/// Errors while computing a geometric ratio
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Contour has fewer points than the ratio needs
    #[error("Contour needs {needed} points, got {got}")]
    InsufficientPoints { needed: usize, got: usize },

    /// Horizontal reference distance collapsed to (almost) zero
    #[error("Degenerate contour: reference distance {0:e}")]
    Degenerate(f64),
}
