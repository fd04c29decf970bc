//! Facial Landmark Library for Driver Monitoring
//!
//! Provides the per-frame landmark model produced by an external face
//! landmark detector, plus sources that feed it into the DMS pipeline:
//! - Named facial regions with ordered 2D point lists
//! - JSON-lines replay of recorded detector output
//! - Threaded service forwarding frames over a tokio channel

pub mod landmark;
pub mod source;

pub use landmark::{FaceRegion, LandmarkFrame, LandmarkSet, Point2};
pub use source::{JsonlSource, LandmarkService, LandmarkSource};

use thiserror::Error;

/// Landmark source error types
#[derive(Error, Debug)]
pub enum LandmarkError {
    #[error("Failed to read landmark stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed landmark frame on line {line}: {message}")]
    Decode { line: usize, message: String },
}
