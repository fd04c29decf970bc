//! Landmark point sets and per-frame detector output

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 2D image-space point
///
/// Serialized as an `[x, y]` pair, the shape most landmark detectors emit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Mean position of a point group, `None` for an empty group
    pub fn centroid(points: &[Point2]) -> Option<Point2> {
        if points.is_empty() {
            return None;
        }

        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));

        Some(Point2::new(sx / n, sy / n))
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point2> for (f64, f64) {
    fn from(p: Point2) -> Self {
        (p.x, p.y)
    }
}

/// Named facial region reported by the landmark detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceRegion {
    Chin,
    LeftEyebrow,
    RightEyebrow,
    NoseBridge,
    NoseTip,
    LeftEye,
    RightEye,
    TopLip,
    BottomLip,
}

/// Landmarks of one detected face
///
/// Regions the detector did not report are simply absent; accessors return
/// `None` for them instead of an empty slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    regions: BTreeMap<FaceRegion, Vec<Point2>>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style region insert
    pub fn with_region(mut self, region: FaceRegion, points: Vec<Point2>) -> Self {
        self.insert(region, points);
        self
    }

    /// Replace the points of a region
    pub fn insert(&mut self, region: FaceRegion, points: Vec<Point2>) {
        self.regions.insert(region, points);
    }

    /// Points of a region; `None` when the region is missing or empty
    pub fn region(&self, region: FaceRegion) -> Option<&[Point2]> {
        self.regions
            .get(&region)
            .map(Vec::as_slice)
            .filter(|points| !points.is_empty())
    }

    /// Mouth contour: top lip followed by bottom lip
    ///
    /// Requires both lips; a half mouth has no meaningful aspect ratio.
    pub fn mouth(&self) -> Option<Vec<Point2>> {
        let top = self.region(FaceRegion::TopLip)?;
        let bottom = self.region(FaceRegion::BottomLip)?;

        let mut mouth = Vec::with_capacity(top.len() + bottom.len());
        mouth.extend_from_slice(top);
        mouth.extend_from_slice(bottom);
        Some(mouth)
    }

    /// Regions that carry at least one point
    pub fn regions(&self) -> impl Iterator<Item = FaceRegion> + '_ {
        self.regions
            .iter()
            .filter(|(_, points)| !points.is_empty())
            .map(|(region, _)| *region)
    }

    pub fn is_empty(&self) -> bool {
        self.regions().next().is_none()
    }
}

/// Detector output for one video frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Frame sequence number
    #[serde(default)]
    pub sequence: u64,
    /// Capture timestamp (milliseconds since the Unix epoch)
    #[serde(default)]
    pub timestamp_ms: i64,
    /// One entry per detected face; empty when no face was found
    #[serde(default)]
    pub faces: Vec<LandmarkSet>,
}

impl LandmarkFrame {
    pub fn new(sequence: u64, timestamp_ms: i64, faces: Vec<LandmarkSet>) -> Self {
        Self {
            sequence,
            timestamp_ms,
            faces,
        }
    }

    /// Check whether the detector found any face
    pub fn has_face(&self) -> bool {
        !self.faces.is_empty()
    }

    /// Capture time as local time; `None` when the detector sent no timestamp
    pub fn captured_at(&self) -> Option<DateTime<Local>> {
        if self.timestamp_ms <= 0 {
            return None;
        }
        Local.timestamp_millis_opt(self.timestamp_ms).single()
    }
}
