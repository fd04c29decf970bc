//! Eye/mouth aspect ratios and head tilt

use landmarks::Point2;

use crate::GeometryError;

/// Reference distances at or below this are treated as degenerate
pub const MIN_REFERENCE_DISTANCE: f64 = 1e-9;

const EYE_POINTS: usize = 6;
const MOUTH_POINTS: usize = 12;

/// Eye Aspect Ratio from the 6-point eye contour
///
/// `p0`/`p3` are the horizontal corners, `p1`/`p5` and `p2`/`p4` the
/// vertical pairs: `(|p1-p5| + |p2-p4|) / (2 |p0-p3|)`.
/// An open eye sits around 0.3, a closed one approaches 0.
pub fn eye_aspect_ratio(eye: &[Point2]) -> Result<f64, GeometryError> {
    if eye.len() < EYE_POINTS {
        return Err(GeometryError::InsufficientPoints {
            needed: EYE_POINTS,
            got: eye.len(),
        });
    }

    let vertical_1 = eye[1].distance(&eye[5]);
    let vertical_2 = eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);

    ratio(vertical_1 + vertical_2, horizontal)
}

/// Mouth Aspect Ratio from the concatenated top-lip + bottom-lip contour
///
/// `(|m2-m10| + |m4-m8|) / (2 |m0-m6|)`; large values mean an open mouth.
pub fn mouth_aspect_ratio(mouth: &[Point2]) -> Result<f64, GeometryError> {
    if mouth.len() < MOUTH_POINTS {
        return Err(GeometryError::InsufficientPoints {
            needed: MOUTH_POINTS,
            got: mouth.len(),
        });
    }

    let height_1 = mouth[2].distance(&mouth[10]);
    let height_2 = mouth[4].distance(&mouth[8]);
    let width = mouth[0].distance(&mouth[6]);

    ratio(height_1 + height_2, width)
}

fn ratio(vertical_sum: f64, horizontal: f64) -> Result<f64, GeometryError> {
    if horizontal.is_nan() || horizontal <= MIN_REFERENCE_DISTANCE {
        return Err(GeometryError::Degenerate(horizontal));
    }
    Ok(vertical_sum / (2.0 * horizontal))
}

/// Angle in degrees, range (-180, 180], of the nose-tip → chin centroid vector
///
/// Returns 0.0 when either group is missing.
pub fn head_tilt_degrees(nose_tip: Option<&[Point2]>, chin: Option<&[Point2]>) -> f64 {
    let (Some(nose), Some(chin)) = (
        nose_tip.and_then(Point2::centroid),
        chin.and_then(Point2::centroid),
    ) else {
        return 0.0;
    };

    let degrees = (chin.y - nose.y).atan2(chin.x - nose.x).to_degrees();
    if degrees <= -180.0 {
        degrees + 360.0
    } else {
        degrees
    }
}
