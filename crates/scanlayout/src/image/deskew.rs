//! Skew estimation and correction.

use super::hough::{LineSegment, SegmentParams, detect_segments};
use crate::core::config::NormalizeConfig;
use image::{GrayImage, Luma};
use imageproc::edges::canny;

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Skew correction settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeskewParams {
    /// With fewer segments than this, no estimate is produced.
    pub min_segments: usize,
    /// Estimates at or below this magnitude, in degrees, are not corrected.
    pub threshold_degrees: f64,
    pub segments: SegmentParams,
}

impl Default for DeskewParams {
    fn default() -> Self {
        Self {
            min_segments: 6,
            threshold_degrees: 0.3,
            segments: SegmentParams::default(),
        }
    }
}

impl From<&NormalizeConfig> for DeskewParams {
    fn from(config: &NormalizeConfig) -> Self {
        Self {
            min_segments: config.min_skew_segments,
            threshold_degrees: config.skew_threshold_degrees,
            segments: SegmentParams::default(),
        }
    }
}

/// Median segment angle of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewEstimate {
    /// Degrees in `[-45, 45]`; positive means text lines descend to the right.
    pub angle: f64,
    pub segment_count: usize,
}

/// Fold a segment direction into `[-45, 45]` so that horizontal and vertical
/// rulings agree.
pub fn fold_angle(angle: f64) -> f64 {
    if angle < -45.0 {
        angle + 90.0
    } else if angle > 45.0 {
        angle - 90.0
    } else {
        angle
    }
}

/// Estimate page skew from straight segments in the edge map.
///
/// Returns `None` when fewer than `params.min_segments` segments are found.
pub fn estimate_skew(gray: &GrayImage, params: &DeskewParams) -> Option<SkewEstimate> {
    let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
    let segments = detect_segments(&edges, &params.segments);

    if segments.len() < params.min_segments {
        tracing::debug!(
            segments = segments.len(),
            required = params.min_segments,
            "Too few line segments for skew estimate"
        );
        return None;
    }

    let angles: Vec<f64> = segments.iter().map(|s: &LineSegment| fold_angle(s.angle)).collect();
    Some(SkewEstimate {
        angle: median(angles),
        segment_count: segments.len(),
    })
}

/// Rotate the page so the estimated skew becomes zero.
///
/// The input is returned unchanged when there is no reliable estimate or the
/// estimate is within the threshold.
pub fn deskew(gray: &GrayImage, params: &DeskewParams) -> GrayImage {
    match estimate_skew(gray, params) {
        Some(estimate) if estimate.angle.abs() > params.threshold_degrees => {
            tracing::debug!(
                angle = estimate.angle,
                segments = estimate.segment_count,
                "Correcting skew"
            );
            rotate_about_center(gray, -estimate.angle)
        }
        _ => gray.clone(),
    }
}

/// Rotate content about the image centre by `degrees` (positive turns
/// rightward lines downward), keeping the original size.
///
/// Uses bicubic interpolation. Samples outside the image repeat the nearest
/// edge pixel, so no dark border appears.
pub fn rotate_about_center(gray: &GrayImage, degrees: f64) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let cx = (f64::from(width) - 1.0) / 2.0;
    let cy = (f64::from(height) - 1.0) / 2.0;
    // Inverse mapping: output pixel -> source position.
    let (sin, cos) = (-degrees).to_radians().sin_cos();

    GrayImage::from_fn(width, height, |x, y| {
        let dx = f64::from(x) - cx;
        let dy = f64::from(y) - cy;
        let sx = cx + cos * dx - sin * dy;
        let sy = cy + sin * dx + cos * dy;
        Luma([sample_bicubic(gray, sx, sy)])
    })
}

fn sample_bicubic(gray: &GrayImage, x: f64, y: f64) -> u8 {
    let (width, height) = gray.dimensions();
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let wx = cubic_weights(fx);
    let wy = cubic_weights(fy);

    let max_x = i64::from(width) - 1;
    let max_y = i64::from(height) - 1;
    let mut value = 0.0;
    for (j, wyj) in wy.iter().enumerate() {
        let py = (y0 as i64 - 1 + j as i64).clamp(0, max_y) as u32;
        let mut row = 0.0;
        for (i, wxi) in wx.iter().enumerate() {
            let px = (x0 as i64 - 1 + i as i64).clamp(0, max_x) as u32;
            row += wxi * f64::from(gray.get_pixel(px, py).0[0]);
        }
        value += wyj * row;
    }

    value.round().clamp(0.0, 255.0) as u8
}

/// Keys cubic convolution weights with `a = -0.75`.
fn cubic_weights(t: f64) -> [f64; 4] {
    const A: f64 = -0.75;
    let w0 = ((A * (t + 1.0) - 5.0 * A) * (t + 1.0) + 8.0 * A) * (t + 1.0) - 4.0 * A;
    let w1 = ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0;
    let w2 = ((A + 2.0) * (1.0 - t) - (A + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    let w3 = 1.0 - w0 - w1 - w2;
    [w0, w1, w2, w3]
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
