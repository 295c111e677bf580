//! Image → vehicle-local → world coordinate conversions.
//!
//! Vehicle-local frame: origin at the ground contact point, `x` forward,
//! `y` to the left. World frame: map cells, `x` east and `y` north.

use crate::classify::Mask;
use crate::params::near_field_start_row;
use nalgebra::{Point2, Rotation2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A point in the vehicle-local frame, in warped pixels.
pub type LocalPoint = Point2<f64>;

/// Vehicle pose in the world frame at the instant a frame was captured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    /// Heading in degrees, counter-clockwise from the world `x` axis. Any
    /// real value is accepted.
    pub heading_deg: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading_deg: f64) -> Self {
        Self { x, y, heading_deg }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.heading_deg.is_finite()
    }
}

/// Integer world-map cell index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldCell {
    pub x: usize,
    pub y: usize,
}

/// Convert the near-field set pixels of `mask` into vehicle-local points.
///
/// Rows above `floor(height * near_field_ratio)` are dropped. A pixel at
/// `(row, col)` becomes `(height - row, width / 2 - col)`.
pub fn to_local(mask: &Mask, near_field_ratio: f64) -> Vec<LocalPoint> {
    let start_row = near_field_start_row(mask.height, near_field_ratio);
    let height = mask.height as f64;
    let half_width = mask.width as f64 / 2.0;

    mask.set_pixels()
        .filter(|&(row, _)| row >= start_row)
        .map(|(row, col)| Point2::new(height - row as f64, half_width - col as f64))
        .collect()
}

/// Rotate points counter-clockwise by `heading_deg` degrees.
pub fn rotate(points: &[LocalPoint], heading_deg: f64) -> Vec<LocalPoint> {
    let rot = Rotation2::new(heading_deg.to_radians());
    points.iter().map(|p| rot * p).collect()
}

/// Scale points down by `scale` and shift them by `(dx, dy)`.
pub fn translate(points: &[LocalPoint], dx: f64, dy: f64, scale: f64) -> Vec<Point2<f64>> {
    points
        .iter()
        .map(|p| Point2::new(p.x / scale + dx, p.y / scale + dy))
        .collect()
}

/// Map vehicle-local points into world cells seen from `pose`.
///
/// Coordinates are truncated toward zero and clamped per axis into
/// `[0, world_size - 1]`; points beyond the map saturate at its border.
/// Returns nothing for a zero-sized world.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(points), fields(points = points.len()))
)]
pub fn to_world(
    points: &[LocalPoint],
    pose: &Pose,
    scale: f64,
    world_size: usize,
) -> Vec<WorldCell> {
    if world_size == 0 {
        return Vec::new();
    }
    let rotated = rotate(points, pose.heading_deg);
    translate(&rotated, pose.x, pose.y, scale)
        .into_iter()
        .map(|p| WorldCell {
            x: clamp_index(p.x, world_size),
            y: clamp_index(p.y, world_size),
        })
        .collect()
}

#[inline]
fn clamp_index(v: f64, world_size: usize) -> usize {
    let t = v.trunc();
    if t.is_nan() {
        return 0;
    }
    t.clamp(0.0, (world_size - 1) as f64) as usize
}
