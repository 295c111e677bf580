use crate::error::{ConfigError, QuadRole};
use crate::world_map::CellCounts;
use nalgebra::Point2;
use rover_perception_core::quad_is_degenerate;
use serde::{Deserialize, Serialize};

/// Per-class RGB thresholds. All comparisons are strict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Navigable when every channel is above these values.
    pub navigable: [u8; 3],
    /// Obstacle when every channel is below these values.
    pub obstacle: [u8; 3],
    /// Rock when red and green are above, and blue below, these values.
    pub rock: [u8; 3],
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            navigable: [160, 160, 160],
            obstacle: [130, 130, 130],
            rock: [130, 105, 50],
        }
    }
}

/// Counter increments applied to a world cell per observed pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulationWeights {
    pub obstacle: u32,
    pub rock: u32,
    pub navigable: u32,
}

impl Default for AccumulationWeights {
    fn default() -> Self {
        Self {
            obstacle: 3,
            rock: 255,
            navigable: 255,
        }
    }
}

/// Source (camera) and destination (top-down) quads, in pixel `[x, y]`.
///
/// Corner order must match between the two quads.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveParams {
    pub source: [[f64; 2]; 4],
    pub destination: [[f64; 2]; 4],
}

impl PerspectiveParams {
    /// Camera trapezoid of the reference rover mount, for a `width` x `height` frame.
    pub fn for_frame(width: usize, height: usize) -> Self {
        Self {
            source: [[14.0, 140.0], [301.0, 140.0], [200.0, 96.0], [118.0, 96.0]],
            destination: top_down_destination(width, height, 5.0, 6.0),
        }
    }

    pub fn source_points(&self) -> [Point2<f64>; 4] {
        self.source.map(|[x, y]| Point2::new(x, y))
    }

    pub fn destination_points(&self) -> [Point2<f64>; 4] {
        self.destination.map(|[x, y]| Point2::new(x, y))
    }
}

/// Destination square of side `2 * half_size` centered horizontally,
/// `bottom_offset` pixels above the bottom edge.
///
/// Corner order is bottom-left, bottom-right, top-right, top-left, matching
/// the reference source trapezoid, which covers one world unit on the ground.
pub fn top_down_destination(
    width: usize,
    height: usize,
    half_size: f64,
    bottom_offset: f64,
) -> [[f64; 2]; 4] {
    let cx = width as f64 / 2.0;
    let bottom = height as f64 - bottom_offset;
    let top = bottom - 2.0 * half_size;
    [
        [cx - half_size, bottom],
        [cx + half_size, bottom],
        [cx + half_size, top],
        [cx - half_size, top],
    ]
}

/// Immutable configuration of the perception pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionParams {
    /// Expected camera frame width in pixels.
    pub frame_width: usize,
    /// Expected camera frame height in pixels.
    pub frame_height: usize,
    pub thresholds: ThresholdParams,
    pub perspective: PerspectiveParams,
    /// Warped pixels per world unit.
    pub scale: f64,
    /// Side length of the square world map, in cells.
    pub world_size: usize,
    /// Fraction of warped rows, counted from the top, that are discarded
    /// before mapping to vehicle coordinates.
    pub near_field_ratio: f64,
    pub weights: AccumulationWeights,
}

impl Default for PerceptionParams {
    fn default() -> Self {
        Self {
            frame_width: 320,
            frame_height: 160,
            thresholds: ThresholdParams::default(),
            perspective: PerspectiveParams::for_frame(320, 160),
            scale: 10.0,
            world_size: 200,
            near_field_ratio: 0.5,
            weights: AccumulationWeights::default(),
        }
    }
}

impl PerceptionParams {
    /// Check scalar ranges and quad shapes.
    ///
    /// Homography solvability is checked separately when the pipeline is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let frame_bytes = self
            .frame_width
            .checked_mul(self.frame_height)
            .and_then(|n| n.checked_mul(3));
        if self.frame_width == 0 || self.frame_height == 0 || frame_bytes.is_none() {
            return Err(ConfigError::InvalidFrameSize {
                width: self.frame_width,
                height: self.frame_height,
            });
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        if self.world_size == 0 || !world_fits_in_memory(self.world_size) {
            return Err(ConfigError::InvalidWorldSize(self.world_size));
        }
        if !(0.0..1.0).contains(&self.near_field_ratio) {
            return Err(ConfigError::InvalidNearFieldRatio(self.near_field_ratio));
        }
        if quad_is_degenerate(&self.perspective.source_points()) {
            return Err(ConfigError::DegenerateQuad {
                quad: QuadRole::Source,
            });
        }
        if quad_is_degenerate(&self.perspective.destination_points()) {
            return Err(ConfigError::DegenerateQuad {
                quad: QuadRole::Destination,
            });
        }
        Ok(())
    }

    /// First warped row kept by the near-field crop.
    pub fn near_field_start_row(&self) -> usize {
        near_field_start_row(self.frame_height, self.near_field_ratio)
    }
}

/// Whether a `size` x `size` map can be allocated at all.
fn world_fits_in_memory(size: usize) -> bool {
    size.checked_mul(size)
        .and_then(|cells| cells.checked_mul(std::mem::size_of::<CellCounts>()))
        .is_some_and(|bytes| bytes <= isize::MAX as usize)
}

pub(crate) fn near_field_start_row(height: usize, ratio: f64) -> usize {
    ((height as f64 * ratio).floor() as usize).min(height)
}
