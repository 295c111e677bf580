//! Per-frame perception step.
//!
//! One step warps the camera frame to a top-down view, classifies it, maps
//! every class into the world map and summarizes navigable and rock pixels
//! in polar form for the steering logic.

use crate::classify::{classify_all, composite, TerrainClass};
use crate::coords::{to_local, to_world, Pose};
use crate::error::{ConfigError, InputError};
use crate::params::PerceptionParams;
use crate::polar::{to_polar, PolarSet};
use crate::world_map::WorldMap;
use log::{debug, warn};
use rover_perception_core::{
    homography_from_4pt, warp_perspective_rgb, Homography, RgbImage, RgbImageView,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pixel counts of one class in one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStats {
    /// Set pixels in the warped mask.
    pub pixels: usize,
    /// Of those, pixels in the near field (mapped into the world).
    pub near_field: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    pub obstacle: ClassStats,
    pub rock: ClassStats,
    pub navigable: ClassStats,
}

impl StepStats {
    pub fn get(&self, class: TerrainClass) -> ClassStats {
        match class {
            TerrainClass::Obstacle => self.obstacle,
            TerrainClass::Rock => self.rock,
            TerrainClass::Navigable => self.navigable,
        }
    }

    fn slot(&mut self, class: TerrainClass) -> &mut ClassStats {
        match class {
            TerrainClass::Obstacle => &mut self.obstacle,
            TerrainClass::Rock => &mut self.rock,
            TerrainClass::Navigable => &mut self.navigable,
        }
    }
}

/// Observable output of a perception step (besides the updated map).
#[derive(Clone, Debug)]
pub struct StepOutput {
    /// Class composite of the warped frame, for display only.
    pub vision: RgbImage,
    pub navigable: PolarSet,
    pub rock: PolarSet,
    pub stats: StepStats,
}

/// Validated configuration plus the cached perspective homography.
#[derive(Clone, Debug)]
pub struct PerceptionPipeline {
    params: PerceptionParams,
    h_top_from_cam: Homography,
    h_cam_from_top: Homography,
}

impl PerceptionPipeline {
    /// Validate `params` and solve the perspective homography once.
    pub fn new(params: PerceptionParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let src = params.perspective.source_points();
        let dst = params.perspective.destination_points();
        let h_top_from_cam =
            homography_from_4pt(&src, &dst).ok_or(ConfigError::SingularHomography)?;
        let h_cam_from_top = h_top_from_cam
            .inverse()
            .ok_or(ConfigError::SingularHomography)?;

        Ok(Self {
            params,
            h_top_from_cam,
            h_cam_from_top,
        })
    }

    #[inline]
    pub fn params(&self) -> &PerceptionParams {
        &self.params
    }

    /// Homography taking camera pixels to top-down pixels.
    #[inline]
    pub fn homography(&self) -> &Homography {
        &self.h_top_from_cam
    }

    /// Fresh zeroed map of the configured size.
    pub fn new_world_map(&self) -> WorldMap {
        WorldMap::new(self.params.world_size)
    }

    /// Re-project a camera frame into the top-down view (same dimensions).
    pub fn warp(&self, frame: &RgbImageView<'_>) -> RgbImage {
        warp_perspective_rgb(frame, &self.h_cam_from_top, frame.width, frame.height)
    }

    /// Check a step's inputs without touching anything.
    pub fn validate_inputs(
        &self,
        frame: &RgbImageView<'_>,
        pose: &Pose,
        map: &WorldMap,
    ) -> Result<(), InputError> {
        let expected = (self.params.frame_width, self.params.frame_height);
        let got = (frame.width, frame.height);
        if expected != got {
            return Err(InputError::FrameSizeMismatch { expected, got });
        }
        if frame.data.len() != frame.expected_len() {
            return Err(InputError::BufferLength {
                expected: frame.expected_len(),
                got: frame.data.len(),
            });
        }
        if !pose.is_finite() {
            return Err(InputError::NonFinitePose {
                x: pose.x,
                y: pose.y,
                heading_deg: pose.heading_deg,
            });
        }
        if map.size() != self.params.world_size {
            return Err(InputError::MapSizeMismatch {
                expected: self.params.world_size,
                got: map.size(),
            });
        }
        Ok(())
    }

    /// Run one perception step and accumulate its evidence into `map`.
    ///
    /// On error the map is left untouched.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, frame, map),
            fields(width = frame.width, height = frame.height)
        )
    )]
    pub fn step(
        &self,
        frame: &RgbImageView<'_>,
        pose: &Pose,
        map: &mut WorldMap,
    ) -> Result<StepOutput, InputError> {
        if let Err(err) = self.validate_inputs(frame, pose, map) {
            warn!("rejected frame: {err}");
            return Err(err);
        }

        let p = &self.params;
        let warped = self.warp(frame);
        let masks = classify_all(&warped.view(), &p.thresholds);

        let mut stats = StepStats::default();
        let mut navigable = PolarSet::default();
        let mut rock = PolarSet::default();

        for class in TerrainClass::ALL {
            let mask = masks.get(class);
            let local = to_local(mask, p.near_field_ratio);
            let cells = to_world(&local, pose, p.scale, p.world_size);
            map.accumulate(&cells, class, weight_for(p, class));

            *stats.slot(class) = ClassStats {
                pixels: mask.count(),
                near_field: local.len(),
            };

            match class {
                TerrainClass::Navigable => navigable = to_polar(&local),
                TerrainClass::Rock => rock = to_polar(&local),
                TerrainClass::Obstacle => {}
            }
        }

        debug!(
            "step at ({:.2}, {:.2}, {:.1}deg): navigable={} obstacle={} rock={} (near field)",
            pose.x,
            pose.y,
            pose.heading_deg,
            stats.navigable.near_field,
            stats.obstacle.near_field,
            stats.rock.near_field
        );

        Ok(StepOutput {
            vision: composite(&masks),
            navigable,
            rock,
            stats,
        })
    }
}

fn weight_for(params: &PerceptionParams, class: TerrainClass) -> u32 {
    match class {
        TerrainClass::Obstacle => params.weights.obstacle,
        TerrainClass::Rock => params.weights.rock,
        TerrainClass::Navigable => params.weights.navigable,
    }
}
