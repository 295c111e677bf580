//! Terrain perception for a camera-equipped rover.
//!
//! Each frame goes through the same pipeline:
//! 1. Warp the camera frame into a top-down view with a fixed homography.
//! 2. Threshold it into navigable, obstacle and rock masks.
//! 3. Map the near-field mask pixels into the vehicle-local frame.
//! 4. Rotate, scale and translate them by the pose into world-map cells.
//! 5. Add per-class evidence to the persistent [`WorldMap`].
//! 6. Summarize navigable and rock pixels as (distance, bearing) pairs.
//!
//! ## Quickstart
//!
//! ```
//! use rover_perception_core::RgbImage;
//! use rover_perception_map::{PerceptionParams, PerceptionPipeline, Pose};
//!
//! let pipeline = PerceptionPipeline::new(PerceptionParams::default()).unwrap();
//! let mut map = pipeline.new_world_map();
//!
//! let frame = RgbImage::filled(320, 160, [180, 175, 170]);
//! let out = pipeline
//!     .step(&frame.view(), &Pose::new(100.0, 100.0, 0.0), &mut map)
//!     .unwrap();
//! println!("navigable pixels: {}", out.navigable.len());
//! ```
//!
//! The world map is the only state carried between frames. Steps borrow it
//! mutably, so concurrent hosts must serialize access themselves.

mod classify;
mod coords;
mod error;
pub mod io;
mod params;
mod pipeline;
mod polar;
mod world_map;

pub use classify::{classify, classify_all, composite, ClassMasks, Mask, TerrainClass};
pub use coords::{rotate, to_local, to_world, translate, LocalPoint, Pose, WorldCell};
pub use error::{ConfigError, InputError, QuadRole};
pub use params::{
    top_down_destination, AccumulationWeights, PerceptionParams, PerspectiveParams,
    ThresholdParams,
};
pub use pipeline::{ClassStats, PerceptionPipeline, StepOutput, StepStats};
pub use polar::{to_polar, PolarSet};
pub use world_map::{CellCounts, WorldMap};
