//! High-level facade crate for the `rover-perception-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the core geometry crate and the mapping crate
//! - (feature `image`) helpers that run a perception step directly on an
//!   `image::RgbImage` and render the world map for display
//! - (feature `cli`) the `rover-perception` command-line tool
//!
//! ## Quickstart
//!
//! ```no_run
//! use rover_perception::frame;
//! use rover_perception::map::{PerceptionParams, PerceptionPipeline, Pose};
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = ImageReader::open("frame.jpg")?.decode()?.to_rgb8();
//! let pipeline = PerceptionPipeline::new(PerceptionParams::default())?;
//! let mut map = pipeline.new_world_map();
//!
//! let out = frame::perceive(&pipeline, &img, &Pose::new(99.7, 85.6, 56.8), &mut map)?;
//! println!("rock pixels: {}", out.rock.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `rover_perception::core`: RGB buffers, homographies, warping, logging.
//! - `rover_perception::map`: classification, frame transforms, world map,
//!   polar summaries and the perception step.
//! - `rover_perception::frame` (feature `image`): `image` crate adapters.

pub use rover_perception_core as core;
pub use rover_perception_map as map;

pub use rover_perception_map::{
    PerceptionParams, PerceptionPipeline, PolarSet, Pose, StepOutput, TerrainClass, WorldMap,
};

#[cfg(feature = "image")]
pub mod frame;
