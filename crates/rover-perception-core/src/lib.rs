//! Core image and geometry utilities for rover terrain perception.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about terrain classes or world maps; see `rover-perception-map` for those.

mod homography;
mod image;
mod logger;

pub use homography::{homography_from_4pt, quad_is_degenerate, warp_perspective_rgb, Homography};
pub use image::{sample_bilinear_rgb, sample_bilinear_rgb_u8, RgbImage, RgbImageView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
