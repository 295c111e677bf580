use crate::{core, map};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the `image`-based helpers.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("invalid RGB image buffer length (expected {expected} bytes, got {got})")]
    InvalidRgbBuffer { expected: usize, got: usize },

    #[error("invalid RGB image dimensions (width={width}, height={height})")]
    InvalidRgbDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Input(#[from] map::InputError),
}

/// Borrow an `image::RgbImage` as the lightweight core view type.
pub fn rgb_view(img: &::image::RgbImage) -> core::RgbImageView<'_> {
    core::RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Convert a core RGB image into an `image::RgbImage`.
pub fn to_image_rgb(img: core::RgbImage) -> Result<::image::RgbImage, FrameError> {
    let (width, height) = (img.width as u32, img.height as u32);
    ::image::RgbImage::from_raw(width, height, img.data)
        .ok_or(FrameError::InvalidRgbDimensions { width, height })
}

/// Build an `image::RgbImage` from a raw interleaved RGB buffer.
pub fn rgb_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<::image::RgbImage, FrameError> {
    let w = usize::try_from(width).ok();
    let h = usize::try_from(height).ok();
    let Some((w, h)) = w.zip(h) else {
        return Err(FrameError::InvalidRgbDimensions { width, height });
    };
    let Some(expected) = w.checked_mul(h).and_then(|n| n.checked_mul(3)) else {
        return Err(FrameError::InvalidRgbDimensions { width, height });
    };
    if pixels.len() != expected {
        return Err(FrameError::InvalidRgbBuffer {
            expected,
            got: pixels.len(),
        });
    }
    ::image::RgbImage::from_raw(width, height, pixels.to_vec())
        .ok_or(FrameError::InvalidRgbDimensions { width, height })
}

/// Run one perception step on an `image::RgbImage`.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(pipeline, img, world),
        fields(width = img.width(), height = img.height())
    )
)]
pub fn perceive(
    pipeline: &map::PerceptionPipeline,
    img: &::image::RgbImage,
    pose: &map::Pose,
    world: &mut map::WorldMap,
) -> Result<map::StepOutput, FrameError> {
    Ok(pipeline.step(&rgb_view(img), pose, world)?)
}

/// Render the world map as an RGB image for display.
///
/// Obstacle evidence goes to red, rocks to green and navigable terrain to
/// blue, each saturated at 255. Image row 0 is the map's largest `y` so that
/// world north points up.
pub fn render_world_map(world: &map::WorldMap) -> ::image::RgbImage {
    let n = world.size() as u32;
    ::image::RgbImage::from_fn(n, n, |col, row| {
        let y = (n - 1 - row) as usize;
        let counts = world.get(col as usize, y).unwrap_or_default();
        let mut px = [0u8; 3];
        for class in map::TerrainClass::ALL {
            px[class.channel()] = counts.get(class).min(255) as u8;
        }
        ::image::Rgb(px)
    })
}
