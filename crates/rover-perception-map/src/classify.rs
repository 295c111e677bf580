//! Per-pixel terrain classification of a warped frame.

use crate::params::ThresholdParams;
use rover_perception_core::{RgbImage, RgbImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Terrain class of a pixel or world-map counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainClass {
    Obstacle,
    Rock,
    Navigable,
}

impl TerrainClass {
    pub const ALL: [TerrainClass; 3] = [
        TerrainClass::Obstacle,
        TerrainClass::Rock,
        TerrainClass::Navigable,
    ];

    /// RGB channel carrying this class in the composite and map renderings.
    #[inline]
    pub fn channel(self) -> usize {
        match self {
            TerrainClass::Obstacle => 0,
            TerrainClass::Rock => 1,
            TerrainClass::Navigable => 2,
        }
    }

    /// Whether `rgb` satisfies this class's predicate.
    #[inline]
    pub fn matches(self, rgb: [u8; 3], thresholds: &ThresholdParams) -> bool {
        let [r, g, b] = rgb;
        match self {
            TerrainClass::Navigable => {
                let t = thresholds.navigable;
                r > t[0] && g > t[1] && b > t[2]
            }
            TerrainClass::Obstacle => {
                let t = thresholds.obstacle;
                r < t[0] && g < t[1] && b < t[2]
            }
            TerrainClass::Rock => {
                let t = thresholds.rock;
                r > t[0] && g > t[1] && b < t[2]
            }
        }
    }
}

/// Binary per-class image with the dimensions of the frame it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub class: TerrainClass,
    pub width: usize,
    pub height: usize,
    pub data: Vec<bool>, // row-major, len = w*h
}

impl Mask {
    pub fn empty(class: TerrainClass, width: usize, height: usize) -> Self {
        Self {
            class,
            width,
            height,
            data: vec![false; width * height],
        }
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> bool {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: bool) {
        self.data[row * self.width + col] = value;
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Set pixels as `(row, col)`, row-major.
    pub fn set_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let w = self.width.max(1);
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v)
            .map(move |(i, _)| (i / w, i % w))
    }
}

/// The three masks produced from one warped frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassMasks {
    pub obstacle: Mask,
    pub rock: Mask,
    pub navigable: Mask,
}

impl ClassMasks {
    pub fn get(&self, class: TerrainClass) -> &Mask {
        match class {
            TerrainClass::Obstacle => &self.obstacle,
            TerrainClass::Rock => &self.rock,
            TerrainClass::Navigable => &self.navigable,
        }
    }
}

/// Threshold `frame` for a single class.
pub fn classify(
    frame: &RgbImageView<'_>,
    class: TerrainClass,
    thresholds: &ThresholdParams,
) -> Mask {
    let data = frame
        .pixels()
        .map(|(_, _, rgb)| class.matches(rgb, thresholds))
        .collect();
    Mask {
        class,
        width: frame.width,
        height: frame.height,
        data,
    }
}

/// Threshold `frame` for every class. Predicates are independent, so a
/// pixel may land in no mask or in several.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(frame, thresholds),
        fields(width = frame.width, height = frame.height)
    )
)]
pub fn classify_all(frame: &RgbImageView<'_>, thresholds: &ThresholdParams) -> ClassMasks {
    ClassMasks {
        obstacle: classify(frame, TerrainClass::Obstacle, thresholds),
        rock: classify(frame, TerrainClass::Rock, thresholds),
        navigable: classify(frame, TerrainClass::Navigable, thresholds),
    }
}

/// Display composite: obstacle pixels light the red channel, rocks green,
/// navigable terrain blue.
pub fn composite(masks: &ClassMasks) -> RgbImage {
    let (w, h) = (masks.navigable.width, masks.navigable.height);
    let mut out = RgbImage::new(w, h);
    for class in TerrainClass::ALL {
        let c = class.channel();
        for (i, _) in masks.get(class).data.iter().enumerate().filter(|&(_, &v)| v) {
            out.data[i * 3 + c] = 255;
        }
    }
    out
}
