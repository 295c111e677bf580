//! JSON configuration, map persistence and report helpers.

use crate::coords::Pose;
use crate::pipeline::{PerceptionPipeline, StepOutput, StepStats};
use crate::polar::PolarSet;
use crate::world_map::{CellCounts, WorldMap};
use crate::{PerceptionParams, TerrainClass};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum PerceptionIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("world map file holds {cells} cells, expected {size}x{size}")]
    InvalidMap { size: usize, cells: usize },
}

/// Configuration of a single-frame perception run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionConfig {
    pub image_path: String,
    pub pose: Pose,
    #[serde(default)]
    pub params: PerceptionParams,
    /// Map to load before the step and save after it. A missing file starts
    /// a fresh map.
    #[serde(default)]
    pub map_path: Option<String>,
    #[serde(default)]
    pub vision_path: Option<String>,
    #[serde(default)]
    pub map_image_path: Option<String>,
    #[serde(default)]
    pub report_path: Option<String>,
}

impl PerceptionConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PerceptionIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PerceptionIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn report_path(&self) -> PathBuf {
        self.report_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("perception_report.json"))
    }
}

#[derive(Deserialize)]
struct WorldMapFile {
    size: usize,
    cells: Vec<CellCounts>,
}

impl WorldMap {
    /// Load a map written by [`WorldMap::write_json`].
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PerceptionIoError> {
        let raw = fs::read_to_string(path)?;
        let file: WorldMapFile = serde_json::from_str(&raw)?;
        let cells = file.cells.len();
        WorldMap::from_cells(file.size, file.cells).ok_or(PerceptionIoError::InvalidMap {
            size: file.size,
            cells,
        })
    }

    /// Load the map at `path`, or start a zeroed `size` x `size` map if the
    /// file does not exist.
    pub fn load_or_new(path: impl AsRef<Path>, size: usize) -> Result<Self, PerceptionIoError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_json(path)
        } else {
            Ok(WorldMap::new(size))
        }
    }

    /// Write the map to disk as JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PerceptionIoError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Observed-cell and counter totals of one class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MapClassSummary {
    pub observed_cells: usize,
    pub total: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSummary {
    pub size: usize,
    pub obstacle: MapClassSummary,
    pub rock: MapClassSummary,
    pub navigable: MapClassSummary,
}

impl MapSummary {
    pub fn of(map: &WorldMap) -> Self {
        let class = |c: TerrainClass| MapClassSummary {
            observed_cells: map.observed_cells(c),
            total: map.total(c),
        };
        Self {
            size: map.size(),
            obstacle: class(TerrainClass::Obstacle),
            rock: class(TerrainClass::Rock),
            navigable: class(TerrainClass::Navigable),
        }
    }
}

/// JSON summary of one perception step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionReport {
    pub image_path: String,
    pub pose: Pose,
    /// Camera-to-top-down homography the step warped with, row-major.
    pub homography: [[f64; 3]; 3],
    pub stats: StepStats,
    #[serde(default)]
    pub navigable_mean_bearing_deg: Option<f64>,
    #[serde(default)]
    pub rock_mean_bearing_deg: Option<f64>,
    #[serde(default)]
    pub rock_mean_distance: Option<f64>,
    pub navigable: PolarSet,
    pub rock: PolarSet,
    pub map: MapSummary,
}

impl PerceptionReport {
    pub fn new(
        image_path: &str,
        pose: Pose,
        pipeline: &PerceptionPipeline,
        output: &StepOutput,
        map: &WorldMap,
    ) -> Self {
        Self {
            image_path: image_path.to_string(),
            pose,
            homography: pipeline.homography().to_array(),
            stats: output.stats,
            navigable_mean_bearing_deg: output.navigable.mean_bearing().map(f64::to_degrees),
            rock_mean_bearing_deg: output.rock.mean_bearing().map(f64::to_degrees),
            rock_mean_distance: output.rock.mean_distance(),
            navigable: output.navigable.clone(),
            rock: output.rock.clone(),
            map: MapSummary::of(map),
        }
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PerceptionIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), PerceptionIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
