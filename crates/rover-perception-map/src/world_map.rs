//! Persistent per-cell, per-class evidence counters.

use crate::classify::TerrainClass;
use crate::coords::WorldCell;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Evidence accumulated for one world cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCounts {
    pub obstacle: u64,
    pub rock: u64,
    pub navigable: u64,
}

impl CellCounts {
    #[inline]
    pub fn get(&self, class: TerrainClass) -> u64 {
        match class {
            TerrainClass::Obstacle => self.obstacle,
            TerrainClass::Rock => self.rock,
            TerrainClass::Navigable => self.navigable,
        }
    }

    #[inline]
    fn slot(&mut self, class: TerrainClass) -> &mut u64 {
        match class {
            TerrainClass::Obstacle => &mut self.obstacle,
            TerrainClass::Rock => &mut self.rock,
            TerrainClass::Navigable => &mut self.navigable,
        }
    }
}

/// Square world grid of evidence counters.
///
/// Counters only grow: [`WorldMap::accumulate`] adds, nothing subtracts or
/// resets. Interpreting raw counts (thresholds, normalization) is up to
/// readers. Load a saved map with `WorldMap::load_json`, which checks its
/// shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorldMap {
    size: usize,
    /// Row-major: index = y * size + x.
    cells: Vec<CellCounts>,
}

impl WorldMap {
    /// Zero-initialized `size` x `size` map.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![CellCounts::default(); size * size],
        }
    }

    /// Rebuild a map from raw row-major cells; `None` if the count is not `size²`.
    pub fn from_cells(size: usize, cells: Vec<CellCounts>) -> Option<Self> {
        (size.checked_mul(size)? == cells.len()).then_some(Self { size, cells })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn cells(&self) -> &[CellCounts] {
        &self.cells
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<CellCounts> {
        if x >= self.size || y >= self.size {
            return None;
        }
        Some(self.cells[y * self.size + x])
    }

    /// Counter of `class` at `(x, y)`, zero outside the map.
    #[inline]
    pub fn count(&self, x: usize, y: usize, class: TerrainClass) -> u64 {
        self.get(x, y).map_or(0, |c| c.get(class))
    }

    /// Add `weight` to the `class` counter of every listed cell.
    ///
    /// A cell listed several times is incremented several times. Cells
    /// outside the map are skipped; counters saturate at `u64::MAX`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, cells), fields(cells = cells.len()))
    )]
    pub fn accumulate(&mut self, cells: &[WorldCell], class: TerrainClass, weight: u32) {
        if weight == 0 {
            return;
        }
        for c in cells {
            if c.x >= self.size || c.y >= self.size {
                continue;
            }
            let slot = self.cells[c.y * self.size + c.x].slot(class);
            *slot = slot.saturating_add(weight as u64);
        }
    }

    /// Sum of one class's counters over the whole map.
    pub fn total(&self, class: TerrainClass) -> u128 {
        self.cells.iter().map(|c| c.get(class) as u128).sum()
    }

    /// Number of cells with a non-zero counter for `class`.
    pub fn observed_cells(&self, class: TerrainClass) -> usize {
        self.cells.iter().filter(|c| c.get(class) > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_map_is_zeroed() {
        let map = WorldMap::new(5);
        assert_eq!(map.size(), 5);
        assert_eq!(map.cells().len(), 25);
        assert!(map.cells().iter().all(|c| *c == CellCounts::default()));
        assert_eq!(map.get(5, 0), None);
    }

    #[test]
    fn accumulate_adds_weight_per_listed_cell() {
        let mut map = WorldMap::new(4);
        let cells = [
            WorldCell { x: 1, y: 2 },
            WorldCell { x: 1, y: 2 },
            WorldCell { x: 3, y: 0 },
        ];
        map.accumulate(&cells, TerrainClass::Obstacle, 3);
        map.accumulate(&cells[2..], TerrainClass::Navigable, 255);

        assert_eq!(map.count(1, 2, TerrainClass::Obstacle), 6);
        assert_eq!(map.count(3, 0, TerrainClass::Obstacle), 3);
        assert_eq!(map.count(3, 0, TerrainClass::Navigable), 255);
        assert_eq!(map.count(3, 0, TerrainClass::Rock), 0);
        assert_eq!(map.total(TerrainClass::Obstacle), 9);
        assert_eq!(map.observed_cells(TerrainClass::Obstacle), 2);
    }

    #[test]
    fn counters_never_decrease() {
        let mut map = WorldMap::new(3);
        let mut prev = map.clone();
        let mut seed = 7u64;
        for step in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let cell = WorldCell {
                x: (seed >> 33) as usize % 3,
                y: (seed >> 17) as usize % 3,
            };
            let class = TerrainClass::ALL[step % 3];
            map.accumulate(&[cell], class, (seed % 300) as u32);
            for (a, b) in map.cells().iter().zip(prev.cells()) {
                for class in TerrainClass::ALL {
                    assert!(a.get(class) >= b.get(class));
                }
            }
            prev = map.clone();
        }
    }

    #[test]
    fn saturates_instead_of_wrapping() {
        let mut cells = vec![CellCounts::default(); 1];
        cells[0].rock = u64::MAX - 1;
        let mut map = WorldMap::from_cells(1, cells).expect("shape");
        map.accumulate(&[WorldCell { x: 0, y: 0 }], TerrainClass::Rock, 255);
        assert_eq!(map.count(0, 0, TerrainClass::Rock), u64::MAX);
    }

    #[test]
    fn from_cells_checks_shape() {
        assert!(WorldMap::from_cells(2, vec![CellCounts::default(); 3]).is_none());
        assert!(WorldMap::from_cells(2, vec![CellCounts::default(); 4]).is_some());
    }
}
