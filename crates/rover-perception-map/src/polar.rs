use crate::coords::LocalPoint;
use serde::{Deserialize, Serialize};

/// Parallel `(distance, bearing)` arrays in the vehicle-local frame.
///
/// Bearings are radians from straight ahead, positive to the left.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolarSet {
    pub distances: Vec<f64>,
    pub bearings: Vec<f64>,
}

impl PolarSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Iterate `(distance, bearing)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.distances
            .iter()
            .copied()
            .zip(self.bearings.iter().copied())
    }

    /// Mean bearing in radians, `None` when empty.
    pub fn mean_bearing(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.bearings.iter().sum::<f64>() / self.len() as f64)
    }

    /// Mean distance, `None` when empty.
    pub fn mean_distance(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.distances.iter().sum::<f64>() / self.len() as f64)
    }
}

/// Convert local points to polar form.
pub fn to_polar(points: &[LocalPoint]) -> PolarSet {
    let (distances, bearings) = points
        .iter()
        .map(|p| (p.x.hypot(p.y), p.y.atan2(p.x)))
        .unzip();
    PolarSet {
        distances,
        bearings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point2;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn empty_input_gives_empty_set() {
        let set = to_polar(&[]);
        assert!(set.is_empty());
        assert!(set.bearings.is_empty());
        assert_eq!(set.mean_bearing(), None);
    }

    #[test]
    fn distance_and_bearing() {
        let set = to_polar(&[
            Point2::new(3.0, 4.0),
            Point2::new(10.0, 0.0),
            Point2::new(5.0, -5.0),
        ]);
        assert_eq!(set.len(), 3);
        assert_abs_diff_eq!(set.distances[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(set.bearings[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(set.bearings[2], -FRAC_PI_4, epsilon = 1e-12);
        assert!(set.bearings[0] > 0.0, "left of center is positive");
    }

    #[test]
    fn mean_bearing_of_symmetric_points_is_zero() {
        let set = to_polar(&[Point2::new(5.0, 5.0), Point2::new(5.0, -5.0)]);
        assert_abs_diff_eq!(set.mean_bearing().expect("non-empty"), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            set.mean_distance().expect("non-empty"),
            50f64.sqrt(),
            epsilon = 1e-12
        );
        assert_eq!(set.iter().count(), 2);
    }
}
