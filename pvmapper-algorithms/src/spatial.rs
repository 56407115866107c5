//! Spatial indexing for efficient neighbor lookup.

use std::collections::HashMap;

/// Spatial grid for 2D radius queries in a metric plane.
///
/// The plane is divided into square cells; a radius query only visits the
/// cells overlapping the query circle.
#[derive(Debug)]
pub struct SpatialGrid<T> {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<(f64, f64, T)>>,
}

impl<T> SpatialGrid<T> {
    /// Create a new spatial grid. Non-positive sizes fall back to 1.
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Insert a value at the given coordinates.
    pub fn insert(&mut self, x: f64, y: f64, value: T) {
        let cell = self.cell_of(x, y);
        self.cells.entry(cell).or_default().push((x, y, value));
    }

    /// Values within `radius` of `(x, y)`, boundary included.
    #[allow(clippy::cast_possible_truncation)]
    pub fn query_radius(&self, x: f64, y: f64, radius: f64) -> Vec<&T> {
        let mut result = Vec::new();
        if !radius.is_finite() || radius < 0.0 {
            return result;
        }
        let (cx, cy) = self.cell_of(x, y);
        let reach = (radius / self.cell_size).ceil() as i64;
        let r2 = radius * radius;

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                let Some(values) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                result.extend(values.iter().filter_map(|(vx, vy, v)| {
                    let (ex, ey) = (vx - x, vy - y);
                    (ex * ex + ey * ey <= r2).then_some(v)
                }));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_grid() {
        let mut grid: SpatialGrid<usize> = SpatialGrid::new(5.0);
        grid.insert(100.0, 100.0, 0);
        grid.insert(103.0, 104.0, 1);
        grid.insert(300.0, 300.0, 2);
        grid.insert(-101.0, 100.0, 3);

        let neighbors = grid.query_radius(100.0, 100.0, 5.0);
        assert!(neighbors.contains(&&0));
        assert!(neighbors.contains(&&1));
        assert!(!neighbors.contains(&&2));
        assert!(!neighbors.contains(&&3));
    }

    #[test]
    fn test_radius_larger_than_cell() {
        let mut grid: SpatialGrid<&str> = SpatialGrid::new(1.0);
        grid.insert(0.0, 0.0, "origin");
        grid.insert(-7.0, 0.0, "west");
        assert_eq!(grid.query_radius(0.0, 0.0, 7.0).len(), 2);
        assert_eq!(grid.query_radius(0.0, 0.0, 6.9).len(), 1);
        assert!(grid.query_radius(0.0, 0.0, f64::NAN).is_empty());
    }
}
