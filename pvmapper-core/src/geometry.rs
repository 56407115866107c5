//! Detection geometry in source-frame pixel space.

use crate::{Error, Result};

/// Composite key of one stored detection patch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchKey {
    /// Module track id.
    pub track_id: String,
    /// Source frame name, e.g. `frame_000123`.
    pub frame_name: String,
    /// Segmentation mask name within the frame, e.g. `mask_000004`.
    pub mask_name: String,
}

impl PatchKey {
    /// Creates a new patch key.
    pub fn new(
        track_id: impl Into<String>,
        frame_name: impl Into<String>,
        mask_name: impl Into<String>,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            frame_name: frame_name.into(),
            mask_name: mask_name.into(),
        }
    }
}

impl std::fmt::Display for PatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.track_id, self.frame_name, self.mask_name)
    }
}

/// Four-corner outline of a detected module, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quadrilateral {
    points: [(i32, i32); 4],
}

impl Quadrilateral {
    /// Creates a quadrilateral from its corners in drawing order.
    #[must_use]
    pub fn new(points: [(i32, i32); 4]) -> Self {
        Self { points }
    }

    /// Builds a quadrilateral from a point list.
    ///
    /// # Errors
    /// Returns `MalformedData` unless exactly four points are given.
    pub fn from_points(points: &[(i32, i32)]) -> Result<Self> {
        let points: [(i32, i32); 4] = points.try_into().map_err(|_| {
            Error::MalformedData(format!(
                "quadrilateral needs 4 points, got {}",
                points.len()
            ))
        })?;
        Ok(Self { points })
    }

    /// Corner points in drawing order.
    #[must_use]
    pub fn points(&self) -> &[(i32, i32); 4] {
        &self.points
    }

    /// Closed outline as consecutive edges, the last one returning to the start.
    pub fn edges(&self) -> impl Iterator<Item = ((i32, i32), (i32, i32))> + '_ {
        (0..4).map(move |i| (self.points[i], self.points[(i + 1) % 4]))
    }

    /// Axis-aligned bounding box as `(min_x, min_y, max_x, max_y)`.
    #[must_use]
    pub fn bounding_box(&self) -> (i32, i32, i32, i32) {
        self.points.iter().fold(
            (i32::MAX, i32::MAX, i32::MIN, i32::MIN),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        )
    }
}
