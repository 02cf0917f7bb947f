use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::geometry::bounding_rect;

/// Closed outer boundary of a blob, as an ordered pixel chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point2<i32>>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Simplified vertex sequence approximating a [`Contour`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point2<i32>>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point2<i32>>) -> Self {
        Self { vertices }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn bounding_rect(&self) -> Option<BoundingRect> {
        bounding_rect(&self.vertices)
    }
}

/// Axis-aligned bounding box with inclusive pixel extents.
///
/// A single pixel at `(x, y)` has `width == height == 1`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BoundingRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `width / height`, or `None` for a zero height.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.height != 0).then(|| self.width as f64 / self.height as f64)
    }
}
