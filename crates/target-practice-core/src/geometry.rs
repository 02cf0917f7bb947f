//! Pixel-chain helpers that `imageproc::geometry` does not cover.
//!
//! All inputs are integer pixel coordinates; accumulations run in `i64`/`f64`
//! so large frames cannot overflow.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::shape::BoundingRect;

/// Spatial moments of a polygon up to first order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// Area centroid `(m10 / m00, m01 / m00)`, or `None` for a zero-area
    /// polygon.
    pub fn centroid(&self) -> Option<Point2<f64>> {
        if self.m00.abs() < f64::EPSILON {
            return None;
        }
        Some(Point2::new(self.m10 / self.m00, self.m01 / self.m00))
    }
}

/// Polygon moments via Green's theorem, reported with a non-negative `m00`
/// regardless of orientation.
pub fn polygon_moments(points: &[Point2<i32>]) -> Moments {
    if points.len() < 3 {
        return Moments::default();
    }

    let mut a00 = 0.0f64;
    let mut a10 = 0.0f64;
    let mut a01 = 0.0f64;
    for (p, q) in edges(points) {
        let (xi, yi) = (p.x as f64, p.y as f64);
        let (xj, yj) = (q.x as f64, q.y as f64);
        let a = xi * yj - xj * yi;
        a00 += a;
        a10 += (xi + xj) * a;
        a01 += (yi + yj) * a;
    }

    let sign = if a00 < 0.0 { -1.0 } else { 1.0 };
    Moments {
        m00: sign * a00 / 2.0,
        m10: sign * a10 / 6.0,
        m01: sign * a01 / 6.0,
    }
}

/// Inclusive axis-aligned bounding box, `None` for an empty slice.
pub fn bounding_rect(points: &[Point2<i32>]) -> Option<BoundingRect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(BoundingRect::new(
        min_x,
        min_y,
        max_x - min_x + 1,
        max_y - min_y + 1,
    ))
}

/// Drop the interior points of straight runs in a closed pixel chain,
/// keeping only the points where the direction changes.
///
/// Consecutive duplicates are removed first. A chain that collapses entirely
/// keeps its first point.
pub fn compress_chain(points: &[Point2<i32>]) -> Vec<Point2<i32>> {
    let mut chain: Vec<Point2<i32>> = points.to_vec();
    chain.dedup();
    while chain.len() > 1 && chain.first() == chain.last() {
        chain.pop();
    }
    let n = chain.len();
    if n <= 2 {
        return chain;
    }

    let out: Vec<Point2<i32>> = (0..n)
        .filter(|&i| {
            let prev = chain[(i + n - 1) % n];
            let cur = chain[i];
            let next = chain[(i + 1) % n];
            let d_in = (cur.x - prev.x, cur.y - prev.y);
            let d_out = (next.x - cur.x, next.y - cur.y);
            let turn = d_in.0 as i64 * d_out.1 as i64 - d_in.1 as i64 * d_out.0 as i64;
            let dot = d_in.0 as i64 * d_out.0 as i64 + d_in.1 as i64 * d_out.1 as i64;
            turn != 0 || dot <= 0
        })
        .map(|i| chain[i])
        .collect();

    if out.is_empty() {
        vec![chain[0]]
    } else {
        out
    }
}

fn edges(points: &[Point2<i32>]) -> impl Iterator<Item = (Point2<i32>, Point2<i32>)> + '_ {
    let n = points.len();
    (0..n).map(move |i| (points[i], points[(i + 1) % n]))
}
