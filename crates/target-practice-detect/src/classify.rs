//! Polygon approximation and target acceptance rules.
//!
//! Every contour is simplified with Douglas-Peucker, measured and judged
//! independently. Arc length, simplification, hull and area come from
//! `imageproc::geometry`. Degenerate geometry (zero height, zero hull area, zero
//! polygon area) never produces an error; it only yields a negative
//! [`Verdict`].

use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area, convex_hull};
use imageproc::point::Point;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use target_practice_core::{polygon_moments, BoundingRect, Contour, Moments, Polygon};

use crate::params::ShapeParams;

/// Measured attributes of a simplified contour.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub bounding_rect: BoundingRect,
    /// `width / height`; `None` when the height is zero.
    pub aspect_ratio: Option<f64>,
    /// Area enclosed by the unsimplified contour.
    pub area: f64,
    /// Area of the convex hull of the unsimplified contour.
    pub hull_area: f64,
    /// `area / hull_area`; `None` when the hull has no area.
    pub solidity: Option<f64>,
    pub vertex_count: usize,
    pub perimeter: f64,
}

impl ShapeDescriptor {
    pub fn measure(contour: &Contour, polygon: &Polygon) -> Self {
        let chain = pixel_points(&contour.points);
        let bounding_rect = polygon.bounding_rect().unwrap_or_default();
        let area = contour_area(&chain);
        let hull_area = contour_area(&convex_hull(distinct(&chain)));
        Self {
            bounding_rect,
            aspect_ratio: bounding_rect.aspect_ratio(),
            area,
            hull_area,
            solidity: (hull_area > 0.0).then(|| area / hull_area),
            vertex_count: polygon.vertex_count(),
            perimeter: arc_length(&chain, true),
        }
    }
}

fn pixel_points(points: &[Point2<i32>]) -> Vec<Point<i32>> {
    points.iter().map(|p| Point::new(p.x, p.y)).collect()
}

/// Sorted copy without duplicates; the Graham scan in `convex_hull` cannot
/// order coincident points consistently.
fn distinct(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut out = points.to_vec();
    out.sort_unstable_by_key(|p| (p.x, p.y));
    out.dedup();
    out
}

/// Douglas-Peucker simplification of a closed chain.
///
/// `approximate_polygon_dp` measures against the chord between the first and
/// last point, which is meaningless for a closed chain. The chain is cut at
/// the point farthest from its start instead and both halves are simplified
/// as open curves. The start vertex is dropped afterwards if it lies within
/// `epsilon` of the chord between its neighbours.
fn simplify_closed(chain: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if chain.len() <= 2 {
        return chain.to_vec();
    }
    // `approximate_polygon_dp` panics on a zero tolerance.
    let epsilon = epsilon.max(f64::MIN_POSITIVE);

    let start = chain[0];
    let (far, _) = chain.iter().enumerate().fold((0, 0i64), |best, (i, p)| {
        let dx = (p.x - start.x) as i64;
        let dy = (p.y - start.y) as i64;
        let d2 = dx * dx + dy * dy;
        if d2 > best.1 {
            (i, d2)
        } else {
            best
        }
    });
    if far == 0 {
        return vec![start];
    }

    let mut out = approximate_polygon_dp(&chain[..=far], epsilon, false);
    let mut tail_chain = chain[far..].to_vec();
    tail_chain.push(start);
    let mut tail = approximate_polygon_dp(&tail_chain, epsilon, false);
    out.pop();
    tail.pop();
    out.append(&mut tail);

    if out.len() > 3 {
        let corner = [out[out.len() - 1], out[0], out[1]];
        if approximate_polygon_dp(&corner, epsilon, false).len() == 2 {
            out.remove(0);
        }
    }
    out
}

/// Why a candidate was not accepted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Rejection {
    /// Vertex count outside the eligible range; nothing else was judged.
    VertexCount { count: usize },
    /// At least one of the size, solidity or aspect rules failed.
    Criteria,
    /// All rules passed but the polygon encloses no area, so it has no
    /// centroid.
    ZeroArea,
}

/// Outcome of the acceptance rules for one polygon.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Vertex count inside the eligible range.
    pub eligible: bool,
    pub dims_ok: bool,
    pub solidity_ok: bool,
    pub aspect_ok: bool,
    pub accepted: bool,
    pub rejection: Option<Rejection>,
}

impl Verdict {
    /// Apply the vertex gate and the three shape rules to `descriptor`.
    ///
    /// The centroid check is not part of this; see
    /// [`ShapeClassifier::classify`].
    pub fn evaluate(descriptor: &ShapeDescriptor, params: &ShapeParams) -> Self {
        let count = descriptor.vertex_count;
        if !(params.vertex_min..=params.vertex_max).contains(&count) {
            return Self {
                eligible: false,
                dims_ok: false,
                solidity_ok: false,
                aspect_ok: false,
                accepted: false,
                rejection: Some(Rejection::VertexCount { count }),
            };
        }

        let rect = descriptor.bounding_rect;
        let dims_ok = descriptor.aspect_ratio.is_some()
            && rect.width > params.min_width
            && rect.height > params.min_height;
        let solidity_ok = descriptor
            .solidity
            .is_some_and(|s| s > params.min_solidity);
        let aspect_ok = descriptor
            .aspect_ratio
            .is_some_and(|a| a >= params.aspect_low && a <= params.aspect_high);
        let accepted = dims_ok && solidity_ok && aspect_ok;

        Self {
            eligible: true,
            dims_ok,
            solidity_ok,
            aspect_ok,
            accepted,
            rejection: (!accepted).then_some(Rejection::Criteria),
        }
    }

    /// Human-readable summary of the three rules, drawn next to eligible
    /// candidates.
    pub fn label(&self) -> String {
        format!(
            "dims: {}, solidity: {}, aspect: {}",
            self.dims_ok, self.solidity_ok, self.aspect_ok
        )
    }
}

/// Two perpendicular segments centred on an accepted target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Crosshair {
    pub center: Point2<i32>,
    pub start_x: i32,
    pub end_x: i32,
    pub start_y: i32,
    pub end_y: i32,
}

impl Crosshair {
    /// Symmetric arms of `fraction * width` and `fraction * height` around
    /// the centroid, truncated to whole pixels.
    pub fn around(centroid: Point2<f64>, rect: BoundingRect, fraction: f64) -> Self {
        let cx = centroid.x as i32;
        let cy = centroid.y as i32;
        let dx = rect.width as f64 * fraction;
        let dy = rect.height as f64 * fraction;
        Self {
            center: Point2::new(cx, cy),
            start_x: (cx as f64 - dx) as i32,
            end_x: (cx as f64 + dx) as i32,
            start_y: (cy as f64 - dy) as i32,
            end_y: (cy as f64 + dy) as i32,
        }
    }
}

/// One examined contour with everything derived from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub contour: Contour,
    pub polygon: Polygon,
    pub descriptor: ShapeDescriptor,
    pub verdict: Verdict,
    /// Area centroid of the polygon, present for accepted candidates only.
    pub centroid: Option<Point2<f64>>,
    pub crosshair: Option<Crosshair>,
}

impl Candidate {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        self.verdict.accepted
    }
}

/// Stateless contour classifier.
#[derive(Clone, Debug)]
pub struct ShapeClassifier {
    params: ShapeParams,
    crosshair_fraction: f64,
}

impl ShapeClassifier {
    pub fn new(params: ShapeParams, crosshair_fraction: f64) -> Self {
        Self {
            params,
            crosshair_fraction,
        }
    }

    pub fn params(&self) -> &ShapeParams {
        &self.params
    }

    /// Simplify, measure and judge one contour.
    pub fn classify(&self, contour: &Contour) -> Candidate {
        let chain = pixel_points(&contour.points);
        let epsilon = self.params.approx_epsilon_frac * arc_length(&chain, true);
        let polygon = Polygon::new(
            simplify_closed(&chain, epsilon)
                .into_iter()
                .map(|p| Point2::new(p.x, p.y))
                .collect(),
        );
        let descriptor = ShapeDescriptor::measure(contour, &polygon);
        let mut verdict = Verdict::evaluate(&descriptor, &self.params);
        let located = locate(
            &mut verdict,
            &polygon_moments(&polygon.vertices),
            descriptor.bounding_rect,
            self.crosshair_fraction,
        );

        Candidate {
            contour: contour.clone(),
            polygon,
            descriptor,
            verdict,
            centroid: located.map(|(c, _)| c),
            crosshair: located.map(|(_, x)| x),
        }
    }
}

/// Centroid and crosshair of an accepted polygon.
///
/// An accepted verdict whose polygon has no centroid is downgraded to
/// [`Rejection::ZeroArea`]. Verdicts that were not accepted are left alone.
fn locate(
    verdict: &mut Verdict,
    moments: &Moments,
    rect: BoundingRect,
    fraction: f64,
) -> Option<(Point2<f64>, Crosshair)> {
    if !verdict.accepted {
        return None;
    }
    match moments.centroid() {
        Some(c) => Some((c, Crosshair::around(c, rect, fraction))),
        None => {
            verdict.accepted = false;
            verdict.rejection = Some(Rejection::ZeroArea);
            None
        }
    }
}
