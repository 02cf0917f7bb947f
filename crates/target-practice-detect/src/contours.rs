use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use nalgebra::Point2;
use target_practice_core::{compress_chain, Contour};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Outermost closed boundaries of the non-zero regions in `edges`.
///
/// Holes and boundaries nested inside another region are dropped. Each chain
/// keeps only its direction-change points. Order is unspecified.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(edges), fields(width = edges.width(), height = edges.height()))
)]
pub fn find_outer_contours(edges: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let chain: Vec<Point2<i32>> = c.points.iter().map(|p| Point2::new(p.x, p.y)).collect();
            Contour::new(compress_chain(&chain))
        })
        .filter(|c| !c.is_empty())
        .collect()
}
