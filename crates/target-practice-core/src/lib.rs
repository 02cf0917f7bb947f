//! Core types and utilities for target detection.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any image type: everything works on integer pixel chains and
//! polygons expressed as `nalgebra::Point2`.

mod geometry;
mod logger;
mod shape;

pub use geometry::{bounding_rect, compress_chain, polygon_moments, Moments};
pub use shape::{BoundingRect, Contour, Polygon};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, parse_level, LOG_ENV};
