//! Annotation drawing: contours, rule labels, target outlines, crosshairs and
//! the frame status line.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::classify::Crosshair;
use crate::result::DetectionResult;

#[derive(thiserror::Error, Debug)]
pub enum OverlayError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid font data in {path}")]
    InvalidFont { path: String },
}

/// Colors, line widths and text placement of the overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub contour_color: [u8; 3],
    pub contour_thickness: u32,
    pub label_color: [u8; 3],
    pub label_scale: f32,
    pub target_color: [u8; 3],
    pub target_thickness: u32,
    pub crosshair_thickness: u32,
    pub status_color: [u8; 3],
    pub status_scale: f32,
    /// Baseline-left anchor of the status line.
    pub status_origin: [i32; 2],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            contour_color: [0, 0, 255],
            contour_thickness: 2,
            label_color: [0, 0, 255],
            label_scale: 14.0,
            target_color: [255, 0, 0],
            target_thickness: 4,
            crosshair_thickness: 3,
            status_color: [255, 0, 0],
            status_scale: 24.0,
            status_origin: [20, 30],
        }
    }
}

/// Draws a [`DetectionResult`] onto a copy of its frame.
///
/// Text needs a font. Without one, labels and the status line are skipped
/// and only the geometry is drawn.
#[derive(Clone, Debug, Default)]
pub struct OverlayRenderer {
    style: OverlayStyle,
    font: Option<FontArc>,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style, font: None }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Load a TrueType/OpenType font from disk.
    pub fn load_font(path: impl AsRef<Path>) -> Result<FontArc, OverlayError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| OverlayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        FontArc::try_from_vec(data).map_err(|_| OverlayError::InvalidFont {
            path: path.display().to_string(),
        })
    }

    /// Annotated copy of `frame`. The input is left untouched.
    pub fn render(&self, frame: &RgbImage, result: &DetectionResult) -> RgbImage {
        let mut canvas = frame.clone();
        let s = &self.style;

        for candidate in &result.candidates {
            draw_closed_path(
                &mut canvas,
                &candidate.contour.points,
                Rgb(s.contour_color),
                s.contour_thickness,
            );

            if candidate.verdict.eligible {
                let rect = candidate.descriptor.bounding_rect;
                self.draw_text(
                    &mut canvas,
                    &candidate.verdict.label(),
                    rect.x,
                    rect.y,
                    s.label_scale,
                    Rgb(s.label_color),
                );
            }

            if candidate.is_accepted() {
                draw_closed_path(
                    &mut canvas,
                    &candidate.polygon.vertices,
                    Rgb(s.target_color),
                    s.target_thickness,
                );
                if let Some(crosshair) = &candidate.crosshair {
                    draw_crosshair(
                        &mut canvas,
                        crosshair,
                        Rgb(s.target_color),
                        s.crosshair_thickness,
                    );
                }
            }
        }

        self.draw_text(
            &mut canvas,
            result.status.message(),
            s.status_origin[0],
            s.status_origin[1],
            s.status_scale,
            Rgb(s.status_color),
        );
        canvas
    }

    /// `(x, y)` is the baseline-left corner; `draw_text_mut` anchors at the
    /// top-left, so the text is lifted by its scale.
    fn draw_text(
        &self,
        canvas: &mut RgbImage,
        text: &str,
        x: i32,
        y: i32,
        scale: f32,
        color: Rgb<u8>,
    ) {
        let Some(font) = &self.font else {
            return;
        };
        let top = y - scale.round() as i32;
        draw_text_mut(canvas, color, x, top, PxScale::from(scale), font, text);
    }
}

fn draw_crosshair(canvas: &mut RgbImage, c: &Crosshair, color: Rgb<u8>, thickness: u32) {
    let horizontal = [
        Point2::new(c.start_x, c.center.y),
        Point2::new(c.end_x, c.center.y),
    ];
    let vertical = [
        Point2::new(c.center.x, c.start_y),
        Point2::new(c.center.x, c.end_y),
    ];
    draw_thick_segment(canvas, horizontal[0], horizontal[1], color, thickness);
    draw_thick_segment(canvas, vertical[0], vertical[1], color, thickness);
}

fn draw_closed_path(canvas: &mut RgbImage, points: &[Point2<i32>], color: Rgb<u8>, thickness: u32) {
    match points.len() {
        0 => {}
        1 => draw_thick_segment(canvas, points[0], points[0], color, thickness),
        n => {
            for i in 0..n {
                draw_thick_segment(canvas, points[i], points[(i + 1) % n], color, thickness);
            }
        }
    }
}

/// Segment stamped with a square brush of side `thickness`.
fn draw_thick_segment(
    canvas: &mut RgbImage,
    a: Point2<i32>,
    b: Point2<i32>,
    color: Rgb<u8>,
    thickness: u32,
) {
    let t = thickness.max(1) as i32;
    let lo = -(t - 1) / 2;
    let hi = lo + t - 1;
    for dy in lo..=hi {
        for dx in lo..=hi {
            draw_line_segment_mut(
                canvas,
                ((a.x + dx) as f32, (a.y + dy) as f32),
                ((b.x + dx) as f32, (b.y + dy) as f32),
                color,
            );
        }
    }
}
