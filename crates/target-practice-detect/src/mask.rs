//! Color range thresholding.

use image::{GrayImage, Luma, RgbImage};

use crate::params::ColorRange;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Mask value for pixels inside the color range.
pub const MASK_SET: u8 = 255;

/// Binary mask of the pixels whose every channel lies inside `range`
/// (inclusive on both ends). Set pixels are [`MASK_SET`], others 0.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame, range), fields(width = frame.width(), height = frame.height()))
)]
pub fn color_mask(frame: &RgbImage, range: &ColorRange) -> GrayImage {
    let (low, high) = range.clamped();
    let mut mask = GrayImage::new(frame.width(), frame.height());
    for (dst, src) in mask.pixels_mut().zip(frame.pixels()) {
        let inside = (0..3).all(|c| src.0[c] >= low[c] && src.0[c] <= high[c]);
        *dst = Luma([if inside { MASK_SET } else { 0 }]);
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn bounds_are_inclusive_per_channel() {
        let range = ColorRange::new([100, 0, 0], [255, 110, 110]);
        let frame = RgbImage::from_fn(5, 1, |x, _| match x {
            0 => Rgb([100, 0, 0]),
            1 => Rgb([255, 110, 110]),
            2 => Rgb([99, 0, 0]),
            3 => Rgb([200, 111, 0]),
            _ => Rgb([200, 50, 50]),
        });
        let mask = color_mask(&frame, &range);
        let values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![255, 255, 0, 0, 255]);
    }

    #[test]
    fn mask_keeps_frame_dimensions() {
        let frame = RgbImage::new(17, 9);
        let mask = color_mask(&frame, &ColorRange::default());
        assert_eq!(mask.dimensions(), (17, 9));
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn out_of_range_bounds_clamp() {
        let range = ColorRange::new([-5, -5, -5], [400, 400, 400]);
        let frame = RgbImage::from_pixel(3, 3, Rgb([0, 255, 17]));
        let mask = color_mask(&frame, &range);
        assert!(mask.pixels().all(|p| p.0[0] == MASK_SET));
    }
}
