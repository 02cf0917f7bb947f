//! Mask smoothing and self-calibrating Canny edges.
//!
//! The Canny thresholds are derived from the median of the blurred mask, so
//! the edge map adapts to every frame instead of relying on fixed levels.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;

use crate::params::EdgeParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Lowest threshold handed to `canny`. Its hysteresis is inclusive, so a
/// zero threshold would turn every flat pixel into an edge.
const MIN_CANNY_THRESHOLD: f32 = 1.0;

/// Blur `mask`, estimate its median and run Canny with thresholds spread
/// `±canny_sigma` around it.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask, params), fields(width = mask.width(), height = mask.height()))
)]
pub fn extract_edges(mask: &GrayImage, params: &EdgeParams) -> GrayImage {
    let blurred = gaussian_blur(mask, params.blur_kernel_size);
    let median = median_intensity(&blurred);
    let (lower, upper) = auto_canny_thresholds(median, params.canny_sigma as f64);
    log::trace!("edge thresholds: median={median:.1} lower={lower} upper={upper}");
    canny(
        &blurred,
        lower.max(MIN_CANNY_THRESHOLD),
        upper.max(MIN_CANNY_THRESHOLD),
    )
}

/// `(max(0, (1 - sigma) * v), min(255, (1 + sigma) * v))`, truncated to whole
/// intensity levels.
pub fn auto_canny_thresholds(median: f64, sigma: f64) -> (f32, f32) {
    let lower = ((1.0 - sigma) * median).max(0.0).floor();
    let upper = ((1.0 + sigma) * median).min(255.0).floor();
    (lower as f32, upper as f32)
}

/// Median pixel value. For an even pixel count the two middle values are
/// averaged. An empty image has median 0.
pub fn median_intensity(img: &GrayImage) -> f64 {
    let mut hist = [0u64; 256];
    for p in img.pixels() {
        hist[p.0[0] as usize] += 1;
    }
    let n: u64 = hist.iter().sum();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        value_at_rank(&hist, n / 2) as f64
    } else {
        let a = value_at_rank(&hist, n / 2 - 1) as f64;
        let b = value_at_rank(&hist, n / 2) as f64;
        0.5 * (a + b)
    }
}

fn value_at_rank(hist: &[u64; 256], rank: u64) -> u8 {
    let mut seen = 0u64;
    for (v, &count) in hist.iter().enumerate() {
        seen += count;
        if seen > rank {
            return v as u8;
        }
    }
    255
}

/// 1-D Gaussian weights for an odd `size`.
///
/// Sizes up to 7 use the fixed binomial-like tables common to OpenCV-style
/// pipelines; larger kernels use `sigma = 0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    match size {
        0 | 1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![
            0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
        ],
        _ => {
            let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
            let half = (size / 2) as i64;
            let raw: Vec<f64> = (-half..=half)
                .map(|i| (-((i * i) as f64) / (2.0 * sigma * sigma)).exp())
                .collect();
            let sum: f64 = raw.iter().sum();
            raw.into_iter().map(|w| (w / sum) as f32).collect()
        }
    }
}

/// Separable Gaussian blur with a square `size` kernel. Borders repeat the
/// edge pixel.
pub fn gaussian_blur(img: &GrayImage, size: u32) -> GrayImage {
    let kernel = gaussian_kernel(size);
    if img.width() == 0 || img.height() == 0 || kernel.len() == 1 {
        return img.clone();
    }
    separable_filter_equal(img, &kernel)
}
