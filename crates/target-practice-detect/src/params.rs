use serde::{Deserialize, Serialize};

/// Errors returned when a parameter set is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("blur kernel size must be odd and positive (got {0})")]
    BlurKernel(u32),
    #[error("canny sigma must be finite and non-negative (got {0})")]
    CannySigma(f32),
    #[error("vertex range is empty ({min} > {max})")]
    VertexRange { min: usize, max: usize },
    #[error("aspect range is empty or non-finite ({low} .. {high})")]
    AspectRange { low: f64, high: f64 },
    #[error("{name} must be finite and non-negative (got {value})")]
    NonFinite { name: &'static str, value: f64 },
}

/// Inclusive per-channel color bounds.
///
/// Bounds are stored as `i32` so out-of-range configuration values survive
/// deserialization; they are clamped into `0..=255` when the mask is built.
/// Channel order follows the frame (R, G, B for every source in this
/// workspace).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorRange {
    pub low: [i32; 3],
    pub high: [i32; 3],
}

impl ColorRange {
    pub fn new(low: [i32; 3], high: [i32; 3]) -> Self {
        Self { low, high }
    }

    /// Bounds clamped into the `u8` channel range.
    pub fn clamped(&self) -> ([u8; 3], [u8; 3]) {
        (
            self.low.map(clamp_channel),
            self.high.map(clamp_channel),
        )
    }
}

impl Default for ColorRange {
    /// Saturated red: high R, low G and B.
    fn default() -> Self {
        Self {
            low: [100, 0, 0],
            high: [255, 110, 110],
        }
    }
}

#[inline]
fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Smoothing and adaptive edge thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    /// Side of the square Gaussian kernel applied to the mask (odd).
    pub blur_kernel_size: u32,
    /// Relative spread of the Canny thresholds around the median intensity.
    pub canny_sigma: f32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            blur_kernel_size: 7,
            canny_sigma: 0.33,
        }
    }
}

/// Acceptance rules for simplified contours.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeParams {
    /// Bounding box width must be strictly greater than this.
    pub min_width: i32,
    /// Bounding box height must be strictly greater than this.
    pub min_height: i32,
    /// `area / hull_area` must be strictly greater than this.
    pub min_solidity: f64,
    /// Inclusive lower bound on `width / height`.
    pub aspect_low: f64,
    /// Inclusive upper bound on `width / height`.
    pub aspect_high: f64,
    /// Inclusive vertex-count range for eligible polygons.
    pub vertex_min: usize,
    pub vertex_max: usize,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_frac: f64,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            min_width: 25,
            min_height: 25,
            min_solidity: 0.9,
            aspect_low: 0.8,
            aspect_high: 1.2,
            vertex_min: 4,
            vertex_max: 6,
            approx_epsilon_frac: 0.01,
        }
    }
}

/// Full configuration of the per-frame pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetParams {
    pub color: ColorRange,
    pub edges: EdgeParams,
    pub shape: ShapeParams,
    /// Crosshair half-length as a fraction of the bounding box extent on
    /// each axis.
    pub crosshair_fraction: f64,
}

impl Default for TargetParams {
    fn default() -> Self {
        Self {
            color: ColorRange::default(),
            edges: EdgeParams::default(),
            shape: ShapeParams::default(),
            crosshair_fraction: 0.15,
        }
    }
}

impl TargetParams {
    /// Check internal consistency. Called by `FrameAnalyzer::new`.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let k = self.edges.blur_kernel_size;
        if k == 0 || k % 2 == 0 {
            return Err(ParamsError::BlurKernel(k));
        }
        let sigma = self.edges.canny_sigma;
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(ParamsError::CannySigma(sigma));
        }

        let s = &self.shape;
        if s.vertex_min > s.vertex_max {
            return Err(ParamsError::VertexRange {
                min: s.vertex_min,
                max: s.vertex_max,
            });
        }
        if !(s.aspect_low.is_finite() && s.aspect_high.is_finite())
            || s.aspect_low > s.aspect_high
        {
            return Err(ParamsError::AspectRange {
                low: s.aspect_low,
                high: s.aspect_high,
            });
        }
        for (name, value) in [
            ("min_solidity", s.min_solidity),
            ("approx_epsilon_frac", s.approx_epsilon_frac),
            ("crosshair_fraction", self.crosshair_fraction),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ParamsError::NonFinite { name, value });
            }
        }
        Ok(())
    }
}
