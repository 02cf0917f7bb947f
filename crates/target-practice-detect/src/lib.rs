//! Per-frame target detection built on top of `target-practice-core`.
//!
//! ## Quickstart
//!
//! ```
//! use image::{Rgb, RgbImage};
//! use target_practice_detect::{FrameAnalyzer, TargetParams, TargetStatus};
//!
//! let mut frame = RgbImage::new(320, 240);
//! for y in 70..170 {
//!     for x in 110..210 {
//!         frame.put_pixel(x, y, Rgb([220, 30, 30]));
//!     }
//! }
//!
//! let analyzer = FrameAnalyzer::new(TargetParams::default()).unwrap();
//! let analysis = analyzer.analyze(&frame).unwrap();
//! assert_eq!(analysis.result.status, TargetStatus::Acquired);
//! println!("{}", analysis.result.status);
//! ```
//!
//! Pipeline:
//! 1. Keep pixels inside an inclusive RGB range (binary mask).
//! 2. Blur the mask and run Canny with thresholds derived from its median.
//! 3. Extract the outermost contours of the edge map.
//! 4. Simplify each contour (Douglas-Peucker, 1% of its perimeter) and judge
//!    it on vertex count, bounding box size, solidity and aspect ratio.
//! 5. Draw contours, rule labels, accepted outlines and crosshairs plus a
//!    status line on a copy of the frame.

mod analyzer;
mod classify;
mod contours;
mod edges;
mod frame;
mod mask;
mod overlay;
mod params;
mod result;

pub use analyzer::{FrameAnalysis, FrameAnalyzer, FrameSummary, Intermediates};
pub use classify::{Candidate, Crosshair, Rejection, ShapeClassifier, ShapeDescriptor, Verdict};
pub use contours::find_outer_contours;
pub use edges::{auto_canny_thresholds, extract_edges, gaussian_blur, median_intensity};
pub use frame::{check_frame, frame_from_raw, FrameError, FRAME_CHANNELS};
pub use mask::{color_mask, MASK_SET};
pub use overlay::{OverlayError, OverlayRenderer, OverlayStyle};
pub use params::{ColorRange, EdgeParams, ParamsError, ShapeParams, TargetParams};
pub use result::{DetectionResult, TargetStatus};
