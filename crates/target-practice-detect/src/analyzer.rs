use image::{GrayImage, RgbImage};
use log::debug;
use serde::Serialize;

use crate::classify::ShapeClassifier;
use crate::contours::find_outer_contours;
use crate::edges::extract_edges;
use crate::frame::{check_frame, FrameError};
use crate::mask::color_mask;
use crate::overlay::OverlayRenderer;
use crate::params::{ParamsError, TargetParams};
use crate::result::DetectionResult;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Mask and edge map of one frame, kept for diagnostics.
#[derive(Clone, Debug)]
pub struct Intermediates {
    pub mask: GrayImage,
    pub edges: GrayImage,
}

/// Output of [`FrameAnalyzer::analyze`].
#[derive(Clone, Debug)]
pub struct FrameAnalysis {
    pub result: DetectionResult,
    /// Annotated copy of the input frame.
    pub annotated: RgbImage,
    pub intermediates: Option<Intermediates>,
}

/// Compact per-frame summary, convenient for JSON logs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameSummary {
    pub status: crate::result::TargetStatus,
    pub num_contours: usize,
    pub num_accepted: usize,
}

impl From<&DetectionResult> for FrameSummary {
    fn from(result: &DetectionResult) -> Self {
        Self {
            status: result.status,
            num_contours: result.candidates.len(),
            num_accepted: result.num_accepted(),
        }
    }
}

/// Runs mask, edges, contours, classification and overlay on one frame.
///
/// Holds configuration only; nothing is carried from one frame to the next,
/// so a single analyzer can be shared across threads.
#[derive(Clone, Debug)]
pub struct FrameAnalyzer {
    params: TargetParams,
    classifier: ShapeClassifier,
    overlay: OverlayRenderer,
    keep_intermediates: bool,
}

impl FrameAnalyzer {
    pub fn new(params: TargetParams) -> Result<Self, ParamsError> {
        params.validate()?;
        let classifier = ShapeClassifier::new(params.shape, params.crosshair_fraction);
        Ok(Self {
            params,
            classifier,
            overlay: OverlayRenderer::default(),
            keep_intermediates: false,
        })
    }

    pub fn with_overlay(mut self, overlay: OverlayRenderer) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    pub fn params(&self) -> &TargetParams {
        &self.params
    }

    pub fn overlay(&self) -> &OverlayRenderer {
        &self.overlay
    }

    /// Classify every outer contour of `frame` without drawing anything.
    pub fn detect(&self, frame: &RgbImage) -> Result<DetectionResult, FrameError> {
        check_frame(frame)?;
        let (result, _) = self.run(frame);
        Ok(result)
    }

    /// Full pass: detection plus the annotated frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width(), height = frame.height()))
    )]
    pub fn analyze(&self, frame: &RgbImage) -> Result<FrameAnalysis, FrameError> {
        check_frame(frame)?;
        let (result, intermediates) = self.run(frame);
        let annotated = self.overlay.render(frame, &result);
        Ok(FrameAnalysis {
            result,
            annotated,
            intermediates,
        })
    }

    fn run(&self, frame: &RgbImage) -> (DetectionResult, Option<Intermediates>) {
        let mask = color_mask(frame, &self.params.color);
        let edges = extract_edges(&mask, &self.params.edges);
        let contours = find_outer_contours(&edges);
        debug!(
            "{}x{} frame: {} outer contours",
            frame.width(),
            frame.height(),
            contours.len()
        );

        let candidates: Vec<_> = contours
            .iter()
            .map(|c| self.classifier.classify(c))
            .collect();
        let result = DetectionResult::from_candidates(candidates);
        debug!("{} ({} accepted)", result.status, result.num_accepted());

        let intermediates = self
            .keep_intermediates
            .then_some(Intermediates { mask, edges });
        (result, intermediates)
    }
}
