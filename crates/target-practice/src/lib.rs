//! High-level facade crate for the `target-practice-*` workspace.
//!
//! This crate provides:
//! - re-exports of the geometry kernel and the per-frame detector
//! - frame sources (still images, GIF clips, raw RGB24 camera streams)
//! - sinks that write annotated PNGs or JSON lines reports
//! - a session loop that ties them together, optionally batching frames on
//!   the rayon pool (feature `parallel`)
//!
//! ## Quickstart
//!
//! ```no_run
//! use target_practice::detect::{FrameAnalyzer, TargetParams};
//! use target_practice::session::Session;
//! use target_practice::sink::{DirectorySink, NoPump};
//! use target_practice::source::StillImage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let analyzer = FrameAnalyzer::new(TargetParams::default())?;
//! let mut source = StillImage::open("range.png")?;
//! let mut sink = DirectorySink::create("out")?;
//!
//! let stats = Session::new(analyzer).run(&mut source, &mut sink, &mut NoPump)?;
//! println!("frames with targets: {}", stats.frames_with_targets);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `target_practice::core`: contours, polygons and their geometry.
//! - `target_practice::detect`: mask, edges, contours, classifier, overlay.
//! - `target_practice::source`, `sink`, `session`: frame I/O and the loop.
//! - `target_practice::config`: JSON run configuration.

pub use target_practice_core as core;
pub use target_practice_detect as detect;

pub use target_practice_detect::{
    DetectionResult, FrameAnalysis, FrameAnalyzer, TargetParams, TargetStatus,
};

pub mod config;
pub mod session;
pub mod sink;
pub mod source;
