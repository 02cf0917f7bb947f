//! Consumers of analyzed frames and the per-frame UI hook.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use image::{ImageError, RgbImage};
use serde::Serialize;

use crate::detect::{Candidate, FrameAnalysis, TargetStatus};
use crate::session::StopSignal;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("sink I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode image: {0}")]
    Image(#[from] ImageError),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receives every successfully analyzed frame, in arrival order.
pub trait FrameSink {
    fn present(
        &mut self,
        index: u64,
        raw: &RgbImage,
        analysis: &FrameAnalysis,
    ) -> Result<(), SinkError>;

    /// Called once after the last frame.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _: u64, _: &RgbImage, _: &FrameAnalysis) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes numbered PNG files into a directory.
///
/// `frame_000000_annotated.png` is always written; `_raw` and `_mask`
/// companions are optional. The mask is only available when the analyzer
/// keeps intermediates.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    save_raw: bool,
    save_mask: bool,
}

impl DirectorySink {
    /// Create `dir` (and parents) if needed.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            save_raw: false,
            save_mask: false,
        })
    }

    pub fn with_raw(mut self, save: bool) -> Self {
        self.save_raw = save;
        self
    }

    pub fn with_mask(mut self, save: bool) -> Self {
        self.save_mask = save;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, index: u64, kind: &str) -> PathBuf {
        self.dir.join(format!("frame_{index:06}_{kind}.png"))
    }
}

impl FrameSink for DirectorySink {
    fn present(
        &mut self,
        index: u64,
        raw: &RgbImage,
        analysis: &FrameAnalysis,
    ) -> Result<(), SinkError> {
        analysis.annotated.save(self.path_for(index, "annotated"))?;
        if self.save_raw {
            raw.save(self.path_for(index, "raw"))?;
        }
        if self.save_mask {
            if let Some(inter) = &analysis.intermediates {
                inter.mask.save(self.path_for(index, "mask"))?;
            }
        }
        Ok(())
    }
}

/// One line of [`JsonLinesSink`] output.
#[derive(Debug, Serialize)]
pub struct FrameReport<'a> {
    pub frame: u64,
    pub width: u32,
    pub height: u32,
    pub status: TargetStatus,
    pub message: &'static str,
    pub num_contours: usize,
    pub num_accepted: usize,
    pub candidates: &'a [Candidate],
}

impl<'a> FrameReport<'a> {
    pub fn new(index: u64, raw: &RgbImage, analysis: &'a FrameAnalysis) -> Self {
        let result = &analysis.result;
        Self {
            frame: index,
            width: raw.width(),
            height: raw.height(),
            status: result.status,
            message: result.status.message(),
            num_contours: result.candidates.len(),
            num_accepted: result.num_accepted(),
            candidates: &result.candidates,
        }
    }
}

/// Streams one JSON report per frame, newline separated.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<io::BufWriter<fs::File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Ok(Self::new(io::BufWriter::new(fs::File::create(path)?)))
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn present(
        &mut self,
        index: u64,
        raw: &RgbImage,
        analysis: &FrameAnalysis,
    ) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &FrameReport::new(index, raw, analysis))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Fans every frame out to several sinks. All sinks see every frame even
/// when one fails; the first error is returned.
#[derive(Default)]
pub struct Tee {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl Tee {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: impl FrameSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn with(mut self, sink: impl FrameSink + 'static) -> Self {
        self.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl FrameSink for Tee {
    fn present(
        &mut self,
        index: u64,
        raw: &RgbImage,
        analysis: &FrameAnalysis,
    ) -> Result<(), SinkError> {
        let mut first = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.present(index, raw, analysis) {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        let mut first = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.finish() {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn present(
        &mut self,
        index: u64,
        raw: &RgbImage,
        analysis: &FrameAnalysis,
    ) -> Result<(), SinkError> {
        (**self).present(index, raw, analysis)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        (**self).finish()
    }
}

/// Called once per presented frame; may request a stop.
pub trait UiPump {
    fn pump(&mut self, stop: &StopSignal);
}

/// Does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPump;

impl UiPump for NoPump {
    fn pump(&mut self, _stop: &StopSignal) {}
}

/// Requests a stop after a fixed number of frames.
#[derive(Clone, Copy, Debug)]
pub struct FrameLimit {
    remaining: u64,
}

impl FrameLimit {
    pub fn new(frames: u64) -> Self {
        Self { remaining: frames }
    }
}

impl UiPump for FrameLimit {
    fn pump(&mut self, stop: &StopSignal) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            stop.stop();
        }
    }
}
