//! The acquisition loop: fetch, analyze, present, pump.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbImage;
use log::{debug, info, warn};
use serde::Serialize;

use crate::detect::{FrameAnalysis, FrameAnalyzer, FrameError, TargetStatus};
use crate::sink::{FrameSink, UiPump};
use crate::source::{FrameSource, SourceError};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Shared stop flag. Stopping is idempotent and cannot be undone.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fatal session failure. Malformed frames and sink failures are not fatal.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("frame source failed: {0}")]
    Source(#[source] SourceError),
}

/// Counters collected over one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Frames delivered by the source, including skipped ones.
    pub frames_read: u64,
    pub frames_presented: u64,
    pub frames_skipped: u64,
    pub frames_with_targets: u64,
    pub sink_failures: u64,
}

/// Drives a [`FrameAnalyzer`] over a [`FrameSource`].
///
/// Frames are processed in batches of `jobs`; with the `parallel` feature a
/// batch is analyzed on the rayon pool, otherwise one frame at a time.
/// Results are always presented in arrival order.
pub struct Session {
    analyzer: FrameAnalyzer,
    jobs: usize,
    stop: StopSignal,
}

impl Session {
    pub fn new(analyzer: FrameAnalyzer) -> Self {
        Self {
            analyzer,
            jobs: 1,
            stop: StopSignal::new(),
        }
    }

    /// Batch size; values below 1 are treated as 1.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Handle that stops the session before the next frame is fetched.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn analyzer(&self) -> &FrameAnalyzer {
        &self.analyzer
    }

    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(jobs = self.jobs)))]
    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        pump: &mut dyn UiPump,
    ) -> Result<SessionStats, SessionError> {
        let mut stats = SessionStats::default();
        let mut last_status: Option<TargetStatus> = None;
        let mut next_index = 0u64;

        'frames: loop {
            let (batch, exhausted) = self.read_batch(source, &mut stats, &mut next_index)?;
            let analyses = self.analyze_batch(&batch);

            for ((index, raw), analysis) in batch.iter().zip(analyses) {
                if self.stop.is_stopped() {
                    break 'frames;
                }
                let analysis = match analysis {
                    Ok(a) => a,
                    Err(e) => {
                        warn!("skipping frame {index}: {e}");
                        stats.frames_skipped += 1;
                        continue;
                    }
                };

                let status = analysis.result.status;
                if last_status != Some(status) {
                    info!("frame {index}: {status}");
                    last_status = Some(status);
                }
                if status == TargetStatus::Acquired {
                    stats.frames_with_targets += 1;
                }

                if let Err(e) = sink.present(*index, raw, &analysis) {
                    warn!("sink failed on frame {index}: {e}");
                    stats.sink_failures += 1;
                }
                stats.frames_presented += 1;
                pump.pump(&self.stop);
            }

            if exhausted || self.stop.is_stopped() {
                break;
            }
        }

        if let Err(e) = sink.finish() {
            warn!("sink failed to finish: {e}");
            stats.sink_failures += 1;
        }
        debug!("session finished: {stats:?}");
        Ok(stats)
    }

    /// Up to `jobs` frames plus whether the source ran dry. The stop flag is
    /// checked before every fetch.
    fn read_batch(
        &self,
        source: &mut dyn FrameSource,
        stats: &mut SessionStats,
        next_index: &mut u64,
    ) -> Result<(Vec<(u64, RgbImage)>, bool), SessionError> {
        let mut batch = Vec::with_capacity(self.jobs);
        while batch.len() < self.jobs {
            if self.stop.is_stopped() {
                return Ok((batch, true));
            }
            match source.next_frame() {
                Ok(Some(frame)) => {
                    stats.frames_read += 1;
                    batch.push((*next_index, frame));
                    *next_index += 1;
                }
                Ok(None) => return Ok((batch, true)),
                Err(e) if e.is_recoverable() => {
                    stats.frames_read += 1;
                    stats.frames_skipped += 1;
                    warn!("skipping frame {next_index}: {e}");
                    *next_index += 1;
                }
                Err(e) => return Err(SessionError::Source(e)),
            }
        }
        Ok((batch, false))
    }

    #[cfg(feature = "parallel")]
    fn analyze_batch(&self, batch: &[(u64, RgbImage)]) -> Vec<Result<FrameAnalysis, FrameError>> {
        use rayon::prelude::*;

        if batch.len() > 1 {
            return batch
                .par_iter()
                .map(|(_, frame)| self.analyzer.analyze(frame))
                .collect();
        }
        batch
            .iter()
            .map(|(_, frame)| self.analyzer.analyze(frame))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn analyze_batch(&self, batch: &[(u64, RgbImage)]) -> Vec<Result<FrameAnalysis, FrameError>> {
        batch
            .iter()
            .map(|(_, frame)| self.analyzer.analyze(frame))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_is_idempotent_and_shared() {
        let stop = StopSignal::new();
        let handle = stop.clone();
        assert!(!handle.is_stopped());
        stop.stop();
        stop.stop();
        assert!(handle.is_stopped());
    }

    #[test]
    fn jobs_are_at_least_one() {
        let analyzer = FrameAnalyzer::new(Default::default()).unwrap();
        assert_eq!(Session::new(analyzer).with_jobs(0).jobs(), 1);
    }
}
