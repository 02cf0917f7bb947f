use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use log::{info, LevelFilter};

use target_practice::config::RunConfig;
use target_practice::detect::{FrameAnalyzer, OverlayRenderer};
use target_practice::session::Session;
use target_practice::sink::{
    DirectorySink, FrameLimit, FrameSink, JsonLinesSink, NoPump, NullSink, Tee, UiPump,
};
use target_practice::source::{SourceKind, DEFAULT_STREAM_HEIGHT, DEFAULT_STREAM_WIDTH};

/// Find colored polygonal targets in images, GIF clips or raw camera streams.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["image", "video", "camera", "webcam"])
))]
struct Args {
    /// Still image to analyze.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Animated GIF to analyze frame by frame.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Device node or FIFO delivering raw RGB24 frames.
    #[arg(long)]
    camera: Option<PathBuf>,

    /// Read raw RGB24 frames from standard input.
    #[arg(long)]
    webcam: bool,

    /// Width of raw RGB24 frames.
    #[arg(long, default_value_t = DEFAULT_STREAM_WIDTH)]
    raw_width: u32,

    /// Height of raw RGB24 frames.
    #[arg(long, default_value_t = DEFAULT_STREAM_HEIGHT)]
    raw_height: u32,

    /// Rescale every frame to this width before analysis (aspect preserved).
    #[arg(long)]
    width: Option<u32>,

    /// JSON file with detection parameters and overlay style.
    #[arg(long)]
    config: Option<PathBuf>,

    /// TrueType font for labels and the status line; text is skipped without it.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Directory for annotated PNG frames.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write the unannotated frame next to the annotated one.
    #[arg(long, requires = "out")]
    save_raw: bool,

    /// Also write the color mask next to the annotated frame.
    #[arg(long, requires = "out")]
    save_mask: bool,

    /// JSON lines report, one object per frame.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Stop after presenting this many frames.
    #[arg(long)]
    max_frames: Option<u64>,

    /// Frames analyzed per batch (parallel with the `parallel` feature).
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Log level: off, error, warn, info, debug or trace.
    #[arg(long, default_value = "info", value_parser = target_practice::core::parse_level)]
    log_level: LevelFilter,

    /// Emit tracing output as JSON.
    #[cfg(feature = "tracing")]
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn source_kind(&self) -> Option<SourceKind> {
        if let Some(path) = &self.image {
            return Some(SourceKind::StillImage(path.clone()));
        }
        if let Some(path) = &self.video {
            return Some(SourceKind::VideoFile(path.clone()));
        }
        if let Some(device) = &self.camera {
            return Some(SourceKind::LiveCamera {
                device: device.clone(),
                width: self.raw_width,
                height: self.raw_height,
            });
        }
        self.webcam.then_some(SourceKind::Webcam {
            width: self.raw_width,
            height: self.raw_height,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    let mut overlay = OverlayRenderer::new(config.overlay.clone());
    if let Some(path) = &args.font {
        overlay = overlay.with_font(OverlayRenderer::load_font(path)?);
    }
    let analyzer = FrameAnalyzer::new(config.params.clone())?
        .with_overlay(overlay)
        .keep_intermediates(args.save_mask);

    let kind = args.source_kind().ok_or("no input selected")?;
    let mut source = kind.open(args.width)?;

    let mut tee = Tee::new();
    if let Some(dir) = &args.out {
        tee.push(
            DirectorySink::create(dir)?
                .with_raw(args.save_raw)
                .with_mask(args.save_mask),
        );
    }
    if let Some(path) = &args.json {
        tee.push(JsonLinesSink::create(path)?);
    }
    let mut sink: Box<dyn FrameSink> = if tee.is_empty() {
        Box::new(NullSink)
    } else {
        Box::new(tee)
    };

    let mut pump: Box<dyn UiPump> = match args.max_frames {
        Some(n) => Box::new(FrameLimit::new(n)),
        None => Box::new(NoPump),
    };

    let session = Session::new(analyzer).with_jobs(args.jobs);
    let stats = session.run(source.as_mut(), sink.as_mut(), pump.as_mut())?;
    info!("{stats:?}");
    println!(
        "frames: {} presented, {} skipped, {} with targets",
        stats.frames_presented, stats.frames_skipped, stats.frames_with_targets
    );
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_log::LogTracer::init();
    log::set_max_level(args.log_level);
    target_practice::core::init_tracing(args.log_json);
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    target_practice::core::init_with_level(args.log_level).map_err(|e| e.to_string())?;
    Ok(())
}

