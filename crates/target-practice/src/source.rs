//! Frame acquisition.
//!
//! Every source yields owned RGB frames until it is exhausted (`Ok(None)`).
//! Live streams use a headerless RGB24 protocol: consecutive
//! `width * height * 3` byte frames, rows top to bottom, pixels R, G, B. This
//! is what `ffmpeg -f v4l2 -i /dev/video0 -f rawvideo -pix_fmt rgb24 -` and
//! similar capture tools emit.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, DynamicImage, Frames, ImageError, ImageReader, RgbImage};
use log::debug;

use crate::detect::{frame_from_raw, FrameError, FRAME_CHANNELS};

/// Default raw stream resolution.
pub const DEFAULT_STREAM_WIDTH: u32 = 640;
pub const DEFAULT_STREAM_HEIGHT: u32 = 480;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("source I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] ImageError),

    /// A single malformed frame; the stream itself may continue.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl SourceError {
    /// Whether the caller can skip this frame and keep reading.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SourceError::Frame(_))
    }
}

/// Producer of frames for a session.
pub trait FrameSource {
    /// Next frame, or `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        (**self).next_frame()
    }
}

/// One decoded image file, yielded once.
pub struct StillImage {
    frame: Option<RgbImage>,
}

impl StillImage {
    /// Decode `path` eagerly so unreadable files fail at startup.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let img = ImageReader::open(path.as_ref())?
            .with_guessed_format()?
            .decode()?;
        Ok(Self::from_image(img.to_rgb8()))
    }

    pub fn from_image(frame: RgbImage) -> Self {
        Self { frame: Some(frame) }
    }
}

impl FrameSource for StillImage {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        Ok(self.frame.take())
    }
}

/// Animated GIF decoded frame by frame. Frames are composited onto the full
/// logical screen before they are handed out.
pub struct VideoFile {
    frames: Frames<'static>,
}

impl VideoFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = BufReader::new(File::open(path.as_ref())?);
        let decoder = GifDecoder::new(file)?;
        Ok(Self {
            frames: decoder.into_frames(),
        })
    }
}

impl FrameSource for VideoFile {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        match self.frames.next() {
            None => Ok(None),
            Some(frame) => {
                let rgba = frame?.into_buffer();
                Ok(Some(DynamicImage::ImageRgba8(rgba).to_rgb8()))
            }
        }
    }
}

/// Fixed-size RGB24 frames read back to back from any byte stream.
pub struct RawRgbStream<R> {
    reader: R,
    width: u32,
    height: u32,
    finished: bool,
}

impl<R: Read> RawRgbStream<R> {
    pub fn new(reader: R, width: u32, height: u32) -> Self {
        Self {
            reader,
            width,
            height,
            finished: false,
        }
    }

    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * FRAME_CHANNELS
    }

    /// Fill `buf` as far as the stream allows; returns the byte count.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> FrameSource for RawRgbStream<R> {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        if self.finished {
            return Ok(None);
        }
        let expected = self.frame_len();
        if expected == 0 {
            self.finished = true;
            return Err(FrameError::Empty {
                width: self.width,
                height: self.height,
            }
            .into());
        }
        let mut buf = vec![0u8; expected];
        let got = self.fill(&mut buf)?;
        if got == 0 {
            self.finished = true;
            return Ok(None);
        }
        if got < expected {
            // Truncated tail; nothing can follow it.
            self.finished = true;
            return Err(FrameError::BufferLength { expected, got }.into());
        }
        Ok(Some(frame_from_raw(
            self.width,
            self.height,
            FRAME_CHANNELS,
            buf,
        )?))
    }
}

/// Raw RGB24 frames from a capture device node or FIFO.
pub type LiveCamera = RawRgbStream<BufReader<File>>;

/// Raw RGB24 frames piped into standard input.
pub type Webcam = RawRgbStream<io::StdinLock<'static>>;

impl LiveCamera {
    pub fn open_device(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, SourceError> {
        let file = File::open(path.as_ref())?;
        Ok(RawRgbStream::new(BufReader::new(file), width, height))
    }
}

impl Webcam {
    pub fn stdin(width: u32, height: u32) -> Self {
        RawRgbStream::new(io::stdin().lock(), width, height)
    }
}

/// Rescales every frame of `inner` to a fixed width, keeping the aspect
/// ratio.
pub struct Resize<S> {
    inner: S,
    width: u32,
}

impl<S: FrameSource> Resize<S> {
    pub fn new(inner: S, width: u32) -> Self {
        Self { inner, width }
    }
}

impl<S: FrameSource> FrameSource for Resize<S> {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, SourceError> {
        let Some(frame) = self.inner.next_frame()? else {
            return Ok(None);
        };
        Ok(Some(resize_to_width(&frame, self.width)))
    }
}

/// `frame` scaled to `width` columns. Frames that already match, and
/// degenerate targets, are returned unchanged.
pub fn resize_to_width(frame: &RgbImage, width: u32) -> RgbImage {
    let (w, h) = frame.dimensions();
    if width == 0 || w == 0 || h == 0 || w == width {
        return frame.clone();
    }
    let height = ((h as f64 * width as f64 / w as f64).round() as u32).max(1);
    imageops::resize(frame, width, height, FilterType::Triangle)
}

/// Where frames come from, as selected on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    StillImage(PathBuf),
    VideoFile(PathBuf),
    LiveCamera {
        device: PathBuf,
        width: u32,
        height: u32,
    },
    Webcam {
        width: u32,
        height: u32,
    },
}

impl SourceKind {
    /// Open the source, optionally behind a [`Resize`] adapter.
    pub fn open(&self, resize_width: Option<u32>) -> Result<Box<dyn FrameSource>, SourceError> {
        debug!("opening source {self:?}");
        let source: Box<dyn FrameSource> = match self {
            SourceKind::StillImage(path) => Box::new(StillImage::open(path)?),
            SourceKind::VideoFile(path) => Box::new(VideoFile::open(path)?),
            SourceKind::LiveCamera {
                device,
                width,
                height,
            } => Box::new(LiveCamera::open_device(device, *width, *height)?),
            SourceKind::Webcam { width, height } => Box::new(Webcam::stdin(*width, *height)),
        };
        Ok(match resize_width {
            Some(w) => Box::new(Resize::new(source, w)),
            None => source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    #[test]
    fn still_image_yields_once() {
        let mut src = StillImage::from_image(RgbImage::new(4, 3));
        assert!(src.next_frame().unwrap().is_some());
        assert!(src.next_frame().unwrap().is_none());
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn raw_stream_splits_frames_and_reports_truncation() {
        let mut bytes: Vec<u8> = Vec::new();
        bytes.extend(std::iter::repeat(10).take(2 * 2 * 3));
        bytes.extend(std::iter::repeat(20).take(2 * 2 * 3));
        bytes.extend([1, 2, 3, 4, 5]);
        let mut src = RawRgbStream::new(Cursor::new(bytes), 2, 2);

        let a = src.next_frame().unwrap().expect("first frame");
        assert_eq!(*a.get_pixel(1, 1), Rgb([10, 10, 10]));
        let b = src.next_frame().unwrap().expect("second frame");
        assert_eq!(*b.get_pixel(0, 0), Rgb([20, 20, 20]));

        let err = src.next_frame().unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(
            err,
            SourceError::Frame(FrameError::BufferLength {
                expected: 12,
                got: 5
            })
        ));
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn empty_raw_stream_is_exhausted() {
        let mut src = RawRgbStream::new(Cursor::new(Vec::new()), 640, 480);
        assert_eq!(src.frame_len(), 640 * 480 * 3);
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn zero_sized_raw_stream_is_a_frame_error() {
        let mut src = RawRgbStream::new(Cursor::new(vec![0u8; 4]), 0, 480);
        assert!(matches!(
            src.next_frame(),
            Err(SourceError::Frame(FrameError::Empty { .. }))
        ));
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn resize_keeps_aspect_ratio() {
        let frame = RgbImage::new(640, 480);
        assert_eq!(resize_to_width(&frame, 320).dimensions(), (320, 240));
        assert_eq!(resize_to_width(&frame, 640).dimensions(), (640, 480));
        assert_eq!(resize_to_width(&frame, 0).dimensions(), (640, 480));

        let mut src = Resize::new(StillImage::from_image(RgbImage::new(100, 50)), 10);
        assert_eq!(src.next_frame().unwrap().unwrap().dimensions(), (10, 5));
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn still_image_round_trips_through_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbImage::from_pixel(8, 6, Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();

        let mut src = SourceKind::StillImage(path).open(None).unwrap();
        let frame = src.next_frame().unwrap().expect("frame");
        assert_eq!(frame.dimensions(), (8, 6));
        assert_eq!(*frame.get_pixel(3, 3), Rgb([200, 10, 10]));
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn missing_files_are_io_errors() {
        let err = SourceKind::VideoFile(PathBuf::from("/nonexistent/clip.gif"))
            .open(None)
            .err()
            .expect("error");
        assert!(matches!(err, SourceError::Io(_)));
        assert!(!err.is_recoverable());
    }
}
