use image::RgbImage;

/// Malformed input frame. The frame is skipped; the stream continues.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("empty frame (width={width}, height={height})")]
    Empty { width: u32, height: u32 },

    #[error("expected {expected} channels per pixel, got {got}")]
    ChannelCount { expected: usize, got: usize },

    #[error("invalid frame buffer length (expected {expected} bytes, got {got})")]
    BufferLength { expected: usize, got: usize },

    #[error("frame too large to address ({width}x{height})")]
    TooLarge { width: u32, height: u32 },
}

/// Number of interleaved channels in a frame.
pub const FRAME_CHANNELS: usize = 3;

/// Reject frames the pipeline cannot process.
pub fn check_frame(frame: &RgbImage) -> Result<(), FrameError> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(FrameError::Empty { width, height });
    }
    Ok(())
}

/// Build a frame from an interleaved 8-bit buffer.
///
/// `channels` describes the layout of `pixels`; anything other than three
/// interleaved channels is rejected rather than guessed at.
pub fn frame_from_raw(
    width: u32,
    height: u32,
    channels: usize,
    pixels: Vec<u8>,
) -> Result<RgbImage, FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::Empty { width, height });
    }
    if channels != FRAME_CHANNELS {
        return Err(FrameError::ChannelCount {
            expected: FRAME_CHANNELS,
            got: channels,
        });
    }
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(FRAME_CHANNELS))
        .ok_or(FrameError::TooLarge { width, height })?;
    let got = pixels.len();
    if got != expected {
        return Err(FrameError::BufferLength { expected, got });
    }
    // `from_raw` only rejects short buffers, which the length check rules out.
    RgbImage::from_raw(width, height, pixels).ok_or(FrameError::BufferLength { expected, got })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_buffer_round_trips_pixels() {
        let pixels: Vec<u8> = (0..2 * 3 * 3).map(|v| v as u8).collect();
        let frame = frame_from_raw(2, 3, 3, pixels).expect("valid buffer");
        assert_eq!(frame.dimensions(), (2, 3));
        assert_eq!(frame.get_pixel(1, 0).0, [3, 4, 5]);
    }

    #[test]
    fn raw_buffer_errors() {
        assert_eq!(
            frame_from_raw(0, 4, 3, Vec::new()),
            Err(FrameError::Empty {
                width: 0,
                height: 4
            })
        );
        assert_eq!(
            frame_from_raw(2, 2, 4, vec![0; 16]),
            Err(FrameError::ChannelCount {
                expected: 3,
                got: 4
            })
        );
        assert_eq!(
            frame_from_raw(2, 2, 3, vec![0; 11]),
            Err(FrameError::BufferLength {
                expected: 12,
                got: 11
            })
        );
    }

    #[test]
    fn oversized_dimensions_are_not_reported_as_empty() {
        assert_eq!(
            frame_from_raw(u32::MAX, u32::MAX, 3, vec![0; 12]),
            Err(FrameError::TooLarge {
                width: u32::MAX,
                height: u32::MAX
            })
        );
    }

    #[test]
    fn short_and_long_buffers_report_their_real_length() {
        for got in [0, 11, 13, 24] {
            assert_eq!(
                frame_from_raw(2, 2, 3, vec![0; got]),
                Err(FrameError::BufferLength { expected: 12, got })
            );
        }
    }

    #[test]
    fn empty_frames_are_rejected() {
        assert!(check_frame(&RgbImage::new(0, 0)).is_err());
        assert!(check_frame(&RgbImage::new(1, 1)).is_ok());
    }
}
