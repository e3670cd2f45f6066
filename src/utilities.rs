//! Internal utility functions.
//!
//! Pixel-data copying and timestamp conversion shared by the video and
//! capture modules.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// FFmpeg's `AV_NOPTS_VALUE`.
pub(crate) const NO_PTS: i64 = i64::MIN;

/// Copy an RGB24 frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3).
/// The result can be passed directly to [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Convert seconds to a container seek timestamp in AV_TIME_BASE
/// (microseconds), as expected by `Input::seek`.
pub(crate) fn seconds_to_seek_timestamp(seconds: f64) -> i64 {
    (seconds.max(0.0) * 1_000_000.0) as i64
}

/// Rescale a PTS value from a stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Frame interval in seconds for a rate, or zero when the rate is unknown.
pub(crate) fn frame_interval(rate: Rational) -> f64 {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        return 0.0;
    }
    rate.denominator() as f64 / rate.numerator() as f64
}
