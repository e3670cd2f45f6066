//! Seekable video resources.
//!
//! [`VideoResource`] wraps an FFmpeg demuxer and decoder for the best video
//! stream of a recording. It exposes the recording's duration and intrinsic
//! dimensions and renders the visual frame at any timestamp into an RGB
//! still buffer of those dimensions.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{capture::RecordedVideo, error::FootScanError, utilities};

/// An opened, seekable recording.
///
/// Created with [`open`](VideoResource::open) for a file on disk or
/// [`from_recording`](VideoResource::from_recording) for the output of a
/// capture device. A resource built from a recording owns it: dropping the
/// resource closes the demuxer and then releases the recording's backing
/// storage.
///
/// # Example
///
/// ```no_run
/// use footscan::{FootScanError, VideoResource};
///
/// let mut video = VideoResource::open("foot.mp4")?;
/// println!("{:.2}s, {}x{}", video.duration(), video.width(), video.height());
/// let still = video.render_at(0.0)?;
/// still.save("first.png")?;
/// # Ok::<(), FootScanError>(())
/// ```
pub struct VideoResource {
    input: Input,
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    stream_index: usize,
    time_base: Rational,
    start_seconds: f64,
    frame_interval: f64,
    duration: f64,
    width: u32,
    height: u32,
    path: PathBuf,
    // Declared last so it is released after the demuxer has closed the file.
    recording: Option<RecordedVideo>,
}

impl Debug for VideoResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoResource")
            .field("path", &self.path)
            .field("stream_index", &self.stream_index)
            .field("duration", &self.duration)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("owns_recording", &self.recording.is_some())
            .finish_non_exhaustive()
    }
}

impl VideoResource {
    /// Open a video file.
    ///
    /// Initialises FFmpeg (idempotent), opens the container, and prepares a
    /// decoder for its best video stream.
    ///
    /// # Errors
    ///
    /// Returns [`FootScanError::FileOpen`] if the file cannot be opened or
    /// decoded, or [`FootScanError::NoVideoStream`] if it has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FootScanError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video resource: {}", path.display());

        ffmpeg_next::init().map_err(|error| FootScanError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| FootScanError::FileOpen {
            path: path.clone(),
            reason: error.to_string(),
        })?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(FootScanError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let start_pts = match stream.start_time() {
            utilities::NO_PTS => 0,
            pts => pts,
        };
        let start_seconds = utilities::pts_to_seconds(start_pts, time_base);
        let frame_interval = utilities::frame_interval(stream.avg_frame_rate());

        let container_microseconds = input.duration();
        let duration = if container_microseconds > 0 {
            container_microseconds as f64 / 1_000_000.0
        } else if stream.duration() > 0 {
            utilities::pts_to_seconds(stream.duration(), time_base)
        } else {
            0.0
        };

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                FootScanError::FileOpen {
                    path: path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| FootScanError::FileOpen {
                path: path.clone(),
                reason: format!("Failed to create video decoder: {error}"),
            })?;

        let width = decoder.width();
        let height = decoder.height();

        log::info!(
            "Opened video resource: {} (format={}, duration={:.2}s, {}x{})",
            path.display(),
            input.format().name(),
            duration,
            width,
            height,
        );

        Ok(Self {
            input,
            decoder,
            scaler: None,
            stream_index,
            time_base,
            start_seconds,
            frame_interval,
            duration,
            width,
            height,
            path,
            recording: None,
        })
    }

    /// Open the output of a capture device, taking ownership of it.
    ///
    /// The recording is released when the resource is dropped, or right
    /// away if opening fails.
    pub fn from_recording(recording: RecordedVideo) -> Result<Self, FootScanError> {
        let mut resource = Self::open(recording.path())?;
        resource.recording = Some(recording);
        Ok(resource)
    }

    /// Duration in seconds. Zero when the container reports none.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Intrinsic frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Intrinsic frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the visual frame shown at `seconds`.
    ///
    /// Seeks to the nearest keyframe at or before the timestamp and decodes
    /// forward until the seek settles: the first frame presented at or
    /// after `seconds` (within half a frame interval) is the result. When
    /// the stream ends first, as it does for a timestamp equal to the
    /// duration, the last decoded frame is used.
    ///
    /// # Errors
    ///
    /// - [`FootScanError::InvalidTimestamp`] for negative or non-finite
    ///   timestamps, or ones past the end of the video.
    /// - [`FootScanError::VideoDecodeError`] if no frame could be decoded.
    /// - [`FootScanError::RenderContext`] if the pixel converter cannot be
    ///   created for the decoded format.
    pub fn render_at(&mut self, seconds: f64) -> Result<RgbImage, FootScanError> {
        if !seconds.is_finite() || seconds < 0.0 || seconds > self.duration + self.frame_interval
        {
            return Err(FootScanError::InvalidTimestamp(seconds));
        }

        let target = utilities::seconds_to_seek_timestamp(seconds + self.start_seconds);
        self.input.seek(target, ..target)?;
        self.decoder.flush();

        let stream_index = self.stream_index;
        let time_base = self.time_base;
        let start_seconds = self.start_seconds;
        let tolerance = self.frame_interval / 2.0;
        let settles = |frame: &VideoFrame| {
            let pts = frame.timestamp().or(frame.pts()).unwrap_or(0);
            utilities::pts_to_seconds(pts, time_base) - start_seconds + tolerance >= seconds
        };

        let mut decoded = VideoFrame::empty();
        let mut previous = VideoFrame::empty();
        let mut have_previous = false;
        let mut settled = false;

        'packets: for (stream, packet) in self.input.packets() {
            if stream.index() != stream_index {
                continue;
            }

            self.decoder.send_packet(&packet)?;

            while self.decoder.receive_frame(&mut decoded).is_ok() {
                if settles(&decoded) {
                    settled = true;
                    break 'packets;
                }
                std::mem::swap(&mut decoded, &mut previous);
                have_previous = true;
            }
        }

        if !settled {
            self.decoder.send_eof()?;
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                if settles(&decoded) {
                    settled = true;
                    break;
                }
                std::mem::swap(&mut decoded, &mut previous);
                have_previous = true;
            }
        }

        let frame = if settled {
            &decoded
        } else if have_previous {
            log::debug!("Stream ended before {seconds:.3}s; using the last decoded frame");
            &previous
        } else {
            return Err(FootScanError::VideoDecodeError(format!(
                "No frame could be decoded at {seconds:.3}s"
            )));
        };

        self.convert(frame)
    }

    /// Scale a decoded frame to RGB24 at the intrinsic dimensions.
    fn convert(&mut self, frame: &VideoFrame) -> Result<RgbImage, FootScanError> {
        if self.scaler.is_none() {
            let scaler = ScalingContext::get(
                frame.format(),
                frame.width(),
                frame.height(),
                Pixel::RGB24,
                self.width,
                self.height,
                ScalingFlags::BILINEAR,
            )
            .map_err(|error| FootScanError::RenderContext(error.to_string()))?;
            self.scaler = Some(scaler);
        }
        let Some(scaler) = self.scaler.as_mut() else {
            return Err(FootScanError::RenderContext(
                "pixel converter unavailable".to_string(),
            ));
        };

        let mut rgb_frame = VideoFrame::empty();
        scaler.run(frame, &mut rgb_frame)?;

        let buffer = utilities::frame_to_rgb_buffer(&rgb_frame, self.width, self.height);
        RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            FootScanError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }
}
