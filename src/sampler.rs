//! Deterministic frame sampling.
//!
//! The sampler picks `count` timestamps spread evenly across a recording,
//! first at the start and last at the end, then seeks to each in turn and
//! encodes the settled frame as JPEG. Seeks are strictly sequential: the
//! next one starts only after the previous frame has been rendered.
//!
//! # Example
//!
//! ```no_run
//! use footscan::{FootScanError, FrameSampler, SamplingOptions, VideoResource};
//!
//! let video = VideoResource::open("foot.mp4")?;
//! let frames = FrameSampler::new(SamplingOptions::new().with_frame_count(3)).sample(video)?;
//! for frame in &frames {
//!     println!("frame {} at {:.2}s: {} bytes", frame.index(), frame.timestamp(), frame.bytes().len());
//! }
//! # Ok::<(), FootScanError>(())
//! ```

use image::RgbImage;

use crate::{
    capture::RecordedVideo,
    configuration::SamplingOptions,
    error::FootScanError,
    frame::EncodedFrame,
    progress::{OperationType, ProgressTracker},
    video::VideoResource,
};

/// Choose the timestamps sampled from a video of `duration` seconds.
///
/// A single frame is taken at `0`. Otherwise frames are spaced
/// `duration / (count - 1)` apart and clamped to `duration`, so the first
/// is at the start and the last at the end.
///
/// # Errors
///
/// - [`FootScanError::InvalidFrameCount`] when `count` is zero.
/// - [`FootScanError::NoDuration`] when `duration` is not positive.
///
/// # Example
///
/// ```
/// let timestamps = footscan::sample_timestamps(5.0, 3).unwrap();
/// assert_eq!(timestamps, vec![0.0, 2.5, 5.0]);
/// ```
pub fn sample_timestamps(duration: f64, count: usize) -> Result<Vec<f64>, FootScanError> {
    if count == 0 {
        return Err(FootScanError::InvalidFrameCount);
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(FootScanError::NoDuration);
    }
    if count == 1 {
        return Ok(vec![0.0]);
    }

    let interval = duration / (count - 1) as f64;
    Ok((0..count)
        .map(|index| (index as f64 * interval).min(duration))
        .collect())
}

/// A time-addressable video the sampler can read stills from.
pub trait FrameSource {
    /// Duration in seconds.
    fn duration(&self) -> f64;

    /// Render the settled frame at `seconds` into an RGB buffer of the
    /// source's intrinsic dimensions.
    fn render_at(&mut self, seconds: f64) -> Result<RgbImage, FootScanError>;
}

impl FrameSource for VideoResource {
    fn duration(&self) -> f64 {
        VideoResource::duration(self)
    }

    fn render_at(&mut self, seconds: f64) -> Result<RgbImage, FootScanError> {
        VideoResource::render_at(self, seconds)
    }
}

/// Anything that can be loaded into a [`FrameSource`].
///
/// Loading is part of sampling: a failure here surfaces as the load error
/// of the sampling operation.
pub trait IntoFrameSource {
    /// The loaded source.
    type Source: FrameSource;

    /// Load the source.
    fn into_frame_source(self) -> Result<Self::Source, FootScanError>;
}

impl IntoFrameSource for VideoResource {
    type Source = VideoResource;

    fn into_frame_source(self) -> Result<Self::Source, FootScanError> {
        Ok(self)
    }
}

impl IntoFrameSource for RecordedVideo {
    type Source = VideoResource;

    fn into_frame_source(self) -> Result<Self::Source, FootScanError> {
        VideoResource::from_recording(self)
    }
}

/// Samples encoded stills from a video.
///
/// The sampler takes its source by value and drops it before returning, so
/// the resource is released exactly once whether sampling succeeds or
/// fails. Failures never yield a partial frame list.
#[derive(Debug, Clone, Default)]
pub struct FrameSampler {
    options: SamplingOptions,
}

impl FrameSampler {
    /// Create a sampler with the given options.
    pub fn new(options: SamplingOptions) -> Self {
        Self { options }
    }

    /// The sampler's options.
    pub fn options(&self) -> &SamplingOptions {
        &self.options
    }

    /// Sample `options.frame_count()` frames from `source`.
    ///
    /// # Errors
    ///
    /// Any load, duration, seek, render, or encode failure aborts the whole
    /// operation and is returned as-is. A cancelled token yields
    /// [`FootScanError::Cancelled`].
    pub fn sample<S: IntoFrameSource>(&self, source: S) -> Result<Vec<EncodedFrame>, FootScanError> {
        let mut source = source.into_frame_source()?;
        let count = self.options.frame_count;
        let timestamps = sample_timestamps(source.duration(), count)?;

        log::debug!(
            "Sampling {} frame(s) from {:.3}s of video at {:?}",
            count,
            source.duration(),
            timestamps
        );

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::FrameSampling,
            Some(count as u64),
        );

        let mut frames = Vec::with_capacity(count);
        for (index, &timestamp) in timestamps.iter().enumerate() {
            if self.options.is_cancelled() {
                log::debug!("Sampling cancelled before frame {index}");
                return Err(FootScanError::Cancelled);
            }

            let still = source.render_at(timestamp)?;
            let frame = EncodedFrame::encode(index, timestamp, &still, self.options.jpeg_quality)?;
            log::debug!(
                "Captured frame {index} at {timestamp:.3}s ({}x{}, {} bytes)",
                frame.width(),
                frame.height(),
                frame.bytes().len()
            );
            frames.push(frame);
            tracker.advance(Some(timestamp));
        }

        Ok(frames)
    }
}

/// Sample `count` frames from a recording with default options.
///
/// Convenience wrapper over [`FrameSampler::sample`].
pub fn extract_frames<S: IntoFrameSource>(
    video: S,
    count: usize,
) -> Result<Vec<EncodedFrame>, FootScanError> {
    FrameSampler::new(SamplingOptions::new().with_frame_count(count)).sample(video)
}
