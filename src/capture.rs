//! Recording devices and recorded videos.
//!
//! A [`CaptureDevice`] turns a [`RecordingSession`] into a
//! [`RecordedVideo`]. Devices are only used through [`record_with`], which
//! acquires the device for the duration of one recording and releases it
//! before the recording is handed on, on success and failure alike.
//!
//! Two devices are provided: [`CameraCapture`] records from a camera
//! through FFmpeg's capture devices (v4l2, avfoundation, dshow), and
//! [`FileCapture`] imports a recording that already exists on disk.
//!
//! # Example
//!
//! ```no_run
//! use footscan::{CameraCapture, FootScanError, RecordingSession, ScannerConfig, record_with};
//!
//! let config = ScannerConfig::from_env();
//! let mut camera = CameraCapture::from_config(&config);
//! let session = RecordingSession::from_config(&config);
//! let video = record_with(&mut camera, &session)?;
//! println!("recorded to {}", video.path().display());
//! # Ok::<(), FootScanError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::{Duration, Instant},
};

use ffmpeg_next::{
    Dictionary,
    codec::Id,
    format::{
        context::{Context as FormatContext, Input},
        format::Format,
    },
    media::Type,
};
use tempfile::TempPath;

use crate::{
    configuration::{DEFAULT_RECORDING_DURATION, ScannerConfig},
    error::FootScanError,
    progress::{CancellationToken, NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
    utilities,
};

/// Which camera to record from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraFacing {
    /// The camera facing the user.
    User,
    /// The camera facing away from the user.
    #[default]
    Environment,
}

impl Display for CameraFacing {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CameraFacing::User => write!(f, "user"),
            CameraFacing::Environment => write!(f, "environment"),
        }
    }
}

impl FromStr for CameraFacing {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" | "front" => Ok(CameraFacing::User),
            "environment" | "rear" | "back" => Ok(CameraFacing::Environment),
            other => Err(format!("unsupported camera facing: {other}")),
        }
    }
}

/// Parameters of one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSession {
    /// Target recording length.
    pub duration: Duration,
    /// Preferred camera.
    pub facing: CameraFacing,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self {
            duration: DEFAULT_RECORDING_DURATION,
            facing: CameraFacing::Environment,
        }
    }
}

impl RecordingSession {
    /// Session parameters taken from a scanner configuration.
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            duration: config.recording_duration,
            facing: config.camera_facing,
        }
    }
}

/// A finished recording.
///
/// Recordings made by a capture device live in a temporary file that is
/// deleted when the value is dropped. Imported recordings point at an
/// existing file that is left in place.
#[derive(Debug)]
pub struct RecordedVideo {
    path: PathBuf,
    temporary: Option<TempPath>,
}

impl RecordedVideo {
    /// Refer to an existing file the caller keeps ownership of.
    pub fn external<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            temporary: None,
        }
    }

    /// Take ownership of a temporary file, deleted on drop.
    pub fn temporary(temp: TempPath) -> Self {
        Self {
            path: temp.to_path_buf(),
            temporary: Some(temp),
        }
    }

    /// Location of the recording.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether dropping this value deletes the file.
    pub fn is_temporary(&self) -> bool {
        self.temporary.is_some()
    }

    /// Keep the recording at `destination` instead of deleting it.
    pub fn persist<P: AsRef<Path>>(mut self, destination: P) -> Result<PathBuf, FootScanError> {
        let destination = destination.as_ref().to_path_buf();
        match self.temporary.take() {
            Some(temp) => {
                // Rename fails across filesystems; copy out of the temp file instead.
                if let Err(failed) = temp.persist(&destination) {
                    log::debug!("Rename failed ({}), copying recording", failed.error);
                    std::fs::copy(&failed.path, &destination)?;
                }
            }
            None => {
                std::fs::copy(&self.path, &destination)?;
            }
        }
        Ok(destination)
    }
}

impl Drop for RecordedVideo {
    fn drop(&mut self) {
        if self.temporary.is_some() {
            log::debug!("Releasing recording {}", self.path.display());
        }
    }
}

/// A device that produces recordings.
///
/// `acquire` and `release` bracket exclusive use of the device; callers go
/// through [`record_with`] (or [`DeviceGuard`]) rather than calling them
/// directly, which guarantees `release` runs exactly once per acquisition.
pub trait CaptureDevice {
    /// Open the device for the given session.
    fn acquire(&mut self, session: &RecordingSession) -> Result<(), FootScanError>;

    /// Record one video. Only called between `acquire` and `release`.
    fn record(&mut self, session: &RecordingSession) -> Result<RecordedVideo, FootScanError>;

    /// Stop and close the device.
    fn release(&mut self);
}

/// Scoped, exclusive acquisition of a [`CaptureDevice`].
///
/// Holds the device mutably borrowed; dropping the guard releases it.
pub struct DeviceGuard<'a, D: CaptureDevice + ?Sized> {
    device: &'a mut D,
}

impl<'a, D: CaptureDevice + ?Sized> DeviceGuard<'a, D> {
    /// Acquire `device`. Nothing needs releasing if this fails.
    pub fn acquire(device: &'a mut D, session: &RecordingSession) -> Result<Self, FootScanError> {
        device.acquire(session)?;
        log::debug!("Capture device acquired ({} camera)", session.facing);
        Ok(Self { device })
    }

    /// Record through the acquired device.
    pub fn record(&mut self, session: &RecordingSession) -> Result<RecordedVideo, FootScanError> {
        self.device.record(session)
    }
}

impl<D: CaptureDevice + ?Sized> Drop for DeviceGuard<'_, D> {
    fn drop(&mut self) {
        self.device.release();
        log::debug!("Capture device released");
    }
}

/// Record one video with `device`.
///
/// The device is released before this returns, so the recording has fully
/// stopped by the time the caller receives it.
pub fn record_with<D: CaptureDevice + ?Sized>(
    device: &mut D,
    session: &RecordingSession,
) -> Result<RecordedVideo, FootScanError> {
    let mut guard = DeviceGuard::acquire(device, session)?;
    let recording = guard.record(session)?;
    drop(guard);
    log::info!("Recording ready: {}", recording.path().display());
    Ok(recording)
}

/// Imports an existing video file as the recording.
#[derive(Debug, Clone)]
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    /// Import the file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CaptureDevice for FileCapture {
    fn acquire(&mut self, _session: &RecordingSession) -> Result<(), FootScanError> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(FootScanError::CaptureError(format!(
                "recording not found: {}",
                self.path.display()
            )))
        }
    }

    fn record(&mut self, _session: &RecordingSession) -> Result<RecordedVideo, FootScanError> {
        Ok(RecordedVideo::external(&self.path))
    }

    fn release(&mut self) {}
}

/// How long a camera may go without delivering data before reads fail.
pub const CAMERA_STALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Records from a camera through an FFmpeg capture device.
///
/// The camera's packets are copied without re-encoding into a temporary
/// Matroska file until the session's duration has been captured, or until
/// the attached [`CancellationToken`] is cancelled, which ends the
/// recording early and keeps what was captured so far.
///
/// Reads are bounded by FFmpeg's `rw_timeout` option, set to
/// [`CAMERA_STALL_TIMEOUT`] unless overridden with
/// [`with_option`](Self::with_option). Capture formats that ignore the
/// option can still block while the camera delivers nothing.
pub struct CameraCapture {
    input_format: String,
    front_device: String,
    rear_device: String,
    options: Vec<(String, String)>,
    progress: Arc<dyn ProgressCallback>,
    cancellation: Option<CancellationToken>,
    input: Option<Input>,
}

/// Decides when a running recording ends.
struct StopCondition {
    target: f64,
    deadline: Instant,
    cancellation: Option<CancellationToken>,
}

impl StopCondition {
    fn new(session: &RecordingSession, cancellation: Option<CancellationToken>) -> Self {
        Self {
            target: session.duration.as_secs_f64(),
            deadline: Instant::now() + session.duration + CAMERA_STALL_TIMEOUT,
            cancellation,
        }
    }

    fn stopped_early(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn reached(&self, elapsed: f64) -> bool {
        elapsed >= self.target || Instant::now() >= self.deadline || self.stopped_early()
    }
}

impl CameraCapture {
    /// Create a recorder for an FFmpeg input device format (for example
    /// `v4l2`) and device name used for both facings.
    pub fn new(input_format: impl Into<String>, device: impl Into<String>) -> Self {
        let device = device.into();
        Self {
            input_format: input_format.into(),
            front_device: device.clone(),
            rear_device: device,
            options: Vec::new(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            input: None,
        }
    }

    /// Create a recorder from a scanner configuration.
    pub fn from_config(config: &ScannerConfig) -> Self {
        let mut capture = Self::new(config.input_format.clone(), config.rear_device.clone());
        capture.front_device = config.front_device.clone();
        capture
    }

    /// Pass a device option such as `video_size` or `framerate`.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /// Attach a progress callback, invoked once per recorded packet.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Stop the recording early once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn device_options(&self) -> Vec<(String, String)> {
        let mut options = self.options.clone();
        if !options.iter().any(|(key, _)| key == "rw_timeout") {
            options.push((
                "rw_timeout".to_string(),
                CAMERA_STALL_TIMEOUT.as_micros().to_string(),
            ));
        }
        options
    }

    fn device_for(&self, facing: CameraFacing) -> &str {
        match facing {
            CameraFacing::User => &self.front_device,
            CameraFacing::Environment => &self.rear_device,
        }
    }

    fn find_input_format(&self) -> Result<Format, FootScanError> {
        ffmpeg_next::device::input::video()
            .find(|format| format.name() == self.input_format)
            .ok_or_else(|| {
                FootScanError::CaptureError(format!(
                    "capture device format '{}' is not available in this FFmpeg build",
                    self.input_format
                ))
            })
    }
}

impl CaptureDevice for CameraCapture {
    fn acquire(&mut self, session: &RecordingSession) -> Result<(), FootScanError> {
        ffmpeg_next::init()
            .map_err(|error| FootScanError::CaptureError(format!("FFmpeg initialisation failed: {error}")))?;
        ffmpeg_next::device::register_all();

        let format = self.find_input_format()?;
        let device = self.device_for(session.facing).to_string();

        let mut dictionary = Dictionary::new();
        for (key, value) in &self.device_options() {
            dictionary.set(key, value);
        }

        log::debug!("Opening {} device {device}", self.input_format);
        let context = ffmpeg_next::format::open_with(&device, &format, dictionary)
            .map_err(|error| {
                FootScanError::CaptureError(format!("could not open camera {device}: {error}"))
            })?;

        match context {
            FormatContext::Input(input) => {
                self.input = Some(input);
                Ok(())
            }
            FormatContext::Output(_) => Err(FootScanError::CaptureError(format!(
                "{device} is not an input device"
            ))),
        }
    }

    fn record(&mut self, session: &RecordingSession) -> Result<RecordedVideo, FootScanError> {
        let input = self.input.as_mut().ok_or_else(|| {
            FootScanError::CaptureError("camera has not been acquired".to_string())
        })?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| FootScanError::CaptureError("camera produced no video stream".to_string()))?;
        let input_index = stream.index();
        let input_time_base = stream.time_base();
        let parameters = stream.parameters();

        let temp = tempfile::Builder::new()
            .prefix("footscan-")
            .suffix(".mkv")
            .tempfile()?
            .into_temp_path();
        let recording = RecordedVideo::temporary(temp);

        let mut output = ffmpeg_next::format::output(recording.path()).map_err(|error| {
            FootScanError::CaptureError(format!("could not create recording file: {error}"))
        })?;

        let mut out_stream = output.add_stream(ffmpeg_next::encoder::find(Id::None))?;
        out_stream.set_parameters(parameters);
        // Let the muxer choose the codec tag.
        unsafe {
            (*out_stream.parameters().as_mut_ptr()).codec_tag = 0;
        }
        output.write_header()?;
        let output_time_base = output
            .stream(0)
            .map(|stream| stream.time_base())
            .unwrap_or(input_time_base);

        let stop = StopCondition::new(session, self.cancellation.clone());
        let mut tracker = ProgressTracker::new(self.progress.clone(), OperationType::Recording, None);
        let mut first_pts: Option<i64> = None;

        for (stream, mut packet) in input.packets() {
            if stream.index() != input_index {
                continue;
            }

            let pts = packet.pts().or(packet.dts()).unwrap_or(0);
            let first = *first_pts.get_or_insert(pts);
            let elapsed = utilities::pts_to_seconds(pts - first, input_time_base);
            if stop.reached(elapsed) {
                break;
            }

            packet.set_stream(0);
            packet.rescale_ts(input_time_base, output_time_base);
            packet.set_position(-1);
            packet.write_interleaved(&mut output)?;
            tracker.advance(Some(elapsed));
        }

        output.write_trailer()?;

        if first_pts.is_none() {
            return Err(FootScanError::CaptureError(
                "camera delivered no frames".to_string(),
            ));
        }

        if stop.stopped_early() {
            log::info!("Recording from {} camera stopped early", session.facing);
        } else {
            log::info!(
                "Recorded {:.1}s from {} camera",
                session.duration.as_secs_f64(),
                session.facing
            );
        }
        Ok(recording)
    }

    fn release(&mut self) {
        if self.input.take().is_some() {
            log::debug!("Closed {} device", self.input_format);
        }
    }
}
