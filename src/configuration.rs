//! Sampling and scanner configuration.
//!
//! [`SamplingOptions`] is a builder that threads the frame count, JPEG
//! quality, progress callbacks, and cancellation tokens through the
//! [`FrameSampler`](crate::FrameSampler). [`ScannerConfig`] gathers the
//! settings of a whole scanning session: the inference credential and
//! model, and the recording parameters handed to the capture device.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use footscan::{CancellationToken, ProgressCallback, ProgressInfo, SamplingOptions};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} done", info.operation, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = SamplingOptions::new()
//!     .with_frame_count(5)
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::capture::CameraFacing;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Number of frames the scanning flow samples from each recording.
pub const DEFAULT_FRAME_COUNT: usize = 3;

/// JPEG quality used for encoded frames.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Length of a recording session.
pub const DEFAULT_RECORDING_DURATION: Duration = Duration::from_secs(5);

/// Model used by the hosted inference service.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Base URL of the hosted inference service.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for frame sampling.
///
/// All fields have sensible defaults: three frames at JPEG quality 90, no
/// progress callback, and no cancellation.
#[derive(Clone)]
#[must_use]
pub struct SamplingOptions {
    pub(crate) frame_count: usize,
    pub(crate) jpeg_quality: u8,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for SamplingOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SamplingOptions")
            .field("frame_count", &self.frame_count)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish()
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplingOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Set how many frames to sample.
    ///
    /// Zero is accepted here and rejected by the sampler with
    /// [`FootScanError::InvalidFrameCount`](crate::FootScanError::InvalidFrameCount).
    pub fn with_frame_count(mut self, count: usize) -> Self {
        self.frame_count = count;
        self
    }

    /// Set the JPEG quality, clamped to `1..=100`.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Attach a progress callback, invoked once per captured frame.
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, sampling stops before the next seek
    /// and returns [`FootScanError::Cancelled`](crate::FootScanError::Cancelled).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The number of frames to sample.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// The JPEG quality used when encoding.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// Settings for a scanning session.
///
/// The credential is optional: a session without one shows the
/// configuration prompt instead of any screen.
#[derive(Clone)]
#[must_use]
pub struct ScannerConfig {
    /// Access credential for the inference service.
    pub api_key: Option<String>,
    /// Inference model name.
    pub model: String,
    /// Inference service base URL.
    pub endpoint: String,
    /// Frames sampled per recording.
    pub frame_count: usize,
    /// Length of each recording.
    pub recording_duration: Duration,
    /// Preferred camera.
    pub camera_facing: CameraFacing,
    /// Capture device used for [`CameraFacing::User`].
    pub front_device: String,
    /// Capture device used for [`CameraFacing::Environment`].
    pub rear_device: String,
    /// FFmpeg input device format (`v4l2`, `avfoundation`, `dshow`).
    pub input_format: String,
}

impl Debug for ScannerConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScannerConfig")
            .field("has_api_key", &self.api_key.is_some())
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("frame_count", &self.frame_count)
            .field("recording_duration", &self.recording_duration)
            .field("camera_facing", &self.camera_facing)
            .field("front_device", &self.front_device)
            .field("rear_device", &self.rear_device)
            .field("input_format", &self.input_format)
            .finish()
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerConfig {
    /// Create a configuration with defaults and no credential.
    pub fn new() -> Self {
        let (input_format, device) = platform_capture_defaults();
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            frame_count: DEFAULT_FRAME_COUNT,
            recording_duration: DEFAULT_RECORDING_DURATION,
            camera_facing: CameraFacing::Environment,
            front_device: device.to_string(),
            rear_device: device.to_string(),
            input_format: input_format.to_string(),
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// The credential is read from `GEMINI_API_KEY`, falling back to
    /// `API_KEY`. `FOOTSCAN_MODEL` and `FOOTSCAN_ENDPOINT` override the
    /// model and endpoint. Empty values are treated as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::new();
        config.api_key = read("GEMINI_API_KEY").or_else(|| read("API_KEY"));
        if let Some(model) = read("FOOTSCAN_MODEL") {
            config.model = model;
        }
        if let Some(endpoint) = read("FOOTSCAN_ENDPOINT") {
            config.endpoint = endpoint;
        }
        config
    }

    /// Set the access credential. An empty string clears it.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    /// Set the inference model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the inference endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the number of frames sampled per recording.
    pub fn with_frame_count(mut self, count: usize) -> Self {
        self.frame_count = count;
        self
    }

    /// Set the recording length.
    pub fn with_recording_duration(mut self, duration: Duration) -> Self {
        self.recording_duration = duration;
        self
    }

    /// Set the preferred camera.
    pub fn with_camera_facing(mut self, facing: CameraFacing) -> Self {
        self.camera_facing = facing;
        self
    }

    /// Whether an access credential is present.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sampling options matching this configuration.
    pub fn sampling_options(&self) -> SamplingOptions {
        SamplingOptions::new().with_frame_count(self.frame_count)
    }
}

fn platform_capture_defaults() -> (&'static str, &'static str) {
    if cfg!(target_os = "macos") {
        ("avfoundation", "0")
    } else if cfg!(target_os = "windows") {
        ("dshow", "video=Integrated Camera")
    } else {
        ("v4l2", "/dev/video0")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn gemini_key_takes_precedence() {
        let config = ScannerConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "primary"),
            ("API_KEY", "fallback"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn falls_back_to_api_key() {
        let config = ScannerConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "  "),
            ("API_KEY", "fallback"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn missing_key_leaves_credential_absent() {
        let config = ScannerConfig::from_lookup(lookup_from(&[("FOOTSCAN_MODEL", "other")]));
        assert!(!config.has_credential());
        assert_eq!(config.model, "other");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn debug_hides_credential() {
        let config = ScannerConfig::new().with_api_key("secret-value");
        let debug = format!("{config:?}");
        assert!(debug.contains("has_api_key: true"));
        assert!(!debug.contains("secret-value"));
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        assert_eq!(SamplingOptions::new().with_jpeg_quality(0).jpeg_quality(), 1);
        assert_eq!(
            SamplingOptions::new().with_jpeg_quality(200).jpeg_quality(),
            100
        );
    }
}
