//! Error types for the `footscan` crate.
//!
//! This module defines [`FootScanError`], the unified error type returned by
//! all fallible operations in the crate, and [`ErrorKind`], the coarse
//! classification used to decide how a failure is presented and whether
//! the user can recover from it.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// Message shown when the sampler produced no frames.
pub const NO_FRAMES_MESSAGE: &str =
    "Could not extract frames from the video. Please try recording again.";

/// Message shown when the inference service replied with an empty body.
pub const EMPTY_RESPONSE_MESSAGE: &str = "Received an empty response from the AI model.";

/// Message shown when the inference service replied with text that is not JSON.
pub const MALFORMED_RESPONSE_MESSAGE: &str =
    "Failed to parse the AI's response. The format was invalid.";

/// Message shown for every other inference failure.
pub const INFERENCE_FAILURE_MESSAGE: &str =
    "Could not get a valid measurement from the AI. Please try again with a clearer video.";

/// Message shown when no access credential is configured.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "API Key is not configured.";

/// The unified error type for all `footscan` operations.
///
/// Every public method that can fail returns `Result<T, FootScanError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FootScanError {
    /// The video resource could not be opened or loaded.
    #[error("Failed to load video at {path}: {reason}")]
    FileOpen {
        /// Path of the recording that failed to load.
        path: PathBuf,
        /// Underlying reason the load failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The video reports a zero or negative duration.
    #[error("Video has no duration")]
    NoDuration,

    /// A frame count of zero was requested.
    #[error("Frame count must be at least 1")]
    InvalidFrameCount,

    /// A sample timestamp lies outside the video.
    #[error("Invalid timestamp: {0:.3}s")]
    InvalidTimestamp(f64),

    /// No rendering (pixel conversion) context could be created.
    #[error("Could not create rendering context: {0}")]
    RenderContext(String),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// The inference access credential is absent.
    #[error("API key is missing")]
    MissingCredential,

    /// The camera or recording session failed.
    #[error("Capture failed: {0}")]
    CaptureError(String),

    /// Sampling finished without producing any frame.
    #[error("No frames could be extracted from the video")]
    NoFramesExtracted,

    /// The inference service returned an empty body.
    #[error("Inference returned an empty response")]
    EmptyResponse,

    /// The inference service returned text that is not valid JSON.
    #[error("Inference response is not valid JSON: {0}")]
    MalformedResponse(String),

    /// The inference response is JSON but does not match the size schema.
    #[error("Inference response is not in the expected format: {0}")]
    SchemaViolation(String),

    /// The HTTP request to the inference service failed.
    #[error("Inference request failed: {0}")]
    RequestError(String),

    /// The inference service answered with a non-success status.
    #[error("Inference service error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

/// Coarse classification of a [`FootScanError`].
///
/// Configuration errors are fatal to the session; every other kind is
/// recoverable by recording again or retrying from the welcome screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The access credential is missing.
    Configuration,
    /// Camera, permission, or recording failure.
    Capture,
    /// Loading, seeking, rendering, or encoding frames failed.
    Sampling,
    /// Network, empty, malformed, or schema-violating inference reply.
    Inference,
}

impl FootScanError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FootScanError::MissingCredential => ErrorKind::Configuration,
            FootScanError::CaptureError(_) => ErrorKind::Capture,
            FootScanError::EmptyResponse
            | FootScanError::MalformedResponse(_)
            | FootScanError::SchemaViolation(_)
            | FootScanError::RequestError(_)
            | FootScanError::ApiError { .. } => ErrorKind::Inference,
            _ => ErrorKind::Sampling,
        }
    }

    /// Whether the user can recover without changing configuration.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Configuration
    }

    /// Human-readable text for the error screen.
    ///
    /// Empty and malformed inference replies get their own messages; all
    /// other inference failures share a generic one. Capture and sampling
    /// errors are shown verbatim.
    pub fn user_message(&self) -> String {
        match self {
            FootScanError::NoFramesExtracted => NO_FRAMES_MESSAGE.to_string(),
            FootScanError::EmptyResponse => EMPTY_RESPONSE_MESSAGE.to_string(),
            FootScanError::MalformedResponse(_) => MALFORMED_RESPONSE_MESSAGE.to_string(),
            FootScanError::MissingCredential => MISSING_CREDENTIAL_MESSAGE.to_string(),
            other if other.kind() == ErrorKind::Inference => {
                INFERENCE_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<FfmpegError> for FootScanError {
    fn from(error: FfmpegError) -> Self {
        FootScanError::FfmpegError(error.to_string())
    }
}

impl From<reqwest::Error> for FootScanError {
    fn from(error: reqwest::Error) -> Self {
        FootScanError::RequestError(error.to_string())
    }
}
