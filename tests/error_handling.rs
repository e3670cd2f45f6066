//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for various
//! failure conditions, and that each maps to the right screen message.

use std::path::Path;

use footscan::{
    ErrorKind, FootScanError, FrameSampler, SamplingOptions, VideoResource,
    error::{INFERENCE_FAILURE_MESSAGE, MALFORMED_RESPONSE_MESSAGE, NO_FRAMES_MESSAGE},
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn open_nonexistent_file() {
    let result = VideoResource::open("this_file_does_not_exist.mp4");
    let error = result.unwrap_err();
    assert!(matches!(error, FootScanError::FileOpen { .. }));

    let error_message = error.to_string();
    assert!(
        error_message.contains("Failed to load video"),
        "Error message should mention load failure: {error_message}",
    );
    assert!(error_message.contains("this_file_does_not_exist.mp4"));
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let result = VideoResource::open(&invalid_file_path);
    assert!(result.is_err(), "Expected error for invalid media file");
}

#[test]
fn timestamp_beyond_duration() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut video = VideoResource::open(path).expect("Failed to open test video");
    let result = video.render_at(3600.0);
    let error_message = result.unwrap_err().to_string();
    assert!(
        error_message.contains("Invalid timestamp"),
        "Error should mention invalid timestamp: {error_message}",
    );
}

#[test]
fn negative_timestamp() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut video = VideoResource::open(path).expect("Failed to open test video");
    assert!(matches!(
        video.render_at(-0.5),
        Err(FootScanError::InvalidTimestamp(_))
    ));
}

#[test]
fn renders_first_and_last_frame() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut video = VideoResource::open(path).expect("Failed to open test video");
    let duration = video.duration();
    let first = video.render_at(0.0).expect("Failed to render first frame");
    let last = video.render_at(duration).expect("Failed to render last frame");
    assert_eq!(first.dimensions(), (video.width(), video.height()));
    assert_eq!(last.dimensions(), (video.width(), video.height()));
}

#[test]
fn no_video_stream_error() {
    let path = "tests/fixtures/sample_audio_only.mp4";
    if !Path::new(path).exists() {
        return;
    }

    assert!(matches!(
        VideoResource::open(path),
        Err(FootScanError::NoVideoStream)
    ));
}

#[test]
fn zero_frame_request_on_real_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let video = VideoResource::open(path).unwrap();
    let sampler = FrameSampler::new(SamplingOptions::new().with_frame_count(0));
    assert!(matches!(
        sampler.sample(video),
        Err(FootScanError::InvalidFrameCount)
    ));
}

// ── Classification ─────────────────────────────────────────────────

#[test]
fn only_configuration_errors_are_fatal() {
    assert_eq!(FootScanError::MissingCredential.kind(), ErrorKind::Configuration);
    assert!(!FootScanError::MissingCredential.is_recoverable());

    for error in [
        FootScanError::CaptureError("denied".to_string()),
        FootScanError::NoDuration,
        FootScanError::NoFramesExtracted,
        FootScanError::EmptyResponse,
        FootScanError::SchemaViolation("missing field".to_string()),
    ] {
        assert!(error.is_recoverable(), "{error} should be recoverable");
    }
}

#[test]
fn user_messages_distinguish_inference_failures() {
    assert_eq!(FootScanError::NoFramesExtracted.user_message(), NO_FRAMES_MESSAGE);
    assert_eq!(
        FootScanError::MalformedResponse("expected value".to_string()).user_message(),
        MALFORMED_RESPONSE_MESSAGE
    );
    assert_eq!(
        FootScanError::ApiError {
            status: 500,
            body: String::new()
        }
        .user_message(),
        INFERENCE_FAILURE_MESSAGE
    );
    assert_ne!(MALFORMED_RESPONSE_MESSAGE, INFERENCE_FAILURE_MESSAGE);
}

#[test]
fn io_errors_convert() {
    let error: FootScanError =
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into();
    assert_eq!(error.kind(), ErrorKind::Sampling);
    assert!(error.to_string().contains("read-only"));
}
