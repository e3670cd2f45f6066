//! SamplingOptions, ScannerConfig, and progress type tests.

use std::sync::Arc;
use std::time::Duration;

use footscan::{
    CameraFacing, CancellationToken, ProgressCallback, ProgressInfo, RecordingSession,
    SamplingOptions, ScannerConfig,
    configuration::{DEFAULT_ENDPOINT, DEFAULT_FRAME_COUNT, DEFAULT_JPEG_QUALITY, DEFAULT_MODEL},
};

// ── SamplingOptions builder ────────────────────────────────────────

#[test]
fn sampling_defaults() {
    let options = SamplingOptions::new();
    assert_eq!(options.frame_count(), DEFAULT_FRAME_COUNT);
    assert_eq!(options.frame_count(), 3);
    assert_eq!(options.jpeg_quality(), DEFAULT_JPEG_QUALITY);
    assert_eq!(options.jpeg_quality(), 90);

    let debug = format!("{options:?}");
    assert!(debug.contains("SamplingOptions"));
    assert!(debug.contains("has_cancellation: false"));
}

#[test]
fn sampling_builder_chains() {
    struct Silent;
    impl ProgressCallback for Silent {
        fn on_progress(&self, _info: &ProgressInfo) {}
    }

    let options = SamplingOptions::new()
        .with_frame_count(7)
        .with_jpeg_quality(75)
        .with_progress(Arc::new(Silent))
        .with_cancellation(CancellationToken::new());

    assert_eq!(options.frame_count(), 7);
    assert_eq!(options.jpeg_quality(), 75);
    assert!(format!("{options:?}").contains("has_cancellation: true"));
}

#[test]
fn sampling_quality_is_clamped() {
    assert_eq!(SamplingOptions::new().with_jpeg_quality(0).jpeg_quality(), 1);
    assert_eq!(SamplingOptions::new().with_jpeg_quality(255).jpeg_quality(), 100);
}

// ── ScannerConfig ──────────────────────────────────────────────────

#[test]
fn scanner_defaults() {
    let config = ScannerConfig::new();
    assert!(!config.has_credential());
    assert_eq!(config.model, DEFAULT_MODEL);
    assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.recording_duration, Duration::from_secs(5));
    assert_eq!(config.camera_facing, CameraFacing::Environment);
    assert!(!config.input_format.is_empty());
}

#[test]
fn scanner_reads_environment_lookup() {
    let config = ScannerConfig::from_lookup(|key| match key {
        "API_KEY" => Some("from-api-key".to_string()),
        "FOOTSCAN_ENDPOINT" => Some("https://proxy.example/v1beta".to_string()),
        "FOOTSCAN_MODEL" => Some(String::new()),
        _ => None,
    });
    assert_eq!(config.api_key.as_deref(), Some("from-api-key"));
    assert_eq!(config.endpoint, "https://proxy.example/v1beta");
    assert_eq!(config.model, DEFAULT_MODEL);
}

#[test]
fn empty_api_key_counts_as_missing() {
    let config = ScannerConfig::new().with_api_key("");
    assert!(!config.has_credential());
    assert!(ScannerConfig::new().with_api_key("key").has_credential());
}

#[test]
fn scanner_feeds_sampling_and_recording() {
    let config = ScannerConfig::new()
        .with_frame_count(5)
        .with_recording_duration(Duration::from_secs(8))
        .with_camera_facing(CameraFacing::User);

    assert_eq!(config.sampling_options().frame_count(), 5);

    let session = RecordingSession::from_config(&config);
    assert_eq!(session.duration, Duration::from_secs(8));
    assert_eq!(session.facing, CameraFacing::User);
}

#[test]
fn scanner_debug_hides_key() {
    let debug = format!("{:?}", ScannerConfig::new().with_api_key("top-secret"));
    assert!(!debug.contains("top-secret"));
}

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::default();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}
