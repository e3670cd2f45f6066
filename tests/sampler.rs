//! Frame sampler integration tests.
//!
//! Most tests run against an in-memory video. Tests that decode real media
//! require `tests/fixtures/sample_video.mp4` and are skipped without it.

mod common;

use std::path::Path;
use std::sync::{Arc, Mutex};

use common::{MockVideo, UnloadableVideo};
use footscan::{
    CancellationToken, FootScanError, FrameSampler, OperationType, ProgressCallback,
    ProgressInfo, RecordedVideo, SamplingOptions, VideoResource, extract_frames,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sampler(count: usize) -> FrameSampler {
    FrameSampler::new(SamplingOptions::new().with_frame_count(count))
}

// ── Success path ───────────────────────────────────────────────────

#[test]
fn samples_three_frames_across_five_seconds() {
    let (video, probe) = MockVideo::new(5.0);
    let frames = sampler(3).sample(video).unwrap();

    assert_eq!(frames.len(), 3);
    assert_eq!(probe.rendered(), vec![0.0, 2.5, 5.0]);
    let timestamps: Vec<f64> = frames.iter().map(|frame| frame.timestamp()).collect();
    assert_eq!(timestamps, vec![0.0, 2.5, 5.0]);
    assert_eq!(probe.release_count(), 1);
}

#[test]
fn single_frame_comes_from_the_start() {
    let (video, probe) = MockVideo::new(5.0);
    let frames = sampler(1).sample(video).unwrap();

    assert_eq!(frames.len(), 1);
    assert_eq!(probe.rendered(), vec![0.0]);
    assert_eq!(probe.release_count(), 1);
}

#[test]
fn frames_are_ordered_and_sized_like_the_source() {
    let (video, _probe) = MockVideo::new(3.2);
    let frames = sampler(6).sample(video).unwrap();

    for (position, frame) in frames.iter().enumerate() {
        assert_eq!(frame.index(), position);
        assert_eq!((frame.width(), frame.height()), (64, 48));
        assert_eq!(&frame.bytes()[..2], &[0xFF, 0xD8]);
        assert_eq!(frame.mime_type(), "image/jpeg");
    }
    assert!(frames.windows(2).all(|pair| pair[0].timestamp() <= pair[1].timestamp()));
}

#[test]
fn repeated_sampling_is_identical() {
    let (first_video, first_probe) = MockVideo::new(4.0);
    let (second_video, second_probe) = MockVideo::new(4.0);

    let first = sampler(5).sample(first_video).unwrap();
    let second = sampler(5).sample(second_video).unwrap();

    assert_eq!(first_probe.rendered(), second_probe.rendered());
    assert_eq!(first, second);
}

#[test]
fn extract_frames_uses_requested_count() {
    let (video, probe) = MockVideo::new(2.0);
    let frames = extract_frames(video, 4).unwrap();
    assert_eq!(frames.len(), 4);
    assert_eq!(probe.release_count(), 1);
}

// ── Failure paths ──────────────────────────────────────────────────

#[test]
fn zero_duration_fails_without_rendering() {
    let (video, probe) = MockVideo::new(0.0);
    let result = sampler(3).sample(video);

    match result {
        Err(FootScanError::NoDuration) => {}
        other => panic!("Expected NoDuration, got: {other:?}"),
    }
    assert!(probe.rendered().is_empty());
    assert_eq!(probe.release_count(), 1);
}

#[test]
fn negative_duration_fails() {
    let (video, probe) = MockVideo::new(-2.0);
    let error = sampler(3).sample(video).unwrap_err();
    assert_eq!(error.to_string(), "Video has no duration");
    assert_eq!(probe.release_count(), 1);
}

#[test]
fn zero_count_is_rejected() {
    let (video, probe) = MockVideo::new(5.0);
    assert!(matches!(
        sampler(0).sample(video),
        Err(FootScanError::InvalidFrameCount)
    ));
    assert_eq!(probe.release_count(), 1);
}

#[test]
fn render_failure_aborts_without_partial_results() {
    let (video, probe) = MockVideo::failing_at(5.0, 1);
    let result = sampler(3).sample(video);

    match result {
        Err(FootScanError::VideoDecodeError(message)) => {
            assert!(message.contains("2.5"), "unexpected message: {message}");
        }
        other => panic!("Expected VideoDecodeError, got: {other:?}"),
    }
    assert_eq!(probe.rendered(), vec![0.0]);
    assert_eq!(probe.release_count(), 1);
}

#[test]
fn load_failure_is_propagated() {
    match sampler(3).sample(UnloadableVideo) {
        Err(FootScanError::FileOpen { reason, .. }) => {
            assert!(reason.contains("No such file"));
        }
        other => panic!("Expected FileOpen, got: {other:?}"),
    }
}

// ── Progress & cancellation ────────────────────────────────────────

struct RecordingProgress {
    seen: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.seen.lock().unwrap().push(info.clone());
    }
}

#[test]
fn progress_reports_each_frame() {
    let progress = Arc::new(RecordingProgress {
        seen: Mutex::new(Vec::new()),
    });
    let options = SamplingOptions::new()
        .with_frame_count(3)
        .with_progress(progress.clone());

    let (video, _probe) = MockVideo::new(5.0);
    FrameSampler::new(options).sample(video).unwrap();

    let seen = progress.seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    for (position, info) in seen.iter().enumerate() {
        assert_eq!(info.operation, OperationType::FrameSampling);
        assert_eq!(info.current, position as u64 + 1);
        assert_eq!(info.total, Some(3));
    }
    assert_eq!(seen[2].percentage, Some(100.0));
    assert_eq!(seen[1].current_timestamp, Some(2.5));
}

#[test]
fn cancelled_sampling_returns_error_and_releases() {
    let token = CancellationToken::new();
    token.cancel();
    let options = SamplingOptions::new()
        .with_frame_count(3)
        .with_cancellation(token);

    let (video, probe) = MockVideo::new(5.0);
    match FrameSampler::new(options).sample(video) {
        Err(FootScanError::Cancelled) => {}
        other => panic!("Expected Cancelled, got: {other:?}"),
    }
    assert!(probe.rendered().is_empty());
    assert_eq!(probe.release_count(), 1);
}

#[test]
fn cancelling_from_progress_stops_before_next_seek() {
    struct CancelAfterFirst {
        token: CancellationToken,
    }

    impl ProgressCallback for CancelAfterFirst {
        fn on_progress(&self, _info: &ProgressInfo) {
            self.token.cancel();
        }
    }

    let token = CancellationToken::new();
    let options = SamplingOptions::new()
        .with_frame_count(3)
        .with_cancellation(token.clone())
        .with_progress(Arc::new(CancelAfterFirst { token }));

    let (video, probe) = MockVideo::new(5.0);
    assert!(matches!(
        FrameSampler::new(options).sample(video),
        Err(FootScanError::Cancelled)
    ));
    assert_eq!(probe.rendered(), vec![0.0]);
    assert_eq!(probe.release_count(), 1);
}

// ── Real media ─────────────────────────────────────────────────────

#[test]
fn samples_fixture_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let video = VideoResource::open(path).expect("Failed to open fixture");
    let (width, height) = (video.width(), video.height());
    let duration = video.duration();
    assert!(duration > 0.0);

    let frames = sampler(3).sample(video).expect("Failed to sample fixture");
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].timestamp(), 0.0);
    assert!((frames[2].timestamp() - duration).abs() < 1e-3);
    for frame in &frames {
        let decoded = image::load_from_memory(frame.bytes()).expect("Invalid JPEG");
        assert_eq!((decoded.width(), decoded.height()), (width, height));
    }
}

#[test]
fn fixture_sampling_is_reproducible() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let first = sampler(3).sample(VideoResource::open(path).unwrap()).unwrap();
    let second = sampler(3).sample(VideoResource::open(path).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn samples_imported_recording() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let frames = sampler(2).sample(RecordedVideo::external(path)).unwrap();
    assert_eq!(frames.len(), 2);
    assert!(Path::new(path).exists(), "imported file must be left in place");
}
