//! # footscan
//!
//! Estimate foot length and shoe sizes from a short video of a bare foot
//! placed next to a credit card.
//!
//! `footscan` records (or imports) a few seconds of video, samples a
//! handful of evenly spaced stills from it, and asks a multimodal inference
//! service for the foot length and the matching US, EU, and UK shoe sizes.
//! Video access is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate. No
//! measurement happens locally: the card is only a scale reference for the
//! service.
//!
//! ## Quick Start
//!
//! ### Sample Frames
//!
//! ```no_run
//! use footscan::{VideoResource, extract_frames};
//!
//! let video = VideoResource::open("foot.mp4").unwrap();
//! let frames = extract_frames(video, 3).unwrap();
//! for frame in &frames {
//!     frame.save(format!("frame_{:02}.jpg", frame.index())).unwrap();
//! }
//! ```
//!
//! ### Estimate a Size
//!
//! ```no_run
//! use footscan::{GeminiClient, ScannerConfig, VideoResource, analyze_frames, extract_frames};
//!
//! let config = ScannerConfig::from_env();
//! let client = GeminiClient::from_config(&config).unwrap();
//! let frames = extract_frames(VideoResource::open("foot.mp4").unwrap(), 3).unwrap();
//! let estimate = analyze_frames(&client, &frames).unwrap();
//! println!("{estimate}");
//! ```
//!
//! ### Drive the Screens
//!
//! ```no_run
//! use footscan::{Action, FrameSampler, GeminiClient, ScannerConfig, Session, VideoResource, View};
//!
//! let config = ScannerConfig::from_env();
//! let client = GeminiClient::from_config(&config).unwrap();
//! let mut session = Session::from_config(&config);
//!
//! session.dispatch(Action::Start);
//! session.analyze(VideoResource::open("foot.mp4").unwrap(), &FrameSampler::default(), &client);
//! match session.view() {
//!     View::Results(estimate) => println!("{estimate}"),
//!     View::Error(message) => eprintln!("{message}"),
//!     other => println!("{other:?}"),
//! }
//! ```
//!
//! ## Features
//!
//! - **Deterministic sampling**: first frame at the start, last at the end,
//!   the rest evenly spaced
//! - **Settled seeks**: seeks land on a keyframe and decode forward to the
//!   requested time
//! - **Scoped capture**: camera devices are released before the recording
//!   is handed on, and temporary recordings are deleted once sampled
//! - **Strict result validation**: empty, malformed, and off-schema replies
//!   are told apart
//! - **Explicit state machine**: a total transition function over five
//!   screens with a credential guard
//! - **Progress & cancellation**: callbacks and `CancellationToken` for
//!   sampling and recording
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `analyze_async` runs the pipeline on a Tokio blocking thread |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system, built
//! with `libavdevice` for camera capture.

pub mod capture;
pub mod configuration;
pub mod error;
pub mod estimate;
pub mod ffmpeg;
pub mod frame;
pub mod inference;
pub mod progress;
pub mod sampler;
pub mod session;
#[cfg(feature = "async")]
pub mod stream;
mod utilities;
pub mod video;

pub use capture::{
    CameraCapture, CameraFacing, CaptureDevice, DeviceGuard, FileCapture, RecordedVideo,
    RecordingSession, record_with,
};
pub use configuration::{SamplingOptions, ScannerConfig};
pub use error::{ErrorKind, FootScanError};
pub use estimate::{SizeEstimate, parse_estimate};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame::EncodedFrame;
pub use inference::{GeminiClient, InferenceBackend, InferenceRequest, analyze_frames};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{FrameSampler, FrameSource, IntoFrameSource, extract_frames, sample_timestamps};
pub use session::{Action, ScreenState, Session, View, next_state, run_analysis};
#[cfg(feature = "async")]
pub use stream::{AnalysisFuture, analyze_async};
pub use video::VideoResource;
