//! In-memory stand-ins for the video source and the inference service.

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use footscan::{
    FootScanError, FrameSource, InferenceBackend, InferenceRequest, IntoFrameSource, SizeEstimate,
};
use image::{Rgb, RgbImage};

pub const WELL_FORMED_REPLY: &str = r#"{"length_mm": 265.0, "length_in": 10.43, "size_us_men": "9", "size_us_women": "10.5", "size_eu": "42.5", "size_uk": "8.5"}"#;

pub fn expected_estimate() -> SizeEstimate {
    SizeEstimate {
        length_mm: 265.0,
        length_in: 10.43,
        size_us_men: "9".to_string(),
        size_us_women: "10.5".to_string(),
        size_eu: "42.5".to_string(),
        size_uk: "8.5".to_string(),
    }
}

// ── Video source ───────────────────────────────────────────────────

/// Shared observations of a [`MockVideo`].
#[derive(Debug, Default, Clone)]
pub struct VideoProbe {
    pub releases: Arc<AtomicUsize>,
    pub renders: Arc<Mutex<Vec<f64>>>,
}

impl VideoProbe {
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn rendered(&self) -> Vec<f64> {
        self.renders.lock().unwrap().clone()
    }
}

/// A synthetic video whose frames are flat colours derived from the
/// timestamp. Dropping it counts as releasing it.
#[derive(Debug)]
pub struct MockVideo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Render call (zero-based) that fails.
    pub fail_at: Option<usize>,
    pub probe: VideoProbe,
}

impl MockVideo {
    pub fn new(duration: f64) -> (Self, VideoProbe) {
        let probe = VideoProbe::default();
        let video = Self {
            duration,
            width: 64,
            height: 48,
            fail_at: None,
            probe: probe.clone(),
        };
        (video, probe)
    }

    pub fn failing_at(duration: f64, call: usize) -> (Self, VideoProbe) {
        let (mut video, probe) = Self::new(duration);
        video.fail_at = Some(call);
        (video, probe)
    }
}

impl FrameSource for MockVideo {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn render_at(&mut self, seconds: f64) -> Result<RgbImage, FootScanError> {
        let mut renders = self.probe.renders.lock().unwrap();
        if self.fail_at == Some(renders.len()) {
            return Err(FootScanError::VideoDecodeError(format!(
                "synthetic failure at {seconds}s"
            )));
        }
        renders.push(seconds);
        let shade = (seconds * 40.0) as u8;
        Ok(RgbImage::from_pixel(self.width, self.height, Rgb([shade, 128, 255 - shade])))
    }
}

impl IntoFrameSource for MockVideo {
    type Source = Self;

    fn into_frame_source(self) -> Result<Self::Source, FootScanError> {
        Ok(self)
    }
}

impl Drop for MockVideo {
    fn drop(&mut self) {
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// A recording that cannot be loaded.
pub struct UnloadableVideo;

impl IntoFrameSource for UnloadableVideo {
    type Source = MockVideo;

    fn into_frame_source(self) -> Result<Self::Source, FootScanError> {
        Err(FootScanError::FileOpen {
            path: "missing.mp4".into(),
            reason: "No such file or directory".to_string(),
        })
    }
}

// ── Inference backend ──────────────────────────────────────────────

/// What a [`MockBackend`] answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Status(u16),
    NetworkDown,
}

/// Details of one request a [`MockBackend`] received.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub image_count: usize,
    pub indices: Vec<usize>,
    pub instructions: String,
    pub prompt: String,
    pub required_fields: usize,
}

#[derive(Debug, Clone)]
pub struct MockBackend {
    reply: Reply,
    pub calls: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockBackend {
    pub fn replying(text: &str) -> Self {
        Self::new(Reply::Text(text.to_string()))
    }

    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceBackend for MockBackend {
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<String, FootScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(SeenRequest {
            image_count: request.images.len(),
            indices: request.images.iter().map(|frame| frame.index()).collect(),
            instructions: request.instructions.to_string(),
            prompt: request.prompt.to_string(),
            required_fields: request.schema["required"]
                .as_array()
                .map_or(0, |fields| fields.len()),
        });

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Status(status) => Err(FootScanError::ApiError {
                status: *status,
                body: "{\"error\": \"unavailable\"}".to_string(),
            }),
            Reply::NetworkDown => Err(FootScanError::RequestError(
                "connection refused".to_string(),
            )),
        }
    }
}
