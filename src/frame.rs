//! Encoded still frames.
//!
//! An [`EncodedFrame`] is the immutable output of one sampling step: the
//! raw JPEG payload of the frame shown at a given timestamp, with no
//! container or data-URL prefix, plus its position in the sampled sequence.

use std::{io::Cursor, path::Path};

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ExtendedColorType, RgbImage, codecs::jpeg::JpegEncoder};

use crate::error::FootScanError;

/// MIME type of every encoded frame.
pub const FRAME_MIME_TYPE: &str = "image/jpeg";

/// A still image captured from a recording.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    index: usize,
    timestamp_micros: u64,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for EncodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedFrame")
            .field("index", &self.index)
            .field("timestamp", &self.timestamp())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl EncodedFrame {
    /// Encode an RGB still as JPEG at `quality` (1–100).
    pub fn encode(
        index: usize,
        timestamp: f64,
        image: &RgbImage,
        quality: u8,
    ) -> Result<Self, FootScanError> {
        let mut cursor = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100));
        encoder.encode(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )?;

        Ok(Self::from_jpeg(
            index,
            timestamp,
            image.width(),
            image.height(),
            cursor.into_inner(),
        ))
    }

    /// Wrap an already-encoded JPEG payload.
    pub fn from_jpeg(index: usize, timestamp: f64, width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            index,
            timestamp_micros: (timestamp.max(0.0) * 1_000_000.0).round() as u64,
            width,
            height,
            bytes,
        }
    }

    /// Position in the sampled sequence, `0` being the earliest.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Timestamp the frame was captured at, in seconds.
    pub fn timestamp(&self) -> f64 {
        self.timestamp_micros as f64 / 1_000_000.0
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The JPEG payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Always [`FRAME_MIME_TYPE`].
    pub fn mime_type(&self) -> &'static str {
        FRAME_MIME_TYPE
    }

    /// The payload as standard base64, without any `data:` prefix.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Write the payload to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FootScanError> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}
