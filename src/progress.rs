//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring sampling and
//! recording progress, [`CancellationToken`] for cooperative cancellation,
//! and [`ProgressInfo`] for progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use footscan::{
//!     FootScanError, FrameSampler, ProgressCallback, ProgressInfo, SamplingOptions,
//!     VideoResource,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.0}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = SamplingOptions::new().with_progress(Arc::new(PrintProgress));
//! let video = VideoResource::open("foot.mp4")?;
//! let frames = FrameSampler::new(options).sample(video)?;
//! # Ok::<(), FootScanError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Seeking and capturing still frames from a recording.
    FrameSampling,
    /// Recording a video from a capture device.
    Recording,
}

/// A snapshot of operation progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many items (frames / packets) have been processed so far.
    pub current: u64,
    /// Total items expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// The timestamp within the video currently being processed, in seconds.
    pub current_timestamp: Option<f64>,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks may be
/// invoked from the blocking thread that drives an async analysis.
///
/// Progress callbacks are **infallible**: they observe but cannot halt
/// the operation. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called after each unit of work.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. This is the default.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to request
/// cancellation. The sampler checks
/// [`is_cancelled`](CancellationToken::is_cancelled) before each seek.
///
/// # Example
///
/// ```
/// use footscan::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones of this token observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one completed item and fire the callback.
    pub(crate) fn advance(&mut self, timestamp: Option<f64>) {
        self.current += 1;

        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0);

        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
            current_timestamp: timestamp,
        };

        self.callback.on_progress(&info);
    }
}
