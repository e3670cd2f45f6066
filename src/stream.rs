//! Async analysis.
//!
//! [`analyze_async`] runs the whole pipeline (open the recording, sample
//! frames, call the inference backend) on a Tokio blocking thread and
//! returns an [`AnalysisFuture`]. The steps still run one after another;
//! the future only keeps FFmpeg and HTTP work off the async runtime.
//!
//! # Example
//!
//! ```no_run
//! use footscan::{
//!     FileCapture, FrameSampler, GeminiClient, RecordingSession, ScannerConfig, Session,
//!     analyze_async, record_with,
//! };
//!
//! # async fn example() -> Result<(), footscan::FootScanError> {
//! let config = ScannerConfig::from_env();
//! let backend = GeminiClient::from_config(&config)?;
//! let mut session = Session::from_config(&config);
//! session.dispatch(footscan::Action::Start);
//!
//! let video = record_with(&mut FileCapture::new("foot.mp4"), &RecordingSession::default())?;
//! if session.begin_analysis() {
//!     let outcome = analyze_async(video, FrameSampler::default(), backend).await;
//!     session.complete_analysis(outcome);
//! }
//! # Ok(())
//! # }
//! ```

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::task::JoinHandle;

use crate::{
    error::FootScanError,
    estimate::SizeEstimate,
    inference::InferenceBackend,
    sampler::{FrameSampler, IntoFrameSource},
    session::run_analysis,
};

/// A future that resolves to the outcome of one analysis.
///
/// Dropping the future does not stop the blocking thread; use the
/// sampler's [`CancellationToken`](crate::CancellationToken) for that.
pub struct AnalysisFuture {
    handle: JoinHandle<Result<SizeEstimate, FootScanError>>,
}

impl Future for AnalysisFuture {
    type Output = Result<SizeEstimate, FootScanError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| Err(FootScanError::Cancelled)))
    }
}

/// Run sampling and inference for `video` on a blocking thread.
///
/// Must be called from within a Tokio runtime.
pub fn analyze_async<V, B>(video: V, sampler: FrameSampler, backend: B) -> AnalysisFuture
where
    V: IntoFrameSource + Send + 'static,
    B: InferenceBackend + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(move || run_analysis(video, &sampler, &backend));
    AnalysisFuture { handle }
}
