//! The capture and analysis state machine.
//!
//! [`next_state`] is the pure transition function over [`ScreenState`].
//! [`Session`] wraps it with the data each screen shows (the latest
//! estimate and error message) and the credential guard, and drives the
//! analyze step: sample the recording, call the inference backend, and
//! land in [`ScreenState::Results`] or [`ScreenState::Error`].
//!
//! # Example
//!
//! ```no_run
//! use footscan::{
//!     Action, FileCapture, FrameSampler, GeminiClient, RecordingSession, ScannerConfig,
//!     ScreenState, Session, record_with,
//! };
//!
//! # fn main() -> Result<(), footscan::FootScanError> {
//! let config = ScannerConfig::from_env();
//! let backend = GeminiClient::from_config(&config)?;
//! let mut session = Session::from_config(&config);
//!
//! session.dispatch(Action::Start);
//! let video = record_with(&mut FileCapture::new("foot.mp4"), &RecordingSession::default())?;
//! let state = session.analyze(video, &FrameSampler::default(), &backend);
//! assert!(matches!(state, ScreenState::Results | ScreenState::Error));
//! # Ok(())
//! # }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    configuration::ScannerConfig,
    error::{FootScanError, MISSING_CREDENTIAL_MESSAGE},
    estimate::SizeEstimate,
    frame::EncodedFrame,
    inference::{InferenceBackend, analyze_frames},
    sampler::{FrameSampler, IntoFrameSource},
};

/// The screen currently shown. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenState {
    /// Introduction and start prompt.
    #[default]
    Welcome,
    /// Recording the foot.
    Capture,
    /// Sampling and inference in progress.
    Loading,
    /// Showing a size estimate.
    Results,
    /// Showing an error message.
    Error,
}

impl Display for ScreenState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ScreenState::Welcome => "welcome",
            ScreenState::Capture => "capture",
            ScreenState::Loading => "loading",
            ScreenState::Results => "results",
            ScreenState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Events that drive the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The user starts a scan.
    Start,
    /// The user confirms the recording and requests analysis.
    ConfirmRecording,
    /// Sampling and inference produced an estimate.
    AnalysisSucceeded(SizeEstimate),
    /// Capture, sampling, or inference failed with the given message.
    AnalysisFailed(String),
    /// The user leaves the results screen.
    Reset,
    /// The user leaves the error screen to try again.
    Retry,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::ConfirmRecording => "confirm-recording",
            Action::AnalysisSucceeded(_) => "analysis-succeeded",
            Action::AnalysisFailed(_) => "analysis-failed",
            Action::Reset => "reset",
            Action::Retry => "retry",
        }
    }
}

/// The state that follows `state` when `action` occurs.
///
/// Total over every pair: an action that does not apply to `state` leaves
/// it unchanged. A failure reported while still on the capture screen (a
/// camera or configuration error) moves straight to [`ScreenState::Error`].
pub fn next_state(state: ScreenState, action: &Action) -> ScreenState {
    match (state, action) {
        (ScreenState::Welcome, Action::Start) => ScreenState::Capture,
        (ScreenState::Capture, Action::ConfirmRecording) => ScreenState::Loading,
        (ScreenState::Loading, Action::AnalysisSucceeded(_)) => ScreenState::Results,
        (ScreenState::Loading | ScreenState::Capture, Action::AnalysisFailed(_)) => {
            ScreenState::Error
        }
        (ScreenState::Results, Action::Reset) => ScreenState::Welcome,
        (ScreenState::Error, Action::Retry) => ScreenState::Welcome,
        (unchanged, _) => unchanged,
    }
}

/// What the presentation layer should render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View<'a> {
    /// The inference credential is missing; shown regardless of state.
    ConfigurationRequired,
    /// The welcome screen.
    Welcome,
    /// The capture screen.
    Capture,
    /// The loading indicator.
    Loading,
    /// The results screen with the latest estimate.
    Results(&'a SizeEstimate),
    /// The error screen with the latest message.
    Error(&'a str),
}

/// One user's pass through the screens.
#[derive(Debug, Clone)]
pub struct Session {
    state: ScreenState,
    result: Option<SizeEstimate>,
    error: Option<String>,
    credential_present: bool,
}

impl Session {
    /// A session on the welcome screen.
    pub fn new(credential_present: bool) -> Self {
        Self {
            state: ScreenState::Welcome,
            result: None,
            error: None,
            credential_present,
        }
    }

    /// A session whose credential guard follows `config`.
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(config.has_credential())
    }

    /// The active screen state.
    pub fn state(&self) -> ScreenState {
        self.state
    }

    /// The latest estimate, present only on the results screen.
    pub fn result(&self) -> Option<&SizeEstimate> {
        self.result.as_ref()
    }

    /// The latest error message, present only on the error screen.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the inference credential is configured.
    pub fn credential_present(&self) -> bool {
        self.credential_present
    }

    /// The screen to render. The credential guard is checked first.
    pub fn view(&self) -> View<'_> {
        if !self.credential_present {
            return View::ConfigurationRequired;
        }
        match (self.state, &self.result, &self.error) {
            (ScreenState::Welcome, _, _) => View::Welcome,
            (ScreenState::Capture, _, _) => View::Capture,
            (ScreenState::Loading, _, _) => View::Loading,
            (ScreenState::Results, Some(result), _) => View::Results(result),
            (ScreenState::Error, _, Some(message)) => View::Error(message),
            (ScreenState::Results | ScreenState::Error, _, _) => View::Welcome,
        }
    }

    /// Apply `action` and return the resulting state.
    pub fn dispatch(&mut self, action: Action) -> ScreenState {
        let next = next_state(self.state, &action);
        if next == self.state {
            log::debug!("Ignoring '{}' on the {} screen", action.name(), self.state);
            return self.state;
        }

        log::debug!("{} -> {} on '{}'", self.state, next, action.name());
        match action {
            Action::AnalysisSucceeded(estimate) => {
                self.result = Some(estimate);
                self.error = None;
            }
            Action::AnalysisFailed(message) => {
                self.result = None;
                self.error = Some(message);
            }
            Action::Start | Action::ConfirmRecording | Action::Reset | Action::Retry => {
                self.result = None;
                self.error = None;
            }
        }
        self.state = next;
        self.state
    }

    /// Leave the capture screen for the loading screen.
    ///
    /// Returns `false` without starting anything when the session is not
    /// on the capture screen, or when the credential is missing, in which
    /// case the session moves to the error screen instead.
    pub fn begin_analysis(&mut self) -> bool {
        if self.state != ScreenState::Capture {
            log::debug!("Cannot analyze from the {} screen", self.state);
            return false;
        }
        if !self.credential_present {
            log::warn!("{MISSING_CREDENTIAL_MESSAGE}");
            self.dispatch(Action::AnalysisFailed(MISSING_CREDENTIAL_MESSAGE.to_string()));
            return false;
        }
        self.dispatch(Action::ConfirmRecording) == ScreenState::Loading
    }

    /// Resume from the loading screen with the pipeline's outcome.
    pub fn complete_analysis(&mut self, outcome: Result<SizeEstimate, FootScanError>) -> ScreenState {
        match outcome {
            Ok(estimate) => self.dispatch(Action::AnalysisSucceeded(estimate)),
            Err(error) => {
                log::warn!("Analysis failed: {error}");
                self.dispatch(Action::AnalysisFailed(error.user_message()))
            }
        }
    }

    /// Report a recording failure from the capture screen.
    ///
    /// The error's text is shown as-is.
    pub fn fail_capture(&mut self, error: &FootScanError) -> ScreenState {
        log::warn!("Recording failed: {error}");
        self.dispatch(Action::AnalysisFailed(error.user_message()))
    }

    /// Sample `video`, run inference on the frames, and move to the results
    /// or error screen.
    ///
    /// The video is consumed and released before this returns, including
    /// when the analysis never starts.
    pub fn analyze<V, B>(&mut self, video: V, sampler: &FrameSampler, backend: &B) -> ScreenState
    where
        V: IntoFrameSource,
        B: InferenceBackend + ?Sized,
    {
        if !self.begin_analysis() {
            return self.state;
        }
        let outcome = run_analysis(video, sampler, backend);
        self.complete_analysis(outcome)
    }

    /// Run inference on frames that were already sampled.
    ///
    /// An empty frame list fails without calling `backend`.
    pub fn analyze_frames<B>(&mut self, frames: &[EncodedFrame], backend: &B) -> ScreenState
    where
        B: InferenceBackend + ?Sized,
    {
        if !self.begin_analysis() {
            return self.state;
        }
        let outcome = analyze_frames(backend, frames);
        self.complete_analysis(outcome)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Sample `video` with `sampler` and ask `backend` for an estimate.
///
/// # Errors
///
/// Any sampling error, [`FootScanError::NoFramesExtracted`], or any
/// inference error.
pub fn run_analysis<V, B>(
    video: V,
    sampler: &FrameSampler,
    backend: &B,
) -> Result<SizeEstimate, FootScanError>
where
    V: IntoFrameSource,
    B: InferenceBackend + ?Sized,
{
    let frames = sampler.sample(video)?;
    analyze_frames(backend, &frames)
}
