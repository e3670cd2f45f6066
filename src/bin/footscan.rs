use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError},
    },
    thread,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use footscan::{
    Action, CameraCapture, CameraFacing, CancellationToken, FfmpegLogLevel, FileCapture,
    FootScanError, FrameSampler, GeminiClient, ProgressCallback, ProgressInfo, RecordedVideo,
    RecordingSession, SamplingOptions, ScannerConfig, Session, SizeEstimate, VideoResource, View,
    record_with,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  footscan scan\n  footscan scan --input foot.mp4 --no-prompt\n  footscan analyze foot.mp4 --json\n  footscan sample foot.mp4 --out frames --count 5 --progress\n  footscan probe foot.mp4\n  footscan completions zsh > _footscan";

const CONFIGURATION_HELP: &str = "Set GEMINI_API_KEY (or API_KEY) in the environment or a .env file, or pass --api-key.";

#[derive(Debug, Parser)]
#[command(
    name = "footscan",
    version,
    about = "Estimate foot length and shoe sizes from a video of a foot next to a credit card",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Print results as machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Show a progress bar while recording and sampling.
    #[arg(long, global = true)]
    progress: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Inference service credential.
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Inference model name.
    #[arg(long, global = true, env = "FOOTSCAN_MODEL")]
    model: Option<String>,

    /// Inference service base URL.
    #[arg(long, global = true, env = "FOOTSCAN_ENDPOINT")]
    endpoint: Option<String>,

    /// Frames sampled from each recording.
    #[arg(long, global = true)]
    frames: Option<usize>,

    /// JPEG quality of sampled frames (1-100).
    #[arg(long, global = true)]
    quality: Option<u8>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Record a foot and estimate its size, screen by screen.
    #[command(
        about = "Record and analyze a foot",
        after_help = "Examples:\n  footscan scan --facing front --seconds 5\n  footscan scan --input foot.mp4 --no-prompt --json"
    )]
    Scan {
        /// Use an existing recording instead of the camera.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Camera to record from (front, rear).
        #[arg(long, default_value = "rear")]
        facing: String,
        /// Recording length in seconds.
        #[arg(long, default_value_t = 5.0)]
        seconds: f64,
        /// Capture device name, overriding the platform default.
        #[arg(long)]
        device: Option<String>,
        /// FFmpeg capture format, overriding the platform default.
        #[arg(long)]
        input_format: Option<String>,
        /// Copy the camera recording to this path before analysis.
        #[arg(long)]
        keep_recording: Option<PathBuf>,
        /// Run straight through without waiting for Enter.
        #[arg(long)]
        no_prompt: bool,
    },

    /// Estimate sizes from an existing recording.
    #[command(
        about = "Analyze a recorded video",
        after_help = "Examples:\n  footscan analyze foot.mp4\n  footscan analyze foot.mp4 --frames 5 --json"
    )]
    Analyze {
        /// Input video path.
        input: PathBuf,
    },

    /// Write the sampled frames to a directory.
    #[command(
        about = "Export sampled frames",
        after_help = "Examples:\n  footscan sample foot.mp4 --out frames\n  footscan sample foot.mp4 --out frames --count 5"
    )]
    Sample {
        /// Input video path.
        input: PathBuf,
        /// Output directory for the JPEG frames.
        #[arg(long)]
        out: PathBuf,
        /// Number of frames to sample.
        #[arg(long)]
        count: Option<usize>,
    },

    /// Print duration and dimensions of a video.
    #[command(about = "Print video information")]
    Probe {
        /// Input video path.
        input: PathBuf,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn log_filter(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn init_logger(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(log_filter(verbose))
        .format_timestamp_millis()
        .parse_default_env()
        .try_init()
        .ok();
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(message: &'static str) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        bar.set_message(message);
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        match info.total {
            Some(total) => {
                self.bar.set_length(total);
                self.bar.set_position(info.current);
                if info.current >= total {
                    self.bar.finish_with_message("done");
                }
            }
            None => {
                if let Some(seconds) = info.current_timestamp {
                    self.bar.set_message(format!("{seconds:.1}s recorded"));
                }
                self.bar.tick();
            }
        }
    }
}

fn parse_log_level(value: &str) -> Result<FfmpegLogLevel, Box<dyn std::error::Error>> {
    Ok(value.parse::<FfmpegLogLevel>()?)
}

fn scanner_config(global: &GlobalOptions) -> ScannerConfig {
    let mut config = ScannerConfig::from_env();
    if let Some(key) = &global.api_key {
        config = config.with_api_key(key.clone());
    }
    if let Some(model) = &global.model {
        config = config.with_model(model.clone());
    }
    if let Some(endpoint) = &global.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    if let Some(frames) = global.frames {
        config = config.with_frame_count(frames);
    }
    config
}

fn sampler_for(
    global: &GlobalOptions,
    config: &ScannerConfig,
    count: Option<usize>,
) -> Result<FrameSampler, Box<dyn std::error::Error>> {
    let mut options: SamplingOptions = config.sampling_options();
    if let Some(count) = count {
        options = options.with_frame_count(count);
    }
    if let Some(quality) = global.quality {
        options = options.with_jpeg_quality(quality);
    }
    if global.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new("sampling")?));
    }
    Ok(FrameSampler::new(options))
}

fn ffmpeg_log_level(global: &GlobalOptions) -> Result<FfmpegLogLevel, Box<dyn std::error::Error>> {
    match &global.log_level {
        Some(level) => parse_log_level(level),
        None => Ok(FfmpegLogLevel::Error),
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logger(global.verbose);
    footscan::set_ffmpeg_log_level(ffmpeg_log_level(global)?);
    Ok(())
}

/// Lines typed on stdin, read on a background thread so that a running
/// recording can be stopped with Enter.
struct Terminal {
    lines: Mutex<Receiver<String>>,
}

impl Terminal {
    fn spawn() -> Self {
        let (sender, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if sender.send(line).is_err() {
                    break;
                }
            }
        });
        Self {
            lines: Mutex::new(lines),
        }
    }

    fn ask(&self, prompt: &str) -> io::Result<String> {
        print!("{} ", prompt.bold());
        io::stdout().flush()?;
        let lines = self
            .lines
            .lock()
            .map_err(|_| io::Error::other("terminal reader poisoned"))?;
        lines
            .recv()
            .map(|line| line.trim().to_string())
            .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))
    }

    fn wait_for_enter(&self, prompt: &str) -> io::Result<()> {
        self.ask(prompt).map(drop)
    }

    fn confirm(&self, prompt: &str) -> io::Result<bool> {
        let answer = self.ask(prompt)?.to_ascii_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    /// Cancel `token` on the next Enter, or return once `done` is set.
    fn stop_on_enter(&self, token: &CancellationToken, done: &AtomicBool) {
        let Ok(lines) = self.lines.lock() else {
            return;
        };
        while !done.load(Ordering::Acquire) {
            match lines.recv_timeout(Duration::from_millis(100)) {
                Ok(_) => {
                    token.cancel();
                    return;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

/// What to do with a finished recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Review {
    Analyze,
    Retake,
}

fn parse_review(answer: &str) -> Option<Review> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" | "a" | "analyze" => Some(Review::Analyze),
        "r" | "retake" => Some(Review::Retake),
        _ => None,
    }
}

fn review(terminal: &Terminal) -> io::Result<Review> {
    loop {
        let answer = terminal.ask("Recording finished. [a]nalyze or [r]etake?")?;
        match parse_review(&answer) {
            Some(choice) => return Ok(choice),
            None => println!("Please answer 'a' or 'r'."),
        }
    }
}

fn print_estimate(estimate: &SizeEstimate, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(estimate)?);
    } else {
        println!("{}", "Your estimated sizes".green().bold());
        println!("{estimate}");
        println!("{}", "All measurements are estimates.".dimmed());
    }
    Ok(())
}

fn print_error(message: &str, as_json: bool) {
    if as_json {
        println!("{}", json!({ "error": message }));
    } else {
        eprintln!("{} {}", "error:".red().bold(), message.red());
    }
}

/// Print the current screen. Returns `false` when the session cannot go on.
fn render(session: &Session, as_json: bool) -> Result<bool, Box<dyn std::error::Error>> {
    match session.view() {
        View::ConfigurationRequired => {
            print_error(footscan::error::MISSING_CREDENTIAL_MESSAGE, as_json);
            if !as_json {
                eprintln!("{CONFIGURATION_HELP}");
            }
            Ok(false)
        }
        View::Welcome => {
            if !as_json {
                println!("{}", "AI Foot Scanner".cyan().bold());
                println!(
                    "Place your bare foot flat on the floor with a credit card next to it, then record a short video moving slowly around the foot."
                );
            }
            Ok(true)
        }
        View::Capture => {
            if !as_json {
                println!("{}", "Capture".cyan().bold());
            }
            Ok(true)
        }
        View::Loading => {
            if !as_json {
                println!("{}", "Analyzing...".cyan());
            }
            Ok(true)
        }
        View::Results(estimate) => {
            print_estimate(estimate, as_json)?;
            Ok(true)
        }
        View::Error(message) => {
            print_error(message, as_json);
            Ok(true)
        }
    }
}

struct ScanOptions {
    input: Option<PathBuf>,
    facing: CameraFacing,
    seconds: f64,
    device: Option<String>,
    input_format: Option<String>,
    keep_recording: Option<PathBuf>,
    no_prompt: bool,
}

fn record(
    options: &ScanOptions,
    config: &ScannerConfig,
    progress: bool,
    stop: CancellationToken,
) -> Result<RecordedVideo, FootScanError> {
    let session = RecordingSession {
        duration: Duration::from_secs_f64(options.seconds),
        facing: options.facing,
    };

    match &options.input {
        Some(path) => record_with(&mut FileCapture::new(path), &session),
        None => {
            let mut config = config.clone();
            if let Some(device) = &options.device {
                config.front_device = device.clone();
                config.rear_device = device.clone();
            }
            if let Some(format) = &options.input_format {
                config.input_format = format.clone();
            }
            let mut camera = CameraCapture::from_config(&config).with_cancellation(stop);
            if progress {
                if let Ok(bar) = TerminalProgress::new("recording") {
                    camera = camera.with_progress(Arc::new(bar));
                }
            }
            println!(
                "{}",
                format!("Recording {:.0}s from the {} camera...", options.seconds, options.facing)
                    .yellow()
            );
            record_with(&mut camera, &session)
        }
    }
}

/// Record once. With a terminal attached, Enter ends a camera recording early.
fn record_once(
    options: &ScanOptions,
    config: &ScannerConfig,
    progress: bool,
    terminal: Option<&Terminal>,
) -> Result<RecordedVideo, FootScanError> {
    let stop = CancellationToken::new();
    let Some(terminal) = terminal.filter(|_| options.input.is_none()) else {
        return record(options, config, progress, stop);
    };

    println!("{}", "Press Enter to stop recording early.".dimmed());
    let done = AtomicBool::new(false);
    thread::scope(|scope| {
        scope.spawn(|| terminal.stop_on_enter(&stop, &done));
        let recording = record(options, config, progress, stop.clone());
        done.store(true, Ordering::Release);
        recording
    })
}

/// Record until the user accepts a take. Retaken recordings are dropped,
/// which deletes their files; the session stays on the capture screen.
fn capture(
    options: &ScanOptions,
    config: &ScannerConfig,
    progress: bool,
    terminal: Option<&Terminal>,
) -> Result<Result<RecordedVideo, FootScanError>, io::Error> {
    loop {
        if let Some(terminal) = terminal.filter(|_| options.input.is_none()) {
            terminal.wait_for_enter("Position the camera and press Enter to record.")?;
        }

        let video = match record_once(options, config, progress, terminal) {
            Ok(video) => video,
            Err(error) => return Ok(Err(error)),
        };
        match terminal {
            Some(terminal) if options.input.is_none() => match review(terminal)? {
                Review::Analyze => return Ok(Ok(video)),
                Review::Retake => {
                    drop(video);
                    println!("{}", "Retaking.".yellow());
                }
            },
            _ => return Ok(Ok(video)),
        }
    }
}

/// Hand a capture result to the session.
///
/// Returns the recording, persisted to `keep` when given, or routes the
/// failure to the error screen and returns `None`.
fn finish_capture(
    session: &mut Session,
    recording: Result<RecordedVideo, FootScanError>,
    keep: Option<&Path>,
) -> Option<RecordedVideo> {
    let prepared = recording.and_then(|video| match keep {
        Some(destination) if video.is_temporary() => {
            let path = video.persist(destination)?;
            println!("Recording saved to {}", path.display());
            Ok(RecordedVideo::external(path))
        }
        _ => Ok(video),
    });

    match prepared {
        Ok(video) => Some(video),
        Err(error) => {
            session.fail_capture(&error);
            None
        }
    }
}

fn run_scan(
    global: &GlobalOptions,
    config: &ScannerConfig,
    options: ScanOptions,
) -> Result<bool, Box<dyn std::error::Error>> {
    if !options.seconds.is_finite() || options.seconds <= 0.0 {
        return Err("--seconds must be greater than 0".into());
    }

    let mut session = Session::from_config(config);
    if !session.credential_present() {
        render(&session, global.json)?;
        return Ok(false);
    }
    let sampler = sampler_for(global, config, None)?;
    let backend = GeminiClient::from_config(config)?;
    let terminal = (!options.no_prompt).then(Terminal::spawn);

    loop {
        if !render(&session, global.json)? {
            return Ok(false);
        }
        if let Some(terminal) = &terminal {
            terminal.wait_for_enter("Press Enter to start scanning.")?;
        }
        session.dispatch(Action::Start);
        render(&session, global.json)?;

        let recording = capture(&options, config, global.progress, terminal.as_ref())?;
        if let Some(video) =
            finish_capture(&mut session, recording, options.keep_recording.as_deref())
        {
            if session.begin_analysis() {
                render(&session, global.json)?;
                let outcome = footscan::run_analysis(video, &sampler, &backend);
                session.complete_analysis(outcome);
            }
        }

        if !render(&session, global.json)? {
            return Ok(false);
        }
        let succeeded = session.result().is_some();

        let again = match &terminal {
            Some(terminal) => terminal.confirm("Scan again? [y/N]")?,
            None => false,
        };
        if !again {
            return Ok(succeeded);
        }
        if succeeded {
            session.dispatch(Action::Reset);
        } else {
            session.dispatch(Action::Retry);
        }
    }
}

fn run_analyze(
    global: &GlobalOptions,
    config: &ScannerConfig,
    input: &Path,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut session = Session::from_config(config);
    if !session.credential_present() {
        render(&session, global.json)?;
        return Ok(false);
    }
    let backend = GeminiClient::from_config(config)?;
    let sampler = sampler_for(global, config, None)?;

    session.dispatch(Action::Start);
    let recording = record_with(&mut FileCapture::new(input), &RecordingSession::default());
    if let Some(video) = finish_capture(&mut session, recording, None) {
        session.analyze(video, &sampler, &backend);
    }
    render(&session, global.json)?;
    Ok(session.result().is_some())
}

fn run_sample(
    global: &GlobalOptions,
    config: &ScannerConfig,
    input: &Path,
    out: &Path,
    count: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let sampler = sampler_for(global, config, count)?;
    let video = VideoResource::open(input)?;
    let frames = sampler.sample(video)?;

    fs::create_dir_all(out)?;
    let mut written = Vec::with_capacity(frames.len());
    for frame in &frames {
        let path = out.join(format!("frame_{:02}.jpg", frame.index()));
        frame.save(&path)?;
        log::debug!("Saved frame {} -> {}", frame.index(), path.display());
        written.push(json!({
            "index": frame.index(),
            "timestamp": frame.timestamp(),
            "width": frame.width(),
            "height": frame.height(),
            "bytes": frame.bytes().len(),
            "path": path.display().to_string(),
        }));
    }

    if global.json {
        println!("{}", serde_json::to_string_pretty(&written)?);
    } else {
        println!(
            "{} {}",
            "success:".green().bold(),
            format!("Wrote {} frame(s) to {}", frames.len(), out.display()).green()
        );
    }
    Ok(())
}

fn run_probe(global: &GlobalOptions, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let video = VideoResource::open(input)?;
    if global.json {
        let payload = json!({
            "path": video.path().display().to_string(),
            "duration_seconds": video.duration(),
            "width": video.width(),
            "height": video.height(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Path: {}", video.path().display());
        println!("Duration: {:.3}s", video.duration());
        println!("Dimensions: {}x{}", video.width(), video.height());
    }
    Ok(())
}

fn run() -> Result<bool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;
    let config = scanner_config(&cli.global);

    match cli.command {
        Commands::Scan {
            input,
            facing,
            seconds,
            device,
            input_format,
            keep_recording,
            no_prompt,
        } => {
            let options = ScanOptions {
                input,
                facing: facing.parse()?,
                seconds,
                device,
                input_format,
                keep_recording,
                no_prompt,
            };
            run_scan(&cli.global, &config, options)
        }
        Commands::Analyze { input } => run_analyze(&cli.global, &config, &input),
        Commands::Sample { input, out, count } => {
            run_sample(&cli.global, &config, &input, &out, count)?;
            Ok(true)
        }
        Commands::Probe { input } => {
            run_probe(&cli.global, &input)?;
            Ok(true)
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "footscan", &mut io::stdout());
            Ok(true)
        }
    }
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scan_options() {
        let cli = Cli::try_parse_from([
            "footscan",
            "scan",
            "--input",
            "foot.mp4",
            "--facing",
            "front",
            "--no-prompt",
            "--frames",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.global.frames, Some(5));
        match cli.command {
            Commands::Scan {
                input,
                facing,
                no_prompt,
                ..
            } => {
                assert_eq!(input, Some(PathBuf::from("foot.mp4")));
                assert_eq!(facing.parse::<CameraFacing>(), Ok(CameraFacing::User));
                assert!(no_prompt);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_options_override_config() {
        let global = GlobalOptions {
            api_key: Some("secret".to_string()),
            model: Some("custom-model".to_string()),
            frames: Some(4),
            ..GlobalOptions::default()
        };
        let config = scanner_config(&global);
        assert!(config.has_credential());
        assert_eq!(config.model, "custom-model");
        assert_eq!(config.frame_count, 4);
    }

    #[test]
    fn verbose_enables_debug_logging() {
        assert_eq!(log_filter(true), LevelFilter::Debug);
        assert_eq!(log_filter(false), LevelFilter::Info);
    }

    #[test]
    fn ffmpeg_output_is_quiet_by_default() {
        let global = GlobalOptions::default();
        assert_eq!(ffmpeg_log_level(&global).unwrap(), FfmpegLogLevel::Error);

        let global = GlobalOptions {
            log_level: Some("debug".to_string()),
            ..GlobalOptions::default()
        };
        assert_eq!(ffmpeg_log_level(&global).unwrap(), FfmpegLogLevel::Debug);
    }

    #[test]
    fn review_answers() {
        assert_eq!(parse_review(""), Some(Review::Analyze));
        assert_eq!(parse_review(" A "), Some(Review::Analyze));
        assert_eq!(parse_review("retake"), Some(Review::Retake));
        assert_eq!(parse_review("r"), Some(Review::Retake));
        assert_eq!(parse_review("later"), None);
    }

    fn capture_session() -> Session {
        let mut session = Session::new(true);
        session.dispatch(Action::Start);
        session
    }

    #[test]
    fn missing_input_routes_to_error_screen() {
        let mut session = capture_session();
        let recording = record_with(
            &mut FileCapture::new("no/such/foot.mp4"),
            &RecordingSession::default(),
        );

        assert!(finish_capture(&mut session, recording, None).is_none());
        assert_eq!(session.state(), footscan::ScreenState::Error);
        assert!(session.error_message().unwrap().contains("no/such/foot.mp4"));

        session.dispatch(Action::Retry);
        assert_eq!(session.state(), footscan::ScreenState::Welcome);
    }

    #[test]
    fn failed_keep_routes_to_error_screen() {
        let directory = tempfile::tempdir().unwrap();
        let temp = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        let recording = Ok(RecordedVideo::temporary(temp));
        let destination = directory.path().join("missing").join("kept.mkv");

        let mut session = capture_session();
        assert!(finish_capture(&mut session, recording, Some(&destination)).is_none());
        assert_eq!(session.state(), footscan::ScreenState::Error);
        assert!(session.error_message().is_some());
    }

    #[test]
    fn kept_recording_is_handed_on() {
        let directory = tempfile::tempdir().unwrap();
        let temp = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        let destination = directory.path().join("kept.mkv");

        let mut session = capture_session();
        let video =
            finish_capture(&mut session, Ok(RecordedVideo::temporary(temp)), Some(&destination))
                .unwrap();
        assert_eq!(video.path(), destination.as_path());
        assert!(!video.is_temporary());
        drop(video);
        assert!(destination.exists());
        assert_eq!(session.state(), footscan::ScreenState::Capture);
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(parse_log_level("loud").is_err());
        assert!(parse_log_level("warning").is_ok());
    }
}
