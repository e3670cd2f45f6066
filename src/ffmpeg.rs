//! FFmpeg console verbosity.
//!
//! FFmpeg prints its own warnings to stderr independently of the `log`
//! facade used by this crate; for the crate's own messages, install a
//! standard `log` subscriber such as `env_logger`. Camera devices are
//! chatty while a recording runs, so the CLI lowers FFmpeg's level to
//! [`FfmpegLogLevel::Error`] unless `--log-level` says otherwise.
//!
//! ```no_run
//! use footscan::FfmpegLogLevel;
//!
//! footscan::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! let level: FfmpegLogLevel = "quiet".parse().unwrap();
//! footscan::set_ffmpeg_log_level(level);
//! ```

use std::str::FromStr;

use ffmpeg_next::util::log::Level;

/// FFmpeg internal log verbosity level, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output at all.
    Quiet,
    /// Unrecoverable errors only.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Debugging output.
    Debug,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiet" | "off" => Ok(FfmpegLogLevel::Quiet),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "debug" => Ok(FfmpegLogLevel::Debug),
            other => Err(format!("unsupported FFmpeg log level: {other}")),
        }
    }
}

/// Set FFmpeg's console verbosity. Does not affect `log` output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

#[cfg(test)]
mod tests {
    use super::FfmpegLogLevel;

    #[test]
    fn parses_aliases() {
        assert_eq!("WARN".parse(), Ok(FfmpegLogLevel::Warning));
        assert_eq!("off".parse(), Ok(FfmpegLogLevel::Quiet));
        assert_eq!(" debug ".parse(), Ok(FfmpegLogLevel::Debug));
        assert!("trace".parse::<FfmpegLogLevel>().is_err());
    }
}
