//! Command-line argument definitions

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::domain::model::MediaKind;
use crate::utils::logging::{LogFormat, LogLevel};

/// Inputs and pipeline stages
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Input video files, processed in order
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Folder to copy final output to
    #[arg(short, long, env = "REELWRIGHT_OUTPUT", default_value = "reelwright-output")]
    pub output: PathBuf,

    /// Directory to create the scratch space in (default: system temp dir)
    #[arg(long, env = "REELWRIGHT_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Template file with transcode options (YAML or TOML); repeat to layer templates
    #[arg(short, long = "template", value_name = "FILE", env = "REELWRIGHT_TEMPLATE")]
    pub templates: Vec<PathBuf>,

    /// Split multi-episode inputs with mkvmerge before transcoding
    #[arg(long, env = "REELWRIGHT_SPLIT")]
    pub split: bool,

    /// Value passed to `mkvmerge --split`
    #[arg(long, env = "REELWRIGHT_SPLIT_SPEC", default_value = "chapters:all")]
    pub split_spec: String,

    /// Skip ffprobe analysis (disables progress percentages and Matroska index reservation)
    #[arg(long, env = "REELWRIGHT_NO_ANALYZE")]
    pub no_analyze: bool,

    /// Run external tools below normal priority
    #[arg(long, env = "REELWRIGHT_LOWER_PRIORITY")]
    pub lower_priority: bool,

    /// Seconds between progress log lines
    #[arg(long, env = "REELWRIGHT_REPORT_INTERVAL", default_value = "1", value_parser = parse_interval)]
    pub report_interval: Duration,
}

/// Output naming
#[derive(Args, Debug, Clone)]
pub struct NamingArgs {
    /// Rename output into a media library layout
    #[arg(long, env = "REELWRIGHT_LIBRARY", requires = "title")]
    pub library: bool,

    /// Movie or show title
    #[arg(long, env = "REELWRIGHT_TITLE")]
    pub title: Option<String>,

    /// Release year (0 for none)
    #[arg(long, env = "REELWRIGHT_YEAR", default_value_t = 0)]
    pub year: u32,

    /// Media kind: movie, or tv / show / episodic
    #[arg(long, env = "REELWRIGHT_MEDIA_KIND", default_value = "tv")]
    pub media_kind: MediaKind,

    /// Season number for episodic media
    #[arg(long, env = "REELWRIGHT_SEASON", default_value_t = 1)]
    pub season: u32,

    /// Episode number of the first placed output
    #[arg(long, env = "REELWRIGHT_EPISODE", default_value_t = 1)]
    pub episode: u32,
}

/// Logging output
#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, env = "REELWRIGHT_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Log format (pretty, compact, json)
    #[arg(long, env = "REELWRIGHT_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: LogFormat,
}

fn parse_interval(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number of seconds: {}", value))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("interval must be a non-negative number of seconds: {}", value));
    }
    Ok(Duration::from_secs_f64(seconds))
}
