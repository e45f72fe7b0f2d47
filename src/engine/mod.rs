//! Transcode engine: external tool execution, ffmpeg arguments and progress reporting

pub mod command;
pub mod ffmpeg;
pub mod progress;

pub use command::{ToolCommand, ToolOutput};
pub use ffmpeg::FfmpegArgs;
pub use progress::{ProgressListener, DEFAULT_REPORT_INTERVAL};
