//! reelwright video pipeline library
//!
//! Sequences external tools (`mkvmerge`, `ffprobe`, `ffmpeg`) to split, transcode and
//! place video files. Option templates decode into typed codec and container settings,
//! and transcode progress is collected from ffmpeg's status stream.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod codec;
pub mod domain;
pub mod engine;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use codec::EncodingOptions;
pub use domain::errors::{DomainError, DomainResult};
pub use domain::model::{AnalysisResult, ProgressReport, TranscodeOptions, TranscodeRequest};
