// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::EncodingOptions;
use crate::domain::errors::DomainError;

#[cfg(test)]
mod tests;

/// Summary of a media file produced by the analysis collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Estimated length of the video, zero when unknown
    pub duration: Duration,
    pub audio_streams: u32,
    pub subtitle_streams: u32,
    pub video_streams: u32,
    /// Frame count of the primary video stream
    pub total_frames: u64,
}

impl AnalysisResult {
    /// Create a result from a frame count alone
    pub fn from_frames(total_frames: u64) -> Self {
        Self {
            total_frames,
            ..Self::default()
        }
    }

    /// Estimate the duration from the frame count and an ffprobe frame rate string
    /// such as `24000/1001` or `25`.
    pub fn set_duration_from_frame_rate(&mut self, frame_rate: &str) -> Result<(), DomainError> {
        let fps = parse_frame_rate(frame_rate)?;
        if fps <= 0.0 || !fps.is_finite() {
            return Err(DomainError::InvalidConfig(format!(
                "frame rate must be positive, got {}",
                frame_rate
            )));
        }
        self.duration = Duration::from_secs((self.total_frames as f64 / fps) as u64);
        Ok(())
    }

    /// Whether a usable duration estimate is present
    pub fn has_duration(&self) -> bool {
        self.duration > Duration::ZERO
    }
}

/// Parse a `numerator/divisor` (or bare number) rate string into a float
pub fn parse_frame_rate(rate: &str) -> Result<f64, DomainError> {
    let rate = rate.trim();
    let (numerator, divisor) = rate.split_once('/').unwrap_or((rate, "1"));

    let numerator: i64 = numerator
        .parse()
        .map_err(|_| DomainError::InvalidConfig(format!("invalid frame rate: {}", rate)))?;
    let divisor: i64 = divisor
        .parse()
        .map_err(|_| DomainError::InvalidConfig(format!("invalid frame rate: {}", rate)))?;

    if divisor == 0 {
        return Err(DomainError::InvalidConfig(format!(
            "frame rate divisor cannot be zero: {}",
            rate
        )));
    }

    Ok(numerator as f64 / divisor as f64)
}

/// Most recently observed values from a transcode's status stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub bitrate: String,
    pub frame: u64,
    pub fps: f64,
    pub out_time: String,
    pub speed: String,
    pub total_size: u64,
}

/// Outcome of feeding one status line into a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    /// A recognized field was updated (or kept on parse failure)
    Field,
    /// Key not recognized or line malformed
    Ignored,
    /// End of one reporting unit, more to come
    Unit,
    /// Terminal `progress=end` record
    End,
}

impl ProgressReport {
    /// Apply one `key=value` status line.
    ///
    /// Unparsable numeric values leave the previous value in place.
    pub fn apply_line(&mut self, line: &str) -> StatusLine {
        let Some((key, value)) = line.split_once('=') else {
            return StatusLine::Ignored;
        };
        let value = value.trim();

        match key.trim() {
            "bitrate" => self.bitrate = value.to_string(),
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    self.fps = fps;
                }
            }
            "out_time" => self.out_time = value.to_string(),
            "speed" => self.speed = value.to_string(),
            "total_size" => {
                if let Ok(size) = value.parse() {
                    self.total_size = size;
                }
            }
            "progress" => {
                return if value == "end" {
                    StatusLine::End
                } else {
                    StatusLine::Unit
                };
            }
            _ => return StatusLine::Ignored,
        }

        StatusLine::Field
    }

    /// Completion percentage against a known frame total, clamped to [0, 100]
    pub fn percent_of(&self, total_frames: u64) -> Option<f64> {
        if total_frames == 0 {
            return None;
        }
        Some((self.frame as f64 / total_frames as f64 * 100.0).clamp(0.0, 100.0))
    }

    /// Build a human-readable summary of the current state
    pub fn summary(&self, total_frames: u64) -> ProgressSummary {
        ProgressSummary {
            percent: self.percent_of(total_frames),
            frame: self.frame,
            fps: self.fps,
            out_time: self.out_time.clone(),
            speed: self.speed.clone(),
            total_size: self.total_size,
        }
    }
}

/// Snapshot emitted at each reporting interval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub percent: Option<f64>,
    pub frame: u64,
    pub fps: f64,
    pub out_time: String,
    pub speed: String,
    pub total_size: u64,
}

impl fmt::Display for ProgressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(percent) = self.percent {
            write!(f, "{:>5.1}% ", percent)?;
        }
        write!(
            f,
            "frame={} fps={:.02} time={} speed={} size={}",
            self.frame, self.fps, self.out_time, self.speed, self.total_size
        )
    }
}

/// How output files are named when placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingMode {
    /// Keep the transcoded file's base name
    #[default]
    Flat,
    /// `<title>/Season NN/<title> - sNNeNN.<ext>` style library layout
    Structured,
}

/// Kind of media item for structured naming
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MediaKind {
    Movie,
    #[default]
    Episodic,
    /// Anything else; naming falls back to a placeholder
    Other(String),
}

impl FromStr for MediaKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "movie" => MediaKind::Movie,
            "tv" | "show" | "episodic" => MediaKind::Episodic,
            other => MediaKind::Other(other.to_string()),
        })
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Episodic => write!(f, "tv"),
            MediaKind::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// Naming fields fixed for the whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingOptions {
    pub mode: NamingMode,
    pub title: String,
    /// Release year, zero when unknown
    pub year: u32,
    pub kind: MediaKind,
    pub season: u32,
}

impl NamingOptions {
    /// Combine with the current episode counter into a placement target
    pub fn target(&self, episode: u32) -> PlacementTarget {
        PlacementTarget {
            mode: self.mode,
            title: self.title.clone(),
            year: self.year,
            kind: self.kind.clone(),
            season: self.season,
            episode,
        }
    }
}

/// Naming scheme plus the fields needed to compute a destination path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementTarget {
    pub mode: NamingMode,
    pub title: String,
    pub year: u32,
    pub kind: MediaKind,
    pub season: u32,
    pub episode: u32,
}

/// Stages of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    Idle,
    Splitting,
    Analyzing,
    Transcoding,
    Placing,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Splitting => "split",
            PipelineStage::Analyzing => "analyze",
            PipelineStage::Transcoding => "transcode",
            PipelineStage::Placing => "place",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Inputs and numbering state owned by one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub inputs: Vec<PathBuf>,
    pub episode: u32,
    pub stage: PipelineStage,
}

impl PipelineState {
    pub fn new(inputs: Vec<PathBuf>, first_episode: u32) -> Self {
        Self {
            inputs,
            episode: first_episode,
            stage: PipelineStage::Idle,
        }
    }

    /// Move to a new stage
    pub fn enter(&mut self, stage: PipelineStage) {
        tracing::debug!(from = %self.stage, to = %stage, "pipeline stage transition");
        self.stage = stage;
    }

    /// Record a successfully placed output
    pub fn advance_episode(&mut self) -> Result<(), DomainError> {
        self.episode = self.episode.checked_add(1).ok_or_else(|| {
            DomainError::InvalidConfig(format!("episode number overflows after {}", self.episode))
        })?;
        Ok(())
    }
}

/// Raw per-stream option blocks and flags, as loaded from templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeOptions {
    /// ISO 639 language codes of audio streams to keep
    pub audio_languages: Vec<String>,
    pub audio_options: Option<serde_yaml::Value>,
    pub container_options: Option<serde_yaml::Value>,
    pub copy_all_audio_streams: bool,
    pub copy_all_subtitle_streams: bool,
    pub copy_all_video_streams: bool,
    pub discard_audio: bool,
    pub discard_subtitles: bool,
    pub discard_video: bool,
    /// Prepare the container for playback before download completes
    pub enable_fast_start: bool,
    pub input_args: Vec<String>,
    pub output_args: Vec<String>,
    /// ISO 639 language codes of subtitle streams to keep
    pub subtitle_languages: Vec<String>,
    pub subtitle_options: Option<serde_yaml::Value>,
    pub video_options: Option<serde_yaml::Value>,
}

/// Fully resolved transcode invocation handed to the transcode collaborator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscodeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub video: Option<EncodingOptions>,
    pub audio: Option<EncodingOptions>,
    pub subtitle: Option<EncodingOptions>,
    pub container: Option<EncodingOptions>,
    pub audio_languages: Vec<String>,
    pub subtitle_languages: Vec<String>,
    pub map_all_audio: bool,
    pub map_all_subtitles: bool,
    pub map_all_video: bool,
    pub discard_audio: bool,
    pub discard_subtitles: bool,
    pub discard_video: bool,
    pub input_args: Vec<String>,
    pub output_args: Vec<String>,
    pub use_lower_priority: bool,
}

impl TranscodeRequest {
    /// Output file extension implied by the container options
    pub fn output_extension(container: Option<&EncodingOptions>) -> &'static str {
        match container {
            Some(EncodingOptions::Mp4(_)) => "mp4",
            _ => "mkv",
        }
    }

    /// Base name of the artifact for `file`, a piece of the top-level `source`.
    ///
    /// Split pieces are prefixed with the source stem so pieces of different inputs
    /// never share a name.
    pub fn artifact_stem(source: &Path, file: &Path) -> String {
        let stem = |p: &Path| p.file_stem().map(|s| s.to_string_lossy().into_owned());
        match (stem(source), stem(file)) {
            (_, None) => "output".to_string(),
            (Some(source_stem), Some(file_stem)) if source != file => {
                format!("{}-{}", source_stem, file_stem)
            }
            (_, Some(file_stem)) => file_stem,
        }
    }

    /// Path of the transcoded artifact named `stem` inside `work_dir`
    pub fn output_path_for(work_dir: &Path, stem: &str, container: Option<&EncodingOptions>) -> PathBuf {
        work_dir.join(format!("{}-output.{}", stem, Self::output_extension(container)))
    }
}
