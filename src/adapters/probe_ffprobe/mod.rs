//! FFprobe adapter for media file analysis
//!
//! Counts frames of the primary video stream and estimates the duration from the
//! average frame rate.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::ToolCommand;
use crate::ports::*;

const FFPROBE: &str = "ffprobe";

/// FFprobe-based analysis adapter
pub struct FfprobeAdapter {
    program: PathBuf,
    threads: Option<usize>,
    lower_priority: bool,
    cancel: CancellationToken,
}

impl Default for FfprobeAdapter {
    fn default() -> Self {
        Self::new(FFPROBE)
    }
}

impl FfprobeAdapter {
    /// Use the `ffprobe` binary at `program`, decoding with one thread per CPU
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            threads: Some(num_cpus::get()),
            lower_priority: false,
            cancel: CancellationToken::new(),
        }
    }

    /// Decoder thread count; `None` leaves the choice to ffprobe
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_lower_priority(mut self, lower: bool) -> Self {
        self.lower_priority = lower;
        self
    }

    /// Token that aborts a running probe
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn command(&self, input: &Path) -> ToolCommand {
        let mut command = ToolCommand::new(FFPROBE, &self.program)
            .args(["-v", "error", "-print_format", "json", "-show_streams", "-count_frames"])
            .lower_priority(self.lower_priority);

        if let Some(threads) = self.threads {
            command = command.arg("-threads").arg(threads.to_string());
        }

        command.arg(input.as_os_str())
    }
}

#[async_trait]
impl AnalyzePort for FfprobeAdapter {
    async fn analyze(&self, input: &Path) -> Result<AnalysisResult, DomainError> {
        info!(input = %input.display(), "reading video data");

        let output = self.command(input).run(&self.cancel).await?;
        let result = parse_ffprobe_json(input, &output.stdout)?;

        info!(
            total_frames = result.total_frames,
            duration_secs = result.duration.as_secs(),
            audio_streams = result.audio_streams,
            subtitle_streams = result.subtitle_streams,
            video_streams = result.video_streams,
            "analysis results"
        );
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProbeStream {
    codec_type: String,
    nb_read_frames: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Build an [`AnalysisResult`] from `ffprobe -show_streams -count_frames` JSON
pub fn parse_ffprobe_json(input: &Path, json: &[u8]) -> Result<AnalysisResult, DomainError> {
    let output: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| DomainError::AnalysisFailed {
            path: input.to_path_buf(),
            message: format!("failed to parse ffprobe output: {}", e),
        })?;

    let mut result = AnalysisResult::default();
    for stream in &output.streams {
        match stream.codec_type.as_str() {
            "audio" => result.audio_streams += 1,
            "subtitle" => result.subtitle_streams += 1,
            "video" => result.video_streams += 1,
            _ => {}
        }
    }

    let Some(video) = output.streams.iter().find(|s| s.codec_type == "video") else {
        return Ok(result);
    };

    result.total_frames = video
        .nb_read_frames
        .as_deref()
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(0);

    if result.total_frames > 0 {
        let rate = video.avg_frame_rate.as_deref().unwrap_or("");
        result
            .set_duration_from_frame_rate(rate)
            .map_err(|e| DomainError::AnalysisFailed {
                path: input.to_path_buf(),
                message: e.to_string(),
            })?;
    }

    Ok(result)
}
