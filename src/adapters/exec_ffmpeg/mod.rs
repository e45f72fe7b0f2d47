//! FFmpeg execution adapter
//!
//! Runs `ffmpeg` as a subprocess for each transcode request.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::{FfmpegArgs, ToolCommand};
use crate::ports::*;

const FFMPEG: &str = "ffmpeg";

/// FFmpeg-based transcode adapter
pub struct FfmpegAdapter {
    program: PathBuf,
}

impl Default for FfmpegAdapter {
    fn default() -> Self {
        Self::new(FFMPEG)
    }
}

impl FfmpegAdapter {
    /// Use the `ffmpeg` binary at `program` (a bare name is looked up on `PATH`)
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }

    fn command(&self, request: &TranscodeRequest, progress_address: &str) -> ToolCommand {
        ToolCommand::new(FFMPEG, &self.program)
            .args(FfmpegArgs::new(request).with_progress(progress_address).build())
            .lower_priority(request.use_lower_priority)
    }
}

#[async_trait]
impl TranscodePort for FfmpegAdapter {
    async fn transcode(
        &self,
        request: &TranscodeRequest,
        progress_address: &str,
        cancel: CancellationToken,
    ) -> Result<PathBuf, DomainError> {
        let args = FfmpegArgs::new(request).with_progress(progress_address);
        info!(
            input = %request.input.display(),
            output = %request.output.display(),
            command = %args.command_line(),
            "running ffmpeg"
        );

        let command = self.command(request, progress_address);
        let output = command.output(&cancel).await?;
        if !output.status.success() {
            error!(status = %output.status, "ffmpeg failed");
            return Err(command.failure(&output));
        }

        Ok(request.output.clone())
    }
}
