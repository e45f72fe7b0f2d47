// Transcode task - One transcode invocation with concurrent progress reporting

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::codec::{resolve, resolve_with_fallback, EncodingOptions, GenericAudioOptions};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::derive_container_options;
use crate::engine::{ProgressListener, DEFAULT_REPORT_INTERVAL};
use crate::ports::*;

/// Option blocks resolved once per run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOptions {
    pub video: Option<EncodingOptions>,
    pub audio: Option<EncodingOptions>,
    pub subtitle: Option<EncodingOptions>,
    pub container: Option<EncodingOptions>,
}

impl ResolvedOptions {
    /// Resolve every present block. Absent blocks stay unset.
    pub fn from_options(options: &TranscodeOptions) -> Result<Self, DomainError> {
        let audio_fallback = EncodingOptions::GenericAudio(GenericAudioOptions::default());

        let audio = options
            .audio_options
            .as_ref()
            .map(|block| resolve_with_fallback(block, Some(&audio_fallback)))
            .transpose()?;
        let subtitle = options.subtitle_options.as_ref().map(resolve).transpose()?;
        let video = options.video_options.as_ref().map(resolve).transpose()?;
        let container = options.container_options.as_ref().map(resolve).transpose()?;

        for (name, stream) in [("audio", &audio), ("subtitle", &subtitle), ("video", &video)] {
            if stream.as_ref().is_some_and(EncodingOptions::is_container) {
                return Err(DomainError::InvalidConfig(format!(
                    "{}_options names a container format",
                    name
                )));
            }
        }
        if container.as_ref().is_some_and(|c| !c.is_container()) {
            return Err(DomainError::InvalidConfig(
                "container_options must name a container format".to_string(),
            ));
        }

        Ok(Self {
            video,
            audio,
            subtitle,
            container,
        })
    }
}

/// Result of a successful transcode
#[derive(Debug, Clone)]
pub struct TranscodeOutcome {
    pub output: PathBuf,
    pub report: ProgressReport,
}

/// Runs the transcode collaborator while a progress listener drains its status stream
pub struct TranscodeTask {
    port: Arc<dyn TranscodePort>,
    options: TranscodeOptions,
    resolved: ResolvedOptions,
    work_dir: PathBuf,
    use_lower_priority: bool,
    report_interval: Duration,
}

impl TranscodeTask {
    /// Fails if any option block does not resolve
    pub fn new(
        port: Arc<dyn TranscodePort>,
        options: TranscodeOptions,
        work_dir: impl Into<PathBuf>,
    ) -> Result<Self, DomainError> {
        let resolved = ResolvedOptions::from_options(&options)?;
        Ok(Self {
            port,
            options,
            resolved,
            work_dir: work_dir.into(),
            use_lower_priority: false,
            report_interval: DEFAULT_REPORT_INTERVAL,
        })
    }

    pub fn with_lower_priority(mut self, lower: bool) -> Self {
        self.use_lower_priority = lower;
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn resolved(&self) -> &ResolvedOptions {
        &self.resolved
    }

    /// Build the request for `input`, a piece of the top-level `source`, deriving
    /// container flags from `analysis`
    pub fn request_for(
        &self,
        source: &Path,
        input: &Path,
        analysis: Option<&AnalysisResult>,
    ) -> TranscodeRequest {
        let mut container = self.resolved.container.clone();
        if let Some(container) = container.as_mut() {
            derive_container_options(container, self.options.enable_fast_start, analysis);
        }

        let o = &self.options;
        TranscodeRequest {
            input: input.to_path_buf(),
            output: TranscodeRequest::output_path_for(
                &self.work_dir,
                &TranscodeRequest::artifact_stem(source, input),
                container.as_ref(),
            ),
            video: self.resolved.video.clone(),
            audio: self.resolved.audio.clone(),
            subtitle: self.resolved.subtitle.clone(),
            container,
            audio_languages: o.audio_languages.clone(),
            subtitle_languages: o.subtitle_languages.clone(),
            map_all_audio: o.copy_all_audio_streams,
            map_all_subtitles: o.copy_all_subtitle_streams,
            map_all_video: o.copy_all_video_streams,
            discard_audio: o.discard_audio,
            discard_subtitles: o.discard_subtitles,
            discard_video: o.discard_video,
            input_args: o.input_args.clone(),
            output_args: o.output_args.clone(),
            use_lower_priority: self.use_lower_priority,
        }
    }

    /// Transcode one file. The listener task is always joined before returning.
    pub async fn run(
        &self,
        source: &Path,
        input: &Path,
        analysis: Option<&AnalysisResult>,
        cancel: CancellationToken,
    ) -> Result<TranscodeOutcome, DomainError> {
        let request = self.request_for(source, input, analysis);

        let mut listener = ProgressListener::new();
        let address = listener.begin().await?;
        let stop = listener.stop_handle();

        let total_frames = analysis.map_or(0, |a| a.total_frames);
        let interval = self.report_interval;
        let session = tokio::spawn(async move {
            let report = listener.run(total_frames, interval).await;
            listener.close();
            report
        });

        info!(input = %input.display(), progress = %address, "starting transcode");
        let result = self.port.transcode(&request, &address, cancel).await;

        stop.cancel();
        let report = session.await.unwrap_or_else(|e| {
            error!(err = %e, "progress listener task failed");
            ProgressReport::default()
        });

        let output = result?;
        info!(
            output = %output.display(),
            frames = report.frame,
            out_time = %report.out_time,
            "transcode finished"
        );
        Ok(TranscodeOutcome { output, report })
    }
}
