// Pipeline interactor - Sequences split, analyze, transcode and place across inputs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use crate::app::transcode_task::TranscodeTask;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::OutputNamer;
use crate::ports::*;

/// Stage and location of the failure that stopped a run
#[derive(Debug, Error)]
#[error("{stage} failed for {}{}: {error}", .input.display(), file_suffix(.file))]
pub struct StageFailure {
    pub stage: PipelineStage,
    pub input: PathBuf,
    /// File within the input's split output, when the failure is past splitting
    pub file: Option<PathBuf>,
    #[source]
    pub error: DomainError,
}

fn file_suffix(file: &Option<PathBuf>) -> String {
    file.as_ref()
        .map(|f| format!(" ({})", f.display()))
        .unwrap_or_default()
}

/// Outcome of one pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    /// Placed outputs in placement order
    pub placed: Vec<PathBuf>,
    /// Episode number the next placed output would receive
    pub next_episode: u32,
    /// `Done` or `Failed`
    pub stage: PipelineStage,
    pub failure: Option<StageFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Placed outputs, or the failure that stopped the run
    pub fn into_result(self) -> Result<Vec<PathBuf>, StageFailure> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(self.placed),
        }
    }
}

/// Interactor for the split / transcode / place pipeline
pub struct PipelineInteractor {
    splitter: Option<Arc<dyn SplitPort>>,
    analyzer: Option<Arc<dyn AnalyzePort>>,
    transcoder: TranscodeTask,
    placer: Arc<dyn PlacementPort>,
    output_dir: PathBuf,
    naming: NamingOptions,
}

impl PipelineInteractor {
    /// Create a pipeline that transcodes each input as a single file
    pub fn new(
        transcoder: TranscodeTask,
        placer: Arc<dyn PlacementPort>,
        output_dir: impl Into<PathBuf>,
        naming: NamingOptions,
    ) -> Self {
        Self {
            splitter: None,
            analyzer: None,
            transcoder,
            placer,
            output_dir: output_dir.into(),
            naming,
        }
    }

    /// Split every input before transcoding
    pub fn with_splitter(mut self, splitter: Arc<dyn SplitPort>) -> Self {
        self.splitter = Some(splitter);
        self
    }

    /// Analyze every file before transcoding
    pub fn with_analyzer(mut self, analyzer: Arc<dyn AnalyzePort>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Process `inputs` in order, numbering placed outputs from `first_episode`.
    ///
    /// The first failure stops the run. Outputs placed before it are kept.
    pub async fn run(
        &self,
        inputs: Vec<PathBuf>,
        first_episode: u32,
        cancel: &CancellationToken,
    ) -> PipelineReport {
        let started_at = Utc::now();
        let mut state = PipelineState::new(inputs, first_episode);
        let mut placed = Vec::new();

        let inputs = state.inputs.clone();
        let mut failure = None;
        for input in &inputs {
            let span = info_span!("input", path = %input.display());
            if let Err(f) = self
                .process_input(&mut state, input, &mut placed, cancel)
                .instrument(span)
                .await
            {
                failure = Some(f);
                break;
            }
        }

        match &failure {
            Some(f) => {
                state.enter(PipelineStage::Failed);
                error!(
                    stage = %f.stage,
                    input = %f.input.display(),
                    err = %f.error,
                    placed = placed.len(),
                    next_episode = state.episode,
                    "pipeline failed"
                );
            }
            None => {
                state.enter(PipelineStage::Done);
                info!(placed = placed.len(), next_episode = state.episode, "pipeline finished");
            }
        }

        PipelineReport {
            placed,
            next_episode: state.episode,
            stage: state.stage,
            failure,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn process_input(
        &self,
        state: &mut PipelineState,
        input: &Path,
        placed: &mut Vec<PathBuf>,
        cancel: &CancellationToken,
    ) -> Result<(), StageFailure> {
        let fail = |stage, file: Option<&Path>, error| StageFailure {
            stage,
            input: input.to_path_buf(),
            file: file.map(Path::to_path_buf),
            error,
        };

        let files = match &self.splitter {
            Some(splitter) => {
                state.enter(PipelineStage::Splitting);
                check_cancelled(cancel).map_err(|e| fail(PipelineStage::Splitting, None, e))?;
                let files = splitter
                    .split(input)
                    .await
                    .map_err(|e| fail(PipelineStage::Splitting, None, e))?;
                info!(count = files.len(), "input split");
                files
            }
            None => vec![input.to_path_buf()],
        };

        for file in &files {
            let analysis = match &self.analyzer {
                Some(analyzer) => {
                    state.enter(PipelineStage::Analyzing);
                    check_cancelled(cancel)
                        .map_err(|e| fail(PipelineStage::Analyzing, Some(file.as_path()), e))?;
                    let result = analyzer
                        .analyze(file)
                        .await
                        .map_err(|e| fail(PipelineStage::Analyzing, Some(file.as_path()), e))?;
                    Some(result)
                }
                None => None,
            };

            state.enter(PipelineStage::Transcoding);
            check_cancelled(cancel).map_err(|e| fail(PipelineStage::Transcoding, Some(file.as_path()), e))?;
            let outcome = self
                .transcoder
                .run(input, file, analysis.as_ref(), cancel.clone())
                .await
                .map_err(|e| fail(PipelineStage::Transcoding, Some(file.as_path()), e))?;

            state.enter(PipelineStage::Placing);
            check_cancelled(cancel).map_err(|e| fail(PipelineStage::Placing, Some(file.as_path()), e))?;
            let destination = self
                .place(&outcome.output, state.episode, placed)
                .await
                .map_err(|e| fail(PipelineStage::Placing, Some(file.as_path()), e))?;

            info!(
                episode = state.episode,
                destination = %destination.display(),
                "output placed"
            );
            placed.push(destination);
            state
                .advance_episode()
                .map_err(|e| fail(PipelineStage::Placing, Some(file.as_path()), e))?;
        }

        Ok(())
    }

    async fn place(&self, artifact: &Path, episode: u32, placed: &[PathBuf]) -> Result<PathBuf, DomainError> {
        let target = self.naming.target(episode);
        let destination = OutputNamer::destination(&self.output_dir, &target, artifact);
        if placed.contains(&destination) {
            return Err(DomainError::DestinationTaken { path: destination });
        }

        if let Some(parent) = destination.parent() {
            self.placer.create_directory(parent).await?;
        }
        self.placer.copy_file(artifact, &destination).await?;
        Ok(destination)
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), DomainError> {
    if cancel.is_cancelled() {
        return Err(DomainError::Cancelled);
    }
    Ok(())
}
