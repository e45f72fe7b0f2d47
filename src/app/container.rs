use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::adapters::{
    FfmpegAdapter, FfprobeAdapter, LocalFsAdapter, MkvmergeSplitAdapter, TemplateConfigAdapter,
};
use crate::adapters::split_mkvmerge::DEFAULT_SPLIT_SPEC;
use crate::app::{pipeline_interactor::PipelineInteractor, transcode_task::TranscodeTask};
use crate::domain::errors::DomainError;
use crate::domain::model::NamingOptions;
use crate::engine::DEFAULT_REPORT_INTERVAL;
use crate::ports::{AnalyzePort, PlacementPort, SplitPort, TranscodePort};

/// Settings needed to wire a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Scratch directory for split and transcoded files
    pub work_dir: PathBuf,
    /// Root that placed outputs are copied under
    pub output_dir: PathBuf,
    /// Template files, applied in order
    pub templates: Vec<PathBuf>,
    pub split: bool,
    pub split_spec: String,
    pub analyze: bool,
    pub lower_priority: bool,
    pub report_interval: Duration,
    pub naming: NamingOptions,
}

impl PipelineConfig {
    pub fn new(work_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            output_dir: output_dir.into(),
            templates: Vec::new(),
            split: false,
            split_spec: DEFAULT_SPLIT_SPEC.to_string(),
            analyze: true,
            lower_priority: false,
            report_interval: DEFAULT_REPORT_INTERVAL,
            naming: NamingOptions::default(),
        }
    }
}

pub trait AppContainer: Send + Sync {
    fn pipeline_interactor(&self) -> Arc<PipelineInteractor>;
}

pub struct DefaultAppContainer {
    pipeline_interactor: Arc<PipelineInteractor>,
}

impl DefaultAppContainer {
    /// Wire the subprocess adapters. Templates are loaded and resolved here, so
    /// configuration errors surface before any work starts.
    pub fn new(config: &PipelineConfig, cancel: &CancellationToken) -> Result<Self, DomainError> {
        let options = TemplateConfigAdapter::load_all(&config.templates)?;

        let transcode_port = Arc::new(FfmpegAdapter::default());
        let placement_port = Arc::new(LocalFsAdapter::new());

        let transcoder = TranscodeTask::new(
            Arc::clone(&transcode_port) as Arc<dyn TranscodePort>,
            options,
            &config.work_dir,
        )?
        .with_lower_priority(config.lower_priority)
        .with_report_interval(config.report_interval);

        let mut interactor = PipelineInteractor::new(
            transcoder,
            Arc::clone(&placement_port) as Arc<dyn PlacementPort>,
            &config.output_dir,
            config.naming.clone(),
        );

        if config.split {
            let split_port = Arc::new(
                MkvmergeSplitAdapter::new(&config.work_dir)
                    .with_split_spec(config.split_spec.as_str())
                    .with_lower_priority(config.lower_priority)
                    .with_cancellation(cancel.clone()),
            );
            interactor = interactor.with_splitter(split_port as Arc<dyn SplitPort>);
        }

        if config.analyze {
            let analyze_port = Arc::new(
                FfprobeAdapter::default()
                    .with_lower_priority(config.lower_priority)
                    .with_cancellation(cancel.clone()),
            );
            interactor = interactor.with_analyzer(analyze_port as Arc<dyn AnalyzePort>);
        }

        Ok(Self {
            pipeline_interactor: Arc::new(interactor),
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn pipeline_interactor(&self) -> Arc<PipelineInteractor> {
        Arc::clone(&self.pipeline_interactor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_container_builds_with_templates() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("hevc.yaml");
        fs::write(
            &template,
            "video_options:\n  codec: libx265\n  crf: 22\n  use_crf: true\naudio_options:\n  codec: aac\n",
        )
        .unwrap();

        let mut config = PipelineConfig::new(dir.path().join("work"), dir.path().join("out"));
        config.templates = vec![template];
        config.split = true;

        let container = DefaultAppContainer::new(&config, &CancellationToken::new()).unwrap();
        assert_eq!(container.pipeline_interactor().output_dir(), dir.path().join("out"));
    }

    #[test]
    fn test_container_rejects_bad_template() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("bad.yaml");
        fs::write(&template, "video_options:\n  codec: vp9\n").unwrap();

        let mut config = PipelineConfig::new(dir.path(), dir.path());
        config.templates = vec![template];

        let err = DefaultAppContainer::new(&config, &CancellationToken::new())
            .err()
            .unwrap();
        assert!(matches!(err, DomainError::UnknownCodec { .. }));
    }
}
