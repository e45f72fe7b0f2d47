//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::{AppContainer, DefaultAppContainer, PipelineReport};
use crate::cli::Cli;
use crate::utils::{format_duration, format_file_size};

const WORK_DIR_PREFIX: &str = "reelwright-";

/// Run the pipeline described by `cli` until it finishes or `cancel` fires
pub async fn run(cli: &Cli, cancel: CancellationToken) -> Result<PipelineReport> {
    for input in &cli.run.inputs {
        if !input.is_file() {
            bail!("input file does not exist: {}", input.display());
        }
    }

    std::fs::create_dir_all(&cli.run.output).with_context(|| {
        format!("failed to create output directory {}", cli.run.output.display())
    })?;

    let work_dir = create_work_dir(cli.run.work_dir.as_deref())?;
    info!(work_dir = %work_dir.path().display(), output = %cli.run.output.display(), "directories ready");

    let config = cli.pipeline_config(work_dir.path());
    let container = DefaultAppContainer::new(&config, &cancel).context("invalid configuration")?;

    let report = container
        .pipeline_interactor()
        .run(cli.run.inputs.clone(), cli.naming.episode, &cancel)
        .await;

    log_summary(&report);

    let path = work_dir.path().to_path_buf();
    if let Err(e) = work_dir.close() {
        warn!(work_dir = %path.display(), err = %e, "error while cleaning up work directory");
    }

    Ok(report)
}

fn create_work_dir(parent: Option<&Path>) -> Result<tempfile::TempDir> {
    let parent: PathBuf = match parent {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create work directory {}", dir.display()))?;
            dir.to_path_buf()
        }
        None => std::env::temp_dir(),
    };

    tempfile::Builder::new()
        .prefix(WORK_DIR_PREFIX)
        .tempdir_in(&parent)
        .with_context(|| format!("failed to create work directory in {}", parent.display()))
}

fn log_summary(report: &PipelineReport) {
    let elapsed = (report.finished_at - report.started_at)
        .to_std()
        .unwrap_or_default();
    let total_size: u64 = report
        .placed
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .sum();

    for path in &report.placed {
        info!(path = %path.display(), "placed");
    }
    info!(
        stage = %report.stage,
        placed = report.placed.len(),
        size = %format_file_size(total_size),
        elapsed = %format_duration(elapsed),
        started_at = %report.started_at.to_rfc3339(),
        next_episode = report.next_episode,
        "run summary"
    );

    if let Some(failure) = &report.failure {
        warn!(
            stage = %failure.stage,
            "run stopped early; resume with --episode {}", report.next_episode
        );
    }
}
