//! reelwright
//!
//! Splits multi-episode video files, transcodes the pieces with ffmpeg and places the
//! results in an output folder, optionally renamed into a media library layout.
//!
//! # Usage
//!
//! ```bash
//! reelwright --split --template hevc.yaml --library --title "Show" --season 1 disc1.mkv disc2.mkv
//! reelwright --template remux.toml --output movies movie.mkv
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use reelwright::cli::{commands, Cli};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let logging = cli.logging_config();
    logging.init();
    logging.log_system_info();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let report = commands::run(&cli, cancel).await?;
    match report.into_result() {
        Ok(placed) => {
            info!(count = placed.len(), "reelwright completed successfully");
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            error!("{}", failure);
            Ok(ExitCode::FAILURE)
        }
    }
}
