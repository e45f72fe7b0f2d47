//! CLI module for reelwright
//!
//! This module handles command-line argument parsing and command execution.

use std::path::Path;

use clap::Parser;

use crate::app::PipelineConfig;
use crate::domain::model::{NamingMode, NamingOptions};
use crate::utils::logging::LoggingConfig;

pub mod args;
pub mod commands;

/// reelwright video pipeline
///
/// Splits multi-episode video files into single files, transcodes the results with
/// ffmpeg, and copies them to an output folder, optionally renamed into a media library
/// layout.
#[derive(Parser, Debug)]
#[command(name = "reelwright")]
#[command(about = "A video splitting and transcoding pipeline")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub run: args::RunArgs,

    #[command(flatten)]
    pub naming: args::NamingArgs,

    #[command(flatten)]
    pub logging: args::LoggingArgs,
}

impl Cli {
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.logging.log_level,
            format: self.logging.log_format,
        }
    }

    pub fn naming_options(&self) -> NamingOptions {
        let n = &self.naming;
        NamingOptions {
            mode: if n.library {
                NamingMode::Structured
            } else {
                NamingMode::Flat
            },
            title: n.title.clone().unwrap_or_default(),
            year: n.year,
            kind: n.media_kind.clone(),
            season: n.season,
        }
    }

    /// Pipeline settings for a run using `work_dir` as scratch space
    pub fn pipeline_config(&self, work_dir: &Path) -> PipelineConfig {
        let r = &self.run;
        let mut config = PipelineConfig::new(work_dir, &r.output);
        config.templates = r.templates.clone();
        config.split = r.split;
        config.split_spec = r.split_spec.clone();
        config.analyze = !r.no_analyze;
        config.lower_priority = r.lower_priority;
        config.report_interval = r.report_interval;
        config.naming = self.naming_options();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MediaKind;
    use crate::utils::logging::{LogFormat, LogLevel};
    use clap::CommandFactory;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["reelwright", "a.mkv"]).unwrap();
        assert_eq!(cli.run.inputs, vec![PathBuf::from("a.mkv")]);
        assert_eq!(cli.run.output, PathBuf::from("reelwright-output"));
        assert_eq!(cli.naming.episode, 1);
        assert_eq!(cli.naming.season, 1);
        assert_eq!(cli.logging.log_level, LogLevel::Info);

        let config = cli.pipeline_config(Path::new("/tmp/work"));
        assert!(config.analyze);
        assert!(!config.split);
        assert_eq!(config.split_spec, "chapters:all");
        assert_eq!(config.report_interval, Duration::from_secs(1));
        assert_eq!(config.naming.mode, NamingMode::Flat);
    }

    #[test]
    fn test_full_invocation() {
        let cli = Cli::try_parse_from([
            "reelwright",
            "disc1.mkv",
            "disc2.mkv",
            "--split",
            "--template",
            "base.yaml",
            "-t",
            "hevc.toml",
            "--library",
            "--title",
            "Show",
            "--year",
            "2020",
            "--media-kind",
            "show",
            "--season",
            "2",
            "--episode",
            "5",
            "--no-analyze",
            "--lower-priority",
            "--report-interval",
            "2.5",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.run.inputs.len(), 2);
        assert_eq!(cli.logging_config().format, LogFormat::Json);

        let config = cli.pipeline_config(Path::new("/tmp/work"));
        assert_eq!(
            config.templates,
            vec![PathBuf::from("base.yaml"), PathBuf::from("hevc.toml")]
        );
        assert!(config.split);
        assert!(!config.analyze);
        assert!(config.lower_priority);
        assert_eq!(config.report_interval, Duration::from_millis(2500));
        assert_eq!(
            config.naming,
            NamingOptions {
                mode: NamingMode::Structured,
                title: "Show".to_string(),
                year: 2020,
                kind: MediaKind::Episodic,
                season: 2,
            }
        );
        assert_eq!(cli.naming.episode, 5);
    }

    #[test]
    fn test_library_requires_title() {
        assert!(Cli::try_parse_from(["reelwright", "a.mkv", "--library"]).is_err());
    }

    #[test]
    fn test_inputs_required() {
        assert!(Cli::try_parse_from(["reelwright"]).is_err());
    }
}
