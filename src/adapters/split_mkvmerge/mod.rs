//! mkvmerge split adapter
//!
//! Splits an input into episode files with `mkvmerge --split`. mkvmerge names its outputs
//! `episode-001.mkv`, `episode-002.mkv` and so on next to the requested output name.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::domain::errors::*;
use crate::engine::ToolCommand;
use crate::ports::*;

const MKVMERGE: &str = "mkvmerge";
const EPISODE_STEM: &str = "episode";

/// Split on every chapter boundary
pub const DEFAULT_SPLIT_SPEC: &str = "chapters:all";

/// Destination for mkvmerge's progress chatter
pub type LogSink = Arc<Mutex<Box<dyn Write + Send>>>;

/// mkvmerge-based split adapter
pub struct MkvmergeSplitAdapter {
    program: PathBuf,
    work_dir: PathBuf,
    split_spec: String,
    lower_priority: bool,
    log_sink: LogSink,
    cancel: CancellationToken,
}

impl MkvmergeSplitAdapter {
    /// Split into subdirectories of `work_dir`. Tool output is discarded.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from(MKVMERGE),
            work_dir: work_dir.into(),
            split_spec: DEFAULT_SPLIT_SPEC.to_string(),
            lower_priority: false,
            log_sink: Arc::new(Mutex::new(Box::new(io::sink()))),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_program(mut self, program: impl AsRef<Path>) -> Self {
        self.program = program.as_ref().to_path_buf();
        self
    }

    /// Value passed to `--split`, e.g. `chapters:3,6` or `timestamps:00:22:00`
    pub fn with_split_spec(mut self, spec: impl Into<String>) -> Self {
        self.split_spec = spec.into();
        self
    }

    pub fn with_lower_priority(mut self, lower: bool) -> Self {
        self.lower_priority = lower;
        self
    }

    /// Send mkvmerge's stdout to `sink` instead of discarding it
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = sink;
        self
    }

    /// Token that aborts a running split
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Per-input output directory, so inputs never share episode names
    fn output_dir(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        self.work_dir.join(format!("{}-split", stem))
    }

    fn command(&self, input: &Path, output: &Path) -> ToolCommand {
        ToolCommand::new(MKVMERGE, &self.program)
            .arg("-o")
            .arg(output.as_os_str())
            .arg("--split")
            .arg(self.split_spec.as_str())
            .arg(input.as_os_str())
            .lower_priority(self.lower_priority)
    }

    fn write_log(&self, bytes: &[u8]) {
        match self.log_sink.lock() {
            Ok(mut sink) => {
                if let Err(e) = sink.write_all(bytes).and_then(|_| sink.flush()) {
                    debug!(err = %e, "failed to write mkvmerge output to log sink");
                }
            }
            Err(_) => debug!("mkvmerge log sink is poisoned"),
        }
    }
}

#[async_trait]
impl SplitPort for MkvmergeSplitAdapter {
    async fn split(&self, input: &Path) -> Result<Vec<PathBuf>, DomainError> {
        let dir = self.output_dir(input);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::resource(format!("failed to create {}", dir.display()), e))?;

        let output = dir.join(format!("{}.mkv", EPISODE_STEM));
        info!(input = %input.display(), split = %self.split_spec, "splitting video");

        let command = self.command(input, &output);
        let result = command.output(&self.cancel).await?;
        self.write_log(&result.stdout);

        // 1 means finished with warnings
        match result.exit_code() {
            Some(0) => {}
            Some(1) => warn!(input = %input.display(), "mkvmerge finished with warnings"),
            _ => return Err(command.failure(&result)),
        }

        let files = collect_split_outputs(&dir)?;
        if files.is_empty() {
            return Err(DomainError::ToolFailed {
                tool: MKVMERGE,
                status: "no output files".to_string(),
                output: result.combined(),
            });
        }

        info!(count = files.len(), "split produced episode files");
        Ok(files)
    }
}

/// Split outputs in `dir`, ordered by their episode number
pub fn collect_split_outputs(dir: &Path) -> Result<Vec<PathBuf>, DomainError> {
    let mut numbered = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            DomainError::resource(
                format!("failed to read {}", dir.display()),
                e.into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory walk failed")),
            )
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(number) = split_index(entry.path()) {
            numbered.push((number, entry.into_path()));
        }
    }

    numbered.sort_by_key(|(number, _)| *number);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

/// `episode-012.mkv` -> 12
fn split_index(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != "mkv" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(EPISODE_STEM)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_split_index() {
        assert_eq!(split_index(Path::new("/w/episode-001.mkv")), Some(1));
        assert_eq!(split_index(Path::new("episode-1000.mkv")), Some(1000));
        assert_eq!(split_index(Path::new("episode.mkv")), None);
        assert_eq!(split_index(Path::new("episode-001.mp4")), None);
        assert_eq!(split_index(Path::new("episode-abc.mkv")), None);
    }

    #[test]
    fn test_collect_split_outputs_orders_numerically() {
        let dir = TempDir::new().unwrap();
        for name in [
            "episode-010.mkv",
            "episode-002.mkv",
            "episode-001.mkv",
            "episode.mkv",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("episode-003.mkv")).unwrap();

        let files = collect_split_outputs(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["episode-001.mkv", "episode-002.mkv", "episode-010.mkv"]);
    }

    #[test]
    fn test_output_dir_is_per_input() {
        let adapter = MkvmergeSplitAdapter::new("/work");
        assert_eq!(
            adapter.output_dir(Path::new("/media/Disc 1.mkv")),
            PathBuf::from("/work/Disc 1-split")
        );
    }

    #[test]
    fn test_log_sink_receives_output() {
        let buffer: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));

        struct Shared(Arc<Mutex<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let sink: LogSink = Arc::new(Mutex::new(Box::new(Shared(Arc::clone(&buffer)))));
        let adapter = MkvmergeSplitAdapter::new("/work").with_log_sink(sink);
        adapter.write_log(b"Progress: 100%\n");

        assert_eq!(buffer.lock().unwrap().as_slice(), b"Progress: 100%\n");
    }

    #[tokio::test]
    async fn test_missing_binary_reports_unavailable() {
        let work = TempDir::new().unwrap();
        let adapter =
            MkvmergeSplitAdapter::new(work.path()).with_program("mkvmerge_not_installed_reelwright");
        let err = adapter.split(Path::new("in.mkv")).await.unwrap_err();
        assert!(matches!(err, DomainError::ToolUnavailable { tool: "mkvmerge", .. }));
    }
}
