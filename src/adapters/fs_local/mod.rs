// Local filesystem adapter - Placement of finished outputs

use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Local filesystem adapter
#[derive(Debug, Default, Clone)]
pub struct LocalFsAdapter;

impl LocalFsAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Prefix long paths so Windows APIs accept them
    #[cfg(windows)]
    fn to_long_path(path: &Path) -> PathBuf {
        let raw = path.to_string_lossy();
        if raw.len() > 260 && path.is_absolute() && !raw.starts_with(r"\\?\") {
            PathBuf::from(format!(r"\\?\{}", raw))
        } else {
            path.to_path_buf()
        }
    }

    #[cfg(not(windows))]
    fn to_long_path(path: &Path) -> PathBuf {
        path.to_path_buf()
    }

    fn copy_blocking(from: &Path, to: &Path) -> io::Result<u64> {
        let source = fs::File::open(from)?;
        let dest = fs::File::create(to)?;

        let mut reader = BufReader::with_capacity(COPY_BUFFER_SIZE, source);
        let mut writer = BufWriter::with_capacity(COPY_BUFFER_SIZE, dest);
        let copied = io::copy(&mut reader, &mut writer)?;
        writer.flush()?;
        Ok(copied)
    }
}

#[async_trait]
impl PlacementPort for LocalFsAdapter {
    async fn create_directory(&self, dir: &Path) -> Result<(), DomainError> {
        tokio::fs::create_dir_all(Self::to_long_path(dir))
            .await
            .map_err(|e| DomainError::resource(format!("failed to create directory {}", dir.display()), e))
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<(), DomainError> {
        let source = Self::to_long_path(from);
        let dest = Self::to_long_path(to);

        let copied = tokio::task::spawn_blocking(move || Self::copy_blocking(&source, &dest))
            .await
            .map_err(|e| DomainError::resource("copy task failed", io::Error::new(io::ErrorKind::Other, e)))?
            .map_err(|e| {
                DomainError::resource(
                    format!("failed to copy {} to {}", from.display(), to.display()),
                    e,
                )
            })?;

        debug!(from = %from.display(), to = %to.display(), bytes = copied, "file copied");
        Ok(())
    }
}
