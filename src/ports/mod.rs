// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for splitting one input into ordered episode files
#[async_trait]
pub trait SplitPort: Send + Sync {
    /// Split `input` and return the produced files in playback order
    async fn split(&self, input: &Path) -> Result<Vec<PathBuf>, DomainError>;
}

/// Port for running one transcode
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Transcode according to `request`, streaming status to `progress_address`.
    ///
    /// Returns the path of the produced artifact. Failures carry the tool's captured output.
    async fn transcode(
        &self,
        request: &TranscodeRequest,
        progress_address: &str,
        cancel: CancellationToken,
    ) -> Result<PathBuf, DomainError>;
}

/// Port for media analysis ahead of a transcode
#[async_trait]
pub trait AnalyzePort: Send + Sync {
    async fn analyze(&self, input: &Path) -> Result<AnalysisResult, DomainError>;
}

/// Port for placing finished outputs
#[async_trait]
pub trait PlacementPort: Send + Sync {
    /// Create `dir` and any missing parents
    async fn create_directory(&self, dir: &Path) -> Result<(), DomainError>;

    /// Copy `from` to `to`, replacing an existing file
    async fn copy_file(&self, from: &Path, to: &Path) -> Result<(), DomainError>;
}
