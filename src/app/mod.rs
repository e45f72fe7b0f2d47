// Application layer - Use case interactors

pub mod container;
pub mod pipeline_interactor;
pub mod transcode_task;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer, PipelineConfig};
pub use pipeline_interactor::{PipelineInteractor, PipelineReport, StageFailure};
pub use transcode_task::{ResolvedOptions, TranscodeOutcome, TranscodeTask};
