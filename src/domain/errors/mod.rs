// Domain errors - Error types for the domain layer

use std::path::PathBuf;
use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug)]
pub enum DomainError {
    /// Option block names a codec or format with no matching variant
    #[error("unknown codec or format: {value:?}")]
    UnknownCodec { value: String },

    /// Option block could not be decoded into the selected variant
    #[error("invalid {variant} options{}: {message}", field_suffix(.field))]
    OptionDecode {
        variant: &'static str,
        field: Option<String>,
        message: String,
    },

    /// Configuration is malformed or inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// External tool exited unsuccessfully
    #[error("{tool} exited with {status}\noutput from command:\n{output}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        output: String,
    },

    /// External tool could not be started
    #[error("failed to start {tool}: {source}")]
    ToolUnavailable {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Analysis output could not be interpreted
    #[error("analysis of {path} failed: {message}")]
    AnalysisFailed { path: PathBuf, message: String },

    /// A local resource (socket, directory) could not be acquired
    #[error("{context}: {source}")]
    Resource {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Placement would overwrite an output already placed in this run
    #[error("destination {} was already placed in this run", .path.display())]
    DestinationTaken { path: PathBuf },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Wrap an I/O error with a description of the resource involved
    pub fn resource(context: impl Into<String>, source: std::io::Error) -> Self {
        DomainError::Resource {
            context: context.into(),
            source,
        }
    }

    /// Whether this error stems from configuration rather than a collaborator
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            DomainError::UnknownCodec { .. }
                | DomainError::OptionDecode { .. }
                | DomainError::InvalidConfig(_)
        )
    }
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!(" (field `{}`)", f))
        .unwrap_or_default()
}

pub type DomainResult<T> = Result<T, DomainError>;
