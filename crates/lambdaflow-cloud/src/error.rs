//! Deployment error types

use thiserror::Error;

/// Errors raised while provisioning
///
/// A query that finds nothing is not an error: the command gateway reports it
/// as [`CommandOutcome::Absent`](crate::CommandOutcome::Absent).
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("{program} {action} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        action: String,
        status: String,
        stderr: String,
    },

    #[error("{0} not found. Please install it and make sure it is on PATH")]
    ProgramNotFound(String),

    #[error("{field} is already set to '{existing}', refusing to overwrite with '{attempted}'")]
    FieldConflict {
        field: &'static str,
        existing: String,
        attempted: String,
    },

    #[error("Packaging failed: {0}")]
    Package(String),

    #[error("Aborted by user: {0}")]
    UserAbort(String),

    #[error("Configuration error: {0}")]
    Config(#[from] lambdaflow_config::ConfigError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloudError {
    /// True for failures reported by (or while talking to) the provider CLI
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            CloudError::CommandFailed { .. }
                | CloudError::ProgramNotFound(_)
                | CloudError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
