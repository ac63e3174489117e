//! Error types for pipeline operations
//!
//! Builder failures surface as [`BuildError`]s; the pipeline wraps them with
//! the stage and enhancer that raised them so a failed run names exactly where
//! generation stopped.

use thiserror::Error;

use crate::error::BuildError;

/// Errors that can occur during a relational build
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Pipeline configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An enhancer failed; the whole run is aborted
    #[error("Stage '{stage}' failed in enhancer '{enhancer}'")]
    StageFailure {
        stage: String,
        enhancer: String,
        #[source]
        source: BuildError,
    },

    /// The finished repository violates a structural invariant
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Create a stage failure with its underlying build error
    pub fn stage(stage: impl Into<String>, enhancer: impl Into<String>, source: BuildError) -> Self {
        Self::StageFailure {
            stage: stage.into(),
            enhancer: enhancer.into(),
            source,
        }
    }

    /// Get the stage name if this is a stage error
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            PipelineError::StageFailure { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::ConfigError(msg) => {
                format!("Configuration error: {msg}\n\nHint: Check the build configuration.")
            }
            PipelineError::StageFailure {
                stage,
                enhancer,
                source,
            } => format!("Stage '{stage}' failed in '{enhancer}': {source}"),
            PipelineError::ValidationFailed(violations) => format!(
                "Generated schema is invalid:\n  {}",
                violations.join("\n  ")
            ),
        }
    }
}
