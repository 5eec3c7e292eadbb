//! Error types for the editor core

use thiserror::Error;
use workflow_types::WorkflowError;

/// Result type alias using EditorError
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors that can occur in the editor core
///
/// Canvas event handlers never fail; these come from history snapshots
/// and workflow loading. Config files report through `ConfigError`.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Workflow data could not be converted or loaded
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),
}
