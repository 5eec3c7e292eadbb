//! Error types for the workflow data model

use thiserror::Error;

/// Result type alias using WorkflowError
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors raised while converting or loading workflow data
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A node type discriminant outside the fixed catalog
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// A node's data bag does not match the shape its type requires
    #[error("Invalid data for node '{node_id}': {source}")]
    InvalidNodeData {
        node_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkflowError {
    /// Create an invalid-data error for a node
    pub fn invalid_node_data(node_id: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidNodeData {
            node_id: node_id.into(),
            source,
        }
    }
}
