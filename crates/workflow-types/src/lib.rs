//! Workflow Types - data model for the workflow editor
//!
//! Declares the `Workflow` aggregate and everything hanging off it:
//!
//! - `workflow`: workflow, nodes, edges, metadata and status
//! - `nodes`: the per-type data shapes behind each node variant
//! - `auth`: auth, retry, webhook and trigger configuration
//! - `execution`: execution results, error taxonomies and validation results
//! - `validation`: structural checks producing a `ValidationResult`
//!
//! Nodes are a tagged variant. Loading a workflow from JSON checks each
//! node's `data` against the shape its `type` selects.

pub mod auth;
pub mod error;
pub mod execution;
pub mod nodes;
pub mod validation;
pub mod workflow;

pub use auth::{
    AuthConfig, AuthType, BackoffStrategy, RetryCondition, RetryConditionType, RetryConfig,
    TriggerConfig, TriggerType, WebhookConfig,
};
pub use error::{Result, WorkflowError};
pub use execution::{
    ErrorType, ExecutionContext, ExecutionEnvironment, ExecutionError, ExecutionMetadata,
    ExecutionResult, ExecutionStatus, NodeError, NodeErrorType, NodeExecutionStatus, NodeResult,
    ValidationError, ValidationResult, ValidationType, ValidationWarning,
};
pub use nodes::{
    ApiCallNodeData, ComparisonOperator, Condition, ConditionNodeData, ConditionType,
    DataTransformNodeData, FieldMapping, HttpMethod, LoopNodeData, LoopType, NodeDetails, Schema,
    SchemaType, TimeUnit, TimerNodeData, TimerType, Transformation, TransformationType,
    WebhookNodeData, WebhookService,
};
pub use validation::validate_workflow;
pub use workflow::{
    EdgeData, EdgeId, NodeConfig, NodeId, NodeType, Position, Workflow, WorkflowEdge,
    WorkflowMetadata, WorkflowNode, WorkflowStatus,
};
