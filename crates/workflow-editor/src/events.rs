//! Outbound change notifications
//!
//! Every edit that reaches the workflow produces one `WorkflowChange`
//! carrying the complete new workflow and what caused it.

use serde::Serialize;
use workflow_types::{EdgeId, NodeId, Workflow};

/// What produced a workflow change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChangeCause {
    #[serde(rename_all = "camelCase")]
    EdgeConnected { edge_id: EdgeId },
    /// A node change batch; `moved` lists nodes whose position changed
    NodesChanged { moved: Vec<NodeId> },
    #[serde(rename_all = "camelCase")]
    EdgesRemoved { edge_ids: Vec<EdgeId> },
    #[serde(rename_all = "camelCase")]
    NodeDropped { node_id: NodeId },
    /// The host replaced the workflow wholesale
    Replaced,
    /// History stepped back over `reverted`
    Undo { reverted: Box<ChangeCause> },
    /// History stepped forward over `reapplied`
    Redo { reapplied: Box<ChangeCause> },
}

/// A complete new workflow value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowChange {
    pub workflow: Workflow,
    pub cause: ChangeCause,
}

impl WorkflowChange {
    pub fn new(workflow: Workflow, cause: ChangeCause) -> Self {
        Self { workflow, cause }
    }
}

/// Receiver of workflow changes
pub trait ChangeListener {
    fn workflow_changed(&mut self, change: &WorkflowChange);
}

impl<F> ChangeListener for F
where
    F: FnMut(&WorkflowChange),
{
    fn workflow_changed(&mut self, change: &WorkflowChange) {
        self(change)
    }
}

/// Listener that records every change, for tests and replay
#[derive(Debug, Default)]
pub struct VecChangeListener {
    pub changes: Vec<WorkflowChange>,
}

impl ChangeListener for VecChangeListener {
    fn workflow_changed(&mut self, change: &WorkflowChange) {
        self.changes.push(change.clone());
    }
}
