//! Editing surface: projects a workflow into the widget model and turns
//! widget events back into workflow changes
//!
//! Every handler takes the current external workflow, updates the widget
//! lists, and returns the complete new workflow when the event reaches it.
//! With no external workflow only the widget state moves.

pub mod model;

use std::collections::HashMap;

use workflow_types::{NodeConfig, NodeType, Position, Workflow, WorkflowNode};

use crate::config::{EditorConfig, SyncMode};
use crate::events::{ChangeCause, WorkflowChange};
use crate::ids::IdAllocator;
use crate::node_view::{self, NodeView};
use crate::palette::{DataTransfer, DragEffect};

pub use model::{
    apply_edge_changes, apply_node_changes, CanvasEdge, CanvasNode, Connection, EdgeChange,
    NodeChange, Rect,
};

/// Validity flag given to a freshly dropped node, on both the widget and
/// the workflow side. A dropped node has no configuration yet.
pub const DROPPED_NODE_IS_VALID: bool = false;

/// Edge type assigned to connections drawn on the canvas
pub const CONNECTED_EDGE_TYPE: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasState {
    Uninitialized,
    Initialized,
}

/// A palette item released over the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct DropEvent {
    pub data_transfer: DataTransfer,
    /// Pointer position in client coordinates
    pub client: Position,
    /// Bounding box of the canvas element
    pub bounds: Rect,
}

impl DropEvent {
    /// Canvas-relative drop position
    pub fn canvas_position(&self) -> Position {
        Position::new(self.client.x - self.bounds.x, self.client.y - self.bounds.y)
    }
}

/// Widget events the canvas reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    Connect(Connection),
    NodesChange(Vec<NodeChange>),
    EdgesChange(Vec<EdgeChange>),
    Drop(DropEvent),
}

/// The editing surface
#[derive(Debug)]
pub struct WorkflowCanvas {
    state: CanvasState,
    nodes: Vec<CanvasNode>,
    edges: Vec<CanvasEdge>,
    ids: IdAllocator,
    drag_mime_type: String,
    sync_mode: SyncMode,
}

impl WorkflowCanvas {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            state: CanvasState::Uninitialized,
            nodes: Vec::new(),
            edges: Vec::new(),
            ids: IdAllocator::new(config.id_strategy),
            drag_mime_type: config.drag_mime_type.clone(),
            sync_mode: config.sync_mode,
        }
    }

    pub fn state(&self) -> CanvasState {
        self.state
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    pub fn nodes(&self) -> &[CanvasNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CanvasEdge] {
        &self.edges
    }

    /// Project `workflow` into the widget lists
    ///
    /// Runs once; returns `false` if the canvas was already mounted.
    pub fn mount(&mut self, workflow: Option<&Workflow>) -> bool {
        if self.state == CanvasState::Initialized {
            log::debug!("Canvas already mounted, ignoring mount");
            return false;
        }

        self.project(workflow);
        self.state = CanvasState::Initialized;

        log::debug!(
            "Mounted canvas with {} node(s) and {} edge(s)",
            self.nodes.len(),
            self.edges.len()
        );
        true
    }

    /// Discard widget state and project `workflow` again
    pub fn remount(&mut self, workflow: Option<&Workflow>) {
        self.state = CanvasState::Uninitialized;
        self.ids.reset();
        self.mount(workflow);
    }

    /// Follow an external workflow replacement
    ///
    /// Controlled canvases re-project and keep selection, drag and size
    /// state of surviving ids. Uncontrolled canvases ignore the call.
    /// Returns whether the widget lists were rebuilt.
    pub fn sync(&mut self, workflow: &Workflow) -> bool {
        if self.state != CanvasState::Initialized {
            log::warn!("Ignoring sync on an unmounted canvas");
            return false;
        }
        if self.sync_mode == SyncMode::Uncontrolled {
            log::debug!("Uncontrolled canvas, ignoring sync of '{}'", workflow.id);
            return false;
        }

        let old_nodes: HashMap<String, CanvasNode> =
            self.nodes.drain(..).map(|n| (n.id.clone(), n)).collect();
        let old_edges: HashMap<String, bool> =
            self.edges.drain(..).map(|e| (e.id, e.selected)).collect();

        self.project(Some(workflow));

        for node in &mut self.nodes {
            if let Some(old) = old_nodes.get(&node.id) {
                node.selected = old.selected;
                node.dragging = old.dragging;
                node.width = old.width;
                node.height = old.height;
            }
        }
        for edge in &mut self.edges {
            if let Some(selected) = old_edges.get(&edge.id) {
                edge.selected = *selected;
            }
        }
        true
    }

    fn project(&mut self, workflow: Option<&Workflow>) {
        match workflow {
            Some(workflow) => {
                self.nodes = workflow.nodes.iter().map(CanvasNode::from_workflow_node).collect();
                self.edges = workflow.edges.iter().map(CanvasEdge::from_workflow_edge).collect();
            }
            None => {
                self.nodes.clear();
                self.edges.clear();
            }
        }
    }

    fn is_mounted(&self, event: &str) -> bool {
        if self.state == CanvasState::Initialized {
            true
        } else {
            log::warn!("Ignoring {} on an unmounted canvas", event);
            false
        }
    }

    /// Dispatch a widget event
    pub fn handle(&mut self, event: CanvasEvent, workflow: Option<&Workflow>) -> Option<WorkflowChange> {
        match event {
            CanvasEvent::Connect(connection) => self.on_connect(connection, workflow),
            CanvasEvent::NodesChange(changes) => self.on_nodes_change(&changes, workflow),
            CanvasEvent::EdgesChange(changes) => self.on_edges_change(&changes, workflow),
            CanvasEvent::Drop(event) => self.on_drop(&event, workflow),
        }
    }

    /// A new edge was drawn between two handles
    pub fn on_connect(&mut self, connection: Connection, workflow: Option<&Workflow>) -> Option<WorkflowChange> {
        if !self.is_mounted("connect") {
            return None;
        }

        let edges = &self.edges;
        let id = self.ids.edge_id(|id| {
            edges.iter().any(|e| e.id == id) || workflow.is_some_and(|w| w.contains_edge(id))
        });

        let edge = CanvasEdge {
            id: id.clone(),
            source: connection.source,
            target: connection.target,
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
            edge_type: Some(CONNECTED_EDGE_TYPE.to_string()),
            data: None,
            selected: false,
        };
        log::debug!("Connected {} -> {} as '{}'", edge.source, edge.target, id);

        let workflow_edge = edge.to_workflow_edge();
        self.edges.push(edge);

        let mut updated = workflow?.clone();
        updated.edges.push(workflow_edge);
        Some(WorkflowChange::new(updated, ChangeCause::EdgeConnected { edge_id: id }))
    }

    /// A node change batch from the widget
    ///
    /// The workflow's node list is rebuilt from the nodes as they were
    /// before the batch, with positions from the batch applied. Only
    /// positions reach the workflow.
    pub fn on_nodes_change(&mut self, changes: &[NodeChange], workflow: Option<&Workflow>) -> Option<WorkflowChange> {
        if !self.is_mounted("node changes") {
            return None;
        }

        let before = self.nodes.clone();
        apply_node_changes(changes, &mut self.nodes);

        let workflow = workflow?;

        let mut moved_to: HashMap<&str, Position> = HashMap::new();
        for change in changes {
            if let NodeChange::Position { id, position: Some(position), .. } = change {
                moved_to.insert(id.as_str(), *position);
            }
        }

        let nodes: Vec<WorkflowNode> = before
            .iter()
            .filter_map(|node| {
                let position = moved_to.get(node.id.as_str()).copied().unwrap_or(node.position);
                match node.to_workflow_node_at(position) {
                    Ok(converted) => Some(converted),
                    Err(err) => {
                        log::warn!("Keeping stored node '{}': {}", node.id, err);
                        workflow.find_node(&node.id).cloned().map(|mut existing| {
                            existing.position = position;
                            existing
                        })
                    }
                }
            })
            .collect();

        let moved = before
            .iter()
            .filter(|n| moved_to.contains_key(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();

        let mut updated = workflow.clone();
        updated.nodes = nodes;
        Some(WorkflowChange::new(updated, ChangeCause::NodesChanged { moved }))
    }

    /// An edge change batch from the widget; only removals reach the workflow
    pub fn on_edges_change(&mut self, changes: &[EdgeChange], workflow: Option<&Workflow>) -> Option<WorkflowChange> {
        if !self.is_mounted("edge changes") {
            return None;
        }

        apply_edge_changes(changes, &mut self.edges);

        let removed: Vec<String> = changes
            .iter()
            .filter_map(|change| match change {
                EdgeChange::Remove { id } => Some(id.clone()),
                _ => None,
            })
            .collect();

        if removed.is_empty() {
            return None;
        }

        let mut updated = workflow?.clone();
        updated.edges.retain(|e| !removed.contains(&e.id));
        Some(WorkflowChange::new(updated, ChangeCause::EdgesRemoved { edge_ids: removed }))
    }

    /// A palette drag is hovering the canvas
    pub fn on_drag_over(&self, data_transfer: &mut DataTransfer) {
        data_transfer.drop_effect = DragEffect::Move;
    }

    /// A palette item was released over the canvas
    pub fn on_drop(&mut self, event: &DropEvent, workflow: Option<&Workflow>) -> Option<WorkflowChange> {
        if !self.is_mounted("drop") {
            return None;
        }

        let Some(payload) = event.data_transfer.get_data(&self.drag_mime_type) else {
            log::debug!("Drop without a '{}' payload, ignoring", self.drag_mime_type);
            return None;
        };
        let node_type: NodeType = match payload.parse() {
            Ok(node_type) => node_type,
            Err(err) => {
                log::warn!("Ignoring drop: {}", err);
                return None;
            }
        };

        let nodes = &self.nodes;
        let id = self.ids.node_id(node_type, |id| {
            nodes.iter().any(|n| n.id == id) || workflow.is_some_and(|w| w.contains_node(id))
        });

        let node = WorkflowNode::new(id.clone(), node_type, event.canvas_position())
            .with_label(format!("{} Node", node_type.display_name()))
            .with_config(NodeConfig::with_validity(DROPPED_NODE_IS_VALID));

        log::debug!("Dropped '{}' at ({}, {})", id, node.position.x, node.position.y);
        self.nodes.push(CanvasNode::from_workflow_node(&node));

        let mut updated = workflow?.clone();
        updated.nodes.push(node);
        Some(WorkflowChange::new(updated, ChangeCause::NodeDropped { node_id: id }))
    }

    /// Presentation models for every widget node, in widget order
    pub fn render(&self) -> Vec<NodeView> {
        self.nodes.iter().map(node_view::render).collect()
    }
}
