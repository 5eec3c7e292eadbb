//! The graph widget's own node/edge model and change batches
//!
//! Canvas nodes carry a merged data bag: the workflow node's data plus its
//! discriminant under `nodeType` and its config under `config`. Change
//! batches are applied to the widget lists the way the widget does it,
//! in order, one change at a time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use workflow_types::{
    EdgeData, EdgeId, NodeConfig, NodeId, NodeType, Position, Result, WorkflowEdge, WorkflowNode,
};

/// Key holding the discriminant inside a canvas node's data bag
pub const NODE_TYPE_KEY: &str = "nodeType";

/// Key holding the node config inside a canvas node's data bag
pub const CONFIG_KEY: &str = "config";

/// A node as the graph widget holds it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    pub id: NodeId,
    /// Renderer key; always the node's discriminant
    #[serde(rename = "type")]
    pub kind: NodeType,
    pub position: Position,
    pub data: Map<String, Value>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub dragging: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl CanvasNode {
    /// Project a workflow node into the widget model
    pub fn from_workflow_node(node: &WorkflowNode) -> Self {
        let mut data = node.data_bag();
        data.insert(NODE_TYPE_KEY.to_string(), Value::String(node.node_type().as_str().to_string()));
        data.insert(
            CONFIG_KEY.to_string(),
            serde_json::to_value(&node.config).unwrap_or_default(),
        );

        Self {
            id: node.id.clone(),
            kind: node.node_type(),
            position: node.position,
            data,
            selected: false,
            dragging: false,
            width: None,
            height: None,
        }
    }

    /// The config embedded in the data bag, or an empty one
    pub fn config(&self) -> NodeConfig {
        match self.data.get(CONFIG_KEY) {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|err| {
                log::warn!("Ignoring malformed config on canvas node '{}': {}", self.id, err);
                NodeConfig::default()
            }),
            None => NodeConfig::default(),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.data.get("label").and_then(Value::as_str)
    }

    /// Map back to a workflow node at `position`
    pub fn to_workflow_node_at(&self, position: Position) -> Result<WorkflowNode> {
        WorkflowNode::from_parts(self.id.clone(), self.kind, position, self.data.clone(), self.config())
    }
}

/// An edge as the graph widget holds it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EdgeData>,
    #[serde(default)]
    pub selected: bool,
}

impl CanvasEdge {
    pub fn from_workflow_edge(edge: &WorkflowEdge) -> Self {
        Self {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            source_handle: edge.source_handle.clone(),
            target_handle: edge.target_handle.clone(),
            edge_type: edge.edge_type.clone(),
            data: edge.data.clone(),
            selected: false,
        }
    }

    pub fn to_workflow_edge(&self) -> WorkflowEdge {
        WorkflowEdge {
            id: self.id.clone(),
            source: self.source.clone(),
            target: self.target.clone(),
            source_handle: self.source_handle.clone(),
            target_handle: self.target_handle.clone(),
            edge_type: self.edge_type.clone(),
            data: self.data.clone(),
        }
    }
}

/// A new edge drawn between two handles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }
}

/// Screen-space bounding box of the drop target
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Change reported by the widget for a single node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    Position {
        id: NodeId,
        position: Option<Position>,
        dragging: Option<bool>,
    },
    Select {
        id: NodeId,
        selected: bool,
    },
    Dimensions {
        id: NodeId,
        width: f64,
        height: f64,
    },
    Remove {
        id: NodeId,
    },
    Add {
        node: CanvasNode,
        index: Option<usize>,
    },
    Replace {
        id: NodeId,
        node: CanvasNode,
    },
}

impl NodeChange {
    /// A finished move to `position`
    pub fn moved(id: impl Into<String>, position: Position) -> Self {
        NodeChange::Position {
            id: id.into(),
            position: Some(position),
            dragging: Some(false),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            NodeChange::Position { id, .. }
            | NodeChange::Select { id, .. }
            | NodeChange::Dimensions { id, .. }
            | NodeChange::Remove { id }
            | NodeChange::Replace { id, .. } => id,
            NodeChange::Add { node, .. } => &node.id,
        }
    }
}

/// Change reported by the widget for a single edge
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeChange {
    Select { id: EdgeId, selected: bool },
    Remove { id: EdgeId },
    Add { edge: CanvasEdge, index: Option<usize> },
    Replace { id: EdgeId, edge: CanvasEdge },
}

impl EdgeChange {
    pub fn id(&self) -> &str {
        match self {
            EdgeChange::Select { id, .. } | EdgeChange::Remove { id } | EdgeChange::Replace { id, .. } => id,
            EdgeChange::Add { edge, .. } => &edge.id,
        }
    }
}

/// Apply a node change batch to the widget list
pub fn apply_node_changes(changes: &[NodeChange], nodes: &mut Vec<CanvasNode>) {
    for change in changes {
        match change {
            NodeChange::Add { node, index } => match index {
                Some(i) if *i <= nodes.len() => nodes.insert(*i, node.clone()),
                _ => nodes.push(node.clone()),
            },
            NodeChange::Remove { id } => nodes.retain(|n| &n.id != id),
            NodeChange::Replace { id, node } => {
                if let Some(slot) = nodes.iter_mut().find(|n| &n.id == id) {
                    *slot = node.clone();
                }
            }
            NodeChange::Position { id, position, dragging } => {
                if let Some(node) = nodes.iter_mut().find(|n| &n.id == id) {
                    if let Some(position) = position {
                        node.position = *position;
                    }
                    if let Some(dragging) = dragging {
                        node.dragging = *dragging;
                    }
                }
            }
            NodeChange::Select { id, selected } => {
                if let Some(node) = nodes.iter_mut().find(|n| &n.id == id) {
                    node.selected = *selected;
                }
            }
            NodeChange::Dimensions { id, width, height } => {
                if let Some(node) = nodes.iter_mut().find(|n| &n.id == id) {
                    node.width = Some(*width);
                    node.height = Some(*height);
                }
            }
        }
    }
}

/// Apply an edge change batch to the widget list
pub fn apply_edge_changes(changes: &[EdgeChange], edges: &mut Vec<CanvasEdge>) {
    for change in changes {
        match change {
            EdgeChange::Add { edge, index } => match index {
                Some(i) if *i <= edges.len() => edges.insert(*i, edge.clone()),
                _ => edges.push(edge.clone()),
            },
            EdgeChange::Remove { id } => edges.retain(|e| &e.id != id),
            EdgeChange::Replace { id, edge } => {
                if let Some(slot) = edges.iter_mut().find(|e| &e.id == id) {
                    *slot = edge.clone();
                }
            }
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = edges.iter_mut().find(|e| &e.id == id) {
                    edge.selected = *selected;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f64) -> CanvasNode {
        CanvasNode::from_workflow_node(
            &WorkflowNode::new(id, NodeType::Timer, Position::new(x, 0.0)).with_label(id),
        )
    }

    #[test]
    fn test_merged_bag_carries_type_and_config() {
        let workflow_node = WorkflowNode::new("t1", NodeType::Timer, Position::new(5.0, 6.0))
            .with_label("Wait")
            .with_config(NodeConfig::with_validity(false));
        let canvas = CanvasNode::from_workflow_node(&workflow_node);

        assert_eq!(canvas.kind, NodeType::Timer);
        assert_eq!(canvas.data[NODE_TYPE_KEY], "timer");
        assert_eq!(canvas.data[CONFIG_KEY]["isValid"], false);
        assert_eq!(canvas.label(), Some("Wait"));
        assert!(!canvas.config().is_valid());

        let back = canvas.to_workflow_node_at(canvas.position).unwrap();
        assert_eq!(back, workflow_node);
    }

    #[test]
    fn test_missing_config_maps_to_empty() {
        let mut canvas = node("a", 0.0);
        canvas.data.remove(CONFIG_KEY);
        assert_eq!(canvas.config(), NodeConfig::default());
    }

    #[test]
    fn test_apply_node_changes_in_order() {
        let mut nodes = vec![node("a", 0.0), node("b", 10.0)];
        apply_node_changes(
            &[
                NodeChange::Select { id: "a".into(), selected: true },
                NodeChange::moved("b", Position::new(50.0, 60.0)),
                NodeChange::Add { node: node("c", 20.0), index: Some(0) },
                NodeChange::Remove { id: "a".into() },
                NodeChange::Dimensions { id: "c".into(), width: 150.0, height: 40.0 },
                NodeChange::Select { id: "ghost".into(), selected: true },
            ],
            &mut nodes,
        );

        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(nodes[1].position, Position::new(50.0, 60.0));
        assert_eq!(nodes[0].width, Some(150.0));
    }

    #[test]
    fn test_position_without_coordinates_keeps_position() {
        let mut nodes = vec![node("a", 7.0)];
        apply_node_changes(
            &[NodeChange::Position { id: "a".into(), position: None, dragging: Some(true) }],
            &mut nodes,
        );
        assert_eq!(nodes[0].position, Position::new(7.0, 0.0));
        assert!(nodes[0].dragging);
    }

    #[test]
    fn test_apply_edge_changes() {
        let edge = |id: &str| CanvasEdge::from_workflow_edge(&WorkflowEdge::new(id, "a", "b"));
        let mut edges = vec![edge("e1"), edge("e2")];

        apply_edge_changes(
            &[
                EdgeChange::Select { id: "e2".into(), selected: true },
                EdgeChange::Remove { id: "e1".into() },
                EdgeChange::Add { edge: edge("e3"), index: None },
            ],
            &mut edges,
        );

        let ids: Vec<&str> = edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e2", "e3"]);
        assert!(edges[0].selected);
        assert_eq!(EdgeChange::Remove { id: "x".into() }.id(), "x");
    }
}
