//! Core workflow data model
//!
//! Defines the `Workflow` aggregate with its nodes, edges, metadata and
//! lifecycle status. Nodes are a tagged variant: the `type` discriminant
//! selects the shape of the node's `data` bag, and that shape is checked
//! whenever a node is loaded from JSON or rebuilt from an editor bag.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::TriggerConfig;
use crate::error::{Result, WorkflowError};
use crate::nodes::NodeDetails;

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// A point on the canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Discriminant identifying which node variant a node is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Receives data from an external service
    Webhook,
    /// Makes an HTTP request
    ApiCall,
    /// Branches on a condition
    Condition,
    /// Delays or schedules
    Timer,
    /// Maps and transforms data between steps
    DataTransform,
    /// Repeats a section of the graph
    Loop,
}

impl NodeType {
    /// Every node type, in palette order
    pub const ALL: [NodeType; 6] = [
        NodeType::Webhook,
        NodeType::ApiCall,
        NodeType::Condition,
        NodeType::Timer,
        NodeType::DataTransform,
        NodeType::Loop,
    ];

    /// The wire discriminant (e.g. "api_call")
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Webhook => "webhook",
            NodeType::ApiCall => "api_call",
            NodeType::Condition => "condition",
            NodeType::Timer => "timer",
            NodeType::DataTransform => "data_transform",
            NodeType::Loop => "loop",
        }
    }

    /// Uppercased display name with the first underscore replaced ("API CALL")
    pub fn display_name(&self) -> String {
        self.as_str().replacen('_', " ", 1).to_uppercase()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WorkflowError::UnknownNodeType(s.to_string()))
    }
}

/// Per-node configuration bag
///
/// `is_valid` is tri-state on purpose: only an explicit `false` marks a
/// node invalid. The error list is independent of the flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeConfig {
    /// Config carrying only a validity flag
    pub fn with_validity(is_valid: bool) -> Self {
        Self {
            is_valid: Some(is_valid),
            ..Self::default()
        }
    }

    /// Absent or `true` counts as valid
    pub fn is_valid(&self) -> bool {
        self.is_valid != Some(false)
    }

    /// Whether the error list is present and non-empty
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }
}

/// A node instance in a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWorkflowNode", into = "RawWorkflowNode")]
pub struct WorkflowNode {
    /// Unique identifier for this node
    pub id: NodeId,
    /// Position on the canvas
    pub position: Position,
    /// Display label
    pub label: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Variant-specific data, tagged by node type
    pub details: NodeDetails,
    /// Validation state and extra configuration
    pub config: NodeConfig,
}

impl WorkflowNode {
    /// Create an unconfigured node of the given type
    pub fn new(id: impl Into<String>, node_type: NodeType, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            label: None,
            description: None,
            details: NodeDetails::empty(node_type),
            config: NodeConfig::default(),
        }
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the config
    pub fn with_config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the variant details
    pub fn with_details(mut self, details: NodeDetails) -> Self {
        self.details = details;
        self
    }

    /// The node's discriminant
    pub fn node_type(&self) -> NodeType {
        self.details.node_type()
    }

    /// Rebuild a node from an open data bag
    ///
    /// `label` and `description` are lifted out of the bag, the editor-only
    /// keys `nodeType` and `config` are dropped, and the remainder must match
    /// the variant shape selected by `node_type`.
    pub fn from_parts(
        id: impl Into<String>,
        node_type: NodeType,
        position: Position,
        mut data: Map<String, Value>,
        config: NodeConfig,
    ) -> Result<Self> {
        let id = id.into();
        let label = take_string(&mut data, "label")
            .map_err(|source| WorkflowError::invalid_node_data(id.clone(), source))?;
        let description = take_string(&mut data, "description")
            .map_err(|source| WorkflowError::invalid_node_data(id.clone(), source))?;
        data.remove("nodeType");
        data.remove("config");

        let details = NodeDetails::from_value(node_type, Value::Object(data))
            .map_err(|source| WorkflowError::invalid_node_data(id.clone(), source))?;

        Ok(Self {
            id,
            position,
            label,
            description,
            details,
            config,
        })
    }

    /// The node's data as an open bag: label, description and variant fields
    pub fn data_bag(&self) -> Map<String, Value> {
        let mut bag = Map::new();
        if let Some(label) = &self.label {
            bag.insert("label".to_string(), Value::String(label.clone()));
        }
        if let Some(description) = &self.description {
            bag.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Value::Object(fields) = self.details.to_value() {
            bag.extend(fields);
        }
        bag
    }
}

// `null` counts as absent; any other non-string is rejected
fn take_string(data: &mut Map<String, Value>, key: &str) -> serde_json::Result<Option<String>> {
    match data.remove(key) {
        Some(value) => serde_json::from_value(value),
        None => Ok(None),
    }
}

/// Wire form of a node: `{ id, type, position, data, config }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWorkflowNode {
    id: NodeId,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    config: NodeConfig,
}

impl TryFrom<RawWorkflowNode> for WorkflowNode {
    type Error = WorkflowError;

    fn try_from(raw: RawWorkflowNode) -> Result<Self> {
        let node_type = raw.node_type.parse()?;
        WorkflowNode::from_parts(raw.id, node_type, raw.position, raw.data, raw.config)
    }
}

impl From<WorkflowNode> for RawWorkflowNode {
    fn from(node: WorkflowNode) -> Self {
        Self {
            data: node.data_bag(),
            node_type: node.node_type().as_str().to_string(),
            id: node.id,
            position: node.position,
            config: node.config,
        }
    }
}

/// Optional data carried on an edge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    /// Named handle on the source node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Named handle on the target node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    /// Edge kind tag
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EdgeData>,
}

impl WorkflowEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            edge_type: None,
            data: None,
        }
    }
}

/// Lifecycle status of a workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Inactive,
    Archived,
}

/// Descriptive metadata for a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version counter (not incremented by the editor)
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// The root graph object being edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Unique identifier for this workflow
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Nodes in the graph
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    /// Edges connecting nodes (serialized under the key `edge`)
    #[serde(rename = "edge", default)]
    pub edges: Vec<WorkflowEdge>,
    pub metadata: WorkflowMetadata,
    #[serde(default)]
    pub status: WorkflowStatus,
    /// What starts a run of this workflow
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

impl Workflow {
    /// Create an empty draft workflow
    ///
    /// Both timestamps are stamped with `now`.
    pub fn draft(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            name: name.clone(),
            nodes: Vec::new(),
            edges: Vec::new(),
            metadata: WorkflowMetadata {
                name,
                description: Some(description.into()),
                version: 1,
                created_at: now,
                updated_at: now,
                created_by: author.into(),
                tags: None,
            },
            status: WorkflowStatus::Draft,
            triggers: Vec::new(),
        }
    }

    /// Parse a workflow from JSON, checking every node against its variant shape
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut WorkflowNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Find an edge by ID
    pub fn find_edge(&self, id: &str) -> Option<&WorkflowEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.find_node(id).is_some()
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.find_edge(id).is_some()
    }

    /// Get edges coming into a node
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a WorkflowEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a WorkflowEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Get the IDs of upstream nodes
    pub fn get_dependencies(&self, node_id: &str) -> Vec<NodeId> {
        self.incoming_edges(node_id).map(|e| e.source.clone()).collect()
    }

    /// Get the IDs of downstream nodes
    pub fn get_dependents(&self, node_id: &str) -> Vec<NodeId> {
        self.outgoing_edges(node_id).map(|e| e.target.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{ApiCallNodeData, HttpMethod};
    use serde_json::json;

    fn sample_json() -> Value {
        json!({
            "id": "wf-1",
            "name": "Orders",
            "nodes": [
                {
                    "id": "hook",
                    "type": "webhook",
                    "position": {"x": 0.0, "y": 0.0},
                    "data": {"label": "Stripe", "service": "stripe", "endpoint": "/hooks/stripe"},
                    "config": {"isValid": true}
                },
                {
                    "id": "call",
                    "type": "api_call",
                    "position": {"x": 200.0, "y": 0.0},
                    "data": {"method": "POST", "url": "https://api.example.com", "color": "blue"},
                    "config": {"errors": ["missing auth"], "owner": "ops"}
                }
            ],
            "edge": [
                {"id": "e1", "source": "hook", "target": "call", "type": "default"}
            ],
            "metadata": {
                "name": "Orders",
                "version": 3,
                "createdAt": "2026-01-01T00:00:00Z",
                "updatedAt": "2026-01-02T00:00:00Z",
                "createdBy": "ops"
            },
            "status": "active",
            "triggers": []
        })
    }

    #[test]
    fn test_node_type_round_trip_names() {
        assert_eq!(NodeType::ApiCall.as_str(), "api_call");
        assert_eq!("data_transform".parse::<NodeType>().unwrap(), NodeType::DataTransform);
        assert!(matches!(
            "mystery".parse::<NodeType>(),
            Err(WorkflowError::UnknownNodeType(t)) if t == "mystery"
        ));
        assert_eq!(NodeType::DataTransform.display_name(), "DATA TRANSFORM");
        assert_eq!(NodeType::Timer.to_string(), "timer");
    }

    #[test]
    fn test_node_config_validity_is_asymmetric() {
        assert!(NodeConfig::default().is_valid());
        assert!(NodeConfig::with_validity(true).is_valid());
        assert!(!NodeConfig::with_validity(false).is_valid());

        let mut config = NodeConfig::with_validity(true);
        assert!(!config.has_errors());
        config.errors = Some(vec![]);
        assert!(!config.has_errors());
        config.errors = Some(vec!["bad url".to_string()]);
        assert!(config.has_errors());
        assert!(config.is_valid());
    }

    #[test]
    fn test_workflow_parses_typed_nodes() {
        let workflow: Workflow = serde_json::from_value(sample_json()).unwrap();

        assert_eq!(workflow.nodes.len(), 2);
        assert_eq!(workflow.edges.len(), 1);
        assert_eq!(workflow.status, WorkflowStatus::Active);

        let call = workflow.find_node("call").unwrap();
        assert_eq!(call.node_type(), NodeType::ApiCall);
        match &call.details {
            NodeDetails::ApiCall(ApiCallNodeData { method, url, extra, .. }) => {
                assert_eq!(*method, Some(HttpMethod::Post));
                assert_eq!(url.as_deref(), Some("https://api.example.com"));
                assert_eq!(extra.get("color"), Some(&json!("blue")));
            }
            other => panic!("Expected api_call details, got {:?}", other),
        }
        assert_eq!(call.config.extra.get("owner"), Some(&json!("ops")));

        let hook = workflow.find_node("hook").unwrap();
        assert_eq!(hook.label.as_deref(), Some("Stripe"));
    }

    #[test]
    fn test_workflow_serializes_edge_key() {
        let workflow: Workflow = serde_json::from_value(sample_json()).unwrap();
        let value = serde_json::to_value(&workflow).unwrap();

        assert!(value.get("edge").is_some());
        assert!(value.get("edges").is_none());
        assert_eq!(value["nodes"][1]["type"], "api_call");
        assert_eq!(value["nodes"][1]["data"]["color"], "blue");
        assert_eq!(value["nodes"][0]["data"]["label"], "Stripe");

        let reparsed: Workflow = serde_json::from_value(value).unwrap();
        assert_eq!(reparsed, workflow);
    }

    #[test]
    fn test_mismatched_data_is_rejected() {
        let mut value = sample_json();
        value["nodes"][1]["data"]["method"] = json!("FETCH");
        let err = Workflow::from_json(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("call"));

        let mut value = sample_json();
        value["nodes"][0]["type"] = json!("teleport");
        assert!(Workflow::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn test_from_parts_strips_editor_keys() {
        let data = json!({
            "label": "Wait",
            "nodeType": "timer",
            "config": {"isValid": true},
            "duration": 5.0,
            "unit": "minutes"
        });
        let Value::Object(data) = data else { unreachable!() };

        let node = WorkflowNode::from_parts(
            "t1",
            NodeType::Timer,
            Position::new(1.0, 2.0),
            data,
            NodeConfig::default(),
        )
        .unwrap();

        assert_eq!(node.label.as_deref(), Some("Wait"));
        let bag = node.data_bag();
        assert!(!bag.contains_key("nodeType"));
        assert!(!bag.contains_key("config"));
        assert_eq!(bag["unit"], "minutes");
    }

    #[test]
    fn test_non_string_label_is_rejected() {
        let mut value = sample_json();
        value["nodes"][0]["data"]["label"] = json!(5);

        let err = Workflow::from_json(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("hook"));

        let Value::Object(data) = json!({"description": ["not", "text"]}) else { unreachable!() };
        let err = WorkflowNode::from_parts("t1", NodeType::Timer, Position::default(), data, NodeConfig::default())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidNodeData { node_id, .. } if node_id == "t1"));
    }

    #[test]
    fn test_sparse_data_round_trips_unchanged() {
        let mut value = sample_json();
        value["nodes"][0]["data"] = json!({"label": "Hook"});

        let workflow = Workflow::from_json(&value.to_string()).unwrap();
        let written = serde_json::to_value(&workflow).unwrap();
        assert_eq!(written["nodes"][0]["data"], json!({"label": "Hook"}));
        assert_eq!(written["nodes"][1]["data"], value["nodes"][1]["data"]);
    }

    #[test]
    fn test_draft_factory_stamps_both_timestamps() {
        let now = Utc::now();
        let workflow = Workflow::draft("wf", "Flow", "desc", "me", now);

        assert_eq!(workflow.metadata.created_at, now);
        assert_eq!(workflow.metadata.updated_at, now);
        assert_eq!(workflow.metadata.version, 1);
        assert_eq!(workflow.status, WorkflowStatus::Draft);
        assert!(workflow.nodes.is_empty());
        assert!(workflow.edges.is_empty());
        assert!(workflow.triggers.is_empty());
    }

    #[test]
    fn test_graph_queries() {
        let workflow: Workflow = serde_json::from_value(sample_json()).unwrap();

        assert_eq!(workflow.get_dependencies("call"), vec!["hook"]);
        assert_eq!(workflow.get_dependents("hook"), vec!["call"]);
        assert!(workflow.contains_edge("e1"));
        assert!(!workflow.contains_node("nope"));
    }
}
