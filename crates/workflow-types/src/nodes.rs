//! Variant data shapes for each node type
//!
//! Every top-level field is optional and only serialized when present, so an
//! unconfigured node (for example one just dropped from the palette) loads
//! and writes back exactly the keys it was given. Unknown keys are kept in a
//! flattened `extra` map. Accessors fill in the defaults for readers.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::{AuthConfig, RetryConfig};
use crate::workflow::NodeType;

/// Typed payload of a node, discriminated by node type
#[derive(Debug, Clone, PartialEq)]
pub enum NodeDetails {
    Webhook(WebhookNodeData),
    ApiCall(ApiCallNodeData),
    Condition(ConditionNodeData),
    Timer(TimerNodeData),
    DataTransform(DataTransformNodeData),
    Loop(LoopNodeData),
}

impl NodeDetails {
    /// The discriminant of this payload
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeDetails::Webhook(_) => NodeType::Webhook,
            NodeDetails::ApiCall(_) => NodeType::ApiCall,
            NodeDetails::Condition(_) => NodeType::Condition,
            NodeDetails::Timer(_) => NodeType::Timer,
            NodeDetails::DataTransform(_) => NodeType::DataTransform,
            NodeDetails::Loop(_) => NodeType::Loop,
        }
    }

    /// An unconfigured payload for the given type
    pub fn empty(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Webhook => NodeDetails::Webhook(WebhookNodeData::default()),
            NodeType::ApiCall => NodeDetails::ApiCall(ApiCallNodeData::default()),
            NodeType::Condition => NodeDetails::Condition(ConditionNodeData::default()),
            NodeType::Timer => NodeDetails::Timer(TimerNodeData::default()),
            NodeType::DataTransform => NodeDetails::DataTransform(DataTransformNodeData::default()),
            NodeType::Loop => NodeDetails::Loop(LoopNodeData::default()),
        }
    }

    /// Parse a data bag into the shape selected by `node_type`
    pub fn from_value(node_type: NodeType, value: Value) -> serde_json::Result<Self> {
        Ok(match node_type {
            NodeType::Webhook => NodeDetails::Webhook(serde_json::from_value(value)?),
            NodeType::ApiCall => NodeDetails::ApiCall(serde_json::from_value(value)?),
            NodeType::Condition => NodeDetails::Condition(serde_json::from_value(value)?),
            NodeType::Timer => NodeDetails::Timer(serde_json::from_value(value)?),
            NodeType::DataTransform => NodeDetails::DataTransform(serde_json::from_value(value)?),
            NodeType::Loop => NodeDetails::Loop(serde_json::from_value(value)?),
        })
    }

    /// Serialize the payload back into a data bag
    pub fn to_value(&self) -> Value {
        let value = match self {
            NodeDetails::Webhook(data) => serde_json::to_value(data),
            NodeDetails::ApiCall(data) => serde_json::to_value(data),
            NodeDetails::Condition(data) => serde_json::to_value(data),
            NodeDetails::Timer(data) => serde_json::to_value(data),
            NodeDetails::DataTransform(data) => serde_json::to_value(data),
            NodeDetails::Loop(data) => serde_json::to_value(data),
        };
        value.unwrap_or_default()
    }
}

// ============================================
// Webhook
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookService {
    #[default]
    Stripe,
    Typeform,
    Twilio,
    Github,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookNodeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<WebhookService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookNodeData {
    pub fn service(&self) -> WebhookService {
        self.service.unwrap_or_default()
    }

    /// Endpoint path, empty when unset
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or("")
    }

    pub fn event_types(&self) -> &[String] {
        self.event_types.as_deref().unwrap_or(&[])
    }

    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(false)
    }
}

// ============================================
// API call
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiCallNodeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
    /// Request timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiCallNodeData {
    pub fn method(&self) -> HttpMethod {
        self.method.unwrap_or_default()
    }

    /// Request URL, empty when unset
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }
}

// ============================================
// Condition
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    #[default]
    IfElse,
    Switch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    #[default]
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
}

impl ComparisonOperator {
    /// Whether the operator ignores the comparison value
    pub fn is_unary(&self) -> bool {
        matches!(self, ComparisonOperator::IsEmpty | ComparisonOperator::IsNotEmpty)
    }
}

/// A single comparison routed to `path` when it matches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    pub id: String,
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: Value,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionNodeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_type: Option<ConditionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConditionNodeData {
    pub fn condition_type(&self) -> ConditionType {
        self.condition_type.unwrap_or_default()
    }

    pub fn conditions(&self) -> &[Condition] {
        self.conditions.as_deref().unwrap_or(&[])
    }
}

// ============================================
// Timer
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Length of one unit in seconds
    pub fn seconds(&self) -> u64 {
        match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Minutes => 60,
            TimeUnit::Hours => 60 * 60,
            TimeUnit::Days => 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerType {
    #[default]
    Delay,
    Wait,
    Schedule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerNodeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<TimeUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_type: Option<TimerType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TimerNodeData {
    pub fn unit(&self) -> TimeUnit {
        self.unit.unwrap_or_default()
    }

    pub fn timer_type(&self) -> TimerType {
        self.timer_type.unwrap_or_default()
    }

    /// Duration as a std `Duration`; None when unset, negative or not finite
    pub fn as_duration(&self) -> Option<Duration> {
        let secs = self.duration? * self.unit().seconds() as f64;
        Duration::try_from_secs_f64(secs).ok()
    }
}

// ============================================
// Data transform
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationType {
    FormatDate,
    FormatNumber,
    StringUppercase,
    StringLowercase,
    StringTrim,
    MathAdd,
    MathSubtract,
    MathMultiply,
    MathDivide,
    CustomFunction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    #[default]
    Object,
    Array,
    String,
    Number,
    Boolean,
}

/// Minimal JSON-schema-like description of a transform's input or output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<TransformationType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub id: String,
    #[serde(rename = "type")]
    pub transformation_type: TransformationType,
    #[serde(default)]
    pub config: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataTransformNodeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Vec<FieldMapping>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformations: Option<Vec<Transformation>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataTransformNodeData {
    pub fn mappings(&self) -> &[FieldMapping] {
        self.mappings.as_deref().unwrap_or(&[])
    }

    pub fn transformations(&self) -> &[Transformation] {
        self.transformations.as_deref().unwrap_or(&[])
    }
}

// ============================================
// Loop
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopType {
    #[default]
    For,
    While,
    ForEach,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoopNodeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_type: Option<LoopType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoopNodeData {
    pub fn loop_type(&self) -> LoopType {
        self.loop_type.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_details_match_type() {
        for node_type in NodeType::ALL {
            assert_eq!(NodeDetails::empty(node_type).node_type(), node_type);
        }
    }

    #[test]
    fn test_partial_payload_uses_defaults() {
        let details = NodeDetails::from_value(NodeType::Loop, json!({"loopType": "for_each"})).unwrap();
        match details {
            NodeDetails::Loop(data) => {
                assert_eq!(data.loop_type(), LoopType::ForEach);
                assert!(data.iterations.is_none());
                assert!(data.array_path.is_none());
            }
            other => panic!("Expected loop details, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_keys_are_kept() {
        let details = NodeDetails::from_value(
            NodeType::Condition,
            json!({"conditionType": "switch", "lane": 2}),
        )
        .unwrap();

        let value = details.to_value();
        assert_eq!(value["conditionType"], "switch");
        assert_eq!(value["lane"], 2);
    }

    #[test]
    fn test_only_given_keys_are_written_back() {
        let given = json!({"service": "github", "eventTypes": []});
        let details = NodeDetails::from_value(NodeType::Webhook, given.clone()).unwrap();
        assert_eq!(details.to_value(), given);

        for node_type in NodeType::ALL {
            assert_eq!(NodeDetails::empty(node_type).to_value(), json!({}));
        }

        match details {
            NodeDetails::Webhook(data) => {
                assert_eq!(data.service(), WebhookService::Github);
                assert_eq!(data.endpoint(), "");
                assert!(data.event_types().is_empty());
                assert!(!data.is_active());
            }
            other => panic!("Expected webhook details, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_enum_value_fails() {
        let result = NodeDetails::from_value(NodeType::Timer, json!({"unit": "fortnights"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_operator_names() {
        let op: ComparisonOperator = serde_json::from_value(json!("greater_than_or_equal")).unwrap();
        assert_eq!(op, ComparisonOperator::GreaterThanOrEqual);
        assert!(ComparisonOperator::IsEmpty.is_unary());
        assert!(!ComparisonOperator::Contains.is_unary());
    }

    #[test]
    fn test_timer_duration() {
        let timer = TimerNodeData {
            duration: Some(1.5),
            unit: Some(TimeUnit::Minutes),
            ..TimerNodeData::default()
        };
        assert_eq!(timer.as_duration(), Some(Duration::from_secs(90)));

        let negative = TimerNodeData {
            duration: Some(-1.0),
            ..TimerNodeData::default()
        };
        assert!(negative.as_duration().is_none());
        assert!(TimerNodeData::default().as_duration().is_none());
    }

    #[test]
    fn test_transform_schema_nesting() {
        let data: DataTransformNodeData = serde_json::from_value(json!({
            "inputSchema": {"type": "array", "items": {"type": "string"}},
            "mappings": [{"id": "m1", "source": "a", "target": "b", "transformation": "string_trim"}],
            "transformations": [{"id": "t1", "type": "math_add", "config": {"amount": 2}}]
        }))
        .unwrap();

        let schema = data.input_schema.clone().unwrap();
        assert_eq!(schema.schema_type, SchemaType::Array);
        assert_eq!(schema.items.unwrap().schema_type, SchemaType::String);
        assert_eq!(data.mappings()[0].transformation, Some(TransformationType::StringTrim));
        assert_eq!(data.transformations()[0].transformation_type, TransformationType::MathAdd);
    }
}
