//! Node palette: the fixed catalog of node kinds and palette drags
//!
//! The palette has no state of its own. Starting a drag writes the node
//! type discriminant into the drag payload and allows a "move" effect;
//! the canvas reads it back on drop.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use workflow_types::NodeType;

use crate::config::EditorConfig;

/// Allowed/selected effect of a drag operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DragEffect {
    #[default]
    None,
    Copy,
    Move,
    Link,
}

/// Payload attached to a platform drag operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTransfer {
    data: HashMap<String, String>,
    pub effect_allowed: DragEffect,
    pub drop_effect: DragEffect,
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `mime_type`, replacing any previous value
    pub fn set_data(&mut self, mime_type: impl Into<String>, value: impl Into<String>) {
        self.data.insert(mime_type.into(), value.into());
    }

    /// Read the value stored under `mime_type`
    pub fn get_data(&self, mime_type: &str) -> Option<&str> {
        self.data.get(mime_type).map(String::as_str)
    }

    pub fn clear_data(&mut self) {
        self.data.clear();
    }
}

/// One draggable entry in the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteItem {
    pub node_type: NodeType,
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

const PALETTE_ITEMS: [PaletteItem; 6] = [
    PaletteItem {
        node_type: NodeType::Webhook,
        label: "Webhook",
        description: "Receive data from external services",
        icon: "🔗",
        color: "#4CAF50",
    },
    PaletteItem {
        node_type: NodeType::ApiCall,
        label: "API Call",
        description: "Make HTTP requests to external APIs",
        icon: "🌐",
        color: "#2196F3",
    },
    PaletteItem {
        node_type: NodeType::Condition,
        label: "Condition",
        description: "Add conditional logic and branching",
        icon: "🔀",
        color: "#FF9800",
    },
    PaletteItem {
        node_type: NodeType::Timer,
        label: "Timer",
        description: "Add delays and scheduling",
        icon: "⏰",
        color: "#9C27B0",
    },
    PaletteItem {
        node_type: NodeType::DataTransform,
        label: "Transform",
        description: "Transform and map data between steps",
        icon: "🔄",
        color: "#00BCD4",
    },
    PaletteItem {
        node_type: NodeType::Loop,
        label: "Loop",
        description: "Repeat actions with iteration control",
        icon: "🔁",
        color: "#795548",
    },
];

/// Catalog entry for a node type
pub fn palette_item(node_type: NodeType) -> &'static PaletteItem {
    match node_type {
        NodeType::Webhook => &PALETTE_ITEMS[0],
        NodeType::ApiCall => &PALETTE_ITEMS[1],
        NodeType::Condition => &PALETTE_ITEMS[2],
        NodeType::Timer => &PALETTE_ITEMS[3],
        NodeType::DataTransform => &PALETTE_ITEMS[4],
        NodeType::Loop => &PALETTE_ITEMS[5],
    }
}

/// Source of new-node drag operations
#[derive(Debug, Clone)]
pub struct NodePalette {
    mime_type: String,
}

impl NodePalette {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            mime_type: config.drag_mime_type.clone(),
        }
    }

    /// All items, in display order
    pub fn items(&self) -> &'static [PaletteItem] {
        &PALETTE_ITEMS
    }

    /// Start dragging an item: attach its discriminant and allow "move"
    pub fn drag_start(&self, node_type: NodeType, data_transfer: &mut DataTransfer) {
        data_transfer.set_data(self.mime_type.as_str(), node_type.as_str());
        data_transfer.effect_allowed = DragEffect::Move;
    }
}

impl Default for NodePalette {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_every_type_once() {
        let palette = NodePalette::default();
        let types: Vec<NodeType> = palette.items().iter().map(|i| i.node_type).collect();
        assert_eq!(types, NodeType::ALL.to_vec());

        for node_type in NodeType::ALL {
            assert_eq!(palette_item(node_type).node_type, node_type);
        }
    }

    #[test]
    fn test_drag_start_sets_payload_and_effect() {
        let palette = NodePalette::default();
        let mut transfer = DataTransfer::new();

        palette.drag_start(NodeType::DataTransform, &mut transfer);

        assert_eq!(transfer.get_data("application/reactflow"), Some("data_transform"));
        assert_eq!(transfer.effect_allowed, DragEffect::Move);
        assert_eq!(transfer.drop_effect, DragEffect::None);
    }

    #[test]
    fn test_custom_mime_type() {
        let config = EditorConfig {
            drag_mime_type: "application/x-workflow-node".to_string(),
            ..EditorConfig::default()
        };
        let palette = NodePalette::new(&config);
        let mut transfer = DataTransfer::new();

        palette.drag_start(NodeType::Loop, &mut transfer);

        assert_eq!(transfer.get_data("application/x-workflow-node"), Some("loop"));
        assert_eq!(transfer.get_data("application/reactflow"), None);
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let json = serde_json::to_value(palette_item(NodeType::ApiCall)).unwrap();
        assert_eq!(json["nodeType"], "api_call");
        assert_eq!(json["color"], "#2196F3");
    }
}
