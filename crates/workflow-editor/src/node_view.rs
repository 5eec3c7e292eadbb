//! Presentation model for a single canvas node
//!
//! Pure function of the node's id, kind, data bag and selection flag.
//! Styling comes from the palette catalog; unknown kinds get a neutral
//! fallback.

use serde::Serialize;
use workflow_types::{NodeConfig, NodeType};

use crate::canvas::model::CanvasNode;
use crate::palette::palette_item;

/// Border color of a selected node
pub const SELECTED_BORDER_COLOR: &str = "#1976d2";

/// Icon/color pair used for kinds outside the catalog
pub const FALLBACK_STYLE: NodeStyle = NodeStyle {
    icon: "📦",
    color: "#757575",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

impl NodeStyle {
    pub fn for_type(node_type: NodeType) -> Self {
        let item = palette_item(node_type);
        Self {
            icon: item.icon,
            color: item.color,
        }
    }

    /// Style for a raw kind string, falling back for unknown kinds
    pub fn for_kind(kind: &str) -> Self {
        kind.parse::<NodeType>()
            .map(Self::for_type)
            .unwrap_or(FALLBACK_STYLE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Target,
    Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleSide {
    Left,
    Right,
}

/// A connection handle drawn on the node body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandleView {
    pub kind: HandleKind,
    pub side: HandleSide,
    pub color: &'static str,
}

/// Everything needed to draw one node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub icon: &'static str,
    /// Header background and handle color
    pub accent: &'static str,
    pub border_color: &'static str,
    pub selected: bool,
    /// Draw with the invalid styling
    pub invalid: bool,
    /// Error count badge; absent when there are no errors
    pub error_badge: Option<usize>,
    /// Target on the left, source on the right
    pub handles: [HandleView; 2],
}

/// Render a canvas node
pub fn render(node: &CanvasNode) -> NodeView {
    render_parts(&node.id, node.kind.as_str(), node.label(), &node.config(), node.selected)
}

/// Render from loose parts, accepting kinds outside the catalog
pub fn render_parts(
    id: &str,
    kind: &str,
    label: Option<&str>,
    config: &NodeConfig,
    selected: bool,
) -> NodeView {
    let style = NodeStyle::for_kind(kind);

    let title = match label {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => kind.replacen('_', " ", 1).to_uppercase(),
    };

    let error_badge = config
        .errors
        .as_ref()
        .filter(|errors| !errors.is_empty())
        .map(Vec::len);

    NodeView {
        id: id.to_string(),
        title,
        subtitle: subtitle(kind),
        icon: style.icon,
        accent: style.color,
        border_color: if selected { SELECTED_BORDER_COLOR } else { style.color },
        selected,
        invalid: !config.is_valid(),
        error_badge,
        handles: [
            HandleView {
                kind: HandleKind::Target,
                side: HandleSide::Left,
                color: style.color,
            },
            HandleView {
                kind: HandleKind::Source,
                side: HandleSide::Right,
                color: style.color,
            },
        ],
    }
}

// "data_transform" -> "Data Transform"
fn subtitle(kind: &str) -> String {
    kind.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
