//! Workflow Editor - headless editing core for the workflow canvas
//!
//! Keeps a `Workflow` and a graph widget's node/edge lists in step:
//!
//! - `palette`: the node catalog and the drag payload it produces
//! - `node_view`: presentation model for a single node
//! - `canvas`: projection of a workflow into the widget model, and the
//!   handlers turning widget events back into workflow changes
//! - `session`: owns the authoritative workflow, history and listener
//! - `history`: compressed snapshot undo/redo
//!
//! # Example
//!
//! ```ignore
//! use workflow_editor::{EditorConfig, WorkflowSession};
//!
//! let mut session = WorkflowSession::new(None, &EditorConfig::default(), chrono::Utc::now())?
//!     .with_listener(|change: &workflow_editor::WorkflowChange| println!("{:?}", change.cause));
//! session.connect(workflow_editor::Connection::new("webhook-1", "timer-1"))?;
//! ```

pub mod canvas;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod ids;
pub mod node_view;
pub mod palette;
pub mod session;

pub use canvas::{
    CanvasEdge, CanvasEvent, CanvasNode, CanvasState, Connection, DropEvent, EdgeChange,
    NodeChange, Rect, WorkflowCanvas, DROPPED_NODE_IS_VALID,
};
pub use config::{ConfigError, EditorConfig, IdStrategy, SyncMode};
pub use error::{EditorError, Result};
pub use events::{ChangeCause, ChangeListener, VecChangeListener, WorkflowChange};
pub use history::History;
pub use ids::IdAllocator;
pub use node_view::{NodeStyle, NodeView};
pub use palette::{palette_item, DataTransfer, DragEffect, NodePalette, PaletteItem};
pub use session::{demo_workflow, WorkflowSession, DEMO_WORKFLOW_ID};

pub use workflow_types;
