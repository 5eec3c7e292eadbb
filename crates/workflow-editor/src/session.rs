//! Editing session: owns the authoritative workflow
//!
//! The session wires the palette and the canvas together. Canvas events
//! are routed through the canvas handlers; whatever workflow they return
//! replaces the held one, is recorded in the undo history, and is passed
//! on to the listener.

use chrono::{DateTime, Utc};
use workflow_types::{validate_workflow, NodeType, ValidationResult, Workflow};

use crate::canvas::{CanvasEvent, Connection, DropEvent, EdgeChange, NodeChange, WorkflowCanvas};
use crate::config::EditorConfig;
use crate::error::Result;
use crate::events::{ChangeCause, ChangeListener, WorkflowChange};
use crate::history::History;
use crate::palette::{DataTransfer, NodePalette};

/// Id of the workflow used when a session starts without one
pub const DEMO_WORKFLOW_ID: &str = "demo-workflow";

/// Empty draft workflow for a fresh session, stamped with `now`
pub fn demo_workflow(now: DateTime<Utc>) -> Workflow {
    Workflow::draft(
        DEMO_WORKFLOW_ID,
        "Demo Workflow",
        "A demo workflow for testing",
        "demo-user",
        now,
    )
}

pub struct WorkflowSession {
    workflow: Workflow,
    palette: NodePalette,
    canvas: WorkflowCanvas,
    history: History,
    listener: Option<Box<dyn ChangeListener>>,
}

impl WorkflowSession {
    /// Start a session on `initial`, or on the demo workflow when absent
    pub fn new(initial: Option<Workflow>, config: &EditorConfig, now: DateTime<Utc>) -> Result<Self> {
        let workflow = initial.unwrap_or_else(|| demo_workflow(now));

        let mut history = History::new(config.undo_depth);
        history.reset(&workflow)?;

        let mut canvas = WorkflowCanvas::new(config);
        canvas.mount(Some(&workflow));

        log::info!(
            "Editing workflow '{}' ({} nodes, {} edges)",
            workflow.id,
            workflow.nodes.len(),
            workflow.edges.len()
        );

        Ok(Self {
            workflow,
            palette: NodePalette::new(config),
            canvas,
            history,
            listener: None,
        })
    }

    /// Start a session on untrusted workflow JSON
    ///
    /// Every node's data is checked against its type before anything is
    /// projected onto the canvas.
    pub fn from_json(json: &str, config: &EditorConfig, now: DateTime<Utc>) -> Result<Self> {
        let workflow = Workflow::from_json(json)?;
        Self::new(Some(workflow), config, now)
    }

    /// Notify `listener` of every subsequent change
    pub fn with_listener(mut self, listener: impl ChangeListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn set_listener(&mut self, listener: Option<Box<dyn ChangeListener>>) {
        self.listener = listener;
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn palette(&self) -> &NodePalette {
        &self.palette
    }

    pub fn canvas(&self) -> &WorkflowCanvas {
        &self.canvas
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn into_workflow(self) -> Workflow {
        self.workflow
    }

    pub fn drag_start(&self, node_type: NodeType, data_transfer: &mut DataTransfer) {
        self.palette.drag_start(node_type, data_transfer);
    }

    pub fn drag_over(&self, data_transfer: &mut DataTransfer) {
        self.canvas.on_drag_over(data_transfer);
    }

    /// Route a canvas event; returns whether the workflow changed
    pub fn dispatch(&mut self, event: CanvasEvent) -> Result<bool> {
        match self.canvas.handle(event, Some(&self.workflow)) {
            Some(change) => {
                self.apply(change)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn connect(&mut self, connection: Connection) -> Result<bool> {
        self.dispatch(CanvasEvent::Connect(connection))
    }

    pub fn nodes_change(&mut self, changes: Vec<NodeChange>) -> Result<bool> {
        self.dispatch(CanvasEvent::NodesChange(changes))
    }

    pub fn edges_change(&mut self, changes: Vec<EdgeChange>) -> Result<bool> {
        self.dispatch(CanvasEvent::EdgesChange(changes))
    }

    pub fn drop(&mut self, event: DropEvent) -> Result<bool> {
        self.dispatch(CanvasEvent::Drop(event))
    }

    /// Replace the workflow from outside the canvas
    pub fn replace_workflow(&mut self, workflow: Workflow) -> Result<()> {
        self.canvas.sync(&workflow);
        self.apply(WorkflowChange::new(workflow, ChangeCause::Replaced))
    }

    /// Step back one change; returns `false` when there is nothing to undo
    pub fn undo(&mut self) -> Result<bool> {
        let Some(restored) = self.history.undo() else {
            return Ok(false);
        };
        let restored = restored?;
        let cause = ChangeCause::Undo {
            reverted: Box::new(restored.cause),
        };
        self.restore(restored.workflow, cause);
        Ok(true)
    }

    /// Step forward one change; returns `false` when there is nothing to redo
    pub fn redo(&mut self) -> Result<bool> {
        let Some(restored) = self.history.redo() else {
            return Ok(false);
        };
        let restored = restored?;
        let cause = ChangeCause::Redo {
            reapplied: Box::new(restored.cause),
        };
        self.restore(restored.workflow, cause);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Structural checks on the held workflow
    pub fn validate(&self) -> ValidationResult {
        validate_workflow(&self.workflow)
    }

    fn apply(&mut self, change: WorkflowChange) -> Result<()> {
        self.history.record(&change.workflow, change.cause.clone())?;
        self.notify(&change);
        self.workflow = change.workflow;
        Ok(())
    }

    fn restore(&mut self, workflow: Workflow, cause: ChangeCause) {
        // History steps reach the canvas in every sync mode
        if !self.canvas.sync(&workflow) {
            self.canvas.remount(Some(&workflow));
        }
        let change = WorkflowChange::new(workflow, cause);
        self.notify(&change);
        self.workflow = change.workflow;
    }

    fn notify(&mut self, change: &WorkflowChange) {
        log::debug!("Workflow '{}' changed: {:?}", change.workflow.id, change.cause);
        if let Some(listener) = self.listener.as_mut() {
            listener.workflow_changed(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::canvas::Rect;
    use crate::config::{IdStrategy, SyncMode};
    use workflow_types::{Position, ValidationType};

    fn now() -> DateTime<Utc> {
        "2026-05-01T09:30:00Z".parse().unwrap()
    }

    fn recording_session(config: &EditorConfig) -> (WorkflowSession, Rc<RefCell<Vec<WorkflowChange>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let session = WorkflowSession::new(None, config, now())
            .unwrap()
            .with_listener(move |change: &WorkflowChange| sink.borrow_mut().push(change.clone()));
        (session, seen)
    }

    fn palette_drop(session: &WorkflowSession, node_type: NodeType, x: f64, y: f64) -> DropEvent {
        let mut data_transfer = DataTransfer::new();
        session.drag_start(node_type, &mut data_transfer);
        session.drag_over(&mut data_transfer);
        DropEvent {
            data_transfer,
            client: Position::new(x, y),
            bounds: Rect::default(),
        }
    }

    #[test]
    fn test_demo_workflow_factory() {
        let workflow = demo_workflow(now());
        assert_eq!(workflow.id, "demo-workflow");
        assert_eq!(workflow.name, "Demo Workflow");
        assert_eq!(workflow.metadata.description.as_deref(), Some("A demo workflow for testing"));
        assert_eq!(workflow.metadata.created_by, "demo-user");
        assert_eq!(workflow.metadata.created_at, now());
        assert_eq!(workflow.metadata.updated_at, now());
    }

    #[test]
    fn test_session_seeds_from_initial() {
        let mut initial = demo_workflow(now());
        initial.id = "mine".into();
        let session = WorkflowSession::new(Some(initial), &EditorConfig::default(), now()).unwrap();

        assert_eq!(session.workflow().id, "mine");
        assert_eq!(session.history().len(), 1);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_from_json_rejects_mismatched_node_data() {
        let mut workflow = demo_workflow(now());
        let details = workflow_types::NodeDetails::ApiCall(workflow_types::ApiCallNodeData {
            method: Some(workflow_types::HttpMethod::Get),
            ..Default::default()
        });
        workflow.nodes.push(
            workflow_types::WorkflowNode::new("call", NodeType::ApiCall, Position::new(10.0, 10.0))
                .with_details(details),
        );
        let json = workflow.to_json().unwrap();

        let session = WorkflowSession::from_json(&json, &EditorConfig::default(), now()).unwrap();
        assert_eq!(session.canvas().nodes().len(), 1);

        let broken = json.replace("\"GET\"", "\"FETCH\"");
        let err = WorkflowSession::from_json(&broken, &EditorConfig::default(), now()).err().unwrap();
        assert!(matches!(err, crate::EditorError::Workflow(_)));
    }

    #[test]
    fn test_scenario_keeps_listener_in_lockstep() {
        let (mut session, seen) = recording_session(&EditorConfig::default());

        let webhook = palette_drop(&session, NodeType::Webhook, 50.0, 50.0);
        assert!(session.drop(webhook).unwrap());
        let condition = palette_drop(&session, NodeType::Condition, 150.0, 50.0);
        assert!(session.drop(condition).unwrap());

        let source = session.workflow().nodes[0].id.clone();
        let target = session.workflow().nodes[1].id.clone();
        assert!(session.connect(Connection::new(&source, &target)).unwrap());

        let workflow = session.workflow();
        assert_eq!(workflow.nodes.len(), 2);
        assert_eq!(workflow.edges.len(), 1);
        assert_eq!(workflow.edges[0].source, source);
        assert_eq!(workflow.edges[0].target, target);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(&seen[2].workflow, workflow);
        assert_eq!(seen[2].cause, ChangeCause::EdgeConnected { edge_id: workflow.edges[0].id.clone() });
    }

    #[test]
    fn test_changes_never_touch_version_or_timestamps() {
        let (mut session, _) = recording_session(&EditorConfig::default());
        let event = palette_drop(&session, NodeType::Timer, 10.0, 10.0);
        session.drop(event).unwrap();

        let metadata = &session.workflow().metadata;
        assert_eq!(metadata.version, 1);
        assert_eq!(metadata.updated_at, now());
    }

    #[test]
    fn test_ignored_events_do_not_notify() {
        let (mut session, seen) = recording_session(&EditorConfig::default());

        let unknown = DropEvent {
            data_transfer: DataTransfer::new(),
            client: Position::new(0.0, 0.0),
            bounds: Rect::default(),
        };
        assert!(!session.drop(unknown).unwrap());
        assert!(!session
            .edges_change(vec![EdgeChange::Select { id: "x".into(), selected: true }])
            .unwrap());

        assert!(seen.borrow().is_empty());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_undo_redo_resync_canvas() {
        let config = EditorConfig {
            id_strategy: IdStrategy::Sequential,
            ..EditorConfig::default()
        };
        let (mut session, seen) = recording_session(&config);

        let event = palette_drop(&session, NodeType::Loop, 30.0, 40.0);
        session.drop(event).unwrap();
        session
            .nodes_change(vec![NodeChange::moved("loop-1", Position::new(300.0, 400.0))])
            .unwrap();

        assert!(session.undo().unwrap());
        assert_eq!(session.workflow().nodes[0].position, Position::new(30.0, 40.0));
        assert_eq!(session.canvas().nodes()[0].position, Position::new(30.0, 40.0));

        assert!(session.undo().unwrap());
        assert!(session.workflow().nodes.is_empty());
        assert!(session.canvas().nodes().is_empty());
        assert!(!session.undo().unwrap());

        assert!(session.redo().unwrap());
        assert_eq!(session.workflow().nodes.len(), 1);
        assert_eq!(session.canvas().nodes().len(), 1);

        let dropped = ChangeCause::NodeDropped { node_id: "loop-1".into() };
        let moved = ChangeCause::NodesChanged { moved: vec!["loop-1".into()] };
        let causes: Vec<ChangeCause> = seen.borrow().iter().map(|c| c.cause.clone()).collect();
        assert_eq!(
            causes[2..],
            [
                ChangeCause::Undo { reverted: Box::new(moved) },
                ChangeCause::Undo { reverted: Box::new(dropped.clone()) },
                ChangeCause::Redo { reapplied: Box::new(dropped) },
            ]
        );
    }

    #[test]
    fn test_selection_notifies_without_undo_step() {
        let (mut session, seen) = recording_session(&EditorConfig::default());
        let event = palette_drop(&session, NodeType::Timer, 10.0, 10.0);
        session.drop(event).unwrap();
        let id = session.workflow().nodes[0].id.clone();

        assert!(session
            .nodes_change(vec![NodeChange::Select { id, selected: true }])
            .unwrap());

        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(session.history().len(), 2);
        assert!(matches!(
            session.history().undo_cause(),
            Some(ChangeCause::NodeDropped { .. })
        ));
    }

    #[test]
    fn test_uncontrolled_undo_survives_next_batch() {
        let config = EditorConfig {
            id_strategy: IdStrategy::Sequential,
            sync_mode: SyncMode::Uncontrolled,
            ..EditorConfig::default()
        };
        let mut session = WorkflowSession::new(None, &config, now()).unwrap();

        let event = palette_drop(&session, NodeType::Timer, 30.0, 40.0);
        session.drop(event).unwrap();
        session
            .nodes_change(vec![NodeChange::moved("timer-1", Position::new(300.0, 400.0))])
            .unwrap();

        assert!(session.undo().unwrap());
        assert_eq!(session.canvas().nodes()[0].position, Position::new(30.0, 40.0));

        session
            .nodes_change(vec![NodeChange::Select { id: "timer-1".into(), selected: true }])
            .unwrap();
        assert_eq!(session.workflow().nodes[0].position, Position::new(30.0, 40.0));
    }

    #[test]
    fn test_replace_workflow_follows_sync_mode() {
        let mut replacement = demo_workflow(now());
        replacement.nodes.push(workflow_types::WorkflowNode::new(
            "hook",
            NodeType::Webhook,
            Position::default(),
        ));

        let mut controlled = WorkflowSession::new(None, &EditorConfig::default(), now()).unwrap();
        controlled.replace_workflow(replacement.clone()).unwrap();
        assert_eq!(controlled.canvas().nodes().len(), 1);
        assert_eq!(controlled.workflow(), &replacement);

        let config = EditorConfig {
            sync_mode: SyncMode::Uncontrolled,
            ..EditorConfig::default()
        };
        let mut uncontrolled = WorkflowSession::new(None, &config, now()).unwrap();
        uncontrolled.replace_workflow(replacement.clone()).unwrap();
        assert!(uncontrolled.canvas().nodes().is_empty());
        assert_eq!(uncontrolled.workflow(), &replacement);
    }

    #[test]
    fn test_validate_reports_dropped_nodes() {
        let mut session = WorkflowSession::new(None, &EditorConfig::default(), now()).unwrap();
        let event = palette_drop(&session, NodeType::ApiCall, 0.0, 0.0);
        session.drop(event).unwrap();

        let result = session.validate();
        assert!(!result.is_valid);
        assert!(result.errors_of(ValidationType::RequiredFieldMissing).next().is_some());
    }
}
