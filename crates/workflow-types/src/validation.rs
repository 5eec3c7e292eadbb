//! Structural validation for workflows
//!
//! Reports every problem found, not just the first. Problems that make a
//! workflow unrunnable are errors; problems the editor can live with
//! (orphans, duplicate connections, per-node config errors) are warnings.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::execution::{ValidationError, ValidationResult, ValidationType, ValidationWarning};
use crate::nodes::{LoopType, NodeDetails};
use crate::workflow::{Workflow, WorkflowNode};

/// Validate a workflow's structure and node configuration
pub fn validate_workflow(workflow: &Workflow) -> ValidationResult {
    let mut report = Report::default();

    check_duplicate_ids(workflow, &mut report);
    check_edge_references(workflow, &mut report);
    check_parallel_edges(workflow, &mut report);
    detect_cycles(workflow, &mut report);
    check_orphans(workflow, &mut report);
    for node in &workflow.nodes {
        check_node(node, &mut report);
    }

    log::debug!(
        "Validated workflow '{}': {} errors, {} warnings",
        workflow.id,
        report.errors.len(),
        report.warnings.len()
    );

    ValidationResult::new(report.errors, report.warnings)
}

#[derive(Default)]
struct Report {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

impl Report {
    fn error(&mut self, validation_type: ValidationType, message: String, node_id: Option<&str>, field: Option<&str>) {
        self.errors.push(ValidationError {
            validation_type,
            message,
            field: field.map(str::to_string),
            node_id: node_id.map(str::to_string),
        });
    }

    fn warning(&mut self, validation_type: ValidationType, message: String, node_id: Option<&str>, field: Option<&str>) {
        self.warnings.push(ValidationWarning {
            validation_type,
            message,
            field: field.map(str::to_string),
            node_id: node_id.map(str::to_string),
        });
    }
}

fn check_duplicate_ids(workflow: &Workflow, report: &mut Report) {
    let mut seen = HashSet::new();
    for node in &workflow.nodes {
        if !seen.insert(node.id.as_str()) {
            report.error(
                ValidationType::ConfigurationConflict,
                format!("Duplicate node id '{}'", node.id),
                Some(node.id.as_str()),
                Some("id"),
            );
        }
    }

    let mut seen = HashSet::new();
    for edge in &workflow.edges {
        if !seen.insert(edge.id.as_str()) {
            report.error(
                ValidationType::ConfigurationConflict,
                format!("Duplicate edge id '{}'", edge.id),
                None,
                Some("id"),
            );
        }
    }
}

/// Check that all edge source/target nodes exist
fn check_edge_references(workflow: &Workflow, report: &mut Report) {
    let node_ids: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in &workflow.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                report.error(
                    ValidationType::InvalidConnection,
                    format!("Edge '{}' references unknown node '{}'", edge.id, endpoint),
                    Some(endpoint.as_str()),
                    None,
                );
            }
        }
    }
}

/// Warn about edges that repeat an earlier connection under another id
fn check_parallel_edges(workflow: &Workflow, report: &mut Report) {
    let mut seen = HashMap::new();
    for edge in &workflow.edges {
        let key = (
            edge.source.as_str(),
            edge.source_handle.as_deref(),
            edge.target.as_str(),
            edge.target_handle.as_deref(),
        );
        if let Some(first) = seen.insert(key, edge.id.as_str()) {
            if first != edge.id {
                report.warning(
                    ValidationType::InvalidConnection,
                    format!("Edge '{}' duplicates edge '{}'", edge.id, first),
                    None,
                    None,
                );
            }
        }
    }
}

/// Detect cycles using Kahn's algorithm (topological sort)
///
/// Edges with an unknown endpoint are ignored here; they are reported by
/// `check_edge_references`.
fn detect_cycles(workflow: &Workflow, report: &mut Report) {
    let mut in_degree: HashMap<&str, usize> = workflow.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let edges: Vec<(&str, &str)> = workflow
        .edges
        .iter()
        .filter(|e| in_degree.contains_key(e.source.as_str()) && in_degree.contains_key(e.target.as_str()))
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();

    for (_, target) in &edges {
        if let Some(deg) = in_degree.get_mut(target) {
            *deg += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut visited = 0;
    while let Some(node_id) = queue.pop_front() {
        visited += 1;
        for (source, target) in &edges {
            if *source == node_id {
                if let Some(deg) = in_degree.get_mut(target) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(*target);
                    }
                }
            }
        }
    }

    if visited < in_degree.len() {
        report.error(
            ValidationType::CircularDependency,
            "Cycle detected in workflow graph".to_string(),
            None,
            None,
        );
    }
}

fn check_orphans(workflow: &Workflow, report: &mut Report) {
    if workflow.nodes.len() < 2 {
        return;
    }

    let connected: HashSet<&str> = workflow
        .edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();

    for node in &workflow.nodes {
        if !connected.contains(node.id.as_str()) {
            report.warning(
                ValidationType::OrphanedNode,
                format!("Node '{}' has no connections", node.id),
                Some(node.id.as_str()),
                None,
            );
        }
    }
}

/// Per-variant required fields and config errors
fn check_node(node: &WorkflowNode, report: &mut Report) {
    let id = Some(node.id.as_str());

    if let Some(errors) = node.config.errors.as_ref().filter(|e| !e.is_empty()) {
        report.warning(
            ValidationType::ConfigurationConflict,
            format!("Node '{}' reports errors: {}", node.id, errors.join("; ")),
            id,
            Some("config.errors"),
        );
    }

    let missing = |field: &str| format!("Node '{}' is missing required field '{}'", node.id, field);

    match &node.details {
        NodeDetails::Webhook(data) => {
            if data.endpoint().trim().is_empty() {
                report.error(ValidationType::RequiredFieldMissing, missing("endpoint"), id, Some("endpoint"));
            }
        }
        NodeDetails::ApiCall(data) => {
            if data.url().trim().is_empty() {
                report.error(ValidationType::RequiredFieldMissing, missing("url"), id, Some("url"));
            }
        }
        NodeDetails::Condition(data) => {
            if data.conditions().is_empty() {
                report.warning(ValidationType::RequiredFieldMissing, missing("conditions"), id, Some("conditions"));
            }
        }
        NodeDetails::Timer(data) => {
            if data.duration.map_or(true, |d| d.is_nan() || d <= 0.0) {
                report.warning(
                    ValidationType::InvalidFormat,
                    format!("Node '{}' has no positive duration", node.id),
                    id,
                    Some("duration"),
                );
            }
        }
        NodeDetails::DataTransform(_) => {}
        NodeDetails::Loop(data) => match data.loop_type() {
            LoopType::For if data.iterations.is_none() => {
                report.error(ValidationType::RequiredFieldMissing, missing("iterations"), id, Some("iterations"));
            }
            LoopType::ForEach if data.array_path.as_deref().map_or(true, |p| p.trim().is_empty()) => {
                report.error(ValidationType::RequiredFieldMissing, missing("arrayPath"), id, Some("arrayPath"));
            }
            LoopType::While if data.condition.is_none() => {
                report.error(ValidationType::RequiredFieldMissing, missing("condition"), id, Some("condition"));
            }
            _ => {}
        },
    }
}
