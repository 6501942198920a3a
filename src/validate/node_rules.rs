//! Per-node rules: known kind, business id, and branch shape.

use std::collections::HashSet;

use crate::error::CompilerError;
use crate::ir::validate::{is_case_tag, is_data_key, is_dsl_identifier};
use crate::parse::graph::{FlowGraph, OutEdge};
use crate::parse::types::*;

pub fn validate_node_configs(
    _snapshot: &FlowSnapshot,
    graph: &FlowGraph,
    errors: &mut Vec<CompilerError>,
) {
    for node in graph.nodes() {
        errors.extend(validate_node(node, graph));
    }
}

/// Validate a single node against its outgoing edges. Returns all errors found.
pub fn validate_node(node: &FlowNode, graph: &FlowGraph) -> Vec<CompilerError> {
    let mut errors = Vec::new();

    let Some(kind) = node.kind() else {
        errors.push(CompilerError::validate(
            "V011",
            format!("Unknown node type '{}'", node.node_type),
            Some(node.id.clone()),
        ));
        return errors;
    };

    if kind != NodeKind::Entry {
        writable_data(node, &mut errors);
    }

    let edges = graph.outgoing(&node.id);
    let mut rules = ShapeRules {
        node,
        graph,
        edges: &edges,
        errors: &mut errors,
    };
    match kind {
        NodeKind::Entry => {}
        NodeKind::Task => rules.task(),
        NodeKind::Boolean => rules.boolean(),
        NodeKind::Switch => rules.switch(),
        NodeKind::Loop => rules.loop_node(),
        NodeKind::Fork => rules.fork(),
    }

    errors
}

/// V009: the business id and parameter names end up unquoted or unescaped
/// in the output, so they must be present and free of DSL punctuation.
fn writable_data(node: &FlowNode, errors: &mut Vec<CompilerError>) {
    match node.business_id() {
        None => errors.push(CompilerError::validate(
            "V009",
            format!("Node '{}' is missing data.nodeId", node.id),
            Some(node.id.clone()),
        )),
        Some(id) if !is_dsl_identifier(id) => errors.push(CompilerError::validate(
            "V009",
            format!(
                "Node '{}' has business id '{}', which cannot contain whitespace, brackets, commas, quotes or backslashes",
                node.id, id
            ),
            Some(node.id.clone()),
        )),
        Some(_) => {}
    }

    if node.kind() != Some(NodeKind::Task) {
        return;
    }
    for (name, _) in node.set_params() {
        if !is_data_key(name) {
            errors.push(CompilerError::validate(
                "V009",
                format!(
                    "Node '{}' has parameter name '{}', which cannot contain '=', ',', quotes or backslashes",
                    node.id, name
                ),
                Some(node.id.clone()),
            ));
        }
    }
}

struct ShapeRules<'a, 'g> {
    node: &'a FlowNode,
    graph: &'g FlowGraph,
    edges: &'a [OutEdge<'g>],
    errors: &'a mut Vec<CompilerError>,
}

impl ShapeRules<'_, '_> {
    fn count(&self, handle: &str) -> usize {
        self.edges
            .iter()
            .filter(|e| e.handle() == Some(handle))
            .count()
    }

    fn push(&mut self, code: &str, message: String, edge: Option<&OutEdge<'_>>) {
        self.errors.push(
            CompilerError::validate(code, message, Some(self.node.id.clone()))
                .with_edge(edge.and_then(|e| e.edge.id.as_deref())),
        );
    }

    /// Require exactly `min..=max` edges labeled `handle`.
    fn require(&mut self, code: &str, what: &str, handle: &str, min: usize, max: usize) {
        let found = self.count(handle);
        if found < min {
            let message = format!("{} node '{}' is missing its '{}' branch", what, self.node.id, handle);
            self.push(code, message, None);
        } else if found > max {
            let message = format!(
                "{} node '{}' has {} '{}' branches, expected at most {}",
                what, self.node.id, found, handle, max
            );
            self.push(code, message, None);
        }
    }

    /// Report edges whose label is not in `allowed`.
    fn reject_others(&mut self, code: &str, what: &str, allowed: &[&str]) {
        let unexpected: Vec<OutEdge<'_>> = self
            .edges
            .iter()
            .filter(|e| !e.handle().is_some_and(|h| allowed.contains(&h)))
            .copied()
            .collect();
        for edge in unexpected {
            let message = format!(
                "{} node '{}' has an edge with unexpected branch label {}",
                what,
                self.node.id,
                describe_handle(edge.handle())
            );
            self.push(code, message, Some(&edge));
        }
    }

    /// V014: a branch edge that lands on a join, or returns straight to a loop
    /// node, has no node of its own to put in the branch.
    fn non_empty_branches(&mut self, handles: &[&str]) {
        let edges = self.edges;
        for edge in edges {
            if !handles.is_empty() && !edge.handle().is_some_and(|h| handles.contains(&h)) {
                continue;
            }
            let target = edge.target();
            let reason = if self.graph.is_back_edge(edge.index) || target == self.node.id {
                format!("returns straight to loop node '{}'", target)
            } else if self.graph.in_degree(target) > 1 {
                format!(
                    "leads straight to '{}', which {} edges join",
                    target,
                    self.graph.in_degree(target)
                )
            } else {
                continue;
            };
            let message = format!(
                "Branch {} of node '{}' is empty: it {}; put a node on the branch",
                describe_handle(edge.handle()),
                self.node.id,
                reason
            );
            self.push("V014", message, Some(edge));
        }
    }

    fn task(&mut self) {
        if self.edges.len() > 1 {
            let message = format!(
                "Task node '{}' has {} outgoing edges; use a fork node for parallel branches",
                self.node.id,
                self.edges.len()
            );
            self.push("V013", message, None);
        }
    }

    fn boolean(&mut self) {
        self.require("V003", "Boolean", TRUE_HANDLE, 1, 1);
        self.require("V003", "Boolean", FALSE_HANDLE, 1, 1);
        self.reject_others("V003", "Boolean", &[TRUE_HANDLE, FALSE_HANDLE]);
        self.non_empty_branches(&[TRUE_HANDLE, FALSE_HANDLE]);
    }

    fn switch(&mut self) {
        if self.edges.is_empty() {
            let message = format!("Switch node '{}' must have at least 1 branch", self.node.id);
            self.push("V004", message, None);
            return;
        }

        let defaults = self.count(DEFAULT_HANDLE);
        if defaults > 1 {
            let message = format!(
                "Switch node '{}' has {} 'default' branches, expected at most 1",
                self.node.id, defaults
            );
            self.push("V004", message, None);
        }

        let mut seen = HashSet::new();
        let mut tagged = 0;
        let edges = self.edges;
        for edge in edges {
            match edge.handle() {
                Some(DEFAULT_HANDLE) => {}
                Some(tag) if !tag.trim().is_empty() => {
                    tagged += 1;
                    if !is_case_tag(tag) {
                        let message = format!(
                            "Switch node '{}' has case label '{}', which cannot contain quotes or backslashes",
                            self.node.id, tag
                        );
                        self.push("V004", message, Some(edge));
                    } else if !seen.insert(tag) {
                        let message = format!(
                            "Switch node '{}' has duplicate case label '{}'",
                            self.node.id, tag
                        );
                        self.push("V004", message, Some(edge));
                    }
                }
                _ => {
                    let message = format!(
                        "Switch node '{}' has a branch without a case label",
                        self.node.id
                    );
                    self.push("V004", message, Some(edge));
                }
            }
        }

        if tagged == 0 {
            let message = format!(
                "Switch node '{}' must have at least 1 labeled case besides 'default'",
                self.node.id
            );
            self.push("V004", message, None);
        }

        self.non_empty_branches(&[]);
    }

    fn loop_node(&mut self) {
        self.require("V005", "Loop", BODY_HANDLE, 1, 1);
        self.require("V005", "Loop", NEXT_HANDLE, 0, 1);
        self.reject_others("V005", "Loop", &[BODY_HANDLE, NEXT_HANDLE]);
        self.non_empty_branches(&[BODY_HANDLE]);
    }

    fn fork(&mut self) {
        let parallel = self.count(PARALLEL_HANDLE);
        if parallel < 2 {
            let message = format!(
                "Fork node '{}' needs at least 2 parallel branches, found {}",
                self.node.id, parallel
            );
            self.push("V006", message, None);
        }
        self.reject_others("V006", "Fork", &[PARALLEL_HANDLE]);
        self.non_empty_branches(&[PARALLEL_HANDLE]);
    }
}

fn describe_handle(handle: Option<&str>) -> String {
    match handle {
        Some(h) => format!("'{}'", h),
        None => "(none)".into(),
    }
}
