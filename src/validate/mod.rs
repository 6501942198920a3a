//! Graph-level validation phase.
//!
//! Validates the editor graph before lowering. Findings are returned as
//! data, never raised, so the editor can show every problem at once.

pub mod node_rules;
pub mod structural;

use crate::config::ValidationMode;
use crate::error::CompilerError;
use crate::parse::graph::FlowGraph;
use crate::parse::types::FlowSnapshot;

/// Outcome of validating a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// Always non-empty.
    Invalid(Vec<CompilerError>),
}

impl ValidationResult {
    fn from_errors(errors: Vec<CompilerError>) -> Self {
        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn diagnostics(&self) -> &[CompilerError] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(errors) => errors,
        }
    }

    pub fn into_result(self) -> Result<(), Vec<CompilerError>> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(errors) => Err(errors),
        }
    }
}

type Check = fn(&FlowSnapshot, &FlowGraph, &mut Vec<CompilerError>);

/// Checks in reporting order.
const CHECKS: &[Check] = &[
    structural::index_problems,
    structural::v001_exactly_one_entry,
    structural::v010_entry_has_one_successor,
    structural::v002_no_dangling_nodes,
    node_rules::validate_node_configs,
    structural::v007_no_illegal_cycles,
    structural::v015_branches_share_one_join,
];

/// Validate the whole graph.
///
/// In `CollectAll` mode every check runs. In `FailFast` mode validation
/// stops after the first check that reports anything.
pub fn validate_graph(
    snapshot: &FlowSnapshot,
    graph: &FlowGraph,
    mode: ValidationMode,
) -> ValidationResult {
    let mut errors = Vec::new();

    for check in CHECKS {
        check(snapshot, graph, &mut errors);
        if mode == ValidationMode::FailFast && !errors.is_empty() {
            break;
        }
    }

    if errors.is_empty() {
        tracing::debug!(nodes = graph.node_count(), "Flow graph is valid");
    } else {
        tracing::warn!(
            diagnostics = errors.len(),
            ?mode,
            "Flow graph failed validation"
        );
    }

    ValidationResult::from_errors(errors)
}
