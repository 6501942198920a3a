//! Lowering phase: FlowGraph → Expr.
//!
//! Transforms the validated editor graph into the DSL expression tree
//! consumed by codegen. The graph is assumed to have passed validation;
//! anything it still gets wrong surfaces as a contract error (`L0xx`)
//! naming the offending node, never as a partial tree.

pub mod builder;
pub mod field;

use crate::error::CompilerError;
use crate::ir::types::Expr;
use crate::parse::graph::FlowGraph;

use builder::Lowerer;

/// Lower a graph into a single `THEN(...)` rooted expression.
pub fn lower(graph: &FlowGraph) -> Result<Expr, Vec<CompilerError>> {
    let start = resolve_entry(graph).map_err(|e| vec![e])?;
    tracing::debug!(start, "Lowering flow from entry successor");

    let items = Lowerer::new(graph).lower_from(start).map_err(|e| vec![e])?;
    Ok(Expr::then(items))
}

/// Find the unique entry node and return its single successor.
fn resolve_entry(graph: &FlowGraph) -> Result<&str, CompilerError> {
    let mut entries = graph.nodes().filter(|n| n.is_entry());
    let entry = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        (None, _) => {
            return Err(CompilerError::lower("L001", "No entry node found", None));
        }
        (Some(_), Some(second)) => {
            return Err(CompilerError::lower(
                "L001",
                "Flow has more than one entry node",
                Some(second.id.clone()),
            ));
        }
    };

    match graph.outgoing(&entry.id).as_slice() {
        [only] => Ok(only.target()),
        other => Err(CompilerError::lower(
            "L001",
            format!(
                "Entry node '{}' must have exactly 1 outgoing edge, found {}",
                entry.id,
                other.len()
            ),
            Some(entry.id.clone()),
        )),
    }
}
