//! Parse phase: editor JSON → Rust types + graph construction.

pub mod graph;
pub mod types;

pub use graph::FlowGraph;
pub use types::*;

use crate::error::CompilerError;

/// Deserialize an editor snapshot JSON string into a `FlowSnapshot`.
pub fn parse(json: &str) -> Result<FlowSnapshot, Vec<CompilerError>> {
    serde_json::from_str::<FlowSnapshot>(json).map_err(|e| {
        vec![CompilerError::parse(
            "P001",
            format!("Failed to parse flow JSON: {}", e),
        )]
    })
}

/// Parse JSON and build the graph in one step.
pub fn parse_and_build(json: &str) -> Result<(FlowSnapshot, FlowGraph), Vec<CompilerError>> {
    let snapshot = parse(json)?;
    let graph = FlowGraph::build(&snapshot);
    let errors = graph.edge_errors().to_vec();
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok((snapshot, graph))
}
