//! Compiles flow-editor graphs into the `THEN`/`IF`/`SWITCH`/`FOR`/`WHEN`
//! expression DSL, with a structural validator that rejects graphs the
//! compiler cannot lower.

pub mod codegen;
pub mod config;
pub mod error;
pub mod ir;
pub mod lower;
pub mod parse;
pub mod validate;
pub mod wasm;

use config::CompileOptions;
use error::CompilerError;
use parse::{FlowGraph, FlowSnapshot};
use validate::ValidationResult;

/// Run the structural validator over a snapshot.
pub fn validate_flow(snapshot: &FlowSnapshot, options: &CompileOptions) -> ValidationResult {
    let graph = FlowGraph::build(snapshot);
    validate::validate_graph(snapshot, &graph, options.validation)
}

/// Full pipeline: index → validate → lower → tree check → render.
///
/// Returns either the complete DSL string or every problem found; never a
/// partial string.
pub fn compile_flow(
    snapshot: &FlowSnapshot,
    options: &CompileOptions,
) -> Result<String, Vec<CompilerError>> {
    tracing::debug!(
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        "Compiling flow"
    );

    let graph = FlowGraph::build(snapshot);
    validate::validate_graph(snapshot, &graph, options.validation).into_result()?;

    let expr = lower::lower(&graph)?;

    let ir_errors = ir::validate_ir(&expr);
    if !ir_errors.is_empty() {
        return Err(ir_errors.into_iter().map(CompilerError::from).collect());
    }

    Ok(codegen::render(&expr, options.layout))
}

/// Parse editor JSON and compile it.
pub fn compile_json(json: &str, options: &CompileOptions) -> Result<String, Vec<CompilerError>> {
    let snapshot = parse::parse(json)?;
    compile_flow(&snapshot, options)
}
