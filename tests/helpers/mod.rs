#![allow(dead_code)]

use flow_el_compiler::config::CompileOptions;
use flow_el_compiler::error::CompilerError;
use flow_el_compiler::parse::*;
use flow_el_compiler::validate::ValidationResult;

// =============================================================================
// Node builders
// =============================================================================

pub fn entry(id: &str) -> FlowNode {
    FlowNode {
        id: id.into(),
        node_type: "start".into(),
        data: NodeData::default(),
        position: None,
    }
}

/// Task node without parameters; renders as its bare business id.
pub fn task(id: &str, business_id: &str) -> FlowNode {
    node(id, "common", business_id)
}

pub fn task_with_params(id: &str, business_id: &str, params: Vec<(&str, ParamValue)>) -> FlowNode {
    let mut n = task(id, business_id);
    n.data.params = params
        .into_iter()
        .map(|(name, value)| NodeParam {
            name: Some(name.into()),
            value: Some(value),
        })
        .collect();
    n
}

pub fn boolean(id: &str, business_id: &str) -> FlowNode {
    node(id, "boolean", business_id)
}

pub fn switch(id: &str, business_id: &str) -> FlowNode {
    node(id, "switch", business_id)
}

pub fn for_loop(id: &str, business_id: &str) -> FlowNode {
    node(id, "for", business_id)
}

pub fn fork(id: &str, business_id: &str) -> FlowNode {
    node(id, "when", business_id)
}

pub fn node(id: &str, node_type: &str, business_id: &str) -> FlowNode {
    FlowNode {
        id: id.into(),
        node_type: node_type.into(),
        data: NodeData {
            node_id: Some(business_id.into()),
            params: vec![],
            label: None,
        },
        position: None,
    }
}

// =============================================================================
// Edge builders
// =============================================================================

/// Unlabeled edge with id `source-target`.
pub fn edge(source: &str, target: &str) -> FlowEdge {
    FlowEdge {
        id: Some(format!("{}-{}", source, target)),
        source: source.into(),
        target: target.into(),
        source_handle: None,
        target_handle: None,
    }
}

pub fn labeled(source: &str, target: &str, handle: &str) -> FlowEdge {
    FlowEdge {
        source_handle: Some(handle.into()),
        ..edge(source, target)
    }
}

pub fn parallel(source: &str, target: &str) -> FlowEdge {
    labeled(source, target, PARALLEL_HANDLE)
}

pub fn snapshot(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> FlowSnapshot {
    FlowSnapshot::new(nodes, edges)
}

// =============================================================================
// Pipeline shortcuts
// =============================================================================

pub fn compile(snapshot: &FlowSnapshot) -> String {
    flow_el_compiler::compile_flow(snapshot, &CompileOptions::default())
        .unwrap_or_else(|errors| panic!("Expected flow to compile, got: {:?}", errors))
}

pub fn compile_err(snapshot: &FlowSnapshot) -> Vec<CompilerError> {
    match flow_el_compiler::compile_flow(snapshot, &CompileOptions::default()) {
        Ok(el) => panic!("Expected compile errors, got: {}", el),
        Err(errors) => errors,
    }
}

pub fn validate(snapshot: &FlowSnapshot) -> ValidationResult {
    flow_el_compiler::validate_flow(snapshot, &CompileOptions::default())
}

pub fn codes(errors: &[CompilerError]) -> Vec<&str> {
    errors.iter().map(|e| e.code.as_str()).collect()
}

/// Diagnostic codes reported by the validator, in reporting order.
pub fn validation_codes(snapshot: &FlowSnapshot) -> Vec<String> {
    validate(snapshot)
        .diagnostics()
        .iter()
        .map(|e| e.code.clone())
        .collect()
}
