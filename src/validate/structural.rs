//! Graph-level structural validation rules.

use std::collections::HashSet;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::CompilerError;
use crate::parse::graph::FlowGraph;
use crate::parse::types::FlowSnapshot;

/// Duplicate node ids (V012) and edges with unknown endpoints (V008),
/// collected while indexing.
pub fn index_problems(_snapshot: &FlowSnapshot, graph: &FlowGraph, errors: &mut Vec<CompilerError>) {
    errors.extend(graph.edge_errors().iter().cloned());
}

pub fn v001_exactly_one_entry(
    _snapshot: &FlowSnapshot,
    graph: &FlowGraph,
    errors: &mut Vec<CompilerError>,
) {
    if graph.node_count() == 0 {
        errors.push(CompilerError::validate(
            "V001",
            "Flow has no entry node (the graph is empty)",
            None,
        ));
        return;
    }

    let entries: Vec<&str> = graph
        .nodes()
        .filter(|n| n.is_entry())
        .map(|n| n.id.as_str())
        .collect();

    match entries.as_slice() {
        [] => errors.push(CompilerError::validate(
            "V001",
            "Flow must have exactly 1 entry node, found 0",
            None,
        )),
        [_] => {}
        [_, extra @ ..] => {
            for id in extra {
                errors.push(CompilerError::validate(
                    "V001",
                    format!(
                        "Flow must have exactly 1 entry node, found {} ({})",
                        entries.len(),
                        quoted_list(entries.iter().copied())
                    ),
                    Some(id.to_string()),
                ));
            }
        }
    }
}

pub fn v010_entry_has_one_successor(
    _snapshot: &FlowSnapshot,
    graph: &FlowGraph,
    errors: &mut Vec<CompilerError>,
) {
    for node in graph.nodes().filter(|n| n.is_entry()) {
        let count = graph.outgoing_count(&node.id);
        if count != 1 {
            errors.push(CompilerError::validate(
                "V010",
                format!(
                    "Entry node '{}' must have exactly 1 outgoing edge, found {}",
                    node.id, count
                ),
                Some(node.id.clone()),
            ));
        }
    }
}

/// Every node must touch at least one edge, unless it is the only node.
pub fn v002_no_dangling_nodes(
    snapshot: &FlowSnapshot,
    graph: &FlowGraph,
    errors: &mut Vec<CompilerError>,
) {
    if graph.node_count() <= 1 {
        return;
    }

    let connected: HashSet<&str> = snapshot
        .edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();

    for node in graph.nodes() {
        if !connected.contains(node.id.as_str()) {
            errors.push(CompilerError::validate(
                "V002",
                format!("Node '{}' is not connected to any edge", node.id),
                Some(node.id.clone()),
            ));
        }
    }
}

/// Cycles are illegal except for the back-edge that closes a loop body.
/// One diagnostic per strongly connected component, named after its first
/// node in editor order.
pub fn v007_no_illegal_cycles(
    _snapshot: &FlowSnapshot,
    graph: &FlowGraph,
    errors: &mut Vec<CompilerError>,
) {
    let forward: DiGraph<(), ()> = graph.graph.filter_map(
        |_, _| Some(()),
        |e, _| (!graph.is_back_edge(e)).then_some(()),
    );

    let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&forward)
        .into_iter()
        .filter(|scc| match scc.as_slice() {
            [single] => forward.contains_edge(*single, *single),
            _ => true,
        })
        .map(|mut scc| {
            scc.sort();
            scc
        })
        .collect();
    cycles.sort_by_key(|scc| scc[0]);

    for scc in cycles {
        let first = &graph.graph[scc[0]].id;
        let members = quoted_list(scc.iter().map(|&idx| graph.graph[idx].id.as_str()));
        errors.push(CompilerError::validate(
            "V007",
            format!("Cycle detected at node '{}' (through {})", first, members),
            Some(first.clone()),
        ));
    }
}

/// V015: every branching node must hand its branches back at one join.
///
/// Join ownership depends on the whole graph, so this runs the lowering on
/// an otherwise valid graph and reports the merge conflict it finds.
pub fn v015_branches_share_one_join(
    _snapshot: &FlowSnapshot,
    graph: &FlowGraph,
    errors: &mut Vec<CompilerError>,
) {
    if !errors.is_empty() {
        return;
    }
    let Err(lowering) = crate::lower::lower(graph) else {
        return;
    };
    errors.extend(lowering.into_iter().filter(|e| e.code == "L006").map(|e| {
        CompilerError::validate(
            "V015",
            format!("{}; give them one shared join node", e.message),
            e.node_id,
        )
    }));
}

fn quoted_list<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    ids.map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(", ")
}
