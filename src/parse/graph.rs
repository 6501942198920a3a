//! petgraph-based directed graph index over an editor snapshot.
//!
//! Built once per compile call. Holds the node lookup, the ordered adjacency
//! lists and the forward in-degrees, plus the set of loop back-edges so that
//! neither the validator nor the compiler treats a loop's return edge as a
//! cycle or a merge.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::algo::dominators;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use super::types::{BODY_HANDLE, FlowEdge, FlowNode, FlowSnapshot};
use crate::error::CompilerError;

/// An outgoing edge as seen from its source node.
#[derive(Debug, Clone, Copy)]
pub struct OutEdge<'g> {
    pub index: EdgeIndex,
    pub edge: &'g FlowEdge,
}

impl<'g> OutEdge<'g> {
    pub fn target(&self) -> &'g str {
        &self.edge.target
    }

    pub fn handle(&self) -> Option<&'g str> {
        self.edge.handle()
    }
}

#[derive(Debug)]
pub struct FlowGraph {
    pub graph: DiGraph<FlowNode, FlowEdge>,
    pub node_indices: HashMap<String, NodeIndex>,
    /// Outgoing edges per node, in editor order.
    outgoing: Vec<Vec<EdgeIndex>>,
    /// Incoming edge count per node, loop back-edges excluded.
    forward_in: Vec<usize>,
    back_edges: HashSet<EdgeIndex>,
    index_errors: Vec<CompilerError>,
}

impl FlowGraph {
    pub fn build(snapshot: &FlowSnapshot) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut index_errors = Vec::new();

        for node in &snapshot.nodes {
            if node_indices.contains_key(&node.id) {
                index_errors.push(CompilerError::validate(
                    "V012",
                    format!("Duplicate node id '{}'", node.id),
                    Some(node.id.clone()),
                ));
                continue;
            }
            let idx = graph.add_node(node.clone());
            node_indices.insert(node.id.clone(), idx);
        }

        let mut outgoing = vec![Vec::new(); graph.node_count()];
        for edge in &snapshot.edges {
            let source_idx = node_indices.get(&edge.source);
            let target_idx = node_indices.get(&edge.target);

            match (source_idx, target_idx) {
                (Some(&s), Some(&t)) => {
                    let e = graph.add_edge(s, t, edge.clone());
                    outgoing[s.index()].push(e);
                }
                (None, _) => {
                    index_errors.push(
                        CompilerError::validate(
                            "V008",
                            format!(
                                "Edge '{}' references unknown source node '{}'",
                                edge.display_id(),
                                edge.source
                            ),
                            None,
                        )
                        .with_edge(edge.id.as_deref()),
                    );
                }
                (_, None) => {
                    index_errors.push(
                        CompilerError::validate(
                            "V008",
                            format!(
                                "Edge '{}' references unknown target node '{}'",
                                edge.display_id(),
                                edge.target
                            ),
                            Some(edge.source.clone()),
                        )
                        .with_edge(edge.id.as_deref()),
                    );
                }
            }
        }

        let back_edges = find_loop_back_edges(&graph, &outgoing);

        let mut forward_in = vec![0; graph.node_count()];
        for e in graph.edge_indices() {
            if back_edges.contains(&e) {
                continue;
            }
            if let Some((_, t)) = graph.edge_endpoints(e) {
                forward_in[t.index()] += 1;
            }
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            back_edges = back_edges.len(),
            "Indexed flow graph"
        );

        FlowGraph {
            graph,
            node_indices,
            outgoing,
            forward_in,
            back_edges,
            index_errors,
        }
    }

    /// Problems found while indexing: duplicate node ids and edges whose
    /// endpoints do not exist.
    pub fn edge_errors(&self) -> &[CompilerError] {
        &self.index_errors
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.node_indices.get(id).map(|&idx| &self.graph[idx])
    }

    /// Indexed nodes in editor order.
    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Outgoing edges of `node_id`, in the order the editor listed them.
    pub fn outgoing(&self, node_id: &str) -> Vec<OutEdge<'_>> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        self.outgoing[idx.index()]
            .iter()
            .map(|&e| OutEdge {
                index: e,
                edge: &self.graph[e],
            })
            .collect()
    }

    pub fn outgoing_count(&self, node_id: &str) -> usize {
        self.node_indices
            .get(node_id)
            .map_or(0, |idx| self.outgoing[idx.index()].len())
    }

    /// Number of incoming edges, not counting loop back-edges.
    pub fn in_degree(&self, node_id: &str) -> usize {
        self.node_indices
            .get(node_id)
            .map_or(0, |idx| self.forward_in[idx.index()])
    }

    /// Number of incoming edges, back-edges included.
    pub fn raw_in_degree(&self, node_id: &str) -> usize {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return 0;
        };
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    pub fn is_back_edge(&self, edge: EdgeIndex) -> bool {
        self.back_edges.contains(&edge)
    }
}

/// Classify the edges that return from a loop body into its loop node.
///
/// `u -> L` is a back-edge when `L` is a loop, `L` strictly dominates `u`,
/// and `u` is reachable from the loop's body target without passing through
/// `L`. Dominators are computed from a virtual root wired to every entry
/// node and every node without predecessors, so graphs with zero or several
/// entries still classify consistently.
fn find_loop_back_edges(
    graph: &DiGraph<FlowNode, FlowEdge>,
    outgoing: &[Vec<EdgeIndex>],
) -> HashSet<EdgeIndex> {
    let mut back_edges = HashSet::new();

    let loops: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|&idx| graph[idx].is_loop())
        .collect();
    if loops.is_empty() {
        return back_edges;
    }

    let mut rooted: DiGraph<(), ()> = graph.map(|_, _| (), |_, _| ());
    let root = rooted.add_node(());
    for idx in graph.node_indices() {
        let no_preds = graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
            .is_none();
        if graph[idx].is_entry() || no_preds {
            rooted.add_edge(root, idx, ());
        }
    }
    let doms = dominators::simple_fast(&rooted, root);

    for loop_idx in loops {
        let body_target = outgoing[loop_idx.index()]
            .iter()
            .find(|&&e| graph[e].handle() == Some(BODY_HANDLE))
            .and_then(|&e| graph.edge_endpoints(e))
            .map(|(_, t)| t);
        let Some(body_target) = body_target else {
            continue;
        };

        let in_body = reachable_avoiding(graph, body_target, loop_idx);

        for edge in graph.edges_directed(loop_idx, Direction::Incoming) {
            let source = edge.source();
            if source == loop_idx || !in_body.contains(&source) {
                continue;
            }
            let dominated = doms
                .dominators(source)
                .is_some_and(|mut chain| chain.any(|d| d == loop_idx));
            if dominated {
                back_edges.insert(edge.id());
            }
        }
    }

    back_edges
}

/// Nodes reachable from `start` without entering `avoid`.
fn reachable_avoiding(
    graph: &DiGraph<FlowNode, FlowEdge>,
    start: NodeIndex,
    avoid: NodeIndex,
) -> HashSet<NodeIndex> {
    let mut seen = HashSet::new();
    if start == avoid {
        return seen;
    }
    let mut queue = VecDeque::from([start]);
    while let Some(idx) = queue.pop_front() {
        if !seen.insert(idx) {
            continue;
        }
        for next in graph.neighbors_directed(idx, Direction::Outgoing) {
            if next != avoid && !seen.contains(&next) {
                queue.push_back(next);
            }
        }
    }
    seen
}
