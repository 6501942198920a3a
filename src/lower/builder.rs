//! Run builder: walk the graph from a start node, emit task fields, recurse
//! into control nodes, and resolve merge points.
//!
//! A run stops in front of a merge point and reports it as its exit. The
//! control construct whose branches account for every forward edge into the
//! merge point owns it, and the enclosing run continues there. That way a
//! join node is emitted exactly once, right after the construct.

use std::collections::HashSet;

use crate::error::CompilerError;
use crate::ir::types::{Expr, TaggedExpr};
use crate::parse::graph::{FlowGraph, OutEdge};
use crate::parse::types::*;

use super::field::{control_id, lower_field};

/// Node ids a run must not walk into.
pub type StopSet<'g> = HashSet<&'g str>;

/// A merge point where a run stopped, with the number of edges that reached it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exit<'g> {
    pub node: &'g str,
    pub arrivals: usize,
}

/// Elements of a straight-line run plus the merge point it stopped at.
#[derive(Debug, Default)]
pub struct Run<'g> {
    pub items: Vec<Expr>,
    pub exit: Option<Exit<'g>>,
}

/// A lowered control construct plus the merge point its branches stopped at.
struct Construct<'g> {
    expr: Expr,
    exit: Option<Exit<'g>>,
}

pub struct Lowerer<'g> {
    graph: &'g FlowGraph,
    /// Revisit guard across the whole compilation.
    emitted: HashSet<&'g str>,
}

impl<'g> Lowerer<'g> {
    pub fn new(graph: &'g FlowGraph) -> Self {
        Self {
            graph,
            emitted: HashSet::new(),
        }
    }

    /// Lower everything reachable from `start`. Merge points left over at
    /// this level are resumed in place, since no construct above can own them.
    pub fn lower_from(&mut self, start: &'g str) -> Result<Vec<Expr>, CompilerError> {
        let stop = StopSet::new();
        let mut items = Vec::new();
        let mut next = Some(start);

        while let Some(id) = next {
            let run = self.lower_run(id, &stop, true)?;
            items.extend(run.items);
            next = run.exit.map(|exit| {
                tracing::trace!(node = exit.node, "Resuming at top-level merge point");
                exit.node
            });
        }

        Ok(items)
    }

    /// Walk a straight-line run starting at `start`.
    ///
    /// `enter_merge` lets the first node be entered even when it is a merge
    /// point; callers set it when they own that merge point.
    pub fn lower_run(
        &mut self,
        start: &'g str,
        stop: &StopSet<'g>,
        enter_merge: bool,
    ) -> Result<Run<'g>, CompilerError> {
        let mut run = Run::default();
        let mut current = Some(start);
        let mut enter_merge = enter_merge;

        while let Some(id) = current {
            if stop.contains(id) || self.emitted.contains(id) {
                break;
            }
            if !enter_merge && self.graph.in_degree(id) > 1 {
                run.exit = Some(Exit {
                    node: id,
                    arrivals: 1,
                });
                break;
            }
            enter_merge = false;

            let node = self.node(id)?;
            let kind = node_kind(node)?;
            tracing::trace!(node = id, %kind, "Lowering node");

            match kind {
                NodeKind::Entry => {
                    return Err(CompilerError::lower(
                        "L001",
                        format!("Entry node '{}' reached from inside the flow", id),
                        Some(id.to_string()),
                    ));
                }
                NodeKind::Task => {
                    run.items.push(lower_field(node)?);
                    self.emitted.insert(id);
                    let out = self.outgoing(id);
                    current = match out.as_slice() {
                        [] => None,
                        [only] => Some(only.target()),
                        _ => {
                            return Err(CompilerError::lower(
                                "L007",
                                format!(
                                    "Task node '{}' has {} outgoing edges and no control semantics",
                                    id,
                                    out.len()
                                ),
                                Some(id.to_string()),
                            ));
                        }
                    };
                }
                NodeKind::Boolean | NodeKind::Switch | NodeKind::Loop | NodeKind::Fork => {
                    self.emitted.insert(id);
                    let construct = match kind {
                        NodeKind::Boolean => self.lower_boolean(node, stop)?,
                        NodeKind::Switch => self.lower_switch(node, stop)?,
                        NodeKind::Loop => self.lower_loop(node, stop)?,
                        _ => self.lower_fork(node, stop)?,
                    };
                    run.items.push(construct.expr);

                    current = None;
                    if let Some(exit) = construct.exit {
                        if exit.arrivals == self.graph.in_degree(exit.node) {
                            tracing::trace!(node = id, join = exit.node, "Construct owns merge point");
                            current = Some(exit.node);
                            enter_merge = true;
                        } else {
                            run.exit = Some(exit);
                        }
                    }
                }
            }
        }

        Ok(run)
    }

    fn lower_boolean(
        &mut self,
        node: &'g FlowNode,
        stop: &StopSet<'g>,
    ) -> Result<Construct<'g>, CompilerError> {
        let condition = control_id(node)?;
        let edges = self.outgoing(&node.id);
        let true_edge = required_edge(node, &edges, TRUE_HANDLE)?;
        let false_edge = required_edge(node, &edges, FALSE_HANDLE)?;

        let then_run = self.lower_branch(node, true_edge, stop)?;
        let else_run = self.lower_branch(node, false_edge, stop)?;
        let exit = self.merge_exits(node, [then_run.exit, else_run.exit])?;

        Ok(Construct {
            expr: Expr::If {
                condition,
                then_branch: Box::new(Expr::sequence(then_run.items)),
                else_branch: Box::new(Expr::sequence(else_run.items)),
            },
            exit,
        })
    }

    fn lower_switch(
        &mut self,
        node: &'g FlowNode,
        stop: &StopSet<'g>,
    ) -> Result<Construct<'g>, CompilerError> {
        let selector = control_id(node)?;
        let edges = self.outgoing(&node.id);
        if edges.is_empty() {
            return Err(missing_branch(node, "any"));
        }

        let mut cases = Vec::new();
        let mut default = None;
        let mut exits = Vec::new();

        for edge in edges {
            let run = self.lower_branch(node, edge, stop)?;
            exits.push(run.exit);
            let body = Expr::sequence(run.items);

            match edge.handle() {
                Some(DEFAULT_HANDLE) => {
                    if default.is_some() {
                        return Err(CompilerError::lower(
                            "L003",
                            format!("Switch node '{}' has more than one 'default' branch", node.id),
                            Some(node.id.clone()),
                        )
                        .with_edge(edge.edge.id.as_deref()));
                    }
                    default = Some(Box::new(body));
                }
                Some(tag) if !tag.is_empty() => cases.push(TaggedExpr {
                    tag: tag.to_string(),
                    body,
                }),
                _ => {
                    return Err(CompilerError::lower(
                        "L003",
                        format!("Switch node '{}' has a branch without a case label", node.id),
                        Some(node.id.clone()),
                    )
                    .with_edge(edge.edge.id.as_deref()));
                }
            }
        }

        let exit = self.merge_exits(node, exits)?;
        Ok(Construct {
            expr: Expr::Switch {
                selector,
                cases,
                default,
            },
            exit,
        })
    }

    /// The body walks with the loop node in its stop-set, so the back-edge
    /// ends the body instead of re-entering the loop.
    fn lower_loop(
        &mut self,
        node: &'g FlowNode,
        stop: &StopSet<'g>,
    ) -> Result<Construct<'g>, CompilerError> {
        let counter = control_id(node)?;
        let edges = self.outgoing(&node.id);
        let body_edge = required_edge(node, &edges, BODY_HANDLE)?;
        let next_edge = edges.iter().find(|e| e.handle() == Some(NEXT_HANDLE));

        let mut body_stop = stop.clone();
        body_stop.insert(node.id.as_str());
        let body = self.lower_branch(node, body_edge, &body_stop)?;

        let for_expr = Expr::For {
            counter,
            body: Box::new(Expr::sequence(body.items)),
        };

        let Some(next_edge) = next_edge else {
            return Ok(Construct {
                expr: for_expr,
                exit: body.exit,
            });
        };

        let next = self.lower_run(next_edge.target(), stop, false)?;
        let exit = self.merge_exits(node, [body.exit, next.exit])?;
        let mut items = vec![for_expr];
        items.extend(next.items);

        Ok(Construct {
            expr: Expr::sequence(items),
            exit,
        })
    }

    fn lower_fork(
        &mut self,
        node: &'g FlowNode,
        stop: &StopSet<'g>,
    ) -> Result<Construct<'g>, CompilerError> {
        let edges: Vec<OutEdge<'g>> = self
            .outgoing(&node.id)
            .into_iter()
            .filter(|e| e.handle() == Some(PARALLEL_HANDLE))
            .collect();
        if edges.len() < 2 {
            return Err(CompilerError::lower(
                "L003",
                format!(
                    "Fork node '{}' needs at least 2 parallel branches, found {}",
                    node.id,
                    edges.len()
                ),
                Some(node.id.clone()),
            ));
        }

        let mut branches = Vec::with_capacity(edges.len());
        let mut exits = Vec::with_capacity(edges.len());
        for edge in edges {
            let run = self.lower_branch(node, edge, stop)?;
            branches.push(Expr::sequence(run.items));
            exits.push(run.exit);
        }

        let exit = self.merge_exits(node, exits)?;
        Ok(Construct {
            expr: Expr::When { branches },
            exit,
        })
    }

    /// Lower the run behind one branch edge. An empty branch has no DSL
    /// spelling, so it is a contract error.
    fn lower_branch(
        &mut self,
        node: &'g FlowNode,
        edge: OutEdge<'g>,
        stop: &StopSet<'g>,
    ) -> Result<Run<'g>, CompilerError> {
        let run = self.lower_run(edge.target(), stop, false)?;
        if run.items.is_empty() {
            return Err(CompilerError::lower(
                "L004",
                format!(
                    "Branch {} of node '{}' is empty (it leads straight to '{}')",
                    edge.handle().map_or_else(|| "(unlabeled)".to_string(), |h| format!("'{}'", h)),
                    node.id,
                    edge.target()
                ),
                Some(node.id.clone()),
            )
            .with_edge(edge.edge.id.as_deref()));
        }
        Ok(run)
    }

    /// Combine the exits of a construct's branches. Branches may stop at the
    /// same merge point, in which case their arrivals add up; stopping at two
    /// different merge points cannot be expressed.
    fn merge_exits(
        &self,
        node: &FlowNode,
        exits: impl IntoIterator<Item = Option<Exit<'g>>>,
    ) -> Result<Option<Exit<'g>>, CompilerError> {
        let mut merged: Option<Exit<'g>> = None;
        for exit in exits.into_iter().flatten() {
            match &mut merged {
                None => merged = Some(exit),
                Some(m) if m.node == exit.node => m.arrivals += exit.arrivals,
                Some(m) => {
                    return Err(CompilerError::lower(
                        "L006",
                        format!(
                            "Branches of node '{}' converge on different merge points '{}' and '{}'",
                            node.id, m.node, exit.node
                        ),
                        Some(node.id.clone()),
                    ));
                }
            }
        }
        Ok(merged)
    }

    fn outgoing(&self, id: &str) -> Vec<OutEdge<'g>> {
        let graph: &'g FlowGraph = self.graph;
        graph.outgoing(id)
    }

    fn node(&self, id: &str) -> Result<&'g FlowNode, CompilerError> {
        let graph: &'g FlowGraph = self.graph;
        graph.node(id).ok_or_else(|| {
            CompilerError::lower(
                "L003",
                format!("Edge target '{}' does not exist", id),
                Some(id.to_string()),
            )
        })
    }
}

fn node_kind(node: &FlowNode) -> Result<NodeKind, CompilerError> {
    node.kind().ok_or_else(|| {
        CompilerError::lower(
            "L005",
            format!("Unknown node type '{}'", node.node_type),
            Some(node.id.clone()),
        )
    })
}

fn required_edge<'g>(
    node: &FlowNode,
    edges: &[OutEdge<'g>],
    handle: &str,
) -> Result<OutEdge<'g>, CompilerError> {
    edges
        .iter()
        .find(|e| e.handle() == Some(handle))
        .copied()
        .ok_or_else(|| missing_branch(node, handle))
}

fn missing_branch(node: &FlowNode, handle: &str) -> CompilerError {
    CompilerError::lower(
        "L003",
        format!(
            "{} node '{}' is missing its '{}' branch",
            node.node_type, node.id, handle
        ),
        Some(node.id.clone()),
    )
}
