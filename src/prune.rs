//! Stage 1: prune orphans and validate acyclicity
//!
//! Nodes with no valid incident connection contribute nothing and are
//! dropped. The remaining graph is checked for directed cycles with a
//! depth-first search; a back-edge (an edge into a node still on the DFS
//! stack) aborts normalization.

use crate::diagnostics::Diagnostic;
use crate::error::{NormalizeError, NormalizeResult};
use crate::graph::Graph;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, Control, DfsEvent};
use std::collections::HashMap;
use tracing::debug;

/// Connected, acyclic part of a graph
///
/// Nodes keep their input order; adjacency lists keep connection order,
/// which linearization relies on.
#[derive(Debug)]
pub struct PrunedGraph<'a> {
    pub graph: &'a Graph,
    /// Indices into `graph.nodes` of the kept nodes, in input order
    pub nodes: Vec<usize>,
    /// Outgoing targets per kept node, as positions in `nodes`
    pub outgoing: Vec<Vec<usize>>,
    /// Incoming connection count per kept node
    pub incoming: Vec<usize>,
}

impl<'a> PrunedGraph<'a> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_id(&self, position: usize) -> &'a str {
        &self.graph.nodes[self.nodes[position]].id
    }

    /// Positions of nodes with no incoming connection, in input order
    pub fn roots(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&pos| self.incoming[pos] == 0)
            .collect()
    }
}

/// Drop orphans and dangling connections, then reject cycles
pub fn prune_and_validate<'a>(
    graph: &'a Graph,
    diagnostics: &mut Vec<Diagnostic>,
) -> NormalizeResult<PrunedGraph<'a>> {
    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(graph.nodes.len());
    for (index, node) in graph.nodes.iter().enumerate() {
        if index_of.insert(node.id.as_str(), index).is_some() {
            return Err(NormalizeError::DuplicateNode(node.id.clone()));
        }
    }

    // Resolve connections to node indices, skipping dangling ones
    let mut edges: Vec<(usize, usize)> = Vec::with_capacity(graph.connections.len());
    for conn in &graph.connections {
        match (
            index_of.get(conn.source.as_str()),
            index_of.get(conn.target.as_str()),
        ) {
            (Some(&from), Some(&to)) => edges.push((from, to)),
            _ => diagnostics.push(Diagnostic::DanglingConnection {
                source: conn.source.clone(),
                target: conn.target.clone(),
            }),
        }
    }

    let mut connected = vec![false; graph.nodes.len()];
    for &(from, to) in &edges {
        connected[from] = true;
        connected[to] = true;
    }

    let nodes: Vec<usize> = (0..graph.nodes.len()).filter(|&i| connected[i]).collect();
    let mut position_of = vec![usize::MAX; graph.nodes.len()];
    for (pos, &index) in nodes.iter().enumerate() {
        position_of[index] = pos;
    }

    let dropped = graph.nodes.len() - nodes.len();
    if dropped > 0 {
        debug!("Dropped {} orphan node(s)", dropped);
    }

    let mut outgoing = vec![Vec::new(); nodes.len()];
    let mut incoming = vec![0; nodes.len()];
    let mut dag: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), edges.len());
    let indices: Vec<NodeIndex> = (0..nodes.len()).map(|pos| dag.add_node(pos)).collect();

    for &(from, to) in &edges {
        let (from, to) = (position_of[from], position_of[to]);
        outgoing[from].push(to);
        incoming[to] += 1;
        dag.add_edge(indices[from], indices[to], ());
    }

    let pruned = PrunedGraph {
        graph,
        nodes,
        outgoing,
        incoming,
    };

    let back_edge = depth_first_search(&dag, indices.iter().copied(), |event| match event {
        DfsEvent::BackEdge(_, target) => Control::Break(target),
        _ => Control::Continue,
    });

    if let Some(target) = back_edge.break_value() {
        return Err(NormalizeError::CycleDetected {
            node: pruned.node_id(dag[target]).to_string(),
        });
    }

    debug!(
        "Pruned graph: {} node(s), {} connection(s)",
        pruned.len(),
        edges.len()
    );

    Ok(pruned)
}
