//! Left-to-right layer assignment for the visible subgraph.
//!
//! Kahn's algorithm run in rounds: every node whose in-degree reaches zero
//! in round `k` gets layer `k`. Biological graphs are full of feedback
//! loops, so nodes that never reach in-degree zero are not an error. They
//! all land in one extra layer after the last resolved round.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::graph::Network;
use crate::model::Edge;

/// Layer assignment for one visible subgraph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layering {
    /// Layer per node id.
    pub layers: BTreeMap<String, usize>,
    /// Number of rounds in which at least one node resolved.
    pub resolved_rounds: usize,
    /// Nodes left with residual in-degree (on or downstream of a cycle), in
    /// input order. They all sit at layer `resolved_rounds`.
    pub unresolved: Vec<String>,
}

impl Layering {
    pub fn get(&self, node_id: &str) -> Option<usize> {
        self.layers.get(node_id).copied()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Number of distinct layers in use.
    pub fn layer_count(&self) -> usize {
        self.resolved_rounds + usize::from(!self.unresolved.is_empty())
    }

    /// Node ids grouped by layer, ids sorted within each layer.
    pub fn columns(&self) -> Vec<Vec<String>> {
        let mut columns = vec![Vec::new(); self.layer_count()];
        for (id, &layer) in &self.layers {
            columns[layer].push(id.clone());
        }
        columns
    }
}

/// Assign a layer to every node in `node_ids`.
///
/// Only edges with both endpoints in `node_ids` count. Duplicate ids are
/// ignored after their first occurrence. Never fails: an empty input gives
/// an empty layering, and cyclic input pushes the unresolved nodes to the
/// tail.
pub fn compute_layers<'e, S: AsRef<str>>(
    node_ids: &[S],
    edges: impl IntoIterator<Item = &'e Edge>,
) -> Layering {
    let mut order: Vec<&str> = Vec::with_capacity(node_ids.len());
    let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(node_ids.len());
    for id in node_ids {
        let id = id.as_ref();
        if in_degree.insert(id, 0).is_none() {
            order.push(id);
        }
    }

    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        let (source, target) = (edge.source.as_str(), edge.target.as_str());
        if !in_degree.contains_key(source) || !in_degree.contains_key(target) {
            continue;
        }
        successors.entry(source).or_default().push(target);
        if let Some(d) = in_degree.get_mut(target) {
            *d += 1;
        }
    }

    let mut layers: BTreeMap<String, usize> = BTreeMap::new();
    let mut frontier: Vec<&str> = order
        .iter()
        .copied()
        .filter(|id| in_degree[id] == 0)
        .collect();
    let mut layer = 0;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for &id in &frontier {
            layers.insert(id.to_string(), layer);
            for &succ in successors.get(id).map(Vec::as_slice).unwrap_or_default() {
                if let Some(d) = in_degree.get_mut(succ) {
                    *d -= 1;
                    if *d == 0 {
                        next.push(succ);
                    }
                }
            }
        }
        frontier = next;
        layer += 1;
    }

    let unresolved: Vec<String> = order
        .iter()
        .filter(|id| !layers.contains_key(**id))
        .map(|id| id.to_string())
        .collect();
    if !unresolved.is_empty() {
        tracing::debug!(
            count = unresolved.len(),
            layer,
            "nodes with residual in-degree placed in tail layer"
        );
    }
    for id in &unresolved {
        layers.insert(id.clone(), layer);
    }

    Layering {
        layers,
        resolved_rounds: layer,
        unresolved,
    }
}

/// Strongly connected components of the induced subgraph that contain a
/// cycle (more than one node, or a self-loop). Each component is sorted;
/// components are ordered by their first id.
pub fn cyclic_components<'e, S: AsRef<str>>(
    node_ids: &[S],
    edges: impl IntoIterator<Item = &'e Edge>,
) -> Vec<Vec<String>> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::with_capacity(node_ids.len());
    for id in node_ids {
        let id = id.as_ref();
        index.entry(id).or_insert_with(|| graph.add_node(id));
    }

    let mut self_loops: HashSet<NodeIndex> = HashSet::new();
    for edge in edges {
        if let (Some(&s), Some(&t)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) {
            graph.add_edge(s, t, ());
            if s == t {
                self_loops.insert(s);
            }
        }
    }

    let mut components: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || self_loops.contains(&scc[0]))
        .map(|scc| {
            let mut ids: Vec<String> = scc.iter().map(|&i| graph[i].to_string()).collect();
            ids.sort();
            ids
        })
        .collect();
    components.sort();
    components
}

/// One column of an arranged layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub layer: usize,
    pub node_ids: Vec<String>,
}

/// Order each layer top to bottom by region axis, then timescale axis, then
/// module order, then id.
pub fn arrange(network: &Network, layering: &Layering) -> Vec<Column> {
    layering
        .columns()
        .into_iter()
        .enumerate()
        .map(|(layer, mut ids)| {
            ids.sort_by_cached_key(|id| {
                let key = network.node(id).map(|n| {
                    (
                        network.infer_region(n).sort_index(),
                        network.infer_timescale(n).sort_index(),
                        network.module_index(&n.module_id),
                    )
                });
                (key.unwrap_or((usize::MAX, usize::MAX, usize::MAX)), id.clone())
            });
            Column { layer, node_ids: ids }
        })
        .collect()
}
