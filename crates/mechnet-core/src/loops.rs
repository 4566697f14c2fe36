//! Feedback loop registry.
//!
//! Loops are static reference data: named cycles over the edge set, each
//! tagged reinforcing or balancing, optionally closed by a ghost edge that
//! is deliberately absent from the main edge list. Tipping-point fields are
//! presentation text and are never evaluated here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Edge, Node, Relation};

/// Polarity of a loop. Reinforcing loops have an even number of negative
/// links, balancing loops an odd number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopType {
    Reinforcing,
    Balancing,
}

impl LoopType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reinforcing => "reinforcing",
            Self::Balancing => "balancing",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionWindow {
    Prevention,
    Early,
    Late,
    Management,
}

impl InterventionWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prevention => "prevention",
            Self::Early => "early",
            Self::Late => "late",
            Self::Management => "management",
        }
    }
}

/// Closing link of a loop that is kept out of the primary edge set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostEdge {
    pub source: String,
    pub target: String,
    pub relation: Relation,
    pub mechanism: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TippingPoint {
    pub biomarker: String,
    /// Numeric or qualitative threshold, as display text.
    pub threshold: String,
    /// Time from crossing the threshold to runaway acceleration.
    pub timescale: String,
    pub interpretation: String,
    pub intervention_window: InterventionWindow,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackLoop {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub loop_type: LoopType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub edge_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ghost_edge: Option<GhostEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipping_point: Option<TippingPoint>,
    #[serde(default)]
    pub intervention_points: Vec<String>,
}

/// One resolved link of a loop, either a real edge or the ghost edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Link<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub relation: Relation,
}

/// Resolve a loop's links. Edge ids missing from `edges` are skipped; the
/// caller is expected to have reported them.
pub(crate) fn resolve_links<'a>(
    feedback_loop: &'a FeedbackLoop,
    edges: &HashMap<&str, &'a Edge>,
) -> Vec<Link<'a>> {
    let mut links: Vec<Link<'a>> = feedback_loop
        .edge_ids
        .iter()
        .filter_map(|id| edges.get(id.as_str()))
        .map(|e| Link {
            source: &e.source,
            target: &e.target,
            relation: e.relation,
        })
        .collect();
    if let Some(ghost) = &feedback_loop.ghost_edge {
        links.push(Link {
            source: &ghost.source,
            target: &ghost.target,
            relation: ghost.relation,
        });
    }
    links
}

/// Node ids in cycle order if `links` form exactly one simple directed
/// cycle, otherwise `None`.
pub(crate) fn chain_cycle<'a>(links: &[Link<'a>]) -> Option<Vec<&'a str>> {
    let first = links.first()?;
    let mut successor: HashMap<&str, &str> = HashMap::with_capacity(links.len());
    for link in links {
        if successor.insert(link.source, link.target).is_some() {
            return None;
        }
    }

    let mut order = Vec::with_capacity(links.len());
    let mut current = first.source;
    for _ in 0..links.len() {
        if order.contains(&current) {
            return None;
        }
        order.push(current);
        current = *successor.get(current)?;
    }
    (current == first.source).then_some(order)
}

/// Polarity implied by the link signs, or `None` when any link is unsigned.
pub(crate) fn computed_polarity(links: &[Link<'_>]) -> Option<LoopType> {
    if links.is_empty() || links.iter().any(|l| !l.relation.is_signed()) {
        return None;
    }
    let negatives = links.iter().filter(|l| l.relation.is_negative()).count();
    Some(if negatives % 2 == 0 {
        LoopType::Reinforcing
    } else {
        LoopType::Balancing
    })
}

/// Indexed, read-only view over the loops of a network.
#[derive(Clone, Debug, Default)]
pub struct LoopRegistry {
    loops: Vec<FeedbackLoop>,
    by_id: HashMap<String, usize>,
    by_node: HashMap<String, Vec<usize>>,
    by_module: HashMap<String, Vec<usize>>,
    cycles: Vec<Vec<String>>,
}

impl LoopRegistry {
    /// Index `loops` against the network's edges and nodes.
    pub fn build(loops: Vec<FeedbackLoop>, edges: &[Edge], nodes: &[Node]) -> Self {
        let edge_index: HashMap<&str, &Edge> = edges.iter().map(|e| (e.id.as_str(), e)).collect();
        let node_index: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut by_id = HashMap::with_capacity(loops.len());
        let mut by_node: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_module: HashMap<String, Vec<usize>> = HashMap::new();
        let mut cycles = Vec::with_capacity(loops.len());

        for (idx, feedback_loop) in loops.iter().enumerate() {
            by_id.insert(feedback_loop.id.clone(), idx);

            let links = resolve_links(feedback_loop, &edge_index);
            let cycle: Vec<String> = match chain_cycle(&links) {
                Some(order) => order.into_iter().map(String::from).collect(),
                None => {
                    let mut seen: Vec<String> = Vec::new();
                    for link in &links {
                        for id in [link.source, link.target] {
                            if !seen.iter().any(|s| s == id) {
                                seen.push(id.to_string());
                            }
                        }
                    }
                    seen
                }
            };

            let mut members: Vec<&str> = cycle.iter().map(String::as_str).collect();
            for point in &feedback_loop.intervention_points {
                if !members.contains(&point.as_str()) {
                    members.push(point);
                }
            }

            for member in &members {
                push_unique(by_node.entry(member.to_string()).or_default(), idx);
                if let Some(node) = node_index.get(member) {
                    for module in node.module_ids() {
                        push_unique(by_module.entry(module.to_string()).or_default(), idx);
                    }
                }
            }
            cycles.push(cycle);
        }

        Self {
            loops,
            by_id,
            by_node,
            by_module,
            cycles,
        }
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedbackLoop> {
        self.loops.iter()
    }

    pub fn as_slice(&self) -> &[FeedbackLoop] {
        &self.loops
    }

    pub fn get(&self, id: &str) -> Option<&FeedbackLoop> {
        self.by_id.get(id).map(|&idx| &self.loops[idx])
    }

    /// Loops whose cycle passes through `node_id` or that list it as an
    /// intervention point.
    pub fn loops_through_node(&self, node_id: &str) -> Vec<&FeedbackLoop> {
        self.collect(self.by_node.get(node_id))
    }

    /// Loops touching any node owned by or shared with `module_id`.
    pub fn loops_in_module(&self, module_id: &str) -> Vec<&FeedbackLoop> {
        self.collect(self.by_module.get(module_id))
    }

    pub fn by_type(&self, loop_type: LoopType) -> Vec<&FeedbackLoop> {
        self.loops
            .iter()
            .filter(|l| l.loop_type == loop_type)
            .collect()
    }

    pub fn with_tipping_points(&self) -> Vec<&FeedbackLoop> {
        self.loops
            .iter()
            .filter(|l| l.tipping_point.is_some())
            .collect()
    }

    pub fn by_intervention_window(&self, window: InterventionWindow) -> Vec<&FeedbackLoop> {
        self.loops
            .iter()
            .filter(|l| {
                l.tipping_point
                    .as_ref()
                    .is_some_and(|t| t.intervention_window == window)
            })
            .collect()
    }

    /// Node ids of the loop in cycle order, starting at the source of its
    /// first edge.
    pub fn cycle_nodes(&self, id: &str) -> Option<&[String]> {
        self.by_id.get(id).map(|&idx| self.cycles[idx].as_slice())
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&FeedbackLoop> {
        indices
            .map(|ids| ids.iter().map(|&idx| &self.loops[idx]).collect())
            .unwrap_or_default()
    }
}

fn push_unique(list: &mut Vec<usize>, idx: usize) {
    if list.last() != Some(&idx) {
        list.push(idx);
    }
}
