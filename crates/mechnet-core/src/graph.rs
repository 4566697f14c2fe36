//! The loaded network: nodes, edges, modules, loops and treatments with
//! lookup indexes. Read-only once constructed.

use std::collections::{HashMap, HashSet};

use crate::dataset::Dataset;
use crate::error::{DataError, Result};
use crate::loops::LoopRegistry;
use crate::model::{Edge, Module, Node, NodeRole};
use crate::region::{
    Region, RegionSource, Timescale, TimescaleSource, classify_region, classify_timescale,
};
use crate::treatment::Treatment;

#[derive(Debug)]
pub struct Network {
    version: String,
    modules: Vec<Module>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    treatments: Vec<Treatment>,
    loops: LoopRegistry,

    module_index: HashMap<String, usize>,
    node_index: HashMap<String, usize>,
    edge_index: HashMap<String, usize>,
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
}

impl Network {
    /// Validate `dataset` and build the indexes. Any integrity issue is
    /// fatal.
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        let issues = dataset.validate();
        if !issues.is_empty() {
            for issue in &issues {
                tracing::error!("integrity: {issue}");
            }
            return Err(DataError::Integrity(issues));
        }

        let Dataset {
            version,
            modules,
            nodes,
            edges,
            feedback_loops,
            treatments,
        } = dataset;

        let module_index = modules
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();
        let node_index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        let edge_index = edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();

        let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, edge) in edges.iter().enumerate() {
            outgoing.entry(edge.source.clone()).or_default().push(i);
            incoming.entry(edge.target.clone()).or_default().push(i);
        }

        let loops = LoopRegistry::build(feedback_loops, &edges, &nodes);

        tracing::info!(
            nodes = nodes.len(),
            edges = edges.len(),
            loops = loops.len(),
            treatments = treatments.len(),
            "network loaded"
        );

        Ok(Self {
            version,
            modules,
            nodes,
            edges,
            treatments,
            loops,
            module_index,
            node_index,
            edge_index,
            outgoing,
            incoming,
        })
    }

    /// The reference network shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_dataset(Dataset::bundled()?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_dataset(Dataset::from_json(json)?)
    }

    /// Rebuild the wire-format dataset.
    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            version: self.version.clone(),
            modules: self.modules.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            feedback_loops: self.loops.as_slice().to_vec(),
            treatments: self.treatments.clone(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn treatments(&self) -> &[Treatment] {
        &self.treatments
    }

    pub fn loops(&self) -> &LoopRegistry {
        &self.loops
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_index.get(id).map(|&i| &self.edges[i])
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.module_index.get(id).map(|&i| &self.modules[i])
    }

    /// Display position of a module; unknown modules sort last.
    pub fn module_index(&self, id: &str) -> usize {
        self.module_index
            .get(id)
            .copied()
            .unwrap_or(self.modules.len())
    }

    pub fn outgoing(&self, node_id: &str) -> Vec<&Edge> {
        self.edges_at(self.outgoing.get(node_id))
    }

    pub fn incoming(&self, node_id: &str) -> Vec<&Edge> {
        self.edges_at(self.incoming.get(node_id))
    }

    /// Edges whose source and target both lie in `node_ids`, in dataset
    /// order.
    pub fn edges_induced(&self, node_ids: &HashSet<&str>) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| {
                node_ids.contains(e.source.as_str()) && node_ids.contains(e.target.as_str())
            })
            .collect()
    }

    /// Nodes owned by `module_id` or shared with it.
    pub fn nodes_in_module(&self, module_id: &str) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.belongs_to(module_id))
            .collect()
    }

    pub fn nodes_with_role(&self, role: NodeRole) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.has_role(role)).collect()
    }

    pub fn boundary_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.is_boundary()).collect()
    }

    pub fn classify_region(&self, node: &Node) -> (Region, RegionSource) {
        classify_region(node, self.module(&node.module_id))
    }

    pub fn classify_timescale(&self, node: &Node) -> (Timescale, TimescaleSource) {
        classify_timescale(node, self.module(&node.module_id))
    }

    pub fn infer_region(&self, node: &Node) -> Region {
        self.classify_region(node).0
    }

    pub fn infer_timescale(&self, node: &Node) -> Timescale {
        self.classify_timescale(node).0
    }

    fn edges_at(&self, indices: Option<&Vec<usize>>) -> Vec<&Edge> {
        indices
            .map(|ids| ids.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }
}
