//! Referential and structural integrity checks over a dataset.
//!
//! Every problem is collected rather than stopping at the first, so a data
//! author sees the full list in one pass.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::dataset::Dataset;
use crate::loops::{LoopType, chain_cycle, computed_polarity, resolve_links};
use crate::model::{Category, Edge};

#[derive(Clone, Debug, PartialEq)]
pub enum IntegrityIssue {
    DuplicateId { kind: &'static str, id: String },
    UnknownModule { node: String, module: String },
    DanglingEdge { edge: String, endpoint: String },
    UnknownLoopEdge { loop_id: String, edge: String },
    UnknownInterventionPoint { loop_id: String, node: String },
    UnknownGhostEndpoint { loop_id: String, node: String },
    UnknownTreatmentTarget { treatment: String, node: String },
    VariantsOnNonBoundary { node: String },
    DuplicateVariant { node: String, variant: String },
    InvalidVariant { node: String, variant: String, reason: &'static str },
    LoopNotClosed { loop_id: String },
    LoopPolarityMismatch { loop_id: String, declared: LoopType, computed: LoopType },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { kind, id } => write!(f, "duplicate {kind} id '{id}'"),
            Self::UnknownModule { node, module } => {
                write!(f, "node '{node}' references unknown module '{module}'")
            }
            Self::DanglingEdge { edge, endpoint } => {
                write!(f, "edge '{edge}' references unknown node '{endpoint}'")
            }
            Self::UnknownLoopEdge { loop_id, edge } => {
                write!(f, "loop '{loop_id}' references unknown edge '{edge}'")
            }
            Self::UnknownInterventionPoint { loop_id, node } => {
                write!(f, "loop '{loop_id}' intervention point '{node}' is not a node")
            }
            Self::UnknownGhostEndpoint { loop_id, node } => {
                write!(f, "loop '{loop_id}' ghost edge references unknown node '{node}'")
            }
            Self::UnknownTreatmentTarget { treatment, node } => {
                write!(f, "treatment '{treatment}' targets unknown node '{node}'")
            }
            Self::VariantsOnNonBoundary { node } => {
                write!(f, "node '{node}' has variants but is not a BOUNDARY node")
            }
            Self::DuplicateVariant { node, variant } => {
                write!(f, "node '{node}' has duplicate variant '{variant}'")
            }
            Self::InvalidVariant { node, variant, reason } => {
                write!(f, "variant '{variant}' of '{node}': {reason}")
            }
            Self::LoopNotClosed { loop_id } => {
                write!(f, "loop '{loop_id}' does not form a single closed cycle")
            }
            Self::LoopPolarityMismatch { loop_id, declared, computed } => write!(
                f,
                "loop '{loop_id}' is declared {} but its link signs make it {}",
                declared.as_str(),
                computed.as_str()
            ),
        }
    }
}

impl Dataset {
    /// Run every integrity check. An empty result means the dataset is safe
    /// to load.
    pub fn validate(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        check_unique("module", self.modules.iter().map(|m| m.id.as_str()), &mut issues);
        check_unique("node", self.nodes.iter().map(|n| n.id.as_str()), &mut issues);
        check_unique("edge", self.edges.iter().map(|e| e.id.as_str()), &mut issues);
        check_unique("loop", self.feedback_loops.iter().map(|l| l.id.as_str()), &mut issues);
        check_unique("treatment", self.treatments.iter().map(|t| t.id.as_str()), &mut issues);

        let module_ids: HashSet<&str> = self.modules.iter().map(|m| m.id.as_str()).collect();
        let node_ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let edges: HashMap<&str, &Edge> = self.edges.iter().map(|e| (e.id.as_str(), e)).collect();

        for node in &self.nodes {
            for module in node.module_ids() {
                if !module_ids.contains(module) {
                    issues.push(IntegrityIssue::UnknownModule {
                        node: node.id.clone(),
                        module: module.to_string(),
                    });
                }
            }

            if !node.variants.is_empty() && node.category != Category::Boundary {
                issues.push(IntegrityIssue::VariantsOnNonBoundary { node: node.id.clone() });
            }

            let mut seen = HashSet::new();
            for variant in &node.variants {
                if !seen.insert(variant.id.as_str()) {
                    issues.push(IntegrityIssue::DuplicateVariant {
                        node: node.id.clone(),
                        variant: variant.id.clone(),
                    });
                }
                let invalid = |reason| IntegrityIssue::InvalidVariant {
                    node: node.id.clone(),
                    variant: variant.id.clone(),
                    reason,
                };
                if !variant.effect_magnitude.is_finite() || variant.effect_magnitude < 0.0 {
                    issues.push(invalid("effect magnitude must be finite and >= 0"));
                }
                if let Some(freq) = variant.frequency
                    && !(0.0..=1.0).contains(&freq)
                {
                    issues.push(invalid("frequency must be within 0..=1"));
                }
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    issues.push(IntegrityIssue::DanglingEdge {
                        edge: edge.id.clone(),
                        endpoint: endpoint.clone(),
                    });
                }
            }
        }

        for feedback_loop in &self.feedback_loops {
            let loop_id = &feedback_loop.id;
            let mut resolvable = true;

            for edge_id in &feedback_loop.edge_ids {
                if !edges.contains_key(edge_id.as_str()) {
                    resolvable = false;
                    issues.push(IntegrityIssue::UnknownLoopEdge {
                        loop_id: loop_id.clone(),
                        edge: edge_id.clone(),
                    });
                }
            }
            for point in &feedback_loop.intervention_points {
                if !node_ids.contains(point.as_str()) {
                    issues.push(IntegrityIssue::UnknownInterventionPoint {
                        loop_id: loop_id.clone(),
                        node: point.clone(),
                    });
                }
            }
            if let Some(ghost) = &feedback_loop.ghost_edge {
                for endpoint in [&ghost.source, &ghost.target] {
                    if !node_ids.contains(endpoint.as_str()) {
                        resolvable = false;
                        issues.push(IntegrityIssue::UnknownGhostEndpoint {
                            loop_id: loop_id.clone(),
                            node: endpoint.clone(),
                        });
                    }
                }
            }

            // Shape checks only make sense once every link resolves.
            if !resolvable {
                continue;
            }
            let links = resolve_links(feedback_loop, &edges);
            if chain_cycle(&links).is_none() {
                issues.push(IntegrityIssue::LoopNotClosed { loop_id: loop_id.clone() });
                continue;
            }
            if let Some(computed) = computed_polarity(&links)
                && computed != feedback_loop.loop_type
            {
                issues.push(IntegrityIssue::LoopPolarityMismatch {
                    loop_id: loop_id.clone(),
                    declared: feedback_loop.loop_type,
                    computed,
                });
            }
        }

        for treatment in &self.treatments {
            for target in &treatment.primary_targets {
                if !node_ids.contains(target.node_id.as_str()) {
                    issues.push(IntegrityIssue::UnknownTreatmentTarget {
                        treatment: treatment.id.clone(),
                        node: target.node_id.clone(),
                    });
                }
            }
        }

        issues
    }
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
    issues: &mut Vec<IntegrityIssue>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            issues.push(IntegrityIssue::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
}
