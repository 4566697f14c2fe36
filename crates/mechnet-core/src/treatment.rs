//! Treatments and their node targets.
//!
//! The drug-effect calculation lives outside this crate. What it needs from
//! here is the data contract: every target names a node that exists in the
//! network, and the accessors below are plain filters over that data.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::Network;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentKind {
    SmallMolecule,
    Antibody,
    Supplement,
    Lifestyle,
    Device,
    GeneTherapy,
}

/// Development or regulatory status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentStatus {
    Approved,
    Phase3,
    Phase2,
    Phase1,
    Preclinical,
    Failed,
    /// Available without a disease-specific approval (lifestyle, supplements).
    Available,
}

impl TreatmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Phase3 => "phase3",
            Self::Phase2 => "phase2",
            Self::Phase1 => "phase1",
            Self::Preclinical => "preclinical",
            Self::Failed => "failed",
            Self::Available => "available",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace([' ', '_', '-'], "").as_str() {
            "approved" => Some(Self::Approved),
            "phase3" => Some(Self::Phase3),
            "phase2" => Some(Self::Phase2),
            "phase1" => Some(Self::Phase1),
            "preclinical" => Some(Self::Preclinical),
            "failed" => Some(Self::Failed),
            "available" => Some(Self::Available),
            _ => None,
        }
    }
}

/// Strength of supporting evidence, L1 (replicated RCTs) to L7 (mechanistic
/// speculation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvidenceLevel {
    L1,
    L2,
    L3,
    L4,
    L5,
    L6,
    L7,
}

impl EvidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::L4 => "L4",
            Self::L5 => "L5",
            Self::L6 => "L6",
            Self::L7 => "L7",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L1" | "1" => Some(Self::L1),
            "L2" | "2" => Some(Self::L2),
            "L3" | "3" => Some(Self::L3),
            "L4" | "4" => Some(Self::L4),
            "L5" | "5" => Some(Self::L5),
            "L6" | "6" => Some(Self::L6),
            "L7" | "7" => Some(Self::L7),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetEffect {
    Inhibit,
    Activate,
    Modulate,
}

impl TargetEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inhibit => "inhibit",
            Self::Activate => "activate",
            Self::Modulate => "modulate",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentTarget {
    pub node_id: String,
    pub effect: TargetEffect,
    /// Relative strength in 0..=1, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub id: String,
    pub name: String,
    pub kind: TreatmentKind,
    pub status: TreatmentStatus,
    pub evidence_level: EvidenceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
    pub primary_targets: Vec<TreatmentTarget>,
}

impl Treatment {
    pub fn targets_node(&self, node_id: &str) -> bool {
        self.primary_targets.iter().any(|t| t.node_id == node_id)
    }

    pub fn has_effect(&self, effect: TargetEffect) -> bool {
        self.primary_targets.iter().any(|t| t.effect == effect)
    }
}

impl Network {
    pub fn treatment(&self, id: &str) -> Option<&Treatment> {
        self.treatments().iter().find(|t| t.id == id)
    }

    pub fn treatments_targeting_node(&self, node_id: &str) -> Vec<&Treatment> {
        self.treatments()
            .iter()
            .filter(|t| t.targets_node(node_id))
            .collect()
    }

    pub fn treatments_by_status(&self, status: TreatmentStatus) -> Vec<&Treatment> {
        self.treatments()
            .iter()
            .filter(|t| t.status == status)
            .collect()
    }

    pub fn treatments_by_evidence_level(&self, level: EvidenceLevel) -> Vec<&Treatment> {
        self.treatments()
            .iter()
            .filter(|t| t.evidence_level == level)
            .collect()
    }

    /// Treatments that inhibit at least one target.
    pub fn inhibitors(&self) -> Vec<&Treatment> {
        self.treatments()
            .iter()
            .filter(|t| t.has_effect(TargetEffect::Inhibit))
            .collect()
    }

    /// Treatments that activate at least one target.
    pub fn activators(&self) -> Vec<&Treatment> {
        self.treatments()
            .iter()
            .filter(|t| t.has_effect(TargetEffect::Activate))
            .collect()
    }

    pub fn all_target_node_ids(&self) -> BTreeSet<&str> {
        self.treatments()
            .iter()
            .flat_map(|t| t.primary_targets.iter().map(|p| p.node_id.as_str()))
            .collect()
    }
}
