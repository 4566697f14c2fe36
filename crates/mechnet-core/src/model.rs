//! Domain records for the mechanistic network: modules, nodes, edges and
//! boundary variants. All of it is immutable reference data once loaded.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::region::{Region, Timescale};

/// Synthetic module holding every boundary (input/output) node.
pub const BOUNDARY_MODULE: &str = "BOUNDARY";

/// Synthetic module for user-defined nodes.
pub const CUSTOM_MODULE: &str = "CUSTOM";

/// What kind of entity a node is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// A measurable quantity or pool.
    Stock,
    /// A categorical condition.
    State,
    /// An external input/output variable with measured sub-variants.
    Boundary,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "STOCK",
            Self::State => "STATE",
            Self::Boundary => "BOUNDARY",
        }
    }
}

/// Non-exclusive classification tags used for filtering and highlighting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeRole {
    TherapeuticTarget,
    Biomarker,
    FeedbackHub,
    LeveragePoint,
    RateLimiter,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TherapeuticTarget => "THERAPEUTIC_TARGET",
            Self::Biomarker => "BIOMARKER",
            Self::FeedbackHub => "FEEDBACK_HUB",
            Self::LeveragePoint => "LEVERAGE_POINT",
            Self::RateLimiter => "RATE_LIMITER",
        }
    }

    /// Accepts the wire spelling as well as lowercase/kebab variants.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "THERAPEUTIC_TARGET" | "TARGET" => Some(Self::TherapeuticTarget),
            "BIOMARKER" => Some(Self::Biomarker),
            "FEEDBACK_HUB" | "HUB" => Some(Self::FeedbackHub),
            "LEVERAGE_POINT" => Some(Self::LeveragePoint),
            "RATE_LIMITER" => Some(Self::RateLimiter),
            _ => None,
        }
    }
}

/// Where a node lives, as annotated in the source data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compartment {
    /// Free-text anatomical or subcellular region ("Hippocampal", "csf", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Free-text cell type ("brain endothelial cell", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_type: Option<String>,
}

/// Ontology cross-references.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct References {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ontology: Vec<String>,
}

/// How a biomarker is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionMethod {
    Csf,
    Pet,
    Plasma,
    Mri,
    Cognitive,
    Genetic,
    Retinal,
    Eeg,
    Digital,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csf => "CSF",
            Self::Pet => "PET",
            Self::Plasma => "PLASMA",
            Self::Mri => "MRI",
            Self::Cognitive => "COGNITIVE",
            Self::Genetic => "GENETIC",
            Self::Retinal => "RETINAL",
            Self::Eeg => "EEG",
            Self::Digital => "DIGITAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CSF" => Some(Self::Csf),
            "PET" => Some(Self::Pet),
            "PLASMA" | "BLOOD" => Some(Self::Plasma),
            "MRI" => Some(Self::Mri),
            "COGNITIVE" => Some(Self::Cognitive),
            "GENETIC" => Some(Self::Genetic),
            "RETINAL" => Some(Self::Retinal),
            "EEG" => Some(Self::Eeg),
            "DIGITAL" => Some(Self::Digital),
            _ => None,
        }
    }
}

/// ATN(+) biomarker classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtnCategory {
    #[serde(rename = "A")]
    Amyloid,
    #[serde(rename = "T")]
    Tau,
    #[serde(rename = "N")]
    Neurodegeneration,
    #[serde(rename = "I")]
    Inflammation,
    #[serde(rename = "V")]
    Vascular,
}

impl AtnCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amyloid => "A",
            Self::Tau => "T",
            Self::Neurodegeneration => "N",
            Self::Inflammation => "I",
            Self::Vascular => "V",
        }
    }

    /// Accepts the single-letter code or the full name, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "amyloid" => Some(Self::Amyloid),
            "t" | "tau" => Some(Self::Tau),
            "n" | "neurodegeneration" => Some(Self::Neurodegeneration),
            "i" | "inflammation" => Some(Self::Inflammation),
            "v" | "vascular" => Some(Self::Vascular),
            _ => None,
        }
    }
}

/// Regulatory standing of a biomarker assay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegulatoryStatus {
    Approved,
    Breakthrough,
    Pending,
    Research,
}

impl RegulatoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Breakthrough => "BREAKTHROUGH",
            Self::Pending => "PENDING",
            Self::Research => "RESEARCH",
        }
    }

    /// Submitted or designated, but not yet cleared.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending | Self::Breakthrough)
    }
}

/// Biomarker metadata attached to a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionTimeline {
    /// Years before symptom onset at which the marker becomes abnormal.
    pub years_before_symptoms: f64,
    pub method: DetectionMethod,
    pub atn_category: AtnCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specificity: Option<f64>,
    pub regulatory_status: RegulatoryStatus,
    #[serde(default)]
    pub commercially_available: bool,
}

/// Which way a boundary variant pushes disease risk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectDirection {
    Protective,
    Neutral,
    Risk,
}

impl EffectDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Protective => "protective",
            Self::Neutral => "neutral",
            Self::Risk => "risk",
        }
    }
}

/// A named sub-state of a boundary node (genotype, age band, ...).
///
/// Magnitudes are relative-risk-like and only comparable between variants
/// of the same boundary node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryVariant {
    pub id: String,
    pub label: String,
    pub effect_direction: EffectDirection,
    pub effect_magnitude: f64,
    /// Population prevalence in 0..=1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BoundaryVariant {
    /// Position on the protective -> risk axis, used to order variants.
    fn risk_order(&self, other: &Self) -> Ordering {
        let rank = |v: &Self| match v.effect_direction {
            EffectDirection::Protective => 0,
            EffectDirection::Neutral => 1,
            EffectDirection::Risk => 2,
        };
        rank(self).cmp(&rank(other)).then_with(|| {
            let by_magnitude = self.effect_magnitude.total_cmp(&other.effect_magnitude);
            match self.effect_direction {
                // Stronger protection sorts first.
                EffectDirection::Protective => by_magnitude.reverse(),
                _ => by_magnitude,
            }
        })
    }
}

/// A biological entity or state in the causal graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub label: String,
    pub category: Category,
    pub module_id: String,
    /// Additional modules that reference this node. The node is not copied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<NodeRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment: Option<Compartment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<References>,
    /// Free-text timescale annotation ("hours", "yr", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timescale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_timeline: Option<DetectionTimeline>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<BoundaryVariant>,
}

impl Node {
    pub fn new(id: &str, category: Category, module_id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            category,
            module_id: module_id.to_string(),
            shared_with: Vec::new(),
            roles: Vec::new(),
            subtype: None,
            description: None,
            compartment: None,
            references: None,
            timescale: None,
            detection_timeline: None,
            variants: Vec::new(),
        }
    }

    pub fn is_boundary(&self) -> bool {
        self.category == Category::Boundary
    }

    pub fn is_biomarker(&self) -> bool {
        self.detection_timeline.is_some()
    }

    pub fn has_role(&self, role: NodeRole) -> bool {
        self.roles.contains(&role)
    }

    /// Primary module first, then every `sharedWith` reference.
    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.module_id.as_str()).chain(self.shared_with.iter().map(String::as_str))
    }

    pub fn belongs_to(&self, module_id: &str) -> bool {
        self.module_ids().any(|m| m == module_id)
    }

    pub fn variant(&self, variant_id: &str) -> Option<&BoundaryVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Variants ordered from most protective to highest risk.
    pub fn variants_by_effect(&self) -> Vec<&BoundaryVariant> {
        let mut variants: Vec<&BoundaryVariant> = self.variants.iter().collect();
        variants.sort_by(|a, b| a.risk_order(b));
        variants
    }

    pub fn region_annotation(&self) -> Option<&str> {
        self.compartment.as_ref()?.region.as_deref()
    }

    pub fn cell_type(&self) -> Option<&str> {
        self.compartment.as_ref()?.cell_type.as_deref()
    }
}

/// Sign of a causal link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Increases,
    Decreases,
    /// Direction depends on context; carries no fixed sign.
    Modulates,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increases => "increases",
            Self::Decreases => "decreases",
            Self::Modulates => "modulates",
        }
    }

    pub fn is_negative(&self) -> bool {
        *self == Self::Decreases
    }

    pub fn is_signed(&self) -> bool {
        *self != Self::Modulates
    }
}

/// A directed causal relation between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
}

impl Edge {
    pub fn new(id: &str, source: &str, target: &str, relation: Relation) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            relation,
            mechanism: None,
        }
    }
}

/// A named grouping of nodes. Purely presentational: modules never change
/// graph semantics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_region: Option<Region>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_timescale: Option<Timescale>,
}

impl Module {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: None,
            description: None,
            default_region: None,
            default_timescale: None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.id == BOUNDARY_MODULE || self.id == CUSTOM_MODULE
    }
}
