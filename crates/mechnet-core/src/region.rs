//! Region and timescale inference.
//!
//! Every node gets a spatial region and a temporal bucket, either from its
//! own annotation or from an ordered chain of heuristics. Each rule table
//! is a slice evaluated front to back and the first hit wins, so table
//! order is the tie-break policy.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{Category, Module, Node};

/// Anatomical or compartment bucket, in layout axis order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    Systemic,
    BloodBrainBarrier,
    Cortex,
    Hippocampus,
    Subcortical,
    WhiteMatter,
    Interstitial,
    Synapse,
    Intracellular,
    Unknown,
}

/// Axis order for regions. `Unknown` is last: it carries the least
/// information.
pub const REGION_ORDER: [Region; 10] = [
    Region::Systemic,
    Region::BloodBrainBarrier,
    Region::Cortex,
    Region::Hippocampus,
    Region::Subcortical,
    Region::WhiteMatter,
    Region::Interstitial,
    Region::Synapse,
    Region::Intracellular,
    Region::Unknown,
];

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Systemic => "systemic",
            Self::BloodBrainBarrier => "blood-brain-barrier",
            Self::Cortex => "cortex",
            Self::Hippocampus => "hippocampus",
            Self::Subcortical => "subcortical",
            Self::WhiteMatter => "white-matter",
            Self::Interstitial => "interstitial",
            Self::Synapse => "synapse",
            Self::Intracellular => "intracellular",
            Self::Unknown => "unknown",
        }
    }

    /// Resolve a free-text region through the alias table.
    /// Case, whitespace, hyphens and underscores are ignored.
    pub fn from_alias(text: &str) -> Option<Self> {
        let key = normalize(text);
        REGION_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, region)| *region)
    }

    pub fn sort_index(&self) -> usize {
        REGION_ORDER
            .iter()
            .position(|r| r == self)
            .unwrap_or(REGION_ORDER.len())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Characteristic pace of change, fastest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timescale {
    Seconds,
    Minutes,
    Hours,
    Days,
    Months,
    Years,
    Decades,
}

pub const TIMESCALE_ORDER: [Timescale; 7] = [
    Timescale::Seconds,
    Timescale::Minutes,
    Timescale::Hours,
    Timescale::Days,
    Timescale::Months,
    Timescale::Years,
    Timescale::Decades,
];

/// Timescale assumed when nothing else applies.
pub const DEFAULT_TIMESCALE: Timescale = Timescale::Days;

impl Timescale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Months => "months",
            Self::Years => "years",
            Self::Decades => "decades",
        }
    }

    pub fn from_alias(text: &str) -> Option<Self> {
        let key = normalize(text);
        TIMESCALE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, scale)| *scale)
    }

    pub fn sort_index(&self) -> usize {
        TIMESCALE_ORDER
            .iter()
            .position(|t| t == self)
            .unwrap_or(TIMESCALE_ORDER.len() / 2)
    }
}

impl fmt::Display for Timescale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

fn normalize(text: &str) -> String {
    NON_ALNUM.replace_all(&text.to_lowercase(), "").into_owned()
}

/// Normalized alias -> region. Canonical names are listed too.
const REGION_ALIASES: &[(&str, Region)] = &[
    ("systemic", Region::Systemic),
    ("csf", Region::Systemic),
    ("cerebrospinalfluid", Region::Systemic),
    ("plasma", Region::Systemic),
    ("serum", Region::Systemic),
    ("blood", Region::Systemic),
    ("periphery", Region::Systemic),
    ("peripheral", Region::Systemic),
    ("liver", Region::Systemic),
    ("gut", Region::Systemic),
    ("bloodbrainbarrier", Region::BloodBrainBarrier),
    ("bbb", Region::BloodBrainBarrier),
    ("vascular", Region::BloodBrainBarrier),
    ("vasculature", Region::BloodBrainBarrier),
    ("endothelium", Region::BloodBrainBarrier),
    ("perivascular", Region::BloodBrainBarrier),
    ("neurovascularunit", Region::BloodBrainBarrier),
    ("cortex", Region::Cortex),
    ("cortical", Region::Cortex),
    ("neocortex", Region::Cortex),
    ("frontal", Region::Cortex),
    ("prefrontal", Region::Cortex),
    ("temporal", Region::Cortex),
    ("parietal", Region::Cortex),
    ("occipital", Region::Cortex),
    ("entorhinal", Region::Cortex),
    ("hippocampus", Region::Hippocampus),
    ("hippocampal", Region::Hippocampus),
    ("ca1", Region::Hippocampus),
    ("ca3", Region::Hippocampus),
    ("dentategyrus", Region::Hippocampus),
    ("subcortical", Region::Subcortical),
    ("basalforebrain", Region::Subcortical),
    ("nucleusbasalis", Region::Subcortical),
    ("brainstem", Region::Subcortical),
    ("locuscoeruleus", Region::Subcortical),
    ("thalamus", Region::Subcortical),
    ("striatum", Region::Subcortical),
    ("whitematter", Region::WhiteMatter),
    ("myelin", Region::WhiteMatter),
    ("corpuscallosum", Region::WhiteMatter),
    ("interstitial", Region::Interstitial),
    ("isf", Region::Interstitial),
    ("extracellular", Region::Interstitial),
    ("parenchyma", Region::Interstitial),
    ("synapse", Region::Synapse),
    ("synaptic", Region::Synapse),
    ("synapticcleft", Region::Synapse),
    ("presynaptic", Region::Synapse),
    ("postsynaptic", Region::Synapse),
    ("dendriticspine", Region::Synapse),
    ("intracellular", Region::Intracellular),
    ("cytosol", Region::Intracellular),
    ("cytoplasm", Region::Intracellular),
    ("nucleus", Region::Intracellular),
    ("lysosome", Region::Intracellular),
    ("lysosomal", Region::Intracellular),
    ("endosome", Region::Intracellular),
    ("mitochondria", Region::Intracellular),
    ("mitochondrial", Region::Intracellular),
    ("golgi", Region::Intracellular),
    ("er", Region::Intracellular),
    ("endoplasmicreticulum", Region::Intracellular),
    ("unknown", Region::Unknown),
];

/// Lowercase cell-type fragment -> region, matched with `contains`.
/// More specific fragments must precede the generic ones they contain
/// ("subcortical" before "cortical", "astrocyte endfoot" before "astrocyte").
const CELL_TYPE_REGIONS: &[(&str, Region)] = &[
    ("astrocyte endfoot", Region::BloodBrainBarrier),
    ("endfeet", Region::BloodBrainBarrier),
    ("endothelial", Region::BloodBrainBarrier),
    ("pericyte", Region::BloodBrainBarrier),
    ("smooth muscle", Region::BloodBrainBarrier),
    ("hippocampal", Region::Hippocampus),
    ("dentate granule", Region::Hippocampus),
    ("ca1", Region::Hippocampus),
    ("entorhinal", Region::Cortex),
    ("pyramidal", Region::Cortex),
    ("subcortical", Region::Subcortical),
    ("cortical", Region::Cortex),
    ("interneuron", Region::Cortex),
    ("cholinergic", Region::Subcortical),
    ("noradrenergic", Region::Subcortical),
    ("dopaminergic", Region::Subcortical),
    ("oligodendrocyte", Region::WhiteMatter),
    ("microglia", Region::Interstitial),
    ("astrocyte", Region::Interstitial),
    ("macrophage", Region::Systemic),
    ("monocyte", Region::Systemic),
    ("lymphocyte", Region::Systemic),
    ("t cell", Region::Systemic),
    ("hepatocyte", Region::Systemic),
    ("neuron", Region::Intracellular),
];

/// Node subtype -> region, exact match.
const SUBTYPE_REGIONS: &[(&str, Region)] = &[
    ("organelle", Region::Intracellular),
    ("enzyme", Region::Intracellular),
    ("kinase", Region::Intracellular),
    ("transcription_factor", Region::Intracellular),
    ("receptor", Region::Synapse),
    ("neurotransmitter", Region::Synapse),
    ("complement", Region::Synapse),
    ("cytokine", Region::Interstitial),
    ("oligomer", Region::Interstitial),
    ("aggregate", Region::Interstitial),
    ("plaque", Region::Interstitial),
    ("lipoprotein", Region::Systemic),
    ("hormone", Region::Systemic),
    ("metabolite", Region::Systemic),
    ("vessel", Region::BloodBrainBarrier),
    ("transporter", Region::BloodBrainBarrier),
];

const TIMESCALE_ALIASES: &[(&str, Timescale)] = &[
    ("s", Timescale::Seconds),
    ("sec", Timescale::Seconds),
    ("second", Timescale::Seconds),
    ("seconds", Timescale::Seconds),
    ("ms", Timescale::Seconds),
    ("milliseconds", Timescale::Seconds),
    ("min", Timescale::Minutes),
    ("mins", Timescale::Minutes),
    ("minute", Timescale::Minutes),
    ("minutes", Timescale::Minutes),
    ("h", Timescale::Hours),
    ("hr", Timescale::Hours),
    ("hrs", Timescale::Hours),
    ("hour", Timescale::Hours),
    ("hours", Timescale::Hours),
    ("d", Timescale::Days),
    ("day", Timescale::Days),
    ("days", Timescale::Days),
    ("week", Timescale::Days),
    ("weeks", Timescale::Days),
    ("month", Timescale::Months),
    ("months", Timescale::Months),
    ("y", Timescale::Years),
    ("yr", Timescale::Years),
    ("yrs", Timescale::Years),
    ("year", Timescale::Years),
    ("years", Timescale::Years),
    ("decade", Timescale::Decades),
    ("decades", Timescale::Decades),
    ("lifetime", Timescale::Decades),
];

/// Which rule produced a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionSource {
    Annotation,
    CellType,
    Subtype,
    ModuleDefault,
    Fallback,
}

impl RegionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotation => "annotation",
            Self::CellType => "cell-type",
            Self::Subtype => "subtype",
            Self::ModuleDefault => "module-default",
            Self::Fallback => "fallback",
        }
    }
}

/// Which rule produced a timescale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimescaleSource {
    Annotation,
    ModuleDefault,
    Fallback,
}

impl TimescaleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotation => "annotation",
            Self::ModuleDefault => "module-default",
            Self::Fallback => "fallback",
        }
    }
}

/// Region for `node`, with the rule that decided it.
///
/// `module` is the node's primary module, if known.
pub fn classify_region(node: &Node, module: Option<&Module>) -> (Region, RegionSource) {
    if let Some(text) = node.region_annotation() {
        match Region::from_alias(text) {
            Some(region) => return (region, RegionSource::Annotation),
            None => {
                tracing::debug!(node = %node.id, region = text, "unrecognised region annotation")
            }
        }
    }

    if let Some(cell_type) = node.cell_type() {
        let lowered = cell_type.to_lowercase();
        if let Some((_, region)) = CELL_TYPE_REGIONS
            .iter()
            .find(|(fragment, _)| lowered.contains(fragment))
        {
            return (*region, RegionSource::CellType);
        }
    }

    if let Some(subtype) = node.subtype.as_deref()
        && let Some((_, region)) = SUBTYPE_REGIONS.iter().find(|(s, _)| *s == subtype)
    {
        return (*region, RegionSource::Subtype);
    }

    if let Some(region) = module.and_then(|m| m.default_region) {
        return (region, RegionSource::ModuleDefault);
    }

    let region = match node.category {
        Category::Stock => Region::Intracellular,
        Category::Boundary | Category::State => Region::Unknown,
    };
    tracing::debug!(node = %node.id, region = %region, "region fell back to category default");
    (region, RegionSource::Fallback)
}

pub fn infer_region(node: &Node, module: Option<&Module>) -> Region {
    classify_region(node, module).0
}

/// Timescale for `node`, with the rule that decided it.
pub fn classify_timescale(node: &Node, module: Option<&Module>) -> (Timescale, TimescaleSource) {
    if let Some(text) = node.timescale.as_deref() {
        match Timescale::from_alias(text) {
            Some(scale) => return (scale, TimescaleSource::Annotation),
            None => {
                tracing::debug!(
                    node = %node.id,
                    timescale = text,
                    "unrecognised timescale annotation"
                )
            }
        }
    }

    if let Some(scale) = module.and_then(|m| m.default_timescale) {
        return (scale, TimescaleSource::ModuleDefault);
    }

    (DEFAULT_TIMESCALE, TimescaleSource::Fallback)
}

pub fn infer_timescale(node: &Node, module: Option<&Module>) -> Timescale {
    classify_timescale(node, module).0
}

/// Axis position of a region label. Unrecognised labels sort last.
pub fn region_sort_index(label: &str) -> usize {
    Region::from_alias(label)
        .map(|r| r.sort_index())
        .unwrap_or(REGION_ORDER.len())
}

/// Axis position of a timescale label. Unrecognised labels sort to the
/// middle of the axis.
pub fn timescale_sort_index(label: &str) -> usize {
    Timescale::from_alias(label)
        .map(|t| t.sort_index())
        .unwrap_or(TIMESCALE_ORDER.len() / 2)
}
