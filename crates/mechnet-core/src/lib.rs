//! Mechanistic disease network core.
//!
//! Models Alzheimer's pathophysiology as a typed, signed causal graph:
//! nodes grouped into mechanistic modules, boundary nodes carrying genetic
//! or demographic variants, curated feedback loops, biomarker detection
//! timelines and treatment targets. Provides region and timescale
//! inference, cycle-tolerant DAG layering and a pure filter/view state
//! machine for the visible subgraph.
//!
//! Zero I/O beyond the dataset compiled into the crate.

pub mod biomarkers;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod graph;
pub mod layering;
pub mod loops;
pub mod model;
pub mod region;
pub mod treatment;
pub mod validate;

pub use dataset::{CURRENT_VERSION, Dataset};
pub use error::{DataError, Result};
pub use filter::{
    Emphasis, FilterEvent, FilterState, ModuleVisibility, RenderHint, VariantRef, ViewMode,
    ViewOptions, VisibleSubgraph, visible_subgraph,
};
pub use graph::Network;
pub use layering::{Column, Layering, arrange, compute_layers, cyclic_components};
pub use loops::{
    FeedbackLoop, GhostEdge, InterventionWindow, LoopRegistry, LoopType, TippingPoint,
};
pub use model::{
    AtnCategory, BOUNDARY_MODULE, BoundaryVariant, CUSTOM_MODULE, Category, Compartment,
    DetectionMethod, DetectionTimeline, Edge, EffectDirection, Module, Node, NodeRole,
    References, RegulatoryStatus, Relation,
};
pub use region::{
    DEFAULT_TIMESCALE, REGION_ORDER, Region, RegionSource, TIMESCALE_ORDER, Timescale,
    TimescaleSource, infer_region, infer_timescale, region_sort_index, timescale_sort_index,
};
pub use treatment::{
    EvidenceLevel, TargetEffect, Treatment, TreatmentKind, TreatmentStatus, TreatmentTarget,
};
pub use validate::IntegrityIssue;
