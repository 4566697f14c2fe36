//! Integration tests over the bundled reference network:
//! load → validate → query → filter → layer.

use std::collections::HashSet;

use mechnet_core::{
    BOUNDARY_MODULE, Dataset, EvidenceLevel, FilterEvent, FilterState, InterventionWindow, LoopType,
    ModuleVisibility, Network, NodeRole, Region, RegionSource, Timescale, TimescaleSource,
    TreatmentStatus, ViewMode, ViewOptions, arrange, compute_layers, cyclic_components,
    visible_subgraph,
};

fn network() -> Network {
    Network::bundled().expect("bundled network should load")
}

fn ids<'a, T>(items: impl IntoIterator<Item = &'a T>, id: impl Fn(&'a T) -> &'a str) -> Vec<&'a str>
where
    T: 'a,
{
    items.into_iter().map(id).collect()
}

#[test]
fn bundled_dataset_has_no_integrity_issues() {
    let ds = Dataset::bundled().unwrap();
    let issues = ds.validate();
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn ids_are_unique_and_edges_resolve() {
    let net = network();
    let node_ids: HashSet<&str> = net.nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(node_ids.len(), net.nodes().len());
    let edge_ids: HashSet<&str> = net.edges().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edge_ids.len(), net.edges().len());

    for edge in net.edges() {
        assert!(net.node(&edge.source).is_some(), "{} source", edge.id);
        assert!(net.node(&edge.target).is_some(), "{} target", edge.id);
    }
    for node in net.nodes() {
        for module in node.module_ids() {
            assert!(net.module(module).is_some(), "{} -> {module}", node.id);
        }
    }
}

#[test]
fn boundary_nodes_carry_variants() {
    let net = network();
    let boundary = net.boundary_nodes();
    assert!(!boundary.is_empty());
    for node in &boundary {
        assert_eq!(node.module_id, BOUNDARY_MODULE);
        assert!(!node.variants.is_empty(), "{} has no variants", node.id);
    }
    let apoe = net.node("apoe_genotype").unwrap();
    let ordered: Vec<&str> = apoe.variants_by_effect().iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ordered, ["e2", "e3", "e4_het", "e4_hom"]);
}

#[test]
fn every_loop_closes_with_declared_polarity() {
    let net = network();
    assert_eq!(net.loops().len(), 5);
    for feedback_loop in net.loops().iter() {
        let cycle = net.loops().cycle_nodes(&feedback_loop.id).unwrap();
        let expected =
            feedback_loop.edge_ids.len() + usize::from(feedback_loop.ghost_edge.is_some());
        assert_eq!(cycle.len(), expected, "{}", feedback_loop.id);
    }

    let ferroptosis = net.loops().cycle_nodes("iron_ferroptosis").unwrap();
    assert_eq!(ferroptosis, ["labile_iron", "mitochondrial_ros", "ferroptosis"]);
    // The ghost edge closes the loop but is not part of the edge set.
    assert!(
        net.outgoing("ferroptosis")
            .iter()
            .all(|e| e.target != "labile_iron")
    );
}

#[test]
fn loop_registry_queries() {
    let net = network();
    let through = ids(net.loops().loops_through_node("abeta_oligomers"), |l| l.id.as_str());
    assert_eq!(through, ["amyloid_inflammasome", "lysosome_autophagy", "vascular_clearance"]);

    let balancing = ids(net.loops().by_type(LoopType::Balancing), |l| l.id.as_str());
    assert_eq!(balancing, ["trem2_plaque"]);

    let early = ids(
        net.loops().by_intervention_window(InterventionWindow::Early),
        |l| l.id.as_str(),
    );
    assert_eq!(early, ["trem2_plaque", "vascular_clearance"]);
    assert_eq!(net.loops().with_tipping_points().len(), 3);

    // labile_iron is owned by M09 and shared with M02.
    assert!(
        net.loops()
            .loops_in_module("M02")
            .iter()
            .any(|l| l.id == "iron_ferroptosis")
    );
}

#[test]
fn biomarkers_detectable_earlier_are_a_subset() {
    let net = network();
    let at_10 = ids(net.biomarkers_detectable_at(10.0), |n| n.id.as_str());
    let at_15 = ids(net.biomarkers_detectable_at(15.0), |n| n.id.as_str());
    assert!(net.biomarkers_detectable_at(40.0).is_empty());
    assert!(at_15.iter().all(|id| at_10.contains(id)));
    assert!(at_10.len() > at_15.len());

    let timeline = ids(net.biomarkers_by_timeline(), |n| n.id.as_str());
    assert_eq!(timeline.first(), Some(&"abeta_plaques"));
    assert_eq!(timeline.last(), Some(&"cognitive_decline"));

    let pending = ids(net.pending_biomarkers(), |n| n.id.as_str());
    assert_eq!(pending, ["plasma_ptau217", "plasma_gfap"]);
}

#[test]
fn treatment_accessors() {
    let net = network();
    let bbb = ids(net.treatments_targeting_node("bbb_integrity"), |t| t.id.as_str());
    assert_eq!(bbb, ["exercise"]);
    assert_eq!(net.inhibitors().len(), 6);
    assert_eq!(net.activators().len(), 3);
    assert_eq!(net.treatments_by_status(TreatmentStatus::Approved).len(), 3);
    let l1 = ids(net.treatments_by_evidence_level(EvidenceLevel::L1), |t| t.id.as_str());
    assert_eq!(l1, ["lecanemab", "donanemab", "donepezil"]);
    let l5 = ids(net.treatments_by_evidence_level(EvidenceLevel::L5), |t| t.id.as_str());
    assert_eq!(l5, ["al002", "dapansutrile"]);
    assert!(net.treatments_by_evidence_level(EvidenceLevel::L7).is_empty());
    assert!(net.treatment("lecanemab").is_some());
    for target in net.all_target_node_ids() {
        assert!(net.node(target).is_some(), "dangling target {target}");
    }
}

#[test]
fn region_and_timescale_inference() {
    let net = network();
    let region = |id: &str| net.classify_region(net.node(id).unwrap());
    let timescale = |id: &str| net.classify_timescale(net.node(id).unwrap());

    assert_eq!(region("synapse_loss"), (Region::Hippocampus, RegionSource::Annotation));
    assert_eq!(region("tau_aggregates"), (Region::Cortex, RegionSource::Annotation));
    assert_eq!(region("csf_abeta42"), (Region::Systemic, RegionSource::Annotation));
    assert_eq!(region("bbb_integrity"), (Region::BloodBrainBarrier, RegionSource::CellType));
    assert_eq!(region("cholinergic_tone"), (Region::Subcortical, RegionSource::CellType));
    assert_eq!(region("il1b"), (Region::Interstitial, RegionSource::Subtype));
    assert_eq!(region("insulin_resistance"), (Region::Systemic, RegionSource::ModuleDefault));
    assert_eq!(region("apoe_genotype"), (Region::Unknown, RegionSource::Fallback));

    assert_eq!(timescale("age"), (Timescale::Decades, TimescaleSource::Annotation));
    assert_eq!(timescale("bbb_integrity"), (Timescale::Days, TimescaleSource::Annotation));
    assert_eq!(timescale("abeta_plaques"), (Timescale::Years, TimescaleSource::ModuleDefault));
    assert_eq!(timescale("sex"), (Timescale::Days, TimescaleSource::Fallback));
}

#[test]
fn full_network_layering_tolerates_cycles() {
    let net = network();
    let node_ids: Vec<&str> = net.nodes().iter().map(|n| n.id.as_str()).collect();
    let layering = compute_layers(&node_ids, net.edges());

    assert_eq!(layering.len(), net.nodes().len());
    for source in ["apoe_genotype", "age", "sex", "systemic_inflammation"] {
        assert_eq!(layering.get(source), Some(0), "{source}");
    }
    assert_eq!(layering.get("mtorc1_activity"), Some(2));
    // Everything downstream of a loop shares the tail layer.
    let tail = layering.resolved_rounds;
    assert_eq!(layering.get("abeta_oligomers"), Some(tail));
    assert_eq!(layering.get("cognitive_decline"), Some(tail));

    let components = cyclic_components(&node_ids, net.edges());
    for feedback_loop in net.loops().iter().filter(|l| l.ghost_edge.is_none()) {
        let cycle = net.loops().cycle_nodes(&feedback_loop.id).unwrap();
        assert!(
            components
                .iter()
                .any(|c| cycle.iter().all(|id| c.contains(id))),
            "{} not inside one component",
            feedback_loop.id
        );
    }

    let columns = arrange(&net, &layering);
    assert_eq!(columns.len(), layering.layer_count());
    let total: usize = columns.iter().map(|c| c.node_ids.len()).sum();
    assert_eq!(total, net.nodes().len());
}

#[test]
fn hiding_everything_but_boundaries_forces_graph_view() {
    let net = network();
    let state = net
        .modules()
        .iter()
        .filter(|m| m.id != BOUNDARY_MODULE)
        .fold(FilterState::new(), |state, m| {
            state.apply(&FilterEvent::SetModule(m.id.clone(), ModuleVisibility::Off))
        });
    let view = visible_subgraph(&net, &state, &ViewOptions::default());
    assert_eq!(view.node_ids, ["apoe_genotype", "age", "sex"]);
    assert!(view.edges.is_empty());
    assert!(view.forced_graph_view);
    assert!(
        view.hints
            .values()
            .all(|h| h.view_mode == Some(ViewMode::Graph))
    );

    let layering = compute_layers(&view.node_ids, view.edges.iter().copied());
    assert_eq!(layering.layer_count(), 1);
}

#[test]
fn partial_module_is_narrowed_to_neighbours_of_visible_nodes() {
    let net = network();
    // Only M06 on, M07 partial: tau nodes fed by amyloid stay, the rest go.
    let state = net
        .modules()
        .iter()
        .filter(|m| m.id != "M06")
        .fold(FilterState::new(), |state, m| {
            state.apply(&FilterEvent::SetModule(m.id.clone(), ModuleVisibility::Off))
        })
        .apply(&FilterEvent::SetModule("M07".to_string(), ModuleVisibility::Partial));
    let view = visible_subgraph(&net, &state, &ViewOptions::default());

    assert!(view.contains("tau_hyperphosphorylation"));
    assert!(!view.contains("tau_aggregates"));
    assert!(!view.contains("plasma_ptau217"));
    // apoe_lipidation is owned by M10 but shared with M06.
    assert!(view.contains("apoe_lipidation"));
    assert_eq!(view.boundary_count, 0);
}

#[test]
fn role_highlight_marks_biomarkers() {
    let net = network();
    let state = FilterState::new().apply(&FilterEvent::ToggleRoleHighlight(NodeRole::Biomarker));
    let view = visible_subgraph(&net, &state, &ViewOptions::default());
    let highlighted = view
        .hints
        .values()
        .filter(|h| h.emphasis == mechnet_core::Emphasis::Highlighted)
        .count();
    assert_eq!(highlighted, net.nodes_with_role(NodeRole::Biomarker).len());
}

#[test]
fn export_import_roundtrip_preserves_network() {
    let net = network();
    let json = net.to_dataset().to_json().unwrap();
    let back = Network::from_json(&json).unwrap();
    assert_eq!(back.to_dataset(), net.to_dataset());
}
