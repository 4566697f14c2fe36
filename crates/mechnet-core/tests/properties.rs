//! Property-based tests for layering and the filter state machine.

use proptest::prelude::*;

use mechnet_core::{
    Edge, FilterEvent, FilterState, ModuleVisibility, Relation, compute_layers, cyclic_components,
};

fn node_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("n{i}")).collect()
}

fn edge(source: usize, target: usize) -> Edge {
    Edge::new(
        &format!("e{source}_{target}"),
        &format!("n{source}"),
        &format!("n{target}"),
        Relation::Increases,
    )
}

/// Random DAG: edges only run from lower to higher index.
fn dag_strategy() -> impl Strategy<Value = (usize, Vec<Edge>)> {
    (1usize..24).prop_flat_map(|n| {
        let pairs = prop::collection::vec((0..n, 0..n), 0..n * 3);
        (Just(n), pairs).prop_map(|(n, pairs)| {
            let edges = pairs
                .into_iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| edge(a.min(b), a.max(b)))
                .collect();
            (n, edges)
        })
    })
}

/// Arbitrary directed graph, cycles and self-loops allowed.
fn graph_strategy() -> impl Strategy<Value = (usize, Vec<Edge>)> {
    (1usize..24).prop_flat_map(|n| {
        let pairs = prop::collection::vec((0..n, 0..n), 0..n * 3);
        (Just(n), pairs)
            .prop_map(|(n, pairs)| (n, pairs.into_iter().map(|(a, b)| edge(a, b)).collect()))
    })
}

fn visibility() -> impl Strategy<Value = ModuleVisibility> {
    prop_oneof![
        Just(ModuleVisibility::On),
        Just(ModuleVisibility::Partial),
        Just(ModuleVisibility::Off),
    ]
}

proptest! {
    #[test]
    fn acyclic_edges_point_forward((n, edges) in dag_strategy()) {
        let ids = node_ids(n);
        let layering = compute_layers(&ids, &edges);
        prop_assert!(layering.unresolved.is_empty());
        for e in &edges {
            let (s, t) = (layering.get(&e.source).unwrap(), layering.get(&e.target).unwrap());
            prop_assert!(s < t, "{} -> {}: {} !< {}", e.source, e.target, s, t);
        }
    }

    #[test]
    fn every_node_gets_a_layer((n, edges) in graph_strategy()) {
        let ids = node_ids(n);
        let layering = compute_layers(&ids, &edges);
        prop_assert_eq!(layering.len(), n);
        for id in &layering.unresolved {
            prop_assert_eq!(layering.get(id), Some(layering.resolved_rounds));
        }
        for id in &ids {
            prop_assert!(layering.get(id).unwrap() < layering.layer_count());
        }
    }

    #[test]
    fn unresolved_iff_reachable_from_a_cycle((n, edges) in graph_strategy()) {
        let ids = node_ids(n);
        let layering = compute_layers(&ids, &edges);
        let cyclic = cyclic_components(&ids, &edges);
        prop_assert_eq!(cyclic.is_empty(), layering.unresolved.is_empty());
        for component in &cyclic {
            for id in component {
                prop_assert!(layering.unresolved.contains(id));
            }
        }
    }

    #[test]
    fn three_toggles_restore_module_state(start in visibility()) {
        let toggle = FilterEvent::ToggleModule("M01".to_string());
        let s0 = FilterState::new().apply(&FilterEvent::SetModule("M01".to_string(), start));
        let s3 = s0.apply(&toggle).apply(&toggle).apply(&toggle);
        prop_assert_eq!(s3, s0);
    }

    #[test]
    fn double_boundary_toggle_is_identity(
        expanded in prop::collection::btree_set("[a-z]{1,6}", 0..5),
        id in "[a-z]{1,6}",
    ) {
        let mut s0 = FilterState::new();
        s0.expanded = expanded;
        let event = FilterEvent::ToggleBoundary(id);
        prop_assert_eq!(s0.apply(&event).apply(&event), s0);
    }
}
