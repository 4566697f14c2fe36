//! Filter and view state.
//!
//! `FilterState` is ephemeral UI state owned by the caller. Transitions are
//! pure: [`FilterState::apply`] returns a new state and never touches the
//! network. [`visible_subgraph`] derives the node and edge set handed to
//! layering, plus per-node render hints.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::graph::Network;
use crate::model::{Edge, Node, NodeRole};

/// Tri-state module visibility. `Partial` is shown but dimmed and narrowed
/// by a secondary predicate; it is not the same as hidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ModuleVisibility {
    Off,
    Partial,
    #[default]
    On,
}

impl ModuleVisibility {
    /// Click order: on -> partial -> off -> on.
    pub fn cycle(self) -> Self {
        match self {
            Self::On => Self::Partial,
            Self::Partial => Self::Off,
            Self::Off => Self::On,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Partial => "partial",
            Self::On => "on",
        }
    }
}

/// How a boundary node presents its variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    #[default]
    Simple,
    Table,
    /// The richest mode.
    Graph,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Table => "table",
            Self::Graph => "graph",
        }
    }
}

/// A variant of a specific boundary node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantRef {
    pub node_id: String,
    pub variant_id: String,
}

impl VariantRef {
    pub fn new(node_id: &str, variant_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            variant_id: variant_id.to_string(),
        }
    }
}

/// User intent.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterEvent {
    /// Advance a module along on -> partial -> off.
    ToggleModule(String),
    SetModule(String, ModuleVisibility),
    ShowAllModules,
    /// Expand or collapse a boundary node's variant disclosure.
    ToggleBoundary(String),
    SetViewMode(String, ViewMode),
    /// Pointer entered a variant (`Some`) or left it (`None`).
    HoverVariant(Option<VariantRef>),
    /// Select a variant; clicking the selected variant again deselects it.
    ClickVariant(VariantRef),
    ClearSelection,
    ToggleRoleHighlight(NodeRole),
    Reset,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterState {
    /// Modules absent from the map are `On`.
    pub modules: BTreeMap<String, ModuleVisibility>,
    pub expanded: BTreeSet<String>,
    pub view_modes: BTreeMap<String, ViewMode>,
    pub hovered: Option<VariantRef>,
    pub selected: Option<VariantRef>,
    pub highlighted_roles: BTreeSet<NodeRole>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module_visibility(&self, module_id: &str) -> ModuleVisibility {
        self.modules.get(module_id).copied().unwrap_or_default()
    }

    pub fn is_expanded(&self, node_id: &str) -> bool {
        self.expanded.contains(node_id)
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    /// The mode the user picked for a boundary node.
    pub fn view_mode(&self, node_id: &str) -> ViewMode {
        self.view_modes.get(node_id).copied().unwrap_or_default()
    }

    /// Hover previews take precedence over the persistent selection.
    pub fn displayed_variant(&self) -> Option<&VariantRef> {
        self.hovered.as_ref().or(self.selected.as_ref())
    }

    /// Most visible state among the node's primary and shared modules.
    pub fn node_visibility(&self, node: &Node) -> ModuleVisibility {
        node.module_ids()
            .map(|m| self.module_visibility(m))
            .max()
            .unwrap_or_default()
    }

    pub fn apply(&self, event: &FilterEvent) -> Self {
        let mut next = self.clone();
        match event {
            FilterEvent::ToggleModule(id) => {
                let v = self.module_visibility(id).cycle();
                next.set_module(id, v);
            }
            FilterEvent::SetModule(id, v) => next.set_module(id, *v),
            FilterEvent::ShowAllModules => next.modules.clear(),
            FilterEvent::ToggleBoundary(id) => {
                if !next.expanded.remove(id) {
                    next.expanded.insert(id.clone());
                }
            }
            FilterEvent::SetViewMode(id, mode) => {
                next.view_modes.insert(id.clone(), *mode);
            }
            FilterEvent::HoverVariant(v) => next.hovered = v.clone(),
            FilterEvent::ClickVariant(v) => {
                next.selected = if self.selected.as_ref() == Some(v) {
                    None
                } else {
                    Some(v.clone())
                };
            }
            FilterEvent::ClearSelection => {
                next.selected = None;
                next.hovered = None;
            }
            FilterEvent::ToggleRoleHighlight(role) => {
                if !next.highlighted_roles.remove(role) {
                    next.highlighted_roles.insert(*role);
                }
            }
            FilterEvent::Reset => next = Self::default(),
        }
        next
    }

    fn set_module(&mut self, id: &str, v: ModuleVisibility) {
        if v == ModuleVisibility::On {
            self.modules.remove(id);
        } else {
            self.modules.insert(id.to_string(), v);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
    Normal,
    Dimmed,
    Highlighted,
}

/// Presentation hints for one visible node.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderHint {
    pub emphasis: Emphasis,
    pub opacity: f64,
    /// Set for boundary nodes only.
    pub view_mode: Option<ViewMode>,
    pub expanded: bool,
    /// Variant shown for this boundary node, if any.
    pub active_variant: Option<String>,
}

/// Rendering parameters that do not belong to the filter state itself.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewOptions {
    pub partial_opacity: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            partial_opacity: 0.4,
        }
    }
}

/// What the renderer and layering see for one filter state.
#[derive(Clone, Debug)]
pub struct VisibleSubgraph<'a> {
    /// Visible node ids in dataset order.
    pub node_ids: Vec<String>,
    pub edges: Vec<&'a Edge>,
    pub hints: BTreeMap<String, RenderHint>,
    /// Every visible node is a boundary node; all render as `Graph`.
    pub forced_graph_view: bool,
    pub boundary_count: usize,
    pub expanded_count: usize,
}

impl VisibleSubgraph<'_> {
    pub fn contains(&self, node_id: &str) -> bool {
        self.hints.contains_key(node_id)
    }

    pub fn hint(&self, node_id: &str) -> Option<&RenderHint> {
        self.hints.get(node_id)
    }
}

/// Derive the visible subgraph for `state`. Recomputed from scratch on
/// every call.
pub fn visible_subgraph<'a>(
    network: &'a Network,
    state: &FilterState,
    options: &ViewOptions,
) -> VisibleSubgraph<'a> {
    let on: HashSet<&str> = network
        .nodes()
        .iter()
        .filter(|n| state.node_visibility(n) == ModuleVisibility::On)
        .map(|n| n.id.as_str())
        .collect();

    let visible: Vec<&Node> = network
        .nodes()
        .iter()
        .filter(|n| match state.node_visibility(n) {
            ModuleVisibility::On => true,
            ModuleVisibility::Off => false,
            ModuleVisibility::Partial => on.is_empty() || touches(network, &n.id, &on),
        })
        .collect();

    let ids: HashSet<&str> = visible.iter().map(|n| n.id.as_str()).collect();
    let edges = network.edges_induced(&ids);

    let boundary_count = visible.iter().filter(|n| n.is_boundary()).count();
    let forced_graph_view = !visible.is_empty() && boundary_count == visible.len();
    let displayed = state.displayed_variant();

    let mut hints = BTreeMap::new();
    for node in &visible {
        let partial = state.node_visibility(node) == ModuleVisibility::Partial;
        let owns_displayed = displayed.is_some_and(|v| v.node_id == node.id);
        let role_hit = node.roles.iter().any(|r| state.highlighted_roles.contains(r));

        let emphasis = if owns_displayed || role_hit {
            Emphasis::Highlighted
        } else if partial {
            Emphasis::Dimmed
        } else {
            Emphasis::Normal
        };
        let opacity = if partial && emphasis != Emphasis::Highlighted {
            options.partial_opacity
        } else {
            1.0
        };
        let view_mode = node.is_boundary().then(|| {
            if forced_graph_view {
                ViewMode::Graph
            } else {
                state.view_mode(&node.id)
            }
        });

        hints.insert(
            node.id.clone(),
            RenderHint {
                emphasis,
                opacity,
                view_mode,
                expanded: node.is_boundary() && state.is_expanded(&node.id),
                active_variant: displayed
                    .filter(|v| v.node_id == node.id)
                    .map(|v| v.variant_id.clone()),
            },
        );
    }

    let expanded_count = visible
        .iter()
        .filter(|n| n.is_boundary() && state.is_expanded(&n.id))
        .count();

    VisibleSubgraph {
        node_ids: visible.iter().map(|n| n.id.clone()).collect(),
        edges,
        hints,
        forced_graph_view,
        boundary_count,
        expanded_count,
    }
}

/// Whether `node_id` shares an edge with any node in `others`.
fn touches(network: &Network, node_id: &str, others: &HashSet<&str>) -> bool {
    network
        .outgoing(node_id)
        .iter()
        .any(|e| others.contains(e.target.as_str()))
        || network
            .incoming(node_id)
            .iter()
            .any(|e| others.contains(e.source.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::layering::compute_layers;
    use crate::model::{
        BOUNDARY_MODULE, BoundaryVariant, Category, EffectDirection, Module, Relation,
    };

    fn variant(id: &str) -> BoundaryVariant {
        BoundaryVariant {
            id: id.to_string(),
            label: id.to_string(),
            effect_direction: EffectDirection::Risk,
            effect_magnitude: 2.0,
            frequency: None,
            description: None,
        }
    }

    /// genotype -> a -> b (M01) -> c (M02) -> d (M03), with b shared into M03.
    fn network() -> Network {
        let mut genotype = Node::new("genotype", Category::Boundary, BOUNDARY_MODULE);
        genotype.variants = vec![variant("e3"), variant("e4")];
        let mut age = Node::new("age", Category::Boundary, BOUNDARY_MODULE);
        age.variants = vec![variant("old")];
        let mut b = Node::new("b", Category::Stock, "M01");
        b.shared_with = vec!["M03".to_string()];
        let mut d = Node::new("d", Category::State, "M03");
        d.roles = vec![NodeRole::Biomarker];

        Network::from_dataset(Dataset {
            modules: vec![
                Module::new(BOUNDARY_MODULE, "Boundary"),
                Module::new("M01", "One"),
                Module::new("M02", "Two"),
                Module::new("M03", "Three"),
            ],
            nodes: vec![
                genotype,
                age,
                Node::new("a", Category::Stock, "M01"),
                b,
                Node::new("c", Category::Stock, "M02"),
                d,
                Node::new("e", Category::Stock, "M02"),
            ],
            edges: vec![
                Edge::new("e1", "genotype", "a", Relation::Increases),
                Edge::new("e2", "a", "b", Relation::Increases),
                Edge::new("e3", "b", "c", Relation::Decreases),
                Edge::new("e4", "c", "d", Relation::Increases),
                Edge::new("e5", "age", "a", Relation::Increases),
            ],
            ..Dataset::default()
        })
        .unwrap()
    }

    fn apply_all(events: &[FilterEvent]) -> FilterState {
        events
            .iter()
            .fold(FilterState::new(), |state, event| state.apply(event))
    }

    #[test]
    fn test_module_toggle_cycles_through_three_states() {
        let s0 = FilterState::new();
        assert_eq!(s0.module_visibility("M01"), ModuleVisibility::On);
        let toggle = FilterEvent::ToggleModule("M01".to_string());
        let s1 = s0.apply(&toggle);
        assert_eq!(s1.module_visibility("M01"), ModuleVisibility::Partial);
        let s2 = s1.apply(&toggle);
        assert_eq!(s2.module_visibility("M01"), ModuleVisibility::Off);
        let s3 = s2.apply(&toggle);
        assert_eq!(s3, s0);
    }

    #[test]
    fn test_apply_does_not_mutate_previous_state() {
        let s0 = FilterState::new();
        let _ = s0.apply(&FilterEvent::SetModule("M02".to_string(), ModuleVisibility::Off));
        assert_eq!(s0, FilterState::new());
    }

    #[test]
    fn test_click_variant_toggles_selection() {
        let v = VariantRef::new("genotype", "e4");
        let once = apply_all(&[FilterEvent::ClickVariant(v.clone())]);
        assert_eq!(once.selected, Some(v.clone()));
        let twice = once.apply(&FilterEvent::ClickVariant(v));
        assert_eq!(twice.selected, None);
        assert_eq!(twice, FilterState::new());
    }

    #[test]
    fn test_clicking_other_variant_switches_selection() {
        let state = apply_all(&[
            FilterEvent::ClickVariant(VariantRef::new("genotype", "e3")),
            FilterEvent::ClickVariant(VariantRef::new("genotype", "e4")),
        ]);
        assert_eq!(state.selected, Some(VariantRef::new("genotype", "e4")));
    }

    #[test]
    fn test_selection_persists_across_hover() {
        let selected = VariantRef::new("genotype", "e3");
        let hovered = VariantRef::new("age", "old");
        let state = apply_all(&[
            FilterEvent::ClickVariant(selected.clone()),
            FilterEvent::HoverVariant(Some(hovered.clone())),
        ]);
        assert_eq!(state.displayed_variant(), Some(&hovered));
        let state = state.apply(&FilterEvent::HoverVariant(None));
        assert_eq!(state.selected, Some(selected.clone()));
        assert_eq!(state.displayed_variant(), Some(&selected));
    }

    #[test]
    fn test_all_on_shows_everything() {
        let net = network();
        let view = visible_subgraph(&net, &FilterState::new(), &ViewOptions::default());
        assert_eq!(view.node_ids.len(), 7);
        assert_eq!(view.edges.len(), 5);
        assert_eq!(view.boundary_count, 2);
        assert!(!view.forced_graph_view);
        assert!(view.hints.values().all(|h| h.emphasis == Emphasis::Normal));
    }

    #[test]
    fn test_off_module_hides_nodes_and_their_edges() {
        let net = network();
        let state = apply_all(&[FilterEvent::SetModule("M02".to_string(), ModuleVisibility::Off)]);
        let view = visible_subgraph(&net, &state, &ViewOptions::default());
        assert!(!view.contains("c"));
        assert!(!view.contains("e"));
        assert!(view.edges.iter().all(|e| e.source != "c" && e.target != "c"));
    }

    #[test]
    fn test_shared_module_keeps_node_visible() {
        let net = network();
        let state = apply_all(&[FilterEvent::SetModule("M01".to_string(), ModuleVisibility::Off)]);
        let view = visible_subgraph(&net, &state, &ViewOptions::default());
        assert!(!view.contains("a"));
        // b is owned by M01 but shared with M03, which is still on.
        assert!(view.contains("b"));
    }

    #[test]
    fn test_partial_module_shows_only_connected_nodes_dimmed() {
        let net = network();
        let state = apply_all(&[FilterEvent::SetModule(
            "M02".to_string(),
            ModuleVisibility::Partial,
        )]);
        let options = ViewOptions { partial_opacity: 0.25 };
        let view = visible_subgraph(&net, &state, &options);
        // c touches b and d; e touches nothing.
        assert!(view.contains("c"));
        assert!(!view.contains("e"));
        let hint = view.hint("c").unwrap();
        assert_eq!(hint.emphasis, Emphasis::Dimmed);
        approx::assert_relative_eq!(hint.opacity, 0.25);
    }

    #[test]
    fn test_partial_everywhere_shows_all_dimmed() {
        let net = network();
        let state = apply_all(&[
            FilterEvent::SetModule(BOUNDARY_MODULE.to_string(), ModuleVisibility::Partial),
            FilterEvent::SetModule("M01".to_string(), ModuleVisibility::Partial),
            FilterEvent::SetModule("M02".to_string(), ModuleVisibility::Partial),
            FilterEvent::SetModule("M03".to_string(), ModuleVisibility::Partial),
        ]);
        let view = visible_subgraph(&net, &state, &ViewOptions::default());
        assert_eq!(view.node_ids.len(), 7);
        assert!(view.hints.values().all(|h| h.emphasis == Emphasis::Dimmed));
    }

    #[test]
    fn test_forced_graph_view_when_only_boundaries_visible() {
        let net = network();
        let state = apply_all(&[
            FilterEvent::SetViewMode("genotype".to_string(), ViewMode::Table),
            FilterEvent::SetModule("M01".to_string(), ModuleVisibility::Off),
            FilterEvent::SetModule("M02".to_string(), ModuleVisibility::Off),
            FilterEvent::SetModule("M03".to_string(), ModuleVisibility::Off),
        ]);
        let view = visible_subgraph(&net, &state, &ViewOptions::default());
        assert!(view.forced_graph_view);
        assert_eq!(view.hint("genotype").unwrap().view_mode, Some(ViewMode::Graph));
        assert_eq!(view.hint("age").unwrap().view_mode, Some(ViewMode::Graph));

        let state = state.apply(&FilterEvent::ShowAllModules);
        let view = visible_subgraph(&net, &state, &ViewOptions::default());
        assert!(!view.forced_graph_view);
        assert_eq!(view.hint("genotype").unwrap().view_mode, Some(ViewMode::Table));
        assert_eq!(view.hint("age").unwrap().view_mode, Some(ViewMode::Simple));
        assert_eq!(view.hint("a").unwrap().view_mode, None);
    }

    #[test]
    fn test_empty_view_is_not_forced() {
        let net = network();
        let state = apply_all(&[FilterEvent::SetModule(
            BOUNDARY_MODULE.to_string(),
            ModuleVisibility::Off,
        )])
            .apply(&FilterEvent::SetModule("M01".to_string(), ModuleVisibility::Off))
            .apply(&FilterEvent::SetModule("M02".to_string(), ModuleVisibility::Off))
            .apply(&FilterEvent::SetModule("M03".to_string(), ModuleVisibility::Off));
        let view = visible_subgraph(&net, &state, &ViewOptions::default());
        assert!(view.node_ids.is_empty());
        assert!(!view.forced_graph_view);
        assert!(compute_layers(&view.node_ids, view.edges.iter().copied()).is_empty());
    }

    #[test]
    fn test_boundary_expand_and_counts() {
        let net = network();
        let state = apply_all(&[FilterEvent::ToggleBoundary("genotype".to_string())]);
        assert_eq!(state.expanded_count(), 1);
        let view = visible_subgraph(&net, &state, &ViewOptions::default());
        assert!(view.hint("genotype").unwrap().expanded);
        assert!(!view.hint("age").unwrap().expanded);
        assert_eq!(view.expanded_count, 1);

        let collapsed = state.apply(&FilterEvent::ToggleBoundary("genotype".to_string()));
        assert_eq!(collapsed.expanded_count(), 0);
    }

    #[test]
    fn test_expand_flag_ignored_on_non_boundary_nodes() {
        let net = network();
        let state = apply_all(&[FilterEvent::ToggleBoundary("c".to_string())]);
        let view = visible_subgraph(&net, &state, &ViewOptions::default());
        assert!(view.contains("c"));
        assert!(!view.hint("c").unwrap().expanded);
        assert_eq!(view.expanded_count, 0);
    }

    #[test]
    fn test_highlighting() {
        let net = network();
        let state = apply_all(&[
            FilterEvent::ToggleRoleHighlight(NodeRole::Biomarker),
            FilterEvent::ClickVariant(VariantRef::new("genotype", "e4")),
        ]);
        let view = visible_subgraph(&net, &state, &ViewOptions::default());
        assert_eq!(view.hint("d").unwrap().emphasis, Emphasis::Highlighted);
        let genotype = view.hint("genotype").unwrap();
        assert_eq!(genotype.emphasis, Emphasis::Highlighted);
        assert_eq!(genotype.active_variant.as_deref(), Some("e4"));
        assert_eq!(view.hint("age").unwrap().active_variant, None);
    }

    #[test]
    fn test_visible_subgraph_feeds_layering() {
        let net = network();
        let state = apply_all(&[FilterEvent::SetModule("M02".to_string(), ModuleVisibility::Off)]);
        let view = visible_subgraph(&net, &state, &ViewOptions::default());
        let layering = compute_layers(&view.node_ids, view.edges.iter().copied());
        assert_eq!(layering.get("genotype"), Some(0));
        assert_eq!(layering.get("a"), Some(1));
        assert_eq!(layering.get("b"), Some(2));
        // d lost its only parent when M02 went off.
        assert_eq!(layering.get("d"), Some(0));
    }

    #[test]
    fn test_reset() {
        let state = apply_all(&[
            FilterEvent::ToggleModule("M01".to_string()),
            FilterEvent::ToggleBoundary("age".to_string()),
            FilterEvent::Reset,
        ]);
        assert_eq!(state, FilterState::new());
    }
}
