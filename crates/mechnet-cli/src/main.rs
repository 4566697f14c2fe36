use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use mechnet_core::{
    AtnCategory, DetectionMethod, Emphasis, EvidenceLevel, FeedbackLoop, FilterEvent,
    ModuleVisibility, Network, Node, NodeRole, Treatment, TreatmentStatus, arrange,
    compute_layers, cyclic_components, visible_subgraph,
};
use mechnet_store::DatasetStore;

#[derive(Parser)]
#[command(name = "mechnet", about = "Inspect and validate mechanistic disease network datasets")]
struct Cli {
    /// Config file (overrides MECHNET_CONFIG and <data dir>/mechnet.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the active dataset for integrity issues
    Validate,

    /// Show dataset statistics
    Stats,

    /// Print the layered layout of the visible subgraph
    Layers {
        /// Hide a module (repeatable)
        #[arg(long = "off", value_name = "MODULE")]
        off: Vec<String>,

        /// Show a module dimmed and narrowed (repeatable)
        #[arg(long = "partial", value_name = "MODULE")]
        partial: Vec<String>,

        /// Highlight nodes with a role, e.g. BIOMARKER (repeatable)
        #[arg(long = "highlight", value_name = "ROLE")]
        highlight: Vec<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the inferred region and timescale of a node
    Region {
        /// Node id
        node: String,
    },

    /// List biomarkers, earliest detectable first
    Biomarkers {
        /// ATN category (A, T, N, I, V)
        #[arg(long)]
        atn: Option<String>,

        /// Detection method (CSF, PET, PLASMA, ...)
        #[arg(long)]
        method: Option<String>,

        /// Only markers abnormal at least this many years before symptoms
        #[arg(long, value_name = "YEARS")]
        detectable_at: Option<f64>,

        /// Only commercially available assays
        #[arg(long)]
        commercial: bool,

        /// Only assays pending regulatory clearance
        #[arg(long)]
        pending: bool,
    },

    /// List feedback loops
    Loops {
        /// Loops passing through this node
        #[arg(long)]
        node: Option<String>,

        /// Loops touching this module
        #[arg(long)]
        module: Option<String>,
    },

    /// List treatments
    Treatments {
        /// Treatments targeting this node
        #[arg(long)]
        target: Option<String>,

        /// Development status (approved, phase3, ...)
        #[arg(long)]
        status: Option<String>,

        /// Evidence level (L1..L7)
        #[arg(long)]
        evidence: Option<String>,
    },

    /// Export the active dataset to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Validate a JSON dataset and make it the active dataset
    Import {
        /// Input file path
        path: PathBuf,
    },
}

fn open_store(cli: &Cli) -> Result<DatasetStore> {
    let base_dir = std::env::var("MECHNET_DATA_DIR").ok().map(PathBuf::from);
    DatasetStore::open(base_dir.as_deref(), cli.config.as_deref())
        .context("failed to open data directory")
}

fn load_network(store: &DatasetStore) -> Result<Network> {
    store.load_network().context("failed to load dataset")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Validate => cmd_validate(&cli),
        Commands::Stats => cmd_stats(&cli),
        Commands::Layers {
            off,
            partial,
            highlight,
            json,
        } => cmd_layers(&cli, off, partial, highlight, *json),
        Commands::Region { node } => cmd_region(&cli, node),
        Commands::Biomarkers {
            atn,
            method,
            detectable_at,
            commercial,
            pending,
        } => cmd_biomarkers(
            &cli,
            atn.as_deref(),
            method.as_deref(),
            *detectable_at,
            *commercial,
            *pending,
        ),
        Commands::Loops { node, module } => cmd_loops(&cli, node.as_deref(), module.as_deref()),
        Commands::Treatments {
            target,
            status,
            evidence,
        } => cmd_treatments(&cli, target.as_deref(), status.as_deref(), evidence.as_deref()),
        Commands::Export { path } => cmd_export(&cli, path),
        Commands::Import { path } => cmd_import(&cli, path),
    }
}

fn cmd_validate(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let dataset = store.load_dataset().context("failed to read dataset")?;
    let issues = dataset.validate();

    for issue in &issues {
        println!("error: {issue}");
    }
    if !issues.is_empty() {
        bail!("{} integrity issue(s) in {}", issues.len(), store.dataset_source().describe());
    }

    println!(
        "ok: {} modules, {} nodes, {} edges, {} loops, {} treatments ({})",
        dataset.modules.len(),
        dataset.nodes.len(),
        dataset.edges.len(),
        dataset.feedback_loops.len(),
        dataset.treatments.len(),
        store.dataset_source().describe()
    );
    Ok(())
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let net = load_network(&store)?;

    let node_ids: Vec<&str> = net.nodes().iter().map(|n| n.id.as_str()).collect();
    let layering = compute_layers(&node_ids, net.edges());
    let cyclic = cyclic_components(&node_ids, net.edges());

    println!("source:      {}", store.dataset_source().describe());
    println!("version:     {}", net.version());
    println!("modules:     {}", net.modules().len());
    println!("nodes:       {}", net.nodes().len());
    println!("edges:       {}", net.edges().len());
    println!("boundary:    {}", net.boundary_nodes().len());
    println!("biomarkers:  {}", net.biomarkers_by_timeline().len());
    println!("loops:       {}", net.loops().len());
    println!("treatments:  {}", net.treatments().len());
    println!(
        "layers:      {} ({} in cyclic tail)",
        layering.layer_count(),
        layering.unresolved.len()
    );
    println!("cyclic sccs: {}", cyclic.len());

    if cli.verbose {
        for module in net.modules() {
            println!(
                "  {:<10} {:>3}  {}",
                module.id,
                net.nodes_in_module(&module.id).len(),
                module.name
            );
        }
    }
    Ok(())
}

fn cmd_layers(
    cli: &Cli,
    off: &[String],
    partial: &[String],
    highlight: &[String],
    json: bool,
) -> Result<()> {
    let store = open_store(cli)?;
    let net = load_network(&store)?;
    let view_config = &store.config().view;

    let mut events = Vec::new();
    for module in partial {
        check_module(&net, module)?;
        events.push(FilterEvent::SetModule(module.clone(), ModuleVisibility::Partial));
    }
    for module in off {
        check_module(&net, module)?;
        events.push(FilterEvent::SetModule(module.clone(), ModuleVisibility::Off));
    }
    let roles = highlight
        .iter()
        .map(|role| NodeRole::parse(role).ok_or_else(|| anyhow!("unknown role '{role}'")))
        .collect::<Result<BTreeSet<_>>>()?;
    let initial = view_config.initial_state();
    events.extend(
        roles
            .into_iter()
            .filter(|role| !initial.highlighted_roles.contains(role))
            .map(FilterEvent::ToggleRoleHighlight),
    );
    let state = events
        .iter()
        .fold(initial, |state, event| state.apply(event));

    let view = visible_subgraph(&net, &state, &view_config.view_options());
    let layering = compute_layers(&view.node_ids, view.edges.iter().copied());
    let columns = arrange(&net, &layering);

    if json {
        let layers: Vec<serde_json::Value> = columns
            .iter()
            .map(|column| {
                let nodes: Vec<serde_json::Value> = column
                    .node_ids
                    .iter()
                    .map(|id| {
                        let hint = view.hint(id);
                        serde_json::json!({
                            "id": id,
                            "emphasis": hint.map(|h| emphasis_label(h.emphasis)),
                            "opacity": hint.map(|h| h.opacity),
                            "viewMode": hint.and_then(|h| h.view_mode).map(|m| m.as_str()),
                        })
                    })
                    .collect();
                serde_json::json!({ "layer": column.layer, "nodes": nodes })
            })
            .collect();
        let out = serde_json::json!({
            "layers": layers,
            "edges": view.edges.len(),
            "unresolved": layering.unresolved,
            "forcedGraphView": view.forced_graph_view,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("failed to serialize layers")?
        );
        return Ok(());
    }

    for column in &columns {
        println!("layer {}", column.layer);
        for id in &column.node_ids {
            let Some(node) = net.node(id) else { continue };
            let marker = match view.hint(id).map(|h| h.emphasis) {
                Some(Emphasis::Highlighted) => '*',
                Some(Emphasis::Dimmed) => '~',
                _ => ' ',
            };
            println!(
                " {marker} {:<28} {:<20} {:<8} {}",
                id,
                net.infer_region(node).as_str(),
                net.infer_timescale(node).as_str(),
                node.module_id
            );
        }
    }
    println!(
        "{} nodes, {} edges, {} layers",
        view.node_ids.len(),
        view.edges.len(),
        layering.layer_count()
    );
    if !layering.unresolved.is_empty() {
        println!("{} node(s) on or after a cycle share the last layer", layering.unresolved.len());
    }
    if view.forced_graph_view {
        println!("only boundary nodes visible: graph view forced");
    }
    Ok(())
}

fn emphasis_label(emphasis: Emphasis) -> &'static str {
    match emphasis {
        Emphasis::Normal => "normal",
        Emphasis::Dimmed => "dimmed",
        Emphasis::Highlighted => "highlighted",
    }
}

fn check_module(net: &Network, id: &str) -> Result<()> {
    if net.module(id).is_none() {
        bail!("unknown module '{id}'");
    }
    Ok(())
}

fn find_node<'a>(net: &'a Network, id: &str) -> Result<&'a Node> {
    net.node(id).ok_or_else(|| anyhow!("unknown node '{id}'"))
}

fn cmd_region(cli: &Cli, id: &str) -> Result<()> {
    let store = open_store(cli)?;
    let net = load_network(&store)?;
    let node = find_node(&net, id)?;

    let (region, region_source) = net.classify_region(node);
    let (timescale, timescale_source) = net.classify_timescale(node);
    println!("node:       {} ({})", node.id, node.label);
    println!("module:     {}", node.module_id);
    println!("region:     {region} [{}]", region_source.as_str());
    println!("timescale:  {timescale} [{}]", timescale_source.as_str());
    Ok(())
}

fn cmd_biomarkers(
    cli: &Cli,
    atn: Option<&str>,
    method: Option<&str>,
    detectable_at: Option<f64>,
    commercial: bool,
    pending: bool,
) -> Result<()> {
    let atn = atn
        .map(|s| AtnCategory::parse(s).ok_or_else(|| anyhow!("unknown ATN category '{s}'")))
        .transpose()?;
    let method = method
        .map(|s| DetectionMethod::parse(s).ok_or_else(|| anyhow!("unknown detection method '{s}'")))
        .transpose()?;

    let store = open_store(cli)?;
    let net = load_network(&store)?;

    let mut markers = net.biomarkers_by_timeline();
    if let Some(category) = atn {
        retain_in(&mut markers, &net.biomarkers_by_atn(category));
    }
    if let Some(method) = method {
        retain_in(&mut markers, &net.biomarkers_by_method(method));
    }
    if let Some(years) = detectable_at {
        retain_in(&mut markers, &net.biomarkers_detectable_at(years));
    }
    if commercial {
        retain_in(&mut markers, &net.commercial_biomarkers());
    }
    if pending {
        retain_in(&mut markers, &net.pending_biomarkers());
    }

    if markers.is_empty() {
        println!("(no biomarkers match)");
        return Ok(());
    }
    for node in markers {
        let Some(t) = &node.detection_timeline else { continue };
        println!(
            "{:>5.1}y  {:<20} {:<9} {}  {:<12}{}",
            t.years_before_symptoms,
            node.id,
            t.method.as_str(),
            t.atn_category.as_str(),
            t.regulatory_status.as_str(),
            if t.commercially_available { " commercial" } else { "" }
        );
    }
    Ok(())
}

fn cmd_loops(cli: &Cli, node: Option<&str>, module: Option<&str>) -> Result<()> {
    let store = open_store(cli)?;
    let net = load_network(&store)?;
    let registry = net.loops();

    if let Some(id) = node {
        find_node(&net, id)?;
    }
    if let Some(id) = module {
        check_module(&net, id)?;
    }

    let loops: Vec<&FeedbackLoop> = match (node, module) {
        (Some(n), Some(m)) => {
            let in_module = registry.loops_in_module(m);
            registry
                .loops_through_node(n)
                .into_iter()
                .filter(|l| in_module.iter().any(|o| o.id == l.id))
                .collect()
        }
        (Some(n), None) => registry.loops_through_node(n),
        (None, Some(m)) => registry.loops_in_module(m),
        (None, None) => registry.iter().collect(),
    };

    if loops.is_empty() {
        println!("(no loops match)");
        return Ok(());
    }
    for feedback_loop in loops {
        let cycle = registry.cycle_nodes(&feedback_loop.id).unwrap_or_default();
        let mut path = cycle.join(" -> ");
        if let Some(first) = cycle.first() {
            path.push_str(" -> ");
            path.push_str(first);
        }
        let ghost = if feedback_loop.ghost_edge.is_some() { " (ghost-closed)" } else { "" };
        println!(
            "{:<22} {:<12} {}{ghost}",
            feedback_loop.id,
            feedback_loop.loop_type.as_str(),
            feedback_loop.name
        );
        println!("    {path}");
        if let Some(tp) = &feedback_loop.tipping_point {
            println!(
                "    tipping point: {} {} ({}, {} window)",
                tp.biomarker,
                tp.threshold,
                tp.timescale,
                tp.intervention_window.as_str()
            );
        }
    }
    Ok(())
}

/// Keep the entries of `items` that also appear in `subset`. Both borrow
/// from the same network, so identity is pointer identity.
fn retain_in<T>(items: &mut Vec<&T>, subset: &[&T]) {
    items.retain(|item| subset.iter().any(|kept| std::ptr::eq(*kept, *item)));
}

fn cmd_treatments(
    cli: &Cli,
    target: Option<&str>,
    status: Option<&str>,
    evidence: Option<&str>,
) -> Result<()> {
    let status = status
        .map(|s| TreatmentStatus::parse(s).ok_or_else(|| anyhow!("unknown status '{s}'")))
        .transpose()?;
    let evidence = evidence
        .map(|s| EvidenceLevel::parse(s).ok_or_else(|| anyhow!("unknown evidence level '{s}'")))
        .transpose()?;

    let store = open_store(cli)?;
    let net = load_network(&store)?;
    if let Some(id) = target {
        find_node(&net, id)?;
    }

    let mut treatments: Vec<&Treatment> = net.treatments().iter().collect();
    if let Some(id) = target {
        retain_in(&mut treatments, &net.treatments_targeting_node(id));
    }
    if let Some(status) = status {
        retain_in(&mut treatments, &net.treatments_by_status(status));
    }
    if let Some(level) = evidence {
        retain_in(&mut treatments, &net.treatments_by_evidence_level(level));
    }

    if treatments.is_empty() {
        println!("(no treatments match)");
        return Ok(());
    }
    for treatment in treatments {
        let targets: Vec<String> = treatment
            .primary_targets
            .iter()
            .map(|t| format!("{} {}", t.effect.as_str(), t.node_id))
            .collect();
        println!(
            "{:<14} {:<11} {}  {}",
            treatment.id,
            treatment.status.as_str(),
            treatment.evidence_level.as_str(),
            targets.join(", ")
        );
    }
    Ok(())
}

fn cmd_export(cli: &Cli, path: &Path) -> Result<()> {
    let store = open_store(cli)?;
    store
        .export_json_file(path)
        .with_context(|| format!("failed to export to {}", path.display()))?;
    println!("exported to {}", path.display());
    Ok(())
}

fn cmd_import(cli: &Cli, path: &Path) -> Result<()> {
    let store = open_store(cli)?;
    let net = store
        .import_json_file(path)
        .with_context(|| format!("failed to import {}", path.display()))?;

    println!(
        "imported from {}. nodes={}, edges={}, loops={}",
        path.display(),
        net.nodes().len(),
        net.edges().len(),
        net.loops().len()
    );
    Ok(())
}
