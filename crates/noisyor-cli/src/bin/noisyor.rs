//! noisyor CLI - evaluate noisy-OR network definitions
//!
//! Usage:
//!   noisyor <file>                 # Evaluate queries and posteriors
//!   noisyor <file> --list          # List events
//!   noisyor <file> --check         # Check the no-sibling-edge preconditions
//!   noisyor <file> -o json         # Output results as JSON
//!
//! Logging is controlled by `NOISYOR_LOG` (e.g. `NOISYOR_LOG=noisyor_core=debug`).

use clap::Parser;
use noisyor_core::{
    BayesNet, EventNode, FullConfigModel, InferenceConfig, LoadedNetwork, NetworkDefinition,
    QueryOutcome,
};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "noisyor")]
#[command(version)]
#[command(about = "Exact inference over noisy-OR Bayesian networks")]
#[command(long_about = "Load a JSON network definition and evaluate its queries exactly")]
struct Cli {
    /// Input network definition (JSON)
    #[arg(value_name = "FILE")]
    file: String,

    /// Output format: summary or json
    #[arg(short, long, default_value = "summary", value_name = "FORMAT")]
    output: String,

    /// List the events of the network instead of evaluating
    #[arg(short, long)]
    list: bool,

    /// Report sibling edges and joint-member edges, exit 1 if any exist
    #[arg(short, long)]
    check: bool,

    /// Largest fan-in a query may enumerate
    #[arg(long, value_name = "N")]
    max_fan_in: Option<usize>,

    /// Longest ancestor chain a query may recurse through
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Disable the per-query ancestor cache
    #[arg(long)]
    no_memoize: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let source = match std::fs::read_to_string(&cli.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", cli.file, e);
            process::exit(1);
        }
    };

    let definition = match NetworkDefinition::from_json_str(&source) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error in '{}': {}", cli.file, e);
            process::exit(1);
        }
    };

    let mut config = InferenceConfig::default();
    if let Some(limit) = cli.max_fan_in {
        config.max_fan_in = limit;
    }
    if let Some(depth) = cli.max_depth {
        config.max_depth = depth;
    }
    config.memoize = !cli.no_memoize;

    let loaded = match definition.build_with_config(config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error building network: {}", e);
            process::exit(1);
        }
    };
    tracing::info!(events = loaded.net.len(), file = %cli.file, "network loaded");

    if cli.list {
        print_events(&loaded.net);
        return;
    }

    if cli.check {
        let violations = loaded.net.structure_violations();
        if violations.is_empty() {
            println!("✓ No sibling or joint-member edges");
            return;
        }
        for violation in &violations {
            eprintln!("  - {}", violation.describe(&loaded.net));
        }
        eprintln!("{} structure violation(s)", violations.len());
        process::exit(1);
    }

    let outcomes = match evaluate(&loaded, &definition) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error evaluating queries: {}", e);
            process::exit(1);
        }
    };

    match cli.output.as_str() {
        "json" => match serde_json::to_string_pretty(&outcomes) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing to JSON: {}", e);
                process::exit(1);
            }
        },
        "summary" | _ => print_summary(&outcomes),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("NOISYOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn evaluate(
    loaded: &LoadedNetwork,
    definition: &NetworkDefinition,
) -> Result<Vec<QueryOutcome>, noisyor_core::ExecError> {
    if definition.queries.is_empty() && definition.posteriors.is_empty() {
        tracing::warn!("definition has no queries or posteriors");
    }
    loaded.evaluate(definition)
}

fn print_events(net: &BayesNet) {
    println!("Events ({}):", net.len());
    for node in net.nodes() {
        match node {
            EventNode::Binary(event) => println!(
                "  {}: baseline {}, {} influence(s)",
                event.name(),
                event.baseline().to_f64(),
                event.influences().len()
            ),
            EventNode::Joint(joint) => println!(
                "  {}: joint of {} event(s), {} influence(s)",
                joint.name(),
                joint.members().len(),
                FullConfigModel::influences(joint).len()
            ),
        }
    }
}

fn print_summary(outcomes: &[QueryOutcome]) {
    if outcomes.is_empty() {
        println!("No queries defined");
        return;
    }
    let width = outcomes.iter().map(|o| o.label.len()).max().unwrap_or(0);
    for outcome in outcomes {
        println!("  {:width$} = {:.6}", outcome.label, outcome.probability, width = width);
    }
}
