use clap::Parser;
use flowstate::prelude::*;
use rand::Rng;
use std::fs;

/// A CLI tool to generate synthetic workflow documents for fixtures and
/// benchmarks
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_workflow.json")]
    output: String,

    /// How many nodes the generated chain should hold
    #[arg(long, default_value_t = 10)]
    nodes: usize,

    /// Extra forward-only cross connections (keeps the graph acyclic)
    #[arg(long, default_value_t = 0)]
    extra_edges: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.nodes == 0 {
        eprintln!("Error: --nodes must be at least 1");
        std::process::exit(1);
    }

    println!(
        "Generating a workflow with {} node(s) and {} extra edge(s)...",
        cli.nodes, cli.extra_edges
    );

    let mut store = GraphStore::new();
    store.set_workflow_name("Generated workflow");

    let mut previous: Option<Node> = None;
    for index in 0..cli.nodes {
        let node = store.add_node(
            NodeSpec::new(NodeKind::Auxiliary, format!("Stage {}", index + 1))
                .at(
                    rng.random_range(0.0..1600.0),
                    rng.random_range(0.0..900.0),
                )
                .with_outputs(["output"]),
            false,
        );
        if let Some(previous) = &previous {
            store.add_connection(
                ConnectionSpec::new(previous.id.as_str(), node.id.as_str()),
                true,
                false,
            );
        }
        previous = Some(node);
    }

    for index in 0..cli.extra_edges {
        if cli.nodes < 3 {
            break;
        }
        let source = rng.random_range(1..cli.nodes - 1);
        let target = rng.random_range(source + 1..=cli.nodes);
        store.add_connection(
            ConnectionSpec::new(format!("node_{source}"), format!("node_{target}"))
                .with_target_param(format!("extra_{index}")),
            true,
            false,
        );
    }

    let json_output = store.serialize().to_json_string()?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved workflow to '{}'",
        cli.output
    );

    Ok(())
}
