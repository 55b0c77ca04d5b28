use clap::Parser;
use flowstate::prelude::*;
use std::fs;

/// A CLI tool to validate and inspect flowstate workflow documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a workflow document JSON file
    document: String,

    /// Print the topological execution order
    #[arg(long)]
    order: bool,

    /// Print node, connection and selection counts
    #[arg(long)]
    stats: bool,
}

fn main() {
    let cli = Cli::parse();

    let json = match fs::read_to_string(&cli.document) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to read document file '{}': {}", cli.document, e);
            std::process::exit(1);
        }
    };

    let document = match WorkflowDocument::from_json_str(&json) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let mut store = GraphStore::new();
    store.deserialize(document);

    println!("Workflow: {}", store.workflow_name());

    let report = store.validate();
    if report.valid {
        println!("Validation: OK");
    } else {
        println!("Validation: {} error(s)", report.errors.len());
        for issue in &report.errors {
            println!("  - {}", issue);
        }
    }

    if cli.stats {
        let stats = store.stats();
        println!("Nodes: {}", stats.node_count);
        println!("Connections: {}", stats.connection_count);
    }

    if cli.order {
        match store.execution_order() {
            Some(order) => println!("Execution order: {}", order.join(" -> ")),
            None => println!("Execution order: undefined (circular dependency)"),
        }
    }

    if !report.valid {
        std::process::exit(2);
    }
}
