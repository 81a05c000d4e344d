use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use citegraph::citegraph::CiteGraph;
use citegraph::errors::CiteGraphError;
use citegraph::graph::GraphQueryManager;
use citegraph::report::{
    format_query_as_json, format_query_as_text, format_stats_as_text, reference_details,
};
use citegraph::types::*;
use tracing_subscriber::EnvFilter;

/// Citation graph for regulatory circulars.
#[derive(Parser)]
#[command(name = "citegraph", about = "Citation graph for regulatory circulars")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new CiteGraph project
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
        /// Run initial indexing after init
        #[arg(short, long)]
        index: bool,
    },
    /// Rebuild the graph from the extraction manifests
    Index {
        /// Project path (default: current directory)
        path: Option<String>,
    },
    /// Show graph statistics
    Status {
        /// Project path (default: current directory)
        path: Option<String>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Resolve direct and indirect references of the documents in a manifest
    Analyze {
        /// Extraction manifest of the document(s) to analyze
        manifest: PathBuf,
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
        /// Maximum traversal depth (default: from config)
        #[arg(short, long)]
        depth: Option<u32>,
        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show one document and who cites it
    Show {
        /// Document id
        id: String,
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
    },
    /// Export the graph (json, graphml or cytoscape)
    Export {
        /// Output file
        output: PathBuf,
        /// Project path
        #[arg(short, long)]
        path: Option<String>,
        /// Export format
        #[arg(short, long, default_value = "json")]
        format: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> citegraph::errors::Result<()> {
    match cli.command {
        Commands::Init { path, index } => {
            let project_path = resolve_path(path);
            let mut cg = CiteGraph::init(&project_path)?;
            println!("Initialized CiteGraph at {}", project_path.display());
            if index {
                print_index_result(&cg.index_all()?);
            }
        }
        Commands::Index { path } => {
            let project_path = resolve_path(path);
            let mut cg = CiteGraph::open(&project_path)?;
            print_index_result(&cg.index_all()?);
        }
        Commands::Status { path, json } => {
            let project_path = resolve_path(path);
            let cg = CiteGraph::open(&project_path)?;
            let stats = cg.get_stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", format_stats_as_text(&stats, cg.get_config().top_n));
                let coverage = GraphQueryManager::new(cg.graph()?).coverage();
                println!(
                    "\n  Cited identifiers: {} in graph, {} external",
                    coverage.get("in_graph").copied().unwrap_or(0),
                    coverage.get("external").copied().unwrap_or(0)
                );
            }
        }
        Commands::Analyze {
            manifest,
            path,
            depth,
            format,
            output,
        } => {
            let project_path = resolve_path(path);
            let cg = CiteGraph::open(&project_path)?;
            let output_format = if format == "json" {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };
            let results = cg.analyze_manifest(&manifest, depth)?;
            let rendered = match output_format {
                OutputFormat::Json => {
                    if results.len() == 1 {
                        format_query_as_json(&results[0])
                    } else {
                        serde_json::to_string_pretty(&results)?
                    }
                }
                OutputFormat::Text => {
                    let graph = cg.graph()?;
                    results
                        .iter()
                        .map(|r| format_query_as_text(r, graph))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            };
            match output {
                Some(file) => {
                    std::fs::write(&file, &rendered)?;
                    println!("Report saved: {}", file.display());
                }
                None => println!("{}", rendered),
            }
        }
        Commands::Show { id, path } => {
            let project_path = resolve_path(path);
            let cg = CiteGraph::open(&project_path)?;
            let graph = cg.graph()?;
            let Some(node) = graph.node(&id) else {
                println!("No document found with id '{}'", id);
                return Ok(());
            };
            println!("{} ({})", node.id, node.canonical_identifier);
            if let Some(title) = &node.title {
                println!("  Title: {}", title);
            }
            if let Some(date) = &node.date {
                println!("  Date: {}", date);
            }
            println!("  References: {}", node.reference_count);
            for reference in &node.outgoing_references {
                match reference_details(graph, reference).node_id {
                    Some(target) => println!("    -> {} [{}]", reference, target),
                    None => println!("    -> {} (external)", reference),
                }
            }
            if let Some(metrics) = GraphQueryManager::new(graph).document_metrics(&id) {
                println!("  Cited by: {}", metrics.cited_by.len());
                for source in &metrics.cited_by {
                    println!("    <- {}", source);
                }
            }
        }
        Commands::Export {
            output,
            path,
            format,
        } => {
            let project_path = resolve_path(path);
            let cg = CiteGraph::open(&project_path)?;
            let export_format =
                ExportFormat::from_str(&format).ok_or_else(|| CiteGraphError::Config {
                    message: format!(
                        "unknown export format '{}' (expected json, graphml or cytoscape)",
                        format
                    ),
                })?;
            cg.export(export_format, &output)?;
            println!("Graph exported to {}: {}", export_format.as_str(), output.display());
        }
    }
    Ok(())
}

fn print_index_result(result: &citegraph::citegraph::IndexResult) {
    println!(
        "Indexed {} manifests: {} documents, {} references, {} failed in {}ms",
        result.file_count,
        result.document_count,
        result.edge_count,
        result.failed_count,
        result.duration_ms
    );
}

/// Resolves an optional path argument to a `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
