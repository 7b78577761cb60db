//! Patchcode CLI - normalize patch graph files from the command line

use clap::{Parser, Subcommand};
use patchcode::graph::Graph;
use patchcode::{NodeSchema, Normalizer, NormalizerConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "patchcode")]
#[command(about = "Compile patch graphs into canonical pattern code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a graph file and print the result as JSON
    Normalize {
        /// Graph file (.json)
        graph: PathBuf,

        /// Node schema file (.json or .toml)
        #[arg(short, long)]
        schema: PathBuf,

        /// Normalizer config file (.toml or .json); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Print the default normalizer config as TOML
    Defaults,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize logging; stdout carries the JSON result
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize {
            graph,
            schema,
            config,
            compact,
        } => {
            let schema = NodeSchema::load(&schema)?;
            let config = match config {
                Some(path) => NormalizerConfig::load(&path)?,
                None => NormalizerConfig::default(),
            };
            info!(
                "Loaded {} node type(s) and {} collapse rule(s)",
                schema.len(),
                config.rules.len()
            );

            let graph = Graph::from_json_str(&std::fs::read_to_string(&graph)?)?;
            let result = Normalizer::new(schema, config).normalize_graph(&graph);

            let json = if compact {
                serde_json::to_string(&result)?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{}", json);

            if result.success {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Defaults => {
            print!("{}", NormalizerConfig::default().to_toml_string()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
