//! Scholar Stream CLI
//!
//! Builds the two paper collections and runs ad-hoc queries against them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scholar_stream::{bootstrap, build_from_config, merge_for_display, ScholarConfig, MERGE_CAVEAT};

#[derive(Parser)]
#[command(name = "scholar-stream")]
#[command(author, version, about = "Dual-model semantic paper search", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "scholar.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "scholar.yaml")]
        output: PathBuf,
    },

    /// Encode every paper with both models and persist both collections
    Build,

    /// Run one query and print the result as JSON
    Search {
        /// Free-text query
        query: String,

        /// Print one combined list sorted by score instead of the two per-model lists
        #[arg(long)]
        merged: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Init { output } => {
            let yaml = ScholarConfig::default().to_yaml()?;
            std::fs::write(&output, yaml)
                .with_context(|| format!("writing {}", output.display()))?;
            info!("Configuration saved to {}", output.display());
        }

        Commands::Build => {
            let cfg = load_config(&cli.config)?;
            let report = build_from_config(&cfg).await.context("bulk build failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Search { query, merged } => {
            let cfg = load_config(&cli.config)?;
            let retriever = bootstrap(&cfg).await.context("startup failed")?;
            let result = retriever.retrieve(&query).await?;
            let output = if merged {
                json!({
                    "query": &result.query,
                    "caveat": MERGE_CAVEAT,
                    "results": merge_for_display(&result),
                })
            } else {
                serde_json::to_value(&result)?
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<ScholarConfig> {
    info!("Loading configuration from: {}", path.display());
    ScholarConfig::load(path).with_context(|| format!("loading {}", path.display()))
}
