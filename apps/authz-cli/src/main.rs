//! # authz-cli
//!
//! Command-line interface for MCP gateway authorization.
//!
//! - `authz compile` compiles a deployment config into its policy artifact
//! - `authz digest` prints the artifact's SHA-256 digest
//! - `authz decide` evaluates one request against a deployment
//!
//! JSON output goes to stdout; logs go to stderr (`RUST_LOG` to adjust).

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// MCP gateway authorization tools.
#[derive(Parser)]
#[command(name = "authz", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a deployment config into its policy artifact.
    Compile {
        /// Deployment config (TOML).
        #[arg(long)]
        config: PathBuf,
        /// Write the artifact here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the digest of a deployment's compiled artifact.
    Digest {
        /// Deployment config (TOML).
        #[arg(long)]
        config: PathBuf,
    },
    /// Decide one request against a deployment.
    Decide {
        /// Deployment config (TOML).
        #[arg(long)]
        config: PathBuf,
        /// Authorization tables (.json, .yaml or .yml). Empty when omitted.
        #[arg(long)]
        tables: Option<PathBuf>,
        /// Decision input (JSON).
        #[arg(long)]
        input: PathBuf,
        /// Print every layer's verdict, not just the decision.
        #[arg(long)]
        trace: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("authz_policy=info".parse()?)
                .add_directive("authz=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Compile { config, output } => {
            commands::compile::execute(config, output.as_deref())
        }
        Commands::Digest { config } => commands::digest::execute(config),
        Commands::Decide {
            config,
            tables,
            input,
            trace,
        } => commands::decide::execute(config, tables.as_deref(), input, *trace),
    }
}
