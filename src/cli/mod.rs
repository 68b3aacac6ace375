//! CLI interface for deal-signals
//!
//! Provides subcommands for:
//! - `run`: Compute signals from the warehouse and merge them into the store
//! - `ingest`: Load captured listings into the warehouse
//! - `deals`: List current deals
//! - `config`: Show effective configuration

mod deals;
mod ingest;
mod run;

pub use deals::{DealsArgs, OutputFormat};
pub use ingest::IngestArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "deal-signals")]
#[command(about = "Rolling-window deal signals for alternative-asset prices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute signals and merge them into the signal store
    Run(RunArgs),
    /// Write captured listings (JSON Lines) to the warehouse
    Ingest(IngestArgs),
    /// List current deals
    Deals(DealsArgs),
    /// Show effective configuration
    Config,
}
