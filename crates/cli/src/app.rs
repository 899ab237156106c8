use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(name = "cidfetch", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Configuration file (default: ./cidfetch.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Dump Prometheus metrics to stderr when the command finishes
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// List the providers the catalog knows for a CID
    #[command(alias = "c", name = "candidates")]
    Candidates(CandidatesArg),
    /// Print the effective configuration as TOML
    #[command(alias = "cfg", name = "config")]
    Config,
}

#[derive(Clone, Debug, Args)]
pub struct CandidatesArg {
    /// Content identifier to look up
    pub cid: String,
    /// Catalog endpoint, overriding the configured one
    #[arg(long)]
    pub endpoint: Option<String>,
    /// Print candidates as JSON
    #[arg(long)]
    pub json: bool,
}
