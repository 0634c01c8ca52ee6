//! CLI command structure using clap

use clap::{Args, Parser, Subcommand};
use ctxlab_core::config::consts::engine::EXECUTABLE_ENV_VAR;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ctxlab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Typesetter executable name or path (default: mtxrun)
    #[arg(long, global = true, env = EXECUTABLE_ENV_VAR)]
    pub engine: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Typeset a document to PDF
    Typeset(TypesetArgs),

    /// Check environment health
    Doctor {
        #[arg(long)]
        json: bool,
    },

    /// Engine cache management
    #[command(subcommand)]
    Cache(CacheCommands),
}

#[derive(Args)]
pub struct TypesetArgs {
    /// Document to typeset, or `-` to read it from stdin
    pub input: PathBuf,

    /// Output PDF (default: input with a .pdf extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory holding the themes
    #[arg(long)]
    pub themes_dir: Option<PathBuf>,

    /// Theme to typeset with
    #[arg(long)]
    pub theme: Option<String>,

    /// Keep engine logs and intermediate files after a failure
    #[arg(long)]
    pub keep_artifacts: bool,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show engine cache location and state
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Remove the engine cache; the next run bootstraps it again
    Clear,
}
