mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use cli::{CacheCommands, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let engine = cli.engine;
    let result = match cli.command {
        Commands::Typeset(args) => commands::typeset::run(args, engine, cli.verbose),
        Commands::Doctor { json } => commands::doctor::run(json, engine, cli.verbose),
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Status { json } => commands::cache::status(json),
            CacheCommands::Clear => commands::cache::clear(cli.verbose),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `warn` by default, `debug` with `--verbose`; `RUST_LOG` overrides both
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}
