//! Engine cache commands

use crate::output::print_json;
use anyhow::Result;
use colored::Colorize;
use ctxlab_context::{cache, default_cache_dir};
use serde::{Deserialize, Serialize};

/// Cache status output schema
#[derive(Debug, Serialize, Deserialize)]
struct CacheStatus {
    path: String,
    warm: bool,
    entries: usize,
}

/// Show where the engine cache lives and whether it is populated
pub fn status(json: bool) -> Result<()> {
    let dir = default_cache_dir();
    let status = CacheStatus {
        path: dir.display().to_string(),
        warm: cache::is_warm(dir)?,
        entries: cache::entry_count(dir)?,
    };

    if json {
        print_json(&serde_json::to_string_pretty(&status)?)?;
    } else {
        let state = if status.warm {
            "warm".green()
        } else {
            "cold".yellow()
        };
        println!("{}", "Engine Cache".bold());
        println!("  Path:    {}", status.path);
        println!("  State:   {}", state);
        println!("  Entries: {}", status.entries);
    }

    Ok(())
}

/// Remove the engine cache
pub fn clear(verbose: bool) -> Result<()> {
    let dir = default_cache_dir();

    if verbose {
        eprintln!("Clearing engine cache at {}...", dir.display());
    }

    if cache::clear(dir)? {
        println!("{}", "Engine cache cleared".green());
    } else {
        println!("Engine cache already empty");
    }

    Ok(())
}
