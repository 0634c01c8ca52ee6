//! Doctor command - environment health check

use crate::context::Context;
use crate::output::print_json;
use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use ctxlab_context::{EngineLocator, PathLocator, Warmth, cache, default_cache_dir};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

/// Doctor command JSON output schema
#[derive(Debug, Serialize, Deserialize)]
struct DoctorOutput {
    schema_version: String,
    project: ProjectInfo,
    timestamp: String,
    checks: Vec<Check>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProjectInfo {
    /// `None` outside a project
    root: Option<String>,
    current_dir: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Check {
    id: String,
    name: String,
    status: CheckStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl Check {
    fn new(id: &str, name: &str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            status,
            message: message.into(),
            details: None,
        }
    }

    fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }
}

/// Run environment health check
///
/// # Returns
///
/// Always returns Ok(()) - doctor command always exits 0
pub fn run(json: bool, engine: Option<String>, verbose: bool) -> Result<()> {
    let ctx_result = Context::new(engine, verbose);
    let current_dir = env::current_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|_| ".".to_string());

    let mut checks = Vec::new();

    let project = match &ctx_result {
        Ok(ctx) => {
            let root = ctx.project.as_ref().map(|p| p.root.display().to_string());
            checks.push(match &root {
                Some(_) => Check::new(
                    "config_valid",
                    "Configuration file",
                    CheckStatus::Ok,
                    "ctxlab.toml is valid",
                ),
                None => Check::new(
                    "config_valid",
                    "Configuration file",
                    CheckStatus::Ok,
                    "no ctxlab.toml found; using defaults",
                ),
            });
            ProjectInfo { root, current_dir }
        }
        Err(e) => {
            checks.push(Check::new(
                "config_valid",
                "Configuration file",
                CheckStatus::Error,
                format!("Failed to load config: {}", e),
            ));
            ProjectInfo {
                root: None,
                current_dir,
            }
        }
    };

    if let Ok(ctx) = &ctx_result {
        checks.push(engine_check(ctx));
        checks.extend(theme_checks(ctx));
    }
    checks.push(cache_check());

    let output = DoctorOutput {
        schema_version: "1.0".to_string(),
        project,
        timestamp: Utc::now().to_rfc3339(),
        checks,
    };

    if json {
        print_json(&serde_json::to_string_pretty(&output)?)?;
    } else {
        print_human_readable(&output);
    }

    Ok(())
}

fn engine_check(ctx: &Context) -> Check {
    let locator = PathLocator::from_config(&ctx.config.engine);
    match locator.locate() {
        Ok(info) => Check::new(
            "engine_available",
            "Typesetter",
            CheckStatus::Ok,
            format!("{} found", info.name),
        )
        .detail("path", info.path.display().to_string())
        .detail("source", info.source.to_string()),
        Err(e) => Check::new(
            "engine_available",
            "Typesetter",
            CheckStatus::Error,
            e.to_string(),
        )
        .detail("executable", locator.executable()),
    }
}

fn theme_checks(ctx: &Context) -> Vec<Check> {
    let themes_dir = ctx.themes_dir();
    if !themes_dir.is_dir() {
        return vec![
            Check::new(
                "themes_dir",
                "Themes directory",
                CheckStatus::Error,
                format!("{} does not exist", themes_dir.display()),
            ),
        ];
    }

    let theme = &ctx.config.typeset.theme;
    let theme_dir = themes_dir.join(theme);
    let theme_check = if theme_dir.is_dir() {
        Check::new(
            "theme",
            "Theme",
            CheckStatus::Ok,
            format!("theme '{}' present", theme),
        )
    } else {
        Check::new(
            "theme",
            "Theme",
            CheckStatus::Error,
            format!("theme '{}' not found in {}", theme, themes_dir.display()),
        )
    };

    vec![
        Check::new(
            "themes_dir",
            "Themes directory",
            CheckStatus::Ok,
            themes_dir.display().to_string(),
        ),
        theme_check.detail("path", theme_dir.display().to_string()),
    ]
}

fn cache_check() -> Check {
    let dir = default_cache_dir();
    let check = match cache::classify(dir) {
        Ok(Warmth::Warm) => Check::new("cache", "Engine cache", CheckStatus::Ok, "warm"),
        Ok(Warmth::Cold) => Check::new(
            "cache",
            "Engine cache",
            CheckStatus::Warning,
            "cold; the next typeset bootstraps it first",
        ),
        Err(e) => Check::new("cache", "Engine cache", CheckStatus::Error, e.to_string()),
    };
    check.detail("path", dir.display().to_string())
}

/// Print human-readable output
fn print_human_readable(output: &DoctorOutput) {
    println!("{}", "Environment Health Check".bold());
    println!();

    println!("{}", "Project:".bold());
    match &output.project.root {
        Some(root) => println!("  Root: {}", root),
        None => println!("  Root: (none, running in {})", output.project.current_dir),
    }
    println!();

    println!("{}", "Checks:".bold());
    for check in &output.checks {
        let status_str = match check.status {
            CheckStatus::Ok => "✓".green(),
            CheckStatus::Warning => "⚠".yellow(),
            CheckStatus::Error => "✗".red(),
        };

        println!("  {} {}: {}", status_str, check.name.bold(), check.message);

        if let Some(details) = &check.details {
            for (key, value) in details {
                println!("      {}: {}", key, value);
            }
        }
    }

    println!();
    println!("Timestamp: {}", output.timestamp);
}
