//! Typeset command - render a document with ConTeXt

use crate::cli::TypesetArgs;
use crate::context::Context;
use crate::output::ConsoleSink;
use anyhow::{Context as _, Result, anyhow, bail};
use chrono::Utc;
use colored::Colorize;
use ctxlab_context::{
    Diagnostics, TypesetOutcome, TypesetRequest, TypesetStatus, Typesetter, format_elapsed,
};
use ctxlab_core::state::LastTypeset;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;

/// Document handed to the engine
enum Input {
    File(PathBuf),
    /// Copied from stdin; removed on drop unless kept
    Staged(TempPath),
}

impl Input {
    fn path(&self) -> &Path {
        match self {
            Input::File(path) => path.as_path(),
            Input::Staged(temp) => temp,
        }
    }
}

pub fn run(args: TypesetArgs, engine: Option<String>, verbose: bool) -> Result<()> {
    let ctx = Context::new(engine, verbose)?;
    let autoclean = ctx.config.typeset.autoclean && !args.keep_artifacts;

    if args.output.is_none() && is_stdin(&args.input) {
        bail!("--output is required when reading the document from stdin");
    }

    let input = resolve_input(&ctx, &args.input)?;
    let output = match &args.output {
        Some(output) => ctx.absolute(output),
        None => input.path().with_extension("pdf"),
    };

    let themes_dir = match &args.themes_dir {
        Some(dir) => ctx.absolute(dir),
        None => ctx.themes_dir(),
    };
    let theme = args
        .theme
        .clone()
        .unwrap_or_else(|| ctx.config.typeset.theme.clone());

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    if !themes_dir.join(&theme).is_dir() {
        log::warn!("theme '{}' not found in {}", theme, themes_dir.display());
    }

    let request = TypesetRequest::new(input.path(), &output, themes_dir, theme)?
        .with_autoclean(autoclean);
    let typesetter = Typesetter::from_config(&ctx.config.engine);
    let sink = Arc::new(ConsoleSink::new(ctx.verbose));

    let started_at = Utc::now();
    let result = typesetter.typeset(&request, sink);
    let finished_at = Utc::now();

    ctx.update_state(|state| {
        state.record_typeset(LastTypeset {
            input: request.input().to_path_buf(),
            output: request.output().to_path_buf(),
            success: matches!(&result, Ok(outcome) if outcome.success()),
            attempts: result
                .as_ref()
                .map(|outcome| outcome.attempts.len() as u8)
                .unwrap_or(0),
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds().max(0) as u64,
            error: match &result {
                Ok(outcome) if outcome.success() => None,
                Ok(outcome) => Some(outcome.status.to_string()),
                Err(e) => Some(e.to_string()),
            },
        });
    });

    let outcome = result?;

    if !autoclean {
        if let Input::Staged(temp) = input {
            let kept = temp.keep().context("failed to keep staged input")?;
            eprintln!("Staged input kept at {}", kept.display());
        }
    }

    report(&outcome, &output)
}

fn is_stdin(input: &Path) -> bool {
    input.as_os_str() == "-"
}

/// The document path, staging stdin into a temporary `.xml` file
fn resolve_input(ctx: &Context, input: &Path) -> Result<Input> {
    if is_stdin(input) {
        let mut document = Vec::new();
        io::stdin()
            .read_to_end(&mut document)
            .context("failed to read document from stdin")?;

        let mut staged = tempfile::Builder::new()
            .prefix("ctxlab-")
            .suffix(".xml")
            .tempfile()?;
        staged.write_all(&document)?;
        return Ok(Input::Staged(staged.into_temp_path()));
    }

    let path = ctx.absolute(input);
    if !path.is_file() {
        return Err(anyhow!("input document not found: {}", path.display()));
    }
    Ok(Input::File(path))
}

fn report(outcome: &TypesetOutcome, output: &Path) -> Result<()> {
    let elapsed = format_elapsed(outcome.elapsed);

    if outcome.success() {
        println!(
            "{} Typeset {} in {}",
            "✓".green(),
            output.display(),
            elapsed
        );
        return Ok(());
    }

    eprintln!(
        "{} Failed to typeset {} after {}",
        "✗".red(),
        output.display(),
        elapsed
    );

    if let Some(diagnostics) = &outcome.diagnostics {
        print_diagnostics(diagnostics);
    }

    match outcome.status {
        TypesetStatus::CacheNotPopulated => bail!(
            "engine cache was not populated by `{} --generate`; check the ConTeXt installation",
            outcome.engine.path.display()
        ),
        status => bail!("typesetting failed ({})", status),
    }
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if !diagnostics.lines.is_empty() {
        eprintln!();
        eprintln!("{}", "Engine output:".bold());
        for line in &diagnostics.lines {
            eprintln!("  {}", line);
        }
    }

    if let Some(cleanup) = &diagnostics.cleanup {
        for (path, reason) in &cleanup.failed {
            eprintln!(
                "{} could not remove {}: {}",
                "⚠".yellow(),
                path.display(),
                reason
            );
        }
    }
}
