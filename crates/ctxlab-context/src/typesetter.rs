//! Orchestration of one typesetting run
//!
//! A run inspects the engine cache, bootstraps it when cold, renders the
//! document, and on failure gathers the engine's logs.

use crate::cache::{self, Warmth};
use crate::command::{CommandBuilder, display_argv};
use crate::diagnostics::{DiagnosticArtifacts, Diagnostics};
use crate::elapsed::format_elapsed;
use crate::exec::{Attempt, ExitOutcome, ProcessInvocation, ProcessRunner, SystemRunner};
use crate::info::EngineInfo;
use crate::progress::ProgressSink;
use crate::request::TypesetRequest;
use crate::resolve::{EngineLocator, PathLocator};
use ctxlab_core::Result;
use ctxlab_core::config::EngineConfig;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypesetStatus {
    Success,
    /// The last invocation exited unsuccessfully; `None` means a signal
    Failed { code: Option<i32> },
    /// The bootstrap exited cleanly but left the cache empty
    CacheNotPopulated,
}

impl fmt::Display for TypesetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypesetStatus::Success => write!(f, "success"),
            TypesetStatus::Failed { code: Some(code) } => write!(f, "exit code {}", code),
            TypesetStatus::Failed { code: None } => write!(f, "terminated by signal"),
            TypesetStatus::CacheNotPopulated => write!(f, "engine cache was not populated"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypesetOutcome {
    pub status: TypesetStatus,
    pub engine: EngineInfo,
    /// One entry per invocation, at most two
    pub attempts: Vec<ExitOutcome>,
    pub elapsed: Duration,
    /// Present only after a failed invocation
    pub diagnostics: Option<Diagnostics>,
}

impl TypesetOutcome {
    pub fn success(&self) -> bool {
        self.status == TypesetStatus::Success
    }
}

/// Steps of one typeset operation
///
/// `Inspect` may lead to `Bootstrap` or `Render`, `Bootstrap` only to
/// `Render` or `Finished`, so no request runs the engine more than twice.
enum Phase {
    Inspect,
    Bootstrap,
    Render,
    Finished(TypesetStatus),
}

/// Drives the engine for typeset requests
pub struct Typesetter {
    locator: Box<dyn EngineLocator>,
    runner: Box<dyn ProcessRunner>,
    cache_dir: PathBuf,
}

impl Typesetter {
    pub fn new(
        locator: impl EngineLocator + 'static,
        runner: impl ProcessRunner + 'static,
    ) -> Self {
        Self {
            locator: Box::new(locator),
            runner: Box::new(runner),
            cache_dir: cache::default_cache_dir().to_path_buf(),
        }
    }

    /// Typesetter for the configured engine, spawning real processes
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(PathLocator::from_config(config), SystemRunner::new())
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Whether the engine resolves; nothing is spawned
    pub fn can_run(&self) -> bool {
        self.locator.locate().is_ok()
    }

    pub fn locate(&self) -> Result<EngineInfo> {
        self.locator.locate()
    }

    /// Typeset `request`, bootstrapping the engine cache first if needed
    ///
    /// # Errors
    ///
    /// `EngineNotFound` before anything is spawned, `EngineLaunchFailed` and
    /// `EngineInterrupted` from the runner, `CacheInspectFailed` when the cache
    /// directory cannot be listed. An engine exiting unsuccessfully is not an
    /// error; see [`TypesetOutcome::status`].
    pub fn typeset(
        &self,
        request: &TypesetRequest,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<TypesetOutcome> {
        let engine = self.locator.locate()?;
        let builder = CommandBuilder::new(&engine.path);
        let output = request.output().display().to_string();

        sink.status(&format!("Typesetting {}", output));
        let started = Instant::now();
        let mut attempts: Vec<ExitOutcome> = Vec::with_capacity(2);

        let mut phase = Phase::Inspect;
        let status = loop {
            phase = match phase {
                Phase::Inspect => match cache::classify(&self.cache_dir)? {
                    Warmth::Warm => Phase::Render,
                    Warmth::Cold => {
                        log::info!("engine cache {} is cold", self.cache_dir.display());
                        Phase::Bootstrap
                    }
                },
                Phase::Bootstrap => {
                    let argv = builder.build(false, request);
                    let outcome = self.attempt(argv, request, Attempt::Bootstrap, &sink)?;
                    let code = outcome.code;
                    let success = outcome.success();
                    attempts.push(outcome);

                    if !success {
                        Phase::Finished(TypesetStatus::Failed { code })
                    } else if cache::is_warm(&self.cache_dir)? {
                        Phase::Render
                    } else {
                        log::warn!(
                            "bootstrap left {} empty; not retrying",
                            self.cache_dir.display()
                        );
                        Phase::Finished(TypesetStatus::CacheNotPopulated)
                    }
                }
                Phase::Render => {
                    let argv = builder.build(true, request);
                    sink.status(&display_argv(&argv));
                    let outcome = self.attempt(argv, request, Attempt::Render, &sink)?;
                    let status = if outcome.success() {
                        TypesetStatus::Success
                    } else {
                        TypesetStatus::Failed { code: outcome.code }
                    };
                    attempts.push(outcome);
                    Phase::Finished(status)
                }
                Phase::Finished(status) => break status,
            };
        };

        let diagnostics = match (status, attempts.last()) {
            (TypesetStatus::Failed { .. }, Some(last)) => Some(collect_diagnostics(request, last)),
            _ => None,
        };

        let elapsed = started.elapsed();
        if status == TypesetStatus::Success {
            sink.status(&format!("Typeset {} in {}", output, format_elapsed(elapsed)));
        } else {
            sink.status(&format!(
                "Failed to typeset {} after {}",
                output,
                format_elapsed(elapsed)
            ));
        }

        Ok(TypesetOutcome {
            status,
            engine,
            attempts,
            elapsed,
            diagnostics,
        })
    }

    fn attempt(
        &self,
        argv: Vec<OsString>,
        request: &TypesetRequest,
        attempt: Attempt,
        sink: &Arc<dyn ProgressSink>,
    ) -> Result<ExitOutcome> {
        let invocation = ProcessInvocation::new(argv, request.working_dir(), &self.cache_dir);
        self.runner.run(&invocation, attempt, sink)
    }
}

fn collect_diagnostics(request: &TypesetRequest, last: &ExitOutcome) -> Diagnostics {
    let artifacts = DiagnosticArtifacts::derive(request);
    let lines = artifacts.collect(&last.output);
    for line in &lines {
        log::debug!("engine: {}", line);
    }

    let cleanup = if request.autoclean() {
        Some(artifacts.cleanup())
    } else {
        None
    };

    Diagnostics { lines, cleanup }
}
