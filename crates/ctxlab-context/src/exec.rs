//! Running one engine invocation
//!
//! [`ProcessRunner`] is the seam the typesetter drives. [`SystemRunner`]
//! spawns the real process with stdout piped into a progress listener.

use crate::line_cache::BoundedLineCache;
use crate::listener::{ListenerReport, ProgressListener, ProgressState};
use crate::progress::ProgressSink;
use ctxlab_core::config::consts::capture::{GRACE_PERIOD_MS, LINE_CACHE_CAPACITY};
use ctxlab_core::config::consts::engine::CACHE_ENV_VAR;
use ctxlab_core::{CtxlabError, Result};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One engine invocation, built fresh for every attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    /// `argv[0]` is the resolved executable
    pub argv: Vec<OsString>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, OsString>,
}

impl ProcessInvocation {
    /// Invocation with `TEXMFCACHE` pointing at `cache_dir`
    pub fn new(argv: Vec<OsString>, working_dir: impl Into<PathBuf>, cache_dir: &Path) -> Self {
        let mut env = BTreeMap::new();
        env.insert(
            CACHE_ENV_VAR.to_string(),
            cache_dir.as_os_str().to_os_string(),
        );
        Self {
            argv,
            working_dir: working_dir.into(),
            env,
        }
    }

    pub fn program(&self) -> &Path {
        self.argv
            .first()
            .map(Path::new)
            .unwrap_or_else(|| Path::new(""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// `--generate` on a cold cache
    Bootstrap,
    /// The real batch run
    Render,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempt::Bootstrap => write!(f, "bootstrap"),
            Attempt::Render => write!(f, "render"),
        }
    }
}

/// How one invocation ended
#[derive(Debug, Clone)]
pub struct ExitOutcome {
    pub attempt: Attempt,
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub elapsed: Duration,
    pub progress: ProgressState,
    /// Captured stdout, up to the end of the grace period if the stream
    /// stayed open
    pub output: BoundedLineCache,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs one invocation to completion
///
/// A non-zero exit is a normal outcome, not an error.
pub trait ProcessRunner: Send + Sync {
    fn run(
        &self,
        invocation: &ProcessInvocation,
        attempt: Attempt,
        sink: &Arc<dyn ProgressSink>,
    ) -> Result<ExitOutcome>;
}

/// Spawns real child processes
#[derive(Debug, Clone)]
pub struct SystemRunner {
    grace: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            grace: Duration::from_millis(GRACE_PERIOD_MS),
        }
    }
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long to wait for stdout to close after the process exits
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        invocation: &ProcessInvocation,
        attempt: Attempt,
        sink: &Arc<dyn ProgressSink>,
    ) -> Result<ExitOutcome> {
        let program = invocation.program().to_path_buf();
        log::debug!(
            "{} attempt: {:?} in {}",
            attempt,
            invocation.argv,
            invocation.working_dir.display()
        );

        let started = Instant::now();
        let mut child = Command::new(&program)
            .args(invocation.argv.iter().skip(1))
            .current_dir(&invocation.working_dir)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CtxlabError::EngineLaunchFailed {
                program: program.clone(),
                source,
            })?;

        let listener = match child.stdout.take() {
            Some(stdout) => {
                match ProgressListener::spawn(stdout, Arc::clone(sink), LINE_CACHE_CAPACITY) {
                    Ok(listener) => Some(listener),
                    Err(source) => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(CtxlabError::EngineLaunchFailed { program, source });
                    }
                }
            }
            None => None,
        };

        let status = child
            .wait()
            .map_err(|source| CtxlabError::EngineInterrupted {
                program: program.clone(),
                source,
            })?;

        let report = listener
            .map(|listener| listener.finish(self.grace))
            .unwrap_or_else(|| ListenerReport::empty(LINE_CACHE_CAPACITY));
        let elapsed = started.elapsed();

        log::info!(
            "{} attempt finished with {} after {}ms",
            attempt,
            status,
            elapsed.as_millis()
        );

        Ok(ExitOutcome {
            attempt,
            code: status.code(),
            elapsed,
            progress: report.state,
            output: report.lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::CollectingSink;

    fn sink() -> Arc<dyn ProgressSink> {
        Arc::new(CollectingSink::new())
    }

    #[test]
    fn test_invocation_sets_cache_variable() {
        let invocation = ProcessInvocation::new(
            vec!["mtxrun".into(), "--generate".into()],
            "/work",
            Path::new("/tmp/luatex-cache"),
        );
        assert_eq!(
            invocation.env.get("TEXMFCACHE"),
            Some(&OsString::from("/tmp/luatex-cache"))
        );
        assert_eq!(invocation.program(), Path::new("mtxrun"));
    }

    #[test]
    fn test_exit_outcome_success_only_on_zero() {
        let mut outcome = ExitOutcome {
            attempt: Attempt::Render,
            code: Some(0),
            elapsed: Duration::ZERO,
            progress: ProgressState::default(),
            output: BoundedLineCache::new(1),
        };
        assert!(outcome.success());
        outcome.code = Some(1);
        assert!(!outcome.success());
        outcome.code = None;
        assert!(!outcome.success());
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let temp = ctxlab_testkit::temp_dir_in_workspace();
        let invocation = ProcessInvocation::new(
            vec![temp.path().join("no-such-engine").into_os_string()],
            temp.path(),
            temp.path(),
        );
        let err = SystemRunner::new()
            .run(&invocation, Attempt::Render, &sink())
            .unwrap_err();
        assert!(matches!(err, CtxlabError::EngineLaunchFailed { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn test_non_zero_exit_is_not_an_error() {
        let temp = ctxlab_testkit::temp_dir_in_workspace();
        let invocation = ProcessInvocation::new(
            vec!["sh".into(), "-c".into(), "echo one; echo two; exit 3".into()],
            temp.path(),
            temp.path(),
        );
        let outcome = SystemRunner::new()
            .run(&invocation, Attempt::Render, &sink())
            .unwrap();
        assert_eq!(outcome.code, Some(3));
        assert!(!outcome.success());
        assert_eq!(outcome.output.into_lines(), vec!["one", "two"]);
    }

    #[test]
    #[cfg(unix)]
    fn test_environment_and_working_dir_reach_child() {
        let temp = ctxlab_testkit::temp_dir_in_workspace();
        let cache = temp.path().join("cache");
        let invocation = ProcessInvocation::new(
            vec!["sh".into(), "-c".into(), "echo \"$TEXMFCACHE\"; pwd".into()],
            temp.path(),
            &cache,
        );
        let outcome = SystemRunner::new()
            .run(&invocation, Attempt::Bootstrap, &sink())
            .unwrap();
        let lines = outcome.output.into_lines();
        assert_eq!(lines[0], cache.display().to_string());
        let pwd = std::fs::canonicalize(&lines[1]).unwrap();
        assert_eq!(pwd, std::fs::canonicalize(temp.path()).unwrap());
    }

    #[test]
    #[cfg(unix)]
    fn test_output_kept_when_grandchild_holds_stdout() {
        let temp = ctxlab_testkit::temp_dir_in_workspace();
        let invocation = ProcessInvocation::new(
            vec![
                "sh".into(),
                "-c".into(),
                "echo 'tex error > line 12'; sleep 3 & exit 1".into(),
            ],
            temp.path(),
            temp.path(),
        );
        let outcome = SystemRunner::new()
            .with_grace(Duration::from_millis(200))
            .run(&invocation, Attempt::Render, &sink())
            .unwrap();

        assert_eq!(outcome.code, Some(1));
        assert!(outcome.output.contains("tex error > line 12"));
        assert!(outcome.elapsed < Duration::from_secs(3));
    }
}
