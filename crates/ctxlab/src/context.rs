//! Global context for CLI commands

use anyhow::{Result, anyhow};
use ctxlab_core::{config::Config, project::Project, state::State};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration in effect for this invocation
///
/// Commands work outside a project too; then `project` is `None` and the
/// defaults apply relative to the current directory.
pub struct Context {
    pub project: Option<Project>,
    pub config: Config,
    pub current_dir: PathBuf,
    pub verbose: bool,
}

impl Context {
    /// Discover the project and apply the `--engine` override
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The current directory cannot be determined
    /// - A `ctxlab.toml` was found but cannot be read or parsed
    pub fn new(engine: Option<String>, verbose: bool) -> Result<Self> {
        let current_dir = env::current_dir()?;
        let project = Project::find_root(&current_dir)
            .map_err(|e| anyhow!("Failed to load project: {}", e))?;

        let mut config = project
            .as_ref()
            .map(|p| p.config().clone())
            .unwrap_or_default();
        if let Some(engine) = engine {
            config.engine.executable = engine;
        }

        if let Some(project) = &project {
            log::debug!("project root: {}", project.root.display());
        }

        Ok(Self {
            project,
            config,
            current_dir,
            verbose,
        })
    }

    /// Themes directory from configuration
    ///
    /// Relative paths resolve against the project root, or the current
    /// directory outside a project.
    pub fn themes_dir(&self) -> PathBuf {
        let base = self
            .project
            .as_ref()
            .map(|p| p.root.as_path())
            .unwrap_or(self.current_dir.as_path());
        base.join(&self.config.typeset.themes_dir)
    }

    /// Make `path` absolute against the current directory
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }

    /// Persist `update` applied to the project's state.json
    ///
    /// The update holds the project's state lock, so concurrent runs in one
    /// project do not overwrite each other. Outside a project there is
    /// nowhere to record state and this is a no-op. Failures are logged, not
    /// returned.
    pub fn update_state(&self, update: impl FnOnce(&mut State)) {
        let Some(project) = &self.project else {
            return;
        };

        if let Err(e) = State::update(project.state_path(), update) {
            log::warn!("could not record run state: {}", e);
        }
    }
}
