//! Locating the typesetter executable

use crate::info::{EngineInfo, EngineSource};
use ctxlab_core::config::EngineConfig;
use ctxlab_core::{CtxlabError, Result};
use std::path::{Path, PathBuf};

/// Finds the typesetting executable
///
/// Resolution happens before anything is spawned, so a missing engine is
/// reported as a configuration problem rather than a launch failure.
pub trait EngineLocator: Send + Sync {
    fn locate(&self) -> Result<EngineInfo>;
}

/// Locates the engine by name on PATH, or by an explicit path
#[derive(Debug, Clone)]
pub struct PathLocator {
    executable: String,
}

impl PathLocator {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.executable.clone())
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    fn is_explicit_path(&self) -> bool {
        Path::new(&self.executable).components().count() > 1
    }
}

impl EngineLocator for PathLocator {
    fn locate(&self) -> Result<EngineInfo> {
        if self.is_explicit_path() {
            let path = PathBuf::from(&self.executable);
            return resolve_configured(&self.executable, path);
        }
        resolve_system(&self.executable)
    }
}

/// Resolve an explicitly configured executable path
fn resolve_configured(name: &str, path: PathBuf) -> Result<EngineInfo> {
    if !path.is_file() {
        return Err(CtxlabError::EngineNotFound {
            name: name.to_string(),
            searched: path.display().to_string(),
        });
    }

    let path = std::fs::canonicalize(&path).unwrap_or(path);
    Ok(EngineInfo {
        name: name.to_string(),
        source: EngineSource::Configured,
        path,
    })
}

/// Resolve the executable from system PATH
///
/// `which` appends the platform executable suffix where needed.
fn resolve_system(name: &str) -> Result<EngineInfo> {
    match which::which(name) {
        Ok(path) => {
            log::debug!("resolved {} to {}", name, path.display());
            Ok(EngineInfo {
                name: name.to_string(),
                source: EngineSource::System,
                path,
            })
        }
        Err(e) => {
            log::debug!("{} not found on PATH: {}", name, e);
            Err(CtxlabError::EngineNotFound {
                name: name.to_string(),
                searched: "PATH".to_string(),
            })
        }
    }
}
