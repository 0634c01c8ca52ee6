use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::consts::engine::DEFAULT_EXECUTABLE;

/// ctxlab.toml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub typeset: TypesetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Executable name searched on PATH, or an explicit path
    #[serde(default = "default_executable")]
    pub executable: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
        }
    }
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypesetConfig {
    /// Directory holding one subdirectory per theme
    #[serde(default = "default_themes_dir")]
    pub themes_dir: PathBuf,
    /// Selected theme (subdirectory of `themes_dir`)
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Delete engine leftovers after a failed run
    #[serde(default = "default_autoclean")]
    pub autoclean: bool,
}

impl Default for TypesetConfig {
    fn default() -> Self {
        Self {
            themes_dir: default_themes_dir(),
            theme: default_theme(),
            autoclean: default_autoclean(),
        }
    }
}

fn default_themes_dir() -> PathBuf {
    PathBuf::from("themes")
}

fn default_theme() -> String {
    "boschet".to_string()
}

fn default_autoclean() -> bool {
    true
}

impl Config {
    /// ctxlab.toml を読み込む
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| crate::error::CtxlabError::ConfigParseError(e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| crate::error::CtxlabError::ProjectConfigInvalid(e.to_string()))
    }

    /// ctxlab.toml に書き込む
    pub fn to_file(&self, path: impl AsRef<std::path::Path>) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CtxlabError::ConfigParseError(e.to_string()))?;

        std::fs::write(path.as_ref(), content).map_err(crate::error::CtxlabError::IoError)?;

        Ok(())
    }
}
