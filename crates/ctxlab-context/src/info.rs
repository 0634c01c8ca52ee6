//! Resolved engine metadata

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSource {
    /// An explicit path from configuration or the environment
    Configured,
    System,
}

impl fmt::Display for EngineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineSource::Configured => write!(f, "configured path"),
            EngineSource::System => write!(f, "system PATH"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub name: String,
    pub source: EngineSource,
    pub path: PathBuf,
}
