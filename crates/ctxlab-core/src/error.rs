use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CtxlabError {
    // Config errors
    #[error("CONFIG_PARSE_ERROR: {0}")]
    ConfigParseError(String),

    #[error("PROJECT_CONFIG_INVALID: failed to parse ctxlab.toml: {0}")]
    ProjectConfigInvalid(String),

    // Engine errors
    #[error("ENGINE_NOT_FOUND: typesetter '{name}' could not be found (searched: {searched})")]
    EngineNotFound { name: String, searched: String },

    #[error("ENGINE_LAUNCH_FAILED: could not start '{program}': {source}")]
    EngineLaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ENGINE_INTERRUPTED: waiting for '{program}' was interrupted: {source}")]
    EngineInterrupted {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache errors
    #[error("CACHE_INSPECT_FAILED: could not list cache directory '{path}': {source}")]
    CacheInspectFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Request errors
    #[error("REQUEST_INVALID: {0}")]
    RequestInvalid(String),

    // State errors
    #[error("STATE_READ_ERROR: failed to read state.json: {0}")]
    StateReadError(String),

    #[error("STATE_WRITE_ERROR: failed to write state.json: {0}")]
    StateWriteError(String),

    #[error("STATE_INVALID_SCHEMA: unknown schema version '{0}'")]
    StateInvalidSchema(String),

    // IO errors
    #[error("IO_ERROR: {0}")]
    IoError(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Generic(String),
}

impl CtxlabError {
    /// True for the failures that mean the engine could not be configured,
    /// as opposed to failures while it was running.
    pub fn is_configuration(&self) -> bool {
        matches!(self, CtxlabError::EngineNotFound { .. })
    }
}

impl From<serde_json::Error> for CtxlabError {
    fn from(err: serde_json::Error) -> Self {
        CtxlabError::Generic(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, CtxlabError>;
