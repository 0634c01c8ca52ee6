//! Constants shared across the workspace

/// Project file names
pub mod project {
    /// Configuration file searched for from the current directory upward
    pub const CONFIG_FILE: &str = "ctxlab.toml";

    /// Directory holding disposable run state
    pub const STATE_DIR: &str = ".ctxlab";

    /// Run state file inside [`STATE_DIR`]
    pub const STATE_FILE: &str = "state.json";
}

/// Typesetting engine defaults
pub mod engine {
    /// Launcher looked up on PATH when nothing else is configured
    pub const DEFAULT_EXECUTABLE: &str = "mtxrun";

    /// Environment variable the engine reads its cache location from
    pub const CACHE_ENV_VAR: &str = "TEXMFCACHE";

    /// Cache directory name below the system temp directory
    pub const CACHE_DIR_NAME: &str = "luatex-cache";

    /// Theme entry point file name (without extension)
    pub const THEME_ENTRY_POINT: &str = "main";

    /// Environment variable overriding the configured executable
    pub const EXECUTABLE_ENV_VAR: &str = "CTXLAB_ENGINE";
}

/// Output capture limits
pub mod capture {
    /// Number of distinct stdout lines retained for failure diagnostics
    pub const LINE_CACHE_CAPACITY: usize = 150;

    /// Prefix of engine lines announcing a flushed page
    pub const PAGINATION_MARKER: &str = "pages";

    /// Grace period after process exit for trailing output (milliseconds)
    pub const GRACE_PERIOD_MS: u64 = 1000;
}
