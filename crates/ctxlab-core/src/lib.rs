// Core modules
pub mod config;
pub mod error;
pub mod lock;
pub mod project;
pub mod state;

// Re-export commonly used types
pub use error::{CtxlabError, Result};
