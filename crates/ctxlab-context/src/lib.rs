//! ConTeXt process orchestration for ctxlab.
//!
//! This crate drives the `mtxrun` launcher to turn a document into a PDF. It
//! owns the engine cache lifecycle, scrapes pagination progress from the
//! engine's stdout and recovers the engine's logs when a run fails.
//!
//! # Architecture
//!
//! - [`resolve`]: engine lookup on PATH or by explicit path
//! - [`command`]: argument vectors for cold and warm runs
//! - [`cache`]: cold/warm classification of `TEXMFCACHE`
//! - [`listener`]: stdout scraping on a dedicated thread
//! - [`line_cache`]: bounded capture of recent output lines
//! - [`exec`]: spawning and waiting for one invocation
//! - [`diagnostics`]: failure log replay and artifact cleanup
//! - [`typesetter`]: the bootstrap-then-render protocol
//!
//! # Typeset Flow
//!
//! ```text
//! Typesetter::typeset()
//!     ↓
//! 1. Locate engine (EngineNotFound, nothing spawned)
//!     ↓
//! 2. Classify cache
//!     → warm: render once
//!     → cold: mtxrun --generate
//!         → still cold: CacheNotPopulated
//!         → now warm: render once
//!     ↓
//! 3. Failed? Collect logs + captured stdout, clean up artifacts
//!     ↓
//! 4. Report elapsed time
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use ctxlab_context::{LogSink, TypesetRequest, Typesetter};
//! use ctxlab_core::config::EngineConfig;
//! use std::sync::Arc;
//!
//! # fn main() -> ctxlab_core::Result<()> {
//! let typesetter = Typesetter::from_config(&EngineConfig::default());
//! let request = TypesetRequest::new("book.xml", "out/book.pdf", "themes", "boschet")?;
//!
//! let outcome = typesetter.typeset(&request, Arc::new(LogSink))?;
//! if !outcome.success() {
//!     for line in outcome.diagnostics.iter().flat_map(|d| &d.lines) {
//!         eprintln!("{}", line);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod command;
pub mod diagnostics;
pub mod elapsed;
pub mod exec;
pub mod info;
pub mod line_cache;
pub mod listener;
pub mod progress;
pub mod request;
pub mod resolve;
pub mod typesetter;

pub use cache::{Warmth, default_cache_dir};
pub use command::{CommandBuilder, display_argv, quote_arg};
pub use diagnostics::{CleanupReport, DiagnosticArtifacts, Diagnostics};
pub use elapsed::format_elapsed;
pub use exec::{Attempt, ExitOutcome, ProcessInvocation, ProcessRunner, SystemRunner};
pub use info::{EngineInfo, EngineSource};
pub use line_cache::BoundedLineCache;
pub use listener::{ProgressListener, ProgressState};
pub use progress::{CollectingSink, LogSink, ProgressEvent, ProgressSink};
pub use request::TypesetRequest;
pub use resolve::{EngineLocator, PathLocator};
pub use typesetter::{TypesetOutcome, TypesetStatus, Typesetter};

pub type Result<T> = ctxlab_core::Result<T>;
