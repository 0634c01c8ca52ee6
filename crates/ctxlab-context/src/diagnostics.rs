//! Failure diagnostics
//!
//! When the engine fails it leaves its logs next to the output. Those are
//! replayed together with the captured stdout, then optionally removed along
//! with the other intermediate files of the run.

use crate::line_cache::BoundedLineCache;
use crate::request::TypesetRequest;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Files the engine may leave behind for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticArtifacts {
    /// `<input-stem>.log`
    pub bad_log: PathBuf,
    /// `<input-stem>-error.log`
    pub error_log: PathBuf,
    /// `<input-stem>.pdf`
    pub partial_pdf: PathBuf,
    /// `<input-stem>.tua`
    pub tua: PathBuf,
    /// `<output-stem>.log`
    pub output_log: PathBuf,
}

impl DiagnosticArtifacts {
    /// Derive the candidate paths in the output's directory
    pub fn derive(request: &TypesetRequest) -> Self {
        let dir = request.working_dir();
        let input_stem = stem(request.input());
        let output_stem = stem(request.output());
        let named = |stem: &str, suffix: &str| dir.join(format!("{stem}{suffix}"));

        Self {
            bad_log: named(&input_stem, ".log"),
            error_log: named(&input_stem, "-error.log"),
            partial_pdf: named(&input_stem, ".pdf"),
            tua: named(&input_stem, ".tua"),
            output_log: named(&output_stem, ".log"),
        }
    }

    /// Every distinct candidate, in the order they are cleaned up
    ///
    /// Input and output with the same stem share one log.
    pub fn all(&self) -> Vec<&Path> {
        distinct([
            &self.bad_log,
            &self.error_log,
            &self.partial_pdf,
            &self.tua,
            &self.output_log,
        ])
    }

    /// Distinct candidates whose content is worth showing
    pub fn logs(&self) -> Vec<&Path> {
        distinct([&self.bad_log, &self.output_log, &self.error_log])
    }

    /// Lines of every existing log, followed by the captured stdout
    ///
    /// Engine logs sometimes hold escaped newlines (a backslash followed by
    /// `n`); those split lines too.
    pub fn collect(&self, captured: &BoundedLineCache) -> Vec<String> {
        let mut lines = Vec::new();

        for path in self.logs() {
            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    log::warn!("could not read {}: {}", path.display(), e);
                    continue;
                }
            };

            let text = String::from_utf8_lossy(&bytes);
            lines.extend(
                text.lines()
                    .flat_map(|line| line.split("\\n"))
                    .map(str::to_string),
            );
        }

        lines.extend(captured.iter().map(str::to_string));
        lines
    }

    /// Remove every candidate that exists
    ///
    /// Failures are logged and reported, never returned as errors.
    pub fn cleanup(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        for path in self.all() {
            report.attempted.push(path.to_path_buf());
            match std::fs::remove_file(path) {
                Ok(()) => report.removed.push(path.to_path_buf()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    log::warn!("could not remove {}: {}", path.display(), e);
                    report.failed.push((path.to_path_buf(), e.to_string()));
                }
            }
        }

        report
    }
}

fn distinct<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Vec<&'a Path> {
    let mut seen: Vec<&Path> = Vec::new();
    for path in paths {
        if !seen.contains(&path.as_path()) {
            seen.push(path);
        }
    }
    seen
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub attempted: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    /// Path and reason
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Everything gathered after a failed run
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub lines: Vec<String>,
    /// `None` when artifacts were kept
    pub cleanup: Option<CleanupReport>,
}
