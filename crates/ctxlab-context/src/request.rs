//! Typeset requests
//!
//! A request fixes the input, output and theme of one run. Relative paths are
//! resolved against the current directory when the request is built, because
//! the engine runs in the output's directory.

use ctxlab_core::config::TypesetConfig;
use ctxlab_core::{CtxlabError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Everything needed to typeset one document
///
/// Immutable once built; the orchestrator derives each attempt's command line
/// from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypesetRequest {
    input: PathBuf,
    output: PathBuf,
    working_dir: PathBuf,
    themes_dir: PathBuf,
    theme: String,
    autoclean: bool,
}

impl TypesetRequest {
    /// Create a request writing `output` from `input`
    ///
    /// The engine can only write its result relative to its working
    /// directory, so the working directory is the output's parent. Relative
    /// `input`, `output` and `themes_dir` are made absolute against the
    /// current directory first.
    ///
    /// # Errors
    ///
    /// Returns `RequestInvalid` if `input` or `output` has no file name, or
    /// a relative path cannot be resolved.
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        themes_dir: impl Into<PathBuf>,
        theme: impl Into<String>,
    ) -> Result<Self> {
        let input = input.into();
        let output = output.into();

        if output.file_name().is_none() {
            return Err(CtxlabError::RequestInvalid(format!(
                "output path '{}' has no file name",
                output.display()
            )));
        }
        if input.file_name().is_none() {
            return Err(CtxlabError::RequestInvalid(format!(
                "input path '{}' has no file name",
                input.display()
            )));
        }

        let input = absolute(input)?;
        let output = absolute(output)?;
        let working_dir = output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(default_directory);

        Ok(Self {
            input,
            output,
            working_dir,
            themes_dir: absolute(themes_dir.into())?,
            theme: theme.into(),
            autoclean: true,
        })
    }

    /// Create a request using the theme and cleanup settings of `config`
    ///
    /// `themes_dir` is passed separately because it is usually resolved
    /// against a project root first.
    pub fn from_config(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        themes_dir: impl Into<PathBuf>,
        config: &TypesetConfig,
    ) -> Result<Self> {
        Ok(Self::new(input, output, themes_dir, config.theme.clone())?
            .with_autoclean(config.autoclean))
    }

    pub fn with_autoclean(mut self, autoclean: bool) -> Self {
        self.autoclean = autoclean;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Output file name without directories, as passed to `--result`
    pub fn output_file_name(&self) -> &OsStr {
        // Checked non-empty in `new`.
        self.output.file_name().unwrap_or_default()
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn themes_dir(&self) -> &Path {
        &self.themes_dir
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Directory of the selected theme
    pub fn theme_dir(&self) -> PathBuf {
        self.themes_dir.join(&self.theme)
    }

    pub fn autoclean(&self) -> bool {
        self.autoclean
    }
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.as_os_str().is_empty() || path.is_absolute() {
        return Ok(path);
    }
    std::path::absolute(&path).map_err(|e| {
        CtxlabError::RequestInvalid(format!("cannot resolve '{}': {}", path.display(), e))
    })
}

fn default_directory() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_dir_is_output_parent() {
        let request =
            TypesetRequest::new("/tmp/doc.xml", "/home/writer/out/book.pdf", "/themes", "boschet")
                .unwrap();
        assert_eq!(request.working_dir(), Path::new("/home/writer/out"));
        assert_eq!(request.output_file_name(), "book.pdf");
        assert!(request.autoclean());
    }

    #[test]
    fn test_bare_output_uses_current_dir() {
        let request = TypesetRequest::new("doc.xml", "book.pdf", "themes", "boschet").unwrap();
        assert_eq!(request.working_dir(), std::env::current_dir().unwrap());
    }

    #[test]
    fn test_relative_paths_resolved_against_current_dir() {
        let cwd = std::env::current_dir().unwrap();
        let request =
            TypesetRequest::new("src/doc.xml", "out/book.pdf", "themes", "boschet").unwrap();
        assert_eq!(request.input(), cwd.join("src/doc.xml"));
        assert_eq!(request.output(), cwd.join("out/book.pdf"));
        assert_eq!(request.working_dir(), cwd.join("out"));
        assert_eq!(request.themes_dir(), cwd.join("themes"));
        assert!(request.theme_dir().is_absolute());
    }

    #[test]
    fn test_output_without_file_name_rejected() {
        let result = TypesetRequest::new("doc.xml", "/", "themes", "boschet");
        assert!(matches!(result, Err(CtxlabError::RequestInvalid(_))));
    }

    #[test]
    fn test_input_without_file_name_rejected() {
        let result = TypesetRequest::new("..", "book.pdf", "themes", "boschet");
        assert!(matches!(result, Err(CtxlabError::RequestInvalid(_))));
    }

    #[test]
    fn test_theme_dir() {
        let request =
            TypesetRequest::new("doc.xml", "book.pdf", "/usr/share/themes", "tarmes").unwrap();
        assert_eq!(request.theme_dir(), PathBuf::from("/usr/share/themes/tarmes"));
    }

    #[test]
    fn test_from_config() {
        let config = TypesetConfig {
            themes_dir: PathBuf::from("ignored"),
            theme: "handrit".to_string(),
            autoclean: false,
        };
        let request =
            TypesetRequest::from_config("doc.xml", "out/book.pdf", "/srv/themes", &config).unwrap();
        assert_eq!(request.theme(), "handrit");
        assert_eq!(request.themes_dir(), Path::new("/srv/themes"));
        assert!(!request.autoclean());
    }
}
