//! Command line construction for the engine
//!
//! Two argument sets exist. A cold cache gets `--generate`, which only builds
//! the engine's formats and file databases. A warm cache gets the full batch
//! run:
//!
//! ```text
//! mtxrun --autogenerate --script mtx-context --batchmode --nonstopmode
//!        --purgeall --path='<themes>/<theme>' --environment='main'
//!        --result='<output file name>' <input>
//! ```

use crate::request::TypesetRequest;
use ctxlab_core::config::consts::engine::THEME_ENTRY_POINT;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Builds engine argument vectors; `argv[0]` is the executable
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    executable: PathBuf,
}

impl CommandBuilder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Argument vector for the given cache state
    pub fn build(&self, cache_warm: bool, request: &TypesetRequest) -> Vec<OsString> {
        let mut argv = vec![self.executable.as_os_str().to_os_string()];

        if !cache_warm {
            argv.push("--generate".into());
            return argv;
        }

        argv.extend(
            [
                "--autogenerate",
                "--script",
                "mtx-context",
                "--batchmode",
                "--nonstopmode",
                "--purgeall",
            ]
            .map(OsString::from),
        );
        argv.push(option("--path", request.theme_dir().as_os_str()));
        argv.push(option("--environment", OsStr::new(THEME_ENTRY_POINT)));
        argv.push(option("--result", request.output_file_name()));
        argv.push(request.input().as_os_str().to_os_string());
        argv
    }
}

/// `--name='value'`
fn option(name: &str, value: &OsStr) -> OsString {
    let mut arg = OsString::from(name);
    arg.push("=");
    arg.push(quote_arg(value));
    arg
}

/// Wrap a value in single quotes for the engine's own option parser
///
/// No shell is involved; `mtxrun` strips the quotes itself, which keeps values
/// with spaces intact. A value that already contains a single quote is passed
/// through unescaped, and how the engine reads it is undefined.
pub fn quote_arg(value: &OsStr) -> OsString {
    let mut quoted = OsString::with_capacity(value.len() + 2);
    quoted.push("'");
    quoted.push(value);
    quoted.push("'");
    quoted
}

/// Render an argument vector the way a user would type it
pub fn display_argv(argv: &[OsString]) -> String {
    argv.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
