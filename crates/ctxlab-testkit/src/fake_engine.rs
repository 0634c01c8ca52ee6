//! Scripted stand-in for the `mtxrun` launcher
//!
//! Integration tests cannot rely on a ConTeXt installation, so they install a
//! small POSIX shell script that behaves like one: `--generate` populates
//! `$TEXMFCACHE`, a full run prints pagination lines and either writes the
//! requested PDF or leaves the usual failure artifacts behind. Every
//! invocation appends its arguments to `calls.log` next to the script.

use std::path::{Path, PathBuf};

/// What the script does when called with the full argument set
#[derive(Debug, Clone)]
pub struct RenderBehavior {
    pub stdout: Vec<String>,
    pub exit_code: i32,
    /// On failure, write `<stem>.log`, `<stem>-error.log`, `<stem>.tua` and a
    /// partial `<stem>.pdf` into the working directory
    pub leave_artifacts: bool,
    /// Write a large amount of text to stderr before exiting
    pub flood_stderr: bool,
}

impl RenderBehavior {
    pub fn success(stdout: Vec<String>) -> Self {
        Self {
            stdout,
            exit_code: 0,
            leave_artifacts: false,
            flood_stderr: false,
        }
    }

    pub fn failure(stdout: Vec<String>, exit_code: i32) -> Self {
        Self {
            stdout,
            exit_code,
            leave_artifacts: true,
            flood_stderr: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeEngine {
    pub path: PathBuf,
    dir: PathBuf,
}

impl FakeEngine {
    /// Install a fake engine named `mtxrun` in `dir`
    ///
    /// `populate_cache` controls whether `--generate` leaves files in
    /// `$TEXMFCACHE`; `bootstrap_exit` is its exit code.
    pub fn install(
        dir: &Path,
        populate_cache: bool,
        bootstrap_exit: i32,
        render: &RenderBehavior,
    ) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("mtxrun");
        std::fs::write(&path, script(populate_cache, bootstrap_exit, render))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(Self {
            path,
            dir: dir.to_path_buf(),
        })
    }

    /// Arguments of every invocation so far, one space-joined entry per call
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.join("calls.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

fn script(populate_cache: bool, bootstrap_exit: i32, render: &RenderBehavior) -> String {
    let mut s = String::from("#!/bin/sh\n");
    s.push_str("here=$(cd \"$(dirname \"$0\")\" && pwd)\n");
    s.push_str("printf '%s\\n' \"$*\" >> \"$here/calls.log\"\n");

    s.push_str("if [ \"$1\" = \"--generate\" ]; then\n");
    s.push_str("  echo 'mtxrun          | generating formats'\n");
    if populate_cache {
        s.push_str("  mkdir -p \"$TEXMFCACHE/luametatex-cache/context\"\n");
        s.push_str("  printf 'formats\\n' > \"$TEXMFCACHE/luametatex-cache/context/formats.lua\"\n");
    }
    s.push_str(&format!("  exit {bootstrap_exit}\nfi\n"));

    s.push_str("result=''\ninput=''\nfor arg in \"$@\"; do\n");
    s.push_str("  case \"$arg\" in\n");
    s.push_str("    --result=*) result=$(printf '%s' \"${arg#--result=}\" | tr -d \"'\") ;;\n");
    s.push_str("  esac\n  input=\"$arg\"\ndone\n");

    if !render.stdout.is_empty() {
        s.push_str("cat <<'CTXLAB_EOF'\n");
        for line in &render.stdout {
            s.push_str(line);
            s.push('\n');
        }
        s.push_str("CTXLAB_EOF\n");
    }

    if render.flood_stderr {
        s.push_str("i=0\nwhile [ $i -lt 4000 ]; do\n");
        s.push_str("  echo 'luatex warning: this stderr line only exists to fill the pipe buffer' >&2\n");
        s.push_str("  i=$((i+1))\ndone\n");
    }

    if render.exit_code == 0 {
        s.push_str("printf '%%PDF-1.5\\n' > \"$result\"\n");
    } else if render.leave_artifacts {
        s.push_str("stem=$(basename \"$input\")\nstem=\"${stem%.*}\"\n");
        s.push_str("printf '%s\\n' '! Undefined control sequence\\nl.12 \\relax' > \"$stem.log\"\n");
        s.push_str("printf '%s\\n' 'error: emergency stop' > \"$stem-error.log\"\n");
        s.push_str(": > \"$stem.tua\"\n");
        s.push_str("printf '%%PDF-1.5 partial\\n' > \"$stem.pdf\"\n");
    }

    s.push_str(&format!("exit {}\n", render.exit_code));
    s
}
