use colored::Colorize;
use ctxlab_context::{ProgressEvent, ProgressSink};
use std::io::{self, Write};

pub fn print_json(s: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")
}

/// Writes progress to stderr as the engine reports it
///
/// Status strings are shown only with `--verbose`; the command prints its
/// own summary at the end.
pub struct ConsoleSink {
    verbose: bool,
}

impl ConsoleSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressSink for ConsoleSink {
    fn progress(&self, event: ProgressEvent) {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{} Typesetting {}", "→".cyan(), event);
    }

    fn status(&self, message: &str) {
        if self.verbose {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{}", message.dimmed());
        }
    }
}
