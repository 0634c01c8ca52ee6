//! Progress notifications
//!
//! Sinks are called from the listener thread, so any hand-off to a
//! presentation layer is the sink's responsibility.

use std::fmt;
use std::sync::Mutex;

/// One pagination update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub page: u32,
    /// Page count of the previous pass, unknown during the first pass
    pub total: Option<u32>,
    pub pass: u32,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total {
            Some(total) => write!(f, "page {} of {} (pass {})", self.page, total, self.pass),
            None => write!(f, "page {} of ? (pass {})", self.page, self.pass),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    /// Called once per pagination line, in output order
    fn progress(&self, event: ProgressEvent);

    /// Free-form, human-readable status text
    fn status(&self, message: &str);
}

/// Forwards everything to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn progress(&self, event: ProgressEvent) {
        log::info!("typesetting {}", event);
    }

    fn status(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Keeps every notification for later inspection
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
    statuses: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProgressSink for CollectingSink {
    fn progress(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    fn status(&self, message: &str) {
        self.statuses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
    }
}
