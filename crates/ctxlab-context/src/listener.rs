//! Engine stdout scraping
//!
//! ConTeXt reports every page it ships out:
//!
//! ```text
//! pages           > flushing realpage 15, userpage 15, subpage 15
//! pages           > flushing realpage 16, userpage 16, subpage 16
//! pages           > flushing realpage 1, userpage 1, subpage 1
//! ```
//!
//! The first number on such a line is the current page. A page number lower
//! than the previous one means the engine started another pass, and the
//! previous number is the best estimate of the document's length.
//!
//! One listener thread owns the stream for the lifetime of an invocation and
//! ends at end-of-stream. There is no cancellation: if the engine hangs
//! without closing stdout, the thread blocks until the process is killed.
//! The report is shared with the caller, who can take whatever was read so
//! far when it stops waiting.

use crate::line_cache::BoundedLineCache;
use crate::progress::{ProgressEvent, ProgressSink};
use ctxlab_core::config::consts::capture::PAGINATION_MARKER;
use std::io::{BufRead, BufReader, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    /// Page number from the most recent pagination line
    pub page_count: u32,
    /// Rendering passes seen so far, starting at 1
    pub pass_count: u32,
    /// Last page of the previous pass
    pub page_total: Option<u32>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            page_count: 1,
            pass_count: 1,
            page_total: None,
        }
    }
}

impl ProgressState {
    /// Update from one output line
    ///
    /// Returns the notification to emit when `line` is a pagination line.
    pub fn observe(&mut self, line: &str) -> Option<ProgressEvent> {
        if !line.starts_with(PAGINATION_MARKER) {
            return None;
        }

        let Some(page) = first_number(line) else {
            log::warn!("pagination line without a page number: {}", line);
            return None;
        };

        if page < self.page_count {
            self.pass_count += 1;
            self.page_total = Some(self.page_count);
        }
        self.page_count = page;

        Some(ProgressEvent {
            page: self.page_count,
            total: self.page_total,
            pass: self.pass_count,
        })
    }
}

/// First maximal run of ASCII digits in `line`
///
/// `None` when there are no digits or the number does not fit in a `u32`.
pub fn first_number(line: &str) -> Option<u32> {
    let start = line.find(|c: char| c.is_ascii_digit())?;
    let digits = &line[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// What a listener saw by the time the stream closed
#[derive(Debug, Clone)]
pub struct ListenerReport {
    pub state: ProgressState,
    pub lines: BoundedLineCache,
}

impl ListenerReport {
    pub fn empty(capacity: usize) -> Self {
        Self {
            state: ProgressState::default(),
            lines: BoundedLineCache::new(capacity),
        }
    }
}

/// Read `reader` to end-of-stream, notifying `sink` for every pagination line
pub fn listen<R: BufRead>(
    reader: R,
    sink: &dyn ProgressSink,
    capacity: usize,
) -> ListenerReport {
    let shared = Mutex::new(ListenerReport::empty(capacity));
    listen_into(reader, sink, &shared);
    shared.into_inner().unwrap_or_else(PoisonError::into_inner)
}

/// Like [`listen`], updating `shared` after every line
///
/// Another thread may snapshot `shared` at any time and sees every line read
/// so far.
pub fn listen_into<R: BufRead>(
    mut reader: R,
    sink: &dyn ProgressSink,
    shared: &Mutex<ListenerReport>,
) {
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::warn!("stopped reading engine output: {}", e);
                break;
            }
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);

        let event = {
            let mut report = lock(shared);
            report.lines.insert(line);
            report.state.observe(line)
        };
        if let Some(event) = event {
            sink.progress(event);
        }
    }
}

fn lock(shared: &Mutex<ListenerReport>) -> MutexGuard<'_, ListenerReport> {
    // Sinks run outside the lock, so a poisoned report is still whole.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A listener running on its own thread
pub struct ProgressListener {
    shared: Arc<Mutex<ListenerReport>>,
    done: mpsc::Receiver<()>,
    thread: JoinHandle<()>,
}

impl ProgressListener {
    /// Start draining `stream` on a dedicated thread
    pub fn spawn<R>(stream: R, sink: Arc<dyn ProgressSink>, capacity: usize) -> std::io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let shared = Arc::new(Mutex::new(ListenerReport::empty(capacity)));
        let (tx, rx) = mpsc::channel();
        let thread = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("ctxlab-progress".to_string())
                .spawn(move || {
                    listen_into(BufReader::new(stream), sink.as_ref(), &shared);
                    // The receiver is gone only if the caller stopped waiting.
                    let _ = tx.send(());
                })?
        };

        Ok(Self {
            shared,
            done: rx,
            thread,
        })
    }

    /// What the listener has seen so far
    pub fn snapshot(&self) -> ListenerReport {
        lock(&self.shared).clone()
    }

    /// Wait up to `grace` for the stream to close and collect the report
    ///
    /// If the stream is still open after `grace` (some other process
    /// inherited the engine's stdout) the report holds every line read until
    /// then, and the thread is left to finish on its own.
    pub fn finish(self, grace: Duration) -> ListenerReport {
        match self.done.recv_timeout(grace) {
            Ok(()) => {
                let _ = self.thread.join();
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "engine output still open {}ms after exit; continuing with what was read",
                    grace.as_millis()
                );
            }
            Err(RecvTimeoutError::Disconnected) => {
                if self.thread.join().is_err() {
                    log::warn!("progress listener panicked");
                }
            }
        }
        lock(&self.shared).clone()
    }
}
