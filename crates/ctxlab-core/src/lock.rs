//! Advisory file locks shared between ctxlab processes
//!
//! Locks are taken with fs2 on a dedicated lock file and released when the
//! guard is dropped.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(10);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(500);
const PROGRESS_MESSAGE_THRESHOLD: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum LockError {
    #[error("timeout waiting for lock on {} ({description})", path.display())]
    Timeout { path: PathBuf, description: String },

    #[error("I/O error during {operation} on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Held lock; dropping it closes the file and releases the lock
#[derive(Debug)]
pub struct LockGuard {
    _file: File,
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Take an exclusive lock on `lock_path`, retrying with backoff until `timeout`
pub fn acquire_lock(
    lock_path: &Path,
    timeout: Duration,
    description: &str,
) -> Result<LockGuard, LockError> {
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent).map_err(io_error(lock_path, "create parent directories"))?;
    }

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(io_error(lock_path, "open lock file"))?;

    let start = Instant::now();
    let mut retry_delay = INITIAL_RETRY_DELAY;
    let mut progress_shown = false;

    loop {
        match file.try_lock_exclusive() {
            Ok(()) => {
                return Ok(LockGuard {
                    _file: file,
                    path: lock_path.to_path_buf(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return Err(LockError::Timeout {
                        path: lock_path.to_path_buf(),
                        description: description.to_string(),
                    });
                }

                if !progress_shown && elapsed >= PROGRESS_MESSAGE_THRESHOLD {
                    log::info!(
                        "waiting for lock on {} ({})",
                        lock_path.display(),
                        description
                    );
                    progress_shown = true;
                }

                thread::sleep(retry_delay);
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            Err(e) => return Err(io_error(lock_path, "acquire lock")(e)),
        }
    }
}

fn io_error(path: &Path, operation: &'static str) -> impl FnOnce(std::io::Error) -> LockError {
    let path = path.to_path_buf();
    move |source| LockError::Io {
        path,
        operation,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxlab_testkit::temp_dir_in_workspace;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_acquire_creates_lock_file() {
        let temp = temp_dir_in_workspace();
        let lock_path = temp.path().join("nested").join("state.lock");

        let guard = acquire_lock(&lock_path, Duration::from_secs(5), "test").unwrap();
        assert_eq!(guard.path(), lock_path);
        assert!(lock_path.exists());
    }

    #[test]
    fn test_held_lock_times_out_second_acquirer() {
        let temp = temp_dir_in_workspace();
        let lock_path = temp.path().join("state.lock");
        let barrier = Arc::new(Barrier::new(2));

        let holder = {
            let lock_path = lock_path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let _guard = acquire_lock(&lock_path, Duration::from_secs(5), "holder").unwrap();
                barrier.wait();
                thread::sleep(Duration::from_millis(400));
            })
        };

        barrier.wait();
        let result = acquire_lock(&lock_path, Duration::from_millis(100), "waiter");
        assert!(matches!(result, Err(LockError::Timeout { .. })));

        holder.join().unwrap();
        assert!(acquire_lock(&lock_path, Duration::from_secs(5), "after").is_ok());
    }
}
