//! Engine cache classification
//!
//! The engine keeps formats and file databases in the directory named by
//! `TEXMFCACHE`. A fresh machine has no such directory and the first run must
//! only populate it (`--generate`). Whether that has happened is judged by
//! the directory being non-empty; any stray file therefore counts as warm.

use ctxlab_core::config::consts::engine::CACHE_DIR_NAME;
use ctxlab_core::{CtxlabError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warmth {
    Cold,
    Warm,
}

impl Warmth {
    pub fn is_warm(self) -> bool {
        self == Warmth::Warm
    }
}

/// Cache directory shared by every invocation in this process
///
/// Derived once from the system temp directory and never changes afterwards.
pub fn default_cache_dir() -> &'static Path {
    static CACHE_DIR: OnceLock<PathBuf> = OnceLock::new();
    CACHE_DIR.get_or_init(|| std::env::temp_dir().join(CACHE_DIR_NAME))
}

/// Classify `cache_dir`
///
/// Missing and empty directories are cold. Any other listing failure is an
/// error: it means local state cannot be inspected at all.
pub fn classify(cache_dir: &Path) -> Result<Warmth> {
    let mut entries = match std::fs::read_dir(cache_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Warmth::Cold),
        Err(source) => {
            return Err(CtxlabError::CacheInspectFailed {
                path: cache_dir.to_path_buf(),
                source,
            });
        }
    };

    match entries.next() {
        None => Ok(Warmth::Cold),
        Some(Ok(_)) => Ok(Warmth::Warm),
        Some(Err(source)) => Err(CtxlabError::CacheInspectFailed {
            path: cache_dir.to_path_buf(),
            source,
        }),
    }
}

pub fn is_warm(cache_dir: &Path) -> Result<bool> {
    classify(cache_dir).map(Warmth::is_warm)
}

/// Number of top-level entries, 0 when the directory is missing
pub fn entry_count(cache_dir: &Path) -> Result<usize> {
    match std::fs::read_dir(cache_dir) {
        Ok(entries) => Ok(entries.count()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(source) => Err(CtxlabError::CacheInspectFailed {
            path: cache_dir.to_path_buf(),
            source,
        }),
    }
}

/// Remove the cache so the next run bootstraps again
///
/// Returns `false` if there was nothing to remove.
pub fn clear(cache_dir: &Path) -> Result<bool> {
    match std::fs::remove_dir_all(cache_dir) {
        Ok(()) => {
            log::info!("removed engine cache {}", cache_dir.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CtxlabError::IoError(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxlab_testkit::temp_dir_in_workspace;

    #[test]
    fn test_missing_dir_is_cold() {
        let temp = temp_dir_in_workspace();
        let cache = temp.path().join("luatex-cache");
        assert_eq!(classify(&cache).unwrap(), Warmth::Cold);
        assert!(!is_warm(&cache).unwrap());
    }

    #[test]
    fn test_empty_dir_is_cold() {
        let temp = temp_dir_in_workspace();
        assert_eq!(classify(temp.path()).unwrap(), Warmth::Cold);
    }

    #[test]
    fn test_non_empty_dir_is_warm() {
        let temp = temp_dir_in_workspace();
        std::fs::create_dir(temp.path().join("luametatex-cache")).unwrap();
        assert_eq!(classify(temp.path()).unwrap(), Warmth::Warm);
    }

    #[test]
    fn test_stray_hidden_file_counts_as_warm() {
        let temp = temp_dir_in_workspace();
        std::fs::write(temp.path().join(".DS_Store"), "").unwrap();
        assert!(is_warm(temp.path()).unwrap());
    }

    #[test]
    fn test_file_instead_of_dir_is_error() {
        let temp = temp_dir_in_workspace();
        let file = temp.path().join("luatex-cache");
        std::fs::write(&file, "not a directory").unwrap();

        let err = classify(&file).unwrap_err();
        assert!(matches!(err, CtxlabError::CacheInspectFailed { .. }));
    }

    #[test]
    fn test_default_cache_dir_is_stable() {
        let first = default_cache_dir();
        let second = default_cache_dir();
        assert_eq!(first, second);
        assert!(first.ends_with("luatex-cache"));
        assert!(first.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_entry_count_and_clear() {
        let temp = temp_dir_in_workspace();
        let cache = temp.path().join("cache");
        assert_eq!(entry_count(&cache).unwrap(), 0);
        assert!(!clear(&cache).unwrap());

        std::fs::create_dir_all(cache.join("a")).unwrap();
        std::fs::write(cache.join("b.lua"), "").unwrap();
        assert_eq!(entry_count(&cache).unwrap(), 2);

        assert!(clear(&cache).unwrap());
        assert!(!cache.exists());
        assert_eq!(classify(&cache).unwrap(), Warmth::Cold);
    }
}
