//! Test utilities for ctxlab
//!
//! This crate provides shared testing utilities used across the ctxlab workspace.

pub mod fake_engine;

pub use fake_engine::{FakeEngine, RenderBehavior};

use tempfile::TempDir;

/// Creates a temporary directory within `.tmp/` at the crate root
///
/// All test temporary files end up in a single gitignored location that is
/// easy to clean up manually if a test aborts.
///
/// # Panics
///
/// Panics if:
/// - Unable to determine current directory
/// - Unable to create `.tmp/` directory
/// - Unable to create temporary subdirectory
///
/// # Examples
///
/// ```rust
/// use ctxlab_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let file_path = temp.path().join("test.txt");
/// std::fs::write(&file_path, "test data").unwrap();
/// // Cleanup happens automatically when temp is dropped
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}

/// Engine output lines for a single pass over `pages` pages
///
/// Mirrors what ConTeXt prints while shipping out pages.
pub fn pagination_lines(pages: u32) -> Vec<String> {
    (1..=pages)
        .map(|n| {
            format!(
                "pages           > flushing realpage {n}, userpage {n}, subpage {n}"
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_in_workspace_creates_in_tmp() {
        let temp = temp_dir_in_workspace();
        let path = temp.path();

        assert!(
            path.to_string_lossy().contains(".tmp"),
            "Path should contain .tmp, got: {}",
            path.display()
        );
        assert!(path.is_dir(), "Path should be a directory");
    }

    #[test]
    fn test_temp_dir_auto_cleanup() {
        let path = {
            let temp = temp_dir_in_workspace();
            temp.path().to_path_buf()
        };

        assert!(
            !path.exists(),
            "Directory should not exist after drop: {}",
            path.display()
        );
    }

    #[test]
    fn test_multiple_temp_dirs_unique() {
        let temp1 = temp_dir_in_workspace();
        let temp2 = temp_dir_in_workspace();
        assert_ne!(temp1.path(), temp2.path());
    }

    #[test]
    fn test_pagination_lines() {
        let lines = pagination_lines(3);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("pages"));
        assert!(lines[2].contains("realpage 3"));
    }
}
