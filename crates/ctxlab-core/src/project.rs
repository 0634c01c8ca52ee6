//! Project discovery
//!
//! A project is any directory containing `ctxlab.toml`. Running outside a
//! project is allowed; callers then fall back to [`Config::default`].

use crate::config::Config;
use crate::config::consts::project::{CONFIG_FILE, STATE_DIR, STATE_FILE};
use crate::error::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    config: Config,
}

impl Project {
    /// Load the project rooted at `root`
    pub fn load(root: PathBuf) -> Result<Self> {
        let config = Config::from_file(root.join(CONFIG_FILE))?;
        Ok(Self { root, config })
    }

    /// Walk from `start` towards the filesystem root looking for `ctxlab.toml`
    pub fn find_root(start: &Path) -> Result<Option<Self>> {
        for dir in start.ancestors() {
            if dir.join(CONFIG_FILE).is_file() {
                return Self::load(dir.to_path_buf()).map(Some);
            }
        }
        Ok(None)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Themes directory, resolved against the project root when relative
    pub fn themes_dir(&self) -> PathBuf {
        self.root.join(&self.config.typeset.themes_dir)
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(STATE_DIR).join(STATE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxlab_testkit::temp_dir_in_workspace;

    #[test]
    fn test_find_root_in_current_dir() {
        let temp = temp_dir_in_workspace();
        let root = temp.path();
        std::fs::write(root.join("ctxlab.toml"), "[typeset]\ntheme = \"tarmes\"\n").unwrap();

        let project = Project::find_root(root).unwrap().unwrap();
        assert_eq!(project.root, root);
        assert_eq!(project.config().typeset.theme, "tarmes");
    }

    #[test]
    fn test_find_root_from_subdirectory() {
        let temp = temp_dir_in_workspace();
        let root = temp.path();
        std::fs::write(root.join("ctxlab.toml"), "").unwrap();
        let nested = root.join("chapters").join("one");
        std::fs::create_dir_all(&nested).unwrap();

        let project = Project::find_root(&nested).unwrap().unwrap();
        assert_eq!(project.root, root);
    }

    #[test]
    fn test_find_root_none_without_config() {
        let temp = tempfile::TempDir::new().unwrap();
        // A bare temp dir outside the workspace has no ctxlab.toml above it
        // unless the machine has one at the filesystem root.
        let found = Project::find_root(temp.path()).unwrap();
        if let Some(project) = found {
            assert_ne!(project.root, temp.path());
        }
    }

    #[test]
    fn test_find_root_propagates_invalid_config() {
        let temp = temp_dir_in_workspace();
        std::fs::write(temp.path().join("ctxlab.toml"), "[typeset\n").unwrap();

        assert!(Project::find_root(temp.path()).is_err());
    }

    #[test]
    fn test_themes_dir_relative_and_absolute() {
        let temp = temp_dir_in_workspace();
        let root = temp.path();
        std::fs::write(root.join("ctxlab.toml"), "").unwrap();
        let project = Project::load(root.to_path_buf()).unwrap();
        assert_eq!(project.themes_dir(), root.join("themes"));

        std::fs::write(
            root.join("ctxlab.toml"),
            "[typeset]\nthemes_dir = \"/usr/share/ctxlab/themes\"\n",
        )
        .unwrap();
        let project = Project::load(root.to_path_buf()).unwrap();
        assert_eq!(
            project.themes_dir(),
            PathBuf::from("/usr/share/ctxlab/themes")
        );
    }

    #[test]
    fn test_state_path() {
        let temp = temp_dir_in_workspace();
        std::fs::write(temp.path().join("ctxlab.toml"), "").unwrap();
        let project = Project::load(temp.path().to_path_buf()).unwrap();
        assert_eq!(
            project.state_path(),
            temp.path().join(".ctxlab").join("state.json")
        );
    }
}
