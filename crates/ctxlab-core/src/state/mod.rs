//! Run state persisted in `.ctxlab/state.json`
//!
//! Writers serialize on `state.lock` next to the file. Readers take no lock;
//! writes are atomic renames, so a reader sees either the old or the new
//! file.

use crate::lock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const STATE_LOCK_FILE: &str = "state.lock";
const STATE_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// state.json schema - 破棄可能な実行状態キャッシュ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub schema_version: String,
    pub machine: MachineInfo,
    #[serde(default)]
    pub typeset: Option<TypesetState>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MachineInfo {
    pub os: String,
    pub arch: String,
}

impl MachineInfo {
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesetState {
    pub last: Option<LastTypeset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastTypeset {
    pub input: PathBuf,
    pub output: PathBuf,
    pub success: bool,
    /// Number of engine invocations (1 with a warm cache, 2 after a bootstrap)
    pub attempts: u8,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub error: Option<String>,
}

impl State {
    /// 空の State を作成
    pub fn empty() -> Self {
        Self {
            schema_version: "1.0".to_string(),
            machine: MachineInfo::detect(),
            typeset: None,
        }
    }

    /// state.json を読み込む
    pub fn load(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::error::CtxlabError::StateReadError(format!("Failed to read: {}", e))
        })?;

        let state: Self = serde_json::from_str(&content).map_err(|e| {
            crate::error::CtxlabError::StateReadError(format!("Failed to parse: {}", e))
        })?;

        match state.schema_version.as_str() {
            "1.0" => Ok(state),
            version => Err(crate::error::CtxlabError::StateInvalidSchema(
                version.to_string(),
            )),
        }
    }

    /// state.json に書き込む（原子的更新）
    ///
    /// Writes a sibling temporary file, syncs it and persists it over the
    /// target so readers never observe a half-written file.
    pub fn save(&self, path: impl AsRef<Path>) -> crate::error::Result<()> {
        let path = path.as_ref();
        let parent = ensure_parent_dir(path)?;
        let _lock = acquire_state_lock(parent)?;
        self.write_unlocked(path, parent)
    }

    /// Load, modify and save state.json under one lock
    ///
    /// Concurrent updates from several processes are applied one after
    /// another; none is lost. A missing or unreadable file starts empty.
    pub fn update(
        path: impl AsRef<Path>,
        modify: impl FnOnce(&mut State),
    ) -> crate::error::Result<()> {
        let path = path.as_ref();
        let parent = ensure_parent_dir(path)?;
        let _lock = acquire_state_lock(parent)?;

        let mut state = Self::load_or_empty(path);
        modify(&mut state);
        state.write_unlocked(path, parent)
    }

    fn write_unlocked(&self, path: &Path, parent: &Path) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            crate::error::CtxlabError::StateWriteError(format!("Failed to serialize: {}", e))
        })?;
        atomic_write_json(&content, path, parent)
    }

    /// state.json が存在すれば読み込み、なければ空の State を返す
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|_| Self::empty())
    }

    pub fn record_typeset(&mut self, last: LastTypeset) {
        self.typeset = Some(TypesetState { last: Some(last) });
    }
}

fn acquire_state_lock(parent: &Path) -> crate::error::Result<lock::LockGuard> {
    lock::acquire_lock(
        &parent.join(STATE_LOCK_FILE),
        STATE_LOCK_TIMEOUT,
        "state update",
    )
    .map_err(|e| {
        crate::error::CtxlabError::StateWriteError(format!("Failed to acquire lock: {}", e))
    })
}

/// Ensure parent directory exists and return it
fn ensure_parent_dir(path: &Path) -> crate::error::Result<&Path> {
    let parent = path.parent().ok_or_else(|| {
        crate::error::CtxlabError::StateWriteError(
            "State path has no parent directory".to_string(),
        )
    })?;
    std::fs::create_dir_all(parent).map_err(|e| {
        crate::error::CtxlabError::StateWriteError(format!("Failed to create parent dir: {}", e))
    })?;
    Ok(parent)
}

fn atomic_write_json(content: &str, path: &Path, parent: &Path) -> crate::error::Result<()> {
    use std::io::Write;
    use tempfile::NamedTempFile;

    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| {
        crate::error::CtxlabError::StateWriteError(format!("Failed to create temp file: {}", e))
    })?;

    temp_file.write_all(content.as_bytes()).map_err(|e| {
        crate::error::CtxlabError::StateWriteError(format!("Failed to write temp file: {}", e))
    })?;

    temp_file.as_file().sync_all().map_err(|e| {
        crate::error::CtxlabError::StateWriteError(format!("Failed to sync temp file: {}", e))
    })?;

    temp_file.persist(path).map_err(|e| {
        crate::error::CtxlabError::StateWriteError(format!("Failed to persist: {}", e.error))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxlab_testkit::temp_dir_in_workspace;

    fn sample_last(success: bool) -> LastTypeset {
        let now = Utc::now();
        LastTypeset {
            input: PathBuf::from("/tmp/ctxlab-doc.xml"),
            output: PathBuf::from("/home/writer/book.pdf"),
            success,
            attempts: 2,
            started_at: now,
            finished_at: now,
            duration_ms: 1500,
            error: (!success).then(|| "exit code 1".to_string()),
        }
    }

    #[test]
    fn test_empty_state() {
        let state = State::empty();
        assert_eq!(state.schema_version, "1.0");
        assert!(state.typeset.is_none());
        assert_eq!(state.machine, MachineInfo::detect());
    }

    #[test]
    fn test_save_and_load() {
        let temp = temp_dir_in_workspace();
        let path = temp.path().join(".ctxlab").join("state.json");

        let mut state = State::empty();
        state.record_typeset(sample_last(false));
        state.save(&path).unwrap();

        let loaded = State::load(&path).unwrap();
        let last = loaded.typeset.unwrap().last.unwrap();
        assert!(!last.success);
        assert_eq!(last.attempts, 2);
        assert_eq!(last.error.as_deref(), Some("exit code 1"));
        assert_eq!(last.output, PathBuf::from("/home/writer/book.pdf"));
    }

    #[test]
    fn test_save_overwrites() {
        let temp = temp_dir_in_workspace();
        let path = temp.path().join("state.json");

        let mut state = State::empty();
        state.record_typeset(sample_last(false));
        state.save(&path).unwrap();
        state.record_typeset(sample_last(true));
        state.save(&path).unwrap();

        let last = State::load(&path).unwrap().typeset.unwrap().last.unwrap();
        assert!(last.success);
        assert!(last.error.is_none());
    }

    #[test]
    fn test_load_rejects_unknown_schema() {
        let temp = temp_dir_in_workspace();
        let path = temp.path().join("state.json");
        std::fs::write(
            &path,
            r#"{"schema_version":"9.9","machine":{"os":"linux","arch":"x86_64"}}"#,
        )
        .unwrap();

        assert!(matches!(
            State::load(&path),
            Err(crate::error::CtxlabError::StateInvalidSchema(v)) if v == "9.9"
        ));
    }

    #[test]
    fn test_load_or_empty_on_garbage() {
        let temp = temp_dir_in_workspace();
        let path = temp.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let state = State::load_or_empty(&path);
        assert!(state.typeset.is_none());
    }

    #[test]
    fn test_load_or_empty_when_missing() {
        let temp = temp_dir_in_workspace();
        let state = State::load_or_empty(temp.path().join("missing.json"));
        assert_eq!(state.schema_version, "1.0");
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let temp = temp_dir_in_workspace();
        let path = temp.path().join(".ctxlab").join("state.json");

        let mut state = State::empty();
        let mut last = sample_last(true);
        last.attempts = 0;
        state.record_typeset(last);
        state.save(&path).unwrap();

        let writers: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || {
                    State::update(&path, |state| {
                        if let Some(last) = state.typeset.as_mut().and_then(|t| t.last.as_mut()) {
                            last.attempts += 1;
                        }
                    })
                    .unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let last = State::load(&path).unwrap().typeset.unwrap().last.unwrap();
        assert_eq!(last.attempts, 8);
        assert!(temp.path().join(".ctxlab").join(STATE_LOCK_FILE).exists());
    }

    #[test]
    fn test_update_starts_from_empty() {
        let temp = temp_dir_in_workspace();
        let path = temp.path().join("state.json");

        State::update(&path, |state| state.record_typeset(sample_last(false))).unwrap();

        let last = State::load(&path).unwrap().typeset.unwrap().last.unwrap();
        assert!(!last.success);
    }
}
