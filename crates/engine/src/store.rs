//! Persistence of the [`AppState`] record.
//!
//! The engine only needs "load the record" and "replace the record"; the
//! [`StateStore`] trait is that seam. [`JsonFileStore`] is what the app uses,
//! [`MemoryStore`] backs tests and ephemeral runs.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use crate::{AppState, ResultEngine};

pub trait StateStore: Send + Sync + fmt::Debug {
    /// Returns `None` when nothing has been stored yet.
    fn load(&self) -> ResultEngine<Option<AppState>>;

    /// Replaces the stored record.
    fn save(&self, state: &AppState) -> ResultEngine<()>;
}

/// Stores the record as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> ResultEngine<Option<AppState>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, state: &AppState) -> ResultEngine<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(state)?;
        // Write then rename: a crash mid-write must not truncate the record.
        let tmp = self.tmp_path();
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keeps the record in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Option<AppState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            inner: Mutex::new(Some(state)),
        }
    }

    /// Last saved record.
    pub fn stored(&self) -> Option<AppState> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> ResultEngine<Option<AppState>> {
        Ok(self.stored())
    }

    fn save(&self, state: &AppState) -> ResultEngine<()> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::EngineError;

    fn test_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../target/test_states")
            .join(format!("store_{}", Uuid::new_v4()))
            .join("state.json")
    }

    fn state() -> AppState {
        AppState::new(NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(), Utc::now())
    }

    #[test]
    fn missing_file_loads_none() {
        let store = JsonFileStore::new(test_path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_creates_parent_and_reloads() {
        let path = test_path();
        let store = JsonFileStore::new(&path);
        let state = state();
        store.save(&state).unwrap();
        assert!(path.is_file());
        assert!(!store.tmp_path().exists());
        assert_eq!(store.load().unwrap(), Some(state));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupted_file_is_an_error() {
        let path = test_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(EngineError::Serialization(_))));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn memory_store_keeps_last_save() {
        let store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), None);
        let first = state();
        store.save(&first).unwrap();
        let mut second = first.clone();
        second.last_processed_date = "2025-06-21".to_string();
        store.save(&second).unwrap();
        assert_eq!(store.stored(), Some(second));
    }
}
