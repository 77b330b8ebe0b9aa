use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};

use super::KeyValueStore;
use crate::errors::{StoreError, StoreResult};

/// Backend that keeps every key in one JSON object on disk.
///
/// Each mutation rewrites the file through a sibling temp file and a rename,
/// so a crash mid-write leaves the previous contents in place. If the write
/// fails the in-memory copy still holds the new value, but it will not survive
/// a reopen.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Opens `path`, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Map::new(),
            Ok(raw) => match serde_json::from_str::<Value>(&raw)? {
                Value::Object(entries) => entries,
                _ => {
                    return Err(StoreError::unavailable(format!(
                        "{} does not hold a JSON object",
                        path.display()
                    )))
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(StoreError::io(path, err)),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened session file");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Map<String, Value>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }

        let raw = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(|err| StoreError::io(&tmp, err))?;
        fs::rename(&tmp, &self.path).map_err(|err| StoreError::io(&self.path, err))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::unavailable("file store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::unavailable("file store lock poisoned"))?;
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::unavailable("file store lock poisoned"))?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn flush(&self) -> StoreResult<()> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::unavailable("file store lock poisoned"))?;
        self.persist(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set("app-token", json!("abc")).unwrap();
        store.set("app-role", json!(["admin"])).unwrap();
        store.remove("app-role").unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("app-token").unwrap(), Some(json!("abc")));
        assert_eq!(reopened.get("app-role").unwrap(), None);
    }

    #[test]
    fn missing_file_starts_empty_and_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);

        store.flush().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn non_object_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
