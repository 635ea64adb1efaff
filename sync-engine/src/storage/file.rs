//! Directory-backed store: one `<key>.json` file per key.
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-write leaves the previous value intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::DurableStore;
use crate::core::error::{Result, SyncError};

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    /// Serializes writers so two saves of one key cannot interleave renames
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SyncError::Validation(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        let _guard = self.write_lock.lock();
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (FileStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("sync-engine-store-{}", uuid::Uuid::new_v4()));
        (FileStore::open(&dir).unwrap(), dir)
    }

    #[test]
    fn test_set_get_remove() {
        let (store, dir) = temp_store();

        assert_eq!(store.get("transactions").unwrap(), None);
        store.set("transactions", "[]").unwrap();
        assert_eq!(store.get("transactions").unwrap().as_deref(), Some("[]"));

        store.set("transactions", "[1]").unwrap();
        assert_eq!(store.get("transactions").unwrap().as_deref(), Some("[1]"));

        store.remove("transactions").unwrap();
        assert_eq!(store.get("transactions").unwrap(), None);
        // Removing twice is fine
        store.remove("transactions").unwrap();

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_values_survive_reopen() {
        let (store, dir) = temp_store();
        store.set("flags", r#"{"promo":1}"#).unwrap();
        drop(store);

        let reopened = FileStore::open(&dir).unwrap();
        assert_eq!(reopened.get("flags").unwrap().as_deref(), Some(r#"{"promo":1}"#));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (store, dir) = temp_store();
        assert!(matches!(store.get("../etc/passwd"), Err(SyncError::Validation(_))));
        assert!(store.set("", "x").is_err());
        let _ = fs::remove_dir_all(dir);
    }
}
