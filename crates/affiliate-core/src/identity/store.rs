//! The single session slot.
//!
//! Holds one serialized [`User`] under a fixed key. No schema versioning: a
//! slot that no longer parses is reported as an error and the caller decides
//! whether to treat it as signed out.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::User;
use crate::error::{Error, Result};

/// Storage for the signed-in user.
pub trait SessionStore: Send {
    /// Read the slot. `Ok(None)` when nothing is stored.
    fn load(&self) -> Result<Option<User>>;

    /// Overwrite the slot.
    fn save(&mut self, user: &User) -> Result<()>;

    /// Empty the slot. Clearing an empty slot is not an error.
    fn clear(&mut self) -> Result<()>;
}

/// Session slot kept as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<User>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let user = serde_json::from_str(&content).map_err(|e| {
            Error::Session(format!("Failed to parse {}: {e}", self.path.display()))
        })?;
        Ok(Some(user))
    }

    fn save(&mut self, user: &User) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(user)?)?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process slot. Clones share the same slot, which lets a test "reload"
/// by building a second provider over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySessionStore {
    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put raw bytes in the slot, bypassing serialization.
    pub fn put_raw(&self, raw: impl Into<String>) {
        *self.slot() = Some(raw.into());
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<User>> {
        self.slot()
            .as_deref()
            .map(serde_json::from_str::<User>)
            .transpose()
            .map_err(Error::from)
    }

    fn save(&mut self, user: &User) -> Result<()> {
        let raw = serde_json::to_string(user)?;
        *self.slot() = Some(raw);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identity::IdentityProvider;
    use crate::seed;

    fn john() -> User {
        seed::users().remove(1)
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().unwrap().is_none());
        store.save(&john()).unwrap();
        assert_eq!(store.load().unwrap(), Some(john()));
    }

    #[test]
    fn file_store_clear_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&john()).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_is_a_session_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileSessionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::Session(_)));
    }

    #[test]
    fn provider_treats_corrupt_slot_as_signed_out() {
        let store = MemorySessionStore::default();
        store.put_raw("{\"id\":");
        let mut idp = IdentityProvider::new(Box::new(store));
        assert!(idp.restore().is_none());
    }
}
