//! Where a session survives between runs.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::types::User;

/// Fixed storage key of the session blob.
pub const STORAGE_KEY: &str = "iris_auth";

/// The persisted session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredAuth {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

pub trait SessionStore: Send + Sync + Debug {
    /// The stored session, if any. An unreadable blob counts as none.
    fn load(&self) -> Result<Option<StoredAuth>>;
    fn save(&self, auth: &StoredAuth) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// In-process store. Lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<StoredAuth>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(auth: StoredAuth) -> Self {
        Self {
            slot: Mutex::new(Some(auth)),
        }
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<StoredAuth>> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, auth: &StoredAuth) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(auth.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON file `iris_auth.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

/// Default Iris data directory (`~/.iris`).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".iris")
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in [`data_dir`].
    pub fn in_data_dir() -> Self {
        Self::new(data_dir())
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{STORAGE_KEY}.json"))
    }

    fn tmp_path(&self) -> PathBuf {
        self.dir.join(format!(".{STORAGE_KEY}.json.tmp"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<Option<StoredAuth>> {
        let path = self.path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(auth) => Ok(Some(auth)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    /// Atomic write: temp file, then rename over the old blob.
    fn save(&self, auth: &StoredAuth) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(auth)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.path())?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
