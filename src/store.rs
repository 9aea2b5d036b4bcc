// Single-slot token cache. Reads never fail: anything unreadable is treated
// as "no cached token".

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub trait TokenStore {
    /// The persisted token, or `None` when absent or unreadable.
    fn load(&self) -> Option<String>;

    /// Replace the persisted token.
    fn save(&self, token: &str) -> io::Result<()>;
}

#[derive(Serialize, Deserialize)]
struct CachedToken {
    token: Option<String>,
}

/// Token cache backed by a `{"token": "..."}` JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "no token cache");
                return None;
            }
        };
        match serde_json::from_str::<CachedToken>(&data) {
            Ok(cached) => cached.token,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "ignoring corrupt token cache");
                None
            }
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let body = serde_json::to_vec(&CachedToken {
            token: Some(token.to_string()),
        })?;
        fs::write(&self.path, body)
    }
}

/// In-memory token slot. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::default();
        *store.slot.borrow_mut() = Some(token.into());
        store
    }

    /// What is currently stored.
    pub fn current(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.current()
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.slot.borrow_mut() = Some(token.to_string());
        Ok(())
    }
}
