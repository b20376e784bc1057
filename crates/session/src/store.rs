use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use tracing::{debug, warn};

use crate::model::TokenPair;

/// Holder of the current session credentials.
///
/// Implementations must swap the whole pair at once so that `get` never
/// observes a mix of two different pairs.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<TokenPair>;
    fn set(&self, pair: TokenPair);
    fn clear(&self);
}

#[derive(Default)]
pub struct MemoryTokenStore {
    current: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(pair: TokenPair) -> Self {
        Self {
            current: RwLock::new(Some(pair)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<TokenPair> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, pair: TokenPair) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(pair);
    }

    fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Memory store mirrored to a JSON file so a session survives restarts.
///
/// Disk errors are logged and otherwise ignored; the in-memory copy stays
/// authoritative for the lifetime of the process.
pub struct FileTokenStore {
    memory: MemoryTokenStore,
    path: PathBuf,
}

impl FileTokenStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let memory = match load(&path) {
            Some(pair) => MemoryTokenStore::with_tokens(pair),
            None => MemoryTokenStore::new(),
        };
        Self { memory, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, pair: &TokenPair) {
        let result = serde_json::to_vec(pair)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, bytes).map_err(anyhow::Error::from)
            });

        if let Err(err) = result {
            warn!("Failed to persist tokens to {}: {:#}", self.path.display(), err);
        }
    }

    fn remove(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove tokens at {}: {}", self.path.display(), err),
        }
    }
}

fn load(path: &Path) -> Option<TokenPair> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!("Failed to read tokens from {}: {}", path.display(), err);
            return None;
        }
    };

    match serde_json::from_slice::<TokenPair>(&bytes) {
        Ok(pair) if pair.is_complete() => {
            debug!("Restored session from {}", path.display());
            Some(pair)
        }
        Ok(_) => None,
        Err(err) => {
            warn!("Ignoring malformed token file {}: {}", path.display(), err);
            None
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<TokenPair> {
        self.memory.get()
    }

    fn set(&self, pair: TokenPair) {
        self.persist(&pair);
        self.memory.set(pair);
    }

    fn clear(&self) {
        self.memory.clear();
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::{FileTokenStore, MemoryTokenStore, TokenStore};
    use crate::model::TokenPair;

    #[test]
    fn memory_set_get_clear() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(), None);

        store.set(TokenPair::new("T1", "R1"));
        assert_eq!(store.get(), Some(TokenPair::new("T1", "R1")));

        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn readers_never_see_mixed_pairs() {
        let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("T0", "R0")));

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 1..2000 {
                    store.set(TokenPair::new(format!("T{i}"), format!("R{i}")));
                }
            })
        };

        let readers = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..2000 {
                        let pair = store.get().unwrap();
                        assert_eq!(pair.access_token[1..], pair.refresh_token[1..]);
                    }
                })
            })
            .collect::<Vec<_>>();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("tokens.json");

        let store = FileTokenStore::open(&path);
        store.set(TokenPair::new("T1", "R1"));

        let reopened = FileTokenStore::open(&path);
        assert_eq!(reopened.get(), Some(TokenPair::new("T1", "R1")));

        reopened.clear();
        assert!(!path.exists());
        assert_eq!(FileTokenStore::open(&path).get(), None);
    }

    #[test]
    fn file_store_ignores_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, b"not json").unwrap();

        assert_eq!(FileTokenStore::open(&path).get(), None);
    }

    #[test]
    fn file_store_keeps_memory_copy_when_disk_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        let store = FileTokenStore::open(blocker.join("tokens.json"));
        store.set(TokenPair::new("T1", "R1"));

        assert_eq!(store.get(), Some(TokenPair::new("T1", "R1")));
    }
}
