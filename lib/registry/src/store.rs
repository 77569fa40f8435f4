//! Durable key to conversation mapping.
//!
//! The registry lives in memory and is mirrored to a single JSON snapshot
//! after every mutation. Loading never fails: a missing or unreadable
//! snapshot yields an empty registry. Snapshot writes replace the file
//! atomically, and a failed write leaves the in-memory mapping intact.

use crate::error::RegistryError;
use pagechat_core::{ConversationId, write_atomic};
use rootcause::Report;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The key to conversation mapping and its snapshot file.
#[derive(Debug)]
pub struct DurableRegistry {
    path: PathBuf,
    entries: RwLock<HashMap<String, ConversationId>>,
    /// Serializes snapshot writes so an older snapshot never lands last.
    write_lock: Mutex<()>,
}

impl DurableRegistry {
    /// Loads the registry from `path`.
    ///
    /// A missing file or contents that are not a JSON object of strings
    /// produce an empty registry and a warning.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, ConversationId>>(&bytes) {
                Ok(entries) => {
                    info!(
                        path = %path.display(),
                        entries = entries.len(),
                        "Loaded conversation registry"
                    );
                    entries
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Registry snapshot is unreadable; starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "No registry snapshot loaded; starting empty"
                );
                HashMap::new()
            }
        };

        Self {
            path,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up the conversation registered for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ConversationId> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Returns the number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no key is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the whole mapping.
    #[must_use]
    pub fn entries(&self) -> HashMap<String, ConversationId> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records `value` for `key` and writes a new snapshot.
    ///
    /// A failed write is logged and otherwise ignored; the entry stays in
    /// memory for the life of the process.
    pub async fn put(&self, key: impl Into<String>, value: ConversationId) {
        let key = key.into();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), value);

        match self.persist().await {
            Ok(()) => debug!(key = %key, "Updated registry snapshot"),
            Err(e) => warn!(key = %key, error = %e, "Failed to persist registry; continuing"),
        }
    }

    /// Writes the full mapping to the snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the atomic file replacement fails.
    pub async fn persist(&self) -> Result<(), Report<RegistryError>> {
        let _guard = self.write_lock.lock().await;

        let bytes = serde_json::to_vec_pretty(&self.entries()).map_err(|e| {
            RegistryError::SerializeFailed {
                reason: e.to_string(),
            }
        })?;

        let path = self.path.clone();
        let write_error = |reason: String| RegistryError::WriteFailed {
            path: self.path.display().to_string(),
            reason,
        };
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| write_error(e.to_string()))?
            .map_err(|e| write_error(e.to_string()))?;
        Ok(())
    }
}
