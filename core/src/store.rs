//! Key/Value Persistence
//!
//! Durable, synchronous, string-keyed storage. Everything the user builds up
//! between runs lives here under a handful of well-known keys:
//!
//! | Key               | Value                                   |
//! |-------------------|-----------------------------------------|
//! | `conversation`    | JSON array of `{role, content}`         |
//! | `customPrompt`    | biography text                          |
//! | `savedImageLinks` | JSON object of expression name → link   |
//! | `apiKey`          | chat provider API key                   |
//! | `wanikaniApiKey`  | WaniKani API token                      |
//!
//! Writes complete before `set` returns so that what is stored always matches
//! what the user has seen.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::conversation::Conversation;
use crate::expression::ExpressionCatalogue;

/// Well-known store keys
pub mod keys {
    /// Conversation history
    pub const CONVERSATION: &str = "conversation";
    /// User biography
    pub const BIOGRAPHY: &str = "customPrompt";
    /// Expression catalogue
    pub const EXPRESSION_LINKS: &str = "savedImageLinks";
    /// Chat provider API key
    pub const API_KEY: &str = "apiKey";
    /// WaniKani API token
    pub const WANIKANI_API_KEY: &str = "wanikaniApiKey";
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written
    #[error("Store I/O failed for {path}: {source}")]
    Io {
        /// Backing file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of strings
    #[error("Store at {path} is corrupt: {source}")]
    Corrupt {
        /// Backing file
        path: PathBuf,
        /// Parse error
        source: serde_json::Error,
    },

    /// A value could not be encoded
    #[error("Failed to encode value for key '{key}': {source}")]
    Encode {
        /// Key being written
        key: String,
        /// Encoding error
        source: serde_json::Error,
    },
}

/// Durable string-keyed storage
pub trait KeyValueStore: Send {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, durably, before returning
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, for tests and ephemeral sessions
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON document on disk
///
/// The whole document is rewritten on every change through a temporary file
/// and a rename, so a crash mid-write leaves the previous version intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed
    ///
    /// A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let values = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "Opened store");
        Ok(Self { path, values })
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let encoded =
            serde_json::to_string_pretty(&self.values).map_err(|source| StoreError::Encode {
                key: "*".to_string(),
                source,
            })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, encoded).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Load the stored conversation
///
/// Missing or unreadable history starts a fresh conversation.
pub fn load_conversation(store: &dyn KeyValueStore) -> Conversation {
    let Some(raw) = store.get(keys::CONVERSATION) else {
        return Conversation::new();
    };
    match serde_json::from_str(&raw) {
        Ok(conversation) => conversation,
        Err(e) => {
            tracing::warn!(error = %e, "Stored conversation is unreadable, starting fresh");
            Conversation::new()
        }
    }
}

/// Save the conversation
pub fn save_conversation(
    store: &mut dyn KeyValueStore,
    conversation: &Conversation,
) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(conversation).map_err(|source| StoreError::Encode {
        key: keys::CONVERSATION.to_string(),
        source,
    })?;
    store.set(keys::CONVERSATION, &encoded)
}

/// Delete the conversation
pub fn clear_conversation(store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
    store.remove(keys::CONVERSATION)
}

/// Load the biography, if one is set
pub fn load_biography(store: &dyn KeyValueStore) -> Option<String> {
    store
        .get(keys::BIOGRAPHY)
        .filter(|bio| !bio.trim().is_empty())
}

/// Save the biography; a blank biography is stored as empty
pub fn save_biography(store: &mut dyn KeyValueStore, biography: &str) -> Result<(), StoreError> {
    store.set(keys::BIOGRAPHY, biography.trim())
}

/// Load the expression catalogue
///
/// Without a stored catalogue every default name is offered with no link.
pub fn load_catalogue(store: &dyn KeyValueStore) -> ExpressionCatalogue {
    let Some(raw) = store.get(keys::EXPRESSION_LINKS) else {
        return ExpressionCatalogue::with_default_names();
    };
    match serde_json::from_str(&raw) {
        Ok(catalogue) => catalogue,
        Err(e) => {
            tracing::warn!(error = %e, "Stored expression links are unreadable, using defaults");
            ExpressionCatalogue::with_default_names()
        }
    }
}

/// Save the expression catalogue
pub fn save_catalogue(
    store: &mut dyn KeyValueStore,
    catalogue: &ExpressionCatalogue,
) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(catalogue).map_err(|source| StoreError::Encode {
        key: keys::EXPRESSION_LINKS.to_string(),
        source,
    })?;
    store.set(keys::EXPRESSION_LINKS, &encoded)
}

/// Load an API key by store key, ignoring blank values
pub fn load_secret(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    store
        .get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Save an API key by store key; a blank key removes it
pub fn save_secret(store: &mut dyn KeyValueStore, key: &str, value: &str) -> Result<(), StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        store.remove(key)
    } else {
        store.set(key, trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a"), None);
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a"), Some("1".to_string()));
        store.remove("a").unwrap();
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set(keys::BIOGRAPHY, "大阪に住んでいます").unwrap();
        store.set("other", "x").unwrap();
        store.remove("other").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(keys::BIOGRAPHY),
            Some("大阪に住んでいます".to_string())
        );
        assert_eq!(reopened.get("other"), None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_conversation_helpers() {
        let mut store = MemoryStore::new();
        assert!(load_conversation(&store).is_empty());

        let mut conversation = Conversation::new();
        conversation.push_user("こんにちは");
        conversation.push_assistant("やあ");
        save_conversation(&mut store, &conversation).unwrap();

        assert_eq!(load_conversation(&store), conversation);

        clear_conversation(&mut store).unwrap();
        assert!(load_conversation(&store).is_empty());
    }

    #[test]
    fn test_unreadable_conversation_starts_fresh() {
        let mut store = MemoryStore::new();
        store.set(keys::CONVERSATION, "{oops").unwrap();
        assert!(load_conversation(&store).is_empty());
    }

    #[test]
    fn test_catalogue_defaults_and_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(load_catalogue(&store).len(), 33);

        let catalogue: ExpressionCatalogue = [("happy", "h.png")].into_iter().collect();
        save_catalogue(&mut store, &catalogue).unwrap();
        assert_eq!(load_catalogue(&store), catalogue);
    }

    #[test]
    fn test_biography_and_secrets() {
        let mut store = MemoryStore::new();
        save_biography(&mut store, "  ").unwrap();
        assert_eq!(load_biography(&store), None);
        save_biography(&mut store, "学生です").unwrap();
        assert_eq!(load_biography(&store), Some("学生です".to_string()));

        save_secret(&mut store, keys::API_KEY, " sk-123 ").unwrap();
        assert_eq!(load_secret(&store, keys::API_KEY), Some("sk-123".to_string()));
        save_secret(&mut store, keys::API_KEY, "").unwrap();
        assert_eq!(load_secret(&store, keys::API_KEY), None);
    }
}
