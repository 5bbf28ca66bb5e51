mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::models::chat::Conversation;

pub const HISTORY_KEY: &str = "ai_chatbot_history";
pub const THEME_KEY: &str = "darkMode";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value under '{key}' is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A keyed string store that survives restarts of the chat client.
pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub fn save_conversation(
    storage: &dyn DurableStorage,
    conversation: &Conversation
) -> Result<(), StoreError> {
    let json = serde_json::to_string(conversation).map_err(|source| StoreError::Serialize {
        key: HISTORY_KEY.to_string(),
        source,
    })?;
    storage.set(HISTORY_KEY, &json)
}

/// Reads the saved conversation; an absent key yields an empty one.
pub fn load_conversation(storage: &dyn DurableStorage) -> Result<Conversation, StoreError> {
    match storage.get(HISTORY_KEY)? {
        Some(json) =>
            serde_json::from_str(&json).map_err(|source| StoreError::Malformed {
                key: HISTORY_KEY.to_string(),
                source,
            }),
        None => Ok(Conversation::new()),
    }
}

pub fn remove_conversation(storage: &dyn DurableStorage) -> Result<(), StoreError> {
    storage.remove(HISTORY_KEY)
}

/// Dark mode is on only when the stored flag reads `true`.
pub fn load_dark_mode(storage: &dyn DurableStorage) -> Result<bool, StoreError> {
    Ok(storage.get(THEME_KEY)?.as_deref().map(str::trim) == Some("true"))
}

pub fn save_dark_mode(storage: &dyn DurableStorage, dark: bool) -> Result<(), StoreError> {
    storage.set(THEME_KEY, if dark { "true" } else { "false" })
}

pub fn initialize_storage(dir: PathBuf) -> Result<Arc<dyn DurableStorage>, StoreError> {
    info!("Chat history will be stored in: {}", dir.display());
    Ok(Arc::new(FileStorage::new(dir)?))
}
