use async_trait::async_trait;

use crate::domain::errors::StorageError;

/// Injectable persistence capability for the history document.
///
/// Backends store a single opaque JSON document; interpreting (and
/// tolerating malformed) content is the history service's job, so a backend
/// never needs to understand entry structure.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Read the persisted document, `None` if nothing has been saved.
    async fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the persisted document.
    async fn save(&self, document: &str) -> Result<(), StorageError>;

    /// Remove the persisted document entirely.
    async fn clear(&self) -> Result<(), StorageError>;
}
