use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::errors::StorageError;
use crate::domain::history::{HISTORY_CAPACITY, HistoryEntry, normalize_entries};
use crate::domain::posts::GeneratedPost;
use crate::domain::repositories::HistoryBackend;

/// Result of recording a generation. The in-memory list is always valid;
/// `persist_error` carries a storage failure the caller should surface
/// without treating the recording itself as failed.
pub struct RecordOutcome {
    pub entry: HistoryEntry,
    pub entries: Vec<HistoryEntry>,
    pub persist_error: Option<String>,
}

/// Capacity-bounded, most-recent-first list of past generations, kept in
/// sync with an injectable persistence backend.
///
/// The in-memory list is authoritative for the running session: persistence
/// failures are reported but never invalidate it.
pub struct HistoryService {
    backend: Arc<dyn HistoryBackend>,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryService {
    pub fn new(backend: Arc<dyn HistoryBackend>) -> Self {
        Self {
            backend,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Populate the in-memory list from the backend. Absent or malformed
    /// persisted data yields an empty history, never an error.
    pub async fn load(&self) {
        let loaded = match self.backend.load().await {
            Ok(Some(document)) => match serde_json::from_str::<Vec<HistoryEntry>>(&document) {
                Ok(entries) => normalize_entries(entries),
                Err(err) => {
                    warn!(error = %err, "malformed history document, starting with empty history");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to load history, starting with empty history");
                Vec::new()
            }
        };

        if !loaded.is_empty() {
            info!(count = loaded.len(), "loaded generation history");
        }

        *self.entries.lock().await = loaded;
    }

    /// Record a successful generation: prepend a fresh entry, evict beyond
    /// capacity, persist, and return the updated list.
    pub async fn record(&self, book_title: &str, content: GeneratedPost) -> RecordOutcome {
        let mut guard = self.entries.lock().await;

        let mut entry = HistoryEntry::new(book_title, content);
        // Keep timestamps non-decreasing even if the clock steps backwards,
        // so prepending preserves descending order.
        if let Some(head) = guard.first() {
            entry.timestamp = entry.timestamp.max(head.timestamp);
        }

        guard.insert(0, entry.clone());
        guard.truncate(HISTORY_CAPACITY);

        let persist_error = match self.persist(&guard).await {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "failed to persist history; in-memory list remains valid");
                Some(err.to_string())
            }
        };

        RecordOutcome {
            entry,
            entries: guard.clone(),
            persist_error,
        }
    }

    pub async fn list(&self) -> Vec<HistoryEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<HistoryEntry> {
        self.entries.lock().await.iter().find(|e| e.id == id).cloned()
    }

    /// Empty the list and remove the persisted document. The in-memory list
    /// is cleared even if the backend fails.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.entries.lock().await;
        guard.clear();
        self.backend.clear().await
    }

    async fn persist(&self, entries: &[HistoryEntry]) -> Result<(), StorageError> {
        let document = serde_json::to_string(entries)?;
        self.backend.save(&document).await
    }
}
