use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::posts::GeneratedPost;

/// Maximum number of history entries retained; older entries are evicted.
pub const HISTORY_CAPACITY: usize = 10;

/// One saved past generation. Created on every successful generation, never
/// mutated, removed only by eviction or an explicit clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub book_title: String,
    pub generated_content: GeneratedPost,
    /// Epoch milliseconds at insertion time.
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn new(book_title: impl Into<String>, generated_content: GeneratedPost) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            book_title: book_title.into(),
            generated_content,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Restore the list invariant on data read back from storage: most recent
/// first, at most [`HISTORY_CAPACITY`] entries.
pub fn normalize_entries(mut entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(HISTORY_CAPACITY);
    entries
}
