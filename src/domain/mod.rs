pub mod errors;
pub mod history;
pub mod posts;
pub mod repositories;

// Re-exports
pub use errors::StorageError;
pub use history::{HISTORY_CAPACITY, HistoryEntry};
pub use posts::{GeneratedPost, GenerationRequest};
