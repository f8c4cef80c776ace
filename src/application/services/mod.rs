pub mod history;

pub use history::{HistoryService, RecordOutcome};
