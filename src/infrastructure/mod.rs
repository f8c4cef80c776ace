pub mod ai;
pub mod client;
pub mod images;
pub mod storage;
