pub mod access_policy;
pub mod batch_runner;
pub mod history_store;

pub use access_policy::{allowed, allowed_stages};
pub use batch_runner::{BatchFailure, BatchOutcome, ThrottledBatchRunner};
pub use history_store::{HistoryStore, MemoryHistoryStore};
