//! Persisted record of files that no longer need processing, keyed by
//! media folder and file name.

mod store;
mod types;

pub use store::DedupStore;
pub use types::{DedupError, DEFAULT_WAIT_LIMIT};
