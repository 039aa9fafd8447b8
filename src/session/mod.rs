//! Persisted rename sessions, the unit of undo.

mod store;
mod types;

pub use store::{SessionError, SessionStore};
pub use types::*;
