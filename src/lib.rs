pub mod cli;
pub mod commands;
pub mod config;
pub mod dedup;
pub mod error;
pub mod lock;
pub mod logging;
pub mod media;
pub mod menu;
pub mod naming;
pub mod output;
pub mod progress;
pub mod prompt;
pub mod rename;
pub mod session;
pub mod ui;
pub mod undo;

pub use config::{ConfigLoad, Configuration};
pub use dedup::{DedupError, DedupStore};
pub use error::{AppError, ExitCode};
pub use lock::LockGuard;
pub use naming::NameGenerator;
pub use rename::{Operator, RenameEngine, RenameReport, RenameRequest, RenameStatus};
pub use session::{RenameSession, RenamedFileEntry, SessionId, SessionStore};
pub use undo::{UndoEngine, UndoOutcome, UndoReport};
