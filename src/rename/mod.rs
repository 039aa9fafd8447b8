mod engine;
mod types;

pub use engine::RenameEngine;
pub use types::{Operator, RenameReport, RenameRequest, RenameStatus};
