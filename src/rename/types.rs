use std::path::{Path, PathBuf};

use crate::media::CandidateFilter;
use crate::session::{RenamedFileEntry, SessionId};

/// What a rename pass should do.
#[derive(Debug, Clone)]
pub struct RenameRequest {
    pub filter: CandidateFilter,
    /// Ask the operator before touching anything
    pub confirm: bool,
    /// Round-trip the renamed files through a scratch folder under this root
    pub workspace: Option<PathBuf>,
}

impl RenameRequest {
    pub fn in_place(filter: CandidateFilter) -> Self {
        Self {
            filter,
            confirm: true,
            workspace: None,
        }
    }

    pub fn through_workspace(filter: CandidateFilter, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            filter,
            confirm: true,
            workspace: Some(workspace_root.into()),
        }
    }

    pub fn with_confirmation(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }
}

/// How a rename pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameStatus {
    Completed,
    /// The operator declined; nothing was touched
    Cancelled,
    /// No candidate files were left after filtering
    NothingToDo,
    /// A file operation failed and the pass stopped there without rollback
    Aborted { file: String, reason: String },
    /// Some workspace files could not be moved back
    PartiallyRestored { failed: Vec<String> },
}

/// Outcome of a rename pass
#[derive(Debug, Clone)]
pub struct RenameReport {
    pub status: RenameStatus,
    pub target_folder: PathBuf,
    /// Session recorded for the files that were moved
    pub session: Option<SessionId>,
    pub renamed: Vec<RenamedFileEntry>,
    /// Original names moved back from the workspace
    pub restored: Vec<String>,
    /// Candidates dropped because the dedup store already knew them
    pub skipped_known: usize,
    /// Candidates dropped because they were processed already
    pub already_processed: Vec<String>,
    /// Restored files that still fail the completion predicate
    pub not_processed: Vec<String>,
    /// Scratch folder used for the external edit
    pub workspace: Option<PathBuf>,
}

impl RenameReport {
    pub fn new(status: RenameStatus, target_folder: &Path) -> Self {
        Self {
            status,
            target_folder: target_folder.to_path_buf(),
            session: None,
            renamed: Vec::new(),
            restored: Vec::new(),
            skipped_known: 0,
            already_processed: Vec::new(),
            not_processed: Vec::new(),
            workspace: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RenameStatus::Completed
    }
}

/// The person driving the tool.
pub trait Operator {
    /// Final yes/no before files in `target` are renamed
    fn confirm_rename(&mut self, target: &Path) -> bool;

    /// Show `workspace` to the user and block until they are done editing
    fn await_external_edit(&mut self, workspace: &Path);
}
