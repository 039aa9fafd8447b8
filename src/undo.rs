use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::lock::LockGuard;
use crate::progress::Progress;
use crate::session::{RenamedFileEntry, SessionId, SessionStore};

/// Result of reversing one session entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    Success,
    /// The renamed file is gone from the media folder
    RenamedFileNotFound,
    /// Something else already uses the original name
    OriginalAlreadyExists,
    /// The move itself failed
    MoveFailed(String),
}

impl UndoOutcome {
    pub fn is_success(&self) -> bool {
        *self == UndoOutcome::Success
    }
}

/// What happened to the chosen session.
#[derive(Debug)]
pub struct SessionUndo {
    pub session_id: SessionId,
    pub target_folder: PathBuf,
    /// One outcome per session entry, in session order
    pub outcomes: Vec<(RenamedFileEntry, UndoOutcome)>,
    /// Session file and lock were removed
    pub finalized: bool,
}

impl SessionUndo {
    pub fn restored(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_success()).count()
    }
}

#[derive(Debug)]
pub enum UndoReport {
    NoSessions,
    Cancelled,
    Finished(SessionUndo),
}

pub struct UndoEngine<'a> {
    sessions: &'a SessionStore,
}

impl<'a> UndoEngine<'a> {
    pub fn new(sessions: &'a SessionStore) -> Self {
        Self { sessions }
    }

    /// List sessions, let `choose` pick one by index, then undo it.
    pub fn run(
        &self,
        choose: impl FnOnce(&[SessionId]) -> Option<usize>,
        progress: &mut Progress,
    ) -> Result<UndoReport, AppError> {
        let ids = self.sessions.list()?;
        if ids.is_empty() {
            info!("No rename sessions found to undo");
            return Ok(UndoReport::NoSessions);
        }

        let Some(id) = choose(&ids).and_then(|index| ids.get(index)) else {
            debug!("No session chosen");
            return Ok(UndoReport::Cancelled);
        };

        self.undo(id, progress).map(UndoReport::Finished)
    }

    /// Reverse every entry of `id`. The session and lock are only removed
    /// when all entries were restored.
    pub fn undo(&self, id: &SessionId, progress: &mut Progress) -> Result<SessionUndo, AppError> {
        let session = self.sessions.read(id)?;
        let folder = &session.target_folder;
        let total = session.entries.len();

        info!(
            "Undoing session {} ({} files in {:?}, renamed {})",
            id, total, folder, session.date
        );
        progress.undo_start(total, id.file_name());

        let mut outcomes = Vec::with_capacity(total);

        for (i, entry) in session.entries.into_iter().enumerate() {
            let renamed = folder.join(&entry.renamed_name);
            let original = folder.join(&entry.original_name);

            let outcome = if !renamed.exists() {
                warn!(
                    "{} (originally {}) was not found, skipping it",
                    entry.renamed_name, entry.original_name
                );
                UndoOutcome::RenamedFileNotFound
            } else if original.exists() {
                warn!(
                    "{} cannot be renamed back to {} because that file already exists, skipping it",
                    entry.renamed_name, entry.original_name
                );
                UndoOutcome::OriginalAlreadyExists
            } else {
                match fs::rename(&renamed, &original) {
                    Ok(()) => {
                        if let Err(e) = entry.timestamps.apply(&original) {
                            warn!("Could not restore timestamps of {:?}: {}", original, e);
                        }
                        progress.undo_progress(
                            i + 1,
                            total,
                            &entry.renamed_name,
                            &entry.original_name,
                        );
                        UndoOutcome::Success
                    }
                    Err(e) => {
                        warn!("Failed to move {:?} to {:?}: {}", renamed, original, e);
                        UndoOutcome::MoveFailed(e.to_string())
                    }
                }
            };

            outcomes.push((entry, outcome));
        }

        let mut result = SessionUndo {
            session_id: id.clone(),
            target_folder: session.target_folder,
            outcomes,
            finalized: false,
        };

        let restored = result.restored();
        progress.undo_complete(restored, total);

        if restored == total {
            self.sessions.retire(id)?;
            LockGuard::for_folder(&result.target_folder).release()?;
            result.finalized = true;
            info!("Session {} undone, session file and lock removed", id);
        } else {
            info!(
                "Session {} partially undone ({} of {}), session file and lock kept",
                id, restored, total
            );
        }

        Ok(result)
    }
}
