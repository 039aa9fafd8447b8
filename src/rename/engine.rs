use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::dedup::DedupStore;
use crate::error::AppError;
use crate::lock::LockGuard;
use crate::media::{CandidateFilter, MediaInspector};
use crate::naming::NameGenerator;
use crate::progress::Progress;
use crate::session::{FileTimestamps, RenameSession, RenamedFileEntry, SessionId, SessionStore};

use super::types::{Operator, RenameReport, RenameRequest, RenameStatus};

/// Renames candidate files in one media folder and records the batch.
pub struct RenameEngine<'a> {
    target: PathBuf,
    sessions: &'a SessionStore,
    dedup: &'a DedupStore,
    inspector: &'a dyn MediaInspector,
}

struct Failure {
    file: String,
    reason: String,
}

impl<'a> RenameEngine<'a> {
    pub fn new(
        target: impl Into<PathBuf>,
        sessions: &'a SessionStore,
        dedup: &'a DedupStore,
        inspector: &'a dyn MediaInspector,
    ) -> Self {
        Self {
            target: target.into(),
            sessions,
            dedup,
            inspector,
        }
    }

    pub fn run(
        &self,
        request: &RenameRequest,
        operator: &mut dyn Operator,
        progress: &mut Progress,
    ) -> Result<RenameReport, AppError> {
        if !self.target.exists() {
            return Err(AppError::TargetFolderMissing {
                path: self.target.clone(),
            });
        }
        if !self.target.is_dir() {
            return Err(AppError::NotADirectory {
                path: self.target.clone(),
            });
        }

        let lock = LockGuard::for_folder(&self.target);
        if lock.is_locked() {
            info!("Refusing to rename, lock file present at {:?}", lock.path());
            return Err(AppError::AlreadyLocked {
                lock_file: lock.path().to_path_buf(),
            });
        }

        if request.confirm && !operator.confirm_rename(&self.target) {
            info!("Rename cancelled by the operator");
            return Ok(RenameReport::new(RenameStatus::Cancelled, &self.target));
        }

        let mut report = RenameReport::new(RenameStatus::Completed, &self.target);

        let candidates = self.select(request.filter, &mut report)?;
        if candidates.is_empty() {
            info!("No media files found to rename");
            report.status = RenameStatus::NothingToDo;
            return Ok(report);
        }

        let (entries, failure) = self.rename_all(&candidates, progress);
        report.renamed = entries.clone();

        if entries.is_empty() {
            if let Some(Failure { file, reason }) = failure {
                report.status = RenameStatus::Aborted { file, reason };
            }
            return Ok(report);
        }

        let session = self.record(entries, &lock, progress)?;
        report.session = Some(session.0.clone());

        if let Some(Failure { file, reason }) = failure {
            warn!(
                "Rename stopped at {} after {} files, nothing was rolled back",
                file,
                report.renamed.len()
            );
            report.status = RenameStatus::Aborted { file, reason };
            return Ok(report);
        }

        if let Some(workspace_root) = &request.workspace {
            let (id, session) = session;
            self.round_trip(workspace_root, &id, &session, &lock, operator, progress, &mut report)?;
        }

        Ok(report)
    }

    /// Candidate paths minus known and already processed files.
    fn select(
        &self,
        filter: CandidateFilter,
        report: &mut RenameReport,
    ) -> Result<Vec<PathBuf>, AppError> {
        let files = self.inspector.list_candidate_files(&self.target, filter)?;
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();

        let known = self.dedup.query(&self.target, &names)?;
        report.skipped_known = known.len();

        let mut selected = Vec::new();
        let mut processed = Vec::new();

        for (path, name) in files.into_iter().zip(names) {
            if known.contains(&name) {
                debug!("Skipping {}, already recorded as processed", name);
                continue;
            }
            if filter.skips_processed() && self.inspector.is_already_processed(&path) {
                debug!("Skipping {}, already processed", name);
                processed.push(name);
                continue;
            }
            selected.push(path);
        }

        if !processed.is_empty() {
            info!(
                "{} files are already processed and will be ignored",
                processed.len()
            );
            self.dedup.insert_all(&self.target, &processed)?;
        }
        report.already_processed = processed;

        debug!("{} files selected for renaming", selected.len());
        Ok(selected)
    }

    /// Move every candidate to a fresh name, stopping at the first failure.
    fn rename_all(
        &self,
        candidates: &[PathBuf],
        progress: &mut Progress,
    ) -> (Vec<RenamedFileEntry>, Option<Failure>) {
        let mut generator = NameGenerator::new(&self.target);
        let mut entries = Vec::with_capacity(candidates.len());
        let total = candidates.len();

        progress.rename_start(total);

        for (i, path) in candidates.iter().enumerate() {
            let original = file_name(path);

            let timestamps = match FileTimestamps::read(path) {
                Ok(timestamps) => timestamps,
                Err(e) => {
                    error!("Failed to read attributes of {:?}: {}", path, e);
                    return (entries, Some(Failure { file: original, reason: e.to_string() }));
                }
            };

            let renamed = generator.generate_for(path);
            let destination = self.target.join(&renamed);

            if let Err(e) = fs::rename(path, &destination) {
                error!("Failed to rename {:?} to {:?}: {}", path, destination, e);
                return (entries, Some(Failure { file: original, reason: e.to_string() }));
            }

            debug!("Renamed {} -> {}", original, renamed);
            progress.rename_progress(i + 1, total, &original, &renamed);
            entries.push(RenamedFileEntry::new(original, renamed, timestamps));
        }

        info!("Successfully renamed {} files", entries.len());
        (entries, None)
    }

    /// Persist the session, then take the lock.
    fn record(
        &self,
        entries: Vec<RenamedFileEntry>,
        lock: &LockGuard,
        progress: &mut Progress,
    ) -> Result<(SessionId, RenameSession), AppError> {
        let target_folder = std::path::absolute(&self.target)
            .map_err(|e| AppError::io("Failed to resolve the media folder path", e))?;

        let session = RenameSession::new(Utc::now(), target_folder, entries)
            .map_err(|message| AppError::SessionError {
                path: None,
                message,
            })?;

        let id = match self.sessions.write(&session) {
            Ok(id) => id,
            Err(e) => {
                error!("Could not save the rename session, these files were renamed:");
                for entry in &session.entries {
                    error!("  {} -> {}", entry.original_name, entry.renamed_name);
                }
                return Err(e.into());
            }
        };
        progress.session_written(&self.sessions.path_of(&id));

        lock.acquire()?;

        Ok((id, session))
    }

    #[allow(clippy::too_many_arguments)]
    fn round_trip(
        &self,
        workspace_root: &Path,
        id: &SessionId,
        session: &RenameSession,
        lock: &LockGuard,
        operator: &mut dyn Operator,
        progress: &mut Progress,
        report: &mut RenameReport,
    ) -> Result<(), AppError> {
        let scratch = workspace_root.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&scratch).map_err(|e| {
            AppError::io(format!("Failed to create workspace {}", scratch.display()), e)
        })?;
        report.workspace = Some(scratch.clone());

        let total = session.entries.len();

        for (i, entry) in session.entries.iter().enumerate() {
            let from = self.target.join(&entry.renamed_name);
            let to = scratch.join(&entry.renamed_name);

            if let Err(e) = fs::copy(&from, &to) {
                error!("Failed to copy {:?} to {:?}: {}", from, to, e);
                report.status = RenameStatus::Aborted {
                    file: entry.renamed_name.clone(),
                    reason: e.to_string(),
                };
                return Ok(());
            }
            progress.stage_progress(i + 1, total, &entry.renamed_name, &scratch);
        }

        info!("Staged {} files in {:?}", total, scratch);
        operator.await_external_edit(&scratch);

        let mut failed = Vec::new();

        for (i, entry) in session.entries.iter().enumerate() {
            let staged = scratch.join(&entry.renamed_name);
            let original = self.target.join(&entry.original_name);

            if let Err(e) = move_file(&staged, &original) {
                error!("Failed to move {:?} to {:?}: {}", staged, original, e);
                progress.warn(&format!("Could not restore {}: {}", entry.original_name, e));
                failed.push(entry.original_name.clone());
                continue;
            }

            let renamed_copy = self.target.join(&entry.renamed_name);
            if let Err(e) = fs::remove_file(&renamed_copy) {
                warn!("Failed to remove {:?}: {}", renamed_copy, e);
            }

            progress.restore_progress(i + 1, total, &entry.renamed_name, &entry.original_name);
            report.restored.push(entry.original_name.clone());
        }

        if failed.is_empty() {
            if let Err(e) = fs::remove_dir_all(&scratch) {
                warn!("Failed to delete workspace {:?}: {}", scratch, e);
            }
            self.sessions.retire(id)?;
            lock.release()?;
            info!("Every file was restored, session {} retired", id);
        } else {
            let remaining = self.rerecord(id, session, &failed, progress)?;
            warn!(
                "{} of {} files were not restored, kept the workspace and recorded them as session {}",
                failed.len(),
                total,
                remaining
            );
            report.session = Some(remaining);
            report.status = RenameStatus::PartiallyRestored { failed };
        }

        let (passing, failing): (Vec<String>, Vec<String>) = report
            .restored
            .iter()
            .cloned()
            .partition(|name| self.inspector.is_already_processed(&self.target.join(name)));

        self.dedup.insert_all(&self.target, &passing)?;

        if !failing.is_empty() {
            warn!(
                "{} of {} restored files are still not processed",
                failing.len(),
                total
            );
        }
        report.not_processed = failing;

        Ok(())
    }

    /// Replace `id` with a session holding only the entries still renamed.
    /// The lock stays until that session is undone.
    fn rerecord(
        &self,
        id: &SessionId,
        session: &RenameSession,
        unrestored: &[String],
        progress: &mut Progress,
    ) -> Result<SessionId, AppError> {
        let entries: Vec<RenamedFileEntry> = session
            .entries
            .iter()
            .filter(|entry| unrestored.contains(&entry.original_name))
            .cloned()
            .collect();

        let narrowed = RenameSession::new(Utc::now(), session.target_folder.clone(), entries)
            .map_err(|message| AppError::SessionError {
                path: None,
                message,
            })?;

        let new_id = self.sessions.write(&narrowed)?;
        progress.session_written(&self.sessions.path_of(&new_id));
        self.sessions.retire(id)?;

        Ok(new_id)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Rename, falling back to copy and delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if from.is_file() => {
            debug!("Rename of {:?} failed ({}), copying instead", from, e);
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}
