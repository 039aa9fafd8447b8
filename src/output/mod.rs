use crate::rename::{RenameReport, RenameStatus};
use crate::undo::{SessionUndo, UndoOutcome};
use std::io::{self, Write};

/// Display the outcome of a rename pass
pub fn display_rename_report(report: &RenameReport, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;

    match &report.status {
        RenameStatus::Cancelled => {
            writeln!(writer, "Rename cancelled, no files were changed.")?;
            return Ok(());
        }
        RenameStatus::NothingToDo => {
            writeln!(writer, "No media files found to rename.")?;
            write_skipped(report, writer)?;
            return Ok(());
        }
        _ => {}
    }

    writeln!(writer, "Media folder: {}", report.target_folder.display())?;
    if let Some(session) = &report.session {
        writeln!(writer, "Session:      {}", session)?;
    }
    if let Some(workspace) = &report.workspace {
        writeln!(writer, "Workspace:    {}", workspace.display())?;
    }
    writeln!(writer)?;

    writeln!(writer, "Summary:")?;
    writeln!(writer, "  {} files renamed", report.renamed.len())?;
    if report.workspace.is_some() {
        writeln!(writer, "  {} files restored", report.restored.len())?;
    }
    write_skipped(report, writer)?;

    match &report.status {
        RenameStatus::Aborted { file, reason } => {
            writeln!(writer)?;
            writeln!(writer, "Stopped at '{}': {}", file, reason)?;
            writeln!(
                writer,
                "Files renamed before the failure were NOT rolled back. Inspect the media \
                 folder, then undo the session to restore their names."
            )?;
        }
        RenameStatus::PartiallyRestored { failed } => {
            writeln!(writer)?;
            writeln!(
                writer,
                "{} files could not be moved back from the workspace:",
                failed.len()
            )?;
            for name in failed {
                writeln!(writer, "  - {}", name)?;
            }
            writeln!(
                writer,
                "They keep their new names and were recorded in the session above. \
                 Undo it to restore their original names."
            )?;
        }
        RenameStatus::Completed if !report.not_processed.is_empty() => {
            writeln!(writer)?;
            writeln!(
                writer,
                "{} out of {} files are still not normalized, did you forget to normalize them?",
                report.not_processed.len(),
                report.restored.len()
            )?;
            for name in &report.not_processed {
                writeln!(writer, "  - {}", name)?;
            }
        }
        RenameStatus::Completed if report.workspace.is_some() => {
            writeln!(writer)?;
            writeln!(writer, "All {} files replaced successfully.", report.restored.len())?;
        }
        _ => {}
    }

    Ok(())
}

fn write_skipped(report: &RenameReport, writer: &mut impl Write) -> io::Result<()> {
    if report.skipped_known > 0 {
        writeln!(
            writer,
            "  {} files skipped, already recorded as normalized",
            report.skipped_known
        )?;
    }
    if !report.already_processed.is_empty() {
        writeln!(
            writer,
            "  {} files skipped, already normalized",
            report.already_processed.len()
        )?;
    }
    Ok(())
}

/// Display the per-file outcome of an undo
pub fn display_undo_result(result: &SessionUndo, writer: &mut impl Write) -> io::Result<()> {
    let total = result.outcomes.len();

    writeln!(writer)?;
    for (i, (entry, outcome)) in result.outcomes.iter().enumerate() {
        let prefix = format!("{}/{}.", i + 1, total);
        match outcome {
            UndoOutcome::Success => writeln!(
                writer,
                "{} Renamed '{}' -> '{}'",
                prefix, entry.renamed_name, entry.original_name
            )?,
            UndoOutcome::RenamedFileNotFound => writeln!(
                writer,
                "{} File '{}' (originally '{}') was not found in the media folder, skipped",
                prefix, entry.renamed_name, entry.original_name
            )?,
            UndoOutcome::OriginalAlreadyExists => writeln!(
                writer,
                "{} File '{}' cannot be renamed back to '{}' because '{}' already exists, skipped",
                prefix, entry.renamed_name, entry.original_name, entry.original_name
            )?,
            UndoOutcome::MoveFailed(reason) => writeln!(
                writer,
                "{} File '{}' could not be renamed back to '{}': {}",
                prefix, entry.renamed_name, entry.original_name, reason
            )?,
        }
    }

    writeln!(writer)?;
    if result.finalized {
        writeln!(
            writer,
            "Rename session '{}' undone successfully, all files were restored, \
             session file and lock file were deleted.",
            result.session_id
        )?;
    } else {
        writeln!(
            writer,
            "Rename session '{}' was partially undone, {} out of {} files were restored, \
             session file and lock file were NOT deleted.",
            result.session_id,
            result.restored(),
            total
        )?;
        writeln!(
            writer,
            "Please double-check the messages above and take the appropriate action."
        )?;
    }

    Ok(())
}
