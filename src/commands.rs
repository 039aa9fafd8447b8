//! The actions behind menu entries and subcommands.

use tracing::{debug, info};

use crate::config::Configuration;
use crate::dedup::DedupStore;
use crate::error::AppError;
use crate::media::{CandidateFilter, ExternalViewer, MediaInspector};
use crate::output::{display_rename_report, display_undo_result};
use crate::progress::Progress;
use crate::prompt::{ConsoleOperator, Prompt};
use crate::rename::{RenameEngine, RenameRequest};
use crate::session::{SessionId, SessionStore};
use crate::ui::Ui;
use crate::undo::{UndoEngine, UndoReport};

/// Switches set on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandOptions {
    /// Skip the rename confirmation
    pub assume_yes: bool,
    /// Undo the newest session without asking
    pub undo_latest: bool,
}

/// Everything a command may touch. Built once in `main`.
pub struct AppContext {
    pub config: Configuration,
    pub sessions: SessionStore,
    pub dedup: DedupStore,
    pub inspector: Box<dyn MediaInspector>,
    pub viewer: Box<dyn ExternalViewer>,
    pub ui: Ui,
    pub prompt: Prompt,
    pub progress: Progress,
    pub options: CommandOptions,
}

pub type ActionFn = fn(&mut AppContext) -> Result<(), AppError>;

pub fn rename_media_files(ctx: &mut AppContext) -> Result<(), AppError> {
    rename(ctx, RenameRequest::in_place(CandidateFilter::NonAscii))
}

pub fn rename_unprocessed_audio(ctx: &mut AppContext) -> Result<(), AppError> {
    rename(ctx, RenameRequest::in_place(CandidateFilter::NonAsciiUnprocessed))
}

/// Rename every unprocessed audio file and hand copies to the user for
/// normalization in a scratch folder.
pub fn normalize_using_workspace(ctx: &mut AppContext) -> Result<(), AppError> {
    let request = RenameRequest::through_workspace(
        CandidateFilter::Unprocessed,
        ctx.config.temporary_audios_folder_path.clone(),
    );
    rename(ctx, request)
}

fn rename(ctx: &mut AppContext, request: RenameRequest) -> Result<(), AppError> {
    let request = request.with_confirmation(!ctx.options.assume_yes);
    let target = &ctx.config.anki_media_folder_path;
    debug!("Rename request {:?} for {:?}", request, target);

    ctx.ui.section("Rename");
    ctx.ui.kv("Media folder", &target.display().to_string());

    let engine = RenameEngine::new(
        target.clone(),
        &ctx.sessions,
        &ctx.dedup,
        ctx.inspector.as_ref(),
    );
    let mut operator = ConsoleOperator::new(&mut ctx.prompt, ctx.viewer.as_ref());
    let report = engine.run(&request, &mut operator, &mut ctx.progress)?;

    display_rename_report(&report, &mut ctx.prompt.writer())
        .map_err(|e| AppError::Other(format!("Failed to display output: {}", e)))?;

    if report.is_success() {
        if let Some(session) = &report.session {
            ctx.ui.success(&format!("Created rename session {}", session));
        }
    }
    Ok(())
}

pub fn undo_sessions(ctx: &mut AppContext) -> Result<(), AppError> {
    ctx.ui.section("Undo");

    let latest = ctx.options.undo_latest;
    let prompt = &mut ctx.prompt;
    let choose = |ids: &[SessionId]| {
        if latest {
            return ids.len().checked_sub(1);
        }
        let names: Vec<String> = ids.iter().map(ToString::to_string).collect();
        prompt.select("Select a session to undo", &names, "Return")
    };

    match UndoEngine::new(&ctx.sessions).run(choose, &mut ctx.progress)? {
        UndoReport::NoSessions => ctx.prompt.say("No rename sessions found to undo."),
        UndoReport::Cancelled => debug!("Undo cancelled"),
        UndoReport::Finished(result) => {
            display_undo_result(&result, &mut ctx.prompt.writer())
                .map_err(|e| AppError::Other(format!("Failed to display output: {}", e)))?;
        }
    }
    Ok(())
}

pub fn open_media_folder(ctx: &mut AppContext) -> Result<(), AppError> {
    let folder = &ctx.config.anki_media_folder_path;
    if !folder.exists() {
        return Err(AppError::TargetFolderMissing {
            path: folder.clone(),
        });
    }

    ctx.viewer
        .open(folder)
        .map_err(|e| AppError::io(format!("Failed to open {}", folder.display()), e))?;
    info!("Opened {:?}", folder);
    ctx.prompt.say("Opened anki media folder in file explorer.");
    Ok(())
}
