//! Interactive menu: a static tree of groups and actions walked with an
//! explicit stack.

use tracing::{debug, error, warn};

use crate::commands::{self, ActionFn, AppContext};
use crate::error::Severity;

pub const MENU_TITLE: &str = "Anki Media Volume";

/// Stable identifier of each action, shared with the subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKey {
    RenameMediaFiles,
    RenameUnprocessedAudio,
    NormalizeUsingWorkspace,
    UndoSessions,
    OpenMediaFolder,
}

pub enum MenuNode {
    Group {
        name: &'static str,
        children: Vec<MenuNode>,
    },
    Action {
        name: &'static str,
        run: ActionFn,
    },
}

impl MenuNode {
    pub fn name(&self) -> &'static str {
        match self {
            MenuNode::Group { name, .. } | MenuNode::Action { name, .. } => *name,
        }
    }
}

const REGISTRY: &[(CommandKey, &str, ActionFn)] = &[
    (
        CommandKey::RenameMediaFiles,
        "Rename media files",
        commands::rename_media_files,
    ),
    (
        CommandKey::RenameUnprocessedAudio,
        "Rename audio files (not normalized only)",
        commands::rename_unprocessed_audio,
    ),
    (
        CommandKey::NormalizeUsingWorkspace,
        "Normalize audio files using temporary folder (not normalized only)",
        commands::normalize_using_workspace,
    ),
    (
        CommandKey::UndoSessions,
        "Undo rename sessions",
        commands::undo_sessions,
    ),
    (
        CommandKey::OpenMediaFolder,
        "Open anki media folder in file explorer",
        commands::open_media_folder,
    ),
];

/// Action registered under `key`.
pub fn find(key: CommandKey) -> Option<(&'static str, ActionFn)> {
    REGISTRY
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, name, run)| (*name, *run))
}

pub fn root() -> MenuNode {
    MenuNode::Group {
        name: MENU_TITLE,
        children: REGISTRY
            .iter()
            .map(|(_, name, run)| MenuNode::Action {
                name: *name,
                run: *run,
            })
            .collect(),
    }
}

/// Walk `root` until the user picks the back entry of the top level or
/// input runs out. Action errors are shown and the menu carries on.
pub fn run(root: &MenuNode, ctx: &mut AppContext) {
    let mut stack: Vec<&MenuNode> = vec![root];

    while let Some(&current) = stack.last() {
        let MenuNode::Group { name, children } = current else {
            stack.pop();
            continue;
        };

        let back_label = if stack.len() == 1 { "Exit" } else { "Return" };
        let options: Vec<String> = children.iter().map(|c| c.name().to_string()).collect();

        let Some(index) = ctx.prompt.select(name, &options, back_label) else {
            debug!("Leaving menu {:?}", name);
            stack.pop();
            continue;
        };

        match &children[index] {
            group @ MenuNode::Group { .. } => stack.push(group),
            MenuNode::Action { name, run } => {
                debug!("Running menu action {:?}", name);
                if let Err(e) = run(ctx) {
                    match e.severity() {
                        Severity::UserRecoverable => {
                            warn!("{}: {}", name, e);
                            ctx.ui.warning(&e.detailed_message());
                        }
                        _ => {
                            error!("{} failed: {}", name, e);
                            ctx.ui.error(&e.detailed_message());
                        }
                    }
                }
                ctx.prompt.acknowledge();
            }
        }
    }
}
