use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::menu::CommandKey;

#[derive(Parser, Debug)]
#[command(name = "anki-media-volume")]
#[command(author, version, long_about = None)]
#[command(about = "Rename Anki media files so their volume can be normalized, and undo the rename")]
pub struct Args {
    /// Configuration file, created with defaults when missing
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Do not ask for confirmation before renaming
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Run one command instead of the interactive menu
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rename media files with non-ASCII names
    Rename,
    /// Rename non-ASCII audio files that are not normalized yet
    RenameUnprocessed,
    /// Normalize audio files through a temporary folder
    Normalize,
    /// Undo a rename session
    Undo {
        /// Undo the most recent session without asking
        #[arg(long)]
        latest: bool,
    },
    /// Open the Anki media folder in the file explorer
    Open,
}

impl Command {
    pub fn key(&self) -> CommandKey {
        match self {
            Command::Rename => CommandKey::RenameMediaFiles,
            Command::RenameUnprocessed => CommandKey::RenameUnprocessedAudio,
            Command::Normalize => CommandKey::NormalizeUsingWorkspace,
            Command::Undo { .. } => CommandKey::UndoSessions,
            Command::Open => CommandKey::OpenMediaFolder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_menu() {
        let args = Args::parse_from(["anki-media-volume"]);
        assert_eq!(args.command, None);
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert!(!args.yes);
    }

    #[test]
    fn test_subcommands() {
        let args = Args::parse_from(["anki-media-volume", "-y", "-vv", "rename-unprocessed"]);
        assert!(args.yes);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.command, Some(Command::RenameUnprocessed));

        let args = Args::parse_from(["anki-media-volume", "undo", "--latest"]);
        assert_eq!(args.command, Some(Command::Undo { latest: true }));
        assert_eq!(
            args.command.map(|c| c.key()),
            Some(CommandKey::UndoSessions)
        );
    }
}
