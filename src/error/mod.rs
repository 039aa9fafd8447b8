mod codes;

pub use codes::ExitCode;

use crate::config::ConfigError;
use crate::dedup::DedupError;
use crate::lock::LockError;
use crate::media::MediaError;
use crate::session::SessionError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// How far an error reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user can fix it and retry; nothing was changed
    UserRecoverable,
    /// The current command stops, the menu carries on
    FatalToOperation,
    /// The process cannot continue
    Fatal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Media folder not found: {path}")]
    TargetFolderMissing { path: PathBuf },

    #[error("Path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Media folder is already renamed (lock file {lock_file})")]
    AlreadyLocked { lock_file: PathBuf },

    #[error("Cannot read session {path}: {message}")]
    CorruptSession { path: PathBuf, message: String },

    #[error("Session error: {message}")]
    SessionError {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("Database was not ready after {waited:?}")]
    InitializationTimeout { waited: Duration },

    #[error("Database error: {message}")]
    DatabaseError { message: String },

    #[error("Lock file error: {message}")]
    LockError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("{context}: {source}")]
    IoError {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AppError::IoError {
            context: context.into(),
            source,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AppError::TargetFolderMissing { .. }
            | AppError::NotADirectory { .. }
            | AppError::AlreadyLocked { .. } => Severity::UserRecoverable,
            AppError::ConfigError { .. } => Severity::Fatal,
            _ => Severity::FatalToOperation,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::TargetFolderMissing { .. } => ExitCode::TargetFolderMissing,
            AppError::NotADirectory { .. } => ExitCode::TargetFolderMissing,
            AppError::PermissionDenied { .. } => ExitCode::PermissionError,
            AppError::AlreadyLocked { .. } => ExitCode::AlreadyLocked,
            AppError::CorruptSession { .. } => ExitCode::CorruptSession,
            AppError::SessionError { .. } => ExitCode::SessionError,
            AppError::InitializationTimeout { .. } => ExitCode::DatabaseError,
            AppError::DatabaseError { .. } => ExitCode::DatabaseError,
            AppError::LockError { .. } => ExitCode::IoError,
            AppError::ConfigError { .. } => ExitCode::ConfigError,
            AppError::IoError { .. } => ExitCode::IoError,
            AppError::Other(_) => ExitCode::GeneralError,
        }
    }

    pub fn detailed_message(&self) -> String {
        match self {
            AppError::TargetFolderMissing { path } => {
                format!(
                    "The Anki media folder does not exist:\n  {}\n\n\
                     Check \"ankiMediaFolderPath\" in the configuration file \
                     or set ANKI_MEDIA_FOLDER.",
                    path.display()
                )
            }

            AppError::NotADirectory { path } => {
                format!(
                    "The Anki media path is not a directory:\n  {}\n\n\
                     Point \"ankiMediaFolderPath\" at the collection.media folder.",
                    path.display()
                )
            }

            AppError::PermissionDenied { path } => {
                format!(
                    "Permission denied when accessing:\n  {}\n\n\
                     Please check file permissions or close Anki and try again.",
                    path.display()
                )
            }

            AppError::AlreadyLocked { lock_file } => {
                format!(
                    "Media folder files are already renamed, undo the last rename \
                     session before renaming again.\n\
                     Lock file: {}\n\n\
                     Use \"Undo rename sessions\" to restore the original names.",
                    lock_file.display()
                )
            }

            AppError::CorruptSession { path, message } => {
                format!(
                    "Cannot read this rename session:\n  {}\n  {}\n\n\
                     The session file may have been edited or truncated. \
                     Inspect it before undoing anything by hand.",
                    path.display(),
                    message
                )
            }

            AppError::SessionError { path, message } => {
                let path_info = path
                    .as_ref()
                    .map(|p| format!("File: {}\n", p.display()))
                    .unwrap_or_default();

                format!(
                    "Rename session error:\n  {}\n{}\n\
                     Ensure the sessions folder is writable.",
                    message, path_info
                )
            }

            AppError::InitializationTimeout { waited } => {
                format!(
                    "The processed-files database was not ready after {:?}.\n\n\
                     Another program may be holding the database file. Try again.",
                    waited
                )
            }

            AppError::DatabaseError { message } => {
                format!(
                    "Processed-files database error:\n  {}\n\n\
                     The database file may be corrupted. \
                     Delete it to start over (files will be inspected again).",
                    message
                )
            }

            AppError::LockError { message } => {
                format!(
                    "Lock file error:\n  {}\n\n\
                     Check permissions on the media folder.",
                    message
                )
            }

            AppError::ConfigError { path, message } => {
                let path_info = path
                    .as_ref()
                    .map(|p| format!("File: {}\n", p.display()))
                    .unwrap_or_default();

                format!(
                    "Configuration error:\n  {}\n{}\n\
                     Fix the configuration file or delete it to regenerate defaults.",
                    message, path_info
                )
            }

            AppError::IoError { context, source } => {
                format!(
                    "{}:\n  {}\n\n\
                     Check file permissions and ensure no files are open.",
                    context, source
                )
            }

            AppError::Other(message) => message.clone(),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::PathNotFound(path) => AppError::TargetFolderMissing { path },
            MediaError::NotADirectory(path) => AppError::NotADirectory { path },
            MediaError::PermissionDenied(path) => AppError::PermissionDenied { path },
            MediaError::IoError(e) => AppError::io("Failed to read media folder", e),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Corrupt { path, message } => AppError::CorruptSession { path, message },
            SessionError::Write { ref path, .. }
            | SessionError::List { ref path, .. }
            | SessionError::Retire { ref path, .. } => AppError::SessionError {
                path: Some(path.clone()),
                message: err.to_string(),
            },
            SessionError::Serialize(_) | SessionError::Invalid(_) => AppError::SessionError {
                path: None,
                message: err.to_string(),
            },
        }
    }
}

impl From<DedupError> for AppError {
    fn from(err: DedupError) -> Self {
        match err {
            DedupError::InitializationTimeout { waited } => {
                AppError::InitializationTimeout { waited }
            }
            other => AppError::DatabaseError {
                message: other.to_string(),
            },
        }
    }
}

impl From<LockError> for AppError {
    fn from(err: LockError) -> Self {
        AppError::LockError {
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::ConfigError {
            path: err.path().map(PathBuf::from),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let err = AppError::TargetFolderMissing {
            path: PathBuf::from("/test"),
        };
        assert_eq!(err.exit_code(), ExitCode::TargetFolderMissing);

        let err = AppError::AlreadyLocked {
            lock_file: PathBuf::from("/m/anki-media-volume.lock"),
        };
        assert_eq!(err.exit_code(), ExitCode::AlreadyLocked);

        let err = AppError::PermissionDenied {
            path: PathBuf::from("/test"),
        };
        assert_eq!(err.exit_code(), ExitCode::PermissionError);
    }

    #[test]
    fn test_severity() {
        let locked = AppError::AlreadyLocked {
            lock_file: PathBuf::from("/m/anki-media-volume.lock"),
        };
        assert_eq!(locked.severity(), Severity::UserRecoverable);

        let corrupt = AppError::CorruptSession {
            path: PathBuf::from("/s.json"),
            message: "eof".to_string(),
        };
        assert_eq!(corrupt.severity(), Severity::FatalToOperation);

        let timeout = AppError::InitializationTimeout {
            waited: Duration::from_secs(4),
        };
        assert_eq!(timeout.severity(), Severity::FatalToOperation);
    }

    #[test]
    fn test_detailed_message_includes_context() {
        let err = AppError::AlreadyLocked {
            lock_file: PathBuf::from("/m/anki-media-volume.lock"),
        };

        let msg = err.detailed_message();
        assert!(msg.contains("already renamed"));
        assert!(msg.contains("anki-media-volume.lock"));
        assert!(msg.contains("Undo rename sessions"));
    }

    #[test]
    fn test_media_error_conversion() {
        let err: AppError = MediaError::PathNotFound(PathBuf::from("/missing")).into();
        assert_eq!(err.exit_code(), ExitCode::TargetFolderMissing);
        assert_eq!(err.severity(), Severity::UserRecoverable);
    }

    #[test]
    fn test_session_error_conversion() {
        let err: AppError = SessionError::Corrupt {
            path: PathBuf::from("/s/rename_session_x.json"),
            message: "expected value".to_string(),
        }
        .into();

        assert!(matches!(err, AppError::CorruptSession { .. }));
        assert!(err.detailed_message().contains("expected value"));
    }

    #[test]
    fn test_dedup_timeout_conversion() {
        let err: AppError = DedupError::InitializationTimeout {
            waited: Duration::from_secs(4),
        }
        .into();

        assert!(matches!(err, AppError::InitializationTimeout { .. }));
        assert_eq!(err.exit_code(), ExitCode::DatabaseError);
    }
}
