use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::media::{Discard, Trash};

use super::types::{RenameSession, SessionId};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to write session file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Cannot read session {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Refusing to store an invalid session: {0}")]
    Invalid(String),

    #[error("Failed to list sessions in {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to retire session {path}: {source}")]
    Retire {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Directory of `rename_session_*.json` files, one per rename pass.
pub struct SessionStore {
    dir: PathBuf,
    discard: Box<dyn Discard>,
}

impl SessionStore {
    /// Store whose retired sessions go to the platform trash.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_discard(dir, Box::new(Trash))
    }

    pub fn with_discard(dir: impl Into<PathBuf>, discard: Box<dyn Discard>) -> Self {
        Self {
            dir: dir.into(),
            discard,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, id: &SessionId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    /// Persist `session` and return its id.
    pub fn write(&self, session: &RenameSession) -> Result<SessionId, SessionError> {
        session.validate().map_err(SessionError::Invalid)?;

        fs::create_dir_all(&self.dir).map_err(|source| SessionError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let mut id = SessionId::for_date(&session.date);
        while self.path_of(&id).exists() {
            warn!("Session file {} already exists, trying the next second", id);
            id = id.next_second();
        }

        let path = self.path_of(&id);
        let temp_path = path.with_extension("json.tmp");

        let written = write_synced(&temp_path, session).and_then(|()| {
            fs::rename(&temp_path, &path).map_err(|source| SessionError::Write {
                path: path.clone(),
                source,
            })
        });
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                debug!("Failed to remove {:?}: {}", temp_path, cleanup);
            }
            return Err(e);
        }

        info!("Session written to: {:?}", path);

        Ok(id)
    }

    /// Stored sessions, oldest first. Foreign files are skipped.
    pub fn list(&self) -> Result<Vec<SessionId>, SessionError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Sessions folder {:?} does not exist yet", self.dir);
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(SessionError::List {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut ids = Vec::new();

        for entry in read_dir {
            let entry = entry.map_err(|source| SessionError::List {
                path: self.dir.clone(),
                source,
            })?;

            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name();
            let Some(name) = name.to_str().filter(|_| is_file) else {
                trace!("Skipping {:?}", entry.path());
                continue;
            };

            match SessionId::parse(name) {
                Some(id) => ids.push(id),
                None => trace!("Skipping foreign file {}", name),
            }
        }

        ids.sort();

        Ok(ids)
    }

    pub fn read(&self, id: &SessionId) -> Result<RenameSession, SessionError> {
        let path = self.path_of(id);
        let corrupt = |message: String| SessionError::Corrupt {
            path: path.clone(),
            message,
        };

        let file = File::open(&path).map_err(|e| corrupt(e.to_string()))?;
        let session: RenameSession =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| corrupt(e.to_string()))?;
        session.validate().map_err(corrupt)?;

        debug!(
            "Read session {} with {} entries for {:?}",
            id,
            session.entries.len(),
            session.target_folder
        );

        Ok(session)
    }

    /// Remove a session once it has been fully undone.
    pub fn retire(&self, id: &SessionId) -> Result<(), SessionError> {
        let path = self.path_of(id);

        self.discard
            .discard(&path)
            .map_err(|source| SessionError::Retire {
                path: path.clone(),
                source,
            })?;

        info!("Retired session {}", id);

        Ok(())
    }
}

/// Serialize into `path` and flush it to disk before returning.
fn write_synced(path: &Path, session: &RenameSession) -> Result<(), SessionError> {
    let to_error = |source| SessionError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, session)?;
    let file = writer.into_inner().map_err(|e| to_error(e.into_error()))?;
    file.sync_all().map_err(to_error)
}
