//! Collaborators around the media folder: candidate listing, the
//! "already normalized" predicate, discarding files and opening folders.

mod discard;
mod replaygain;
mod viewer;

pub use discard::{Delete, Discard, Trash};
pub use replaygain::has_replaygain_tag;
pub use viewer::{ExternalViewer, SystemFileManager};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

/// Extension of the audio files the tool works on.
pub const AUDIO_EXTENSION: &str = "mp3";

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Failed to read directory: {0}")]
    IoError(#[from] std::io::Error),
}

/// Which audio files a rename pass starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateFilter {
    /// Audio files whose name contains a non-ASCII character
    NonAscii,
    /// Non-ASCII audio files that are not normalized yet
    NonAsciiUnprocessed,
    /// Every audio file that is not normalized yet
    Unprocessed,
}

impl CandidateFilter {
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            CandidateFilter::NonAscii | CandidateFilter::NonAsciiUnprocessed => !name.is_ascii(),
            CandidateFilter::Unprocessed => true,
        }
    }

    /// Whether files satisfying the completion predicate are dropped
    pub fn skips_processed(&self) -> bool {
        !matches!(self, CandidateFilter::NonAscii)
    }
}

pub trait MediaInspector {
    /// Audio files in `folder` whose names pass `filter`, sorted by name.
    fn list_candidate_files(
        &self,
        folder: &Path,
        filter: CandidateFilter,
    ) -> Result<Vec<PathBuf>, MediaError>;

    /// Completion predicate: has the external tool already processed this file?
    fn is_already_processed(&self, path: &Path) -> bool;
}

/// Inspector for MP3 files normalized with ReplayGain tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioInspector;

impl MediaInspector for AudioInspector {
    fn list_candidate_files(
        &self,
        folder: &Path,
        filter: CandidateFilter,
    ) -> Result<Vec<PathBuf>, MediaError> {
        list_audio_files(folder, |name| filter.matches_name(name))
    }

    fn is_already_processed(&self, path: &Path) -> bool {
        match has_replaygain_tag(path) {
            Ok(tagged) => tagged,
            Err(e) => {
                debug!("Could not inspect {:?} ({}), assuming it is not normalized", path, e);
                false
            }
        }
    }
}

/// List regular `*.mp3` files directly inside `folder` accepted by `accept`.
pub fn list_audio_files(
    folder: &Path,
    accept: impl Fn(&str) -> bool,
) -> Result<Vec<PathBuf>, MediaError> {
    debug!(path = ?folder, "Listing audio files");

    if !folder.exists() {
        return Err(MediaError::PathNotFound(folder.to_path_buf()));
    }

    if !folder.is_dir() {
        return Err(MediaError::NotADirectory(folder.to_path_buf()));
    }

    let read_dir = fs::read_dir(folder).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            MediaError::PermissionDenied(folder.to_path_buf())
        } else {
            MediaError::IoError(e)
        }
    })?;

    let mut files = Vec::new();

    for entry in read_dir {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type()?.is_file() {
            trace!(path = ?path, "Skipping non-file entry");
            continue;
        }

        let is_audio = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(AUDIO_EXTENSION));
        if !is_audio {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            trace!(path = ?path, "Skipping file with non UTF-8 name");
            continue;
        };

        if accept(name) {
            files.push(path);
        }
    }

    files.sort();

    debug!(count = files.len(), "Listing complete");

    Ok(files)
}
