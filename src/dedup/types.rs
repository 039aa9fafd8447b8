use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// How long queries wait for the background initialization by default.
pub const DEFAULT_WAIT_LIMIT: Duration = Duration::from_secs(4);

pub(crate) const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS normalized_files (
        id          TEXT PRIMARY KEY,
        folder_path TEXT NOT NULL,
        name        TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_normalized_files_folder_name
        ON normalized_files (folder_path, name);
";

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Database was not ready after {waited:?}")]
    InitializationTimeout { waited: Duration },

    #[error("Database initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Database is closed")]
    Closed,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Folder column value: the path with forward slashes.
pub fn folder_key(folder: &Path) -> String {
    folder.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_key_uses_forward_slashes() {
        assert_eq!(
            folder_key(Path::new(r"C:\Users\me\collection.media")),
            "C:/Users/me/collection.media"
        );
        assert_eq!(folder_key(Path::new("/home/me/media")), "/home/me/media");
    }
}
