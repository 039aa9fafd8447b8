use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

/// Removes a file the tool no longer needs.
///
/// A path that is already gone counts as discarded.
pub trait Discard {
    fn discard(&self, path: &Path) -> io::Result<()>;
}

/// Moves files to the platform trash, deleting them when there is no trash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trash;

impl Discard for Trash {
    fn discard(&self, path: &Path) -> io::Result<()> {
        if fs::symlink_metadata(path).is_err() {
            debug!("Nothing to discard at {:?}", path);
            return Ok(());
        }

        match trash::delete(path) {
            Ok(()) => {
                debug!("Moved {:?} to trash", path);
                Ok(())
            }
            Err(e) => {
                warn!("Could not move {:?} to trash ({}), deleting it instead", path, e);
                remove(path)
            }
        }
    }
}

/// Deletes files outright.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delete;

impl Discard for Delete {
    fn discard(&self, path: &Path) -> io::Result<()> {
        remove(path)
    }
}

fn remove(path: &Path) -> io::Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
