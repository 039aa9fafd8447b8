use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

/// Opens a folder for the user. Implementations must not wait for the
/// viewer to close.
pub trait ExternalViewer {
    fn open(&self, folder: &Path) -> io::Result<()>;
}

/// The desktop's file manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFileManager;

impl SystemFileManager {
    fn program() -> &'static str {
        if cfg!(target_os = "windows") {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        }
    }
}

impl ExternalViewer for SystemFileManager {
    fn open(&self, folder: &Path) -> io::Result<()> {
        let program = Self::program();
        info!("Opening {:?} with {}", folder, program);

        let mut command = Command::new(program);
        command.arg(folder);
        spawn_detached(command)?;

        Ok(())
    }
}

/// Start `command` without waiting for it. A named thread waits on the
/// child so it never lingers as a zombie.
fn spawn_detached(mut command: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let program = command.get_program().to_string_lossy().into_owned();
    thread::Builder::new()
        .name("viewer-reaper".to_string())
        .spawn(move || {
            let status = child.wait();
            match &status {
                Ok(status) if status.success() => debug!("{} exited", program),
                Ok(status) => warn!("{} exited with {}", program, status),
                Err(e) => warn!("Failed to wait for {}: {}", program, e),
            }
            status
        })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_detached_child_is_reaped() {
        let mut command = Command::new("sh");
        command.args(["-c", "exit 3"]);

        let reaper = spawn_detached(command).unwrap();
        let status = reaper.join().unwrap().unwrap();

        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let command = Command::new("definitely-not-a-file-manager");

        assert!(spawn_detached(command).is_err());
    }
}
