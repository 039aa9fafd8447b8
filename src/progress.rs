//! Progress output for user-facing status updates.
//!
//! The engines report each file they touch through this type. In verbose
//! mode output is suppressed since tracing already covers it.

use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;

/// Progress reporter for user-facing output
pub struct Progress {
    writer: Box<dyn Write>,
    /// When true, all output is suppressed (verbose mode uses tracing instead)
    silent: bool,
    /// When true, output is colorized
    colors_enabled: bool,
}

impl Progress {
    /// Create a progress reporter that respects UI mode
    /// When verbose=true, output is suppressed (tracing handles it)
    pub fn new_with_ui(verbose: bool, colors_enabled: bool) -> Self {
        Self {
            writer: Box::new(io::stderr()),
            silent: verbose,
            colors_enabled,
        }
    }

    /// Create a progress reporter with a custom writer (for testing)
    pub fn with_writer(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            silent: false,
            colors_enabled: false,
        }
    }

    /// Create a silent progress reporter
    pub fn silent() -> Self {
        Self {
            writer: Box::new(io::sink()),
            silent: true,
            colors_enabled: false,
        }
    }

    fn step(&mut self, current: usize, total: usize, from: &str, to: &str) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let counter = format!("[{}/{}]", current, total);
            let _ = writeln!(
                self.writer,
                "{} {} {} {}",
                counter.cyan(),
                from.dimmed(),
                "→".cyan(),
                to
            );
        } else {
            let _ = writeln!(self.writer, "[{}/{}] {} -> {}", current, total, from, to);
        }
    }

    fn heading(&mut self, text: &str) {
        if self.silent {
            return;
        }
        let _ = writeln!(self.writer);
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{}", text.bold());
        } else {
            let _ = writeln!(self.writer, "{}", text);
        }
    }

    fn note(&mut self, text: &str) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{}", text.dimmed());
        } else {
            let _ = writeln!(self.writer, "{}", text);
        }
    }

    /// Report starting a rename pass
    pub fn rename_start(&mut self, total: usize) {
        self.heading(&format!("Renaming {} files", total));
    }

    /// Report progress on a single rename
    pub fn rename_progress(&mut self, current: usize, total: usize, from: &str, to: &str) {
        self.step(current, total, from, to);
    }

    /// Report a file copied into the scratch workspace
    pub fn stage_progress(&mut self, current: usize, total: usize, name: &str, folder: &Path) {
        let to = folder.display().to_string();
        self.step(current, total, name, &to);
    }

    /// Report a file moved back from the scratch workspace
    pub fn restore_progress(&mut self, current: usize, total: usize, from: &str, to: &str) {
        self.step(current, total, from, to);
    }

    /// Report session file written
    pub fn session_written(&mut self, path: &Path) {
        self.note(&format!("Rename session saved to: {}", path.display()));
    }

    /// Report starting an undo
    pub fn undo_start(&mut self, total: usize, session: &str) {
        self.heading(&format!("Undoing {} renames from {}", total, session));
    }

    /// Report progress on a single undo entry
    pub fn undo_progress(&mut self, current: usize, total: usize, from: &str, to: &str) {
        self.step(current, total, from, to);
    }

    /// Report undo complete
    pub fn undo_complete(&mut self, restored: usize, total: usize) {
        if self.silent {
            return;
        }
        let _ = writeln!(self.writer);
        if restored == total {
            if self.colors_enabled {
                let _ = writeln!(
                    self.writer,
                    "{} {}",
                    "✓".green().bold(),
                    format!("{} files restored", restored).green()
                );
            } else {
                let _ = writeln!(self.writer, "Undo complete. {} files restored.", restored);
            }
        } else if self.colors_enabled {
            let _ = writeln!(
                self.writer,
                "{} {}",
                "!".yellow().bold(),
                format!("{} of {} files restored", restored, total).yellow()
            );
        } else {
            let _ = writeln!(
                self.writer,
                "Undo incomplete. {} of {} files restored.",
                restored, total
            );
        }
    }

    /// Report an error during operation (non-fatal)
    pub fn warn(&mut self, message: &str) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{} {}", "!".yellow().bold(), message.yellow());
        } else {
            let _ = writeln!(self.writer, "Warning: {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_progress() -> (Progress, std::sync::Arc<std::sync::Mutex<Vec<u8>>>) {
        let buffer = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let writer = TestWriter(buffer.clone());
        let progress = Progress::with_writer(Box::new(writer));
        (progress, buffer)
    }

    struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_rename_progress() {
        let (mut progress, buffer) = create_test_progress();

        progress.rename_start(2);
        progress.rename_progress(1, 2, "café.mp3", "1f2e.mp3");
        progress.rename_progress(2, 2, "naïve.mp3", "9a8b.mp3");

        let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Renaming 2 files"));
        assert!(output.contains("[1/2] café.mp3 -> 1f2e.mp3"));
        assert!(output.contains("[2/2]"));
    }

    #[test]
    fn test_undo_complete_partial() {
        let (mut progress, buffer) = create_test_progress();

        progress.undo_complete(1, 2);

        let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(output.contains("1 of 2 files restored"));
    }

    #[test]
    fn test_silent_writes_nothing() {
        let buffer = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut progress = Progress {
            writer: Box::new(TestWriter(buffer.clone())),
            silent: true,
            colors_enabled: false,
        };

        progress.warn("ignored");
        progress.session_written(Path::new("/s.json"));

        assert!(buffer.lock().unwrap().is_empty());
    }
}
