//! UI module for styled terminal output.
//!
//! Provides colored output in normal mode and plain tracing in verbose mode.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};

const TITLE: &str = "Anki Media Volume";

/// UI configuration
#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors_enabled: bool,
    pub verbose: bool,
}

impl UiConfig {
    /// Create UI config from environment and args
    pub fn new(verbose: bool) -> Self {
        let colors_enabled = should_use_colors();
        Self {
            colors_enabled,
            verbose,
        }
    }
}

/// Check if we should use colors in output
fn should_use_colors() -> bool {
    // Check NO_COLOR env (standard: https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    io::stderr().is_terminal()
}

/// Styled output writer
pub struct Ui {
    config: UiConfig,
    writer: Box<dyn Write>,
}

impl Ui {
    /// Create a new UI with stderr output
    pub fn new(config: UiConfig) -> Self {
        // Set colored crate's global color setting
        if !config.colors_enabled {
            colored::control::set_override(false);
        }

        Self {
            config,
            writer: Box::new(io::stderr()),
        }
    }

    /// Create UI with custom writer (for testing)
    pub fn with_writer(config: UiConfig, writer: Box<dyn Write>) -> Self {
        if !config.colors_enabled {
            colored::control::set_override(false);
        }

        Self { config, writer }
    }

    /// Print the application header
    pub fn print_header(&mut self, version: &str) {
        if self.config.verbose {
            let _ = writeln!(self.writer, "anki-media-volume v{}", version);
            let _ = writeln!(self.writer);
            return;
        }

        self.boxed_title(TITLE);
        if self.config.colors_enabled {
            let _ = writeln!(
                self.writer,
                "{}",
                format!("{:>50}", format!("v{}", version)).dimmed()
            );
        } else {
            let _ = writeln!(self.writer, "{:>50}", format!("v{}", version));
        }
    }

    /// Print a section header
    pub fn section(&mut self, title: &str) {
        if self.config.verbose {
            return;
        }
        let _ = writeln!(self.writer);
        if self.config.colors_enabled {
            let _ = writeln!(self.writer, "{}", title.bold());
        } else {
            let _ = writeln!(self.writer, "{}", title);
        }
    }

    /// Print a success message with checkmark
    pub fn success(&mut self, msg: &str) {
        if self.config.verbose {
            return;
        }
        if self.config.colors_enabled {
            let _ = writeln!(self.writer, "{} {}", "✓".green().bold(), msg.green());
        } else {
            let _ = writeln!(self.writer, "* {}", msg);
        }
    }

    /// Print a warning message
    pub fn warning(&mut self, msg: &str) {
        if self.config.verbose {
            return;
        }
        if self.config.colors_enabled {
            let _ = writeln!(self.writer, "{} {}", "!".yellow().bold(), msg.yellow());
        } else {
            let _ = writeln!(self.writer, "! {}", msg);
        }
    }

    /// Print an error message
    pub fn error(&mut self, msg: &str) {
        // Errors shown in both modes
        if self.config.colors_enabled {
            let _ = writeln!(self.writer, "{} {}", "✗".red().bold(), msg.red());
        } else {
            let _ = writeln!(self.writer, "X {}", msg);
        }
    }

    /// Print a key-value pair
    pub fn kv(&mut self, key: &str, value: &str) {
        if self.config.verbose {
            return;
        }
        if self.config.colors_enabled {
            let _ = writeln!(self.writer, "{}: {}", key.bold(), value);
        } else {
            let _ = writeln!(self.writer, "{}: {}", key, value);
        }
    }

    fn boxed_title(&mut self, title: &str) {
        if self.config.verbose {
            return;
        }
        let width = 50;
        let title_width = title.chars().count();
        let padding = (width - title_width - 2) / 2;
        let title_line = format!(
            "║{}{}{}║",
            " ".repeat(padding),
            title,
            " ".repeat(width - padding - title_width - 2)
        );

        if self.config.colors_enabled {
            let _ = writeln!(
                self.writer,
                "{}",
                format!("╔{}╗", "═".repeat(width - 2)).cyan()
            );
            let _ = writeln!(self.writer, "{}", title_line.cyan().bold());
            let _ = writeln!(
                self.writer,
                "{}",
                format!("╚{}╝", "═".repeat(width - 2)).cyan()
            );
        } else {
            let _ = writeln!(self.writer, "╔{}╗", "═".repeat(width - 2));
            let _ = writeln!(self.writer, "{}", title_line);
            let _ = writeln!(self.writer, "╚{}╝", "═".repeat(width - 2));
        }
    }
}
