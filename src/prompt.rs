//! Blocking console reads used by the interactive menu and commands.

use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing::{debug, error};

use crate::media::ExternalViewer;
use crate::rename::Operator;

pub struct Prompt {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl Prompt {
    /// Prompt reading stdin and writing to stdout
    pub fn stdio() -> Self {
        Self {
            input: Box::new(io::BufReader::new(io::stdin())),
            output: Box::new(io::stdout()),
        }
    }

    pub fn with_io(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self { input, output }
    }

    pub fn writer(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    pub fn say(&mut self, text: &str) {
        let _ = writeln!(self.output, "{}", text);
        let _ = self.output.flush();
    }

    /// Next line without its terminator, `None` once input is exhausted.
    pub fn read_line(&mut self) -> Option<String> {
        let _ = self.output.flush();
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                error!("Failed to read from the console: {}", e);
                None
            }
        }
    }

    /// Numbered list of `options` followed by `back_label` as the last
    /// entry. Keeps asking until a listed number is typed.
    ///
    /// Returns the chosen index, or `None` for the back entry or end of input.
    pub fn select(&mut self, title: &str, options: &[String], back_label: &str) -> Option<usize> {
        let _ = writeln!(self.output, "\n{}:\n", title);
        for (i, option) in options.iter().enumerate() {
            let _ = writeln!(self.output, "{}. {}", i + 1, option);
        }
        let back = options.len() + 1;
        let _ = writeln!(self.output, "{}. {}", back, back_label);

        loop {
            let _ = write!(self.output, "\nSelect an option: ");
            let line = self.read_line()?;

            match line.trim().parse::<usize>() {
                Ok(n) if n == back => return None,
                Ok(n) if (1..back).contains(&n) => return Some(n - 1),
                _ => {
                    debug!("Rejected menu input {:?}", line);
                    let _ = writeln!(
                        self.output,
                        "Invalid option '{}', please type a number between 1 and {}.",
                        line.trim(),
                        back
                    );
                }
            }
        }
    }

    /// Yes/no question. End of input counts as "no".
    pub fn confirm(&mut self, question: &str) -> bool {
        let _ = writeln!(self.output, "{} (y/n)", question);
        loop {
            let Some(line) = self.read_line() else {
                return false;
            };
            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                other => {
                    let _ = writeln!(self.output, "Please answer 'y' or 'n', not '{}'.", other);
                }
            }
        }
    }

    pub fn acknowledge(&mut self) {
        let _ = writeln!(self.output, "\nPress Enter to continue.");
        self.read_line();
    }
}

/// The person at the console, as seen by the rename engine.
pub struct ConsoleOperator<'a> {
    prompt: &'a mut Prompt,
    viewer: &'a dyn ExternalViewer,
}

impl<'a> ConsoleOperator<'a> {
    pub fn new(prompt: &'a mut Prompt, viewer: &'a dyn ExternalViewer) -> Self {
        Self { prompt, viewer }
    }
}

impl Operator for ConsoleOperator<'_> {
    fn confirm_rename(&mut self, target: &Path) -> bool {
        self.prompt.say(&format!(
            "This will rename media files in {} and record a rename session so the \
             rename can be undone later from the undo option.",
            target.display()
        ));
        self.prompt.confirm("Do you want to continue?")
    }

    fn await_external_edit(&mut self, workspace: &Path) {
        match self.viewer.open(workspace) {
            Ok(()) => self.prompt.say(
                "\nOpened temporary audio folder in file explorer, please normalize the volume \
                 of the audio files there, close the file explorer, and only then press enter \
                 to continue.",
            ),
            Err(e) => {
                error!("Could not open {:?} in the file explorer: {}", workspace, e);
                self.prompt.say(&format!(
                    "\nCould not open the file explorer. Open {} yourself, normalize the volume \
                     of the audio files there, and only then press enter to continue.",
                    workspace.display()
                ));
            }
        }
        self.prompt.read_line();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    struct TestWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn prompt_with(input: &str) -> (Prompt, Arc<Mutex<Vec<u8>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let prompt = Prompt::with_io(
            Box::new(Cursor::new(input.as_bytes().to_vec())),
            Box::new(TestWriter(buffer.clone())),
        );
        (prompt, buffer)
    }

    fn output(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
    }

    fn options() -> Vec<String> {
        vec!["First".to_string(), "Second".to_string()]
    }

    #[test]
    fn test_select_retries_until_valid() {
        let (mut prompt, buffer) = prompt_with("abc\n9\n2\n");

        let choice = prompt.select("Pick one", &options(), "Exit");

        assert_eq!(choice, Some(1));
        let output = output(&buffer);
        assert!(output.contains("Pick one:"));
        assert!(output.contains("1. First"));
        assert!(output.contains("3. Exit"));
        assert_eq!(output.matches("Invalid option").count(), 2);
    }

    #[test]
    fn test_select_back_and_eof() {
        let (mut prompt, _) = prompt_with("3\n");
        assert_eq!(prompt.select("Pick one", &options(), "Return"), None);

        let (mut prompt, _) = prompt_with("");
        assert_eq!(prompt.select("Pick one", &options(), "Return"), None);
    }

    #[test]
    fn test_confirm() {
        let (mut prompt, buffer) = prompt_with("maybe\nY\n");
        assert!(prompt.confirm("Continue?"));
        assert!(output(&buffer).contains("Please answer 'y' or 'n'"));

        let (mut prompt, _) = prompt_with("no\n");
        assert!(!prompt.confirm("Continue?"));

        let (mut prompt, _) = prompt_with("");
        assert!(!prompt.confirm("Continue?"));
    }

    #[test]
    fn test_read_line_strips_crlf() {
        let (mut prompt, _) = prompt_with("hello\r\n");
        assert_eq!(prompt.read_line().as_deref(), Some("hello"));
        assert_eq!(prompt.read_line(), None);
    }

    struct RecordingViewer {
        opened: RefCell<Vec<PathBuf>>,
        fail: bool,
    }

    impl ExternalViewer for RecordingViewer {
        fn open(&self, folder: &Path) -> io::Result<()> {
            self.opened.borrow_mut().push(folder.to_path_buf());
            if self.fail {
                Err(io::Error::new(io::ErrorKind::NotFound, "no file manager"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_operator_waits_for_enter() {
        let (mut prompt, buffer) = prompt_with("\n");
        let viewer = RecordingViewer {
            opened: RefCell::new(Vec::new()),
            fail: false,
        };

        ConsoleOperator::new(&mut prompt, &viewer).await_external_edit(Path::new("/tmp/ws"));

        assert_eq!(*viewer.opened.borrow(), vec![PathBuf::from("/tmp/ws")]);
        assert!(output(&buffer).contains("please normalize the volume"));
        assert_eq!(prompt.read_line(), None);
    }

    #[test]
    fn test_operator_shows_path_when_viewer_fails() {
        let (mut prompt, buffer) = prompt_with("\n");
        let viewer = RecordingViewer {
            opened: RefCell::new(Vec::new()),
            fail: true,
        };

        ConsoleOperator::new(&mut prompt, &viewer).await_external_edit(Path::new("/tmp/ws"));

        assert!(output(&buffer).contains("Open /tmp/ws yourself"));
    }

    #[test]
    fn test_operator_confirmation() {
        let (mut prompt, buffer) = prompt_with("y\n");
        let viewer = RecordingViewer {
            opened: RefCell::new(Vec::new()),
            fail: false,
        };

        let confirmed =
            ConsoleOperator::new(&mut prompt, &viewer).confirm_rename(Path::new("/media"));

        assert!(confirmed);
        assert!(output(&buffer).contains("rename media files in /media"));
    }
}
