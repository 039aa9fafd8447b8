//! Collision-free replacement names for files inside one folder.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::trace;
use uuid::Uuid;

type TokenSource = Box<dyn FnMut() -> String + Send>;

/// Hands out `<uuid>.<ext>` names that are free inside a single folder.
///
/// A candidate is rejected when it already exists on disk or when this
/// generator handed it out before, so names planned for one batch never
/// collide with each other even before any file has been moved.
pub struct NameGenerator {
    folder: PathBuf,
    reserved: HashSet<String>,
    next_token: TokenSource,
}

impl NameGenerator {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self::with_token_source(folder, || Uuid::new_v4().to_string())
    }

    /// Create a generator with a custom token source (for testing)
    pub fn with_token_source(
        folder: impl Into<PathBuf>,
        source: impl FnMut() -> String + Send + 'static,
    ) -> Self {
        Self {
            folder: folder.into(),
            reserved: HashSet::new(),
            next_token: Box::new(source),
        }
    }

    /// Mark a name as taken. Returns false if it was already reserved.
    #[cfg(test)]
    fn reserve(&mut self, name: impl Into<String>) -> bool {
        self.reserved.insert(name.into())
    }

    /// Generate a free name keeping the extension of `original`.
    pub fn generate_for(&mut self, original: &Path) -> String {
        let extension = original
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());
        self.generate(extension.as_deref())
    }

    pub fn generate(&mut self, extension: Option<&str>) -> String {
        loop {
            let token = (self.next_token)();
            let candidate = match extension {
                Some(ext) if !ext.is_empty() => format!("{}.{}", token, ext),
                _ => token,
            };

            if self.is_taken(&candidate) {
                trace!(name = %candidate, "Generated name is taken, retrying");
                continue;
            }

            self.reserved.insert(candidate.clone());
            return candidate;
        }
    }

    fn is_taken(&self, candidate: &str) -> bool {
        self.reserved.contains(candidate) || self.folder.join(candidate).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn scripted(tokens: &[&str]) -> impl FnMut() -> String + Send + 'static {
        let mut tokens: Vec<String> = tokens.iter().rev().map(|t| t.to_string()).collect();
        move || tokens.pop().expect("token source exhausted")
    }

    #[test]
    fn test_keeps_extension() {
        let dir = tempdir().unwrap();
        let mut names = NameGenerator::new(dir.path());

        let name = names.generate_for(Path::new("café.mp3"));

        assert!(name.ends_with(".mp3"));
        assert!(name.is_ascii());
        assert_ne!(name, "café.mp3");
    }

    #[test]
    fn test_no_extension() {
        let dir = tempdir().unwrap();
        let mut names = NameGenerator::with_token_source(dir.path(), scripted(&["abc"]));

        assert_eq!(names.generate_for(Path::new("README")), "abc");
    }

    #[test]
    fn test_skips_names_existing_on_disk() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("taken.mp3"), b"x").unwrap();

        let mut names =
            NameGenerator::with_token_source(dir.path(), scripted(&["taken", "taken", "free"]));

        assert_eq!(names.generate(Some("mp3")), "free.mp3");
    }

    #[test]
    fn test_skips_names_planned_in_same_batch() {
        let dir = tempdir().unwrap();
        let mut names =
            NameGenerator::with_token_source(dir.path(), scripted(&["same", "same", "other"]));

        let first = names.generate(Some("mp3"));
        let second = names.generate(Some("mp3"));

        assert_eq!(first, "same.mp3");
        assert_eq!(second, "other.mp3");
    }

    #[test]
    fn test_reserved_names_are_skipped() {
        let dir = tempdir().unwrap();
        let mut names =
            NameGenerator::with_token_source(dir.path(), scripted(&["held", "next"]));

        assert!(names.reserve("held.ogg"));
        assert!(!names.reserve("held.ogg"));
        assert_eq!(names.generate(Some("ogg")), "next.ogg");
    }

    #[test]
    fn test_many_names_are_unique() {
        let dir = tempdir().unwrap();
        let mut names = NameGenerator::new(dir.path());

        let generated: HashSet<String> = (0..200).map(|_| names.generate(Some("mp3"))).collect();

        assert_eq!(generated.len(), 200);
    }
}
