//! `config.json` handling and Anki media folder discovery.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Overrides `ankiMediaFolderPath` when set.
pub const MEDIA_FOLDER_ENV: &str = "ANKI_MEDIA_FOLDER";

const ANKI_BASE_FOLDER: &str = "Anki2";
const ANKI_MEDIA_FOLDER: &str = "collection.media";
const ANKI_DEFAULT_PROFILE: &str = "User 1";
const NON_PROFILE_FOLDERS: &[&str] = &["addons21", "addon21", "logs"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Write { path, .. } => Some(path),
            ConfigError::Serialize(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    /// Anki's `collection.media` folder
    pub anki_media_folder_path: PathBuf,

    /// Root of the scratch folders used for external edits
    pub temporary_audios_folder_path: PathBuf,

    pub undo_sessions_folder_path: PathBuf,

    /// SQLite file remembering normalized files
    pub database_path: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            anki_media_folder_path: discover_media_folder(),
            temporary_audios_folder_path: PathBuf::from("audios_to_rename"),
            undo_sessions_folder_path: PathBuf::from("undo_sessions"),
            database_path: PathBuf::from("database").join("history.db"),
        }
    }
}

#[derive(Debug)]
pub enum ConfigLoad {
    Loaded(Configuration),
    /// No file existed; defaults were written to this path
    Created(PathBuf),
}

impl Configuration {
    /// Read `path`, or write the defaults there if it does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<ConfigLoad, ConfigError> {
        if !path.exists() {
            info!("Configuration file not found, creating {:?}", path);
            Configuration::default().save(path)?;
            return Ok(ConfigLoad::Created(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Configuration =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Loaded configuration: {:?}", config);
        Ok(ConfigLoad::Loaded(config))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let to_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(to_error)?;
        }

        let temp_path = path.with_extension("json.tmp");
        let written = File::create(&temp_path)
            .map_err(to_error)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, self)?;
                let file = writer.into_inner().map_err(|e| to_error(e.into_error()))?;
                file.sync_all().map_err(to_error)
            })
            .and_then(|()| fs::rename(&temp_path, path).map_err(to_error));

        if written.is_err() {
            if let Err(e) = fs::remove_file(&temp_path) {
                debug!("Failed to remove {:?}: {}", temp_path, e);
            }
        }
        written
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(folder) = lookup(MEDIA_FOLDER_ENV).filter(|v| !v.trim().is_empty()) {
            debug!("{} overrides the media folder: {}", MEDIA_FOLDER_ENV, folder);
            self.anki_media_folder_path = PathBuf::from(folder);
        }
        self
    }
}

/// Best guess at the media folder of the most recently used Anki profile.
pub fn discover_media_folder() -> PathBuf {
    let Some(base) = dirs::data_dir().map(|d| d.join(ANKI_BASE_FOLDER)) else {
        warn!("Could not determine the user data folder");
        return PathBuf::from(ANKI_DEFAULT_PROFILE).join(ANKI_MEDIA_FOLDER);
    };

    let profile = latest_profile(&base).unwrap_or_else(|| {
        debug!("No Anki profile found in {:?}", base);
        base.join(ANKI_DEFAULT_PROFILE)
    });

    profile.join(ANKI_MEDIA_FOLDER)
}

/// Most recently modified profile folder inside Anki's base folder.
fn latest_profile(base: &Path) -> Option<PathBuf> {
    fs::read_dir(base)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|entry| {
            let name = entry.file_name();
            !NON_PROFILE_FOLDERS.iter().any(|skip| name == *skip)
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, entry.path()))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    #[test]
    fn test_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let load = Configuration::load_or_create(&path).unwrap();

        assert!(matches!(load, ConfigLoad::Created(ref p) if p == &path));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"ankiMediaFolderPath\""));
        assert!(content.contains("\"temporaryAudiosFolderPath\": \"audios_to_rename\""));
        assert!(content.contains("\"undoSessionsFolderPath\": \"undo_sessions\""));

        match Configuration::load_or_create(&path).unwrap() {
            ConfigLoad::Loaded(config) => {
                assert_eq!(config.temporary_audios_folder_path, PathBuf::from("audios_to_rename"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_save_replaces_file_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Configuration {
            anki_media_folder_path: PathBuf::from("/anki/media"),
            ..Configuration::default()
        };

        Configuration::default().save(&path).unwrap();
        config.save(&path).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        let ConfigLoad::Loaded(loaded) = Configuration::load_or_create(&path).unwrap() else {
            panic!("expected an existing configuration");
        };
        assert_eq!(loaded.anki_media_folder_path, PathBuf::from("/anki/media"));
    }

    #[test]
    fn test_save_into_file_path_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let err = Configuration::default().save(&blocker.join("config.json")).unwrap_err();

        assert!(matches!(err, ConfigError::Write { .. }));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "ankiMediaFolderPath": "/anki/media", "somethingElse": 1 }"#,
        )
        .unwrap();

        let ConfigLoad::Loaded(config) = Configuration::load_or_create(&path).unwrap() else {
            panic!("expected an existing configuration");
        };

        assert_eq!(config.anki_media_folder_path, PathBuf::from("/anki/media"));
        assert_eq!(config.undo_sessions_folder_path, PathBuf::from("undo_sessions"));
        assert_eq!(config.database_path, PathBuf::from("database").join("history.db"));
    }

    #[test]
    fn test_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ broken").unwrap();

        let err = Configuration::load_or_create(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn test_env_override() {
        let config = Configuration::default().with_overrides_from(|key| {
            (key == MEDIA_FOLDER_ENV).then(|| "/override/media".to_string())
        });
        assert_eq!(config.anki_media_folder_path, PathBuf::from("/override/media"));

        let unchanged = Configuration::default().with_overrides_from(|_| Some("  ".to_string()));
        assert_eq!(
            unchanged.anki_media_folder_path,
            Configuration::default().anki_media_folder_path
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_latest_profile_skips_addons() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("User 1");
        let new = dir.path().join("Alice");
        let addons = dir.path().join("addons21");
        for folder in [&old, &new, &addons] {
            fs::create_dir(folder).unwrap();
        }

        let now = SystemTime::now();
        let set_modified = |path: &Path, at: SystemTime| {
            File::open(path).unwrap().set_modified(at).unwrap();
        };
        set_modified(&old, now - Duration::from_secs(3600));
        set_modified(&new, now - Duration::from_secs(60));
        set_modified(&addons, now);

        assert_eq!(latest_profile(dir.path()), Some(new));
    }

    #[test]
    fn test_latest_profile_missing_base() {
        let dir = tempdir().unwrap();
        assert_eq!(latest_profile(&dir.path().join("Anki2")), None);
    }
}
