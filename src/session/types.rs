use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const SESSION_FILE_PREFIX: &str = "rename_session_";
pub const SESSION_DATE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

static SESSION_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^rename_session_(.*)\.json$").unwrap());

/// Creation and modification times of a file before it was renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTimestamps {
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "ts_milliseconds")]
    pub last_modified_at: DateTime<Utc>,
}

impl FileTimestamps {
    /// Capture the timestamps of `path`, truncated to the milliseconds a
    /// session file stores. Filesystems without a birth time report the
    /// modification time as creation time.
    pub fn read(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified()?;
        let created = metadata.created().unwrap_or(modified);

        Ok(Self {
            created_at: to_millis(created),
            last_modified_at: to_millis(modified),
        })
    }

    /// Write the timestamps back onto `path`. Creation time is only settable
    /// on Windows and macOS.
    pub fn apply(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().write(true).open(path)?;
        let times = fs::FileTimes::new().set_modified(SystemTime::from(self.last_modified_at));

        #[cfg(windows)]
        let times = {
            use std::os::windows::fs::FileTimesExt;
            times.set_created(SystemTime::from(self.created_at))
        };

        #[cfg(target_os = "macos")]
        let times = {
            use std::os::macos::fs::FileTimesExt;
            times.set_created(SystemTime::from(self.created_at))
        };

        file.set_times(times)
    }
}

fn to_millis(time: SystemTime) -> DateTime<Utc> {
    let time = DateTime::<Utc>::from(time);
    DateTime::from_timestamp_millis(time.timestamp_millis()).unwrap_or(time)
}

/// One file's before/after names within a rename session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamedFileEntry {
    pub original_name: String,

    pub renamed_name: String,

    #[serde(rename = "fileAttributesInfo")]
    pub timestamps: FileTimestamps,
}

impl RenamedFileEntry {
    pub fn new(
        original_name: impl Into<String>,
        renamed_name: impl Into<String>,
        timestamps: FileTimestamps,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            renamed_name: renamed_name.into(),
            timestamps,
        }
    }
}

/// A completed rename batch, the unit of undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameSession {
    /// When the batch was renamed (UTC)
    pub date: DateTime<Utc>,

    /// Folder the files were renamed in
    #[serde(rename = "ankiMediaFolderPath")]
    pub target_folder: PathBuf,

    #[serde(rename = "files")]
    pub entries: Vec<RenamedFileEntry>,
}

impl RenameSession {
    pub fn new(
        date: DateTime<Utc>,
        target_folder: PathBuf,
        entries: Vec<RenamedFileEntry>,
    ) -> Result<Self, String> {
        let session = Self {
            date,
            target_folder,
            entries,
        };
        session.validate()?;
        Ok(session)
    }

    /// Check the session invariants: at least one entry, plain file names,
    /// and no name repeated on either side of the mapping.
    pub fn validate(&self) -> Result<(), String> {
        if self.entries.is_empty() {
            return Err("session has no files".to_string());
        }

        let mut originals = HashSet::new();
        let mut renamed = HashSet::new();

        for entry in &self.entries {
            for name in [&entry.original_name, &entry.renamed_name] {
                if !is_plain_file_name(name) {
                    return Err(format!("'{}' is not a plain file name", name));
                }
            }
            if entry.original_name == entry.renamed_name {
                return Err(format!("'{}' is mapped onto itself", entry.original_name));
            }
            if !originals.insert(entry.original_name.as_str()) {
                return Err(format!("original name '{}' appears twice", entry.original_name));
            }
            if !renamed.insert(entry.renamed_name.as_str()) {
                return Err(format!("renamed name '{}' appears twice", entry.renamed_name));
            }
        }

        Ok(())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Identifies a stored session by its file name and embedded UTC timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    file_name: String,
    timestamp: NaiveDateTime,
}

impl SessionId {
    /// Parse `rename_session_<yyyy-MM-dd_HH-mm-ss>.json`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let captures = SESSION_NAME_REGEX.captures(file_name)?;
        let timestamp =
            NaiveDateTime::parse_from_str(captures.get(1)?.as_str(), SESSION_DATE_FORMAT).ok()?;

        Some(Self {
            file_name: file_name.to_string(),
            timestamp,
        })
    }

    pub fn for_date(date: &DateTime<Utc>) -> Self {
        Self::for_timestamp(date.naive_utc())
    }

    fn for_timestamp(timestamp: NaiveDateTime) -> Self {
        let formatted = timestamp.format(SESSION_DATE_FORMAT).to_string();
        let file_name = format!("{}{}.json", SESSION_FILE_PREFIX, formatted);
        // Round-trip through the text form so sub-second precision is dropped
        let timestamp = NaiveDateTime::parse_from_str(&formatted, SESSION_DATE_FORMAT)
            .unwrap_or(timestamp);

        Self {
            file_name,
            timestamp,
        }
    }

    /// The id one second later, used when two sessions share a second.
    pub fn next_second(&self) -> Self {
        Self::for_timestamp(self.timestamp + Duration::seconds(1))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Ord for SessionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.file_name.cmp(&other.file_name))
    }
}

impl PartialOrd for SessionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}
