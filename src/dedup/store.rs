use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use rusqlite::{params, Connection};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{folder_key, DedupError, DEFAULT_WAIT_LIMIT, SCHEMA};

type Initializer = Box<dyn FnOnce() -> Result<Connection, DedupError> + Send>;

enum InitState {
    Pending(Initializer),
    Initializing,
    Ready(Connection),
    Failed(String),
    Closed,
}

struct Shared {
    state: Mutex<InitState>,
    ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, InitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Membership store of (folder, name) pairs already processed.
///
/// The database is opened on a background thread; every operation waits for
/// it up to `wait_limit`.
pub struct DedupStore {
    shared: Arc<Shared>,
    wait_limit: Duration,
}

impl DedupStore {
    /// Open (or create) the database at `path`, starting initialization now.
    pub fn open(path: impl Into<PathBuf>, wait_limit: Duration) -> Result<Self, DedupError> {
        let path = path.into();
        let store = Self::with_initializer(wait_limit, move || open_database(&path));
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, DedupError> {
        let store = Self::with_initializer(DEFAULT_WAIT_LIMIT, || {
            let conn = Connection::open_in_memory()?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        });
        store.initialize()?;
        Ok(store)
    }

    /// Store whose connection comes from `init`. Nothing runs until
    /// [`initialize`](Self::initialize) or the first query.
    pub fn with_initializer<F>(wait_limit: Duration, init: F) -> Self
    where
        F: FnOnce() -> Result<Connection, DedupError> + Send + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(InitState::Pending(Box::new(init))),
                ready: Condvar::new(),
            }),
            wait_limit,
        }
    }

    /// Start the one-time initialization. Later calls do nothing.
    pub fn initialize(&self) -> Result<(), DedupError> {
        let mut state = self.shared.lock();

        let init = match std::mem::replace(&mut *state, InitState::Initializing) {
            InitState::Pending(init) => init,
            other => {
                *state = other;
                return Ok(());
            }
        };
        drop(state);

        debug!("Starting database initialization");
        let shared = Arc::clone(&self.shared);

        let spawned = thread::Builder::new()
            .name("dedup-store-init".to_string())
            .spawn(move || {
                let result = init();
                let mut state = shared.lock();

                // close() may have run in the meantime
                if matches!(*state, InitState::Initializing) {
                    *state = match result {
                        Ok(conn) => {
                            info!("Database ready");
                            InitState::Ready(conn)
                        }
                        Err(e) => {
                            warn!("Database initialization failed: {}", e);
                            InitState::Failed(e.to_string())
                        }
                    };
                }
                shared.ready.notify_all();
            });

        if let Err(e) = spawned {
            *self.shared.lock() = InitState::Failed(e.to_string());
            self.shared.ready.notify_all();
            return Err(DedupError::Io(e));
        }

        Ok(())
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, DedupError>,
    ) -> Result<T, DedupError> {
        self.initialize()?;

        let state = self.shared.lock();
        let (mut state, _) = self
            .shared
            .ready
            .wait_timeout_while(state, self.wait_limit, |s| {
                matches!(s, InitState::Initializing)
            })
            .unwrap_or_else(PoisonError::into_inner);

        match &mut *state {
            InitState::Ready(conn) => f(conn),
            InitState::Initializing => Err(DedupError::InitializationTimeout {
                waited: self.wait_limit,
            }),
            InitState::Failed(message) => Err(DedupError::InitializationFailed(message.clone())),
            InitState::Closed => Err(DedupError::Closed),
            InitState::Pending(_) => Err(DedupError::InitializationFailed(
                "initialization was not started".to_string(),
            )),
        }
    }

    /// The subset of `candidates` already recorded for `folder`.
    pub fn query(&self, folder: &Path, candidates: &[String]) -> Result<HashSet<String>, DedupError> {
        let key = folder_key(folder);

        self.with_connection(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT 1 FROM normalized_files WHERE folder_path = ?1 AND name = ?2",
            )?;

            let mut known = HashSet::new();
            for name in candidates {
                if stmt.exists(params![key, name])? {
                    known.insert(name.clone());
                }
            }

            debug!("{} of {} candidates already known", known.len(), candidates.len());
            Ok(known)
        })
    }

    /// Record `names` as processed in `folder`. Returns the rows written.
    pub fn insert_all(&self, folder: &Path, names: &[String]) -> Result<usize, DedupError> {
        if names.is_empty() {
            return Ok(0);
        }

        let key = folder_key(folder);

        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO normalized_files (id, folder_path, name) VALUES (?1, ?2, ?3)",
                )?;
                for name in names {
                    stmt.execute(params![Uuid::new_v4().to_string(), key, name])?;
                }
            }
            tx.commit()?;

            info!("Recorded {} processed files for {}", names.len(), key);
            Ok(names.len())
        })
    }

    /// Drop the connection. Later operations fail with `Closed`.
    pub fn close(&self) {
        let mut state = self.shared.lock();
        if !matches!(*state, InitState::Closed) {
            debug!("Closing database");
        }
        *state = InitState::Closed;
        self.shared.ready.notify_all();
    }
}

fn open_database(path: &Path) -> Result<Connection, DedupError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;

    debug!("Database schema ready at {:?}", path);
    Ok(conn)
}
