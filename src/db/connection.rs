use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::errors::HunterError;
use tracing::{debug, info, warn};

/// How long a writer waits on a locked database before the write fails.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

thread_local! {
    // One connection per (thread, database file). Never handed to another thread.
    static CONNECTIONS: RefCell<HashMap<PathBuf, Connection>> = RefCell::new(HashMap::new());
}

/// Handle to the durable target/finding store.
///
/// The handle itself holds no connection and is cheap to clone into workers.
/// Every operation runs on a connection owned by the calling thread, opened
/// lazily on first use in WAL mode, so readers are not blocked by a writer.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Store {
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, HunterError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self { path, busy_timeout };
        store.with_connection(|conn| {
            conn.execute_batch(super::schema::CREATE_TABLES)
                .map_err(|e| HunterError::Store(format!("Failed to create tables: {}", e)))
        })?;
        info!(path = %store.path.display(), "Store initialized (WAL mode)");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, HunterError> {
        let conn = Connection::open(&self.path)
            .map_err(|e| HunterError::Store(format!("Failed to open database: {}", e)))?;

        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| HunterError::Store(format!("Failed to set busy timeout: {}", e)))?;

        let mode: String = conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| HunterError::Store(format!("Failed to enable WAL: {}", e)))?;
        if !mode.eq_ignore_ascii_case("wal") {
            warn!(mode = %mode, "Database did not switch to WAL mode");
        }
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| HunterError::Store(format!("Failed to set pragmas: {}", e)))?;

        debug!(path = %self.path.display(), thread = ?std::thread::current().id(), "Opened store connection");
        Ok(conn)
    }

    /// Run `f` on this thread's connection. `f` must not call back into the
    /// store.
    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, HunterError>,
    ) -> Result<T, HunterError> {
        CONNECTIONS.with(|cell| {
            let mut conns = cell.borrow_mut();
            let conn = match conns.entry(self.path.clone()) {
                Entry::Occupied(e) => {
                    // Cached connections may come from a handle with another timeout.
                    let conn = e.into_mut();
                    conn.busy_timeout(self.busy_timeout)
                        .map_err(|err| HunterError::Store(format!("Failed to set busy timeout: {}", err)))?;
                    conn
                }
                Entry::Vacant(e) => e.insert(self.connect()?),
            };
            f(conn)
        })
    }

    /// Force the write-ahead log into the main database file.
    pub fn checkpoint(&self) -> Result<(), HunterError> {
        let (busy, log_frames, checkpointed) = self.with_connection(|conn| {
            conn.query_row("PRAGMA wal_checkpoint(FULL)", [], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
            })
            .map_err(|e| HunterError::Store(format!("Checkpoint failed: {}", e)))
        })?;
        if busy != 0 {
            warn!(log_frames, checkpointed, "Checkpoint could not complete, readers still active");
        } else {
            info!(log_frames, checkpointed, "Store checkpointed");
        }
        Ok(())
    }

    /// Run a store operation on the blocking pool, so the calling task never
    /// holds a runtime worker while SQLite waits on a lock.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, HunterError>
    where
        T: Send + 'static,
        F: FnOnce(&Store) -> Result<T, HunterError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| HunterError::Internal(format!("Store task failed: {}", e)))?
    }
}
