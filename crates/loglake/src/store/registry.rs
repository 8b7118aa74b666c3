//! Process-wide pool of writers, one per database path.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, RwLock};

use tracing::{info, warn};

use crate::store::error::StoreError;
use crate::store::writer::Writer;

/// Keyed pool guaranteeing at most one live writer per database path.
///
/// Lookups take the read lock; creation re-checks under the write lock so
/// that concurrent first access still opens a single connection.
pub struct ConnectionRegistry {
    writers: RwLock<HashMap<PathBuf, Arc<Writer>>>,
}

impl ConnectionRegistry {
    pub fn new() -> ConnectionRegistry {
        ConnectionRegistry {
            writers: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the writer for `path`, opening it on first access.
    ///
    /// Missing parent directories are created. On failure nothing is stored,
    /// so a later call retries from scratch.
    pub fn get_or_create<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Writer>, StoreError> {
        let path = path.as_ref();
        {
            let writers = self.writers.read().expect("connection registry poisoned");
            if let Some(writer) = writers.get(path) {
                return Ok(Arc::clone(writer));
            }
        }

        let mut writers = self.writers.write().expect("connection registry poisoned");
        if let Some(writer) = writers.get(path) {
            return Ok(Arc::clone(writer));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let writer = Arc::new(Writer::open_path(path)?);
        info!(path = %path.display(), "opened store");
        writers.insert(path.to_path_buf(), Arc::clone(&writer));
        Ok(writer)
    }

    /// Closes and removes the writer for `path`, if present.
    ///
    /// Callers must not hold a writer reference across this call; a still-
    /// shared connection closes when its last reference drops.
    pub fn close<P: AsRef<Path>>(&self, path: P) {
        let mut writers = self.writers.write().expect("connection registry poisoned");
        if let Some(writer) = writers.remove(path.as_ref()) {
            close_writer(path.as_ref(), writer);
        }
    }

    /// Closes every writer and empties the pool.
    pub fn close_all(&self) {
        let mut writers = self.writers.write().expect("connection registry poisoned");
        for (path, writer) in writers.drain() {
            close_writer(&path, writer);
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> ConnectionRegistry {
        ConnectionRegistry::new()
    }
}

fn close_writer(path: &Path, writer: Arc<Writer>) {
    match Arc::try_unwrap(writer) {
        Ok(writer) => {
            if let Err(error) = writer.close() {
                warn!(path = %path.display(), %error, "failed to close store");
            }
        }
        Err(_) => {
            warn!(path = %path.display(), "store still referenced, closing on last drop");
        }
    }
}

static REGISTRY: LazyLock<ConnectionRegistry> = LazyLock::new(ConnectionRegistry::new);

/// The process-wide registry.
pub fn registry() -> &'static ConnectionRegistry {
    &REGISTRY
}
