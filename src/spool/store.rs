//! The spool directory and its steady-state operations.
//!
//! Producers call [`SpoolStore::enqueue`]; the transmitter walks the spool
//! with [`SpoolStore::for_each_enqueued`] and calls [`SpoolStore::dequeue`]
//! after a successful delivery.
//!
//! # Concurrency
//!
//! There is no locking. `is_queued` followed by `enqueue` or `dequeue` can
//! race with another process touching the same key. Singleton keys turn
//! concurrent enqueues into last-writer-wins; content-addressed keys make
//! duplicate enqueues of other kinds write identical bytes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::durable::{publish, sync_dir_after_change};
use crate::command::{Command, CommandError};
use crate::config::SpoolConfig;
use crate::types::StorageKey;

/// Errors that can occur during spool operations.
#[derive(Debug, Error)]
pub enum SpoolError {
    /// The spool directory could not be created.
    #[error("cannot create spool directory {}: {source}", path.display())]
    Directory { path: PathBuf, source: io::Error },

    /// Writing or removing a record failed.
    #[error("failed to write record {key}: {source}")]
    StorageWrite { key: StorageKey, source: io::Error },

    /// The record does not exist (never enqueued, or already dequeued).
    #[error("record not found: {0}")]
    StorageMissing(StorageKey),

    /// Reading a record failed.
    #[error("failed to read record {key}: {source}")]
    Read { key: StorageKey, source: io::Error },

    /// A record's bytes do not decode into a command.
    #[error("malformed record {key}: {source}")]
    MalformedRecord { key: StorageKey, source: CommandError },

    /// IO error while enumerating the spool directory.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for spool operations.
pub type Result<T> = std::result::Result<T, SpoolError>;

/// A spool rooted at one directory.
///
/// The directory is created on first use and cached for the life of the
/// store. Share one store by reference between producers and the consumer.
#[derive(Debug)]
pub struct SpoolStore {
    config: SpoolConfig,
    dir: OnceLock<PathBuf>,
}

impl SpoolStore {
    /// Creates a store. Touches nothing on disk until first use.
    pub fn new(config: SpoolConfig) -> Self {
        SpoolStore {
            config,
            dir: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &SpoolConfig {
        &self.config
    }

    /// Returns the spool directory, creating it (and parents) on first call.
    ///
    /// Safe to call from many threads at once; an existing directory is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns `SpoolError::Directory` if the directory cannot be created.
    pub fn resolve_directory(&self) -> Result<&Path> {
        if let Some(dir) = self.dir.get() {
            return Ok(dir.as_path());
        }

        let path = self.config.spool_dir();
        fs::create_dir_all(&path).map_err(|source| SpoolError::Directory {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Resolved spool directory");

        Ok(self.dir.get_or_init(|| path).as_path())
    }

    /// Writes `command` to the spool under its storage key, replacing any
    /// record already there.
    ///
    /// Returns the record path.
    ///
    /// # Errors
    ///
    /// Returns `SpoolError::StorageWrite` on any filesystem failure,
    /// including failure to create the spool directory; no partial record is
    /// left behind. Not retried. A failed directory fsync after the record is
    /// in place is logged, not returned.
    pub fn enqueue(&self, command: &Command) -> Result<PathBuf> {
        let key = command.storage_key();
        let dir = self.resolve_directory().map_err(|e| match e {
            SpoolError::Directory { source, .. } => SpoolError::StorageWrite {
                key: key.clone(),
                source,
            },
            other => other,
        })?;

        let path = publish(dir, key, &command.to_record_bytes()).map_err(|source| {
            SpoolError::StorageWrite {
                key: key.clone(),
                source,
            }
        })?;

        info!(node = %command.node_id(), key = %key, "Spooled command");
        Ok(path)
    }

    /// Removes `command`'s record.
    ///
    /// # Errors
    ///
    /// Returns `SpoolError::StorageMissing` if no record exists at the
    /// command's key, and `SpoolError::StorageWrite` if the record cannot be
    /// removed. Once the record is gone a failed directory fsync is logged,
    /// not returned.
    pub fn dequeue(&self, command: &Command) -> Result<()> {
        let dir = self.resolve_directory()?;
        let key = command.storage_key();

        match fs::remove_file(dir.join(key.as_str())) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SpoolError::StorageMissing(key.clone()));
            }
            Err(source) => {
                return Err(SpoolError::StorageWrite {
                    key: key.clone(),
                    source,
                });
            }
        }

        sync_dir_after_change(dir);

        debug!(node = %command.node_id(), key = %key, "Dequeued command");
        Ok(())
    }

    /// Returns whether a record currently exists at `command`'s key.
    ///
    /// Point-in-time only; see the module docs.
    pub fn is_queued(&self, command: &Command) -> Result<bool> {
        let dir = self.resolve_directory()?;
        Ok(dir.join(command.storage_key().as_str()).try_exists()?)
    }

    /// Lists the keys of every record in the spool, in directory order.
    ///
    /// In-flight temp files and anything not ending in `.command` are
    /// skipped.
    pub fn list_all(&self) -> Result<Vec<StorageKey>> {
        let dir = self.resolve_directory()?;
        let mut keys = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(key) = entry.file_name().to_str().and_then(StorageKey::from_file_name) {
                keys.push(key);
            }
        }

        Ok(keys)
    }

    /// Reads the record `key` back into a command.
    ///
    /// The command's payload is the stored envelope, byte for byte.
    ///
    /// # Errors
    ///
    /// Returns `SpoolError::StorageMissing` if the record is gone,
    /// `SpoolError::Read` for other read failures and
    /// `SpoolError::MalformedRecord` if the bytes do not decode.
    pub fn load(&self, key: &StorageKey) -> Result<Command> {
        let dir = self.resolve_directory()?;

        let bytes = match fs::read(dir.join(key.as_str())) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SpoolError::StorageMissing(key.clone()));
            }
            Err(source) => {
                return Err(SpoolError::Read {
                    key: key.clone(),
                    source,
                });
            }
        };

        let command =
            Command::from_record_bytes(&bytes).map_err(|source| SpoolError::MalformedRecord {
                key: key.clone(),
                source,
            })?;

        // Dequeue uses the recomputed key, so a renamed or edited record
        // would never be removed.
        if command.storage_key() != key {
            warn!(
                key = %key,
                expected = %command.storage_key(),
                "Spooled record is stored under an unexpected key"
            );
        }

        Ok(command)
    }

    /// Loads every record and hands it to `visitor`, in enumeration order.
    ///
    /// Returns the number of commands visited. Stops at the first error.
    pub fn for_each_enqueued<F>(&self, mut visitor: F) -> Result<usize>
    where
        F: FnMut(Command),
    {
        let keys = self.list_all()?;
        let mut visited = 0;

        for key in &keys {
            visitor(self.load(key)?);
            visited += 1;
        }

        Ok(visited)
    }
}
