//! Administrative operations on a spool.
//!
//! These are kept apart from [`SpoolStore`](super::SpoolStore) because they
//! must not run alongside live producers and consumers: clearing races with
//! enqueues (records can be lost), and temp-file cleanup would delete the
//! in-flight file of an enqueue that is still writing.

use std::fs;
use std::io;

use tracing::{debug, info, warn};

use super::durable::sync_dir;
use super::store::{Result, SpoolError, SpoolStore};
use crate::types::{TEMP_PREFIX, TEMP_SUFFIX};

/// Deletes every record in the spool.
///
/// Returns the number of records removed. Records that disappear while
/// clearing (dequeued by someone else) are skipped.
///
/// # Errors
///
/// Returns `SpoolError::StorageWrite` if a record cannot be removed.
pub fn clear_all(store: &SpoolStore) -> Result<usize> {
    let dir = store.resolve_directory()?;
    let mut removed = 0;

    for key in store.list_all()? {
        match fs::remove_file(dir.join(key.as_str())) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(SpoolError::StorageWrite { key, source }),
        }
    }

    if removed > 0 {
        sync_dir(dir)?;
    }

    info!(removed, path = %dir.display(), "Cleared spool");
    Ok(removed)
}

/// Removes temp files orphaned by a crash in the middle of an enqueue.
///
/// Must only be called at startup, before any producer is running.
/// Returns the number of files removed.
pub fn cleanup_interrupted_writes(store: &SpoolStore) -> Result<usize> {
    let dir = store.resolve_directory()?;
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };

        if is_orphaned_temp(name) && entry.file_type()?.is_file() {
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!(file = name, "Removed interrupted spool write");
                    removed += 1;
                }
                Err(e) => {
                    warn!(file = name, error = %e, "Could not remove interrupted spool write");
                }
            }
        }
    }

    if removed > 0 {
        sync_dir(dir)?;
    }

    Ok(removed)
}

/// Returns the number of records in the spool without loading them.
pub fn count_queued(store: &SpoolStore) -> Result<usize> {
    Ok(store.list_all()?.len())
}

/// Temp files are named `.spool-<random>.tmp`.
fn is_orphaned_temp(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}
