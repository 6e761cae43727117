//! Crash-safe record publication.
//!
//! A record is never visible under its final name until its bytes are on
//! disk:
//!
//! 1. Write to a uniquely named `.spool-XXXXXX.tmp` in the spool directory
//! 2. fsync the temp file
//! 3. Rename over `<key>` (replacing any previous record)
//! 4. fsync the directory so the rename survives power loss
//!
//! If any of steps 1-3 fails the temp file is removed when it is dropped, so a
//! failed publish leaves no partial record behind. Once the rename has
//! happened the record is visible, so a failed directory fsync is logged
//! rather than reported. Temp files orphaned by a crash are removed by
//! `maintenance::cleanup_interrupted_writes`.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::types::{StorageKey, TEMP_PREFIX, TEMP_SUFFIX};

/// Atomically writes `bytes` as the record `key` inside `dir`.
///
/// Returns the final record path.
pub fn publish(dir: &Path, key: &StorageKey, bytes: &[u8]) -> io::Result<PathBuf> {
    let final_path = dir.join(key.as_str());

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)?;
    temp.as_file_mut().write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(&final_path).map_err(|e| e.error)?;

    sync_dir_after_change(dir);
    Ok(final_path)
}

/// Syncs `dir` after an entry was renamed into or removed from it.
///
/// The change is already visible, so failure is logged rather than returned.
/// Returns whether the sync succeeded.
pub fn sync_dir_after_change(dir: &Path) -> bool {
    match sync_dir(dir) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Could not fsync spool directory");
            false
        }
    }
}

/// Syncs a directory so that created, renamed and deleted entries are
/// durable.
pub fn sync_dir(dir: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir)?;
    dir.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key(stem: &str) -> StorageKey {
        StorageKey::from_stem(stem.to_string())
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn publish_writes_bytes_under_key() {
        let dir = tempdir().unwrap();
        let path = publish(dir.path(), &key("web01_store_report_ab"), b"payload").unwrap();

        assert_eq!(path, dir.path().join("web01_store_report_ab.command"));
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");
        assert_eq!(entries(dir.path()), vec!["web01_store_report_ab.command"]);
    }

    #[test]
    fn publish_replaces_existing_record() {
        let dir = tempdir().unwrap();
        let k = key("web01_replace_facts");
        publish(dir.path(), &k, b"a much longer first version").unwrap();
        let path = publish(dir.path(), &k, b"second").unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"second");
        assert_eq!(entries(dir.path()), vec!["web01_replace_facts.command"]);
    }

    #[test]
    fn failed_publish_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let k = key("web01_replace_facts");
        // A directory at the final path makes the rename fail.
        std::fs::create_dir(dir.path().join(k.as_str())).unwrap();
        std::fs::write(dir.path().join(k.as_str()).join("occupant"), b"x").unwrap();

        assert!(publish(dir.path(), &k, b"payload").is_err());
        assert_eq!(entries(dir.path()), vec!["web01_replace_facts.command"]);
    }

    #[test]
    fn publish_fails_without_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(publish(&missing, &key("web01_replace_facts"), b"payload").is_err());
    }

    #[test]
    fn publish_handles_key_near_name_max() {
        let dir = tempdir().unwrap();
        // 252-byte key: a legal file name, but too long to carry a suffix.
        let k = key(&format!("{}_replace_facts", "a".repeat(230)));
        assert_eq!(k.as_str().len(), 252);

        let path = publish(dir.path(), &k, b"payload").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"payload");
        assert_eq!(entries(dir.path()), vec![k.as_str().to_string()]);
    }

    #[test]
    fn sync_dir_after_change_reports_failure_without_error() {
        let dir = tempdir().unwrap();
        assert!(sync_dir_after_change(dir.path()));
        assert!(!sync_dir_after_change(&dir.path().join("missing")));
    }

    #[test]
    fn sync_dir_fails_on_nonexistent() {
        assert!(sync_dir(Path::new("/nonexistent/path/that/does/not/exist")).is_err());
    }
}
