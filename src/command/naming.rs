//! Mapping from command identity to spool filename.
//!
//! # Key Formats
//!
//! - Singleton kinds (`replace catalog`, `replace facts`):
//!   `<node>_<sanitized name>.command`
//! - Everything else: `<node>_<sanitized name>_<sha1(payload)>.command`
//!
//! Singleton keys make a newer record for the same node overwrite the older
//! one, so a node never has more than one outstanding catalog or fact set.
//! Other kinds are content-addressed: distinct payloads never share a key,
//! and re-enqueueing an identical payload lands on the same file.

use sha1::{Digest, Sha1};

use crate::types::{CommandName, NodeId, StorageKey};

/// Computes the storage key for a command.
///
/// `payload` is the serialized envelope string as it will be written to disk.
pub fn storage_key(name: &CommandName, node_id: &NodeId, payload: &str) -> StorageKey {
    let sanitized = name.sanitized();
    let stem = if name.is_singleton() {
        format!("{}_{}", node_id.as_str(), sanitized)
    } else {
        format!("{}_{}_{}", node_id.as_str(), sanitized, payload_digest(payload))
    };
    StorageKey::from_stem(stem)
}

/// Lowercase hex SHA-1 of the serialized payload.
pub fn payload_digest(payload: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}
