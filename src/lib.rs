//! Command Spool - a durable, disk-backed outbox for node-scoped commands.
//!
//! Producers build a [`Command`], which formats its payload into the wire
//! envelope, and hand it to a [`SpoolStore`]. A separate transmitter walks the
//! spool, delivers each command to the collector and dequeues it.
//!
//! This crate emits `tracing` events but never installs a subscriber.
//!
//! ```
//! use command_spool::{Command, CommandName, NodeId, SpoolConfig, SpoolStore};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let base = tempfile::tempdir()?;
//! let store = SpoolStore::new(SpoolConfig::new(base.path()));
//!
//! let node = NodeId::parse("web01.example.com")?;
//! let facts = Command::new(CommandName::replace_facts(), 5, node, &json!({"os": "linux"}))?;
//! store.enqueue(&facts)?;
//!
//! let mut pending = Vec::new();
//! store.for_each_enqueued(|cmd| pending.push(cmd))?;
//! for cmd in &pending {
//!     // deliver cmd.payload() to the collector, then:
//!     store.dequeue(cmd)?;
//! }
//! assert!(store.list_all()?.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod spool;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use command::{Command, CommandError};
pub use config::SpoolConfig;
pub use spool::{SpoolError, SpoolStore};
pub use types::{CommandName, NodeId, StorageKey};
