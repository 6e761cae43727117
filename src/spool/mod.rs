//! Durable on-disk outbox for commands.
//!
//! Each command is one file in the spool directory:
//!
//! ```text
//! <node>_<name>.command            - singleton kinds (newest wins)
//! <node>_<name>_<sha1>.command     - everything else (content-addressed)
//! .spool-<random>.tmp              - in-flight write, never read
//! ```
//!
//! # Crash Safety
//!
//! - Records are written to a temp file, fsynced, renamed into place, and the
//!   directory is fsynced
//! - A crash mid-write leaves only a `.tmp` file, which enumeration ignores
//!   and [`cleanup_interrupted_writes`] removes
//!
//! Steady-state traffic goes through [`SpoolStore`]; bulk operations live in
//! [`maintenance`].

pub mod durable;
pub mod maintenance;
pub mod store;

pub use maintenance::{cleanup_interrupted_writes, clear_all, count_queued};
pub use store::{Result, SpoolError, SpoolStore};
