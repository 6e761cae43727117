//! Core identity types for spooled commands.

pub mod ids;

pub use ids::{
    CommandName, InvalidCommandName, InvalidNodeId, NodeId, RECORD_SUFFIX, StorageKey,
    TEMP_PREFIX, TEMP_SUFFIX,
};
