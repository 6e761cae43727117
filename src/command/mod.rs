//! Commands: named, versioned, node-scoped units of work awaiting delivery.
//!
//! A [`Command`] always holds its payload as the formatted envelope string
//! (see [`codec`]). The storage key is derived once, at construction, from
//! the name, node id and that string (see [`naming`]).

pub mod codec;
pub mod naming;

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{CommandName, NodeId, StorageKey};

pub use codec::{CodecError, RecordHeader};

/// Errors that can occur while constructing a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// An unformatted payload was supplied that is not already a string.
    #[error("payload must be a serialized envelope string, found {found}")]
    InvalidPayload { found: &'static str },

    /// Versions start at 1.
    #[error("command version must be positive")]
    InvalidVersion,

    /// The payload could not be formatted into an envelope.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Result type for command construction.
pub type Result<T> = std::result::Result<T, CommandError>;

/// A command ready to be spooled.
///
/// Fields are private and immutable after construction.
#[derive(Clone)]
pub struct Command {
    name: CommandName,
    version: u32,
    node_id: NodeId,
    payload: String,
    storage_key: StorageKey,
}

impl Command {
    /// Builds a command, formatting `payload` into its envelope.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidVersion` for version 0 and
    /// `CommandError::Codec` if the payload is not representable as JSON.
    pub fn new<T: Serialize + ?Sized>(
        name: CommandName,
        version: u32,
        node_id: NodeId,
        payload: &T,
    ) -> Result<Self> {
        check_version(version)?;
        let envelope = codec::format(&name, version, payload)?;
        Ok(Self::assemble(name, version, node_id, envelope))
    }

    /// Builds a command from a payload that is already a formatted envelope,
    /// without wrapping it again.
    ///
    /// Used when reconstructing a command from spooled bytes.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidPayload` if `payload` is not a JSON
    /// string, and `CommandError::InvalidVersion` for version 0.
    pub fn unformatted(
        name: CommandName,
        version: u32,
        node_id: NodeId,
        payload: Value,
    ) -> Result<Self> {
        check_version(version)?;
        let envelope = match payload {
            Value::String(s) => s,
            other => {
                return Err(CommandError::InvalidPayload {
                    found: json_kind(&other),
                });
            }
        };
        Ok(Self::assemble(name, version, node_id, envelope))
    }

    fn assemble(name: CommandName, version: u32, node_id: NodeId, payload: String) -> Self {
        let storage_key = naming::storage_key(&name, &node_id, &payload);
        Command {
            name,
            version,
            node_id,
            payload,
            storage_key,
        }
    }

    pub fn name(&self) -> &CommandName {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// The serialized envelope.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The filename this command is spooled under.
    pub fn storage_key(&self) -> &StorageKey {
        &self.storage_key
    }

    pub fn is_singleton(&self) -> bool {
        self.name.is_singleton()
    }

    /// Frames the command as spool record bytes.
    pub fn to_record_bytes(&self) -> Vec<u8> {
        codec::encode_record(&self.name, self.version, &self.node_id, &self.payload)
    }

    /// Reconstructs a command from spool record bytes.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Codec` if the header is malformed.
    pub fn from_record_bytes(bytes: &[u8]) -> Result<Self> {
        let RecordHeader {
            name,
            version,
            node_id,
            envelope,
        } = codec::parse_header(bytes)?;
        Self::unformatted(name, version, node_id, Value::String(envelope))
    }
}

// The storage key is derived from the other fields, so it takes no part in
// equality.
impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.node_id == other.node_id
            && self.payload == other.payload
    }
}

impl Eq for Command {}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name.as_str())
            .field("version", &self.version)
            .field("node_id", &self.node_id.as_str())
            .field("storage_key", &self.storage_key.as_str())
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

fn check_version(version: u32) -> Result<()> {
    if version == 0 {
        return Err(CommandError::InvalidVersion);
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
