//! Envelope formatting and spool record framing.
//!
//! The envelope is the JSON message the collector receives:
//!
//! ```text
//! {"command": "<name>", "version": <int>, "payload": <original value>}
//! ```
//!
//! A spool record prefixes the envelope with three header lines:
//!
//! ```text
//! <name>\n
//! <version>\n
//! <node id>\n
//! <envelope bytes, no trailing framing>
//! ```
//!
//! [`parse_header`] is the exact inverse of [`encode_record`]; the envelope is
//! passed through byte for byte and never re-serialized.

use serde::Serialize;
use thiserror::Error;

use crate::types::{CommandName, NodeId};

/// Errors produced while formatting envelopes or parsing records.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload could not be represented as JSON.
    #[error("payload is not serializable: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The record bytes do not have the expected header layout.
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },
}

impl CodecError {
    fn malformed(reason: impl Into<String>) -> Self {
        CodecError::MalformedRecord {
            reason: reason.into(),
        }
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Serialize)]
struct Envelope<'a, T: ?Sized> {
    command: &'a str,
    version: u32,
    payload: &'a T,
}

/// Serializes `payload` into the canonical envelope string.
///
/// Key order inside `payload` follows its `Serialize` impl. The output is
/// passed through [`sanitize_utf8`] before being returned.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if `payload` cannot be represented as
/// JSON (for example a map with non-string keys, or a `Serialize` impl that
/// fails).
pub fn format<T: Serialize + ?Sized>(
    name: &CommandName,
    version: u32,
    payload: &T,
) -> Result<String> {
    let bytes = serde_json::to_vec(&Envelope {
        command: name.as_str(),
        version,
        payload,
    })?;
    Ok(sanitize_utf8(bytes))
}

/// Converts bytes to a `String`, replacing every maximal invalid UTF-8
/// sequence with U+FFFD.
///
/// Valid input is returned without copying.
pub fn sanitize_utf8(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// The fields recovered from a spool record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub name: CommandName,
    pub version: u32,
    pub node_id: NodeId,
    /// Everything after the third header line, verbatim.
    pub envelope: String,
}

/// Frames a record: three header lines followed by the envelope.
pub fn encode_record(
    name: &CommandName,
    version: u32,
    node_id: &NodeId,
    envelope: &str,
) -> Vec<u8> {
    let mut buf =
        Vec::with_capacity(name.as_str().len() + node_id.as_str().len() + envelope.len() + 16);
    buf.extend_from_slice(name.as_str().as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(version.to_string().as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(node_id.as_str().as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(envelope.as_bytes());
    buf
}

/// Splits raw record bytes into header fields and the envelope tail.
///
/// # Errors
///
/// Returns `CodecError::MalformedRecord` if fewer than three header lines are
/// present, the version line is not all ASCII digits, a header field fails
/// validation, or any segment is not valid UTF-8.
pub fn parse_header(bytes: &[u8]) -> Result<RecordHeader> {
    let mut rest = bytes;

    let name = next_line(&mut rest, "name")?;
    let version = next_line(&mut rest, "version")?;
    let node_id = next_line(&mut rest, "node id")?;

    let name = CommandName::parse(name).map_err(|e| CodecError::malformed(e.to_string()))?;
    // `u32::from_str` alone would also take a leading `+`.
    let version = Some(version)
        .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| CodecError::malformed(format!("version line {version:?} is not an integer")))?;
    let node_id = NodeId::parse(node_id).map_err(|e| CodecError::malformed(e.to_string()))?;
    let envelope = std::str::from_utf8(rest)
        .map_err(|e| CodecError::malformed(format!("envelope is not valid UTF-8: {e}")))?
        .to_string();

    Ok(RecordHeader {
        name,
        version,
        node_id,
        envelope,
    })
}

/// Consumes one `\n`-terminated line from the front of `rest`.
fn next_line<'a>(rest: &mut &'a [u8], field: &str) -> Result<&'a str> {
    let end = rest
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| CodecError::malformed(format!("missing {field} line")))?;
    let line = std::str::from_utf8(&rest[..end])
        .map_err(|_| CodecError::malformed(format!("{field} line is not valid UTF-8")))?;
    *rest = &rest[end + 1..];
    Ok(line)
}
