//! Newtype wrappers for command identity.
//!
//! Node ids and command names both end up inside filenames and inside the
//! newline-delimited record header, so they are validated once at the edge and
//! carried as distinct types afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Suffix shared by every published spool record.
pub const RECORD_SUFFIX: &str = ".command";

/// Prefix of in-flight files written before a record is published.
///
/// Fixed and short so the temp name stays within NAME_MAX for any key that
/// fits itself. The leading dot keeps it out of record enumeration.
pub const TEMP_PREFIX: &str = ".spool-";

/// Suffix of in-flight files written before a record is published.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Error returned when a node identifier cannot be used as a filename prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid node id {0:?}: must be non-empty, not start with '.', and contain no path separators, NUL or newlines")]
pub struct InvalidNodeId(pub String);

/// Error returned when a command name cannot be written as a header line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid command name {0:?}: must be non-empty and contain no newlines")]
pub struct InvalidCommandName(pub String);

/// The certname of the node a command concerns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Parses a node id, rejecting anything that could escape the spool
    /// directory or break the record header.
    ///
    /// A node id is rejected if it:
    /// - Is empty
    /// - Starts with a dot (hidden file, `.` or `..`)
    /// - Contains `/`, `\`, NUL, `\n` or `\r`
    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidNodeId> {
        let s = s.into();
        let unsafe_char = |c: char| matches!(c, '/' | '\\' | '\0' | '\n' | '\r');
        if s.is_empty() || s.starts_with('.') || s.contains(unsafe_char) {
            return Err(InvalidNodeId(s));
        }
        Ok(NodeId(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for NodeId {
    type Error = InvalidNodeId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        NodeId::parse(s)
    }
}

impl TryFrom<&str> for NodeId {
    type Error = InvalidNodeId;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        NodeId::parse(s)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// The kind of a command, e.g. `"replace facts"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommandName(String);

impl CommandName {
    /// Full catalog replacement for a node.
    pub const REPLACE_CATALOG: &'static str = "replace catalog";
    /// Full fact set replacement for a node.
    pub const REPLACE_FACTS: &'static str = "replace facts";
    /// A run report.
    pub const STORE_REPORT: &'static str = "store report";
    /// Marks a node as retired.
    pub const DEACTIVATE_NODE: &'static str = "deactivate node";

    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidCommandName> {
        let s = s.into();
        if s.is_empty() || s.contains(['\n', '\r']) {
            return Err(InvalidCommandName(s));
        }
        Ok(CommandName(s))
    }

    pub fn replace_catalog() -> Self {
        CommandName(Self::REPLACE_CATALOG.to_string())
    }

    pub fn replace_facts() -> Self {
        CommandName(Self::REPLACE_FACTS.to_string())
    }

    pub fn store_report() -> Self {
        CommandName(Self::STORE_REPORT.to_string())
    }

    pub fn deactivate_node() -> Self {
        CommandName(Self::DEACTIVATE_NODE.to_string())
    }

    /// Returns true for kinds where only the newest record per node matters.
    ///
    /// A newer catalog or fact set fully supersedes the previous one, so the
    /// spool keeps at most one of each per node.
    pub fn is_singleton(&self) -> bool {
        self.0 == Self::REPLACE_CATALOG || self.0 == Self::REPLACE_FACTS
    }

    /// Returns the name with every character outside `[A-Za-z0-9_]` replaced
    /// by `_`, suitable for a filename.
    pub fn sanitized(&self) -> String {
        self.0
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CommandName {
    type Error = InvalidCommandName;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        CommandName::parse(s)
    }
}

impl TryFrom<&str> for CommandName {
    type Error = InvalidCommandName;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        CommandName::parse(s)
    }
}

impl From<CommandName> for String {
    fn from(name: CommandName) -> Self {
        name.0
    }
}

/// The filename of a spool record, always ending in [`RECORD_SUFFIX`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    /// Wraps a filename read back from the spool directory.
    ///
    /// Returns `None` unless the name ends in [`RECORD_SUFFIX`] and has a
    /// non-empty stem.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(RECORD_SUFFIX)?;
        if stem.is_empty() || stem.starts_with('.') {
            return None;
        }
        Some(StorageKey(name.to_string()))
    }

    pub(crate) fn from_stem(stem: String) -> Self {
        StorageKey(format!("{stem}{RECORD_SUFFIX}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
