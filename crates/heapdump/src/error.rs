//! Error types surfaced by the map and the snapshot loader.
//!
//! The analysis passes themselves never fail: dangling references are skipped and
//! rejected collapse candidates are simply left alone.

use thiserror::Error;

/// Lookup or removal of an id that is not in the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no node with id {0}")]
pub struct NotFound(pub u64);

/// Error raised while turning snapshot lines into nodes.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A line could not be decoded as a record. `line` is 1-based.
    #[error("malformed record on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
}

/// Error raised when an analysis configuration cannot be decoded.
#[derive(Debug, Error)]
#[error("invalid analysis configuration: {0}")]
pub struct ConfigError(#[from] pub serde_json::Error);
