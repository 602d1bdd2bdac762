//! The line-oriented snapshot format.
//!
//! Each line holds one JSON object:
//!
//! ```text
//! {"address": 1, "type": "str", "size": 20, "len": 3, "value": "abc", "refs": []}
//! ```
//!
//! Dumps are sometimes wrapped in a JSON array, so `[` and `]` lines are ignored
//! and a trailing comma after the object is stripped.

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::{
    error::LoadError,
    map::NodeMap,
    node::{NewNode, Node, Scalar},
    progress::{Phase, Progress, should_report},
};

/// One snapshot record, using the wire field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub address: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Scalar>,
    #[serde(default)]
    pub refs: Vec<u64>,
}

impl Record {
    /// Decodes a single record line. Framing is not stripped here.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl NodeMap {
    /// Inserts the node a record describes.
    pub fn insert_record(&mut self, record: Record) -> Node {
        self.insert(NewNode {
            id: record.address,
            kind: &record.kind,
            size: record.size,
            children: record.refs,
            value: record.value,
            length: record.len,
            name: record.name.as_deref(),
        })
    }

    /// Reproduces the record for `node`, reflecting any rewrites made since loading.
    pub fn to_record(&self, node: &Node) -> Record {
        Record {
            address: node.id(),
            kind: self.kind_name(node.kind()).to_owned(),
            size: node.size(),
            name: node.name().map(ToOwned::to_owned),
            len: node.length(),
            value: node.value().clone(),
            refs: node.children().to_vec(),
        }
    }
}

/// Strips array framing; `None` for lines that carry no record.
fn record_text(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line == "[" || line == "]" {
        return None;
    }
    Some(line.strip_suffix(',').unwrap_or(line))
}

/// Accumulates records into a map, keeping the first record seen for each id.
struct Loader<'p, P> {
    map: NodeMap,
    duplicates: usize,
    progress: &'p mut P,
}

impl<P: Progress> Loader<'_, P> {
    fn push(&mut self, number: usize, line: &str) -> Result<(), LoadError> {
        let Some(text) = record_text(line) else {
            return Ok(());
        };
        let record = Record::from_line(text).map_err(|source| LoadError::MalformedRecord { line: number, source })?;
        if self.map.contains(record.address) {
            self.duplicates += 1;
            return Ok(());
        }
        self.map.insert_record(record);
        let done = self.map.len();
        if should_report(done) {
            self.progress.on_advance(Phase::Load, done, 0);
        }
        Ok(())
    }

    fn finish(self) -> NodeMap {
        self.progress.on_finish(Phase::Load, self.map.len());
        tracing::debug!(nodes = self.map.len(), duplicates = self.duplicates, "loaded snapshot");
        self.map
    }
}

/// Builds a map from snapshot lines.
///
/// Line numbers in [`LoadError::MalformedRecord`] are 1-based.
///
/// # Example
///
/// ```
/// # use heapdump::{NoProgress, load_lines};
/// let lines = [
///     "[",
///     r#"{"address": 1, "type": "tuple", "size": 20, "len": 1, "refs": [2]},"#,
///     r#"{"address": 2, "type": "str", "size": 29, "len": 4, "value": "abcd", "refs": []}"#,
///     "]",
/// ];
/// let map = load_lines(lines, &mut NoProgress).unwrap();
/// assert_eq!(map.keys().collect::<Vec<_>>(), [1, 2]);
/// ```
pub fn load_lines<P: Progress>(
    lines: impl IntoIterator<Item = impl AsRef<str>>,
    progress: &mut P,
) -> Result<NodeMap, LoadError> {
    progress.on_start(Phase::Load, 0);
    let mut loader = Loader {
        map: NodeMap::new(),
        duplicates: 0,
        progress,
    };
    for (index, line) in lines.into_iter().enumerate() {
        loader.push(index + 1, line.as_ref())?;
    }
    Ok(loader.finish())
}

/// Builds a map from a reader over snapshot lines.
pub fn load_reader<P: Progress>(reader: impl BufRead, progress: &mut P) -> Result<NodeMap, LoadError> {
    progress.on_start(Phase::Load, 0);
    let mut loader = Loader {
        map: NodeMap::new(),
        duplicates: 0,
        progress,
    };
    for (index, line) in reader.lines().enumerate() {
        loader.push(index + 1, &line?)?;
    }
    Ok(loader.finish())
}
