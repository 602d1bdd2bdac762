//! Rules that drive pruning and collapsing.
//!
//! The defaults describe a CPython heap dump. Snapshots from other runtimes (or
//! dumps of applications with their own noisy caches) can swap in different kind
//! names, either in code or from a JSON document:
//!
//! ```
//! # use heapdump::AnalysisConfig;
//! let config = AnalysisConfig::from_json(r#"{"prune": {"sideways_kinds": ["_LRUNode", "_Link"]}}"#).unwrap();
//! assert_eq!(config.prune.sideways_kinds, ["_LRUNode", "_Link"]);
//! assert_eq!(config.prune.noref_kinds, ["module", "frame", "type"]);
//! ```

use crate::{
    error::ConfigError,
    kind::{KindId, KnownKind},
    map::NodeMap,
};

/// Configuration for every rule-driven pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub prune: PruneRules,
    pub collapse: CollapseRules,
}

impl AnalysisConfig {
    /// Decodes a configuration; omitted fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Which references [`prune_expensive_with`](crate::prune_expensive_with) severs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PruneRules {
    /// Kinds that fan out into most of the graph (module namespaces, frames, type
    /// metadata). References to them are replaced by the sentinel.
    pub noref_kinds: Vec<String>,
    /// Kinds whose references to each other are lateral cache links.
    pub sideways_kinds: Vec<String>,
    /// Kinds with a fixed-position backlink to their own namespace.
    pub callable_kinds: Vec<String>,
    /// Positions in a callable's children that hold the namespace backlink.
    pub callable_dropped_positions: Vec<usize>,
    /// Kind given to the sentinel node when pruning has to create it.
    pub sentinel_kind: String,
}

impl Default for PruneRules {
    fn default() -> Self {
        Self {
            noref_kinds: kind_names(&[KnownKind::Module, KnownKind::Frame, KnownKind::Type]),
            sideways_kinds: kind_names(&[KnownKind::LruNode]),
            callable_kinds: kind_names(&[KnownKind::Function]),
            callable_dropped_positions: vec![1],
            sentinel_kind: KnownKind::ExReference.as_str().to_owned(),
        }
    }
}

/// Which shapes [`collapse_with`](crate::collapse_with) folds together.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CollapseRules {
    /// Kinds that never own a separate attribute table.
    pub primitive_kinds: Vec<String>,
    /// Kinds whose only child may be their namespace table (modules).
    pub namespace_kinds: Vec<String>,
    /// Kind of the attribute table (`__dict__`).
    pub attribute_table_kind: String,
    /// Kind of type metadata whose name matches its instances' kind.
    pub type_kind: String,
    /// Kind tag shared by all legacy (old-style) instances.
    pub instance_kind: String,
    /// Kind of legacy class metadata.
    pub class_kind: String,
    /// Kinds whose children are naturally key/value pairs with no trailing type
    /// reference; used by [`as_mapping`](crate::as_mapping).
    pub mapping_kinds: Vec<String>,
}

impl Default for CollapseRules {
    fn default() -> Self {
        Self {
            primitive_kinds: kind_names(&[
                KnownKind::Str,
                KnownKind::Dict,
                KnownKind::Tuple,
                KnownKind::List,
                KnownKind::Type,
                KnownKind::Function,
                KnownKind::WrapperDescriptor,
                KnownKind::Code,
                KnownKind::ClassObj,
                KnownKind::Int,
                KnownKind::Weakref,
            ]),
            namespace_kinds: kind_names(&[KnownKind::Module]),
            attribute_table_kind: KnownKind::Dict.as_str().to_owned(),
            type_kind: KnownKind::Type.as_str().to_owned(),
            instance_kind: KnownKind::Instance.as_str().to_owned(),
            class_kind: KnownKind::ClassObj.as_str().to_owned(),
            mapping_kinds: kind_names(&[KnownKind::Dict, KnownKind::Module]),
        }
    }
}

fn kind_names(kinds: &[KnownKind]) -> Vec<String> {
    kinds.iter().map(|kind| kind.as_str().to_owned()).collect()
}

/// Resolves kind names to ids. Names the map has never interned cannot match any
/// node and are dropped.
pub(crate) fn resolve_kinds(map: &NodeMap, names: &[String]) -> ahash::AHashSet<KindId> {
    names.iter().filter_map(|name| map.kinds().get(name)).collect()
}
