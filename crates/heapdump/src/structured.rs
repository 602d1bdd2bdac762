//! Reading a node's children back as the value they represent.

use crate::{
    config::{CollapseRules, resolve_kinds},
    kind::KnownKind,
    map::NodeMap,
    node::{Node, Scalar},
};

/// A child resolved to a literal where the snapshot recorded one.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Scalar(Scalar),
    Bool(bool),
    None,
    /// No literal was recorded; the node itself.
    Node(Node),
}

impl Resolved {
    /// Resolves a child node: decoded booleans, `None` for the null kind, the
    /// recorded value when there is one, and the node itself otherwise.
    pub fn from_node(node: Node) -> Self {
        if node.kind() == KnownKind::Bool {
            let is_true = node.value().as_ref().and_then(Scalar::as_str) == Some("True");
            return Self::Bool(is_true);
        }
        if let Some(value) = node.value().clone() {
            return Self::Scalar(value);
        }
        if node.kind() == KnownKind::NoneType {
            return Self::None;
        }
        Self::Node(node)
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }
}

impl From<i64> for Resolved {
    fn from(v: i64) -> Self {
        Self::Scalar(Scalar::Int(v))
    }
}

impl From<&str> for Resolved {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::from(s))
    }
}

/// Interprets `node`'s children as alternating key/value pairs.
///
/// Nodes that are not natural mappings (collapsed instances) end with a carried
/// type reference, which is dropped. Pairs whose key or value is not in the map
/// are skipped, as is an odd trailing child.
pub fn as_mapping(map: &NodeMap, node: &Node) -> Vec<(Resolved, Resolved)> {
    as_mapping_with(map, node, &CollapseRules::default())
}

/// [`as_mapping`] with custom natural mapping kinds.
pub fn as_mapping_with(map: &NodeMap, node: &Node, rules: &CollapseRules) -> Vec<(Resolved, Resolved)> {
    let mapping_kinds = resolve_kinds(map, &rules.mapping_kinds);
    let children = node.children();
    let mut pairs: &[u64] = &children;
    if !mapping_kinds.contains(&node.kind())
        && let Some((_, rest)) = pairs.split_last()
    {
        pairs = rest;
    }
    pairs
        .chunks_exact(2)
        .filter_map(|pair| {
            let key = map.get(pair[0])?;
            let value = map.get(pair[1])?;
            Some((Resolved::from_node(key), Resolved::from_node(value)))
        })
        .collect()
}

/// Interprets `node`'s children as a sequence, skipping ids not in the map.
pub fn as_sequence(map: &NodeMap, node: &Node) -> Vec<Resolved> {
    node.children()
        .iter()
        .filter_map(|&id| map.get(id))
        .map(Resolved::from_node)
        .collect()
}
