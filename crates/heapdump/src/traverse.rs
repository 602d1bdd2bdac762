//! Reachability: retained sizes and recursive reference walks.
//!
//! Retained size is computed per root with a fresh visited set on every call.
//! Shared sub-objects reachable from two roots must count fully towards both, and a
//! diamond or cycle must count once per root, so results are never reused across
//! roots. Computing it for every node is O(N·E):
//!
//! ```text
//!   A   _
//!  / \ / \
//! B   C  |
//!  \ /  /
//!   D--'
//! ```
//!
//! `D` is reachable from `A` through both `B` and `C`, and `C`/`D` form a cycle;
//! `retained_size(A)` counts `D` exactly once.

use ahash::AHashSet;

use crate::{
    map::NodeMap,
    node::{AsNodeId, Node},
    progress::{Phase, Progress, should_report},
};

/// An empty `excluding` argument.
pub const NO_EXCLUSIONS: [u64; 0] = [];

/// Total size of `root` and every node reachable from it, each counted once.
///
/// Nodes listed in `excluding` are neither counted nor walked through. Child ids
/// that are not in the map are skipped.
///
/// # Example
///
/// ```
/// # use heapdump::{NO_EXCLUSIONS, NewNode, NodeMap, retained_size};
/// let mut map = NodeMap::new();
/// map.insert(NewNode::new(1, "list", 40).children([2, 3]));
/// map.insert(NewNode::new(2, "str", 30));
/// let root = map.insert(NewNode::new(3, "list", 40).children([1, 2]));
/// assert_eq!(retained_size(&map, &root, NO_EXCLUSIONS), 110);
/// assert_eq!(retained_size(&map, &root, [2u64]), 80);
/// ```
pub fn retained_size(map: &NodeMap, root: &Node, excluding: impl IntoIterator<Item = impl AsNodeId>) -> u64 {
    let mut seen: AHashSet<u64> = excluding.into_iter().map(|id| id.node_id()).collect();
    seen.insert(root.id());
    let mut total = root.size();
    let mut pending: Vec<u64> = root.children().to_vec();

    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Some(node) = map.get(id) else {
            continue;
        };
        total += node.size();
        pending.extend(node.children().iter().filter(|&child| !seen.contains(child)));
    }
    total
}

/// Computes and stores the retained size of every node in the map.
pub fn compute_retained_sizes(map: &NodeMap, progress: &mut impl Progress) {
    let total = map.len();
    progress.on_start(Phase::RetainedSizes, total);
    for (done, node) in map.values().enumerate() {
        if should_report(done) {
            progress.on_advance(Phase::RetainedSizes, done, total);
        }
        let size = retained_size(map, node, NO_EXCLUSIONS);
        node.set_retained_size(Some(size));
    }
    progress.on_finish(Phase::RetainedSizes, total);
}

/// Lazily walks every node reachable from `root`.
///
/// Yields `root` first, then each reachable node exactly once, depth first with the
/// most recently discovered child next. Nodes in `excluding` are never yielded and
/// their children are not expanded; an excluded root yields nothing. `excluding`
/// is drained before the walk starts, so it may be another walk's output.
pub fn iter_reachable<'a>(
    map: &'a NodeMap,
    root: &Node,
    excluding: impl IntoIterator<Item = impl AsNodeId>,
) -> Reachable<'a> {
    Reachable {
        map,
        seen: excluding.into_iter().map(|id| id.node_id()).collect(),
        pending: vec![root.id()],
    }
}

/// Iterator returned by [`iter_reachable`].
#[derive(Debug)]
pub struct Reachable<'a> {
    map: &'a NodeMap,
    seen: AHashSet<u64>,
    pending: Vec<u64>,
}

impl Iterator for Reachable<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        while let Some(id) = self.pending.pop() {
            if !self.seen.insert(id) {
                continue;
            }
            let Some(node) = self.map.get(id) else {
                continue;
            };
            self.pending
                .extend(node.children().iter().filter(|&child| !self.seen.contains(child)));
            return Some(node);
        }
        None
    }
}
