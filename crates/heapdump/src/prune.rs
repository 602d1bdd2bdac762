//! Removal of references that make everything reach everything.
//!
//! A module's namespace refers to other modules, which refer to theirs, and so on
//! around the global reference cycle. Functions point back at their module's
//! namespace, frames reference the whole running state, and type metadata links to
//! base classes and from there to every subclass. Left alone, every retained-size
//! and reachability query ends up covering the whole heap. Pruning cuts those links
//! and leaves a reference to the sentinel node (id 0) where something was elided.

use ahash::AHashSet;

use crate::{
    config::{PruneRules, resolve_kinds},
    map::NodeMap,
    node::NewNode,
    progress::{Phase, Progress, should_report},
};

/// Id of the sentinel node that stands in for elided references.
pub const SENTINEL_ID: u64 = 0;

/// What a pruning pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Nodes whose kind made them `noref` targets.
    pub noref_nodes: usize,
    /// Nodes whose children were rewritten.
    pub nodes_rewritten: usize,
    /// Whether the sentinel node had to be created.
    pub sentinel_inserted: bool,
}

/// Prunes expensive references using the default rules.
pub fn prune_expensive(map: &mut NodeMap, progress: &mut impl Progress) -> PruneReport {
    prune_expensive_with(map, &PruneRules::default(), progress)
}

/// Prunes expensive references in place.
///
/// * Callables lose the children at `callable_dropped_positions` (their namespace
///   backlink) and any `noref` children, and gain a sentinel reference.
/// * Sideways nodes lose every child that is itself a sideways node, plus any
///   `noref` children. They gain the sentinel only if a `noref` child was removed.
/// * Every other node that references a `noref` node loses all such references and
///   gains a sentinel reference. Nodes without such references are untouched.
///
/// The sentinel node is inserted if the map did not already have id 0. Parent data
/// is stale afterwards.
pub fn prune_expensive_with(map: &mut NodeMap, rules: &PruneRules, progress: &mut impl Progress) -> PruneReport {
    let noref_kinds = resolve_kinds(map, &rules.noref_kinds);
    let sideways_kinds = resolve_kinds(map, &rules.sideways_kinds);
    let callable_kinds = resolve_kinds(map, &rules.callable_kinds);
    let total = map.len();
    progress.on_start(Phase::Prune, total * 2);

    let mut noref: AHashSet<u64> = AHashSet::new();
    let mut sideways: AHashSet<u64> = AHashSet::new();
    let mut seen_sentinel = false;
    for (done, node) in map.values().enumerate() {
        if should_report(done) {
            progress.on_advance(Phase::Prune, done, total * 2);
        }
        let kind = node.kind();
        if noref_kinds.contains(&kind) {
            noref.insert(node.id());
        }
        if sideways_kinds.contains(&kind) {
            sideways.insert(node.id());
        }
        seen_sentinel |= node.id() == SENTINEL_ID;
    }

    let mut report = PruneReport {
        noref_nodes: noref.len(),
        ..PruneReport::default()
    };
    for (done, node) in map.handles().into_iter().enumerate() {
        if should_report(done) {
            progress.on_advance(Phase::Prune, total + done, total * 2);
        }
        let kind = node.kind();
        let rewritten: Option<Vec<u64>> = if callable_kinds.contains(&kind) {
            let mut children: Vec<u64> = node
                .children()
                .iter()
                .enumerate()
                .filter(|&(pos, child)| !rules.callable_dropped_positions.contains(&pos) && !noref.contains(child))
                .map(|(_, &child)| child)
                .collect();
            children.push(SENTINEL_ID);
            Some(children)
        } else if sideways_kinds.contains(&kind) {
            let children = node.children();
            let has_noref = children.iter().any(|child| noref.contains(child));
            (has_noref || children.iter().any(|child| sideways.contains(child))).then(|| {
                let mut kept: Vec<u64> = children
                    .iter()
                    .copied()
                    .filter(|child| !sideways.contains(child) && !noref.contains(child))
                    .collect();
                if has_noref {
                    kept.push(SENTINEL_ID);
                }
                kept
            })
        } else {
            let children = node.children();
            children.iter().any(|child| noref.contains(child)).then(|| {
                let mut kept: Vec<u64> = children.iter().copied().filter(|child| !noref.contains(child)).collect();
                kept.push(SENTINEL_ID);
                kept
            })
        };
        if let Some(children) = rewritten {
            map.set_children(&node, children);
            report.nodes_rewritten += 1;
        }
    }

    if !seen_sentinel {
        map.insert(NewNode::new(SENTINEL_ID, &rules.sentinel_kind, 0));
        report.sentinel_inserted = true;
    }

    tracing::debug!(
        noref = report.noref_nodes,
        rewritten = report.nodes_rewritten,
        sentinel_inserted = report.sentinel_inserted,
        "pruned expensive references"
    );
    progress.on_finish(Phase::Prune, total);
    report
}
