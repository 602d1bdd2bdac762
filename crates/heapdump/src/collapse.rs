//! Folding attribute tables back into the objects that own them.
//!
//! An instance without `__slots__` keeps its attributes in a separate `__dict__`
//! node, so the instance itself only points at its dict and its type. That extra
//! hop hides which instance holds what. Collapsing moves the dict's children and
//! size into the instance and deletes the dict.

use crate::{
    config::{CollapseRules, resolve_kinds},
    kind::KindId,
    map::NodeMap,
    node::Node,
    parents::compute_parents,
    progress::{Phase, Progress, should_report},
};

/// Collapses attribute tables using the default rules.
pub fn collapse(map: &mut NodeMap, progress: &mut impl Progress) -> usize {
    collapse_with(map, &CollapseRules::default(), progress)
}

/// Kind ids of the rule set, resolved once per pass.
struct Shapes {
    primitive: ahash::AHashSet<KindId>,
    namespace: ahash::AHashSet<KindId>,
    table: Option<KindId>,
    type_meta: Option<KindId>,
    instance: Option<KindId>,
    class_meta: Option<KindId>,
}

/// A match: the attribute table to fold in, the metadata reference to keep, and
/// for legacy instances the class name that becomes the new kind.
struct Candidate {
    table: Node,
    carried: Option<u64>,
    new_kind: Option<String>,
}

/// Collapses every exclusively-owned attribute table into its owner.
///
/// Accepted shapes, for nodes whose kind is not primitive:
///
/// * `[table]` for a namespace kind (modules)
/// * `[table, type]` or `[type, table]` where the type's name is the node's kind
/// * `[class, table]` for a legacy `instance` node
///
/// The table must have exactly one parent, the node itself. Parents are computed
/// first if stale, and recomputed afterwards if anything collapsed. Returns the
/// number of tables collapsed; running it again on the result collapses nothing.
pub fn collapse_with(map: &mut NodeMap, rules: &CollapseRules, progress: &mut impl Progress) -> usize {
    if !map.parents_computed() {
        compute_parents(map, progress);
    }
    let shapes = Shapes {
        primitive: resolve_kinds(map, &rules.primitive_kinds),
        namespace: resolve_kinds(map, &rules.namespace_kinds),
        table: map.kinds().get(&rules.attribute_table_kind),
        type_meta: map.kinds().get(&rules.type_kind),
        instance: map.kinds().get(&rules.instance_kind),
        class_meta: map.kinds().get(&rules.class_kind),
    };
    let Some(table_kind) = shapes.table else {
        return 0;
    };

    let total = map.len();
    progress.on_start(Phase::Collapse, total);
    let mut collapsed = 0;
    for (done, node) in map.handles().into_iter().enumerate() {
        if should_report(done) {
            progress.on_advance(Phase::Collapse, done, total);
        }
        if shapes.primitive.contains(&node.kind()) {
            continue;
        }
        let Some(candidate) = match_shape(map, &node, table_kind, &shapes) else {
            continue;
        };
        let table = candidate.table;
        if !is_exclusively_owned(&table, node.id()) {
            continue;
        }

        let mut children: Vec<u64> = table.children().to_vec();
        children.extend(candidate.carried);
        map.set_children(&node, children);
        node.set_size(node.size() + table.size());
        node.set_retained_size(None);
        if let Some(kind) = candidate.new_kind {
            map.set_kind(&node, &kind);
        }
        if map.remove(table.id()).is_ok() {
            collapsed += 1;
        }
    }
    progress.on_finish(Phase::Collapse, total);
    tracing::debug!(checked = total, collapsed, "collapsed attribute tables");

    if collapsed > 0 {
        compute_parents(map, progress);
    }
    collapsed
}

fn match_shape(map: &NodeMap, node: &Node, table_kind: KindId, shapes: &Shapes) -> Option<Candidate> {
    let children = node.children();
    match *children {
        [only] if shapes.namespace.contains(&node.kind()) => {
            let table = map.get(only).filter(|t| t.kind() == table_kind)?;
            Some(Candidate {
                table,
                carried: None,
                new_kind: None,
            })
        }
        [first, second] => {
            let first = map.get(first)?;
            let second = map.get(second)?;
            let own_kind = map.kind_name(node.kind());
            let names_own_type =
                |meta: &Node| Some(meta.kind()) == shapes.type_meta && meta.label().as_deref() == Some(own_kind);

            if first.kind() == table_kind && names_own_type(&second) {
                Some(Candidate {
                    carried: Some(second.id()),
                    table: first,
                    new_kind: None,
                })
            } else if second.kind() == table_kind && names_own_type(&first) {
                Some(Candidate {
                    carried: Some(first.id()),
                    table: second,
                    new_kind: None,
                })
            } else if Some(node.kind()) == shapes.instance
                && Some(first.kind()) == shapes.class_meta
                && second.kind() == table_kind
            {
                Some(Candidate {
                    carried: Some(first.id()),
                    new_kind: first.label(),
                    table: second,
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_exclusively_owned(table: &Node, owner: u64) -> bool {
    *table.parents() == [owner]
}
