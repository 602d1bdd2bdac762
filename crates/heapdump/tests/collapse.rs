//! Tests for collapsing attribute tables into their owners.

mod common;

use heapdump::{CollapseRules, NewNode, NoProgress, NodeMap, collapse, collapse_with, compute_parents};
use pretty_assertions::assert_eq;

use common::{INSTANCE_DUMP, load};

fn children_of(map: &NodeMap, id: u64) -> Vec<u64> {
    map.lookup(id).unwrap().children().to_vec()
}

fn parents_of(map: &NodeMap, id: u64) -> Vec<u64> {
    map.lookup(id).unwrap().parents().to_vec()
}

// =============================================================================
// 1. Instance Dump
// =============================================================================

/// The instance absorbs its `__dict__` and the module absorbs its namespace.
#[test]
fn instance_and_module_dicts_collapse() {
    let mut map = load(&INSTANCE_DUMP);
    let instance = map.lookup(1).unwrap();
    assert_eq!(instance.size(), 32);
    assert_eq!(children_of(&map, 1), vec![2, 3]);
    assert_eq!(children_of(&map, 14), vec![15]);

    compute_parents(&mut map, &mut NoProgress);
    assert_eq!(parents_of(&map, 12), vec![2]);
    assert_eq!(parents_of(&map, 2), vec![1]);
    assert_eq!(parents_of(&map, 15), vec![14]);

    assert_eq!(collapse(&mut map, &mut NoProgress), 2);

    assert_eq!(children_of(&map, 1), vec![4, 5, 6, 7, 9, 10, 11, 12, 3]);
    assert_eq!(instance.size(), 172);
    assert!(!map.contains(2));
    assert_eq!(parents_of(&map, 12), vec![1]);

    assert_eq!(children_of(&map, 14), vec![5, 6, 9, 6]);
    assert!(!map.contains(15));
    assert!(map.parents_computed());
}

/// A second run finds nothing left to collapse and changes nothing.
#[test]
fn second_run_is_a_no_op() {
    let mut map = load(&INSTANCE_DUMP);
    collapse(&mut map, &mut NoProgress);
    let before: Vec<(u64, u64, Vec<u64>)> = map
        .values()
        .map(|node| (node.id(), node.size(), node.children().to_vec()))
        .collect();

    assert_eq!(collapse(&mut map, &mut NoProgress), 0);
    let after: Vec<(u64, u64, Vec<u64>)> = map
        .values()
        .map(|node| (node.id(), node.size(), node.children().to_vec()))
        .collect();
    assert_eq!(before, after);
}

/// Parents are computed first when they are stale.
#[test]
fn stale_parents_are_computed_first() {
    let mut map = load(&INSTANCE_DUMP);
    assert!(!map.parents_computed());
    assert_eq!(collapse(&mut map, &mut NoProgress), 2);
    assert_eq!(parents_of(&map, 12), vec![1]);
}

// =============================================================================
// 2. Shapes
// =============================================================================

/// The type may come before the dict.
#[test]
fn type_before_dict() {
    let mut map = NodeMap::new();
    map.insert(NewNode::new(1, "Point", 32).children([3, 2]));
    map.insert(NewNode::new(2, "dict", 100).children([4, 5]));
    map.insert(NewNode::new(3, "type", 400).name("Point"));
    map.insert(NewNode::new(4, "str", 25).value("x"));
    map.insert(NewNode::new(5, "int", 12).value(3i64));

    assert_eq!(collapse(&mut map, &mut NoProgress), 1);
    assert_eq!(children_of(&map, 1), vec![4, 5, 3]);
    assert_eq!(map.lookup(1).unwrap().size(), 132);
}

/// Legacy instances take their class name as their new kind.
#[test]
fn legacy_instance_takes_class_name() {
    let mut map = NodeMap::new();
    map.insert(NewNode::new(1, "instance", 36).children([2, 3]));
    map.insert(NewNode::new(2, "classobj", 80).name("OldStyle"));
    map.insert(NewNode::new(3, "dict", 140).children([4, 5]));
    map.insert(NewNode::new(4, "str", 25).value("a"));
    map.insert(NewNode::new(5, "int", 12).value(1i64));

    assert_eq!(collapse(&mut map, &mut NoProgress), 1);
    let instance = map.lookup(1).unwrap();
    assert_eq!(map.kind_name(instance.kind()), "OldStyle");
    assert_eq!(children_of(&map, 1), vec![4, 5, 2]);
    assert_eq!(instance.size(), 176);
}

/// A dict with more than one referrer is shared, not owned, and stays put.
#[test]
fn shared_dict_is_not_collapsed() {
    let mut map = NodeMap::new();
    map.insert(NewNode::new(1, "Foo", 32).children([2, 3]));
    map.insert(NewNode::new(2, "dict", 140));
    map.insert(NewNode::new(3, "type", 400).name("Foo"));
    map.insert(NewNode::new(4, "list", 40).children([2]));

    assert_eq!(collapse(&mut map, &mut NoProgress), 0);
    assert!(map.contains(2));
    assert_eq!(children_of(&map, 1), vec![2, 3]);
}

/// The type must carry the node's own kind name.
#[test]
fn mismatched_type_name_is_not_collapsed() {
    let mut map = NodeMap::new();
    map.insert(NewNode::new(1, "Foo", 32).children([2, 3]));
    map.insert(NewNode::new(2, "dict", 140));
    map.insert(NewNode::new(3, "type", 400).name("Bar"));

    assert_eq!(collapse(&mut map, &mut NoProgress), 0);
    assert!(map.contains(2));
}

/// Primitive kinds never collapse, even when listed as a namespace kind.
#[test]
fn primitive_kinds_are_skipped() {
    let mut map = NodeMap::new();
    map.insert(NewNode::new(1, "tuple", 24).children([2]));
    map.insert(NewNode::new(2, "dict", 140));
    let rules = CollapseRules {
        namespace_kinds: vec!["tuple".to_owned()],
        ..CollapseRules::default()
    };
    assert_eq!(collapse_with(&mut map, &rules, &mut NoProgress), 0);

    let rules = CollapseRules {
        primitive_kinds: Vec::new(),
        ..rules
    };
    assert_eq!(collapse_with(&mut map, &rules, &mut NoProgress), 1);
    assert!(!map.contains(2));
}

/// A lone dict child is only a namespace table for namespace kinds; a cell
/// holding a dict keeps it.
#[test]
fn single_dict_child_of_non_namespace_kind_stays() {
    let mut map = NodeMap::new();
    map.insert(NewNode::new(1, "cell", 24).children([2]));
    map.insert(NewNode::new(2, "dict", 140).children([3, 4]));
    map.insert(NewNode::new(3, "str", 25).value("k"));
    map.insert(NewNode::new(4, "int", 12).value(7i64));

    assert_eq!(collapse(&mut map, &mut NoProgress), 0);
    assert!(map.contains(2));
    assert_eq!(children_of(&map, 1), vec![2]);
    assert_eq!(map.lookup(1).unwrap().size(), 24);

    let rules = CollapseRules {
        namespace_kinds: vec!["cell".to_owned()],
        ..CollapseRules::default()
    };
    assert_eq!(collapse_with(&mut map, &rules, &mut NoProgress), 1);
    assert_eq!(children_of(&map, 1), vec![3, 4]);
    assert_eq!(map.lookup(1).unwrap().size(), 164);
}

/// Collapsing invalidates any stored retained size of the owner.
#[test]
fn collapse_resets_retained_size() {
    let mut map = load(&INSTANCE_DUMP);
    let instance = map.lookup(1).unwrap();
    instance.set_retained_size(Some(10));
    collapse(&mut map, &mut NoProgress);
    assert_eq!(instance.retained_size(), None);
}
