//! Snapshot fixtures shared by the integration tests.
#![expect(dead_code, reason = "each test binary uses a different subset")]

use heapdump::{NoProgress, NodeMap, load_lines};

/// A small dump with cross references and a self-referencing list:
///
/// ```text
/// a@5 = 1
/// b@4 = 2
/// c@6 = 'a str'
/// t@7 = (a, b)
/// d@2 = {a: b, c: t}
/// l@3 = [a, b]
/// l.append(l)
/// outer@1 = (d, l)
/// ```
pub const EXAMPLE_DUMP: [&str; 7] = [
    r#"{"address": 1, "type": "tuple", "size": 20, "len": 2, "refs": [2, 3]}"#,
    r#"{"address": 3, "type": "list", "size": 44, "len": 3, "refs": [3, 4, 5]}"#,
    r#"{"address": 5, "type": "int", "size": 12, "value": 1, "refs": []}"#,
    r#"{"address": 4, "type": "int", "size": 12, "value": 2, "refs": []}"#,
    r#"{"address": 2, "type": "dict", "size": 124, "len": 2, "refs": [4, 5, 6, 7]}"#,
    r#"{"address": 7, "type": "tuple", "size": 20, "len": 2, "refs": [4, 5]}"#,
    r#"{"address": 6, "type": "str", "size": 29, "name": "bah", "len": 5, "value": "a str", "refs": []}"#,
];

/// An instance of `MyClass` with its `__dict__` (2) and type (3), plus a module
/// (14) with its namespace dict (15).
pub const INSTANCE_DUMP: [&str; 15] = [
    r#"{"address": 1, "type": "MyClass", "size": 32, "refs": [2, 3]}"#,
    r#"{"address": 3, "type": "type", "size": 452, "name": "MyClass", "refs": []}"#,
    r#"{"address": 2, "type": "dict", "size": 140, "len": 4, "refs": [4, 5, 6, 7, 9, 10, 11, 12]}"#,
    r#"{"address": 4, "type": "str", "size": 25, "len": 1, "value": "a", "refs": []}"#,
    r#"{"address": 5, "type": "int", "size": 12, "value": 1, "refs": []}"#,
    r#"{"address": 6, "type": "str", "size": 25, "len": 1, "value": "c", "refs": []}"#,
    r#"{"address": 7, "type": "dict", "size": 140, "len": 1, "refs": [8, 6]}"#,
    r#"{"address": 8, "type": "str", "size": 25, "len": 1, "value": "s", "refs": []}"#,
    r#"{"address": 9, "type": "str", "size": 25, "len": 1, "value": "b", "refs": []}"#,
    r#"{"address": 10, "type": "str", "size": 30, "len": 6, "value": "string", "refs": []}"#,
    r#"{"address": 11, "type": "str", "size": 25, "len": 1, "value": "d", "refs": []}"#,
    r#"{"address": 12, "type": "tuple", "size": 32, "len": 1, "refs": [13]}"#,
    r#"{"address": 13, "type": "int", "size": 12, "value": 2, "refs": []}"#,
    r#"{"address": 14, "type": "module", "size": 28, "name": "sys", "refs": [15]}"#,
    r#"{"address": 15, "type": "dict", "size": 140, "len": 2, "refs": [5, 6, 9, 6]}"#,
];

/// [`EXAMPLE_DUMP`] plus a module whose namespace references another module.
pub fn module_dump() -> Vec<&'static str> {
    let mut lines = EXAMPLE_DUMP.to_vec();
    lines.extend([
        r#"{"address": 8, "type": "module", "size": 12, "name": "mymod", "refs": [9]}"#,
        r#"{"address": 9, "type": "dict", "size": 124, "refs": [10, 11]}"#,
        r#"{"address": 10, "type": "module", "size": 12, "name": "mod2", "refs": [12]}"#,
        r#"{"address": 11, "type": "str", "size": 27, "value": "boo", "refs": []}"#,
        r#"{"address": 12, "type": "dict", "size": 124, "refs": []}"#,
    ]);
    lines
}

pub fn load(lines: &[&str]) -> NodeMap {
    load_lines(lines, &mut NoProgress).unwrap()
}

/// Ids of `nodes`, for comparing against expected id lists.
pub fn ids<'a>(nodes: impl IntoIterator<Item = &'a heapdump::Node>) -> Vec<u64> {
    nodes.into_iter().map(heapdump::Node::id).collect()
}
