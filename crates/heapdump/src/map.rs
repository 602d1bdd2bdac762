//! The ordered identity map that owns every node of a snapshot.
//!
//! # Storage Strategy
//! Two parts, in the same spirit as an insertion-ordered dict:
//!
//! * `slots` is an open-addressed index table of capacity `2^k`. Each slot is either
//!   `EMPTY`, `TOMBSTONE`, or the position of a node in `entries`. Collisions are
//!   resolved by linear probing.
//! * `entries` is a dense, append-only vector of node handles in insertion order.
//!   Removing a node leaves a hole (`None`) in `entries` and a tombstone in
//!   `slots`, so probe sequences of surviving ids stay intact.
//!
//! Once `filled` (live slots plus tombstones) would cross 2/3 of the table, the
//! table is rebuilt: holes in `entries` are compacted away, tombstones disappear,
//! and the capacity is chosen so the table is at most half full again. The
//! starting table of 1024 slots therefore holds 1025 entries in a 2048-slot table.
//!
//! Iteration walks `entries`, so it is always insertion order regardless of the
//! ids involved or how often the table has been rebuilt.

use std::fmt;

use crate::{
    error::NotFound,
    kind::{KindId, Kinds},
    node::{NewNode, Node, NodeDisplay},
};

const EMPTY: u32 = u32::MAX;
const TOMBSTONE: u32 = u32::MAX - 1;

/// Capacity of the index table of a fresh map. The table never shrinks below this.
pub const MIN_CAPACITY: usize = 1024;

/// Result of probing the index table for an id.
enum Probe {
    /// The id lives at this slot.
    Occupied(usize),
    /// The id is absent; this is the slot an insert should use (the first tombstone
    /// on the probe path, or the terminating empty slot).
    Vacant(usize),
}

/// Spreads sparse, aligned addresses over the whole table (splitmix64 finalizer).
#[inline]
pub(crate) fn slot_hash(id: u64) -> usize {
    let mut h = id;
    h ^= h >> 30;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^= h >> 31;
    h as usize
}

/// Insertion-ordered map from node id to [`Node`] handle.
pub struct NodeMap {
    slots: Box<[u32]>,
    entries: Vec<Option<Node>>,
    /// Number of live nodes.
    active: usize,
    /// Live slots plus tombstones; drives growth.
    filled: usize,
    kinds: Kinds,
    /// True while every node's `parents` reflects the current `children`.
    parents_fresh: bool,
}

impl Default for NodeMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeMap")
            .field("len", &self.active)
            .field("capacity", &self.slots.len())
            .field("tombstones", &self.tombstones())
            .field("kinds", &self.kinds.len())
            .finish()
    }
}

impl NodeMap {
    pub fn new() -> Self {
        Self {
            slots: vec![EMPTY; MIN_CAPACITY].into_boxed_slice(),
            entries: Vec::new(),
            active: 0,
            filled: 0,
            kinds: Kinds::new(),
            parents_fresh: false,
        }
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.active
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Number of slots in the index table.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of index slots still holding a tombstone from a removal.
    #[inline]
    pub fn tombstones(&self) -> usize {
        self.filled - self.active
    }

    pub fn kinds(&self) -> &Kinds {
        &self.kinds
    }

    pub fn intern_kind(&mut self, name: &str) -> KindId {
        self.kinds.intern(name)
    }

    #[inline]
    pub fn kind_name(&self, kind: KindId) -> &str {
        self.kinds.name(kind)
    }

    /// Whether `parents` on every node is up to date with the current children.
    ///
    /// Cleared by every insert, removal, or children rewrite, set again by
    /// [`compute_parents`](crate::compute_parents).
    #[inline]
    pub fn parents_computed(&self) -> bool {
        self.parents_fresh
    }

    pub(crate) fn mark_parents_fresh(&mut self) {
        self.parents_fresh = true;
    }

    /// Inserts a node and returns its handle.
    ///
    /// Inserting an id that is already present replaces the payload in place: the
    /// id keeps its original iteration position, the new handle is returned, and the
    /// previous handle becomes detached from the map.
    pub fn insert(&mut self, fields: NewNode<'_>) -> Node {
        let kind = self.kinds.intern(fields.kind);
        let id = fields.id;
        let node = Node::new(fields, kind);
        self.parents_fresh = false;

        if (self.filled + 1) * 3 > self.slots.len() * 2 {
            self.rebuild(self.active + 1);
        }
        match self.probe(id) {
            Probe::Occupied(slot) => {
                self.entries[self.slots[slot] as usize] = Some(node.clone());
            }
            Probe::Vacant(slot) => {
                let index = u32::try_from(self.entries.len())
                    .ok()
                    .filter(|&index| index < TOMBSTONE)
                    .expect("NodeMap entry index overflow");
                if self.slots[slot] == EMPTY {
                    self.filled += 1;
                }
                self.slots[slot] = index;
                self.entries.push(Some(node.clone()));
                self.active += 1;
            }
        }
        node
    }

    /// Returns the handle for `id`, if present.
    pub fn get(&self, id: u64) -> Option<Node> {
        match self.probe(id) {
            Probe::Occupied(slot) => self.entries[self.slots[slot] as usize].clone(),
            Probe::Vacant(_) => None,
        }
    }

    /// Like [`get`](Self::get), but an absent id is an error.
    pub fn lookup(&self, id: u64) -> Result<Node, NotFound> {
        self.get(id).ok_or(NotFound(id))
    }

    pub fn contains(&self, id: u64) -> bool {
        matches!(self.probe(id), Probe::Occupied(_))
    }

    /// Removes `id` from the map and returns its (now detached) handle.
    ///
    /// Handles obtained before the removal keep working; the node is simply no
    /// longer reachable through the map.
    pub fn remove(&mut self, id: u64) -> Result<Node, NotFound> {
        let Probe::Occupied(slot) = self.probe(id) else {
            return Err(NotFound(id));
        };
        let index = self.slots[slot] as usize;
        self.slots[slot] = TOMBSTONE;
        self.active -= 1;
        self.parents_fresh = false;
        let node = self.entries[index].take().ok_or(NotFound(id))?;
        if index + 1 == self.entries.len() {
            self.entries.pop();
        }
        Ok(node)
    }

    /// Replaces a node's children. Marks parent data stale.
    pub fn set_children(&mut self, node: &Node, children: impl Into<Box<[u64]>>) {
        node.set_children(children);
        self.parents_fresh = false;
    }

    /// Rewrites a node's kind, interning `kind` if needed.
    pub fn set_kind(&mut self, node: &Node, kind: &str) {
        let kind = self.kinds.intern(kind);
        node.set_kind(kind);
    }

    /// Ids in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.values().map(Node::id)
    }

    /// Handles in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Node> + '_ {
        self.entries.iter().flatten()
    }

    /// `(id, handle)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Node)> + '_ {
        self.values().map(|node| (node.id(), node))
    }

    /// Clones every handle, in insertion order.
    ///
    /// Passes that insert or remove nodes while walking the map iterate over this
    /// instead of borrowing the map.
    pub fn handles(&self) -> Vec<Node> {
        self.values().cloned().collect()
    }

    /// Every node of the given kind, largest first.
    ///
    /// Ties on `size` are broken by number of children, then number of parents.
    pub fn all_of_kind(&self, kind: &str) -> Vec<Node> {
        let Some(kind) = self.kinds.get(kind) else {
            return Vec::new();
        };
        let mut nodes: Vec<Node> = self.values().filter(|node| node.kind() == kind).cloned().collect();
        nodes.sort_by_key(|node| std::cmp::Reverse((node.size(), node.num_children(), node.num_parents())));
        nodes
    }

    /// Human-readable rendering of a node, resolving its kind name.
    pub fn describe<'a>(&'a self, node: &'a Node) -> NodeDisplay<'a> {
        NodeDisplay {
            node,
            kind_name: self.kinds.name(node.kind()),
        }
    }

    fn probe(&self, id: u64) -> Probe {
        let mask = self.slots.len() - 1;
        let mut slot = slot_hash(id) & mask;
        let mut first_free = None;
        // Growth keeps at least a third of the table EMPTY, so the walk terminates.
        loop {
            match self.slots[slot] {
                EMPTY => return Probe::Vacant(first_free.unwrap_or(slot)),
                TOMBSTONE => {
                    first_free.get_or_insert(slot);
                }
                index => {
                    if self.entries[index as usize].as_ref().is_some_and(|node| node.id() == id) {
                        return Probe::Occupied(slot);
                    }
                }
            }
            slot = (slot + 1) & mask;
        }
    }

    /// Compacts `entries` and rebuilds the index table so that `min_active` live
    /// nodes occupy at most half of it.
    fn rebuild(&mut self, min_active: usize) {
        let mut capacity = MIN_CAPACITY;
        while min_active * 2 > capacity {
            capacity *= 2;
        }
        self.entries.retain(Option::is_some);

        let mask = capacity - 1;
        let mut slots = vec![EMPTY; capacity].into_boxed_slice();
        for (index, node) in self.entries.iter().flatten().enumerate() {
            let mut slot = slot_hash(node.id()) & mask;
            while slots[slot] != EMPTY {
                slot = (slot + 1) & mask;
            }
            slots[slot] = u32::try_from(index).expect("NodeMap entry index overflow");
        }
        tracing::trace!(
            from = self.slots.len(),
            to = capacity,
            live = self.entries.len(),
            "rebuilt node index"
        );
        self.slots = slots;
        self.active = self.entries.len();
        self.filled = self.active;
    }
}

impl<'a> IntoIterator for &'a NodeMap {
    type Item = &'a Node;
    type IntoIter = std::iter::Flatten<std::slice::Iter<'a, Option<Node>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().flatten()
    }
}
