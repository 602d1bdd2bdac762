//! Node handles and the payload they share with the [`NodeMap`](crate::NodeMap).
//!
//! A [`Node`] is a cheap, reference-counted handle to one heap record. The map
//! keeps one handle per live id in its dense store and hands out clones, so every
//! lookup of the same id returns the *same* handle (`Node::ptr_eq`) until that id is
//! removed. Removing the id only drops the map's clone: handles held elsewhere keep
//! the payload alive and stay fully readable.
//!
//! Fields that analysis passes rewrite (`kind`, `size`, `children`, `parents`,
//! `retained_size`, `value`) use interior mutability because passes hold handles to
//! many nodes at once while mutating some of them.

use std::{
    cell::{Cell, Ref, RefCell},
    fmt,
    rc::Rc,
};

use crate::kind::KindId;

/// Scalar payload carried by leaf-like nodes.
///
/// Booleans appear in snapshots as the text `"True"`/`"False"` on a `bool` node;
/// they are decoded by [`as_mapping`](crate::as_mapping) and friends, not here.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Str(Box<str>),
}

impl Scalar {
    /// Returns the string payload, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

/// Description of a node to insert into a [`NodeMap`](crate::NodeMap).
///
/// # Example
///
/// ```
/// # use heapdump::{NewNode, NodeMap};
/// let mut map = NodeMap::new();
/// let node = map.insert(NewNode::new(1, "tuple", 20).children([2, 3]).length(2));
/// assert_eq!(&*node.children(), &[2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode<'a> {
    pub id: u64,
    pub kind: &'a str,
    pub size: u64,
    pub children: Vec<u64>,
    pub value: Option<Scalar>,
    pub length: Option<u32>,
    pub name: Option<&'a str>,
}

impl<'a> NewNode<'a> {
    pub fn new(id: u64, kind: &'a str, size: u64) -> Self {
        Self {
            id,
            kind,
            size,
            children: Vec::new(),
            value: None,
            length: None,
            name: None,
        }
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = u64>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<Scalar>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }
}

#[derive(Debug)]
struct NodeData {
    id: u64,
    kind: Cell<KindId>,
    size: Cell<u64>,
    length: Option<u32>,
    name: Option<Box<str>>,
    value: RefCell<Option<Scalar>>,
    children: RefCell<Box<[u64]>>,
    parents: RefCell<Box<[u64]>>,
    retained_size: Cell<Option<u64>>,
}

/// Handle to one node of the heap graph.
///
/// Equality is handle identity: two `Node`s are equal when they refer to the same
/// payload, which is what "the same object" means for lookups in the map.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

impl Node {
    pub(crate) fn new(fields: NewNode<'_>, kind: KindId) -> Self {
        Self(Rc::new(NodeData {
            id: fields.id,
            kind: Cell::new(kind),
            size: Cell::new(fields.size),
            length: fields.length,
            name: fields.name.map(Into::into),
            value: RefCell::new(fields.value),
            children: RefCell::new(fields.children.into_boxed_slice()),
            parents: RefCell::new(Box::default()),
            retained_size: Cell::new(None),
        }))
    }

    /// Returns true when both handles refer to the same payload.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[inline]
    pub fn kind(&self) -> KindId {
        self.0.kind.get()
    }

    pub(crate) fn set_kind(&self, kind: KindId) {
        self.0.kind.set(kind);
    }

    /// Shallow size in bytes of just this node.
    #[inline]
    pub fn size(&self) -> u64 {
        self.0.size.get()
    }

    pub fn set_size(&self, size: u64) {
        self.0.size.set(size);
    }

    /// Element count hint for containers. Independent of `children`.
    #[inline]
    pub fn length(&self) -> Option<u32> {
        self.0.length
    }

    /// Name carried by modules, types and functions.
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn value(&self) -> Ref<'_, Option<Scalar>> {
        self.0.value.borrow()
    }

    /// Replaces the scalar payload; `None` clears it.
    pub fn set_value(&self, value: Option<Scalar>) {
        *self.0.value.borrow_mut() = value;
    }

    /// The name a type-like node is known by: its `name`, or its string value.
    pub fn label(&self) -> Option<String> {
        if let Some(name) = self.name() {
            return Some(name.to_owned());
        }
        self.value().as_ref().and_then(Scalar::as_str).map(str::to_owned)
    }

    /// Outgoing reference ids, in snapshot order.
    pub fn children(&self) -> Ref<'_, [u64]> {
        Ref::map(self.0.children.borrow(), |c| &**c)
    }

    #[inline]
    pub fn num_children(&self) -> usize {
        self.0.children.borrow().len()
    }

    /// Returns the id at position `index` in `children`.
    pub fn child(&self, index: usize) -> Option<u64> {
        self.0.children.borrow().get(index).copied()
    }

    /// Replaces the children. Goes through the map so parent data gets marked stale.
    pub(crate) fn set_children(&self, children: impl Into<Box<[u64]>>) {
        *self.0.children.borrow_mut() = children.into();
    }

    /// Ids of the nodes referencing this one.
    ///
    /// Empty until [`compute_parents`](crate::compute_parents) runs, and stale after
    /// any structural mutation of the map until it runs again.
    pub fn parents(&self) -> Ref<'_, [u64]> {
        Ref::map(self.0.parents.borrow(), |p| &**p)
    }

    #[inline]
    pub fn num_parents(&self) -> usize {
        self.0.parents.borrow().len()
    }

    pub(crate) fn set_parents(&self, parents: Box<[u64]>) {
        *self.0.parents.borrow_mut() = parents;
    }

    /// Retained size from the last computation, or `None` if never computed or reset
    /// by collapsing.
    #[inline]
    pub fn retained_size(&self) -> Option<u64> {
        self.0.retained_size.get()
    }

    pub fn set_retained_size(&self, retained_size: Option<u64>) {
        self.0.retained_size.set(retained_size);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("size", &self.size())
            .field("children", &&*self.children())
            .finish_non_exhaustive()
    }
}

/// Anything that identifies a node: a raw id or a handle.
///
/// Lets `excluding` arguments take plain ids, handles, or the output of another
/// traversal without conversion at the call site.
pub trait AsNodeId {
    fn node_id(&self) -> u64;
}

impl AsNodeId for u64 {
    #[inline]
    fn node_id(&self) -> u64 {
        *self
    }
}

impl AsNodeId for Node {
    #[inline]
    fn node_id(&self) -> u64 {
        self.id()
    }
}

impl<T: AsNodeId + ?Sized> AsNodeId for &T {
    #[inline]
    fn node_id(&self) -> u64 {
        (**self).node_id()
    }
}

/// Formats a byte count the way the summary and node displays do: `12.0B`,
/// `1.0KiB`, `10.5MiB`.
pub(crate) fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1}{}", UNITS[unit])
}

/// Display adapter produced by [`NodeMap::describe`](crate::NodeMap::describe).
///
/// Renders e.g. `Node(1234, module, named, 12 bytes, 2 refs [4567, 8900])`.
pub struct NodeDisplay<'a> {
    pub(crate) node: &'a Node,
    pub(crate) kind_name: &'a str,
}

/// Number of child / parent ids shown before eliding with `...`.
const MAX_SHOWN_IDS: usize = 10;
/// Number of value characters shown before eliding with `...`.
const MAX_SHOWN_VALUE: usize = 17;

fn write_ids(f: &mut fmt::Formatter<'_>, ids: &[u64]) -> fmt::Result {
    f.write_str(" [")?;
    for (i, id) in ids.iter().take(MAX_SHOWN_IDS).enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{id}")?;
    }
    if ids.len() > MAX_SHOWN_IDS {
        f.write_str(", ...")?;
    }
    f.write_str("]")
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node;
        write!(f, "Node({}, {}", node.id(), self.kind_name)?;
        if let Some(name) = node.name() {
            write!(f, ", {name}")?;
        }
        write!(f, ", {} bytes, {} refs", node.size(), node.num_children())?;
        let children = node.children();
        if !children.is_empty() {
            write_ids(f, &children)?;
        }
        let parents = node.parents();
        if !parents.is_empty() {
            write!(f, ", {} referrers", parents.len())?;
            write_ids(f, &parents)?;
        }
        match &*node.value() {
            Some(Scalar::Str(s)) => {
                if s.chars().count() > MAX_SHOWN_VALUE {
                    let shown: String = s.chars().take(MAX_SHOWN_VALUE).collect();
                    write!(f, ", '{shown}...")?;
                } else {
                    write!(f, ", '{s}'")?;
                }
            }
            Some(other) => write!(f, ", {other}")?,
            None => {}
        }
        if let Some(retained) = node.retained_size() {
            write!(f, ", {}", human_size(retained))?;
        }
        f.write_str(")")
    }
}
