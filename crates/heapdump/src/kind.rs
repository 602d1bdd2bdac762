//! Interning of node kind tags.
//!
//! Every node carries a kind string ("dict", "str", "module", a class name...).
//! Algorithms branch on kinds constantly, so nodes store a [`KindId`] instead of
//! the string itself and comparisons are plain integer compares.
//!
//! KindIds are laid out as follows:
//! * 0 to count(KnownKind) - the kinds in [`KnownKind`], interned up front
//! * everything after - kinds first seen while loading a snapshot

use std::str::FromStr;

use ahash::AHashMap;
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Index into the kind interner's storage.
///
/// Uses `u32` to keep nodes small. Snapshots have a few thousand distinct kinds at
/// most, so the limit is never reached in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct KindId(u32);

impl KindId {
    /// Returns the raw index value.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<KnownKind> for KindId {
    #[inline]
    fn from(kind: KnownKind) -> Self {
        Self(kind as u32)
    }
}

impl PartialEq<KnownKind> for KindId {
    #[inline]
    fn eq(&self, other: &KnownKind) -> bool {
        self.0 == *other as u32
    }
}

/// Kinds the analysis passes know about by name.
///
/// The discriminant doubles as the [`KindId`], so `KindId::from(KnownKind::Dict)`
/// needs no lookup.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
pub enum KnownKind {
    #[strum(serialize = "dict")]
    Dict,
    #[strum(serialize = "str")]
    Str,
    #[strum(serialize = "unicode")]
    Unicode,
    #[strum(serialize = "tuple")]
    Tuple,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "set")]
    Set,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "long")]
    Long,
    #[strum(serialize = "float")]
    Float,
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "NoneType")]
    NoneType,
    #[strum(serialize = "type")]
    Type,
    #[strum(serialize = "function")]
    Function,
    #[strum(serialize = "wrapper_descriptor")]
    WrapperDescriptor,
    #[strum(serialize = "code")]
    Code,
    #[strum(serialize = "classobj")]
    ClassObj,
    #[strum(serialize = "instance")]
    Instance,
    #[strum(serialize = "weakref")]
    Weakref,
    #[strum(serialize = "module")]
    Module,
    #[strum(serialize = "frame")]
    Frame,
    #[strum(serialize = "_LRUNode")]
    LruNode,
    /// Kind of the sentinel node (id 0) that stands in for pruned references.
    #[strum(serialize = "<ex-reference>")]
    ExReference,
}

impl KnownKind {
    /// Returns the kind's string as it appears in snapshots.
    #[inline]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Interner mapping kind strings to [`KindId`]s and back.
#[derive(Debug, Clone)]
pub struct Kinds {
    names: Vec<Box<str>>,
    ids: AHashMap<Box<str>, KindId>,
}

impl Default for Kinds {
    fn default() -> Self {
        Self::new()
    }
}

impl Kinds {
    /// Creates an interner holding only the [`KnownKind`]s.
    pub fn new() -> Self {
        let mut kinds = Self {
            names: Vec::new(),
            ids: AHashMap::new(),
        };
        for known in KnownKind::iter() {
            let id = kinds.push(known.as_str());
            debug_assert_eq!(id, KindId::from(known));
        }
        kinds
    }

    /// Returns the id for `name`, interning it on first use.
    pub fn intern(&mut self, name: &str) -> KindId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        self.push(name)
    }

    /// Returns the id for `name` without interning it.
    pub fn get(&self, name: &str) -> Option<KindId> {
        if let Ok(known) = KnownKind::from_str(name) {
            return Some(known.into());
        }
        self.ids.get(name).copied()
    }

    /// Looks up the string for a kind.
    ///
    /// # Panics
    ///
    /// Panics if `id` was produced by a different interner.
    #[inline]
    pub fn name(&self, id: KindId) -> &str {
        &self.names[id.index()]
    }

    /// Number of distinct kinds, including the pre-interned ones.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: the known kinds are interned on construction.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn push(&mut self, name: &str) -> KindId {
        let id = KindId(u32::try_from(self.names.len()).expect("KindId overflow"));
        let name: Box<str> = name.into();
        self.names.push(name.clone());
        self.ids.insert(name, id);
        id
    }
}
