//! Inverse adjacency: who points at each node.

use crate::{
    map::NodeMap,
    progress::{Phase, Progress, should_report},
};

/// Above this many referrers a bag switches from a reallocated tuple to a growable
/// vector.
pub const FEW_REFERRERS_LIMIT: usize = 10;

/// Accumulator for the referrers of one node.
///
/// Nearly every node has zero, one or two referrers; a handful of hot shared
/// objects have thousands. The tiers keep the common case free of heap
/// allocations and the rare case free of quadratic copying.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReferrerBag {
    #[default]
    Empty,
    One(u64),
    /// Exact-size, reallocated on every push up to [`FEW_REFERRERS_LIMIT`].
    Few(Box<[u64]>),
    Many(Vec<u64>),
}

impl ReferrerBag {
    pub fn push(&mut self, id: u64) {
        *self = match std::mem::take(self) {
            Self::Empty => Self::One(id),
            Self::One(first) => Self::Few(Box::new([first, id])),
            Self::Few(few) if few.len() < FEW_REFERRERS_LIMIT => {
                let mut grown = Vec::with_capacity(few.len() + 1);
                grown.extend_from_slice(&few);
                grown.push(id);
                Self::Few(grown.into_boxed_slice())
            }
            Self::Few(few) => {
                let mut many = few.into_vec();
                many.push(id);
                Self::Many(many)
            }
            Self::Many(mut many) => {
                many.push(id);
                Self::Many(many)
            }
        };
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Few(few) => few.len(),
            Self::Many(many) => many.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Normalizes the bag to an immutable, exact-size sequence.
    pub fn into_boxed_slice(self) -> Box<[u64]> {
        match self {
            Self::Empty => Box::default(),
            Self::One(id) => Box::new([id]),
            Self::Few(few) => few,
            Self::Many(many) => many.into_boxed_slice(),
        }
    }
}

/// Recomputes `parents` for every node in the map.
///
/// Referrers are listed in map iteration order; a node referencing the same child
/// twice is listed twice. Children that are not in the map are ignored.
pub fn compute_parents(map: &mut NodeMap, progress: &mut impl Progress) {
    let total = map.len();
    progress.on_start(Phase::ComputeParents, total);

    // bags are indexed by position in iteration order so no side hash map is needed
    let positions: ahash::AHashMap<u64, usize> = map.keys().enumerate().map(|(pos, id)| (id, pos)).collect();
    let mut bags: Vec<ReferrerBag> = vec![ReferrerBag::Empty; total];
    let mut dangling = 0usize;

    for (done, node) in map.values().enumerate() {
        if should_report(done) {
            progress.on_advance(Phase::ComputeParents, done, total);
        }
        let referrer = node.id();
        for child in node.children().iter() {
            match positions.get(child) {
                Some(&pos) => bags[pos].push(referrer),
                None => dangling += 1,
            }
        }
    }
    drop(positions);

    for (node, bag) in map.values().zip(bags) {
        node.set_parents(bag.into_boxed_slice());
    }
    map.mark_parents_fresh();

    tracing::debug!(nodes = total, dangling, "computed parents");
    progress.on_finish(Phase::ComputeParents, total);
}
