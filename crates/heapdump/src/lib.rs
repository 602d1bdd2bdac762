//! Heap snapshot graph store and analysis.
//!
//! A snapshot is a flat list of records, one per live object: an id, a kind, a
//! size in bytes and the ids of the objects it references. [`load_lines`] turns
//! them into a [`NodeMap`], an insertion-ordered identity map of [`Node`]
//! handles. The analysis passes then work on the map in place:
//!
//! * [`compute_parents`] fills in the reverse edges.
//! * [`retained_size`] and [`iter_reachable`] answer "what does this object keep
//!   alive".
//! * [`prune_expensive`] cuts module, frame and type links that would otherwise
//!   make everything reach everything.
//! * [`collapse`] folds instance attribute dicts into their owners.
//! * [`summarize`] groups what is left by kind.
//!
//! ```
//! use heapdump::{NoProgress, collapse, compute_parents, load_lines, summarize, NO_EXCLUSIONS};
//!
//! let lines = [
//!     r#"{"address": 1, "type": "Foo", "size": 32, "refs": [2, 3]}"#,
//!     r#"{"address": 2, "type": "dict", "size": 140, "refs": [4, 5]}"#,
//!     r#"{"address": 3, "type": "type", "size": 452, "name": "Foo", "refs": []}"#,
//!     r#"{"address": 4, "type": "str", "size": 25, "len": 1, "value": "a", "refs": []}"#,
//!     r#"{"address": 5, "type": "int", "size": 12, "value": 1, "refs": []}"#,
//! ];
//! let mut map = load_lines(lines, &mut NoProgress).unwrap();
//! compute_parents(&mut map, &mut NoProgress);
//! assert_eq!(collapse(&mut map, &mut NoProgress), 1);
//!
//! let foo = map.lookup(1).unwrap();
//! assert_eq!(foo.size(), 172);
//! assert_eq!(&*foo.children(), &[4, 5, 3]);
//!
//! let summary = summarize(&map, None, NO_EXCLUSIONS, &mut NoProgress);
//! assert_eq!(summary.total_count, 4);
//! ```

mod collapse;
mod config;
mod error;
mod kind;
mod map;
mod node;
mod parents;
mod progress;
mod prune;
mod record;
mod structured;
mod summary;
mod traverse;

pub use crate::{
    collapse::{collapse, collapse_with},
    config::{AnalysisConfig, CollapseRules, PruneRules},
    error::{ConfigError, LoadError, NotFound},
    kind::{KindId, Kinds, KnownKind},
    map::{MIN_CAPACITY, NodeMap},
    node::{AsNodeId, NewNode, Node, NodeDisplay, Scalar},
    parents::{FEW_REFERRERS_LIMIT, ReferrerBag, compute_parents},
    progress::{NoProgress, PROGRESS_INTERVAL, Phase, Progress, ProgressEvent, RecordingProgress, TracingProgress},
    prune::{PruneReport, SENTINEL_ID, prune_expensive, prune_expensive_with},
    record::{Record, load_lines, load_reader},
    structured::{Resolved, as_mapping, as_mapping_with, as_sequence},
    summary::{Summary, TypeSummary, summarize},
    traverse::{NO_EXCLUSIONS, Reachable, compute_retained_sizes, iter_reachable, retained_size},
};
