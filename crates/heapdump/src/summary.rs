//! Per-kind aggregate statistics.

use std::fmt;

use indexmap::IndexMap;

use crate::{
    kind::KindId,
    map::NodeMap,
    node::{AsNodeId, Node},
    progress::{Phase, Progress, should_report},
    traverse::iter_reachable,
};

/// Number of rows [`Summary`]'s `Display` shows.
const SHOWN_ROWS: usize = 20;

/// Statistics for all nodes of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSummary {
    pub kind: KindId,
    pub kind_name: String,
    pub count: u64,
    pub total_size: u64,
    /// Sum of squared sizes, for the standard deviation.
    pub sq_sum: u128,
    pub max_size: u64,
    /// Id of the largest node; the first one seen on ties.
    pub max_id: Option<u64>,
}

impl TypeSummary {
    fn new(kind: KindId, kind_name: &str) -> Self {
        Self {
            kind,
            kind_name: kind_name.to_owned(),
            count: 0,
            total_size: 0,
            sq_sum: 0,
            max_size: 0,
            max_id: None,
        }
    }

    fn add(&mut self, node: &Node) {
        let size = node.size();
        self.count += 1;
        self.total_size += size;
        self.sq_sum += u128::from(size) * u128::from(size);
        if self.max_id.is_none() || size > self.max_size {
            self.max_size = size;
            self.max_id = Some(node.id());
        }
    }

    /// Average size in bytes; 0 for an empty summary.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.total_size as f64 / self.count as f64
    }

    /// Population standard deviation of the sizes.
    pub fn std_dev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let mean_of_squares = self.sq_sum as f64 / self.count as f64;
        (mean_of_squares - mean * mean).max(0.0).sqrt()
    }
}

impl fmt::Display for TypeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}, {} bytes, {:.3} avg bytes, {:.3} std dev, {} max",
            self.kind_name,
            self.count,
            self.total_size,
            self.mean(),
            self.std_dev(),
            self.max_size
        )?;
        if let Some(id) = self.max_id {
            write!(f, " @ {id}")?;
        }
        Ok(())
    }
}

/// Aggregate statistics over a set of nodes, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    /// Per-kind summaries in first-seen order.
    pub by_kind: IndexMap<KindId, TypeSummary>,
    pub total_count: u64,
    pub total_size: u64,
}

impl Summary {
    fn add(&mut self, map: &NodeMap, node: &Node) {
        let kind = node.kind();
        self.by_kind
            .entry(kind)
            .or_insert_with(|| TypeSummary::new(kind, map.kind_name(kind)))
            .add(node);
        self.total_count += 1;
        self.total_size += node.size();
    }

    /// Kinds ordered by total size, then count, largest first.
    pub fn by_size(&self) -> Vec<&TypeSummary> {
        let mut rows: Vec<&TypeSummary> = self.by_kind.values().collect();
        rows.sort_by_key(|s| std::cmp::Reverse((s.total_size, s.count)));
        rows
    }

    /// Kinds ordered by count, then total size, largest first.
    pub fn by_count(&self) -> Vec<&TypeSummary> {
        let mut rows: Vec<&TypeSummary> = self.by_kind.values().collect();
        rows.sort_by_key(|s| std::cmp::Reverse((s.count, s.total_size)));
        rows
    }

    pub fn get(&self, kind_name: &str) -> Option<&TypeSummary> {
        self.by_kind.values().find(|s| s.kind_name == kind_name)
    }
}

fn percent(part: u64, whole: u64) -> u64 {
    if whole == 0 { 0 } else { part * 100 / whole }
}

impl fmt::Display for Summary {
    /// Renders the top kinds by size:
    ///
    /// ```text
    /// Total 7 objects, 4 types, Total size = 0.0MiB (261 bytes)
    ///  Index   Count   %      Size   % Cum     Max Kind
    ///      0       1  14       124  47  47     124 dict
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total {} objects, {} types, Total size = {:.1}MiB ({} bytes)",
            self.total_count,
            self.by_kind.len(),
            self.total_size as f64 / 1024.0 / 1024.0,
            self.total_size
        )?;
        write!(f, "\n Index   Count   %      Size   % Cum     Max Kind")?;
        let mut cumulative = 0;
        for (index, row) in self.by_size().into_iter().take(SHOWN_ROWS).enumerate() {
            cumulative += row.total_size;
            write!(
                f,
                "\n{index:6}{:8}{:4}{:10}{:4}{:4}{:8} {}",
                row.count,
                percent(row.count, self.total_count),
                row.total_size,
                percent(row.total_size, self.total_size),
                percent(cumulative, self.total_size),
                row.max_size,
                row.kind_name
            )?;
        }
        Ok(())
    }
}

/// Summarizes the whole map, or only what `root` reaches (minus `excluding`).
pub fn summarize(
    map: &NodeMap,
    root: Option<&Node>,
    excluding: impl IntoIterator<Item = impl AsNodeId>,
    progress: &mut impl Progress,
) -> Summary {
    let mut summary = Summary::default();
    match root {
        Some(root) => {
            progress.on_start(Phase::Summarize, 0);
            for (done, node) in iter_reachable(map, root, excluding).enumerate() {
                if should_report(done) {
                    progress.on_advance(Phase::Summarize, done, 0);
                }
                summary.add(map, &node);
            }
        }
        None => {
            let total = map.len();
            progress.on_start(Phase::Summarize, total);
            for (done, node) in map.values().enumerate() {
                if should_report(done) {
                    progress.on_advance(Phase::Summarize, done, total);
                }
                summary.add(map, node);
            }
        }
    }
    progress.on_finish(Phase::Summarize, usize::try_from(summary.total_count).unwrap_or(usize::MAX));
    summary
}
