//! Cell Aggregator: folds overlay fragments into one ranked record per cell.
//!
//! Two phases:
//!
//! ```text
//! fragments ──accumulate()──► CellAggregator ──finalize(criteria)──► ResolvedCells
//!                                  ▲                                    (immutable)
//!                                  └── more accumulate() calls, finalize() again
//! ```
//!
//! Repeated fragments of the same `(cell, name)` are merged by summing
//! their metric. Cells and names keep their first-seen order, which is
//! what breaks exact metric ties.

use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::model::{Cell, CellCandidate, CellRecord, Fragment};
use crate::model::candidate::Candidates;

/// Which fragment measure ranks the candidates of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Area,
    Length,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Area => "area",
            Metric::Length => "length",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Ordering criteria
// ============================================================================

/// Pure ranking function for the candidates of one cell.
///
/// Implementations must return every candidate of `cell` exactly once.
pub trait OrderingCriteria {
    fn order(&self, cell: &Cell, cells: &CellAggregator, metric: Metric) -> Candidates;
}

impl<F> OrderingCriteria for F
where
    F: Fn(&Cell, &CellAggregator, Metric) -> Candidates,
{
    fn order(&self, cell: &Cell, cells: &CellAggregator, metric: Metric) -> Candidates {
        self(cell, cells, metric)
    }
}

/// Default criterion: metric descending, insertion order on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricDescending;

impl OrderingCriteria for MetricDescending {
    fn order(&self, cell: &Cell, cells: &CellAggregator, _metric: Metric) -> Candidates {
        let mut ranked: Candidates = cells.candidates(cell).cloned().collect();
        // sort_by is stable, so equal metrics keep insertion order
        ranked.sort_by(|a, b| b.metric.total_cmp(&a.metric));
        ranked
    }
}

// ============================================================================
// Accumulation phase
// ============================================================================

/// Mutable accumulation state for one feature type.
pub struct CellAggregator {
    metric: Metric,
    /// cell → candidate name → candidate, both in first-seen order
    cells: IndexMap<Cell, IndexMap<String, CellCandidate>>,
}

impl CellAggregator {
    pub fn new(metric: Metric) -> Self {
        Self { metric, cells: IndexMap::new() }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Add a candidate to `cell`, or add its metric to the candidate of
    /// the same name already there.
    pub fn accumulate(&mut self, cell: Cell, candidate: CellCandidate) {
        match self.cells.entry(cell).or_default().entry(candidate.name.clone()) {
            Entry::Occupied(mut slot) => slot.get_mut().metric += candidate.metric,
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
        }
    }

    /// Accumulate one overlay fragment read from `map_name`.
    pub fn accumulate_fragment(&mut self, map_name: &str, fragment: Fragment) {
        let Fragment { cell, cell_id, name, metric } = fragment;
        self.accumulate(cell, CellCandidate {
            name,
            metric,
            cell_id,
            map_name: map_name.to_string(),
        });
    }

    /// Candidates of `cell` in insertion order (empty for unknown cells).
    pub fn candidates(&self, cell: &Cell) -> impl Iterator<Item = &CellCandidate> {
        self.cells.get(cell).into_iter().flat_map(|c| c.values())
    }

    pub fn candidate_count(&self, cell: &Cell) -> usize {
        self.cells.get(cell).map_or(0, |c| c.len())
    }

    /// Cells in first-seen order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.keys()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Produce an immutable snapshot ranked by `criteria`.
    ///
    /// Can be called any number of times; each call reflects every
    /// accumulation made so far.
    pub fn finalize(&self, criteria: &dyn OrderingCriteria) -> ResolvedCells {
        let mut resolved = ResolvedCells::empty(self.metric);

        for cell in self.cells.keys() {
            let ranked = criteria.order(cell, self, self.metric);
            if let Some(record) = CellRecord::from_ordered(*cell, ranked) {
                resolved.records.insert(*cell, record);
            }
        }

        tracing::debug!(
            metric = %self.metric,
            cells = resolved.records.len(),
            "resolved cell candidates"
        );
        resolved
    }

    /// `finalize` with the default metric-descending criterion.
    pub fn finalize_default(&self) -> ResolvedCells {
        self.finalize(&MetricDescending)
    }
}

// ============================================================================
// Resolved snapshot
// ============================================================================

/// Immutable `Cell → CellRecord` mapping in first-seen cell order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCells {
    metric: Metric,
    records: IndexMap<Cell, CellRecord>,
}

impl ResolvedCells {
    pub fn empty(metric: Metric) -> Self {
        Self { metric, records: IndexMap::new() }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn get(&self, cell: &Cell) -> Option<&CellRecord> {
        self.records.get(cell)
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        self.records.contains_key(cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellRecord> {
        self.records.values()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct candidate names across all cells, in first-seen order.
    pub fn feature_names(&self) -> Vec<&str> {
        let names: IndexSet<&str> = self.records.values().flat_map(|r| r.names()).collect();
        names.into_iter().collect()
    }
}
