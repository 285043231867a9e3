//! Per-cell candidates and resolved cell records.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use super::{Cell, CellId};

/// One overlay fragment as handed over by the GIS collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub cell: Cell,
    pub cell_id: CellId,
    pub name: String,
    /// Area or length of the fragment, depending on the feature type.
    pub metric: f64,
}

impl Fragment {
    pub fn new(cell: impl Into<Cell>, cell_id: u64, name: impl Into<String>, metric: f64) -> Self {
        Self {
            cell: cell.into(),
            cell_id: CellId(cell_id),
            name: name.into(),
            metric,
        }
    }
}

/// A feature's accumulated contribution to one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellCandidate {
    pub name: String,
    pub metric: f64,
    pub cell_id: CellId,
    pub map_name: String,
}

/// Candidate list for a cell, most cells carry one or two features.
pub type Candidates = SmallVec<[CellCandidate; 4]>;

/// Resolved view of one cell: candidates ranked best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub cell: Cell,
    /// Backend id taken from the winning candidate.
    pub cell_id: CellId,
    pub number_of_data: usize,
    pub candidates: Candidates,
}

impl CellRecord {
    /// Wrap an already ordered, non-empty candidate list.
    ///
    /// Returns `None` for an empty list: empty cells never appear in a
    /// resolved snapshot.
    pub fn from_ordered(cell: Cell, candidates: Candidates) -> Option<Self> {
        let cell_id = candidates.first()?.cell_id;
        Some(Self {
            cell,
            cell_id,
            number_of_data: candidates.len(),
            candidates,
        })
    }

    pub fn row(&self) -> i64 { self.cell.row }
    pub fn col(&self) -> i64 { self.cell.col }

    /// The first-ranked candidate.
    pub fn winner(&self) -> &CellCandidate {
        &self.candidates[0]
    }

    /// Ranked candidates that came from `map_name`.
    pub fn by_map<'a>(&'a self, map_name: &'a str) -> impl Iterator<Item = &'a CellCandidate> + 'a {
        self.candidates.iter().filter(move |c| c.map_name == map_name)
    }

    /// Ranked candidate names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn candidate(name: &str, metric: f64, map: &str) -> CellCandidate {
        CellCandidate { name: name.into(), metric, cell_id: CellId(9), map_name: map.into() }
    }

    #[test]
    fn empty_candidates_produce_no_record() {
        assert!(CellRecord::from_ordered(Cell::new(0, 0), Candidates::new()).is_none());
    }

    #[test]
    fn single_candidate_is_wrapped() {
        let rec = CellRecord::from_ordered(Cell::new(1, 2), smallvec![candidate("A", 1.0, "m")]).unwrap();
        assert_eq!(rec.number_of_data, 1);
        assert_eq!(rec.cell_id, CellId(9));
        assert_eq!(rec.winner().name, "A");
        assert_eq!((rec.row(), rec.col()), (1, 2));
    }

    #[test]
    fn by_map_keeps_rank_order() {
        let rec = CellRecord::from_ordered(
            Cell::new(0, 0),
            smallvec![candidate("A", 3.0, "main"), candidate("B", 2.0, "alt"), candidate("C", 1.0, "main")],
        )
        .unwrap();
        let names: Vec<&str> = rec.by_map("main").map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
