//! Grid cell identity.

use serde::{Deserialize, Serialize};

/// Opaque identifier the GIS backend assigns to a grid cell geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u64);

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of the target grid, keyed by `(row, col)`.
///
/// The backend cell id is not part of the key: two fragments
/// on the same row/column belong to the same cell no matter which
/// geometry the overlay step attributed them to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: i64,
    pub col: i64,
}

impl Cell {
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(r={}, c={})", self.row, self.col)
    }
}

impl From<(i64, i64)> for Cell {
    fn from((row, col): (i64, i64)) -> Self {
        Self { row, col }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    #[test]
    fn cell_equality_is_row_col() {
        let a = Cell::new(3, 4);
        let b: Cell = (3, 4).into();
        assert_eq!(a, b);

        let set: HashSet<Cell> = [a, b, Cell::new(4, 3)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn cell_display() {
        assert_eq!(Cell::new(1, 12).to_string(), "(r=1, c=12)");
    }
}
