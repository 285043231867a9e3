//! One grid cell seen across every feature type.

use super::{Cell, CellRecord};

/// The resolved records of every feature type present in `cell`, in
/// feature configuration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedCell<'a> {
    pub cell: Cell,
    pub records: Vec<(&'a str, &'a CellRecord)>,
}

impl<'a> ConsolidatedCell<'a> {
    pub fn new(cell: Cell) -> Self {
        Self { cell, records: Vec::new() }
    }

    pub fn record(&self, feature_type: &str) -> Option<&'a CellRecord> {
        self.records.iter().find(|(ft, _)| *ft == feature_type).map(|(_, r)| *r)
    }

    pub fn has(&self, feature_type: &str) -> bool {
        self.record(feature_type).is_some()
    }

    pub fn feature_types(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.records.iter().map(|(ft, _)| *ft)
    }
}
