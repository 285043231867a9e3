//! Record Builder: renders a resolved cell into bounded export columns.
//!
//! Main columns carry the top-ranked names from the main map, padded with
//! empty strings. Secondary columns carry the winner of each secondary map.
//! Overflow is never fatal: extra candidates are dropped and a warning is
//! recorded.

use crate::aggregate::ResolvedCells;
use crate::diagnostics::{Ledger, code};
use crate::feature::{FeatureProfile, MapRegistry};
use crate::model::Cell;

/// Borrowed view over one engine's resolved state.
pub struct RecordBuilder<'a> {
    profile: &'a FeatureProfile,
    maps: &'a MapRegistry,
    resolved: &'a ResolvedCells,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(profile: &'a FeatureProfile, maps: &'a MapRegistry, resolved: &'a ResolvedCells) -> Self {
        Self { profile, maps, resolved }
    }

    /// Main columns using the profile's names and width.
    pub fn main_columns(&self, cell: &Cell, ledger: &mut Ledger) -> Vec<(String, String)> {
        let names = self.profile.main_columns();
        self.build_main_columns(cell, &names, self.profile.columns_to_save, ledger)
    }

    /// Secondary columns for every imported secondary map.
    pub fn secondary_columns(&self, cell: &Cell, ledger: &mut Ledger) -> Vec<(String, String)> {
        let maps: Vec<&str> = self.maps.secondary_maps().iter().map(|m| m.name.as_str()).collect();
        self.build_secondary_columns(cell, &maps, ledger)
    }

    /// Fill `column_names[..max_columns]` with the main map's ranked names.
    pub fn build_main_columns(
        &self,
        cell: &Cell,
        column_names: &[String],
        max_columns: usize,
        ledger: &mut Ledger,
    ) -> Vec<(String, String)> {
        let columns = &column_names[..max_columns.min(column_names.len())];

        let ranked: Vec<&str> = match (self.maps.main_map(), self.resolved.get(cell)) {
            (Some(main), Some(record)) => record.by_map(&main.name).map(|c| c.name.as_str()).collect(),
            _ => Vec::new(),
        };

        if ranked.len() > max_columns {
            let main = self.maps.main_map().map(|m| m.name.as_str()).unwrap_or_default();
            let msg = format!(
                "Cell {cell} of map [{main}] holds [{}] features but at most [{max_columns}] can be saved. \
                 Only the first [{max_columns}] are kept.",
                ranked.len()
            );
            tracing::warn!(feature_type = %self.profile.feature_type, "{msg}");
            ledger.append_once(msg, &self.profile.feature_type, true, code::NONE);
        }

        columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let value = ranked.get(i).copied().unwrap_or_default();
                (col.clone(), value.to_string())
            })
            .collect()
    }

    /// One column per secondary map holding that map's winner in `cell`.
    pub fn build_secondary_columns(
        &self,
        cell: &Cell,
        secondary_maps: &[&str],
        ledger: &mut Ledger,
    ) -> Vec<(String, String)> {
        let record = self.resolved.get(cell);

        secondary_maps
            .iter()
            .map(|&map_name| {
                let names: Vec<&str> = record
                    .map(|r| r.by_map(map_name).map(|c| c.name.as_str()).collect())
                    .unwrap_or_default();
                let value = names.first().copied().unwrap_or_default();

                if names.len() > 1 {
                    let msg = format!(
                        "Map [{map_name}] has more than one value in cell {cell}. Only the first is kept: [{value}]"
                    );
                    tracing::warn!(feature_type = %self.profile.feature_type, "{msg}");
                    ledger.append_once(msg, &self.profile.feature_type, true, code::NONE);
                }

                (self.profile.secondary_column(map_name), value.to_string())
            })
            .collect()
    }
}
