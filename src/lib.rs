//! # gridlink: Feature-to-Grid Resolution & Validation
//!
//! Folds GIS overlay fragments (catchments, rivers, demand sites,
//! groundwater) into one authoritative record per grid cell, validates the
//! feature maps against a reference node/arc topology and renders the
//! fixed-width linkage rows a water-resource planning model consumes.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Topology` and `MapSource` are the contract with the GIS backend
//! 2. **Clean DTOs**: `Cell`, `CellRecord`, `ExportRow` cross all boundaries
//! 3. **Two-phase aggregation**: accumulate into a builder, `finalize()` into an immutable snapshot
//! 4. **Findings are data**: checks append to a ledger, they never abort a run
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridlink::{Fragment, Linkage, LinkageConfig, MemoryMaps, MemoryTopology};
//!
//! # fn example() -> gridlink::Result<()> {
//! let topology = MemoryTopology::new();
//! topology.add_element("CatchA", 7);
//!
//! let maps = MemoryMaps::new();
//! maps.add_map("catchments", &["Catchment", "MODFLOW"]);
//!
//! let mut linkage = Linkage::new(LinkageConfig::default(), topology, maps)?;
//! linkage.register_map("catchment", "catchments", true)?;
//! linkage.check_columns("catchment", "catchments")?;
//! linkage.ingest("catchment", "catchments", vec![Fragment::new((1, 1), 11, "CatchA", 250.0)])?;
//!
//! linkage.resolve_cells()?;
//! for row in linkage.export_rows()? {
//!     println!("{:?}", row.columns);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Collaborators
//!
//! | Trait | Memory impl | Provides |
//! |-------|-------------|----------|
//! | `Topology` | `MemoryTopology` | Elements by name/type, arcs |
//! | `MapSource` | `MemoryMaps` | Map columns, area attributes |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod topology;
pub mod diagnostics;
pub mod aggregate;
pub mod record;
pub mod validate;
pub mod feature;
pub mod engine;
pub mod config;
pub mod export;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Cell, CellId, CellCandidate, CellRecord, ConsolidatedCell,
    Fragment, ExportRow, AttrValue, AttributeMap,
};

// ============================================================================
// Re-exports: Collaborators
// ============================================================================

pub use topology::{
    Topology, MapSource, Element, ElementId, Edge, Area, TypeId,
    MemoryTopology, MemoryMaps,
};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use aggregate::{CellAggregator, Metric, MetricDescending, OrderingCriteria, ResolvedCells};
pub use config::{LinkageConfig, SuperpositionPair};
pub use diagnostics::{CheckOutcome, Diagnostic, Ledger, ProcessLine, ProcessTrail, Severity, Status};
pub use engine::FeatureEngine;
pub use feature::{FeatureProfile, MapRegistry};

use diagnostics::{GEOCHECK, TemplateArgs, code};
use indexmap::IndexMap;
use validate::SuperpositionChecker;

// ============================================================================
// Top-level Linkage handle
// ============================================================================

/// The primary entry point. A `Linkage` owns one `FeatureEngine` per
/// configured feature type plus the collaborators they read from.
///
/// Cross-feature findings (superposition) go to a general ledger under
/// the `geocheck` type.
pub struct Linkage<T: Topology, S: MapSource> {
    config: LinkageConfig,
    topology: T,
    maps: S,
    engines: Vec<FeatureEngine>,
    ledger: Ledger,
    trail: ProcessTrail,
}

impl<T: Topology, S: MapSource> Linkage<T, S> {
    /// Validate `config` and create one engine per configured feature.
    pub fn new(config: LinkageConfig, topology: T, maps: S) -> Result<Self> {
        config.validate()?;
        let engines = config
            .features
            .iter()
            .map(|p| FeatureEngine::from_config(&config, &p.feature_type))
            .collect::<Result<Vec<_>>>()?;
        let trail = ProcessTrail::new(config.templates());

        Ok(Self {
            config,
            topology,
            maps,
            engines,
            ledger: Ledger::new(),
            trail,
        })
    }

    pub fn config(&self) -> &LinkageConfig {
        &self.config
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    pub fn maps(&self) -> &S {
        &self.maps
    }

    /// Engines in configuration order.
    pub fn engines(&self) -> impl Iterator<Item = &FeatureEngine> {
        self.engines.iter()
    }

    pub fn engine(&self, feature_type: &str) -> Result<&FeatureEngine> {
        self.engines
            .iter()
            .find(|e| e.feature_type() == feature_type)
            .ok_or_else(|| Error::UnknownFeature(feature_type.to_string()))
    }

    pub fn engine_mut(&mut self, feature_type: &str) -> Result<&mut FeatureEngine> {
        find_engine_mut(&mut self.engines, feature_type)
    }

    // ------------------------------------------------------------------------
    // Per-feature steps
    // ------------------------------------------------------------------------

    pub fn register_map(&mut self, feature_type: &str, map_name: &str, is_main: bool) -> Result<()> {
        self.engine_mut(feature_type)?.register_map(map_name, is_main);
        Ok(())
    }

    pub fn check_columns(&mut self, feature_type: &str, map_name: &str) -> Result<CheckOutcome> {
        find_engine_mut(&mut self.engines, feature_type)?.check_columns(&self.maps, map_name)
    }

    pub fn check_names_with_topology(&mut self, feature_type: &str) -> Result<CheckOutcome> {
        find_engine_mut(&mut self.engines, feature_type)?.check_names_with_topology(&self.topology, &self.maps)
    }

    pub fn check_names_between_maps(&mut self, feature_type: &str) -> Result<CheckOutcome> {
        find_engine_mut(&mut self.engines, feature_type)?.check_names_between_maps(&self.maps)
    }

    pub fn ingest<I>(&mut self, feature_type: &str, map_name: &str, fragments: I) -> Result<usize>
    where
        I: IntoIterator<Item = Fragment>,
    {
        self.engine_mut(feature_type)?.ingest(map_name, fragments)
    }

    // ------------------------------------------------------------------------
    // Cells and export
    // ------------------------------------------------------------------------

    /// Resolve every engine and return the consolidated cells.
    pub fn resolve_cells(&mut self) -> Result<Vec<ConsolidatedCell<'_>>> {
        for engine in &mut self.engines {
            engine.resolve();
        }
        self.consolidate()
    }

    /// Union of all resolved cells in first-seen order, feature types in
    /// configuration order. Fails if any engine is unresolved.
    pub fn consolidate(&self) -> Result<Vec<ConsolidatedCell<'_>>> {
        let mut cells: IndexMap<Cell, ConsolidatedCell<'_>> = IndexMap::new();

        for engine in &self.engines {
            for record in engine.resolved()?.iter() {
                cells
                    .entry(record.cell)
                    .or_insert_with(|| ConsolidatedCell::new(record.cell))
                    .records
                    .push((engine.feature_type(), record));
            }
        }
        Ok(cells.into_values().collect())
    }

    /// Column names of an export row, in row order.
    pub fn export_header(&self) -> Vec<String> {
        let mut header = vec![self.config.row_column.clone(), self.config.col_column.clone()];
        header.extend(self.engines.iter().flat_map(|e| e.main_column_names()));
        header.extend(self.engines.iter().flat_map(|e| e.secondary_column_names()));
        header
    }

    /// `row, col, <main columns per feature>, <secondary columns per feature>`.
    pub fn build_export_row(&mut self, cell: &Cell) -> Result<ExportRow> {
        let mut row = ExportRow::new();
        row.push(self.config.row_column.clone(), cell.row.to_string());
        row.push(self.config.col_column.clone(), cell.col.to_string());

        for engine in &mut self.engines {
            row.extend(engine.main_columns(cell)?);
        }
        for engine in &mut self.engines {
            row.extend(engine.secondary_columns(cell)?);
        }
        Ok(row)
    }

    /// One export row per consolidated cell.
    pub fn export_rows(&mut self) -> Result<Vec<ExportRow>> {
        let cells: Vec<Cell> = self.consolidate()?.iter().map(|c| c.cell).collect();
        cells.iter().map(|cell| self.build_export_row(cell)).collect()
    }

    // ------------------------------------------------------------------------
    // Cross-feature checks
    // ------------------------------------------------------------------------

    /// Run every configured superposition pair over the consolidated cells.
    ///
    /// Pairs whose features have no imported map are skipped. A pair with
    /// no node type id for one of its features is reported under
    /// `geocheck` and the remaining pairs still run. The outcome holds the
    /// messages of this run only; the ledger keeps all of them.
    pub fn check_superposition(&mut self) -> Result<CheckOutcome> {
        let mut messages = Vec::new();

        for pair in self.config.superposition_pairs.clone() {
            let base = self.engine(&pair.base)?;
            let secondary = self.engine(&pair.secondary)?;
            if base.maps().imported().next().is_none() || secondary.maps().imported().next().is_none() {
                tracing::debug!(base = %pair.base, secondary = %pair.secondary, "superposition pair skipped");
                continue;
            }

            let (Some(base_type), Some(secondary_type)) =
                (self.config.node_type_id(&pair.base), self.config.node_type_id(&pair.secondary))
            else {
                let missing: Vec<&str> = [pair.base.as_str(), pair.secondary.as_str()]
                    .into_iter()
                    .filter(|ft| self.config.node_type_id(ft).is_none())
                    .collect();
                let msg = format!(
                    "Superposition between [{}] and [{}] not checked: no node type id configured for [{}].",
                    pair.base,
                    pair.secondary,
                    missing.join(", ")
                );
                tracing::warn!(base = %pair.base, secondary = %pair.secondary, "{msg}");
                self.ledger.append_once(msg.clone(), GEOCHECK, false, code::NONE);
                self.trail.log_step(
                    config::step::CHECK_SUPERPOSITION,
                    true,
                    &TemplateArgs::new().arg("base", &pair.base).arg("secondary", &pair.secondary),
                );
                messages.push(msg);
                continue;
            };
            let mut checker = SuperpositionChecker::new(&pair.base, base_type, &pair.secondary, secondary_type);

            let mut pairs = Vec::new();
            for consolidated in self.consolidate()? {
                let base_names = base.names_in_cell(&consolidated.cell)?;
                let secondary_names = secondary.names_in_cell(&consolidated.cell)?;
                if !base_names.is_empty() && !secondary_names.is_empty() {
                    pairs.push((base_names, secondary_names));
                }
            }
            let found = checker.run(&self.topology, pairs)?;

            for msg in &found {
                self.ledger.append_once(msg.clone(), GEOCHECK, false, code::NONE);
            }
            self.trail.log_step(
                config::step::CHECK_SUPERPOSITION,
                !found.is_empty(),
                &TemplateArgs::new().arg("base", &pair.base).arg("secondary", &pair.secondary),
            );
            messages.extend(found);
        }

        Ok(CheckOutcome { failed: !messages.is_empty(), messages })
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    /// Ledger entries of `feature_type` (or `geocheck`); an empty code
    /// matches all.
    pub fn diagnostics(&self, feature_type: &str, code: &str) -> Result<Vec<&Diagnostic>> {
        if feature_type == GEOCHECK {
            return Ok(self.ledger.select(GEOCHECK, code));
        }
        Ok(self.engine(feature_type)?.diagnostics(code))
    }

    /// Whether any of `feature_types` has an error under `code`.
    pub fn has_errors(&self, feature_types: &[&str], code: &str) -> bool {
        feature_types.iter().any(|&ft| {
            if ft == GEOCHECK {
                self.ledger.has_errors(GEOCHECK, code)
            } else {
                self.engine(ft).is_ok_and(|e| e.has_errors(code))
            }
        })
    }

    pub fn process_trail(&self, feature_type: &str) -> Result<&[ProcessLine]> {
        if feature_type == GEOCHECK {
            return Ok(self.trail.lines());
        }
        Ok(self.engine(feature_type)?.process_trail())
    }

    /// Ledger of cross-feature findings.
    pub fn general_ledger(&self) -> &Ledger {
        &self.ledger
    }
}

fn find_engine_mut<'a>(engines: &'a mut [FeatureEngine], feature_type: &str) -> Result<&'a mut FeatureEngine> {
    engines
        .iter_mut()
        .find(|e| e.feature_type() == feature_type)
        .ok_or_else(|| Error::UnknownFeature(feature_type.to_string()))
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Map source error: {0}")]
    MapSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown feature type: {0}")]
    UnknownFeature(String),

    #[error("Cells of [{0}] are not resolved")]
    NotResolved(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn linkage() -> Linkage<MemoryTopology, MemoryMaps> {
        Linkage::new(LinkageConfig::default(), MemoryTopology::new(), MemoryMaps::new()).unwrap()
    }

    #[test]
    fn engines_follow_configuration_order() {
        let l = linkage();
        let types: Vec<&str> = l.engines().map(|e| e.feature_type()).collect();
        assert_eq!(types, vec!["catchment", "groundwater", "river", "demand_site"]);
        assert!(matches!(l.engine("lake"), Err(Error::UnknownFeature(_))));
    }

    #[test]
    fn consolidate_before_resolve_fails() {
        let l = linkage();
        assert!(matches!(l.consolidate(), Err(Error::NotResolved(_))));
    }

    #[test]
    fn export_header_of_default_config() {
        let l = linkage();
        assert_eq!(l.export_header(), vec![
            "row", "column", "CATCHME1", "GROUNDW1", "RIVERRE1", "DEMAND1", "DEMAND2", "DEMAND3", "DEMAND4",
        ]);
    }

    #[test]
    fn empty_run_has_no_rows_and_no_diagnostics() {
        let mut l = linkage();
        assert!(l.resolve_cells().unwrap().is_empty());
        assert!(l.export_rows().unwrap().is_empty());
        assert!(l.check_superposition().unwrap().is_ok());
        assert!(!l.has_errors(&["catchment", "groundwater", "river", "demand_site", GEOCHECK], ""));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = LinkageConfig::default();
        config.row_column.clear();
        let res = Linkage::new(config, MemoryTopology::new(), MemoryMaps::new());
        assert!(matches!(res, Err(Error::Config(_))));
    }
}
