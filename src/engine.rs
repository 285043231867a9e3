//! Per-feature-type engine.
//!
//! A `FeatureEngine` owns everything one feature type accumulates during
//! a run: its maps, ledger, process trail, summary, the aggregation
//! builder and, once resolved, the immutable cell snapshot. Engines never
//! share state; the `Linkage` handle coordinates them.
//!
//! ```text
//! register_map ─► check_columns ─► check_names_* ─► ingest* ─► resolve ─► main/secondary columns
//!                   (imported?)       (10 / 11)                  (snapshot)
//! ```

use hashbrown::HashMap;
use std::sync::Arc;

use crate::aggregate::{CellAggregator, MetricDescending, OrderingCriteria, ResolvedCells};
use crate::config::{LinkageConfig, step};
use crate::diagnostics::{CheckOutcome, Diagnostic, Ledger, ProcessLine, ProcessTrail, Summary, TemplateArgs};
use crate::feature::{FeatureProfile, GeometryKind, MapEntry, MapRegistry};
use crate::model::{Cell, CellCandidate, CellRecord, Fragment};
use crate::record::RecordBuilder;
use crate::topology::{MapSource, Topology, TypeId};
use crate::validate::{self, FeatureNameIndex};
use crate::{Error, Result};

pub struct FeatureEngine {
    profile: FeatureProfile,
    node_type_id: Option<TypeId>,
    maps: MapRegistry,
    ledger: Ledger,
    trail: ProcessTrail,
    summary: Summary,
    aggregator: CellAggregator,
    name_index: Option<FeatureNameIndex>,
    resolved: Option<ResolvedCells>,
}

impl FeatureEngine {
    pub fn new(
        profile: FeatureProfile,
        node_type_id: Option<TypeId>,
        templates: Arc<HashMap<String, String>>,
    ) -> Self {
        let mut summary = Summary::new(profile.feature_type.clone());
        summary.set_input_param("FIELD NAME", format!("[{}]", profile.main_field));

        Self {
            aggregator: CellAggregator::new(profile.metric),
            node_type_id,
            maps: MapRegistry::new(),
            ledger: Ledger::new(),
            trail: ProcessTrail::new(templates),
            summary,
            name_index: None,
            resolved: None,
            profile,
        }
    }

    /// Engine for `feature_type` as described by `config`.
    pub fn from_config(config: &LinkageConfig, feature_type: &str) -> Result<Self> {
        let profile = config
            .profile(feature_type)
            .ok_or_else(|| Error::UnknownFeature(feature_type.to_string()))?;
        Ok(Self::new(profile.clone(), config.node_type_id(feature_type), config.templates()))
    }

    pub fn feature_type(&self) -> &str {
        &self.profile.feature_type
    }

    pub fn profile(&self) -> &FeatureProfile {
        &self.profile
    }

    pub fn node_type_id(&self) -> Option<TypeId> {
        self.node_type_id
    }

    pub fn maps(&self) -> &MapRegistry {
        &self.maps
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    // ========================================================================
    // Maps
    // ========================================================================

    /// Register a feature map. It stays un-imported until its columns pass
    /// `check_columns` or it is marked imported explicitly.
    pub fn register_map(&mut self, map_name: &str, is_main: bool) -> &mut MapEntry {
        self.summary.start();
        self.summary.set_input_param(format!("MAP {map_name}"), "[not imported]");
        self.maps.register(map_name, is_main)
    }

    /// Mark a registered map imported without checking its columns.
    pub fn mark_imported(&mut self, map_name: &str) -> Result<()> {
        self.registered(map_name)?;
        self.set_imported(map_name, true);
        Ok(())
    }

    fn set_imported(&mut self, map_name: &str, imported: bool) {
        self.maps.set_imported(map_name, imported);
        let state = if imported { "[imported]" } else { "[not imported]" };
        self.summary.set_input_param(format!("MAP {map_name}"), state);
        // a different set of maps means a different name index
        self.name_index = None;
    }

    fn registered(&self, map_name: &str) -> Result<&MapEntry> {
        self.maps.get(map_name).ok_or_else(|| {
            Error::NotFound(format!("map [{map_name}] is not registered for [{}]", self.profile.feature_type))
        })
    }

    // ========================================================================
    // Checks
    // ========================================================================

    /// Schema check (code `20`). The map becomes imported when no required
    /// column is missing.
    pub fn check_columns<S: MapSource + ?Sized>(&mut self, source: &S, map_name: &str) -> Result<CheckOutcome> {
        self.registered(map_name)?;
        let out = validate::check_columns(source, map_name, &self.profile, &mut self.ledger, &mut self.trail)?;
        self.set_imported(map_name, !out.failed);
        Ok(out)
    }

    /// Use an index built elsewhere, e.g. from a topology traversal.
    pub fn set_name_index(&mut self, index: FeatureNameIndex) {
        self.name_index = Some(index);
    }

    /// The name → maps index, built from the imported maps' main field
    /// when absent or empty.
    pub fn name_index<S: MapSource + ?Sized>(&mut self, source: &S) -> Result<&FeatureNameIndex> {
        let stale = self.name_index.as_ref().is_none_or(FeatureNameIndex::is_empty);
        if stale {
            let maps: Vec<&str> = self.maps.imported().map(|m| m.name.as_str()).collect();
            let index = FeatureNameIndex::from_maps(source, maps, &self.profile.main_field)?;
            tracing::debug!(feature_type = %self.profile.feature_type, names = index.len(), "name index built");
            self.name_index = Some(index);
        }
        Ok(self.name_index.get_or_insert_with(FeatureNameIndex::new))
    }

    /// Code `10`: every name in the imported maps exists in the topology.
    pub fn check_names_with_topology<T, S>(&mut self, topology: &T, source: &S) -> Result<CheckOutcome>
    where
        T: Topology + ?Sized,
        S: MapSource + ?Sized,
    {
        self.name_index(source)?;
        let index = self.name_index.get_or_insert_with(FeatureNameIndex::new);
        let out = validate::check_existence(
            index,
            topology,
            self.node_type_id,
            &self.profile.feature_type,
            &mut self.ledger,
        )?;
        self.trail.log_step(step::CHECK_NAMES_WITH_GEO, out.failed, &TemplateArgs::new());
        Ok(out)
    }

    /// Code `11`: no name is owned by more than one imported map.
    pub fn check_names_between_maps<S: MapSource + ?Sized>(&mut self, source: &S) -> Result<CheckOutcome> {
        self.name_index(source)?;
        let index = self.name_index.get_or_insert_with(FeatureNameIndex::new);
        let out = validate::check_uniqueness(index, &self.profile.feature_type, &mut self.ledger);
        self.trail.log_step(step::CHECK_NAMES_BETWEEN_MAPS, out.failed, &TemplateArgs::new());
        Ok(out)
    }

    pub fn has_errors(&self, code: &str) -> bool {
        self.ledger.has_errors(&self.profile.feature_type, code)
    }

    /// Ledger entries of this feature type; an empty code matches all.
    pub fn diagnostics(&self, code: &str) -> Vec<&Diagnostic> {
        self.ledger.select(&self.profile.feature_type, code)
    }

    pub fn process_trail(&self) -> &[ProcessLine] {
        self.trail.lines()
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// Feed the overlay fragments of an imported map. Returns the number
    /// of fragments taken. Any previous snapshot is dropped.
    pub fn ingest<I>(&mut self, map_name: &str, fragments: I) -> Result<usize>
    where
        I: IntoIterator<Item = Fragment>,
    {
        let entry = self.registered(map_name)?;
        if !entry.imported {
            return Err(Error::InvalidState(format!(
                "map [{map_name}] of [{}] is not imported",
                self.profile.feature_type
            )));
        }
        let is_main = self.maps.main_map().is_some_and(|m| m.name == map_name);
        let geometry = entry.geometry;

        let mut taken = 0;
        for fragment in fragments {
            if fragment.name.is_empty() {
                continue;
            }
            self.aggregator.accumulate_fragment(map_name, fragment);
            taken += 1;
        }
        self.resolved = None;

        let step = if is_main { step::CELL_DATA_MAIN_MAP } else { step::CELL_DATA_SECONDARY_MAPS };
        let kind = match geometry {
            GeometryKind::Areas => "areas",
            GeometryKind::Lines => "lines",
        };
        self.trail.log_step(step, false, &TemplateArgs::new().arg("map_name", map_name).arg("geometry", kind));
        tracing::debug!(feature_type = %self.profile.feature_type, map = map_name, fragments = taken, "fragments ingested");
        Ok(taken)
    }

    /// Add a single candidate directly.
    pub fn accumulate(&mut self, cell: Cell, candidate: CellCandidate) {
        self.aggregator.accumulate(cell, candidate);
        self.resolved = None;
    }

    pub fn aggregator(&self) -> &CellAggregator {
        &self.aggregator
    }

    /// Resolve with metric-descending ordering.
    pub fn resolve(&mut self) -> &ResolvedCells {
        self.resolve_with(&MetricDescending)
    }

    /// Resolve with a custom ordering and keep the snapshot.
    pub fn resolve_with(&mut self, criteria: &dyn OrderingCriteria) -> &ResolvedCells {
        let resolved = self.aggregator.finalize(criteria);

        self.summary.set_stat("PROCESSED CELLS", resolved.len());
        self.summary.set_stat("FEATURES PROCESSED", resolved.feature_names().len());
        self.summary.finish();
        self.trail.log_step(step::RESOLVE_CELLS, false, &TemplateArgs::new().arg("cells", resolved.len()));
        tracing::info!(
            feature_type = %self.profile.feature_type,
            cells = resolved.len(),
            warnings = self.ledger.warnings(&self.profile.feature_type, "").len(),
            errors = self.ledger.errors(&self.profile.feature_type, "").len(),
            "feature resolved"
        );

        self.resolved.insert(resolved)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn resolved(&self) -> Result<&ResolvedCells> {
        self.resolved
            .as_ref()
            .ok_or_else(|| Error::NotResolved(self.profile.feature_type.clone()))
    }

    pub fn record(&self, cell: &Cell) -> Result<Option<&CellRecord>> {
        Ok(self.resolved()?.get(cell))
    }

    /// Every candidate name of an imported map in `cell`.
    pub fn names_in_cell(&self, cell: &Cell) -> Result<Vec<&str>> {
        let Some(record) = self.record(cell)? else {
            return Ok(Vec::new());
        };
        Ok(record
            .candidates
            .iter()
            .filter(|c| self.maps.get(&c.map_name).is_some_and(|m| m.imported))
            .map(|c| c.name.as_str())
            .collect())
    }

    // ========================================================================
    // Export columns
    // ========================================================================

    pub fn main_column_names(&self) -> Vec<String> {
        self.profile.main_columns()
    }

    pub fn secondary_column_names(&self) -> Vec<String> {
        self.profile
            .secondary_columns(self.maps.secondary_maps().iter().map(|m| m.name.as_str()))
    }

    pub fn main_columns(&mut self, cell: &Cell) -> Result<Vec<(String, String)>> {
        let resolved = self
            .resolved
            .as_ref()
            .ok_or_else(|| Error::NotResolved(self.profile.feature_type.clone()))?;
        Ok(RecordBuilder::new(&self.profile, &self.maps, resolved).main_columns(cell, &mut self.ledger))
    }

    pub fn secondary_columns(&mut self, cell: &Cell) -> Result<Vec<(String, String)>> {
        let resolved = self
            .resolved
            .as_ref()
            .ok_or_else(|| Error::NotResolved(self.profile.feature_type.clone()))?;
        Ok(RecordBuilder::new(&self.profile, &self.maps, resolved).secondary_columns(cell, &mut self.ledger))
    }
}

impl std::fmt::Debug for FeatureEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureEngine")
            .field("feature_type", &self.profile.feature_type)
            .field("maps", &self.maps.len())
            .field("cells", &self.aggregator.cell_count())
            .field("resolved", &self.resolved.is_some())
            .field("diagnostics", &self.ledger.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Status;
    use crate::model::attributes;
    use crate::topology::{MemoryMaps, MemoryTopology};

    fn engine() -> FeatureEngine {
        FeatureEngine::from_config(&LinkageConfig::default(), "catchment").unwrap()
    }

    fn maps() -> MemoryMaps {
        let maps = MemoryMaps::new();
        maps.add_map("catch", &["Catchment", "MODFLOW"]);
        maps.add_map("catch_alt", &["Catchment"]);
        maps.add_map("broken", &["NAME"]);
        maps.add_area("catch", Some(1), attributes([("Catchment", "CatchA")])).unwrap();
        maps.add_area("catch_alt", Some(1), attributes([("Catchment", "CatchA")])).unwrap();
        maps.add_area("catch_alt", Some(2), attributes([("Catchment", "CatchB")])).unwrap();
        maps
    }

    #[test]
    fn unknown_feature_type() {
        let err = FeatureEngine::from_config(&LinkageConfig::default(), "lake").unwrap_err();
        assert!(matches!(err, Error::UnknownFeature(_)));
    }

    #[test]
    fn check_columns_controls_import() {
        let source = maps();
        let mut e = engine();
        e.register_map("catch", true);
        e.register_map("broken", false);

        assert!(e.check_columns(&source, "catch").unwrap().is_ok());
        assert!(e.check_columns(&source, "broken").unwrap().failed);
        assert!(e.maps().get("catch").unwrap().imported);
        assert!(!e.maps().get("broken").unwrap().imported);
        assert_eq!(e.summary().input_param("MAP broken"), Some("[not imported]"));
        assert_eq!(e.summary().input_param("MAP catch"), Some("[imported]"));
        assert!(e.has_errors("20"));
    }

    #[test]
    fn check_columns_on_unregistered_map() {
        let mut e = engine();
        assert!(matches!(e.check_columns(&maps(), "catch"), Err(Error::NotFound(_))));
    }

    #[test]
    fn name_checks_report_and_log() {
        let source = maps();
        let topo = MemoryTopology::new();
        topo.add_element("CatchA", 7);

        let mut e = engine();
        e.register_map("catch", true);
        e.register_map("catch_alt", false);
        e.check_columns(&source, "catch").unwrap();
        e.check_columns(&source, "catch_alt").unwrap();

        let existence = e.check_names_with_topology(&topo, &source).unwrap();
        assert_eq!(existence.messages.len(), 1, "CatchB is unknown");

        let uniqueness = e.check_names_between_maps(&source).unwrap();
        assert_eq!(uniqueness.messages.len(), 1, "CatchA is in both maps");

        let tail: Vec<Status> = e.process_trail().iter().rev().take(2).map(|l| l.status).collect();
        assert_eq!(tail, vec![Status::Error, Status::Error]);
        assert_eq!(e.diagnostics("10").len(), 1);
        assert_eq!(e.diagnostics("").len(), 3, "two names plus the MODFLOW warning");
    }

    #[test]
    fn index_and_cells_see_the_same_names() {
        let source = MemoryMaps::new();
        source.add_map("padded", &["Catchment", "MODFLOW"]);
        source.add_area("padded", Some(1), attributes([("Catchment", " CatchA ")])).unwrap();
        let topo = MemoryTopology::new();
        topo.add_element("CatchA", 7);

        let mut e = engine();
        e.register_map("padded", true);
        e.check_columns(&source, "padded").unwrap();
        e.ingest("padded", vec![Fragment::new((0, 0), 1, " CatchA ", 1.0)]).unwrap();
        e.resolve();

        assert!(e.name_index(&source).unwrap().contains(" CatchA "));
        assert_eq!(e.main_columns(&Cell::new(0, 0)).unwrap()[0].1, " CatchA ");
        let out = e.check_names_with_topology(&topo, &source).unwrap();
        assert_eq!(out.messages.len(), 1);
        assert!(out.messages[0].contains("[ CatchA ]"));
    }

    #[test]
    fn ingest_requires_an_imported_map() {
        let mut e = engine();
        e.register_map("catch", true);
        let res = e.ingest("catch", vec![Fragment::new((0, 0), 1, "A", 1.0)]);
        assert!(matches!(res, Err(Error::InvalidState(_))));
        assert!(matches!(e.ingest("nope", Vec::new()), Err(Error::NotFound(_))));
    }

    #[test]
    fn export_needs_resolution_and_ingest_invalidates_it() {
        let mut e = engine();
        e.register_map("catch", true);
        e.mark_imported("catch").unwrap();
        e.ingest("catch", vec![Fragment::new((0, 0), 1, "A", 1.0)]).unwrap();

        assert!(matches!(e.main_columns(&Cell::new(0, 0)), Err(Error::NotResolved(_))));
        e.resolve();
        assert_eq!(e.main_columns(&Cell::new(0, 0)).unwrap(), vec![("CATCHME1".to_string(), "A".to_string())]);

        e.ingest("catch", vec![Fragment::new((0, 0), 1, "B", 5.0)]).unwrap();
        assert!(!e.is_resolved());
        e.resolve();
        assert_eq!(e.main_columns(&Cell::new(0, 0)).unwrap()[0].1, "B");
        assert_eq!(e.summary().stat("PROCESSED CELLS"), Some("1"));
        assert_eq!(e.summary().stat("FEATURES PROCESSED"), Some("2"));
    }

    #[test]
    fn empty_names_are_not_ingested() {
        let mut e = engine();
        e.register_map("catch", true);
        e.mark_imported("catch").unwrap();
        let taken = e
            .ingest("catch", vec![Fragment::new((0, 0), 1, "", 1.0), Fragment::new((0, 1), 2, "A", 1.0)])
            .unwrap();
        assert_eq!(taken, 1);
        assert_eq!(e.resolve().len(), 1);
    }

    #[test]
    fn secondary_column_names_follow_registry() {
        let mut e = engine();
        e.register_map("main", true);
        e.register_map("upper_basin", false);
        e.register_map("skipped", false);
        e.mark_imported("main").unwrap();
        e.mark_imported("upper_basin").unwrap();
        assert_eq!(e.secondary_column_names(), vec!["Cupper_bas"]);
    }
}
