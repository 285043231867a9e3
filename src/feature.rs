//! Feature profiles and map registry.
//!
//! Per-feature-type behavior is data, not code: a `FeatureProfile` says
//! which attribute identifies a feature, how candidates are ranked and how
//! many export columns the planning model reserves for it.

use serde::{Deserialize, Serialize};

use crate::aggregate::Metric;

/// Canonical feature type names.
pub mod feature_type {
    pub const CATCHMENT: &str = "catchment";
    pub const GROUNDWATER: &str = "groundwater";
    pub const RIVER: &str = "river";
    pub const DEMAND_SITE: &str = "demand_site";
}

/// Maximum width of a main export column name.
const MAIN_PREFIX_LEN: usize = 7;
/// Characters of the map name kept in a secondary column name.
const SECONDARY_MAP_LEN: usize = 9;

// ============================================================================
// FeatureProfile
// ============================================================================

/// Capability description of one feature type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureProfile {
    pub feature_type: String,
    /// Attribute holding the feature name. Required in every map.
    pub main_field: String,
    /// Optional attribute; a missing column is only a warning.
    #[serde(default)]
    pub limit_field: Option<String>,
    pub metric: Metric,
    /// Number of main export columns.
    pub columns_to_save: usize,
    /// Linkage column prefix, e.g. `CATCHMENT`.
    pub column_prefix: String,
}

impl FeatureProfile {
    pub fn new(
        feature_type: impl Into<String>,
        main_field: impl Into<String>,
        metric: Metric,
        columns_to_save: usize,
        column_prefix: impl Into<String>,
    ) -> Self {
        Self {
            feature_type: feature_type.into(),
            main_field: main_field.into(),
            limit_field: None,
            metric,
            columns_to_save,
            column_prefix: column_prefix.into(),
        }
    }

    pub fn with_limit_field(mut self, field: impl Into<String>) -> Self {
        self.limit_field = Some(field.into());
        self
    }

    pub fn catchment() -> Self {
        Self::new(feature_type::CATCHMENT, "Catchment", Metric::Area, 1, "CATCHMENT")
            .with_limit_field("MODFLOW")
    }

    pub fn groundwater() -> Self {
        Self::new(feature_type::GROUNDWATER, "GW", Metric::Area, 1, "GROUNDWAT")
    }

    pub fn river() -> Self {
        Self::new(feature_type::RIVER, "river_name", Metric::Length, 1, "RIVERREAC")
    }

    pub fn demand_site() -> Self {
        Self::new(feature_type::DEMAND_SITE, "DS", Metric::Area, 4, "DEMAND")
    }

    pub fn feature_type(&self) -> &str {
        &self.feature_type
    }

    pub fn ordering_metric(&self) -> Metric {
        self.metric
    }

    /// Main export column names: `prefix[..7] + 1..=columns_to_save`.
    pub fn main_columns(&self) -> Vec<String> {
        let prefix = truncate(&self.column_prefix, MAIN_PREFIX_LEN);
        (1..=self.columns_to_save).map(|i| format!("{prefix}{i}")).collect()
    }

    /// Secondary column name for a map: `prefix[0] + map[..9]`.
    pub fn secondary_column(&self, map_name: &str) -> String {
        format!(
            "{}{}",
            truncate(&self.column_prefix, 1),
            truncate(map_name, SECONDARY_MAP_LEN)
        )
    }

    /// Secondary column names for maps in registry order.
    pub fn secondary_columns<'a>(&self, map_names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        map_names.into_iter().map(|m| self.secondary_column(m)).collect()
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

// ============================================================================
// MapRegistry
// ============================================================================

/// Geometry kind of a map's intersection output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Areas,
    Lines,
}

/// A feature map registered with an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    pub name: String,
    pub is_main: bool,
    pub imported: bool,
    pub geometry: GeometryKind,
}

/// Maps of one feature type, in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapRegistry {
    entries: Vec<MapEntry>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a map. Re-registering a name updates its main flag in place.
    pub fn register(&mut self, name: &str, is_main: bool) -> &mut MapEntry {
        let pos = match self.entries.iter().position(|e| e.name == name) {
            Some(pos) => {
                self.entries[pos].is_main = is_main;
                pos
            }
            None => {
                self.entries.push(MapEntry {
                    name: name.to_string(),
                    is_main,
                    imported: false,
                    geometry: GeometryKind::Areas,
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos]
    }

    pub fn get(&self, name: &str) -> Option<&MapEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut MapEntry> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    pub fn set_imported(&mut self, name: &str, imported: bool) {
        if let Some(e) = self.get_mut(name) {
            e.imported = imported;
        }
    }

    pub fn set_geometry(&mut self, name: &str, geometry: GeometryKind) {
        if let Some(e) = self.get_mut(name) {
            e.geometry = geometry;
        }
    }

    /// All registered maps.
    pub fn iter(&self) -> impl Iterator<Item = &MapEntry> {
        self.entries.iter()
    }

    /// Imported maps, main map included.
    pub fn imported(&self) -> impl Iterator<Item = &MapEntry> {
        self.entries.iter().filter(|e| e.imported)
    }

    /// The first imported map flagged as main.
    pub fn main_map(&self) -> Option<&MapEntry> {
        self.imported().find(|e| e.is_main)
    }

    /// Imported maps other than the main map, in registration order.
    pub fn secondary_maps(&self) -> Vec<&MapEntry> {
        let main = self.main_map().map(|m| m.name.as_str());
        self.imported().filter(|e| Some(e.name.as_str()) != main).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
