//! Linkage configuration.
//!
//! Everything here has a default matching the planning model's metadata
//! schema, so a JSON file only needs to name what differs. Node type ids
//! depend on the reference topology and have no default; until they are
//! set, superposition pairs are reported as not checked.

use hashbrown::HashMap;
use std::io::Read;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::feature::{FeatureProfile, feature_type};
use crate::topology::TypeId;
use crate::{Error, Result};

/// Step names understood by the default templates.
pub mod step {
    pub const CHECK_BASIC_COLUMNS: &str = "check_basic_columns";
    pub const CHECK_NAMES_WITH_GEO: &str = "check_names_with_geo";
    pub const CHECK_NAMES_BETWEEN_MAPS: &str = "check_names_between_maps";
    pub const CELL_DATA_MAIN_MAP: &str = "make_cell_data_by_main_map";
    pub const CELL_DATA_SECONDARY_MAPS: &str = "make_cell_data_by_secondary_maps";
    pub const RESOLVE_CELLS: &str = "resolve_cells";
    pub const CHECK_SUPERPOSITION: &str = "check_superposition";
}

/// A base/secondary feature type pair whose co-located features must be
/// connected in the reference topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperpositionPair {
    pub base: String,
    pub secondary: String,
}

impl SuperpositionPair {
    pub fn new(base: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self { base: base.into(), secondary: secondary.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkageConfig {
    /// Export key column holding the cell row.
    pub row_column: String,
    /// Export key column holding the cell column.
    pub col_column: String,
    /// Process Trail templates by step name.
    pub process_messages: HashMap<String, String>,
    /// Reference-topology node type id per feature type.
    pub node_type_ids: HashMap<String, TypeId>,
    pub superposition_pairs: Vec<SuperpositionPair>,
    /// Feature types in export order.
    pub features: Vec<FeatureProfile>,
}

impl Default for LinkageConfig {
    fn default() -> Self {
        Self {
            row_column: "row".to_string(),
            col_column: "column".to_string(),
            process_messages: default_messages(),
            node_type_ids: HashMap::new(),
            superposition_pairs: vec![
                SuperpositionPair::new(feature_type::GROUNDWATER, feature_type::DEMAND_SITE),
                SuperpositionPair::new(feature_type::GROUNDWATER, feature_type::CATCHMENT),
            ],
            features: vec![
                FeatureProfile::catchment(),
                FeatureProfile::groundwater(),
                FeatureProfile::river(),
                FeatureProfile::demand_site(),
            ],
        }
    }
}

impl LinkageConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_node_type(mut self, feature_type: impl Into<String>, type_id: TypeId) -> Self {
        self.node_type_ids.insert(feature_type.into(), type_id);
        self
    }

    pub fn with_message(mut self, step: impl Into<String>, template: impl Into<String>) -> Self {
        self.process_messages.insert(step.into(), template.into());
        self
    }

    pub fn node_type_id(&self, feature_type: &str) -> Option<TypeId> {
        self.node_type_ids.get(feature_type).copied()
    }

    pub fn profile(&self, feature_type: &str) -> Option<&FeatureProfile> {
        self.features.iter().find(|p| p.feature_type == feature_type)
    }

    /// Templates shared by every trail built from this config.
    pub fn templates(&self) -> Arc<HashMap<String, String>> {
        Arc::new(self.process_messages.clone())
    }

    /// Reject configurations no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.row_column.is_empty() || self.col_column.is_empty() {
            return Err(Error::Config("row and column key names must not be empty".into()));
        }

        for (i, profile) in self.features.iter().enumerate() {
            if profile.feature_type.is_empty() || profile.main_field.is_empty() {
                return Err(Error::Config(format!("feature #{i} needs a type and a main field")));
            }
            if profile.columns_to_save == 0 {
                return Err(Error::Config(format!(
                    "feature [{}] must save at least one column",
                    profile.feature_type
                )));
            }
            if self.features[..i].iter().any(|p| p.feature_type == profile.feature_type) {
                return Err(Error::Config(format!("feature [{}] is configured twice", profile.feature_type)));
            }
        }

        for pair in &self.superposition_pairs {
            for ft in [&pair.base, &pair.secondary] {
                if self.profile(ft).is_none() {
                    return Err(Error::Config(format!(
                        "superposition pair [{}, {}] names unknown feature [{ft}]",
                        pair.base, pair.secondary
                    )));
                }
            }
        }
        Ok(())
    }
}

fn default_messages() -> HashMap<String, String> {
    [
        (step::CHECK_BASIC_COLUMNS, "Checking required columns for [{map_name}]: {columns}"),
        (step::CHECK_NAMES_WITH_GEO, "Checking map names against node and arc geometries"),
        (step::CHECK_NAMES_BETWEEN_MAPS, "Checking geometry names between maps"),
        (
            step::CELL_DATA_MAIN_MAP,
            "Processing [{geometry}] intersection of main map [{map_name}] with linkage",
        ),
        (
            step::CELL_DATA_SECONDARY_MAPS,
            "Processing [{geometry}] intersection of secondary map [{map_name}] with linkage",
        ),
        (step::RESOLVE_CELLS, "Resolving [{cells}] linkage cells"),
        (
            step::CHECK_SUPERPOSITION,
            "Checking superposition between [{base}] and [{secondary}]",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
