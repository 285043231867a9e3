//! Cross-map name validation.
//!
//! A feature name must exist in the reference topology (code `10`) and
//! must be owned by a single map (code `11`). Both checks read the same
//! name → maps index.

use indexmap::{IndexMap, IndexSet};

use crate::diagnostics::{CheckOutcome, Ledger, code};
use crate::topology::{MapSource, Topology, TypeId};
use crate::Result;

// ============================================================================
// FeatureNameIndex
// ============================================================================

/// Feature name → maps referencing it, both in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureNameIndex {
    entries: IndexMap<String, IndexSet<String>>,
}

impl FeatureNameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `map_name` references `name`. Empty names are ignored.
    pub fn insert(&mut self, name: &str, map_name: &str) {
        if name.is_empty() {
            return;
        }
        self.entries.entry(name.to_string()).or_default().insert(map_name.to_string());
    }

    /// Build the index by scanning `main_field` of every given map.
    ///
    /// Areas with broken topology (no category) or an unset name are
    /// skipped.
    pub fn from_maps<'a, S: MapSource + ?Sized>(
        source: &S,
        map_names: impl IntoIterator<Item = &'a str>,
        main_field: &str,
    ) -> Result<Self> {
        let mut index = Self::new();
        for map_name in map_names {
            for area in source.iterate_areas(map_name)? {
                if area.category.is_none() {
                    continue;
                }
                let name = area.attributes.get(main_field).and_then(|v| v.as_feature_name());
                if let Some(name) = name {
                    index.insert(&name, map_name);
                }
            }
        }
        Ok(index)
    }

    pub fn maps(&self, name: &str) -> Option<&IndexSet<String>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexSet<String>)> {
        self.entries.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Checks
// ============================================================================

/// Code `10`: every indexed name must resolve to a topology element.
///
/// With `type_id` set, only elements of that node type count.
pub fn check_existence<T: Topology + ?Sized>(
    index: &FeatureNameIndex,
    topology: &T,
    type_id: Option<TypeId>,
    feature_type: &str,
    ledger: &mut Ledger,
) -> Result<CheckOutcome> {
    for (name, maps) in index.iter() {
        let found = match type_id {
            Some(t) => topology.element_id_by_name_and_type(name, t)?,
            None => topology.element_id_by_name(name)?,
        };
        if found.is_none() {
            let msg = format!(
                "Name [{name}] in maps [{}] does not exist in the reference topology (nodes and arcs).",
                join(maps)
            );
            ledger.append_once(msg, feature_type, false, code::STRUCTURAL);
        }
    }

    Ok(outcome(ledger, feature_type, code::STRUCTURAL))
}

/// Code `11`: a name may be owned by only one map.
pub fn check_uniqueness(index: &FeatureNameIndex, feature_type: &str, ledger: &mut Ledger) -> CheckOutcome {
    for (name, maps) in index.iter().filter(|(_, maps)| maps.len() > 1) {
        let msg = format!(
            "Name [{name}] is present in more than one map at the same time ([{}]).",
            join(maps)
        );
        ledger.append_once(msg, feature_type, false, code::CONSISTENCY);
    }

    outcome(ledger, feature_type, code::CONSISTENCY)
}

pub(crate) fn join(names: &IndexSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

pub(crate) fn outcome(ledger: &Ledger, feature_type: &str, code: &str) -> CheckOutcome {
    CheckOutcome {
        failed: ledger.has_errors(feature_type, code),
        messages: ledger.errors(feature_type, code),
    }
}
