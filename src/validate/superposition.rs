//! Superposition (connectivity) check.
//!
//! When a base feature and a secondary feature share a grid cell, the
//! reference topology must hold an arc between them. The check runs in
//! three phases:
//!
//! ```text
//! Init ──init()──► EdgeScan ──scan_edges()──► CellScan ──finish()──► Done
//!                                               │  ▲
//!                                               └──┘ scan_cell()
//! ```
//!
//! Arc direction is ignored: an arc is always recorded under its
//! base-type endpoint.

use hashbrown::HashMap;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::topology::{Element, ElementId, Topology, TypeId};
use crate::validate::names::join;
use crate::{Error, Result};

/// Where a checker is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Init,
    EdgeScan,
    CellScan,
    Done,
}

// ============================================================================
// ConnectionGraph
// ============================================================================

/// Base name → connected secondary names, both in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionGraph {
    entries: IndexMap<String, IndexSet<String>>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `base → secondary`; duplicates are ignored.
    pub fn connect(&mut self, base: &str, secondary: &str) {
        self.entries.entry(base.to_string()).or_default().insert(secondary.to_string());
    }

    pub fn is_connected(&self, base: &str, secondary: &str) -> bool {
        self.partners(base).is_some_and(|p| p.contains(secondary))
    }

    pub fn partners(&self, base: &str) -> Option<&IndexSet<String>> {
        self.entries.get(base)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexSet<String>)> {
        self.entries.iter().map(|(b, s)| (b.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// SuperpositionChecker
// ============================================================================

/// One base/secondary feature pair to check.
#[derive(Debug, Clone)]
pub struct SuperpositionChecker {
    base_feature: String,
    base_type_id: TypeId,
    secondary_feature: String,
    secondary_type_id: TypeId,
    phase: Phase,
    /// Topology elements of either type, by id.
    elements: HashMap<ElementId, Element>,
    connections: ConnectionGraph,
    /// base name → secondary names found without an arc
    missing: ConnectionGraph,
}

impl SuperpositionChecker {
    pub fn new(
        base_feature: impl Into<String>,
        base_type_id: TypeId,
        secondary_feature: impl Into<String>,
        secondary_type_id: TypeId,
    ) -> Self {
        Self {
            base_feature: base_feature.into(),
            base_type_id,
            secondary_feature: secondary_feature.into(),
            secondary_type_id,
            phase: Phase::Init,
            elements: HashMap::new(),
            connections: ConnectionGraph::new(),
            missing: ConnectionGraph::new(),
        }
    }

    pub fn name(&self) -> String {
        format!("Superposition check between {} and {}", self.base_feature, self.secondary_feature)
    }

    pub fn base_feature(&self) -> &str {
        &self.base_feature
    }

    pub fn secondary_feature(&self) -> &str {
        &self.secondary_feature
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn connections(&self) -> &ConnectionGraph {
        &self.connections
    }

    fn expect_phase(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::InvalidState(format!(
                "{}: expected phase {expected:?}, found {:?}",
                self.name(),
                self.phase
            )));
        }
        Ok(())
    }

    /// INIT: collect the topology elements of the two configured types.
    pub fn init<T: Topology + ?Sized>(&mut self, topology: &T) -> Result<()> {
        self.expect_phase(Phase::Init)?;
        for element in topology.elements()? {
            if element.type_id == self.base_type_id || element.type_id == self.secondary_type_id {
                self.elements.insert(element.id, element);
            }
        }
        self.phase = Phase::EdgeScan;
        Ok(())
    }

    /// EDGE-SCAN: record every arc joining a base and a secondary element.
    pub fn scan_edges<T: Topology + ?Sized>(&mut self, topology: &T) -> Result<()> {
        self.expect_phase(Phase::EdgeScan)?;
        for edge in topology.edges()? {
            let Some((src, dst)) = edge.endpoints() else { continue };
            let (Some(src), Some(dst)) = (self.elements.get(&src), self.elements.get(&dst)) else {
                continue;
            };

            if src.type_id == self.base_type_id && dst.type_id == self.secondary_type_id {
                self.connections.connect(&src.name, &dst.name);
            } else if src.type_id == self.secondary_type_id && dst.type_id == self.base_type_id {
                self.connections.connect(&dst.name, &src.name);
            }
        }
        tracing::debug!(
            check = %self.name(),
            elements = self.elements.len(),
            connected = self.connections.len(),
            "superposition edges scanned"
        );
        self.phase = Phase::CellScan;
        Ok(())
    }

    /// CELL-SCAN: every base/secondary pair sharing a cell must be connected.
    pub fn scan_cell<B, S>(&mut self, base_names: &[B], secondary_names: &[S]) -> Result<()>
    where
        B: AsRef<str>,
        S: AsRef<str>,
    {
        self.expect_phase(Phase::CellScan)?;
        for base in base_names {
            for secondary in secondary_names {
                let (base, secondary) = (base.as_ref(), secondary.as_ref());
                if !self.connections.is_connected(base, secondary) {
                    self.missing.connect(base, secondary);
                }
            }
        }
        Ok(())
    }

    /// Close the run and return one message per base name with missing
    /// partners.
    pub fn finish(&mut self) -> Result<Vec<String>> {
        self.expect_phase(Phase::CellScan)?;
        self.phase = Phase::Done;
        Ok(self
            .missing
            .iter()
            .map(|(base, secondaries)| {
                format!(
                    "Element [{base}] of type [{}] is not connected to elements [{}] of type [{}].",
                    self.base_feature,
                    join(secondaries),
                    self.secondary_feature
                )
            })
            .collect())
    }

    /// Run all phases over `cells`, each item being the base and secondary
    /// names present in one cell.
    pub fn run<T, I, B, S>(&mut self, topology: &T, cells: I) -> Result<Vec<String>>
    where
        T: Topology + ?Sized,
        I: IntoIterator<Item = (Vec<B>, Vec<S>)>,
        B: AsRef<str>,
        S: AsRef<str>,
    {
        self.init(topology)?;
        self.scan_edges(topology)?;
        for (base, secondary) in cells {
            self.scan_cell(&base, &secondary)?;
        }
        self.finish()
    }
}
