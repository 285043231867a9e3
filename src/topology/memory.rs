//! In-memory collaborators.
//!
//! These are the reference implementations of `Topology` and `MapSource`.
//! They use plain collections protected by RwLock so fixtures can be built
//! through `&self`, the same way a live backend is filled by its importer.
//!
//! ## Limitations
//!
//! - **No persistence**: everything lives for the lifetime of the value.
//! - **First name wins**: `element_id_by_name()` returns the first element
//!   inserted under a name; use `element_id_by_name_and_type()` when names
//!   repeat across node types.
//!
//! Use these for:
//! - Testing the aggregator, validators and export rows
//! - Embedding gridlink where another tool already did the GIS work

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::model::AttributeMap;
use crate::{Error, Result};
use super::{Area, Edge, Element, ElementId, MapSource, Topology, TypeId};

// ============================================================================
// MemoryTopology
// ============================================================================

/// In-memory reference topology.
#[derive(Clone)]
pub struct MemoryTopology {
    inner: Arc<TopologyInner>,
}

struct TopologyInner {
    /// Elements in insertion order.
    elements: RwLock<Vec<Element>>,
    /// element id → position in `elements`
    positions: RwLock<HashMap<ElementId, usize>>,
    /// name → element ids carrying it, in insertion order
    name_index: RwLock<HashMap<String, Vec<ElementId>>>,
    edges: RwLock<Vec<Edge>>,
    next_element_id: AtomicU64,
}

impl MemoryTopology {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TopologyInner {
                elements: RwLock::new(Vec::new()),
                positions: RwLock::new(HashMap::new()),
                name_index: RwLock::new(HashMap::new()),
                edges: RwLock::new(Vec::new()),
                next_element_id: AtomicU64::new(1),
            }),
        }
    }

    /// Add a named node of the given type.
    pub fn add_element(&self, name: impl Into<String>, type_id: TypeId) -> ElementId {
        let id = ElementId(self.inner.next_element_id.fetch_add(1, Ordering::Relaxed));
        let name = name.into();

        self.inner.name_index.write().entry(name.clone()).or_default().push(id);

        let mut elements = self.inner.elements.write();
        self.inner.positions.write().insert(id, elements.len());
        elements.push(Element { id, name, type_id });

        id
    }

    /// Add an arc between two nodes.
    pub fn add_edge(&self, src: ElementId, dst: ElementId) {
        self.inner.edges.write().push(Edge::new(src, dst));
    }

    /// Add an arc whose ends may be dangling.
    pub fn add_raw_edge(&self, edge: Edge) {
        self.inner.edges.write().push(edge);
    }
}

impl Default for MemoryTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology for MemoryTopology {
    fn element_id_by_name(&self, name: &str) -> Result<Option<ElementId>> {
        Ok(self.inner.name_index.read().get(name).and_then(|ids| ids.first().copied()))
    }

    fn element(&self, id: ElementId) -> Result<Option<Element>> {
        let pos = self.inner.positions.read().get(&id).copied();
        Ok(pos.and_then(|p| self.inner.elements.read().get(p).cloned()))
    }

    fn elements(&self) -> Result<Vec<Element>> {
        Ok(self.inner.elements.read().clone())
    }

    fn edges(&self) -> Result<Vec<Edge>> {
        Ok(self.inner.edges.read().clone())
    }

    fn element_id_by_name_and_type(&self, name: &str, type_id: TypeId) -> Result<Option<ElementId>> {
        let ids = match self.inner.name_index.read().get(name) {
            Some(ids) => ids.clone(),
            None => return Ok(None),
        };
        let elements = self.inner.elements.read();
        let positions = self.inner.positions.read();
        Ok(ids.into_iter().find(|id| {
            positions
                .get(id)
                .and_then(|&p| elements.get(p))
                .is_some_and(|e| e.type_id == type_id)
        }))
    }
}

// ============================================================================
// MemoryMaps
// ============================================================================

/// In-memory attribute tables for imported maps.
#[derive(Clone)]
pub struct MemoryMaps {
    inner: Arc<RwLock<HashMap<String, MemoryMap>>>,
}

#[derive(Debug, Clone, Default)]
struct MemoryMap {
    columns: Vec<String>,
    areas: Vec<Area>,
}

impl MemoryMaps {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Create (or replace) a map with the given attribute columns.
    pub fn add_map(&self, name: impl Into<String>, columns: &[&str]) {
        let map = MemoryMap {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            areas: Vec::new(),
        };
        self.inner.write().insert(name.into(), map);
    }

    /// Append an area to an existing map.
    pub fn add_area(&self, map_name: &str, category: Option<u64>, attributes: AttributeMap) -> Result<()> {
        let mut maps = self.inner.write();
        let map = maps
            .get_mut(map_name)
            .ok_or_else(|| Error::MapSource(format!("Map [{map_name}] not found")))?;
        map.areas.push(Area { category, attributes });
        Ok(())
    }

    pub fn contains(&self, map_name: &str) -> bool {
        self.inner.read().contains_key(map_name)
    }
}

impl Default for MemoryMaps {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSource for MemoryMaps {
    fn columns(&self, map_name: &str) -> Result<Vec<String>> {
        self.inner
            .read()
            .get(map_name)
            .map(|m| m.columns.clone())
            .ok_or_else(|| Error::MapSource(format!("Map [{map_name}] not found")))
    }

    fn iterate_areas(&self, map_name: &str) -> Result<Vec<Area>> {
        self.inner
            .read()
            .get(map_name)
            .map(|m| m.areas.clone())
            .ok_or_else(|| Error::MapSource(format!("Map [{map_name}] not found")))
    }
}
