//! # Collaborator Traits
//!
//! This is THE contract between gridlink and the GIS platform that does
//! the geometry work. The engine never touches a shapefile or an overlay;
//! it reads already-materialized data through these two traits.
//!
//! ## Implementations
//!
//! | Collaborator | Module | Description |
//! |--------------|--------|-------------|
//! | `MemoryTopology` | `memory` | In-memory node/arc graph for testing/embedding |
//! | `MemoryMaps` | `memory` | In-memory attribute tables for testing/embedding |

pub mod memory;

use serde::{Deserialize, Serialize};
use crate::model::AttributeMap;
use crate::Result;

pub use memory::{MemoryMaps, MemoryTopology};

// ============================================================================
// Reference topology DTOs
// ============================================================================

/// Node type identifier as stored in the reference topology (`TypeID`).
pub type TypeId = i64;

/// Opaque reference-topology element identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node of the reference topology (catchment, groundwater, demand site, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub type_id: TypeId,
}

/// A directed arc of the reference topology.
///
/// Either end may be unresolved when the arc was digitized without
/// snapping to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub src: Option<ElementId>,
    pub dst: Option<ElementId>,
}

impl Edge {
    pub fn new(src: ElementId, dst: ElementId) -> Self {
        Self { src: Some(src), dst: Some(dst) }
    }

    /// Both endpoints, when both are resolved.
    pub fn endpoints(&self) -> Option<(ElementId, ElementId)> {
        Some((self.src?, self.dst?))
    }
}

// ============================================================================
// Topology trait
// ============================================================================

/// Read-only view of the reference node/arc topology.
///
/// Implementations return `Error::Topology` for backend failures; an
/// unknown name or id is `Ok(None)`, not an error.
pub trait Topology {
    /// Look up an element by its name.
    fn element_id_by_name(&self, name: &str) -> Result<Option<ElementId>>;

    /// Get an element by id.
    fn element(&self, id: ElementId) -> Result<Option<Element>>;

    /// All elements, in the backend's stable traversal order.
    fn elements(&self) -> Result<Vec<Element>>;

    /// All arcs, in the backend's stable traversal order.
    fn edges(&self) -> Result<Vec<Edge>>;

    /// Type id of an element.
    ///
    /// Default: fetch the element and read its type.
    fn element_type_id(&self, id: ElementId) -> Result<Option<TypeId>> {
        Ok(self.element(id)?.map(|e| e.type_id))
    }

    /// Look up an element by name, restricted to one node type.
    ///
    /// Default: name lookup followed by a type check. Backends where names
    /// are only unique per type should override this.
    fn element_id_by_name_and_type(&self, name: &str, type_id: TypeId) -> Result<Option<ElementId>> {
        match self.element_id_by_name(name)? {
            Some(id) if self.element_type_id(id)? == Some(type_id) => Ok(Some(id)),
            _ => Ok(None),
        }
    }
}

// ============================================================================
// Map source trait
// ============================================================================

/// One geometry of an imported map together with its attribute row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Category id; `None` when the backend reports broken topology.
    pub category: Option<u64>,
    pub attributes: AttributeMap,
}

/// Read-only access to imported feature maps.
pub trait MapSource {
    /// Column names of the map's attribute table.
    fn columns(&self, map_name: &str) -> Result<Vec<String>>;

    /// Every area of the map with its attributes.
    fn iterate_areas(&self, map_name: &str) -> Result<Vec<Area>>;
}

impl<T: Topology + ?Sized> Topology for &T {
    fn element_id_by_name(&self, name: &str) -> Result<Option<ElementId>> {
        (**self).element_id_by_name(name)
    }
    fn element(&self, id: ElementId) -> Result<Option<Element>> {
        (**self).element(id)
    }
    fn elements(&self) -> Result<Vec<Element>> {
        (**self).elements()
    }
    fn edges(&self) -> Result<Vec<Edge>> {
        (**self).edges()
    }
    fn element_type_id(&self, id: ElementId) -> Result<Option<TypeId>> {
        (**self).element_type_id(id)
    }
    fn element_id_by_name_and_type(&self, name: &str, type_id: TypeId) -> Result<Option<ElementId>> {
        (**self).element_id_by_name_and_type(name, type_id)
    }
}

impl<S: MapSource + ?Sized> MapSource for &S {
    fn columns(&self, map_name: &str) -> Result<Vec<String>> {
        (**self).columns(map_name)
    }
    fn iterate_areas(&self, map_name: &str) -> Result<Vec<Area>> {
        (**self).iterate_areas(map_name)
    }
}
