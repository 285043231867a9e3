//! # Grid Linkage Model
//!
//! Clean DTOs that cross every boundary: collaborator ↔ aggregator ↔
//! validators ↔ export.
//!
//! Design rule: NO GIS backend types here. Geometry has already been
//! reduced to fragments by the time it reaches this module.
//! This module is pure data: no I/O, no state.

pub mod cell;
pub mod candidate;
pub mod value;
pub mod attributes;
pub mod row;
pub mod consolidated;

pub use cell::{Cell, CellId};
pub use candidate::{Candidates, CellCandidate, CellRecord, Fragment};
pub use value::AttrValue;
pub use attributes::{AttributeMap, attributes};
pub use row::ExportRow;
pub use consolidated::ConsolidatedCell;
