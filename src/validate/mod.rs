//! Validators over imported maps, resolved cells and the reference topology.
//!
//! Every validator reports into a `Ledger` and returns a `CheckOutcome`;
//! none of them stops processing on a finding.

pub mod names;
pub mod columns;
pub mod superposition;

pub use names::{FeatureNameIndex, check_existence, check_uniqueness};
pub use columns::check_columns;
pub use superposition::{ConnectionGraph, Phase, SuperpositionChecker};
