//! End-to-end tests for map validation: schema (20), existence in the
//! reference topology (10) and uniqueness across maps (11).

use gridlink::{Linkage, LinkageConfig, MemoryMaps, MemoryTopology, Severity, Status};
use gridlink::model::attributes;
use pretty_assertions::assert_eq;

const RIVER_TYPE: i64 = 6;
const CATCHMENT_TYPE: i64 = 7;

// ============================================================================
// Helper: two river maps sharing one name, one catchment map.
// ============================================================================

fn setup() -> Linkage<MemoryTopology, MemoryMaps> {
    let topology = MemoryTopology::new();
    topology.add_element("RiverA", RIVER_TYPE);
    topology.add_element("RiverB", RIVER_TYPE);
    topology.add_element("CatchA", CATCHMENT_TYPE);
    // same name as a river, wrong type for a catchment
    topology.add_element("RiverC", RIVER_TYPE);

    let maps = MemoryMaps::new();
    maps.add_map("rivers_main", &["river_name"]);
    maps.add_map("rivers_alt", &["river_name"]);
    maps.add_map("catchments", &["Catchment", "MODFLOW"]);
    maps.add_map("catchments_old", &["NAME"]);

    maps.add_area("rivers_main", Some(1), attributes([("river_name", "RiverA")])).unwrap();
    maps.add_area("rivers_main", Some(2), attributes([("river_name", "RiverB")])).unwrap();
    maps.add_area("rivers_alt", Some(1), attributes([("river_name", "RiverA")])).unwrap();
    maps.add_area("catchments", Some(1), attributes([("Catchment", "CatchA")])).unwrap();
    maps.add_area("catchments", Some(2), attributes([("Catchment", "RiverC")])).unwrap();
    maps.add_area("catchments", None, attributes([("Catchment", "Ghost")])).unwrap();

    let config = LinkageConfig::default()
        .with_node_type("river", RIVER_TYPE)
        .with_node_type("catchment", CATCHMENT_TYPE);
    let mut linkage = Linkage::new(config, topology, maps).unwrap();

    linkage.register_map("river", "rivers_main", true).unwrap();
    linkage.register_map("river", "rivers_alt", false).unwrap();
    linkage.register_map("catchment", "catchments", true).unwrap();
    linkage.register_map("catchment", "catchments_old", false).unwrap();
    for (ft, map) in [
        ("river", "rivers_main"),
        ("river", "rivers_alt"),
        ("catchment", "catchments"),
        ("catchment", "catchments_old"),
    ] {
        linkage.check_columns(ft, map).unwrap();
    }
    linkage
}

// ============================================================================
// 1. Schema
// ============================================================================

#[test]
fn missing_required_column_blocks_the_map() {
    let linkage = setup();
    let engine = linkage.engine("catchment").unwrap();

    assert!(!engine.maps().get("catchments_old").unwrap().imported);
    assert!(engine.maps().get("catchments").unwrap().imported);

    let schema = linkage.diagnostics("catchment", "20").unwrap();
    assert_eq!(schema.len(), 2, "Catchment and MODFLOW missing in catchments_old");
    assert_eq!(schema[0].severity, Severity::Error);
    assert_eq!(schema[1].severity, Severity::Warning);
    assert!(linkage.has_errors(&["catchment"], "20"));
    assert!(!linkage.has_errors(&["river"], "20"));
}

// ============================================================================
// 2. Uniqueness across maps (11)
// ============================================================================

#[test]
fn shared_name_is_reported_once_with_every_owner() {
    let mut linkage = setup();
    let out = linkage.check_names_between_maps("river").unwrap();

    assert!(out.failed);
    assert_eq!(out.messages.len(), 1);
    assert!(out.messages[0].contains("RiverA"));
    assert!(out.messages[0].contains("rivers_main, rivers_alt"));
    assert!(!out.messages.iter().any(|m| m.contains("RiverB")));
}

#[test]
fn single_owner_names_pass() {
    let mut linkage = setup();
    assert!(linkage.check_names_between_maps("catchment").unwrap().is_ok());
    let trail = linkage.process_trail("catchment").unwrap();
    assert_eq!(trail.last().unwrap().status, Status::Ok);
}

#[test]
fn repeated_checks_do_not_duplicate_findings() {
    let mut linkage = setup();
    let first = linkage.check_names_between_maps("river").unwrap();
    let second = linkage.check_names_between_maps("river").unwrap();
    assert_eq!(first, second);
    assert_eq!(linkage.diagnostics("river", "11").unwrap().len(), 1);
}

// ============================================================================
// 3. Existence in the reference topology (10)
// ============================================================================

#[test]
fn names_must_exist_with_the_right_type() {
    let mut linkage = setup();
    let out = linkage.check_names_with_topology("catchment").unwrap();

    assert_eq!(out.messages.len(), 1);
    assert!(out.messages[0].contains("[RiverC]"));
    assert!(out.messages[0].contains("[catchments]"));
    assert!(!out.messages.iter().any(|m| m.contains("Ghost")), "areas without category are skipped");
}

#[test]
fn known_names_pass() {
    let mut linkage = setup();
    assert!(linkage.check_names_with_topology("river").unwrap().is_ok());
    assert!(!linkage.has_errors(&["river"], "10"));
}

#[test]
fn findings_never_abort_the_run() {
    let mut linkage = setup();
    linkage.check_names_with_topology("catchment").unwrap();
    linkage.check_names_between_maps("river").unwrap();

    assert!(linkage.has_errors(&["catchment", "river"], ""));
    linkage.resolve_cells().unwrap();
    assert!(linkage.export_rows().unwrap().is_empty());
}
