//! End-to-end tests for the superposition (connectivity) check between
//! co-located feature types.

use gridlink::diagnostics::GEOCHECK;
use gridlink::{Error, Fragment, Linkage, LinkageConfig, MemoryMaps, MemoryTopology, Status, SuperpositionPair, Topology};
use pretty_assertions::assert_eq;

const GW_TYPE: i64 = 5;
const CATCHMENT_TYPE: i64 = 7;
const DEMAND_TYPE: i64 = 9;

// ============================================================================
// Helper: CatchA and GW1 share cell (0, 0); GW2 sits alone in (0, 1).
// ============================================================================

fn setup(topology: MemoryTopology) -> Linkage<MemoryTopology, MemoryMaps> {
    let maps = MemoryMaps::new();
    maps.add_map("catchments", &["Catchment", "MODFLOW"]);
    maps.add_map("aquifers", &["GW"]);

    let config = LinkageConfig::default()
        .with_node_type("groundwater", GW_TYPE)
        .with_node_type("catchment", CATCHMENT_TYPE)
        .with_node_type("demand_site", DEMAND_TYPE);
    let mut linkage = Linkage::new(config, topology, maps).unwrap();

    linkage.register_map("catchment", "catchments", true).unwrap();
    linkage.register_map("groundwater", "aquifers", true).unwrap();
    linkage.check_columns("catchment", "catchments").unwrap();
    linkage.check_columns("groundwater", "aquifers").unwrap();

    linkage.ingest("catchment", "catchments", vec![Fragment::new((0, 0), 1, "CatchA", 10.0)]).unwrap();
    linkage
        .ingest("groundwater", "aquifers", vec![
            Fragment::new((0, 0), 1, "GW1", 10.0),
            Fragment::new((0, 1), 2, "GW2", 10.0),
        ])
        .unwrap();
    linkage.resolve_cells().unwrap();
    linkage
}

fn topology() -> MemoryTopology {
    let topology = MemoryTopology::new();
    topology.add_element("CatchA", CATCHMENT_TYPE);
    topology.add_element("GW1", GW_TYPE);
    topology.add_element("GW2", GW_TYPE);
    topology
}

// ============================================================================
// 1. Missing arc
// ============================================================================

#[test]
fn co_located_pair_without_arc_is_reported() {
    let mut linkage = setup(topology());
    let out = linkage.check_superposition().unwrap();

    assert_eq!(out.messages.len(), 1);
    assert!(out.messages[0].contains("[GW1]"));
    assert!(out.messages[0].contains("[CatchA]"));
    assert!(!out.messages[0].contains("GW2"), "GW2 shares no cell with CatchA");

    assert!(linkage.has_errors(&[GEOCHECK], ""));
    assert_eq!(linkage.diagnostics(GEOCHECK, "").unwrap().len(), 1);
    assert_eq!(linkage.process_trail(GEOCHECK).unwrap().last().unwrap().status, Status::Error);
}

// ============================================================================
// 2. Arc present, in either direction
// ============================================================================

#[test]
fn adding_the_arc_clears_the_finding() {
    let topo = topology();
    let mut linkage = setup(topo.clone());
    assert!(linkage.check_superposition().unwrap().failed);

    let catch = topo.element_id_by_name("CatchA").unwrap().unwrap();
    let gw1 = topo.element_id_by_name("GW1").unwrap().unwrap();
    topo.add_edge(catch, gw1);

    let rerun = linkage.check_superposition().unwrap();
    assert!(rerun.is_ok());
    assert!(rerun.messages.is_empty());
}

#[test]
fn arc_direction_does_not_matter() {
    let topo = topology();
    let catch = topo.element_id_by_name("CatchA").unwrap().unwrap();
    let gw1 = topo.element_id_by_name("GW1").unwrap().unwrap();
    topo.add_edge(catch, gw1);

    let mut linkage = setup(topo);
    assert!(linkage.check_superposition().unwrap().is_ok());
    assert!(!linkage.has_errors(&[GEOCHECK], ""));
}

// ============================================================================
// 3. Pair selection
// ============================================================================

#[test]
fn pairs_without_imported_maps_are_skipped() {
    // demand_site has no maps: only (groundwater, catchment) runs
    let mut linkage = setup(topology());
    linkage.check_superposition().unwrap();
    assert_eq!(linkage.process_trail(GEOCHECK).unwrap().len(), 1);
}

#[test]
fn default_config_reports_missing_node_types_and_continues() {
    let maps = MemoryMaps::new();
    maps.add_map("catchments", &["Catchment"]);
    maps.add_map("aquifers", &["GW"]);

    let mut linkage = Linkage::new(LinkageConfig::default(), topology(), maps).unwrap();
    linkage.register_map("catchment", "catchments", true).unwrap();
    linkage.register_map("groundwater", "aquifers", true).unwrap();
    linkage.check_columns("catchment", "catchments").unwrap();
    linkage.check_columns("groundwater", "aquifers").unwrap();
    linkage.ingest("catchment", "catchments", vec![Fragment::new((0, 0), 1, "CatchA", 10.0)]).unwrap();
    linkage.ingest("groundwater", "aquifers", vec![Fragment::new((0, 0), 1, "GW1", 10.0)]).unwrap();
    linkage.resolve_cells().unwrap();

    let out = linkage.check_superposition().unwrap();
    assert!(out.failed);
    assert_eq!(out.messages.len(), 1);
    assert!(out.messages[0].contains("no node type id configured for [groundwater, catchment]"));

    let trail = linkage.process_trail(GEOCHECK).unwrap();
    assert_eq!(trail.len(), 1, "the demand_site pair has no maps and is skipped");
    assert_eq!(trail[0].status, Status::Error);
    assert!(linkage.has_errors(&[GEOCHECK], ""));

    // export still works after the failed check
    assert_eq!(linkage.export_rows().unwrap().len(), 1);
}

#[test]
fn pair_without_node_type_does_not_stop_later_pairs() {
    let maps = MemoryMaps::new();
    maps.add_map("catchments", &["Catchment"]);
    maps.add_map("aquifers", &["GW"]);
    maps.add_map("demand", &["DS"]);

    let config = LinkageConfig::default()
        .with_node_type("groundwater", GW_TYPE)
        .with_node_type("catchment", CATCHMENT_TYPE);
    let mut linkage = Linkage::new(config, topology(), maps).unwrap();
    for (ft, map) in [("catchment", "catchments"), ("groundwater", "aquifers"), ("demand_site", "demand")] {
        linkage.register_map(ft, map, true).unwrap();
        linkage.check_columns(ft, map).unwrap();
    }
    linkage.ingest("catchment", "catchments", vec![Fragment::new((0, 0), 1, "CatchA", 10.0)]).unwrap();
    linkage.ingest("groundwater", "aquifers", vec![Fragment::new((0, 0), 1, "GW1", 10.0)]).unwrap();
    linkage.ingest("demand_site", "demand", vec![Fragment::new((0, 0), 1, "DS1", 1.0)]).unwrap();
    linkage.resolve_cells().unwrap();

    let out = linkage.check_superposition().unwrap();
    assert_eq!(out.messages.len(), 2);
    assert!(out.messages[0].contains("[demand_site]"));
    assert!(out.messages[1].contains("[GW1]") && out.messages[1].contains("[CatchA]"));
    assert_eq!(linkage.diagnostics(GEOCHECK, "").unwrap().len(), 2);
    assert_eq!(linkage.process_trail(GEOCHECK).unwrap().len(), 2);
}

#[test]
fn explicit_pair_without_node_types_is_reported() {
    let maps = MemoryMaps::new();
    maps.add_map("catchments", &["Catchment"]);
    maps.add_map("aquifers", &["GW"]);

    let mut config = LinkageConfig::default();
    config.superposition_pairs = vec![SuperpositionPair::new("groundwater", "catchment")];
    let mut linkage = Linkage::new(config, MemoryTopology::new(), maps).unwrap();
    linkage.register_map("catchment", "catchments", true).unwrap();
    linkage.register_map("groundwater", "aquifers", true).unwrap();
    linkage.check_columns("catchment", "catchments").unwrap();
    linkage.check_columns("groundwater", "aquifers").unwrap();
    linkage.resolve_cells().unwrap();

    let out = linkage.check_superposition().unwrap();
    assert!(out.failed);
    assert_eq!(linkage.diagnostics(GEOCHECK, "").unwrap().len(), 1);

    // a second run does not duplicate the ledger entry
    linkage.check_superposition().unwrap();
    assert_eq!(linkage.diagnostics(GEOCHECK, "").unwrap().len(), 1);
}

#[test]
fn superposition_needs_resolved_cells() {
    let maps = MemoryMaps::new();
    maps.add_map("catchments", &["Catchment"]);
    maps.add_map("aquifers", &["GW"]);
    let config = LinkageConfig::default()
        .with_node_type("groundwater", GW_TYPE)
        .with_node_type("catchment", CATCHMENT_TYPE);
    let mut linkage = Linkage::new(config, topology(), maps).unwrap();
    linkage.register_map("catchment", "catchments", true).unwrap();
    linkage.register_map("groundwater", "aquifers", true).unwrap();
    linkage.check_columns("catchment", "catchments").unwrap();
    linkage.check_columns("groundwater", "aquifers").unwrap();

    assert!(matches!(linkage.check_superposition(), Err(Error::NotResolved(_))));
}
