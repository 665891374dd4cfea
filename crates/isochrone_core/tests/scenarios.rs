//! Crate-level integration tests for the concrete scenarios and boundary
//! behaviour this pipeline is expected to reproduce, wired end to end
//! through the public API rather than one module at a time.

use std::collections::HashMap;

use h3o::Resolution;

use isochrone_core::airport::AirportCatalogue;
use isochrone_core::airport_index::AirportSpatialIndex;
use isochrone_core::cell_evaluator::evaluate_cell;
use isochrone_core::config::{OriginsRegistry, RunConfig, SanitiserCosts};
use isochrone_core::flight_graph::FlightGraph;
use isochrone_core::geo::{estimate_drive_minutes_fallback, haversine_km};
use isochrone_core::grid::cell_at;
use isochrone_core::record::CellRecord;
use isochrone_core::road_table::{strip_legacy_fallback, strip_ocean_snap, RoadTable};
use isochrone_core::route_table::RouteTable;
use isochrone_core::router;

fn global_catalogue() -> AirportCatalogue {
    AirportCatalogue::load_from_value(serde_json::json!({
        "BRS": {"name": "Bristol", "lat": 51.3827, "lng": -2.7191, "country": "GB", "size_class": "medium"},
        "LHR": {"name": "Heathrow", "lat": 51.4700, "lng": -0.4543, "country": "GB", "size_class": "large"},
        "LGW": {"name": "Gatwick", "lat": 51.1481, "lng": -0.1903, "country": "GB", "size_class": "large"},
        "BHX": {"name": "Birmingham", "lat": 52.4539, "lng": -1.7480, "country": "GB", "size_class": "medium"},
        "JFK": {"name": "JFK", "lat": 40.6413, "lng": -73.7781, "country": "US", "size_class": "large"},
        "SIN": {"name": "Singapore", "lat": 1.3644, "lng": 103.9915, "country": "SG", "size_class": "large"},
        "SYD": {"name": "Sydney", "lat": -33.9399, "lng": 151.1753, "country": "AU", "size_class": "large"},
    }))
    .expect("valid fixture catalogue")
}

fn global_routes() -> RouteTable {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    map.insert("BRS".into(), vec!["LHR".into()]);
    map.insert("LHR".into(), vec!["JFK".into(), "SIN".into()]);
    map.insert("SIN".into(), vec!["SYD".into()]);
    RouteTable::from_map(map)
}

struct Fixture {
    catalogue: AirportCatalogue,
    config: RunConfig,
    origin: isochrone_core::config::OriginSpec,
    reached: HashMap<String, router::BestAirportResult>,
    index: AirportSpatialIndex,
    road_table: RoadTable,
}

fn build_fixture() -> Fixture {
    let catalogue = global_catalogue();
    let graph = FlightGraph::build(&global_routes(), &catalogue);
    let origin = OriginsRegistry::default().get("bristol").unwrap().clone();
    let config = RunConfig::default();
    let reached = router::route(&graph, &catalogue, &origin, &config.router_costs);
    let index = AirportSpatialIndex::build(&reached, &catalogue, &config.index_costs);
    let road_table = RoadTable::default();
    Fixture { catalogue, config, origin, reached, index, road_table }
}

fn evaluate(fixture: &Fixture, lat: f64, lng: f64) -> Option<CellRecord> {
    let cell = cell_at(lat, lng, fixture.config.resolutions.road_resolution).unwrap();
    evaluate_cell(
        cell,
        &fixture.origin,
        &fixture.catalogue,
        &fixture.reached,
        &fixture.index,
        &fixture.config.index_costs,
        &fixture.road_table,
        None,
        &fixture.config.cell_costs,
        fixture.config.resolutions.road_resolution,
    )
}

#[test]
fn scenario_drive_only_near_home() {
    let fixture = build_fixture();
    // Within 25km of Bristol: Clevedon.
    let record = evaluate(&fixture, 51.4378, -2.8517).expect("should resolve");
    assert!(record.is_drive_only());
    let distance = haversine_km(fixture.origin.coordinates(), (51.4378, -2.8517));
    assert_eq!(record.total_minutes(), estimate_drive_minutes_fallback(distance));
}

#[test]
fn scenario_direct_flight_to_jfk() {
    let fixture = build_fixture();
    let record = evaluate(&fixture, 40.7, -73.9).expect("should resolve");
    match record {
        CellRecord::Flight { destination_airport_code, stops, origin_access_code, .. } => {
            assert_eq!(destination_airport_code, "JFK");
            assert_eq!(stops, 0);
            assert!(["BRS", "LHR", "LGW", "BHX"].contains(&origin_access_code.as_str()));
        }
        CellRecord::DriveOnly { .. } => panic!("expected a flight record near JFK"),
    }
}

#[test]
fn scenario_one_stop_flight_to_sydney() {
    let fixture = build_fixture();
    let record = evaluate(&fixture, -33.86, 151.20).expect("should resolve near Sydney");
    match record {
        CellRecord::Flight { destination_airport_code, stops, .. } => {
            assert_eq!(destination_airport_code, "SYD");
            assert!(stops == 1 || stops == 2, "expected 1 or 2 stops, got {stops}");
        }
        CellRecord::DriveOnly { .. } => panic!("expected a flight record near Sydney"),
    }
}

#[test]
fn scenario_water_rejection_with_no_candidates_is_absent() {
    let fixture = build_fixture();
    // Deep Pacific: far outside the 400km ground-from radius of every
    // reached airport and far outside the drive-compare radius of Bristol.
    let record = evaluate(&fixture, -10.0, -160.0);
    assert!(record.is_none());
}

#[test]
fn boundary_cell_exactly_at_crawl_radius_absent_is_unreachable() {
    use isochrone_core::road_table::{lookup_road_time, RoadLookup};

    let catalogue = global_catalogue();
    let jfk = catalogue.get("JFK").unwrap();
    // A table exists for JFK (so it's not "no table at all"), but this
    // particular cell has no entry.
    let near_cell = cell_at(jfk.lat + 0.05, jfk.lng, Resolution::Six).unwrap();
    let mut raw = HashMap::new();
    let mut cells = HashMap::new();
    cells.insert(format!("{:x}", u64::from(near_cell)), 20u32);
    raw.insert("JFK".to_string(), cells);
    let road_table = RoadTable::from_raw(raw).expect("valid");

    let missing_cell = cell_at(jfk.lat + 1.0, jfk.lng, Resolution::Six).unwrap();
    assert!(matches!(
        lookup_road_time(&road_table, "JFK", missing_cell, 200.0, 200.0),
        RoadLookup::UnreachableWithinCrawlRadius
    ));
    assert!(matches!(
        lookup_road_time(&road_table, "JFK", missing_cell, 200.01, 200.0),
        RoadLookup::OutsideCrawlRadius
    ));
}

#[test]
fn scenario_sanitiser_strips_legacy_fallback_entry() {
    let catalogue = global_catalogue();
    let brs = catalogue.get("BRS").unwrap();
    // A cell ~40km from Bristol with minutes == round(40/30*60) == 80.
    let far_cell = cell_at(brs.lat + 0.36, brs.lng, Resolution::Six).unwrap();
    let mut raw = HashMap::new();
    let mut cells = HashMap::new();
    cells.insert(format!("{:x}", u64::from(far_cell)), 80u32);
    raw.insert("BRS".to_string(), cells);
    let mut table = RoadTable::from_raw(raw).expect("valid");

    let removed = strip_legacy_fallback(&mut table, &catalogue, &SanitiserCosts::default());
    assert_eq!(removed.get("BRS").copied().unwrap_or(0), 1);
    assert_eq!(table.get("BRS", far_cell), None);
}

#[test]
fn scenario_sanitiser_idempotence_across_both_stages() {
    let catalogue = global_catalogue();
    let brs = catalogue.get("BRS").unwrap();
    let far_cell = cell_at(brs.lat + 0.36, brs.lng, Resolution::Six).unwrap();
    let mut raw = HashMap::new();
    let mut cells = HashMap::new();
    cells.insert(format!("{:x}", u64::from(far_cell)), 80u32);
    cells.insert(format!("{:x}", u64::from(cell_at(brs.lat + 0.05, brs.lng, Resolution::Six).unwrap())), 12u32);
    raw.insert("BRS".to_string(), cells);
    let mut once = RoadTable::from_raw(raw.clone()).expect("valid");
    let costs = SanitiserCosts::default();

    strip_legacy_fallback(&mut once, &catalogue, &costs);
    strip_ocean_snap(&mut once, &catalogue, &costs);

    let mut twice = RoadTable::from_raw(raw).expect("valid");
    strip_legacy_fallback(&mut twice, &catalogue, &costs);
    strip_ocean_snap(&mut twice, &catalogue, &costs);
    strip_legacy_fallback(&mut twice, &catalogue, &costs);
    strip_ocean_snap(&mut twice, &catalogue, &costs);

    assert_eq!(once.get("BRS", far_cell), twice.get("BRS", far_cell));
}

#[test]
fn router_is_monotone_with_respect_to_direct_neighbour() {
    // JFK is reachable both directly (stops=0 via LHR) and, in principle,
    // via a detour through SIN with more stops; the router must keep the
    // cheaper direct route rather than ever preferring a longer path.
    let fixture = build_fixture();
    let jfk = fixture.reached.get("JFK").expect("JFK reachable");
    assert_eq!(jfk.stops, 0);

    let sin = fixture.reached.get("SIN").expect("SIN reachable via LHR");
    let syd = fixture.reached.get("SYD").expect("SYD reachable via SIN");
    assert!(syd.total_minutes > sin.total_minutes);
}

#[test]
fn circuity_invariant_holds_for_every_reached_airport() {
    let fixture = build_fixture();
    for (code, best) in &fixture.reached {
        let destination = fixture.catalogue.get(code).unwrap();
        let direct_km = haversine_km(fixture.origin.coordinates(), destination.coordinates());
        let flown_km: f64 = best
            .path
            .windows(2)
            .map(|pair| {
                let a = fixture.catalogue.get(&pair[0]).unwrap();
                let b = fixture.catalogue.get(&pair[1]).unwrap();
                haversine_km(a.coordinates(), b.coordinates())
            })
            .sum();
        assert!(flown_km <= 1.8 * direct_km + 1e-6, "{code}: {flown_km} > 1.8 * {direct_km}");
    }
}
