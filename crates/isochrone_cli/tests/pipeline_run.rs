//! End-to-end exercise of the `run` orchestration against a tiny fixture
//! catalogue and route table, writing into a temporary output directory.

use isochrone_cli::run_pipeline;
use isochrone_core::config::RunConfig;

fn write_fixture_inputs(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let airports_path = dir.join("airports.json");
    let routes_path = dir.join("routes.json");

    std::fs::write(
        &airports_path,
        serde_json::json!({
            "BRS": {"name": "Bristol", "lat": 51.3827, "lng": -2.7191, "country": "GB", "size_class": "medium"},
            "LHR": {"name": "Heathrow", "lat": 51.4700, "lng": -0.4543, "country": "GB", "size_class": "large"},
            "JFK": {"name": "JFK", "lat": 40.6413, "lng": -73.7781, "country": "US", "size_class": "large"},
        })
        .to_string(),
    )
    .unwrap();

    std::fs::write(
        &routes_path,
        serde_json::json!({
            "BRS": ["LHR"],
            "LHR": ["JFK"],
        })
        .to_string(),
    )
    .unwrap();

    (airports_path, routes_path)
}

#[test]
fn run_pipeline_base_only_writes_base_and_route_artefacts() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (airports_path, routes_path) = write_fixture_inputs(tmp.path());
    let output_dir = tmp.path().join("out");
    let road_tables_dir = tmp.path().join("ground");

    let config = RunConfig::default()
        .with_airports_path(airports_path)
        .with_routes_path(routes_path)
        .with_road_tables_dir(road_tables_dir)
        .with_output_dir(output_dir.clone())
        .with_base_only(true);

    let outcomes = run_pipeline(&config).expect("pipeline run should succeed");
    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.origin_key, "bristol");
    assert!(outcome.reachable_airport_count >= 2, "expected LHR and JFK to be reachable");
    assert!(outcome.chunk_counts.is_empty(), "base-only run should skip chunked resolutions");
    assert!(outcome.base_output_path.exists());
    assert!(outcome.route_artefact_path.exists());

    let base_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&outcome.base_output_path).unwrap()).unwrap();
    assert!(base_json.get("resolutions").and_then(|r| r.get("1")).is_some());
}

#[test]
fn run_pipeline_all_origins_with_unknown_registry_still_resolves_bristol() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let (airports_path, routes_path) = write_fixture_inputs(tmp.path());
    let output_dir = tmp.path().join("out");
    let road_tables_dir = tmp.path().join("ground");

    let config = RunConfig::default()
        .with_airports_path(airports_path)
        .with_routes_path(routes_path)
        .with_road_tables_dir(road_tables_dir)
        .with_output_dir(output_dir)
        .with_all_origins(true)
        .with_base_only(true);

    let outcomes = run_pipeline(&config).expect("pipeline run should succeed");
    assert_eq!(outcomes.len(), 1, "only bristol is registered by default");
    assert_eq!(outcomes[0].origin_key, "bristol");
}
