//! Orchestration layer for the isochrone pipeline (C11's CLI front door).
//!
//! [`isochrone_core`] only exposes components; nothing in it wires a
//! catalogue, a route table, and a pile of road-table region files into one
//! finished run. That wiring — load, sanitise, route, index, evaluate every
//! resolution, write every artefact — lives here, one level up, the same
//! way the teacher workspace keeps its simulation core and its experiment
//! runner in separate crates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use h3o::{CellIndex, Resolution};

use isochrone_core::airport::AirportCatalogue;
use isochrone_core::airport_index::AirportSpatialIndex;
use isochrone_core::config::{OriginSpec, RunConfig};
use isochrone_core::discontinuity::{self, DiscontinuityReport};
use isochrone_core::error::PipelineError;
use isochrone_core::flight_graph::FlightGraph;
use isochrone_core::origin_road_table::OriginRoadTable;
use isochrone_core::pipeline::{
    build_base_output, chunked_resolution_dir, run_chunked_resolution, write_base_output,
    EvaluatorContext,
};
use isochrone_core::record::CellRecord;
use isochrone_core::road_table::{strip_legacy_fallback, strip_ocean_snap, RoadTable};
use isochrone_core::route_artefact::{build_route_artefact, validate_route_artefact, write_route_artefact};
use isochrone_core::route_table::RouteTable;
use isochrone_core::router;
use isochrone_core::sanity::{self, SanityReport};

fn log(msg: impl AsRef<str>) {
    eprintln!("[isochrone] {}", msg.as_ref());
}

/// Outcome of one origin's run: where its artefacts landed and whatever the
/// sanity checker had to say, so the caller can decide the process exit
/// code without re-deriving it.
#[derive(Debug)]
pub struct OriginRunOutcome {
    pub origin_key: String,
    pub reachable_airport_count: usize,
    pub base_output_path: PathBuf,
    pub route_artefact_path: PathBuf,
    pub chunk_counts: Vec<(u8, usize)>,
    pub sanity: SanityReport,
}

/// Loads the catalogue, route table, and sanitised road tables once; shared
/// by every origin in an all-origins run so the expensive I/O and
/// sanitisation pass happen exactly once.
pub struct SharedInputs {
    pub catalogue: AirportCatalogue,
    pub routes: RouteTable,
    pub graph: FlightGraph,
    pub road_table: RoadTable,
}

impl SharedInputs {
    pub fn load(config: &RunConfig) -> Result<Self, PipelineError> {
        log(format!("loading airport catalogue from {}", config.airports_path.display()));
        let catalogue = AirportCatalogue::load(&config.airports_path)?;
        log(format!("catalogue: {} airports", catalogue.len()));

        log(format!("loading route table from {}", config.routes_path.display()));
        let routes = RouteTable::load(&config.routes_path)?;

        log("building flight graph");
        let graph = FlightGraph::build(&routes, &catalogue);
        log(format!("flight graph: {} nodes", graph.node_count()));

        log(format!("loading road tables from {}", config.road_tables_dir.display()));
        let mut road_table = RoadTable::load_region_files(&config.road_tables_dir)?;

        let legacy_removed = strip_legacy_fallback(&mut road_table, &catalogue, &config.sanitiser_costs);
        let total_legacy: usize = legacy_removed.values().sum();
        log(format!("sanitiser stage 1: removed {total_legacy} legacy-fallback entries across {} airports", legacy_removed.len()));

        let ocean_report = strip_ocean_snap(&mut road_table, &catalogue, &config.sanitiser_costs);
        let total_speed_capped: usize = ocean_report.speed_cap_removed.values().sum();
        let total_island_removed: usize = ocean_report.island_removed.values().sum();
        log(format!(
            "sanitiser stage 2: removed {total_speed_capped} speed-capped entries, {total_island_removed} island-radius entries across {} flagged island airports",
            ocean_report.island_radius_km.len()
        ));
        for (code, radius) in &ocean_report.island_radius_km {
            log(format!("  island airport {code}: inferred road radius {radius:.1}km"));
        }

        Ok(Self { catalogue, routes, graph, road_table })
    }
}

/// Runs the full pipeline for one origin against already-loaded shared
/// inputs: route, index, evaluate every resolution, write every artefact.
pub fn run_origin(
    config: &RunConfig,
    origin: &OriginSpec,
    shared: &SharedInputs,
    origin_road_table: Option<&OriginRoadTable>,
) -> Result<OriginRunOutcome, PipelineError> {
    log(format!("--- origin: {} ({}) ---", origin.key, origin.display_name));

    log("running bounded-stop router");
    let reached = router::route(&shared.graph, &shared.catalogue, origin, &config.router_costs);
    log(format!("router: reached {} airports", reached.len()));

    let index = AirportSpatialIndex::build(&reached, &shared.catalogue, &config.index_costs);

    let ctx = EvaluatorContext {
        origin,
        catalogue: &shared.catalogue,
        reached: &reached,
        index: &index,
        index_costs: &config.index_costs,
        road_table: &shared.road_table,
        origin_road_table,
        cell_costs: &config.cell_costs,
        road_resolution: config.resolutions.road_resolution,
    };

    std::fs::create_dir_all(&config.output_dir)?;

    log("evaluating base resolutions (1-4)");
    let base_output = build_base_output(&config.resolutions, &ctx, reached.len());
    let base_path = config.output_dir.join(format!("{}.base.json", origin.key));
    write_base_output(&base_output, &base_path)?;
    log(format!("wrote base output to {}", base_path.display()));

    let mut chunk_counts = Vec::new();
    if !config.base_only {
        for (resolution, parent_resolution) in &config.resolutions.chunked_resolutions {
            let resolution_u8 = u8::from(*resolution);
            log(format!("evaluating chunked resolution {resolution_u8}"));
            let dir = chunked_resolution_dir(&config.output_dir, &origin.key, *resolution);
            let count = run_chunked_resolution(*resolution, *parent_resolution, &ctx, &dir)?;
            log(format!("resolution {resolution_u8}: wrote {count} chunk file(s) to {}", dir.display()));
            chunk_counts.push((resolution_u8, count));
        }
    }

    log("building route-table artefact");
    let artefact = build_route_artefact(&reached, &shared.graph, &shared.catalogue, origin_road_table, &config.cell_costs);
    let problems = validate_route_artefact(&artefact, origin);
    if !problems.is_empty() {
        for problem in &problems {
            log(format!("route-artefact validation problem: {problem}"));
        }
    }
    let artefact_path = config.output_dir.join(format!("{}.routes.json", origin.key));
    write_route_artefact(&artefact, &artefact_path)?;
    log(format!("wrote route-table artefact to {}", artefact_path.display()));

    log("running sanity checks");
    let sanity_report = sanity::run_sanity_checks(&shared.catalogue, &shared.routes);
    sanity::report_to_stderr(&sanity_report);

    Ok(OriginRunOutcome {
        origin_key: origin.key.clone(),
        reachable_airport_count: reached.len(),
        base_output_path: base_path,
        route_artefact_path: artefact_path,
        chunk_counts,
        sanity: sanity_report,
    })
}

/// Top-level entry point for the `run` subcommand: loads everything once,
/// then runs either the configured origin or every registered origin.
pub fn run_pipeline(config: &RunConfig) -> Result<Vec<OriginRunOutcome>, PipelineError> {
    let registry = config.load_origins_registry()?;
    let shared = SharedInputs::load(config)?;

    let origin_road_table = match &config.origin_road_table_path {
        Some(path) if path.exists() => {
            log(format!("loading origin road table from {}", path.display()));
            Some(OriginRoadTable::load(path)?)
        }
        Some(path) => {
            log(format!("origin road table {} not found, falling back to straight-line estimate", path.display()));
            None
        }
        None => None,
    };

    let origins: Vec<OriginSpec> = if config.all_origins {
        registry.all().cloned().collect()
    } else {
        let origin = registry
            .get(&config.origin_key)
            .ok_or_else(|| PipelineError::UnknownOrigin(config.origin_key.clone()))?
            .clone();
        vec![origin]
    };

    origins
        .iter()
        .map(|origin| run_origin(config, origin, &shared, origin_road_table.as_ref()))
        .collect()
}

/// Reads a base-output file (resolutions 1-4) written by [`run_origin`] and
/// pulls out one resolution's cell records, for standalone reruns of the
/// discontinuity analyser.
pub fn load_base_resolution(
    base_path: &Path,
    resolution: Resolution,
) -> Result<HashMap<CellIndex, CellRecord>, PipelineError> {
    let data = std::fs::read_to_string(base_path)?;
    let value: serde_json::Value = serde_json::from_str(&data)?;
    let key = u8::from(resolution).to_string();
    let mut out = HashMap::new();
    let Some(cells) = value.get("resolutions").and_then(|r| r.get(&key)).and_then(|c| c.as_object()) else {
        return Ok(out);
    };
    for (cell_id, record_value) in cells {
        let Ok(raw) = u64::from_str_radix(cell_id, 16) else { continue };
        let Ok(cell) = CellIndex::try_from(raw) else { continue };
        if let Some(record) = CellRecord::from_value(record_value) {
            out.insert(cell, record);
        }
    }
    Ok(out)
}

/// Reads every `*.json.gz` chunk file in a chunked-resolution directory
/// written by [`run_origin`] and merges them into one resolution's cell
/// records, for standalone reruns of the discontinuity analyser.
pub fn load_chunked_resolution(dir: &Path) -> Result<HashMap<CellIndex, CellRecord>, PipelineError> {
    use std::io::Read;

    let mut out = HashMap::new();
    if !dir.exists() {
        return Ok(out);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("gz") {
            continue;
        }
        let file = std::fs::File::open(&path)?;
        let mut decoder = flate2::read::GzDecoder::new(file);
        let mut json = String::new();
        decoder.read_to_string(&mut json)?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        let Some(cells) = value.as_object() else { continue };
        for (cell_id, record_value) in cells {
            let Ok(raw) = u64::from_str_radix(cell_id, 16) else { continue };
            let Ok(cell) = CellIndex::try_from(raw) else { continue };
            if let Some(record) = CellRecord::from_value(record_value) {
                out.insert(cell, record);
            }
        }
    }
    Ok(out)
}

/// Runs the discontinuity analyser (C9) standalone against already-written
/// artefacts: the base file for resolutions 1-4, or a chunk directory for
/// resolutions 5-6.
pub fn run_discontinuity_standalone(
    output_dir: &Path,
    origin_key: &str,
    resolution: Resolution,
    base_resolutions: &[Resolution],
    threshold_minutes: u32,
    top_n: usize,
) -> Result<DiscontinuityReport, PipelineError> {
    let records = if base_resolutions.contains(&resolution) {
        let base_path = output_dir.join(format!("{origin_key}.base.json"));
        load_base_resolution(&base_path, resolution)?
    } else {
        let dir = chunked_resolution_dir(output_dir, origin_key, resolution);
        load_chunked_resolution(&dir)?
    };
    log(format!("loaded {} cell record(s) for resolution {}", records.len(), u8::from(resolution)));
    Ok(discontinuity::analyze_discontinuities(&records, u8::from(resolution), threshold_minutes, top_n))
}

pub fn run_sanity_standalone(config: &RunConfig) -> Result<SanityReport, PipelineError> {
    let catalogue = AirportCatalogue::load(&config.airports_path)?;
    let routes = RouteTable::load(&config.routes_path)?;
    Ok(sanity::run_sanity_checks(&catalogue, &routes))
}
