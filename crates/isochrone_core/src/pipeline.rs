//! Global iterator & chunker (C8): enumerates every cell at each configured
//! resolution, evaluates it, and writes the three output artefacts — the
//! base file (res 1-4), the chunked tiers (res 5-6, one gzip file per
//! parent cell), and the route-table artefact.
//!
//! Cell evaluation across one resolution is an embarrassingly parallel map
//! over a fixed, read-only precomputed state (§5): this module fans that
//! map out over rayon's global pool and only synchronises to collect the
//! result map per resolution.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::write::GzEncoder;
use flate2::Compression;
use h3o::{CellIndex, Resolution};
use rayon::prelude::*;
use serde::Serialize;

use crate::airport::AirportCatalogue;
use crate::airport_index::AirportSpatialIndex;
use crate::cell_evaluator::evaluate_cell;
use crate::config::{CellCosts, IndexCosts, OriginSpec, ResolutionPlan};
use crate::origin_road_table::OriginRoadTable;
use crate::record::CellRecord;
use crate::road_table::RoadTable;
use crate::router::BestAirportResult;

/// Everything the evaluator needs for one resolution pass, bundled so the
/// fan-out closure only borrows one value instead of nine.
pub struct EvaluatorContext<'a> {
    pub origin: &'a OriginSpec,
    pub catalogue: &'a AirportCatalogue,
    pub reached: &'a HashMap<String, BestAirportResult>,
    pub index: &'a AirportSpatialIndex,
    pub index_costs: &'a IndexCosts,
    pub road_table: &'a RoadTable,
    pub origin_road_table: Option<&'a OriginRoadTable>,
    pub cell_costs: &'a CellCosts,
    pub road_resolution: Resolution,
}

fn cell_identity(cell: CellIndex) -> String {
    format!("{:x}", u64::from(cell))
}

fn all_cells_at_resolution(resolution: Resolution) -> Vec<CellIndex> {
    if resolution == Resolution::Zero {
        return crate::grid::base_cells().collect();
    }
    crate::grid::base_cells()
        .flat_map(|base| crate::grid::children(base, resolution))
        .collect()
}

/// Evaluates every cell at `resolution` in parallel, returning the cells
/// that resolved to a record. No ordering between cells is observable.
pub fn evaluate_resolution(
    resolution: Resolution,
    ctx: &EvaluatorContext<'_>,
) -> HashMap<CellIndex, CellRecord> {
    all_cells_at_resolution(resolution)
        .into_par_iter()
        .filter_map(|cell| {
            evaluate_cell(
                cell,
                ctx.origin,
                ctx.catalogue,
                ctx.reached,
                ctx.index,
                ctx.index_costs,
                ctx.road_table,
                ctx.origin_road_table,
                ctx.cell_costs,
                ctx.road_resolution,
            )
            .map(|record| (cell, record))
        })
        .collect()
}

/// The base output artefact (§6): resolutions 1-4 bundled into a single
/// JSON object per origin.
#[derive(Debug, Serialize)]
pub struct BaseOutput {
    pub origin_key: String,
    pub origin_display_name: String,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub timestamp: u64,
    pub routing_mode: String,
    pub reachable_airport_count: usize,
    pub resolutions: HashMap<String, HashMap<String, CellRecord>>,
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Runs every base resolution (§4.8, coarse tier) and assembles the single
/// base output artefact. Resolutions are evaluated sequentially; each
/// resolution's cell fan-out is internally parallel.
pub fn build_base_output(
    plan: &ResolutionPlan,
    ctx: &EvaluatorContext<'_>,
    reachable_airport_count: usize,
) -> BaseOutput {
    let mut resolutions = HashMap::with_capacity(plan.base_resolutions.len());
    for resolution in &plan.base_resolutions {
        let cells = evaluate_resolution(*resolution, ctx);
        let keyed: HashMap<String, CellRecord> = cells
            .into_iter()
            .map(|(cell, record)| (cell_identity(cell), record))
            .collect();
        resolutions.insert(u8::from(*resolution).to_string(), keyed);
    }

    BaseOutput {
        origin_key: ctx.origin.key.clone(),
        origin_display_name: ctx.origin.display_name.clone(),
        origin_lat: ctx.origin.lat,
        origin_lng: ctx.origin.lng,
        timestamp: unix_timestamp(),
        routing_mode: "bounded-stop".to_string(),
        reachable_airport_count,
        resolutions,
    }
}

/// Writes bytes to `path` atomically: serialise to a temp sibling, then
/// rename into place. Per §7, a failure here aborts the run rather than
/// leaving a half-written file behind — the temp file is simply abandoned.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), crate::error::PipelineError> {
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("out")
    ));
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn write_base_output(output: &BaseOutput, path: &Path) -> Result<(), crate::error::PipelineError> {
    let bytes = serde_json::to_vec(output)
        .map_err(|e| crate::error::PipelineError::Serialisation(e.to_string()))?;
    write_atomic(path, &bytes)
}

/// Marker file convention used to keep generated chunk directories out of
/// OS content indexers (Spotlight's own exclusion marker).
const INDEX_EXCLUSION_MARKER: &str = ".metadata_never_index";

/// File-sync dedup copies look like `{parent} 2.json.gz`, `{parent} 3.json.gz`
/// — a space, a digit run, then the real extension. Cleanup removes these;
/// they're never the authoritative chunk, which always has the bare name.
fn is_indexer_dedup_duplicate(file_name: &str) -> bool {
    let Some(stem) = file_name.strip_suffix(".json.gz") else {
        return false;
    };
    let Some(space_idx) = stem.rfind(' ') else {
        return false;
    };
    let suffix = &stem[space_idx + 1..];
    !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit())
}

/// Runs one chunked resolution (§4.8): groups cells by their ancestor at
/// `parent_resolution`, gzip-compresses each group at maximum level, and
/// writes it atomically to `{parent-cell}.json.gz` under `output_dir`.
/// Any pre-existing chunk directory for this resolution is deleted and
/// recreated first.
pub fn run_chunked_resolution(
    resolution: Resolution,
    parent_resolution: Resolution,
    ctx: &EvaluatorContext<'_>,
    output_dir: &Path,
) -> Result<usize, crate::error::PipelineError> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;
    fs::write(output_dir.join(INDEX_EXCLUSION_MARKER), b"")?;

    let cells = evaluate_resolution(resolution, ctx);

    let mut by_parent: HashMap<CellIndex, HashMap<String, CellRecord>> = HashMap::new();
    for (cell, record) in cells {
        let Some(parent) = crate::grid::parent(cell, parent_resolution) else {
            continue;
        };
        by_parent
            .entry(parent)
            .or_default()
            .insert(cell_identity(cell), record);
    }

    let chunk_count = by_parent.len();
    by_parent
        .into_par_iter()
        .try_for_each(|(parent, group)| -> Result<(), crate::error::PipelineError> {
            let json = serde_json::to_vec(&group)
                .map_err(|e| crate::error::PipelineError::Serialisation(e.to_string()))?;
            let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
            encoder.write_all(&json)?;
            let compressed = encoder
                .finish()
                .map_err(|e| crate::error::PipelineError::Serialisation(e.to_string()))?;

            let path = output_dir.join(format!("{}.json.gz", cell_identity(parent)));
            write_atomic(&path, &compressed)
        })?;

    cleanup_indexer_duplicates(output_dir)?;
    Ok(chunk_count)
}

/// Post-write cleanup (§4.8): removes any duplicate files whose names
/// follow the OS-indexer dedup pattern.
fn cleanup_indexer_duplicates(dir: &Path) -> Result<(), crate::error::PipelineError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if is_indexer_dedup_duplicate(&name) {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Computes the output path for a chunked resolution's directory, e.g.
/// `{output_dir}/{origin_key}/r{resolution}`.
pub fn chunked_resolution_dir(output_dir: &Path, origin_key: &str, resolution: Resolution) -> PathBuf {
    output_dir
        .join(origin_key)
        .join(format!("r{}", u8::from(resolution)))
}
