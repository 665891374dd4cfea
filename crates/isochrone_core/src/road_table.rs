//! Road-time sanitiser (C5): loads per-airport driving tables and strips
//! two distinct upstream data-quality failures — legacy haversine-fallback
//! entries and OSRM ocean-snap artefacts — before the tables are trusted
//! anywhere else in the pipeline.

use std::collections::HashMap;
use std::path::Path;

use h3o::CellIndex;

use crate::airport::AirportCatalogue;
use crate::config::SanitiserCosts;
use crate::error::RoadTableError;
use crate::geo::{estimate_drive_minutes_fallback, haversine_km};

fn parse_cell_identity(raw: &str) -> Result<CellIndex, RoadTableError> {
    let value = u64::from_str_radix(raw, 16)
        .map_err(|_| RoadTableError::InvalidCellIdentity(raw.to_string()))?;
    CellIndex::try_from(value).map_err(|_| RoadTableError::InvalidCellIdentity(raw.to_string()))
}

/// Sparse per-airport driving-time table: airport code -> cell -> minutes.
#[derive(Debug, Clone, Default)]
pub struct RoadTable {
    by_airport: HashMap<String, HashMap<CellIndex, u32>>,
}

impl RoadTable {
    pub fn from_raw(
        raw: HashMap<String, HashMap<String, u32>>,
    ) -> Result<Self, RoadTableError> {
        let mut by_airport = HashMap::with_capacity(raw.len());
        for (code, cells) in raw {
            let mut parsed = HashMap::with_capacity(cells.len());
            for (cell_id, minutes) in cells {
                parsed.insert(parse_cell_identity(&cell_id)?, minutes);
            }
            by_airport.insert(code, parsed);
        }
        Ok(Self { by_airport })
    }

    /// Loads and merges every `*.json` region file in `dir`. A corrupt
    /// region file is logged and skipped rather than aborting the run; the
    /// airports it would have populated are simply absent.
    pub fn load_region_files(dir: &Path) -> Result<Self, RoadTableError> {
        let mut merged = Self::default();
        if !dir.exists() {
            return Ok(merged);
        }
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path)
                .map_err(RoadTableError::from)
                .and_then(|data| {
                    serde_json::from_str::<HashMap<String, HashMap<String, u32>>>(&data)
                        .map_err(RoadTableError::from)
                })
                .and_then(Self::from_raw)
            {
                Ok(region) => merged.merge(region),
                Err(err) => {
                    eprintln!("road table: skipping corrupt region file {}: {err}", path.display());
                }
            }
        }
        Ok(merged)
    }

    fn merge(&mut self, other: Self) {
        for (code, cells) in other.by_airport {
            self.by_airport.entry(code).or_default().extend(cells);
        }
    }

    pub fn has_airport(&self, code: &str) -> bool {
        self.by_airport.contains_key(code)
    }

    pub fn get(&self, code: &str, cell: CellIndex) -> Option<u32> {
        self.by_airport.get(code)?.get(&cell).copied()
    }

    pub fn airport_codes(&self) -> impl Iterator<Item = &str> {
        self.by_airport.keys().map(String::as_str)
    }

    fn cells_mut(&mut self, code: &str) -> Option<&mut HashMap<CellIndex, u32>> {
        self.by_airport.get_mut(code)
    }
}

/// Per-airport counts from a sanitiser stage, for the sanitiser's own
/// report and for C9's post-hoc audit of island radii.
#[derive(Debug, Clone, Default)]
pub struct SanitiserReport {
    pub legacy_fallback_removed: HashMap<String, usize>,
    pub speed_cap_removed: HashMap<String, usize>,
    pub island_radius_km: HashMap<String, f64>,
    pub island_removed: HashMap<String, usize>,
}

/// Stage 1: strip entries that are indistinguishable real data except that
/// they exactly match the legacy fallback formula `round(dist/30*60)` for a
/// cell more than 5km from the airport. Idempotent: a table with no such
/// entries left is unchanged by a second pass.
pub fn strip_legacy_fallback(
    table: &mut RoadTable,
    catalogue: &AirportCatalogue,
    costs: &SanitiserCosts,
) -> HashMap<String, usize> {
    let mut removed_counts = HashMap::new();
    let codes: Vec<String> = table.airport_codes().map(str::to_string).collect();
    for code in codes {
        let Some(airport) = catalogue.get(&code) else { continue };
        let Some(cells) = table.cells_mut(&code) else { continue };
        let mut removed = 0usize;
        cells.retain(|cell, minutes| {
            let (lat, lng) = crate::grid::cell_center(*cell);
            let dist_km = haversine_km(airport.coordinates(), (lat, lng));
            let legacy_value =
                (dist_km / costs.legacy_fallback_speed_kmh * 60.0).round() as u32;
            let is_legacy =
                dist_km > costs.legacy_fallback_min_distance_km && *minutes == legacy_value;
            if is_legacy {
                removed += 1;
            }
            !is_legacy
        });
        if removed > 0 {
            removed_counts.insert(code, removed);
        }
    }
    removed_counts
}

fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Stage 2: unconditionally drop cells implying an unrealistic road speed,
/// then for islands/peninsulas (low distance/time correlation) drop
/// everything beyond an inferred real road extent.
pub fn strip_ocean_snap(
    table: &mut RoadTable,
    catalogue: &AirportCatalogue,
    costs: &SanitiserCosts,
) -> SanitiserReport {
    let mut report = SanitiserReport::default();
    let codes: Vec<String> = table.airport_codes().map(str::to_string).collect();

    for code in codes {
        let Some(airport) = catalogue.get(&code) else { continue };
        let Some(cells) = table.cells_mut(&code) else { continue };

        let mut speed_capped = 0usize;
        cells.retain(|cell, minutes| {
            if *minutes == 0 {
                return true;
            }
            let (lat, lng) = crate::grid::cell_center(*cell);
            let dist_km = haversine_km(airport.coordinates(), (lat, lng));
            let implied_speed_kmh = dist_km / (*minutes as f64 / 60.0);
            let over_cap = implied_speed_kmh > costs.implied_speed_cap_kmh;
            if over_cap {
                speed_capped += 1;
            }
            !over_cap
        });
        if speed_capped > 0 {
            report.speed_cap_removed.insert(code.clone(), speed_capped);
        }

        if cells.len() < costs.min_surviving_cells_for_correlation {
            continue;
        }

        let mut distances = Vec::with_capacity(cells.len());
        let mut times = Vec::with_capacity(cells.len());
        for (cell, minutes) in cells.iter() {
            let (lat, lng) = crate::grid::cell_center(*cell);
            distances.push(haversine_km(airport.coordinates(), (lat, lng)));
            times.push(*minutes as f64);
        }
        let correlation = pearson_correlation(&distances, &times);
        if correlation >= costs.island_correlation_threshold {
            continue;
        }

        let max_low_speed_distance_km = cells
            .iter()
            .filter_map(|(cell, minutes)| {
                let (lat, lng) = crate::grid::cell_center(*cell);
                let dist_km = haversine_km(airport.coordinates(), (lat, lng));
                let implied_speed_kmh = dist_km / (*minutes as f64 / 60.0);
                (implied_speed_kmh < costs.island_low_speed_cap_kmh).then_some(dist_km)
            })
            .fold(0.0_f64, f64::max);

        let radius_km = max_low_speed_distance_km * costs.island_radius_multiplier;
        report.island_radius_km.insert(code.clone(), radius_km);

        let mut removed = 0usize;
        cells.retain(|cell, _| {
            let (lat, lng) = crate::grid::cell_center(*cell);
            let dist_km = haversine_km(airport.coordinates(), (lat, lng));
            let keep = dist_km <= radius_km;
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            report.island_removed.insert(code, removed);
        }
    }

    report
}

/// Distinguishes "no table for this airport at all" from "table exists but
/// this cell is missing", which further splits on whether the cell is
/// within the crawl-radius contract.
pub enum RoadLookup {
    /// No sanitised table exists for this airport at all.
    NoTableForAirport,
    /// A table exists and this cell has a value.
    Entry(u32),
    /// A table exists, the cell is missing, and it's within the crawl
    /// radius: water/no road, not simply uncrawled.
    UnreachableWithinCrawlRadius,
    /// A table exists, the cell is missing, and it's outside the crawl
    /// radius: not crawled, not an unreachability signal.
    OutsideCrawlRadius,
}

/// `crawl_radius_km` is the contract shared with the cell evaluator (C7),
/// kept on [`crate::config::CellCosts`] since both sides need the same
/// number; the sanitiser's own thresholds live on [`SanitiserCosts`].
pub fn lookup_road_time(
    table: &RoadTable,
    code: &str,
    cell: CellIndex,
    distance_from_airport_km: f64,
    crawl_radius_km: f64,
) -> RoadLookup {
    if !table.has_airport(code) {
        return RoadLookup::NoTableForAirport;
    }
    match table.get(code, cell) {
        Some(minutes) => RoadLookup::Entry(minutes),
        None if distance_from_airport_km <= crawl_radius_km => {
            RoadLookup::UnreachableWithinCrawlRadius
        }
        None => RoadLookup::OutsideCrawlRadius,
    }
}

pub fn fallback_minutes(distance_km: f64) -> u32 {
    estimate_drive_minutes_fallback(distance_km)
}
