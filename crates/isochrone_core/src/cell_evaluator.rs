//! Cell evaluator (C7): the per-cell query that combines the router result,
//! sanitised road tables, and the spatial index into one compact record.
//!
//! This is the innermost loop of the whole pipeline; C8 calls it once per
//! cell at every resolution, so it touches nothing that isn't already
//! precomputed and read-only.

use h3o::{CellIndex, Resolution};

use crate::airport::AirportCatalogue;
use crate::airport_index::AirportSpatialIndex;
use crate::config::{CellCosts, IndexCosts, OriginSpec};
use crate::geo::{estimate_drive_minutes_fallback, haversine_km};
use crate::origin_road_table::{lookup_origin_road_time, OriginRoadLookup, OriginRoadTable};
use crate::record::CellRecord;
use crate::road_table::{lookup_road_time, RoadLookup, RoadTable};
use crate::router::BestAirportResult;

/// Candidate ground-from distance beyond which an airport is never worth
/// considering for a given cell, regardless of what the road table says.
const MAX_GROUND_FROM_KM: f64 = 400.0;

struct FlightCandidate {
    total_minutes: u32,
    origin_access_code: String,
    destination_airport_code: String,
    stops: u8,
    osrm_flag: Option<bool>,
}

fn arrival_overhead_minutes(
    access_code: &str,
    destination: &crate::airport::Airport,
    catalogue: &AirportCatalogue,
    costs: &CellCosts,
) -> u32 {
    let same_country = catalogue
        .get(access_code)
        .is_some_and(|access| access.country == destination.country);
    if same_country {
        costs.arrival_overhead_same_country_minutes
    } else {
        costs.arrival_overhead_different_country_minutes
    }
}

fn evaluate_flight_option(
    cell_center: (f64, f64),
    catalogue: &AirportCatalogue,
    reached: &std::collections::HashMap<String, BestAirportResult>,
    index: &AirportSpatialIndex,
    index_costs: &IndexCosts,
    road_table: &RoadTable,
    cell_costs: &CellCosts,
    road_resolution: Resolution,
) -> Option<FlightCandidate> {
    let (lat, lng) = cell_center;
    // Road-table entries are keyed by the canonical road resolution
    // regardless of what resolution the cell under evaluation is at: a
    // res-1 query cell still looks up the res-6 cell its centre falls in.
    let road_cell = crate::grid::cell_at(lat, lng, road_resolution);
    let mut best: Option<FlightCandidate> = None;

    for candidate_airport in index.candidates(lat, lng, index_costs) {
        let Some(best_airport) = reached.get(&candidate_airport.code) else {
            continue;
        };
        let Some(destination) = catalogue.get(&candidate_airport.code) else {
            continue;
        };

        let ground_from_km =
            haversine_km((candidate_airport.lat, candidate_airport.lng), (lat, lng));
        if ground_from_km > MAX_GROUND_FROM_KM {
            continue;
        }

        let Some(road_cell) = road_cell else { continue };
        let (ground_from_minutes, osrm_flag) = match lookup_road_time(
            road_table,
            &candidate_airport.code,
            road_cell,
            ground_from_km,
            cell_costs.crawl_radius_km,
        ) {
            RoadLookup::NoTableForAirport => {
                (estimate_drive_minutes_fallback(ground_from_km), Some(false))
            }
            RoadLookup::Entry(minutes) => (minutes, Some(true)),
            RoadLookup::UnreachableWithinCrawlRadius => continue,
            RoadLookup::OutsideCrawlRadius => continue,
        };

        let arrival_overhead =
            arrival_overhead_minutes(&best_airport.access_code, destination, catalogue, cell_costs);
        let total_minutes = best_airport.total_minutes + ground_from_minutes + arrival_overhead;

        let better = best.as_ref().map_or(true, |b| total_minutes < b.total_minutes);
        if better {
            best = Some(FlightCandidate {
                total_minutes,
                origin_access_code: best_airport.access_code.clone(),
                destination_airport_code: candidate_airport.code.clone(),
                stops: best_airport.stops,
                osrm_flag,
            });
        }
    }

    best
}

struct DriveOnlyCandidate {
    total_minutes: u32,
    osrm_flag: Option<bool>,
}

fn evaluate_drive_only_option(
    cell_center: (f64, f64),
    origin: &OriginSpec,
    origin_road_table: Option<&OriginRoadTable>,
    cell_costs: &CellCosts,
    road_resolution: Resolution,
) -> Option<DriveOnlyCandidate> {
    let distance_km = haversine_km(origin.coordinates(), cell_center);
    if distance_km > cell_costs.drive_compare_radius_km {
        return None;
    }

    let road_cell = crate::grid::cell_at(cell_center.0, cell_center.1, road_resolution)?;
    match lookup_origin_road_time(origin_road_table, road_cell) {
        OriginRoadLookup::Entry(minutes) => {
            Some(DriveOnlyCandidate { total_minutes: minutes, osrm_flag: Some(true) })
        }
        OriginRoadLookup::NoTableLoaded => Some(DriveOnlyCandidate {
            total_minutes: estimate_drive_minutes_fallback(distance_km),
            osrm_flag: Some(false),
        }),
        OriginRoadLookup::Absent => None,
    }
}

/// Evaluates one cell: picks the best of the flight option and the
/// drive-only option, or `None` if neither is valid.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_cell(
    cell: CellIndex,
    origin: &OriginSpec,
    catalogue: &AirportCatalogue,
    reached: &std::collections::HashMap<String, BestAirportResult>,
    index: &AirportSpatialIndex,
    index_costs: &IndexCosts,
    road_table: &RoadTable,
    origin_road_table: Option<&OriginRoadTable>,
    cell_costs: &CellCosts,
    road_resolution: Resolution,
) -> Option<CellRecord> {
    let cell_center = crate::grid::cell_center(cell);

    let flight = evaluate_flight_option(
        cell_center,
        catalogue,
        reached,
        index,
        index_costs,
        road_table,
        cell_costs,
        road_resolution,
    );
    let drive_only =
        evaluate_drive_only_option(cell_center, origin, origin_road_table, cell_costs, road_resolution);

    match (flight, drive_only) {
        (Some(f), Some(d)) if d.total_minutes <= f.total_minutes => Some(CellRecord::DriveOnly {
            total_minutes: d.total_minutes,
            osrm_flag: d.osrm_flag,
        }),
        (Some(f), _) => Some(CellRecord::Flight {
            total_minutes: f.total_minutes,
            origin_access_code: f.origin_access_code,
            destination_airport_code: f.destination_airport_code,
            stops: f.stops,
            osrm_flag: f.osrm_flag,
        }),
        (None, Some(d)) => {
            Some(CellRecord::DriveOnly { total_minutes: d.total_minutes, osrm_flag: d.osrm_flag })
        }
        (None, None) => None,
    }
}
