//! The route-table artefact (§3, §6): written once per run alongside the
//! cell records. Where the cell record only carries a total and a tag, this
//! artefact carries the full per-leg breakdown so the client can reconstruct
//! it without re-running the router.

use std::collections::HashMap;
use std::path::Path;

use h3o::Resolution;
use serde::Serialize;

use crate::airport::AirportCatalogue;
use crate::config::{CellCosts, OriginSpec};
use crate::flight_graph::FlightGraph;
use crate::geo::haversine_km;
use crate::origin_road_table::OriginRoadTable;
use crate::router::BestAirportResult;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteArtefactEntry {
    /// Full path of airport codes, access airport first.
    pub p: Vec<String>,
    /// Per-leg flight minutes, one fewer entries than `p`.
    pub l: Vec<u32>,
    /// Total airside minutes (ground-to-access + overhead + legs + penalties).
    pub t: u32,
    pub s: u8,
    /// OSRM-measured ground-to-origin-access-airport minutes, when the
    /// origin road table has an entry at the access airport's own cell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<u32>,
    /// True when `gt` came from the road network rather than being omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go: Option<bool>,
}

/// Map from destination airport code to its [`RouteArtefactEntry`].
pub type RouteArtefact = HashMap<String, RouteArtefactEntry>;

fn leg_minutes(path: &[String], graph: &FlightGraph) -> Vec<u32> {
    path.windows(2)
        .map(|pair| graph.weight(&pair[0], &pair[1]).unwrap_or(0))
        .collect()
}

/// Looks up the origin road table at the access airport's own cell, giving
/// an OSRM-measured ground-to-origin-access-airport time where available.
fn osrm_ground_to_access(
    origin_road_table: Option<&OriginRoadTable>,
    catalogue: &AirportCatalogue,
    access_code: &str,
    road_resolution: Resolution,
) -> Option<u32> {
    let table = origin_road_table?;
    let access = catalogue.get(access_code)?;
    let cell = crate::grid::cell_at(access.lat, access.lng, road_resolution)?;
    table.get(cell)
}

/// Builds the route-table artefact for every airport the router reached.
pub fn build_route_artefact(
    reached: &HashMap<String, BestAirportResult>,
    graph: &FlightGraph,
    catalogue: &AirportCatalogue,
    origin_road_table: Option<&OriginRoadTable>,
    cell_costs: &CellCosts,
) -> RouteArtefact {
    let _ = cell_costs;
    reached
        .iter()
        .map(|(code, best)| {
            let gt = osrm_ground_to_access(
                origin_road_table,
                catalogue,
                &best.access_code,
                Resolution::Six,
            );
            let entry = RouteArtefactEntry {
                p: best.path.clone(),
                l: leg_minutes(&best.path, graph),
                t: best.total_minutes,
                s: best.stops,
                go: gt.map(|_| true),
                gt,
            };
            (code.clone(), entry)
        })
        .collect()
}

/// Writes the route-table artefact uncompressed, as specified in §4.8. Not
/// atomic: a failure here is a serialisation failure per §7 and aborts the
/// run, so the temp-file dance used by the chunked outputs isn't needed —
/// the caller treats any `Err` as fatal.
pub fn write_route_artefact(
    artefact: &RouteArtefact,
    path: &Path,
) -> Result<(), crate::error::PipelineError> {
    let data = serde_json::to_vec(artefact)
        .map_err(|e| crate::error::PipelineError::Serialisation(e.to_string()))?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Sanity-checks every entry against the invariants in §8: the path starts
/// at an access airport and ends at the key, and `stops == len(path) - 2`.
pub fn validate_route_artefact(artefact: &RouteArtefact, origin: &OriginSpec) -> Vec<String> {
    let mut problems = Vec::new();
    for (code, entry) in artefact {
        let Some(first) = entry.p.first() else {
            problems.push(format!("{code}: empty path"));
            continue;
        };
        if !origin.access_airports.iter().any(|a| &a.code == first) {
            problems.push(format!("{code}: path does not start at an access airport"));
        }
        if entry.p.last() != Some(code) {
            problems.push(format!("{code}: path does not end at its own key"));
        }
        if entry.s as usize != entry.p.len().saturating_sub(2) {
            problems.push(format!("{code}: stops does not equal path length - 2"));
        }
        if entry.l.len() + 1 != entry.p.len() {
            problems.push(format!("{code}: leg count does not match path length"));
        }
    }
    problems
}

/// Great-circle distance in km actually flown across every leg, for the
/// circuity testable property in §8.
pub fn flown_distance_km(entry: &RouteArtefactEntry, catalogue: &AirportCatalogue) -> f64 {
    entry
        .p
        .windows(2)
        .filter_map(|pair| {
            let a = catalogue.get(&pair[0])?;
            let b = catalogue.get(&pair[1])?;
            Some(haversine_km(a.coordinates(), b.coordinates()))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route_table::RouteTable;
    use std::collections::HashMap as Map;

    fn catalogue() -> AirportCatalogue {
        AirportCatalogue::load_from_value(serde_json::json!({
            "BRS": {"name": "Bristol", "lat": 51.3827, "lng": -2.7191, "country": "GB", "size_class": "medium"},
            "JFK": {"name": "JFK", "lat": 40.6413, "lng": -73.7781, "country": "US", "size_class": "large"},
        }))
        .expect("valid catalogue")
    }

    #[test]
    fn builds_entry_with_leg_minutes_matching_graph_weight() {
        let mut routes = Map::new();
        routes.insert("BRS".to_string(), vec!["JFK".to_string()]);
        let graph = FlightGraph::build(&RouteTable::from_map(routes), &catalogue());

        let mut reached = HashMap::new();
        reached.insert(
            "JFK".to_string(),
            BestAirportResult {
                total_minutes: 500,
                stops: 0,
                path: vec!["BRS".to_string(), "JFK".to_string()],
                access_code: "BRS".to_string(),
            },
        );

        let artefact = build_route_artefact(&reached, &graph, &catalogue(), None, &CellCosts::default());
        let jfk = artefact.get("JFK").expect("present");
        assert_eq!(jfk.l.len(), 1);
        assert_eq!(jfk.l[0], graph.weight("BRS", "JFK").unwrap());
        assert!(jfk.gt.is_none());
        assert!(jfk.go.is_none());
    }

    #[test]
    fn validate_accepts_well_formed_artefact() {
        let registry = crate::config::OriginsRegistry::default();
        let bristol = registry.get("bristol").unwrap();
        let mut artefact = RouteArtefact::new();
        artefact.insert(
            "JFK".to_string(),
            RouteArtefactEntry {
                p: vec!["BRS".to_string(), "JFK".to_string()],
                l: vec![500],
                t: 600,
                s: 0,
                gt: None,
                go: None,
            },
        );
        assert!(validate_route_artefact(&artefact, bristol).is_empty());
    }
}
