//! Sanity checker (C10): a fixed battery of cross-data-source invariant
//! checks over the airport catalogue and route table, run either as part of
//! a full pipeline invocation or standalone against already-loaded data.
//!
//! Every check appends to one itemised error list rather than failing fast,
//! so a single run reports everything wrong at once instead of one problem
//! at a time.

use crate::airport::AirportCatalogue;
use crate::geo::estimate_flight_minutes;
use crate::route_table::RouteTable;

/// Minimum number of airports a catalogue must carry to be considered a
/// real dataset rather than a test fixture or a truncated download.
pub const MIN_AIRPORT_COUNT: usize = 3;

/// Airports that must be present in any production catalogue: the
/// `bristol` origin's own access airports.
pub const REQUIRED_AIRPORT_WHITELIST: &[&str] = &["BRS", "LHR", "LGW", "BHX"];

/// A hub airport and the minimum number of distinct destinations its route
/// table entry must serve to be considered a plausible hub.
pub const HUB_CONNECTIVITY_MINIMA: &[(&str, usize)] = &[("LHR", 20), ("JFK", 20)];

/// Non-stop routes that should exist in any realistic route table,
/// grounded in known commercial service at the time this list was drawn up.
pub const KNOWN_NONSTOPS: &[(&str, &str, &str)] = &[
    ("JFK", "HNL", "JFK-Honolulu nonstop (multiple carriers)"),
    ("LHR", "PER", "LHR-Perth nonstop (Qantas)"),
    ("LHR", "GIG", "LHR-Rio nonstop (BA)"),
    ("JFK", "LAX", "JFK-LAX nonstop (many carriers)"),
    ("LHR", "JFK", "LHR-JFK nonstop (BA, AA, etc)"),
    ("CDG", "JFK", "CDG-JFK nonstop (AF, Delta)"),
    ("FRA", "JFK", "FRA-JFK nonstop (LH, etc)"),
    ("SIN", "SYD", "SIN-SYD nonstop (SQ, Qantas)"),
    ("LAX", "HND", "LAX-Tokyo Haneda nonstop"),
    ("SFO", "AKL", "SFO-Auckland nonstop (Air NZ)"),
];

/// Connection-only pairs that must NOT appear as a non-stop in the route
/// table; their presence means the upstream data conflated a connecting
/// itinerary with a direct flight.
pub const KNOWN_CONNECTION_ONLY: &[(&str, &str, &str)] = &[
    ("LHR", "SYD", "LHR-Sydney (requires a stop)"),
    ("LHR", "MEL", "LHR-Melbourne (requires a stop)"),
    ("LHR", "HNL", "LHR-Honolulu (requires a stop via LAX/SFO)"),
    ("BRS", "HNL", "Bristol-Honolulu (requires multiple stops)"),
    ("BRS", "SYD", "Bristol-Sydney (requires multiple stops)"),
    ("JFK", "SYD", "JFK-Sydney (no current nonstop)"),
];

fn has_route(routes: &RouteTable, a: &str, b: &str) -> bool {
    routes.edges().any(|(from, to)| (from == a && to == b) || (from == b && to == a))
}

#[derive(Debug, Clone)]
pub struct SanityReport {
    pub errors: Vec<String>,
}

impl SanityReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

fn check_airport_count(catalogue: &AirportCatalogue, errors: &mut Vec<String>) {
    if catalogue.len() < MIN_AIRPORT_COUNT {
        errors.push(format!(
            "airport catalogue has only {} airports, below the minimum of {MIN_AIRPORT_COUNT}",
            catalogue.len()
        ));
    }
}

fn check_coordinate_ranges(catalogue: &AirportCatalogue, errors: &mut Vec<String>) {
    for airport in catalogue.iter() {
        if !(-90.0..=90.0).contains(&airport.lat) || !(-180.0..=180.0).contains(&airport.lng) {
            errors.push(format!(
                "{}: coordinate out of range ({}, {})",
                airport.code, airport.lat, airport.lng
            ));
        }
    }
}

fn check_required_whitelist(catalogue: &AirportCatalogue, errors: &mut Vec<String>) {
    for code in REQUIRED_AIRPORT_WHITELIST {
        if catalogue.get(code).is_none() {
            errors.push(format!("required airport {code} missing from catalogue"));
        }
    }
}

fn check_hub_connectivity(routes: &RouteTable, errors: &mut Vec<String>) {
    for &(hub, minimum) in HUB_CONNECTIVITY_MINIMA {
        let destinations = routes.edges().filter(|(from, _)| *from == hub).count();
        if destinations < minimum {
            errors.push(format!(
                "hub {hub} serves only {destinations} destinations, below the expected minimum of {minimum}"
            ));
        }
    }
}

fn check_known_pairs(routes: &RouteTable, errors: &mut Vec<String>) {
    for &(from, to, description) in KNOWN_NONSTOPS {
        if !has_route(routes, from, to) {
            errors.push(format!("expected non-stop {from}-{to} missing: {description}"));
        }
    }
    for &(from, to, description) in KNOWN_CONNECTION_ONLY {
        if has_route(routes, from, to) {
            errors.push(format!(
                "{from}-{to} present as a non-stop but should require a connection: {description}"
            ));
        }
    }
}

/// City pairs with a well-known approximate flight time, used to catch a
/// regression in the piecewise-linear estimator itself rather than in the
/// data it's fed.
const KNOWN_FLIGHT_TIME_FIXTURES: &[(&str, &str, u32, u32)] = &[
    ("LHR", "JFK", 420, 540),
    ("BRS", "LHR", 20, 90),
];

fn check_flight_time_estimator(catalogue: &AirportCatalogue, errors: &mut Vec<String>) {
    for &(from, to, min_minutes, max_minutes) in KNOWN_FLIGHT_TIME_FIXTURES {
        let (Some(a), Some(b)) = (catalogue.get(from), catalogue.get(to)) else {
            continue;
        };
        let distance_km = crate::geo::haversine_km(a.coordinates(), b.coordinates());
        let estimated = estimate_flight_minutes(distance_km);
        if estimated < min_minutes || estimated > max_minutes {
            errors.push(format!(
                "{from}-{to} estimated flight time {estimated}min outside expected [{min_minutes}, {max_minutes}]"
            ));
        }
    }
}

/// Runs every check and returns one itemised report. Per §7, sanity-check
/// violations are always printed to stderr regardless of logging
/// verbosity; the caller is expected to do that with the returned report.
pub fn run_sanity_checks(catalogue: &AirportCatalogue, routes: &RouteTable) -> SanityReport {
    let mut errors = Vec::new();
    check_airport_count(catalogue, &mut errors);
    check_coordinate_ranges(catalogue, &mut errors);
    check_required_whitelist(catalogue, &mut errors);
    check_hub_connectivity(routes, &mut errors);
    check_known_pairs(routes, &mut errors);
    check_flight_time_estimator(catalogue, &mut errors);
    SanityReport { errors }
}

/// Prints every error in `report` to stderr, one line each, regardless of
/// the run's logging verbosity.
pub fn report_to_stderr(report: &SanityReport) {
    if report.passed() {
        eprintln!("sanity check: all checks passed");
        return;
    }
    eprintln!("sanity check: {} problem(s) found", report.errors.len());
    for error in &report.errors {
        eprintln!("  - {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_catalogue() -> AirportCatalogue {
        AirportCatalogue::load_from_value(serde_json::json!({
            "BRS": {"name": "Bristol", "lat": 51.3827, "lng": -2.7191, "country": "GB", "size_class": "medium"},
            "LHR": {"name": "Heathrow", "lat": 51.4700, "lng": -0.4543, "country": "GB", "size_class": "large"},
            "LGW": {"name": "Gatwick", "lat": 51.1481, "lng": -0.1903, "country": "GB", "size_class": "large"},
            "BHX": {"name": "Birmingham", "lat": 52.4539, "lng": -1.7480, "country": "GB", "size_class": "medium"},
            "JFK": {"name": "JFK", "lat": 40.6413, "lng": -73.7781, "country": "US", "size_class": "large"},
        }))
        .expect("valid catalogue")
    }

    #[test]
    fn flags_missing_required_airport() {
        let catalogue = AirportCatalogue::load_from_value(serde_json::json!({
            "JFK": {"name": "JFK", "lat": 40.6413, "lng": -73.7781, "country": "US", "size_class": "large"},
        }))
        .expect("valid catalogue");
        let routes = RouteTable::from_map(HashMap::new());
        let report = run_sanity_checks(&catalogue, &routes);
        assert!(!report.passed());
        assert!(report.errors.iter().any(|e| e.contains("BRS")));
    }

    #[test]
    fn flags_connection_only_pair_present_as_nonstop() {
        let catalogue = full_catalogue();
        let mut raw = HashMap::new();
        raw.insert("BRS".to_string(), vec!["SYD".to_string()]);
        let catalogue_with_syd = AirportCatalogue::load_from_value(serde_json::json!({
            "BRS": {"name": "Bristol", "lat": 51.3827, "lng": -2.7191, "country": "GB", "size_class": "medium"},
            "LHR": {"name": "Heathrow", "lat": 51.4700, "lng": -0.4543, "country": "GB", "size_class": "large"},
            "LGW": {"name": "Gatwick", "lat": 51.1481, "lng": -0.1903, "country": "GB", "size_class": "large"},
            "BHX": {"name": "Birmingham", "lat": 52.4539, "lng": -1.7480, "country": "GB", "size_class": "medium"},
            "SYD": {"name": "Sydney", "lat": -33.9399, "lng": 151.1753, "country": "AU", "size_class": "large"},
        }))
        .expect("valid catalogue");
        let _ = catalogue;
        let routes = RouteTable::from_map(raw);
        let report = run_sanity_checks(&catalogue_with_syd, &routes);
        assert!(report.errors.iter().any(|e| e.contains("BRS-SYD")));
    }

    #[test]
    fn flight_time_estimator_fixture_passes_on_real_coordinates() {
        let catalogue = full_catalogue();
        let mut errors = Vec::new();
        check_flight_time_estimator(&catalogue, &mut errors);
        assert!(errors.is_empty());
    }
}
