//! Discontinuity analyser (C9): a QA pass over one resolution's cell
//! records that flags ring-1 neighbour pairs whose total time jumps by more
//! than a threshold, and buckets each jump by a likely cause so a human
//! reviewing the report doesn't have to re-derive it by hand.

use std::collections::HashMap;

use h3o::CellIndex;
use serde::Serialize;

use crate::record::CellRecord;

/// Default per §4.9.
pub const DEFAULT_THRESHOLD_MINUTES: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscontinuityCategory {
    /// One side of the pair has an OSRM-sourced time and the other doesn't:
    /// the jump likely tracks the edge of sanitised road-table coverage
    /// rather than a real travel-time cliff.
    OsrmBoundary,
    /// Both cells reach by flight but through different destination
    /// airports.
    AirportSwitch,
    /// One cell is drive-only and the other reaches by flight.
    DriveVsFlight,
    /// Same reachability mode and (for flights) same destination airport,
    /// so the jump isn't explained by a tag change at all.
    SameAirport,
}

impl DiscontinuityCategory {
    fn label(self) -> &'static str {
        match self {
            DiscontinuityCategory::OsrmBoundary => "osrm-boundary",
            DiscontinuityCategory::AirportSwitch => "airport-switch",
            DiscontinuityCategory::DriveVsFlight => "drive-vs-flight",
            DiscontinuityCategory::SameAirport => "same-airport",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscontinuityPair {
    pub cell_a: String,
    pub cell_b: String,
    pub minutes_a: u32,
    pub minutes_b: u32,
    pub delta_minutes: u32,
    pub category: DiscontinuityCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscontinuityReport {
    pub resolution: u8,
    pub threshold_minutes: u32,
    pub pairs_checked: usize,
    pub flagged_count: usize,
    pub histogram: HashMap<String, usize>,
    pub worst_pairs: Vec<DiscontinuityPair>,
}

fn classify(a: &CellRecord, b: &CellRecord) -> DiscontinuityCategory {
    if a.osrm_flag() != b.osrm_flag() {
        return DiscontinuityCategory::OsrmBoundary;
    }
    match (a, b) {
        (CellRecord::DriveOnly { .. }, CellRecord::Flight { .. })
        | (CellRecord::Flight { .. }, CellRecord::DriveOnly { .. }) => {
            DiscontinuityCategory::DriveVsFlight
        }
        (CellRecord::Flight { destination_airport_code: da, .. }, CellRecord::Flight { destination_airport_code: db, .. }) => {
            if da == db {
                DiscontinuityCategory::SameAirport
            } else {
                DiscontinuityCategory::AirportSwitch
            }
        }
        (CellRecord::DriveOnly { .. }, CellRecord::DriveOnly { .. }) => {
            DiscontinuityCategory::SameAirport
        }
    }
}

fn cell_identity(cell: CellIndex) -> String {
    format!("{:x}", u64::from(cell))
}

/// Walks every cell in `records`, compares against its present ring-1
/// neighbours, and flags pairs whose time delta meets `threshold_minutes`.
/// Each unordered pair is counted once: the comparison only runs in the
/// direction where `cell`'s raw index is the smaller of the two.
pub fn analyze_discontinuities(
    records: &HashMap<CellIndex, CellRecord>,
    resolution: u8,
    threshold_minutes: u32,
    top_n: usize,
) -> DiscontinuityReport {
    let mut pairs_checked = 0usize;
    let mut histogram: HashMap<String, usize> = HashMap::new();
    let mut flagged = Vec::new();

    for (&cell, record) in records {
        for neighbour in crate::grid::ring1(cell) {
            if u64::from(neighbour) <= u64::from(cell) {
                continue;
            }
            let Some(neighbour_record) = records.get(&neighbour) else {
                continue;
            };
            pairs_checked += 1;

            let a = record.total_minutes();
            let b = neighbour_record.total_minutes();
            let delta = a.abs_diff(b);
            if delta < threshold_minutes {
                continue;
            }

            let category = classify(record, neighbour_record);
            *histogram.entry(category.label().to_string()).or_insert(0) += 1;
            flagged.push(DiscontinuityPair {
                cell_a: cell_identity(cell),
                cell_b: cell_identity(neighbour),
                minutes_a: a,
                minutes_b: b,
                delta_minutes: delta,
                category,
            });
        }
    }

    flagged.sort_by(|x, y| y.delta_minutes.cmp(&x.delta_minutes));
    let flagged_count = flagged.len();
    flagged.truncate(top_n);

    DiscontinuityReport {
        resolution,
        threshold_minutes,
        pairs_checked,
        flagged_count,
        histogram,
        worst_pairs: flagged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::cell_at;
    use h3o::Resolution;

    fn flight(code: &str, minutes: u32) -> CellRecord {
        CellRecord::Flight {
            total_minutes: minutes,
            origin_access_code: "BRS".to_string(),
            destination_airport_code: code.to_string(),
            stops: 0,
            osrm_flag: Some(true),
        }
    }

    fn drive(minutes: u32) -> CellRecord {
        CellRecord::DriveOnly { total_minutes: minutes, osrm_flag: Some(true) }
    }

    #[test]
    fn flags_drive_vs_flight_jump_across_ring1_neighbours() {
        let origin = cell_at(51.45, -2.59, Resolution::Six).unwrap();
        let neighbour = crate::grid::ring1(origin)[0];

        let mut records = HashMap::new();
        records.insert(origin, drive(20));
        records.insert(neighbour, flight("JFK", 600));

        let report = analyze_discontinuities(&records, 6, 120, 10);
        assert_eq!(report.pairs_checked, 1);
        assert_eq!(report.flagged_count, 1);
        assert_eq!(report.worst_pairs[0].category, DiscontinuityCategory::DriveVsFlight);
    }

    #[test]
    fn does_not_flag_below_threshold() {
        let origin = cell_at(51.45, -2.59, Resolution::Six).unwrap();
        let neighbour = crate::grid::ring1(origin)[0];

        let mut records = HashMap::new();
        records.insert(origin, drive(20));
        records.insert(neighbour, drive(25));

        let report = analyze_discontinuities(&records, 6, 120, 10);
        assert_eq!(report.flagged_count, 0);
        assert!(report.worst_pairs.is_empty());
    }

    #[test]
    fn classifies_airport_switch_separately_from_same_airport() {
        assert_eq!(classify(&flight("JFK", 500), &flight("EWR", 700)), DiscontinuityCategory::AirportSwitch);
        assert_eq!(classify(&flight("JFK", 500), &flight("JFK", 700)), DiscontinuityCategory::SameAirport);
    }

    #[test]
    fn classifies_osrm_boundary_when_flag_differs_regardless_of_tags() {
        let a = CellRecord::DriveOnly { total_minutes: 20, osrm_flag: Some(true) };
        let b = CellRecord::DriveOnly { total_minutes: 200, osrm_flag: Some(false) };
        assert_eq!(classify(&a, &b), DiscontinuityCategory::OsrmBoundary);
    }
}
