//! Great-circle distance and the time estimators built on top of it (C1).
//!
//! Distance is haversine on a sphere of Earth's mean radius. The flight-time
//! estimator is piecewise-linear over distance bands; the drive-time
//! estimator is a single fixed-speed fallback used only where no road-table
//! entry is available.

use std::num::NonZeroUsize;
use std::sync::{Mutex, OnceLock};

use h3o::CellIndex;
use lru::LruCache;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two (lat, lng) points in degrees.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

fn cell_latlng(cell: CellIndex) -> (f64, f64) {
    let ll: h3o::LatLng = cell.into();
    (ll.lat(), ll.lng())
}

fn distance_km_between_cells_uncached(a: CellIndex, b: CellIndex) -> f64 {
    haversine_km(cell_latlng(a), cell_latlng(b))
}

fn get_distance_cache() -> &'static Mutex<LruCache<(CellIndex, CellIndex), f64>> {
    static CACHE: OnceLock<Mutex<LruCache<(CellIndex, CellIndex), f64>>> = OnceLock::new();
    CACHE.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(50_000).expect("cache size must be non-zero"),
        ))
    })
}

/// Distance between two H3 cells, memoised in a global LRU cache keyed
/// symmetrically so (a, b) and (b, a) share an entry.
pub fn distance_km_between_cells(a: CellIndex, b: CellIndex) -> f64 {
    let key = if a < b { (a, b) } else { (b, a) };
    let mut cache = get_distance_cache().lock().unwrap();
    *cache.get_or_insert(key, || distance_km_between_cells_uncached(key.0, key.1))
}

/// One band of the piecewise-linear flight-time schedule: below
/// `max_distance_km`, cruise at `cruise_speed_kmh` with `overhead_minutes`
/// fixed boarding/taxi time added.
struct FlightBand {
    max_distance_km: f64,
    cruise_speed_kmh: f64,
    overhead_minutes: f64,
}

const FLIGHT_BANDS: [FlightBand; 5] = [
    FlightBand { max_distance_km: 500.0, cruise_speed_kmh: 400.0, overhead_minutes: 30.0 },
    FlightBand { max_distance_km: 1500.0, cruise_speed_kmh: 550.0, overhead_minutes: 25.0 },
    FlightBand { max_distance_km: 4000.0, cruise_speed_kmh: 700.0, overhead_minutes: 25.0 },
    FlightBand { max_distance_km: 8000.0, cruise_speed_kmh: 800.0, overhead_minutes: 25.0 },
    FlightBand { max_distance_km: f64::INFINITY, cruise_speed_kmh: 850.0, overhead_minutes: 30.0 },
];

/// Estimated flight duration in whole minutes for a great-circle distance.
pub fn estimate_flight_minutes(distance_km: f64) -> u32 {
    let band = FLIGHT_BANDS
        .iter()
        .find(|b| distance_km < b.max_distance_km)
        .unwrap_or(&FLIGHT_BANDS[FLIGHT_BANDS.len() - 1]);
    let minutes = distance_km / band.cruise_speed_kmh * 60.0 + band.overhead_minutes;
    minutes.round() as u32
}

const FALLBACK_DRIVE_SPEED_KMH: f64 = 40.0;

/// Straight-line driving-time fallback, used only where no road-table entry
/// is available for a cell.
pub fn estimate_drive_minutes_fallback(distance_km: f64) -> u32 {
    (distance_km / FALLBACK_DRIVE_SPEED_KMH * 60.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_distance() {
        let p = (51.5, -0.1);
        assert!(haversine_km(p, p) < 1e-9);
    }

    #[test]
    fn haversine_known_pair_bristol_jfk() {
        // Bristol (BRS) to New York (JFK), roughly 5500km great circle.
        let brs = (51.3827, -2.7191);
        let jfk = (40.6413, -73.7781);
        let d = haversine_km(brs, jfk);
        assert!((5200.0..5900.0).contains(&d), "got {d}");
    }

    #[test]
    fn flight_time_bands_are_continuous_enough() {
        // Just under and over a band edge shouldn't swing wildly.
        let just_under = estimate_flight_minutes(499.0);
        let just_over = estimate_flight_minutes(501.0);
        assert!(just_over as i64 - just_under as i64 <= 10);
    }

    #[test]
    fn flight_time_short_hop() {
        // 400km at 400km/h => 60 min + 30 min overhead = 90.
        assert_eq!(estimate_flight_minutes(400.0), 90);
    }

    #[test]
    fn flight_time_long_haul() {
        // 9000km at 850km/h => ~635.3min + 30 = ~665min.
        let minutes = estimate_flight_minutes(9000.0);
        assert!((660..670).contains(&minutes), "got {minutes}");
    }

    #[test]
    fn drive_fallback_matches_formula() {
        assert_eq!(estimate_drive_minutes_fallback(20.0), 30);
    }
}
