//! Airport spatial index (C6): buckets reachable airports into coarse grid
//! cells so a per-cell query only has to look at dozens of candidates, not
//! every airport the router reached.

use std::collections::HashMap;

use h3o::CellIndex;

use crate::airport::AirportCatalogue;
use crate::config::IndexCosts;
use crate::grid;
use crate::router::BestAirportResult;

#[derive(Debug, Clone)]
pub struct IndexedAirport {
    pub code: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default)]
pub struct AirportSpatialIndex {
    resolution: Option<h3o::Resolution>,
    buckets: HashMap<CellIndex, Vec<IndexedAirport>>,
}

impl AirportSpatialIndex {
    /// Buckets every airport in `reached` (the router's result) that's also
    /// present in the catalogue.
    pub fn build(
        reached: &HashMap<String, BestAirportResult>,
        catalogue: &AirportCatalogue,
        costs: &IndexCosts,
    ) -> Self {
        let mut buckets: HashMap<CellIndex, Vec<IndexedAirport>> = HashMap::new();
        for code in reached.keys() {
            let Some(airport) = catalogue.get(code) else { continue };
            let Some(bucket) = grid::cell_at(airport.lat, airport.lng, costs.bucket_resolution)
            else {
                continue;
            };
            buckets.entry(bucket).or_default().push(IndexedAirport {
                code: code.clone(),
                lat: airport.lat,
                lng: airport.lng,
            });
        }
        Self { resolution: Some(costs.bucket_resolution), buckets }
    }

    /// Candidate airports near `lat`/`lng`: the airports bucketed within
    /// `costs.ring_radius` grid steps of the query point's own bucket.
    pub fn candidates(&self, lat: f64, lng: f64, costs: &IndexCosts) -> Vec<&IndexedAirport> {
        let Some(resolution) = self.resolution else { return Vec::new() };
        let Some(query_bucket) = grid::cell_at(lat, lng, resolution) else {
            return Vec::new();
        };
        grid::disk(query_bucket, costs.ring_radius)
            .into_iter()
            .filter_map(|bucket| self.buckets.get(&bucket))
            .flatten()
            .collect()
    }
}
