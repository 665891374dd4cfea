//! Flight graph (C3): adjacency built from the route table and airport
//! catalogue, with edge weights from the flight-time estimator and a
//! symmetrisation pass so every served pair has both directions.

use std::collections::HashMap;

use crate::airport::AirportCatalogue;
use crate::geo::{estimate_flight_minutes, haversine_km};
use crate::route_table::RouteTable;

fn unordered_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlightGraph {
    adjacency: HashMap<String, Vec<(String, u32)>>,
    weights: HashMap<(String, String), u32>,
}

impl FlightGraph {
    /// Builds the graph from the route table and catalogue. Edges whose
    /// endpoints aren't both in the catalogue are dropped. The forward pass
    /// adds edges as declared; the reverse pass fills in any missing mirror.
    pub fn build(route_table: &RouteTable, catalogue: &AirportCatalogue) -> Self {
        let mut adjacency: HashMap<String, Vec<(String, u32)>> = HashMap::new();
        let mut weights: HashMap<(String, String), u32> = HashMap::new();

        for (src, dst) in route_table.edges() {
            let (Some(a), Some(b)) = (catalogue.get(src), catalogue.get(dst)) else {
                continue;
            };
            let key = unordered_key(src, dst);
            let weight = *weights.entry(key).or_insert_with(|| {
                estimate_flight_minutes(haversine_km(a.coordinates(), b.coordinates()))
            });
            let forward = adjacency.entry(src.to_string()).or_default();
            if !forward.iter().any(|(code, _)| code == dst) {
                forward.push((dst.to_string(), weight));
            }
        }

        // Reverse pass: add the mirror of any edge missing its reverse.
        let missing_reverses: Vec<(String, String, u32)> = adjacency
            .iter()
            .flat_map(|(src, dsts)| {
                dsts.iter()
                    .map(move |(dst, weight)| (src.clone(), dst.clone(), *weight))
            })
            .filter(|(src, dst, _)| {
                !adjacency
                    .get(dst)
                    .is_some_and(|back| back.iter().any(|(code, _)| code == src))
            })
            .collect();

        for (src, dst, weight) in missing_reverses {
            adjacency
                .entry(dst)
                .or_default()
                .push((src, weight));
        }

        Self { adjacency, weights }
    }

    pub fn neighbours(&self, code: &str) -> &[(String, u32)] {
        self.adjacency.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn weight(&self, a: &str, b: &str) -> Option<u32> {
        self.weights.get(&unordered_key(a, b)).copied()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airport::SizeClass;
    use std::collections::HashMap as Map;

    fn catalogue() -> AirportCatalogue {
        let raw = serde_json::json!({
            "BRS": {"name": "Bristol", "lat": 51.3827, "lng": -2.7191, "country": "GB", "size_class": "medium"},
            "JFK": {"name": "JFK", "lat": 40.6413, "lng": -73.7781, "country": "US", "size_class": "large"},
        });
        let _ = SizeClass::Large;
        AirportCatalogue::load_from_value(raw).expect("valid catalogue")
    }

    #[test]
    fn symmetrises_one_directional_edge() {
        let mut map = Map::new();
        map.insert("BRS".to_string(), vec!["JFK".to_string()]);
        let routes = RouteTable::from_map(map);
        let graph = FlightGraph::build(&routes, &catalogue());

        assert!(graph.neighbours("BRS").iter().any(|(c, _)| c == "JFK"));
        assert!(graph.neighbours("JFK").iter().any(|(c, _)| c == "BRS"));

        let forward = graph.weight("BRS", "JFK").unwrap();
        let reverse = graph.weight("JFK", "BRS").unwrap();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn drops_edges_to_unknown_codes() {
        let mut map = Map::new();
        map.insert("BRS".to_string(), vec!["ZZZ".to_string()]);
        let routes = RouteTable::from_map(map);
        let graph = FlightGraph::build(&routes, &catalogue());
        assert!(graph.neighbours("BRS").is_empty());
    }
}
