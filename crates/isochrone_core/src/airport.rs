//! Airport catalogue: the immutable set of known airports for a run.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Large,
    Medium,
    Small,
}

#[derive(Debug, Clone, Deserialize)]
struct RawAirport {
    name: String,
    lat: f64,
    lng: f64,
    country: String,
    size_class: SizeClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub country: String,
    pub size_class: SizeClass,
}

impl Airport {
    pub fn coordinates(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// The immutable, run-wide set of known airports, keyed by uppercase code.
#[derive(Debug, Clone, Default)]
pub struct AirportCatalogue {
    by_code: HashMap<String, Airport>,
}

impl AirportCatalogue {
    fn from_map(raw: HashMap<String, RawAirport>) -> Result<Self, CatalogueError> {
        let mut by_code = HashMap::with_capacity(raw.len());
        for (code, entry) in raw {
            if !(-90.0..=90.0).contains(&entry.lat) || !(-180.0..=180.0).contains(&entry.lng) {
                return Err(CatalogueError::InvalidCoordinate {
                    code,
                    lat: entry.lat,
                    lng: entry.lng,
                });
            }
            let airport = Airport {
                code: code.clone(),
                name: entry.name,
                lat: entry.lat,
                lng: entry.lng,
                country: entry.country,
                size_class: entry.size_class,
            };
            if by_code.insert(code.clone(), airport).is_some() {
                return Err(CatalogueError::DuplicateCode(code));
            }
        }
        Ok(Self { by_code })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogueError> {
        let data = std::fs::read_to_string(path)?;
        let raw: HashMap<String, RawAirport> = serde_json::from_str(&data)?;
        Self::from_map(raw)
    }

    /// Builds a catalogue directly from a parsed JSON value, for tests and
    /// for embedding small fixtures without a filesystem round-trip.
    pub fn load_from_value(value: serde_json::Value) -> Result<Self, CatalogueError> {
        let raw: HashMap<String, RawAirport> = serde_json::from_value(value)?;
        Self::from_map(raw)
    }

    pub fn get(&self, code: &str) -> Option<&Airport> {
        self.by_code.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Airport> {
        self.by_code.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HashMap<String, RawAirport> {
        let mut m = HashMap::new();
        m.insert(
            "BRS".to_string(),
            RawAirport {
                name: "Bristol Airport".to_string(),
                lat: 51.3827,
                lng: -2.7191,
                country: "GB".to_string(),
                size_class: SizeClass::Medium,
            },
        );
        m
    }

    #[test]
    fn builds_catalogue_from_valid_map() {
        let catalogue = AirportCatalogue::from_map(sample()).expect("valid");
        assert_eq!(catalogue.len(), 1);
        assert!(catalogue.contains("BRS"));
        assert_eq!(catalogue.get("BRS").unwrap().country, "GB");
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let mut raw = sample();
        raw.get_mut("BRS").unwrap().lat = 200.0;
        let result = AirportCatalogue::from_map(raw);
        assert!(matches!(result, Err(CatalogueError::InvalidCoordinate { .. })));
    }
}
