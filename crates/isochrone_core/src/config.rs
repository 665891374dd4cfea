//! Run configuration: cost constants, canonical resolutions, and the
//! origins registry. Assembled once at startup and threaded read-only
//! through the rest of the pipeline rather than kept as process-wide
//! globals.

use std::collections::HashMap;
use std::path::PathBuf;

use h3o::Resolution;
use serde::{Deserialize, Serialize};

/// Cost constants for the bounded-stop router (C4).
#[derive(Debug, Clone, Copy)]
pub struct RouterCosts {
    pub origin_overhead_minutes: u32,
    pub connection_penalty_minutes: u32,
    pub max_stops: u8,
    pub circuity_factor: f64,
    pub min_fly_distance_km: f64,
}

impl Default for RouterCosts {
    fn default() -> Self {
        Self {
            origin_overhead_minutes: 90,
            connection_penalty_minutes: 120,
            max_stops: 2,
            circuity_factor: 1.8,
            min_fly_distance_km: 150.0,
        }
    }
}

/// Cost constants and thresholds for the cell evaluator (C7) and the road
/// table sanitiser (C5).
#[derive(Debug, Clone, Copy)]
pub struct CellCosts {
    pub drive_compare_radius_km: f64,
    pub crawl_radius_km: f64,
    pub arrival_overhead_same_country_minutes: u32,
    pub arrival_overhead_different_country_minutes: u32,
}

impl Default for CellCosts {
    fn default() -> Self {
        Self {
            drive_compare_radius_km: 400.0,
            crawl_radius_km: 200.0,
            arrival_overhead_same_country_minutes: 30,
            arrival_overhead_different_country_minutes: 60,
        }
    }
}

/// Pearson-correlation and speed-cap thresholds for stage 2 of the
/// sanitiser, kept configurable per the design notes on re-calibration.
#[derive(Debug, Clone, Copy)]
pub struct SanitiserCosts {
    pub legacy_fallback_speed_kmh: f64,
    pub legacy_fallback_min_distance_km: f64,
    pub implied_speed_cap_kmh: f64,
    pub min_surviving_cells_for_correlation: usize,
    pub island_correlation_threshold: f64,
    pub island_low_speed_cap_kmh: f64,
    pub island_radius_multiplier: f64,
}

impl Default for SanitiserCosts {
    fn default() -> Self {
        Self {
            legacy_fallback_speed_kmh: 30.0,
            legacy_fallback_min_distance_km: 5.0,
            implied_speed_cap_kmh: 130.0,
            min_surviving_cells_for_correlation: 20,
            island_correlation_threshold: 0.6,
            island_low_speed_cap_kmh: 30.0,
            island_radius_multiplier: 1.2,
        }
    }
}

/// Spatial index tuning (C6): bucket resolution and ring-expansion radius
/// are co-tuned, so they're kept together.
#[derive(Debug, Clone, Copy)]
pub struct IndexCosts {
    pub bucket_resolution: Resolution,
    pub ring_radius: u32,
}

impl Default for IndexCosts {
    fn default() -> Self {
        Self {
            bucket_resolution: Resolution::Four,
            ring_radius: 3,
        }
    }
}

/// Canonical resolutions used throughout the pipeline.
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    pub road_resolution: Resolution,
    pub base_resolutions: Vec<Resolution>,
    /// (resolution, parent resolution used to chunk it) for C8's chunked tier.
    pub chunked_resolutions: Vec<(Resolution, Resolution)>,
    pub discontinuity_resolution: Resolution,
    pub discontinuity_threshold_minutes: u32,
}

impl Default for ResolutionPlan {
    fn default() -> Self {
        Self {
            road_resolution: Resolution::Six,
            base_resolutions: vec![
                Resolution::One,
                Resolution::Two,
                Resolution::Three,
                Resolution::Four,
            ],
            chunked_resolutions: vec![
                (Resolution::Five, Resolution::One),
                (Resolution::Six, Resolution::Two),
            ],
            discontinuity_resolution: Resolution::Six,
            discontinuity_threshold_minutes: 120,
        }
    }
}

/// A single access airport for an origin: its code and the fixed
/// ground-time-to-airport in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessAirport {
    pub code: String,
    pub ground_time_minutes: u32,
}

/// A named origin with coordinates and an ordered list of access airports.
/// The first entry is the "nearest" for drive-only comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginSpec {
    pub key: String,
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
    pub access_airports: Vec<AccessAirport>,
}

impl OriginSpec {
    pub fn coordinates(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    pub fn nearest_access_airport(&self) -> Option<&AccessAirport> {
        self.access_airports.first()
    }
}

fn bristol_origin() -> OriginSpec {
    OriginSpec {
        key: "bristol".to_string(),
        display_name: "Bristol".to_string(),
        lat: 51.3827,
        lng: -2.7191,
        access_airports: vec![
            AccessAirport { code: "BRS".to_string(), ground_time_minutes: 25 },
            AccessAirport { code: "LHR".to_string(), ground_time_minutes: 120 },
            AccessAirport { code: "LGW".to_string(), ground_time_minutes: 150 },
            AccessAirport { code: "BHX".to_string(), ground_time_minutes: 90 },
        ],
    }
}

/// The registry of configured origins, keyed by origin key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginsRegistry {
    origins: HashMap<String, OriginSpec>,
}

impl Default for OriginsRegistry {
    fn default() -> Self {
        let mut origins = HashMap::new();
        let bristol = bristol_origin();
        origins.insert(bristol.key.clone(), bristol);
        Self { origins }
    }
}

impl OriginsRegistry {
    pub fn get(&self, key: &str) -> Option<&OriginSpec> {
        self.origins.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.origins.keys().map(String::as_str)
    }

    pub fn all(&self) -> impl Iterator<Item = &OriginSpec> {
        self.origins.values()
    }

    pub fn insert(&mut self, spec: OriginSpec) {
        self.origins.insert(spec.key.clone(), spec);
    }

    /// Loads a registry from a JSON file of `{key: OriginSpec}`, merging
    /// over (not replacing) the built-in defaults so `bristol` survives
    /// even if the file doesn't mention it.
    pub fn load_merged(path: &std::path::Path) -> Result<Self, crate::error::PipelineError> {
        let mut registry = Self::default();
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let loaded: HashMap<String, OriginSpec> = serde_json::from_str(&data)?;
            for (_, spec) in loaded {
                registry.insert(spec);
            }
        }
        Ok(registry)
    }
}

/// All configuration for one invocation of the pipeline, assembled once at
/// startup from defaults, an optional origins-registry file, and CLI
/// overrides.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub origin_key: String,
    pub all_origins: bool,
    pub base_only: bool,
    pub airports_path: PathBuf,
    pub routes_path: PathBuf,
    pub road_tables_dir: PathBuf,
    pub origin_road_table_path: Option<PathBuf>,
    pub origins_registry_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub router_costs: RouterCosts,
    pub cell_costs: CellCosts,
    pub sanitiser_costs: SanitiserCosts,
    pub index_costs: IndexCosts,
    pub resolutions: ResolutionPlan,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            origin_key: "bristol".to_string(),
            all_origins: false,
            base_only: false,
            airports_path: PathBuf::from("data/airports.json"),
            routes_path: PathBuf::from("data/routes.json"),
            road_tables_dir: PathBuf::from("data/ground"),
            origin_road_table_path: None,
            origins_registry_path: None,
            output_dir: PathBuf::from("data/isochrones"),
            router_costs: RouterCosts::default(),
            cell_costs: CellCosts::default(),
            sanitiser_costs: SanitiserCosts::default(),
            index_costs: IndexCosts::default(),
            resolutions: ResolutionPlan::default(),
        }
    }
}

impl RunConfig {
    pub fn with_origin_key(mut self, key: impl Into<String>) -> Self {
        self.origin_key = key.into();
        self
    }

    pub fn with_all_origins(mut self, all_origins: bool) -> Self {
        self.all_origins = all_origins;
        self
    }

    pub fn with_base_only(mut self, base_only: bool) -> Self {
        self.base_only = base_only;
        self
    }

    pub fn with_airports_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.airports_path = path.into();
        self
    }

    pub fn with_routes_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.routes_path = path.into();
        self
    }

    pub fn with_road_tables_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.road_tables_dir = path.into();
        self
    }

    pub fn with_origin_road_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.origin_road_table_path = Some(path.into());
        self
    }

    pub fn with_origins_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.origins_registry_path = Some(path.into());
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn load_origins_registry(&self) -> Result<OriginsRegistry, crate::error::PipelineError> {
        match &self.origins_registry_path {
            Some(path) => OriginsRegistry::load_merged(path),
            None => Ok(OriginsRegistry::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_bristol_with_four_access_airports() {
        let registry = OriginsRegistry::default();
        let bristol = registry.get("bristol").expect("bristol is seeded by default");
        assert_eq!(bristol.access_airports.len(), 4);
        assert_eq!(bristol.nearest_access_airport().unwrap().code, "BRS");
    }

    #[test]
    fn run_config_builder_overrides_defaults() {
        let config = RunConfig::default()
            .with_origin_key("bristol")
            .with_base_only(true);
        assert_eq!(config.origin_key, "bristol");
        assert!(config.base_only);
        assert!(!config.all_origins);
    }
}
