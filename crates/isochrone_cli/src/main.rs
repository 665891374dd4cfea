//! Command-line front door for the isochrone pipeline (§10.3).
//!
//! Exposes exactly the configuration knobs of §6 — origin key, all-origins,
//! base-only, input/output paths — plus standalone subcommands for the two
//! analysers (C9, C10) against artefacts a `run` already produced.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use h3o::Resolution;

use isochrone_cli::{run_discontinuity_standalone, run_pipeline, run_sanity_standalone};
use isochrone_core::config::RunConfig;

/// Precompute door-to-door travel-time isochrones for a chosen origin city.
#[derive(Parser)]
#[command(name = "isochrone", about = "Global isochrone precomputation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for one origin, or every registered origin.
    Run {
        /// Origin key from the origins registry.
        #[arg(long, default_value = "bristol")]
        origin: String,
        /// Run every registered origin instead of just `--origin`.
        #[arg(long)]
        all_origins: bool,
        /// Only compute the base resolutions (1-4), skipping the chunked tiers.
        #[arg(long)]
        base_only: bool,
        /// Path to the airport catalogue JSON.
        #[arg(long, default_value = "data/airports.json")]
        airports: PathBuf,
        /// Path to the route table JSON.
        #[arg(long, default_value = "data/routes.json")]
        routes: PathBuf,
        /// Directory of per-region road-table JSON files.
        #[arg(long, default_value = "data/ground")]
        road_tables_dir: PathBuf,
        /// Path to the origin's own road table JSON, if one was crawled.
        #[arg(long)]
        origin_road_table: Option<PathBuf>,
        /// Path to a JSON file of extra/overriding origins, merged over the
        /// built-in registry.
        #[arg(long)]
        origins_registry: Option<PathBuf>,
        /// Directory artefacts are written into.
        #[arg(long, default_value = "data/isochrones")]
        output_dir: PathBuf,
    },
    /// Run the discontinuity analyser against artefacts a prior `run` wrote.
    Discontinuity {
        /// Origin key whose artefacts to read.
        #[arg(long, default_value = "bristol")]
        origin: String,
        /// Resolution to analyse (1-6).
        #[arg(long)]
        resolution: u8,
        /// Directory the artefacts were written into.
        #[arg(long, default_value = "data/isochrones")]
        output_dir: PathBuf,
        /// Minimum neighbour-to-neighbour delta, in minutes, to flag.
        #[arg(long, default_value_t = isochrone_core::discontinuity::DEFAULT_THRESHOLD_MINUTES)]
        threshold_minutes: u32,
        /// Number of worst pairs to report.
        #[arg(long, default_value_t = 20)]
        top_n: usize,
    },
    /// Run the sanity checker against the airport catalogue and route table.
    Sanity {
        /// Path to the airport catalogue JSON.
        #[arg(long, default_value = "data/airports.json")]
        airports: PathBuf,
        /// Path to the route table JSON.
        #[arg(long, default_value = "data/routes.json")]
        routes: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            origin,
            all_origins,
            base_only,
            airports,
            routes,
            road_tables_dir,
            origin_road_table,
            origins_registry,
            output_dir,
        } => {
            let mut config = RunConfig::default()
                .with_origin_key(origin)
                .with_all_origins(all_origins)
                .with_base_only(base_only)
                .with_airports_path(airports)
                .with_routes_path(routes)
                .with_road_tables_dir(road_tables_dir)
                .with_output_dir(output_dir);
            if let Some(path) = origin_road_table {
                config = config.with_origin_road_table_path(path);
            }
            if let Some(path) = origins_registry {
                config = config.with_origins_registry_path(path);
            }

            match run_pipeline(&config) {
                Ok(outcomes) => {
                    let mut all_passed = true;
                    for outcome in &outcomes {
                        eprintln!(
                            "origin {}: {} reachable airports, {} chunk resolution(s), sanity {}",
                            outcome.origin_key,
                            outcome.reachable_airport_count,
                            outcome.chunk_counts.len(),
                            if outcome.sanity.passed() { "passed" } else { "FAILED" }
                        );
                        all_passed &= outcome.sanity.passed();
                    }
                    if all_passed {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(err) => {
                    eprintln!("run failed: {err}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Discontinuity { origin, resolution, output_dir, threshold_minutes, top_n } => {
            let Ok(resolution) = Resolution::try_from(resolution) else {
                eprintln!("invalid resolution: {resolution}");
                return ExitCode::FAILURE;
            };
            let plan = isochrone_core::config::ResolutionPlan::default();
            match run_discontinuity_standalone(
                &output_dir,
                &origin,
                resolution,
                &plan.base_resolutions,
                threshold_minutes,
                top_n,
            ) {
                Ok(report) => {
                    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("discontinuity analysis failed: {err}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Sanity { airports, routes } => {
            let config = RunConfig::default()
                .with_airports_path(airports)
                .with_routes_path(routes);
            match run_sanity_standalone(&config) {
                Ok(report) => {
                    isochrone_core::sanity::report_to_stderr(&report);
                    if report.passed() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(err) => {
                    eprintln!("sanity check failed to run: {err}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
