//! # Isochrone Core
//!
//! Travel-time precomputation engine for a single global hex grid: for a
//! named origin, evaluates every H3 cell on Earth down to the canonical
//! resolutions and records the fastest way there, either by road alone or
//! by road-to-airport plus a bounded-stop flight itinerary.
//!
//! ## Overview
//!
//! - **Airport catalogue & route graph**: [`airport`], [`route_table`],
//!   [`flight_graph`] build the static flight network for a run.
//! - **Router**: [`router`] finds, from a named [`config::OriginSpec`], the
//!   fastest reachable time and path to every airport within a bounded
//!   number of stops.
//! - **Road data**: [`road_table`] sanitises per-airport driving-time
//!   tables; [`origin_road_table`] holds the analogous table for the origin
//!   city itself.
//! - **Spatial index**: [`airport_index`] answers "which reached airports
//!   are near this cell" without scanning every airport per cell.
//! - **Cell evaluator**: [`cell_evaluator`] combines all of the above into
//!   one [`record::CellRecord`] per cell.
//! - **Pipeline**: [`pipeline`] drives the global grid traversal, chunks and
//!   compresses the output, and writes the route-table artefact
//!   ([`route_artefact`]).
//! - **QA**: [`discontinuity`] flags suspicious neighbour-to-neighbour time
//!   jumps; [`sanity`] runs cross-data-source invariant checks.
//!
//! ## Example
//!
//! ```rust,no_run
//! use isochrone_core::config::RunConfig;
//! use isochrone_core::airport::AirportCatalogue;
//! use isochrone_core::route_table::RouteTable;
//! use isochrone_core::flight_graph::FlightGraph;
//! use isochrone_core::router;
//!
//! let config = RunConfig::default();
//! let catalogue = AirportCatalogue::load(&config.airports_path).unwrap();
//! let routes = RouteTable::load(&config.routes_path).unwrap();
//! let graph = FlightGraph::build(&routes, &catalogue);
//! let origin = config.load_origins_registry().unwrap().get("bristol").unwrap().clone();
//! let reached = router::route(&graph, &catalogue, &origin, &config.router_costs);
//! ```

pub mod airport;
pub mod airport_index;
pub mod cell_evaluator;
pub mod config;
pub mod discontinuity;
pub mod error;
pub mod flight_graph;
pub mod geo;
pub mod grid;
pub mod origin_road_table;
pub mod pipeline;
pub mod record;
pub mod road_table;
pub mod route_artefact;
pub mod route_table;
pub mod router;
pub mod sanity;
