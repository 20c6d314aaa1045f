// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Walking-path routing over campus path networks.
//!
//! Line geometry (usually a [GeoJSON](https://geojson.org/) export of campus footpaths)
//! is converted into a weighted undirected [Graph], with near-coincident vertices merged
//! into single nodes. Arbitrary positions are snapped onto the graph, optionally biased
//! towards a destination [building](crate::Building), and A* finds the shortest walk.
//!
//! Curated node/edge records kept in an external [store](crate::store) form a second,
//! independent graph searched breadth-first, and an [ExternalRouter] may serve as the
//! last resort. All of these are composed by the [RouteManager].
//!
//! # Example
//!
//! ```no_run
//! let config = campus_router::RoutingConfig::default();
//! let g = campus_router::geometry::graph_from_file(
//!     &campus_router::geometry::Options::default(),
//!     &config,
//!     "path/to/campus.geojson",
//! )
//! .expect("failed to load campus.geojson");
//!
//! let mut manager = campus_router::RouteManager::new(config.clone());
//! let slot = campus_router::GraphSlot::with_graph(g);
//! manager.add_finder(campus_router::GeodesicGraphStrategy::new(slot, &config));
//! manager.set_user_location(Some(campus_router::Coordinate::new(2.9290, 101.6405)));
//!
//! let destination = campus_router::Destination::at(campus_router::Coordinate::new(2.9279, 101.6424));
//! match manager.create_route(&destination) {
//!     Ok(route) => println!("{:.2} km, {} min", route.distance_km(), route.eta_minutes),
//!     Err(reason) => println!("{}", reason),
//! }
//! ```

mod astar;
mod bfs;
mod building;
mod config;
mod distance;
mod finder;
pub mod geometry;
mod graph;
mod manager;
#[cfg(feature = "osrm")]
pub mod osrm;
mod snap;
pub mod store;

pub use astar::{find_route, AStarError, DEFAULT_STEP_LIMIT};
pub use bfs::find_node_path;
pub use building::{Building, BuildingHint, BuildingRegistry};
pub use config::{ConfigError, InvalidConfig, RoutingConfig};
pub use distance::earth_distance;
pub use finder::{
    ExternalRouter, ExternalServiceStrategy, GeodesicGraphStrategy, GraphSlot,
    PersistedGraphStrategy, RouteFinder,
};
pub use graph::Graph;
pub use manager::{
    eta_minutes, path_length, Destination, Rejection, RequestToken, Route, RouteManager,
    RouteState,
};
pub use snap::snap;

/// A position on Earth, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another coordinate, in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        earth_distance(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Represents an element of the [Graph]: a point on the walking-path network
/// usable as a routing waypoint.
///
/// Nodes with `id == 0` are disallowed, zero is reserved to signify absence of nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

impl Node {
    pub const fn new(id: i64, lat: f64, lon: f64) -> Self {
        Self { id, lat, lon }
    }

    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Represents an outgoing (one-way) connection from a specific [Node].
///
/// `cost` is the great-circle distance between the two nodes, in meters,
/// taken at the time the edge was created.
///
/// Due to implementation details, `to` might not exist in the [Graph].
/// Users must silently ignore such edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: i64,
    pub cost: f64,
}
