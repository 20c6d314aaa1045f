// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{BuildingHint, BuildingRegistry, Coordinate, RouteFinder, RoutingConfig};

/// Reason why a route could not be created, worded for display to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The user's current position is not known.
    #[error("location unavailable")]
    LocationUnavailable,

    /// No routing graph has been loaded yet.
    #[error("graph not ready")]
    GraphNotReady,

    /// The start or the destination is not close to any path.
    #[error("no nearby path")]
    NoNearbyPath,

    /// The start and the destination are not connected.
    #[error("no path found")]
    NoPathFound,

    /// A newer request was started before this one completed.
    #[error("superseded by a newer request")]
    Superseded,
}

/// Where a route should lead to.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub coordinate: Coordinate,

    /// Name to display, e.g. a room or a marker name.
    pub label: Option<String>,

    /// Name of the building the destination belongs to, resolved through
    /// the manager's [BuildingRegistry].
    pub building: Option<String>,

    /// Explicit building hint, takes precedence over `building`.
    pub hint: Option<BuildingHint>,

    /// The destination lies inside `building`, off the outdoor path network.
    pub is_indoor: bool,
}

impl Destination {
    pub fn at(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            label: None,
            building: None,
            hint: None,
            is_indoor: false,
        }
    }

    pub fn labeled<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn in_building<S: Into<String>>(mut self, building: S, is_indoor: bool) -> Self {
        self.building = Some(building.into());
        self.is_indoor = is_indoor;
        self
    }

    pub fn with_hint(mut self, hint: BuildingHint, is_indoor: bool) -> Self {
        self.hint = Some(hint);
        self.is_indoor = is_indoor;
        self
    }
}

/// A materialized walk, ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Waypoints, from the start to the destination.
    pub coordinates: Vec<Coordinate>,

    /// Sum of great-circle distances between consecutive waypoints, in meters.
    pub distance_m: f64,

    /// Estimated walking time, in whole minutes (rounded up).
    pub eta_minutes: u32,

    /// The destination as requested, before any indoor substitution.
    pub destination: Destination,

    /// Name of the [RouteFinder] which produced the route.
    pub finder: &'static str,
}

impl Route {
    pub fn distance_km(&self) -> f64 {
        (self.distance_m / 10.0).round() / 100.0
    }

    /// Returns the route as a GeoJSON LineString feature
    /// with `name`, `distance_m` and `eta_min` properties.
    pub fn to_geojson(&self) -> geojson::Feature {
        let line = self
            .coordinates
            .iter()
            .map(|c| vec![c.lon, c.lat])
            .collect::<Vec<_>>();

        let mut properties = geojson::JsonObject::new();
        if let Some(ref label) = self.destination.label {
            properties.insert("name".to_string(), label.clone().into());
        }
        properties.insert("distance_m".to_string(), self.distance_m.into());
        properties.insert("eta_min".to_string(), self.eta_minutes.into());

        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::LineString(line))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Total length of a walk through the provided waypoints, in meters.
pub fn path_length(coordinates: &[Coordinate]) -> f64 {
    coordinates
        .windows(2)
        .map(|pair| pair[0].distance_to(&pair[1]))
        .sum()
}

/// Walking time over `distance_m` meters at `speed_mps`, in minutes, rounded up.
pub fn eta_minutes(distance_m: f64, speed_mps: f64) -> u32 {
    (distance_m / speed_mps / 60.0).ceil() as u32
}

/// Identifies a single route request; see [RouteManager::begin_request].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Lifecycle of the manager's current route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    /// No route is displayed and no request is in flight.
    Idle,

    /// A request is in flight. A route from an earlier request may still be displayed.
    Searching(RequestToken),

    /// A route is displayed.
    Displayed,
}

/// Turns route requests into [Routes](Route) and owns the single "current route".
///
/// Requests are answered by the first [RouteFinder] able to produce a walk,
/// tried in the order they were added. Finders without a loaded graph are
/// skipped; if every finder fails, the reason reported by the first available
/// finder is returned.
pub struct RouteManager {
    config: RoutingConfig,
    finders: Vec<Box<dyn RouteFinder>>,
    buildings: BuildingRegistry,
    user_location: Option<Coordinate>,
    state: RouteState,
    current: Option<Route>,
    last_token: u64,
}

impl RouteManager {
    pub fn new(config: RoutingConfig) -> Self {
        Self {
            config,
            finders: Vec::default(),
            buildings: BuildingRegistry::default(),
            user_location: None,
            state: RouteState::Idle,
            current: None,
            last_token: 0,
        }
    }

    /// Appends a [RouteFinder] to the end of the fallback chain.
    pub fn add_finder<F: RouteFinder + 'static>(&mut self, finder: F) {
        self.finders.push(Box::new(finder));
    }

    pub fn set_buildings(&mut self, buildings: BuildingRegistry) {
        self.buildings = buildings;
    }

    pub fn buildings(&self) -> &BuildingRegistry {
        &self.buildings
    }

    /// Updates the user's position, as reported by the GPS. `None` means the
    /// position is unknown.
    pub fn set_user_location(&mut self, at: Option<Coordinate>) {
        self.user_location = at;
    }

    pub fn user_location(&self) -> Option<Coordinate> {
        self.user_location
    }

    pub fn state(&self) -> RouteState {
        self.state
    }

    pub fn current_route(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    /// Starts a new request, superseding any request still in flight.
    pub fn begin_request(&mut self) -> RequestToken {
        self.last_token += 1;
        let token = RequestToken(self.last_token);
        self.state = RouteState::Searching(token);
        token
    }

    /// Answers the request identified by `token`.
    ///
    /// On success the new route replaces the current one. On failure the current
    /// route (if any) stays displayed. A token which is no longer the latest one
    /// is rejected with [Rejection::Superseded] without any search.
    pub fn resolve(
        &mut self,
        token: RequestToken,
        destination: &Destination,
    ) -> Result<&Route, Rejection> {
        if self.state != RouteState::Searching(token) {
            return Err(Rejection::Superseded);
        }

        match self.find(destination) {
            Ok(route) => {
                self.state = RouteState::Displayed;
                Ok(&*self.current.insert(route))
            }
            Err(reason) => {
                self.state = match self.current {
                    Some(_) => RouteState::Displayed,
                    None => RouteState::Idle,
                };
                Err(reason)
            }
        }
    }

    /// Creates a route from the user's location to the destination,
    /// replacing the current route on success.
    pub fn create_route(&mut self, destination: &Destination) -> Result<&Route, Rejection> {
        let token = self.begin_request();
        self.resolve(token, destination)
    }

    /// Removes the current route. Does nothing if there is none.
    pub fn clear_route(&mut self) {
        self.current = None;
        if self.state == RouteState::Displayed {
            self.state = RouteState::Idle;
        }
    }

    fn find(&self, destination: &Destination) -> Result<Route, Rejection> {
        let from = self.user_location.ok_or(Rejection::LocationUnavailable)?;
        let (outdoor_to, hint) = self.routing_target(destination);

        let mut first_failure: Option<Rejection> = None;
        for finder in &self.finders {
            let to = if finder.reaches_indoor_nodes() {
                destination.coordinate
            } else {
                outdoor_to
            };
            match finder.find(from, to, hint.as_ref()) {
                Ok(coordinates) => {
                    let distance_m = path_length(&coordinates);
                    log::debug!(
                        "{}: route with {} waypoints, {:.1} m",
                        finder.name(),
                        coordinates.len(),
                        distance_m
                    );
                    return Ok(Route {
                        coordinates,
                        distance_m,
                        eta_minutes: eta_minutes(distance_m, self.config.walking_speed_mps),
                        destination: destination.clone(),
                        finder: finder.name(),
                    });
                }
                Err(Rejection::GraphNotReady) => {
                    log::debug!("{}: graph not ready, skipping", finder.name());
                }
                Err(reason) => {
                    log::debug!("{}: {}", finder.name(), reason);
                    first_failure.get_or_insert(reason);
                }
            }
        }

        Err(first_failure.unwrap_or(Rejection::GraphNotReady))
    }

    /// Resolves the building hint of a destination, and substitutes the building's
    /// reference coordinate for indoor destinations, which aren't on the path network.
    /// Finders which [reach indoor nodes](RouteFinder::reaches_indoor_nodes) are given
    /// the destination as-is instead.
    fn routing_target(&self, destination: &Destination) -> (Coordinate, Option<BuildingHint>) {
        let hint = match (&destination.hint, &destination.building) {
            (Some(hint), _) => Some(hint.clone()),
            (None, Some(name)) => match self.buildings.find_by_name(name) {
                Some(b) => Some(b.hint()),
                None => {
                    log::warn!("unknown building {:?}, routing to the destination as-is", name);
                    None
                }
            },
            (None, None) => None,
        };

        match hint {
            Some(ref h) if destination.is_indoor => (h.center, hint.clone()),
            _ => (destination.coordinate, hint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Building, GeodesicGraphStrategy, Graph, GraphSlot, Node, PersistedGraphStrategy};

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 0.1),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    fn line_graph() -> Graph {
        // 1 ── 2 ── 3      4 ── 5
        let mut g = Graph::new();
        g.set_node(Node::new(1, 0.0, 0.0));
        g.set_node(Node::new(2, 0.0, 0.001));
        g.set_node(Node::new(3, 0.0, 0.002));
        g.set_node(Node::new(4, 0.0, 0.01));
        g.set_node(Node::new(5, 0.0, 0.011));
        g.connect(1, 2);
        g.connect(2, 3);
        g.connect(4, 5);
        g
    }

    fn manager_with(g: Graph) -> RouteManager {
        let config = RoutingConfig::default();
        let mut m = RouteManager::new(config.clone());
        m.add_finder(GeodesicGraphStrategy::new(GraphSlot::with_graph(g), &config));
        m
    }

    #[test]
    fn eta() {
        assert_eq!(eta_minutes(0.0, 1.4), 0);
        assert_eq!(eta_minutes(83.9, 1.4), 1);
        assert_eq!(eta_minutes(84.1, 1.4), 2);
        assert_eq!(eta_minutes(90.0, 1.5), 1);
        assert_eq!(eta_minutes(222.4, 1.4), 3);
    }

    #[test]
    fn creates_route() {
        let mut m = manager_with(line_graph());
        m.set_user_location(Some(Coordinate::new(0.0001, 0.0)));

        let route = m
            .create_route(&Destination::at(Coordinate::new(0.0, 0.0021)).labeled("Library"))
            .unwrap();

        assert_eq!(route.coordinates.len(), 3);
        assert_almost_eq!(route.distance_m, 222.4);
        assert_eq!(route.distance_m, path_length(&route.coordinates));
        assert_eq!(route.eta_minutes, eta_minutes(route.distance_m, 1.4));
        assert_eq!(route.distance_km(), 0.22);
        assert_eq!(route.finder, "geodesic");
        assert_eq!(m.state(), RouteState::Displayed);
    }

    #[test]
    fn location_unavailable() {
        let slot = GraphSlot::with_graph(line_graph());
        let before = slot.snapshot().unwrap();

        let config = RoutingConfig::default();
        let mut m = RouteManager::new(config.clone());
        m.add_finder(GeodesicGraphStrategy::new(slot.clone(), &config));

        assert_eq!(
            m.create_route(&Destination::at(Coordinate::new(0.0, 0.002))),
            Err(Rejection::LocationUnavailable)
        );
        assert_eq!(m.state(), RouteState::Idle);
        assert!(m.current_route().is_none());
        assert_eq!(*before, *slot.snapshot().unwrap());
    }

    #[test]
    fn no_path_found_keeps_previous_route() {
        let mut m = manager_with(line_graph());
        m.set_user_location(Some(Coordinate::new(0.0, 0.0)));

        m.create_route(&Destination::at(Coordinate::new(0.0, 0.002)))
            .unwrap();
        assert_eq!(
            m.create_route(&Destination::at(Coordinate::new(0.0, 0.011))),
            Err(Rejection::NoPathFound)
        );

        assert_eq!(m.state(), RouteState::Displayed);
        assert_eq!(m.current_route().map(|r| r.coordinates.len()), Some(3));
    }

    #[test]
    fn graph_not_ready_and_no_nearby_path() {
        let config = RoutingConfig::default();
        let mut m = RouteManager::new(config.clone());
        m.set_user_location(Some(Coordinate::new(0.0, 0.0)));
        let dest = Destination::at(Coordinate::new(0.0, 0.002));

        assert_eq!(m.create_route(&dest), Err(Rejection::GraphNotReady));

        let slot = GraphSlot::new();
        m.add_finder(GeodesicGraphStrategy::new(slot.clone(), &config));
        assert_eq!(m.create_route(&dest), Err(Rejection::GraphNotReady));

        slot.set(Graph::new());
        assert_eq!(m.create_route(&dest), Err(Rejection::NoNearbyPath));

        slot.set(line_graph());
        assert!(m.create_route(&dest).is_ok());
    }

    #[test]
    fn new_route_replaces_old_and_clear() {
        let mut m = manager_with(line_graph());
        m.set_user_location(Some(Coordinate::new(0.0, 0.0)));

        m.create_route(&Destination::at(Coordinate::new(0.0, 0.002)))
            .unwrap();
        m.create_route(&Destination::at(Coordinate::new(0.0, 0.001)))
            .unwrap();
        assert_eq!(m.current_route().map(|r| r.coordinates.len()), Some(2));

        m.clear_route();
        assert!(m.current_route().is_none());
        assert_eq!(m.state(), RouteState::Idle);

        m.clear_route();
        assert_eq!(m.state(), RouteState::Idle);
    }

    #[test]
    fn superseded_request() {
        let mut m = manager_with(line_graph());
        m.set_user_location(Some(Coordinate::new(0.0, 0.0)));
        let dest = Destination::at(Coordinate::new(0.0, 0.002));

        let first = m.begin_request();
        let second = m.begin_request();
        assert_eq!(m.state(), RouteState::Searching(second));

        assert_eq!(m.resolve(first, &dest), Err(Rejection::Superseded));
        assert!(m.resolve(second, &dest).is_ok());
        assert_eq!(m.resolve(second, &dest), Err(Rejection::Superseded));
    }

    #[test]
    fn indoor_destination_routes_to_building() {
        let mut g = line_graph();
        // A spur entering the building near node 3
        g.set_node(Node::new(6, 0.0006, 0.0021));
        g.connect(3, 6);

        let mut m = manager_with(g);
        m.set_user_location(Some(Coordinate::new(0.0, 0.0)));

        let mut buildings = BuildingRegistry::new();
        buildings.insert(Building {
            id: 10,
            name: "FCI Building".to_string(),
            center: Coordinate::new(0.0007, 0.0021),
            floors: 3,
        });
        m.set_buildings(buildings);

        // The room is far off the path network; only the building's
        // reference coordinate leads to node 6.
        let room = Destination::at(Coordinate::new(0.05, 0.05))
            .labeled("Lab 3.14")
            .in_building("fci building", true);
        let route = m.create_route(&room).unwrap();

        assert_eq!(route.coordinates.last(), Some(&Coordinate::new(0.0006, 0.0021)));
        assert_eq!(route.destination.coordinate, Coordinate::new(0.05, 0.05));
        assert_eq!(route.destination.label.as_deref(), Some("Lab 3.14"));
    }

    #[test]
    fn unknown_building_is_ignored() {
        let mut m = manager_with(line_graph());
        m.set_user_location(Some(Coordinate::new(0.0, 0.0)));

        let dest = Destination::at(Coordinate::new(0.0, 0.002)).in_building("Nowhere Hall", true);
        let route = m.create_route(&dest).unwrap();
        assert_eq!(route.coordinates.last(), Some(&Coordinate::new(0.0, 0.002)));
    }

    #[test]
    fn falls_back_to_persisted_graph() {
        let config = RoutingConfig::default();
        let mut m = RouteManager::new(config.clone());
        m.add_finder(GeodesicGraphStrategy::new(GraphSlot::new(), &config));

        let mut curated = Graph::new();
        curated.set_node(Node::new(1, 0.0, 0.0));
        curated.set_node(Node::new(2, 0.0002, 0.0));
        curated.connect(1, 2);
        m.add_finder(PersistedGraphStrategy::new(GraphSlot::with_graph(curated), &config));

        m.set_user_location(Some(Coordinate::new(0.0, 0.0)));
        let route = m
            .create_route(&Destination::at(Coordinate::new(0.0002, 0.0)))
            .unwrap();
        assert_eq!(route.finder, "persisted");
        assert_eq!(route.coordinates.len(), 2);
    }

    #[test]
    fn reports_first_available_failure() {
        let config = RoutingConfig::default();
        let mut m = RouteManager::new(config.clone());
        m.add_finder(GeodesicGraphStrategy::new(GraphSlot::with_graph(line_graph()), &config));
        m.add_finder(PersistedGraphStrategy::new(GraphSlot::with_graph(Graph::new()), &config));

        m.set_user_location(Some(Coordinate::new(0.0, 0.0)));
        assert_eq!(
            m.create_route(&Destination::at(Coordinate::new(0.0, 0.011))),
            Err(Rejection::NoPathFound)
        );
    }

    #[test]
    fn geojson() {
        let mut m = manager_with(line_graph());
        m.set_user_location(Some(Coordinate::new(0.0, 0.0)));
        let route = m
            .create_route(&Destination::at(Coordinate::new(0.0, 0.001)).labeled("Library"))
            .unwrap();

        let f = route.to_geojson();
        let properties = f.properties.unwrap();
        assert_eq!(properties["name"], "Library");
        assert_eq!(properties["eta_min"], 2);

        match f.geometry.unwrap().value {
            geojson::Value::LineString(line) => {
                assert_eq!(line, vec![vec![0.0, 0.0], vec![0.001, 0.0]])
            }
            _ => panic!("expected a LineString"),
        }
    }

    #[test]
    fn indoor_destination_on_persisted_graph() {
        let config = RoutingConfig::default();
        let mut m = RouteManager::new(config.clone());
        m.add_finder(GeodesicGraphStrategy::new(GraphSlot::new(), &config));

        // Entrance, lobby and a room inside the building, ~22 m apart each
        let mut curated = Graph::new();
        curated.set_node(Node::new(1, 0.0, 0.0));
        curated.set_node(Node::new(2, 0.0002, 0.0));
        curated.set_node(Node::new(3, 0.0004, 0.0));
        curated.connect(1, 2);
        curated.connect(2, 3);
        m.add_finder(PersistedGraphStrategy::new(GraphSlot::with_graph(curated), &config));

        let mut buildings = BuildingRegistry::new();
        buildings.insert(Building {
            id: 10,
            name: "FCI Building".to_string(),
            center: Coordinate::new(0.0002, 0.0),
            floors: 3,
        });
        m.set_buildings(buildings);
        m.set_user_location(Some(Coordinate::new(0.0, 0.0)));

        let room = Destination::at(Coordinate::new(0.0004, 0.0)).in_building("FCI Building", true);
        let route = m.create_route(&room).unwrap();
        assert_eq!(route.finder, "persisted");
        assert_eq!(route.coordinates.last(), Some(&Coordinate::new(0.0004, 0.0)));
    }
}
