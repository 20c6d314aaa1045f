// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cell::RefCell;
use std::error::Error;
use std::fmt::Display;
use std::rc::Rc;

use crate::{
    find_node_path, find_route, snap, AStarError, BuildingHint, Coordinate, Graph, Node,
    Rejection, RoutingConfig,
};

/// A way of finding a walk between two positions.
///
/// The [RouteManager](crate::RouteManager) tries its finders in order, skipping those
/// which report [Rejection::GraphNotReady].
pub trait RouteFinder {
    /// Short name of the strategy, for logging.
    fn name(&self) -> &'static str;

    /// Finds a walk from `from` to `to`, returned as the sequence of waypoints.
    fn find(
        &self,
        from: Coordinate,
        to: Coordinate,
        hint: Option<&BuildingHint>,
    ) -> Result<Vec<Coordinate>, Rejection>;

    /// Whether the strategy's graph contains nodes inside buildings. Such finders
    /// are asked for the indoor destination itself, instead of the building's
    /// reference coordinate.
    fn reaches_indoor_nodes(&self) -> bool {
        false
    }
}

/// Shared, replaceable slot holding the current [Graph] of a strategy.
///
/// Reloading swaps the whole graph at once. Searches work on an [Rc] snapshot,
/// so a search started before a reload finishes on the graph it started with.
#[derive(Debug, Default, Clone)]
pub struct GraphSlot(Rc<RefCell<Option<Rc<Graph>>>>);

impl GraphSlot {
    /// Creates an empty slot; strategies using it report [Rejection::GraphNotReady]
    /// until a graph is set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_graph(g: Graph) -> Self {
        let slot = Self::new();
        slot.set(g);
        slot
    }

    pub fn set(&self, g: Graph) {
        *self.0.borrow_mut() = Some(Rc::new(g));
    }

    /// Replaces the graph with a freshly loaded one. On load failure, the error
    /// is logged and the previous graph (if any) is kept. Returns whether the
    /// graph was replaced.
    pub fn reload<E: Display>(&self, loaded: Result<Graph, E>) -> bool {
        match loaded {
            Ok(g) => {
                self.set(g);
                true
            }
            Err(e) => {
                log::error!("failed to load graph, keeping the previous one: {e}");
                false
            }
        }
    }

    pub fn snapshot(&self) -> Option<Rc<Graph>> {
        self.0.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.0.borrow().is_some()
    }
}

fn to_coordinates(g: &Graph, path: &[i64]) -> Vec<Coordinate> {
    path.iter()
        .filter_map(|&id| g.get_node(id))
        .map(|nd| nd.coordinate())
        .collect()
}

/// Distance-optimal routing with [find_route] over a graph built from path geometry.
#[derive(Debug, Clone)]
pub struct GeodesicGraphStrategy {
    graph: GraphSlot,
    building_radius: f64,
    step_limit: usize,
}

impl GeodesicGraphStrategy {
    pub fn new(graph: GraphSlot, config: &RoutingConfig) -> Self {
        Self {
            graph,
            building_radius: config.building_radius_m,
            step_limit: config.step_limit,
        }
    }

    pub fn graph(&self) -> &GraphSlot {
        &self.graph
    }

    /// Snaps both ends onto the graph and returns the ids of the nodes on the shortest walk.
    /// Only the destination is snapped with the building `hint`.
    pub fn node_path(
        &self,
        from: Coordinate,
        to: Coordinate,
        hint: Option<&BuildingHint>,
    ) -> Result<(Rc<Graph>, Vec<i64>), Rejection> {
        let g = self.graph.snapshot().ok_or(Rejection::GraphNotReady)?;

        let start = snap(&g, from, None, self.building_radius).ok_or(Rejection::NoNearbyPath)?;
        let goal = snap(&g, to, hint, self.building_radius).ok_or(Rejection::NoNearbyPath)?;
        log::debug!("geodesic: snapped start/end nodes: {start}, {goal}");

        match find_route(&g, start, goal, self.step_limit) {
            Ok(Some(path)) => Ok((g, path)),
            Ok(None) => Err(Rejection::NoPathFound),
            Err(AStarError::StepLimitExceeded) => {
                log::warn!("geodesic: step limit exceeded between nodes {start} and {goal}");
                Err(Rejection::NoPathFound)
            }
            Err(e @ AStarError::InvalidReference(_)) => {
                log::error!("geodesic: {e}");
                Err(Rejection::NoNearbyPath)
            }
        }
    }
}

impl RouteFinder for GeodesicGraphStrategy {
    fn name(&self) -> &'static str {
        "geodesic"
    }

    fn find(
        &self,
        from: Coordinate,
        to: Coordinate,
        hint: Option<&BuildingHint>,
    ) -> Result<Vec<Coordinate>, Rejection> {
        let (g, path) = self.node_path(from, to, hint)?;
        Ok(to_coordinates(&g, &path))
    }
}

/// Fewest-hops routing with [find_node_path] over curated node and edge records
/// (see [store](crate::store)).
#[derive(Debug, Clone)]
pub struct PersistedGraphStrategy {
    graph: GraphSlot,
    snap_radius: f64,
}

impl PersistedGraphStrategy {
    pub fn new(graph: GraphSlot, config: &RoutingConfig) -> Self {
        Self {
            graph,
            snap_radius: config.persisted_snap_radius_m,
        }
    }

    pub fn graph(&self) -> &GraphSlot {
        &self.graph
    }

    /// Finds the persisted nodes closest to both positions (within the snap radius)
    /// and returns the nodes on the walk with the fewest edges between them.
    pub fn node_path(&self, from: Coordinate, to: Coordinate) -> Result<Vec<Node>, Rejection> {
        let g = self.graph.snapshot().ok_or(Rejection::GraphNotReady)?;

        let start = g
            .find_nearest_node_around(from.lat, from.lon, from, self.snap_radius)
            .ok_or(Rejection::NoNearbyPath)?;
        let goal = g
            .find_nearest_node_around(to.lat, to.lon, to, self.snap_radius)
            .ok_or(Rejection::NoNearbyPath)?;
        log::debug!("persisted: snapped start/end nodes: {}, {}", start.id, goal.id);

        let path = find_node_path(&g, start.id, goal.id).ok_or(Rejection::NoPathFound)?;
        Ok(path.iter().filter_map(|&id| g.get_node(id)).collect())
    }
}

impl RouteFinder for PersistedGraphStrategy {
    fn name(&self) -> &'static str {
        "persisted"
    }

    fn reaches_indoor_nodes(&self) -> bool {
        true
    }

    fn find(
        &self,
        from: Coordinate,
        to: Coordinate,
        _hint: Option<&BuildingHint>,
    ) -> Result<Vec<Coordinate>, Rejection> {
        let nodes = self.node_path(from, to)?;
        Ok(nodes.iter().map(Node::coordinate).collect())
    }
}

/// A turn-by-turn routing service for pedestrians, keyed by raw coordinates.
pub trait ExternalRouter {
    fn route(&self, from: Coordinate, to: Coordinate) -> Result<Vec<Coordinate>, Box<dyn Error>>;
}

/// Last-resort routing through an [ExternalRouter].
pub struct ExternalServiceStrategy {
    router: Box<dyn ExternalRouter>,
}

impl ExternalServiceStrategy {
    pub fn new<R: ExternalRouter + 'static>(router: R) -> Self {
        Self {
            router: Box::new(router),
        }
    }
}

impl RouteFinder for ExternalServiceStrategy {
    fn name(&self) -> &'static str {
        "external"
    }

    fn find(
        &self,
        from: Coordinate,
        to: Coordinate,
        _hint: Option<&BuildingHint>,
    ) -> Result<Vec<Coordinate>, Rejection> {
        match self.router.route(from, to) {
            Ok(path) if !path.is_empty() => Ok(path),
            Ok(_) => Err(Rejection::NoPathFound),
            Err(e) => {
                log::warn!("external routing failed: {e}");
                Err(Rejection::NoPathFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Edge;

    fn two_segments() -> Graph {
        // 1 ── 2      3 ── 4
        let mut g = Graph::new();
        g.set_node(Node::new(1, 0.0, 0.0));
        g.set_node(Node::new(2, 0.0, 0.001));
        g.set_node(Node::new(3, 0.0, 0.003));
        g.set_node(Node::new(4, 0.0, 0.004));
        g.connect(1, 2);
        g.connect(3, 4);
        g
    }

    struct FixedRouter(Option<Vec<Coordinate>>);

    impl ExternalRouter for FixedRouter {
        fn route(&self, from: Coordinate, to: Coordinate) -> Result<Vec<Coordinate>, Box<dyn Error>> {
            match self.0 {
                Some(ref middle) => {
                    let mut path = vec![from];
                    path.extend(middle.iter().cloned());
                    path.push(to);
                    Ok(path)
                }
                None => Err("service unavailable".into()),
            }
        }
    }

    #[test]
    fn slot_reload_keeps_previous_graph_on_error() {
        let slot = GraphSlot::new();
        assert!(!slot.is_ready());

        assert!(!slot.reload::<&str>(Err("connection refused")));
        assert!(!slot.is_ready());

        assert!(slot.reload::<&str>(Ok(two_segments())));
        let before = slot.snapshot().unwrap();

        assert!(!slot.reload::<&str>(Err("connection refused")));
        assert!(Rc::ptr_eq(&before, &slot.snapshot().unwrap()));
    }

    #[test]
    fn slot_snapshot_survives_reload() {
        let slot = GraphSlot::with_graph(two_segments());
        let old = slot.snapshot().unwrap();
        slot.set(Graph::new());

        assert_eq!(old.len(), 4);
        assert!(slot.snapshot().unwrap().is_empty());
    }

    #[test]
    fn geodesic() {
        let s = GeodesicGraphStrategy::new(
            GraphSlot::with_graph(two_segments()),
            &RoutingConfig::default(),
        );

        let path = s
            .find(Coordinate::new(0.0001, 0.0), Coordinate::new(0.0, 0.0009), None)
            .unwrap();
        assert_eq!(path, vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.001)]);

        assert_eq!(
            s.find(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.004), None),
            Err(Rejection::NoPathFound)
        );
    }

    #[test]
    fn geodesic_not_ready_and_empty() {
        let config = RoutingConfig::default();
        let at = Coordinate::new(0.0, 0.0);

        let s = GeodesicGraphStrategy::new(GraphSlot::new(), &config);
        assert_eq!(s.find(at, at, None), Err(Rejection::GraphNotReady));

        let s = GeodesicGraphStrategy::new(GraphSlot::with_graph(Graph::new()), &config);
        assert_eq!(s.find(at, at, None), Err(Rejection::NoNearbyPath));
    }

    #[test]
    fn persisted_snap_radius() {
        let s = PersistedGraphStrategy::new(
            GraphSlot::with_graph(two_segments()),
            &RoutingConfig::default(),
        );

        let nodes = s
            .node_path(Coordinate::new(0.0002, 0.0), Coordinate::new(0.0, 0.0011))
            .unwrap();
        assert_eq!(nodes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2]);

        // ~111 m away from the closest node
        assert_eq!(
            s.node_path(Coordinate::new(0.001, 0.0), Coordinate::new(0.0, 0.001)),
            Err(Rejection::NoNearbyPath)
        );

        assert_eq!(
            s.node_path(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.004)),
            Err(Rejection::NoPathFound)
        );
    }

    #[test]
    fn persisted_one_way() {
        let mut g = two_segments();
        g.add_edge(2, Edge { to: 3, cost: 222.4 });
        let s = PersistedGraphStrategy::new(GraphSlot::with_graph(g), &RoutingConfig::default());

        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 0.004);
        assert_eq!(s.find(a, b, None).map(|p| p.len()), Ok(4));
        assert_eq!(s.find(b, a, None), Err(Rejection::NoPathFound));
    }

    #[test]
    fn external() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 0.001);

        let s = ExternalServiceStrategy::new(FixedRouter(Some(vec![Coordinate::new(0.0001, 0.0005)])));
        assert_eq!(s.find(a, b, None).map(|p| p.len()), Ok(3));

        let s = ExternalServiceStrategy::new(FixedRouter(None));
        assert_eq!(s.find(a, b, None), Err(Rejection::NoPathFound));
    }
}
