// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Coordinate, Edge, Node};
use std::collections::btree_map::{BTreeMap, Entry};

/// Represents a walking-path network as a set of [Nodes](Node)
/// and [Edges](Edge) between them.
///
/// Nodes are iterated in ascending id order. Graphs produced by the
/// [geometry](crate::geometry) builder assign ids in creation order, so iteration
/// order is also insertion order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph(BTreeMap<i64, (Node, Vec<Edge>)>);

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the graph contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the total number of directed edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.0.values().map(|(_, edges)| edges.len()).sum()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.0.iter().map(|(_, (node, _))| node)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<Node> {
        self.0.get(&id).map(|&(node, _)| node)
    }

    /// Creates or updates a [Node] with `node.id`.
    ///
    /// All outgoing and incoming edges are preserved.
    /// Updating a [Node] position might result in violation of the
    /// [Edge] cost invariant, and is therefore only done by graph builders
    /// before any edges are added.
    pub fn set_node(&mut self, node: Node) {
        assert_ne!(node.id, 0);

        match self.0.entry(node.id) {
            Entry::Vacant(e) => {
                e.insert((node, Vec::default()));
            }
            Entry::Occupied(mut e) => {
                debug_assert_eq!(e.get().0.id, node.id);
                e.get_mut().0 = node;
            }
        }
    }

    /// Finds the closest [Node] to the given position.
    ///
    /// This function computes the distance to every [Node] in the graph. On ties,
    /// the node encountered first wins.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<Node> {
        Self::nearest(self.iter(), lat, lon)
    }

    /// Finds the closest [Node] to the given position, considering only nodes
    /// within `radius` meters of `center`.
    pub fn find_nearest_node_around(
        &self,
        lat: f64,
        lon: f64,
        center: Coordinate,
        radius: f64,
    ) -> Option<Node> {
        Self::nearest(
            self.iter()
                .filter(|nd| earth_distance(center.lat, center.lon, nd.lat, nd.lon) <= radius),
            lat,
            lon,
        )
    }

    fn nearest<'a, I: Iterator<Item = &'a Node>>(nodes: I, lat: f64, lon: f64) -> Option<Node> {
        nodes
            .map(|&nd| (earth_distance(lat, lon, nd.lat, nd.lon), nd))
            .fold(None, |best: Option<(f64, Node)>, (dist, nd)| match best {
                Some((best_dist, _)) if best_dist <= dist => best,
                _ => Some((dist, nd)),
            })
            .map(|(_, nd)| nd)
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id.
    pub fn get_edges(&self, from_id: i64) -> &[Edge] {
        self.0
            .get(&from_id)
            .map(|(_, e)| e.as_slice())
            .unwrap_or_default()
    }

    /// Gets the cost of the first [Edge] from one node to another.
    /// If such an edge doesn't exist, returns [f64::INFINITY].
    pub fn get_edge(&self, from_id: i64, to_id: i64) -> f64 {
        self.get_edges(from_id)
            .iter()
            .find_map(|edge| if edge.to == to_id { Some(edge.cost) } else { None })
            .unwrap_or(f64::INFINITY)
    }

    /// Appends an outgoing [Edge] to a node with a given id.
    ///
    /// Parallel edges are kept as-is; the first one added is the one reported
    /// by [Graph::get_edge]. Edges from unknown nodes are ignored.
    pub fn add_edge(&mut self, from_id: i64, edge: Edge) {
        assert_ne!(from_id, 0);
        assert_ne!(edge.to, 0);

        if let Some((_, edges)) = self.0.get_mut(&from_id) {
            edges.push(edge);
        }
    }

    /// Adds edges in both directions between two nodes, weighted by the
    /// great-circle distance between them. Does nothing if either node is missing.
    pub fn connect(&mut self, a_id: i64, b_id: i64) {
        if let (Some(a), Some(b)) = (self.get_node(a_id), self.get_node(b_id)) {
            let cost = earth_distance(a.lat, a.lon, b.lat, b.lon);
            self.add_edge(a_id, Edge { to: b_id, cost });
            self.add_edge(b_id, Edge { to: a_id, cost });
        }
    }
}
