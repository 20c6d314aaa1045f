// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Coordinate, Edge, Graph, Node, RoutingConfig};

/// Helper object used for storing state related to converting polylines into a [Graph].
///
/// Every vertex becomes a separate node first; near-coincident nodes (closer
/// than [RoutingConfig::merge_threshold_m]) are only merged in [GraphBuilder::build],
/// once all polylines are known.
pub(super) struct GraphBuilder<'a> {
    config: &'a RoutingConfig,
    nodes: Vec<Node>,
    edges: Vec<(i64, Edge)>,
}

impl<'a> GraphBuilder<'a> {
    /// Create a new, empty graph builder.
    pub(super) fn new(config: &'a RoutingConfig) -> Self {
        Self {
            config,
            nodes: Vec::default(),
            edges: Vec::default(),
        }
    }

    /// Adds every vertex of the polyline as a new node,
    /// and connects consecutive vertices in both directions.
    pub(super) fn add_polyline(&mut self, vertices: &[Coordinate]) {
        let mut previous: Option<Node> = None;

        for vertex in vertices {
            let node = self.create_node(*vertex);

            if let Some(prev) = previous {
                let cost = earth_distance(prev.lat, prev.lon, node.lat, node.lon);
                self.edges.push((prev.id, Edge { to: node.id, cost }));
                self.edges.push((node.id, Edge { to: prev.id, cost }));
            }

            previous = Some(node);
        }
    }

    fn create_node(&mut self, at: Coordinate) -> Node {
        // Ids start at 1, as 0 is reserved.
        let id = self.nodes.len() as i64 + 1;
        let node = Node::new(id, at.lat, at.lon);
        self.nodes.push(node);
        node
    }

    /// Merges near-coincident nodes and assembles the final [Graph].
    pub(super) fn build(self) -> Graph {
        let vertices = self.nodes.len();
        let raw_edges = self.edges.len();
        if vertices > self.config.merge_warning_vertices {
            log::warn!(
                "merging {vertices} vertices (above {}), graph construction may be slow",
                self.config.merge_warning_vertices
            );
        }

        let aliases = self.find_aliases();

        let mut g = Graph::new();
        self.nodes
            .iter()
            .zip(aliases.iter())
            .filter(|(_, alias)| alias.is_none())
            .for_each(|(&node, _)| g.set_node(node));

        let canonical = |id: i64| aliases[(id - 1) as usize].unwrap_or(id);
        for (from, edge) in self.edges {
            let from = canonical(from);
            let to = canonical(edge.to);
            if from != to {
                g.add_edge(from, Edge { to, cost: edge.cost });
            }
        }

        log::info!(
            "built graph: {} nodes (from {vertices} vertices), {} edges (from {raw_edges})",
            g.len(),
            g.edge_count(),
        );
        g
    }

    /// Returns, for every node (indexed by `id - 1`), the id of the node it was merged onto.
    ///
    /// Nodes are visited in creation order. A node which was not merged itself absorbs
    /// every later, not yet merged node closer than the merge threshold; thus an alias
    /// always points at a node without an alias.
    fn find_aliases(&self) -> Vec<Option<i64>> {
        let threshold = self.config.merge_threshold_m;
        let mut aliases: Vec<Option<i64>> = vec![None; self.nodes.len()];

        for (i, a) in self.nodes.iter().enumerate() {
            if aliases[i].is_some() {
                continue;
            }

            for (j, b) in self.nodes.iter().enumerate().skip(i + 1) {
                if aliases[j].is_none() && earth_distance(a.lat, a.lon, b.lat, b.lon) < threshold
                {
                    aliases[j] = Some(a.id);
                }
            }
        }

        aliases
    }
}
