// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{BuildingHint, Coordinate, Graph};

/// Maps an arbitrary position onto the id of the nearest [Node](crate::Node) of the graph.
///
/// With a [BuildingHint], only nodes within `building_radius` meters of the building's
/// reference coordinate are considered, so that a destination inside a building snaps
/// onto the paths entering it rather than onto a closer, unrelated path. If no node
/// lies within that radius, all nodes are considered.
///
/// Returns `None` only if the graph is empty.
pub fn snap(
    g: &Graph,
    at: Coordinate,
    hint: Option<&BuildingHint>,
    building_radius: f64,
) -> Option<i64> {
    if let Some(hint) = hint {
        if let Some(nd) = g.find_nearest_node_around(at.lat, at.lon, hint.center, building_radius)
        {
            log::debug!("snapped {:?} to node {} near {}", at, nd.id, hint.name);
            return Some(nd.id);
        }
        log::debug!("no nodes within {building_radius} m of {}", hint.name);
    }

    g.find_nearest_node(at.lat, at.lon).map(|nd| nd.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;

    fn graph() -> Graph {
        let mut g = Graph::new();
        // A path running past the building, and a path entering it ~70 m away.
        g.set_node(Node::new(1, 0.0, 0.0));
        g.set_node(Node::new(2, 0.0, 0.0005));
        g.set_node(Node::new(3, 0.0006, 0.0009));
        g.connect(1, 2);
        g.connect(2, 3);
        g
    }

    fn hint(lat: f64, lon: f64) -> BuildingHint {
        BuildingHint {
            name: "FCI Building".to_string(),
            center: Coordinate::new(lat, lon),
        }
    }

    #[test]
    fn nearest_without_hint() {
        let g = graph();
        assert_eq!(snap(&g, Coordinate::new(0.0001, 0.0004), None, 80.0), Some(2));
    }

    #[test]
    fn hint_prefers_node_near_building() {
        let g = graph();
        let at = Coordinate::new(0.0001, 0.0004);
        let building = hint(0.0009, 0.0010);

        // Node 2 is the global nearest, but only node 3 is within 80 m of the building.
        assert_eq!(g.find_nearest_node(at.lat, at.lon).map(|n| n.id), Some(2));
        assert_eq!(snap(&g, at, Some(&building), 80.0), Some(3));
    }

    #[test]
    fn hint_without_nearby_nodes_falls_back() {
        let g = graph();
        let at = Coordinate::new(0.0001, 0.0004);
        let far_building = hint(0.1, 0.1);
        assert_eq!(snap(&g, at, Some(&far_building), 80.0), Some(2));
    }

    #[test]
    fn empty_graph() {
        let g = Graph::new();
        let building = hint(0.0, 0.0);
        assert_eq!(snap(&g, Coordinate::new(0.0, 0.0), None, 80.0), None);
        assert_eq!(snap(&g, Coordinate::new(0.0, 0.0), Some(&building), 80.0), None);
    }
}
