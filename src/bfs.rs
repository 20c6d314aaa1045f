// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, VecDeque};

use crate::Graph;

/// Uses [breadth-first search](https://en.wikipedia.org/wiki/Breadth-first_search)
/// to find the route with the fewest edges between two nodes.
///
/// Edge costs are ignored: the result is minimal in hop count, not in distance.
/// Edges are followed only in their stored direction, so one-way connections
/// of a [persisted graph](crate::store::build_graph) are respected.
///
/// Returns `None` if either node doesn't exist, or if there is no route between them.
pub fn find_node_path(g: &Graph, from_id: i64, to_id: i64) -> Option<Vec<i64>> {
    g.get_node(from_id)?;
    g.get_node(to_id)?;

    let mut queue: VecDeque<i64> = VecDeque::from([from_id]);
    let mut came_from: HashMap<i64, i64> = HashMap::from([(from_id, from_id)]);

    while let Some(at) = queue.pop_front() {
        if at == to_id {
            let mut path = vec![at];
            let mut last = at;
            while last != from_id {
                last = came_from[&last];
                path.push(last);
            }
            path.reverse();
            return Some(path);
        }

        for edge in g.get_edges(at) {
            if g.get_node(edge.to).is_some() && !came_from.contains_key(&edge.to) {
                came_from.insert(edge.to, at);
                queue.push_back(edge.to);
            }
        }
    }

    None
}
