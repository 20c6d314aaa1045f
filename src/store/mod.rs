// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Curated node and edge records, kept independently of the path geometry.
//!
//! Records are created by an external node-editing tool; the routing engine only
//! reads them through the [NodeStore] trait and turns them into a [Graph] searched
//! by [find_node_path](crate::find_node_path).

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::{earth_distance, Edge, Graph, Node};

mod model;

pub use model::{EdgeRecord, NewEdge, NewNode, NodeRecord};

/// Error which can occur when reading or modifying a node store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("edge references unknown node {0}")]
    UnknownNode(i64),

    #[error("cannot connect node {0} to itself")]
    SelfLoop(i64),

    #[error("duplicate {0} id: {1}")]
    DuplicateId(&'static str, i64),

    #[error("no {0} ids left to assign")]
    IdsExhausted(&'static str),
}

/// Read access to persisted node and edge records.
pub trait NodeStore {
    fn list_nodes(&self) -> Result<Vec<NodeRecord>, Error>;
    fn list_edges(&self) -> Result<Vec<EdgeRecord>, Error>;
}

/// A [NodeStore] kept in memory, which can be loaded from and saved to
/// a JSON document of the form `{"nodes": [...], "edges": [...]}`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryStore {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a store from a JSON document, checking that ids are unique
    /// and that edges reference existing, distinct nodes.
    pub fn from_io<R: io::Read>(reader: R) -> Result<Self, Error> {
        let doc: model::Document = serde_json::from_reader(io::BufReader::new(reader))?;

        let mut node_ids = HashSet::new();
        for n in &doc.nodes {
            if !node_ids.insert(n.id) {
                return Err(Error::DuplicateId("node", n.id));
            }
        }

        let mut edge_ids = HashSet::new();
        for e in &doc.edges {
            if !edge_ids.insert(e.id) {
                return Err(Error::DuplicateId("edge", e.id));
            }
            check_edge_ends(&node_ids, e.node_a_id, e.node_b_id)?;
        }

        Ok(Self {
            nodes: doc.nodes,
            edges: doc.edges,
        })
    }

    /// Reads a store from a JSON file at the provided path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let f = File::open(path)?;
        Self::from_io(f)
    }

    /// Writes the store as a JSON document.
    pub fn to_io<W: io::Write>(&self, writer: W) -> Result<(), Error> {
        let doc = model::Document {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        };
        serde_json::to_writer_pretty(writer, &doc)?;
        Ok(())
    }

    /// Adds a new node and returns its record.
    pub fn create_node(&mut self, node: NewNode) -> Result<NodeRecord, Error> {
        let record = NodeRecord {
            id: next_id("node", self.nodes.iter().map(|n| n.id))?,
            name: node.name,
            latitude: node.latitude,
            longitude: node.longitude,
            node_type: node.node_type,
            is_indoor: node.is_indoor,
            building: None,
            floors: None,
        };
        self.nodes.push(record.clone());
        Ok(record)
    }

    /// Adds a new edge between two existing, distinct nodes and returns its record.
    pub fn create_edge(&mut self, edge: NewEdge) -> Result<EdgeRecord, Error> {
        let node_ids: HashSet<i64> = self.nodes.iter().map(|n| n.id).collect();
        check_edge_ends(&node_ids, edge.node_a_id, edge.node_b_id)?;

        let record = EdgeRecord {
            id: next_id("edge", self.edges.iter().map(|e| e.id))?,
            node_a_id: edge.node_a_id,
            node_b_id: edge.node_b_id,
            path_type: edge.path_type,
            is_bidirectional: edge.is_bidirectional,
            is_indoor: edge.is_indoor,
        };
        self.edges.push(record.clone());
        Ok(record)
    }
}

impl NodeStore for MemoryStore {
    fn list_nodes(&self) -> Result<Vec<NodeRecord>, Error> {
        Ok(self.nodes.clone())
    }

    fn list_edges(&self) -> Result<Vec<EdgeRecord>, Error> {
        Ok(self.edges.clone())
    }
}

fn next_id<I: Iterator<Item = i64>>(kind: &'static str, ids: I) -> Result<i64, Error> {
    ids.max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(Error::IdsExhausted(kind))
}

fn check_edge_ends(node_ids: &HashSet<i64>, a: i64, b: i64) -> Result<(), Error> {
    if a == b {
        return Err(Error::SelfLoop(a));
    }
    for id in [a, b] {
        if !node_ids.contains(&id) {
            return Err(Error::UnknownNode(id));
        }
    }
    Ok(())
}

/// Builds a routing [Graph] out of persisted records.
///
/// Every edge can be walked from `node_a_id` to `node_b_id`; the reverse direction
/// is only added for bidirectional edges. Edge costs are great-circle distances.
/// Nodes with a zero id, self-loops and edges referencing unknown nodes are skipped.
pub fn build_graph(nodes: &[NodeRecord], edges: &[EdgeRecord]) -> Graph {
    let mut g = Graph::new();

    for n in nodes {
        if n.id == 0 {
            log::warn!("skipping node record with reserved id 0 ({:?})", n.name);
            continue;
        }
        g.set_node(Node::new(n.id, n.latitude, n.longitude));
    }

    for e in edges {
        let (a, b) = match (g.get_node(e.node_a_id), g.get_node(e.node_b_id)) {
            (Some(a), Some(b)) if a.id != b.id => (a, b),
            _ => {
                log::warn!(
                    "skipping edge record {}: {} -> {}",
                    e.id,
                    e.node_a_id,
                    e.node_b_id
                );
                continue;
            }
        };

        let cost = earth_distance(a.lat, a.lon, b.lat, b.lon);
        g.add_edge(a.id, Edge { to: b.id, cost });
        if e.is_bidirectional {
            g.add_edge(b.id, Edge { to: a.id, cost });
        }
    }

    log::info!(
        "built persisted graph: {} nodes, {} edges",
        g.len(),
        g.edge_count()
    );
    g
}

/// Lists all records from a [NodeStore] and builds a [Graph] out of them.
pub fn load_graph<S: NodeStore + ?Sized>(store: &S) -> Result<Graph, Error> {
    let nodes = store.list_nodes()?;
    let edges = store.list_edges()?;
    Ok(build_graph(&nodes, &edges))
}
