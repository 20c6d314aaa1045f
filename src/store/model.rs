// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// A manually placed node, as kept by the node store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: i64,

    #[serde(default)]
    pub name: String,

    pub latitude: f64,
    pub longitude: f64,

    /// Kind of node: intersection, entrance, landmark, stair, ramp, building…
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,

    #[serde(default)]
    pub is_indoor: bool,

    /// Name of the building an indoor node belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,

    /// Number of floors, only meaningful for building nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<u32>,
}

/// A connection between two [NodeRecords](NodeRecord).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: i64,
    pub node_a_id: i64,
    pub node_b_id: i64,

    /// Kind of path: sidewalk, pedestrian, stair, ramp…
    #[serde(default = "default_path_type")]
    pub path_type: String,

    /// One-way edges may only be walked from `node_a_id` to `node_b_id`.
    #[serde(default = "default_true")]
    pub is_bidirectional: bool,

    #[serde(default)]
    pub is_indoor: bool,
}

/// Fields of a node to be created. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub node_type: String,
    pub is_indoor: bool,
}

/// Fields of an edge to be created. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdge {
    pub node_a_id: i64,
    pub node_b_id: i64,
    pub path_type: String,
    pub is_bidirectional: bool,
    pub is_indoor: bool,
}

/// On-disk representation of the whole store.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct Document {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,

    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

fn default_node_type() -> String {
    "intersection".to_string()
}

fn default_path_type() -> String {
    "sidewalk".to_string()
}

fn default_true() -> bool {
    true
}
