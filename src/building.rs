// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use crate::store::NodeRecord;
use crate::Coordinate;

/// Node records with this `type` describe buildings.
pub const BUILDING_NODE_TYPE: &str = "building";

/// A named building plus reference coordinate, used to bias destination
/// snapping towards paths entering that building.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingHint {
    pub name: String,
    pub center: Coordinate,
}

/// A campus building known to the node store.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub id: i64,
    pub name: String,

    /// Reference (usually entrance or centroid) position of the building.
    pub center: Coordinate,

    /// Number of indoor floors, 0 if unknown.
    pub floors: u32,
}

impl Building {
    pub fn hint(&self) -> BuildingHint {
        BuildingHint {
            name: self.name.clone(),
            center: self.center,
        }
    }
}

/// Typed lookup table of [Buildings](Building), keyed by node id.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BuildingRegistry(BTreeMap<i64, Building>);

impl BuildingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects all building records (`type == "building"`) from the node store.
    pub fn from_records<'a, I: IntoIterator<Item = &'a NodeRecord>>(records: I) -> Self {
        let mut registry = Self::new();
        records
            .into_iter()
            .filter(|r| r.node_type.eq_ignore_ascii_case(BUILDING_NODE_TYPE))
            .for_each(|r| {
                registry.insert(Building {
                    id: r.id,
                    name: r.name.clone(),
                    center: Coordinate::new(r.latitude, r.longitude),
                    floors: r.floors.unwrap_or(0),
                })
            });
        log::debug!("building registry: {} buildings", registry.len());
        registry
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Creates or replaces a [Building] with `building.id`.
    pub fn insert(&mut self, building: Building) {
        self.0.insert(building.id, building);
    }

    pub fn get(&self, id: i64) -> Option<&Building> {
        self.0.get(&id)
    }

    /// Finds a building by name, ignoring case and surrounding whitespace.
    pub fn find_by_name(&self, name: &str) -> Option<&Building> {
        let name = name.trim();
        self.0
            .values()
            .find(|b| b.name.trim().eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.0.values()
    }
}
