// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io;
use std::path::Path;

use crate::DEFAULT_STEP_LIMIT;

/// Tunable thresholds of the routing engine.
///
/// Every field has a default, so a configuration file only needs to list
/// the values it changes.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// Input vertices closer than this (in meters) are merged into a single node.
    pub merge_threshold_m: f64,

    /// Radius (in meters) around a building's reference coordinate in which
    /// destination snapping looks for nodes first.
    pub building_radius_m: f64,

    /// Maximum distance (in meters) between a position and the persisted node it snaps to.
    pub persisted_snap_radius_m: f64,

    /// Average walking speed, in meters per second, used for ETAs.
    pub walking_speed_mps: f64,

    /// Maximum number of node expansions in a single A* search.
    pub step_limit: usize,

    /// Node merging is quadratic in the number of vertices; a warning is logged
    /// when the geometry has more vertices than this.
    pub merge_warning_vertices: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            merge_threshold_m: 5.0,
            building_radius_m: 80.0,
            persisted_snap_radius_m: 50.0,
            walking_speed_mps: 1.4,
            step_limit: DEFAULT_STEP_LIMIT,
            merge_warning_vertices: 5000,
        }
    }
}

impl RoutingConfig {
    /// Reads a configuration from a JSON document.
    pub fn from_io<R: io::Read>(reader: R) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(io::BufReader::new(reader))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration from a JSON file at the provided path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let f = File::open(path)?;
        Self::from_io(f)
    }

    /// Ensures all thresholds are finite and non-negative, and that the walking
    /// speed is positive.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        let distances = [
            ("merge_threshold_m", self.merge_threshold_m),
            ("building_radius_m", self.building_radius_m),
            ("persisted_snap_radius_m", self.persisted_snap_radius_m),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(InvalidConfig(name, value));
            }
        }

        if !self.walking_speed_mps.is_finite() || self.walking_speed_mps <= 0.0 {
            return Err(InvalidConfig("walking_speed_mps", self.walking_speed_mps));
        }

        Ok(())
    }
}

/// Error which can occur when loading a [RoutingConfig].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] InvalidConfig),
}

/// A [RoutingConfig] field holds a value outside of its allowed range.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("invalid {0}: {1}")]
pub struct InvalidConfig(pub &'static str, pub f64);
