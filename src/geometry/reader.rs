// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use geojson::{Feature, GeoJson, Geometry, Value};

use super::{Error, Options, Polyline};
use crate::Coordinate;

/// Extracts all walkable polylines from a GeoJSON document.
///
/// `LineString` geometries become a single polyline, every part of a
/// `MultiLineString` becomes a separate polyline, and geometry collections
/// are searched recursively. Other geometries are skipped.
pub(super) fn polylines_from_str(text: &str, options: &Options) -> Result<Vec<Polyline>, Error> {
    let doc: GeoJson = text.parse()?;
    let mut polylines = Vec::default();

    match doc {
        GeoJson::FeatureCollection(fc) => {
            for f in &fc.features {
                add_feature(&mut polylines, f, options);
            }
        }
        GeoJson::Feature(f) => add_feature(&mut polylines, &f, options),
        GeoJson::Geometry(g) => add_geometry(&mut polylines, &g),
    }

    Ok(polylines)
}

fn add_feature(polylines: &mut Vec<Polyline>, f: &Feature, options: &Options) {
    if !is_allowed(f, options) {
        return;
    }

    match f.geometry {
        Some(ref g) => add_geometry(polylines, g),
        None => log::debug!("skipping feature without geometry: {:?}", f.id),
    }
}

/// Checks the feature's `type` property against [Options::feature_types].
fn is_allowed(f: &Feature, options: &Options) -> bool {
    match options.feature_types {
        None => true,
        Some(ref allowed) => f
            .properties
            .as_ref()
            .and_then(|props| props.get("type"))
            .and_then(|v| v.as_str())
            .is_some_and(|t| allowed.iter().any(|a| a == t)),
    }
}

fn add_geometry(polylines: &mut Vec<Polyline>, g: &Geometry) {
    match g.value {
        Value::LineString(ref positions) => polylines.push(to_polyline(positions)),
        Value::MultiLineString(ref lines) => {
            polylines.extend(lines.iter().map(|positions| to_polyline(positions)))
        }
        Value::GeometryCollection(ref geometries) => geometries
            .iter()
            .for_each(|g| add_geometry(polylines, g)),
        _ => log::debug!("skipping non-line geometry"),
    }
}

/// Converts GeoJSON positions (longitude first) into [Coordinates](Coordinate).
/// Positions with less than 2 values are dropped.
fn to_polyline(positions: &[Vec<f64>]) -> Polyline {
    positions
        .iter()
        .filter_map(|p| match p.as_slice() {
            [lon, lat, ..] => Some(Coordinate::new(*lat, *lon)),
            _ => {
                log::warn!("skipping invalid position: {:?}", p);
                None
            }
        })
        .collect()
}
