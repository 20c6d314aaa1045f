// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Conversion of walking-path line geometry ([GeoJSON](https://geojson.org/))
//! into a routing [Graph].

use std::fs::File;
use std::io::{self, BufRead, Read};
use std::path::Path;

use graph_builder::GraphBuilder;

use crate::{Coordinate, Graph, RoutingConfig};

mod graph_builder;
mod reader;

/// An ordered sequence of vertices of a single walking path.
pub type Polyline = Vec<Coordinate>;

/// Format of the input geometry file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the compression based on the content
    #[default]
    Unknown,

    /// Force uncompressed GeoJSON
    Json,

    /// Force GeoJSON with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    JsonGz,

    /// Force GeoJSON with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    JsonBz2,
}

impl FileFormat {
    /// Guesses the format of a file based on its first bytes.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&[0x1f, 0x8b]) {
            Self::JsonGz
        } else if head.starts_with(b"BZh") {
            Self::JsonBz2
        } else {
            Self::Json
        }
    }
}

/// Additional controls for interpreting geometry as a routing [Graph].
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Format of the input data.
    pub file_format: FileFormat,

    /// If set, only features with one of these values in their `type` property
    /// are used. Features without a `type` property are then skipped as well.
    pub feature_types: Option<Vec<String>>,
}

/// Error which can occur when loading geometry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("geojson: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Builds a routing [Graph] from polylines.
///
/// Every vertex becomes a node, consecutive vertices are connected in both directions
/// with their great-circle distance as the cost, and nodes closer than
/// [RoutingConfig::merge_threshold_m] are merged into the one created first.
/// Edges which would connect a merged node to itself are dropped.
pub fn build_graph(polylines: &[Polyline], config: &RoutingConfig) -> Graph {
    let mut b = GraphBuilder::new(config);
    polylines.iter().for_each(|p| b.add_polyline(p));
    b.build()
}

/// Parse polylines from a reader as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader.
pub fn polylines_from_io<R: Read>(options: &Options, reader: R) -> Result<Vec<Polyline>, Error> {
    let mut b = io::BufReader::new(reader);

    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?),
        format => format,
    };

    let mut text = String::new();
    match format {
        FileFormat::Unknown | FileFormat::Json => b.read_to_string(&mut text)?,
        FileFormat::JsonGz => flate2::read::MultiGzDecoder::new(b).read_to_string(&mut text)?,
        FileFormat::JsonBz2 => bzip2::read::MultiBzDecoder::new(b).read_to_string(&mut text)?,
    };

    reader::polylines_from_str(&text, options)
}

/// Parse polylines from a file at the provided path as per the provided [Options].
pub fn polylines_from_file<P: AsRef<Path>>(
    options: &Options,
    path: P,
) -> Result<Vec<Polyline>, Error> {
    let f = File::open(path)?;
    polylines_from_io(options, f)
}

/// Parse polylines from a static buffer as per the provided [Options].
pub fn polylines_from_buffer(options: &Options, data: &[u8]) -> Result<Vec<Polyline>, Error> {
    let format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(data),
        format => format,
    };

    if format == FileFormat::Json {
        // Fast path is available for in-memory, uncompressed data
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        reader::polylines_from_str(text, options)
    } else {
        polylines_from_io(options, io::Cursor::new(data))
    }
}

/// Loads geometry from a file and builds a [Graph] out of it.
pub fn graph_from_file<P: AsRef<Path>>(
    options: &Options,
    config: &RoutingConfig,
    path: P,
) -> Result<Graph, Error> {
    let polylines = polylines_from_file(options, path)?;
    Ok(build_graph(&polylines, config))
}

/// Loads geometry from a static buffer and builds a [Graph] out of it.
pub fn graph_from_buffer(
    options: &Options,
    config: &RoutingConfig,
    data: &[u8],
) -> Result<Graph, Error> {
    let polylines = polylines_from_buffer(options, data)?;
    Ok(build_graph(&polylines, config))
}
