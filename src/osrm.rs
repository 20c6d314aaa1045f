// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! [ExternalRouter] backed by an [OSRM](https://project-osrm.org/)-compatible HTTP service.

use std::time::Duration;

use serde::Deserialize;

use crate::{Coordinate, ExternalRouter};

/// Public OSRM demo server. Not suitable for production traffic.
pub const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Error which can occur when querying an OSRM service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("osrm: {code}: {message}")]
    Service { code: String, message: String },

    #[error("osrm: response contains no routes")]
    NoRoutes,
}

#[derive(Debug, Deserialize)]
struct Response {
    code: String,

    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    routes: Vec<ResponseRoute>,
}

#[derive(Debug, Deserialize)]
struct ResponseRoute {
    geometry: ResponseGeometry,
}

#[derive(Debug, Deserialize)]
struct ResponseGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Queries the `route` service of OSRM with the `foot` profile.
#[derive(Debug, Clone)]
pub struct OsrmRouter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl OsrmRouter {
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, from: Coordinate, to: Coordinate) -> String {
        format!(
            "{}/route/v1/foot/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, from.lon, from.lat, to.lon, to.lat
        )
    }

    /// Requests a walking route and returns its geometry.
    pub fn fetch(&self, from: Coordinate, to: Coordinate) -> Result<Vec<Coordinate>, Error> {
        let url = self.url(from, to);
        log::debug!("osrm: GET {url}");
        let response: Response = self.client.get(&url).send()?.json()?;
        path_from_response(response)
    }
}

fn path_from_response(response: Response) -> Result<Vec<Coordinate>, Error> {
    if response.code != "Ok" {
        return Err(Error::Service {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }

    let route = response.routes.into_iter().next().ok_or(Error::NoRoutes)?;
    Ok(route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| Coordinate::new(lat, lon))
        .collect())
}

impl ExternalRouter for OsrmRouter {
    fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Vec<Coordinate>, Box<dyn std::error::Error>> {
        Ok(self.fetch(from, to)?)
    }
}
