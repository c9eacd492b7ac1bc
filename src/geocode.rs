// Copyright 2025 the AirAware Desktop authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Place-name geocoding via Nominatim.
//!
//! Candidates carry string-encoded coordinates; they are parsed as floating
//! point only at selection time, never trusted as already-numeric.

use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// Default geocoding endpoint
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim usage policy requires an identifying User-Agent
const USER_AGENT: &str = concat!("airaware-desktop/", env!("CARGO_PKG_VERSION"));

/// Maximum number of candidates surfaced to the user
pub const MAX_CANDIDATES: usize = 5;

/// One geocoding candidate as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Place {
    pub display_name: String,

    /// String-encoded latitude, parsed at selection time
    pub lat: String,

    /// String-encoded longitude, parsed at selection time
    pub lon: String,
}

impl Place {
    /// Parse the coordinate pair as floating point.
    pub fn coordinates(&self) -> Result<(f64, f64), SearchError> {
        let lat: f64 = self
            .lat
            .trim()
            .parse()
            .map_err(|_| SearchError::BadCoordinate(self.lat.clone()))?;
        let lon: f64 = self
            .lon
            .trim()
            .parse()
            .map_err(|_| SearchError::BadCoordinate(self.lon.clone()))?;
        Ok((lat, lon))
    }
}

/// Geocoding failure; degrades search only, never the map.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("candidate has unparseable coordinate: {0}")]
    BadCoordinate(String),
}

/// Blocking Nominatim client, run on a background thread.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl GeocodeClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::blocking::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Look up a free-text place query.
    ///
    /// A blank query returns an empty list without touching the network.
    /// At most [`MAX_CANDIDATES`] results, in the order received.
    pub fn search(&self, query: &str) -> Result<Vec<Place>, SearchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.base_url);
        let limit = MAX_CANDIDATES.to_string();
        debug!("Geocoding query: {query}");

        let mut places: Vec<Place> = self
            .http
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", limit.as_str())])
            .send()?
            .error_for_status()?
            .json()?;

        places.truncate(MAX_CANDIDATES);
        Ok(places)
    }
}

impl Default for GeocodeClient {
    fn default() -> Self {
        Self::new()
    }
}
