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

//! Air-quality data service client.
//!
//! Fetches station readings for a bounding box from the WAQI map endpoint.
//! The service encodes the AQI value as a string that may be `"-"` for
//! stations with no current measurement, so every entry is validated before
//! it reaches the map; malformed entries are dropped, not fatal.

use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

/// Default data service endpoint
const DEFAULT_BASE_URL: &str = "https://api.waqi.info";

/// Half-width of the region computed around a selected place, in decimal
/// degrees (roughly 20 km).
pub const REGION_MARGIN_DEG: f64 = 0.18;

/// Geographic bounding box scoping one readings fetch.
///
/// Recomputed on every center change, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Region {
    /// Fixed default covering the continental United States.
    pub fn continental_default() -> Self {
        Self {
            south: 24.0,
            west: -125.0,
            north: 50.0,
            east: -66.0,
        }
    }

    /// Region around a focal coordinate, expanded by [`REGION_MARGIN_DEG`]
    /// in each direction.
    pub fn around(lat: f64, lon: f64) -> Self {
        Self {
            south: (lat - REGION_MARGIN_DEG).max(-90.0),
            west: lon - REGION_MARGIN_DEG,
            north: (lat + REGION_MARGIN_DEG).min(90.0),
            east: lon + REGION_MARGIN_DEG,
        }
    }

    /// Bounds formatted as the service's `latlng` query parameter
    /// (south,west,north,east).
    pub fn latlng_param(&self) -> String {
        format!(
            "{:.4},{:.4},{:.4},{:.4}",
            self.south, self.west, self.north, self.east
        )
    }
}

/// One validated air-quality measurement at a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub latitude: f64,
    pub longitude: f64,
    pub aqi: i32,
    pub station: Option<String>,
}

impl Reading {
    /// Marker label, falling back to a placeholder when the station has
    /// no name.
    pub fn label(&self) -> String {
        match self.station.as_deref() {
            Some(name) => format!("{}: AQI {}", name, self.aqi),
            None => format!("Unknown station: AQI {}", self.aqi),
        }
    }
}

/// Readings fetch failure taxonomy.
///
/// `NoData` is a warning, not a failure: the fetch worked but the area has
/// no stations, and the dataset becomes empty either way.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no air quality readings for this area")]
    NoData,

    #[error("air quality request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("air quality service error: {0}")]
    Service(String),

    #[error("malformed air quality response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether this outcome warrants a warning toast rather than an error.
    pub fn is_warning(&self) -> bool {
        matches!(self, FetchError::NoData)
    }
}

/// Blocking client for the WAQI map-bounds endpoint.
///
/// Runs on a background thread; results come back to the UI thread through
/// the controller's fetch mailbox.
#[derive(Debug, Clone)]
pub struct AqiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl AqiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Fetch all station readings inside `region`.
    pub fn fetch_readings(&self, region: &Region, token: &str) -> Result<Vec<Reading>, FetchError> {
        let url = format!("{}/map/bounds/", self.base_url);
        debug!("Fetching readings for bounds {}", region.latlng_param());

        let envelope: Value = self
            .http
            .get(&url)
            .query(&[("latlng", region.latlng_param().as_str()), ("token", token)])
            .send()?
            .error_for_status()?
            .json()?;

        parse_envelope(&envelope)
    }
}

impl Default for AqiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate the `{status, data}` envelope and extract readings.
fn parse_envelope(envelope: &Value) -> Result<Vec<Reading>, FetchError> {
    match envelope.get("status").and_then(Value::as_str) {
        Some("ok") => {}
        Some(_) => {
            // On error the service puts the message in the data field
            let detail = envelope
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(FetchError::Service(detail.to_string()));
        }
        None => return Err(FetchError::Decode("missing status field".to_string())),
    }

    let Some(entries) = envelope.get("data").and_then(Value::as_array) else {
        return Err(FetchError::NoData);
    };

    let readings: Vec<Reading> = entries
        .iter()
        .filter_map(|entry| {
            let reading = parse_reading(entry);
            if reading.is_none() {
                warn!("Dropping malformed reading entry: {entry}");
            }
            reading
        })
        .collect();

    if readings.is_empty() {
        return Err(FetchError::NoData);
    }

    Ok(readings)
}

/// Validate a single station entry. Coordinates and index must be numeric.
fn parse_reading(entry: &Value) -> Option<Reading> {
    let latitude = entry.get("lat")?.as_f64()?;
    let longitude = entry.get("lon")?.as_f64()?;
    let aqi = parse_aqi(entry.get("aqi")?)?;

    let station = entry
        .get("station")
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    Some(Reading {
        latitude,
        longitude,
        aqi,
        station,
    })
}

/// The AQI field arrives either as a number or a string-encoded integer;
/// `"-"` marks a station with no current value.
fn parse_aqi(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    value.as_str()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> Value {
        serde_json::from_str(json).expect("test fixture should be valid JSON")
    }

    #[test]
    fn test_parse_ok_envelope() {
        let readings = parse_envelope(&envelope(
            r#"{"status":"ok","data":[
                {"lat":48.857,"lon":2.352,"aqi":"57","station":{"name":"Paris Centre"}},
                {"lat":48.83,"lon":2.36,"aqi":112,"station":{"name":"Paris 13e"}}
            ]}"#,
        ))
        .expect("envelope should parse");

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].aqi, 57);
        assert_eq!(readings[0].station.as_deref(), Some("Paris Centre"));
        assert_eq!(readings[1].aqi, 112);
    }

    #[test]
    fn test_malformed_entries_are_dropped_not_fatal() {
        let readings = parse_envelope(&envelope(
            r#"{"status":"ok","data":[
                {"lat":"not-a-number","lon":2.0,"aqi":"57"},
                {"lat":48.0,"lon":2.0,"aqi":"-"},
                {"lat":48.1,"lon":2.1,"aqi":"42","station":{"name":"Good one"}},
                {"lon":2.2,"aqi":"10"}
            ]}"#,
        ))
        .expect("batch with one valid entry should succeed");

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].aqi, 42);
    }

    #[test]
    fn test_all_invalid_is_no_data() {
        let result = parse_envelope(&envelope(
            r#"{"status":"ok","data":[{"lat":48.0,"lon":2.0,"aqi":"-"}]}"#,
        ));
        assert!(matches!(result, Err(FetchError::NoData)));
    }

    #[test]
    fn test_empty_data_is_no_data() {
        let result = parse_envelope(&envelope(r#"{"status":"ok","data":[]}"#));
        assert!(matches!(result, Err(FetchError::NoData)));
        assert!(result.unwrap_err().is_warning());
    }

    #[test]
    fn test_service_error_envelope() {
        let result = parse_envelope(&envelope(r#"{"status":"error","data":"Invalid key"}"#));
        match result {
            Err(FetchError::Service(msg)) => assert_eq!(msg, "Invalid key"),
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_station_name_gets_placeholder() {
        let reading = Reading {
            latitude: 48.0,
            longitude: 2.0,
            aqi: 57,
            station: None,
        };
        assert_eq!(reading.label(), "Unknown station: AQI 57");
    }

    #[test]
    fn test_region_around_paris() {
        let region = Region::around(48.8566, 2.3522);
        assert!((region.south - 48.6766).abs() < 1e-9);
        assert!((region.west - 2.1722).abs() < 1e-9);
        assert!((region.north - 49.0366).abs() < 1e-9);
        assert!((region.east - 2.5322).abs() < 1e-9);
    }

    #[test]
    fn test_region_clamps_latitude() {
        let region = Region::around(89.95, 0.0);
        assert!((region.north - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_latlng_param_order() {
        let region = Region {
            south: 24.0,
            west: -125.0,
            north: 50.0,
            east: -66.0,
        };
        assert_eq!(region.latlng_param(), "24.0000,-125.0000,50.0000,-66.0000");
    }
}
