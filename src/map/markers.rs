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

//! Overlay markers attached to the map.
//!
//! Markers are an explicit tagged union so reconciliation can remove every
//! reading marker by tag while leaving the selected-place marker alone.

use eframe::egui::Color32;

use crate::aqi::Reading;
use crate::colors::{aqi_band_name, aqi_to_color};

/// One overlay object on the map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapMarker {
    /// A station reading, colored by its AQI band.
    Reading {
        latitude: f64,
        longitude: f64,
        aqi: i32,
        color: Color32,
        label: String,
    },

    /// The single selected-place marker from the last search selection.
    Selection {
        latitude: f64,
        longitude: f64,
        label: String,
    },
}

impl MapMarker {
    /// Build a reading marker from a validated reading.
    pub fn from_reading(reading: &Reading) -> Self {
        MapMarker::Reading {
            latitude: reading.latitude,
            longitude: reading.longitude,
            aqi: reading.aqi,
            color: aqi_to_color(reading.aqi),
            label: format!("{} ({})", reading.label(), aqi_band_name(reading.aqi)),
        }
    }

    pub fn selection(latitude: f64, longitude: f64, label: impl Into<String>) -> Self {
        MapMarker::Selection {
            latitude,
            longitude,
            label: label.into(),
        }
    }

    pub fn is_reading(&self) -> bool {
        matches!(self, MapMarker::Reading { .. })
    }

    pub fn is_selection(&self) -> bool {
        matches!(self, MapMarker::Selection { .. })
    }

    pub fn position(&self) -> (f64, f64) {
        match self {
            MapMarker::Reading {
                latitude, longitude, ..
            }
            | MapMarker::Selection {
                latitude, longitude, ..
            } => (*latitude, *longitude),
        }
    }
}
