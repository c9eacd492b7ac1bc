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

//! AQI color ramp.
//!
//! Pure mapping from an integer air-quality index to its display color,
//! using the standard six EPA bands.

use eframe::egui::Color32;

/// Convert an AQI value to its band color.
///
/// Values below zero fall back to grey (unknown).
pub fn aqi_to_color(aqi: i32) -> Color32 {
    match aqi {
        i32::MIN..=-1 => Color32::from_rgb(128, 128, 128), // Unknown
        0..=50 => Color32::from_rgb(0, 153, 102),          // Good
        51..=100 => Color32::from_rgb(255, 222, 51),       // Moderate
        101..=150 => Color32::from_rgb(255, 153, 51),      // Unhealthy for sensitive groups
        151..=200 => Color32::from_rgb(204, 0, 51),        // Unhealthy
        201..=300 => Color32::from_rgb(102, 0, 153),       // Very unhealthy
        _ => Color32::from_rgb(126, 0, 35),                // Hazardous
    }
}

/// Short band description for marker labels and hover text.
pub fn aqi_band_name(aqi: i32) -> &'static str {
    match aqi {
        i32::MIN..=-1 => "Unknown",
        0..=50 => "Good",
        51..=100 => "Moderate",
        101..=150 => "Unhealthy for sensitive groups",
        151..=200 => "Unhealthy",
        201..=300 => "Very unhealthy",
        _ => "Hazardous",
    }
}
