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

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format.
//! The air-quality API token persists here across sessions, alongside UI
//! preferences like the basemap style and the last map position.

use serde::{Deserialize, Serialize};

/// App name used for the confy config directory
const APP_NAME: &str = "airaware-desktop";

/// Config file name (without extension)
const CONFIG_NAME: &str = "config";

/// Basemap tile style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasemapStyle {
    Light,
    Dark,
}

impl BasemapStyle {
    /// Carto CDN style path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            BasemapStyle::Light => "light_all",
            BasemapStyle::Dark => "dark_all",
        }
    }

}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Air-quality service API token (the persisted credential)
    #[serde(default)]
    pub api_token: Option<String>,

    /// Basemap tile style
    #[serde(default = "default_basemap")]
    pub basemap: BasemapStyle,

    /// Default map zoom level for the continental overview
    #[serde(default = "default_overview_zoom")]
    pub overview_zoom: f32,

    /// Last map center latitude, restored on next unlock
    #[serde(default)]
    pub last_center_lat: Option<f64>,

    /// Last map center longitude, restored on next unlock
    #[serde(default)]
    pub last_center_lon: Option<f64>,
}

// Default value functions for serde
fn default_basemap() -> BasemapStyle {
    BasemapStyle::Dark
}

fn default_overview_zoom() -> f32 {
    4.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            basemap: default_basemap(),
            overview_zoom: default_overview_zoom(),
            last_center_lat: None,
            last_center_lon: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    #[allow(dead_code)]
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }
}
