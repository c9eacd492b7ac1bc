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

//! Map lifecycle and overlay synchronization controller.
//!
//! Owns the single live map view, the current readings dataset, and the
//! markers derived from it. Readings fetches run on background threads and
//! land in a single-slot mailbox tagged with a generation number; only the
//! latest generation may replace the dataset, so out-of-order completions
//! and completions arriving after teardown are discarded.

use eframe::egui;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::aqi::{AqiClient, FetchError, Reading, Region};
use crate::config::AppConfig;
use crate::geocode::Place;
use crate::notifications::NotificationCenter;

use super::markers::MapMarker;
use super::mercator::WebMercator;
use super::tiles::{TileManager, TILE_SIZE};

/// Continental overview center (CONUS)
const OVERVIEW_CENTER: (f64, f64) = (39.0, -98.0);

/// Zoom applied after a search selection; closer than the overview
pub const FOCUS_ZOOM: f32 = 11.0;

const MIN_ZOOM: f32 = 3.0;
const MAX_ZOOM: f32 = 17.0;

/// Map view construction failure
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to prepare tile cache: {0}")]
    TileCache(#[from] std::io::Error),
}

/// Controller lifecycle. Checked before any construction; only a
/// destroy-then-recreate cycle may rebuild the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initializing,
    Ready,
    Destroyed,
}

/// The single live map instance: center, zoom, and the tile layer.
#[derive(Debug)]
struct MapView {
    center_lat: f64,
    center_lon: f64,
    zoom: f32,
    tiles: TileManager,
}

/// A completed readings fetch, tagged with its generation
#[derive(Debug)]
struct FetchCompletion {
    generation: u64,
    result: Result<Vec<Reading>, FetchError>,
}

type FetchSlot = Arc<Mutex<Option<FetchCompletion>>>;

pub struct MapController {
    lifecycle: Lifecycle,
    view: Option<MapView>,
    credential: String,
    client: AqiClient,

    /// The single authoritative list of current readings
    dataset: Vec<Reading>,

    /// Overlay set: reading markers plus at most one selection marker
    markers: Vec<MapMarker>,

    /// Generation of the most recently issued fetch
    fetch_generation: u64,
    fetch_slot: FetchSlot,

    /// Region of the most recent fetch request
    current_region: Option<Region>,

    overview_zoom: f32,
}

impl MapController {
    pub fn new(credential: impl Into<String>, client: AqiClient) -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            view: None,
            credential: credential.into(),
            client,
            dataset: Vec::new(),
            markers: Vec::new(),
            fetch_generation: 0,
            fetch_slot: Arc::new(Mutex::new(None)),
            current_region: None,
            overview_zoom: 4.0,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn center(&self) -> Option<(f64, f64)> {
        self.view.as_ref().map(|v| (v.center_lat, v.center_lon))
    }

    /// Construct the map view and issue the initial readings fetch.
    ///
    /// A no-op unless the controller is `Uninitialized`; repeated triggers
    /// never recreate a live map. Construction failure leaves the controller
    /// `Uninitialized` with no partially-built view.
    pub fn initialize(&mut self, config: &AppConfig, ctx: &egui::Context) -> Result<(), MapError> {
        if self.lifecycle != Lifecycle::Uninitialized {
            debug!("Ignoring re-entrant map initialization ({:?})", self.lifecycle);
            return Ok(());
        }
        self.lifecycle = Lifecycle::Initializing;
        self.overview_zoom = config.overview_zoom.clamp(MIN_ZOOM, MAX_ZOOM);

        let (center_lat, center_lon) = match (config.last_center_lat, config.last_center_lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => OVERVIEW_CENTER,
        };

        let tiles = match TileManager::new(config.basemap) {
            Ok(tiles) => tiles,
            Err(e) => {
                self.lifecycle = Lifecycle::Uninitialized;
                return Err(MapError::TileCache(e));
            }
        };

        self.view = Some(MapView {
            center_lat,
            center_lon,
            zoom: self.overview_zoom,
            tiles,
        });
        self.lifecycle = Lifecycle::Ready;
        info!("Map initialized at ({center_lat:.3}, {center_lon:.3})");

        self.request_readings(Region::continental_default(), ctx);

        // Settle container sizing on the frame after construction
        ctx.request_repaint_after(Duration::from_millis(100));
        Ok(())
    }

    /// Release the map view and all overlays.
    ///
    /// Runs on every teardown path. Outstanding fetches become stale: the
    /// generation moves past them and a non-ready controller drains nothing.
    pub fn destroy(&mut self) {
        self.fetch_generation += 1;
        self.view = None;
        self.markers.clear();
        self.dataset.clear();
        self.current_region = None;
        self.lifecycle = Lifecycle::Destroyed;
        info!("Map destroyed");
    }

    /// Spawn a background readings fetch for `region`.
    ///
    /// Returns immediately; the completion lands in the fetch mailbox and is
    /// applied by [`poll`](Self::poll) on a later frame.
    pub fn request_readings(&mut self, region: Region, ctx: &egui::Context) {
        self.fetch_generation += 1;
        let generation = self.fetch_generation;
        self.current_region = Some(region);

        let client = self.client.clone();
        let token = self.credential.clone();
        let slot = Arc::clone(&self.fetch_slot);
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let result = client.fetch_readings(&region, &token);
            Self::offer_completion(&slot, FetchCompletion { generation, result });
            ctx.request_repaint();
        });
    }

    /// Write a completion into the mailbox unless a newer generation is
    /// already waiting to be drained. Completions can land in any order;
    /// without this guard a late stale completion would overwrite the
    /// newest result before the UI thread gets to apply it.
    fn offer_completion(slot: &FetchSlot, completion: FetchCompletion) {
        if let Ok(mut slot) = slot.lock() {
            let newer_waiting = slot
                .as_ref()
                .is_some_and(|resident| resident.generation > completion.generation);
            if !newer_waiting {
                *slot = Some(completion);
            }
        }
    }

    /// Drain the fetch mailbox and apply the completion, if any.
    pub fn poll(&mut self, notifications: &mut NotificationCenter) {
        let completion = match self.fetch_slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(completion) = completion {
            self.apply_fetch(completion, notifications);
        }
    }

    /// Validate a fetch completion and replace the dataset.
    ///
    /// Stale generations and completions arriving after teardown are
    /// discarded without touching the map.
    fn apply_fetch(&mut self, completion: FetchCompletion, notifications: &mut NotificationCenter) {
        if self.lifecycle != Lifecycle::Ready {
            debug!("Dropping fetch completion; map is {:?}", self.lifecycle);
            return;
        }
        if completion.generation != self.fetch_generation {
            debug!(
                "Discarding stale fetch (generation {} < {})",
                completion.generation, self.fetch_generation
            );
            return;
        }

        match completion.result {
            Ok(readings) => {
                info!("Received {} readings", readings.len());
                self.dataset = readings;
            }
            Err(e) => {
                // The dataset is never left stale: a failed or empty fetch
                // clears it, with a distinct message per outcome.
                self.dataset = Vec::new();
                if e.is_warning() {
                    warn!("{e}");
                    notifications.warning(e.to_string());
                } else {
                    error!("{e}");
                    notifications.error(e.to_string());
                }
            }
        }

        self.reconcile();
    }

    /// Rebuild reading markers from the current dataset.
    ///
    /// Remove-then-recreate by tag: every reading marker goes, the selection
    /// marker stays, and one marker is created per valid reading. Idempotent.
    fn reconcile(&mut self) {
        self.markers.retain(MapMarker::is_selection);
        self.markers
            .extend(self.dataset.iter().map(MapMarker::from_reading));
    }

    /// Jump the map to a search candidate and refresh readings around it.
    pub fn select_location(
        &mut self,
        place: &Place,
        ctx: &egui::Context,
        notifications: &mut NotificationCenter,
    ) {
        let Some(view) = self.view.as_mut() else {
            return;
        };

        let (lat, lon) = match place.coordinates() {
            Ok(coords) => coords,
            Err(e) => {
                error!("{e}");
                notifications.error(e.to_string());
                return;
            }
        };

        view.center_lat = lat;
        view.center_lon = lon;
        view.zoom = FOCUS_ZOOM;

        // Exactly one selection marker at a time
        self.markers.retain(MapMarker::is_reading);
        self.markers
            .push(MapMarker::selection(lat, lon, place.display_name.clone()));

        info!("Selected {} at ({lat:.4}, {lon:.4})", place.display_name);
        self.request_readings(Region::around(lat, lon), ctx);
    }

    /// Paint the map: tiles, reading markers, selection marker, attribution.
    /// Also handles drag-to-pan and pinch/scroll zoom.
    pub fn draw(&mut self, ui: &mut egui::Ui) {
        let Some(view) = self.view.as_mut() else {
            return;
        };

        let (response, painter) = ui.allocate_painter(
            egui::vec2(ui.available_width(), ui.available_height()),
            egui::Sense::click_and_drag(),
        );
        let rect = response.rect;
        let center = rect.center();

        painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(20, 24, 28));

        // Pinch/scroll zoom
        let zoom_delta = ui.ctx().input(|i| i.zoom_delta());
        if (zoom_delta - 1.0).abs() > 0.001 {
            view.zoom = (view.zoom + zoom_delta.log2()).clamp(MIN_ZOOM, MAX_ZOOM);
        }

        let tile_zoom = view.zoom.round() as u8;

        // Mercator-corrected panning
        if response.dragged() {
            let delta = response.drag_delta();
            let scale = 2.0_f64.powf(f64::from(view.zoom));
            let lat_per_pixel = 180.0 / (f64::from(TILE_SIZE) * scale);
            let lon_per_pixel = 360.0 / (f64::from(TILE_SIZE) * scale);
            let cos_lat = view.center_lat.to_radians().cos();

            view.center_lat += f64::from(delta.y) * lat_per_pixel;
            view.center_lon -= f64::from(delta.x) * lon_per_pixel / cos_lat.max(0.1);
            view.center_lat = view.center_lat.clamp(-85.0, 85.0);
        }

        let center_lat = view.center_lat;
        let center_lon = view.center_lon;

        // Base tile layer
        for (coord, offset_x, offset_y) in
            TileManager::visible_tiles(center_lat, center_lon, tile_zoom, rect.width(), rect.height())
        {
            if let Some(texture) = view.tiles.get_tile(coord, ui.ctx()) {
                let tile_rect = egui::Rect::from_min_size(
                    egui::pos2(center.x + offset_x, center.y + offset_y),
                    egui::vec2(TILE_SIZE as f32, TILE_SIZE as f32),
                );
                painter.image(
                    texture.id(),
                    tile_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
        }

        let to_screen = |lat: f64, lon: f64| -> egui::Pos2 {
            let pixel_x = (WebMercator::lon_to_x(lon, tile_zoom)
                - WebMercator::lon_to_x(center_lon, tile_zoom))
                * f64::from(TILE_SIZE);
            let pixel_y = (WebMercator::lat_to_y(lat, tile_zoom)
                - WebMercator::lat_to_y(center_lat, tile_zoom))
                * f64::from(TILE_SIZE);
            egui::pos2(center.x + pixel_x as f32, center.y + pixel_y as f32)
        };

        let hover_pos = response.hover_pos();

        // Reading markers first, selection marker on top
        for marker in &self.markers {
            if let MapMarker::Reading { color, aqi, label, .. } = marker {
                let (lat, lon) = marker.position();
                let pos = to_screen(lat, lon);
                if !rect.contains(pos) {
                    continue;
                }

                painter.circle_filled(pos, 9.0, *color);
                painter.circle_stroke(pos, 9.0, egui::Stroke::new(1.0, egui::Color32::BLACK));
                painter.text(
                    pos,
                    egui::Align2::CENTER_CENTER,
                    aqi.to_string(),
                    egui::FontId::proportional(9.0),
                    egui::Color32::BLACK,
                );

                let hovered = hover_pos
                    .is_some_and(|p| ((p.x - pos.x).powi(2) + (p.y - pos.y).powi(2)).sqrt() <= 11.0);
                if hovered {
                    Self::draw_label_box(&painter, pos + egui::vec2(14.0, 0.0), label);
                }
            }
        }

        for marker in &self.markers {
            if let MapMarker::Selection { label, .. } = marker {
                let (lat, lon) = marker.position();
                let pos = to_screen(lat, lon);
                if !rect.contains(pos) {
                    continue;
                }

                let accent = egui::Color32::from_rgb(80, 160, 255);
                painter.circle_stroke(pos, 8.0, egui::Stroke::new(2.0, accent));
                let crosshair = 12.0;
                painter.line_segment(
                    [pos + egui::vec2(-crosshair, 0.0), pos + egui::vec2(crosshair, 0.0)],
                    egui::Stroke::new(2.0, accent),
                );
                painter.line_segment(
                    [pos + egui::vec2(0.0, -crosshair), pos + egui::vec2(0.0, crosshair)],
                    egui::Stroke::new(2.0, accent),
                );
                painter.text(
                    pos + egui::vec2(0.0, -20.0),
                    egui::Align2::CENTER_BOTTOM,
                    label,
                    egui::FontId::proportional(11.0),
                    accent,
                );
            }
        }

        // Tile layer status
        if view.tiles.has_loading_tiles() {
            painter.text(
                rect.left_top() + egui::vec2(10.0, 28.0),
                egui::Align2::LEFT_TOP,
                "Loading map tiles...",
                egui::FontId::proportional(11.0),
                egui::Color32::from_rgb(200, 200, 200),
            );
        } else if view.tiles.error_count() > 0 {
            painter.text(
                rect.left_top() + egui::vec2(10.0, 28.0),
                egui::Align2::LEFT_TOP,
                format!("Failed to load {} tiles", view.tiles.error_count()),
                egui::FontId::proportional(11.0),
                egui::Color32::from_rgb(255, 120, 120),
            );
        }

        painter.text(
            rect.left_top() + egui::vec2(10.0, 10.0),
            egui::Align2::LEFT_TOP,
            "Drag to pan | Pinch to zoom",
            egui::FontId::proportional(12.0),
            egui::Color32::from_rgb(180, 180, 180),
        );

        // Attribution (required by Carto)
        painter.text(
            rect.right_bottom() + egui::vec2(-10.0, -10.0),
            egui::Align2::RIGHT_BOTTOM,
            "© OpenStreetMap contributors © CARTO",
            egui::FontId::proportional(10.0),
            egui::Color32::from_white_alpha(150),
        );
    }

    fn draw_label_box(painter: &egui::Painter, text_pos: egui::Pos2, text: &str) {
        let galley = painter.layout_no_wrap(
            text.to_owned(),
            egui::FontId::proportional(11.0),
            egui::Color32::WHITE,
        );
        let padding = egui::vec2(3.0, 2.0);
        let box_rect = egui::Rect::from_min_size(
            text_pos - egui::vec2(padding.x, galley.size().y / 2.0 + padding.y),
            galley.size() + padding * 2.0,
        );
        painter.rect_filled(
            box_rect,
            2.0,
            egui::Color32::from_rgba_unmultiplied(0, 0, 0, 180),
        );
        painter.text(
            text_pos,
            egui::Align2::LEFT_CENTER,
            text,
            egui::FontId::proportional(11.0),
            egui::Color32::WHITE,
        );
    }
}

impl std::fmt::Debug for MapController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapController")
            .field("lifecycle", &self.lifecycle)
            .field("dataset_len", &self.dataset.len())
            .field("markers_len", &self.markers.len())
            .field("fetch_generation", &self.fetch_generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_controller() -> MapController {
        // Unroutable endpoint so spawned fetches fail fast without network
        MapController::new("demo-token", AqiClient::with_base_url("http://127.0.0.1:1"))
    }

    fn ready_controller() -> MapController {
        let mut controller = offline_controller();
        controller
            .initialize(&AppConfig::default(), &egui::Context::default())
            .expect("map should initialize");
        controller
    }

    fn sample_dataset() -> Vec<Reading> {
        vec![
            Reading {
                latitude: 48.857,
                longitude: 2.352,
                aqi: 57,
                station: Some("Paris Centre".to_string()),
            },
            Reading {
                latitude: 48.83,
                longitude: 2.36,
                aqi: 142,
                station: None,
            },
        ]
    }

    #[test]
    fn test_initialize_is_no_op_when_ready() {
        let mut controller = ready_controller();
        assert_eq!(controller.lifecycle(), Lifecycle::Ready);
        let generation = controller.fetch_generation;

        controller
            .initialize(&AppConfig::default(), &egui::Context::default())
            .expect("re-init should be a silent no-op");
        assert_eq!(controller.lifecycle(), Lifecycle::Ready);
        assert_eq!(
            controller.fetch_generation, generation,
            "re-init must not issue another fetch"
        );
    }

    #[test]
    fn test_destroyed_controller_stays_destroyed() {
        let mut controller = ready_controller();
        controller.destroy();
        assert_eq!(controller.lifecycle(), Lifecycle::Destroyed);
        assert!(controller.center().is_none());

        controller
            .initialize(&AppConfig::default(), &egui::Context::default())
            .expect("no-op");
        assert_eq!(controller.lifecycle(), Lifecycle::Destroyed);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut controller = ready_controller();
        controller.dataset = sample_dataset();

        controller.reconcile();
        let first = controller.markers.clone();
        controller.reconcile();
        assert_eq!(controller.markers, first);
        assert_eq!(controller.markers.iter().filter(|m| m.is_reading()).count(), 2);
    }

    #[test]
    fn test_reconcile_replaces_readings_keeps_selection() {
        let mut controller = ready_controller();
        controller.markers.push(MapMarker::selection(48.8566, 2.3522, "Paris"));
        controller.dataset = sample_dataset();
        controller.reconcile();
        assert_eq!(controller.markers.len(), 3);

        // New dataset wholesale-replaces old markers
        controller.dataset = sample_dataset()[..1].to_vec();
        controller.reconcile();
        assert_eq!(controller.markers.iter().filter(|m| m.is_reading()).count(), 1);
        assert_eq!(controller.markers.iter().filter(|m| m.is_selection()).count(), 1);
    }

    #[test]
    fn test_successful_fetch_replaces_dataset() {
        let mut controller = ready_controller();
        let mut notifications = NotificationCenter::new();

        controller.apply_fetch(
            FetchCompletion {
                generation: controller.fetch_generation,
                result: Ok(sample_dataset()),
            },
            &mut notifications,
        );

        assert_eq!(controller.dataset.len(), 2);
        assert_eq!(controller.markers.len(), 2);
        assert!(notifications.is_empty());
    }

    #[test]
    fn test_failed_fetch_empties_dataset_with_one_notification() {
        let mut controller = ready_controller();
        let mut notifications = NotificationCenter::new();
        controller.dataset = sample_dataset();
        controller.reconcile();

        controller.apply_fetch(
            FetchCompletion {
                generation: controller.fetch_generation,
                result: Err(FetchError::Service("Invalid key".to_string())),
            },
            &mut notifications,
        );

        assert!(controller.dataset.is_empty());
        assert!(controller.markers.is_empty());
        assert_eq!(notifications.len(), 1);
    }

    #[test]
    fn test_no_data_fetch_warns_once() {
        let mut controller = ready_controller();
        let mut notifications = NotificationCenter::new();

        controller.apply_fetch(
            FetchCompletion {
                generation: controller.fetch_generation,
                result: Err(FetchError::NoData),
            },
            &mut notifications,
        );

        assert!(controller.dataset.is_empty());
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications.entries()[0].level,
            crate::notifications::NotificationLevel::Warning
        );
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut controller = ready_controller();
        let mut notifications = NotificationCenter::new();
        let stale = controller.fetch_generation;
        controller.request_readings(Region::around(48.8566, 2.3522), &egui::Context::default());

        controller.apply_fetch(
            FetchCompletion {
                generation: stale,
                result: Ok(sample_dataset()),
            },
            &mut notifications,
        );

        assert!(controller.dataset.is_empty(), "stale result must not land");
        assert!(notifications.is_empty());
    }

    #[test]
    fn test_late_stale_completion_cannot_clobber_waiting_latest() {
        let mut controller = ready_controller();
        let mut notifications = NotificationCenter::new();
        let stale = controller.fetch_generation;
        controller.fetch_generation += 1;
        let latest = controller.fetch_generation;

        // Latest completion lands first, stale one second, both before
        // the UI thread drains the mailbox
        MapController::offer_completion(
            &controller.fetch_slot,
            FetchCompletion {
                generation: latest,
                result: Ok(sample_dataset()),
            },
        );
        MapController::offer_completion(
            &controller.fetch_slot,
            FetchCompletion {
                generation: stale,
                result: Ok(Vec::new()),
            },
        );

        controller.poll(&mut notifications);
        assert_eq!(
            controller.dataset.len(),
            2,
            "newest dataset must survive a late stale completion"
        );
        assert!(notifications.is_empty());
    }

    #[test]
    fn test_completion_after_destroy_touches_nothing() {
        let mut controller = ready_controller();
        let mut notifications = NotificationCenter::new();
        let generation = controller.fetch_generation;
        controller.destroy();

        controller.apply_fetch(
            FetchCompletion {
                generation,
                result: Ok(sample_dataset()),
            },
            &mut notifications,
        );

        assert!(controller.dataset.is_empty());
        assert!(controller.markers.is_empty());
        assert!(notifications.is_empty());
    }

    #[test]
    fn test_select_location_centers_marks_and_fetches() {
        let mut controller = ready_controller();
        let mut notifications = NotificationCenter::new();
        let place = Place {
            display_name: "Paris".to_string(),
            lat: "48.8566".to_string(),
            lon: "2.3522".to_string(),
        };

        controller.select_location(&place, &egui::Context::default(), &mut notifications);

        let (lat, lon) = controller.center().expect("map is live");
        assert!((lat - 48.8566).abs() < 1e-9);
        assert!((lon - 2.3522).abs() < 1e-9);
        assert!(controller.view.as_ref().map(|v| v.zoom) > Some(AppConfig::default().overview_zoom));

        let selections: Vec<_> = controller
            .markers
            .iter()
            .filter(|m| m.is_selection())
            .collect();
        assert_eq!(selections.len(), 1);
        match selections[0] {
            MapMarker::Selection { label, .. } => assert_eq!(label, "Paris"),
            MapMarker::Reading { .. } => unreachable!(),
        }

        let region = controller.current_region.expect("selection issues a fetch");
        assert!((region.south - 48.6766).abs() < 1e-3);
        assert!((region.west - 2.1722).abs() < 1e-3);
        assert!((region.north - 49.0366).abs() < 1e-3);
        assert!((region.east - 2.5322).abs() < 1e-3);
    }

    #[test]
    fn test_select_location_with_bad_coordinates_is_rejected() {
        let mut controller = ready_controller();
        let mut notifications = NotificationCenter::new();
        let before = controller.center();
        let place = Place {
            display_name: "Nowhere".to_string(),
            lat: "not-a-number".to_string(),
            lon: "2.0".to_string(),
        };

        controller.select_location(&place, &egui::Context::default(), &mut notifications);

        assert_eq!(controller.center(), before);
        assert_eq!(notifications.len(), 1);
        assert!(controller.markers.iter().all(MapMarker::is_reading));
    }

    #[test]
    fn test_replacing_selection_keeps_exactly_one() {
        let mut controller = ready_controller();
        let mut notifications = NotificationCenter::new();
        let paris = Place {
            display_name: "Paris".to_string(),
            lat: "48.8566".to_string(),
            lon: "2.3522".to_string(),
        };
        let london = Place {
            display_name: "London".to_string(),
            lat: "51.5074".to_string(),
            lon: "-0.1278".to_string(),
        };

        let ctx = egui::Context::default();
        controller.select_location(&paris, &ctx, &mut notifications);
        controller.select_location(&london, &ctx, &mut notifications);

        let selections: Vec<_> = controller
            .markers
            .iter()
            .filter(|m| m.is_selection())
            .collect();
        assert_eq!(selections.len(), 1);
        match selections[0] {
            MapMarker::Selection { label, .. } => assert_eq!(label, "London"),
            MapMarker::Reading { .. } => unreachable!(),
        }
    }
}
