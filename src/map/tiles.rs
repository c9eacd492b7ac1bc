use crate::config::BasemapStyle;
use eframe::egui;
use eframe::egui::{ColorImage, TextureHandle};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use super::mercator::WebMercator;

pub const TILE_SIZE: u32 = 256;
const CACHE_DURATION_DAYS: u64 = 7;

/// One slippy-map tile address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Carto CDN tile URL with subdomain load balancing (a-d)
    pub fn url(&self, style: BasemapStyle) -> String {
        let subdomain = ['a', 'b', 'c', 'd'][((self.x + self.y) % 4) as usize];
        format!(
            "https://{}.basemaps.cartocdn.com/{}/{}/{}/{}.png",
            subdomain,
            style.as_str(),
            self.zoom,
            self.x,
            self.y
        )
    }

    /// Cache filename derived from the URL hash
    fn cache_filename(&self, style: BasemapStyle) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.url(style).as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

enum TileState {
    Loading,
    Loaded(TextureHandle),
    Failed,
}

/// Fetches, caches, and hands out basemap tile textures.
///
/// Tiles come from the disk cache when fresh, otherwise a background thread
/// downloads them and requests a repaint when the texture is ready.
pub struct TileManager {
    style: BasemapStyle,
    cache_dir: PathBuf,
    tiles: Arc<Mutex<HashMap<TileCoord, TileState>>>,
    in_flight: Arc<Mutex<Vec<TileCoord>>>,
}

impl TileManager {
    /// Create a manager backed by the user cache directory.
    ///
    /// Fails if the cache directory cannot be created; the caller treats
    /// that as a map construction error.
    pub fn new(style: BasemapStyle) -> std::io::Result<Self> {
        let cache_dir = Self::cache_dir()?;
        fs::create_dir_all(&cache_dir)?;
        Self::cleanup_old_tiles(&cache_dir);

        Ok(Self {
            style,
            cache_dir,
            tiles: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn cache_dir() -> std::io::Result<PathBuf> {
        let mut path = dirs::cache_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no user cache directory")
        })?;
        path.push("airaware-desktop");
        path.push("tiles");
        Ok(path)
    }

    fn cleanup_old_tiles(cache_dir: &PathBuf) {
        let now = SystemTime::now();
        let max_age = Duration::from_secs(CACHE_DURATION_DAYS * 24 * 60 * 60);

        let Ok(entries) = fs::read_dir(cache_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            if age.is_some_and(|age| age > max_age) {
                let _ = fs::remove_file(entry.path());
                debug!("Removed stale tile cache entry: {:?}", entry.path());
            }
        }
    }

    /// Get a tile texture, loading from disk or queueing a download.
    pub fn get_tile(&self, coord: TileCoord, ctx: &egui::Context) -> Option<TextureHandle> {
        let mut tiles = self.tiles.lock().ok()?;

        match tiles.get(&coord) {
            Some(TileState::Loaded(texture)) => Some(texture.clone()),
            Some(TileState::Loading | TileState::Failed) => None,
            None => {
                let cache_path = self
                    .cache_dir
                    .join(format!("{}.png", coord.cache_filename(self.style)));

                if cache_path.exists() {
                    match fs::read(&cache_path)
                        .map_err(|e| e.to_string())
                        .and_then(|bytes| Self::texture_from_bytes(&bytes, coord, ctx))
                    {
                        Ok(texture) => {
                            tiles.insert(coord, TileState::Loaded(texture.clone()));
                            return Some(texture);
                        }
                        Err(e) => warn!("Discarding unreadable cached tile: {e}"),
                    }
                }

                tiles.insert(coord, TileState::Loading);
                drop(tiles);
                self.queue_download(coord, ctx.clone());
                None
            }
        }
    }

    fn texture_from_bytes(
        bytes: &[u8],
        coord: TileCoord,
        ctx: &egui::Context,
    ) -> Result<TextureHandle, String> {
        let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
        let rgba = img.to_rgba8();
        let color_image = ColorImage::from_rgba_unmultiplied(
            [TILE_SIZE as usize, TILE_SIZE as usize],
            &rgba.into_raw(),
        );

        Ok(ctx.load_texture(
            format!("tile_{}_{}_{}", coord.zoom, coord.x, coord.y),
            color_image,
            Default::default(),
        ))
    }

    fn queue_download(&self, coord: TileCoord, ctx: egui::Context) {
        {
            let Ok(mut in_flight) = self.in_flight.lock() else {
                return;
            };
            if in_flight.contains(&coord) {
                return;
            }
            in_flight.push(coord);
        }

        let style = self.style;
        let tiles = Arc::clone(&self.tiles);
        let in_flight = Arc::clone(&self.in_flight);
        let cache_path = self
            .cache_dir
            .join(format!("{}.png", coord.cache_filename(self.style)));

        std::thread::spawn(move || {
            let state = match Self::download_tile(coord, style, &cache_path, &ctx) {
                Ok(texture) => TileState::Loaded(texture),
                Err(e) => {
                    warn!("Tile {coord:?} failed: {e}");
                    TileState::Failed
                }
            };

            if let Ok(mut tiles) = tiles.lock() {
                tiles.insert(coord, state);
            }
            if let Ok(mut in_flight) = in_flight.lock() {
                in_flight.retain(|c| *c != coord);
            }
            ctx.request_repaint();
        });
    }

    fn download_tile(
        coord: TileCoord,
        style: BasemapStyle,
        cache_path: &PathBuf,
        ctx: &egui::Context,
    ) -> Result<TextureHandle, String> {
        let url = coord.url(style);
        debug!("Downloading tile: {url}");

        let response = reqwest::blocking::get(&url).map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        let bytes = response.bytes().map_err(|e| e.to_string())?;

        if let Err(e) = fs::write(cache_path, &bytes) {
            warn!("Failed to write tile cache: {e}");
        }

        Self::texture_from_bytes(&bytes, coord, ctx)
    }

    /// All tiles needed to cover a viewport, with pixel offsets from the
    /// viewport center.
    pub fn visible_tiles(
        center_lat: f64,
        center_lon: f64,
        zoom: u8,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Vec<(TileCoord, f32, f32)> {
        let mut tiles = Vec::new();

        let center_tile_x = WebMercator::lon_to_x(center_lon, zoom);
        let center_tile_y = WebMercator::lat_to_y(center_lat, zoom);

        let tiles_wide = (viewport_width / TILE_SIZE as f32).ceil() as i32 + 2;
        let tiles_high = (viewport_height / TILE_SIZE as f32).ceil() as i32 + 2;

        let start_x = center_tile_x.floor() as i32 - tiles_wide / 2;
        let start_y = center_tile_y.floor() as i32 - tiles_high / 2;

        let max_tile = 2_i32.pow(u32::from(zoom));

        for dy in 0..tiles_high {
            for dx in 0..tiles_wide {
                let tile_x = start_x + dx;
                let tile_y = start_y + dy;

                // Longitude wraps around; latitude does not
                let wrapped_x = ((tile_x % max_tile) + max_tile) % max_tile;
                if tile_y < 0 || tile_y >= max_tile {
                    continue;
                }

                let coord = TileCoord::new(wrapped_x as u32, tile_y as u32, zoom);
                let offset_x = (f64::from(tile_x) - center_tile_x) * f64::from(TILE_SIZE);
                let offset_y = (f64::from(tile_y) - center_tile_y) * f64::from(TILE_SIZE);
                tiles.push((coord, offset_x as f32, offset_y as f32));
            }
        }

        tiles
    }

    pub fn has_loading_tiles(&self) -> bool {
        self.tiles
            .lock()
            .map(|tiles| tiles.values().any(|s| matches!(s, TileState::Loading)))
            .unwrap_or(false)
    }

    pub fn error_count(&self) -> usize {
        self.tiles
            .lock()
            .map(|tiles| {
                tiles
                    .values()
                    .filter(|s| matches!(s, TileState::Failed))
                    .count()
            })
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for TileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileManager")
            .field("style", &self.style)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_subdomain_balancing() {
        let a = TileCoord::new(0, 0, 4).url(BasemapStyle::Dark);
        let b = TileCoord::new(1, 0, 4).url(BasemapStyle::Dark);
        assert!(a.starts_with("https://a.basemaps.cartocdn.com/dark_all/4/0/0"));
        assert!(b.starts_with("https://b.basemaps.cartocdn.com/dark_all/4/1/0"));
    }

    #[test]
    fn test_tile_url_style() {
        let url = TileCoord::new(3, 5, 7).url(BasemapStyle::Light);
        assert!(url.contains("/light_all/7/3/5.png"));
    }

    #[test]
    fn test_cache_filename_differs_per_style() {
        let coord = TileCoord::new(3, 5, 7);
        assert_ne!(
            coord.cache_filename(BasemapStyle::Light),
            coord.cache_filename(BasemapStyle::Dark)
        );
    }

    #[test]
    fn test_visible_tiles_cover_viewport() {
        let tiles = TileManager::visible_tiles(39.0, -98.0, 4, 1024.0, 768.0);
        assert!(!tiles.is_empty());

        // Everything stays inside the 16x16 grid at zoom 4
        for (coord, _, _) in &tiles {
            assert!(coord.x < 16);
            assert!(coord.y < 16);
        }
    }

    #[test]
    fn test_visible_tiles_wrap_longitude() {
        let tiles = TileManager::visible_tiles(0.0, 179.9, 2, 1600.0, 400.0);
        assert!(tiles.iter().all(|(c, _, _)| c.x < 4));
    }
}
