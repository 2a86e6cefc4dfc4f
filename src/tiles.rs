//! Tile fetching and caching.
//!
//! One [`TileFetcher`] serves every raster tile layer on a map: basemaps,
//! Google layers, and WMS services. The URL for a tile comes from a
//! [`walkers::sources::TileSource`] trait object; fetched tiles are cached
//! on disk keyed by a hash of their URL and uploaded as egui textures.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use egui::{ColorImage, TextureHandle};
use sha2::{Digest, Sha256};
use walkers::sources::{Attribution, TileSource};
use walkers::TileId;

/// Pixel size of a map tile.
pub const TILE_SIZE: u32 = 256;

const CACHE_DURATION_DAYS: u64 = 7;

/// Loading state of a single tile.
pub enum TileState {
    Loading,
    Loaded(TextureHandle),
    Failed,
}

/// Fetches, caches, and uploads tiles for one tile layer.
pub struct TileFetcher {
    source: Box<dyn TileSource>,
    cache_dir: PathBuf,
    tiles: Arc<Mutex<HashMap<TileId, TileState>>>,
}

impl fmt::Debug for TileFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileFetcher")
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl TileFetcher {
    /// Create a fetcher for the given source, caching under a
    /// layer-specific directory.
    pub fn new(layer_name: &str, source: Box<dyn TileSource>) -> Self {
        let cache_dir = Self::cache_dir_for(layer_name);

        if let Err(e) = fs::create_dir_all(&cache_dir) {
            log::warn!("failed to create tile cache directory {cache_dir:?}: {e}");
        }
        Self::cleanup_old_tiles(&cache_dir);

        Self {
            source,
            cache_dir,
            tiles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn cache_dir_for(layer_name: &str) -> PathBuf {
        let sanitized: String = layer_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("geonest")
            .join("tiles")
            .join(sanitized)
    }

    fn cleanup_old_tiles(cache_dir: &Path) {
        let now = SystemTime::now();
        let max_age = Duration::from_secs(CACHE_DURATION_DAYS * 24 * 60 * 60);

        if let Ok(entries) = fs::read_dir(cache_dir) {
            for entry in entries.flatten() {
                if let Ok(metadata) = entry.metadata() {
                    if let Ok(modified) = metadata.modified() {
                        if now.duration_since(modified).is_ok_and(|age| age > max_age) {
                            let _ = fs::remove_file(entry.path());
                            log::debug!("removed stale tile cache entry {:?}", entry.path());
                        }
                    }
                }
            }
        }
    }

    /// Attribution of the underlying source.
    pub fn attribution(&self) -> Attribution {
        self.source.attribution()
    }

    /// Deepest zoom level the source serves.
    pub fn max_zoom(&self) -> u8 {
        self.source.max_zoom()
    }

    fn cache_path(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        self.cache_dir.join(format!("{:x}.png", hasher.finalize()))
    }

    /// Get a tile texture, loading it from the disk cache or queueing a
    /// download. Returns `None` while the tile is loading or after it
    /// failed.
    pub fn get_tile(&self, tile_id: TileId, ctx: &egui::Context) -> Option<TextureHandle> {
        let mut tiles = self.tiles.lock().expect("tile state mutex poisoned");

        match tiles.get(&tile_id) {
            Some(TileState::Loaded(texture)) => Some(texture.clone()),
            Some(TileState::Loading | TileState::Failed) => None,
            None => {
                let url = self.source.tile_url(tile_id);
                let cache_path = self.cache_path(&url);

                if cache_path.exists() {
                    match load_texture_from_disk(&cache_path, tile_id, ctx) {
                        Ok(texture) => {
                            tiles.insert(tile_id, TileState::Loaded(texture.clone()));
                            return Some(texture);
                        }
                        Err(e) => {
                            log::warn!("failed to load cached tile {cache_path:?}: {e}");
                            // Fall through and re-download
                        }
                    }
                }

                tiles.insert(tile_id, TileState::Loading);
                self.spawn_download(tile_id, url, cache_path, ctx.clone());
                None
            }
        }
    }

    fn spawn_download(&self, tile_id: TileId, url: String, cache_path: PathBuf, ctx: egui::Context) {
        let tiles = Arc::clone(&self.tiles);

        std::thread::spawn(move || {
            let state = match download_tile(&url, &cache_path, tile_id, &ctx) {
                Ok(texture) => TileState::Loaded(texture),
                Err(e) => {
                    log::warn!("failed to fetch tile {url}: {e}");
                    TileState::Failed
                }
            };

            let mut tiles = tiles.lock().expect("tile state mutex poisoned");
            tiles.insert(tile_id, state);
            ctx.request_repaint();
        });
    }

    /// Tile layout for a viewport: each visible tile with its pixel offset
    /// from the viewport center.
    ///
    /// Longitude wraps around the antimeridian; latitude does not wrap.
    pub fn visible_tiles(
        &self,
        center_lat: f64,
        center_lon: f64,
        zoom: u8,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Vec<(TileId, f32, f32)> {
        use crate::mercator::WebMercator;

        let zoom = zoom.min(self.max_zoom());
        let mut tiles = Vec::new();

        let center_tile_x = WebMercator::lon_to_x(center_lon, zoom);
        let center_tile_y = WebMercator::lat_to_y(center_lat, zoom);

        let tiles_wide = (viewport_width / TILE_SIZE as f32).ceil() as i64 + 2;
        let tiles_high = (viewport_height / TILE_SIZE as f32).ceil() as i64 + 2;

        let start_x = center_tile_x.floor() as i64 - tiles_wide / 2;
        let start_y = center_tile_y.floor() as i64 - tiles_high / 2;

        let max_tile = 2_i64.pow(u32::from(zoom));

        for dy in 0..tiles_high {
            for dx in 0..tiles_wide {
                let tile_x = start_x + dx;
                let tile_y = start_y + dy;

                let wrapped_x = ((tile_x % max_tile) + max_tile) % max_tile;

                if tile_y >= 0 && tile_y < max_tile {
                    let tile_id = TileId {
                        x: wrapped_x as u32,
                        y: tile_y as u32,
                        zoom,
                    };

                    let offset_x = (tile_x as f64 - center_tile_x) * f64::from(TILE_SIZE);
                    let offset_y = (tile_y as f64 - center_tile_y) * f64::from(TILE_SIZE);

                    tiles.push((tile_id, offset_x as f32, offset_y as f32));
                }
            }
        }

        tiles
    }

    /// Whether any tile is still being fetched.
    pub fn has_loading_tiles(&self) -> bool {
        let tiles = self.tiles.lock().expect("tile state mutex poisoned");
        tiles.values().any(|state| matches!(state, TileState::Loading))
    }

    /// Number of tiles whose fetch failed.
    pub fn error_count(&self) -> usize {
        let tiles = self.tiles.lock().expect("tile state mutex poisoned");
        tiles.values().filter(|state| matches!(state, TileState::Failed)).count()
    }
}

fn load_texture_from_disk(
    path: &Path,
    tile_id: TileId,
    ctx: &egui::Context,
) -> Result<TextureHandle, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    texture_from_bytes(&bytes, tile_id, ctx)
}

fn download_tile(
    url: &str,
    cache_path: &Path,
    tile_id: TileId,
    ctx: &egui::Context,
) -> Result<TextureHandle, String> {
    log::debug!("downloading tile {url}");

    let response = reqwest::blocking::get(url).map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().map_err(|e| e.to_string())?;

    if let Err(e) = fs::write(cache_path, &bytes) {
        log::warn!("failed to write tile cache {cache_path:?}: {e}");
    }

    texture_from_bytes(&bytes, tile_id, ctx)
}

fn texture_from_bytes(
    bytes: &[u8],
    tile_id: TileId,
    ctx: &egui::Context,
) -> Result<TextureHandle, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw());

    Ok(ctx.load_texture(
        format!("tile_{}_{}_{}", tile_id.zoom, tile_id.x, tile_id.y),
        color_image,
        Default::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::{resolve, BasemapSource};

    fn fetcher() -> TileFetcher {
        let source = BasemapSource::new(resolve("OpenStreetMap.Mapnik").unwrap());
        TileFetcher::new("test_osm", Box::new(source))
    }

    #[test]
    fn test_visible_tiles_cover_viewport() {
        let tiles = fetcher().visible_tiles(30.0, 31.0, 6, 800.0, 600.0);
        // 800/256 -> 4 (+2), 600/256 -> 3 (+2)
        assert_eq!(tiles.len(), 6 * 5);
        for (tile_id, _, _) in &tiles {
            assert!(tile_id.x < 64);
            assert!(tile_id.y < 64);
            assert_eq!(tile_id.zoom, 6);
        }
    }

    #[test]
    fn test_visible_tiles_wrap_longitude() {
        let tiles = fetcher().visible_tiles(0.0, 179.9, 2, 1024.0, 256.0);
        // Near the antimeridian the layout must wrap back to x = 0 instead
        // of producing out-of-range tile columns.
        assert!(tiles.iter().all(|(tile_id, _, _)| tile_id.x < 4));
        assert!(tiles.iter().any(|(tile_id, _, _)| tile_id.x == 0));
        assert!(tiles.iter().any(|(tile_id, _, _)| tile_id.x == 3));
    }

    #[test]
    fn test_visible_tiles_clamp_latitude() {
        let tiles = fetcher().visible_tiles(84.9, 0.0, 3, 512.0, 2048.0);
        assert!(tiles.iter().all(|(tile_id, _, _)| tile_id.y < 8));
    }

    #[test]
    fn test_zoom_clamped_to_source_max() {
        let source = BasemapSource::new(resolve("OpenTopoMap").unwrap());
        let fetcher = TileFetcher::new("test_topo", Box::new(source));
        let tiles = fetcher.visible_tiles(0.0, 0.0, 22, 256.0, 256.0);
        assert!(tiles.iter().all(|(tile_id, _, _)| tile_id.zoom == 17));
    }

    #[test]
    fn test_fresh_fetcher_has_no_errors() {
        let fetcher = fetcher();
        assert_eq!(fetcher.error_count(), 0);
        assert!(!fetcher.has_loading_tiles());
    }
}
