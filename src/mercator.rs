//! Web Mercator projection utilities.
//!
//! Shared by tile layout, screen projection, and WMS bounding box
//! construction. All tile coordinates are fractional: the integer part is
//! the tile index, the fraction the position within the tile.

use walkers::TileId;

/// Half the extent of the EPSG:3857 plane in meters.
const MERCATOR_HALF_EXTENT: f64 = 20_037_508.342_789_244;

/// Latitude limit of the Web Mercator projection domain.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Web Mercator projection utilities.
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Convert longitude to a fractional tile X coordinate.
    pub fn lon_to_x(lon: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        ((lon + 180.0) / 360.0) * n
    }

    /// Convert latitude to a fractional tile Y coordinate.
    pub fn lat_to_y(lat: f64, zoom: u8) -> f64 {
        let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let n = 2_f64.powi(i32::from(zoom));
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        y * n
    }

    /// Convert a fractional tile X coordinate back to longitude.
    pub fn x_to_lon(x: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        x / n * 360.0 - 180.0
    }

    /// Convert a fractional tile Y coordinate back to latitude.
    pub fn y_to_lat(y: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        let lat_rad = ((std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh()).atan();
        lat_rad.to_degrees()
    }

    /// EPSG:3857 bounding box of a tile as `(min_x, min_y, max_x, max_y)`
    /// in meters, for WMS `GetMap` requests.
    pub fn tile_bbox_3857(tile_id: TileId) -> (f64, f64, f64, f64) {
        let n = 2_f64.powi(i32::from(tile_id.zoom));
        let tile_span = 2.0 * MERCATOR_HALF_EXTENT / n;

        let min_x = -MERCATOR_HALF_EXTENT + f64::from(tile_id.x) * tile_span;
        let max_y = MERCATOR_HALF_EXTENT - f64::from(tile_id.y) * tile_span;

        (min_x, max_y - tile_span, min_x + tile_span, max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let lat = 30.0;
        let lon = 31.0;
        let zoom = 6;
        let x = WebMercator::lon_to_x(lon, zoom);
        let y = WebMercator::lat_to_y(lat, zoom);
        assert!((WebMercator::x_to_lon(x, zoom) - lon).abs() < 1e-9);
        assert!((WebMercator::y_to_lat(y, zoom) - lat).abs() < 1e-9);
    }

    #[test]
    fn test_origin_is_tile_center_at_zoom_zero() {
        assert!((WebMercator::lon_to_x(0.0, 0) - 0.5).abs() < 1e-12);
        assert!((WebMercator::lat_to_y(0.0, 0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_latitude_clamped_to_mercator_domain() {
        let y = WebMercator::lat_to_y(90.0, 3);
        assert!(y >= 0.0);
        assert!((y - WebMercator::lat_to_y(MAX_LATITUDE, 3)).abs() < 1e-12);
    }

    #[test]
    fn test_tile_bbox_zoom_zero_covers_world() {
        let (min_x, min_y, max_x, max_y) =
            WebMercator::tile_bbox_3857(TileId { x: 0, y: 0, zoom: 0 });
        assert!((min_x + 20_037_508.342_789_244).abs() < 1e-6);
        assert!((max_x - 20_037_508.342_789_244).abs() < 1e-6);
        assert!((min_y + 20_037_508.342_789_244).abs() < 1e-6);
        assert!((max_y - 20_037_508.342_789_244).abs() < 1e-6);
    }

    #[test]
    fn test_tile_bbox_quadrants_at_zoom_one() {
        // Tile (1, 0) at zoom 1 is the north-east quadrant.
        let (min_x, min_y, max_x, max_y) =
            WebMercator::tile_bbox_3857(TileId { x: 1, y: 0, zoom: 1 });
        assert!(min_x.abs() < 1e-6);
        assert!(min_y.abs() < 1e-6);
        assert!(max_x > 0.0);
        assert!(max_y > 0.0);
    }
}
