// Copyright 2026 GeoNest contributors
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

//! WMS (Web Map Service) tile source.
//!
//! Turns a slippy-map tile request into a WMS 1.3.0 `GetMap` request with
//! an EPSG:3857 bounding box, so WMS services plug into the same tile
//! fetching path as ordinary basemaps.

use walkers::sources::{Attribution, TileSource};
use walkers::TileId;

use crate::mercator::WebMercator;
use crate::tiles::TILE_SIZE;

/// Tile source requesting rendered map images from a WMS endpoint.
#[derive(Debug, Clone)]
pub struct WmsSource {
    base_url: String,
    layers: String,
    format: String,
    transparent: bool,
    styles: String,
}

impl WmsSource {
    /// Create a source for `layers` (comma-separated layer names) served
    /// by the WMS endpoint at `base_url`.
    pub fn new(base_url: impl Into<String>, layers: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            layers: layers.into(),
            format: "image/png".to_string(),
            transparent: true,
            styles: String::new(),
        }
    }

    /// Request a different image format (default `image/png`).
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Request opaque images instead of transparent ones.
    #[must_use]
    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Request named WMS styles (default empty).
    #[must_use]
    pub fn with_styles(mut self, styles: impl Into<String>) -> Self {
        self.styles = styles.into();
        self
    }

    /// The layer names this source requests.
    pub fn layers(&self) -> &str {
        &self.layers
    }
}

impl TileSource for WmsSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        let (min_x, min_y, max_x, max_y) = WebMercator::tile_bbox_3857(tile_id);
        let separator = if self.base_url.contains('?') { '&' } else { '?' };

        format!(
            "{}{}service=WMS&request=GetMap&version=1.3.0&layers={}&styles={}\
             &crs=EPSG:3857&bbox={min_x},{min_y},{max_x},{max_y}\
             &width={TILE_SIZE}&height={TILE_SIZE}&format={}&transparent={}",
            self.base_url, separator, self.layers, self.styles, self.format, self.transparent
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "WMS service",
            url: "",
            logo_light: None,
            logo_dark: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_map_request_shape() {
        let source = WmsSource::new("https://example.com/wms", "rivers,lakes");
        let url = source.tile_url(TileId { x: 0, y: 0, zoom: 0 });

        assert!(url.starts_with("https://example.com/wms?service=WMS&request=GetMap"));
        assert!(url.contains("version=1.3.0"));
        assert!(url.contains("layers=rivers,lakes"));
        assert!(url.contains("crs=EPSG:3857"));
        assert!(url.contains("width=256&height=256"));
        assert!(url.contains("format=image/png"));
        assert!(url.contains("transparent=true"));
    }

    #[test]
    fn test_existing_query_string_is_extended() {
        let source = WmsSource::new("https://example.com/wms?map=foo", "layer");
        let url = source.tile_url(TileId { x: 1, y: 1, zoom: 1 });
        assert!(url.starts_with("https://example.com/wms?map=foo&service=WMS"));
    }

    #[test]
    fn test_options_override_defaults() {
        let source = WmsSource::new("https://example.com/wms", "layer")
            .with_format("image/jpeg")
            .with_transparent(false);
        let url = source.tile_url(TileId { x: 0, y: 0, zoom: 0 });
        assert!(url.contains("format=image/jpeg"));
        assert!(url.contains("transparent=false"));
    }

    #[test]
    fn test_bbox_covers_world_at_zoom_zero() {
        let source = WmsSource::new("https://example.com/wms", "layer");
        let url = source.tile_url(TileId { x: 0, y: 0, zoom: 0 });
        assert!(url.contains("bbox=-20037508.342789244,-20037508.342789"));
    }
}
