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

//! The map widget.
//!
//! [`Map`] owns a view (center and zoom) and an ordered list of layers,
//! and draws them into an egui `Ui`. Layers are appended, never
//! reordered; draw order is append order. All `add_*` methods are
//! single-shot and synchronous: they either succeed or return an error
//! immediately, without touching the layer list on failure.

use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Vec2};

use crate::basemap::{self, BasemapEntry, BasemapSource, GoogleMapType, GoogleSource, BASEMAPS};
use crate::bounds::Bounds;
use crate::error::Result;
use crate::layers::{
    GeoFeature, GeoTable, ImageOverlay, Layer, RasterLayer, TileLayer, VectorInput, VectorLayer,
    VectorStyle,
};
use crate::mercator::{WebMercator, MAX_LATITUDE};
use crate::tiles::TILE_SIZE;
use crate::wms::WmsSource;

const MIN_ZOOM: f64 = 0.0;
const MAX_ZOOM: f64 = 22.0;

/// Deepest zoom level `fit_bounds` will pick, so fitting a single point
/// does not dive to street level.
const MAX_FIT_ZOOM: u8 = 18;

/// Viewport size assumed before the widget has been shown once.
const DEFAULT_VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

/// An interactive slippy map with simplified methods for GIS workflows.
///
/// # Example
///
/// ```no_run
/// use geonest::Map;
///
/// let mut map = Map::with_basemap((30.0, 31.0), 6.0, "OpenTopoMap")?;
/// map.add_wms_layer("https://example.com/wms", "rivers")?;
/// # Ok::<(), geonest::Error>(())
/// ```
#[derive(Debug)]
pub struct Map {
    center_lat: f64,
    center_lon: f64,
    zoom: f64,
    layers: Vec<Layer>,
    viewport: Vec2,
    scroll_wheel_zoom: bool,
}

impl Default for Map {
    fn default() -> Self {
        Self::new((20.0, 0.0), 2.0)
    }
}

impl Map {
    /// Create a map centered at `(lat, lon)` with the default basemap
    /// (OpenStreetMap).
    pub fn new(center: (f64, f64), zoom: f64) -> Self {
        Self::with_entry(center, zoom, &BASEMAPS[0])
    }

    /// Create a map with a named initial basemap.
    ///
    /// # Errors
    ///
    /// [`crate::Error::UnknownBasemap`] if the name is not registered.
    pub fn with_basemap(center: (f64, f64), zoom: f64, basemap: &str) -> Result<Self> {
        let entry = basemap::resolve(basemap)?;
        Ok(Self::with_entry(center, zoom, entry))
    }

    fn with_entry(center: (f64, f64), zoom: f64, entry: &'static BasemapEntry) -> Self {
        let mut map = Self {
            center_lat: center.0.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            center_lon: center.1,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            layers: Vec::new(),
            viewport: DEFAULT_VIEWPORT,
            scroll_wheel_zoom: true,
        };
        map.push_tile_layer(entry.name, Box::new(BasemapSource::new(entry)));
        map
    }

    /// Disable or re-enable zooming with the scroll wheel.
    #[must_use]
    pub fn with_scroll_wheel_zoom(mut self, enabled: bool) -> Self {
        self.scroll_wheel_zoom = enabled;
        self
    }

    // -------------------------------------------------------------------
    // View state
    // -------------------------------------------------------------------

    /// Current center as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (self.center_lat, self.center_lon)
    }

    /// Current zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Move the view center.
    pub fn set_center(&mut self, lat: f64, lon: f64) {
        self.center_lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        self.center_lon = lon;
    }

    /// Change the zoom level, clamped to the supported range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Recenter and zoom so that `bounds` is fully visible in the last
    /// known viewport.
    pub fn fit_bounds(&mut self, bounds: Bounds) {
        let (lat, lon) = bounds.center();
        self.set_center(lat, lon);
        self.zoom = f64::from(zoom_for_bounds(bounds, self.viewport));
    }

    /// Union of every layer's geographic extent. `None` when no layer
    /// reports one (tile layers span the world and report nothing).
    pub fn layer_bounds(&self) -> Option<Bounds> {
        self.layers
            .iter()
            .filter_map(Layer::bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Fit the view to all layers that report bounds.
    pub fn fit_to_layers(&mut self) {
        if let Some(bounds) = self.layer_bounds() {
            self.fit_bounds(bounds);
        }
    }

    // -------------------------------------------------------------------
    // Layers
    // -------------------------------------------------------------------

    /// The ordered layer list.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers, including basemap tile layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Names of all tile layers, in draw order.
    pub fn tile_layer_names(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter_map(|layer| match layer {
                Layer::Tiles(tile_layer) => Some(tile_layer.name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of tiles whose fetch failed, summed across tile layers.
    pub fn tile_error_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| match layer {
                Layer::Tiles(tile_layer) => tile_layer.fetcher.error_count(),
                _ => 0,
            })
            .sum()
    }

    /// Attribution lines of all tile layers, deduplicated, in draw order.
    pub fn attributions(&self) -> Vec<&'static str> {
        let mut texts: Vec<&'static str> = Vec::new();
        for layer in &self.layers {
            if let Layer::Tiles(tile_layer) = layer {
                let text = tile_layer.fetcher.attribution().text;
                if !texts.contains(&text) {
                    texts.push(text);
                }
            }
        }
        texts
    }

    /// Remove every layer, basemaps included. The map draws a blank
    /// background until a new layer is added.
    pub fn clear_layers(&mut self) {
        log::debug!("clearing {} layers", self.layers.len());
        self.layers.clear();
    }

    fn push_tile_layer(&mut self, name: &str, source: Box<dyn walkers::sources::TileSource>) {
        self.layers.push(Layer::Tiles(TileLayer::new(name, source)));
    }

    /// Add a basemap tile layer by registry name.
    ///
    /// # Errors
    ///
    /// [`crate::Error::UnknownBasemap`] if the name is not registered.
    pub fn add_basemap(&mut self, basemap: &str) -> Result<()> {
        let entry = basemap::resolve(basemap)?;
        self.push_tile_layer(entry.name, Box::new(BasemapSource::new(entry)));
        Ok(())
    }

    /// Add a Google Maps tile layer.
    ///
    /// Use of Google Maps tiles may be subject to Google's Terms of
    /// Service.
    pub fn add_google_map(&mut self, map_type: GoogleMapType) {
        self.push_tile_layer(map_type.display_name(), Box::new(GoogleSource::new(map_type)));
    }

    /// Add a vector layer and zoom the view to it.
    ///
    /// Accepts anything convertible into [`VectorInput`]: a file path, a
    /// parsed GeoJSON document, or a [`GeoTable`].
    pub fn add_vector(&mut self, input: impl Into<VectorInput>) -> Result<()> {
        self.add_vector_with_style(input, VectorStyle::default())
    }

    /// Add a vector layer with an explicit style.
    pub fn add_vector_with_style(
        &mut self,
        input: impl Into<VectorInput>,
        style: VectorStyle,
    ) -> Result<()> {
        let name = format!("vector_{}", self.layers.len());
        let layer = VectorLayer::from_input(name, input.into())?.with_style(style);
        if let Some(bounds) = layer.bounds() {
            self.fit_bounds(bounds);
        }
        self.layers.push(Layer::Vector(layer));
        Ok(())
    }

    /// Add a parsed GeoJSON document as a vector layer.
    pub fn add_geojson(&mut self, geojson: geojson::GeoJson) -> Result<()> {
        self.add_vector(VectorInput::GeoJson(geojson))
    }

    /// Add an in-memory geometry table as a vector layer.
    pub fn add_table(&mut self, table: GeoTable) -> Result<()> {
        self.add_vector(VectorInput::Table(table))
    }

    /// Add a georeferenced raster file and zoom the view to it.
    pub fn add_raster(&mut self, path: impl Into<std::path::PathBuf>) -> Result<()> {
        let layer = RasterLayer::from_path(path)?;
        self.fit_bounds(layer.bounds());
        self.layers.push(Layer::Raster(layer));
        Ok(())
    }

    /// Add an image overlay stretched over `bounds` (the whole world when
    /// `None`).
    pub fn add_image(&mut self, url: impl Into<String>, bounds: Option<Bounds>) {
        self.layers.push(Layer::Image(ImageOverlay::new(url, bounds)));
    }

    /// Add a WMS layer with default options (PNG, transparent).
    pub fn add_wms_layer(
        &mut self,
        url: impl Into<String>,
        layers: impl Into<String>,
    ) -> Result<()> {
        self.add_wms_source(WmsSource::new(url, layers));
        Ok(())
    }

    /// Add a WMS layer from a configured source.
    pub fn add_wms_source(&mut self, source: WmsSource) {
        let name = format!("wms_{}", source.layers());
        self.push_tile_layer(&name, Box::new(source));
    }

    // -------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------

    /// Draw the map and handle pan/zoom interaction.
    pub fn show(&mut self, ui: &mut egui::Ui) -> egui::Response {
        let (response, painter) = ui.allocate_painter(
            egui::vec2(ui.available_width(), ui.available_height()),
            Sense::click_and_drag(),
        );

        let rect = response.rect;
        let center = rect.center();
        self.viewport = rect.size();

        painter.rect_filled(rect, 0.0, Color32::from_rgb(200, 220, 240));

        self.handle_zoom(ui, &response);

        let tile_zoom = self.zoom.round().clamp(MIN_ZOOM, MAX_ZOOM) as u8;

        self.handle_drag(&response, tile_zoom);

        // Screen projection shared by every overlay layer
        let center_lat = self.center_lat;
        let center_lon = self.center_lon;
        let to_screen = move |lat: f64, lon: f64| -> Pos2 {
            let tile_x = WebMercator::lon_to_x(lon, tile_zoom);
            let tile_y = WebMercator::lat_to_y(lat, tile_zoom);
            let center_x = WebMercator::lon_to_x(center_lon, tile_zoom);
            let center_y = WebMercator::lat_to_y(center_lat, tile_zoom);

            Pos2::new(
                center.x + ((tile_x - center_x) * f64::from(TILE_SIZE)) as f32,
                center.y + ((tile_y - center_y) * f64::from(TILE_SIZE)) as f32,
            )
        };

        let mut loading = false;
        for layer in &mut self.layers {
            match layer {
                Layer::Tiles(tile_layer) => {
                    draw_tile_layer(
                        tile_layer,
                        &painter,
                        ui.ctx(),
                        center,
                        rect.size(),
                        (center_lat, center_lon),
                        tile_zoom,
                    );
                    loading |= tile_layer.fetcher.has_loading_tiles();
                }
                Layer::Vector(vector_layer) => {
                    draw_vector_layer(vector_layer, &painter, &to_screen);
                }
                Layer::Raster(raster_layer) => {
                    let texture = raster_layer.texture(ui.ctx()).clone();
                    let bounds = raster_layer.bounds();
                    draw_textured_bounds(&painter, &texture, bounds, &to_screen);
                }
                Layer::Image(overlay) => {
                    if let Some(texture) = overlay.texture(ui.ctx()) {
                        draw_textured_bounds(&painter, &texture, overlay.bounds(), &to_screen);
                    }
                }
            }
        }

        if loading {
            painter.text(
                rect.left_top() + egui::vec2(8.0, 8.0),
                Align2::LEFT_TOP,
                "Loading map tiles...",
                FontId::proportional(12.0),
                Color32::from_rgb(80, 80, 80),
            );
        }

        let failed = self.tile_error_count();
        if failed > 0 {
            painter.text(
                rect.left_top() + egui::vec2(8.0, 24.0),
                Align2::LEFT_TOP,
                format!("{failed} tiles failed to load"),
                FontId::proportional(12.0),
                Color32::from_rgb(180, 60, 60),
            );
        }

        self.draw_attributions(&painter, rect);

        response
    }

    fn handle_zoom(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let zoom_delta = ui.ctx().input(|i| i.zoom_delta());
        if (zoom_delta - 1.0).abs() > 0.001 {
            self.set_zoom(self.zoom + f64::from(zoom_delta.log2()));
        }

        if self.scroll_wheel_zoom && response.hovered() {
            let scroll = ui.ctx().input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.set_zoom(self.zoom + f64::from(scroll) * 0.005);
            }
        }
    }

    fn handle_drag(&mut self, response: &egui::Response, tile_zoom: u8) {
        if !response.dragged() {
            return;
        }
        let delta = response.drag_delta();

        let center_x = WebMercator::lon_to_x(self.center_lon, tile_zoom)
            - f64::from(delta.x) / f64::from(TILE_SIZE);
        let center_y = WebMercator::lat_to_y(self.center_lat, tile_zoom)
            - f64::from(delta.y) / f64::from(TILE_SIZE);

        let mut lon = WebMercator::x_to_lon(center_x, tile_zoom);
        if lon > 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }

        self.set_center(WebMercator::y_to_lat(center_y, tile_zoom), lon);
    }

    fn draw_attributions(&self, painter: &egui::Painter, rect: Rect) {
        let mut anchor = rect.right_bottom() - egui::vec2(4.0, 2.0);
        for text in self.attributions() {
            painter.text(
                anchor,
                Align2::RIGHT_BOTTOM,
                text,
                FontId::proportional(10.0),
                Color32::from_rgb(60, 60, 60),
            );
            anchor.y -= 12.0;
        }
    }
}

/// Pick the deepest zoom level at which `bounds` fits in `viewport`.
fn zoom_for_bounds(bounds: Bounds, viewport: Vec2) -> u8 {
    for zoom in (0..=MAX_FIT_ZOOM).rev() {
        let width_px = (WebMercator::lon_to_x(bounds.east, zoom)
            - WebMercator::lon_to_x(bounds.west, zoom))
            * f64::from(TILE_SIZE);
        let height_px = (WebMercator::lat_to_y(bounds.south, zoom)
            - WebMercator::lat_to_y(bounds.north, zoom))
            * f64::from(TILE_SIZE);

        if width_px <= f64::from(viewport.x) && height_px <= f64::from(viewport.y) {
            return zoom;
        }
    }
    0
}

#[allow(clippy::cast_possible_truncation, reason = "pixel offsets fit in f32")]
fn draw_tile_layer(
    layer: &TileLayer,
    painter: &egui::Painter,
    ctx: &egui::Context,
    center: Pos2,
    viewport: Vec2,
    view_center: (f64, f64),
    tile_zoom: u8,
) {
    // Sources that stop short of the view zoom get their tiles scaled up.
    let drawn_zoom = tile_zoom.min(layer.fetcher.max_zoom());
    let scale = 2_f32.powi(i32::from(tile_zoom) - i32::from(drawn_zoom));
    let tile_px = TILE_SIZE as f32 * scale;

    let visible = layer.fetcher.visible_tiles(
        view_center.0,
        view_center.1,
        drawn_zoom,
        viewport.x / scale,
        viewport.y / scale,
    );

    for (tile_id, offset_x, offset_y) in visible {
        if let Some(texture) = layer.fetcher.get_tile(tile_id, ctx) {
            let tile_pos = Pos2::new(center.x + offset_x * scale, center.y + offset_y * scale);
            let tile_rect = Rect::from_min_size(tile_pos, egui::vec2(tile_px, tile_px));

            painter.image(
                texture.id(),
                tile_rect,
                Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    }
}

fn draw_vector_layer(
    layer: &VectorLayer,
    painter: &egui::Painter,
    to_screen: &impl Fn(f64, f64) -> Pos2,
) {
    let style = *layer.style();
    let stroke = Stroke::new(style.stroke_width, style.stroke);
    let fill = style
        .stroke
        .gamma_multiply(style.fill_opacity.clamp(0.0, 1.0));

    let project = |coords: &[geo_types::Coord<f64>]| -> Vec<Pos2> {
        coords.iter().map(|c| to_screen(c.y, c.x)).collect()
    };

    let draw_point = |coord: &geo_types::Coord<f64>, label: Option<&str>| {
        let pos = to_screen(coord.y, coord.x);
        painter.circle_filled(pos, style.point_radius, style.stroke);
        if let Some(label) = label {
            painter.text(
                pos + egui::vec2(style.point_radius + 2.0, 0.0),
                Align2::LEFT_CENTER,
                label,
                FontId::proportional(11.0),
                style.stroke,
            );
        }
    };

    let draw_ring = |exterior: &[geo_types::Coord<f64>], holes: &[Vec<geo_types::Coord<f64>>]| {
        let points = project(exterior);
        if style.fill_opacity > 0.0 {
            painter.add(egui::Shape::convex_polygon(
                points.clone(),
                fill,
                Stroke::NONE,
            ));
        }
        painter.add(egui::Shape::closed_line(points, stroke));
        for hole in holes {
            painter.add(egui::Shape::closed_line(project(hole), stroke));
        }
    };

    for feature in layer.features() {
        match feature {
            GeoFeature::Point(coord, label) => draw_point(coord, label.as_deref()),
            GeoFeature::MultiPoint(coords, label) => {
                for coord in coords {
                    draw_point(coord, label.as_deref());
                }
            }
            GeoFeature::LineString(coords) => {
                painter.add(egui::Shape::line(project(coords), stroke));
            }
            GeoFeature::MultiLineString(lines) => {
                for line in lines {
                    painter.add(egui::Shape::line(project(line), stroke));
                }
            }
            GeoFeature::Polygon { exterior, holes, .. } => draw_ring(exterior, holes),
            GeoFeature::MultiPolygon { polygons, .. } => {
                for (exterior, holes) in polygons {
                    draw_ring(exterior, holes);
                }
            }
        }
    }
}

fn draw_textured_bounds(
    painter: &egui::Painter,
    texture: &egui::TextureHandle,
    bounds: Bounds,
    to_screen: &impl Fn(f64, f64) -> Pos2,
) {
    let top_left = to_screen(bounds.north, bounds.west);
    let bottom_right = to_screen(bounds.south, bounds.east);
    let rect = Rect::from_min_max(top_left, bottom_right);

    painter.image(
        texture.id(),
        rect,
        Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
        Color32::WHITE,
    );
}
