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

//! Map layers.
//!
//! A layer is a rendering directive: a tile source, a set of vector
//! features, a georeferenced raster, or an image overlay. Layers live in
//! the map's ordered list; draw order is append order.

pub mod image;
pub mod raster;
pub mod table;
pub mod vector;

pub use image::ImageOverlay;
pub use raster::RasterLayer;
pub use table::GeoTable;
pub use vector::{GeoFeature, VectorInput, VectorLayer, VectorStyle};

use crate::bounds::Bounds;
use crate::tiles::TileFetcher;

/// A named tile layer (basemap, Google layer, or WMS service).
#[derive(Debug)]
pub struct TileLayer {
    /// Display name, also used for the tile cache directory.
    pub name: String,
    /// Fetcher bound to this layer's tile source.
    pub fetcher: TileFetcher,
}

impl TileLayer {
    /// Create a tile layer from a name and a boxed tile source.
    pub fn new(name: impl Into<String>, source: Box<dyn walkers::sources::TileSource>) -> Self {
        let name = name.into();
        let fetcher = TileFetcher::new(&name, source);
        Self { name, fetcher }
    }
}

/// One entry in the map's ordered layer list.
#[derive(Debug)]
pub enum Layer {
    /// Raster tiles fetched from a remote source.
    Tiles(TileLayer),
    /// Vector features drawn on the painter.
    Vector(VectorLayer),
    /// A georeferenced raster file.
    Raster(RasterLayer),
    /// An image stretched over geographic bounds.
    Image(ImageOverlay),
}

impl Layer {
    /// Display name of the layer.
    pub fn name(&self) -> &str {
        match self {
            Layer::Tiles(layer) => &layer.name,
            Layer::Vector(layer) => layer.name(),
            Layer::Raster(layer) => layer.name(),
            Layer::Image(layer) => layer.name(),
        }
    }

    /// Geographic extent of the layer, when it has one. Tile layers span
    /// the world and report `None`.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Layer::Tiles(_) => None,
            Layer::Vector(layer) => layer.bounds(),
            Layer::Raster(layer) => Some(layer.bounds()),
            Layer::Image(layer) => Some(layer.bounds()),
        }
    }
}
