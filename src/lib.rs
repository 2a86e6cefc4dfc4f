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

//! Embeddable slippy-map widget for egui with simplified methods for
//! common GIS workflows.
//!
//! The central type is [`Map`]: an interactive Web Mercator map with one
//! method per common operation, so adding a basemap, a GeoJSON file, a
//! georeferenced raster, or a WMS service is a single call each. The
//! pieces compose:
//!
//! - **Basemaps**: a named registry of public tile providers, plus
//!   Google Maps layers ([`basemap`])
//! - **Vector data**: GeoJSON documents, shapefiles, and in-memory
//!   geometry tables ([`layers`])
//! - **Rasters**: local image files georeferenced by world file sidecars
//! - **Services**: WMS endpoints exposed as ordinary tile layers
//!   ([`wms`])
//!
//! # Quick Start
//!
//! ```no_run
//! use geonest::Map;
//!
//! fn ui(ui: &mut egui::Ui, map: &mut Map) {
//!     map.show(ui);
//! }
//!
//! fn build() -> geonest::Result<Map> {
//!     let mut map = Map::with_basemap((30.0, 31.0), 6.0, "OpenTopoMap")?;
//!     map.add_vector(std::path::Path::new("countries.geojson"))?;
//!     map.add_wms_layer("https://example.com/wms", "rivers")?;
//!     Ok(map)
//! }
//! ```
//!
//! Errors surface immediately from each `add_*` call; nothing falls back
//! to a default silently. An unknown basemap name is an
//! [`Error::UnknownBasemap`], a missing raster file is the propagated
//! I/O error.

pub mod basemap;
pub mod bounds;
pub mod error;
pub mod layers;
pub mod map;
pub mod mercator;
pub mod tiles;
pub mod wms;

pub use basemap::{available_basemaps, GoogleMapType};
pub use bounds::Bounds;
pub use error::{Error, Result};
pub use layers::{GeoTable, Layer, VectorInput, VectorStyle};
pub use map::Map;
pub use wms::WmsSource;
