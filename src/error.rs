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

//! Error types for the crate.
//!
//! Every fallible operation fails fast: there is no retry and no silent
//! fallback to a default basemap or layer. Errors from the underlying GIS
//! libraries are propagated unchanged via `#[from]` conversions.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a map or adding layers to it.
#[derive(Debug, Error)]
pub enum Error {
    /// A basemap name did not resolve against the registry.
    #[error("basemap '{0}' not found in the basemap registry")]
    UnknownBasemap(String),

    /// A Google map type string did not match any known type.
    #[error("invalid Google map type '{0}', must be one of: roadmap, satellite, hybrid, terrain")]
    UnknownGoogleMapType(String),

    /// A vector file had an extension the dispatcher does not recognize.
    #[error("unsupported vector file extension '{ext}' for '{path}'")]
    UnsupportedExtension { path: PathBuf, ext: String },

    /// A raster file had no sidecar world file to georeference it with.
    #[error("no world file found for raster '{0}'")]
    MissingGeoreference(PathBuf),

    /// Geographic bounds were inverted or degenerate.
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    /// File could not be read (nonexistent path, permissions, ...).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed GeoJSON.
    #[error("failed to parse GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Unreadable shapefile.
    #[error("failed to read shapefile: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// Undecodable raster image.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}
