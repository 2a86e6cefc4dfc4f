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

//! Raster file layers.
//!
//! A raster layer is a local image file stretched over geographic bounds
//! read from an ESRI world file sidecar (`foo.wld`, or the abbreviated
//! form derived from the image extension: `.tfw`, `.pgw`, `.jgw`, `.gfw`).
//! Decoding is delegated to the `image` crate; a nonexistent path fails
//! with the propagated I/O error.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use egui::{ColorImage, TextureHandle};

use crate::bounds::Bounds;
use crate::error::{Error, Result};

/// A georeferenced raster image loaded from disk.
pub struct RasterLayer {
    name: String,
    path: PathBuf,
    bounds: Bounds,
    pixels: ColorImage,
    texture: Option<TextureHandle>,
}

impl fmt::Debug for RasterLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterLayer")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl RasterLayer {
    /// Load and georeference a raster file.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let bytes = fs::read(&path)?;
        let img = image::load_from_memory(&bytes)?;

        let bounds = world_file_bounds(&path, img.width(), img.height())?;
        log::debug!("loaded raster {path:?} covering {bounds:?}");

        let rgba = img.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let pixels = ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw());

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "raster".to_string());

        Ok(Self {
            name,
            path,
            bounds,
            pixels,
            texture: None,
        })
    }

    /// Layer display name (the file name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Geographic extent from the world file.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The texture for drawing, uploaded on first use.
    pub fn texture(&mut self, ctx: &egui::Context) -> &TextureHandle {
        if self.texture.is_none() {
            let texture = ctx.load_texture(
                format!("raster_{}", self.name),
                self.pixels.clone(),
                Default::default(),
            );
            self.texture = Some(texture);
        }
        self.texture.as_ref().expect("texture uploaded above")
    }
}

/// World file extensions to try, most specific first.
fn world_file_candidates(path: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    let abbreviated = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("tif" | "tiff") => Some("tfw"),
        Some("png") => Some("pgw"),
        Some("jpg" | "jpeg") => Some("jgw"),
        Some("gif") => Some("gfw"),
        _ => None,
    };
    if let Some(ext) = abbreviated {
        candidates.push(path.with_extension(ext));
    }
    candidates.push(path.with_extension("wld"));

    candidates
}

/// Read bounds from the first world file found next to `path`.
fn world_file_bounds(path: &Path, width: u32, height: u32) -> Result<Bounds> {
    for candidate in world_file_candidates(path) {
        if let Ok(text) = fs::read_to_string(&candidate) {
            return parse_world_file(&text, width, height)
                .ok_or_else(|| Error::MissingGeoreference(path.to_path_buf()));
        }
    }
    Err(Error::MissingGeoreference(path.to_path_buf()))
}

/// Parse the six-line world file format: x pixel size, two rotation
/// terms, y pixel size (negative for north-up), then the coordinates of
/// the center of the top-left pixel.
fn parse_world_file(text: &str, width: u32, height: u32) -> Option<Bounds> {
    let values: Vec<f64> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.parse().ok())
        .collect::<Option<Vec<f64>>>()?;

    let [x_size, rot_y, rot_x, y_size, x_origin, y_origin] = values.as_slice() else {
        return None;
    };

    if *rot_x != 0.0 || *rot_y != 0.0 {
        log::warn!("world file rotation terms are not supported, ignoring them");
    }

    // The origin is the center of the top-left pixel.
    let west = x_origin - x_size / 2.0;
    let north = y_origin - y_size / 2.0;
    let east = west + x_size * f64::from(width);
    let south = north + y_size * f64::from(height);

    Bounds::new(south, west, north, east).ok()
}
