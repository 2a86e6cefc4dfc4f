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

//! Basemap registry and tile sources.
//!
//! Maps human-readable basemap names ("OpenTopoMap", "CartoDB.DarkMatter")
//! to tile-source descriptors. Resolution is exact-match first, then
//! case-insensitive; an unknown name is an error, never a silent fallback.

use std::collections::HashMap;
use std::str::FromStr;

use lazy_static::lazy_static;
use walkers::sources::{Attribution, TileSource};
use walkers::TileId;

use crate::error::{Error, Result};

/// An immutable tile-source descriptor registered at load time.
///
/// URL templates use `{s}` (subdomain), `{x}`, `{y}` and `{z}` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct BasemapEntry {
    /// Registry key, e.g. `"OpenStreetMap.Mapnik"`.
    pub name: &'static str,
    /// Tile URL template.
    pub url_template: &'static str,
    /// Subdomains rotated into `{s}` for load balancing.
    pub subdomains: &'static [&'static str],
    /// Attribution line shown on the map.
    pub attribution_text: &'static str,
    /// Attribution link target.
    pub attribution_url: &'static str,
    /// Deepest zoom level the provider serves.
    pub max_zoom: u8,
}

/// All registered basemaps, in registry order.
pub static BASEMAPS: &[BasemapEntry] = &[
    BasemapEntry {
        name: "OpenStreetMap.Mapnik",
        url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        subdomains: &[],
        attribution_text: "© OpenStreetMap contributors",
        attribution_url: "https://www.openstreetmap.org/copyright",
        max_zoom: 19,
    },
    BasemapEntry {
        name: "OpenTopoMap",
        url_template: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
        subdomains: &["a", "b", "c"],
        attribution_text: "© OpenStreetMap contributors, SRTM | © OpenTopoMap (CC-BY-SA)",
        attribution_url: "https://opentopomap.org/",
        max_zoom: 17,
    },
    BasemapEntry {
        name: "Esri.WorldImagery",
        url_template:
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        subdomains: &[],
        attribution_text: "Tiles © Esri — Source: Esri, Maxar, Earthstar Geographics",
        attribution_url: "https://www.esri.com/",
        max_zoom: 19,
    },
    BasemapEntry {
        name: "CartoDB.DarkMatter",
        url_template: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
        subdomains: &["a", "b", "c", "d"],
        attribution_text: "© OpenStreetMap contributors, © CARTO",
        attribution_url: "https://carto.com/attributions",
        max_zoom: 20,
    },
    BasemapEntry {
        name: "CartoDB.Positron",
        url_template: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
        subdomains: &["a", "b", "c", "d"],
        attribution_text: "© OpenStreetMap contributors, © CARTO",
        attribution_url: "https://carto.com/attributions",
        max_zoom: 20,
    },
];

lazy_static! {
    static ref BASEMAP_INDEX: HashMap<String, &'static BasemapEntry> = BASEMAPS
        .iter()
        .map(|entry| (entry.name.to_ascii_lowercase(), entry))
        .collect();
}

/// Look up a basemap descriptor by name.
///
/// Tries an exact match first, then a case-insensitive one.
///
/// # Errors
///
/// [`Error::UnknownBasemap`] if the name is not registered.
pub fn resolve(name: &str) -> Result<&'static BasemapEntry> {
    if let Some(entry) = BASEMAPS.iter().find(|entry| entry.name == name) {
        return Ok(entry);
    }
    BASEMAP_INDEX
        .get(&name.to_ascii_lowercase())
        .copied()
        .ok_or_else(|| Error::UnknownBasemap(name.to_string()))
}

/// Names of every registered basemap, in registry order.
pub fn available_basemaps() -> Vec<&'static str> {
    BASEMAPS.iter().map(|entry| entry.name).collect()
}

/// Tile source for a registered basemap entry.
#[derive(Debug)]
pub struct BasemapSource {
    entry: &'static BasemapEntry,
}

impl BasemapSource {
    /// Wrap a registry entry as a tile source.
    pub fn new(entry: &'static BasemapEntry) -> Self {
        Self { entry }
    }
}

impl TileSource for BasemapSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        let mut url = self
            .entry
            .url_template
            .replace("{x}", &tile_id.x.to_string())
            .replace("{y}", &tile_id.y.to_string())
            .replace("{z}", &tile_id.zoom.to_string());

        if !self.entry.subdomains.is_empty() {
            // Subdomain load balancing based on tile coordinates
            let subdomain =
                self.entry.subdomains[((tile_id.x + tile_id.y) % self.entry.subdomains.len() as u32) as usize];
            url = url.replace("{s}", subdomain);
        }

        url
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: self.entry.attribution_text,
            url: self.entry.attribution_url,
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        self.entry.max_zoom
    }
}

/// Google Maps tile layer types.
///
/// Use of Google Maps tiles may be subject to Google's Terms of Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoogleMapType {
    Roadmap,
    Satellite,
    Hybrid,
    Terrain,
}

impl GoogleMapType {
    /// The `lyrs=` code used in Google tile URLs.
    pub fn lyrs_code(&self) -> &'static str {
        match self {
            GoogleMapType::Roadmap => "m",
            GoogleMapType::Satellite => "s",
            GoogleMapType::Hybrid => "y",
            GoogleMapType::Terrain => "p",
        }
    }

    /// Human-readable layer name.
    pub fn display_name(&self) -> &'static str {
        match self {
            GoogleMapType::Roadmap => "Google Roadmap",
            GoogleMapType::Satellite => "Google Satellite",
            GoogleMapType::Hybrid => "Google Hybrid",
            GoogleMapType::Terrain => "Google Terrain",
        }
    }
}

impl FromStr for GoogleMapType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ROADMAP" => Ok(GoogleMapType::Roadmap),
            "SATELLITE" => Ok(GoogleMapType::Satellite),
            "HYBRID" => Ok(GoogleMapType::Hybrid),
            "TERRAIN" => Ok(GoogleMapType::Terrain),
            _ => Err(Error::UnknownGoogleMapType(s.to_string())),
        }
    }
}

/// Tile source for Google Maps layers.
#[derive(Debug)]
pub struct GoogleSource {
    map_type: GoogleMapType,
}

impl GoogleSource {
    /// Create a tile source for the given Google map type.
    pub fn new(map_type: GoogleMapType) -> Self {
        Self { map_type }
    }
}

impl TileSource for GoogleSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://mt1.google.com/vt/lyrs={}&x={}&y={}&z={}",
            self.map_type.lyrs_code(),
            tile_id.x,
            tile_id.y,
            tile_id.zoom
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "Map data © Google",
            url: "https://www.google.com/maps",
            logo_light: None,
            logo_dark: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_all_registered_names() {
        for entry in BASEMAPS {
            let resolved = resolve(entry.name).unwrap();
            assert_eq!(resolved.name, entry.name);
            assert!(!resolved.url_template.is_empty());
            assert!(!resolved.attribution_text.is_empty());
        }
    }

    #[test]
    fn test_available_basemaps_lists_registry() {
        let names = available_basemaps();
        assert_eq!(names.len(), BASEMAPS.len());
        assert!(names.contains(&"OpenTopoMap"));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let entry = resolve("opentopomap").unwrap();
        assert_eq!(entry.name, "OpenTopoMap");
        let entry = resolve("CARTODB.DARKMATTER").unwrap();
        assert_eq!(entry.name, "CartoDB.DarkMatter");
    }

    #[test]
    fn test_resolve_unknown_name_fails() {
        assert!(matches!(
            resolve("NotARealBasemap"),
            Err(Error::UnknownBasemap(name)) if name == "NotARealBasemap"
        ));
    }

    #[test]
    fn test_tile_url_substitution() {
        let source = BasemapSource::new(resolve("OpenStreetMap.Mapnik").unwrap());
        let url = source.tile_url(TileId { x: 33, y: 22, zoom: 6 });
        assert_eq!(url, "https://tile.openstreetmap.org/6/33/22.png");
    }

    #[test]
    fn test_subdomain_rotation() {
        let source = BasemapSource::new(resolve("CartoDB.DarkMatter").unwrap());
        let a = source.tile_url(TileId { x: 0, y: 0, zoom: 1 });
        let b = source.tile_url(TileId { x: 1, y: 0, zoom: 1 });
        assert!(a.starts_with("https://a.basemaps.cartocdn.com/"));
        assert!(b.starts_with("https://b.basemaps.cartocdn.com/"));
        assert!(!a.contains("{s}"));
    }

    #[test]
    fn test_google_map_type_parsing() {
        assert_eq!(
            GoogleMapType::from_str("SATELLITE").unwrap(),
            GoogleMapType::Satellite
        );
        assert_eq!(
            GoogleMapType::from_str("roadmap").unwrap(),
            GoogleMapType::Roadmap
        );
        assert!(matches!(
            GoogleMapType::from_str("STREETVIEW"),
            Err(Error::UnknownGoogleMapType(s)) if s == "STREETVIEW"
        ));
    }

    #[test]
    fn test_google_tile_url() {
        let source = GoogleSource::new(GoogleMapType::Hybrid);
        let url = source.tile_url(TileId { x: 3, y: 5, zoom: 4 });
        assert_eq!(url, "https://mt1.google.com/vt/lyrs=y&x=3&y=5&z=4");
    }
}
