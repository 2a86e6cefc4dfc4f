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

//! Image overlays.
//!
//! An image overlay stretches a remote image over geographic bounds
//! (default: the whole world). The image is fetched once on a background
//! thread the first time the map is shown.

use std::fmt;
use std::sync::{Arc, Mutex};

use egui::{ColorImage, TextureHandle};

use crate::bounds::Bounds;

enum FetchState {
    Idle,
    Loading,
    Loaded(ColorImage),
    Failed,
}

/// An image stretched over geographic bounds.
pub struct ImageOverlay {
    name: String,
    url: String,
    bounds: Bounds,
    state: Arc<Mutex<FetchState>>,
    texture: Option<TextureHandle>,
}

impl fmt::Debug for ImageOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageOverlay")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl ImageOverlay {
    /// Create an overlay for `url` covering `bounds`, or the whole world
    /// when `bounds` is `None`.
    pub fn new(url: impl Into<String>, bounds: Option<Bounds>) -> Self {
        let url = url.into();
        let name = url
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or("image")
            .to_string();

        Self {
            name,
            url,
            bounds: bounds.unwrap_or(Bounds::WORLD),
            state: Arc::new(Mutex::new(FetchState::Idle)),
            texture: None,
        }
    }

    /// Layer display name (the last URL segment).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The image URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Geographic extent of the overlay.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The texture for drawing. Kicks off the background fetch on first
    /// call and returns `None` until the image has arrived.
    pub fn texture(&mut self, ctx: &egui::Context) -> Option<TextureHandle> {
        if let Some(texture) = &self.texture {
            return Some(texture.clone());
        }

        let mut state = self.state.lock().expect("overlay state mutex poisoned");
        match &*state {
            FetchState::Idle => {
                *state = FetchState::Loading;
                self.spawn_fetch(ctx.clone());
                None
            }
            FetchState::Loading | FetchState::Failed => None,
            FetchState::Loaded(pixels) => {
                let texture = ctx.load_texture(
                    format!("overlay_{}", self.name),
                    pixels.clone(),
                    Default::default(),
                );
                self.texture = Some(texture.clone());
                *state = FetchState::Idle; // pixels no longer needed
                Some(texture)
            }
        }
    }

    fn spawn_fetch(&self, ctx: egui::Context) {
        let url = self.url.clone();
        let state = Arc::clone(&self.state);

        std::thread::spawn(move || {
            let fetched = fetch_image(&url);
            let mut state = state.lock().expect("overlay state mutex poisoned");
            *state = match fetched {
                Ok(pixels) => FetchState::Loaded(pixels),
                Err(e) => {
                    log::warn!("failed to fetch image overlay {url}: {e}");
                    FetchState::Failed
                }
            };
            ctx.request_repaint();
        });
    }
}

fn fetch_image(url: &str) -> Result<ColorImage, String> {
    let response = reqwest::blocking::get(url).map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().map_err(|e| e.to_string())?;

    let img = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds_are_world() {
        let overlay = ImageOverlay::new("https://example.com/radar.png", None);
        assert_eq!(overlay.bounds(), Bounds::WORLD);
    }

    #[test]
    fn test_explicit_bounds_are_kept() {
        let bounds = Bounds::new(29.0, 30.0, 31.0, 32.0).unwrap();
        let overlay = ImageOverlay::new("https://example.com/radar.png", Some(bounds));
        assert_eq!(overlay.bounds(), bounds);
    }

    #[test]
    fn test_name_is_last_url_segment() {
        let overlay = ImageOverlay::new("https://example.com/maps/radar.png", None);
        assert_eq!(overlay.name(), "radar.png");
        let overlay = ImageOverlay::new("https://example.com/", None);
        assert_eq!(overlay.name(), "image");
    }
}
