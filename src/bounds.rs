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

//! Geographic bounding boxes in WGS84 degrees.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A latitude/longitude bounding box, corners in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Southern edge latitude.
    pub south: f64,
    /// Western edge longitude.
    pub west: f64,
    /// Northern edge latitude.
    pub north: f64,
    /// Eastern edge longitude.
    pub east: f64,
}

impl Bounds {
    /// The full world extent.
    pub const WORLD: Bounds = Bounds {
        south: -90.0,
        west: -180.0,
        north: 90.0,
        east: 180.0,
    };

    /// Create bounds from corner coordinates, rejecting inverted or
    /// non-finite boxes.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self> {
        if !(south.is_finite() && west.is_finite() && north.is_finite() && east.is_finite()) {
            return Err(Error::InvalidBounds("coordinates must be finite".to_string()));
        }
        if south > north {
            return Err(Error::InvalidBounds(format!(
                "south ({south}) is north of north ({north})"
            )));
        }
        if west > east {
            return Err(Error::InvalidBounds(format!(
                "west ({west}) is east of east ({east})"
            )));
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// Bounds spanning a single point.
    pub fn from_point(lat: f64, lon: f64) -> Self {
        Self {
            south: lat,
            west: lon,
            north: lat,
            east: lon,
        }
    }

    /// The center of the box as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }

    /// Grow the box to include a point.
    pub fn extend(&mut self, lat: f64, lon: f64) {
        self.south = self.south.min(lat);
        self.west = self.west.min(lon);
        self.north = self.north.max(lat);
        self.east = self.east.max(lon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_inverted() {
        assert!(matches!(
            Bounds::new(10.0, 0.0, -10.0, 5.0),
            Err(Error::InvalidBounds(_))
        ));
        assert!(matches!(
            Bounds::new(-10.0, 5.0, 10.0, 0.0),
            Err(Error::InvalidBounds(_))
        ));
    }

    #[test]
    fn test_new_rejects_non_finite() {
        assert!(matches!(
            Bounds::new(f64::NAN, 0.0, 1.0, 1.0),
            Err(Error::InvalidBounds(_))
        ));
    }

    #[test]
    fn test_center() {
        let b = Bounds::new(0.0, 10.0, 10.0, 30.0).unwrap();
        assert_eq!(b.center(), (5.0, 20.0));
    }

    #[test]
    fn test_union_and_extend() {
        let a = Bounds::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let b = Bounds::new(-2.0, 0.5, 0.5, 3.0).unwrap();
        let u = a.union(&b);
        assert_eq!(u, Bounds::new(-2.0, 0.0, 1.0, 3.0).unwrap());

        let mut p = Bounds::from_point(5.0, 5.0);
        p.extend(4.0, 7.0);
        assert_eq!(p, Bounds::new(4.0, 5.0, 5.0, 7.0).unwrap());
    }
}
