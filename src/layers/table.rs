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

//! In-memory geometry tables.
//!
//! [`GeoTable`] pairs geometry values with attribute rows, the crate's
//! analog of a GeoDataFrame. A table converts to the same renderable
//! features as an equivalent GeoJSON document, so either representation
//! yields the same number of rendered features.

use geo_types::{Coord, Geometry};
use serde_json::{Map, Value};

use crate::layers::vector::{GeoFeature, LABEL_KEYS};

/// A tabular structure pairing geometries with attribute columns.
#[derive(Debug, Clone, Default)]
pub struct GeoTable {
    geometries: Vec<Geometry<f64>>,
    attributes: Vec<Map<String, Value>>,
}

impl GeoTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row: one geometry with its attributes.
    pub fn push(&mut self, geometry: Geometry<f64>, attributes: Map<String, Value>) {
        self.geometries.push(geometry);
        self.attributes.push(attributes);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// The geometry column.
    pub fn geometries(&self) -> &[Geometry<f64>] {
        &self.geometries
    }

    /// The attribute rows, parallel to [`Self::geometries`].
    pub fn attributes(&self) -> &[Map<String, Value>] {
        &self.attributes
    }

    /// Convert every row into renderable features. Geometry collections
    /// are flattened into one feature per member, matching the GeoJSON
    /// conversion.
    pub fn to_features(&self) -> Vec<GeoFeature> {
        self.geometries
            .iter()
            .zip(&self.attributes)
            .flat_map(|(geometry, attributes)| {
                let label = row_label(attributes);
                features_from_geometry(geometry, label)
            })
            .collect()
    }
}

fn row_label(attributes: &Map<String, Value>) -> Option<String> {
    LABEL_KEYS
        .iter()
        .find_map(|key| attributes.get(*key))
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

fn line_coords(line: &geo_types::LineString<f64>) -> Vec<Coord<f64>> {
    line.coords().copied().collect()
}

fn polygon_parts(polygon: &geo_types::Polygon<f64>) -> (Vec<Coord<f64>>, Vec<Vec<Coord<f64>>>) {
    (
        line_coords(polygon.exterior()),
        polygon.interiors().iter().map(line_coords).collect(),
    )
}

fn features_from_geometry(geometry: &Geometry<f64>, label: Option<String>) -> Vec<GeoFeature> {
    match geometry {
        Geometry::Point(point) => vec![GeoFeature::Point(point.0, label)],
        Geometry::MultiPoint(points) => vec![GeoFeature::MultiPoint(
            points.iter().map(|p| p.0).collect(),
            label,
        )],
        Geometry::Line(line) => vec![GeoFeature::LineString(vec![line.start, line.end])],
        Geometry::LineString(line) => vec![GeoFeature::LineString(line_coords(line))],
        Geometry::MultiLineString(lines) => vec![GeoFeature::MultiLineString(
            lines.iter().map(line_coords).collect(),
        )],
        Geometry::Polygon(polygon) => {
            let (exterior, holes) = polygon_parts(polygon);
            vec![GeoFeature::Polygon {
                exterior,
                holes,
                label,
            }]
        }
        Geometry::MultiPolygon(polygons) => vec![GeoFeature::MultiPolygon {
            polygons: polygons.iter().map(polygon_parts).collect(),
            label,
        }],
        Geometry::Rect(rect) => {
            let polygon = rect.to_polygon();
            let (exterior, holes) = polygon_parts(&polygon);
            vec![GeoFeature::Polygon {
                exterior,
                holes,
                label,
            }]
        }
        Geometry::Triangle(triangle) => {
            let polygon = triangle.to_polygon();
            let (exterior, holes) = polygon_parts(&polygon);
            vec![GeoFeature::Polygon {
                exterior,
                holes,
                label,
            }]
        }
        Geometry::GeometryCollection(members) => members
            .iter()
            .flat_map(|member| features_from_geometry(member, label.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::vector::features_from_geojson;
    use geo_types::{point, polygon, LineString};

    fn attrs(name: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(name.to_string()));
        map
    }

    #[test]
    fn test_push_and_len() {
        let mut table = GeoTable::new();
        assert!(table.is_empty());
        table.push(point! { x: 31.2357, y: 30.0444 }.into(), attrs("Cairo"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_to_features_carries_labels() {
        let mut table = GeoTable::new();
        table.push(point! { x: 31.2357, y: 30.0444 }.into(), attrs("Cairo"));
        let features = table.to_features();
        assert!(matches!(
            &features[0],
            GeoFeature::Point(_, Some(label)) if label == "Cairo"
        ));
    }

    #[test]
    fn test_table_matches_equivalent_geojson_feature_count() {
        // The same data as a GeoJSON document...
        let geojson: geojson::GeoJson = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"name": "Cairo"},
                    "geometry": {"type": "Point", "coordinates": [31.2357, 30.0444]}
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[30.0, 29.0], [31.0, 30.0]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[30.0, 29.0], [32.0, 29.0], [32.0, 31.0], [30.0, 29.0]]]
                    }
                }
            ]
        }"#
        .parse()
        .unwrap();

        // ...and as an in-memory table.
        let mut table = GeoTable::new();
        table.push(point! { x: 31.2357, y: 30.0444 }.into(), attrs("Cairo"));
        table.push(
            LineString::from(vec![(30.0, 29.0), (31.0, 30.0)]).into(),
            Map::new(),
        );
        table.push(
            polygon![
                (x: 30.0, y: 29.0),
                (x: 32.0, y: 29.0),
                (x: 32.0, y: 31.0),
                (x: 30.0, y: 29.0),
            ]
            .into(),
            Map::new(),
        );

        assert_eq!(
            table.to_features().len(),
            features_from_geojson(&geojson).len()
        );
    }

    #[test]
    fn test_geometry_collection_is_flattened() {
        let mut table = GeoTable::new();
        table.push(
            Geometry::GeometryCollection(geo_types::GeometryCollection(vec![
                point! { x: 1.0, y: 2.0 }.into(),
                point! { x: 3.0, y: 4.0 }.into(),
            ])),
            Map::new(),
        );
        assert_eq!(table.to_features().len(), 2);
    }
}
