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

//! Vector layers and the vector input dispatcher.
//!
//! Input is an explicit tagged variant ([`VectorInput`]): a file path, a
//! parsed GeoJSON document, or an in-memory [`GeoTable`]. File paths are
//! dispatched on their extension; `.geojson`/`.json` and `.shp` are
//! supported. No validation or reprojection happens here — coordinates
//! are taken as WGS84 and handed to the renderer as-is.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use egui::Color32;
use geo_types::Coord;
use geojson::{Feature, GeoJson, Geometry, Value};
use shapefile::dbase::FieldValue;

use crate::bounds::Bounds;
use crate::error::{Error, Result};
use crate::layers::table::GeoTable;

/// Property keys checked, in order, when looking for a feature label.
pub(crate) const LABEL_KEYS: &[&str] = &["name", "NAME", "Name", "NAMELSAD", "FULLNAME"];

/// Styling applied to every feature of a vector layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorStyle {
    /// Outline color for lines and polygon edges.
    pub stroke: Color32,
    /// Outline width in pixels.
    pub stroke_width: f32,
    /// Polygon fill opacity, 0.0 (none) to 1.0 (opaque).
    pub fill_opacity: f32,
    /// Point marker radius in pixels.
    pub point_radius: f32,
}

impl Default for VectorStyle {
    fn default() -> Self {
        Self {
            stroke: Color32::from_rgb(51, 136, 255),
            stroke_width: 2.0,
            fill_opacity: 0.2,
            point_radius: 4.0,
        }
    }
}

/// Vector data handed to the map, tagged by the caller.
#[derive(Debug)]
pub enum VectorInput {
    /// A `.geojson`, `.json` or `.shp` file on disk.
    Path(PathBuf),
    /// A parsed GeoJSON document.
    GeoJson(GeoJson),
    /// An in-memory geometry table.
    Table(GeoTable),
}

impl From<PathBuf> for VectorInput {
    fn from(path: PathBuf) -> Self {
        VectorInput::Path(path)
    }
}

impl From<&Path> for VectorInput {
    fn from(path: &Path) -> Self {
        VectorInput::Path(path.to_path_buf())
    }
}

impl From<GeoJson> for VectorInput {
    fn from(geojson: GeoJson) -> Self {
        VectorInput::GeoJson(geojson)
    }
}

impl From<GeoTable> for VectorInput {
    fn from(table: GeoTable) -> Self {
        VectorInput::Table(table)
    }
}

/// A renderable geographic feature, coordinates in WGS84 degrees
/// (`x` = longitude, `y` = latitude).
#[derive(Debug, Clone)]
pub enum GeoFeature {
    /// A single point with an optional label.
    Point(Coord<f64>, Option<String>),
    /// Several points sharing one label.
    MultiPoint(Vec<Coord<f64>>, Option<String>),
    /// Connected line segments.
    LineString(Vec<Coord<f64>>),
    /// Multiple line strings.
    MultiLineString(Vec<Vec<Coord<f64>>>),
    /// A closed ring with holes.
    Polygon {
        exterior: Vec<Coord<f64>>,
        holes: Vec<Vec<Coord<f64>>>,
        label: Option<String>,
    },
    /// Multiple rings-with-holes sharing one label.
    MultiPolygon {
        polygons: Vec<(Vec<Coord<f64>>, Vec<Vec<Coord<f64>>>)>,
        label: Option<String>,
    },
}

impl GeoFeature {
    /// Visit every coordinate of the feature.
    pub fn for_each_coord(&self, mut f: impl FnMut(&Coord<f64>)) {
        match self {
            GeoFeature::Point(coord, _) => f(coord),
            GeoFeature::MultiPoint(coords, _) | GeoFeature::LineString(coords) => {
                coords.iter().for_each(&mut f);
            }
            GeoFeature::MultiLineString(lines) => {
                lines.iter().flatten().for_each(&mut f);
            }
            GeoFeature::Polygon { exterior, holes, .. } => {
                exterior.iter().for_each(&mut f);
                holes.iter().flatten().for_each(&mut f);
            }
            GeoFeature::MultiPolygon { polygons, .. } => {
                for (exterior, holes) in polygons {
                    exterior.iter().for_each(&mut f);
                    holes.iter().flatten().for_each(&mut f);
                }
            }
        }
    }
}

/// A layer of vector features with a shared style.
#[derive(Debug, Clone)]
pub struct VectorLayer {
    name: String,
    features: Vec<GeoFeature>,
    style: VectorStyle,
    bounds: Option<Bounds>,
}

impl VectorLayer {
    /// Build a layer from tagged vector input.
    pub fn from_input(name: impl Into<String>, input: VectorInput) -> Result<Self> {
        let features = match input {
            VectorInput::Path(path) => features_from_path(&path)?,
            VectorInput::GeoJson(geojson) => features_from_geojson(&geojson),
            VectorInput::Table(table) => table.to_features(),
        };
        Ok(Self::from_features(name, features))
    }

    /// Build a layer directly from features.
    pub fn from_features(name: impl Into<String>, features: Vec<GeoFeature>) -> Self {
        let bounds = feature_bounds(&features);
        Self {
            name: name.into(),
            features,
            style: VectorStyle::default(),
            bounds,
        }
    }

    /// Replace the layer style.
    #[must_use]
    pub fn with_style(mut self, style: VectorStyle) -> Self {
        self.style = style;
        self
    }

    /// Layer display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The features of this layer, in input order.
    pub fn features(&self) -> &[GeoFeature] {
        &self.features
    }

    /// Number of renderable features.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// The layer style.
    pub fn style(&self) -> &VectorStyle {
        &self.style
    }

    /// Geographic extent of all features, `None` for an empty layer.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }
}

fn feature_bounds(features: &[GeoFeature]) -> Option<Bounds> {
    let mut bounds: Option<Bounds> = None;
    for feature in features {
        feature.for_each_coord(|coord| match &mut bounds {
            Some(b) => b.extend(coord.y, coord.x),
            None => bounds = Some(Bounds::from_point(coord.y, coord.x)),
        });
    }
    bounds
}

/// Load features from a file, dispatching on the extension.
fn features_from_path(path: &Path) -> Result<Vec<GeoFeature>> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "geojson" | "json" => {
            let text = fs::read_to_string(path)?;
            let geojson: GeoJson = text.parse()?;
            Ok(features_from_geojson(&geojson))
        }
        "shp" => features_from_shapefile(path),
        _ => Err(Error::UnsupportedExtension {
            path: path.to_path_buf(),
            ext,
        }),
    }
}

/// Convert a GeoJSON document into renderable features.
///
/// Geometry collections are flattened into one feature per member.
/// Positions with fewer than two coordinates are skipped.
pub fn features_from_geojson(geojson: &GeoJson) -> Vec<GeoFeature> {
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            fc.features.iter().flat_map(convert_feature).collect()
        }
        GeoJson::Feature(feature) => convert_feature(feature),
        GeoJson::Geometry(geometry) => convert_geometry(geometry, None),
    }
}

fn convert_feature(feature: &Feature) -> Vec<GeoFeature> {
    let label = feature.properties.as_ref().and_then(|props| {
        LABEL_KEYS
            .iter()
            .find_map(|key| props.get(*key))
            .and_then(|value| value.as_str())
            .map(str::to_string)
    });

    feature
        .geometry
        .as_ref()
        .map(|geometry| convert_geometry(geometry, label))
        .unwrap_or_default()
}

/// A position needs at least x and y. The parser rejects shorter ones,
/// but programmatically built geometries can carry them; those are
/// dropped instead of panicking.
fn coord(position: &[f64]) -> Option<Coord<f64>> {
    match position {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn ring(positions: &[Vec<f64>]) -> Vec<Coord<f64>> {
    positions.iter().filter_map(|p| coord(p)).collect()
}

fn convert_geometry(geometry: &Geometry, label: Option<String>) -> Vec<GeoFeature> {
    match &geometry.value {
        Value::Point(position) => match coord(position) {
            Some(c) => vec![GeoFeature::Point(c, label)],
            None => Vec::new(),
        },
        Value::MultiPoint(positions) => {
            vec![GeoFeature::MultiPoint(ring(positions), label)]
        }
        Value::LineString(positions) => vec![GeoFeature::LineString(ring(positions))],
        Value::MultiLineString(lines) => {
            vec![GeoFeature::MultiLineString(
                lines.iter().map(|line| ring(line)).collect(),
            )]
        }
        Value::Polygon(rings) => match rings.split_first() {
            Some((exterior, holes)) => vec![GeoFeature::Polygon {
                exterior: ring(exterior),
                holes: holes.iter().map(|hole| ring(hole)).collect(),
                label,
            }],
            None => Vec::new(),
        },
        Value::MultiPolygon(polygons) => {
            let polygons: Vec<_> = polygons
                .iter()
                .filter_map(|rings| {
                    rings.split_first().map(|(exterior, holes)| {
                        (ring(exterior), holes.iter().map(|hole| ring(hole)).collect())
                    })
                })
                .collect();
            if polygons.is_empty() {
                Vec::new()
            } else {
                vec![GeoFeature::MultiPolygon { polygons, label }]
            }
        }
        Value::GeometryCollection(members) => members
            .iter()
            .flat_map(|member| convert_geometry(member, label.clone()))
            .collect(),
    }
}

/// Load features from a shapefile, picking up labels from a `.dbf`
/// sidecar when one exists next to the `.shp`.
fn features_from_shapefile(path: &Path) -> Result<Vec<GeoFeature>> {
    let shapes = shapefile::read_shapes(path)?;

    let records: Option<Vec<shapefile::dbase::Record>> =
        fs::read(path.with_extension("dbf")).ok().and_then(|bytes| {
            shapefile::dbase::Reader::new(Cursor::new(bytes))
                .ok()
                .and_then(|mut reader| reader.read().ok())
        });

    let features = shapes
        .iter()
        .enumerate()
        .filter_map(|(idx, shape)| {
            let label = records
                .as_ref()
                .and_then(|records| records.get(idx))
                .and_then(record_label);
            convert_shape(shape, label)
        })
        .collect();

    Ok(features)
}

fn record_label(record: &shapefile::dbase::Record) -> Option<String> {
    LABEL_KEYS.iter().find_map(|key| match record.get(*key) {
        Some(FieldValue::Character(Some(s))) => Some(s.trim().to_string()),
        _ => None,
    })
}

/// Even-odd ray cast against a closed ring.
fn ring_contains(ring: &[Coord<f64>], point: Coord<f64>) -> bool {
    if ring.is_empty() {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn shp_coords(points: &[shapefile::Point]) -> Vec<Coord<f64>> {
    points.iter().map(|p| Coord { x: p.x, y: p.y }).collect()
}

fn convert_shape(shape: &shapefile::Shape, label: Option<String>) -> Option<GeoFeature> {
    use shapefile::{PolygonRing, Shape};

    match shape {
        Shape::Point(p) => Some(GeoFeature::Point(Coord { x: p.x, y: p.y }, label)),
        Shape::Multipoint(mp) => Some(GeoFeature::MultiPoint(shp_coords(mp.points()), label)),
        Shape::Polyline(pl) => {
            let parts = pl.parts();
            if parts.len() == 1 {
                Some(GeoFeature::LineString(shp_coords(&parts[0])))
            } else {
                Some(GeoFeature::MultiLineString(
                    parts.iter().map(|part| shp_coords(part)).collect(),
                ))
            }
        }
        Shape::Polygon(polygon) => {
            let mut exteriors: Vec<Vec<Coord<f64>>> = Vec::new();
            let mut holes: Vec<Vec<Coord<f64>>> = Vec::new();

            for polygon_ring in polygon.rings() {
                let coords = shp_coords(polygon_ring.points());
                match polygon_ring {
                    PolygonRing::Outer(_) => exteriors.push(coords),
                    PolygonRing::Inner(_) => holes.push(coords),
                }
            }

            match exteriors.len() {
                0 => None,
                1 => Some(GeoFeature::Polygon {
                    exterior: exteriors.remove(0),
                    holes,
                    label,
                }),
                _ => {
                    let mut polygons: Vec<(Vec<Coord<f64>>, Vec<Vec<Coord<f64>>>)> =
                        exteriors.into_iter().map(|ext| (ext, Vec::new())).collect();

                    // Attach each hole to the outer ring that contains it.
                    for hole in holes {
                        let target = hole
                            .first()
                            .and_then(|p| {
                                polygons.iter().position(|(ext, _)| ring_contains(ext, *p))
                            })
                            .unwrap_or(0);
                        polygons[target].1.push(hole);
                    }

                    Some(GeoFeature::MultiPolygon { polygons, label })
                }
            }
        }
        Shape::NullShape => None,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURE_COLLECTION: &str = r#"{
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
                    "coordinates": [[30.0, 29.0], [31.0, 30.0], [32.0, 31.0]]
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
    }"#;

    #[test]
    fn test_feature_collection_conversion() {
        let geojson: GeoJson = FEATURE_COLLECTION.parse().unwrap();
        let features = features_from_geojson(&geojson);
        assert_eq!(features.len(), 3);
        assert!(matches!(
            &features[0],
            GeoFeature::Point(c, Some(label)) if label == "Cairo" && (c.x - 31.2357).abs() < 1e-9
        ));
        assert!(matches!(&features[1], GeoFeature::LineString(coords) if coords.len() == 3));
        assert!(matches!(
            &features[2],
            GeoFeature::Polygon { exterior, holes, .. } if exterior.len() == 4 && holes.is_empty()
        ));
    }

    #[test]
    fn test_layer_bounds_and_count() {
        let geojson: GeoJson = FEATURE_COLLECTION.parse().unwrap();
        let layer = VectorLayer::from_input("test", VectorInput::GeoJson(geojson)).unwrap();
        assert_eq!(layer.feature_count(), 3);

        let bounds = layer.bounds().unwrap();
        assert!((bounds.west - 30.0).abs() < 1e-9);
        assert!((bounds.east - 32.0).abs() < 1e-9);
        assert!((bounds.south - 29.0).abs() < 1e-9);
        assert!((bounds.north - 31.0).abs() < 1e-9);
    }

    #[test]
    fn test_geometry_collection_is_flattened() {
        let geojson: GeoJson = r#"{
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Point", "coordinates": [1.0, 2.0]},
                {"type": "Point", "coordinates": [3.0, 4.0]}
            ]
        }"#
        .parse()
        .unwrap();
        assert_eq!(features_from_geojson(&geojson).len(), 2);
    }

    #[test]
    fn test_degenerate_positions_are_skipped() {
        // The parser rejects short positions, but geometries built in
        // memory can still carry them.
        let geojson = GeoJson::Geometry(Geometry::new(Value::Point(vec![])));
        assert!(features_from_geojson(&geojson).is_empty());

        let geojson = GeoJson::Geometry(Geometry::new(Value::MultiPoint(vec![
            vec![1.0],
            vec![2.0, 3.0],
        ])));
        let features = features_from_geojson(&geojson);
        assert!(matches!(
            &features[0],
            GeoFeature::MultiPoint(coords, _) if coords.len() == 1
        ));
    }

    #[test]
    fn test_multi_outer_polygon_keeps_holes() {
        use shapefile::{Point as ShpPoint, PolygonRing};

        let square = |x0: f64, y0: f64, x1: f64, y1: f64| {
            vec![
                ShpPoint::new(x0, y0),
                ShpPoint::new(x1, y0),
                ShpPoint::new(x1, y1),
                ShpPoint::new(x0, y1),
            ]
        };

        let polygon = shapefile::Polygon::with_rings(vec![
            PolygonRing::Outer(square(0.0, 0.0, 10.0, 10.0)),
            PolygonRing::Inner(square(2.0, 2.0, 4.0, 4.0)),
            PolygonRing::Outer(square(20.0, 20.0, 30.0, 30.0)),
        ]);

        let feature = convert_shape(&shapefile::Shape::Polygon(polygon), None).unwrap();
        let GeoFeature::MultiPolygon { polygons, .. } = feature else {
            panic!("expected a multi polygon");
        };

        assert_eq!(polygons.len(), 2);
        let (exterior, holes) = polygons
            .iter()
            .find(|(_, holes)| !holes.is_empty())
            .expect("the hole survives conversion");
        // The hole belongs to the first square, not the one at (20, 20).
        assert!(exterior.iter().all(|c| c.x <= 10.0));
        assert_eq!(holes.len(), 1);
    }

    #[test]
    fn test_ring_contains() {
        let ring = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            Coord { x: 10.0, y: 10.0 },
            Coord { x: 0.0, y: 10.0 },
            Coord { x: 0.0, y: 0.0 },
        ];
        assert!(ring_contains(&ring, Coord { x: 5.0, y: 5.0 }));
        assert!(!ring_contains(&ring, Coord { x: 15.0, y: 5.0 }));
        assert!(!ring_contains(&[], Coord { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn test_path_dispatch_unsupported_extension() {
        let result = features_from_path(Path::new("/tmp/data.gpkg"));
        assert!(matches!(
            result,
            Err(Error::UnsupportedExtension { ext, .. }) if ext == "gpkg"
        ));
    }

    #[test]
    fn test_path_dispatch_missing_file() {
        let result = features_from_path(Path::new("/nonexistent/data.geojson"));
        assert!(matches!(
            result,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound
        ));
    }

    #[test]
    fn test_path_dispatch_reads_geojson_file() {
        let path = std::env::temp_dir().join("geonest_vector_test.geojson");
        fs::write(&path, FEATURE_COLLECTION).unwrap();
        let features = features_from_path(&path).unwrap();
        assert_eq!(features.len(), 3);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_geojson_surfaces_parse_error() {
        let path = std::env::temp_dir().join("geonest_vector_bad.geojson");
        fs::write(&path, "{\"type\": \"FeatureCollection\"").unwrap();
        assert!(matches!(features_from_path(&path), Err(Error::GeoJson(_))));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_empty_layer_has_no_bounds() {
        let layer = VectorLayer::from_features("empty", Vec::new());
        assert_eq!(layer.feature_count(), 0);
        assert!(layer.bounds().is_none());
    }
}
