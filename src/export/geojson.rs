//! GeoJSON `FeatureCollection` output.
//!
//! Closed rings become `Polygon` features, single points `Point`, everything
//! else `LineString`.
//! Properties carry `id` (export index), `color` as `rgb(r,g,b)` and
//! `label`. The collection records the declared coordinate space in a
//! `coordinateSpace` member.

use serde::Serialize;
use serde_json::Value;

use super::{validate, CoordinateSpace, GeoFeature};
use crate::error::{Error, Result};

#[derive(Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "coordinateSpace")]
    coordinate_space: CoordinateSpace,
    features: Vec<Feature<'a>>,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: Geometry,
    properties: Properties<'a>,
}

#[derive(Serialize)]
#[serde(tag = "type", content = "coordinates")]
enum Geometry {
    Point([f64; 2]),
    Polygon(Vec<Vec<[f64; 2]>>),
    LineString(Vec<[f64; 2]>),
}

#[derive(Serialize)]
struct Properties<'a> {
    id: usize,
    color: String,
    label: &'a str,
}

fn feature(f: &GeoFeature) -> Feature<'_> {
    let coords: Vec<[f64; 2]> = f.contour.points().iter().map(|&(x, y)| [x, y]).collect();
    let geometry = if f.contour.is_closed_ring() {
        Geometry::Polygon(vec![coords])
    } else if coords.len() == 1 {
        Geometry::Point(coords[0])
    } else {
        Geometry::LineString(coords)
    };
    Feature {
        kind: "Feature",
        geometry,
        properties: Properties {
            id: f.id,
            color: f.color.css(),
            label: &f.label,
        },
    }
}

fn collection(features: &[GeoFeature], space: CoordinateSpace) -> Result<FeatureCollection<'_>> {
    validate(features)?;
    Ok(FeatureCollection {
        kind: "FeatureCollection",
        coordinate_space: space,
        features: features.iter().map(feature).collect(),
    })
}

/// Build the document as a JSON value.
pub fn to_geojson_value(features: &[GeoFeature], space: CoordinateSpace) -> Result<Value> {
    serde_json::to_value(collection(features, space)?).map_err(Error::Serialize)
}

/// Serialize features to a pretty-printed GeoJSON string.
pub fn to_geojson(features: &[GeoFeature], space: CoordinateSpace) -> Result<String> {
    serde_json::to_string_pretty(&collection(features, space)?).map_err(Error::Serialize)
}
