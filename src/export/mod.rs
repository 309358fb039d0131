//! Document export: GeoJSON and KML.
//!
//! Exporters write coordinates exactly as given. Geographic output is
//! obtained by flattening features through a [`GeoTransform`] first
//! (see [`flatten`]); without one, coordinates stay in pixel space.

pub mod geojson;
pub mod kml;

use serde::Serialize;

use crate::collector::PickedFeature;
use crate::error::{Error, Result};
use crate::geo::GeoTransform;
use crate::raster::Rgb;
use crate::selection::contour::Contour;

pub use self::geojson::{to_geojson, to_geojson_value};
pub use self::kml::{to_kml, KmlOptions, RegionCorners};

/// Space the exported coordinates live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    Pixel,
    Geographic,
}

/// One contour ready for export, tagged with its origin and export index.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
    pub id: usize,
    pub color: Rgb,
    pub label: String,
    pub contour: Contour,
}

/// Flatten picked features into one export feature per contour.
///
/// Ids are assigned in order starting at 0. With a transform, every point
/// is mapped to `(lon, lat)`; without, pixel coordinates pass through.
pub fn flatten(features: &[PickedFeature], transform: Option<&GeoTransform>) -> Vec<GeoFeature> {
    features
        .iter()
        .flat_map(|f| f.contours().iter().map(move |c| (f, c)))
        .enumerate()
        .map(|(id, (feature, contour))| GeoFeature {
            id,
            color: feature.color(),
            label: feature.label().to_string(),
            contour: match transform {
                Some(t) => t.contour(contour),
                None => contour.clone(),
            },
        })
        .collect()
}

/// Reject contours holding non-finite coordinates.
///
/// Point count is not checked here; each format decides how to write short
/// contours.
pub(crate) fn validate<'a>(features: impl IntoIterator<Item = &'a GeoFeature>) -> Result<()> {
    for f in features {
        if let Some(i) = f
            .contour
            .points()
            .iter()
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(Error::MalformedContour {
                contour: f.id,
                reason: format!("point {i} is not finite"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoBounds;

    fn picks() -> Vec<PickedFeature> {
        let seg = Contour::new(vec![(0.0, 0.0), (100.0, 50.0)]);
        vec![
            PickedFeature::new(Rgb::new(1, 2, 3), "a", vec![seg.clone(), seg.clone()]),
            PickedFeature::new(Rgb::new(4, 5, 6), "b", vec![]),
            PickedFeature::new(Rgb::new(7, 8, 9), "c", vec![seg]),
        ]
    }

    #[test]
    fn test_flatten_ids_are_per_export() {
        let flat = flatten(&picks(), None);
        let ids: Vec<usize> = flat.iter().map(|f| f.id).collect();
        assert_eq!(ids, [0, 1, 2]);
        assert_eq!(flat[2].label, "c");
        assert_eq!(flat[0].contour.points()[1], (100.0, 50.0));
    }

    #[test]
    fn test_flatten_with_transform() {
        let t = GeoTransform::new(GeoBounds::new(10.0, 20.0, 50.0, 40.0).unwrap(), 100, 100);
        let flat = flatten(&picks(), Some(&t));
        let (lon, lat) = flat[0].contour.points()[1];
        assert!((lon - 20.0).abs() < 1e-9);
        assert!((lat - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_non_finite_only() {
        let mut f = GeoFeature {
            id: 4,
            color: Rgb::new(0, 0, 0),
            label: "x".into(),
            contour: Contour::new(vec![(0.0, 0.0)]),
        };
        assert!(validate(std::slice::from_ref(&f)).is_ok());
        f.contour = Contour::default();
        assert!(validate(std::slice::from_ref(&f)).is_ok());

        f.contour = Contour::new(vec![(0.0, 0.0), (f64::INFINITY, 1.0)]);
        assert!(matches!(
            validate(&[f]),
            Err(Error::MalformedContour { contour: 4, .. })
        ));
    }
}
