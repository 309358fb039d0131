//! Pixel to geographic coordinate mapping.
//!
//! The image is assumed to cover a rectangular lon/lat extent with no
//! projection correction (plate carrée). Column 0 maps to `west`, row 0 maps
//! to `north`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::PixelRect;
use crate::selection::contour::Contour;

/// Rectangular geographic extent in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct GeoBounds {
    west: f64,
    east: f64,
    north: f64,
    south: f64,
}

#[derive(Deserialize)]
struct RawBounds {
    west: f64,
    east: f64,
    north: f64,
    south: f64,
}

impl TryFrom<RawBounds> for GeoBounds {
    type Error = Error;

    fn try_from(raw: RawBounds) -> Result<Self> {
        GeoBounds::new(raw.west, raw.east, raw.north, raw.south)
    }
}

impl GeoBounds {
    /// Create bounds, rejecting `west >= east`, `south >= north` and non-finite values.
    pub fn new(west: f64, east: f64, north: f64, south: f64) -> Result<Self> {
        let finite = [west, east, north, south].iter().all(|v| v.is_finite());
        if !finite || west >= east || south >= north {
            return Err(Error::InvalidBounds {
                west,
                east,
                north,
                south,
            });
        }
        Ok(Self {
            west,
            east,
            north,
            south,
        })
    }

    /// Bounds from a flat `[west, east, north, south]` list.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match *values {
            [west, east, north, south] => Self::new(west, east, north, south),
            _ => Err(Error::BoundsArity(values.len())),
        }
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    /// Center of the extent as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) / 2.0,
            (self.north + self.south) / 2.0,
        )
    }
}

/// Map a pixel position to `(lon, lat)`.
///
/// Inputs are not checked against the raster size; positions outside the
/// raster extrapolate linearly past the bounds.
#[inline]
pub fn pixel_to_lonlat(
    x: f64,
    y: f64,
    bounds: &GeoBounds,
    raster_width: usize,
    raster_height: usize,
) -> (f64, f64) {
    let rx = x / raster_width as f64;
    let ry = y / raster_height as f64;
    let lon = bounds.west + rx * (bounds.east - bounds.west);
    let lat = bounds.north - ry * (bounds.north - bounds.south);
    (lon, lat)
}

/// Bounds bound to a raster size, for transforming many points at once.
#[derive(Clone, Copy, Debug)]
pub struct GeoTransform {
    pub bounds: GeoBounds,
    pub width: usize,
    pub height: usize,
}

impl GeoTransform {
    pub fn new(bounds: GeoBounds, width: usize, height: usize) -> Self {
        Self {
            bounds,
            width,
            height,
        }
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        pixel_to_lonlat(x, y, &self.bounds, self.width, self.height)
    }

    /// Transform every point of a pixel-space contour into `(lon, lat)`.
    pub fn contour(&self, contour: &Contour) -> Contour {
        contour
            .points()
            .iter()
            .map(|&(x, y)| self.apply(x, y))
            .collect()
    }

    /// `NW: lon, lat` and `SE: lon, lat` labels for a region's corners.
    pub fn corner_labels(&self, rect: &PixelRect) -> (String, String) {
        let (nw_lon, nw_lat) = self.apply(rect.x as f64, rect.y as f64);
        let (se_lon, se_lat) = self.apply(rect.right() as f64, rect.bottom() as f64);
        (
            format!("NW: {:.5}, {:.5}", nw_lon, nw_lat),
            format!("SE: {:.5}, {:.5}", se_lon, se_lat),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kolkata() -> GeoBounds {
        GeoBounds::new(88.3, 88.6, 22.7, 22.5).unwrap()
    }

    #[test]
    fn test_corners_map_to_bounds() {
        let b = kolkata();
        let (lon, lat) = pixel_to_lonlat(0.0, 0.0, &b, 600, 400);
        assert!((lon - 88.3).abs() < 1e-9);
        assert!((lat - 22.7).abs() < 1e-9);

        let (lon, lat) = pixel_to_lonlat(600.0, 400.0, &b, 600, 400);
        assert!((lon - 88.6).abs() < 1e-9);
        assert!((lat - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic() {
        let b = kolkata();
        let mut prev = pixel_to_lonlat(0.0, 0.0, &b, 600, 400);
        for i in 1..=600 {
            let cur = pixel_to_lonlat(i as f64, i as f64 * 400.0 / 600.0, &b, 600, 400);
            assert!(cur.0 > prev.0);
            assert!(cur.1 < prev.1);
            prev = cur;
        }
    }

    #[test]
    fn test_out_of_range_extrapolates() {
        let b = kolkata();
        let (lon, lat) = pixel_to_lonlat(-600.0, 800.0, &b, 600, 400);
        assert!((lon - 88.0).abs() < 1e-9);
        assert!((lat - 22.3).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(matches!(
            GeoBounds::new(10.0, 10.0, 5.0, 1.0),
            Err(Error::InvalidBounds { .. })
        ));
        assert!(GeoBounds::new(0.0, 1.0, 0.0, 1.0).is_err());
        assert!(GeoBounds::new(f64::NAN, 1.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_bounds_deserialize_validates() {
        let ok: GeoBounds =
            serde_json::from_str(r#"{"west":-71,"east":-66.8,"north":-15,"south":-17.5}"#).unwrap();
        assert_eq!(ok.west(), -71.0);
        let bad = serde_json::from_str::<GeoBounds>(r#"{"west":1,"east":0,"north":1,"south":0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_from_slice() {
        let b = GeoBounds::from_slice(&[88.3, 88.6, 22.7, 22.5]).unwrap();
        assert_eq!(b.north(), 22.7);
        assert!(matches!(
            GeoBounds::from_slice(&[88.3, 88.6, 22.7]),
            Err(Error::BoundsArity(3))
        ));
        assert!(matches!(
            GeoBounds::from_slice(&[88.6, 88.3, 22.7, 22.5]),
            Err(Error::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_center_and_corner_labels() {
        let b = kolkata();
        let (lon, lat) = b.center();
        assert!((lon - 88.45).abs() < 1e-9);
        assert!((lat - 22.6).abs() < 1e-9);

        let t = GeoTransform::new(b, 600, 400);
        let (nw, se) = t.corner_labels(&PixelRect::new(0, 0, 600, 400));
        assert_eq!(nw, "NW: 88.30000, 22.70000");
        assert_eq!(se, "SE: 88.60000, 22.50000");
    }
}
