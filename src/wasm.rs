//! WebAssembly exports.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Images are
//! flat RGBA byte buffers (length = width * height * 4); masks are flat
//! 0/255 byte buffers (length = width * height). Contours travel as JSON
//! `[[[x, y], ...], ...]`.

use wasm_bindgen::prelude::*;

use crate::collector::PickedFeature;
use crate::error::Error;
use crate::export::{self, CoordinateSpace};
use crate::geo::{GeoBounds, GeoTransform};
use crate::raster::{Raster, Rgb};
use crate::selection::contour::{contours_from_json, ContourExtractor};
use crate::selection::marching_squares::MarchingSquares;
use crate::selection::{compute_mask, Mask};

fn js_error(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ============================================================================
// Masking
// ============================================================================

/// Select pixels within `tolerance` of (r, g, b).
///
/// # Returns
/// Flat mask, 255 = selected, 0 = not selected
#[wasm_bindgen]
pub fn compute_mask_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    r: u8,
    g: u8,
    b: u8,
    tolerance: u32,
) -> Result<Vec<u8>, JsValue> {
    let raster = Raster::from_raw(width, height, 4, data.to_vec()).map_err(js_error)?;
    let mask = compute_mask(&raster, Rgb::new(r, g, b), tolerance);
    Ok(mask.to_u8().into_raw_vec_and_offset().0)
}

/// Outline a flat 0/255 mask with marching squares.
///
/// # Returns
/// JSON array of contours in pixel coordinates
#[wasm_bindgen]
pub fn extract_contours_wasm(mask: &[u8], width: usize, height: usize) -> Result<String, JsValue> {
    let mask = Mask::from_bytes(width, height, mask).map_err(js_error)?;
    let contours = MarchingSquares::default().extract_contours(&mask);
    serde_json::to_string(&contours).map_err(|e| js_error(Error::Serialize(e)))
}

// ============================================================================
// Geo
// ============================================================================

/// Map a pixel position to `[lon, lat]`.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn pixel_to_lonlat_wasm(
    x: f64,
    y: f64,
    west: f64,
    east: f64,
    north: f64,
    south: f64,
    width: usize,
    height: usize,
) -> Result<Vec<f64>, JsValue> {
    let bounds = GeoBounds::new(west, east, north, south).map_err(js_error)?;
    let (lon, lat) = crate::geo::pixel_to_lonlat(x, y, &bounds, width, height);
    Ok(vec![lon, lat])
}

/// Export contours picked for one color as a GeoJSON FeatureCollection.
///
/// When `bounds` (`[west, east, north, south]`) is given, coordinates are
/// mapped to lon/lat for a `width × height` raster; otherwise they stay in
/// pixel space.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn contours_to_geojson_wasm(
    contours_json: &str,
    r: u8,
    g: u8,
    b: u8,
    label: &str,
    bounds: Option<Vec<f64>>,
    width: usize,
    height: usize,
) -> Result<String, JsValue> {
    let contours = contours_from_json(contours_json).map_err(js_error)?;
    let picked = [PickedFeature::new(Rgb::new(r, g, b), label, contours)];

    let transform = match bounds.as_deref() {
        Some(values) => {
            let bounds = GeoBounds::from_slice(values).map_err(js_error)?;
            Some(GeoTransform::new(bounds, width, height))
        }
        None => None,
    };
    let space = if transform.is_some() {
        CoordinateSpace::Geographic
    } else {
        CoordinateSpace::Pixel
    };

    let features = export::flatten(&picked, transform.as_ref());
    export::to_geojson(&features, space).map_err(js_error)
}
