//! geopick
//!
//! Color-region picking on raster maps, pixel to lon/lat mapping, and
//! GeoJSON/KML export, with Python bindings via PyO3 and WASM bindings for
//! JavaScript.
//!
//! ## Image Format
//! Rasters are `ndarray` arrays in `(height, width, channels)` layout:
//! - **RGB**: (height, width, 3)
//! - **RGBA**: (height, width, 4) - alpha is carried but never matched
//!
//! ## Pipeline
//! 1. A color is resolved at a pixel ([`Raster::sample_average`])
//! 2. Every pixel within tolerance is selected ([`selection::compute_mask`])
//! 3. A [`ContourExtractor`] outlines the selection in pixel space
//! 4. The labelled result is stored ([`FeatureCollector`])
//! 5. On export, contours are optionally mapped through [`GeoTransform`]
//!    and written as GeoJSON or KML
//!
//! [`PickSession`] ties the steps together and owns all mutable state.

pub mod collector;
pub mod config;
pub mod error;
pub mod export;
pub mod geo;
pub mod raster;
pub mod selection;
pub mod session;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use collector::{FeatureCollector, PickedFeature};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use export::{CoordinateSpace, GeoFeature};
pub use geo::{pixel_to_lonlat, GeoBounds, GeoTransform};
pub use raster::{PixelRect, Raster, Rgb, Rgba};
pub use selection::{Contour, ContourExtractor, Mask};
pub use session::PickSession;

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray2, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::Error;
    use crate::export::CoordinateSpace;
    use crate::geo::GeoBounds;
    use crate::raster::{Raster, Rgb};
    use crate::selection::{self, Contour};
    use crate::{PickSession, SessionConfig};

    fn value_error(err: Error) -> PyErr {
        PyValueError::new_err(err.to_string())
    }

    fn raster_from(image: PyReadonlyArray3<'_, u8>) -> PyResult<Raster> {
        Raster::from_array(image.as_array().to_owned()).map_err(value_error)
    }

    // ========================================================================
    // Free functions
    // ========================================================================

    /// Select pixels within `tolerance` of (r, g, b) on every channel.
    ///
    /// Returns a boolean (height, width) array.
    #[pyfunction]
    #[pyo3(signature = (image, r, g, b, tolerance=30))]
    pub fn compute_mask<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        r: i64,
        g: i64,
        b: i64,
        tolerance: u32,
    ) -> PyResult<Bound<'py, PyArray2<bool>>> {
        let raster = raster_from(image)?;
        let color = Rgb::from_ints(r, g, b).map_err(value_error)?;
        let mask = selection::compute_mask(&raster, color, tolerance);
        Ok(mask.view().to_owned().into_pyarray(py))
    }

    /// Map a pixel position to (lon, lat) for an image covering the given extent.
    #[pyfunction]
    #[allow(clippy::too_many_arguments)]
    pub fn pixel_to_lonlat(
        x: f64,
        y: f64,
        west: f64,
        east: f64,
        north: f64,
        south: f64,
        width: usize,
        height: usize,
    ) -> PyResult<(f64, f64)> {
        let bounds = GeoBounds::new(west, east, north, south).map_err(value_error)?;
        Ok(crate::geo::pixel_to_lonlat(x, y, &bounds, width, height))
    }

    // ========================================================================
    // Session
    // ========================================================================

    #[pyclass(name = "PickSession", unsendable)]
    pub struct PyPickSession {
        inner: PickSession,
    }

    #[pymethods]
    impl PyPickSession {
        /// Create a session over an RGB/RGBA image; `config` is optional JSON.
        #[new]
        #[pyo3(signature = (image, config=None))]
        fn new(image: PyReadonlyArray3<'_, u8>, config: Option<&str>) -> PyResult<Self> {
            let raster = raster_from(image)?;
            let config = match config {
                Some(json) => SessionConfig::from_json(json).map_err(value_error)?,
                None => SessionConfig::default(),
            };
            Ok(Self {
                inner: PickSession::with_config(raster, config),
            })
        }

        fn set_bounds(&mut self, west: f64, east: f64, north: f64, south: f64) -> PyResult<()> {
            let bounds = GeoBounds::new(west, east, north, south).map_err(value_error)?;
            self.inner.set_bounds(bounds);
            Ok(())
        }

        /// Pick the color at (x, y). Returns the number of contours found.
        fn pick(&mut self, x: usize, y: usize, label: &str) -> PyResult<usize> {
            let feature = self.inner.pick(x, y, label).map_err(value_error)?;
            Ok(feature.contours().len())
        }

        /// Store externally computed contours given as [[[x, y], ...], ...].
        fn add_feature(
            &mut self,
            r: i64,
            g: i64,
            b: i64,
            label: &str,
            contours: Vec<Vec<Vec<f64>>>,
        ) -> PyResult<()> {
            let color = Rgb::from_ints(r, g, b).map_err(value_error)?;
            let contours = Contour::list_from_nested(&contours).map_err(value_error)?;
            self.inner.add_feature(color, label, contours);
            Ok(())
        }

        fn clear(&mut self) {
            self.inner.clear();
        }

        fn __len__(&self) -> usize {
            self.inner.features().len()
        }

        #[pyo3(signature = (geographic=true))]
        fn export_geojson(&self, geographic: bool) -> PyResult<String> {
            let space = if geographic {
                CoordinateSpace::Geographic
            } else {
                CoordinateSpace::Pixel
            };
            self.inner.export_geojson(space).map_err(value_error)
        }

        fn export_kml(&self) -> PyResult<String> {
            self.inner.export_kml().map_err(value_error)
        }
    }

    // ========================================================================
    // Module Definition
    // ========================================================================

    #[pymodule]
    pub fn geopick(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(compute_mask, m)?)?;
        m.add_function(wrap_pyfunction!(pixel_to_lonlat, m)?)?;
        m.add_class::<PyPickSession>()?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::geopick;
