//! Picking session: the raster, its geographic bounds and everything picked so far.

use crate::collector::{FeatureCollector, PickedFeature};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::export::{self, CoordinateSpace, KmlOptions, RegionCorners};
use crate::geo::{GeoBounds, GeoTransform};
use crate::raster::{PixelRect, Raster, Rgb};
use crate::selection::color_mask::{compute_mask_with, ColorQuery};
use crate::selection::contour::{Contour, ContourExtractor};
use crate::selection::marching_squares::MarchingSquares;

/// Owns all mutable picking state. Operations take already-resolved pixel
/// positions or colors.
pub struct PickSession {
    raster: Raster,
    bounds: Option<GeoBounds>,
    config: SessionConfig,
    extractor: Box<dyn ContourExtractor>,
    collector: FeatureCollector,
    region: Option<PixelRect>,
}

impl PickSession {
    pub fn new(raster: Raster) -> Self {
        Self::with_config(raster, SessionConfig::default())
    }

    /// Session using `config`; contours come from marching squares.
    pub fn with_config(raster: Raster, config: SessionConfig) -> Self {
        let extractor = MarchingSquares::default().with_simplify(config.simplify_epsilon);
        Self {
            raster,
            bounds: config.bounds,
            config,
            extractor: Box::new(extractor),
            collector: FeatureCollector::new(),
            region: None,
        }
    }

    /// Replace the contour extraction strategy.
    pub fn with_extractor(mut self, extractor: impl ContourExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn bounds(&self) -> Option<&GeoBounds> {
        self.bounds.as_ref()
    }

    pub fn set_bounds(&mut self, bounds: GeoBounds) {
        log::info!(
            "geo bounds set: west={} east={} north={} south={}",
            bounds.west(),
            bounds.east(),
            bounds.north(),
            bounds.south()
        );
        self.bounds = Some(bounds);
    }

    /// Region used by the most recent [`pick_in_region`](Self::pick_in_region).
    pub fn region(&self) -> Option<&PixelRect> {
        self.region.as_ref()
    }

    pub fn features(&self) -> &[PickedFeature] {
        self.collector.list_features()
    }

    /// Color under `(x, y)`, averaged over `config.sample_size`.
    pub fn color_at(&self, x: usize, y: usize) -> Result<Rgb> {
        self.raster
            .sample_average(x, y, self.config.sample_size.max(1))
            .ok_or(Error::PixelOutOfRange { x, y })
    }

    fn query(&self, color: Rgb) -> ColorQuery {
        ColorQuery::new(color, self.config.tolerance).with_mode(self.config.match_mode)
    }

    /// Pick the color under `(x, y)` and store its contours across the whole raster.
    pub fn pick(&mut self, x: usize, y: usize, label: &str) -> Result<&PickedFeature> {
        let color = self.color_at(x, y)?;
        self.pick_color(color, label)
    }

    /// Store the contours of every region matching `color`.
    pub fn pick_color(&mut self, color: Rgb, label: &str) -> Result<&PickedFeature> {
        let label = checked_label(label)?;
        let mask = compute_mask_with(&self.raster, &self.query(color));
        let contours = self.extractor.extract_contours(&mask);
        log::info!(
            "picked {} as {:?}: {} pixels, {} contours",
            color.css(),
            label,
            mask.count(),
            contours.len()
        );
        Ok(self.push(color, label, contours))
    }

    /// Pick inside a region of interest only.
    ///
    /// `(x, y)` is in full-raster pixels and must lie inside `rect`. Contours
    /// are returned in full-raster pixels. The region is remembered for the
    /// KML corner labels.
    pub fn pick_in_region(
        &mut self,
        rect: PixelRect,
        x: usize,
        y: usize,
        label: &str,
    ) -> Result<&PickedFeature> {
        let label = checked_label(label)?;
        let rect = rect.clamp_to(self.raster.width(), self.raster.height());
        if rect.is_empty() || !rect.contains(x, y) {
            return Err(Error::PixelOutOfRange { x, y });
        }
        let color = self.color_at(x, y)?;

        let sub = self.raster.region(&rect);
        let mask = compute_mask_with(&sub, &self.query(color));
        let mut contours = self.extractor.extract_contours(&mask);
        for c in &mut contours {
            c.translate(rect.x as f64, rect.y as f64);
        }
        log::info!(
            "picked {} as {:?} in {:?}: {} contours",
            color.css(),
            label,
            rect,
            contours.len()
        );

        self.region = Some(rect);
        Ok(self.push(color, label, contours))
    }

    /// Store a feature computed elsewhere. The label is not checked.
    pub fn add_feature(&mut self, color: Rgb, label: &str, contours: Vec<Contour>) {
        self.collector.add_feature(color, label, contours);
    }

    fn push(&mut self, color: Rgb, label: &str, contours: Vec<Contour>) -> &PickedFeature {
        self.collector.add_feature(color, label, contours);
        let features = self.collector.list_features();
        &features[features.len() - 1]
    }

    /// Drop every picked feature and the remembered region.
    pub fn clear(&mut self) {
        log::debug!("clearing {} picked features", self.collector.len());
        self.collector.clear();
        self.region = None;
    }

    /// Pixel to lon/lat transform for this raster.
    pub fn transform(&self) -> Result<GeoTransform> {
        let bounds = self.bounds.ok_or(Error::NoGeoBounds)?;
        Ok(GeoTransform::new(bounds, self.raster.width(), self.raster.height()))
    }

    /// Export all features as GeoJSON.
    ///
    /// `Geographic` requires bounds; `Pixel` writes raw pixel coordinates.
    pub fn export_geojson(&self, space: CoordinateSpace) -> Result<String> {
        let transform = match space {
            CoordinateSpace::Geographic => Some(self.transform()?),
            CoordinateSpace::Pixel => None,
        };
        let features = export::flatten(self.features(), transform.as_ref());
        let doc = export::to_geojson(&features, space)?;
        log::info!("exported {} GeoJSON features ({:?})", features.len(), space);
        Ok(doc)
    }

    /// Export all features as geographic KML. Requires bounds.
    pub fn export_kml(&self) -> Result<String> {
        let transform = self.transform()?;
        let features = export::flatten(self.features(), Some(&transform));
        let corners = self.region.map(|r| RegionCorners {
            nw: transform.apply(r.x as f64, r.y as f64),
            se: transform.apply(r.right() as f64, r.bottom() as f64),
        });
        let options = KmlOptions {
            min_points: self.config.kml_min_points,
            ..KmlOptions::default()
        };
        let doc = export::to_kml(&features, corners.as_ref(), &options)?;
        log::info!("exported {} contours to KML", features.len());
        Ok(doc)
    }
}

fn checked_label(label: &str) -> Result<&str> {
    let label = label.trim();
    if label.is_empty() {
        return Err(Error::EmptyLabel);
    }
    Ok(label)
}
