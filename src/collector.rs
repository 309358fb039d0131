//! Ordered store of picked features.

use crate::raster::Rgb;
use crate::selection::contour::Contour;

/// A labelled color pick and the contours found for it.
#[derive(Clone, Debug, PartialEq)]
pub struct PickedFeature {
    color: Rgb,
    label: String,
    contours: Vec<Contour>,
}

impl PickedFeature {
    pub fn new(color: Rgb, label: impl Into<String>, contours: Vec<Contour>) -> Self {
        Self {
            color,
            label: label.into(),
            contours,
        }
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }
}

/// Features in pick order. No deduplication, no sorting, no label checks.
#[derive(Clone, Debug, Default)]
pub struct FeatureCollector {
    features: Vec<PickedFeature>,
}

impl FeatureCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_feature(&mut self, color: Rgb, label: impl Into<String>, contours: Vec<Contour>) {
        self.features.push(PickedFeature::new(color, label, contours));
    }

    pub fn list_features(&self) -> &[PickedFeature] {
        &self.features
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total number of contours across all features.
    pub fn contour_count(&self) -> usize {
        self.features.iter().map(|f| f.contours.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_and_duplicates() {
        let mut c = FeatureCollector::new();
        let red = Rgb::new(255, 0, 0);
        c.add_feature(red, "water", vec![]);
        c.add_feature(Rgb::new(0, 0, 255), "forest", vec![Contour::default()]);
        c.add_feature(red, "water", vec![]);

        let labels: Vec<&str> = c.list_features().iter().map(|f| f.label()).collect();
        assert_eq!(labels, ["water", "forest", "water"]);
        assert_eq!(c.contour_count(), 1);
    }

    #[test]
    fn test_collector_does_not_validate_labels() {
        let mut c = FeatureCollector::new();
        c.add_feature(Rgb::new(1, 2, 3), "", vec![]);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut c = FeatureCollector::new();
        c.add_feature(Rgb::new(1, 2, 3), "a", vec![]);
        c.clear();
        assert!(c.is_empty());
        assert!(c.list_features().is_empty());
    }
}
