//! Color masking by tolerance.
//!
//! Classifies every pixel of a raster against a target color. Alpha is
//! ignored.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::{PixelRect, Raster, Rgb};

/// How a pixel is compared with the target color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Every channel lies in `[c - tol, c + tol]`, clamped to 0-255.
    #[default]
    Channel,
    /// RGB Euclidean distance is at most `tol`.
    Euclidean,
}

/// One color query against a raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorQuery {
    pub color: Rgb,
    /// Any non-negative value; the channel window is clamped to 0-255.
    pub tolerance: u32,
    pub mode: MatchMode,
}

impl ColorQuery {
    pub fn new(color: Rgb, tolerance: u32) -> Self {
        Self {
            color,
            tolerance,
            mode: MatchMode::Channel,
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    fn matcher(&self) -> Matcher {
        let target = self.color.channels();
        match self.mode {
            MatchMode::Channel => {
                // a tolerance of 255 or more already spans every channel value
                let tol = self.tolerance.min(255) as u8;
                Matcher::Window {
                    lower: target.map(|c| c.saturating_sub(tol)),
                    upper: target.map(|c| c.saturating_add(tol)),
                }
            }
            MatchMode::Euclidean => Matcher::Distance {
                target: target.map(i32::from),
                max_sq: u64::from(self.tolerance).pow(2),
            },
        }
    }
}

/// Precomputed per-query comparison.
enum Matcher {
    Window { lower: [u8; 3], upper: [u8; 3] },
    Distance { target: [i32; 3], max_sq: u64 },
}

impl Matcher {
    #[inline]
    fn matches(&self, px: [u8; 3]) -> bool {
        match self {
            Matcher::Window { lower, upper } => (0..3).all(|c| px[c] >= lower[c] && px[c] <= upper[c]),
            Matcher::Distance { target, max_sq } => {
                let dist_sq: i32 = (0..3)
                    .map(|c| {
                        let d = i32::from(px[c]) - target[c];
                        d * d
                    })
                    .sum();
                dist_sq as u64 <= *max_sq
            }
        }
    }
}

/// Binary selection mask, `(height, width)`, congruent to its raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    data: Array2<bool>,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: Array2::from_elem((height, width), false),
        }
    }

    pub fn from_array(data: Array2<bool>) -> Self {
        Self { data }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        Self {
            data: Array2::from_shape_fn((height, width), |(y, x)| f(x, y)),
        }
    }

    /// Mask from a flat row-major byte buffer; any non-zero byte is selected.
    pub fn from_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self> {
        let expected = width.checked_mul(height).filter(|&n| n == bytes.len());
        if expected.is_none() {
            return Err(Error::InvalidRaster(format!(
                "mask has {} bytes, expected {} x {}",
                bytes.len(),
                width,
                height
            )));
        }
        Ok(Self::from_fn(width, height, |x, y| bytes[y * width + x] > 0))
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// Whether `(x, y)` is selected; out of bounds reads as unselected.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.data.get((y as usize, x as usize)).copied().unwrap_or(false)
    }

    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.data.view()
    }

    /// Number of selected pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Tight bounding box of the selected pixels.
    pub fn bounds(&self) -> Option<PixelRect> {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut any = false;

        for ((y, x), &v) in self.data.indexed_iter() {
            if v {
                any = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }

        any.then(|| PixelRect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Selection as 0/255 bytes.
    pub fn to_u8(&self) -> Array2<u8> {
        self.data.mapv(|v| if v { 255 } else { 0 })
    }
}

/// Select every pixel within `tolerance` of `target` on all three channels.
///
/// # Arguments
/// * `raster` - RGB or RGBA image
/// * `target` - Color to match
/// * `tolerance` - Per-channel tolerance; the window is clamped to 0-255
///
/// # Returns
/// Mask with the raster's dimensions
pub fn compute_mask(raster: &Raster, target: Rgb, tolerance: u32) -> Mask {
    compute_mask_with(raster, &ColorQuery::new(target, tolerance))
}

/// Select pixels matching a single query.
pub fn compute_mask_with(raster: &Raster, query: &ColorQuery) -> Mask {
    let matcher = query.matcher();
    let view = raster.view();
    let (height, width, _) = view.dim();

    let mut mask = Array2::from_elem((height, width), false);
    for y in 0..height {
        for x in 0..width {
            mask[[y, x]] = matcher.matches([view[[y, x, 0]], view[[y, x, 1]], view[[y, x, 2]]]);
        }
    }
    Mask { data: mask }
}

/// Evaluate several queries in a single traversal of the raster.
///
/// Returns one mask per query, in query order.
pub fn compute_masks(raster: &Raster, queries: &[ColorQuery]) -> Vec<Mask> {
    let matchers: Vec<Matcher> = queries.iter().map(ColorQuery::matcher).collect();
    let view = raster.view();
    let (height, width, _) = view.dim();

    let mut masks: Vec<Array2<bool>> = queries
        .iter()
        .map(|_| Array2::from_elem((height, width), false))
        .collect();

    for y in 0..height {
        for x in 0..width {
            let px = [view[[y, x, 0]], view[[y, x, 1]], view[[y, x, 2]]];
            for (mask, matcher) in masks.iter_mut().zip(&matchers) {
                mask[[y, x]] = matcher.matches(px);
            }
        }
    }

    masks.into_iter().map(|data| Mask { data }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster_of(pixels: &[Rgb], width: usize) -> Raster {
        let height = pixels.len() / width;
        let data = pixels.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
        Raster::from_raw(width, height, 3, data).unwrap()
    }

    #[test]
    fn test_zero_tolerance_exact_only() {
        let target = Rgb::new(100, 100, 100);
        let r = raster_of(
            &[target, Rgb::new(101, 100, 100), Rgb::new(100, 100, 99), target],
            2,
        );
        let mask = compute_mask(&r, target, 0);
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(!mask.get(0, 1));
        assert!(mask.get(1, 1));
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn test_tolerance_window() {
        let r = raster_of(&[Rgb::new(120, 90, 110), Rgb::new(140, 100, 100)], 2);
        let mask = compute_mask(&r, Rgb::new(100, 100, 100), 30);
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
    }

    #[test]
    fn test_window_clamps_at_extremes() {
        let r = raster_of(&[Rgb::new(0, 255, 0), Rgb::new(31, 255, 0)], 2);
        let mask = compute_mask(&r, Rgb::new(10, 250, 5), 20);
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
    }

    #[test]
    fn test_alpha_ignored() {
        let r = Raster::from_raw(2, 1, 4, vec![50, 60, 70, 0, 50, 60, 70, 255]).unwrap();
        let mask = compute_mask(&r, Rgb::new(50, 60, 70), 0);
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn test_euclidean_mode() {
        // (120,90,110) is ~24.5 away from (100,100,100); (118,118,100) is ~25.5
        let r = raster_of(&[Rgb::new(120, 90, 110), Rgb::new(118, 118, 100)], 2);
        let q = ColorQuery::new(Rgb::new(100, 100, 100), 25).with_mode(MatchMode::Euclidean);
        let mask = compute_mask_with(&r, &q);
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
    }

    #[test]
    fn test_tolerance_above_channel_range() {
        let r = raster_of(&[Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)], 2);
        assert_eq!(compute_mask(&r, Rgb::new(128, 128, 128), 300).count(), 2);
        assert_eq!(compute_mask(&r, Rgb::new(0, 0, 0), u32::MAX).count(), 2);

        // black to white is ~441.7 apart in RGB space
        let near = ColorQuery::new(Rgb::new(0, 0, 0), 441).with_mode(MatchMode::Euclidean);
        let far = ColorQuery::new(Rgb::new(0, 0, 0), 442).with_mode(MatchMode::Euclidean);
        assert_eq!(compute_mask_with(&r, &near).count(), 1);
        assert_eq!(compute_mask_with(&r, &far).count(), 2);
        let huge = ColorQuery::new(Rgb::new(0, 0, 0), u32::MAX).with_mode(MatchMode::Euclidean);
        assert_eq!(compute_mask_with(&r, &huge).count(), 2);
    }

    #[test]
    fn test_batch_matches_individual() {
        let pixels: Vec<Rgb> = (0..16u8).map(|i| Rgb::new(i * 16, 255 - i * 16, i)).collect();
        let r = raster_of(&pixels, 4);
        let queries = [
            ColorQuery::new(Rgb::new(0, 255, 0), 40),
            ColorQuery::new(Rgb::new(128, 128, 8), 20),
            ColorQuery::new(Rgb::new(240, 15, 15), 0),
        ];
        let batch = compute_masks(&r, &queries);
        assert_eq!(batch.len(), 3);
        for (mask, q) in batch.iter().zip(&queries) {
            assert_eq!(mask, &compute_mask_with(&r, q));
        }
    }

    #[test]
    fn test_mask_from_bytes() {
        let mask = Mask::from_bytes(3, 2, &[0, 255, 0, 1, 0, 0]).unwrap();
        assert!(mask.get(1, 0));
        assert!(mask.get(0, 1));
        assert_eq!(mask.count(), 2);
        assert!(matches!(
            Mask::from_bytes(3, 2, &[0; 5]),
            Err(Error::InvalidRaster(_))
        ));
        assert!(Mask::from_bytes(usize::MAX, 2, &[]).is_err());
    }

    #[test]
    fn test_mask_bounds() {
        let mask = Mask::from_fn(10, 10, |x, y| (3..7).contains(&x) && (2..5).contains(&y));
        assert_eq!(mask.bounds(), Some(PixelRect::new(3, 2, 4, 3)));
        assert_eq!(mask.count(), 12);
        assert!(Mask::new(4, 4).bounds().is_none());
        assert!(!mask.get(-1, 3));
        assert!(!mask.get(3, 10));
    }
}
