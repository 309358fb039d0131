//! Raster access: owned RGB/RGBA pixel grids and pixel-space rectangles.
//!
//! Images use the `(height, width, channels)` layout with 3 or 4 `u8`
//! channels. Alpha, when present, is carried along but never consulted by
//! color matching.

use ndarray::{s, Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from wider integers, rejecting channels outside 0-255.
    pub fn from_ints(r: i64, g: i64, b: i64) -> Result<Self> {
        fn channel(name: char, value: i64) -> Result<u8> {
            u8::try_from(value).map_err(|_| Error::InvalidColor {
                channel: name,
                value,
            })
        }
        Ok(Self::new(channel('r', r)?, channel('g', g)?, channel('b', b)?))
    }

    /// CSS form used in GeoJSON properties, e.g. `rgb(255,0,0)`.
    pub fn css(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    /// Opaque KML color, `aabbggrr` hex.
    pub fn kml_hex(&self) -> String {
        format!("ff{:02x}{:02x}{:02x}", self.b, self.g, self.r)
    }

    #[inline]
    pub(crate) fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// A pixel sample including alpha (255 for RGB rasters).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }
}

/// Axis-aligned pixel rectangle. NW corner is `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelRect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by two corner points in any order.
    pub fn from_corners(x1: usize, y1: usize, x2: usize, y2: usize) -> Self {
        Self::new(x1.min(x2), y1.min(y2), x1.abs_diff(x2), y1.abs_diff(y2))
    }

    /// Intersection with a `width × height` raster.
    pub fn clamp_to(&self, width: usize, height: usize) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self::new(
            x,
            y,
            self.width.min(width - x),
            self.height.min(height - y),
        )
    }

    /// Exclusive right edge, saturating at `usize::MAX`.
    pub fn right(&self) -> usize {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `usize::MAX`.
    pub fn bottom(&self) -> usize {
        self.y.saturating_add(self.height)
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Owned RGB or RGBA image.
#[derive(Clone, Debug)]
pub struct Raster {
    data: Array3<u8>,
}

impl Raster {
    /// Wrap an `(height, width, channels)` array with 3 or 4 channels.
    pub fn from_array(data: Array3<u8>) -> Result<Self> {
        let channels = data.dim().2;
        if channels != 3 && channels != 4 {
            return Err(Error::InvalidRaster(format!(
                "expected 3 or 4 channels, got {channels}"
            )));
        }
        Ok(Self { data })
    }

    /// Build from an interleaved row-major buffer.
    pub fn from_raw(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        let array = Array3::from_shape_vec((height, width, channels), data).map_err(|e| {
            Error::InvalidRaster(format!("{width}x{height}x{channels} buffer: {e}"))
        })?;
        Self::from_array(array)
    }

    /// Solid-color RGB raster.
    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        let mut data = Array3::<u8>::zeros((height, width, 3));
        for mut px in data.lanes_mut(ndarray::Axis(2)) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
        }
        Self { data }
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// Pixel at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let a = if self.channels() == 4 {
            self.data[[y, x, 3]]
        } else {
            255
        };
        Some(Rgba {
            r: self.data[[y, x, 0]],
            g: self.data[[y, x, 1]],
            b: self.data[[y, x, 2]],
            a,
        })
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        self.data[[y, x, 0]] = color.r;
        self.data[[y, x, 1]] = color.g;
        self.data[[y, x, 2]] = color.b;
    }

    /// Copy of the sub-image covered by `rect`, clamped to the raster.
    pub fn region(&self, rect: &PixelRect) -> Raster {
        let r = rect.clamp_to(self.width(), self.height());
        let data = self
            .data
            .slice(s![r.y..r.y + r.height, r.x..r.x + r.width, ..])
            .to_owned();
        Raster { data }
    }

    /// Mean color of the `size × size` patch centred on `(x, y)`.
    ///
    /// The patch is clipped at the raster edges; channel means are truncated.
    /// Returns `None` when `(x, y)` lies outside the raster.
    pub fn sample_average(&self, x: usize, y: usize, size: usize) -> Option<Rgb> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let half = size / 2;
        let x0 = x.saturating_sub(half);
        let y0 = y.saturating_sub(half);
        let x1 = (x + half + 1).min(self.width());
        let y1 = (y + half + 1).min(self.height());

        let patch = self.data.slice(s![y0..y1, x0..x1, ..3]);
        let mut sums = [0u64; 3];
        for px in patch.lanes(ndarray::Axis(2)) {
            for c in 0..3 {
                sums[c] += px[c] as u64;
            }
        }
        let n = ((y1 - y0) * (x1 - x0)) as u64;
        Some(Rgb::new(
            (sums[0] / n) as u8,
            (sums[1] / n) as u8,
            (sums[2] / n) as u8,
        ))
    }
}
