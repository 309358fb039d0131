//! Error type shared by every stage of the picking pipeline.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid geographic bounds: west={west} east={east} north={north} south={south}")]
    InvalidBounds {
        west: f64,
        east: f64,
        north: f64,
        south: f64,
    },
    #[error("bounds need 4 values [west, east, north, south], got {0}")]
    BoundsArity(usize),
    #[error("color channel {channel} out of range: {value} (expected 0-255)")]
    InvalidColor { channel: char, value: i64 },
    #[error("malformed contour {contour}: {reason}")]
    MalformedContour { contour: usize, reason: String },
    #[error("geographic export requested but no bounds are configured")]
    NoGeoBounds,
    #[error("pixel ({x}, {y}) is outside the picking area")]
    PixelOutOfRange { x: usize, y: usize },
    #[error("feature label must not be empty")]
    EmptyLabel,
    #[error("invalid raster: {0}")]
    InvalidRaster(String),
    #[error("invalid configuration")]
    Config(#[source] serde_json::Error),
    #[error("failed to serialize document")]
    Serialize(#[source] serde_json::Error),
}
