//! Color-region selection.
//!
//! - **Color mask**: per-pixel tolerance match against a target color
//! - **Contour extraction**: pluggable mask-to-outline strategies, with
//!   marching squares as the default

pub mod color_mask;
pub mod contour;
pub mod marching_squares;

pub use color_mask::{compute_mask, compute_mask_with, compute_masks, ColorQuery, Mask, MatchMode};
pub use contour::{BoundaryTracer, Contour, ContourExtractor, NoContours};
pub use marching_squares::MarchingSquares;
