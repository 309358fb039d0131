//! Session configuration.
//!
//! Loaded from JSON; every field is optional and falls back to the
//! defaults below.
//!
//! ```json
//! {
//!   "bounds": { "west": 88.3, "east": 88.6, "north": 22.7, "south": 22.5 },
//!   "tolerance": 30,
//!   "sample_size": 5,
//!   "match_mode": "channel",
//!   "kml_min_points": 6,
//!   "simplify_epsilon": 0.0
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::GeoBounds;
use crate::selection::color_mask::MatchMode;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Geographic extent of the whole raster, if known up front.
    pub bounds: Option<GeoBounds>,
    /// Color match tolerance; channel windows clamp to 0-255.
    pub tolerance: u32,
    /// Side of the square patch averaged when picking a color (1 = single pixel).
    pub sample_size: usize,
    pub match_mode: MatchMode,
    /// KML skips contours with fewer points.
    pub kml_min_points: usize,
    /// Douglas-Peucker epsilon for the default extractor; 0 disables.
    pub simplify_epsilon: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bounds: None,
            tolerance: 30,
            sample_size: 1,
            match_mode: MatchMode::Channel,
            kml_min_points: 6,
            simplify_epsilon: 0.0,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json).map_err(Error::Config)?;
        log::debug!("loaded session config: {:?}", config);
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::Serialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(SessionConfig::from_json("{}").unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let c = SessionConfig::from_json(
            r#"{"tolerance": 12, "match_mode": "euclidean",
                "bounds": {"west": -71, "east": -66.8, "north": -15, "south": -17.5}}"#,
        )
        .unwrap();
        assert_eq!(c.tolerance, 12);
        assert_eq!(c.match_mode, MatchMode::Euclidean);
        assert_eq!(c.kml_min_points, 6);
        assert_eq!(c.bounds.unwrap().east(), -66.8);
    }

    #[test]
    fn test_tolerance_beyond_channel_range() {
        let c = SessionConfig::from_json(r#"{"tolerance": 300, "match_mode": "euclidean"}"#)
            .unwrap();
        assert_eq!(c.tolerance, 300);
        assert_eq!(c.match_mode, MatchMode::Euclidean);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            SessionConfig::from_json(r#"{"tolerance": -1}"#),
            Err(Error::Config(_))
        ));
        assert!(SessionConfig::from_json(
            r#"{"bounds": {"west": 5, "east": 1, "north": 2, "south": 0}}"#
        )
        .is_err());
    }

    #[test]
    fn test_round_trip() {
        let mut c = SessionConfig::default();
        c.bounds = Some(GeoBounds::new(1.0, 2.0, 4.0, 3.0).unwrap());
        let back = SessionConfig::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(back, c);
    }
}
