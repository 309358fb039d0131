//! KML output: one `LineString` placemark per contour.
//!
//! Optional region corners are written as `NW`/`SE` point placemarks.

use super::{validate, GeoFeature};
use crate::error::Result;

/// Corners of the picked region, already in output coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionCorners {
    pub nw: (f64, f64),
    pub se: (f64, f64),
}

#[derive(Clone, Copy, Debug)]
pub struct KmlOptions {
    /// Contours with fewer points are skipped. A `LineString` needs at least
    /// two, so lower values act as 2.
    pub min_points: usize,
    pub line_width: u32,
}

impl Default for KmlOptions {
    fn default() -> Self {
        Self {
            min_points: 6,
            line_width: 2,
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn corner_placemark(out: &mut Vec<String>, tag: &str, (lon, lat): (f64, f64)) {
    out.push("<Placemark>".into());
    out.push(format!("<name>{tag}: {lon:.5}, {lat:.5}</name>"));
    out.push(format!("<Point><coordinates>{lon},{lat},0</coordinates></Point>"));
    out.push("</Placemark>".into());
}

/// Serialize features to a KML document.
pub fn to_kml(
    features: &[GeoFeature],
    corners: Option<&RegionCorners>,
    options: &KmlOptions,
) -> Result<String> {
    let min_points = options.min_points.max(2);
    let written: Vec<&GeoFeature> = features
        .iter()
        .filter(|f| f.contour.len() >= min_points)
        .collect();
    validate(written.iter().copied())?;

    let mut kml = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#.to_string(),
        "<Document>".to_string(),
    ];

    if let Some(c) = corners {
        corner_placemark(&mut kml, "NW", c.nw);
        corner_placemark(&mut kml, "SE", c.se);
    }

    for f in &written {
        let coords: Vec<String> = f
            .contour
            .points()
            .iter()
            .map(|(lon, lat)| format!("{lon},{lat},0"))
            .collect();
        kml.extend([
            "<Placemark>".to_string(),
            format!("<name>{}</name>", escape(&f.label)),
            "<Style><LineStyle>".to_string(),
            format!(
                "<color>{}</color><width>{}</width>",
                f.color.kml_hex(),
                options.line_width
            ),
            "</LineStyle></Style>".to_string(),
            "<LineString><tessellate>1</tessellate><coordinates>".to_string(),
            coords.join(" "),
            "</coordinates></LineString>".to_string(),
            "</Placemark>".to_string(),
        ]);
    }

    if written.len() < features.len() {
        log::debug!(
            "kml: skipped {} contours shorter than {} points",
            features.len() - written.len(),
            min_points
        );
    }

    kml.push("</Document></kml>".to_string());
    Ok(kml.join("\n"))
}
