//! Contours and the pluggable extraction capability.
//!
//! A [`Contour`] is an ordered list of `(x, y)` points. The
//! [`ContourExtractor`] trait turns a [`Mask`] into contours; callers pick a
//! strategy and treat an empty result as a normal outcome.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::selection::color_mask::Mask;

/// Ordered sequence of `(x, y)` points.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Contour {
    points: Vec<(f64, f64)>,
}

impl Contour {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// At least four points with the first repeated at the end.
    pub fn is_closed_ring(&self) -> bool {
        self.points.len() >= 4 && self.points.first() == self.points.last()
    }

    /// Repeat the first point at the end unless it is already there.
    pub fn close(&mut self) {
        if let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) {
            if first != last {
                self.points.push(first);
            }
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.0 += dx;
            p.1 += dy;
        }
    }

    /// Validate a nested `[[x, y], ...]` list.
    ///
    /// `index` identifies the contour in the error.
    pub fn from_nested(index: usize, nested: &[Vec<f64>]) -> Result<Self> {
        nested
            .iter()
            .enumerate()
            .map(|(i, pair)| match pair.as_slice() {
                [x, y] if x.is_finite() && y.is_finite() => Ok((*x, *y)),
                [_, _] => Err(malformed(index, format!("point {i} is not finite"))),
                other => Err(malformed(
                    index,
                    format!("point {i} has {} values, expected 2", other.len()),
                )),
            })
            .collect::<Result<Vec<_>>>()
            .map(Contour::new)
    }

    /// Validate a list of nested contours, indexing errors by position.
    pub fn list_from_nested(nested: &[Vec<Vec<f64>>]) -> Result<Vec<Self>> {
        nested
            .iter()
            .enumerate()
            .map(|(i, c)| Self::from_nested(i, c))
            .collect()
    }

    /// Validate a JSON `[[x, y], ...]` array.
    pub fn from_value(index: usize, value: &Value) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| malformed(index, "expected an array of points".into()))?;
        let mut nested = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let pair = item
                .as_array()
                .ok_or_else(|| malformed(index, format!("point {i} is not an array")))?;
            let coords = pair
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| malformed(index, format!("point {i} has a non-numeric value")))?;
            nested.push(coords);
        }
        Self::from_nested(index, &nested)
    }
}

impl FromIterator<(f64, f64)> for Contour {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn malformed(contour: usize, reason: String) -> Error {
    Error::MalformedContour { contour, reason }
}

/// Parse a JSON document holding a list of contours.
pub fn contours_from_json(json: &str) -> Result<Vec<Contour>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| malformed(0, format!("invalid JSON: {e}")))?;
    let list = value
        .as_array()
        .ok_or_else(|| malformed(0, "expected an array of contours".into()))?;
    list.iter()
        .enumerate()
        .map(|(i, v)| Contour::from_value(i, v))
        .collect()
}

/// Turns a selection mask into contours in the mask's pixel space.
pub trait ContourExtractor {
    fn extract_contours(&self, mask: &Mask) -> Vec<Contour>;
}

/// Extractor that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoContours;

impl ContourExtractor for NoContours {
    fn extract_contours(&self, _mask: &Mask) -> Vec<Contour> {
        Vec::new()
    }
}

/// Moore-neighbour boundary tracing on pixel centres.
///
/// Produces one closed ring per traced boundary, with points at `x + 0.5,
/// y + 0.5`. Boundaries with fewer than `min_points` pixels are dropped.
#[derive(Clone, Copy, Debug)]
pub struct BoundaryTracer {
    pub min_points: usize,
}

impl Default for BoundaryTracer {
    fn default() -> Self {
        Self { min_points: 3 }
    }
}

impl ContourExtractor for BoundaryTracer {
    fn extract_contours(&self, mask: &Mask) -> Vec<Contour> {
        let (width, height) = (mask.width() as i64, mask.height() as i64);
        let mut contours = Vec::new();
        let mut visited: HashSet<(i64, i64)> = HashSet::new();

        // Raster-order scan; each untraced boundary pixel starts a new contour
        for y in 0..height {
            for x in 0..width {
                if is_boundary(mask, x, y) && !visited.contains(&(x, y)) {
                    let mut contour = trace_boundary(mask, x, y, &mut visited);
                    if contour.len() >= self.min_points.max(1) {
                        contour.close();
                        contours.push(contour);
                    }
                }
            }
        }

        log::debug!("boundary tracer found {} contours", contours.len());
        contours
    }
}

/// Selected with at least one unselected 4-neighbour.
#[inline]
fn is_boundary(mask: &Mask, x: i64, y: i64) -> bool {
    mask.get(x, y)
        && (!mask.get(x - 1, y) || !mask.get(x + 1, y) || !mask.get(x, y - 1) || !mask.get(x, y + 1))
}

/// Clockwise from right.
const DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

fn trace_boundary(
    mask: &Mask,
    start_x: i64,
    start_y: i64,
    visited: &mut HashSet<(i64, i64)>,
) -> Contour {
    let mut points = Vec::new();

    // Find initial backtrack direction: first unselected neighbour
    let mut dir = DIRECTIONS
        .iter()
        .position(|&(dx, dy)| !mask.get(start_x + dx, start_y + dy))
        .unwrap_or(0);

    let (mut x, mut y) = (start_x, start_y);
    // Guard against cycles that never return to the start
    let max_steps = mask.width() * mask.height() * 2;
    let mut steps = 0;

    loop {
        if visited.insert((x, y)) {
            points.push((x as f64 + 0.5, y as f64 + 0.5));
        }

        // resume the clockwise sweep just past the backtrack neighbour
        let search_start = (dir + 5) % 8;
        let mut next = None;
        for i in 0..8 {
            let d = (search_start + i) % 8;
            let (dx, dy) = DIRECTIONS[d];
            let (nx, ny) = (x + dx, y + dy);
            if !mask.get(nx, ny) {
                continue;
            }
            // Back to start - contour complete
            if nx == start_x && ny == start_y && steps > 0 {
                return Contour::new(points);
            }
            if is_boundary(mask, nx, ny) {
                next = Some((nx, ny, d));
                break;
            }
        }

        match next {
            Some((nx, ny, d)) => {
                x = nx;
                y = ny;
                dir = d;
            }
            // Isolated pixel
            None => break,
        }

        steps += 1;
        if steps >= max_steps {
            break;
        }
    }

    Contour::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_contours_is_empty() {
        let mask = Mask::from_fn(4, 4, |_, _| true);
        assert!(NoContours.extract_contours(&mask).is_empty());
    }

    #[test]
    fn test_tracer_empty_mask() {
        let mask = Mask::new(10, 10);
        assert!(BoundaryTracer::default().extract_contours(&mask).is_empty());
    }

    #[test]
    fn test_tracer_rectangle_is_closed_ring() {
        let mask = Mask::from_fn(10, 10, |x, y| (3..7).contains(&x) && (2..5).contains(&y));
        let contours = BoundaryTracer::default().extract_contours(&mask);
        assert_eq!(contours.len(), 1);
        let ring = &contours[0];
        assert!(ring.is_closed_ring());
        for &(x, y) in ring.points() {
            assert!((3.5..=6.5).contains(&x));
            assert!((2.5..=4.5).contains(&y));
        }
    }

    #[test]
    fn test_tracer_min_points_filters_specks() {
        let mask = Mask::from_fn(5, 5, |x, y| x == 2 && y == 2);
        assert!(BoundaryTracer::default().extract_contours(&mask).is_empty());
        let loose = BoundaryTracer { min_points: 1 };
        assert_eq!(loose.extract_contours(&mask).len(), 1);
    }

    #[test]
    fn test_from_nested_validates_pairs() {
        let ok = Contour::from_nested(0, &[vec![0.0, 0.0], vec![1.0, 2.0]]).unwrap();
        assert_eq!(ok.points(), &[(0.0, 0.0), (1.0, 2.0)]);

        let err = Contour::from_nested(3, &[vec![0.0, 0.0], vec![1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, Error::MalformedContour { contour: 3, .. }));
        assert!(Contour::from_nested(0, &[vec![f64::NAN, 0.0]]).is_err());
    }

    #[test]
    fn test_list_from_nested_reports_failing_contour() {
        let ok = vec![vec![vec![0.0, 0.0], vec![1.0, 1.0]], vec![vec![5.0, 5.0]]];
        assert_eq!(Contour::list_from_nested(&ok).unwrap().len(), 2);

        let bad = vec![vec![vec![0.0, 0.0]], vec![vec![1.0, 1.0], vec![2.0]]];
        assert!(matches!(
            Contour::list_from_nested(&bad),
            Err(Error::MalformedContour { contour: 1, .. })
        ));
    }

    #[test]
    fn test_contours_from_json() {
        let contours = contours_from_json("[[[0,0],[10,0],[10,10],[0,10],[0,0]]]").unwrap();
        assert_eq!(contours.len(), 1);
        assert!(contours[0].is_closed_ring());

        assert!(contours_from_json("[[[0,0],[1]]]").is_err());
        assert!(contours_from_json("[[0,0]]").is_err());
        assert!(contours_from_json(r#"[[["a",0]]]"#).is_err());
        assert!(contours_from_json("{}").is_err());
    }

    #[test]
    fn test_close_and_translate() {
        let mut c = Contour::new(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert!(!c.is_closed_ring());
        c.close();
        assert!(c.is_closed_ring());
        c.close();
        assert_eq!(c.len(), 4);
        c.translate(5.0, 2.0);
        assert_eq!(c.points()[0], (5.0, 2.0));
    }
}
