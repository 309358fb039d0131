//! Marching Squares iso-line extraction with optional simplification.
//!
//! This is the default [`ContourExtractor`]. The mask is sampled at pixel
//! positions, so contour points lie between pixel indices:
//! - **Marching Squares**: one iso-line per region boundary at `level`
//! - **Douglas-Peucker**: optional polyline simplification
//!
//! Regions touching the raster edge produce open polylines; interior
//! regions produce closed rings with the first point repeated at the end.

use std::collections::{HashMap, VecDeque};

use crate::selection::color_mask::Mask;
use crate::selection::contour::{Contour, ContourExtractor};

type Point = (f64, f64);

#[derive(Clone, Copy, Debug)]
pub struct MarchingSquares {
    /// Iso level between unselected (0.0) and selected (1.0).
    pub level: f64,
    /// Douglas-Peucker epsilon in pixels; 0 disables simplification.
    pub simplify_epsilon: f64,
}

impl Default for MarchingSquares {
    fn default() -> Self {
        Self {
            level: 0.5,
            simplify_epsilon: 0.0,
        }
    }
}

impl MarchingSquares {
    pub fn with_simplify(mut self, epsilon: f64) -> Self {
        self.simplify_epsilon = epsilon;
        self
    }
}

impl ContourExtractor for MarchingSquares {
    fn extract_contours(&self, mask: &Mask) -> Vec<Contour> {
        let segments = march(mask, self.level);
        let mut contours = connect_segments(&segments);

        if self.simplify_epsilon > 0.0 {
            for contour in &mut contours {
                simplify(contour, self.simplify_epsilon);
            }
        }

        log::debug!(
            "marching squares: {} segments -> {} contours",
            segments.len(),
            contours.len()
        );
        contours
    }
}

/// Emit one or two boundary segments per 2x2 cell.
fn march(mask: &Mask, level: f64) -> Vec<(Point, Point)> {
    let (width, height) = (mask.width(), mask.height());
    if width < 2 || height < 2 {
        return Vec::new();
    }

    let value = |x: usize, y: usize| if mask.get(x as i64, y as i64) { 1.0 } else { 0.0 };
    let mut segments = Vec::new();

    for y in 0..height - 1 {
        for x in 0..width - 1 {
            // Corner samples of this cell
            let tl = value(x, y);
            let tr = value(x + 1, y);
            let bl = value(x, y + 1);
            let br = value(x + 1, y + 1);

            // 4-bit case index, clockwise from top-left
            let case = ((tl > level) as u8)
                | (((tr > level) as u8) << 1)
                | (((br > level) as u8) << 2)
                | (((bl > level) as u8) << 3);

            // Entirely inside or outside
            if case == 0 || case == 15 {
                continue;
            }

            // Crossing points on the four cell edges
            let (fx, fy) = (x as f64, y as f64);
            let top = interpolate(tl, tr, level, (fx, fy), (fx + 1.0, fy));
            let right = interpolate(tr, br, level, (fx + 1.0, fy), (fx + 1.0, fy + 1.0));
            let bottom = interpolate(bl, br, level, (fx, fy + 1.0), (fx + 1.0, fy + 1.0));
            let left = interpolate(tl, bl, level, (fx, fy), (fx, fy + 1.0));

            match case {
                1 => segments.push((left, top)),
                2 => segments.push((top, right)),
                3 => segments.push((left, right)),
                4 => segments.push((right, bottom)),
                6 => segments.push((top, bottom)),
                7 => segments.push((left, bottom)),
                8 => segments.push((bottom, left)),
                9 => segments.push((bottom, top)),
                // saddles: keep the two selected corners apart
                5 => {
                    segments.push((left, top));
                    segments.push((right, bottom));
                }
                10 => {
                    segments.push((top, right));
                    segments.push((bottom, left));
                }
                11 => segments.push((bottom, right)),
                12 => segments.push((right, left)),
                13 => segments.push((right, top)),
                14 => segments.push((top, left)),
                _ => {}
            }
        }
    }

    segments
}

fn interpolate(v1: f64, v2: f64, level: f64, p1: Point, p2: Point) -> Point {
    if v1 == v2 {
        return ((p1.0 + p2.0) / 2.0, (p1.1 + p2.1) / 2.0);
    }
    let t = ((level - v1) / (v2 - v1)).clamp(0.0, 1.0);
    (p1.0 + t * (p2.0 - p1.0), p1.1 + t * (p2.1 - p1.1))
}

/// Endpoint key; segment endpoints shared by neighbouring cells are bit-identical
/// up to this quantization.
fn key(p: Point) -> (i64, i64) {
    ((p.0 * 1024.0).round() as i64, (p.1 * 1024.0).round() as i64)
}

/// Chain segments that share endpoints into polylines.
fn connect_segments(segments: &[(Point, Point)]) -> Vec<Contour> {
    let mut by_endpoint: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, &(a, b)) in segments.iter().enumerate() {
        by_endpoint.entry(key(a)).or_default().push(i);
        by_endpoint.entry(key(b)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    // Next unused segment touching `at`; returns its far endpoint

    let take_next = |at: Point, used: &mut Vec<bool>| -> Option<Point> {
        let candidates = by_endpoint.get(&key(at))?;
        let &j = candidates.iter().find(|&&j| !used[j])?;
        used[j] = true;
        let (a, b) = segments[j];
        Some(if key(a) == key(at) { b } else { a })
    };

    for i in 0..segments.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let (a, b) = segments[i];
        let mut chain: VecDeque<Point> = VecDeque::from([a, b]);

        // Grow forward, then backward for open lines that started mid-way
        while let Some(p) = take_next(*chain.back().unwrap_or(&b), &mut used) {
            chain.push_back(p);
        }
        while let Some(p) = take_next(*chain.front().unwrap_or(&a), &mut used) {
            chain.push_front(p);
        }

        let mut points: Vec<Point> = chain.into_iter().collect();

        // Back at the start: snap the last point so the ring closes exactly
        let closed = points.len() > 2 && key(points[0]) == key(points[points.len() - 1]);
        if closed {
            let last = points.len() - 1;
            points[last] = points[0];
        }
        // Drop degenerate single-segment chains
        if points.len() >= 3 {
            contours.push(Contour::new(points));
        }
    }

    contours
}

fn distance_to_segment(p: Point, start: Point, end: Point) -> f64 {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-12 {
        return ((p.0 - start.0).powi(2) + (p.1 - start.1).powi(2)).sqrt();
    }

    let t = (((p.0 - start.0) * dx + (p.1 - start.1) * dy) / length_sq).clamp(0.0, 1.0);
    let px = p.0 - (start.0 + t * dx);
    let py = p.1 - (start.1 + t * dy);
    (px * px + py * py).sqrt()
}

/// Douglas-Peucker polyline simplification. Endpoints are always kept.
pub fn douglas_peucker(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    // Point farthest from the chord
    let (max_idx, max_dist) = points[1..points.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, &p)| (i + 1, distance_to_segment(p, first, last)))
        .fold((0, 0.0f64), |best, cur| if cur.1 > best.1 { cur } else { best });

    if max_dist > epsilon {
        // Split there and simplify both halves; the split point is shared
        let mut left = douglas_peucker(&points[..=max_idx], epsilon);
        let right = douglas_peucker(&points[max_idx..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

/// Simplify in place; rings that would collapse below four points are left alone.
fn simplify(contour: &mut Contour, epsilon: f64) {
    let ring = contour.is_closed_ring();
    let simplified = douglas_peucker(contour.points(), epsilon);
    if ring && simplified.len() < 4 {
        return;
    }
    *contour = Contour::new(simplified);
}
