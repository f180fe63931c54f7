//! Stroke simplification and 2D geometry helpers
//!
//! Everything here is pure: no world access, no logging.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::SIMPLIFY_MIN_DISTANCE;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all points (None for an empty slice)
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        let mut bounds = Self::new(first, first);
        for &p in &points[1..] {
            bounds.min = bounds.min.min(p);
            bounds.max = bounds.max.max(p);
        }
        Some(bounds)
    }

    /// Box around a circle
    pub fn from_circle(center: Vec2, radius: f32) -> Self {
        let r = Vec2::splat(radius);
        Self::new(center - r, center + r)
    }

    /// Inclusive point containment
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Inclusive overlap test (touching edges count)
    #[inline]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Grow the box by `amount` on every side
    pub fn expand(&self, amount: f32) -> Self {
        let a = Vec2::splat(amount);
        Self::new(self.min - a, self.max + a)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Reduce a raw pointer trace to a sparser polyline.
///
/// First and last points are always kept; an interior point survives when
/// it is more than [`SIMPLIFY_MIN_DISTANCE`] from the previous kept point.
/// Returns `None` when the trace has fewer than two points.
pub fn simplify_path(points: &[Vec2]) -> Option<Vec<Vec2>> {
    if points.len() < 2 {
        return None;
    }

    let last = points.len() - 1;
    let mut kept = Vec::with_capacity(points.len());
    kept.push(points[0]);
    for &p in &points[1..last] {
        let prev = kept[kept.len() - 1];
        if p.distance(prev) > SIMPLIFY_MIN_DISTANCE {
            kept.push(p);
        }
    }
    kept.push(points[last]);
    Some(kept)
}

/// Arithmetic mean of the points
pub fn vertex_centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    points.iter().copied().sum::<Vec2>() / points.len() as f32
}

/// Largest distance from `center` to any point
pub fn max_distance(center: Vec2, points: &[Vec2]) -> f32 {
    points
        .iter()
        .map(|p| p.distance(center))
        .fold(0.0, f32::max)
}

/// Signed shoelace area (positive for counter-clockwise in y-up space)
pub fn signed_area(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        area += a.perp_dot(b);
    }
    area * 0.5
}

/// Absolute polygon area
pub fn polygon_area(vertices: &[Vec2]) -> f32 {
    signed_area(vertices).abs()
}

/// Area-weighted centroid; falls back to the vertex mean for degenerate input
pub fn area_centroid(vertices: &[Vec2]) -> Vec2 {
    let area = signed_area(vertices);
    if area.abs() <= f32::EPSILON {
        return vertex_centroid(vertices);
    }
    let n = vertices.len();
    let mut c = Vec2::ZERO;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        c += (a + b) * a.perp_dot(b);
    }
    c / (6.0 * area)
}

/// Convex hull in counter-clockwise order (monotone chain). Collinear points
/// are dropped; fewer than three distinct points come back as-is.
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let turn = |o: Vec2, a: Vec2, b: Vec2| (a - o).perp_dot(b - o);
    let mut hull: Vec<Vec2> = Vec::with_capacity(sorted.len() * 2);
    for &p in &sorted {
        while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Second moment of area about the origin, scaled to `mass`.
///
/// Vertices must already be relative to the body's center.
pub fn polygon_inertia(vertices: &[Vec2], mass: f32) -> f32 {
    let n = vertices.len();
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for i in 0..n {
        let v = vertices[i];
        let w = vertices[(i + 1) % n];
        let cross = w.perp_dot(v).abs();
        numerator += cross * (w.dot(w) + w.dot(v) + v.dot(v));
        denominator += cross;
    }
    if denominator <= f32::EPSILON {
        // Degenerate sliver: treat as point masses at the vertices
        let spread = vertices.iter().map(|v| v.length_squared()).sum::<f32>() / n.max(1) as f32;
        return (mass * spread).max(f32::EPSILON);
    }
    (mass / 6.0) * (numerator / denominator)
}

/// Axis-aligned rectangle corners centered on the origin
pub fn rectangle_vertices(width: f32, height: f32) -> Vec<Vec2> {
    let hw = width / 2.0;
    let hh = height / 2.0;
    vec![
        Vec2::new(-hw, -hh),
        Vec2::new(hw, -hh),
        Vec2::new(hw, hh),
        Vec2::new(-hw, hh),
    ]
}

/// Trapezoid outline, bottom edge `width` wide, before centering.
///
/// `slope` follows the canvas convention: 1.0 makes a triangle, smaller
/// values flatten the top into a roof.
pub fn trapezoid_vertices(width: f32, height: f32, slope: f32) -> Vec<Vec2> {
    let slope = slope * 0.5;
    let roof = (1.0 - slope * 2.0) * width;
    let x1 = width * slope;
    let x2 = x1 + roof;
    let x3 = x2 + x1;

    if slope < 0.5 {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(x1, -height),
            Vec2::new(x2, -height),
            Vec2::new(x3, 0.0),
        ]
    } else {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(x2, -height),
            Vec2::new(x3, 0.0),
        ]
    }
}

/// Shift vertices so their area centroid sits on the origin
pub fn center_on_area_centroid(vertices: &[Vec2]) -> Vec<Vec2> {
    let c = area_centroid(vertices);
    vertices.iter().map(|&v| v - c).collect()
}
