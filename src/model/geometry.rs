//! Page-space geometry: points, affine transforms and bounding boxes.
//!
//! All coordinates handed to the page model are already in page space
//! (origin at the top-left corner, y growing downwards).

use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether a transform carries a rotation.
const ROTATION_EPSILON: f64 = 1e-4;

/// A point (or a displacement) in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Coord) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Affine transform `[a b c d e f]` mapping `(x, y)` to
/// `(a*x + c*y + e, b*x + d*y + f)`.
///
/// Once attached to a character or path the transform is never modified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 6]> for Transform {
    fn from(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }
}

impl From<Transform> for [f64; 6] {
    fn from(t: Transform) -> Self {
        [t.a, t.b, t.c, t.d, t.e, t.f]
    }
}

impl Transform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// A rotation by `angle` radians followed by a translation to `(x, y)`.
    pub fn rotation_at(angle: f64, x: f64, y: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin, -sin, cos, x, y)
    }

    /// Rotation angle in radians, in `(-PI, PI]`.
    pub fn rotation(&self) -> f64 {
        self.b.atan2(self.a)
    }

    /// Whether the transform rotates its input.
    pub fn is_rotated(&self) -> bool {
        self.rotation().abs() > ROTATION_EPSILON
    }

    /// Apply the full transform (including translation) to a point.
    pub fn transform(&self, x: f64, y: f64) -> Coord {
        Coord::new(
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Apply only the linear part of the transform to a displacement.
    pub fn transform_delta(&self, dx: f64, dy: f64) -> Coord {
        Coord::new(self.a * dx + self.c * dy, self.b * dx + self.d * dy)
    }
}

/// How a box relates to a clip region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipState {
    /// Wholly inside the clip region.
    Unclipped,
    /// Straddles the clip boundary.
    PartiallyClipped,
    /// Wholly outside the clip region.
    FullyClipped,
}

/// Axis-aligned rectangle in page space. Always stored normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    /// Box anchored at `(x, y)` extending by `w`, `h`. Negative extents are
    /// allowed and get normalized.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self::from_corners(Coord::new(x, y), Coord::new(x + w, y + h))
    }

    /// Box spanning two arbitrary corners.
    pub fn from_corners(p1: Coord, p2: Coord) -> Self {
        Self {
            x_min: p1.x.min(p2.x),
            y_min: p1.y.min(p2.y),
            x_max: p1.x.max(p2.x),
            y_max: p1.y.max(p2.y),
        }
    }

    /// Top-left corner.
    pub fn p1(&self) -> Coord {
        Coord::new(self.x_min, self.y_min)
    }

    /// Bottom-right corner.
    pub fn p2(&self) -> Coord {
        Coord::new(self.x_max, self.y_max)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Coord {
        Coord::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Whether the point lies inside or on the edge of the box.
    pub fn contains(&self, p: &Coord) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    /// Whether `other` lies entirely within this box.
    pub fn encloses(&self, other: &BoundingBox) -> bool {
        other.x_min >= self.x_min
            && other.x_max <= self.x_max
            && other.y_min >= self.y_min
            && other.y_max <= self.y_max
    }

    /// Whether the two boxes share any point.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
    }

    /// Grow this box to also cover `other`.
    pub fn expand(&mut self, other: &BoundingBox) {
        self.x_min = self.x_min.min(other.x_min);
        self.y_min = self.y_min.min(other.y_min);
        self.x_max = self.x_max.max(other.x_max);
        self.y_max = self.y_max.max(other.y_max);
    }

    /// Area of the overlap between the boxes.
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let w = self.x_max.min(other.x_max) - self.x_min.max(other.x_min);
        let h = self.y_max.min(other.y_max) - self.y_min.max(other.y_min);
        if w <= 0.0 || h <= 0.0 {
            return 0.0;
        }
        w * h
    }

    /// Fraction of this box's area covered by `other`, in `[0, 1]`.
    /// Degenerate boxes report 0.
    pub fn intersection_area_ratio(&self, other: &BoundingBox) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / area
    }

    /// Classify this box against a clip region.
    pub fn is_clipped_by(&self, clip: &BoundingBox) -> ClipState {
        if !self.intersects(clip) {
            ClipState::FullyClipped
        } else if clip.encloses(self) {
            ClipState::Unclipped
        } else {
            ClipState::PartiallyClipped
        }
    }

    /// This box truncated to the clip region. A box wholly outside the
    /// region collapses onto the nearest clip edge.
    pub fn clip(&self, clip: &BoundingBox) -> BoundingBox {
        let x_min = self.x_min.clamp(clip.x_min, clip.x_max);
        let x_max = self.x_max.clamp(clip.x_min, clip.x_max);
        let y_min = self.y_min.clamp(clip.y_min, clip.y_max);
        let y_max = self.y_max.clamp(clip.y_min, clip.y_max);
        BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }
}

/// Running bounds that start empty and only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Bounds {
    bbox: Option<BoundingBox>,
}

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand(&mut self, bbox: &BoundingBox) {
        match self.bbox.as_mut() {
            Some(b) => b.expand(bbox),
            None => self.bbox = Some(*bbox),
        }
    }

    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.bbox.is_some()
    }
}
