//! Core geometry types for trace optimization
//!
//! This module contains the fundamental geometric primitives used throughout
//! the optimizer: points, segments, bounding boxes, and 45-degree direction
//! classification for corner analysis.

use serde::Serialize;

/// Coordinate comparison tolerance in board units (mm)
pub const EPS: f32 = 1e-4;

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, k: f32) -> Point {
        Point::new(self.x * k, self.y * k)
    }

    pub fn dot(self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product; sign gives the turn direction
    pub fn cross(self, other: Point) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Point) -> f32 {
        self.sub(other).length()
    }

    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() <= EPS && (self.y - other.y).abs() <= EPS
    }
}

/// A directed line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seg {
    pub a: Point,
    pub b: Point,
}

impl Seg {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    pub fn dir(&self) -> Point {
        self.b.sub(self.a)
    }

    pub fn length(&self) -> f32 {
        self.dir().length()
    }

    /// Which side of the segment's supporting line the point lies on:
    /// positive left, negative right, ~0 collinear
    pub fn side_of(&self, p: Point) -> f32 {
        self.dir().cross(p.sub(self.a))
    }

    /// Intersection of the two supporting lines, ignoring segment extents
    pub fn line_intersection(&self, other: &Seg) -> Option<Point> {
        let d1 = self.dir();
        let d2 = other.dir();
        let denom = d1.cross(d2);

        if denom.abs() < 1e-10 {
            // Parallel or degenerate
            return None;
        }

        let t = other.a.sub(self.a).cross(d2) / denom;
        Some(self.a.add(d1.scale(t)))
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Aabb {
    pub fn new(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }

    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let mut min = [f32::INFINITY, f32::INFINITY];
        let mut max = [f32::NEG_INFINITY, f32::NEG_INFINITY];

        for p in points {
            min[0] = min[0].min(p.x);
            min[1] = min[1].min(p.y);
            max[0] = max[0].max(p.x);
            max[1] = max[1].max(p.y);
        }

        Self { min, max }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }

    pub fn expanded(&self, margin: f32) -> Aabb {
        Aabb::new(
            [self.min[0] - margin, self.min[1] - margin],
            [self.max[0] + margin, self.max[1] + margin],
        )
    }

    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        )
    }
}

/// One of the eight 45-degree-aligned compass directions, or Undefined for
/// segments that are not 45-aligned. Index order is counterclockwise from east.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction45 {
    E,
    NE,
    N,
    NW,
    W,
    SW,
    S,
    SE,
    Undefined,
}

/// Turn classification between two consecutive 45-aligned segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleClass {
    /// Collinear continuation (0 degree turn)
    Straight,
    /// 45 degree turn (135 degree interior angle)
    Obtuse,
    /// 90 degree turn
    Right,
    /// 135 degree turn
    Acute,
    /// Full reversal
    HalfFull,
    /// At least one direction is not 45-aligned
    Undefined,
}

impl Direction45 {
    pub fn from_vector(dx: f32, dy: f32) -> Self {
        let adx = dx.abs();
        let ady = dy.abs();

        if adx <= EPS && ady <= EPS {
            return Direction45::Undefined;
        }

        if ady <= EPS {
            return if dx > 0.0 { Direction45::E } else { Direction45::W };
        }

        if adx <= EPS {
            return if dy > 0.0 { Direction45::N } else { Direction45::S };
        }

        // Diagonal only when the components match in magnitude
        if (adx - ady).abs() > EPS {
            return Direction45::Undefined;
        }

        match (dx > 0.0, dy > 0.0) {
            (true, true) => Direction45::NE,
            (false, true) => Direction45::NW,
            (false, false) => Direction45::SW,
            (true, false) => Direction45::SE,
        }
    }

    pub fn from_seg(seg: &Seg) -> Self {
        let d = seg.dir();
        Self::from_vector(d.x, d.y)
    }

    fn index(self) -> Option<u32> {
        match self {
            Direction45::E => Some(0),
            Direction45::NE => Some(1),
            Direction45::N => Some(2),
            Direction45::NW => Some(3),
            Direction45::W => Some(4),
            Direction45::SW => Some(5),
            Direction45::S => Some(6),
            Direction45::SE => Some(7),
            Direction45::Undefined => None,
        }
    }

    /// Mask bit for direction-mask constraints; Undefined has no bit
    pub fn mask(self) -> u32 {
        self.index().map_or(0, |i| 1 << i)
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction45::NE | Direction45::NW | Direction45::SW | Direction45::SE
        )
    }

    /// Classify the turn from `self` into `next`
    pub fn angle_to(self, next: Direction45) -> AngleClass {
        let (a, b) = match (self.index(), next.index()) {
            (Some(a), Some(b)) => (a, b),
            _ => return AngleClass::Undefined,
        };

        match (b + 8 - a) % 8 {
            0 => AngleClass::Straight,
            1 | 7 => AngleClass::Obtuse,
            2 | 6 => AngleClass::Right,
            3 | 5 => AngleClass::Acute,
            _ => AngleClass::HalfFull,
        }
    }

    pub fn is_obtuse_to(self, next: Direction45) -> bool {
        self.angle_to(next) == AngleClass::Obtuse
    }
}
