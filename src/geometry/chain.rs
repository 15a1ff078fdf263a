//! Mutable polyline representation
//!
//! `LineChain` is the vertex sequence every optimization strategy rewrites:
//! it supports span splicing, collinear simplification, and construction of
//! the canonical two-segment 45-degree connector between two points.

use super::types::{Aabb, Point, Seg, EPS};

/// An ordered, mutable sequence of 2D points
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineChain {
    points: Vec<Point>,
}

impl LineChain {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, i: usize) -> Point {
        self.points[i]
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn segment(&self, i: usize) -> Seg {
        Seg::new(self.points[i], self.points[i + 1])
    }

    /// Append a point, skipping exact duplicates of the current tail
    pub fn append(&mut self, p: Point) {
        if self.points.last().map_or(true, |last| !last.approx_eq(p)) {
            self.points.push(p);
        }
    }

    pub fn extend_chain(&mut self, other: &LineChain) {
        for p in &other.points {
            self.append(*p);
        }
    }

    pub fn length(&self) -> f32 {
        (0..self.segment_count()).map(|i| self.segment(i).length()).sum()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.points.iter().copied())
    }

    pub fn reversed(&self) -> LineChain {
        let mut points = self.points.clone();
        points.reverse();
        LineChain::new(points)
    }

    /// Copy of the vertex span `from..=to`
    pub fn slice(&self, from: usize, to: usize) -> LineChain {
        LineChain::new(self.points[from..=to].to_vec())
    }

    /// Find the index of a vertex coincident with `p`
    pub fn find_vertex(&self, p: Point) -> Option<usize> {
        self.points.iter().position(|q| q.approx_eq(p))
    }

    /// Replace the vertex span `start..=end` with the points of `sub`.
    /// Adjacent duplicates at the splice points are collapsed.
    pub fn replace_span(&mut self, start: usize, end: usize, sub: &LineChain) {
        let tail: Vec<Point> = self.points[end + 1..].to_vec();
        self.points.truncate(start);

        for p in &sub.points {
            if self.points.last().map_or(true, |last| !last.approx_eq(*p)) {
                self.points.push(*p);
            }
        }

        for p in tail {
            if self.points.last().map_or(true, |last| !last.approx_eq(p)) {
                self.points.push(p);
            }
        }
    }

    /// Replace the vertex span `start..=end` with a single point
    pub fn replace_with_point(&mut self, start: usize, end: usize, p: Point) {
        self.replace_span(start, end, &LineChain::new(vec![p]));
    }

    /// Remove duplicate vertices and forward-collinear interior vertices.
    /// Returns true if any vertex was removed.
    pub fn simplify(&mut self) -> bool {
        if self.points.len() < 2 {
            return false;
        }

        let before = self.points.len();
        let mut out: Vec<Point> = Vec::with_capacity(before);

        for &p in &self.points {
            if out.last().map_or(false, |last| last.approx_eq(p)) {
                continue;
            }

            while out.len() >= 2 {
                let a = out[out.len() - 2];
                let b = out[out.len() - 1];
                let ab = b.sub(a);
                let bp = p.sub(b);

                // Drop b only when the path continues forward through it
                if ab.cross(bp).abs() <= EPS * (ab.length() + bp.length()).max(1.0)
                    && ab.dot(bp) >= 0.0
                {
                    out.pop();
                } else {
                    break;
                }
            }

            out.push(p);
        }

        self.points = out;
        self.points.len() != before
    }
}

/// Canonical two-segment 45-degree connector ("\\__") between two points.
/// `diagonal_first` selects which of the two postures to build; collinear,
/// axis-aligned and exactly diagonal spans degenerate to a single segment.
pub fn trace_45(a: Point, b: Point, diagonal_first: bool) -> LineChain {
    let d = b.sub(a);
    let adx = d.x.abs();
    let ady = d.y.abs();

    if adx <= EPS && ady <= EPS {
        return LineChain::new(vec![a]);
    }

    if adx <= EPS || ady <= EPS || (adx - ady).abs() <= EPS {
        return LineChain::new(vec![a, b]);
    }

    let amin = adx.min(ady);
    let diag = Point::new(d.x.signum() * amin, d.y.signum() * amin);

    let mid = if diagonal_first {
        a.add(diag)
    } else {
        b.sub(diag)
    };

    LineChain::new(vec![a, mid, b])
}
