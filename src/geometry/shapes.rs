//! Collidable shapes and clearance math
//!
//! Board items and trace segments are reduced to a small set of shape kinds;
//! pairwise boundary distance drives every collision probe in the optimizer.

use super::types::{Aabb, Point, Seg};

/// A collidable shape. Ovals are modeled as width-carrying segments, the
/// same way a trace segment is.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { center: Point, radius: f32 },
    Rect { center: Point, w: f32, h: f32 },
    Segment { seg: Seg, width: f32 },
    Polygon { points: Vec<Point> },
}

impl Shape {
    pub fn bounds(&self) -> Aabb {
        match self {
            Shape::Circle { center, radius } => Aabb::new(
                [center.x - radius, center.y - radius],
                [center.x + radius, center.y + radius],
            ),
            Shape::Rect { center, w, h } => Aabb::new(
                [center.x - w / 2.0, center.y - h / 2.0],
                [center.x + w / 2.0, center.y + h / 2.0],
            ),
            Shape::Segment { seg, width } => {
                Aabb::from_points([seg.a, seg.b]).expanded(width / 2.0)
            }
            Shape::Polygon { points } => Aabb::from_points(points.iter().copied()),
        }
    }

    /// Reference point used for joints, breakouts and topology tests
    pub fn anchor(&self) -> Point {
        match self {
            Shape::Circle { center, .. } => *center,
            Shape::Rect { center, .. } => *center,
            Shape::Segment { seg, .. } => seg.a.add(seg.b).scale(0.5),
            Shape::Polygon { points } => centroid(points),
        }
    }

    /// Boundary-to-boundary distance. Negative when the shapes overlap;
    /// the magnitude of negative results is approximate for polygons.
    pub fn distance_to(&self, other: &Shape) -> f32 {
        use Shape::*;

        match (self, other) {
            (Circle { center: c1, radius: r1 }, Circle { center: c2, radius: r2 }) => {
                c1.distance(*c2) - r1 - r2
            }
            (Circle { center, radius }, Segment { seg, width }) => {
                point_segment_distance(*center, seg.a, seg.b) - radius - width / 2.0
            }
            (Circle { center, radius }, Rect { center: rc, w, h }) => {
                point_rect_signed_distance(*center, *rc, *w, *h) - radius
            }
            (Circle { center, radius }, Polygon { points }) => {
                point_polygon_signed_distance(*center, points) - radius
            }
            (Segment { seg: s1, width: w1 }, Segment { seg: s2, width: w2 }) => {
                segment_distance(s1, s2) - (w1 + w2) / 2.0
            }
            (Segment { seg, width }, Rect { center, w, h }) => {
                segment_polygon_distance(seg, &rect_corners(*center, *w, *h)) - width / 2.0
            }
            (Segment { seg, width }, Polygon { points }) => {
                segment_polygon_distance(seg, points) - width / 2.0
            }
            (Rect { center: c1, w: w1, h: h1 }, Rect { center: c2, w: w2, h: h2 }) => {
                polygon_polygon_distance(&rect_corners(*c1, *w1, *h1), &rect_corners(*c2, *w2, *h2))
            }
            (Rect { center, w, h }, Polygon { points }) => {
                polygon_polygon_distance(&rect_corners(*center, *w, *h), points)
            }
            (Polygon { points: p1 }, Polygon { points: p2 }) => {
                polygon_polygon_distance(p1, p2)
            }
            // Remaining pairs are the mirror image of a case above
            (a, b) => b.distance_to(a),
        }
    }

    pub fn collides_with(&self, other: &Shape, clearance: f32) -> bool {
        self.distance_to(other) < clearance
    }
}

/// Corner points of an axis-aligned rectangle, counterclockwise
pub fn rect_corners(center: Point, w: f32, h: f32) -> Vec<Point> {
    let hw = w / 2.0;
    let hh = h / 2.0;
    vec![
        Point::new(center.x - hw, center.y - hh),
        Point::new(center.x + hw, center.y - hh),
        Point::new(center.x + hw, center.y + hh),
        Point::new(center.x - hw, center.y + hh),
    ]
}

/// Point-to-segment minimum distance
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let ab = b.sub(a);
    let ap = p.sub(a);
    let ab_len2 = ab.dot(ab);

    if ab_len2 < 1e-10 {
        // Degenerate segment
        return p.distance(a);
    }

    let t = (ap.dot(ab) / ab_len2).clamp(0.0, 1.0);
    p.distance(a.add(ab.scale(t)))
}

/// Proper or touching intersection test via orientation signs
pub fn segments_intersect(a: &Seg, b: &Seg) -> bool {
    let d1 = a.side_of(b.a);
    let d2 = a.side_of(b.b);
    let d3 = b.side_of(a.a);
    let d4 = b.side_of(a.b);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Collinear endpoint touches
    let on = |s: &Seg, p: Point, side: f32| {
        side.abs() < 1e-6 && point_segment_distance(p, s.a, s.b) < 1e-5
    };
    on(a, b.a, d1) || on(a, b.b, d2) || on(b, a.a, d3) || on(b, a.b, d4)
}

/// Segment-to-segment minimum distance; zero when they cross
pub fn segment_distance(a: &Seg, b: &Seg) -> f32 {
    if segments_intersect(a, b) {
        return 0.0;
    }

    point_segment_distance(a.a, b.a, b.b)
        .min(point_segment_distance(a.b, b.a, b.b))
        .min(point_segment_distance(b.a, a.a, a.b))
        .min(point_segment_distance(b.b, a.a, a.b))
}

/// Ray-cast point-in-polygon test
pub fn point_in_polygon(p: Point, poly: &[Point]) -> bool {
    if poly.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = poly.len() - 1;

    for i in 0..poly.len() {
        let pi = poly[i];
        let pj = poly[j];

        if (pi.y > p.y) != (pj.y > p.y)
            && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }

        j = i;
    }

    inside
}

fn min_edge_distance(p: Point, poly: &[Point]) -> f32 {
    let mut min_d = f32::MAX;
    let mut j = poly.len() - 1;

    for i in 0..poly.len() {
        min_d = min_d.min(point_segment_distance(p, poly[j], poly[i]));
        j = i;
    }

    min_d
}

/// Distance from a point to a polygon boundary, negative inside
pub fn point_polygon_signed_distance(p: Point, poly: &[Point]) -> f32 {
    let d = min_edge_distance(p, poly);
    if point_in_polygon(p, poly) {
        -d
    } else {
        d
    }
}

/// Distance from a point to a rectangle boundary, negative inside
pub fn point_rect_signed_distance(p: Point, center: Point, w: f32, h: f32) -> f32 {
    let dx = (p.x - center.x).abs() - w / 2.0;
    let dy = (p.y - center.y).abs() - h / 2.0;

    if dx <= 0.0 && dy <= 0.0 {
        return dx.max(dy);
    }

    Point::new(dx.max(0.0), dy.max(0.0)).length()
}

fn segment_polygon_distance(seg: &Seg, poly: &[Point]) -> f32 {
    if point_in_polygon(seg.a, poly) || point_in_polygon(seg.b, poly) {
        return -min_edge_distance(seg.a, poly).max(0.0) - 1e-6;
    }

    let mut min_d = f32::MAX;
    let mut j = poly.len() - 1;

    for i in 0..poly.len() {
        min_d = min_d.min(segment_distance(seg, &Seg::new(poly[j], poly[i])));
        j = i;
    }

    min_d
}

fn polygon_polygon_distance(p1: &[Point], p2: &[Point]) -> f32 {
    // Containment without edge crossings
    if p1.first().map_or(false, |p| point_in_polygon(*p, p2))
        || p2.first().map_or(false, |p| point_in_polygon(*p, p1))
    {
        return -1e-6;
    }

    let mut min_d = f32::MAX;
    let mut j1 = p1.len() - 1;

    for i1 in 0..p1.len() {
        let e1 = Seg::new(p1[j1], p1[i1]);
        let mut j2 = p2.len() - 1;

        for i2 in 0..p2.len() {
            min_d = min_d.min(segment_distance(&e1, &Seg::new(p2[j2], p2[i2])));
            j2 = i2;
        }

        j1 = i1;
    }

    min_d
}

fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::new(0.0, 0.0);
    }

    let sum = points
        .iter()
        .fold(Point::new(0.0, 0.0), |acc, p| acc.add(*p));
    sum.scale(1.0 / points.len() as f32)
}

/// Convex hull (Andrew's monotone chain), counterclockwise without the
/// closing point. Inputs with fewer than 3 distinct points come back as-is.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup_by(|a, b| a.approx_eq(*b));

    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point> = Vec::with_capacity(pts.len() * 2);

    for &p in pts.iter().chain(pts.iter().rev()) {
        while hull.len() >= 2 {
            let a = hull[hull.len() - 2];
            let b = hull[hull.len() - 1];
            if b.sub(a).cross(p.sub(b)) <= 0.0 {
                hull.pop();
            } else {
                break;
            }
        }
        hull.push(p);
    }

    hull.pop();
    hull.dedup_by(|a, b| a.approx_eq(*b));
    hull
}
