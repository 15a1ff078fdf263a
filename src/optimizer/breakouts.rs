//! Breakout computation for pad and via exits
//!
//! A breakout is a short candidate path from a shape's anchor to a clean
//! 45-aligned exit point just outside the shape. One constructor per shape
//! kind plus a dispatcher; candidates are purely geometric and are collision
//! checked by the smart-pads strategy afterwards.

use crate::geometry::{convex_hull, LineChain, Point, Seg, Shape};
use crate::world::Item;

/// Candidate exit paths for an item's shape. `width` is the exiting trace
/// width and pads the exit point clear of the shape boundary.
pub fn compute_breakouts(width: f32, item: &Item, permit_diagonal: bool) -> Vec<LineChain> {
    match &item.shape {
        Shape::Circle { center, radius } => {
            circle_breakouts(width, *center, *radius, permit_diagonal)
        }
        Shape::Rect { center, w, h } => rect_breakouts(width, *center, *w, *h, permit_diagonal),
        Shape::Segment { seg, width: sw } => oval_breakouts(width, seg, *sw, permit_diagonal),
        Shape::Polygon { points } => custom_breakouts(width, item.anchor(), points),
    }
}

const ORTHO_DIRS: [(f32, f32); 4] = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];

const DIAG_DIRS: [(f32, f32); 4] = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];

fn ray(from: Point, dir: (f32, f32), len: f32) -> LineChain {
    let d = Point::new(dir.0, dir.1);
    let unit = d.scale(1.0 / d.length());
    LineChain::new(vec![from, from.add(unit.scale(len))])
}

fn circle_breakouts(
    width: f32,
    center: Point,
    radius: f32,
    permit_diagonal: bool,
) -> Vec<LineChain> {
    let len = radius + width;
    let mut out: Vec<LineChain> = ORTHO_DIRS.iter().map(|&d| ray(center, d, len)).collect();

    if permit_diagonal {
        out.extend(DIAG_DIRS.iter().map(|&d| ray(center, d, len)));
    }

    out
}

fn rect_breakouts(
    width: f32,
    center: Point,
    w: f32,
    h: f32,
    permit_diagonal: bool,
) -> Vec<LineChain> {
    let mut out = vec![
        ray(center, (1.0, 0.0), w / 2.0 + width),
        ray(center, (-1.0, 0.0), w / 2.0 + width),
        ray(center, (0.0, 1.0), h / 2.0 + width),
        ray(center, (0.0, -1.0), h / 2.0 + width),
    ];

    if permit_diagonal {
        // Through the corners
        let len = (w * w + h * h).sqrt() / 2.0 + width;
        out.extend(DIAG_DIRS.iter().map(|&d| ray(center, d, len)));
    }

    out
}

fn oval_breakouts(width: f32, seg: &Seg, seg_width: f32, permit_diagonal: bool) -> Vec<LineChain> {
    let anchor = seg.a.add(seg.b).scale(0.5);
    let axis = seg.dir();
    let half = axis.length() / 2.0;

    if half < 1e-6 {
        // Degenerate oval is a circle
        return circle_breakouts(width, anchor, seg_width / 2.0, permit_diagonal);
    }

    let unit = axis.scale(1.0 / (half * 2.0));
    let cap = half + seg_width / 2.0 + width;
    let mut out = vec![
        LineChain::new(vec![anchor, anchor.add(unit.scale(cap))]),
        LineChain::new(vec![anchor, anchor.sub(unit.scale(cap))]),
    ];

    if permit_diagonal {
        // 45-degree deflections off each cap
        let rot = |v: Point, s: f32| {
            let c = std::f32::consts::FRAC_1_SQRT_2;
            Point::new(c * (v.x - s * v.y), c * (s * v.x + v.y))
        };
        let tip = seg_width / 2.0 + width;

        for end in [1.0f32, -1.0] {
            let along = unit.scale(end);
            let base = anchor.add(along.scale(half));
            for s in [1.0f32, -1.0] {
                let d = rot(along, s);
                out.push(LineChain::new(vec![
                    anchor,
                    base,
                    base.add(d.scale(tip * std::f32::consts::SQRT_2)),
                ]));
            }
        }
    }

    out
}

fn custom_breakouts(width: f32, anchor: Point, points: &[Point]) -> Vec<LineChain> {
    let hull = convex_hull(points);
    let mut out = Vec::with_capacity(hull.len());

    for v in hull {
        let d = v.sub(anchor);
        let len = d.length();

        if len < 1e-6 {
            continue;
        }

        let exit = anchor.add(d.scale((len + width) / len));
        out.push(LineChain::new(vec![anchor, exit]));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::ItemKind;

    fn item(shape: Shape) -> Item {
        Item {
            id: 1,
            kind: ItemKind::Pad,
            shape,
            layer: "F.Cu".to_owned(),
            net: None,
        }
    }

    #[test]
    fn test_circle_breakout_count() {
        let pad = item(Shape::Circle {
            center: Point::new(0.0, 0.0),
            radius: 1.0,
        });

        assert_eq!(compute_breakouts(0.25, &pad, false).len(), 4);
        assert_eq!(compute_breakouts(0.25, &pad, true).len(), 8);
    }

    #[test]
    fn test_circle_breakout_clears_boundary() {
        let pad = item(Shape::Circle {
            center: Point::new(0.0, 0.0),
            radius: 1.0,
        });

        for b in compute_breakouts(0.25, &pad, true) {
            let tip = b.last().unwrap();
            assert!(tip.length() > 1.0, "exit point {:?} is inside the pad", tip);
        }
    }

    #[test]
    fn test_rect_breakouts_reach_past_edges() {
        let pad = item(Shape::Rect {
            center: Point::new(0.0, 0.0),
            w: 2.0,
            h: 1.0,
        });

        let outs = compute_breakouts(0.25, &pad, false);
        assert_eq!(outs.len(), 4);

        let east = outs[0].last().unwrap();
        assert!((east.x - 1.25).abs() < 1e-5);
    }

    #[test]
    fn test_custom_breakouts_follow_hull() {
        let pad = item(Shape::Polygon {
            points: vec![
                Point::new(-1.0, -1.0),
                Point::new(1.0, -1.0),
                Point::new(1.0, 1.0),
                Point::new(-1.0, 1.0),
            ],
        });

        let outs = compute_breakouts(0.25, &pad, true);
        assert_eq!(outs.len(), 4);
    }
}
