//! Geometry module for trace-path optimization
//!
//! This module provides the geometric types and utilities the optimizer is
//! built on: points, 45-degree direction analysis, mutable polylines, and
//! collidable shapes with clearance math.
//!
//! # Submodules
//! - `types` - Core primitives (Point, Seg, Aabb, Direction45)
//! - `chain` - Mutable polyline with splice and simplify operations
//! - `shapes` - Collidable shapes and pairwise clearance tests

mod chain;
mod shapes;
mod types;

pub use types::{Aabb, AngleClass, Direction45, Point, Seg, EPS};

pub use chain::{trace_45, LineChain};

pub use shapes::{
    convex_hull, point_in_polygon, point_segment_distance, rect_corners, segment_distance,
    segments_intersect, Shape,
};
