//! Constraint protocol for candidate rewrites
//!
//! Constraints are pure predicates evaluated before a candidate replacement
//! is spliced in. All registered constraints must pass; evaluation runs in
//! ascending priority order but the result does not depend on it.

use anyhow::Result;

use crate::geometry::{point_in_polygon, Aabb, Direction45, LineChain, Point};
use crate::line::RouteLine;
use crate::world::{CollisionWorld, ItemKind, KindMask};

/// A rule consulted for every candidate rewrite. `v1..=v2` is the vertex
/// span of `current` the candidate would replace; `replacement` shares its
/// end points with that span.
pub trait OptConstraint {
    fn priority(&self) -> i32 {
        0
    }

    fn check(
        &self,
        v1: usize,
        v2: usize,
        origin: &RouteLine,
        current: &LineChain,
        replacement: &LineChain,
        world: &dyn CollisionWorld,
    ) -> Result<bool>;
}

/// Restricts the entry and exit direction of a replacement to 45-degree
/// directions enabled in the caller-supplied masks
pub struct AngleConstraint45 {
    entry_mask: u32,
    exit_mask: u32,
}

impl AngleConstraint45 {
    pub fn new(entry_mask: u32, exit_mask: u32) -> Self {
        Self {
            entry_mask,
            exit_mask,
        }
    }
}

impl OptConstraint for AngleConstraint45 {
    fn check(
        &self,
        _v1: usize,
        _v2: usize,
        _origin: &RouteLine,
        _current: &LineChain,
        replacement: &LineChain,
        _world: &dyn CollisionWorld,
    ) -> Result<bool> {
        if replacement.segment_count() == 0 {
            return Ok(true);
        }

        let entry = Direction45::from_seg(&replacement.segment(0));
        if entry.mask() & self.entry_mask == 0 {
            return Ok(false);
        }

        let exit = Direction45::from_seg(&replacement.segment(replacement.segment_count() - 1));
        Ok(exit.mask() & self.exit_mask != 0)
    }
}

/// Keeps every vertex of a replacement inside an allowed rectangle
pub struct AreaConstraint {
    allowed: Aabb,
}

impl AreaConstraint {
    pub fn new(allowed: Aabb) -> Self {
        Self { allowed }
    }
}

impl OptConstraint for AreaConstraint {
    fn check(
        &self,
        _v1: usize,
        _v2: usize,
        _origin: &RouteLine,
        _current: &LineChain,
        replacement: &LineChain,
        _world: &dyn CollisionWorld,
    ) -> Result<bool> {
        Ok(replacement.points().iter().all(|p| self.allowed.contains(*p)))
    }
}

/// Rejects rewrites that would move the path to the other side of an
/// obstacle: the loop closed by the replaced span and the reversed
/// replacement must not enclose any nearby solid item
pub struct KeepTopologyConstraint;

impl KeepTopologyConstraint {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeepTopologyConstraint {
    fn default() -> Self {
        Self::new()
    }
}

impl OptConstraint for KeepTopologyConstraint {
    fn check(
        &self,
        v1: usize,
        v2: usize,
        origin: &RouteLine,
        current: &LineChain,
        replacement: &LineChain,
        world: &dyn CollisionWorld,
    ) -> Result<bool> {
        let mut hull: Vec<Point> = current.points()[v1..=v2].to_vec();
        for p in replacement.points().iter().rev() {
            if hull.last().map_or(true, |last| !last.approx_eq(*p)) {
                hull.push(*p);
            }
        }

        if hull.len() < 3 {
            return Ok(true);
        }

        let area = Aabb::from_points(hull.iter().copied());
        let solids = world.query_area(
            &area,
            origin.layer(),
            origin.net(),
            KindMask::of(&[ItemKind::Via, ItemKind::Pad, ItemKind::Outline]),
        )?;

        for item in solids {
            if point_in_polygon(item.anchor(), &hull) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Rejects rewrites that would drop or move a pinned vertex
pub struct PreserveVertexConstraint {
    v: Point,
}

impl PreserveVertexConstraint {
    pub fn new(v: Point) -> Self {
        Self { v }
    }
}

impl OptConstraint for PreserveVertexConstraint {
    fn check(
        &self,
        v1: usize,
        v2: usize,
        _origin: &RouteLine,
        current: &LineChain,
        replacement: &LineChain,
        _world: &dyn CollisionWorld,
    ) -> Result<bool> {
        // Only an interior vertex of the replaced span is at risk; the
        // splice end points always survive
        let pinned_inside = (v1 + 1..v2)
            .any(|i| i < current.point_count() && current.point(i).approx_eq(self.v));

        if !pinned_inside {
            return Ok(true);
        }

        Ok(replacement.points().iter().any(|p| p.approx_eq(self.v)))
    }
}

/// Limits rewrites to a window of vertex indices
pub struct RestrictVertexRangeConstraint {
    start: usize,
    end: usize,
}

impl RestrictVertexRangeConstraint {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl OptConstraint for RestrictVertexRangeConstraint {
    fn check(
        &self,
        v1: usize,
        v2: usize,
        _origin: &RouteLine,
        _current: &LineChain,
        _replacement: &LineChain,
        _world: &dyn CollisionWorld,
    ) -> Result<bool> {
        Ok(v1 >= self.start && v2 <= self.end)
    }
}
