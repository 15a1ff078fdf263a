//! Trace-path optimizer
//!
//! Performs local optimizations of lines being routed, attempting to make
//! them shorter and less cornery without introducing collisions or violating
//! caller-supplied constraints. Strategies are selected through [`Effort`]
//! and run in a fixed order, each iterating internally until it finds no
//! further improving, collision-free, constraint-satisfying rewrite.
//!
//! # Submodules
//! - `cost` - Dual-component (length, corner) cost model
//! - `cache` - Bounded static/dynamic collision cache
//! - `constraints` - Pluggable rewrite constraint rules
//! - `breakouts` - Pad/via exit candidates for smart pads
//! - `strategies` - The rewrite strategies themselves

mod breakouts;
mod cache;
mod constraints;
mod cost;
mod strategies;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::dp::DiffPair;
use crate::geometry::{Aabb, LineChain, Point, Shape};
use crate::line::RouteLine;
use crate::world::{CollisionWorld, Item, KindMask};

pub use breakouts::compute_breakouts;
pub use cache::MAX_CACHED_ITEMS;
pub use constraints::{
    AngleConstraint45, AreaConstraint, KeepTopologyConstraint, OptConstraint,
    PreserveVertexConstraint, RestrictVertexRangeConstraint,
};
pub use cost::CostEstimator;

use cache::CollisionCache;

/// Default slack on the length component when comparing candidate costs;
/// absorbs float jitter on equal-length rewrites
pub const DEFAULT_LENGTH_TOLERANCE: f64 = 1e-3;

/// Default slack on the corner component: a rewrite may spend a few extra
/// 45-degree corners to buy a length reduction
pub const DEFAULT_CORNER_TOLERANCE: f64 = 5.0;

/// Which strategies and built-in constraints an optimization pass runs.
/// Every option is independent and they may be combined freely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effort {
    /// 2-opt shortcut search over vertex pairs
    pub merge_segments: bool,
    /// Reroute pad/via exits through breakout candidates
    pub smart_pads: bool,
    /// Fuse runs of obtusely-joined segments
    pub merge_obtuse: bool,
    /// Replace short pad-to-pad stubs with a clean connector
    pub fanout_cleanup: bool,
    /// Smooth out acute and zig-zag corners
    pub remove_ugly_corners: bool,
    /// Install the topology-preserving constraint
    pub keep_topology: bool,
    /// Install the pinned-vertex constraint (needs a vertex to be set)
    pub preserve_vertex: bool,
    /// Install the vertex-window constraint (needs a range to be set)
    pub restrict_vertex_range: bool,
}

impl Effort {
    /// Merge passes only; the cheapest useful setting for live dragging
    pub fn standard() -> Self {
        Self {
            merge_segments: true,
            merge_obtuse: true,
            ..Self::default()
        }
    }

    /// All rewrite strategies enabled
    pub fn full() -> Self {
        Self {
            merge_segments: true,
            smart_pads: true,
            merge_obtuse: true,
            fanout_cleanup: true,
            remove_ugly_corners: true,
            ..Self::default()
        }
    }
}

/// Interactive trace-path optimizer bound to a collision world.
///
/// One instance serves one routing session neighborhood: the collision cache
/// it owns is only valid as long as the surrounding board items are, and is
/// not thread safe.
pub struct Optimizer<'a> {
    world: &'a dyn CollisionWorld,
    cache: CollisionCache,
    constraints: Vec<Box<dyn OptConstraint>>,
    auto_constraints: Vec<Box<dyn OptConstraint>>,
    collision_mask: KindMask,
    effort: Effort,
    clearance: f32,
    length_tolerance: f64,
    corner_tolerance: f64,
    keep_postures: bool,
    preserved_vertex: Option<Point>,
    restricted_range: Option<(usize, usize)>,
    restrict_area: Option<Aabb>,
}

impl<'a> Optimizer<'a> {
    pub fn new(world: &'a dyn CollisionWorld) -> Self {
        Self {
            world,
            cache: CollisionCache::new(),
            constraints: Vec::new(),
            auto_constraints: Vec::new(),
            collision_mask: KindMask::ALL,
            effort: Effort::standard(),
            clearance: 0.0,
            length_tolerance: DEFAULT_LENGTH_TOLERANCE,
            corner_tolerance: DEFAULT_CORNER_TOLERANCE,
            keep_postures: false,
            preserved_vertex: None,
            restricted_range: None,
            restrict_area: None,
        }
    }

    /// One-shot optimization without keeping the optimizer around
    pub fn optimize_line(
        line: &mut RouteLine,
        effort: Effort,
        world: &dyn CollisionWorld,
        preserve: Option<Point>,
    ) -> Result<bool> {
        let mut optimizer = Optimizer::new(world);
        optimizer.set_effort(effort);

        if let Some(v) = preserve {
            optimizer.set_preserve_vertex(v);
        }

        optimizer.optimize(line)
    }

    pub fn set_world(&mut self, world: &'a dyn CollisionWorld) {
        self.world = world;
    }

    pub fn set_effort(&mut self, effort: Effort) {
        self.effort = effort;
    }

    pub fn effort(&self) -> Effort {
        self.effort
    }

    pub fn set_collision_mask(&mut self, mask: KindMask) {
        self.collision_mask = mask;
    }

    /// Required clearance between the line and other items
    pub fn set_clearance(&mut self, clearance: f32) {
        self.clearance = clearance;
    }

    pub fn set_cost_tolerances(&mut self, length: f64, corner: f64) {
        self.length_tolerance = length;
        self.corner_tolerance = corner;
    }

    /// Require rewrites at the chain ends to keep the original entry/exit
    /// posture
    pub fn set_keep_postures(&mut self, keep: bool) {
        self.keep_postures = keep;
    }

    pub fn set_preserve_vertex(&mut self, v: Point) {
        self.preserved_vertex = Some(v);
        self.effort.preserve_vertex = true;
    }

    pub fn set_restrict_vertex_range(&mut self, start: usize, end: usize) {
        self.restricted_range = Some((start, end));
        self.effort.restrict_vertex_range = true;
    }

    pub fn set_restrict_area(&mut self, area: Aabb) {
        self.restrict_area = Some(area);
    }

    pub fn add_constraint(&mut self, constraint: Box<dyn OptConstraint>) {
        self.constraints.push(constraint);
    }

    pub fn clear_constraints(&mut self) {
        self.constraints.clear();
    }

    /// Register a board item as part of the static surroundings; it will be
    /// probed from the cache without world queries until removed
    pub fn cache_static_item(&mut self, item: Arc<Item>) {
        self.cache.add_static(item);
    }

    /// Drop one item from the cache, e.g. after the engine deleted it
    pub fn cache_remove(&mut self, id: u64) {
        self.cache.remove(id);
    }

    /// Drop all cached items, or only the static ones
    pub fn clear_cache(&mut self, static_only: bool) {
        self.cache.clear(static_only);
    }

    /// Optimize a line in place. Returns whether the line changed; on a
    /// `false` return the line is untouched.
    pub fn optimize(&mut self, line: &mut RouteLine) -> Result<bool> {
        let started = Instant::now();

        if line.chain().point_count() < 2 {
            return Ok(false);
        }

        self.rebuild_auto_constraints();

        let effort = self.effort;
        let mut changed = false;

        if effort.merge_segments {
            changed |= self.merge_full(line)?;
        }
        if effort.merge_obtuse {
            changed |= self.merge_obtuse(line)?;
        }
        if effort.remove_ugly_corners {
            changed |= self.remove_ugly_corners(line)?;
        }
        if effort.smart_pads {
            changed |= self.run_smart_pads(line)?;
        }
        if effort.fanout_cleanup {
            changed |= self.fanout_cleanup(line)?;
        }

        eprintln!(
            "[OPT] line pass: {} vertices, changed={}, cached={} in {:?}",
            line.chain().point_count(),
            changed,
            self.cache.len(),
            started.elapsed()
        );

        Ok(changed)
    }

    /// Optimize into a separate result line, leaving the input untouched
    pub fn optimize_into(&mut self, line: &RouteLine, result: &mut RouteLine) -> Result<bool> {
        *result = line.clone();
        self.optimize(result)
    }

    /// Optimize both rails of a differential pair jointly
    pub fn optimize_pair(&mut self, pair: &mut DiffPair) -> Result<bool> {
        let started = Instant::now();

        self.rebuild_auto_constraints();
        let changed = self.merge_dp_segments(pair)?;

        eprintln!(
            "[OPT] pair pass: P {} / N {} vertices, changed={} in {:?}",
            pair.p().chain().point_count(),
            pair.n().chain().point_count(),
            changed,
            started.elapsed()
        );

        Ok(changed)
    }

    fn rebuild_auto_constraints(&mut self) {
        self.auto_constraints.clear();

        if self.effort.keep_topology {
            self.auto_constraints
                .push(Box::new(KeepTopologyConstraint::new()));
        }

        if self.effort.preserve_vertex {
            if let Some(v) = self.preserved_vertex {
                self.auto_constraints
                    .push(Box::new(PreserveVertexConstraint::new(v)));
            }
        }

        if self.effort.restrict_vertex_range {
            if let Some((start, end)) = self.restricted_range {
                self.auto_constraints
                    .push(Box::new(RestrictVertexRangeConstraint::new(start, end)));
            }
        }

        if let Some(area) = self.restrict_area {
            self.auto_constraints.push(Box::new(AreaConstraint::new(area)));
        }
    }

    /// All active constraints must accept a candidate; evaluation follows
    /// ascending priority
    fn check_constraints(
        &self,
        v1: usize,
        v2: usize,
        origin: &RouteLine,
        current: &LineChain,
        replacement: &LineChain,
    ) -> Result<bool> {
        let mut active: Vec<&dyn OptConstraint> = self
            .auto_constraints
            .iter()
            .chain(self.constraints.iter())
            .map(|c| c.as_ref())
            .collect();
        active.sort_by_key(|c| c.priority());

        for constraint in active {
            if !constraint.check(v1, v2, origin, current, replacement, self.world)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Probe every segment of a candidate path against cache and world
    fn check_colliding_chain(&mut self, line: &RouteLine, path: &LineChain) -> Result<bool> {
        for i in 0..path.segment_count() {
            let shape = Shape::Segment {
                seg: path.segment(i),
                width: line.width(),
            };

            let hit = self.cache.check_colliding(
                &shape,
                self.clearance,
                line.layer(),
                line.net(),
                self.collision_mask,
                self.world,
                true,
            )?;

            if hit {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn find_pad_or_via(
        &self,
        layer: &str,
        net: Option<&str>,
        pos: Point,
    ) -> Result<Option<Arc<Item>>> {
        Ok(self
            .world
            .find_joint(pos, layer, net)?
            .and_then(|joint| joint.pad_or_via()))
    }

    /// An accepted chain must still carry the pinned vertex; splicing and
    /// simplification may otherwise drop it even when the replacement span
    /// passed the constraint
    fn keeps_preserved_vertex(&self, chain: &LineChain) -> bool {
        match self.preserved_vertex {
            Some(v) if self.effort.preserve_vertex => chain.find_vertex(v).is_some(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effort_json_round_trip() {
        let effort = Effort::full();
        let json = serde_json::to_string(&effort).unwrap();
        let back: Effort = serde_json::from_str(&json).unwrap();
        assert_eq!(effort, back);

        // Missing fields default to off
        let partial: Effort = serde_json::from_str(r#"{"merge_segments": true}"#).unwrap();
        assert!(partial.merge_segments);
        assert!(!partial.smart_pads);
        assert!(!partial.keep_topology);
    }
}
