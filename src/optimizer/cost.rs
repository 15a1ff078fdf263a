//! Path cost model
//!
//! Cost is a (length, corner) pair: length is the plain chain length, the
//! corner component penalizes each interior vertex by its turn angle so
//! smoother 45-aligned routing wins over zig-zags of equal length.

use crate::geometry::{AngleClass, Direction45, LineChain, Seg};
use crate::line::RouteLine;

/// Corner penalty by turn class. Collinear continuations are free, anything
/// off the 45-degree grid is heavily penalized.
fn corner_penalty(angle: AngleClass) -> f64 {
    match angle {
        AngleClass::Straight => 0.0,
        AngleClass::Obtuse => 1.0,
        AngleClass::Right => 30.0,
        AngleClass::Acute => 50.0,
        AngleClass::HalfFull => 60.0,
        AngleClass::Undefined => 100.0,
    }
}

/// Running (length, corner) cost of a set of lines, with incremental update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostEstimator {
    length_cost: f64,
    corner_cost: f64,
}

impl CostEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Penalty of the corner between two consecutive segments
    pub fn seg_corner_cost(a: &Seg, b: &Seg) -> f64 {
        corner_penalty(Direction45::from_seg(a).angle_to(Direction45::from_seg(b)))
    }

    /// Total corner penalty over a chain's interior vertices
    pub fn chain_corner_cost(chain: &LineChain) -> f64 {
        (1..chain.segment_count())
            .map(|i| Self::seg_corner_cost(&chain.segment(i - 1), &chain.segment(i)))
            .sum()
    }

    pub fn of_chain(chain: &LineChain) -> Self {
        Self {
            length_cost: chain.length() as f64,
            corner_cost: Self::chain_corner_cost(chain),
        }
    }

    pub fn of_line(line: &RouteLine) -> Self {
        Self::of_chain(line.chain())
    }

    pub fn add(&mut self, line: &RouteLine) {
        let c = Self::of_line(line);
        self.length_cost += c.length_cost;
        self.corner_cost += c.corner_cost;
    }

    pub fn remove(&mut self, line: &RouteLine) {
        let c = Self::of_line(line);
        self.length_cost -= c.length_cost;
        self.corner_cost -= c.corner_cost;
    }

    pub fn replace_line(&mut self, old: &RouteLine, new: &RouteLine) {
        self.remove(old);
        self.add(new);
    }

    /// Whether this cost is an improvement over `other`: neither component
    /// may regress beyond its tolerance, and at least one must strictly
    /// improve. Exact ties are not improvements.
    pub fn is_better(&self, other: &CostEstimator, length_tolerance: f64, corner_tolerance: f64) -> bool {
        let length_ok = self.length_cost <= other.length_cost + length_tolerance;
        let corner_ok = self.corner_cost <= other.corner_cost + corner_tolerance;
        let improves =
            self.length_cost < other.length_cost || self.corner_cost < other.corner_cost;

        length_ok && corner_ok && improves
    }

    pub fn length_cost(&self) -> f64 {
        self.length_cost
    }

    pub fn corner_cost(&self) -> f64 {
        self.corner_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn chain(pts: &[(f32, f32)]) -> LineChain {
        LineChain::new(pts.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn test_corner_costs() {
        // Two right angles
        let stair = chain(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (20.0, 10.0)]);
        assert!((CostEstimator::chain_corner_cost(&stair) - 60.0).abs() < 1e-9);

        // One 45-degree turn
        let smooth = chain(&[(0.0, 0.0), (10.0, 0.0), (20.0, 10.0)]);
        assert!((CostEstimator::chain_corner_cost(&smooth) - 1.0).abs() < 1e-9);

        // Straight line has no corner cost
        let flat = chain(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        assert_eq!(CostEstimator::chain_corner_cost(&flat), 0.0);
    }

    #[test]
    fn test_is_better_tolerances() {
        let orig = CostEstimator {
            length_cost: 100.0,
            corner_cost: 60.0,
        };

        // Strictly better in both
        let better = CostEstimator {
            length_cost: 90.0,
            corner_cost: 30.0,
        };
        assert!(better.is_better(&orig, 0.0, 0.0));

        // Corner regression inside tolerance, length improved
        let tradeoff = CostEstimator {
            length_cost: 90.0,
            corner_cost: 62.0,
        };
        assert!(tradeoff.is_better(&orig, 0.0, 5.0));
        assert!(!tradeoff.is_better(&orig, 0.0, 1.0));

        // Exact tie favors the original
        assert!(!orig.is_better(&orig, 0.0, 0.0));
    }

    #[test]
    fn test_incremental_matches_full() {
        let a = RouteLine::new(
            chain(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]),
            0.2,
            "F.Cu",
            None,
        );
        let b = RouteLine::new(
            chain(&[(0.0, 0.0), (10.0, 10.0), (20.0, 10.0)]),
            0.2,
            "F.Cu",
            None,
        );

        let mut running = CostEstimator::new();
        running.add(&a);
        running.replace_line(&a, &b);

        let full = CostEstimator::of_line(&b);
        assert!((running.length_cost() - full.length_cost()).abs() < 1e-6);
        assert!((running.corner_cost() - full.corner_cost()).abs() < 1e-9);
    }
}
