//! Differential pair support
//!
//! A coupled pair of rails routed with a controlled gap. The optimizer
//! rewrites each rail in turn and keeps only rewrites that preserve the
//! coupled run length within budget.

use crate::geometry::{LineChain, Seg};
use crate::line::RouteLine;

/// Two coupled rails (P and N) with a nominal gap and gap tolerance
#[derive(Debug, Clone)]
pub struct DiffPair {
    p: RouteLine,
    n: RouteLine,
    gap: f32,
    gap_tolerance: f32,
}

impl DiffPair {
    pub fn new(p: RouteLine, n: RouteLine, gap: f32, gap_tolerance: f32) -> Self {
        Self {
            p,
            n,
            gap,
            gap_tolerance,
        }
    }

    pub fn p(&self) -> &RouteLine {
        &self.p
    }

    pub fn n(&self) -> &RouteLine {
        &self.n
    }

    pub fn rail(&self, p_rail: bool) -> &RouteLine {
        if p_rail {
            &self.p
        } else {
            &self.n
        }
    }

    pub fn rail_mut(&mut self, p_rail: bool) -> &mut RouteLine {
        if p_rail {
            &mut self.p
        } else {
            &mut self.n
        }
    }

    pub fn gap(&self) -> f32 {
        self.gap
    }

    pub fn gap_tolerance(&self) -> f32 {
        self.gap_tolerance
    }

    /// Total length over which the two chains run parallel with a
    /// rail-to-rail distance inside the gap window
    pub fn coupled_length(&self, a: &LineChain, b: &LineChain) -> f32 {
        let mut total = 0.0;

        for i in 0..a.segment_count() {
            let sa = a.segment(i);

            for j in 0..b.segment_count() {
                total += self.coupled_overlap(&sa, &b.segment(j));
            }
        }

        total
    }

    fn coupled_overlap(&self, sa: &Seg, sb: &Seg) -> f32 {
        let da = sa.dir();
        let len_a = da.length();

        if len_a < 1e-6 {
            return 0.0;
        }

        let ua = da.scale(1.0 / len_a);
        let db = sb.dir();
        let len_b = db.length();

        if len_b < 1e-6 {
            return 0.0;
        }

        let ub = db.scale(1.0 / len_b);

        // Parallel or antiparallel only
        if ua.cross(ub).abs() > 1e-3 {
            return 0.0;
        }

        // Perpendicular distance between the supporting lines
        let dist = ua.cross(sb.a.sub(sa.a)).abs();
        if dist < self.gap - self.gap_tolerance || dist > self.gap + self.gap_tolerance {
            return 0.0;
        }

        // Overlap of sb's projection onto sa's axis
        let t0 = ua.dot(sb.a.sub(sa.a));
        let t1 = ua.dot(sb.b.sub(sa.a));
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };

        (hi.min(len_a) - lo.max(0.0)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn rail(pts: &[(f32, f32)]) -> RouteLine {
        RouteLine::new(
            LineChain::new(pts.iter().map(|&(x, y)| Point::new(x, y)).collect()),
            0.2,
            "F.Cu",
            Some("DP"),
        )
    }

    #[test]
    fn test_coupled_length_parallel_rails() {
        let p = rail(&[(0.0, 0.0), (10.0, 0.0)]);
        let n = rail(&[(0.0, -2.0), (10.0, -2.0)]);
        let pair = DiffPair::new(p, n, 2.0, 0.5);

        let coupled = pair.coupled_length(pair.p().chain(), pair.n().chain());
        assert!((coupled - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_uncoupled_when_gap_violated() {
        let p = rail(&[(0.0, 0.0), (10.0, 0.0)]);
        let n = rail(&[(0.0, -5.0), (10.0, -5.0)]);
        let pair = DiffPair::new(p, n, 2.0, 0.5);

        let coupled = pair.coupled_length(pair.p().chain(), pair.n().chain());
        assert!(coupled < 1e-4);
    }

    #[test]
    fn test_partial_overlap() {
        let p = rail(&[(0.0, 0.0), (10.0, 0.0)]);
        let n = rail(&[(6.0, -2.0), (20.0, -2.0)]);
        let pair = DiffPair::new(p, n, 2.0, 0.5);

        let coupled = pair.coupled_length(pair.p().chain(), pair.n().chain());
        assert!((coupled - 4.0).abs() < 1e-4);
    }
}
