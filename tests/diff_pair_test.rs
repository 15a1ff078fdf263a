// Differential pair optimization: joint rail merging with coupling
// preservation.
use trace_optimizer::geometry::{segment_distance, LineChain, Point};
use trace_optimizer::optimizer::Optimizer;
use trace_optimizer::world::SpatialWorld;
use trace_optimizer::{DiffPair, RouteLine};

fn chain(pts: &[(f32, f32)]) -> LineChain {
    LineChain::new(pts.iter().map(|&(x, y)| Point::new(x, y)).collect())
}

fn rail(pts: &[(f32, f32)], net: &str) -> RouteLine {
    RouteLine::new(chain(pts), 0.2, "F.Cu", Some(net))
}

/// Minimum centerline distance between any two segments of the rails
fn min_rail_gap(pair: &DiffPair) -> f32 {
    let p = pair.p().chain();
    let n = pair.n().chain();
    let mut min_d = f32::MAX;

    for i in 0..p.segment_count() {
        for j in 0..n.segment_count() {
            min_d = min_d.min(segment_distance(&p.segment(i), &n.segment(j)));
        }
    }

    min_d
}

// Vertical offset that keeps a 45-degree jog coupled on both the straight
// and the diagonal sections
const OFFSET: f32 = 2.828_427;

fn jogged_pair(scale: f32) -> DiffPair {
    let p = [
        (0.0, 0.0),
        (10.0 * scale, 0.0),
        (10.0 * scale + 5.0, 5.0),
        (10.0 * scale + 15.0, 5.0),
        (10.0 * scale + 20.0, 10.0),
        (20.0 * scale + 20.0, 10.0),
    ];
    let n: Vec<(f32, f32)> = p.iter().map(|&(x, y)| (x, y - OFFSET)).collect();

    DiffPair::new(rail(&p, "DP_P"), rail(&n, "DP_N"), 2.4, 0.6)
}

#[test]
fn test_long_pair_jog_is_merged() {
    let world = SpatialWorld::new();
    // Long coupled runs on both sides of a small jog: straightening it
    // costs only a small fraction of the coupled length
    let mut pair = jogged_pair(10.0);

    let before = pair.coupled_length(pair.p().chain(), pair.n().chain());

    let mut optimizer = Optimizer::new(&world);
    let changed = optimizer.optimize_pair(&mut pair).expect("optimize failed");

    let after = pair.coupled_length(pair.p().chain(), pair.n().chain());
    println!(
        "pair merge: P {} / N {} vertices, coupled {:.1} -> {:.1}, min gap {:.2}",
        pair.p().chain().point_count(),
        pair.n().chain().point_count(),
        before,
        after,
        min_rail_gap(&pair)
    );

    assert!(changed, "the jog must be straightened on both rails");
    assert!(pair.p().chain().point_count() < 6);
    assert!(pair.n().chain().point_count() < 6);

    assert!(
        min_rail_gap(&pair) >= pair.gap() - pair.gap_tolerance() - 1e-3,
        "rail-to-rail gap fell below tolerance: {}",
        min_rail_gap(&pair)
    );
}

#[test]
fn test_short_pair_merge_rejected_when_it_decouples() {
    let world = SpatialWorld::new();
    // Jog dominates the pair; straightening one rail alone would destroy
    // most of the coupling
    let mut pair = jogged_pair(1.0);

    let p_before = pair.p().chain().clone();
    let n_before = pair.n().chain().clone();

    let mut optimizer = Optimizer::new(&world);
    let changed = optimizer.optimize_pair(&mut pair).expect("optimize failed");

    assert!(!changed, "decoupling rewrites must be rejected");
    assert_eq!(pair.p().chain().points(), p_before.points());
    assert_eq!(pair.n().chain().points(), n_before.points());
}

#[test]
fn test_rails_never_cross_after_merge() {
    let world = SpatialWorld::new();
    let mut pair = jogged_pair(10.0);

    let mut optimizer = Optimizer::new(&world);
    optimizer.optimize_pair(&mut pair).expect("optimize failed");

    assert!(
        min_rail_gap(&pair) > 0.0,
        "rails must stay strictly separated"
    );
}
