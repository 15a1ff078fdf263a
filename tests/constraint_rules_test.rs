// Constraint behavior: pinned vertices, vertex windows, area restriction,
// angle masks and topology preservation.
use trace_optimizer::geometry::{Aabb, Direction45, LineChain, Point, Shape};
use trace_optimizer::optimizer::{AngleConstraint45, Effort, Optimizer};
use trace_optimizer::world::{ItemKind, SpatialWorld};
use trace_optimizer::RouteLine;

fn chain(pts: &[(f32, f32)]) -> LineChain {
    LineChain::new(pts.iter().map(|&(x, y)| Point::new(x, y)).collect())
}

fn staircase() -> RouteLine {
    RouteLine::new(
        chain(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (20.0, 10.0),
            (20.0, 20.0),
        ]),
        0.5,
        "F.Cu",
        Some("N1"),
    )
}

#[test]
fn test_pinned_vertex_survives_optimization() {
    let world = SpatialWorld::new();
    let pinned = Point::new(10.0, 10.0);

    let mut line = staircase();
    let changed = Optimizer::optimize_line(&mut line, Effort::standard(), &world, Some(pinned))
        .expect("optimize failed");

    println!("pinned run: {:?}", line.chain().points());

    assert!(changed, "spans away from the pin are still optimizable");
    assert!(
        line.chain().find_vertex(pinned).is_some(),
        "pinned vertex must keep its exact coordinates"
    );

    // Without the pin the same line collapses completely
    let mut free = staircase();
    Optimizer::optimize_line(&mut free, Effort::standard(), &world, None).unwrap();
    assert!(free.chain().find_vertex(pinned).is_none());
}

#[test]
fn test_vertex_range_window_limits_rewrites() {
    let world = SpatialWorld::new();

    let mut line = staircase();
    let mut optimizer = Optimizer::new(&world);
    optimizer.set_effort(Effort::standard());
    optimizer.set_restrict_vertex_range(0, 2);

    let changed = optimizer.optimize(&mut line).expect("optimize failed");

    assert!(changed, "the window still allows rewrites near the start");
    assert!(
        line.chain().find_vertex(Point::new(20.0, 10.0)).is_some(),
        "vertices beyond the window must not be touched"
    );
    assert!(
        line.chain().find_vertex(Point::new(20.0, 20.0)).is_some(),
        "the endpoint beyond the window must not be touched"
    );
}

#[test]
fn test_area_restriction_confines_rewrites() {
    let world = SpatialWorld::new();

    let mut line = staircase();
    let mut optimizer = Optimizer::new(&world);
    optimizer.set_effort(Effort::standard());
    optimizer.set_restrict_area(Aabb::new([-1.0, -1.0], [11.0, 11.0]));

    let changed = optimizer.optimize(&mut line).expect("optimize failed");

    assert!(changed);
    for p in [Point::new(20.0, 10.0), Point::new(20.0, 20.0)] {
        assert!(
            line.chain().find_vertex(p).is_some(),
            "path outside the allowed area changed at {:?}",
            p
        );
    }
}

#[test]
fn test_angle_mask_forces_entry_direction() {
    let world = SpatialWorld::new();

    let mut line = staircase();
    let mut optimizer = Optimizer::new(&world);
    optimizer.set_effort(Effort::standard());
    optimizer.add_constraint(Box::new(AngleConstraint45::new(
        Direction45::E.mask(),
        u32::MAX,
    )));

    let changed = optimizer.optimize(&mut line).expect("optimize failed");

    assert!(changed);
    let first = line.chain().segment(0);
    assert_eq!(
        Direction45::from_seg(&first),
        Direction45::E,
        "every accepted splice must enter eastward"
    );
}

#[test]
fn test_topology_preservation_blocks_side_change() {
    let mut world = SpatialWorld::new();
    // Another net's via inside the corner a shortcut would cut across
    world.add(
        ItemKind::Via,
        Shape::Circle {
            center: Point::new(8.0, 2.0),
            radius: 0.5,
        },
        "F.Cu",
        Some("GND"),
    );

    let make_line = || {
        RouteLine::new(
            chain(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]),
            0.5,
            "F.Cu",
            Some("N1"),
        )
    };

    let mut constrained = make_line();
    let changed = Optimizer::optimize_line(
        &mut constrained,
        Effort {
            keep_topology: true,
            ..Effort::standard()
        },
        &world,
        None,
    )
    .expect("optimize failed");
    assert!(
        !changed,
        "the only shortcut crosses to the other side of the via"
    );

    // Without the constraint the diagonal shortcut is taken
    let mut free = make_line();
    let changed = Optimizer::optimize_line(&mut free, Effort::standard(), &world, None).unwrap();
    assert!(changed);
    assert_eq!(free.chain().point_count(), 2);
}
