//! Interactive trace-path optimizer for a push-and-shove PCB router
//!
//! Given a routed polyline (or a coupled differential pair) that is already
//! collision-free, produce a geometrically equivalent but shorter,
//! straighter, less corner-heavy path without introducing new collisions or
//! violating caller-supplied constraints.
//!
//! The collision world is external: the routing engine owns the board items
//! and exposes them through the [`world::CollisionWorld`] query trait.
//! [`world::SpatialWorld`] is an R-tree backed reference implementation for
//! stand-alone use and tests.
//!
//! ```
//! use trace_optimizer::geometry::{LineChain, Point};
//! use trace_optimizer::line::RouteLine;
//! use trace_optimizer::optimizer::{Effort, Optimizer};
//! use trace_optimizer::world::SpatialWorld;
//!
//! let world = SpatialWorld::new();
//! let mut line = RouteLine::new(
//!     LineChain::new(vec![
//!         Point::new(0.0, 0.0),
//!         Point::new(10.0, 0.0),
//!         Point::new(10.0, 10.0),
//!         Point::new(20.0, 10.0),
//!     ]),
//!     0.25,
//!     "F.Cu",
//!     Some("N1"),
//! );
//!
//! let changed = Optimizer::optimize_line(&mut line, Effort::standard(), &world, None)?;
//! assert!(changed);
//! # anyhow::Ok(())
//! ```

pub mod dp;
pub mod geometry;
pub mod line;
pub mod optimizer;
pub mod world;

pub use dp::DiffPair;
pub use line::RouteLine;
pub use optimizer::{Effort, Optimizer};
pub use world::{CollisionWorld, SpatialWorld};
