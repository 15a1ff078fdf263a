//! Collision world interface and reference implementation
//!
//! The authoritative spatial index of board items is owned by the routing
//! engine, not by the optimizer; this module defines the query surface the
//! optimizer consumes and an R-tree backed implementation of it.
//!
//! # Submodules
//! - `items` - Item, kind masks, and joints
//! - `index` - `SpatialWorld`, the rstar-based reference world

mod index;
mod items;

use anyhow::Result;
use std::sync::Arc;

use crate::geometry::{Aabb, Point, Shape};

pub use index::SpatialWorld;
pub use items::{Item, ItemKind, Joint, KindMask};

/// Query surface of the external collision world. Queries are synchronous;
/// a failure from the engine's side is a hard error and aborts the
/// optimization pass that issued it.
pub trait CollisionWorld {
    /// All items whose boundary comes within `clearance` of `shape`,
    /// restricted to one layer, excluding a net, filtered by kind
    fn query_colliding(
        &self,
        shape: &Shape,
        clearance: f32,
        layer: &str,
        exclude_net: Option<&str>,
        kinds: KindMask,
    ) -> Result<Vec<Arc<Item>>>;

    /// All items whose envelope intersects `area`, with the same filters
    fn query_area(
        &self,
        area: &Aabb,
        layer: &str,
        exclude_net: Option<&str>,
        kinds: KindMask,
    ) -> Result<Vec<Arc<Item>>>;

    /// The joint at `pos`, if any item of the given layer/net is anchored
    /// there
    fn find_joint(&self, pos: Point, layer: &str, net: Option<&str>) -> Result<Option<Joint>>;
}
