//! R-tree backed reference implementation of the collision world
//!
//! `SpatialWorld` is the stand-alone realization of the query interface a
//! routing engine provides: an R-tree of items, envelope queries for
//! candidate pruning, then precise shape clearance tests.

use anyhow::Result;
use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;

use super::items::{Item, ItemKind, Joint, KindMask};
use super::CollisionWorld;
use crate::geometry::{Aabb, Point, Shape, EPS};

/// Item wrapper for R-tree spatial indexing
#[derive(Clone, Debug)]
struct IndexedItem {
    item: Arc<Item>,
    bounds: AABB<[f32; 2]>,
}

impl IndexedItem {
    fn new(item: Arc<Item>) -> Self {
        let b = item.shape.bounds();
        Self {
            item,
            bounds: AABB::from_corners(b.min, b.max),
        }
    }
}

impl PartialEq for IndexedItem {
    fn eq(&self, other: &Self) -> bool {
        self.item.id == other.item.id
    }
}

impl RTreeObject for IndexedItem {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

impl rstar::PointDistance for IndexedItem {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        self.bounds.distance_2(point)
    }
}

/// Spatial index of board items with layer/net/kind filtered queries
#[derive(Debug, Default)]
pub struct SpatialWorld {
    tree: RTree<IndexedItem>,
    next_id: u64,
}

impl SpatialWorld {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            next_id: 1,
        }
    }

    /// Insert an item, assigning it a fresh id. Returns the shared handle.
    pub fn add(
        &mut self,
        kind: ItemKind,
        shape: Shape,
        layer: impl Into<String>,
        net: Option<&str>,
    ) -> Arc<Item> {
        let item = Arc::new(Item {
            id: self.next_id,
            kind,
            shape,
            layer: layer.into(),
            net: net.map(str::to_owned),
        });
        self.next_id += 1;
        self.tree.insert(IndexedItem::new(item.clone()));
        item
    }

    pub fn remove(&mut self, item: &Arc<Item>) -> bool {
        self.tree.remove(&IndexedItem::new(item.clone())).is_some()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    fn locate(&self, area: &Aabb) -> impl Iterator<Item = &IndexedItem> {
        let envelope = AABB::from_corners(area.min, area.max);
        self.tree.locate_in_envelope_intersecting(&envelope)
    }
}

/// Layer / net-exclusion / kind filter shared by all queries
fn passes_filters(
    item: &Item,
    layer: &str,
    exclude_net: Option<&str>,
    kinds: KindMask,
) -> bool {
    if !kinds.contains(item.kind) {
        return false;
    }

    if item.layer != layer {
        return false;
    }

    // Same net - skip
    match (exclude_net, item.net.as_deref()) {
        (Some(a), Some(b)) if a == b => false,
        _ => true,
    }
}

impl CollisionWorld for SpatialWorld {
    fn query_colliding(
        &self,
        shape: &Shape,
        clearance: f32,
        layer: &str,
        exclude_net: Option<&str>,
        kinds: KindMask,
    ) -> Result<Vec<Arc<Item>>> {
        let search = shape.bounds().expanded(clearance + EPS);
        let mut hits = Vec::new();

        for indexed in self.locate(&search) {
            let item = &indexed.item;

            if !passes_filters(item, layer, exclude_net, kinds) {
                continue;
            }

            if item.shape.collides_with(shape, clearance) {
                hits.push(item.clone());
            }
        }

        Ok(hits)
    }

    fn query_area(
        &self,
        area: &Aabb,
        layer: &str,
        exclude_net: Option<&str>,
        kinds: KindMask,
    ) -> Result<Vec<Arc<Item>>> {
        let mut hits = Vec::new();

        for indexed in self.locate(area) {
            if passes_filters(&indexed.item, layer, exclude_net, kinds) {
                hits.push(indexed.item.clone());
            }
        }

        Ok(hits)
    }

    fn find_joint(&self, pos: Point, layer: &str, net: Option<&str>) -> Result<Option<Joint>> {
        let probe = Aabb::new([pos.x, pos.y], [pos.x, pos.y]).expanded(EPS * 10.0);
        let mut items: Vec<Arc<Item>> = Vec::new();

        for indexed in self.locate(&probe) {
            let item = &indexed.item;

            if item.layer != layer {
                continue;
            }

            // A joint only ties items of one net together
            if let (Some(a), Some(b)) = (net, item.net.as_deref()) {
                if a != b {
                    continue;
                }
            }

            let attached = match &item.shape {
                Shape::Segment { seg, .. } => seg.a.approx_eq(pos) || seg.b.approx_eq(pos),
                _ => item.anchor().approx_eq(pos),
            };

            if attached {
                items.push(item.clone());
            }
        }

        if items.is_empty() {
            return Ok(None);
        }

        Ok(Some(Joint {
            pos,
            layer: layer.to_owned(),
            net: net.map(str::to_owned),
            items,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Seg;

    #[test]
    fn test_query_colliding_filters() {
        let mut world = SpatialWorld::new();
        world.add(
            ItemKind::Via,
            Shape::Circle {
                center: Point::new(5.0, 0.0),
                radius: 1.0,
            },
            "F.Cu",
            Some("GND"),
        );

        let probe = Shape::Segment {
            seg: Seg::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            width: 0.5,
        };

        let hits = world
            .query_colliding(&probe, 0.0, "F.Cu", None, KindMask::ALL)
            .unwrap();
        assert_eq!(hits.len(), 1);

        // Wrong layer
        let hits = world
            .query_colliding(&probe, 0.0, "B.Cu", None, KindMask::ALL)
            .unwrap();
        assert!(hits.is_empty());

        // Same net excluded
        let hits = world
            .query_colliding(&probe, 0.0, "F.Cu", Some("GND"), KindMask::ALL)
            .unwrap();
        assert!(hits.is_empty());

        // Kind filtered out
        let hits = world
            .query_colliding(&probe, 0.0, "F.Cu", None, KindMask::of(&[ItemKind::Pad]))
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_find_joint() {
        let mut world = SpatialWorld::new();
        let pad = world.add(
            ItemKind::Pad,
            Shape::Circle {
                center: Point::new(0.0, 0.0),
                radius: 1.0,
            },
            "F.Cu",
            Some("N1"),
        );
        world.add(
            ItemKind::Segment,
            Shape::Segment {
                seg: Seg::new(Point::new(0.0, 0.0), Point::new(5.0, 0.0)),
                width: 0.3,
            },
            "F.Cu",
            Some("N1"),
        );

        let joint = world
            .find_joint(Point::new(0.0, 0.0), "F.Cu", Some("N1"))
            .unwrap()
            .expect("joint expected at pad center");
        assert_eq!(joint.items.len(), 2);
        assert_eq!(joint.pad_or_via().unwrap().id, pad.id);

        let none = world
            .find_joint(Point::new(3.0, 3.0), "F.Cu", Some("N1"))
            .unwrap();
        assert!(none.is_none());
    }
}
