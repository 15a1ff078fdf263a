//! Bounded collision cache
//!
//! Each optimization pass issues many probes against largely the same static
//! neighborhood; caching the items seen so far avoids re-querying the world
//! on every candidate evaluation. Entries are tagged static (board items the
//! routing engine registered up front) or dynamic (obstacles discovered
//! during a pass); only dynamic entries are subject to pressure eviction.

use anyhow::Result;
use indexmap::IndexMap;
use std::sync::Arc;

use crate::geometry::Shape;
use crate::world::{CollisionWorld, Item, KindMask};

/// Upper bound on cached items
pub const MAX_CACHED_ITEMS: usize = 256;

#[derive(Debug)]
struct CacheEntry {
    item: Arc<Item>,
    hits: u32,
    is_static: bool,
}

/// Item cache keyed by item id, insertion-ordered for deterministic eviction
#[derive(Debug, Default)]
pub(crate) struct CollisionCache {
    entries: IndexMap<u64, CacheEntry>,
}

impl CollisionCache {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn add_static(&mut self, item: Arc<Item>) {
        self.insert(item, true);
    }

    pub fn remove(&mut self, id: u64) {
        self.entries.shift_remove(&id);
    }

    /// Drop all entries, or only the static ones
    pub fn clear(&mut self, static_only: bool) {
        if static_only {
            self.entries.retain(|_, e| !e.is_static);
        } else {
            self.entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(&mut self, item: Arc<Item>, is_static: bool) {
        if let Some(entry) = self.entries.get_mut(&item.id) {
            // Promotion to static is allowed, demotion is not
            entry.is_static |= is_static;
            return;
        }

        if self.entries.len() >= MAX_CACHED_ITEMS && !self.evict_one() {
            // Cache full of static entries; skip dynamic inserts
            if !is_static {
                return;
            }
        }

        self.entries.insert(
            item.id,
            CacheEntry {
                item,
                hits: 0,
                is_static,
            },
        );
    }

    /// Evict the least useful dynamic entry: fewest hits, oldest first.
    /// Static entries are exempt.
    fn evict_one(&mut self) -> bool {
        let victim = self
            .entries
            .iter()
            .filter(|(_, e)| !e.is_static)
            .min_by_key(|(_, e)| e.hits)
            .map(|(id, _)| *id);

        match victim {
            Some(id) => {
                self.entries.shift_remove(&id);
                true
            }
            None => false,
        }
    }

    /// Test `shape` against cached items first, then the world. World hits
    /// are added to the cache as dynamic entries when `update` is set.
    pub fn check_colliding(
        &mut self,
        shape: &Shape,
        clearance: f32,
        layer: &str,
        exclude_net: Option<&str>,
        kinds: KindMask,
        world: &dyn CollisionWorld,
        update: bool,
    ) -> Result<bool> {
        for entry in self.entries.values_mut() {
            let item = &entry.item;

            if !kinds.contains(item.kind) || item.layer != layer {
                continue;
            }

            if let (Some(a), Some(b)) = (exclude_net, item.net.as_deref()) {
                if a == b {
                    continue;
                }
            }

            if item.shape.collides_with(shape, clearance) {
                entry.hits += 1;
                return Ok(true);
            }
        }

        let hits = world.query_colliding(shape, clearance, layer, exclude_net, kinds)?;

        if let Some(first) = hits.first() {
            if update {
                self.insert(first.clone(), false);
            }
            return Ok(true);
        }

        Ok(false)
    }

    #[cfg(test)]
    fn is_static(&self, id: u64) -> Option<bool> {
        self.entries.get(&id).map(|e| e.is_static)
    }

    #[cfg(test)]
    fn hits(&self, id: u64) -> Option<u32> {
        self.entries.get(&id).map(|e| e.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Seg};
    use crate::world::{ItemKind, SpatialWorld};

    fn capsule(x0: f32, y0: f32, x1: f32, y1: f32) -> Shape {
        Shape::Segment {
            seg: Seg::new(Point::new(x0, y0), Point::new(x1, y1)),
            width: 0.2,
        }
    }

    #[test]
    fn test_world_hit_becomes_dynamic_entry() {
        let mut world = SpatialWorld::new();
        let via = world.add(
            ItemKind::Via,
            Shape::Circle {
                center: Point::new(5.0, 0.0),
                radius: 1.0,
            },
            "F.Cu",
            None,
        );

        let mut cache = CollisionCache::new();
        let probe = capsule(0.0, 0.0, 10.0, 0.0);

        let hit = cache
            .check_colliding(&probe, 0.0, "F.Cu", None, KindMask::ALL, &world, true)
            .unwrap();
        assert!(hit);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.is_static(via.id), Some(false));

        // Second probe is served from the cache and counted
        let hit = cache
            .check_colliding(&probe, 0.0, "F.Cu", None, KindMask::ALL, &world, true)
            .unwrap();
        assert!(hit);
        assert_eq!(cache.hits(via.id), Some(1));
    }

    #[test]
    fn test_clear_static_only() {
        let mut world = SpatialWorld::new();
        let a = world.add(
            ItemKind::Pad,
            Shape::Circle {
                center: Point::new(0.0, 0.0),
                radius: 1.0,
            },
            "F.Cu",
            None,
        );
        let b = world.add(
            ItemKind::Via,
            Shape::Circle {
                center: Point::new(5.0, 0.0),
                radius: 1.0,
            },
            "F.Cu",
            None,
        );

        let mut cache = CollisionCache::new();
        cache.add_static(a.clone());
        cache.insert(b.clone(), false);

        cache.clear(true);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.is_static(b.id), Some(false));

        cache.clear(false);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_eviction_spares_static_entries() {
        let mut world = SpatialWorld::new();
        let mut cache = CollisionCache::new();

        let pinned = world.add(
            ItemKind::Pad,
            Shape::Circle {
                center: Point::new(-100.0, 0.0),
                radius: 0.5,
            },
            "F.Cu",
            None,
        );
        cache.add_static(pinned.clone());

        // Fill past the bound with dynamic entries
        for i in 0..MAX_CACHED_ITEMS + 10 {
            let item = world.add(
                ItemKind::Via,
                Shape::Circle {
                    center: Point::new(i as f32 * 10.0, 0.0),
                    radius: 0.5,
                },
                "F.Cu",
                None,
            );
            cache.insert(item, false);
        }

        assert!(cache.len() <= MAX_CACHED_ITEMS);
        assert_eq!(cache.is_static(pinned.id), Some(true));
    }
}
