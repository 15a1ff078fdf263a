//! Board items visible to the optimizer
//!
//! Items are owned by the collision world; the optimizer only holds
//! reference-counted handles and never mutates them.

use std::sync::Arc;

use crate::geometry::{Point, Shape};

/// What kind of board object an item represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A routed track segment
    Segment,
    /// A drilled via
    Via,
    /// A component pad
    Pad,
    /// Board outline or keepout region
    Outline,
}

impl ItemKind {
    fn bit(self) -> u32 {
        match self {
            ItemKind::Segment => 0x01,
            ItemKind::Via => 0x02,
            ItemKind::Pad => 0x04,
            ItemKind::Outline => 0x08,
        }
    }
}

/// Set of item kinds a collision probe should consider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindMask(u32);

impl KindMask {
    pub const NONE: KindMask = KindMask(0);
    pub const ALL: KindMask = KindMask(0x0F);

    pub fn of(kinds: &[ItemKind]) -> Self {
        KindMask(kinds.iter().fold(0, |acc, k| acc | k.bit()))
    }

    pub fn with(self, kind: ItemKind) -> Self {
        KindMask(self.0 | kind.bit())
    }

    pub fn without(self, kind: ItemKind) -> Self {
        KindMask(self.0 & !kind.bit())
    }

    pub fn contains(self, kind: ItemKind) -> bool {
        self.0 & kind.bit() != 0
    }
}

impl Default for KindMask {
    fn default() -> Self {
        KindMask::ALL
    }
}

/// A shape-bearing board entity: a track, via, pad, outline or keepout.
/// Identity is the `id`; the world guarantees ids are unique.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: u64,
    pub kind: ItemKind,
    pub shape: Shape,
    pub layer: String,
    pub net: Option<String>,
}

impl Item {
    /// Reference position: pad/via center, segment midpoint, polygon centroid
    pub fn anchor(&self) -> Point {
        self.shape.anchor()
    }

    pub fn is_pad_or_via(&self) -> bool {
        matches!(self.kind, ItemKind::Via | ItemKind::Pad)
    }
}

/// A connectivity point where items meet, e.g. a pad center with its
/// attached tracks
#[derive(Debug, Clone)]
pub struct Joint {
    pub pos: Point,
    pub layer: String,
    pub net: Option<String>,
    pub items: Vec<Arc<Item>>,
}

impl Joint {
    /// First pad or via attached at this joint, if any
    pub fn pad_or_via(&self) -> Option<Arc<Item>> {
        self.items.iter().find(|it| it.is_pad_or_via()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mask() {
        let mask = KindMask::of(&[ItemKind::Via, ItemKind::Pad]);
        assert!(mask.contains(ItemKind::Via));
        assert!(mask.contains(ItemKind::Pad));
        assert!(!mask.contains(ItemKind::Segment));

        assert!(KindMask::ALL.without(ItemKind::Outline).contains(ItemKind::Via));
        assert!(!KindMask::NONE.contains(ItemKind::Segment));
    }
}
