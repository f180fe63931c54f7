//! Collision filters and category allocation
//!
//! Categories are 16-bit masks. `0x0001` is the shared world category,
//! `0x0002` belongs to pin assemblies authored into level geometry, and the
//! remaining bits are handed out one per player-built assembly so the pieces
//! of an assembly can overlap each other but not anything else.

use serde::{Deserialize, Serialize};

/// World category: collides with everything, itself included
pub const DEFAULT_CATEGORY: u16 = 0x0001;
/// Reserved for pin assemblies in fixed level geometry
pub const LEVEL_ASSEMBLY_CATEGORY: u16 = 0x0002;
/// Everything
pub const MASK_ALL: u16 = 0xFFFF;
/// Bits available to player assemblies
const ALLOCATABLE: u16 = !(DEFAULT_CATEGORY | LEVEL_ASSEMBLY_CATEGORY);

/// Mask for a body in `category`: everything except its own peers
#[inline]
pub fn mask_for(category: u16) -> u16 {
    if category == DEFAULT_CATEGORY {
        MASK_ALL
    } else {
        MASK_ALL & !category
    }
}

/// Group number paired with a freshly allocated category.
///
/// Negative so members of one assembly never collide even if their masks
/// are later widened.
#[inline]
pub fn group_for(category: u16) -> i32 {
    -(category.trailing_zeros() as i32)
}

/// Collision filter carried by every body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub group: i32,
    pub category: u16,
    pub mask: u16,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::default_world()
    }
}

impl CollisionFilter {
    /// Plain world geometry
    pub fn default_world() -> Self {
        Self {
            group: 0,
            category: DEFAULT_CATEGORY,
            mask: MASK_ALL,
        }
    }

    /// Filter for an assembly member
    pub fn assembly(category: u16, group: i32) -> Self {
        Self {
            group,
            category,
            mask: mask_for(category),
        }
    }

    pub fn is_default(&self) -> bool {
        self.category == DEFAULT_CATEGORY
    }

    /// Group rule first (shared non-zero group decides), then both masks
    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        if self.group == other.group && self.group != 0 {
            return self.group > 0;
        }
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}

/// Hands out per-assembly category bits.
///
/// There is no garbage collection: a bit only becomes free again through
/// an explicit release (local pin erase or a peer's release signal).
#[derive(Debug, Clone, Default)]
pub struct CategoryAllocator {
    used: u16,
}

impl CategoryAllocator {
    pub fn new() -> Self {
        Self { used: 0 }
    }

    /// Lowest free bit, or None when all are taken
    pub fn allocate(&mut self) -> Option<u16> {
        let free = ALLOCATABLE & !self.used;
        if free == 0 {
            return None;
        }
        let bit = 1u16 << free.trailing_zeros();
        self.used |= bit;
        Some(bit)
    }

    /// Mark a category seen in a mirrored event as taken
    pub fn observe(&mut self, category: u16) {
        self.used |= category & ALLOCATABLE;
    }

    /// Return a category to the pool. Returns true if it was held.
    pub fn release(&mut self, category: u16) -> bool {
        let bits = category & ALLOCATABLE;
        let held = self.used & bits != 0;
        self.used &= !bits;
        held
    }

    pub fn is_used(&self, category: u16) -> bool {
        self.used & category & ALLOCATABLE != 0
    }

    /// Whether `category` is a bit this allocator manages
    pub fn is_allocatable(category: u16) -> bool {
        category != 0 && category & !ALLOCATABLE == 0
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_mask_collides_with_everything() {
        let f = CollisionFilter::assembly(DEFAULT_CATEGORY, 0);
        assert_eq!(f.mask, 0xFFFF);
        assert!(f.can_collide(&CollisionFilter::default_world()));
    }

    #[test]
    fn test_assembly_members_do_not_collide() {
        let a = CollisionFilter::assembly(0x0004, group_for(0x0004));
        let b = CollisionFilter::assembly(0x0004, group_for(0x0004));
        assert!(!a.can_collide(&b));
        assert!(a.can_collide(&CollisionFilter::default_world()));
    }

    #[test]
    fn test_positive_group_always_collides() {
        let a = CollisionFilter { group: 3, category: 0x0008, mask: 0 };
        let b = CollisionFilter { group: 3, category: 0x0008, mask: 0 };
        assert!(a.can_collide(&b));
    }

    #[test]
    fn test_allocator_skips_reserved_bits() {
        let mut alloc = CategoryAllocator::new();
        assert_eq!(alloc.allocate(), Some(0x0004));
        assert_eq!(alloc.allocate(), Some(0x0008));
        assert!(alloc.release(0x0004));
        assert_eq!(alloc.allocate(), Some(0x0004));
    }

    #[test]
    fn test_allocator_exhaustion() {
        let mut alloc = CategoryAllocator::new();
        let mut count = 0;
        while alloc.allocate().is_some() {
            count += 1;
        }
        assert_eq!(count, 14);
        alloc.reset();
        assert!(alloc.allocate().is_some());
    }

    #[test]
    fn test_observe_marks_bits() {
        let mut alloc = CategoryAllocator::new();
        alloc.observe(0x0004 | DEFAULT_CATEGORY);
        assert!(alloc.is_used(0x0004));
        assert_eq!(alloc.allocate(), Some(0x0008));
        assert!(!alloc.release(0x0010));
    }

    proptest! {
        #[test]
        fn prop_mask_excludes_own_category(bit in 1u32..16) {
            let category = 1u16 << bit;
            let f = CollisionFilter::assembly(category, 0);
            prop_assert_eq!(f.mask, 0xFFFF & !category);
            prop_assert!(!f.can_collide(&f));
        }
    }
}
