//! Registry of pins placed in the current level

use super::geometry::Bounds;
use super::ids::EntityId;
use super::world::World;

/// Ordered list of pins, local and mirrored alike
#[derive(Debug, Clone, Default)]
pub struct PinRegistry {
    pins: Vec<EntityId>,
}

impl PinRegistry {
    pub fn new() -> Self {
        Self { pins: Vec::new() }
    }

    pub fn register(&mut self, id: EntityId) {
        if !self.pins.contains(&id) {
            self.pins.push(id);
        }
    }

    pub fn remove(&mut self, id: &EntityId) -> bool {
        let before = self.pins.len();
        self.pins.retain(|p| p != id);
        self.pins.len() != before
    }

    pub fn clear(&mut self) {
        self.pins.clear();
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.pins.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.pins.iter()
    }

    /// Pins whose bounds overlap `bounds`, in registration order.
    /// Pins that no longer exist in the world are skipped.
    pub fn overlapping(&self, world: &World, bounds: &Bounds) -> Vec<EntityId> {
        self.pins
            .iter()
            .filter(|id| {
                world
                    .body(id)
                    .is_some_and(|pin| pin.bounds().overlaps(bounds))
            })
            .cloned()
            .collect()
    }
}
