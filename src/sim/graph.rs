//! Constraint graph: attachments, chains, assemblies and graph-aware erase
//!
//! An assembly is every body reachable from a pin through constraints. All
//! members share one collision category so they overlap each other while
//! still colliding with the rest of the world. Deleting part of an assembly
//! walks the adjacency index to decide what else has to go.

use std::collections::{BTreeSet, HashSet, VecDeque};

use glam::Vec2;

use super::body::BodyRole;
use super::filter::{CategoryAllocator, CollisionFilter};
use super::ids::{EntityId, EntityKind};
use super::state::Simulation;
use super::world::{Constraint, ConstraintHandle, World};
use crate::consts::{CHAIN_DAMPING, CHAIN_SLACK, CHAIN_STIFFNESS};
use crate::net::protocol::{NetEvent, ReleaseCategory};

/// What an erase did to the local world
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EraseOutcome {
    pub removed_bodies: Vec<EntityId>,
    pub removed_constraints: usize,
    /// Pins orphaned by the erase, for which a follow-up erase was requested
    pub cascaded: Vec<EntityId>,
    /// Category freed by a pin erase
    pub released: Option<u16>,
}

impl EraseOutcome {
    pub fn is_noop(&self) -> bool {
        self.removed_bodies.is_empty() && self.removed_constraints == 0
    }
}

/// Pin `pin` onto `host` with a zero-length rigid link at the pin's
/// current location
pub fn attach(world: &mut World, host: &EntityId, pin: &EntityId) -> Option<ConstraintHandle> {
    let pin_position = world.body(pin)?.position;
    let point_a = world.body(host)?.to_local(pin_position);
    Some(world.add_constraint(Constraint::rigid(
        host.clone(),
        point_a,
        pin.clone(),
        Vec2::ZERO,
    )))
}

/// Filter of the assembly `host` already belongs to: the filter of the first
/// pin attached to it by a non-chain constraint
pub fn assembly_filter(world: &World, host: &EntityId) -> Option<CollisionFilter> {
    world
        .constraints_of(host)
        .into_iter()
        .filter_map(|h| world.constraint(h))
        .filter(|c| !c.is_chain())
        .filter_map(|c| c.other(host))
        .filter(|id| id.is_pin())
        .find_map(|id| world.body(id))
        .map(|pin| pin.filter)
}

/// Every body reachable from `seeds` through constraints, seeds first,
/// then breadth-first. Seeds missing from the world are skipped.
pub fn component(world: &World, seeds: &[EntityId]) -> Vec<EntityId> {
    let mut visited: HashSet<EntityId> = HashSet::new();
    let mut order = Vec::new();
    let mut queue: VecDeque<EntityId> = VecDeque::new();

    for seed in seeds {
        if world.contains_body(seed) && visited.insert(seed.clone()) {
            queue.push_back(seed.clone());
        }
    }

    while let Some(id) = queue.pop_front() {
        for handle in world.constraints_of(&id) {
            let Some(next) = world.constraint(handle).and_then(|c| c.other(&id)) else {
                continue;
            };
            if world.contains_body(next) && visited.insert(next.clone()) {
                queue.push_back(next.clone());
            }
        }
        order.push(id);
    }

    order
}

/// Give every body in the component of `seeds` the same filter. Returns the
/// number of bodies updated.
pub fn propagate_category(world: &mut World, seeds: &[EntityId], filter: CollisionFilter) -> usize {
    let members = component(world, seeds);
    for id in &members {
        if let Some(body) = world.body_mut(id) {
            body.filter = filter;
        }
    }
    if !members.is_empty() {
        log::debug!(
            "Assembly of {} bodies now uses category {:#06x}",
            members.len(),
            filter.category
        );
    }
    members.len()
}

/// Elastic link between two distinct pins.
///
/// `length` defaults to [`CHAIN_SLACK`] times the current distance. Returns
/// None when either pin is missing, the pins are the same, or a chain with
/// this id already exists.
pub fn create_chain(
    world: &mut World,
    chain_id: &EntityId,
    pin_a: &EntityId,
    pin_b: &EntityId,
    stiffness: f32,
    damping: f32,
    length: Option<f32>,
) -> Option<ConstraintHandle> {
    if pin_a == pin_b {
        log::debug!("Refusing to chain {} to itself", pin_a);
        return None;
    }
    if !world.chain_handles(chain_id).is_empty() {
        log::debug!("Chain {} already exists", chain_id);
        return None;
    }

    let a = world.body(pin_a).filter(|b| b.role == BodyRole::Pin)?.position;
    let b = world.body(pin_b).filter(|b| b.role == BodyRole::Pin)?.position;
    let length = length.unwrap_or_else(|| a.distance(b) * CHAIN_SLACK);

    let handle = world.add_constraint(Constraint {
        label: Some(chain_id.clone()),
        body_a: Some(pin_a.clone()),
        point_a: Vec2::ZERO,
        body_b: Some(pin_b.clone()),
        point_b: Vec2::ZERO,
        stiffness,
        damping,
        length,
    });
    log::debug!("Chain {} links {} and {} (length {:.1})", chain_id, pin_a, pin_b, length);
    Some(handle)
}

/// Chain with the default tuning
pub fn create_default_chain(
    world: &mut World,
    chain_id: &EntityId,
    pin_a: &EntityId,
    pin_b: &EntityId,
) -> Option<ConstraintHandle> {
    create_chain(world, chain_id, pin_a, pin_b, CHAIN_STIFFNESS, CHAIN_DAMPING, None)
}

/// Remove an entity and whatever the graph says must go with it.
///
/// Erase is idempotent: an id that is not in the world is a no-op.
pub fn erase(sim: &mut Simulation, id: &EntityId) -> EraseOutcome {
    let outcome = match id.kind {
        EntityKind::Pin => erase_pin(sim, id),
        EntityKind::Chain => erase_chain(&mut sim.world, id),
        EntityKind::Shape => erase_shape(sim, id),
        EntityKind::Scenery => {
            log::debug!("Ignoring erase of level geometry {}", id);
            EraseOutcome::default()
        }
    };
    if outcome.is_noop() {
        log::debug!("Erase of {} found nothing", id);
    }
    outcome
}

/// Remove a pin and its constraints, detaching bodies that end up outside
/// any assembly, and release the pin's category once nothing carries it.
pub fn erase_pin(sim: &mut Simulation, id: &EntityId) -> EraseOutcome {
    let mut outcome = EraseOutcome::default();
    let Some(pin) = sim.world.body(id) else {
        return outcome;
    };
    let category = pin.filter.category;

    let handles = sim.world.constraints_of(id);
    let removal: BTreeSet<ConstraintHandle> = handles.iter().copied().collect();
    for handle in &handles {
        let other = sim
            .world
            .constraint(*handle)
            .and_then(|c| c.other(id))
            .cloned();
        if let Some(other) = other {
            let still_linked = sim
                .world
                .constraints_of(&other)
                .iter()
                .any(|h| !removal.contains(h));
            if !still_linked {
                if let Some(body) = sim.world.body_mut(&other) {
                    body.filter = CollisionFilter::default_world();
                }
            }
        }
        if sim.world.remove_constraint(*handle).is_some() {
            outcome.removed_constraints += 1;
        }
    }

    sim.world.remove_body(id);
    sim.pins.remove(id);
    outcome.removed_bodies.push(id.clone());
    if sim.chain_anchor.as_ref() == Some(id) {
        sim.chain_anchor = None;
    }

    let carried = sim.world.bodies().iter().any(|b| b.filter.category == category);
    if CategoryAllocator::is_allocatable(category) && (handles.is_empty() || !carried) {
        sim.categories.release(category);
        outcome.released = Some(category);
        let current_level = sim.level;
        sim.emit(NetEvent::ReleaseCategory(ReleaseCategory {
            category,
            current_level,
        }));
        log::debug!("Released category {:#06x} with {}", category, id);
    }

    outcome
}

/// Remove every constraint labelled `id`
pub fn erase_chain(world: &mut World, id: &EntityId) -> EraseOutcome {
    let mut outcome = EraseOutcome::default();
    for handle in world.chain_handles(id) {
        if world.remove_constraint(handle).is_some() {
            outcome.removed_constraints += 1;
        }
    }
    outcome
}

/// Remove a drawn body. Pins left with no other attachment are erased too,
/// through a follow-up erase request so the peer removes them as well.
pub fn erase_shape(sim: &mut Simulation, id: &EntityId) -> EraseOutcome {
    let mut outcome = EraseOutcome::default();
    if !sim.world.contains_body(id) {
        return outcome;
    }

    for handle in sim.world.constraints_of(id) {
        let linked = sim
            .world
            .constraint(handle)
            .and_then(|c| c.other(id))
            .filter(|other| other.is_pin())
            .cloned();

        if let Some(pin) = linked {
            let world = &sim.world;
            let other_attachments = world
                .constraints_of(&pin)
                .into_iter()
                .filter(|h| *h != handle)
                .filter_map(|h| world.constraint(h))
                .any(|c| !c.is_chain());
            if !other_attachments && !outcome.cascaded.contains(&pin) {
                sim.request_erase(pin.clone(), true);
                outcome.cascaded.push(pin);
            }
        }

        if sim.world.remove_constraint(handle).is_some() {
            outcome.removed_constraints += 1;
        }
    }

    sim.world.remove_body(id);
    outcome.removed_bodies.push(id.clone());
    outcome
}
