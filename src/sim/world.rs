//! World storage: bodies, constraints and the adjacency index between them

use std::collections::{BTreeMap, BTreeSet, HashMap};

use glam::Vec2;

use super::body::{Body, BodyRole};
use super::ids::EntityId;

/// Local handle for a constraint (never sent over the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub(crate) u32);

/// A link between two bodies, or a body and a fixed point
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Chain id for player-created chains, None for attachments
    pub label: Option<EntityId>,
    pub body_a: Option<EntityId>,
    /// Anchor in body A's frame (world point when body A is None)
    pub point_a: Vec2,
    pub body_b: Option<EntityId>,
    /// Anchor in body B's frame (world point when body B is None)
    pub point_b: Vec2,
    pub stiffness: f32,
    pub damping: f32,
    pub length: f32,
}

impl Constraint {
    /// Rigid zero-length link
    pub fn rigid(body_a: EntityId, point_a: Vec2, body_b: EntityId, point_b: Vec2) -> Self {
        Self {
            label: None,
            body_a: Some(body_a),
            point_a,
            body_b: Some(body_b),
            point_b,
            stiffness: 1.0,
            damping: 0.0,
            length: 0.0,
        }
    }

    pub fn is_chain(&self) -> bool {
        self.label.as_ref().is_some_and(EntityId::is_chain)
    }

    pub fn touches(&self, id: &EntityId) -> bool {
        self.body_a.as_ref() == Some(id) || self.body_b.as_ref() == Some(id)
    }

    /// The body on the opposite end from `id`
    pub fn other(&self, id: &EntityId) -> Option<&EntityId> {
        if self.body_a.as_ref() == Some(id) {
            self.body_b.as_ref()
        } else if self.body_b.as_ref() == Some(id) {
            self.body_a.as_ref()
        } else {
            None
        }
    }
}

/// All bodies and constraints of the current level
#[derive(Debug, Default)]
pub struct World {
    /// Insertion order is meaningful ("first body under the cursor")
    bodies: Vec<Body>,
    constraints: BTreeMap<ConstraintHandle, Constraint>,
    /// Entity id -> constraints touching it
    links: HashMap<EntityId, BTreeSet<ConstraintHandle>>,
    next_handle: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            constraints: BTreeMap::new(),
            links: HashMap::new(),
            next_handle: 1,
        }
    }

    pub fn add_body(&mut self, body: Body) {
        self.bodies.push(body);
    }

    /// Remove a body and any constraint still touching it
    pub fn remove_body(&mut self, id: &EntityId) -> Option<Body> {
        let index = self.bodies.iter().position(|b| &b.id == id)?;
        for handle in self.constraints_of(id) {
            self.remove_constraint(handle);
        }
        self.links.remove(id);
        Some(self.bodies.remove(index))
    }

    pub fn body(&self, id: &EntityId) -> Option<&Body> {
        self.bodies.iter().find(|b| &b.id == id)
    }

    pub fn body_mut(&mut self, id: &EntityId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| &b.id == id)
    }

    pub fn contains_body(&self, id: &EntityId) -> bool {
        self.body(id).is_some()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    /// First body with the given role
    pub fn find_role(&self, role: BodyRole) -> Option<&Body> {
        self.bodies.iter().find(|b| b.role == role)
    }

    pub fn find_role_mut(&mut self, role: BodyRole) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.role == role)
    }

    /// First body (insertion order) whose bounds contain `point` and passes `accept`
    pub fn body_at(&self, point: Vec2, accept: impl Fn(&Body) -> bool) -> Option<&Body> {
        self.bodies
            .iter()
            .find(|b| accept(b) && b.bounds().contains(point))
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> ConstraintHandle {
        let handle = ConstraintHandle(self.next_handle);
        self.next_handle += 1;
        for id in [&constraint.body_a, &constraint.body_b].into_iter().flatten() {
            self.links.entry(id.clone()).or_default().insert(handle);
        }
        self.constraints.insert(handle, constraint);
        handle
    }

    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Option<Constraint> {
        let constraint = self.constraints.remove(&handle)?;
        for id in [&constraint.body_a, &constraint.body_b].into_iter().flatten() {
            if let Some(set) = self.links.get_mut(id) {
                set.remove(&handle);
                if set.is_empty() {
                    self.links.remove(id);
                }
            }
        }
        Some(constraint)
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraints.get(&handle)
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintHandle, &Constraint)> {
        self.constraints.iter().map(|(h, c)| (*h, c))
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Mutable bodies alongside the constraints, for the solver
    pub(crate) fn split_mut(&mut self) -> (&mut [Body], impl Iterator<Item = &Constraint>) {
        (&mut self.bodies, self.constraints.values())
    }

    /// Constraints touching `id`, in handle order
    pub fn constraints_of(&self, id: &EntityId) -> Vec<ConstraintHandle> {
        self.links
            .get(id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Handles of constraints carrying the chain label `id`
    pub fn chain_handles(&self, id: &EntityId) -> Vec<ConstraintHandle> {
        self.constraints
            .iter()
            .filter(|(_, c)| c.label.as_ref() == Some(id))
            .map(|(h, _)| *h)
            .collect()
    }

    /// World-space anchor of one end of a constraint
    pub fn anchor(&self, body: Option<&EntityId>, point: Vec2) -> Option<Vec2> {
        match body {
            Some(id) => self.body(id).map(|b| b.to_world(point)),
            None => Some(point),
        }
    }

    /// World-space endpoints of a constraint (None if a body is missing)
    pub fn endpoints(&self, constraint: &Constraint) -> Option<(Vec2, Vec2)> {
        let a = self.anchor(constraint.body_a.as_ref(), constraint.point_a)?;
        let b = self.anchor(constraint.body_b.as_ref(), constraint.point_b)?;
        Some((a, b))
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.constraints.clear();
        self.links.clear();
    }
}
