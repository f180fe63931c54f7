//! Physics bodies
//!
//! Kinematic state uses position-Verlet: velocity is the difference between
//! the current and previous position over one step, so positional
//! corrections from constraints and contacts feed back into velocity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::filter::CollisionFilter;
use super::geometry::{self, Bounds};
use super::ids::EntityId;
use crate::consts::DEFAULT_DENSITY;
use crate::rotate;

/// What a body is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyRole {
    /// Top/left/right boundary (strokes snap to these)
    Wall,
    /// Bottom boundary (fall-through cleanup and ball reset key off this)
    Floor,
    /// Other fixed level geometry
    Scenery,
    /// The ball the players steer to the goal
    Ball,
    /// The goal ("balloon")
    Goal,
    /// Freehand shape drawn by a player
    Drawn,
    /// Pin (nail)
    Pin,
}

impl BodyRole {
    /// Part of the level rather than player-made
    pub fn is_level(&self) -> bool {
        !matches!(self, BodyRole::Drawn | BodyRole::Pin)
    }
}

/// Collision geometry, local to the body's position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Polygon { vertices: Vec<Vec2> },
}

/// Surface and mass properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub friction: f32,
    pub friction_static: f32,
    pub restitution: f32,
    pub density: f32,
    pub air_friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.1,
            friction_static: 0.5,
            restitution: 0.0,
            density: DEFAULT_DENSITY,
            air_friction: 0.01,
        }
    }
}

/// Presentation-only state, never synchronized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderHints {
    /// 0xRRGGBB
    pub fill: u32,
    pub opacity: f32,
}

impl RenderHints {
    pub fn fill(fill: u32) -> Self {
        Self { fill, opacity: 1.0 }
    }
}

/// A simulated body
#[derive(Debug, Clone)]
pub struct Body {
    pub id: EntityId,
    pub role: BodyRole,
    pub is_static: bool,
    pub shape: Shape,
    pub position: Vec2,
    pub position_prev: Vec2,
    pub angle: f32,
    pub angle_prev: f32,
    pub force: Vec2,
    pub filter: CollisionFilter,
    pub material: Material,
    pub mass: f32,
    pub inertia: f32,
    pub render: RenderHints,
    /// Fade-out erase already requested for this body
    pub erase_requested: bool,
}

impl Body {
    /// Circle centered at `center`
    pub fn circle(id: EntityId, role: BodyRole, center: Vec2, radius: f32, material: Material) -> Self {
        let radius = radius.max(0.5);
        let mass = material.density * std::f32::consts::PI * radius * radius;
        let inertia = 0.5 * mass * radius * radius;
        Self::with_shape(id, role, center, Shape::Circle { radius }, material, mass, inertia)
    }

    /// Polygon with `vertices` relative to `position`
    pub fn polygon(
        id: EntityId,
        role: BodyRole,
        position: Vec2,
        vertices: Vec<Vec2>,
        material: Material,
    ) -> Self {
        let area = geometry::polygon_area(&vertices).max(1.0);
        let mass = material.density * area;
        let inertia = geometry::polygon_inertia(&vertices, mass);
        Self::with_shape(id, role, position, Shape::Polygon { vertices }, material, mass, inertia)
    }

    /// Axis-aligned rectangle centered at `center`
    pub fn rectangle(
        id: EntityId,
        role: BodyRole,
        center: Vec2,
        width: f32,
        height: f32,
        material: Material,
    ) -> Self {
        Self::polygon(id, role, center, geometry::rectangle_vertices(width, height), material)
    }

    fn with_shape(
        id: EntityId,
        role: BodyRole,
        position: Vec2,
        shape: Shape,
        material: Material,
        mass: f32,
        inertia: f32,
    ) -> Self {
        Self {
            id,
            role,
            is_static: false,
            shape,
            position,
            position_prev: position,
            angle: 0.0,
            angle_prev: 0.0,
            force: Vec2::ZERO,
            filter: CollisionFilter::default_world(),
            material,
            mass: mass.max(f32::EPSILON),
            inertia: inertia.max(f32::EPSILON),
            render: RenderHints::fill(0x3b82f6),
            erase_requested: false,
        }
    }

    /// Builder: mark static
    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Builder: set fill colour
    pub fn filled(mut self, fill: u32) -> Self {
        self.render.fill = fill;
        self
    }

    /// Builder: rotate
    pub fn rotated(mut self, angle: f32) -> Self {
        self.angle = angle;
        self.angle_prev = angle;
        self
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        if self.is_static { 0.0 } else { 1.0 / self.mass }
    }

    #[inline]
    pub fn inverse_inertia(&self) -> f32 {
        if self.is_static { 0.0 } else { 1.0 / self.inertia }
    }

    /// Displacement over the last step
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.position - self.position_prev
    }

    #[inline]
    pub fn angular_velocity(&self) -> f32 {
        self.angle - self.angle_prev
    }

    /// Teleport, keeping the current velocity
    pub fn set_position(&mut self, position: Vec2) {
        let delta = position - self.position;
        self.position = position;
        self.position_prev += delta;
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.position_prev = self.position - velocity;
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.angle_prev = self.angle - angular_velocity;
    }

    /// Accumulate a force for the next integration
    pub fn apply_force(&mut self, force: Vec2) {
        if !self.is_static {
            self.force += force;
        }
    }

    /// Convert a world point into this body's frame
    pub fn to_local(&self, world: Vec2) -> Vec2 {
        rotate(world - self.position, -self.angle)
    }

    /// Convert a local offset into world space
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.position + rotate(local, self.angle)
    }

    /// Polygon vertices in world space (empty for circles)
    pub fn world_vertices(&self) -> Vec<Vec2> {
        match &self.shape {
            Shape::Circle { .. } => Vec::new(),
            Shape::Polygon { vertices } => vertices.iter().map(|&v| self.to_world(v)).collect(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        match &self.shape {
            Shape::Circle { radius } => Bounds::from_circle(self.position, *radius),
            Shape::Polygon { .. } => Bounds::from_points(&self.world_vertices())
                .unwrap_or_else(|| Bounds::new(self.position, self.position)),
        }
    }

    pub fn radius(&self) -> Option<f32> {
        match self.shape {
            Shape::Circle { radius } => Some(radius),
            Shape::Polygon { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_bounds() {
        let body = Body::rectangle(
            EntityId::scenery("box"),
            BodyRole::Scenery,
            Vec2::new(100.0, 50.0),
            40.0,
            20.0,
            Material::default(),
        );
        let b = body.bounds();
        assert_eq!(b.min, Vec2::new(80.0, 40.0));
        assert_eq!(b.max, Vec2::new(120.0, 60.0));
    }

    #[test]
    fn test_static_has_no_inverse_mass() {
        let body = Body::circle(EntityId::scenery("c"), BodyRole::Scenery, Vec2::ZERO, 5.0, Material::default())
            .fixed();
        assert_eq!(body.inverse_mass(), 0.0);
        assert_eq!(body.inverse_inertia(), 0.0);
    }

    #[test]
    fn test_set_position_keeps_velocity() {
        let mut body = Body::circle(EntityId::scenery("c"), BodyRole::Ball, Vec2::ZERO, 5.0, Material::default());
        body.set_velocity(Vec2::new(1.0, 2.0));
        body.set_position(Vec2::new(50.0, 50.0));
        assert_eq!(body.velocity(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_local_world_round_trip_with_rotation() {
        let body = Body::rectangle(
            EntityId::scenery("r"),
            BodyRole::Scenery,
            Vec2::new(10.0, 10.0),
            4.0,
            4.0,
            Material::default(),
        )
        .rotated(0.7);
        let p = Vec2::new(13.0, 8.0);
        assert!(body.to_world(body.to_local(p)).distance(p) < 1e-4);
    }
}
