//! Rigid body step
//!
//! Position-Verlet integration, iterative constraint relaxation, and
//! pairwise contact resolution. Material constants are tuned against a
//! 60 Hz reference step, so air friction and constraint stiffness are scaled
//! by the ratio of the actual step to [`BASE_DELTA_MS`].

use glam::Vec2;

use super::body::{Body, Shape};
use super::geometry::{convex_hull, vertex_centroid};
use super::ids::EntityId;
use super::world::World;
use crate::consts::{BASE_DELTA_MS, CONSTRAINT_ITERATIONS};
use crate::rotate;

/// Penetration left uncorrected to keep resting contacts stable
const CONTACT_SLOP: f32 = 0.05;
/// Fraction of the remaining penetration corrected per step
const CONTACT_CORRECTION: f32 = 0.8;
/// Contacts slower than this do not bounce
const RESTING_SPEED: f32 = 0.05;

/// Contact between two bodies; `normal` points from the first to the second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub normal: Vec2,
    pub depth: f32,
}

/// Advance the world by `dt_ms`
pub fn step(world: &mut World, gravity: Vec2, dt_ms: f32) {
    integrate(world.bodies_mut(), gravity, dt_ms);
    for _ in 0..CONSTRAINT_ITERATIONS {
        solve_constraints(world, dt_ms);
    }
    resolve_contacts(world.bodies_mut());
}

fn integrate(bodies: &mut [Body], gravity: Vec2, dt_ms: f32) {
    let time_scale = dt_ms / BASE_DELTA_MS;
    let dt_sq = dt_ms * dt_ms;

    for body in bodies.iter_mut() {
        if body.is_static {
            body.force = Vec2::ZERO;
            continue;
        }

        let air = 1.0 - body.material.air_friction * time_scale;
        let force = body.force + gravity * body.mass;
        let velocity = body.velocity() * air + force / body.mass * dt_sq;
        body.position_prev = body.position;
        body.position += velocity;

        let angular = body.angular_velocity() * air;
        body.angle_prev = body.angle;
        body.angle += angular;

        body.force = Vec2::ZERO;
    }
}

fn index_of(bodies: &[Body], id: Option<&EntityId>) -> Option<Option<usize>> {
    match id {
        None => Some(None),
        Some(id) => bodies.iter().position(|b| &b.id == id).map(Some),
    }
}

/// One relaxation pass over every constraint
fn solve_constraints(world: &mut World, dt_ms: f32) {
    let time_scale = dt_ms / BASE_DELTA_MS;
    let (bodies, constraints) = world.split_mut();

    for constraint in constraints {
        // A dangling end (body erased on this client only) is skipped
        let (Some(ia), Some(ib)) = (
            index_of(bodies, constraint.body_a.as_ref()),
            index_of(bodies, constraint.body_b.as_ref()),
        ) else {
            continue;
        };

        let offset_a = ia.map_or(Vec2::ZERO, |i| rotate(constraint.point_a, bodies[i].angle));
        let offset_b = ib.map_or(Vec2::ZERO, |i| rotate(constraint.point_b, bodies[i].angle));
        let anchor_a = ia.map_or(constraint.point_a, |i| bodies[i].position + offset_a);
        let anchor_b = ib.map_or(constraint.point_b, |i| bodies[i].position + offset_b);

        let inv_mass_a = ia.map_or(0.0, |i| bodies[i].inverse_mass());
        let inv_mass_b = ib.map_or(0.0, |i| bodies[i].inverse_mass());
        let inv_inertia_a = ia.map_or(0.0, |i| bodies[i].inverse_inertia());
        let inv_inertia_b = ib.map_or(0.0, |i| bodies[i].inverse_inertia());
        let mass_total = inv_mass_a + inv_mass_b;
        if mass_total <= 0.0 {
            continue;
        }
        let resistance_total = mass_total + inv_inertia_a + inv_inertia_b;

        let delta = anchor_a - anchor_b;
        let current = delta.length().max(1e-6);
        let difference = (current - constraint.length) / current;
        let stiffness = if constraint.stiffness < 1.0 {
            constraint.stiffness * time_scale
        } else {
            constraint.stiffness
        };
        let force = delta * difference * stiffness;

        let normal = delta / current;
        let velocity_a = ia.map_or(Vec2::ZERO, |i| bodies[i].velocity());
        let velocity_b = ib.map_or(Vec2::ZERO, |i| bodies[i].velocity());
        let normal_velocity = normal.dot(velocity_b - velocity_a);

        if let Some(i) = ia {
            let body = &mut bodies[i];
            if !body.is_static {
                let share = inv_mass_a / mass_total;
                body.position -= force * share;
                if constraint.damping > 0.0 {
                    body.position_prev -= normal * constraint.damping * normal_velocity * share;
                }
                body.angle -= offset_a.perp_dot(force) / resistance_total * inv_inertia_a;
            }
        }
        if let Some(i) = ib {
            let body = &mut bodies[i];
            if !body.is_static {
                let share = inv_mass_b / mass_total;
                body.position += force * share;
                if constraint.damping > 0.0 {
                    body.position_prev += normal * constraint.damping * normal_velocity * share;
                }
                body.angle += offset_b.perp_dot(force) / resistance_total * inv_inertia_b;
            }
        }
    }
}

/// Narrow phase for a pair of bodies; the bounding boxes are the broad-phase
/// reject
pub fn detect(a: &Body, b: &Body) -> Option<Contact> {
    if !a.bounds().overlaps(&b.bounds()) {
        return None;
    }
    match (&a.shape, &b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(a.position, *ra, b.position, *rb)
        }
        (Shape::Circle { radius }, Shape::Polygon { .. }) => {
            circle_polygon(a.position, *radius, &b.world_vertices()).map(|c| Contact {
                normal: -c.normal,
                depth: c.depth,
            })
        }
        (Shape::Polygon { .. }, Shape::Circle { radius }) => {
            circle_polygon(b.position, *radius, &a.world_vertices())
        }
        (Shape::Polygon { .. }, Shape::Polygon { .. }) => {
            polygon_polygon(&a.world_vertices(), &b.world_vertices())
        }
    }
}

fn circle_circle(pa: Vec2, ra: f32, pb: Vec2, rb: f32) -> Option<Contact> {
    let delta = pb - pa;
    let distance = delta.length();
    let depth = ra + rb - distance;
    if depth <= 0.0 {
        return None;
    }
    let normal = if distance > f32::EPSILON { delta / distance } else { Vec2::Y };
    Some(Contact { normal, depth })
}

/// Contact of a circle against a polygon outline. The normal points from
/// the polygon towards the circle.
fn circle_polygon(center: Vec2, radius: f32, vertices: &[Vec2]) -> Option<Contact> {
    if vertices.len() < 2 {
        return None;
    }

    let mut closest = vertices[0];
    let mut best = f32::MAX;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let ab = b - a;
        let len_sq = ab.length_squared();
        let t = if len_sq > f32::EPSILON {
            ((center - a).dot(ab) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let point = a + ab * t;
        let distance = point.distance_squared(center);
        if distance < best {
            best = distance;
            closest = point;
        }
    }

    let distance = best.sqrt();
    let inside = point_in_polygon(center, vertices);
    if !inside && distance >= radius {
        return None;
    }

    let (normal, depth) = if distance <= f32::EPSILON {
        // Center on the outline: push away from the polygon's middle
        let outward = (center - vertex_centroid(vertices)).normalize_or(Vec2::NEG_Y);
        (outward, radius)
    } else if inside {
        ((closest - center) / distance, radius + distance)
    } else {
        ((center - closest) / distance, radius - distance)
    };
    Some(Contact { normal, depth })
}

fn point_in_polygon(p: Vec2, vertices: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Separating-axis test over the convex hulls of two polygons. Concave
/// outlines collide as their hull.
fn polygon_polygon(a: &[Vec2], b: &[Vec2]) -> Option<Contact> {
    let (hull_a, hull_b) = (convex_hull(a), convex_hull(b));
    if hull_a.len() < 2 || hull_b.len() < 2 {
        return None;
    }

    let mut best: Option<Contact> = None;
    for hull in [&hull_a, &hull_b] {
        for (i, &start) in hull.iter().enumerate() {
            let edge = hull[(i + 1) % hull.len()] - start;
            let Some(axis) = edge.perp().try_normalize() else {
                continue;
            };
            let (min_a, max_a) = project(&hull_a, axis);
            let (min_b, max_b) = project(&hull_b, axis);
            let overlap = max_a.min(max_b) - min_a.max(min_b);
            if overlap <= 0.0 {
                return None;
            }
            if best.is_none_or(|c| overlap < c.depth) {
                best = Some(Contact { normal: axis, depth: overlap });
            }
        }
    }

    best.map(|contact| {
        let towards_b = vertex_centroid(&hull_b) - vertex_centroid(&hull_a);
        if towards_b.dot(contact.normal) < 0.0 {
            Contact { normal: -contact.normal, ..contact }
        } else {
            contact
        }
    })
}

fn project(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    vertices
        .iter()
        .map(|v| v.dot(axis))
        .fold((f32::MAX, f32::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)))
}

/// Two distinct bodies of the slice, mutably
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i < j);
    let (head, tail) = bodies.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

fn resolve_contacts(bodies: &mut [Body]) {
    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = pair_mut(bodies, i, j);
            if a.is_static && b.is_static {
                continue;
            }
            if !a.filter.can_collide(&b.filter) {
                continue;
            }
            if let Some(contact) = detect(a, b) {
                resolve(a, b, contact);
            }
        }
    }
}

fn resolve(a: &mut Body, b: &mut Body, contact: Contact) {
    let (inv_a, inv_b) = (a.inverse_mass(), b.inverse_mass());
    let total = inv_a + inv_b;
    if total <= 0.0 {
        return;
    }
    let normal = contact.normal;

    let correction = normal * ((contact.depth - CONTACT_SLOP).max(0.0) * CONTACT_CORRECTION / total);
    if !a.is_static {
        a.set_position(a.position - correction * inv_a);
    }
    if !b.is_static {
        b.set_position(b.position + correction * inv_b);
    }

    let (va, vb) = (a.velocity(), b.velocity());
    let relative = vb - va;
    let normal_speed = relative.dot(normal);
    if normal_speed >= 0.0 {
        return;
    }

    let restitution = if -normal_speed < RESTING_SPEED {
        0.0
    } else {
        a.material.restitution.max(b.material.restitution)
    };
    let impulse = -(1.0 + restitution) * normal_speed / total;
    let mut dva = -normal * impulse * inv_a;
    let mut dvb = normal * impulse * inv_b;

    let tangent = relative - normal * normal_speed;
    let slide = tangent.length();
    if slide > f32::EPSILON {
        let friction = a.material.friction.min(b.material.friction);
        let tangent_impulse = (slide / total).min(friction * impulse);
        let direction = tangent / slide;
        dva += direction * tangent_impulse * inv_a;
        dvb -= direction * tangent_impulse * inv_b;
    }

    if !a.is_static {
        a.set_velocity(va + dva);
    }
    if !b.is_static {
        b.set_velocity(vb + dvb);
    }
}
