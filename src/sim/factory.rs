//! Body factory: turns point lists into pins and drawn bodies
//!
//! The same code path builds locally authored objects and mirrored ones.
//! A locally authored object without a preset id gets a fresh id and is
//! announced to the peer; a mirrored object reuses the transmitted id and
//! filter so both worlds end up with identical labels and categories.

use glam::Vec2;

use super::body::{Body, BodyRole, Material};
use super::filter::{CollisionFilter, group_for};
use super::geometry::{Bounds, max_distance, simplify_path, vertex_centroid};
use super::graph;
use super::ids::{EntityId, EntityKind};
use super::state::{Simulation, Tool};
use crate::consts::*;
use crate::net::protocol::{DrawPin, DrawShape, NetEvent};

const SHAPE_FILL: u32 = 0x3b82f6;
const PIN_FILL: u32 = 0xef4444;

/// Who asked for the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// This client's player
    Local,
    /// Mirrored from a peer event
    Remote,
}

/// Result of [`create_body`]
#[derive(Debug, Clone)]
pub enum Created {
    /// A pin, already in the world and attached to its host
    Pin { id: EntityId, host: EntityId },
    /// A drawn body not yet in the world, plus the pins it covers.
    /// Hand both to [`install_shape`].
    Shape { body: Body, pins: Vec<EntityId> },
}

/// Build an object from a pointer trace according to the active tool.
///
/// Returns None for traces shorter than two points and for pins with no
/// body underneath.
pub fn create_body(
    sim: &mut Simulation,
    points: &[Vec2],
    origin: Origin,
    collision_category: Option<u16>,
    group: Option<i32>,
    custom_id: Option<EntityId>,
) -> Option<Created> {
    if points.len() < 2 {
        log::debug!("Ignoring trace with {} point(s)", points.len());
        return None;
    }

    match sim.tool {
        Tool::Pin => {
            let center = vertex_centroid(points);
            let radius = max_distance(center, points);
            create_pin(sim, center, radius, None, origin, collision_category, group, custom_id)
        }
        _ => create_shape(sim, points, origin, collision_category, group, custom_id),
    }
}

/// Local convenience: build from a trace, install, and announce
pub fn draw(sim: &mut Simulation, points: &[Vec2]) -> Option<EntityId> {
    match create_body(sim, points, Origin::Local, None, None, None)? {
        Created::Pin { id, .. } => Some(id),
        Created::Shape { body, pins } => {
            let id = body.id.clone();
            install_shape(sim, body, &pins);
            Some(id)
        }
    }
}

fn can_host(body: &Body) -> bool {
    !matches!(body.role, BodyRole::Pin | BodyRole::Ball | BodyRole::Goal)
}

/// Place a pin at `center`.
///
/// The host is `target` when given (mirrored pins name it), otherwise the
/// first body whose bounds contain `center`.
#[allow(clippy::too_many_arguments)]
pub fn create_pin(
    sim: &mut Simulation,
    center: Vec2,
    radius: f32,
    target: Option<&EntityId>,
    origin: Origin,
    collision_category: Option<u16>,
    group: Option<i32>,
    custom_id: Option<EntityId>,
) -> Option<Created> {
    let host = match target {
        Some(id) => sim.world.body(id).filter(|b| can_host(b)),
        None => sim.world.body_at(center, can_host),
    };
    let Some(host) = host else {
        log::debug!("No body under pin at ({:.0}, {:.0})", center.x, center.y);
        return None;
    };
    let host_id = host.id.clone();
    let host_static = host.is_static;

    let filter = match (collision_category, graph::assembly_filter(&sim.world, &host_id)) {
        (Some(category), _) if origin == Origin::Remote => {
            sim.categories.observe(category);
            CollisionFilter::assembly(category, group.unwrap_or_else(|| group_for(category)))
        }
        (_, Some(inherited)) => inherited,
        (Some(category), None) => {
            sim.categories.observe(category);
            CollisionFilter::assembly(category, group.unwrap_or_else(|| group_for(category)))
        }
        (None, None) => match sim.categories.allocate() {
            Some(category) => CollisionFilter::assembly(category, group_for(category)),
            None => {
                log::warn!("Collision categories exhausted; pin falls back to the world category");
                CollisionFilter::default_world()
            }
        },
    };

    let announce = origin == Origin::Local && custom_id.is_none();
    let id = custom_id.unwrap_or_else(|| sim.ids.next_id(EntityKind::Pin));

    let mut pin = Body::circle(id.clone(), BodyRole::Pin, center, radius, Material::default()).filled(PIN_FILL);
    pin.filter = filter;
    if host_static {
        pin = pin.fixed();
    }

    sim.world.add_body(pin);
    sim.pins.register(id.clone());
    graph::attach(&mut sim.world, &host_id, &id);
    graph::propagate_category(&mut sim.world, &[id.clone()], filter);
    log::debug!("Pin {} on {} (category {:#06x})", id, host_id, filter.category);

    if announce {
        let current_level = sim.level;
        sim.emit(NetEvent::DrawPin(DrawPin {
            center_x: center.x,
            center_y: center.y,
            radius: pin_radius(&sim.world, &id).unwrap_or(radius),
            custom_id: id.clone(),
            target_body_custom_id: host_id.clone(),
            nail_group_number: filter.group,
            nail_category: filter.category,
            current_level,
        }));
    }

    Some(Created::Pin { id, host: host_id })
}

fn pin_radius(world: &super::world::World, id: &EntityId) -> Option<f32> {
    world.body(id).and_then(Body::radius)
}

/// Build a drawn body from a trace. The body is returned, not installed.
pub fn create_shape(
    sim: &mut Simulation,
    points: &[Vec2],
    origin: Origin,
    collision_category: Option<u16>,
    group: Option<i32>,
    custom_id: Option<EntityId>,
) -> Option<Created> {
    let simplified = simplify_path(points)?;
    let bounds = Bounds::from_points(&simplified)?;
    let pins = sim.pins.overlapping(&sim.world, &bounds);

    // Only the first covered pin decides the assembly
    let filter = match origin {
        Origin::Local => pins
            .first()
            .and_then(|id| sim.world.body(id))
            .map(|pin| pin.filter)
            .unwrap_or_default(),
        Origin::Remote => match collision_category {
            Some(category) => {
                sim.categories.observe(category);
                CollisionFilter::assembly(category, group.unwrap_or_else(|| group_for(category)))
            }
            None => CollisionFilter::default_world(),
        },
    };

    let announce = origin == Origin::Local && custom_id.is_none();
    let id = custom_id.unwrap_or_else(|| sim.ids.next_id(EntityKind::Shape));

    let mut body = if simplified.len() == 2 {
        line_body(id.clone(), simplified[0], simplified[1])
    } else {
        let centroid = vertex_centroid(&simplified);
        let vertices = simplified.iter().map(|&p| p - centroid).collect();
        let material = Material {
            friction: SHAPE_FRICTION,
            friction_static: 1.0,
            restitution: SHAPE_RESTITUTION,
            density: SHAPE_DENSITY,
            air_friction: SHAPE_AIR_FRICTION,
        };
        Body::polygon(id.clone(), BodyRole::Drawn, centroid, vertices, material)
    };
    body.filter = filter;
    body = body.filled(SHAPE_FILL);

    if announce {
        let (collision_category, group_number, nails_id_string) = if pins.is_empty() {
            (None, None, None)
        } else {
            let joined = pins.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
            (Some(filter.category), Some(filter.group), Some(joined))
        };
        let current_level = sim.level;
        sim.emit(NetEvent::DrawShape(DrawShape {
            points: simplified.iter().map(|&p| p.into()).collect(),
            custom_id: id,
            current_level,
            collision_category,
            group_number,
            nails_id_string,
        }));
    }

    Some(Created::Shape { body, pins })
}

/// Thin bar along a two-point stroke
fn line_body(id: EntityId, start: Vec2, end: Vec2) -> Body {
    let delta = end - start;
    let length = delta.length().max(1.0);
    let angle = delta.y.atan2(delta.x);
    let material = Material {
        friction: SHAPE_FRICTION,
        friction_static: 1.0,
        restitution: SHAPE_RESTITUTION,
        density: LINE_DENSITY,
        ..Material::default()
    };
    Body::rectangle(id, BodyRole::Drawn, (start + end) * 0.5, length, LINE_THICKNESS, material).rotated(angle)
}

/// Add a drawn body, pin it to `pins`, and spread its filter over the
/// resulting assembly
pub fn install_shape(sim: &mut Simulation, body: Body, pins: &[EntityId]) {
    let id = body.id.clone();
    let filter = body.filter;
    sim.world.add_body(body);

    let mut attached = 0;
    for pin in pins {
        if graph::attach(&mut sim.world, &id, pin).is_some() {
            attached += 1;
        }
    }
    if attached > 0 && !filter.is_default() {
        graph::propagate_category(&mut sim.world, &[id.clone()], filter);
    }
    log::debug!("Installed {} with {} pin(s)", id, attached);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::filter::{DEFAULT_CATEGORY, MASK_ALL};

    fn triangle() -> Vec<Vec2> {
        vec![Vec2::new(300.0, 100.0), Vec2::new(340.0, 100.0), Vec2::new(320.0, 60.0)]
    }

    fn fresh() -> Simulation {
        let mut sim = Simulation::new(Settings::default(), 11);
        sim.drain_outbox();
        sim
    }

    #[test]
    fn test_short_trace_creates_nothing() {
        let mut sim = fresh();
        let before = sim.world.bodies().len();
        assert!(create_body(&mut sim, &[Vec2::new(1.0, 1.0)], Origin::Local, None, None, None).is_none());
        sim.tool = Tool::Pin;
        assert!(create_body(&mut sim, &[], Origin::Local, None, None, None).is_none());
        assert_eq!(sim.world.bodies().len(), before);
        assert!(sim.outbox().is_empty());
    }

    #[test]
    fn test_triangle_in_empty_space() {
        let mut sim = fresh();
        let before = sim.world.bodies().len();
        let id = draw(&mut sim, &triangle()).unwrap();

        assert_eq!(sim.world.bodies().len(), before + 1);
        let body = sim.world.body(&id).unwrap();
        assert_eq!(body.role, BodyRole::Drawn);
        assert_eq!(body.filter.category, DEFAULT_CATEGORY);
        assert_eq!(body.filter.mask, MASK_ALL);
        assert!((body.position - Vec2::new(320.0, 260.0 / 3.0)).length() < 1e-3);
        assert_eq!(body.material.density, SHAPE_DENSITY);

        let events = sim.drain_outbox();
        assert_eq!(events.len(), 1);
        let NetEvent::DrawShape(shape) = &events[0] else {
            panic!("expected drawShape");
        };
        assert_eq!(shape.custom_id, id);
        assert_eq!(shape.points.len(), 3);
        assert!(shape.collision_category.is_none());
        assert!(shape.nails_id_string.is_none());
    }

    #[test]
    fn test_two_point_stroke_is_a_bar() {
        let mut sim = fresh();
        let id = draw(&mut sim, &[Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0)]).unwrap();
        let bar = sim.world.body(&id).unwrap();
        let bounds = bar.bounds();
        assert!((bounds.size().x - 100.0).abs() < 1e-3);
        assert!((bounds.size().y - LINE_THICKNESS).abs() < 1e-3);
        assert_eq!(bar.material.density, LINE_DENSITY);
    }

    #[test]
    fn test_pin_on_static_body_allocates_category() {
        let mut sim = fresh();
        sim.tool = Tool::Pin;
        // Inside tower1 of level 1
        let trace = [Vec2::new(197.0, 400.0), Vec2::new(203.0, 400.0), Vec2::new(200.0, 403.0)];
        let Some(Created::Pin { id, host }) = create_body(&mut sim, &trace, Origin::Local, None, None, None) else {
            panic!("pin expected");
        };

        assert_eq!(host.to_string(), "tower1");
        let pin = sim.world.body(&id).unwrap();
        assert!(pin.is_static);
        assert_eq!(pin.filter.category, 0x0004);
        assert_eq!(pin.filter.mask, 0xFFFF & !0x0004);
        assert!(sim.pins.contains(&id));

        let handles = sim.world.constraints_of(&id);
        assert_eq!(handles.len(), 1);
        let c = sim.world.constraint(handles[0]).unwrap();
        assert_eq!(c.length, 0.0);
        assert_eq!(c.stiffness, 1.0);

        let events = sim.drain_outbox();
        assert_eq!(events.len(), 1);
        let NetEvent::DrawPin(draw) = &events[0] else {
            panic!("expected drawPin");
        };
        assert_eq!(draw.nail_category, 0x0004);
        assert_eq!(draw.nail_group_number, group_for(0x0004));
        assert_eq!(draw.target_body_custom_id, host);
        assert_eq!(draw.custom_id, id);
    }

    #[test]
    fn test_pin_without_host_is_refused() {
        let mut sim = fresh();
        sim.tool = Tool::Pin;
        let trace = [Vec2::new(100.0, 100.0), Vec2::new(104.0, 100.0)];
        assert!(create_body(&mut sim, &trace, Origin::Local, None, None, None).is_none());
        assert!(sim.pins.is_empty());
        assert!(sim.outbox().is_empty());
        // Nothing was allocated either
        assert_eq!(sim.categories.allocate(), Some(0x0004));
    }

    #[test]
    fn test_second_pin_inherits_assembly() {
        let mut sim = fresh();
        let shape = draw(&mut sim, &triangle()).unwrap();
        sim.tool = Tool::Pin;
        let first = create_pin(&mut sim, Vec2::new(320.0, 90.0), 3.0, None, Origin::Local, None, None, None);
        let second = create_pin(&mut sim, Vec2::new(315.0, 95.0), 3.0, None, Origin::Local, None, None, None);
        let (Some(Created::Pin { id: a, .. }), Some(Created::Pin { id: b, .. })) = (first, second) else {
            panic!("pins expected");
        };
        let fa = sim.world.body(&a).unwrap().filter;
        let fb = sim.world.body(&b).unwrap().filter;
        assert_eq!(fa, fb);
        assert_eq!(sim.world.body(&shape).unwrap().filter, fa);
        assert!(!sim.world.body(&a).unwrap().is_static);
    }

    #[test]
    fn test_shape_over_pin_joins_assembly() {
        let mut sim = fresh();
        sim.tool = Tool::Pin;
        let trace = [Vec2::new(197.0, 400.0), Vec2::new(203.0, 400.0)];
        let Some(Created::Pin { id: pin, host }) = create_body(&mut sim, &trace, Origin::Local, None, None, None) else {
            panic!("pin expected");
        };
        sim.drain_outbox();

        sim.tool = Tool::Pen;
        let around = [Vec2::new(180.0, 380.0), Vec2::new(220.0, 380.0), Vec2::new(200.0, 420.0)];
        let shape = draw(&mut sim, &around).unwrap();

        let category = sim.world.body(&pin).unwrap().filter.category;
        assert_eq!(sim.world.body(&shape).unwrap().filter.category, category);
        assert_eq!(sim.world.body(&host).unwrap().filter.category, category);
        assert_eq!(sim.world.constraints_of(&pin).len(), 2);

        let events = sim.drain_outbox();
        let NetEvent::DrawShape(draw) = &events[0] else {
            panic!("expected drawShape");
        };
        assert_eq!(draw.collision_category, Some(category));
        assert_eq!(draw.nail_ids(), vec![pin]);
    }

    #[test]
    fn test_mirrored_shape_keeps_transmitted_identity() {
        let mut sim = fresh();
        let id = EntityId::parse("custom_peer-7");
        let created = create_body(&mut sim, &triangle(), Origin::Remote, Some(0x0020), Some(-5), Some(id.clone()));
        let Some(Created::Shape { body, pins }) = created else {
            panic!("shape expected");
        };
        assert!(pins.is_empty());
        assert_eq!(body.id, id);
        assert_eq!(body.filter.category, 0x0020);
        assert_eq!(body.filter.group, -5);
        assert!(sim.categories.is_used(0x0020));
        assert!(sim.outbox().is_empty());
    }
}
