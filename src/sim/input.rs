//! Local player input
//!
//! Pointer and toolbar actions of this client's player. Actions that change
//! the shared world are only announced here; the relay echoes erase, push,
//! level and tool events back to both clients, and the mirror applies them.
//! Drawn objects and chains are applied locally right away because the
//! relay only forwards those to the peer.

use glam::Vec2;

use super::body::BodyRole;
use super::factory;
use super::graph;
use super::ids::{EntityId, EntityKind};
use super::state::{Simulation, Tool};
use super::world::World;
use crate::consts::*;
use crate::distance_to_segment;
use crate::net::protocol::{
    ChangeLevel, ChangeTool, CreateChain, Direction, MouseMove, NetEvent, Push, ResetLevel,
};

/// Primary button pressed at `point`
pub fn pointer_down(sim: &mut Simulation, point: Vec2) {
    if !sim.is_my_turn() {
        log::debug!("Ignoring input outside our turn");
        return;
    }

    match sim.tool {
        Tool::Eraser => erase_at(sim, point),
        Tool::Push => push_at(sim, point),
        Tool::Chain => pick_chain_pin(sim, point),
        Tool::Pen | Tool::Pin => {
            sim.drawing = true;
            sim.stroke.clear();
            sim.stroke.push(clamp_to_canvas(point));
        }
    }
}

/// Pointer moved. Always reported to the peer; extends the stroke while drawing.
pub fn pointer_move(sim: &mut Simulation, point: Vec2) {
    let player_id = sim.settings.player_id.clone();
    sim.emit(NetEvent::MouseMove(MouseMove {
        x: point.x,
        y: point.y,
        player_id,
    }));

    if !sim.drawing {
        return;
    }
    let point = snap_to_wall(&sim.world, clamp_to_canvas(point));
    let far_enough = sim
        .stroke
        .last()
        .is_none_or(|last| last.distance(point) > STROKE_SAMPLE_DISTANCE);
    if far_enough {
        sim.stroke.push(point);
    }
}

/// Primary button released: finish the stroke with the pen or pin tool
pub fn pointer_up(sim: &mut Simulation) {
    let stroke = std::mem::take(&mut sim.stroke);
    let was_drawing = std::mem::replace(&mut sim.drawing, false);
    if !was_drawing || !matches!(sim.tool, Tool::Pen | Tool::Pin) || !sim.is_my_turn() {
        return;
    }

    if factory::draw(sim, &stroke).is_some() {
        sim.pass_turn();
    }
}

/// Select a tool for both players
pub fn change_tool(sim: &mut Simulation, tool: Tool) {
    if !sim.is_my_turn() {
        return;
    }
    sim.tool = tool;
    sim.drawing = false;
    sim.stroke.clear();
    sim.chain_anchor = None;
    let current_level = sim.level;
    sim.emit(NetEvent::ChangeTool(ChangeTool {
        tool,
        current_level,
    }));
}

/// Ask to move one level back or forward. Out-of-range moves are ignored.
pub fn change_level(sim: &mut Simulation, direction: Direction) -> Option<u32> {
    let level = match direction {
        Direction::Prev if sim.level > 1 => sim.level - 1,
        Direction::Next if sim.level < TOTAL_LEVELS => sim.level + 1,
        _ => {
            log::debug!("No level {:?} of {}", direction, sim.level);
            return None;
        }
    };
    sim.emit(NetEvent::ChangeLevel(ChangeLevel {
        level,
        direction: Some(direction),
    }));
    Some(level)
}

/// Ask to rebuild the current level on both clients
pub fn request_reset(sim: &mut Simulation) {
    let level = sim.level;
    sim.emit(NetEvent::ResetLevel(ResetLevel { level }));
}

/// Ask the relay for the shared completed-level list
pub fn request_completed_levels(sim: &mut Simulation) {
    sim.emit(NetEvent::GetCompletedLevels);
}

/// Ask the relay whose turn it is
pub fn request_turn(sim: &mut Simulation) {
    sim.emit(NetEvent::GetTurn);
}

/// Apply a push to the ball unless a recent push still holds the lock
pub fn apply_push(sim: &mut Simulation, force: Vec2) -> bool {
    if sim.push_locked() {
        log::debug!("Push ignored, locked for {:.0} ms", sim.push_locked_until - sim.time_ms);
        return false;
    }
    let Some(ball) = sim.world.find_role_mut(BodyRole::Ball) else {
        return false;
    };
    ball.apply_force(force);
    sim.push_locked_until = sim.time_ms + sim.settings.push_lock_ms;
    true
}

fn erase_at(sim: &mut Simulation, point: Vec2) {
    let target = sim
        .world
        .body_at(point, |b| !b.role.is_level())
        .map(|b| b.id.clone())
        .or_else(|| chain_at(&sim.world, point));
    let Some(id) = target else {
        return;
    };
    sim.request_erase(id, false);
    sim.pass_turn();
}

/// Chain whose segment passes within pick distance of `point`
pub fn chain_at(world: &World, point: Vec2) -> Option<EntityId> {
    world
        .constraints()
        .filter(|(_, c)| c.is_chain())
        .find(|(_, c)| {
            world
                .endpoints(c)
                .is_some_and(|(a, b)| distance_to_segment(point, a, b) <= CHAIN_PICK_DISTANCE)
        })
        .and_then(|(_, c)| c.label.clone())
}

fn push_at(sim: &mut Simulation, point: Vec2) {
    if sim.push_locked() {
        return;
    }
    let Some(ball) = sim.ball() else {
        return;
    };
    // Push away from the side that was clicked
    let direction = if point.x < ball.position.x { 1.0 } else { -1.0 };
    let current_level = sim.level;
    sim.emit(NetEvent::Push(Push {
        force: Vec2::new(direction * PUSH_FORCE, 0.0).into(),
        current_level,
    }));
    sim.pass_turn();
}

/// First click picks the anchor pin, a second click on another pin links them
fn pick_chain_pin(sim: &mut Simulation, point: Vec2) {
    let Some(pin) = sim
        .world
        .body_at(point, |b| b.role == BodyRole::Pin)
        .map(|b| b.id.clone())
    else {
        return;
    };

    let Some(anchor) = sim.chain_anchor.clone() else {
        sim.chain_anchor = Some(pin);
        return;
    };
    if anchor == pin {
        return;
    }
    // The anchor survives a click during the cooldown
    if sim.chain_cooling_down() {
        log::debug!("Chain request dropped during cooldown");
        return;
    }
    sim.chain_anchor = None;

    let chain_id = sim.ids.next_id(EntityKind::Chain);
    let Some(handle) = graph::create_default_chain(&mut sim.world, &chain_id, &anchor, &pin) else {
        return;
    };
    let Some(chain) = sim.world.constraint(handle) else {
        return;
    };
    let event = NetEvent::CreateChain(CreateChain {
        custom_id: chain_id,
        pin_a_id: anchor,
        pin_b_id: pin,
        stiffness: chain.stiffness,
        damping: chain.damping,
        length: chain.length,
        current_level: sim.level,
    });
    sim.emit(event);
    sim.chain_cooldown_until = sim.time_ms + sim.settings.chain_debounce_ms;
    sim.pass_turn();
}

fn clamp_to_canvas(point: Vec2) -> Vec2 {
    point.clamp(Vec2::ZERO, Vec2::new(CANVAS_WIDTH, CANVAS_HEIGHT))
}

/// Snap a point lying on a boundary wall onto its nearest edge
fn snap_to_wall(world: &World, point: Vec2) -> Vec2 {
    let Some(wall) = world.body_at(point, |b| matches!(b.role, BodyRole::Wall | BodyRole::Floor)) else {
        return point;
    };
    let bounds = wall.bounds();
    let edges = [
        (point.x - bounds.min.x).abs(),
        (point.x - bounds.max.x).abs(),
        (point.y - bounds.min.y).abs(),
        (point.y - bounds.max.y).abs(),
    ];
    let (nearest, distance) = edges
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::MAX), |best, (i, d)| if d < best.1 { (i, d) } else { best });
    if distance >= WALL_SNAP_DISTANCE {
        return point;
    }
    match nearest {
        0 => Vec2::new(bounds.min.x, point.y),
        1 => Vec2::new(bounds.max.x, point.y),
        2 => Vec2::new(point.x, bounds.min.y),
        _ => Vec2::new(point.x, bounds.max.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::body::{Body, Material};

    fn sim() -> Simulation {
        let mut sim = Simulation::new(Settings::default(), 9);
        sim.drain_outbox();
        sim
    }

    fn place_pin(sim: &mut Simulation, at: Vec2) -> EntityId {
        let id = EntityId::new(EntityKind::Pin, format!("{}-{}", at.x, at.y));
        sim.world.add_body(Body::circle(id.clone(), BodyRole::Pin, at, 4.0, Material::default()).fixed());
        sim.pins.register(id.clone());
        id
    }

    fn stroke(sim: &mut Simulation, points: &[Vec2]) {
        pointer_down(sim, points[0]);
        for &p in &points[1..] {
            pointer_move(sim, p);
        }
        pointer_up(sim);
    }

    #[test]
    fn test_pen_stroke_creates_shape_and_passes_turn() {
        let mut sim = sim();
        let before = sim.world.bodies().len();
        stroke(&mut sim, &[Vec2::new(300.0, 100.0), Vec2::new(340.0, 100.0), Vec2::new(320.0, 60.0)]);

        assert_eq!(sim.world.bodies().len(), before + 1);
        assert!(!sim.is_my_turn());
        let names: Vec<_> = sim.drain_outbox().iter().map(NetEvent::name).collect();
        assert_eq!(names, vec!["mouseMove", "mouseMove", "drawShape", "changeTurn"]);
    }

    #[test]
    fn test_stroke_samples_are_spaced() {
        let mut sim = sim();
        pointer_down(&mut sim, Vec2::new(100.0, 100.0));
        pointer_move(&mut sim, Vec2::new(103.0, 100.0));
        pointer_move(&mut sim, Vec2::new(110.0, 100.0));
        pointer_move(&mut sim, Vec2::new(2000.0, -50.0));
        assert_eq!(
            sim.stroke,
            vec![Vec2::new(100.0, 100.0), Vec2::new(110.0, 100.0), Vec2::new(CANVAS_WIDTH, 0.0)]
        );
    }

    #[test]
    fn test_out_of_turn_input_is_ignored() {
        let mut sim = sim();
        sim.current_turn = sim.settings.peer_id.clone();
        let before = sim.world.bodies().len();
        stroke(&mut sim, &[Vec2::new(300.0, 100.0), Vec2::new(340.0, 100.0), Vec2::new(320.0, 60.0)]);
        assert_eq!(sim.world.bodies().len(), before);
        assert!(sim.drain_outbox().iter().all(|e| e.name() == "mouseMove"));
    }

    #[test]
    fn test_eraser_requests_erase_of_drawn_body() {
        let mut sim = sim();
        let id = factory::draw(&mut sim, &[Vec2::new(300.0, 100.0), Vec2::new(340.0, 100.0), Vec2::new(320.0, 60.0)])
            .unwrap();
        sim.drain_outbox();
        sim.tool = Tool::Eraser;

        // Level geometry is not erasable
        pointer_down(&mut sim, Vec2::new(200.0, 400.0));
        assert!(sim.outbox().is_empty());

        pointer_down(&mut sim, Vec2::new(320.0, 90.0));
        let events = sim.drain_outbox();
        assert!(matches!(&events[0], NetEvent::Erase(e) if e.custom_id == id && !e.is_release));
        assert_eq!(events[1].name(), "changeTurn");
        // Erase is applied when the relay echoes it
        assert!(sim.world.contains_body(&id));
    }

    #[test]
    fn test_eraser_picks_chain_segment() {
        let mut sim = sim();
        let a = place_pin(&mut sim, Vec2::new(100.0, 100.0));
        let b = place_pin(&mut sim, Vec2::new(200.0, 100.0));
        let chain = EntityId::new(EntityKind::Chain, "c");
        graph::create_default_chain(&mut sim.world, &chain, &a, &b).unwrap();
        assert_eq!(chain_at(&sim.world, Vec2::new(150.0, 104.0)), Some(chain));
        assert_eq!(chain_at(&sim.world, Vec2::new(150.0, 120.0)), None);
    }

    #[test]
    fn test_chain_needs_two_distinct_pins() {
        let mut sim = sim();
        sim.tool = Tool::Chain;
        let x = place_pin(&mut sim, Vec2::new(100.0, 100.0));
        let y = place_pin(&mut sim, Vec2::new(160.0, 180.0));

        pointer_down(&mut sim, Vec2::new(100.0, 100.0));
        pointer_down(&mut sim, Vec2::new(101.0, 100.0));
        assert_eq!(sim.world.constraint_count(), 0);
        assert_eq!(sim.chain_anchor, Some(x.clone()));

        pointer_down(&mut sim, Vec2::new(160.0, 180.0));
        assert_eq!(sim.world.constraint_count(), 1);
        assert!(sim.chain_anchor.is_none());

        let events = sim.drain_outbox();
        let NetEvent::CreateChain(chain) = &events[0] else {
            panic!("expected createChain");
        };
        assert_eq!((chain.pin_a_id.clone(), chain.pin_b_id.clone()), (x, y));
        assert!((chain.length - 110.0).abs() < 1e-3);
        assert!(chain.custom_id.is_chain());
    }

    #[test]
    fn test_chain_debounce() {
        let mut sim = sim();
        sim.tool = Tool::Chain;
        place_pin(&mut sim, Vec2::new(100.0, 100.0));
        let middle = place_pin(&mut sim, Vec2::new(200.0, 100.0));
        place_pin(&mut sim, Vec2::new(300.0, 100.0));

        pointer_down(&mut sim, Vec2::new(100.0, 100.0));
        pointer_down(&mut sim, Vec2::new(200.0, 100.0));
        // Turn came straight back, but the debounce window is still open
        sim.current_turn = sim.settings.player_id.clone();
        pointer_down(&mut sim, Vec2::new(200.0, 100.0));
        pointer_down(&mut sim, Vec2::new(300.0, 100.0));
        assert_eq!(sim.world.constraint_count(), 1);
        // The pick made before the rejected click is kept
        assert_eq!(sim.chain_anchor, Some(middle));

        sim.time_ms += sim.settings.chain_debounce_ms;
        pointer_down(&mut sim, Vec2::new(300.0, 100.0));
        assert_eq!(sim.world.constraint_count(), 2);
        assert!(sim.chain_anchor.is_none());
    }

    #[test]
    fn test_push_direction_and_lock() {
        let mut sim = sim();
        sim.tool = Tool::Push;
        let ball_x = sim.ball().unwrap().position.x;
        pointer_down(&mut sim, Vec2::new(ball_x - 50.0, 300.0));
        let events = sim.drain_outbox();
        let NetEvent::Push(push) = &events[0] else {
            panic!("expected push");
        };
        assert_eq!(push.force.x, PUSH_FORCE);
        assert_eq!(push.force.y, 0.0);

        assert!(apply_push(&mut sim, Vec2::new(PUSH_FORCE, 0.0)));
        assert!(!apply_push(&mut sim, Vec2::new(PUSH_FORCE, 0.0)));
        sim.time_ms += sim.settings.push_lock_ms;
        assert!(apply_push(&mut sim, Vec2::new(-PUSH_FORCE, 0.0)));
    }

    #[test]
    fn test_level_navigation_bounds() {
        let mut sim = sim();
        assert_eq!(change_level(&mut sim, Direction::Prev), None);
        assert_eq!(change_level(&mut sim, Direction::Next), Some(2));
        sim.load_level(TOTAL_LEVELS);
        assert_eq!(change_level(&mut sim, Direction::Next), None);
        // Navigation only asks; the level changes when the relay echoes it
        assert_eq!(sim.level, TOTAL_LEVELS);
    }

    #[test]
    fn test_change_tool_clears_selection() {
        let mut sim = sim();
        sim.chain_anchor = Some(EntityId::new(EntityKind::Pin, "x"));
        change_tool(&mut sim, Tool::Eraser);
        assert_eq!(sim.tool, Tool::Eraser);
        assert!(sim.chain_anchor.is_none());
        assert!(matches!(sim.drain_outbox().as_slice(), [NetEvent::ChangeTool(ChangeTool { tool: Tool::Eraser, .. })]));
    }

    #[test]
    fn test_snap_to_wall_edge() {
        let sim = sim();
        // On the left wall's inner edge region
        let snapped = snap_to_wall(&sim.world, Vec2::new(0.0, 300.0));
        assert_eq!(snapped, Vec2::new(0.0, 300.0));
        let free = snap_to_wall(&sim.world, Vec2::new(400.0, 300.0));
        assert_eq!(free, Vec2::new(400.0, 300.0));
    }
}
