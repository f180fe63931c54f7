//! Fixed timestep simulation tick
//!
//! One tick advances the simulation clock, steps physics, and applies the
//! per-step level rules: ball reset, fade-out of drawn bodies resting on the
//! floor, and goal detection.

use glam::Vec2;

use super::body::BodyRole;
use super::physics;
use super::state::Simulation;
use crate::consts::{FADE_PER_STEP, FLOOR_RESET_MARGIN};
use crate::net::protocol::{CompleteLevel, NetEvent};

/// Advance the simulation by one fixed step of `dt_ms`
pub fn tick(sim: &mut Simulation, dt_ms: f32) {
    sim.time_ms += f64::from(dt_ms);
    sim.expire_cursors();

    let gravity = sim.gravity();
    physics::step(&mut sim.world, gravity, dt_ms);

    reset_ball(sim);
    fade_grounded(sim);
    check_goal(sim);
}

/// Put the ball back on its spawn point once it reaches the floor.
/// Purely local; the peer resets its own ball.
pub fn reset_ball(sim: &mut Simulation) -> bool {
    let Some(spawn) = sim.layout.map(|l| l.ball_spawn) else {
        return false;
    };
    let Some(threshold) = sim
        .world
        .find_role(BodyRole::Floor)
        .map(|floor| floor.bounds().max.y - FLOOR_RESET_MARGIN)
    else {
        return false;
    };
    let Some(ball) = sim.world.find_role_mut(BodyRole::Ball) else {
        return false;
    };
    if ball.position.y <= threshold {
        return false;
    }

    ball.position = spawn;
    ball.position_prev = spawn;
    ball.angle_prev = ball.angle;
    ball.force = Vec2::ZERO;
    log::debug!("Ball reset to ({:.0}, {:.0})", spawn.x, spawn.y);
    true
}

/// Fade dynamic player bodies touching the floor; request their erase once
/// fully transparent. Both clients may request the same erase.
fn fade_grounded(sim: &mut Simulation) {
    let Some(floor) = sim.world.find_role(BodyRole::Floor).map(|f| f.bounds()) else {
        return;
    };

    let mut expired = Vec::new();
    for body in sim.world.bodies_mut() {
        if body.is_static || body.role.is_level() || body.erase_requested {
            continue;
        }
        if !body.bounds().overlaps(&floor) {
            continue;
        }
        body.render.opacity = (body.render.opacity - FADE_PER_STEP).max(0.0);
        if body.render.opacity <= f32::EPSILON {
            body.erase_requested = true;
            expired.push(body.id.clone());
        }
    }

    for id in expired {
        log::debug!("{} faded out on the floor", id);
        sim.request_erase(id, true);
    }
}

/// Mark the level complete the first time the ball touches the goal
fn check_goal(sim: &mut Simulation) {
    if sim.level_complete {
        return;
    }
    let ball = sim.world.find_role(BodyRole::Ball).map(|b| b.bounds());
    let goal = sim.world.find_role(BodyRole::Goal).map(|b| b.bounds());
    let (Some(ball), Some(goal)) = (ball, goal) else {
        return;
    };
    if !ball.expand(1.0).overlaps(&goal) {
        return;
    }

    sim.level_complete = true;
    sim.completed.mark(sim.level);
    log::info!("Level {} complete", sim.level);
    let completed_level = sim.level;
    sim.emit(NetEvent::CompleteLevel(CompleteLevel { completed_level }));
}

/// Converts variable frame times into fixed ticks
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { accumulator: 0.0 }
    }

    /// Run as many fixed steps as `elapsed_ms` covers, capped at the
    /// configured substep limit. Returns the number of steps run.
    pub fn advance(&mut self, sim: &mut Simulation, elapsed_ms: f32) -> u32 {
        let step = sim.settings.tick_ms;
        let max_substeps = sim.settings.max_substeps;
        if step <= 0.0 {
            return 0;
        }

        self.accumulator += elapsed_ms.max(0.0);
        let mut substeps = 0;
        while self.accumulator >= step && substeps < max_substeps {
            tick(sim, step);
            self.accumulator -= step;
            substeps += 1;
        }

        // Drop the backlog instead of spiralling after a long stall
        if substeps == max_substeps {
            self.accumulator = self.accumulator.min(step);
        }
        substeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TICK_MS;
    use crate::settings::Settings;
    use crate::sim::body::{Body, Material};
    use crate::sim::ids::{EntityId, EntityKind};

    fn sim() -> Simulation {
        Simulation::new(Settings::default(), 5)
    }

    #[test]
    fn test_ball_below_threshold_resets_to_spawn() {
        let mut sim = sim();
        let spawn = sim.layout.unwrap().ball_spawn;
        {
            let ball = sim.world.find_role_mut(BodyRole::Ball).unwrap();
            ball.set_position(Vec2::new(450.0, 590.0));
            ball.set_velocity(Vec2::new(3.0, 4.0));
            ball.set_angular_velocity(0.2);
        }

        tick(&mut sim, TICK_MS);

        let ball = sim.ball().unwrap();
        assert_eq!(ball.position, spawn);
        assert_eq!(ball.velocity(), Vec2::ZERO);
        assert_eq!(ball.angular_velocity(), 0.0);
        // Local rule, nothing goes on the wire
        assert!(sim.outbox().is_empty());
    }

    #[test]
    fn test_ball_above_threshold_is_left_alone() {
        let mut sim = sim();
        sim.world
            .find_role_mut(BodyRole::Ball)
            .unwrap()
            .set_position(Vec2::new(450.0, 560.0));
        assert!(!reset_ball(&mut sim));
    }

    #[test]
    fn test_grounded_shape_fades_then_requests_erase_once() {
        let mut sim = sim();
        let id = EntityId::new(EntityKind::Shape, "sunk");
        sim.world.add_body(Body::rectangle(
            id.clone(),
            BodyRole::Drawn,
            Vec2::new(100.0, 595.0),
            20.0,
            20.0,
            Material::default(),
        ));

        tick(&mut sim, TICK_MS);
        let opacity = sim.world.body(&id).unwrap().render.opacity;
        assert!(opacity < 1.0 && opacity > 0.9);

        for _ in 0..150 {
            tick(&mut sim, TICK_MS);
        }
        let erases: Vec<_> = sim
            .drain_outbox()
            .into_iter()
            .filter_map(|e| match e {
                NetEvent::Erase(erase) => Some(erase),
                _ => None,
            })
            .collect();
        assert_eq!(erases.len(), 1);
        assert_eq!(erases[0].custom_id, id);
        assert!(erases[0].is_release);
    }

    #[test]
    fn test_goal_completes_level_once() {
        let mut sim = sim();
        let goal = sim.world.find_role(BodyRole::Goal).unwrap().position;
        sim.world
            .find_role_mut(BodyRole::Ball)
            .unwrap()
            .set_position(goal);

        tick(&mut sim, TICK_MS);
        tick(&mut sim, TICK_MS);

        assert!(sim.level_complete);
        assert!(sim.completed.contains(1));
        let completions = sim
            .drain_outbox()
            .into_iter()
            .filter(|e| matches!(e, NetEvent::CompleteLevel(CompleteLevel { completed_level: 1 })))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_frame_clock_runs_fixed_steps() {
        let mut sim = sim();
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(&mut sim, TICK_MS * 0.5), 0);
        assert_eq!(clock.advance(&mut sim, TICK_MS * 0.6), 1);
        assert!((sim.time_ms - f64::from(TICK_MS)).abs() < 1e-6);

        // A long stall is capped
        let ran = clock.advance(&mut sim, 10_000.0);
        assert_eq!(ran, sim.settings.max_substeps);
        assert!(clock.advance(&mut sim, 0.0) <= 1);
    }
}
