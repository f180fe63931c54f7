//! Duet Physics entry point
//!
//! On the web the library's `start` hook and `WasmClient` do the work. The
//! native binary runs a headless two-player session over the in-process
//! relay, which is handy for watching the logs of a scripted exchange.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Duet Physics (native) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is the library's start hook
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use duet_physics::consts::TICK_MS;
    use duet_physics::net::LoopbackRelay;
    use duet_physics::platform::session_seed;
    use duet_physics::sim::input;
    use duet_physics::sim::{FrameClock, Simulation, Snapshot, Tool};
    use duet_physics::Settings;
    use glam::Vec2;

    /// Simulated wall-clock time between frames
    const FRAME_MS: f32 = 16.0;

    fn stroke(sim: &mut Simulation, points: &[Vec2]) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        input::pointer_down(sim, *first);
        for &p in rest {
            input::pointer_move(sim, p);
        }
        input::pointer_up(sim);
    }

    fn run_frames(relay: &mut LoopbackRelay, clocks: &mut [FrameClock; 2], one: &mut Simulation, two: &mut Simulation, frames: u32) {
        for _ in 0..frames {
            clocks[0].advance(one, FRAME_MS);
            clocks[1].advance(two, FRAME_MS);
            relay.pump(one, two);
        }
    }

    pub fn run() {
        let settings = Settings::load();
        let mut one = Simulation::new(
            Settings::for_players("player1", "player2").with_tuning(&settings),
            session_seed(),
        );
        let mut two = Simulation::new(
            Settings::for_players("player2", "player1").with_tuning(&settings),
            session_seed().rotate_left(17),
        );
        let mut relay = LoopbackRelay::new("player1", "player2");
        let mut clocks = [FrameClock::new(), FrameClock::new()];

        // player1 builds a ramp from the first tower toward the goal
        stroke(
            &mut one,
            &[Vec2::new(230.0, 290.0), Vec2::new(420.0, 250.0), Vec2::new(420.0, 262.0)],
        );
        relay.pump(&mut one, &mut two);

        // player2 pins the ramp to the second tower
        input::change_tool(&mut two, Tool::Pin);
        relay.pump(&mut one, &mut two);
        stroke(
            &mut two,
            &[Vec2::new(298.0, 270.0), Vec2::new(304.0, 270.0), Vec2::new(301.0, 274.0)],
        );
        relay.pump(&mut one, &mut two);

        // player1 nudges the ball
        input::change_tool(&mut one, Tool::Push);
        relay.pump(&mut one, &mut two);
        if let Some(ball) = one.ball().map(|b| b.position) {
            input::pointer_down(&mut one, ball - Vec2::new(20.0, 0.0));
        }
        relay.pump(&mut one, &mut two);

        let seconds = 10.0;
        let frames = (seconds * 1000.0 / FRAME_MS) as u32;
        run_frames(&mut relay, &mut clocks, &mut one, &mut two, frames);

        for sim in [&one, &two] {
            let snapshot = Snapshot::capture(sim);
            let ball = sim.ball().map(|b| b.position).unwrap_or_default();
            log::info!(
                "{}: level {} ({}), {} bodies, {} chains, ball at ({:.0}, {:.0}), turn {}",
                sim.player_id(),
                snapshot.level,
                if snapshot.level_complete { "complete" } else { "in progress" },
                snapshot.bodies.len(),
                snapshot.chains.len(),
                ball.x,
                ball.y,
                snapshot.current_turn,
            );
        }
        log::info!(
            "Relay: turn {}, completed levels {:?}, {:.1} s simulated at {} ms per tick",
            relay.current_turn(),
            relay.completed().levels,
            one.time_ms / 1000.0,
            TICK_MS
        );
    }
}
