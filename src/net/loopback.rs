//! In-process relay
//!
//! Routes events between two local simulations exactly the way the hosted
//! relay does, including the JSON round-trip. Used by the headless demo and
//! by the two-client tests.

use super::mirror;
use super::protocol::{LevelList, NetEvent, UpdateTurn};
use crate::progress::CompletedLevels;
use crate::sim::state::{Simulation, first_mover};

/// Safety cap on request/response rounds per pump
const MAX_ROUNDS: usize = 32;

/// Who receives a relayed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The other player only
    Peer,
    /// Both players, sender included
    Both,
    /// Back to the sender only
    Sender,
    /// Consumed by the relay
    Drop,
}

/// Routing rule for a client-originated event
pub fn route_of(event: &NetEvent) -> Route {
    match event {
        NetEvent::DrawShape(_)
        | NetEvent::DrawPin(_)
        | NetEvent::CreateChain(_)
        | NetEvent::ReleaseCategory(_)
        | NetEvent::MouseMove(_) => Route::Peer,
        NetEvent::Erase(_)
        | NetEvent::Push(_)
        | NetEvent::ChangeTool(_)
        | NetEvent::ChangeLevel(_)
        | NetEvent::ResetLevel(_) => Route::Both,
        NetEvent::GetCompletedLevels => Route::Sender,
        NetEvent::ChangeTurn(_) | NetEvent::GetTurn | NetEvent::CompleteLevel(_) => Route::Both,
        // Relay-originated; a client has no business sending these
        NetEvent::UpdateTurn(_)
        | NetEvent::CompletedLevelsResponse(_)
        | NetEvent::CompletedLevelsUpdated(_) => Route::Drop,
    }
}

/// Relay state shared by one pair of players
#[derive(Debug, Clone)]
pub struct LoopbackRelay {
    players: [String; 2],
    current_turn: String,
    completed: CompletedLevels,
}

impl LoopbackRelay {
    pub fn new(first: &str, second: &str) -> Self {
        let current_turn = first_mover(first, second).to_string();
        Self {
            players: [first.to_string(), second.to_string()],
            current_turn,
            completed: CompletedLevels::new(),
        }
    }

    pub fn current_turn(&self) -> &str {
        &self.current_turn
    }

    pub fn completed(&self) -> &CompletedLevels {
        &self.completed
    }

    fn peer_of(&self, player: &str) -> Option<&str> {
        match player {
            p if p == self.players[0] => Some(self.players[1].as_str()),
            p if p == self.players[1] => Some(self.players[0].as_str()),
            _ => None,
        }
    }

    /// Turn one inbound event into the deliveries it causes
    pub fn route(&mut self, from: &str, event: NetEvent) -> Vec<(String, NetEvent)> {
        let Some(peer) = self.peer_of(from).map(str::to_string) else {
            log::warn!("Relay dropping {} from unknown player {}", event.name(), from);
            return Vec::new();
        };

        // Requests the relay answers itself
        let event = match event {
            NetEvent::ChangeTurn(change) => {
                self.current_turn = change.next_player_id;
                NetEvent::UpdateTurn(UpdateTurn {
                    current_turn: self.current_turn.clone(),
                })
            }
            NetEvent::GetTurn => NetEvent::UpdateTurn(UpdateTurn {
                current_turn: self.current_turn.clone(),
            }),
            NetEvent::CompleteLevel(complete) => {
                self.completed.mark(complete.completed_level);
                NetEvent::CompletedLevelsUpdated(LevelList {
                    levels: self.completed.levels.clone(),
                })
            }
            NetEvent::GetCompletedLevels => NetEvent::CompletedLevelsResponse(LevelList {
                levels: self.completed.levels.clone(),
            }),
            other => other,
        };

        match route_of(&event) {
            Route::Peer => vec![(peer, event)],
            Route::Both => vec![(from.to_string(), event.clone()), (peer, event)],
            Route::Sender => vec![(from.to_string(), event)],
            Route::Drop => {
                log::debug!("Relay dropping {} from {}", event.name(), from);
                Vec::new()
            }
        }
    }

    /// Relay queued events between `a` and `b` until both outboxes are
    /// empty. Returns the number of messages delivered.
    pub fn pump(&mut self, a: &mut Simulation, b: &mut Simulation) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_ROUNDS {
            let outbound: Vec<(String, NetEvent)> = [&mut *a, &mut *b]
                .into_iter()
                .flat_map(|sim| {
                    let from = sim.player_id().to_string();
                    sim.drain_outbox().into_iter().map(move |e| (from.clone(), e))
                })
                .collect();
            if outbound.is_empty() {
                return delivered;
            }

            for (from, event) in outbound {
                for (to, event) in self.route(&from, event) {
                    let json = match event.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            log::error!("Failed to encode {}: {}", event.name(), e);
                            continue;
                        }
                    };
                    let target = if a.player_id() == to { &mut *a } else { &mut *b };
                    if let Err(e) = mirror::handle_message(target, &json) {
                        log::debug!("{} rejected {}: {}", to, event.name(), e);
                    }
                    delivered += 1;
                }
            }
        }
        log::warn!("Relay still busy after {} rounds", MAX_ROUNDS);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::net::protocol::Direction;
    use crate::settings::Settings;
    use crate::sim::body::BodyRole;
    use crate::sim::filter::DEFAULT_CATEGORY;
    use crate::sim::ids::EntityId;
    use crate::sim::input;
    use crate::sim::state::Tool;
    use crate::sim::{factory, tick};

    struct Pair {
        relay: LoopbackRelay,
        one: Simulation,
        two: Simulation,
    }

    impl Pair {
        fn new() -> Self {
            Self {
                relay: LoopbackRelay::new("player1", "player2"),
                one: Simulation::new(Settings::for_players("player1", "player2"), 1),
                two: Simulation::new(Settings::for_players("player2", "player1"), 2),
            }
        }

        fn pump(&mut self) -> usize {
            self.relay.pump(&mut self.one, &mut self.two)
        }
    }

    fn stroke(sim: &mut Simulation, points: &[Vec2]) {
        input::pointer_down(sim, points[0]);
        for &p in &points[1..] {
            input::pointer_move(sim, p);
        }
        input::pointer_up(sim);
    }

    fn square(center: Vec2, half: f32) -> Vec<Vec2> {
        vec![
            center + Vec2::new(-half, -half),
            center + Vec2::new(half, -half),
            center + Vec2::new(half, half),
            center + Vec2::new(-half, half),
        ]
    }

    fn drawn_ids(sim: &Simulation) -> Vec<String> {
        let mut ids: Vec<String> = sim
            .world
            .bodies()
            .iter()
            .filter(|b| !b.role.is_level())
            .map(|b| b.id.to_string())
            .collect();
        ids.sort();
        ids
    }

    fn pin_on(sim: &mut Simulation, at: Vec2) -> EntityId {
        sim.tool = Tool::Pin;
        let points = [at + Vec2::new(-3.0, 0.0), at + Vec2::new(3.0, 0.0), at + Vec2::new(0.0, 3.0)];
        let id = factory::draw(sim, &points).unwrap();
        sim.tool = Tool::Pen;
        id
    }

    #[test]
    fn test_drawn_shape_appears_on_both_clients() {
        let mut pair = Pair::new();
        stroke(&mut pair.one, &square(Vec2::new(300.0, 150.0), 20.0));
        pair.pump();

        assert_eq!(drawn_ids(&pair.one).len(), 1);
        assert_eq!(drawn_ids(&pair.one), drawn_ids(&pair.two));
        let id = EntityId::parse(&drawn_ids(&pair.two)[0]);
        assert_eq!(pair.two.world.body(&id).unwrap().filter.category, DEFAULT_CATEGORY);

        // Turn handed over and confirmed by the relay
        assert_eq!(pair.relay.current_turn(), "player2");
        assert!(!pair.one.is_my_turn());
        assert!(pair.two.is_my_turn());
    }

    #[test]
    fn test_pinned_assembly_shares_category_on_both_clients() {
        let mut pair = Pair::new();
        let pin = pin_on(&mut pair.one, Vec2::new(500.0, 350.0));
        let shape = factory::draw(&mut pair.one, &square(Vec2::new(500.0, 340.0), 20.0)).unwrap();
        pair.pump();

        for sim in [&pair.one, &pair.two] {
            let category = sim.world.body(&pin).unwrap().filter.category;
            assert_ne!(category, DEFAULT_CATEGORY);
            assert_eq!(sim.world.body(&shape).unwrap().filter.category, category);
            assert_eq!(sim.world.body(&EntityId::scenery("tower4")).unwrap().filter.category, category);
            assert!(sim.categories.is_used(category));
            assert_eq!(sim.world.constraint_count(), 2);
            assert!(sim.pins.contains(&pin));
        }
    }

    #[test]
    fn test_erasing_a_shape_cascades_to_its_pin_on_both_clients() {
        let mut pair = Pair::new();
        let shape = factory::draw(&mut pair.one, &square(Vec2::new(300.0, 150.0), 20.0)).unwrap();
        let pin = pin_on(&mut pair.one, Vec2::new(300.0, 150.0));
        pair.pump();
        let category = pair.two.world.body(&pin).unwrap().filter.category;
        assert!(pair.two.categories.is_used(category));

        pair.two.current_turn = "player2".into();
        pair.two.tool = Tool::Eraser;
        input::pointer_down(&mut pair.two, Vec2::new(290.0, 160.0));
        pair.pump();

        for sim in [&pair.one, &pair.two] {
            assert!(sim.world.body(&shape).is_none());
            assert!(sim.world.body(&pin).is_none());
            assert!(!sim.pins.contains(&pin));
            assert!(!sim.categories.is_used(category));
            assert_eq!(sim.world.constraint_count(), 0);
        }
    }

    #[test]
    fn test_chain_between_pins_is_mirrored() {
        let mut pair = Pair::new();
        let a = pin_on(&mut pair.one, Vec2::new(200.0, 350.0));
        let b = pin_on(&mut pair.one, Vec2::new(300.0, 350.0));
        pair.pump();

        pair.one.current_turn = "player1".into();
        pair.one.tool = Tool::Chain;
        input::pointer_down(&mut pair.one, Vec2::new(200.0, 350.0));
        input::pointer_down(&mut pair.one, Vec2::new(300.0, 350.0));
        pair.pump();

        let chains = |sim: &Simulation| {
            sim.world
                .constraints()
                .filter(|(_, c)| c.is_chain())
                .map(|(_, c)| (c.label.clone(), c.body_a.clone(), c.body_b.clone(), c.length))
                .collect::<Vec<_>>()
        };
        let one = chains(&pair.one);
        assert_eq!(one.len(), 1);
        assert_eq!(one, chains(&pair.two));
        assert_eq!(one[0].1.as_ref(), Some(&a));
        assert_eq!(one[0].2.as_ref(), Some(&b));
    }

    #[test]
    fn test_level_change_applies_on_echo() {
        let mut pair = Pair::new();
        stroke(&mut pair.one, &square(Vec2::new(300.0, 150.0), 20.0));
        pair.pump();

        assert_eq!(input::change_level(&mut pair.two, Direction::Next), Some(2));
        assert_eq!(pair.two.level, 1);
        pair.pump();

        for sim in [&pair.one, &pair.two] {
            assert_eq!(sim.level, 2);
            assert!(drawn_ids(sim).is_empty());
            assert!(sim.ball().is_some());
        }
    }

    #[test]
    fn test_rejected_delivery_keeps_pumping() {
        let mut pair = Pair::new();
        pair.one.emit(NetEvent::ChangeLevel(crate::net::protocol::ChangeLevel {
            level: 77,
            direction: None,
        }));
        stroke(&mut pair.one, &square(Vec2::new(300.0, 150.0), 20.0));

        pair.pump();
        // Both echoes of the bad level were refused; the shape still arrived
        assert_eq!(pair.one.level, 1);
        assert_eq!(pair.two.level, 1);
        assert_eq!(drawn_ids(&pair.one), drawn_ids(&pair.two));
        assert_eq!(drawn_ids(&pair.two).len(), 1);
    }

    #[test]
    fn test_push_reaches_both_balls() {
        let mut pair = Pair::new();
        let ball = pair.one.ball().unwrap().position;
        pair.one.tool = Tool::Push;
        pair.one.current_turn = "player1".into();
        input::pointer_down(&mut pair.one, ball - Vec2::new(30.0, 0.0));
        pair.pump();

        for sim in [&pair.one, &pair.two] {
            assert!(sim.world.find_role(BodyRole::Ball).unwrap().force.x > 0.0);
            assert!(sim.push_locked());
        }
    }

    #[test]
    fn test_completed_levels_are_shared() {
        let mut pair = Pair::new();
        let goal = pair.one.world.find_role(BodyRole::Goal).unwrap().position;
        pair.one.world.find_role_mut(BodyRole::Ball).unwrap().set_position(goal);
        tick::tick(&mut pair.one, 25.0);
        pair.pump();

        assert!(pair.relay.completed().contains(1));
        assert!(pair.two.completed.contains(1));

        let mut late = Simulation::new(Settings::for_players("player2", "player1"), 3);
        input::request_completed_levels(&mut late);
        pair.relay.pump(&mut pair.one, &mut late);
        assert_eq!(late.completed.levels, vec![1]);
    }

    #[test]
    fn test_cursor_moves_only_reach_the_peer() {
        let mut pair = Pair::new();
        input::pointer_move(&mut pair.two, Vec2::new(42.0, 24.0));
        pair.pump();
        assert!(pair.two.cursors.is_empty());
        assert_eq!(pair.one.cursors.len(), 1);
        assert_eq!(pair.one.cursors[0].position, Vec2::new(42.0, 24.0));
    }
}
