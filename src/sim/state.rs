//! Simulation context
//!
//! Everything one client knows about the shared game lives in a
//! [`Simulation`]: the physics world, the pin registry, category bookkeeping,
//! turn and tool state, local timers, and the queue of outbound events.
//! Every operation takes it explicitly; there is no global state.

use std::cmp::Ordering;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Body, BodyRole};
use super::filter::CategoryAllocator;
use super::ids::{EntityId, IdGenerator};
use super::level::{self, LevelLayout};
use super::pins::PinRegistry;
use super::world::World;
use crate::consts::GRAVITY_SCALE;
use crate::net::protocol::{ChangeTurn, Erase, NetEvent};
use crate::progress::CompletedLevels;
use crate::settings::Settings;

/// Player who moves before the relay has answered `getTurn`.
///
/// Ids compare by their text with any trailing number taken by value, so
/// "player2" moves before "player10".
pub fn first_mover<'a>(a: &'a str, b: &'a str) -> &'a str {
    match compare_player_ids(a, b) {
        Ordering::Greater => b,
        _ => a,
    }
}

fn compare_player_ids(a: &str, b: &str) -> Ordering {
    let split = |id: &str| {
        let stem = id.trim_end_matches(|c: char| c.is_ascii_digit());
        let number = id[stem.len()..].parse::<u64>().ok();
        (stem.to_string(), number)
    };
    let ((stem_a, num_a), (stem_b, num_b)) = (split(a), split(b));
    stem_a
        .cmp(&stem_b)
        .then(num_a.cmp(&num_b))
        .then_with(|| a.cmp(b))
}

/// Active drawing tool (shared by both players)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
    Pin,
    Push,
    Chain,
}

/// Last known pointer position of a peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCursor {
    pub player_id: String,
    pub position: Vec2,
    /// Simulation time of the last update (ms)
    pub seen_at_ms: f64,
}

/// Complete client state
#[derive(Debug)]
pub struct Simulation {
    pub settings: Settings,
    pub world: World,
    pub pins: PinRegistry,
    pub categories: CategoryAllocator,
    pub ids: IdGenerator,
    /// Current level number
    pub level: u32,
    /// Layout of the current level (None only if the build failed)
    pub layout: Option<LevelLayout>,
    pub tool: Tool,
    /// Player allowed to act, as last reported by the relay
    pub current_turn: String,
    /// Goal reached in the current level
    pub level_complete: bool,
    pub completed: CompletedLevels,
    /// Simulation clock (ms), advanced by `tick`
    pub time_ms: f64,
    /// Inbound pushes are ignored until this time
    pub push_locked_until: f64,
    /// New chains are ignored until this time
    pub chain_cooldown_until: f64,
    /// First pin picked with the chain tool
    pub chain_anchor: Option<EntityId>,
    /// Stroke being drawn with the pen or pin tool
    pub stroke: Vec<Vec2>,
    pub drawing: bool,
    pub cursors: Vec<RemoteCursor>,
    outbox: Vec<NetEvent>,
}

impl Simulation {
    /// Create a client on level 1. `seed` only feeds the id session tag.
    pub fn new(settings: Settings, seed: u64) -> Self {
        let current_turn = first_mover(&settings.player_id, &settings.peer_id).to_string();

        let mut sim = Self {
            settings,
            world: World::new(),
            pins: PinRegistry::new(),
            categories: CategoryAllocator::new(),
            ids: IdGenerator::new(seed),
            level: 1,
            layout: None,
            tool: Tool::default(),
            current_turn,
            level_complete: false,
            completed: CompletedLevels::new(),
            time_ms: 0.0,
            push_locked_until: 0.0,
            chain_cooldown_until: 0.0,
            chain_anchor: None,
            stroke: Vec::new(),
            drawing: false,
            cursors: Vec::new(),
            outbox: Vec::new(),
        };
        sim.load_level(1);
        log::info!(
            "Simulation for {} (session {:08x})",
            sim.settings.player_id,
            sim.ids.session_tag()
        );
        sim
    }

    /// Queue an outbound event
    pub fn emit(&mut self, event: NetEvent) {
        log::debug!("-> {}", event.name());
        self.outbox.push(event);
    }

    /// Take all queued outbound events
    pub fn drain_outbox(&mut self) -> Vec<NetEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn outbox(&self) -> &[NetEvent] {
        &self.outbox
    }

    pub fn player_id(&self) -> &str {
        &self.settings.player_id
    }

    pub fn is_my_turn(&self) -> bool {
        self.current_turn == self.settings.player_id
    }

    /// Hand the turn to the peer. The local flag flips immediately; the
    /// relay's `updateTurn` answer is authoritative.
    pub fn pass_turn(&mut self) {
        let next = self.settings.peer_id.clone();
        self.current_turn = next.clone();
        self.emit(NetEvent::ChangeTurn(ChangeTurn {
            next_player_id: next,
            current_level: self.level,
        }));
    }

    /// Ask the relay to erase `id` on both clients
    pub fn request_erase(&mut self, id: EntityId, is_release: bool) {
        self.emit(NetEvent::Erase(Erase {
            custom_id: id,
            current_level: self.level,
            is_release,
        }));
    }

    /// Tear down the world and build `level`. Returns false (and leaves
    /// everything untouched) for unknown levels.
    pub fn load_level(&mut self, level: u32) -> bool {
        if !level::is_valid_level(level) {
            log::warn!("Ignoring request for unknown level {}", level);
            return false;
        }

        self.world.clear();
        self.pins.clear();
        self.categories.reset();
        self.chain_anchor = None;
        self.stroke.clear();
        self.drawing = false;
        self.level_complete = false;

        self.level = level;
        self.layout = level::build_level(&mut self.world, level);
        true
    }

    /// Gravity force per unit mass
    pub fn gravity(&self) -> Vec2 {
        Vec2::new(0.0, self.settings.gravity_y * GRAVITY_SCALE)
    }

    pub fn ball(&self) -> Option<&Body> {
        self.world.find_role(BodyRole::Ball)
    }

    pub fn push_locked(&self) -> bool {
        self.time_ms < self.push_locked_until
    }

    pub fn chain_cooling_down(&self) -> bool {
        self.time_ms < self.chain_cooldown_until
    }

    /// Record a peer cursor position
    pub fn update_cursor(&mut self, player_id: &str, position: Vec2) {
        let now = self.time_ms;
        match self.cursors.iter_mut().find(|c| c.player_id == player_id) {
            Some(cursor) => {
                cursor.position = position;
                cursor.seen_at_ms = now;
            }
            None => self.cursors.push(RemoteCursor {
                player_id: player_id.to_string(),
                position,
                seen_at_ms: now,
            }),
        }
    }

    /// Drop cursors that have not moved for the configured lifetime
    pub fn expire_cursors(&mut self) {
        let now = self.time_ms;
        let lifetime = self.settings.cursor_lifetime_ms;
        self.cursors.retain(|c| now - c.seen_at_ms < lifetime);
    }
}
