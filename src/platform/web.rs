//! Browser bindings
//!
//! The host page owns the canvas, the relay socket, and the animation
//! frame loop. It forwards pointer and toolbar events here, hands every
//! relay message to `receive`, sends whatever `drain_outbox` returns, and
//! paints from `snapshot`.

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::net::{NetEvent, mirror};
use crate::net::protocol::Direction;
use crate::settings::Settings;
use crate::sim::snapshot::Snapshot;
use crate::sim::state::{Simulation, Tool};
use crate::sim::{FrameClock, input};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already set: {}", e).into());
    }
    log::info!("Duet Physics client loaded");
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// One player's client
#[wasm_bindgen]
pub struct WasmClient {
    sim: Simulation,
    clock: FrameClock,
}

#[wasm_bindgen]
impl WasmClient {
    #[wasm_bindgen(constructor)]
    pub fn new(player_id: String, peer_id: String) -> WasmClient {
        let mut settings = Settings::load();
        settings.player_id = player_id;
        settings.peer_id = peer_id;

        let mut sim = Simulation::new(settings, super::session_seed());
        // Sync with the relay before the first move
        input::request_turn(&mut sim);
        input::request_completed_levels(&mut sim);

        WasmClient {
            sim,
            clock: FrameClock::new(),
        }
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        input::pointer_down(&mut self.sim, Vec2::new(x, y));
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        input::pointer_move(&mut self.sim, Vec2::new(x, y));
    }

    pub fn pointer_up(&mut self) {
        input::pointer_up(&mut self.sim);
    }

    /// Select a tool by its wire name ("pen", "eraser", ...)
    pub fn set_tool(&mut self, name: &str) -> Result<(), JsValue> {
        let tool: Tool = serde_json::from_value(serde_json::Value::String(name.to_string())).map_err(to_js)?;
        input::change_tool(&mut self.sim, tool);
        Ok(())
    }

    pub fn prev_level(&mut self) -> Option<u32> {
        input::change_level(&mut self.sim, Direction::Prev)
    }

    pub fn next_level(&mut self) -> Option<u32> {
        input::change_level(&mut self.sim, Direction::Next)
    }

    pub fn reset_level(&mut self) {
        input::request_reset(&mut self.sim);
    }

    /// Advance by the wall-clock time since the last frame. Returns the
    /// number of fixed steps run.
    pub fn frame(&mut self, elapsed_ms: f32) -> u32 {
        self.clock.advance(&mut self.sim, elapsed_ms)
    }

    /// Apply one relay message
    pub fn receive(&mut self, json: &str) -> Result<(), JsValue> {
        mirror::handle_message(&mut self.sim, json).map_err(to_js)
    }

    /// Queued outbound messages as a JSON array of envelopes
    pub fn drain_outbox(&mut self) -> Result<String, JsValue> {
        let events: Vec<NetEvent> = self.sim.drain_outbox();
        serde_json::to_string(&events).map_err(to_js)
    }

    /// Render state as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        Snapshot::capture(&self.sim).to_json().map_err(to_js)
    }

    pub fn is_my_turn(&self) -> bool {
        self.sim.is_my_turn()
    }

    pub fn level(&self) -> u32 {
        self.sim.level
    }

    /// Persist the current settings to LocalStorage
    pub fn save_settings(&self) {
        self.sim.settings.save();
    }
}
