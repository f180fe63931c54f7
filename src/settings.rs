//! Client settings
//!
//! Tuning knobs that are not part of the shared world state. Loaded from
//! LocalStorage on the web and from an optional JSON file on native.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Client settings/tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Simulation ===
    /// Fixed step length (ms)
    pub tick_ms: f32,
    /// Maximum fixed steps run per animation frame
    pub max_substeps: u32,
    /// Vertical gravity before scaling
    pub gravity_y: f32,

    // === Timers ===
    /// How long an applied push blocks further pushes (ms)
    pub push_lock_ms: f64,
    /// Window after a chain is created during which new chains are ignored (ms)
    pub chain_debounce_ms: f64,
    /// How long a peer cursor stays visible without updates (ms)
    pub cursor_lifetime_ms: f64,

    // === Identity ===
    /// Wire id of this player
    pub player_id: String,
    /// Wire id of the other player
    pub peer_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            max_substeps: MAX_SUBSTEPS,
            gravity_y: GRAVITY_Y,

            push_lock_ms: PUSH_LOCK_MS,
            chain_debounce_ms: CHAIN_DEBOUNCE_MS,
            cursor_lifetime_ms: CURSOR_LIFETIME_MS,

            player_id: "player1".to_string(),
            peer_id: "player2".to_string(),
        }
    }
}

impl Settings {
    /// Settings for the given player pair
    pub fn for_players(player_id: &str, peer_id: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            peer_id: peer_id.to_string(),
            ..Self::default()
        }
    }

    /// Keep this player pair but take every tuning value from `other`
    pub fn with_tuning(self, other: &Settings) -> Self {
        Self {
            player_id: self.player_id,
            peer_id: self.peer_id,
            ..other.clone()
        }
    }

    /// Parse settings, filling missing fields with defaults
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "duet_physics_settings";

    /// Environment variable naming a settings file (native only)
    pub const ENV_VAR: &'static str = "DUET_PHYSICS_SETTINGS";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Load settings from the file named by `DUET_PHYSICS_SETTINGS`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::ENV_VAR) else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path);
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring settings file {}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read settings file {}: {}", path, e);
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
