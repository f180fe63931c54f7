//! Duet Physics - client core for a two-player physics drawing game
//!
//! Core modules:
//! - `sim`: Simulation context, body factory, constraint graph, physics step
//! - `net`: Wire protocol, remote event mirror, loopback relay
//! - `platform`: Browser bindings (wasm32 only)
//! - `settings`: Tunable client settings
//! - `progress`: Completed level tracking

pub mod error;
pub mod net;
pub mod platform;
pub mod progress;
pub mod settings;
pub mod sim;

pub use error::ProtocolError;
pub use progress::CompletedLevels;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds
    pub const TICK_MS: f32 = 25.0;
    /// Reference step the material constants are tuned against (60 Hz)
    pub const BASE_DELTA_MS: f32 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Constraint relaxation passes per step
    pub const CONSTRAINT_ITERATIONS: u32 = 2;

    /// Canvas dimensions (pixels)
    pub const CANVAS_WIDTH: f32 = 800.0;
    pub const CANVAS_HEIGHT: f32 = 600.0;

    /// Gravity direction and scale
    pub const GRAVITY_Y: f32 = 0.1;
    pub const GRAVITY_SCALE: f32 = 0.001;

    /// Interior stroke points closer than this to the previous kept point are dropped
    pub const SIMPLIFY_MIN_DISTANCE: f32 = 2.0;
    /// Pointer samples closer than this to the last stroke point are ignored
    pub const STROKE_SAMPLE_DISTANCE: f32 = 5.0;
    /// Stroke points within this distance of a wall edge snap onto it
    pub const WALL_SNAP_DISTANCE: f32 = 5.0;

    /// Drawn polygon tuning (slow falling shapes)
    pub const SHAPE_DENSITY: f32 = 0.005;
    pub const SHAPE_AIR_FRICTION: f32 = 0.02;
    pub const SHAPE_FRICTION: f32 = 0.8;
    pub const SHAPE_RESTITUTION: f32 = 0.2;
    /// Two-point strokes become a thin bar
    pub const LINE_DENSITY: f32 = 0.01;
    pub const LINE_THICKNESS: f32 = 2.0;
    /// Default density for everything else
    pub const DEFAULT_DENSITY: f32 = 0.001;

    /// Chain tuning
    pub const CHAIN_STIFFNESS: f32 = 0.0001;
    pub const CHAIN_DAMPING: f32 = 0.00001;
    pub const CHAIN_SLACK: f32 = 1.1;
    /// Eraser hit distance for chain segments
    pub const CHAIN_PICK_DISTANCE: f32 = 6.0;

    /// Ball
    pub const BALL_RADIUS: f32 = 15.0;
    /// Ball is reset once it gets this close to the floor's lower edge
    pub const FLOOR_RESET_MARGIN: f32 = 40.0;
    /// Push tool force magnitude
    pub const PUSH_FORCE: f32 = 0.008;

    /// Opacity lost per step by drawn bodies resting on the floor
    pub const FADE_PER_STEP: f32 = 0.01;

    /// Timers (milliseconds)
    pub const PUSH_LOCK_MS: f64 = 5000.0;
    pub const CHAIN_DEBOUNCE_MS: f64 = 1000.0;
    pub const CURSOR_LIFETIME_MS: f64 = 2000.0;

    /// Number of playable levels
    pub const TOTAL_LEVELS: u32 = 9;
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    if angle == 0.0 {
        return v;
    }
    Vec2::from_angle(angle).rotate(v)
}

/// Distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert!((distance_to_segment(Vec2::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-6);
        assert!((distance_to_segment(Vec2::new(-4.0, 3.0), a, b) - 5.0).abs() < 1e-6);
        // Degenerate segment
        assert!((distance_to_segment(Vec2::new(3.0, 4.0), a, a) - 5.0).abs() < 1e-6);
    }
}
