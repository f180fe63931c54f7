//! Platform layer
//!
//! Browser bindings live in `web` (wasm32 only). Everything else in the
//! crate is platform independent and only needs a session seed from here.

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::WasmClient;

/// Seed for the per-session id tag
#[cfg(target_arch = "wasm32")]
pub fn session_seed() -> u64 {
    js_sys::Date::now() as u64 ^ (js_sys::Math::random() * u32::MAX as f64) as u64
}

/// Seed for the per-session id tag
#[cfg(not(target_arch = "wasm32"))]
pub fn session_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
        ^ u64::from(std::process::id())
}
