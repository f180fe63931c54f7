//! Relay protocol, inbound mirror, and an in-process relay

pub mod loopback;
pub mod mirror;
pub mod protocol;

pub use loopback::LoopbackRelay;
pub use mirror::{apply, handle_message};
pub use protocol::NetEvent;
