//! Error types
//!
//! Gameplay lookups never fail loudly (a stale id is a no-op). Errors are
//! reserved for payloads that cannot be interpreted at all.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Level {0} does not exist")]
    UnknownLevel(u32),

    #[error("Invalid collision category {0:#06x}")]
    InvalidCategory(u16),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f32 },
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
