//! Error taxonomy
//!
//! Only configuration and command parsing can fail outright. Pool exhaustion
//! is reported but never aborts a frame, and invariant violations are
//! programming defects (see `debug_assert!`s in `sim::sites` and `sim::pool`).

use thiserror::Error;

use crate::sim::Species;

#[derive(Debug, Error)]
pub enum SimError {
    /// No free slot for a spawn; the spawn is skipped for this frame
    #[error("{0} pool exhausted, spawn skipped")]
    ResourceExhausted(Species),
    /// Non-finite value handed to `set_parameter`
    #[error("invalid value {value} for parameter `{name}`")]
    InvalidParameter { name: String, value: f64 },
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("unknown model `{0}` (expected A, B, C or D)")]
    UnknownModel(String),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}
