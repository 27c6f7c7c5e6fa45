use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid player id: {0}")]
    InvalidPlayerId(String),

    #[error("invalid stack amount {amount} for {item_type} (max {max})")]
    InvalidStackAmount {
        item_type: String,
        amount: u32,
        max: u32,
    },

    #[error("invalid time range: start {start} is after end {end}")]
    InvalidTimeRange { start: String, end: String },

    #[error("unknown game mode: {0}")]
    UnknownGameMode(String),
}
