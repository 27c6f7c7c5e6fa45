use zonal_types::PlayerId;

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend is not reachable (database down, connection closed).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored snapshot could not be decoded.
    #[error("corrupt data for player {player} in group '{group}': {reason}")]
    Corrupt {
        player: PlayerId,
        group: String,
        reason: String,
    },

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
