use std::collections::BTreeSet;

use async_trait::async_trait;
use zonal_types::{PlayerId, PlayerState};

use crate::error::StoreResult;

/// Persistence backend for per-group player snapshots.
///
/// Implementations must be `Send + Sync`; calls are issued concurrently for
/// different players. All I/O is asynchronous so callers never block the
/// host's simulation thread. Timeouts, if any, are the backend's concern.
///
/// Snapshots returned by `load_player_data` are owned copies: callers may
/// treat them as immutable inputs without affecting stored data.
#[async_trait]
pub trait PlayerDataStore: Send + Sync {
    /// Load the snapshot of `player` in `group`.
    ///
    /// `world` narrows the lookup for backends that key snapshots per world
    /// as well as per group; `None` means the group-wide snapshot.
    /// Returns `Ok(None)` if nothing is stored.
    async fn load_player_data(
        &self,
        player: PlayerId,
        group: &str,
        world: Option<&str>,
    ) -> StoreResult<Option<PlayerState>>;

    /// Persist a snapshot under `state.group`, replacing any previous one.
    ///
    /// Returns `Ok(false)` if the backend declined the write.
    async fn save_player_data(&self, state: &PlayerState) -> StoreResult<bool>;

    /// Every player with at least one stored snapshot.
    async fn all_player_ids(&self) -> StoreResult<BTreeSet<PlayerId>>;
}
