use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;
use zonal_types::{PlayerId, PlayerState};

use crate::error::{StoreError, StoreResult};
use crate::traits::PlayerDataStore;

type Key = (PlayerId, String);

/// In-memory, HashMap-based player store.
///
/// Intended for tests and embedding. Snapshots are keyed by (player, group)
/// and held behind a `RwLock`; the `world` argument of loads is ignored.
/// Snapshots are cloned on read and write.
pub struct InMemoryPlayerStore {
    states: RwLock<HashMap<Key, PlayerState>>,
}

impl InMemoryPlayerStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Store a snapshot synchronously (test setup helper).
    pub fn insert(&self, state: PlayerState) -> StoreResult<()> {
        let mut map = self.write_lock()?;
        map.insert((state.player_id, state.group.clone()), state);
        Ok(())
    }

    /// Read a snapshot synchronously.
    pub fn get(&self, player: PlayerId, group: &str) -> Option<PlayerState> {
        self.states
            .read()
            .ok()
            .and_then(|map| map.get(&(player, group.to_string())).cloned())
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.states.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_lock(
        &self,
    ) -> StoreResult<std::sync::RwLockWriteGuard<'_, HashMap<Key, PlayerState>>> {
        self.states
            .write()
            .map_err(|_| StoreError::Unavailable("player store lock poisoned".into()))
    }

    fn read_lock(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<Key, PlayerState>>> {
        self.states
            .read()
            .map_err(|_| StoreError::Unavailable("player store lock poisoned".into()))
    }
}

impl Default for InMemoryPlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerDataStore for InMemoryPlayerStore {
    async fn load_player_data(
        &self,
        player: PlayerId,
        group: &str,
        _world: Option<&str>,
    ) -> StoreResult<Option<PlayerState>> {
        let map = self.read_lock()?;
        Ok(map.get(&(player, group.to_string())).cloned())
    }

    async fn save_player_data(&self, state: &PlayerState) -> StoreResult<bool> {
        let mut map = self.write_lock()?;
        map.insert((state.player_id, state.group.clone()), state.clone());
        debug!(player = %state.player_id, group = %state.group, "player data saved");
        Ok(true)
    }

    async fn all_player_ids(&self) -> StoreResult<BTreeSet<PlayerId>> {
        let map = self.read_lock()?;
        Ok(map.keys().map(|(player, _)| *player).collect())
    }
}

impl std::fmt::Debug for InMemoryPlayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPlayerStore")
            .field("snapshot_count", &self.len())
            .finish()
    }
}
