//! Per-operator pending merges.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zonal_types::{ItemStack, OperatorId, PlayerId, PlayerState, SessionId, SlotType};

use crate::conflict::{Conflict, Resolution};
use crate::strategy::MergeStrategy;

/// A previewed merge awaiting commit or cancellation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeSession {
    pub id: SessionId,
    pub operator: OperatorId,
    pub player_id: PlayerId,
    pub source_group: String,
    pub target_group: String,
    pub strategy: MergeStrategy,
    /// Working merged snapshot, before conflict resolutions are applied.
    pub merged: PlayerState,
    pub conflicts: Vec<Conflict>,
    pub overflow_items: Vec<ItemStack>,
    pub created_at: DateTime<Utc>,
}

impl MergeSession {
    pub fn pending_count(&self) -> usize {
        self.conflicts.iter().filter(|c| !c.is_resolved()).count()
    }

    /// Returns `true` once every conflict has a resolution.
    pub fn is_ready(&self) -> bool {
        self.pending_count() == 0
    }

    fn resolve(&mut self, slot: u32, slot_type: Option<SlotType>, resolution: Resolution) -> bool {
        // Prefer a still-pending conflict so an untyped slot index walks
        // through regions that share it.
        let index = self
            .conflicts
            .iter()
            .enumerate()
            .filter(|(_, c)| c.slot == slot && slot_type.map_or(true, |t| c.slot_type == t))
            .min_by_key(|(i, c)| (c.is_resolved(), *i))
            .map(|(i, _)| i);

        match index {
            Some(i) => {
                self.conflicts[i].resolution = resolution;
                true
            }
            None => false,
        }
    }
}

/// Concurrent map of pending merges, at most one per operator.
///
/// Every operation is atomic for its key; different operators never block
/// each other.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<OperatorId, MergeSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session, returning the one it replaced.
    pub fn insert(&self, session: MergeSession) -> Option<MergeSession> {
        let replaced = self.sessions.insert(session.operator, session);
        if let Some(old) = &replaced {
            debug!(operator = %old.operator, session = %old.id, "replaced pending merge");
        }
        replaced
    }

    /// Cloned snapshot of the operator's session.
    pub fn get(&self, operator: &OperatorId) -> Option<MergeSession> {
        self.sessions.get(operator).map(|s| s.clone())
    }

    /// Resolve the conflict at `slot`, in whichever region holds it.
    ///
    /// Returns `false` if there is no session, no conflict at that slot, or
    /// `resolution` is [`Resolution::Pending`].
    pub fn resolve_conflict(&self, operator: &OperatorId, slot: u32, resolution: Resolution) -> bool {
        self.resolve(operator, slot, None, resolution)
    }

    /// Resolve the conflict at `slot` within one region.
    pub fn resolve_conflict_in(
        &self,
        operator: &OperatorId,
        slot: u32,
        slot_type: SlotType,
        resolution: Resolution,
    ) -> bool {
        self.resolve(operator, slot, Some(slot_type), resolution)
    }

    fn resolve(&self, operator: &OperatorId, slot: u32, slot_type: Option<SlotType>, resolution: Resolution) -> bool {
        if resolution.is_pending() {
            return false;
        }
        match self.sessions.get_mut(operator) {
            Some(mut session) => {
                let resolved = session.resolve(slot, slot_type, resolution);
                if resolved {
                    debug!(%operator, slot, %resolution, remaining = session.pending_count(), "conflict resolved");
                }
                resolved
            }
            None => false,
        }
    }

    /// `false` when there is no session.
    pub fn all_conflicts_resolved(&self, operator: &OperatorId) -> bool {
        self.sessions.get(operator).map(|s| s.is_ready()).unwrap_or(false)
    }

    /// Drop the operator's session. Returns `true` if one existed.
    pub fn cancel(&self, operator: &OperatorId) -> bool {
        self.sessions.remove(operator).is_some()
    }

    /// Remove the operator's session only if it is still `id`.
    pub fn remove_if_current(&self, operator: &OperatorId, id: SessionId) -> bool {
        self.sessions.remove_if(operator, |_, s| s.id == id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
