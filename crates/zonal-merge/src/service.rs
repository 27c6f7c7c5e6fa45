//! Asynchronous merge orchestration over a [`PlayerDataStore`].
//!
//! The service loads snapshots, runs the pure engine, keeps previews in the
//! [`SessionRegistry`] and writes committed results back. Every storage
//! round-trip races the owning scope's shutdown token; an aborted call
//! leaves the registry untouched.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zonal_store::PlayerDataStore;
use zonal_types::{ItemStack, OperatorId, PlayerId, PlayerState, SessionId, SlotType};

use crate::config::MergeConfig;
use crate::conflict::Resolution;
use crate::engine::{apply_resolutions, merge_states, stash_overflow};
use crate::error::{MergeError, MergeOpResult};
use crate::result::MergeResult;
use crate::session::{MergeSession, SessionRegistry};
use crate::strategy::MergeStrategy;

/// Entry point for previews, conflict resolution, commits and bulk merges.
pub struct MergeService {
    store: Arc<dyn PlayerDataStore>,
    config: MergeConfig,
    sessions: SessionRegistry,
    shutdown: CancellationToken,
}

impl MergeService {
    /// Create a service. Cancelling `shutdown` aborts in-flight operations.
    pub fn new(store: Arc<dyn PlayerDataStore>, config: MergeConfig, shutdown: CancellationToken) -> Self {
        Self {
            store,
            config,
            sessions: SessionRegistry::new(),
            shutdown,
        }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    // -----------------------------------------------------------------------
    // Preview
    // -----------------------------------------------------------------------

    /// Compute a merge of `player`'s snapshot in `source_group` into
    /// `target_group` and store it as `operator`'s pending merge.
    ///
    /// A manual preview never reports success: its conflicts must be
    /// resolved and committed first.
    pub async fn preview_merge(
        &self,
        operator: OperatorId,
        player: PlayerId,
        source_group: &str,
        target_group: &str,
        strategy: MergeStrategy,
    ) -> MergeResult {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                MergeResult::failure(format!("Merge preview aborted: {}", MergeError::Cancelled))
            }
            result = self.try_preview(operator, player, source_group, target_group, strategy) => {
                result.unwrap_or_else(|e| {
                    warn!(%operator, %player, source_group, target_group, error = %e, "merge preview failed");
                    MergeResult::failure(format!("Merge preview failed: {e}"))
                })
            }
        }
    }

    async fn try_preview(
        &self,
        operator: OperatorId,
        player: PlayerId,
        source_group: &str,
        target_group: &str,
        strategy: MergeStrategy,
    ) -> MergeOpResult<MergeResult> {
        let (source, target) = tokio::try_join!(
            self.store.load_player_data(player, source_group, None),
            self.store.load_player_data(player, target_group, None),
        )?;

        let Some(source) = source else {
            debug!(%player, source_group, "no source snapshot");
            return Ok(MergeResult::failure(format!(
                "No source data found for player {player} in group '{source_group}'"
            )));
        };
        let target_was_empty = target.is_none();
        let target = target.unwrap_or_else(|| PlayerState::empty(player, source.player_name.clone(), target_group));

        let outcome = merge_states(&source, &target, target_group, strategy);
        let mut merged = outcome.merged;
        let overflow = self.place_overflow(&mut merged, outcome.overflow);

        let mut message = if strategy.is_automatic() {
            format!("Merged {} from '{source_group}' into '{target_group}' using {strategy}", source.player_name)
        } else if outcome.conflicts.is_empty() {
            format!(
                "No conflicts; merge of {} into '{target_group}' is ready to commit",
                source.player_name
            )
        } else {
            format!(
                "{} conflict(s) must be resolved before merging {} into '{target_group}'",
                outcome.conflicts.len(),
                source.player_name
            )
        };
        if target_was_empty {
            message.push_str(&format!("; target group '{target_group}' had no data"));
        }
        if !overflow.is_empty() {
            message.push_str(&format!("; {} stack(s) overflowed", overflow.len()));
        }

        let session = MergeSession {
            id: SessionId::new(),
            operator,
            player_id: player,
            source_group: source_group.to_string(),
            target_group: target_group.to_string(),
            strategy,
            merged: merged.clone(),
            conflicts: outcome.conflicts.clone(),
            overflow_items: overflow.clone(),
            created_at: Utc::now(),
        };
        info!(
            %operator,
            %player,
            source_group,
            target_group,
            %strategy,
            session = %session.id,
            conflicts = session.conflicts.len(),
            overflow = overflow.len(),
            "merge previewed"
        );
        self.sessions.insert(session);

        Ok(MergeResult {
            success: strategy.is_automatic(),
            message,
            merged_data: Some(merged),
            conflicts: outcome.conflicts,
            overflow_items: overflow,
            player_count: 1,
        })
    }

    // -----------------------------------------------------------------------
    // Session access
    // -----------------------------------------------------------------------

    pub fn resolve_conflict(&self, operator: &OperatorId, slot: u32, resolution: Resolution) -> bool {
        self.sessions.resolve_conflict(operator, slot, resolution)
    }

    pub fn resolve_conflict_in(
        &self,
        operator: &OperatorId,
        slot: u32,
        slot_type: SlotType,
        resolution: Resolution,
    ) -> bool {
        self.sessions.resolve_conflict_in(operator, slot, slot_type, resolution)
    }

    pub fn all_conflicts_resolved(&self, operator: &OperatorId) -> bool {
        self.sessions.all_conflicts_resolved(operator)
    }

    pub fn pending_merge(&self, operator: &OperatorId) -> Option<MergeSession> {
        self.sessions.get(operator)
    }

    pub fn cancel_merge(&self, operator: &OperatorId) -> bool {
        let cancelled = self.sessions.cancel(operator);
        if cancelled {
            info!(%operator, "pending merge cancelled");
        }
        cancelled
    }

    // -----------------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------------

    /// Apply resolutions to the operator's pending merge and persist it.
    ///
    /// The session is kept on failure. On success it is removed unless a
    /// newer preview replaced it meanwhile.
    pub async fn commit_merge(&self, operator: OperatorId) -> MergeResult {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                MergeResult::failure(format!("Merge commit aborted: {}", MergeError::Cancelled))
            }
            result = self.try_commit(operator) => {
                result.unwrap_or_else(|e| {
                    warn!(%operator, error = %e, "merge commit failed");
                    MergeResult::failure(format!("Merge commit failed: {e}"))
                })
            }
        }
    }

    async fn try_commit(&self, operator: OperatorId) -> MergeOpResult<MergeResult> {
        let session = self.sessions.get(&operator).ok_or(MergeError::NoPendingMerge(operator))?;

        let (mut state, displaced) = apply_resolutions(&session.merged, &session.conflicts)?;
        let mut overflow = session.overflow_items.clone();
        overflow.extend(self.place_overflow(&mut state, displaced));
        state.saved_at = Utc::now();

        if !self.store.save_player_data(&state).await? {
            return Err(MergeError::SaveRejected(session.player_id));
        }

        if !self.sessions.remove_if_current(&operator, session.id) {
            debug!(%operator, session = %session.id, "pending merge replaced during commit; keeping newer");
        }
        info!(
            %operator,
            player = %session.player_id,
            target_group = %session.target_group,
            strategy = %session.strategy,
            "merge committed"
        );

        Ok(MergeResult {
            success: true,
            message: format!(
                "Committed merge of {} from '{}' into '{}'",
                state.player_name, session.source_group, session.target_group
            ),
            merged_data: Some(state),
            conflicts: session.conflicts,
            overflow_items: overflow,
            player_count: 1,
        })
    }

    // -----------------------------------------------------------------------
    // Bulk merge
    // -----------------------------------------------------------------------

    /// Merge and persist every player with data in `source_group`.
    ///
    /// Manual merges need per-player review and are rejected. Shutdown stops
    /// the run between players and reports how many were merged.
    pub async fn merge_all(&self, source_group: &str, target_group: &str, strategy: MergeStrategy) -> MergeResult {
        if !strategy.is_automatic() {
            return MergeResult::failure(format!("Bulk merge failed: {}", MergeError::ManualRequiresReview));
        }

        let mut merged = 0;
        let mut overflow = Vec::new();
        match self
            .try_merge_all(source_group, target_group, strategy, &mut merged, &mut overflow)
            .await
        {
            Ok(()) => {
                info!(source_group, target_group, %strategy, players = merged, "bulk merge complete");
                MergeResult {
                    success: true,
                    message: format!(
                        "Merged {merged} player(s) from '{source_group}' into '{target_group}' using {strategy}"
                    ),
                    merged_data: None,
                    conflicts: Vec::new(),
                    overflow_items: overflow,
                    player_count: merged,
                }
            }
            Err(MergeError::Cancelled) => {
                warn!(source_group, target_group, players = merged, "bulk merge aborted");
                MergeResult {
                    message: format!(
                        "Bulk merge aborted after {merged} player(s): {}",
                        MergeError::Cancelled
                    ),
                    overflow_items: overflow,
                    player_count: merged,
                    ..MergeResult::failure("")
                }
            }
            Err(e) => {
                warn!(source_group, target_group, players = merged, error = %e, "bulk merge failed");
                MergeResult {
                    message: format!("Bulk merge failed: {e}"),
                    overflow_items: overflow,
                    player_count: merged,
                    ..MergeResult::failure("")
                }
            }
        }
    }

    async fn try_merge_all(
        &self,
        source_group: &str,
        target_group: &str,
        strategy: MergeStrategy,
        merged: &mut usize,
        overflow: &mut Vec<ItemStack>,
    ) -> MergeOpResult<()> {
        let players = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(MergeError::Cancelled),
            ids = self.store.all_player_ids() => ids?,
        };

        for player in players {
            let placed = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Err(MergeError::Cancelled),
                result = self.merge_one(player, source_group, target_group, strategy) => result?,
            };
            if let Some(stacks) = placed {
                *merged += 1;
                overflow.extend(stacks);
            }
        }
        Ok(())
    }

    /// Merge and save one player. `None` if the player has no source data.
    async fn merge_one(
        &self,
        player: PlayerId,
        source_group: &str,
        target_group: &str,
        strategy: MergeStrategy,
    ) -> MergeOpResult<Option<Vec<ItemStack>>> {
        let (source, target) = tokio::try_join!(
            self.store.load_player_data(player, source_group, None),
            self.store.load_player_data(player, target_group, None),
        )?;
        let Some(source) = source else {
            return Ok(None);
        };
        let target = target.unwrap_or_else(|| PlayerState::empty(player, source.player_name.clone(), target_group));

        let outcome = merge_states(&source, &target, target_group, strategy);
        let mut state = outcome.merged;
        let overflow = self.place_overflow(&mut state, outcome.overflow);

        if !self.store.save_player_data(&state).await? {
            return Err(MergeError::SaveRejected(player));
        }
        debug!(%player, target_group, overflow = overflow.len(), "player merged");
        Ok(Some(overflow))
    }

    /// Stash overflow into the ender chest when configured; returns what
    /// is left over.
    fn place_overflow(&self, state: &mut PlayerState, overflow: Vec<ItemStack>) -> Vec<ItemStack> {
        if self.config.overflow_to_ender_chest && !overflow.is_empty() {
            stash_overflow(state, overflow, self.config.ender_chest_size)
        } else {
            overflow
        }
    }
}

impl std::fmt::Debug for MergeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeService")
            .field("config", &self.config)
            .field("pending_sessions", &self.sessions.len())
            .finish()
    }
}
