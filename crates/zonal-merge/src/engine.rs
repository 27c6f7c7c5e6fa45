//! Pure merge computation over two player snapshots.
//!
//! Nothing here touches storage or mutates its inputs: every function builds
//! a fresh snapshot from borrowed source and target states.

use std::collections::BTreeSet;

use chrono::Utc;
use zonal_types::{ItemStack, PlayerState, PlayerStats, SlotMap, SlotType, MAX_FOOD_LEVEL};

use crate::conflict::{Conflict, Resolution};
use crate::error::{MergeError, MergeOpResult};
use crate::strategy::MergeStrategy;

/// Output of [`merge_states`].
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOutcome {
    /// The merged snapshot, labelled with the target group.
    pub merged: PlayerState,
    /// Slots needing an operator decision (manual strategy only).
    pub conflicts: Vec<Conflict>,
    /// Stacks that no longer fit in their slot.
    pub overflow: Vec<ItemStack>,
}

/// Merge `source` into `target` under `strategy`.
///
/// The result carries the source player's identity, name and game mode and
/// is owned by `target_group`.
pub fn merge_states(
    source: &PlayerState,
    target: &PlayerState,
    target_group: &str,
    strategy: MergeStrategy,
) -> MergeOutcome {
    let mut merged = PlayerState::builder(source.player_id, source.player_name.clone(), target_group)
        .game_mode(source.game_mode)
        .stats(merge_stats(&source.stats, &target.stats, strategy))
        .saved_at(Utc::now())
        .build();
    let mut conflicts = Vec::new();
    let mut overflow = Vec::new();

    for slot_type in SlotType::ALL {
        let (src, tgt) = (source.region(slot_type), target.region(slot_type));
        let region = merged.region_mut(slot_type);

        if strategy == MergeStrategy::Replace {
            *region = src.clone();
            continue;
        }

        let slots: BTreeSet<u32> = src.keys().chain(tgt.keys()).copied().collect();
        for slot in slots {
            let placed = match (src.get(&slot), tgt.get(&slot)) {
                (Some(s), None) => Some(s.clone()),
                (None, Some(t)) => Some(t.clone()),
                (None, None) => None,
                (Some(s), Some(t)) => match strategy {
                    MergeStrategy::Combine => Some(combine_stacks(s, t, &mut overflow)),
                    MergeStrategy::KeepHigher => {
                        Some(if t.amount > s.amount { t.clone() } else { s.clone() })
                    }
                    MergeStrategy::Replace => Some(s.clone()),
                    MergeStrategy::Manual => {
                        if !s.same_type(t) {
                            conflicts.push(Conflict::pending(slot, slot_type, s.clone(), t.clone()));
                        }
                        // Source holds the slot until the conflict is resolved.
                        Some(s.clone())
                    }
                },
            };
            if let Some(stack) = placed {
                region.insert(slot, stack);
            }
        }
    }

    MergeOutcome {
        merged,
        conflicts,
        overflow,
    }
}

/// Combine two stacks sharing a slot.
///
/// Same type: amounts add, capped at the max stack size, with the surplus
/// pushed to `overflow`. Different types: source keeps the slot and the
/// target stack is displaced to `overflow`.
fn combine_stacks(source: &ItemStack, target: &ItemStack, overflow: &mut Vec<ItemStack>) -> ItemStack {
    if !source.same_type(target) {
        overflow.push(target.clone());
        return source.clone();
    }

    let cap = source.max_stack_size.max(1);
    let total = u64::from(source.amount) + u64::from(target.amount);
    let placed = total.min(u64::from(cap));
    overflow.extend(split_stacks(source, total - placed));
    source.with_amount(placed as u32)
}

/// Split `amount` items shaped like `template` into stacks of at most the
/// template's max stack size.
fn split_stacks(template: &ItemStack, mut amount: u64) -> Vec<ItemStack> {
    let cap = u64::from(template.max_stack_size.max(1));
    let mut stacks = Vec::new();
    while amount > 0 {
        let take = amount.min(cap);
        stacks.push(template.with_amount(take as u32));
        amount -= take;
    }
    stacks
}

fn merge_stats(source: &PlayerStats, target: &PlayerStats, strategy: MergeStrategy) -> PlayerStats {
    match strategy {
        MergeStrategy::Replace | MergeStrategy::Manual => source.clone(),
        MergeStrategy::Combine => {
            let max_health = source.max_health.max(target.max_health);
            let food_level = source.food_level.saturating_add(target.food_level).min(MAX_FOOD_LEVEL);
            PlayerStats {
                experience_level: source.experience_level.saturating_add(target.experience_level),
                total_experience: source.total_experience.saturating_add(target.total_experience),
                experience_progress: source.experience_progress,
                health: (source.health + target.health).min(max_health),
                max_health,
                food_level,
                // Saturation never exceeds the food level.
                saturation: (source.saturation + target.saturation).min(food_level as f32),
                exhaustion: source.exhaustion,
            }
        }
        MergeStrategy::KeepHigher => PlayerStats {
            experience_level: source.experience_level.max(target.experience_level),
            total_experience: source.total_experience.max(target.total_experience),
            experience_progress: source.experience_progress.max(target.experience_progress),
            health: source.health.max(target.health),
            max_health: source.max_health.max(target.max_health),
            food_level: source.food_level.max(target.food_level),
            saturation: source.saturation.max(target.saturation),
            exhaustion: source.exhaustion.max(target.exhaustion),
        },
    }
}

/// Apply operator resolutions to a manual merge's working snapshot.
///
/// Returns the final snapshot and any stacks displaced by `KeepBoth`.
/// Fails if a conflict is still pending.
pub fn apply_resolutions(
    merged: &PlayerState,
    conflicts: &[Conflict],
) -> MergeOpResult<(PlayerState, Vec<ItemStack>)> {
    let pending = conflicts.iter().filter(|c| !c.is_resolved()).count();
    if pending > 0 {
        return Err(MergeError::UnresolvedConflicts(pending));
    }

    let mut result = merged.clone();
    let mut displaced = Vec::new();
    for conflict in conflicts {
        let region = result.region_mut(conflict.slot_type);
        let stack = match conflict.resolution {
            Resolution::KeepSource | Resolution::Pending => conflict.source_item.clone(),
            Resolution::KeepTarget => conflict.target_item.clone(),
            Resolution::KeepBoth => {
                displaced.push(conflict.target_item.clone());
                conflict.source_item.clone()
            }
        };
        region.insert(conflict.slot, stack);
    }
    Ok((result, displaced))
}

/// Move overflow stacks into free ender chest slots (`0..capacity`).
///
/// Returns the stacks that still did not fit.
pub fn stash_overflow(state: &mut PlayerState, overflow: Vec<ItemStack>, capacity: u32) -> Vec<ItemStack> {
    let chest: &mut SlotMap = &mut state.ender_chest;
    let mut free = (0..capacity).filter(|slot| !chest.contains_key(slot)).collect::<Vec<_>>().into_iter();
    let mut remaining = Vec::new();
    for stack in overflow {
        match free.next() {
            Some(slot) => {
                chest.insert(slot, stack);
            }
            None => remaining.push(stack),
        }
    }
    remaining
}
