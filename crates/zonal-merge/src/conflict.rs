use std::fmt;

use serde::{Deserialize, Serialize};
use zonal_types::{ItemStack, SlotType};

/// How an operator chose to settle a conflicting slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    /// Awaiting an operator decision.
    #[default]
    Pending,
    /// The source group's stack takes the slot.
    KeepSource,
    /// The target group's stack takes the slot.
    KeepTarget,
    /// Source takes the slot; target's stack is moved to overflow.
    KeepBoth,
}

impl Resolution {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::KeepSource => "keep_source",
            Self::KeepTarget => "keep_target",
            Self::KeepBoth => "keep_both",
        };
        f.write_str(s)
    }
}

/// A slot where both snapshots hold different items.
///
/// Identified by (`slot`, `slot_type`) within one merge session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub slot: u32,
    pub slot_type: SlotType,
    pub source_item: ItemStack,
    pub target_item: ItemStack,
    pub resolution: Resolution,
}

impl Conflict {
    /// A new, unresolved conflict.
    pub fn pending(slot: u32, slot_type: SlotType, source_item: ItemStack, target_item: ItemStack) -> Self {
        Self {
            slot,
            slot_type,
            source_item,
            target_item,
            resolution: Resolution::Pending,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.resolution.is_pending()
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} slot {}: {} vs {} ({})",
            self.slot_type, self.slot, self.source_item, self.target_item, self.resolution
        )
    }
}
