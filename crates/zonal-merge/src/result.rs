use serde::{Deserialize, Serialize};
use zonal_types::{ItemStack, PlayerState};

use crate::conflict::Conflict;

/// Outcome of a preview, commit or bulk merge.
///
/// This is the interchange type handed to command and export layers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_data: Option<PlayerState>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    /// Stacks that could not be placed because of stack size limits or
    /// displacement.
    #[serde(default)]
    pub overflow_items: Vec<ItemStack>,
    /// Players affected (1 for single-player operations).
    #[serde(default)]
    pub player_count: usize,
}

impl MergeResult {
    /// A failed result with no payload.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Conflicts that still await a decision.
    pub fn pending_conflicts(&self) -> usize {
        self.conflicts.iter().filter(|c| !c.is_resolved()).count()
    }
}
