use serde::{Deserialize, Serialize};

/// Configuration for the [`MergeService`](crate::MergeService).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Place overflow stacks into free ender chest slots of the merged
    /// snapshot instead of only reporting them.
    pub overflow_to_ender_chest: bool,
    /// Number of ender chest slots considered when stashing overflow.
    pub ender_chest_size: u32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            overflow_to_ender_chest: false,
            ender_chest_size: 27,
        }
    }
}
