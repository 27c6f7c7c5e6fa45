use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// Default maximum stack size for ordinary items.
pub const DEFAULT_MAX_STACK: u32 = 64;

/// A stack of identical items occupying one inventory slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Namespaced item type (e.g. `minecraft:diamond`).
    pub item_type: String,
    pub amount: u32,
    /// Largest amount a single slot can hold for this item type.
    #[serde(default = "default_max_stack")]
    pub max_stack_size: u32,
    /// Auxiliary item data (display name, enchantments, damage, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

fn default_max_stack() -> u32 {
    DEFAULT_MAX_STACK
}

impl ItemStack {
    /// A stack with the default maximum stack size.
    pub fn new(item_type: impl Into<String>, amount: u32) -> Self {
        Self {
            item_type: item_type.into(),
            amount,
            max_stack_size: DEFAULT_MAX_STACK,
            metadata: BTreeMap::new(),
        }
    }

    /// Override the maximum stack size (e.g. 16 for ender pearls, 1 for tools).
    pub fn with_max_stack(mut self, max_stack_size: u32) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns `true` if both stacks hold the same item type.
    pub fn same_type(&self, other: &ItemStack) -> bool {
        self.item_type == other.item_type
    }

    /// Copy of this stack with a different amount.
    pub fn with_amount(&self, amount: u32) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    /// Check `0 < amount <= max_stack_size`.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.amount == 0 || self.amount > self.max_stack_size {
            return Err(TypeError::InvalidStackAmount {
                item_type: self.item_type.clone(),
                amount: self.amount,
                max: self.max_stack_size,
            });
        }
        Ok(())
    }
}

impl fmt::Display for ItemStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x {}", self.amount, self.item_type)
    }
}

/// Inventory region a slot index belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    /// Hotbar and main storage.
    Main,
    Armor,
    Offhand,
    EnderChest,
}

impl SlotType {
    /// All regions in merge order.
    pub const ALL: [SlotType; 4] = [
        SlotType::Main,
        SlotType::Armor,
        SlotType::Offhand,
        SlotType::EnderChest,
    ];
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Main => "main",
            Self::Armor => "armor",
            Self::Offhand => "offhand",
            Self::EnderChest => "ender_chest",
        };
        f.write_str(s)
    }
}
