use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::PlayerId;
use crate::item::{ItemStack, SlotType};

/// Slot index to stack mapping for one inventory region.
pub type SlotMap = BTreeMap<u32, ItemStack>;

/// Full food bar.
pub const MAX_FOOD_LEVEL: i32 = 20;

/// Host game mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl FromStr for GameMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "survival" => Ok(Self::Survival),
            "creative" => Ok(Self::Creative),
            "adventure" => Ok(Self::Adventure),
            "spectator" => Ok(Self::Spectator),
            other => Err(TypeError::UnknownGameMode(other.to_string())),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Survival => "survival",
            Self::Creative => "creative",
            Self::Adventure => "adventure",
            Self::Spectator => "spectator",
        };
        f.write_str(s)
    }
}

/// Scalar player attributes carried alongside the inventory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub experience_level: i32,
    pub total_experience: i32,
    /// Progress towards the next level, `0.0..1.0`.
    pub experience_progress: f32,
    pub health: f64,
    pub max_health: f64,
    pub food_level: i32,
    pub saturation: f32,
    pub exhaustion: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            experience_level: 0,
            total_experience: 0,
            experience_progress: 0.0,
            health: 20.0,
            max_health: 20.0,
            food_level: MAX_FOOD_LEVEL,
            saturation: 5.0,
            exhaustion: 0.0,
        }
    }
}

/// A persisted snapshot of one player's state within one group.
///
/// Snapshots loaded from storage are treated as immutable; merges build a
/// new snapshot rather than editing their inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub player_id: PlayerId,
    pub player_name: String,
    /// Group this snapshot belongs to.
    pub group: String,
    #[serde(default)]
    pub game_mode: GameMode,
    #[serde(default)]
    pub inventory: SlotMap,
    #[serde(default)]
    pub armor: SlotMap,
    #[serde(default)]
    pub offhand: SlotMap,
    #[serde(default)]
    pub ender_chest: SlotMap,
    #[serde(default)]
    pub stats: PlayerStats,
    pub saved_at: DateTime<Utc>,
}

impl PlayerState {
    /// An empty snapshot with default stats.
    pub fn empty(player_id: PlayerId, player_name: impl Into<String>, group: impl Into<String>) -> Self {
        Self::builder(player_id, player_name, group).build()
    }

    pub fn builder(
        player_id: PlayerId,
        player_name: impl Into<String>,
        group: impl Into<String>,
    ) -> PlayerStateBuilder {
        PlayerStateBuilder {
            state: Self {
                player_id,
                player_name: player_name.into(),
                group: group.into(),
                game_mode: GameMode::default(),
                inventory: SlotMap::new(),
                armor: SlotMap::new(),
                offhand: SlotMap::new(),
                ender_chest: SlotMap::new(),
                stats: PlayerStats::default(),
                saved_at: Utc::now(),
            },
        }
    }

    /// Slots of one inventory region.
    pub fn region(&self, slot_type: SlotType) -> &SlotMap {
        match slot_type {
            SlotType::Main => &self.inventory,
            SlotType::Armor => &self.armor,
            SlotType::Offhand => &self.offhand,
            SlotType::EnderChest => &self.ender_chest,
        }
    }

    pub fn region_mut(&mut self, slot_type: SlotType) -> &mut SlotMap {
        match slot_type {
            SlotType::Main => &mut self.inventory,
            SlotType::Armor => &mut self.armor,
            SlotType::Offhand => &mut self.offhand,
            SlotType::EnderChest => &mut self.ender_chest,
        }
    }

    /// Stack at `slot` in `slot_type`, if occupied.
    pub fn item(&self, slot_type: SlotType, slot: u32) -> Option<&ItemStack> {
        self.region(slot_type).get(&slot)
    }

    /// Returns `true` if every region is empty.
    pub fn is_inventory_empty(&self) -> bool {
        SlotType::ALL.iter().all(|t| self.region(*t).is_empty())
    }

    /// Number of occupied slots across all regions.
    pub fn occupied_slots(&self) -> usize {
        SlotType::ALL.iter().map(|t| self.region(*t).len()).sum()
    }

    /// Total item count of `item_type` across all regions.
    pub fn count_items(&self, item_type: &str) -> u64 {
        SlotType::ALL
            .iter()
            .flat_map(|t| self.region(*t).values())
            .filter(|s| s.item_type == item_type)
            .map(|s| u64::from(s.amount))
            .sum()
    }
}

/// Builder for [`PlayerState`].
#[derive(Clone, Debug)]
pub struct PlayerStateBuilder {
    state: PlayerState,
}

impl PlayerStateBuilder {
    pub fn game_mode(mut self, mode: GameMode) -> Self {
        self.state.game_mode = mode;
        self
    }

    /// Place a stack in the given region.
    pub fn item(mut self, slot_type: SlotType, slot: u32, stack: ItemStack) -> Self {
        self.state.region_mut(slot_type).insert(slot, stack);
        self
    }

    /// Place a stack in the main inventory.
    pub fn main(self, slot: u32, stack: ItemStack) -> Self {
        self.item(SlotType::Main, slot, stack)
    }

    pub fn stats(mut self, stats: PlayerStats) -> Self {
        self.state.stats = stats;
        self
    }

    pub fn experience(mut self, level: i32, total: i32) -> Self {
        self.state.stats.experience_level = level;
        self.state.stats.total_experience = total;
        self
    }

    pub fn health(mut self, health: f64) -> Self {
        self.state.stats.health = health;
        self
    }

    pub fn food_level(mut self, food_level: i32) -> Self {
        self.state.stats.food_level = food_level;
        self
    }

    pub fn saved_at(mut self, saved_at: DateTime<Utc>) -> Self {
        self.state.saved_at = saved_at;
        self
    }

    pub fn build(self) -> PlayerState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_has_defaults() {
        let id = PlayerId::random();
        let state = PlayerState::empty(id, "Steve", "survival");
        assert_eq!(state.player_id, id);
        assert_eq!(state.group, "survival");
        assert_eq!(state.game_mode, GameMode::Survival);
        assert!(state.is_inventory_empty());
        assert_eq!(state.stats.health, 20.0);
        assert_eq!(state.stats.food_level, MAX_FOOD_LEVEL);
    }

    #[test]
    fn builder_places_items_by_region() {
        let state = PlayerState::builder(PlayerId::random(), "Alex", "creative")
            .game_mode(GameMode::Creative)
            .main(0, ItemStack::new("minecraft:stone", 32))
            .item(SlotType::Armor, 3, ItemStack::new("minecraft:iron_helmet", 1).with_max_stack(1))
            .item(SlotType::EnderChest, 5, ItemStack::new("minecraft:stone", 10))
            .experience(30, 1395)
            .build();

        assert_eq!(state.occupied_slots(), 3);
        assert_eq!(state.item(SlotType::Main, 0).unwrap().amount, 32);
        assert!(state.item(SlotType::Armor, 0).is_none());
        assert_eq!(state.count_items("minecraft:stone"), 42);
        assert_eq!(state.stats.experience_level, 30);
        assert_eq!(state.stats.total_experience, 1395);
    }

    #[test]
    fn game_mode_parse() {
        assert_eq!("CREATIVE".parse::<GameMode>().unwrap(), GameMode::Creative);
        assert!("hardcore".parse::<GameMode>().is_err());
        assert_eq!(GameMode::Adventure.to_string(), "adventure");
    }

    #[test]
    fn state_serde_roundtrip_keeps_regions() {
        let state = PlayerState::builder(PlayerId::random(), "Steve", "survival")
            .main(4, ItemStack::new("minecraft:bread", 8))
            .item(SlotType::Offhand, 0, ItemStack::new("minecraft:shield", 1).with_max_stack(1))
            .build();
        let json = serde_json::to_string(&state).unwrap();
        let back: PlayerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
