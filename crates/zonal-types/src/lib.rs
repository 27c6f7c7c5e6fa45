//! Foundation types for Zonal.
//!
//! Zonal keeps a separate inventory/state snapshot per *group* (a named
//! bundle of worlds sharing one inventory). This crate holds the value types
//! shared by the condition gate, the storage layer and the merge engine.
//!
//! # Key Types
//!
//! - [`PlayerId`] / [`OperatorId`] / [`SessionId`]: identities
//! - [`Group`] / [`ConditionSet`]: group definitions and their gating rules
//! - [`TimeRange`] / [`PlaceholderCondition`]: individual condition kinds
//! - [`ItemStack`] / [`SlotType`]: inventory contents
//! - [`PlayerState`]: a persisted per-group player snapshot

pub mod error;
pub mod group;
pub mod identity;
pub mod item;
pub mod state;

pub use error::TypeError;
pub use group::{ComparisonOperator, ConditionSet, Group, PlaceholderCondition, TimeRange};
pub use identity::{OperatorId, PlayerId, SessionId};
pub use item::{ItemStack, SlotType, DEFAULT_MAX_STACK};
pub use state::{GameMode, PlayerState, PlayerStateBuilder, PlayerStats, SlotMap, MAX_FOOD_LEVEL};
