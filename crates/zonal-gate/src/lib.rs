//! Condition gate for Zonal.
//!
//! Decides, per player and per moment, whether a group's membership
//! conditions hold. A condition set combines up to four kinds of checks:
//!
//! - a permission node,
//! - time windows,
//! - a five-field cron schedule,
//! - placeholder predicates resolved by an external integration.
//!
//! Results are cached per (player, group) until explicitly invalidated.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use zonal_gate::{ConditionEvaluator, EvaluatorConfig, GroupsConfig, NoPlaceholders, Player, StaticGroupRegistry};
//! use zonal_types::{ConditionSet, Group, PlayerId};
//!
//! struct Console(PlayerId);
//!
//! impl Player for Console {
//!     fn id(&self) -> PlayerId { self.0 }
//!     fn name(&self) -> &str { "console" }
//!     fn has_permission(&self, _permission: &str) -> bool { true }
//! }
//!
//! let registry = Arc::new(StaticGroupRegistry::new(GroupsConfig::default()));
//! let evaluator = ConditionEvaluator::new(EvaluatorConfig::default(), Arc::new(NoPlaceholders), registry);
//!
//! let group = Group::new("vip", ["vip_lounge"])
//!     .with_conditions(ConditionSet::default().with_permission("zonal.vip"));
//! let result = evaluator.evaluate(&Console(PlayerId::random()), &group, true);
//! assert!(result.matches);
//! ```

pub mod config;
pub mod cron;
pub mod error;
pub mod evaluator;
pub mod groups;
pub mod result;
pub mod traits;

// Re-exports for convenience.
pub use config::{CronTimeZone, EvaluatorConfig};
pub use cron::{CronExpression, CronMatcher};
pub use error::{CronError, GateError, GateResult};
pub use evaluator::ConditionEvaluator;
pub use groups::{GroupsConfig, StaticGroupRegistry};
pub use result::ConditionEvaluationResult;
pub use traits::{GroupRegistry, NoPlaceholders, PlaceholderIntegration, Player};
