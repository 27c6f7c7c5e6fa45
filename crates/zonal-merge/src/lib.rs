//! Merge engine for Zonal.
//!
//! Reconciles a player's snapshot from one group into another under one of
//! four strategies. The pure engine ([`merge_states`]) never mutates its
//! inputs; the [`MergeService`] wraps it with storage access, per-operator
//! pending sessions and manual conflict resolution.
//!
//! # Quick Start
//!
//! ```rust
//! use zonal_merge::{merge_states, MergeStrategy};
//! use zonal_types::{ItemStack, PlayerId, PlayerState};
//!
//! let player = PlayerId::random();
//! let source = PlayerState::builder(player, "Steve", "creative")
//!     .main(0, ItemStack::new("minecraft:stone", 48))
//!     .build();
//! let target = PlayerState::builder(player, "Steve", "survival")
//!     .main(0, ItemStack::new("minecraft:stone", 48))
//!     .build();
//!
//! let outcome = merge_states(&source, &target, "survival", MergeStrategy::Combine);
//! assert_eq!(outcome.merged.inventory[&0].amount, 64);
//! assert_eq!(outcome.overflow[0].amount, 32);
//! ```

pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod result;
pub mod service;
pub mod session;
pub mod strategy;

// Re-exports for convenience.
pub use config::MergeConfig;
pub use conflict::{Conflict, Resolution};
pub use engine::{apply_resolutions, merge_states, stash_overflow, MergeOutcome};
pub use error::{MergeError, MergeOpResult};
pub use result::MergeResult;
pub use service::MergeService;
pub use session::{MergeSession, SessionRegistry};
pub use strategy::MergeStrategy;
