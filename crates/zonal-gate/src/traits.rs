//! Capability interfaces the condition gate consumes from the host.
//!
//! All collaborators are supplied at construction time; the evaluator never
//! reaches into the host beyond these traits.

use zonal_types::{Group, PlaceholderCondition, PlayerId};

/// The subject of a condition evaluation.
pub trait Player: Send + Sync {
    fn id(&self) -> PlayerId;

    fn name(&self) -> &str;

    /// Host permission check for a permission node.
    fn has_permission(&self, permission: &str) -> bool;
}

/// External placeholder-expression integration.
///
/// The expression language itself lives outside this crate; the gate only
/// asks whether the integration is usable and whether a condition holds.
pub trait PlaceholderIntegration: Send + Sync {
    /// Whether the backing plugin is present and usable.
    fn is_available(&self) -> bool;

    /// Resolve `condition.placeholder` for `player` and compare it with
    /// `condition.value` using `condition.operator`.
    fn evaluate_condition(&self, player: &dyn Player, condition: &PlaceholderCondition) -> bool;

    /// Re-probe availability (called on reload).
    fn check_availability(&self);
}

/// Integration used when no placeholder plugin is installed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPlaceholders;

impl PlaceholderIntegration for NoPlaceholders {
    fn is_available(&self) -> bool {
        false
    }

    fn evaluate_condition(&self, _player: &dyn Player, _condition: &PlaceholderCondition) -> bool {
        false
    }

    fn check_availability(&self) {}
}

/// Source of every configured group.
pub trait GroupRegistry: Send + Sync {
    fn all_groups(&self) -> Vec<Group>;
}
