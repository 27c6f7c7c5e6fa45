use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag recorded when a group has no conditions.
pub const TAG_NO_CONDITIONS: &str = "no conditions";
pub const TAG_SCHEDULE_ACTIVE: &str = "schedule:active";
pub const TAG_SCHEDULE_NOT_ACTIVE: &str = "schedule:not_active";
pub const TAG_CRON_NOT_MATCHING: &str = "cron:not_matching";
pub const TAG_CRON_INVALID: &str = "cron:invalid_expression";
pub const TAG_PLACEHOLDER_UNAVAILABLE: &str = "placeholder:papi_unavailable";

/// Tag for a cron condition that matched.
pub fn cron_tag(expression: &str) -> String {
    format!("cron:{expression}")
}

/// Tag for an individual placeholder condition.
pub fn placeholder_tag(placeholder: &str) -> String {
    format!("placeholder:{placeholder}")
}

/// Outcome of evaluating one group's conditions for one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEvaluationResult {
    pub matches: bool,
    /// Tags of conditions that held, in evaluation order.
    pub matched_conditions: Vec<String>,
    /// Tags of conditions that did not hold, in evaluation order.
    pub failed_conditions: Vec<String>,
    pub evaluation_time: DateTime<Utc>,
}

impl ConditionEvaluationResult {
    /// The always-matching result for a group without conditions.
    pub fn no_conditions(evaluation_time: DateTime<Utc>) -> Self {
        Self {
            matches: true,
            matched_conditions: vec![TAG_NO_CONDITIONS.to_string()],
            failed_conditions: Vec::new(),
            evaluation_time,
        }
    }

    /// Returns `true` if the match came from having no conditions at all.
    pub fn is_unconditional(&self) -> bool {
        self.matches
            && self.failed_conditions.is_empty()
            && self.matched_conditions.len() == 1
            && self.matched_conditions[0] == TAG_NO_CONDITIONS
    }

    /// Human-readable explanation of the outcome.
    pub fn reason(&self, group: &str) -> String {
        if self.is_unconditional() {
            format!("No conditions configured for group '{group}'; it always applies")
        } else if self.matches {
            format!("Matched conditions: {}", self.matched_conditions.join(", "))
        } else {
            format!("Failed conditions: {}", self.failed_conditions.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_conditions_invariant() {
        let r = ConditionEvaluationResult::no_conditions(Utc::now());
        assert!(r.matches);
        assert_eq!(r.matched_conditions, vec!["no conditions"]);
        assert!(r.failed_conditions.is_empty());
        assert!(r.is_unconditional());
        assert!(r.reason("lobby").starts_with("No conditions"));
    }

    #[test]
    fn reason_lists_tags() {
        let r = ConditionEvaluationResult {
            matches: false,
            matched_conditions: vec!["zone.vip".into()],
            failed_conditions: vec!["schedule:not_active".into(), "cron:not_matching".into()],
            evaluation_time: Utc::now(),
        };
        assert_eq!(
            r.reason("event"),
            "Failed conditions: schedule:not_active, cron:not_matching"
        );
    }

    #[test]
    fn tag_helpers() {
        assert_eq!(cron_tag("0 * * * *"), "cron:0 * * * *");
        assert_eq!(placeholder_tag("%player_level%"), "placeholder:%player_level%");
    }
}
