use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// A named bundle of worlds that share one inventory/state snapshot.
///
/// Groups are immutable once constructed; their lifecycle is owned by
/// configuration loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique group name.
    pub name: String,
    /// Worlds whose players share this group's state.
    #[serde(default)]
    pub worlds: BTreeSet<String>,
    /// Optional membership conditions. `None` means the group always applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionSet>,
}

impl Group {
    /// Create an unconditional group over the given worlds.
    pub fn new<I, S>(name: impl Into<String>, worlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            worlds: worlds.into_iter().map(Into::into).collect(),
            conditions: None,
        }
    }

    /// Attach a condition set.
    pub fn with_conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Returns `true` if `world` belongs to this group.
    pub fn contains_world(&self, world: &str) -> bool {
        self.worlds.contains(world)
    }

    /// Returns `true` if the group carries at least one populated condition.
    pub fn has_conditions(&self) -> bool {
        self.conditions.as_ref().is_some_and(|c| !c.is_empty())
    }
}

// ---------------------------------------------------------------------------
// ConditionSet
// ---------------------------------------------------------------------------

/// Rules gating whether a group currently applies to a player.
///
/// Every field is optional. A set with no populated field is "no
/// conditions" and is always satisfied. `require_all` switches between AND
/// and OR over the populated conditions; it is a flat switch, not a
/// boolean expression tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionSet {
    /// Permission node the player must hold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    /// Time windows; the schedule is active while `now` is inside any of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ranges: Option<Vec<TimeRange>>,
    /// Five-field cron expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    /// A single placeholder predicate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<PlaceholderCondition>,
    /// Additional placeholder predicates, evaluated after `placeholder`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholders: Option<Vec<PlaceholderCondition>>,
    /// AND (`true`) or OR (`false`) over the populated conditions.
    pub require_all: bool,
}

impl Default for ConditionSet {
    fn default() -> Self {
        Self {
            permission: None,
            time_ranges: None,
            cron: None,
            placeholder: None,
            placeholders: None,
            require_all: true,
        }
    }
}

impl ConditionSet {
    /// Returns `true` if no condition field is populated.
    ///
    /// Empty lists count as unpopulated.
    pub fn is_empty(&self) -> bool {
        self.permission.is_none()
            && self.time_ranges.as_ref().map_or(true, Vec::is_empty)
            && self.cron.is_none()
            && self.placeholder.is_none()
            && self.placeholders.as_ref().map_or(true, Vec::is_empty)
    }

    /// Placeholder predicates in evaluation order: the single `placeholder`
    /// first, then the `placeholders` list.
    pub fn all_placeholders(&self) -> impl Iterator<Item = &PlaceholderCondition> {
        self.placeholder
            .iter()
            .chain(self.placeholders.iter().flatten())
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_ranges.get_or_insert_with(Vec::new).push(range);
        self
    }

    pub fn with_cron(mut self, expression: impl Into<String>) -> Self {
        self.cron = Some(expression.into());
        self
    }

    pub fn with_placeholder(mut self, condition: PlaceholderCondition) -> Self {
        self.placeholders
            .get_or_insert_with(Vec::new)
            .push(condition);
        self
    }

    pub fn require_any(mut self) -> Self {
        self.require_all = false;
        self
    }
}

// ---------------------------------------------------------------------------
// TimeRange
// ---------------------------------------------------------------------------

/// An inclusive window of wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TypeError> {
        if start > end {
            return Err(TypeError::InvalidTimeRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// `start <= moment <= end`.
    pub fn contains(&self, moment: &DateTime<Utc>) -> bool {
        self.start <= *moment && *moment <= self.end
    }
}

// ---------------------------------------------------------------------------
// PlaceholderCondition
// ---------------------------------------------------------------------------

/// A predicate resolved by the external placeholder integration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderCondition {
    /// Expression key understood by the integration (e.g. `%player_level%`).
    pub placeholder: String,
    pub operator: ComparisonOperator,
    /// Comparison operand as text.
    pub value: String,
}

impl PlaceholderCondition {
    pub fn new(
        placeholder: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            placeholder: placeholder.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Comparison applied between a resolved placeholder and its operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Contains,
}

impl ComparisonOperator {
    /// Compare a resolved value against the expected operand.
    ///
    /// Ordering operators compare numerically when both sides parse as
    /// numbers and lexicographically otherwise. Equality is numeric when
    /// possible (`"5"` equals `"5.0"`) and case-insensitive text otherwise.
    pub fn compare(&self, actual: &str, expected: &str) -> bool {
        let actual = actual.trim();
        let expected = expected.trim();
        let numeric = actual
            .parse::<f64>()
            .ok()
            .zip(expected.parse::<f64>().ok());

        match self {
            Self::Equals => match numeric {
                Some((a, e)) => a == e,
                None => actual.eq_ignore_ascii_case(expected),
            },
            Self::NotEquals => !Self::Equals.compare(actual, expected),
            Self::Contains => actual
                .to_lowercase()
                .contains(&expected.to_lowercase()),
            Self::GreaterThan => Self::ordering(numeric, actual, expected).is_some_and(|o| o.is_gt()),
            Self::GreaterOrEqual => Self::ordering(numeric, actual, expected).is_some_and(|o| o.is_ge()),
            Self::LessThan => Self::ordering(numeric, actual, expected).is_some_and(|o| o.is_lt()),
            Self::LessOrEqual => Self::ordering(numeric, actual, expected).is_some_and(|o| o.is_le()),
        }
    }

    /// Numeric ordering when both sides are numbers, text ordering otherwise.
    /// `None` for incomparable numbers (NaN).
    fn ordering(numeric: Option<(f64, f64)>, actual: &str, expected: &str) -> Option<Ordering> {
        match numeric {
            Some((a, e)) => a.partial_cmp(&e),
            None => Some(actual.cmp(expected)),
        }
    }

    /// Symbolic form (`==`, `>=`, ...).
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::Contains => "contains",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn default_condition_set_is_empty() {
        let set = ConditionSet::default();
        assert!(set.is_empty());
        assert!(set.require_all);
    }

    #[test]
    fn empty_lists_do_not_count_as_conditions() {
        let set = ConditionSet {
            time_ranges: Some(Vec::new()),
            placeholders: Some(Vec::new()),
            ..Default::default()
        };
        assert!(set.is_empty());
    }

    #[test]
    fn any_field_makes_set_non_empty() {
        assert!(!ConditionSet::default().with_permission("zone.vip").is_empty());
        assert!(!ConditionSet::default().with_cron("* * * * *").is_empty());
        let range = TimeRange::new(at(1), at(2)).unwrap();
        assert!(!ConditionSet::default().with_time_range(range).is_empty());
    }

    #[test]
    fn group_has_conditions() {
        let plain = Group::new("survival", ["world", "world_nether"]);
        assert!(!plain.has_conditions());
        assert!(plain.contains_world("world_nether"));
        assert!(!plain.contains_world("creative"));

        let empty = plain.clone().with_conditions(ConditionSet::default());
        assert!(!empty.has_conditions());

        let gated = plain.with_conditions(ConditionSet::default().with_permission("x"));
        assert!(gated.has_conditions());
    }

    #[test]
    fn time_range_is_inclusive() {
        let range = TimeRange::new(at(10), at(12)).unwrap();
        assert!(range.contains(&at(10)));
        assert!(range.contains(&at(11)));
        assert!(range.contains(&at(12)));
        assert!(!range.contains(&at(13)));
        assert!(!range.contains(&at(9)));
    }

    #[test]
    fn time_range_rejects_reversed_bounds() {
        assert!(TimeRange::new(at(12), at(10)).is_err());
        assert!(TimeRange::new(at(10), at(10)).is_ok());
    }

    #[test]
    fn placeholders_iterate_single_first() {
        let set = ConditionSet {
            placeholder: Some(PlaceholderCondition::new("%a%", ComparisonOperator::Equals, "1")),
            placeholders: Some(vec![
                PlaceholderCondition::new("%b%", ComparisonOperator::Equals, "2"),
                PlaceholderCondition::new("%c%", ComparisonOperator::Equals, "3"),
            ]),
            ..Default::default()
        };
        let keys: Vec<_> = set.all_placeholders().map(|p| p.placeholder.as_str()).collect();
        assert_eq!(keys, vec!["%a%", "%b%", "%c%"]);
    }

    #[test]
    fn numeric_comparisons() {
        use ComparisonOperator::*;
        assert!(GreaterOrEqual.compare("10", "10"));
        assert!(GreaterOrEqual.compare("10.5", "10"));
        assert!(!GreaterThan.compare("9", "10"));
        // Numeric, not lexicographic.
        assert!(LessThan.compare("9", "10"));
        assert!(LessOrEqual.compare("3", "3.0"));
        assert!(Equals.compare("5", "5.0"));
        assert!(NotEquals.compare("5", "6"));
    }

    #[test]
    fn ordering_falls_back_to_text_and_rejects_nan() {
        use ComparisonOperator::*;
        assert!(GreaterThan.compare("beta", "alpha"));
        assert!(LessOrEqual.compare("alpha", "alpha"));
        assert!(!LessThan.compare("beta", "alpha"));
        for op in [GreaterThan, GreaterOrEqual, LessThan, LessOrEqual] {
            assert!(!op.compare("NaN", "1"), "{}", op.symbol());
        }
    }

    #[test]
    fn text_comparisons() {
        use ComparisonOperator::*;
        assert!(Equals.compare("Nether", "nether"));
        assert!(NotEquals.compare("overworld", "nether"));
        assert!(Contains.compare("world_the_end", "END"));
        assert!(!Contains.compare("world", "nether"));
    }

    #[test]
    fn operator_serde_names() {
        let json = serde_json::to_string(&ComparisonOperator::GreaterOrEqual).unwrap();
        assert_eq!(json, "\"GREATER_OR_EQUAL\"");
        let parsed: ComparisonOperator = serde_json::from_str("\"EQUALS\"").unwrap();
        assert_eq!(parsed, ComparisonOperator::Equals);
    }

    #[test]
    fn condition_set_deserializes_with_defaults() {
        let set: ConditionSet = serde_json::from_str(r#"{"permission":"zone.pvp"}"#).unwrap();
        assert_eq!(set.permission.as_deref(), Some("zone.pvp"));
        assert!(set.require_all);
        assert!(set.cron.is_none());
    }
}
