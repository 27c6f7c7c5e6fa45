//! Five-field cron expressions and a memoizing matcher.
//!
//! Fields, in order: minute (0-59), hour (0-23), day-of-month (1-31),
//! month (1-12 or `JAN`-`DEC`), day-of-week (0-7, 0 and 7 both Sunday, or
//! `SUN`-`SAT`). Each field is a comma list of `*`, `n`, `a-b`, optionally
//! stepped with `/n`. All five fields must match; day-of-month and
//! day-of-week are ANDed, not ORed as in some cron dialects.

use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use dashmap::DashMap;

use crate::error::CronError;

const MONTH_NAMES: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const DAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Bounds and naming for one cron field.
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    /// Names mapped to `min + index` (months) or `index` (weekdays).
    names: Option<(&'static [&'static str], u32)>,
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59, names: None };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23, names: None };
const DAY_OF_MONTH: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31, names: None };
const MONTH: FieldSpec = FieldSpec {
    name: "month",
    min: 1,
    max: 12,
    names: Some((MONTH_NAMES, 1)),
};
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day-of-week",
    min: 0,
    max: 7,
    names: Some((DAY_NAMES, 0)),
};

/// A compiled cron expression. Each field is a bitset of allowed values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CronExpression {
    source: String,
    minutes: u64,
    hours: u64,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
}

impl CronExpression {
    /// Parse a five-field expression.
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronError::FieldCount(fields.len()));
        }

        let mut days_of_week = parse_field(fields[4], &DAY_OF_WEEK)?;
        // 7 is an alias for Sunday.
        if days_of_week & (1 << 7) != 0 {
            days_of_week = (days_of_week & !(1 << 7)) | 1;
        }

        Ok(Self {
            source: expression.to_string(),
            minutes: parse_field(fields[0], &MINUTE)?,
            hours: parse_field(fields[1], &HOUR)?,
            days_of_month: parse_field(fields[2], &DAY_OF_MONTH)?,
            months: parse_field(fields[3], &MONTH)?,
            days_of_week,
        })
    }

    /// The expression text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns `true` if `at` satisfies every field.
    pub fn matches<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        bit(self.minutes, at.minute())
            && bit(self.hours, at.hour())
            && bit(self.days_of_month, at.day())
            && bit(self.months, at.month())
            && bit(self.days_of_week, at.weekday().num_days_from_sunday())
    }
}

fn bit(set: u64, value: u32) -> bool {
    set & (1u64 << value) != 0
}

fn parse_field(text: &str, spec: &FieldSpec) -> Result<u64, CronError> {
    let mut set = 0u64;
    for part in text.split(',') {
        if part.is_empty() {
            return Err(CronError::EmptyField { field: spec.name });
        }

        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, Some(parse_step(step, spec)?)),
            None => (part, None),
        };

        let (lo, hi) = if range == "*" {
            (spec.min, spec.max)
        } else if let Some((a, b)) = range.split_once('-') {
            let (lo, hi) = (parse_value(a, spec)?, parse_value(b, spec)?);
            if lo > hi {
                return Err(CronError::InvalidRange {
                    field: spec.name,
                    range: range.to_string(),
                });
            }
            (lo, hi)
        } else {
            let value = parse_value(range, spec)?;
            // `5/10` means "from 5 to the end, every 10".
            if step.is_some() {
                (value, spec.max)
            } else {
                (value, value)
            }
        };

        for value in (lo..=hi).step_by(step.unwrap_or(1) as usize) {
            set |= 1u64 << value;
        }
    }
    Ok(set)
}

fn parse_step(text: &str, spec: &FieldSpec) -> Result<u32, CronError> {
    match text.parse::<u32>() {
        Ok(step) if step > 0 => Ok(step),
        _ => Err(CronError::InvalidStep {
            field: spec.name,
            step: text.to_string(),
        }),
    }
}

fn parse_value(text: &str, spec: &FieldSpec) -> Result<u32, CronError> {
    if text.is_empty() {
        return Err(CronError::EmptyField { field: spec.name });
    }

    let value = match text.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            let (names, offset) = spec.names.ok_or_else(|| CronError::InvalidValue {
                field: spec.name,
                value: text.to_string(),
            })?;
            let index = names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(text))
                .ok_or_else(|| CronError::InvalidValue {
                    field: spec.name,
                    value: text.to_string(),
                })?;
            index as u32 + offset
        }
    };

    if value < spec.min || value > spec.max {
        return Err(CronError::OutOfRange {
            field: spec.name,
            value,
            min: spec.min,
            max: spec.max,
        });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// CronMatcher
// ---------------------------------------------------------------------------

/// Matches instants against cron expressions, memoizing compiled
/// expressions by their exact source string.
///
/// Only successfully parsed expressions are cached; an invalid expression is
/// re-parsed (and fails again) on every call.
#[derive(Debug, Default)]
pub struct CronMatcher {
    compiled: DashMap<String, Arc<CronExpression>>,
}

impl CronMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `expression`, reusing a cached compilation when present.
    pub fn compile(&self, expression: &str) -> Result<Arc<CronExpression>, CronError> {
        if let Some(hit) = self.compiled.get(expression) {
            return Ok(Arc::clone(hit.value()));
        }
        let compiled = Arc::new(CronExpression::parse(expression)?);
        self.compiled
            .insert(expression.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Test whether `at` satisfies `expression`.
    pub fn matches<Tz: TimeZone>(
        &self,
        expression: &str,
        at: &DateTime<Tz>,
    ) -> Result<bool, CronError> {
        Ok(self.compile(expression)?.matches(at))
    }

    /// Number of memoized expressions.
    pub fn cached_count(&self) -> usize {
        self.compiled.len()
    }

    /// Drop every memoized expression.
    pub fn clear(&self) {
        self.compiled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    /// 2025-06-02 was a Monday.
    fn monday(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn wildcard_matches_everything() {
        let expr = CronExpression::parse("* * * * *").unwrap();
        assert!(expr.matches(&monday(0, 0)));
        assert!(expr.matches(&monday(23, 59)));
    }

    #[test]
    fn exact_minute_and_hour() {
        let expr = CronExpression::parse("30 14 * * *").unwrap();
        assert!(expr.matches(&monday(14, 30)));
        assert!(!expr.matches(&monday(14, 31)));
        assert!(!expr.matches(&monday(15, 30)));
    }

    #[test]
    fn ranges_lists_and_steps() {
        let expr = CronExpression::parse("*/15 9-17 * * *").unwrap();
        assert!(expr.matches(&monday(9, 0)));
        assert!(expr.matches(&monday(17, 45)));
        assert!(!expr.matches(&monday(12, 10)));
        assert!(!expr.matches(&monday(18, 0)));

        let expr = CronExpression::parse("0,20,40 * * * *").unwrap();
        assert!(expr.matches(&monday(3, 40)));
        assert!(!expr.matches(&monday(3, 41)));

        let expr = CronExpression::parse("10-30/10 * * * *").unwrap();
        assert!(expr.matches(&monday(0, 20)));
        assert!(!expr.matches(&monday(0, 40)));

        let expr = CronExpression::parse("5/20 * * * *").unwrap();
        assert!(expr.matches(&monday(0, 45)));
        assert!(!expr.matches(&monday(0, 0)));
    }

    #[test]
    fn day_of_week_names() {
        let expr = CronExpression::parse("* * * * MON-FRI").unwrap();
        assert!(expr.matches(&monday(12, 0)));
        let saturday = monday(12, 0) + Duration::days(5);
        assert!(!expr.matches(&saturday));

        let expr = CronExpression::parse("* * * * sat,sun").unwrap();
        assert!(expr.matches(&saturday));
        assert!(expr.matches(&(saturday + Duration::days(1))));
    }

    #[test]
    fn seven_is_sunday() {
        let sunday = monday(8, 0) - Duration::days(1);
        assert!(CronExpression::parse("* * * * 7").unwrap().matches(&sunday));
        assert!(CronExpression::parse("* * * * 0").unwrap().matches(&sunday));
        assert!(!CronExpression::parse("* * * * 7").unwrap().matches(&monday(8, 0)));
    }

    #[test]
    fn month_names_and_day_of_month() {
        let expr = CronExpression::parse("0 0 25 DEC *").unwrap();
        let christmas = Utc.with_ymd_and_hms(2025, 12, 25, 0, 0, 0).unwrap();
        assert!(expr.matches(&christmas));
        assert!(!expr.matches(&(christmas + Duration::days(1))));
    }

    #[test]
    fn fields_are_anded() {
        // June 2nd 2025 is a Monday; the expression asks for Sundays only.
        let expr = CronExpression::parse("* * 2 JUN SUN").unwrap();
        assert!(!expr.matches(&monday(10, 0)));
    }

    #[test]
    fn impossible_date_never_matches() {
        let expr = CronExpression::parse("0 0 31 2 *").unwrap();
        let mut t = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        for _ in 0..60 {
            assert!(!expr.matches(&t));
            t += Duration::days(1);
        }
    }

    #[test]
    fn parse_errors() {
        assert_eq!(CronExpression::parse("* * * *"), Err(CronError::FieldCount(4)));
        assert_eq!(CronExpression::parse(""), Err(CronError::FieldCount(0)));
        assert!(matches!(
            CronExpression::parse("60 * * * *"),
            Err(CronError::OutOfRange { field: "minute", value: 60, .. })
        ));
        assert!(matches!(
            CronExpression::parse("* * 0 * *"),
            Err(CronError::OutOfRange { field: "day-of-month", .. })
        ));
        assert!(matches!(
            CronExpression::parse("*/0 * * * *"),
            Err(CronError::InvalidStep { .. })
        ));
        assert!(matches!(
            CronExpression::parse("30-10 * * * *"),
            Err(CronError::InvalidRange { .. })
        ));
        assert!(matches!(
            CronExpression::parse("* * * * FUNDAY"),
            Err(CronError::InvalidValue { .. })
        ));
        // Names are only valid in month and day-of-week.
        assert!(matches!(
            CronExpression::parse("MON * * * *"),
            Err(CronError::InvalidValue { field: "minute", .. })
        ));
        assert!(matches!(
            CronExpression::parse("1,,2 * * * *"),
            Err(CronError::EmptyField { .. })
        ));
    }

    #[test]
    fn matcher_memoizes_by_source() {
        let matcher = CronMatcher::new();
        assert!(matcher.matches("* * * * *", &monday(1, 1)).unwrap());
        assert!(matcher.matches("* * * * *", &monday(2, 2)).unwrap());
        assert_eq!(matcher.cached_count(), 1);

        // Different text, same meaning: separate entry.
        matcher.compile("*  * * * *").unwrap();
        assert_eq!(matcher.cached_count(), 2);

        let a = matcher.compile("* * * * *").unwrap();
        let b = matcher.compile("* * * * *").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        matcher.clear();
        assert_eq!(matcher.cached_count(), 0);
    }

    #[test]
    fn matcher_does_not_cache_invalid_expressions() {
        let matcher = CronMatcher::new();
        assert!(matcher.matches("not a cron", &monday(0, 0)).is_err());
        assert_eq!(matcher.cached_count(), 0);
    }

    proptest! {
        #[test]
        fn wildcard_matches_any_instant(secs in 0i64..4_102_444_800) {
            let at = Utc.timestamp_opt(secs, 0).unwrap();
            prop_assert!(CronExpression::parse("* * * * *").unwrap().matches(&at));
        }

        #[test]
        fn exact_minute_hour_matches_only_itself(minute in 0u32..60, hour in 0u32..24, probe in 0u32..1440) {
            let expr = CronExpression::parse(&format!("{minute} {hour} * * *")).unwrap();
            let at = monday(probe / 60, probe % 60);
            prop_assert_eq!(expr.matches(&at), probe == hour * 60 + minute);
        }
    }
}
