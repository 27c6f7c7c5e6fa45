use serde::{Deserialize, Serialize};

/// Time zone cron expressions are matched in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CronTimeZone {
    /// The server's local time zone.
    #[default]
    Local,
    Utc,
}

/// Configuration for the [`ConditionEvaluator`](crate::ConditionEvaluator).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// When `false`, every evaluation bypasses the result cache.
    pub cache_enabled: bool,
    /// Time zone used for cron conditions.
    pub cron_time_zone: CronTimeZone,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cron_time_zone: CronTimeZone::Local,
        }
    }
}

impl EvaluatorConfig {
    /// Configuration with caching switched off.
    pub fn uncached() -> Self {
        Self {
            cache_enabled: false,
            ..Default::default()
        }
    }
}
