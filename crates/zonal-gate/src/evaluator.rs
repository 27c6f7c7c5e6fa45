use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};
use zonal_types::{ConditionSet, Group, PlayerId, TimeRange};

use crate::config::{CronTimeZone, EvaluatorConfig};
use crate::cron::CronMatcher;
use crate::result::{
    cron_tag, placeholder_tag, ConditionEvaluationResult, TAG_CRON_INVALID,
    TAG_CRON_NOT_MATCHING, TAG_PLACEHOLDER_UNAVAILABLE, TAG_SCHEDULE_ACTIVE,
    TAG_SCHEDULE_NOT_ACTIVE,
};
use crate::traits::{GroupRegistry, PlaceholderIntegration, Player};

type CacheKey = (PlayerId, String);

/// Evaluates group condition sets against players.
///
/// Condition kinds are evaluated independently in a fixed order (permission,
/// schedule, cron, placeholders) and each contributes matched or failed
/// tags. `require_all` decides whether the overall result is the AND or the
/// OR of those outcomes.
///
/// Results are cached per (player, group). A cached result is returned
/// unchanged until it is invalidated; there is no expiry. The cache is a
/// concurrent map, so evaluation may run from any thread.
pub struct ConditionEvaluator {
    config: EvaluatorConfig,
    cron: CronMatcher,
    placeholders: Arc<dyn PlaceholderIntegration>,
    groups: Arc<dyn GroupRegistry>,
    cache: DashMap<CacheKey, ConditionEvaluationResult>,
}

impl ConditionEvaluator {
    pub fn new(
        config: EvaluatorConfig,
        placeholders: Arc<dyn PlaceholderIntegration>,
        groups: Arc<dyn GroupRegistry>,
    ) -> Self {
        Self {
            config,
            cron: CronMatcher::new(),
            placeholders,
            groups,
            cache: DashMap::new(),
        }
    }

    /// The current configuration.
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// The cron matcher backing cron conditions.
    pub fn cron_matcher(&self) -> &CronMatcher {
        &self.cron
    }

    /// Evaluate `group`'s conditions for `player`.
    ///
    /// With `use_cache`, a cached result for the pair is returned as-is even
    /// if the underlying predicates have changed since; callers invalidate
    /// explicitly when they know state moved.
    pub fn evaluate(
        &self,
        player: &dyn Player,
        group: &Group,
        use_cache: bool,
    ) -> ConditionEvaluationResult {
        let use_cache = use_cache && self.config.cache_enabled;
        let key = (player.id(), group.name.clone());

        if use_cache {
            if let Some(hit) = self.cache.get(&key) {
                return hit.value().clone();
            }
        }

        let result = self.evaluate_at(player, group, Utc::now());

        if use_cache {
            self.cache.insert(key, result.clone());
        }
        result
    }

    /// Evaluate against an explicit instant, bypassing the cache.
    pub fn evaluate_at(
        &self,
        player: &dyn Player,
        group: &Group,
        now: DateTime<Utc>,
    ) -> ConditionEvaluationResult {
        let conditions = match group.conditions.as_ref() {
            Some(c) if !c.is_empty() => c,
            _ => return ConditionEvaluationResult::no_conditions(now),
        };

        let mut matched = Vec::new();
        let mut failed = Vec::new();
        let mut record = |ok: bool, tag: String| {
            if ok {
                matched.push(tag);
            } else {
                failed.push(tag);
            }
        };

        if let Some(permission) = conditions.permission.as_deref() {
            record(self.evaluate_permission(player, Some(permission)), permission.to_string());
        }

        if let Some(ranges) = conditions.time_ranges.as_deref().filter(|r| !r.is_empty()) {
            let active = self.evaluate_schedule_at(Some(ranges), now);
            let tag = if active { TAG_SCHEDULE_ACTIVE } else { TAG_SCHEDULE_NOT_ACTIVE };
            record(active, tag.to_string());
        }

        if let Some(expression) = conditions.cron.as_deref() {
            let outcome = match self.config.cron_time_zone {
                CronTimeZone::Local => self.cron.matches(expression, &now.with_timezone(&Local)),
                CronTimeZone::Utc => self.cron.matches(expression, &now),
            };
            match outcome {
                Ok(true) => record(true, cron_tag(expression)),
                Ok(false) => record(false, TAG_CRON_NOT_MATCHING.to_string()),
                Err(err) => {
                    warn!(group = %group.name, expression, error = %err, "invalid cron expression");
                    record(false, TAG_CRON_INVALID.to_string());
                }
            }
        }

        self.evaluate_placeholders(player, conditions, &mut record);

        let matches = combine(conditions.require_all, &matched, &failed);
        debug!(
            player = %player.id(),
            group = %group.name,
            matches,
            matched = matched.len(),
            failed = failed.len(),
            "conditions evaluated"
        );

        ConditionEvaluationResult {
            matches,
            matched_conditions: matched,
            failed_conditions: failed,
            evaluation_time: now,
        }
    }

    fn evaluate_placeholders(
        &self,
        player: &dyn Player,
        conditions: &ConditionSet,
        record: &mut impl FnMut(bool, String),
    ) {
        let mut entries = conditions.all_placeholders().peekable();
        if entries.peek().is_none() {
            return;
        }

        if !self.placeholders.is_available() {
            for _ in entries {
                record(false, TAG_PLACEHOLDER_UNAVAILABLE.to_string());
            }
            return;
        }

        for condition in entries {
            let ok = self.placeholders.evaluate_condition(player, condition);
            record(ok, placeholder_tag(&condition.placeholder));
        }
    }

    /// `None` always passes; otherwise the player's permission check.
    pub fn evaluate_permission(&self, player: &dyn Player, permission: Option<&str>) -> bool {
        permission.map_or(true, |p| player.has_permission(p))
    }

    /// Whether the current instant falls in any range. `None` or empty passes.
    pub fn evaluate_schedule(&self, ranges: Option<&[TimeRange]>) -> bool {
        self.evaluate_schedule_at(ranges, Utc::now())
    }

    pub fn evaluate_schedule_at(&self, ranges: Option<&[TimeRange]>, now: DateTime<Utc>) -> bool {
        match ranges {
            None => true,
            Some([]) => true,
            Some(ranges) => ranges.iter().any(|r| r.contains(&now)),
        }
    }

    /// Whether the current instant (in the configured zone) matches the
    /// expression. `None` passes; an invalid expression fails without error.
    pub fn evaluate_cron(&self, expression: Option<&str>) -> bool {
        match self.config.cron_time_zone {
            CronTimeZone::Local => self.evaluate_cron_at(expression, &Local::now()),
            CronTimeZone::Utc => self.evaluate_cron_at(expression, &Utc::now()),
        }
    }

    pub fn evaluate_cron_at<Tz: TimeZone>(&self, expression: Option<&str>, now: &DateTime<Tz>) -> bool {
        let Some(expression) = expression else {
            return true;
        };
        match self.cron.matches(expression, now) {
            Ok(matches) => matches,
            Err(err) => {
                warn!(expression, error = %err, "invalid cron expression");
                false
            }
        }
    }

    /// Human-readable explanation, always computed fresh.
    pub fn match_reason(&self, player: &dyn Player, group: &Group) -> String {
        self.evaluate(player, group, false).reason(&group.name)
    }

    /// Fresh results for every registered group that has conditions.
    pub fn active_conditions_for_player(
        &self,
        player: &dyn Player,
    ) -> BTreeMap<String, ConditionEvaluationResult> {
        self.groups
            .all_groups()
            .into_iter()
            .filter(Group::has_conditions)
            .map(|group| {
                let result = self.evaluate(player, &group, false);
                (group.name, result)
            })
            .collect()
    }

    /// Drop every cached result for `player`.
    pub fn invalidate_player(&self, player: PlayerId) {
        self.cache.retain(|(cached, _), _| *cached != player);
        debug!(player = %player, "condition cache invalidated for player");
    }

    /// Drop the cached result for one (player, group) pair.
    pub fn invalidate(&self, player: PlayerId, group: &str) {
        self.cache.remove(&(player, group.to_string()));
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached results.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Clear cached results and ask the placeholder integration to re-probe.
    pub fn reload(&self) {
        self.clear_cache();
        self.placeholders.check_availability();
        info!(
            placeholders_available = self.placeholders.is_available(),
            "condition evaluator reloaded"
        );
    }
}

/// AND or OR over individual outcomes.
fn combine(require_all: bool, matched: &[String], failed: &[String]) -> bool {
    if require_all {
        failed.is_empty()
    } else {
        !matched.is_empty()
    }
}
