//! Group definitions loaded from TOML.
//!
//! ```toml
//! default_group = "survival"
//!
//! [[groups]]
//! name = "survival"
//! worlds = ["world", "world_nether", "world_the_end"]
//!
//! [[groups]]
//! name = "event"
//! worlds = ["event_arena"]
//!
//! [groups.conditions]
//! permission = "zonal.event"
//! cron = "* 18-22 * * FRI,SAT"
//! require_all = false
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zonal_types::Group;

use crate::cron::CronExpression;
use crate::error::{GateError, GateResult};
use crate::traits::GroupRegistry;

fn default_group_name() -> String {
    "default".to_string()
}

/// The full set of configured groups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupsConfig {
    /// Group applied to worlds no other group claims.
    #[serde(default = "default_group_name")]
    pub default_group: String,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            default_group: default_group_name(),
            groups: Vec::new(),
        }
    }
}

impl GroupsConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> GateResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> GateResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), groups = config.groups.len(), "group configuration loaded");
        Ok(config)
    }

    /// Reject blank or duplicate group names, worlds claimed twice and
    /// reversed time ranges.
    ///
    /// Invalid cron expressions are only logged: they evaluate as a failed
    /// condition at runtime rather than preventing startup.
    pub fn validate(&self) -> GateResult<()> {
        let mut names = HashSet::new();
        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();

        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(GateError::Config("group name must not be empty".into()));
            }
            if !names.insert(group.name.as_str()) {
                return Err(GateError::Config(format!("duplicate group '{}'", group.name)));
            }
            for world in &group.worlds {
                if let Some(owner) = owners.insert(world.as_str(), group.name.as_str()) {
                    return Err(GateError::Config(format!(
                        "world '{world}' is claimed by both '{owner}' and '{}'",
                        group.name
                    )));
                }
            }
            let ranges = group.conditions.as_ref().and_then(|c| c.time_ranges.as_deref()).unwrap_or_default();
            if let Some(range) = ranges.iter().find(|r| r.start > r.end) {
                return Err(GateError::Config(format!(
                    "group '{}' has a time range ending before it starts ({} > {})",
                    group.name,
                    range.start.to_rfc3339(),
                    range.end.to_rfc3339()
                )));
            }
            if let Some(expr) = group.conditions.as_ref().and_then(|c| c.cron.as_deref()) {
                if let Err(err) = CronExpression::parse(expr) {
                    warn!(group = %group.name, expression = expr, error = %err, "group has an invalid cron expression");
                }
            }
        }
        Ok(())
    }
}

/// A [`GroupRegistry`] over a fixed, validated configuration.
#[derive(Clone, Debug)]
pub struct StaticGroupRegistry {
    config: GroupsConfig,
}

impl StaticGroupRegistry {
    pub fn new(config: GroupsConfig) -> Self {
        Self { config }
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.config.groups.iter().find(|g| g.name == name)
    }

    /// The group owning `world`, falling back to the default group.
    pub fn group_for_world(&self, world: &str) -> Option<&Group> {
        self.config
            .groups
            .iter()
            .find(|g| g.contains_world(world))
            .or_else(|| self.group(&self.config.default_group))
    }

    pub fn len(&self) -> usize {
        self.config.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.config.groups.is_empty()
    }
}

impl GroupRegistry for StaticGroupRegistry {
    fn all_groups(&self) -> Vec<Group> {
        self.config.groups.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
default_group = "survival"

[[groups]]
name = "survival"
worlds = ["world", "world_nether"]

[[groups]]
name = "event"
worlds = ["event_arena"]

[groups.conditions]
permission = "zonal.event"
cron = "* 18-22 * * FRI,SAT"
require_all = false

[[groups.conditions.time_ranges]]
start = "2025-12-24T00:00:00Z"
end = "2025-12-26T23:59:59Z"

[[groups.conditions.placeholders]]
placeholder = "%player_level%"
operator = "GREATER_OR_EQUAL"
value = "10"
"#;

    #[test]
    fn parses_sample() {
        let config = GroupsConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.default_group, "survival");
        assert_eq!(config.groups.len(), 2);

        let event = &config.groups[1];
        let conditions = event.conditions.as_ref().unwrap();
        assert_eq!(conditions.permission.as_deref(), Some("zonal.event"));
        assert!(!conditions.require_all);
        assert_eq!(conditions.time_ranges.as_ref().unwrap().len(), 1);
        assert_eq!(conditions.placeholders.as_ref().unwrap()[0].value, "10");
        assert!(event.has_conditions());
        assert!(!config.groups[0].has_conditions());
    }

    #[test]
    fn registry_lookups() {
        let registry = StaticGroupRegistry::new(GroupsConfig::from_toml_str(SAMPLE).unwrap());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.group_for_world("event_arena").unwrap().name, "event");
        assert_eq!(registry.group_for_world("world_nether").unwrap().name, "survival");
        // Unclaimed worlds fall back to the default group.
        assert_eq!(registry.group_for_world("skyblock").unwrap().name, "survival");
        assert!(registry.group("missing").is_none());
        assert_eq!(registry.all_groups().len(), 2);
    }

    #[test]
    fn missing_default_group_yields_none() {
        let config = GroupsConfig::from_toml_str(
            "[[groups]]\nname = \"a\"\nworlds = [\"w\"]\n",
        )
        .unwrap();
        assert_eq!(config.default_group, "default");
        let registry = StaticGroupRegistry::new(config);
        assert!(registry.group_for_world("elsewhere").is_none());
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = GroupsConfig::from_toml_str(
            "[[groups]]\nname = \"a\"\n\n[[groups]]\nname = \"a\"\n",
        )
        .unwrap_err();
        assert_eq!(err, GateError::Config("duplicate group 'a'".into()));
    }

    #[test]
    fn rejects_shared_world() {
        let err = GroupsConfig::from_toml_str(
            "[[groups]]\nname = \"a\"\nworlds = [\"w\"]\n\n[[groups]]\nname = \"b\"\nworlds = [\"w\"]\n",
        )
        .unwrap_err();
        assert!(matches!(err, GateError::Config(msg) if msg.contains("'w'")));
    }

    #[test]
    fn rejects_blank_name() {
        let err = GroupsConfig::from_toml_str("[[groups]]\nname = \"  \"\n").unwrap_err();
        assert!(matches!(err, GateError::Config(_)));
    }

    #[test]
    fn rejects_reversed_time_range() {
        let err = GroupsConfig::from_toml_str(
            "[[groups]]\nname = \"a\"\n\n[[groups.conditions.time_ranges]]\nstart = \"2025-12-26T00:00:00Z\"\nend = \"2025-12-24T00:00:00Z\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, GateError::Config(msg) if msg.contains("group 'a'") && msg.contains("ending before")));
    }

    #[test]
    fn invalid_cron_is_tolerated() {
        let config = GroupsConfig::from_toml_str(
            "[[groups]]\nname = \"a\"\n[groups.conditions]\ncron = \"every day\"\n",
        )
        .unwrap();
        assert_eq!(config.groups[0].conditions.as_ref().unwrap().cron.as_deref(), Some("every day"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = GroupsConfig::from_toml_str("[[groups]\nname=").unwrap_err();
        assert!(matches!(err, GateError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = GroupsConfig::load(file.path()).unwrap();
        assert_eq!(config.groups.len(), 2);

        let missing = GroupsConfig::load(Path::new("/nonexistent/zonal/groups.toml"));
        assert!(matches!(missing, Err(GateError::Io(_))));
    }
}
