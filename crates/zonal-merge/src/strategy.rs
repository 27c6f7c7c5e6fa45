use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Policy used to reconcile two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeStrategy {
    /// Source overwrites target entirely.
    Replace,
    /// Stack quantities add up; surplus and displaced stacks overflow.
    Combine,
    /// The larger stack (and larger scalar) of each pair survives.
    KeepHigher,
    /// Differing slots become conflicts for an operator to resolve.
    Manual,
}

impl MergeStrategy {
    pub const ALL: [MergeStrategy; 4] = [
        MergeStrategy::Replace,
        MergeStrategy::Combine,
        MergeStrategy::KeepHigher,
        MergeStrategy::Manual,
    ];

    /// Whether a preview under this strategy can be committed directly.
    pub fn is_automatic(&self) -> bool {
        !matches!(self, Self::Manual)
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Replace => "replace",
            Self::Combine => "combine",
            Self::KeepHigher => "keep_higher",
            Self::Manual => "manual",
        };
        f.write_str(s)
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "replace" => Ok(Self::Replace),
            "combine" => Ok(Self::Combine),
            "keep_higher" | "keephigher" => Ok(Self::KeepHigher),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown merge strategy '{other}'")),
        }
    }
}
