//! Runtime settings, read from `LABELGRAPH_*` environment variables.

use labelgraph_store::PrunePolicy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether labels missing from a full edit list are deleted.
    #[serde(default)]
    pub prune: PrunePolicy,
    /// Reject edited labels whose category is not in the label config.
    #[serde(default)]
    pub strict_categories: bool,
    /// Extra chart options forwarded to the editing surface untouched.
    #[serde(default)]
    pub chart_flags: Map<String, Json>,
}

impl Settings {
    pub fn from_env() -> Self {
        let prune = if env_flag("LABELGRAPH_PRUNE_ABSENT") { PrunePolicy::PruneAbsent } else { PrunePolicy::DeletedOnly };
        Self { prune, strict_categories: env_flag("LABELGRAPH_STRICT_CATEGORIES"), chart_flags: Map::new() }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().map(|v| parse_flag(&v)).unwrap_or(false)
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
