//! Policy Pack data model.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::fmt;

/// `pass < warn < block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Pass,
    Warn,
    Block,
}

impl Decision {
    fn rank(self) -> u8 {
        match self {
            Decision::Pass => 0,
            Decision::Warn => 1,
            Decision::Block => 2,
        }
    }

    pub fn worst(self, other: Decision) -> Decision {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }

    pub fn worst_of<I: IntoIterator<Item = Decision>>(iter: I) -> Decision {
        iter.into_iter().fold(Decision::Pass, Decision::worst)
    }
}

impl PartialOrd for Decision {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.rank().cmp(&other.rank()))
    }
}

impl Ord for Decision {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Pass => "pass",
            Decision::Warn => "warn",
            Decision::Block => "block",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackStatus {
    Draft,
    InReview,
    Active,
    Deprecated,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackMode {
    Observe,
    Warn,
    Enforce,
}

impl fmt::Display for PackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackMode::Observe => "observe",
            PackMode::Warn => "warn",
            PackMode::Enforce => "enforce",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    MostRestrictive,
    HighestPriority,
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    Workspace,
    Service,
    Repo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFilter {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl PathFilter {
    /// Empty `include` means "match everything not explicitly excluded".
    pub fn matches(&self, globber: &dyn Fn(&str, &str) -> bool, value: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|g| globber(g, value));
        let excluded = self.exclude.iter().any(|g| globber(g, value));
        included && !excluded
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackScope {
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    #[serde(default)]
    pub service_ref: Option<String>,
    #[serde(default)]
    pub branches: PathFilter,
    #[serde(default)]
    pub repos: PathFilter,
    #[serde(default = "default_pr_events")]
    pub pr_events: Vec<String>,
}

fn default_pr_events() -> Vec<String> {
    vec!["opened".to_string(), "synchronize".to_string(), "reopened".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackMetadata {
    pub id: String,
    pub name: String,
    pub version: String,
    pub status: PackStatus,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub pack_mode: PackMode,
}

/// Representing the two arms with distinct shapes rather than one
/// optional-field bag avoids the "invalid combination" class of bugs.
/// Deserialization still accepts the wire shape used by the pack
/// validator's "exactly one of comparator|comparatorId|condition|conditions"
/// rule (see [`crate::pack::validator`]), but internally this is never an
/// ambiguous bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObligationCheck {
    Comparator {
        comparator_id: String,
        #[serde(default)]
        params: serde_json::Value,
    },
    Condition {
        condition: crate::conditions::Condition,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    #[serde(flatten)]
    pub check: ObligationCheck,
    pub decision_on_fail: Decision,
    #[serde(default)]
    pub decision_on_unknown: Option<Decision>,
}

impl Obligation {
    pub fn decision_on_unknown(&self) -> Decision {
        self.decision_on_unknown.unwrap_or(self.decision_on_fail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Trigger {
    Always,
    PathGlobs { globs: Vec<String> },
    Labels { labels: Vec<String> },
    ChangeSurface { surface: String },
}

impl Default for Trigger {
    fn default() -> Self {
        Trigger::Always
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default)]
    pub when: Option<crate::conditions::Condition>,
    #[serde(default)]
    pub requires: Vec<String>,
    pub obligations: Vec<Obligation>,
    #[serde(default)]
    pub skip_if: Option<crate::conditions::Condition>,
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackDefaults {
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub severity: Option<Decision>,
    #[serde(default)]
    pub min_approvals: Option<u32>,
}

impl Default for PackDefaults {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            severity: None,
            min_approvals: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyPack {
    pub id: String,
    pub workspace_id: String,
    pub metadata: PackMetadata,
    pub scope: PackScope,
    pub priority: u8,
    pub merge_strategy: MergeStrategy,
    #[serde(default)]
    pub defaults: PackDefaults,
    pub rules: Vec<Rule>,
}

impl PolicyPack {
    pub fn priority_in_range(&self) -> bool {
        self.priority <= 100
    }
}
