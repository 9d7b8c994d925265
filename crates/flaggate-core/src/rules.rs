//! The rule lists the classifier matches against.
//!
//! A [`RuleSet`] is plain immutable data. The defaults cover the common
//! wording teams use for flagged work; a project can override any list with a
//! TOML file at `.flaggate/rules.toml`:
//!
//! ```toml
//! keywords = ["dark launch", "feature flag required"]
//! labels = ["needs-flag"]
//! ```
//!
//! Keys left out keep their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-relative location of the optional rules file.
pub const PROJECT_RULES_PATH: &str = ".flaggate/rules.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Phrases searched for in the title and description.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// The label teams attach when a flag is known to be required.
    #[serde(default = "default_canonical_label")]
    pub canonical_label: String,
    /// Other labels that imply a flag.
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
    /// Phrases searched for in the project name and description.
    #[serde(default = "default_project_indicators")]
    pub project_indicators: Vec<String>,
    /// Case-insensitive regular expressions; only the first hit is reported.
    #[serde(default = "default_experimental_patterns")]
    pub experimental_patterns: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            canonical_label: default_canonical_label(),
            labels: default_labels(),
            project_indicators: default_project_indicators(),
            experimental_patterns: default_experimental_patterns(),
        }
    }
}

impl RuleSet {
    /// Lower-case every literal so matching can compare against lower-cased text.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        lowercase_all(&mut self.keywords);
        lowercase_all(&mut self.labels);
        lowercase_all(&mut self.project_indicators);
        self.canonical_label = self.canonical_label.to_lowercase();
        self
    }

    /// Parse a rule set from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not valid TOML for a rule set.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

fn lowercase_all(values: &mut [String]) {
    for value in values {
        *value = value.to_lowercase();
    }
}

/// Load a rule set from an explicit file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_rules_file(path: &Path) -> Result<RuleSet> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| RulesError::Read {
            path: path.to_path_buf(),
            source,
        })
        .with_context(|| format!("Failed to read {}", path.display()))?;

    RuleSet::from_toml(&content)
        .map_err(|source| RulesError::Parse {
            path: path.to_path_buf(),
            source,
        })
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `.flaggate/rules.toml` under `project_root`, or the defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_rules(project_root: &Path) -> Result<RuleSet> {
    let path = project_root.join(PROJECT_RULES_PATH);
    if !path.exists() {
        return Ok(RuleSet::default());
    }
    load_rules_file(&path)
}

/// Errors from reading a rules file.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("cannot read rules file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl RulesError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> crate::error::ErrorCode {
        match self {
            Self::Read { .. } => crate::error::ErrorCode::RulesFileUnreadable,
            Self::Parse { .. } => crate::error::ErrorCode::RulesParseError,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn default_keywords() -> Vec<String> {
    strings(&[
        "needs to launch behind a feature flag",
        "feature flag required",
        "feature flag needed",
        "ff:",
        "gradual rollout",
        "behind feature flag",
        "feature toggle",
        "a/b test",
        "experiment",
        "phased rollout",
        "kill switch",
        "canary deployment",
        "progressive rollout",
        "beta feature",
        "experimental feature",
    ])
}

fn default_canonical_label() -> String {
    "feature-flag-needed".to_string()
}

fn default_labels() -> Vec<String> {
    strings(&[
        "feature-flag-needed",
        "needs-feature-flag",
        "feature-flag",
        "gradual-rollout",
        "experiment",
        "a-b-test",
        "canary",
        "phased-rollout",
        "beta",
        "experimental",
    ])
}

fn default_project_indicators() -> Vec<String> {
    strings(&[
        "requires feature flags",
        "feature flag mandatory",
        "gradual rollout project",
        "experimental features",
        "behind flags",
    ])
}

fn default_experimental_patterns() -> Vec<String> {
    strings(&[
        r"\bexperiment\b",
        r"\ba/b\s+test\b",
        r"\bcanary\b",
        r"\bbeta\b",
        r"\brollout\b",
    ])
}
