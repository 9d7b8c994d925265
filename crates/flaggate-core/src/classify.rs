//! Decide whether a ticket needs a feature flag.
//!
//! Rules run in a fixed order and every hit is recorded:
//!
//! 1. keywords in the title or description
//! 2. the canonical label, then the other flag labels
//! 3. project-level phrases
//! 4. experimental patterns (first hit only)
//!
//! The reason list keeps that order. Steps 1 and 4 can overlap: a ticket
//! mentioning "a/b test" is reported by both.

use crate::rules::RuleSet;
use crate::ticket::TicketRecord;
use regex::{Regex, RegexBuilder};
use std::fmt;
use tracing::debug;

/// Why the classifier reached its decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    Keyword(String),
    CanonicalLabel(String),
    Label(String),
    Project(String),
    ExperimentalPattern(String),
    /// Sentinel: the record was empty.
    NoTicketData,
    /// Sentinel: no rule fired.
    NoRequirements,
}

impl Reason {
    /// True for the two "nothing matched" sentinels.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        matches!(self, Self::NoTicketData | Self::NoRequirements)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "Contains keyword: '{keyword}'"),
            Self::CanonicalLabel(label) => write!(f, "Has standard label: '{label}' ⭐"),
            Self::Label(label) => write!(f, "Has label: '{label}'"),
            Self::Project(indicator) => write!(f, "Project requirement: '{indicator}'"),
            Self::ExperimentalPattern(pattern) => {
                write!(f, "Experimental pattern detected: {pattern}")
            }
            Self::NoTicketData => f.write_str("No ticket data available"),
            Self::NoRequirements => f.write_str("No feature flag requirements detected"),
        }
    }
}

/// Outcome of [`Classifier::classify`]. Never carries an empty reason list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    reasons: Vec<Reason>,
}

impl Classification {
    fn from_matches(reasons: Vec<Reason>) -> Self {
        if reasons.is_empty() {
            Self {
                reasons: vec![Reason::NoRequirements],
            }
        } else {
            Self { reasons }
        }
    }

    fn no_ticket_data() -> Self {
        Self {
            reasons: vec![Reason::NoTicketData],
        }
    }

    /// True iff at least one rule fired.
    #[must_use]
    pub fn requires_flag(&self) -> bool {
        self.reasons.iter().any(|reason| !reason.is_sentinel())
    }

    /// Reasons in rule-evaluation order.
    #[must_use]
    pub fn reasons(&self) -> &[Reason] {
        &self.reasons
    }

    /// Reasons rendered as display text.
    #[must_use]
    pub fn reason_texts(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

/// Raised when a rule set carries a pattern `regex` cannot compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid experimental pattern '{pattern}': {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

impl PatternError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> crate::error::ErrorCode {
        crate::error::ErrorCode::InvalidPattern
    }
}

#[derive(Debug)]
struct Pattern {
    source: String,
    regex: Regex,
}

/// A rule set with its patterns compiled.
#[derive(Debug)]
pub struct Classifier {
    rules: RuleSet,
    patterns: Vec<Pattern>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(RuleSet::default()).expect("default experimental patterns must compile")
    }
}

impl Classifier {
    /// Build a classifier that owns `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for the first experimental pattern that fails
    /// to compile.
    pub fn new(rules: RuleSet) -> Result<Self, PatternError> {
        let rules = rules.normalized();
        let patterns = rules
            .experimental_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| Pattern {
                        source: pattern.clone(),
                        regex,
                    })
                    .map_err(|source| PatternError {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules, patterns })
    }

    /// The (normalized) rule set this classifier matches against.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run every rule against `ticket`.
    #[must_use]
    pub fn classify(&self, ticket: &TicketRecord) -> Classification {
        if ticket.is_empty() {
            return Classification::no_ticket_data();
        }

        let title = ticket.title.to_lowercase();
        let description = ticket.description.to_lowercase();
        let mut reasons = Vec::new();

        for keyword in &self.rules.keywords {
            if title.contains(keyword.as_str()) || description.contains(keyword.as_str()) {
                reasons.push(Reason::Keyword(keyword.clone()));
            }
        }

        let labels = ticket.label_names();
        if labels.contains(&self.rules.canonical_label) {
            reasons.push(Reason::CanonicalLabel(self.rules.canonical_label.clone()));
        }
        for label in &self.rules.labels {
            if *label != self.rules.canonical_label && labels.contains(label) {
                reasons.push(Reason::Label(label.clone()));
            }
        }

        if let Some(project) = &ticket.project {
            let name = project.name.to_lowercase();
            let project_description = project.description.to_lowercase();
            for indicator in &self.rules.project_indicators {
                if name.contains(indicator.as_str())
                    || project_description.contains(indicator.as_str())
                {
                    reasons.push(Reason::Project(indicator.clone()));
                }
            }
        }

        if let Some(pattern) = self.patterns.iter().find(|pattern| {
            pattern.regex.is_match(&ticket.description) || pattern.regex.is_match(&ticket.title)
        }) {
            reasons.push(Reason::ExperimentalPattern(pattern.source.clone()));
        }

        debug!(
            identifier = %ticket.identifier,
            matched = reasons.len(),
            "classified ticket"
        );

        Classification::from_matches(reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{Label, Project};

    fn ticket(title: &str, description: &str) -> TicketRecord {
        TicketRecord {
            title: title.to_string(),
            description: description.to_string(),
            identifier: "ENG-1".to_string(),
            ..TicketRecord::default()
        }
    }

    #[test]
    fn empty_record_has_no_ticket_data() {
        let result = Classifier::default().classify(&TicketRecord::default());
        assert!(!result.requires_flag());
        assert_eq!(result.reason_texts(), vec!["No ticket data available"]);
    }

    #[test]
    fn unmatched_record_reports_sentinel() {
        let result = Classifier::default().classify(&ticket("Fix typo in footer", "Simple copy fix"));
        assert!(!result.requires_flag());
        assert_eq!(result.reasons(), &[Reason::NoRequirements]);
    }

    #[test]
    fn keyword_matches_either_field_once() {
        let result = Classifier::default()
            .classify(&ticket("Kill Switch for search", "add a kill switch"));
        assert!(result.requires_flag());
        assert_eq!(
            result.reasons(),
            &[Reason::Keyword("kill switch".to_string())]
        );
    }

    #[test]
    fn keyword_and_pattern_both_report_ab_test() {
        let result = Classifier::default().classify(&ticket("Add experimental checkout A/B test", ""));
        assert!(result.requires_flag());
        assert_eq!(
            result.reason_texts(),
            vec![
                "Contains keyword: 'a/b test'".to_string(),
                "Contains keyword: 'experiment'".to_string(),
                r"Experimental pattern detected: \ba/b\s+test\b".to_string(),
            ]
        );
    }

    #[test]
    fn canonical_label_comes_before_secondary_labels() {
        let mut record = ticket("Update copy", "");
        record.labels = vec![
            Label::Plain("Beta".to_string()),
            Label::Named("FEATURE-FLAG-NEEDED".to_string()),
        ];
        let result = Classifier::default().classify(&record);
        assert_eq!(
            result.reason_texts(),
            vec![
                "Has standard label: 'feature-flag-needed' ⭐".to_string(),
                "Has label: 'beta'".to_string(),
            ]
        );
    }

    #[test]
    fn secondary_labels_follow_rule_order_not_ticket_order() {
        let mut record = ticket("Update copy", "");
        record.labels = vec![
            Label::Plain("canary".to_string()),
            Label::Plain("feature-flag".to_string()),
        ];
        let result = Classifier::default().classify(&record);
        assert_eq!(
            result.reasons(),
            &[
                Reason::Label("feature-flag".to_string()),
                Reason::Label("canary".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_labels_are_skipped() {
        let mut record = ticket("Update copy", "");
        record.labels = vec![Label::Malformed(serde_json::json!(3))];
        let result = Classifier::default().classify(&record);
        assert!(!result.requires_flag());
    }

    #[test]
    fn project_indicator_matches_name_or_description() {
        let mut record = ticket("Update copy", "");
        record.project = Some(Project {
            name: "Checkout".to_string(),
            description: "All work here REQUIRES FEATURE FLAGS".to_string(),
        });
        let result = Classifier::default().classify(&record);
        assert_eq!(
            result.reasons(),
            &[Reason::Project("requires feature flags".to_string())]
        );
    }

    #[test]
    fn only_first_experimental_pattern_is_reported() {
        let result = Classifier::default().classify(&ticket("Canary the beta", ""));
        assert_eq!(
            result.reasons(),
            &[Reason::ExperimentalPattern(r"\bcanary\b".to_string())]
        );
    }

    #[test]
    fn patterns_respect_word_boundaries() {
        let result = Classifier::default().classify(&ticket("Alphabeta rollouts", ""));
        assert!(!result.requires_flag());
    }

    #[test]
    fn custom_rules_replace_defaults() {
        let rules = RuleSet {
            keywords: vec!["Dark Launch".to_string()],
            canonical_label: "needs-flag".to_string(),
            labels: vec![],
            project_indicators: vec![],
            experimental_patterns: vec![r"\bpilot\b".to_string()],
        };
        let classifier = Classifier::new(rules).expect("patterns compile");

        let untouched = classifier.classify(&ticket("A/B test the canary", ""));
        assert!(!untouched.requires_flag());

        let hit = classifier.classify(&ticket("Dark launch the PILOT", ""));
        assert_eq!(
            hit.reasons(),
            &[
                Reason::Keyword("dark launch".to_string()),
                Reason::ExperimentalPattern(r"\bpilot\b".to_string()),
            ]
        );
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let rules = RuleSet {
            experimental_patterns: vec!["(unclosed".to_string()],
            ..RuleSet::default()
        };
        let err = Classifier::new(rules).expect_err("pattern should fail");
        assert_eq!(err.pattern, "(unclosed");
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidPattern);
    }
}
