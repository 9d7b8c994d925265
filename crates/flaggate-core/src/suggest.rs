//! Flag name, type, and rollout suggestions derived from a ticket.

use crate::classify::Classification;
use crate::ticket::TicketRecord;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Name used when there is no ticket to derive one from.
pub const FALLBACK_FLAG_NAME: &str = "unknown-feature";

const NAME_SEPARATOR: &str = "-";
const SINGLE_WORD_SUFFIX: &str = "feature";
const MAX_NAME_WORDS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "new", "add", "create", "update", "fix", "implement",
    "build", "make", "feature",
];

const STRING_WORDS: &[&str] = &["a/b", "test", "variant", "experiment"];
const NUMBER_WORDS: &[&str] = &["limit", "count", "number", "threshold"];
const JSON_WORDS: &[&str] = &["config", "settings", "complex"];

/// Value type for the suggested flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
    Boolean,
    String,
    Number,
    Json,
}

impl FlagType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Number => "number",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the flagged change should be exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutStrategy {
    StandardDeployment,
    SplitTesting,
    CarefulCanary,
    BackendFirst,
    GradualPercentage,
}

impl RolloutStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StandardDeployment => "standard_deployment",
            Self::SplitTesting => "split_testing",
            Self::CarefulCanary => "careful_canary",
            Self::BackendFirst => "backend_first",
            Self::GradualPercentage => "gradual_percentage",
        }
    }
}

impl fmt::Display for RolloutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything suggested for a ticket that needs a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub flag_name: String,
    pub flag_type: FlagType,
    pub rollout_strategy: RolloutStrategy,
}

impl Suggestions {
    /// Derive suggestions, or `None` when no flag is required.
    #[must_use]
    pub fn for_ticket(ticket: &TicketRecord, classification: &Classification) -> Option<Self> {
        let requires_flag = classification.requires_flag();
        requires_flag.then(|| Self {
            flag_name: suggest_flag_name(ticket),
            flag_type: suggest_flag_type(ticket),
            rollout_strategy: suggest_rollout_strategy(ticket, requires_flag),
        })
    }
}

fn title_word_regex() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"\b[a-z]{3,}\b").expect("title word regex must compile"))
}

/// Kebab-case flag name built from the meaningful words of the title.
#[must_use]
pub fn suggest_flag_name(ticket: &TicketRecord) -> String {
    if ticket.is_empty() {
        return FALLBACK_FLAG_NAME.to_string();
    }

    let title = ticket.title.to_lowercase();
    let words: Vec<&str> = title_word_regex()
        .find_iter(&title)
        .map(|m| m.as_str())
        .filter(|word| !STOP_WORDS.contains(word))
        .collect();

    match words.as_slice() {
        [] => ticket.identifier.to_lowercase(),
        [word] => format!("{word}{NAME_SEPARATOR}{SINGLE_WORD_SUFFIX}"),
        _ => words
            .iter()
            .take(MAX_NAME_WORDS)
            .copied()
            .collect::<Vec<_>>()
            .join(NAME_SEPARATOR),
    }
}

/// Flag value type guessed from title and description; first category wins.
#[must_use]
pub fn suggest_flag_type(ticket: &TicketRecord) -> FlagType {
    let text = format!("{} {}", ticket.title, ticket.description).to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|word| text.contains(word));

    if mentions(STRING_WORDS) {
        FlagType::String
    } else if mentions(NUMBER_WORDS) {
        FlagType::Number
    } else if mentions(JSON_WORDS) {
        FlagType::Json
    } else {
        FlagType::Boolean
    }
}

/// Rollout strategy for the ticket; checks run in priority order.
#[must_use]
pub fn suggest_rollout_strategy(ticket: &TicketRecord, requires_flag: bool) -> RolloutStrategy {
    if !requires_flag {
        return RolloutStrategy::StandardDeployment;
    }

    let title = ticket.title.to_lowercase();
    let description = ticket.description.to_lowercase();

    if title.contains("experiment") || description.contains("a/b") {
        RolloutStrategy::SplitTesting
    } else if title.contains("critical") || title.contains("important") {
        RolloutStrategy::CarefulCanary
    } else if title.contains("api") || title.contains("backend") {
        RolloutStrategy::BackendFirst
    } else {
        RolloutStrategy::GradualPercentage
    }
}
