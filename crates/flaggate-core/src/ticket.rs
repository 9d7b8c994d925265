//! Ticket records as delivered by the tracker fetch step.
//!
//! The hook receives one JSON document on stdin:
//!
//! ```text
//! {"tool": {"name": "get_issue"}, "result": {<ticket fields>}}
//! ```
//!
//! Every ticket field is optional. Absent and `null` fields read as empty so
//! classification never fails on a sparse record. The raw `result` value is
//! kept untouched for the session snapshot.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while reading hook input.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    /// Stdin did not hold a JSON document of the expected shape.
    #[error("failed to parse hook input: {0}")]
    InvalidInput(#[source] serde_json::Error),

    /// `result` held something other than a JSON object.
    #[error("ticket record must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },

    /// A known ticket field had the wrong JSON type.
    #[error("malformed ticket record: {0}")]
    Malformed(#[source] serde_json::Error),
}

impl TicketError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> crate::error::ErrorCode {
        match self {
            Self::InvalidInput(_) => crate::error::ErrorCode::InvalidHookInput,
            Self::NotAnObject { .. } | Self::Malformed(_) => {
                crate::error::ErrorCode::MalformedTicket
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Hook input
// ---------------------------------------------------------------------------

/// Name of the tool whose output triggered the hook. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToolInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// The full document read from stdin.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HookInput {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tool: ToolInfo,
    /// Raw ticket record, or `null` when the fetch returned nothing.
    #[serde(default)]
    pub result: Value,
}

impl HookInput {
    /// Parse the stdin document.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::InvalidInput`] if `raw` is not JSON or `tool`
    /// has the wrong shape.
    pub fn from_json(raw: &str) -> Result<Self, TicketError> {
        serde_json::from_str(raw).map_err(TicketError::InvalidInput)
    }

    /// Decode the ticket carried in `result`.
    ///
    /// Returns `Ok(None)` when there is no ticket data at all (`null`, or an
    /// empty object, array, or string).
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::NotAnObject`] for scalar or array payloads and
    /// [`TicketError::Malformed`] when a known field has the wrong type.
    pub fn ticket(&self) -> Result<Option<TicketRecord>, TicketError> {
        match &self.result {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Array(items) if items.is_empty() => Ok(None),
            Value::String(text) if text.is_empty() => Ok(None),
            Value::Object(_) => serde_json::from_value(self.result.clone())
                .map(Some)
                .map_err(TicketError::Malformed),
            other => Err(TicketError::NotAnObject {
                kind: json_kind(other),
            }),
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Ticket record
// ---------------------------------------------------------------------------

/// A project-tracker ticket. Read-only to the hook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketRecord {
    pub title: String,
    pub description: String,
    pub identifier: String,
    pub url: Option<String>,
    pub labels: Vec<Label>,
    pub project: Option<Project>,
    /// Fields the hook does not interpret (state, assignee, ...).
    pub extra: Map<String, Value>,
    /// Keys the record was decoded from, known or not.
    pub present_keys: Vec<String>,
}

impl TicketRecord {
    /// True when the record carries no fields at all.
    ///
    /// A decoded record with any key present is never empty, even when every
    /// value is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present_keys.is_empty()
            && self.title.is_empty()
            && self.description.is_empty()
            && self.identifier.is_empty()
            && self.url.as_deref().is_none_or(str::is_empty)
            && self.labels.is_empty()
            && self.project.is_none()
            && self.extra.is_empty()
    }

    /// Lower-cased label names in ticket order, malformed entries skipped.
    #[must_use]
    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().filter_map(Label::normalized).collect()
    }

    /// Label names as the tracker sent them, malformed entries skipped.
    #[must_use]
    pub fn display_labels(&self) -> Vec<&str> {
        self.labels.iter().filter_map(Label::name).collect()
    }
}

#[derive(Deserialize)]
struct RawTicket {
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    identifier: String,
    #[serde(default, deserialize_with = "string_or_none")]
    url: Option<String>,
    #[serde(default, deserialize_with = "labels_or_empty")]
    labels: Vec<Label>,
    #[serde(default, deserialize_with = "project_or_none")]
    project: Option<Project>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for TicketRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        let present_keys = fields.keys().cloned().collect();
        let raw: RawTicket =
            serde_json::from_value(Value::Object(fields)).map_err(de::Error::custom)?;
        Ok(Self {
            title: raw.title,
            description: raw.description,
            identifier: raw.identifier,
            url: raw.url,
            labels: raw.labels,
            project: raw.project,
            extra: raw.extra,
            present_keys,
        })
    }
}

/// One label entry. Trackers send either bare strings or `{name: ...}` objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Plain(String),
    Named(String),
    /// Anything else; ignored during matching.
    Malformed(Value),
}

impl Label {
    /// Resolve a raw JSON label entry.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Plain(text),
            Value::Object(mut map) => match map.remove("name") {
                Some(Value::String(name)) => Self::Named(name),
                None | Some(Value::Null) => Self::Named(String::new()),
                Some(other) => {
                    map.insert("name".to_string(), other);
                    Self::Malformed(Value::Object(map))
                }
            },
            other => Self::Malformed(other),
        }
    }

    /// Label name as sent, or `None` for malformed entries.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Plain(text) | Self::Named(text) => Some(text),
            Self::Malformed(_) => None,
        }
    }

    /// Lower-cased label name, or `None` for malformed entries.
    #[must_use]
    pub fn normalized(&self) -> Option<String> {
        self.name().map(str::to_lowercase)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Project metadata attached to a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Project {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

// ---------------------------------------------------------------------------
// Lenient field readers
// ---------------------------------------------------------------------------

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        Value::Null => Ok(None),
        other => {
            debug!(kind = json_kind(&other), "ignoring non-string url field");
            Ok(None)
        }
    }
}

fn labels_or_empty<'de, D>(deserializer: D) -> Result<Vec<Label>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.into_iter().map(Label::from_value).collect()),
        Value::Null => Ok(Vec::new()),
        other => {
            debug!(kind = json_kind(&other), "ignoring non-array labels field");
            Ok(Vec::new())
        }
    }
}

fn project_or_none<'de, D>(deserializer: D) -> Result<Option<Project>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) if map.is_empty() => Ok(None),
        value @ Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(de::Error::custom),
        _ => Ok(None),
    }
}
