//! Session and artifact records
//!
//! Field names on disk are fixed and lower_snake_case. Unknown keys are
//! ignored, missing keys fall back to empty values.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Maximum summary length, counted in characters
pub const MAX_SUMMARY_LENGTH: usize = 150;

/// One development session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default = "epoch", with = "timestamp")]
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub session_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub files_changed: Vec<FileChange>,
    /// Older flat-layout sessions call this list `docs`
    #[serde(default, alias = "docs", deserialize_with = "lenient::list")]
    pub artifacts: Vec<ArtifactRef>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub related_sessions: Vec<String>,
    #[serde(skip)]
    pub body: String,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            timestamp: epoch(),
            session_id: String::new(),
            summary: String::new(),
            tags: Vec::new(),
            files_changed: Vec::new(),
            artifacts: Vec::new(),
            related_sessions: Vec::new(),
            body: String::new(),
        }
    }
}

impl Session {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a related session id unless it is already present.
    /// Returns true when the list changed.
    pub fn add_related(&mut self, id: &str) -> bool {
        if id == self.session_id || self.related_sessions.iter().any(|r| r == id) {
            return false;
        }
        self.related_sessions.push(id.to_string());
        true
    }

    /// Insert or replace the reference with the same path
    pub fn upsert_artifact_ref(&mut self, artifact_ref: ArtifactRef) {
        match self
            .artifacts
            .iter_mut()
            .find(|a| a.path == artifact_ref.path)
        {
            Some(existing) => *existing = artifact_ref,
            None => self.artifacts.push(artifact_ref),
        }
    }

    /// One-line description for listings: the summary, else the first body line
    pub fn summary_line(&self) -> String {
        let summary = self.summary.trim();
        if !summary.is_empty() {
            return summary.to_string();
        }
        self.body
            .lines()
            .map(|l| l.trim().trim_start_matches('#').trim())
            .find(|l| !l.is_empty())
            .map(|l| l.to_string())
            .unwrap_or_else(|| "(no summary)".to_string())
    }
}

/// A file touched during a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    #[serde(default, deserialize_with = "lenient::string")]
    pub path: String,
    #[serde(default)]
    pub action: FileAction,
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
}

/// What happened to a file. Values outside the known set are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FileAction {
    Added,
    Modified,
    Deleted,
    Renamed,
    Other(String),
    #[default]
    Unset,
}

impl FileAction {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" => FileAction::Unset,
            "added" => FileAction::Added,
            "modified" => FileAction::Modified,
            "deleted" => FileAction::Deleted,
            "renamed" => FileAction::Renamed,
            other => FileAction::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FileAction::Added => "added",
            FileAction::Modified => "modified",
            FileAction::Deleted => "deleted",
            FileAction::Renamed => "renamed",
            FileAction::Other(s) => s,
            FileAction::Unset => "",
        }
    }
}

impl Serialize for FileAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FileAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient::string(deserializer)?;
        Ok(FileAction::parse(&raw))
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A session's pointer to one of its artifacts.
/// `kind` and `summary` duplicate the artifact's own values and may drift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    #[serde(default, deserialize_with = "lenient::string")]
    pub path: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
}

/// A deep-dive document attached to a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(default)]
    pub status: ArtifactStatus,
    #[serde(default, deserialize_with = "lenient::string")]
    pub supersedes: String,
    #[serde(skip)]
    pub body: String,
}

/// Lifecycle of an artifact. Transitions are always user driven.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ArtifactStatus {
    Draft,
    Accepted,
    Superseded,
    Deprecated,
    /// Any status outside the known set, kept verbatim
    Other(String),
    #[default]
    Unset,
}

impl ArtifactStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" => ArtifactStatus::Unset,
            "draft" => ArtifactStatus::Draft,
            "accepted" => ArtifactStatus::Accepted,
            "superseded" => ArtifactStatus::Superseded,
            "deprecated" => ArtifactStatus::Deprecated,
            other => ArtifactStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ArtifactStatus::Draft => "draft",
            ArtifactStatus::Accepted => "accepted",
            ArtifactStatus::Superseded => "superseded",
            ArtifactStatus::Deprecated => "deprecated",
            ArtifactStatus::Other(s) => s,
            ArtifactStatus::Unset => "",
        }
    }

    /// Superseded and deprecated artifacts are stale
    pub fn is_stale(&self) -> bool {
        matches!(self, ArtifactStatus::Superseded | ArtifactStatus::Deprecated)
    }

    /// Single-character marker used by `sessions status`
    pub fn indicator(&self) -> &'static str {
        match self {
            ArtifactStatus::Accepted => "+",
            ArtifactStatus::Draft => "~",
            ArtifactStatus::Superseded => "!",
            ArtifactStatus::Deprecated => "x",
            ArtifactStatus::Other(_) | ArtifactStatus::Unset => "?",
        }
    }
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ArtifactStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ArtifactStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = lenient::string(deserializer)?;
        Ok(ArtifactStatus::parse(&raw))
    }
}

/// Why a summary failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryIssue {
    Missing,
    TooLong,
}

impl SummaryIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryIssue::Missing => "missing",
            SummaryIssue::TooLong => "too long",
        }
    }
}

impl fmt::Display for SummaryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A summary must be non-blank and at most [`MAX_SUMMARY_LENGTH`] characters
pub fn check_summary(summary: &str) -> Option<SummaryIssue> {
    let summary = summary.trim();
    if summary.is_empty() {
        Some(SummaryIssue::Missing)
    } else if summary.chars().count() > MAX_SUMMARY_LENGTH {
        Some(SummaryIssue::TooLong)
    } else {
        None
    }
}

fn epoch() -> DateTime<FixedOffset> {
    DateTime::UNIX_EPOCH.fixed_offset()
}

/// RFC 3339 timestamps with an explicit numeric offset (never `Z`)
pub mod timestamp {
    use super::*;
    use serde::de::Error;

    pub fn format(ts: &DateTime<FixedOffset>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
    }

    pub fn serialize<S: Serializer>(
        ts: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let raw = super::lenient::string(deserializer)?;
        if raw.is_empty() {
            return Ok(super::epoch());
        }
        DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| D::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
    }
}

/// Deserializers that accept hand-written YAML: numbers where strings are
/// expected, `null` where a value or list is expected.
mod lenient {
    use serde::de::{DeserializeOwned, Error};
    use serde::{Deserialize, Deserializer};
    use serde_yaml::Value;

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = Value::deserialize(deserializer)?;
        scalar_to_string(value).map_err(D::Error::custom)
    }

    pub fn string_list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Vec::new()),
            Value::Sequence(items) => items
                .into_iter()
                .map(|v| scalar_to_string(v).map_err(D::Error::custom))
                .collect(),
            other => scalar_to_string(other)
                .map(|s| vec![s])
                .map_err(D::Error::custom),
        }
    }

    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let items: Option<Vec<T>> = Option::deserialize(deserializer)?;
        Ok(items.unwrap_or_default())
    }

    fn scalar_to_string(value: Value) -> Result<String, String> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(format!("expected a scalar, found {:?}", other)),
        }
    }
}
