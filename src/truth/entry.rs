//! Versioned truth entries.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of fact held in the truth store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Decision,
    Topic,
    Fact,
}

impl EntityType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Topic => "topic",
            Self::Fact => "fact",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single versioned fact.
///
/// Successor versions get the id `{logical_id}_v{version}` and point back at
/// the entry they replace through `previous_version_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthEntry {
    #[serde(default)]
    pub id: String,
    pub content: String,
    pub entity_type: EntityType,
    /// ISO 8601 timestamp as received.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub source_event_id: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub previous_version_id: Option<String>,
    /// Confidence in `[0, 1]`.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

const fn default_version() -> u32 {
    1
}

const fn default_confidence() -> f64 {
    1.0
}

impl TruthEntry {
    /// Create a first-version entry with full confidence.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        entity_type: EntityType,
        timestamp: impl Into<String>,
        source_event_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            entity_type,
            timestamp: timestamp.into(),
            source_event_id: source_event_id.into(),
            version: 1,
            previous_version_id: None,
            confidence: 1.0,
            metadata: serde_json::Map::new(),
        }
    }

    /// Set the confidence, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Add a metadata key.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Derive the entry that supersedes `previous`.
    ///
    /// `self.id` is taken as the logical id; the result carries the next
    /// version number, the versioned id and a link back to `previous`.
    #[must_use]
    pub fn successor_of(self, previous: &TruthEntry) -> Self {
        let version = previous.version + 1;
        Self {
            id: versioned_id(&self.id, version),
            version,
            previous_version_id: Some(previous.id.clone()),
            ..self
        }
    }

    /// Parsed timestamp, `None` when it cannot be read.
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    /// Case-insensitive substring test over content or source event id.
    #[must_use]
    pub fn mentions(&self, needle_lower: &str) -> bool {
        self.content.to_lowercase().contains(needle_lower)
            || self.source_event_id.to_lowercase().contains(needle_lower)
    }
}

/// Id of version `version` of a logical id.
#[must_use]
pub fn versioned_id(logical_id: &str, version: u32) -> String {
    format!("{logical_id}_v{version}")
}

/// Parse an ISO 8601 timestamp.
///
/// Offsets (including `Z`) are honored; naive date-times and bare dates are
/// read as UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
