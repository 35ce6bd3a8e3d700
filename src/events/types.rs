//! Event types and the enriched-events file reader.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// Sender/receiver placeholder written by the parsers when an address is missing.
pub const UNKNOWN_PARTICIPANT: &str = "unknown";

/// A communication event enriched with extracted topics, decisions and entities.
///
/// Every field tolerates being absent or `null`; missing values become empty
/// and simply contribute nothing downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub receiver_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub decisions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities_mentioned: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl EnrichedEvent {
    /// Whether both participants are real addresses, i.e. the event can carry
    /// a communication edge.
    #[must_use]
    pub fn has_participants(&self) -> bool {
        is_participant(&self.sender_id) && is_participant(&self.receiver_id)
    }
}

/// A single new event submitted through the ingestion interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub receiver_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub decisions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
}

impl IngestEvent {
    /// Text used to look up stakeholders for this event.
    #[must_use]
    pub fn content(&self) -> String {
        format!("{} {}", self.subject, self.body)
    }

    /// View this event in the enriched shape used by the graph builder.
    #[must_use]
    pub fn to_enriched(&self) -> EnrichedEvent {
        EnrichedEvent {
            event_id: self.event_id.clone(),
            sender_id: self.sender_id.clone(),
            receiver_id: self.receiver_id.clone(),
            timestamp: self.timestamp.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
            thread_id: None,
            topics: self.topics.clone(),
            decisions: self.decisions.clone(),
            entities_mentioned: Vec::new(),
            summary: None,
        }
    }
}

/// Whether an id names a real participant.
#[must_use]
pub fn is_participant(id: &str) -> bool {
    !id.is_empty() && id != UNKNOWN_PARTICIPANT
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Errors from reading an events file.
#[derive(Debug, thiserror::Error)]
pub enum EventsError {
    #[error("Failed to read events file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Events file {path} is not a JSON list: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Read a JSON list of enriched events.
///
/// Individual malformed elements are skipped with a warning.
///
/// # Errors
///
/// Returns `EventsError` if the file cannot be read or is not a JSON list.
pub fn load_events(path: &Path) -> Result<Vec<EnrichedEvent>, EventsError> {
    let content = std::fs::read_to_string(path).map_err(|e| EventsError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_events(&content).map_err(|e| EventsError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parse a JSON list of enriched events, skipping malformed elements.
///
/// # Errors
///
/// Returns an error if the text is not a JSON list.
pub fn parse_events(content: &str) -> Result<Vec<EnrichedEvent>, serde_json::Error> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(content)?;
    let total = raw.len();
    let events: Vec<EnrichedEvent> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed event");
                None
            }
        })
        .collect();
    tracing::debug!(total, parsed = events.len(), "Parsed events");
    Ok(events)
}
