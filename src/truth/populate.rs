//! Seed the truth store from enriched events.

use chrono::Utc;

use super::entry::{EntityType, TruthEntry};
use super::error::TruthError;
use super::store::TruthStore;
use crate::events::EnrichedEvent;
use crate::text::content_hash;

pub const TOPIC_CONFIDENCE: f64 = 0.7;
pub const DECISION_CONFIDENCE: f64 = 0.8;
pub const FACT_CONFIDENCE: f64 = 0.9;

/// Truth entries derived from one event: its topics, its decisions, and one
/// involvement fact per email-like entity.
///
/// Ids are scoped to the event, so the same topic seen in two events yields
/// two entries rather than two versions.
#[must_use]
pub fn entries_for_event(event: &EnrichedEvent, fallback_timestamp: &str) -> Vec<TruthEntry> {
    let timestamp = if event.timestamp.trim().is_empty() {
        fallback_timestamp
    } else {
        event.timestamp.as_str()
    };
    let event_id = event.event_id.as_str();
    let non_blank = |s: &&String| !s.trim().is_empty();

    let topics = event.topics.iter().filter(non_blank).map(|topic| {
        TruthEntry::new(
            format!("topic_{}_{event_id}", content_hash(topic)),
            topic.as_str(),
            EntityType::Topic,
            timestamp,
            event_id,
        )
        .with_confidence(TOPIC_CONFIDENCE)
    });
    let decisions = event.decisions.iter().filter(non_blank).map(|decision| {
        TruthEntry::new(
            format!("decision_{}_{event_id}", content_hash(decision)),
            decision.as_str(),
            EntityType::Decision,
            timestamp,
            event_id,
        )
        .with_confidence(DECISION_CONFIDENCE)
    });
    let facts = event
        .entities_mentioned
        .iter()
        .filter(|entity| entity.contains('@'))
        .map(|entity| {
            TruthEntry::new(
                format!("fact_{entity}_{event_id}"),
                format!("{entity} involved in communication"),
                EntityType::Fact,
                timestamp,
                event_id,
            )
            .with_confidence(FACT_CONFIDENCE)
        });

    topics.chain(decisions).chain(facts).collect()
}

/// Add the entries of every event to `store`, saving once.
///
/// Returns the number of entries added.
///
/// # Errors
///
/// Returns `TruthError` if the snapshot cannot be written.
pub fn populate_from_events(
    events: &[EnrichedEvent],
    store: &mut TruthStore,
) -> Result<usize, TruthError> {
    let now = Utc::now().to_rfc3339();
    let entries: Vec<TruthEntry> = events
        .iter()
        .flat_map(|event| entries_for_event(event, &now))
        .collect();
    let added = store.extend(entries)?.len();
    tracing::info!(events = events.len(), added, "Populated truth store");
    Ok(added)
}
