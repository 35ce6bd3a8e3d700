//! Memory agent: current truth, recent changes and per-person context.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::truth::{EntityType, TruthEntry, TruthStore};

const MAX_SEARCH_RESULTS: usize = 5;
const LATEST_PER_TYPE: usize = 5;
const MAX_CHANGES_LISTED: usize = 10;
const MAX_CONTEXT_ITEMS: usize = 5;

/// A truth entry as shown to a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruthItem {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub content: String,
    pub timestamp: String,
    pub source: String,
    pub version: u32,
    pub confidence: f64,
}

impl From<&TruthEntry> for TruthItem {
    fn from(entry: &TruthEntry) -> Self {
        Self {
            entity_type: entry.entity_type,
            content: entry.content.clone(),
            timestamp: entry.timestamp.clone(),
            source: entry.source_event_id.clone(),
            version: entry.version,
            confidence: entry.confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentTruth {
    pub answer: String,
    pub results: Vec<TruthItem>,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub total_changes: usize,
    pub new_decisions: usize,
    pub new_topics: usize,
    pub new_facts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub answer: String,
    pub summary: ChangeSummary,
    /// Newest first, at most ten.
    pub changes: Vec<TruthItem>,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonContext {
    pub answer: String,
    pub person: String,
    pub relevant_truth: Vec<TruthItem>,
    pub recent_changes: Vec<TruthItem>,
    pub reasoning: String,
}

/// Read-only view of the truth store answering memory questions.
#[derive(Debug, Clone, Copy)]
pub struct MemoryAgent<'a> {
    truth: &'a TruthStore,
}

impl<'a> MemoryAgent<'a> {
    #[must_use]
    pub fn new(truth: &'a TruthStore) -> Self {
        Self { truth }
    }

    /// Search results for `query`, or the latest decisions and topics when
    /// the query is blank.
    #[must_use]
    pub fn current_truth(&self, query: &str) -> CurrentTruth {
        let total = self.truth.len();
        let query = query.trim();

        if query.is_empty() {
            let decisions = self.truth.get_all_by_type(EntityType::Decision);
            let topics = self.truth.get_all_by_type(EntityType::Topic);
            let results = last_n(&decisions, LATEST_PER_TYPE)
                .iter()
                .chain(last_n(&topics, LATEST_PER_TYPE))
                .map(|e| TruthItem::from(*e))
                .collect();
            return CurrentTruth {
                answer: "Current organizational truth:".to_string(),
                results,
                reasoning: format!(
                    "Retrieved {} decisions and {} topics from truth store",
                    decisions.len(),
                    topics.len()
                ),
            };
        }

        let results: Vec<TruthItem> = self
            .truth
            .search(query, MAX_SEARCH_RESULTS)
            .into_iter()
            .map(TruthItem::from)
            .collect();
        if results.is_empty() {
            CurrentTruth {
                answer: format!("No current truth found for '{query}'"),
                results,
                reasoning: format!("Searched {total} truth entries, no matches found"),
            }
        } else {
            CurrentTruth {
                answer: format!("Current truth about '{query}':"),
                reasoning: format!(
                    "Searched {total} truth entries, found {} matches",
                    results.len()
                ),
                results,
            }
        }
    }

    /// Changes in the last `hours`, counted by type.
    #[must_use]
    pub fn what_changed(&self, hours: u32) -> ChangeReport {
        self.what_changed_at(Utc::now(), hours)
    }

    /// [`Self::what_changed`] against a fixed clock.
    #[must_use]
    pub fn what_changed_at(&self, now: DateTime<Utc>, hours: u32) -> ChangeReport {
        let changes = self.truth.recent_changes_since(now, hours);
        let count = |t: EntityType| changes.iter().filter(|e| e.entity_type == t).count();
        let summary = ChangeSummary {
            total_changes: changes.len(),
            new_decisions: count(EntityType::Decision),
            new_topics: count(EntityType::Topic),
            new_facts: count(EntityType::Fact),
        };

        ChangeReport {
            answer: format!("Changes in the last {hours} hours:"),
            reasoning: format!(
                "Scanned {} truth entries, found {} recent changes",
                self.truth.len(),
                summary.total_changes
            ),
            summary,
            changes: changes
                .iter()
                .take(MAX_CHANGES_LISTED)
                .map(|e| TruthItem::from(*e))
                .collect(),
        }
    }

    /// Entries that mention `person`, plus their recent changes.
    #[must_use]
    pub fn context_for(&self, person: &str, hours: u32) -> PersonContext {
        self.context_for_at(Utc::now(), person, hours)
    }

    /// [`Self::context_for`] against a fixed clock.
    #[must_use]
    pub fn context_for_at(&self, now: DateTime<Utc>, person: &str, hours: u32) -> PersonContext {
        let person = person.trim();
        if person.is_empty() {
            return PersonContext {
                answer: "No person given".to_string(),
                person: String::new(),
                relevant_truth: Vec::new(),
                recent_changes: Vec::new(),
                reasoning: "Query named no person to build context for".to_string(),
            };
        }

        let needle = person.to_lowercase();
        let relevant: Vec<&TruthEntry> = self
            .truth
            .entries()
            .iter()
            .filter(|e| e.mentions(&needle))
            .collect();
        let recent: Vec<&TruthEntry> = self
            .truth
            .recent_changes_since(now, hours)
            .into_iter()
            .filter(|e| e.mentions(&needle))
            .collect();

        PersonContext {
            answer: format!("Context for {person}:"),
            person: person.to_string(),
            reasoning: format!(
                "Found {} relevant entries and {} recent changes",
                relevant.len(),
                recent.len()
            ),
            relevant_truth: relevant
                .iter()
                .take(MAX_CONTEXT_ITEMS)
                .map(|e| TruthItem::from(*e))
                .collect(),
            recent_changes: recent
                .iter()
                .take(MAX_CONTEXT_ITEMS)
                .map(|e| TruthItem::from(*e))
                .collect(),
        }
    }
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}
