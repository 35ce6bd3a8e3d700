//! Critic agent: contradictions, overload and knowledge gaps.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::text::clip;
use crate::truth::{EntityType, TruthEntry, TruthStore};

/// Decision keyword pairs that contradict each other.
pub const ANTONYM_PAIRS: [(&str, &str); 4] = [
    ("proceed", "cancel"),
    ("approve", "reject"),
    ("increase", "decrease"),
    ("start", "stop"),
];

pub const POSITIVE_WORDS: [&str; 5] = ["success", "achieved", "completed", "good", "excellent"];
pub const NEGATIVE_WORDS: [&str; 5] = ["failure", "delayed", "cancelled", "bad", "problem"];

/// Default number of relevant changes a person can take in one window.
pub const DEFAULT_OVERLOAD_THRESHOLD: usize = 10;

const MAX_CONFLICTS_SHOWN: usize = 5;
const MAX_GAPS_SHOWN: usize = 5;
const GAP_SCAN_DECISIONS: usize = 10;
const SNIPPET_CHARS: usize = 100;
const SIGNIFICANT_WORD_LEN: usize = 3;
const SHARED_WORDS_FOR_SIMILAR: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    DecisionContradiction,
    TopicContradiction,
}

/// A pair of recent entries that disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    /// e.g. `proceed vs cancel`.
    pub conflict_type: String,
    pub first: String,
    pub second: String,
    pub times: [String; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictReport {
    pub answer: String,
    pub conflicts_found: usize,
    pub conflicts: Vec<Conflict>,
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverloadBreakdown {
    pub decisions: usize,
    pub topics: usize,
    pub other: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverloadReport {
    pub answer: String,
    pub person: String,
    pub is_overloaded: bool,
    pub relevant_changes: usize,
    pub breakdown: OverloadBreakdown,
    pub threshold: usize,
    pub recommendation: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    pub answer: String,
    pub topic: Option<String>,
    pub gaps: Vec<String>,
    /// Entries mentioning the topic; only set for a topic query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_coverage: Option<usize>,
    pub total_decisions: usize,
    pub total_facts: usize,
    pub reasoning: String,
}

/// Read-only view of the truth store that looks for trouble.
#[derive(Debug, Clone, Copy)]
pub struct Critic<'a> {
    truth: &'a TruthStore,
    overload_threshold: usize,
}

impl<'a> Critic<'a> {
    #[must_use]
    pub fn new(truth: &'a TruthStore) -> Self {
        Self {
            truth,
            overload_threshold: DEFAULT_OVERLOAD_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_overload_threshold(mut self, threshold: usize) -> Self {
        self.overload_threshold = threshold;
        self
    }

    /// Contradictions among changes in the last `hours`.
    #[must_use]
    pub fn detect_conflicts(&self, hours: u32) -> ConflictReport {
        self.detect_conflicts_at(Utc::now(), hours)
    }

    /// [`Self::detect_conflicts`] against a fixed clock.
    #[must_use]
    pub fn detect_conflicts_at(&self, now: DateTime<Utc>, hours: u32) -> ConflictReport {
        let recent = self.truth.recent_changes_since(now, hours);
        let of_type = |t: EntityType| {
            recent
                .iter()
                .copied()
                .filter(|e| e.entity_type == t)
                .collect::<Vec<_>>()
        };

        let mut conflicts = contradictory_decisions(&of_type(EntityType::Decision));
        conflicts.extend(contradictory_topics(&of_type(EntityType::Topic)));
        let found = conflicts.len();
        if found > 0 {
            tracing::info!(found, window_hours = hours, "Detected conflicts");
        }
        conflicts.truncate(MAX_CONFLICTS_SHOWN);

        ConflictReport {
            answer: format!("Conflicts detected in last {hours} hours:"),
            conflicts_found: found,
            conflicts,
            reasoning: format!(
                "Analyzed {} recent entries, found {found} potential conflicts",
                recent.len()
            ),
        }
    }

    /// Whether `person` received more relevant changes than the threshold.
    #[must_use]
    pub fn detect_overload(&self, person: &str, hours: u32) -> OverloadReport {
        self.detect_overload_at(Utc::now(), person, hours)
    }

    /// [`Self::detect_overload`] against a fixed clock.
    #[must_use]
    pub fn detect_overload_at(&self, now: DateTime<Utc>, person: &str, hours: u32) -> OverloadReport {
        let recent = self.truth.recent_changes_since(now, hours);
        let needle = person.to_lowercase();
        let relevant: Vec<&TruthEntry> = recent
            .iter()
            .copied()
            .filter(|e| e.mentions(&needle))
            .collect();

        let count = |t: EntityType| relevant.iter().filter(|e| e.entity_type == t).count();
        let decisions = count(EntityType::Decision);
        let topics = count(EntityType::Topic);
        let breakdown = OverloadBreakdown {
            decisions,
            topics,
            other: relevant.len() - decisions - topics,
        };
        let is_overloaded = relevant.len() > self.overload_threshold;
        let recommendation = if is_overloaded {
            "Consider filtering or prioritizing information"
        } else {
            "Information load is manageable"
        };

        OverloadReport {
            answer: format!("Information overload analysis for {person}:"),
            person: person.to_string(),
            is_overloaded,
            relevant_changes: relevant.len(),
            breakdown,
            threshold: self.overload_threshold,
            recommendation: recommendation.to_string(),
            reasoning: format!(
                "Checked {} recent changes against {person}'s information context",
                recent.len()
            ),
        }
    }

    /// Decisions that no fact backs up.
    ///
    /// With a topic, reports a gap when decisions mention it but no fact does.
    /// Without one, checks the ten most recent decisions for a fact sharing
    /// their source event or quoting their content.
    #[must_use]
    pub fn detect_knowledge_gaps(&self, topic: Option<&str>) -> GapReport {
        let decisions = self.truth.get_all_by_type(EntityType::Decision);
        let facts = self.truth.get_all_by_type(EntityType::Fact);

        match topic.map(str::trim).filter(|t| !t.is_empty()) {
            Some(topic) => {
                let needle = topic.to_lowercase();
                let mentions = |e: &&&TruthEntry| e.content.to_lowercase().contains(&needle);
                let topic_decisions = decisions.iter().filter(mentions).count();
                let topic_facts = facts.iter().filter(mentions).count();
                let coverage = self
                    .truth
                    .entries()
                    .iter()
                    .filter(|e| e.content.to_lowercase().contains(&needle))
                    .count();

                let mut gaps = Vec::new();
                if topic_decisions > 0 && topic_facts == 0 {
                    gaps.push(format!(
                        "Decisions exist about '{topic}' but no implementation facts"
                    ));
                }
                GapReport {
                    answer: format!("Knowledge gaps for '{topic}':"),
                    topic: Some(topic.to_string()),
                    gaps,
                    topic_coverage: Some(coverage),
                    total_decisions: decisions.len(),
                    total_facts: facts.len(),
                    reasoning: format!("Analyzed {coverage} entries related to '{topic}'"),
                }
            }
            None => {
                let start = decisions.len().saturating_sub(GAP_SCAN_DECISIONS);
                let gaps: Vec<String> = decisions[start..]
                    .iter()
                    .filter(|d| !has_backing_fact(d, &facts))
                    .map(|d| clip(&d.content, SNIPPET_CHARS))
                    .take(MAX_GAPS_SHOWN)
                    .collect();
                GapReport {
                    answer: "General knowledge gaps:".to_string(),
                    topic: None,
                    gaps,
                    topic_coverage: None,
                    total_decisions: decisions.len(),
                    total_facts: facts.len(),
                    reasoning: format!(
                        "Analyzed {} truth entries for decision-implementation gaps",
                        self.truth.len()
                    ),
                }
            }
        }
    }
}

fn has_backing_fact(decision: &TruthEntry, facts: &[&TruthEntry]) -> bool {
    let content = decision.content.to_lowercase();
    facts.iter().any(|f| {
        f.source_event_id == decision.source_event_id || f.content.to_lowercase().contains(&content)
    })
}

/// First antonym pair that splits `a` and `b`, in either direction.
#[must_use]
pub fn antonym_clash(a: &str, b: &str) -> Option<(&'static str, &'static str)> {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    ANTONYM_PAIRS.iter().copied().find(|(x, y)| {
        (a.contains(x) && b.contains(y)) || (a.contains(y) && b.contains(x))
    })
}

fn contradictory_decisions(decisions: &[&TruthEntry]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, first) in decisions.iter().enumerate() {
        for second in &decisions[i + 1..] {
            if let Some((x, y)) = antonym_clash(&first.content, &second.content) {
                conflicts.push(conflict(
                    ConflictKind::DecisionContradiction,
                    format!("{x} vs {y}"),
                    first,
                    second,
                ));
            }
        }
    }
    conflicts
}

fn contradictory_topics(topics: &[&TruthEntry]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, first) in topics.iter().enumerate() {
        for second in &topics[i + 1..] {
            if topics_similar(&first.content, &second.content)
                && opposite_sentiment(&first.content, &second.content)
            {
                conflicts.push(conflict(
                    ConflictKind::TopicContradiction,
                    "positive vs negative".to_string(),
                    first,
                    second,
                ));
            }
        }
    }
    conflicts
}

fn conflict(
    kind: ConflictKind,
    conflict_type: String,
    first: &TruthEntry,
    second: &TruthEntry,
) -> Conflict {
    Conflict {
        kind,
        conflict_type,
        first: clip(&first.content, SNIPPET_CHARS),
        second: clip(&second.content, SNIPPET_CHARS),
        times: [first.timestamp.clone(), second.timestamp.clone()],
    }
}

/// At least two shared words longer than three characters.
#[must_use]
pub fn topics_similar(a: &str, b: &str) -> bool {
    fn significant(text: &str) -> HashSet<String> {
        text.to_lowercase()
            .split_whitespace()
            .filter(|w| w.chars().count() > SIGNIFICANT_WORD_LEN)
            .map(str::to_string)
            .collect()
    }
    significant(a).intersection(&significant(b)).count() >= SHARED_WORDS_FOR_SIMILAR
}

fn opposite_sentiment(a: &str, b: &str) -> bool {
    let (pos_a, neg_a) = sentiment(a);
    let (pos_b, neg_b) = sentiment(b);
    (pos_a && neg_b) || (neg_a && pos_b)
}

fn sentiment(text: &str) -> (bool, bool) {
    let lower = text.to_lowercase();
    (
        POSITIVE_WORDS.iter().any(|w| lower.contains(w)),
        NEGATIVE_WORDS.iter().any(|w| lower.contains(w)),
    )
}
