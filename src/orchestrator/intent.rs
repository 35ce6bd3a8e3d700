//! Query intent classification.
//!
//! Intents are matched by keyword against an ordered rule table; the first
//! rule whose predicate holds decides the intent.

use serde::Serialize;

use crate::agents::Reach;

/// Agent responsible for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgentKind {
    #[serde(rename = "Memory Agent")]
    Memory,
    #[serde(rename = "Coordinator Agent")]
    Coordinator,
    #[serde(rename = "Critic Agent")]
    Critic,
    #[serde(rename = "General")]
    General,
}

impl AgentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "Memory Agent",
            Self::Coordinator => "Coordinator Agent",
            Self::Critic => "Critic Agent",
            Self::General => "General",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a query asks for, with the arguments pulled out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    WhatChanged,
    CurrentTruth,
    WhoNeedsToKnow { content: String },
    ContextFor { person: String },
    Conflicts,
    Overload { person: String },
    KnowledgeGaps { topic: Option<String> },
    SearchTruth { query: String },
    Notify { content: String },
    ProblemCheck,
    Amplify { content: String, reach: Reach },
    Help,
}

impl Intent {
    /// Classify a free-text query.
    #[must_use]
    pub fn classify(query: &str) -> Self {
        let lower = query.to_ascii_lowercase();
        RULES
            .iter()
            .find(|rule| (rule.matches)(&lower))
            .map_or(Self::Help, |rule| (rule.build)(query))
    }

    /// Stable name used in responses and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::WhatChanged => "what_changed",
            Self::CurrentTruth => "current_truth",
            Self::WhoNeedsToKnow { .. } => "who_needs_to_know",
            Self::ContextFor { .. } => "context_for",
            Self::Conflicts => "conflicts",
            Self::Overload { .. } => "overload",
            Self::KnowledgeGaps { .. } => "knowledge_gaps",
            Self::SearchTruth { .. } => "search_truth",
            Self::Notify { .. } => "notify",
            Self::ProblemCheck => "problem_check",
            Self::Amplify { .. } => "amplify",
            Self::Help => "help",
        }
    }

    #[must_use]
    pub fn agent(&self) -> AgentKind {
        match self {
            Self::WhatChanged
            | Self::CurrentTruth
            | Self::ContextFor { .. }
            | Self::SearchTruth { .. } => AgentKind::Memory,
            Self::WhoNeedsToKnow { .. } | Self::Notify { .. } | Self::Amplify { .. } => {
                AgentKind::Coordinator
            }
            Self::Conflicts
            | Self::Overload { .. }
            | Self::KnowledgeGaps { .. }
            | Self::ProblemCheck => AgentKind::Critic,
            Self::Help => AgentKind::General,
        }
    }
}

struct Rule {
    /// Tested against the ASCII-lowercased query.
    matches: fn(&str) -> bool,
    /// Receives the query as typed.
    build: fn(&str) -> Intent,
}

const RULES: &[Rule] = &[
    Rule {
        matches: |q| q.contains("what changed"),
        build: |_| Intent::WhatChanged,
    },
    Rule {
        matches: |q| q.contains("what is the current truth"),
        build: |_| Intent::CurrentTruth,
    },
    Rule {
        matches: |q| q.contains(WHO_NEEDS_TO_KNOW),
        build: |q| Intent::WhoNeedsToKnow {
            content: remove_phrase(q, WHO_NEEDS_TO_KNOW).replace('?', "").trim().to_string(),
        },
    },
    Rule {
        matches: |q| q.contains("context for"),
        build: |q| Intent::ContextFor {
            person: person_after_for(q),
        },
    },
    Rule {
        matches: |q| q.contains("conflict") || q.contains("contradiction"),
        build: |_| Intent::Conflicts,
    },
    Rule {
        matches: |q| q.contains("overload"),
        build: |q| Intent::Overload {
            person: first_address(q),
        },
    },
    Rule {
        matches: |q| q.contains("gap"),
        build: |q| Intent::KnowledgeGaps {
            topic: gap_topic(q),
        },
    },
    Rule {
        matches: |q| q.contains("decision") || q.contains("truth"),
        build: |q| Intent::SearchTruth {
            query: q.to_string(),
        },
    },
    Rule {
        matches: |q| q.contains("notify") || q.contains("tell"),
        build: |q| Intent::Notify {
            content: q.to_string(),
        },
    },
    Rule {
        matches: |q| q.contains("problem") || q.contains("issue"),
        build: |_| Intent::ProblemCheck,
    },
    Rule {
        matches: |q| q.contains("amplif") || q.contains("broadcast"),
        build: |q| Intent::Amplify {
            content: q.to_string(),
            reach: Reach::from_text(q),
        },
    },
];

const WHO_NEEDS_TO_KNOW: &str = "who needs to know";
const PUNCTUATION: &[char] = &['?', '.', ',', '!', ';', ':'];

/// Remove every ASCII case-insensitive occurrence of `phrase`.
fn remove_phrase(text: &str, phrase: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut rest = 0;
    for (start, _) in lower.match_indices(phrase) {
        out.push_str(&text[rest..start]);
        rest = start + phrase.len();
    }
    out.push_str(&text[rest..]);
    out
}

/// Token following the word "for", without trailing punctuation.
fn person_after_for(query: &str) -> String {
    let mut tokens = query.split_whitespace();
    tokens
        .by_ref()
        .find(|t| t.eq_ignore_ascii_case("for"))
        .and_then(|_| tokens.next())
        .map(|t| t.trim_matches(PUNCTUATION).to_string())
        .unwrap_or_default()
}

/// First token containing `@`, or `unknown`.
fn first_address(query: &str) -> String {
    query
        .split_whitespace()
        .find(|t| t.contains('@'))
        .map_or_else(
            || crate::events::UNKNOWN_PARTICIPANT.to_string(),
            |t| t.trim_end_matches(PUNCTUATION).to_string(),
        )
}

const GAP_PREPOSITIONS: &[&str] = &["for", "in", "on", "about", "around", "regarding"];
const GAP_FILLER: &[&str] = &[
    "knowledge", "what", "are", "the", "there", "any", "show", "me", "find", "list", "identify",
];

/// Topic named around the gap keyword, if any.
///
/// `knowledge gaps in marketing` and `marketing knowledge gaps?` both give
/// `marketing`; `any knowledge gaps?` gives none.
fn gap_topic(query: &str) -> Option<String> {
    let tokens: Vec<&str> = query
        .split_whitespace()
        .map(|t| t.trim_matches(PUNCTUATION))
        .filter(|t| !t.is_empty())
        .collect();
    let gap_at = tokens
        .iter()
        .position(|t| t.to_ascii_lowercase().starts_with("gap"))?;

    let mut after = &tokens[gap_at + 1..];
    if let Some(first) = after.first() {
        if GAP_PREPOSITIONS.contains(&first.to_ascii_lowercase().as_str()) {
            after = &after[1..];
        }
    }
    let words: Vec<&str> = if after.is_empty() {
        tokens[..gap_at]
            .iter()
            .copied()
            .filter(|t| !GAP_FILLER.contains(&t.to_ascii_lowercase().as_str()))
            .collect()
    } else {
        after.to_vec()
    };

    let topic = words.join(" ");
    (!topic.is_empty()).then_some(topic)
}
