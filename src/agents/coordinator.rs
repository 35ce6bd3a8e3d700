//! Coordinator agent: who needs to know, ranked by network position.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::{betweenness_centrality, degree_centrality, KnowledgeGraph, NodeType};

/// Largest candidate set considered for one request.
pub const MAX_CANDIDATES: usize = 20;
/// Degree centrality above which a node counts as an information hub.
pub const HUB_THRESHOLD: f64 = 0.1;
/// Hubs added to every candidate set.
pub const MAX_HUBS: usize = 5;
/// Recommendations returned by [`Coordinator::who_needs_to_know`].
pub const MAX_RECOMMENDATIONS: usize = 10;

const DEGREE_WEIGHT: f64 = 0.4;
const BETWEENNESS_WEIGHT: f64 = 0.4;
const VOLUME_WEIGHT: f64 = 0.2;
const VOLUME_SCALE: f64 = 100.0;

/// One ranked stakeholder with its score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeholderScore {
    pub person: String,
    pub node_type: NodeType,
    pub degree_centrality: f64,
    pub betweenness_centrality: f64,
    /// Weighted degree (in + out).
    pub communication_volume: u64,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StakeholderReport {
    pub answer: String,
    pub mentioned_people: Vec<String>,
    pub recommended_notifications: Vec<StakeholderScore>,
    pub candidates_considered: usize,
    pub reasoning: String,
}

/// How far an amplification should spread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reach {
    Low,
    #[default]
    Medium,
    High,
}

impl Reach {
    /// Audience size cap for this reach.
    #[must_use]
    pub fn limit(self) -> usize {
        match self {
            Self::Low => 5,
            Self::Medium => 15,
            Self::High => 50,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Pick the reach named by a word in `text`, defaulting to medium.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        let has_word = |word: &str| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|token| token == word)
        };
        if has_word("low") {
            Self::Low
        } else if has_word("high") {
            Self::High
        } else {
            Self::Medium
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AmplificationPlan {
    pub answer: String,
    pub reach: Reach,
    pub target_audience_size: usize,
    pub recommended_channels: Vec<String>,
    /// First ten of the target audience.
    pub target_people: Vec<String>,
    pub reasoning: String,
}

const CHANNELS: [&str; 3] = ["email", "team meeting", "dashboard update"];
const MAX_TARGET_SHOWN: usize = 10;

/// Read-only view of the graph answering routing questions.
#[derive(Debug, Clone, Copy)]
pub struct Coordinator<'a> {
    graph: &'a KnowledgeGraph,
}

struct Centralities {
    degree: HashMap<String, f64>,
    betweenness: HashMap<String, f64>,
}

impl Centralities {
    fn compute(graph: &KnowledgeGraph) -> Self {
        Self {
            degree: degree_centrality(graph),
            betweenness: betweenness_centrality(graph),
        }
    }
}

/// Ordered set used to collect candidates without duplicates.
#[derive(Default)]
struct Candidates<'g> {
    order: Vec<&'g str>,
    seen: HashSet<&'g str>,
}

impl<'g> Candidates<'g> {
    fn push(&mut self, id: &'g str) {
        if self.seen.insert(id) {
            self.order.push(id);
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

impl<'a> Coordinator<'a> {
    #[must_use]
    pub fn new(graph: &'a KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Rank the people who should hear about `content`.
    ///
    /// People named in the content seed the search; their direct neighbours
    /// and the graph's hubs are added, then everything is scored.
    #[must_use]
    pub fn who_needs_to_know(&self, content: &str, content_type: &str) -> StakeholderReport {
        let centralities = Centralities::compute(self.graph);
        let mentioned = self.mentioned_people(content);
        let candidates = self.candidates(&mentioned, &centralities);
        let candidates_considered = candidates.len();

        let mut ranked = self.rank(&candidates, &centralities);
        ranked.truncate(MAX_RECOMMENDATIONS);

        tracing::debug!(
            mentioned = mentioned.len(),
            candidates = candidates_considered,
            "Ranked stakeholders"
        );

        StakeholderReport {
            answer: format!("People who need to know about this {content_type}:"),
            mentioned_people: mentioned,
            recommended_notifications: ranked,
            candidates_considered,
            reasoning: format!(
                "Analyzed {} nodes in the communication graph, found {candidates_considered} relevant stakeholders based on content and network topology",
                self.graph.node_count()
            ),
        }
    }

    /// Plan an announcement for the given reach.
    #[must_use]
    pub fn suggest_amplification(&self, content: &str, reach: Reach) -> AmplificationPlan {
        let centralities = Centralities::compute(self.graph);
        let candidates = self.candidates(&[], &centralities);
        let mut target: Vec<String> = self
            .rank(&candidates, &centralities)
            .into_iter()
            .map(|s| s.person)
            .collect();
        target.truncate(reach.limit());
        let target_audience_size = target.len();
        target.truncate(MAX_TARGET_SHOWN);

        tracing::debug!(reach = reach.as_str(), content_len = content.len(), "Planned amplification");

        AmplificationPlan {
            answer: format!("Amplification strategy for {} reach:", reach.as_str()),
            reach,
            target_audience_size,
            recommended_channels: CHANNELS.iter().map(ToString::to_string).collect(),
            target_people: target,
            reasoning: format!(
                "Selected {target_audience_size} people based on communication patterns and content relevance"
            ),
        }
    }

    /// Person node ids that appear (case-insensitively) in `content`.
    #[must_use]
    pub fn mentioned_people(&self, content: &str) -> Vec<String> {
        let content = content.to_lowercase();
        self.graph
            .nodes_of_type(NodeType::Person)
            .filter(|n| !n.id.is_empty() && content.contains(&n.id.to_lowercase()))
            .map(|n| n.id.clone())
            .collect()
    }

    fn candidates(&self, mentioned: &[String], centralities: &Centralities) -> Vec<&'a str> {
        let mut set = Candidates::default();
        for person in mentioned {
            if let Some(node) = self.graph.node(person) {
                set.push(node.id.as_str());
            }
        }
        for person in mentioned {
            for id in self.graph.predecessors(person) {
                set.push(id);
            }
            for id in self.graph.successors(person) {
                set.push(id);
            }
        }
        for hub in self.hubs(centralities) {
            if set.len() >= MAX_CANDIDATES {
                break;
            }
            set.push(hub);
        }
        set.order.truncate(MAX_CANDIDATES);
        set.order
    }

    /// Nodes above the hub threshold, highest centrality first.
    fn hubs(&self, centralities: &Centralities) -> Vec<&'a str> {
        let mut hubs: Vec<(&'a str, f64)> = self
            .graph
            .nodes()
            .iter()
            .filter_map(|n| {
                let c = centralities.degree.get(&n.id).copied().unwrap_or(0.0);
                (c > HUB_THRESHOLD).then_some((n.id.as_str(), c))
            })
            .collect();
        hubs.sort_by(|a, b| b.1.total_cmp(&a.1));
        hubs.into_iter().take(MAX_HUBS).map(|(id, _)| id).collect()
    }

    fn rank(&self, candidates: &[&str], centralities: &Centralities) -> Vec<StakeholderScore> {
        let mut scored: Vec<StakeholderScore> = candidates
            .iter()
            .filter_map(|id| self.graph.node(id))
            .map(|node| {
                let degree = centralities.degree.get(&node.id).copied().unwrap_or(0.0);
                let betweenness = centralities
                    .betweenness
                    .get(&node.id)
                    .copied()
                    .unwrap_or(0.0);
                let volume = self.graph.weighted_degree(&node.id);
                StakeholderScore {
                    person: node.id.clone(),
                    node_type: node.node_type,
                    degree_centrality: degree,
                    betweenness_centrality: betweenness,
                    communication_volume: volume,
                    score: combined_score(degree, betweenness, volume),
                }
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }
}

/// `0.4 * degree + 0.4 * betweenness + 0.2 * min(volume / 100, 1)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn combined_score(degree: f64, betweenness: f64, volume: u64) -> f64 {
    DEGREE_WEIGHT * degree
        + BETWEENNESS_WEIGHT * betweenness
        + VOLUME_WEIGHT * (volume as f64 / VOLUME_SCALE).min(1.0)
}
