//! Query routing and event ingestion.
//!
//! The orchestrator owns one graph and one truth store, classifies each query
//! into an [`Intent`], hands it to the matching agent and wraps the result in a
//! [`QueryResponse`].

mod error;
mod intent;
mod response;

use std::path::PathBuf;

use chrono::Utc;

pub use error::OrchestratorError;
pub use intent::*;
pub use response::*;

use crate::agents::{Coordinator, Critic, MemoryAgent};
use crate::config::{AnalysisConfig, PathsConfig};
use crate::events::IngestEvent;
use crate::graph::KnowledgeGraph;
use crate::text::content_id;
use crate::truth::{EntityType, TruthEntry, TruthStore, VersionHistory};

/// Confidence of decisions submitted through ingestion.
pub const INGEST_DECISION_CONFIDENCE: f64 = 0.8;
/// Confidence of topics submitted through ingestion.
pub const INGEST_TOPIC_CONFIDENCE: f64 = 0.7;
/// Recommendations returned with an ingestion summary.
pub const INGEST_RECOMMENDATIONS: usize = 5;

/// Routes queries to the agents and applies new events.
#[derive(Debug)]
pub struct Orchestrator {
    graph: KnowledgeGraph,
    truth: TruthStore,
    graph_path: Option<PathBuf>,
    analysis: AnalysisConfig,
}

impl Orchestrator {
    /// Wrap an already loaded graph and truth store.
    #[must_use]
    pub fn new(graph: KnowledgeGraph, truth: TruthStore) -> Self {
        Self {
            graph,
            truth,
            graph_path: None,
            analysis: AnalysisConfig::default(),
        }
    }

    /// Load both snapshots, starting empty where a file is missing or corrupt.
    ///
    /// Ingested events are written back to the same graph path.
    #[must_use]
    pub fn open(paths: &PathsConfig) -> Self {
        let graph = KnowledgeGraph::load_or_empty(&paths.graph);
        let truth = TruthStore::open(&paths.truth);
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            truth_entries = truth.len(),
            "Orchestrator ready"
        );
        Self {
            graph_path: Some(paths.graph.clone()),
            ..Self::new(graph, truth)
        }
    }

    #[must_use]
    pub fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }

    #[must_use]
    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    #[must_use]
    pub fn truth(&self) -> &TruthStore {
        &self.truth
    }

    #[must_use]
    pub fn analysis(&self) -> &AnalysisConfig {
        &self.analysis
    }

    #[must_use]
    pub fn memory(&self) -> MemoryAgent<'_> {
        MemoryAgent::new(&self.truth)
    }

    #[must_use]
    pub fn coordinator(&self) -> Coordinator<'_> {
        Coordinator::new(&self.graph)
    }

    #[must_use]
    pub fn critic(&self) -> Critic<'_> {
        Critic::new(&self.truth).with_overload_threshold(self.analysis.overload_threshold)
    }

    /// Version chain of a logical truth id, newest first.
    #[must_use]
    pub fn history(&self, logical_id: &str) -> VersionHistory {
        self.truth.history(logical_id)
    }

    /// Answer a free-text query.
    #[must_use]
    pub fn process_query(&self, query: &str) -> QueryResponse {
        let intent = Intent::classify(query);
        tracing::debug!(intent = intent.name(), agent = %intent.agent(), "Routing query");

        let orchestration = Orchestration {
            query: query.to_string(),
            agent_used: intent.agent().as_str().to_string(),
            intent: intent.name().to_string(),
            graph_nodes: self.graph.node_count(),
            graph_edges: self.graph.edge_count(),
            truth_entries: self.truth.len(),
        };
        self.dispatch(intent).routed(orchestration)
    }

    fn dispatch(&self, intent: Intent) -> QueryResponse {
        let window = self.analysis.window_hours;
        match intent {
            Intent::WhatChanged => self.memory().what_changed(window).into(),
            Intent::CurrentTruth => self.memory().current_truth("").into(),
            Intent::SearchTruth { query } => self.memory().current_truth(&query).into(),
            Intent::ContextFor { person } => self
                .memory()
                .context_for(&person, self.analysis.context_window_hours)
                .into(),
            Intent::WhoNeedsToKnow { content } | Intent::Notify { content } => self
                .coordinator()
                .who_needs_to_know(&content, "general")
                .into(),
            Intent::Amplify { content, reach } => self
                .coordinator()
                .suggest_amplification(&content, reach)
                .into(),
            Intent::Conflicts | Intent::ProblemCheck => {
                self.critic().detect_conflicts(window).into()
            }
            Intent::Overload { person } => self.critic().detect_overload(&person, window).into(),
            Intent::KnowledgeGaps { topic } => {
                self.critic().detect_knowledge_gaps(topic.as_deref()).into()
            }
            Intent::Help => QueryResponse::help(),
        }
    }

    /// Apply one new event: store its decisions and topics, fold it into the
    /// graph, then report who should hear about it and how many conflicts the
    /// store now holds.
    ///
    /// # Errors
    ///
    /// Returns `OrchestratorError::Truth` if the entries cannot be stored. No
    /// entry is kept and the graph is left untouched in that case.
    pub fn simulate_event_update(
        &mut self,
        mut event: IngestEvent,
    ) -> Result<IngestSummary, OrchestratorError> {
        if event.event_id.trim().is_empty() {
            event.event_id = uuid::Uuid::new_v4().to_string();
        }
        if event.timestamp.trim().is_empty() {
            event.timestamp = Utc::now().to_rfc3339();
        }

        let entries_created: Vec<String> = self
            .truth
            .extend(ingest_entries(&event))?
            .into_iter()
            .map(|stored| stored.id)
            .collect();

        let graph_updated = !event.sender_id.is_empty() || !event.receiver_id.is_empty();
        if graph_updated {
            self.graph.absorb_event(&event.to_enriched());
            if let Err(e) = self.save_graph() {
                tracing::warn!(error = %e, "Graph snapshot not updated after ingestion");
            }
        }

        let mut recommendations = self
            .coordinator()
            .who_needs_to_know(&event.content(), "event")
            .recommended_notifications;
        recommendations.truncate(INGEST_RECOMMENDATIONS);
        let conflicts_found = self
            .critic()
            .detect_conflicts(self.analysis.window_hours)
            .conflicts_found;

        tracing::info!(
            event_id = %event.event_id,
            entries = entries_created.len(),
            conflicts_found,
            graph_updated,
            "Ingested event"
        );

        Ok(IngestSummary {
            answer: "Event processed and knowledge updated:".to_string(),
            reasoning: format!(
                "Processed event with {} decisions and {} topics",
                event.decisions.len(),
                event.topics.len()
            ),
            event_id: event.event_id,
            entries_created,
            recommendations,
            conflicts_found,
            graph_updated,
        })
    }

    /// Write the graph to its snapshot path, if it has one.
    ///
    /// # Errors
    ///
    /// Returns `OrchestratorError::Graph` if the snapshot cannot be written.
    pub fn save_graph(&self) -> Result<(), OrchestratorError> {
        if let Some(path) = &self.graph_path {
            self.graph.save(path)?;
        }
        Ok(())
    }
}

/// Truth entries for the decisions and topics of an ingested event.
///
/// Ids are content-addressed without the event id, so the same decision
/// arriving again becomes a new version of the existing entry.
fn ingest_entries(event: &IngestEvent) -> Vec<TruthEntry> {
    let kinds = [
        (&event.decisions, EntityType::Decision, INGEST_DECISION_CONFIDENCE),
        (&event.topics, EntityType::Topic, INGEST_TOPIC_CONFIDENCE),
    ];
    kinds
        .into_iter()
        .flat_map(|(items, entity_type, confidence)| {
            items
                .iter()
                .filter(|text| !text.trim().is_empty())
                .map(move |text| {
                    TruthEntry::new(
                        content_id(entity_type.as_str(), text),
                        text.as_str(),
                        entity_type,
                        event.timestamp.as_str(),
                        event.event_id.as_str(),
                    )
                    .with_confidence(confidence)
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeType};
    use chrono::Duration;

    fn recent(hours: i64) -> String {
        (Utc::now() - Duration::hours(hours)).to_rfc3339()
    }

    fn seeded() -> Orchestrator {
        let mut truth = TruthStore::in_memory();
        truth
            .extend(vec![
                TruthEntry::new("d1", "Proceed with launch", EntityType::Decision, recent(1), "e1"),
                TruthEntry::new("d2", "Cancel launch", EntityType::Decision, recent(2), "e2"),
                TruthEntry::new("d3", "Hire designer", EntityType::Decision, recent(3), "e3"),
                TruthEntry::new("t1", "launch", EntityType::Topic, recent(1), "e1"),
                TruthEntry::new("t2", "hiring", EntityType::Topic, recent(4), "e3"),
            ])
            .unwrap();

        let mut graph = KnowledgeGraph::new();
        graph.add_edge(Edge::new("alice@x.com", "bob@x.com", EdgeType::CommunicatesWith, 4));
        graph.add_edge(Edge::new("bob@x.com", "carol@x.com", EdgeType::CommunicatesWith, 2));
        Orchestrator::new(graph, truth)
    }

    #[test]
    fn test_what_changed_today() {
        let response = seeded().process_query("what changed today?");
        let summary = response.summary.unwrap();
        assert_eq!(summary.total_changes, 5);
        assert_eq!(summary.new_decisions, 3);
        assert_eq!(summary.new_topics, 2);
        assert_eq!(response.orchestration.agent_used, "Memory Agent");
        assert_eq!(response.orchestration.intent, "what_changed");
        assert_eq!(response.orchestration.truth_entries, 5);
        assert_eq!(response.orchestration.graph_nodes, 3);
    }

    #[test]
    fn test_conflict_query() {
        let response = seeded().process_query("any conflicts?");
        assert_eq!(response.conflicts_found, Some(1));
        assert_eq!(
            response.conflicts.unwrap()[0].conflict_type,
            "proceed vs cancel"
        );
    }

    #[test]
    fn test_who_needs_to_know_includes_neighbours() {
        let response = seeded().process_query("who needs to know about bob@x.com?");
        let people: Vec<_> = response
            .recommended_notifications
            .iter()
            .map(|s| s.person.as_str())
            .collect();
        assert!(people.contains(&"bob@x.com"));
        assert!(people.contains(&"alice@x.com"));
        assert!(people.contains(&"carol@x.com"));
        assert_eq!(response.mentioned_people, Some(vec!["bob@x.com".to_string()]));
    }

    #[test]
    fn test_help_fallback() {
        let response = seeded().process_query("good morning");
        assert_eq!(response.answer, HELP_TEXT);
        assert_eq!(response.orchestration.agent_used, "General");
    }

    #[test]
    fn test_overload_uses_configured_threshold() {
        let orchestrator = seeded().with_analysis(AnalysisConfig {
            overload_threshold: 0,
            ..AnalysisConfig::default()
        });
        let response = orchestrator.process_query("overload for e1?");
        // no '@' token, person falls back to "unknown"
        let overload = response.overload.unwrap();
        assert_eq!(overload.person, "unknown");
        assert_eq!(overload.threshold, 0);
    }

    #[test]
    fn test_simulate_event_update() {
        let mut orchestrator = seeded();
        let event = IngestEvent {
            subject: "Launch".to_string(),
            body: "bob@x.com says we stop the launch".to_string(),
            decisions: vec!["Stop launch".to_string(), "Start launch".to_string()],
            topics: vec!["launch".to_string()],
            sender_id: "bob@x.com".to_string(),
            receiver_id: "dave@x.com".to_string(),
            ..Default::default()
        };

        let summary = orchestrator.simulate_event_update(event).unwrap();

        assert_eq!(summary.entries_created.len(), 3);
        assert!(!summary.event_id.is_empty());
        assert!(summary.graph_updated);
        assert!(orchestrator.graph().contains("dave@x.com"));
        assert!(summary.recommendations.len() <= INGEST_RECOMMENDATIONS);
        assert_eq!(summary.recommendations[0].person, "bob@x.com");
        // proceed/cancel from the seed plus start/stop from the new decisions
        assert!(summary.conflicts_found >= 2);
        assert_eq!(orchestrator.truth().len(), 8);
    }

    #[test]
    fn test_repeated_ingestion_versions_entries() {
        let mut orchestrator = Orchestrator::new(KnowledgeGraph::new(), TruthStore::in_memory());
        let event = IngestEvent {
            decisions: vec!["Adopt the new vendor".to_string()],
            ..Default::default()
        };

        let first = orchestrator.simulate_event_update(event.clone()).unwrap();
        let second = orchestrator.simulate_event_update(event).unwrap();

        let id = content_id("decision", "adopt the new vendor");
        assert_eq!(first.entries_created, vec![id.clone()]);
        assert_eq!(second.entries_created, vec![format!("{id}_v2")]);
        assert!(!second.graph_updated);
        assert_eq!(orchestrator.history(&id).entries.len(), 2);
    }

    #[test]
    fn test_failed_ingestion_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let paths = PathsConfig {
            graph: dir.path().join("graph.json"),
            // parent is a regular file, so the snapshot cannot be written
            truth: blocker.join("truth.json"),
            events: dir.path().join("events.json"),
        };
        let mut orchestrator = Orchestrator::open(&paths);
        let event = IngestEvent {
            decisions: vec!["Open office".to_string(), "Close office".to_string()],
            topics: vec!["office".to_string()],
            sender_id: "bob@x.com".to_string(),
            receiver_id: "dave@x.com".to_string(),
            ..Default::default()
        };

        let result = orchestrator.simulate_event_update(event);

        assert!(matches!(result, Err(OrchestratorError::Truth(_))));
        assert!(orchestrator.truth().is_empty());
        assert!(orchestrator.graph().is_empty());
        assert!(!paths.graph.exists());
    }

    #[test]
    fn test_context_for_uses_context_window() {
        let mut truth = TruthStore::in_memory();
        truth
            .extend(vec![
                TruthEntry::new("f1", "dana@x.com owns budget", EntityType::Fact, recent(10), "e1"),
                TruthEntry::new("f2", "dana@x.com joined", EntityType::Fact, recent(40), "e2"),
                TruthEntry::new("f3", "dana@x.com hired", EntityType::Fact, recent(60), "e3"),
                TruthEntry::new("f4", "unrelated", EntityType::Fact, recent(1), "e4"),
            ])
            .unwrap();
        let orchestrator = Orchestrator::new(KnowledgeGraph::new(), truth);

        let response = orchestrator.process_query("Context for dana@x.com?");

        assert_eq!(response.orchestration.intent, "context_for");
        assert_eq!(response.results.len(), 3);
        let changes: Vec<_> = response.changes.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(changes, vec!["dana@x.com owns budget", "dana@x.com joined"]);
    }
}
