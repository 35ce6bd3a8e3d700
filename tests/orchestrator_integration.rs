//! Integration tests for query routing and ingestion against snapshot files.

use chief_of_staff::config::{AnalysisConfig, PathsConfig};
use chief_of_staff::events::{parse_events, IngestEvent};
use chief_of_staff::graph::{build_graph, KnowledgeGraph};
use chief_of_staff::orchestrator::{AgentKind, Orchestrator};
use chief_of_staff::truth::TruthStore;
use tempfile::TempDir;

fn paths(dir: &TempDir) -> PathsConfig {
    PathsConfig {
        graph: dir.path().join("graph.json"),
        truth: dir.path().join("truth.json"),
        events: dir.path().join("events_enriched.json"),
    }
}

fn seed_graph(paths: &PathsConfig) {
    let events = parse_events(
        r#"[
            {"event_id": "e1", "sender_id": "alice@corp.com", "receiver_id": "bob@corp.com"},
            {"event_id": "e2", "sender_id": "bob@corp.com", "receiver_id": "carol@corp.com"},
            {"event_id": "e3", "sender_id": "dave@corp.com", "receiver_id": "erin@corp.com"}
        ]"#,
    )
    .unwrap();
    build_graph(&events).save(&paths.graph).unwrap();
}

fn event(decisions: &[&str], topics: &[&str]) -> IngestEvent {
    IngestEvent {
        subject: "Launch".to_string(),
        body: "Update for bob@corp.com".to_string(),
        sender_id: "alice@corp.com".to_string(),
        receiver_id: "bob@corp.com".to_string(),
        decisions: decisions.iter().map(ToString::to_string).collect(),
        topics: topics.iter().map(ToString::to_string).collect(),
        ..Default::default()
    }
}

#[test]
fn test_open_with_missing_files_is_empty() {
    let dir = TempDir::new().unwrap();
    let orchestrator = Orchestrator::open(&paths(&dir));
    assert!(orchestrator.graph().is_empty());
    assert!(orchestrator.truth().is_empty());

    let response = orchestrator.process_query("what changed today?");
    assert_eq!(response.summary.unwrap().total_changes, 0);
}

#[test]
fn test_ingest_persists_and_reopens() {
    let dir = TempDir::new().unwrap();
    let paths = paths(&dir);
    seed_graph(&paths);

    let mut orchestrator = Orchestrator::open(&paths);
    let summary = orchestrator
        .simulate_event_update(event(&["Proceed with launch"], &["launch"]))
        .unwrap();
    assert_eq!(summary.entries_created.len(), 2);
    assert!(summary.graph_updated);
    assert!(!summary.event_id.is_empty(), "missing event ids are generated");
    assert_eq!(summary.recommendations[0].person, "bob@corp.com");

    let summary = orchestrator
        .simulate_event_update(event(&["Cancel launch"], &[]))
        .unwrap();
    assert_eq!(summary.conflicts_found, 1);

    let reopened = Orchestrator::open(&paths);
    assert_eq!(reopened.truth().len(), 3);
    let alice_to_bob = reopened
        .graph()
        .edges()
        .iter()
        .find(|e| e.source == "alice@corp.com" && e.target == "bob@corp.com")
        .unwrap();
    assert_eq!(alice_to_bob.weight, 3);
}

#[test]
fn test_repeated_decision_becomes_new_version() {
    let dir = TempDir::new().unwrap();
    let mut orchestrator = Orchestrator::open(&paths(&dir));

    let first = orchestrator
        .simulate_event_update(event(&["Ship on Friday"], &[]))
        .unwrap();
    let second = orchestrator
        .simulate_event_update(event(&["ship  on friday"], &[]))
        .unwrap();

    let logical = &first.entries_created[0];
    assert_eq!(second.entries_created[0], format!("{logical}_v2"));

    let history = orchestrator.history(logical);
    assert_eq!(history.entries.len(), 2);
    assert!(history.warnings.is_empty());
}

#[test]
fn test_queries_route_to_agents() {
    let dir = TempDir::new().unwrap();
    let paths = paths(&dir);
    seed_graph(&paths);

    let mut orchestrator = Orchestrator::open(&paths).with_analysis(AnalysisConfig {
        overload_threshold: 1,
        ..AnalysisConfig::default()
    });
    orchestrator
        .simulate_event_update(event(&["Hire two engineers"], &["hiring"]))
        .unwrap();

    let response = orchestrator.process_query("Who needs to know about alice@corp.com?");
    assert_eq!(response.orchestration.agent_used, AgentKind::Coordinator.as_str());
    let notified: Vec<_> = response
        .recommended_notifications
        .iter()
        .map(|s| s.person.as_str())
        .collect();
    assert!(notified.contains(&"alice@corp.com"));
    assert!(notified.contains(&"bob@corp.com"));

    let response = orchestrator.process_query("Is bob@corp.com overloaded?");
    assert_eq!(response.orchestration.agent_used, AgentKind::Critic.as_str());
    let overload = response.overload.unwrap();
    assert_eq!(overload.threshold, 1);

    let response = orchestrator.process_query("What is the current truth?");
    assert_eq!(response.orchestration.agent_used, AgentKind::Memory.as_str());
    assert_eq!(response.results.len(), 2);

    let response = orchestrator.process_query("hello there");
    assert_eq!(response.orchestration.intent, "help");
    assert!(response.suggestion.is_some());
}

#[test]
fn test_gaps_over_in_memory_store() {
    let mut orchestrator = Orchestrator::new(KnowledgeGraph::new(), TruthStore::in_memory());
    let response = orchestrator.process_query("any knowledge gaps?");
    assert!(response.gaps.unwrap().gaps.is_empty());

    orchestrator
        .simulate_event_update(IngestEvent {
            decisions: vec!["Migrate billing".to_string()],
            ..Default::default()
        })
        .unwrap();
    let response = orchestrator.process_query("any knowledge gaps?");
    let gaps = response.gaps.unwrap();
    assert_eq!(gaps.total_decisions, 1);
    assert_eq!(gaps.gaps, vec!["Migrate billing".to_string()]);
}
