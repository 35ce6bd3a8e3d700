//! Build the knowledge graph from enriched events.

use std::collections::HashMap;

use super::types::{Edge, EdgeType, KnowledgeGraph, NodeType, MAX_LABEL_CHARS};
use crate::events::EnrichedEvent;
use crate::text::{clip, content_id};

/// Accumulates events into a graph.
///
/// Communication edges are deferred: each ordered (sender, receiver) pair is
/// counted across all events and emitted once by [`GraphBuilder::finish`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: KnowledgeGraph,
    pairs: Vec<(String, String, u64)>,
    pair_index: HashMap<(String, String), usize>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the graph under construction.
    pub fn add_event(&mut self, event: &EnrichedEvent) {
        if event.has_participants() {
            let key = (event.sender_id.clone(), event.receiver_id.clone());
            match self.pair_index.get(&key) {
                Some(&i) => self.pairs[i].2 += 1,
                None => {
                    self.pair_index.insert(key.clone(), self.pairs.len());
                    self.pairs.push((key.0, key.1, 1));
                }
            }
        }
        add_people(&mut self.graph, event);
        link_content(&mut self.graph, event);
    }

    /// Emit the accumulated communication edges and return the graph.
    #[must_use]
    pub fn finish(mut self) -> KnowledgeGraph {
        for (source, target, count) in self.pairs {
            self.graph
                .add_edge(Edge::new(source, target, EdgeType::CommunicatesWith, count));
        }
        self.graph
    }
}

/// Build a graph from a sequence of enriched events.
///
/// Deterministic for a given input order; malformed or empty fields only
/// reduce what an event contributes.
#[must_use]
pub fn build_graph(events: &[EnrichedEvent]) -> KnowledgeGraph {
    let mut builder = GraphBuilder::new();
    for event in events {
        builder.add_event(event);
    }
    let graph = builder.finish();
    tracing::debug!(
        events = events.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Built knowledge graph"
    );
    graph
}

impl KnowledgeGraph {
    /// Merge one more event into a live graph.
    ///
    /// Applies the same rules as [`build_graph`], except that the
    /// communication edge for the pair is incremented in place.
    pub fn absorb_event(&mut self, event: &EnrichedEvent) {
        if event.has_participants() {
            if let Some(edge) = self.communication_edge_mut(&event.sender_id, &event.receiver_id)
            {
                edge.weight += 1;
            } else {
                self.add_edge(Edge::new(
                    event.sender_id.clone(),
                    event.receiver_id.clone(),
                    EdgeType::CommunicatesWith,
                    1,
                ));
            }
        }
        add_people(self, event);
        link_content(self, event);
    }
}

fn add_people(graph: &mut KnowledgeGraph, event: &EnrichedEvent) {
    for id in [&event.sender_id, &event.receiver_id] {
        if !id.is_empty() {
            graph.add_node(id, NodeType::Person, &clip(id, MAX_LABEL_CHARS));
        }
    }
}

/// Add topic and decision nodes with their sender/receiver edges.
fn link_content(graph: &mut KnowledgeGraph, event: &EnrichedEvent) {
    let kinds = [
        (&event.topics, NodeType::Topic, EdgeType::MentionsTopic),
        (&event.decisions, NodeType::Decision, EdgeType::DecidedOn),
    ];
    for (items, node_type, edge_type) in kinds {
        for text in items.iter().filter(|t| !t.trim().is_empty()) {
            let id = content_id(node_type.as_str(), text);
            graph.add_node(&id, node_type, &clip(text, MAX_LABEL_CHARS));
            if !event.sender_id.is_empty() {
                graph.add_edge(Edge::new(event.sender_id.clone(), id.clone(), edge_type, 1));
            }
            if !event.receiver_id.is_empty() {
                graph.add_edge(Edge::new(id, event.receiver_id.clone(), edge_type, 1));
            }
        }
    }
}
