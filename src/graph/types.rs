//! Graph node, edge and container types.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Maximum characters kept in a node label.
pub const MAX_LABEL_CHARS: usize = 50;

/// Kind of node in the knowledge graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[default]
    Person,
    Topic,
    Decision,
}

impl NodeType {
    /// Returns the string representation used in snapshots.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Topic => "topic",
            Self::Decision => "decision",
        }
    }

    /// Parse a snapshot string, `None` when unrecognized.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "person" => Some(Self::Person),
            "topic" => Some(Self::Topic),
            "decision" => Some(Self::Decision),
            _ => None,
        }
    }
}

/// Kind of relation carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// Person to person, weight = number of messages.
    CommunicatesWith,
    /// Sender to topic, or topic to receiver.
    MentionsTopic,
    /// Sender to decision, or decision to receiver.
    DecidedOn,
}

impl EdgeType {
    /// Returns the string representation used in snapshots.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommunicatesWith => "communicates_with",
            Self::MentionsTopic => "mentions_topic",
            Self::DecidedOn => "decided_on",
        }
    }

    /// Parse a snapshot string, `None` when unrecognized.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "communicates_with" => Some(Self::CommunicatesWith),
            "mentions_topic" => Some(Self::MentionsTopic),
            "decided_on" => Some(Self::DecidedOn),
            _ => None,
        }
    }

    /// Infer the relation from the endpoint node types.
    #[must_use]
    pub fn infer(source: NodeType, target: NodeType) -> Self {
        match (source, target) {
            (NodeType::Topic, _) | (_, NodeType::Topic) => Self::MentionsTopic,
            (NodeType::Decision, _) | (_, NodeType::Decision) => Self::DecidedOn,
            _ => Self::CommunicatesWith,
        }
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub node_type: NodeType,
    pub label: String,
    /// Attributes beyond the core three, preserved through snapshots.
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// A directed edge. Parallel edges between the same pair are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub edge_type: EdgeType,
    pub weight: u64,
    /// Attributes beyond the core four, preserved through snapshots.
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Edge {
    /// Create an edge without extra attributes.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: EdgeType,
        weight: u64,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type,
            weight,
            attributes: serde_json::Map::new(),
        }
    }
}

/// Summary counts for a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub people_count: usize,
    pub topics_count: usize,
    pub decisions_count: usize,
    pub density: f64,
}

/// Directed multigraph of people, topics and decisions.
///
/// Nodes keep their insertion order, which makes builds and snapshots
/// deterministic for a given input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl KnowledgeGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, or update type and label of an existing one.
    pub fn add_node(&mut self, id: &str, node_type: NodeType, label: &str) {
        if let Some(&i) = self.index.get(id) {
            let node = &mut self.nodes[i];
            node.node_type = node_type;
            node.label = label.to_string();
            return;
        }
        self.push_node(Node {
            id: id.to_string(),
            node_type,
            label: label.to_string(),
            attributes: serde_json::Map::new(),
        });
    }

    /// Insert a fully specified node, merging attributes into an existing one.
    pub fn insert_node(&mut self, node: Node) {
        if let Some(&i) = self.index.get(&node.id) {
            let existing = &mut self.nodes[i];
            existing.node_type = node.node_type;
            existing.label = node.label;
            existing.attributes.extend(node.attributes);
            return;
        }
        self.push_node(node);
    }

    fn push_node(&mut self, node: Node) {
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Append an edge. Unknown endpoints are added as person nodes labelled by id.
    pub fn add_edge(&mut self, edge: Edge) {
        for id in [&edge.source, &edge.target] {
            if !self.index.contains_key(id.as_str()) {
                let label = crate::text::clip(id, MAX_LABEL_CHARS);
                self.add_node(id, NodeType::Person, &label);
            }
        }
        self.edges.push(edge);
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Whether the graph has a node with this id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Position of a node in insertion order.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes of one type, in insertion order.
    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }

    /// Distinct nodes reached by an outgoing edge, in edge order.
    #[must_use]
    pub fn successors(&self, id: &str) -> Vec<&str> {
        distinct(
            self.edges
                .iter()
                .filter(|e| e.source == id)
                .map(|e| e.target.as_str()),
        )
    }

    /// Distinct nodes with an edge into `id`, in edge order.
    #[must_use]
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        distinct(
            self.edges
                .iter()
                .filter(|e| e.target == id)
                .map(|e| e.source.as_str()),
        )
    }

    /// Number of incident edges (in + out), counting parallel edges.
    #[must_use]
    pub fn degree(&self, id: &str) -> usize {
        self.edges
            .iter()
            .map(|e| usize::from(e.source == id) + usize::from(e.target == id))
            .sum()
    }

    /// Sum of incident edge weights (in + out).
    #[must_use]
    pub fn weighted_degree(&self, id: &str) -> u64 {
        self.edges
            .iter()
            .map(|e| {
                let hits = u64::from(e.source == id) + u64::from(e.target == id);
                hits * e.weight
            })
            .sum()
    }

    /// The communication edge for an ordered pair, if present.
    pub fn communication_edge_mut(&mut self, source: &str, target: &str) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| {
            e.edge_type == EdgeType::CommunicatesWith && e.source == source && e.target == target
        })
    }

    /// Directed density `E / (N * (N - 1))`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n <= 1 {
            return 0.0;
        }
        self.edges.len() as f64 / (n * (n - 1)) as f64
    }

    /// Summary counts.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_nodes: self.node_count(),
            total_edges: self.edge_count(),
            people_count: self.nodes_of_type(NodeType::Person).count(),
            topics_count: self.nodes_of_type(NodeType::Topic).count(),
            decisions_count: self.nodes_of_type(NodeType::Decision).count(),
            density: self.density(),
        }
    }
}

fn distinct<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        g.add_node("a@x.com", NodeType::Person, "a@x.com");
        g.add_node("b@x.com", NodeType::Person, "b@x.com");
        g.add_node("topic_1", NodeType::Topic, "budget");
        g.add_edge(Edge::new("a@x.com", "b@x.com", EdgeType::CommunicatesWith, 3));
        g.add_edge(Edge::new("a@x.com", "topic_1", EdgeType::MentionsTopic, 1));
        g.add_edge(Edge::new("a@x.com", "topic_1", EdgeType::MentionsTopic, 1));
        g.add_edge(Edge::new("topic_1", "b@x.com", EdgeType::MentionsTopic, 1));
        g
    }

    #[test]
    fn test_add_node_merges() {
        let mut g = KnowledgeGraph::new();
        g.add_node("a", NodeType::Person, "old");
        g.add_node("a", NodeType::Person, "new");
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.node("a").unwrap().label, "new");
    }

    #[test]
    fn test_add_edge_creates_missing_endpoints() {
        let mut g = KnowledgeGraph::new();
        g.add_edge(Edge::new("x", "y", EdgeType::CommunicatesWith, 1));
        assert!(g.contains("x"));
        assert!(g.contains("y"));
        assert_eq!(g.node("y").unwrap().node_type, NodeType::Person);
    }

    #[test]
    fn test_successors_and_predecessors_are_distinct() {
        let g = sample();
        assert_eq!(g.successors("a@x.com"), vec!["b@x.com", "topic_1"]);
        assert_eq!(g.predecessors("b@x.com"), vec!["a@x.com", "topic_1"]);
        assert!(g.predecessors("a@x.com").is_empty());
    }

    #[test]
    fn test_degree_counts_parallel_edges() {
        let g = sample();
        assert_eq!(g.degree("a@x.com"), 3);
        assert_eq!(g.degree("topic_1"), 3);
        assert_eq!(g.weighted_degree("a@x.com"), 5);
        assert_eq!(g.degree("missing"), 0);
    }

    #[test]
    fn test_self_loop_counts_twice() {
        let mut g = KnowledgeGraph::new();
        g.add_edge(Edge::new("a", "a", EdgeType::CommunicatesWith, 2));
        assert_eq!(g.degree("a"), 2);
        assert_eq!(g.weighted_degree("a"), 4);
    }

    #[test]
    fn test_stats() {
        let stats = sample().stats();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 4);
        assert_eq!(stats.people_count, 2);
        assert_eq!(stats.topics_count, 1);
        assert_eq!(stats.decisions_count, 0);
        assert!((stats.density - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_edge_type_infer() {
        assert_eq!(
            EdgeType::infer(NodeType::Person, NodeType::Person),
            EdgeType::CommunicatesWith
        );
        assert_eq!(
            EdgeType::infer(NodeType::Topic, NodeType::Person),
            EdgeType::MentionsTopic
        );
        assert_eq!(
            EdgeType::infer(NodeType::Person, NodeType::Decision),
            EdgeType::DecidedOn
        );
    }

    #[test]
    fn test_type_strings_roundtrip() {
        for t in [NodeType::Person, NodeType::Topic, NodeType::Decision] {
            assert_eq!(NodeType::parse(t.as_str()), Some(t));
        }
        for t in [
            EdgeType::CommunicatesWith,
            EdgeType::MentionsTopic,
            EdgeType::DecidedOn,
        ] {
            assert_eq!(EdgeType::parse(t.as_str()), Some(t));
        }
        assert_eq!(EdgeType::parse("works_on"), None);
    }
}
