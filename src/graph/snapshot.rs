//! Node-list / edge-list JSON form of the graph.
//!
//! ```json
//! {"nodes": [{"id": "...", "node_type": "person", "label": "..."}],
//!  "links": [{"source": "...", "target": "...", "weight": 3, "edge_type": "communicates_with"}]}
//! ```
//!
//! Extra keys on nodes and links are carried through unchanged.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::GraphError;
use super::types::{Edge, EdgeType, KnowledgeGraph, Node, NodeType};

/// Serialized graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

/// Serialized node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Serialized edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: String,
    pub target: String,
    #[serde(default = "default_weight")]
    pub weight: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

const fn default_weight() -> u64 {
    1
}

impl From<&KnowledgeGraph> for GraphSnapshot {
    fn from(graph: &KnowledgeGraph) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|n| NodeRecord {
                id: n.id.clone(),
                node_type: Some(n.node_type.as_str().to_string()),
                label: Some(n.label.clone()),
                attributes: n.attributes.clone(),
            })
            .collect();
        let links = graph
            .edges()
            .iter()
            .map(|e| LinkRecord {
                source: e.source.clone(),
                target: e.target.clone(),
                weight: e.weight,
                edge_type: Some(e.edge_type.as_str().to_string()),
                attributes: e.attributes.clone(),
            })
            .collect();
        Self { nodes, links }
    }
}

impl From<GraphSnapshot> for KnowledgeGraph {
    fn from(snapshot: GraphSnapshot) -> Self {
        let mut graph = KnowledgeGraph::new();
        for record in snapshot.nodes {
            let node_type = record
                .node_type
                .as_deref()
                .and_then(NodeType::parse)
                .unwrap_or_default();
            let label = record.label.unwrap_or_else(|| record.id.clone());
            graph.insert_node(Node {
                id: record.id,
                node_type,
                label,
                attributes: record.attributes,
            });
        }
        for record in snapshot.links {
            let edge_type = record
                .edge_type
                .as_deref()
                .and_then(EdgeType::parse)
                .unwrap_or_else(|| infer_edge_type(&graph, &record.source, &record.target));
            graph.add_edge(Edge {
                source: record.source,
                target: record.target,
                edge_type,
                weight: record.weight,
                attributes: record.attributes,
            });
        }
        graph
    }
}

fn infer_edge_type(graph: &KnowledgeGraph, source: &str, target: &str) -> EdgeType {
    let type_of = |id: &str| graph.node(id).map(|n| n.node_type).unwrap_or_default();
    EdgeType::infer(type_of(source), type_of(target))
}

impl KnowledgeGraph {
    /// Serialize to the `{nodes, links}` JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, GraphError> {
        Ok(serde_json::to_value(GraphSnapshot::from(self))?)
    }

    /// Parse the `{nodes, links}` JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid snapshot.
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let snapshot: GraphSnapshot = serde_json::from_str(content)?;
        Ok(snapshot.into())
    }

    /// Load a graph snapshot file.
    ///
    /// # Errors
    ///
    /// Returns `GraphError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path).map_err(|e| GraphError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let graph = Self::from_json_str(&content).map_err(|e| GraphError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Loaded graph snapshot"
        );
        Ok(graph)
    }

    /// Load a snapshot, falling back to an empty graph when the file is
    /// missing or unreadable.
    #[must_use]
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(graph) => graph,
            Err(GraphError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::debug!(path = %path.display(), "No graph snapshot found");
                Self::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unusable graph snapshot, starting empty");
                Self::new()
            }
        }
    }

    /// Write the snapshot atomically (temp file + sync + rename).
    ///
    /// # Errors
    ///
    /// Returns `GraphError` if serialization or any file operation fails.
    pub fn save(&self, path: &Path) -> Result<(), GraphError> {
        let write_err = |e| GraphError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(&GraphSnapshot::from(self))?;
        let temp_path = path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_data().map_err(write_err)?;
        drop(file);
        std::fs::rename(&temp_path, path).map_err(write_err)?;

        tracing::info!(
            path = %path.display(),
            nodes = self.node_count(),
            edges = self.edge_count(),
            "Saved graph snapshot"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_shape() {
        let mut g = KnowledgeGraph::new();
        g.add_edge(Edge::new("a", "b", EdgeType::CommunicatesWith, 2));
        let value = g.to_json().unwrap();

        assert_eq!(value["nodes"][0]["id"], "a");
        assert_eq!(value["nodes"][0]["node_type"], "person");
        assert_eq!(value["links"][0]["source"], "a");
        assert_eq!(value["links"][0]["weight"], 2);
        assert_eq!(value["links"][0]["edge_type"], "communicates_with");
    }

    #[test]
    fn test_extra_attributes_survive() {
        let content = json!({
            "nodes": [
                {"id": "a", "node_type": "person", "label": "Alice", "team": "ops"},
                {"id": "t", "node_type": "topic", "label": "budget"}
            ],
            "links": [
                {"source": "a", "target": "t", "weight": 1, "edge_type": "mentions_topic", "note": "x"}
            ]
        })
        .to_string();
        let g = KnowledgeGraph::from_json_str(&content).unwrap();
        assert_eq!(g.node("a").unwrap().attributes["team"], "ops");
        assert_eq!(g.edges()[0].attributes["note"], "x");

        let back = g.to_json().unwrap();
        assert_eq!(back["nodes"][0]["team"], "ops");
        assert_eq!(back["links"][0]["note"], "x");
    }

    #[test]
    fn test_missing_edge_type_is_inferred() {
        let content = json!({
            "nodes": [
                {"id": "a", "node_type": "person", "label": "a"},
                {"id": "b", "node_type": "person", "label": "b"},
                {"id": "d", "node_type": "decision", "label": "ship"}
            ],
            "links": [
                {"source": "a", "target": "b", "weight": 4},
                {"source": "a", "target": "d"}
            ]
        })
        .to_string();
        let g = KnowledgeGraph::from_json_str(&content).unwrap();
        assert_eq!(g.edges()[0].edge_type, EdgeType::CommunicatesWith);
        assert_eq!(g.edges()[0].weight, 4);
        assert_eq!(g.edges()[1].edge_type, EdgeType::DecidedOn);
        assert_eq!(g.edges()[1].weight, 1);
    }

    #[test]
    fn test_missing_label_defaults_to_id() {
        let g = KnowledgeGraph::from_json_str(r#"{"nodes": [{"id": "a"}], "links": []}"#).unwrap();
        assert_eq!(g.node("a").unwrap().label, "a");
        assert_eq!(g.node("a").unwrap().node_type, NodeType::Person);
    }

    #[test]
    fn test_load_or_empty_missing_file() {
        let g = KnowledgeGraph::load_or_empty(Path::new("/nonexistent/graph.json"));
        assert!(g.is_empty());
    }

    #[test]
    fn test_load_or_empty_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(KnowledgeGraph::load_or_empty(&path).is_empty());
        assert!(matches!(
            KnowledgeGraph::load(&path),
            Err(GraphError::Parse { .. })
        ));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("graph.json");
        let mut g = KnowledgeGraph::new();
        g.add_edge(Edge::new("a", "b", EdgeType::CommunicatesWith, 1));

        g.save(&path).unwrap();

        assert!(path.exists());
        assert_eq!(KnowledgeGraph::load(&path).unwrap(), g);
    }
}
