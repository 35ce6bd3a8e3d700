//! Request and response types for the HTTP endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::graph::{KnowledgeGraph, Node, MAX_LABEL_CHARS};

/// Default page size for GET /api/graph/nodes.
pub const DEFAULT_NODES_LIMIT: usize = 50;
/// Upper bound on the page size for GET /api/graph/nodes.
pub const MAX_NODES_LIMIT: usize = 1000;

/// Body of POST /api/query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Response for GET /api/health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub truth_entries: usize,
}

/// Query parameters for GET /api/graph/nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct NodesQuery {
    /// `person`, `topic`, `decision`, or `all`.
    pub node_type: Option<String>,
    #[serde(default = "default_nodes_limit")]
    pub limit: usize,
}

fn default_nodes_limit() -> usize {
    DEFAULT_NODES_LIMIT
}

impl NodesQuery {
    /// Get the effective limit, capped at `MAX_NODES_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_NODES_LIMIT)
    }
}

/// One node as listed by GET /api/graph/nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    /// Incident edges, parallel edges included.
    pub connections: usize,
}

impl NodeInfo {
    #[must_use]
    pub fn new(graph: &KnowledgeGraph, node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            node_type: node.node_type.as_str().to_string(),
            label: crate::text::clip(&node.label, MAX_LABEL_CHARS),
            connections: graph.degree(&node.id),
        }
    }
}

/// Response for GET /api/graph/nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodesResponse {
    pub nodes: Vec<NodeInfo>,
    /// Matching nodes before the limit was applied.
    pub total_count: usize,
}

/// Optional `hours` window shared by the time-windowed endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowQuery {
    pub hours: Option<u32>,
}

/// JSON error body with an HTTP status.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: &self.message,
        });
        (self.status, body).into_response()
    }
}
