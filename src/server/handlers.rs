//! HTTP handlers for the query and ingestion API.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use tokio::sync::Mutex;

use super::api::{
    ApiError, HealthResponse, NodeInfo, NodesQuery, NodesResponse, QueryRequest, WindowQuery,
};
use crate::agents::{ChangeReport, ConflictReport, OverloadReport};
use crate::events::IngestEvent;
use crate::graph::{GraphStats, NodeType};
use crate::orchestrator::{IngestSummary, Orchestrator, QueryResponse};

/// Application state shared across all handlers.
///
/// Every request goes through the one orchestrator, one at a time.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Mutex<Orchestrator>>,
}

impl AppState {
    #[must_use]
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
        }
    }
}

/// GET /api/health - Liveness plus data sizes.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let orchestrator = state.orchestrator.lock().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        graph_nodes: orchestrator.graph().node_count(),
        graph_edges: orchestrator.graph().edge_count(),
        truth_entries: orchestrator.truth().len(),
    })
}

/// POST /api/query - Answer a free-text query.
pub async fn post_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }
    let orchestrator = state.orchestrator.lock().await;
    Ok(Json(orchestrator.process_query(&request.query)))
}

/// POST /api/events - Ingest one new event.
///
/// Snapshot writes are blocking, so ingestion runs on the blocking pool while
/// holding the orchestrator lock.
pub async fn post_event(
    State(state): State<AppState>,
    Json(event): Json<IngestEvent>,
) -> Result<Json<IngestSummary>, ApiError> {
    let mut orchestrator = state.orchestrator.clone().lock_owned().await;
    let result = tokio::task::spawn_blocking(move || orchestrator.simulate_event_update(event))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Event ingestion task failed");
            ApiError::internal(format!("Error ingesting event: {e}"))
        })?;

    match result {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            tracing::error!(error = %e, "Event ingestion failed");
            Err(ApiError::internal(format!("Error ingesting event: {e}")))
        }
    }
}

/// GET /api/graph/stats - Node, edge and type counts.
pub async fn get_graph_stats(State(state): State<AppState>) -> Json<GraphStats> {
    let orchestrator = state.orchestrator.lock().await;
    Json(orchestrator.graph().stats())
}

/// GET /api/graph/nodes - Nodes with their connection counts.
pub async fn get_graph_nodes(
    State(state): State<AppState>,
    Query(query): Query<NodesQuery>,
) -> Result<Json<NodesResponse>, ApiError> {
    let filter = match query.node_type.as_deref() {
        None | Some("all") => None,
        Some(value) => Some(
            NodeType::parse(value)
                .ok_or_else(|| ApiError::bad_request(format!("unknown node_type '{value}'")))?,
        ),
    };

    let orchestrator = state.orchestrator.lock().await;
    let graph = orchestrator.graph();
    let matching: Vec<_> = graph
        .nodes()
        .iter()
        .filter(|n| filter.map_or(true, |t| n.node_type == t))
        .collect();

    Ok(Json(NodesResponse {
        total_count: matching.len(),
        nodes: matching
            .into_iter()
            .take(query.effective_limit())
            .map(|n| NodeInfo::new(graph, n))
            .collect(),
    }))
}

/// GET /api/changes - Recent changes grouped by type.
pub async fn get_changes(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
) -> Json<ChangeReport> {
    let orchestrator = state.orchestrator.lock().await;
    let hours = window.hours.unwrap_or(orchestrator.analysis().window_hours);
    Json(orchestrator.memory().what_changed(hours))
}

/// POST /api/conflicts/detect - Contradictions among recent changes.
pub async fn post_detect_conflicts(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
) -> Json<ConflictReport> {
    let orchestrator = state.orchestrator.lock().await;
    let hours = window.hours.unwrap_or(orchestrator.analysis().window_hours);
    Json(orchestrator.critic().detect_conflicts(hours))
}

/// GET /api/overload/:person - Information load for one person.
pub async fn get_overload(
    State(state): State<AppState>,
    Path(person): Path<String>,
    Query(window): Query<WindowQuery>,
) -> Json<OverloadReport> {
    let orchestrator = state.orchestrator.lock().await;
    let hours = window.hours.unwrap_or(orchestrator.analysis().window_hours);
    Json(orchestrator.critic().detect_overload(&person, hours))
}
