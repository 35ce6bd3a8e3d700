//! Orchestrator error types.

use crate::graph::GraphError;
use crate::truth::TruthError;

/// Errors from the orchestrator's mutation path.
#[derive(thiserror::Error, Debug)]
pub enum OrchestratorError {
    #[error("Truth store update failed: {0}")]
    Truth(#[from] TruthError),

    #[error("Graph snapshot update failed: {0}")]
    Graph(#[from] GraphError),
}
