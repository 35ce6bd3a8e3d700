//! Response envelopes returned by the orchestrator.

use serde::Serialize;

use crate::agents::{
    AmplificationPlan, ChangeReport, ChangeSummary, Conflict, ConflictReport, CurrentTruth,
    GapReport, OverloadReport, PersonContext, StakeholderReport, StakeholderScore, TruthItem,
};

pub const HELP_TEXT: &str = "I can help with: 'what changed today?', 'what is the current truth?', 'who needs to know [X]?', 'context for [person]', 'conflicts', 'overload [person]', 'knowledge gaps [topic]' or 'amplify [X] with low/high reach'";
pub const HELP_SUGGESTION: &str = "Please rephrase your query using one of these patterns";

/// Where a response came from and the size of the data behind it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Orchestration {
    pub query: String,
    pub agent_used: String,
    pub intent: String,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub truth_entries: usize,
}

/// Uniform answer to a query.
///
/// The four list fields are always present; the optional sections appear
/// only for the intents that produce them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub results: Vec<TruthItem>,
    pub changes: Vec<TruthItem>,
    pub recommended_notifications: Vec<StakeholderScore>,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ChangeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<Conflict>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts_found: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overload: Option<OverloadReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaps: Option<GapReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentioned_people: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amplification: Option<AmplificationPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub orchestration: Orchestration,
}

impl QueryResponse {
    fn text(answer: String, reasoning: String) -> Self {
        Self {
            answer,
            reasoning,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn help() -> Self {
        Self {
            suggestion: Some(HELP_SUGGESTION.to_string()),
            ..Self::text(
                HELP_TEXT.to_string(),
                "Query intent unclear, providing guidance".to_string(),
            )
        }
    }

    /// Stamp the orchestration section.
    #[must_use]
    pub fn routed(mut self, orchestration: Orchestration) -> Self {
        self.orchestration = orchestration;
        self
    }
}

impl From<ChangeReport> for QueryResponse {
    fn from(report: ChangeReport) -> Self {
        Self {
            changes: report.changes,
            summary: Some(report.summary),
            ..Self::text(report.answer, report.reasoning)
        }
    }
}

impl From<CurrentTruth> for QueryResponse {
    fn from(truth: CurrentTruth) -> Self {
        Self {
            results: truth.results,
            ..Self::text(truth.answer, truth.reasoning)
        }
    }
}

impl From<PersonContext> for QueryResponse {
    fn from(context: PersonContext) -> Self {
        Self {
            results: context.relevant_truth,
            changes: context.recent_changes,
            ..Self::text(context.answer, context.reasoning)
        }
    }
}

impl From<StakeholderReport> for QueryResponse {
    fn from(report: StakeholderReport) -> Self {
        Self {
            recommended_notifications: report.recommended_notifications,
            mentioned_people: Some(report.mentioned_people),
            ..Self::text(report.answer, report.reasoning)
        }
    }
}

impl From<AmplificationPlan> for QueryResponse {
    fn from(plan: AmplificationPlan) -> Self {
        let base = Self::text(plan.answer.clone(), plan.reasoning.clone());
        Self {
            amplification: Some(plan),
            ..base
        }
    }
}

impl From<ConflictReport> for QueryResponse {
    fn from(report: ConflictReport) -> Self {
        Self {
            conflicts: Some(report.conflicts),
            conflicts_found: Some(report.conflicts_found),
            ..Self::text(report.answer, report.reasoning)
        }
    }
}

impl From<OverloadReport> for QueryResponse {
    fn from(report: OverloadReport) -> Self {
        let base = Self::text(report.answer.clone(), report.reasoning.clone());
        Self {
            overload: Some(report),
            ..base
        }
    }
}

impl From<GapReport> for QueryResponse {
    fn from(report: GapReport) -> Self {
        let base = Self::text(report.answer.clone(), report.reasoning.clone());
        Self {
            gaps: Some(report),
            ..base
        }
    }
}

/// Outcome of ingesting one event.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub answer: String,
    pub event_id: String,
    /// Ids of the stored entries, including version suffixes.
    pub entries_created: Vec<String>,
    /// Top stakeholders for the event content.
    pub recommendations: Vec<StakeholderScore>,
    pub conflicts_found: usize,
    pub graph_updated: bool,
    pub reasoning: String,
}
