//! Colored terminal output for query responses and command results.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::agents::{StakeholderScore, TruthItem};
use crate::graph::GraphStats;
use crate::orchestrator::{IngestSummary, QueryResponse};
use crate::truth::VersionHistory;

/// Maximum characters of content shown per line.
const CONTENT_MAX_LEN: usize = 100;
const SCORE_ROWS: usize = 10;

/// Truncate a string to `max_len` characters, adding an ellipsis if cut.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        format!("{}...", crate::text::clip(s, max_len - 3))
    }
}

/// One-line rendering of a truth item.
#[must_use]
pub fn format_item(item: &TruthItem) -> String {
    let version = if item.version > 1 {
        format!(" v{}", item.version)
    } else {
        String::new()
    };
    format!(
        "[{}{version}] {} ({})",
        item.entity_type,
        truncate(&item.content, CONTENT_MAX_LEN),
        item.timestamp
    )
}

/// One-line rendering of a stakeholder score.
#[must_use]
pub fn format_score(score: &StakeholderScore) -> String {
    format!(
        "{} score={:.3} degree={:.3} betweenness={:.3} volume={}",
        score.person,
        score.score,
        score.degree_centrality,
        score.betweenness_centrality,
        score.communication_volume
    )
}

/// Print a query response.
pub fn print_response(response: &QueryResponse) {
    println!(
        "{} {}",
        format!("[{}]", response.orchestration.agent_used)
            .magenta()
            .bold(),
        response.answer.bold()
    );

    if let Some(summary) = &response.summary {
        println!(
            "  {} total={} decisions={} topics={} facts={}",
            "[SUMMARY]".blue().bold(),
            summary.total_changes,
            summary.new_decisions,
            summary.new_topics,
            summary.new_facts
        );
    }
    for item in &response.results {
        println!("  {} {}", "[TRUTH]".cyan().bold(), format_item(item));
    }
    for item in &response.changes {
        println!("  {} {}", "[CHANGE]".blue().bold(), format_item(item));
    }
    if let Some(people) = response.mentioned_people.as_ref().filter(|p| !p.is_empty()) {
        println!("  {} {}", "[MENTIONED]".cyan().bold(), people.join(", "));
    }
    for score in response.recommended_notifications.iter().take(SCORE_ROWS) {
        println!("  {} {}", "[NOTIFY]".green().bold(), format_score(score));
    }
    if let Some(conflicts) = &response.conflicts {
        for conflict in conflicts {
            println!(
                "  {} {}: {} <> {}",
                "[CONFLICT]".red().bold(),
                conflict.conflict_type,
                conflict.first,
                conflict.second
            );
        }
    }
    if let Some(overload) = &response.overload {
        let verdict = if overload.is_overloaded {
            "overloaded".red().to_string()
        } else {
            "ok".green().to_string()
        };
        println!(
            "  {} {} {} relevant={} threshold={} - {}",
            "[OVERLOAD]".yellow().bold(),
            overload.person,
            verdict,
            overload.relevant_changes,
            overload.threshold,
            overload.recommendation.dimmed()
        );
    }
    if let Some(gaps) = &response.gaps {
        for gap in &gaps.gaps {
            println!("  {} {}", "[GAP]".yellow().bold(), gap);
        }
    }
    if let Some(plan) = &response.amplification {
        println!(
            "  {} reach={} audience={} channels={}",
            "[AMPLIFY]".green().bold(),
            plan.reach.as_str(),
            plan.target_audience_size,
            plan.recommended_channels.join(", ")
        );
        if !plan.target_people.is_empty() {
            println!("    {}", plan.target_people.join(", "));
        }
    }
    if let Some(suggestion) = &response.suggestion {
        println!("  {}", suggestion.dimmed());
    }
    println!("  {}", response.reasoning.dimmed());
    let _ = io::stdout().flush();
}

/// Print an ingestion summary.
pub fn print_ingest_summary(summary: &IngestSummary) {
    println!(
        "{} {} event_id={}",
        "[INGEST]".blue().bold(),
        summary.answer.bold(),
        summary.event_id.dimmed()
    );
    for id in &summary.entries_created {
        println!("  {} {}", "[STORED]".green().bold(), id);
    }
    for score in &summary.recommendations {
        println!("  {} {}", "[NOTIFY]".green().bold(), format_score(score));
    }
    let conflicts = if summary.conflicts_found > 0 {
        summary.conflicts_found.to_string().red().to_string()
    } else {
        summary.conflicts_found.to_string()
    };
    println!(
        "  conflicts={} graph_updated={}",
        conflicts, summary.graph_updated
    );
    println!("  {}", summary.reasoning.dimmed());
    let _ = io::stdout().flush();
}

/// Print the version chain of one logical id.
pub fn print_history(logical_id: &str, history: &VersionHistory) {
    if history.entries.is_empty() {
        println!("{} no entry with id {logical_id}", "[HISTORY]".yellow().bold());
    }
    for entry in &history.entries {
        println!(
            "{} {} v{} {} ({})",
            "[HISTORY]".blue().bold(),
            entry.id.cyan(),
            entry.version,
            truncate(&entry.content, CONTENT_MAX_LEN),
            entry.timestamp.dimmed()
        );
    }
    for warning in &history.warnings {
        println!("{} {}", "[INTEGRITY]".red().bold(), warning);
    }
    let _ = io::stdout().flush();
}

/// Print graph summary counts.
pub fn print_graph_stats(stats: &GraphStats) {
    println!(
        "{} nodes={} edges={} people={} topics={} decisions={} density={:.4}",
        "[GRAPH]".blue().bold(),
        stats.total_nodes,
        stats.total_edges,
        stats.people_count,
        stats.topics_count,
        stats.decisions_count,
        stats.density
    );
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
