//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub analysis: AnalysisConfig,
    pub server: ServerConfig,
}

/// Locations of the snapshot and input files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Graph snapshot (`{nodes, links}`).
    pub graph: PathBuf,
    /// Truth store snapshot (`{id: entry}`).
    pub truth: PathBuf,
    /// Enriched events list.
    pub events: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let processed = PathBuf::from("data").join("processed");
        Self {
            graph: processed.join("graph.json"),
            truth: processed.join("truth.json"),
            events: processed.join("events_enriched.json"),
        }
    }
}

/// Time windows and thresholds used by the agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Window for "what changed", conflicts and overload.
    pub window_hours: u32,
    /// Window for per-person recent changes.
    pub context_window_hours: u32,
    /// A person is overloaded above this many relevant changes.
    pub overload_threshold: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_hours: 24,
            context_window_hours: 48,
            overload_threshold: 10,
        }
    }
}

/// HTTP binding settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allow any origin.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_permissive: true,
        }
    }
}
