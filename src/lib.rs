//! Chief of Staff - organizational knowledge graph, versioned truth store and
//! rule-based advisory agents.

pub mod agents;
pub mod config;
pub mod display;
pub mod events;
pub mod graph;
pub mod orchestrator;
pub mod server;
pub mod text;
pub mod truth;
