//! Chief of Staff - organizational memory and advisory agents.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chief_of_staff::config::{AppConfig, ConfigError, ConfigLoader};
use chief_of_staff::display;
use chief_of_staff::events::{load_events, EventsError, IngestEvent};
use chief_of_staff::graph::{build_graph, GraphError};
use chief_of_staff::orchestrator::{Orchestrator, OrchestratorError};
use chief_of_staff::server::{ApiServer, ServerError};
use chief_of_staff::truth::{populate_from_events, TruthError, TruthStore};

#[derive(Parser)]
#[command(
    name = "chief-of-staff",
    about = "Organizational knowledge graph, versioned truth and advisory agents",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to the usual search paths).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print raw JSON instead of the colored summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the knowledge graph from enriched events.
    BuildGraph {
        /// Enriched events file.
        #[arg(long)]
        events: Option<PathBuf>,
        /// Where to write the graph snapshot.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Add topics, decisions and facts from enriched events to the truth store.
    Populate {
        /// Enriched events file.
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Ask a free-text question.
    Query {
        /// The question, e.g. "what changed today?".
        text: String,
    },
    /// Apply one new event from a JSON file.
    Ingest {
        /// File holding a single event object.
        event: PathBuf,
    },
    /// Show the version chain of a truth entry.
    History {
        /// Logical entry id (without a `_vN` suffix).
        id: String,
    },
    /// Serve the HTTP API.
    Serve {
        /// Override the configured bind host.
        #[arg(long)]
        host: Option<String>,
        /// Override the configured port.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Events(#[from] EventsError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Truth(#[from] TruthError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("Failed to read event file {path}: {source}")]
    ReadEvent {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse event file {path}: {source}")]
    ParseEvent {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON output failed: {0}")]
    Output(#[from] serde_json::Error),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => ConfigLoader::with_path(path).load(),
        None => ConfigLoader::new().load(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_event(path: &Path) -> Result<IngestEvent, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadEvent {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::ParseEvent {
        path: path.to_path_buf(),
        source,
    })
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = load_config(cli.config)?;

    match cli.command {
        Commands::BuildGraph { events, output } => {
            let events_path = events.unwrap_or(config.paths.events);
            let output = output.unwrap_or(config.paths.graph);
            let events = load_events(&events_path)?;
            let graph = build_graph(&events);
            graph.save(&output)?;
            tracing::info!(path = %output.display(), "Graph snapshot written");
            if cli.json {
                print_json(&graph.stats())?;
            } else {
                display::print_graph_stats(&graph.stats());
            }
        }
        Commands::Populate { events } => {
            let events_path = events.unwrap_or(config.paths.events);
            let events = load_events(&events_path)?;
            let mut store = TruthStore::open(&config.paths.truth);
            let added = populate_from_events(&events, &mut store)?;
            if cli.json {
                print_json(&serde_json::json!({
                    "events": events.len(),
                    "entries_added": added,
                    "total_entries": store.len(),
                }))?;
            } else {
                println!(
                    "Added {added} entries from {} events ({} total)",
                    events.len(),
                    store.len()
                );
            }
        }
        Commands::Query { text } => {
            let orchestrator = Orchestrator::open(&config.paths).with_analysis(config.analysis);
            let response = orchestrator.process_query(&text);
            if cli.json {
                print_json(&response)?;
            } else {
                display::print_response(&response);
            }
        }
        Commands::Ingest { event } => {
            let event = read_event(&event)?;
            let mut orchestrator =
                Orchestrator::open(&config.paths).with_analysis(config.analysis);
            let summary = orchestrator.simulate_event_update(event)?;
            if cli.json {
                print_json(&summary)?;
            } else {
                display::print_ingest_summary(&summary);
            }
        }
        Commands::History { id } => {
            let store = TruthStore::open(&config.paths.truth);
            let history = store.history(&id);
            if cli.json {
                print_json(&history)?;
            } else {
                display::print_history(&id, &history);
            }
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let orchestrator = Orchestrator::open(&config.paths).with_analysis(config.analysis);
            let server = ApiServer::new(orchestrator).with_config(config.server);
            let cancel = server.cancel_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });
            server.run().await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
