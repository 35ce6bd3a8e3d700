//! Graph snapshot error types.

use std::path::PathBuf;

/// Errors that can occur reading or writing a graph snapshot.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    /// Failed to read the snapshot file.
    #[error("Failed to read graph snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot is not valid `{nodes, links}` JSON.
    #[error("Failed to parse graph snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to create the parent directory or write the file.
    #[error("Failed to write graph snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the graph.
    #[error("Graph serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
