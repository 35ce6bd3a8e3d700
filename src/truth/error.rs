//! Truth store error types.

use std::path::PathBuf;

/// Errors that can occur persisting the truth store.
#[derive(thiserror::Error, Debug)]
pub enum TruthError {
    /// Failed to create the snapshot's parent directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the snapshot file.
    #[error("Failed to write truth snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The id for the next version already belongs to another entry.
    #[error("Truth entry id {id} is already taken")]
    VersionTaken { id: String },

    /// Failed to serialize entries.
    #[error("Truth serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dir_display() {
        let err = TruthError::CreateDir {
            path: PathBuf::from("/root/truth"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("Failed to create directory"));
        assert!(err.to_string().contains("/root/truth"));
    }

    #[test]
    fn test_write_display() {
        let err = TruthError::Write {
            path: PathBuf::from("/tmp/truth.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_version_taken_display() {
        let err = TruthError::VersionTaken {
            id: "d1_v2".to_string(),
        };
        assert_eq!(err.to_string(), "Truth entry id d1_v2 is already taken");
    }
}
