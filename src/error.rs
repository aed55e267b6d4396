//! Error types for rulecast.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for rulecast operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A rule source could not be read
    #[error("failed to read rule source {path:?}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing was requested before a title was set
    #[error("rule set `{id}` has no title")]
    MissingTitle { id: String },

    /// Writing was requested before a description was set
    #[error("rule set `{id}` has no description")]
    MissingDescription { id: String },

    /// Accumulated state was read while ingestion was still queued
    #[error("rule set `{id}` still has pending ingestion; call settle() first")]
    IngestionPending { id: String },

    /// Ingestion failed earlier or its worker panicked
    #[error("ingestion worker for rule set `{id}` aborted")]
    IngestionAborted { id: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for rulecast operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_rule_set() {
        let err = Error::IngestionPending {
            id: "reject".to_string(),
        };
        assert!(err.to_string().contains("`reject`"));

        let err = Error::MissingTitle {
            id: "cdn".to_string(),
        };
        assert_eq!(err.to_string(), "rule set `cdn` has no title");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
