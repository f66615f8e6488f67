//! Error types for KVS Schema

use std::path::PathBuf;

use kvs_core::{MappingError, SerializeError};

/// Schema loading and compilation errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Invalid JSON
    #[error("invalid JSON schema: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid YAML
    #[error("invalid YAML schema: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File could not be read
    #[error("cannot read schema {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File extension not recognised
    #[error("unsupported schema format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    /// Compiled mapping rejected
    #[error("schema {schema}: {source}")]
    Mapping {
        /// Schema name
        schema: String,
        /// Validation failure
        #[source]
        source: MappingError,
    },

    /// Serializer could not be configured
    #[error(transparent)]
    Serializer(#[from] SerializeError),
}
