//! Error types for KVS Core
//!
//! Provides error handling for:
//! - Mandatory values that are missing or invalid (branch aborts)
//! - Collection limits
//! - Mapping configuration problems
//! - Serializer configuration loading

use std::path::PathBuf;

use kvs_key::NamingError;

/// Errors raised while walking a mapping tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// Mandatory value has no key, or its serializer produced nothing
    #[error("mandatory value missing: {key}")]
    MissingMandatory {
        /// Key of the missing node
        key: String,
    },

    /// Value present but not convertible
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Key of the invalid node
        key: String,
        /// Conversion failure
        reason: String,
    },

    /// Collection larger than the configured limit
    #[error("{key}: {count} items exceed the limit of {limit}")]
    LimitExceeded {
        /// Key of the collection
        key: String,
        /// Number of items found
        count: usize,
        /// Configured maximum
        limit: usize,
    },

    /// Mapping tree is not usable
    #[error("invalid mapping: {0}")]
    Configuration(String),
}

impl MappingError {
    /// Create missing mandatory error
    #[inline]
    #[must_use]
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingMandatory { key: key.into() }
    }

    /// Create invalid value error
    #[inline]
    #[must_use]
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error aborts only the enclosing branch
    ///
    /// Branch aborts are absorbed by the nearest non-mandatory ancestor.
    /// Every other error stops the whole operation.
    #[inline]
    #[must_use]
    pub fn is_branch_abort(&self) -> bool {
        matches!(
            self,
            Self::MissingMandatory { .. } | Self::InvalidValue { .. }
        )
    }

    /// Key the error refers to (if any)
    #[inline]
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MissingMandatory { key }
            | Self::InvalidValue { key, .. }
            | Self::LimitExceeded { key, .. } => Some(key),
            Self::Configuration(_) => None,
        }
    }
}

/// Serializer configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid JSON
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid YAML
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File extension not recognised
    #[error("unsupported config format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    /// Naming settings rejected
    #[error("naming: {0}")]
    Naming(#[from] NamingError),

    /// Setting out of range
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create invalid setting error
    #[inline]
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors returned by [`KeyValueSerializer`](crate::KeyValueSerializer)
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// Mapping walk failed
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Serializer configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SerializeError {
    /// Underlying mapping error (if any)
    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&MappingError> {
        match self {
            Self::Mapping(error) => Some(error),
            Self::Config(_) => None,
        }
    }
}
