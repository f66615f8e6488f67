//! Serializer configuration
//!
//! [`SerializerConfig`] holds the settings shared by every mapping walk. It
//! can be built in code or loaded from JSON/YAML.

use std::path::Path;

use kvs_key::{KeyNamingConfig, SharedNamingPolicy};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings applied by [`KeyValueSerializer`](crate::KeyValueSerializer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Default key naming policy settings
    pub naming: KeyNamingConfig,

    /// Separator for aggregate (single-key) collections
    pub aggregate_separator: String,

    /// Value written for flag keys without an explicit value
    pub default_flag_value: String,

    /// Treat `key=` the same as an absent key
    pub empty_values_are_missing: bool,

    /// Maximum number of items read or written per collection
    pub max_collection_items: usize,
}

impl SerializerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With naming settings
    #[inline]
    #[must_use]
    pub fn with_naming(mut self, naming: KeyNamingConfig) -> Self {
        self.naming = naming;
        self
    }

    /// With aggregate separator
    #[inline]
    #[must_use]
    pub fn with_aggregate_separator(mut self, separator: impl Into<String>) -> Self {
        self.aggregate_separator = separator.into();
        self
    }

    /// With default flag value
    #[inline]
    #[must_use]
    pub fn with_default_flag_value(mut self, value: impl Into<String>) -> Self {
        self.default_flag_value = value.into();
        self
    }

    /// With empty-value handling
    #[inline]
    #[must_use]
    pub fn with_empty_values_are_missing(mut self, enabled: bool) -> Self {
        self.empty_values_are_missing = enabled;
        self
    }

    /// With collection item limit
    #[inline]
    #[must_use]
    pub fn with_max_collection_items(mut self, max: usize) -> Self {
        self.max_collection_items = max;
        self
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid or the settings fail validation
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid or the settings fail validation
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, has an unknown extension,
    /// or does not hold valid settings
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "loading serializer config");

        match extension.as_str() {
            "json" => Self::from_json_str(&text),
            "yaml" | "yml" => Self::from_yaml_str(&text),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Check settings are usable
    ///
    /// # Errors
    /// Returns the first rejected setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.naming.validate()?;

        if self.aggregate_separator.is_empty() {
            return Err(ConfigError::invalid(
                "aggregate_separator",
                "must not be empty",
            ));
        }
        if self.max_collection_items == 0 {
            return Err(ConfigError::invalid(
                "max_collection_items",
                "must be greater than zero",
            ));
        }
        if self.empty_values_are_missing && self.default_flag_value.is_empty() {
            return Err(ConfigError::invalid(
                "default_flag_value",
                "an empty flag value would read back as missing",
            ));
        }

        Ok(())
    }

    /// Build the naming policy described by [`naming`](Self::naming)
    #[inline]
    #[must_use]
    pub fn naming_policy(&self) -> SharedNamingPolicy {
        self.naming.to_policy().shared()
    }
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            naming: KeyNamingConfig::default(),
            aggregate_separator: ",".to_string(),
            default_flag_value: "true".to_string(),
            empty_values_are_missing: true,
            max_collection_items: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = SerializerConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.aggregate_separator, ",");
        assert_eq!(config.default_flag_value, "true");
        assert!(config.empty_values_are_missing);
        assert_eq!(config.max_collection_items, 1000);
    }

    #[test]
    fn builder_methods() {
        let config = SerializerConfig::new()
            .with_aggregate_separator(";")
            .with_default_flag_value("on")
            .with_empty_values_are_missing(false)
            .with_max_collection_items(5);
        assert_eq!(config.aggregate_separator, ";");
        assert_eq!(config.default_flag_value, "on");
        assert!(!config.empty_values_are_missing);
        assert_eq!(config.max_collection_items, 5);
    }

    #[test]
    fn from_yaml_fills_defaults() {
        let config = SerializerConfig::from_yaml_str(
            "aggregate_separator: \"|\"\nnaming:\n  separator: \"_\"\n",
        )
        .unwrap();
        assert_eq!(config.aggregate_separator, "|");
        assert_eq!(config.naming.separator, "_");
        assert_eq!(config.naming.index_open, "[");
        assert_eq!(config.max_collection_items, 1000);
    }

    #[test]
    fn from_json_rejects_invalid_settings() {
        let err = SerializerConfig::from_json_str(r#"{"max_collection_items": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "max_collection_items",
                ..
            }
        ));

        let err = SerializerConfig::from_json_str(r#"{"naming": {"separator": ""}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Naming(_)));
    }

    #[test]
    fn empty_flag_value_needs_empty_values_kept() {
        let config = SerializerConfig::new().with_default_flag_value("");
        assert!(config.validate().is_err());
        assert!(config.with_empty_values_are_missing(false).validate().is_ok());
    }

    #[test]
    fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("kvs.yml");
        let mut file = std::fs::File::create(&yaml_path).unwrap();
        writeln!(file, "default_flag_value: \"yes\"").unwrap();
        let config = SerializerConfig::load(&yaml_path).unwrap();
        assert_eq!(config.default_flag_value, "yes");

        let json_path = dir.path().join("kvs.json");
        std::fs::write(&json_path, r#"{"aggregate_separator": ";"}"#).unwrap();
        let config = SerializerConfig::load(&json_path).unwrap();
        assert_eq!(config.aggregate_separator, ";");

        let toml_path = dir.path().join("kvs.toml");
        std::fs::write(&toml_path, "").unwrap();
        assert!(matches!(
            SerializerConfig::load(&toml_path),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            SerializerConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn naming_policy_follows_config() {
        let mut config = SerializerConfig::new();
        config.naming.prefix = Some("form".to_string());
        let policy = config.naming_policy();
        assert_eq!(policy.key_for(&kvs_key::KeyPath::single("Name")), "form.Name");
    }
}
