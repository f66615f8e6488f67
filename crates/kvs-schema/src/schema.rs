//! Schema documents
//!
//! A [`Schema`] is the serializable description of a mapping tree. Members
//! are tagged by `kind`:
//!
//! ```yaml
//! name: person
//! members:
//!   - { name: Name, kind: simple, mandatory: true }
//!   - { name: Age, kind: simple, type: integer }
//!   - name: Address
//!     kind: class
//!     flag: { key: HasAddress }
//!     members:
//!       - { name: Street, kind: simple, mandatory: true }
//!   - { name: Tags, kind: value_collection, keys: aggregate }
//! ```

use std::path::Path;

use kvs_core::{CollectionKeyType, KeyValueSerializer, SerializerConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::value::ValueType;

/// Root of a schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name (for messages)
    pub name: String,

    /// Prefix applied to every key unless the config sets one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Root members
    #[serde(default)]
    pub members: Vec<MemberSchema>,
}

/// One member of a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSchema {
    /// Property name in the JSON object (also the default key)
    pub name: String,

    /// Key overriding the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Absence or invalidity aborts the enclosing class
    #[serde(default)]
    pub mandatory: bool,

    /// Sibling flag key gating the member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<FlagSchema>,

    /// Node kind and its settings
    #[serde(flatten)]
    pub kind: MemberKind,
}

/// Flag key settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSchema {
    /// Flag key name
    pub key: String,

    /// Required value (any value when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Kind-specific member settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberKind {
    /// Single scalar
    Simple {
        /// Scalar type
        #[serde(rename = "type", default)]
        value_type: ValueType,
    },

    /// Nested object
    Class {
        /// Object members
        #[serde(default)]
        members: Vec<MemberSchema>,
    },

    /// Value spread over component keys
    ///
    /// Without `join` the value is an object of component strings; with
    /// `join` it is one string split on (and joined with) that text.
    Composite {
        /// Component identifiers, in order
        components: Vec<String>,
        /// Join text for string composites
        #[serde(default, skip_serializing_if = "Option::is_none")]
        join: Option<String>,
    },

    /// Array of scalars
    ValueCollection {
        /// Item type
        #[serde(rename = "type", default)]
        value_type: ValueType,
        /// Key layout
        #[serde(default)]
        keys: CollectionKeyType,
        /// Aggregate separator overriding the configured one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        separator: Option<String>,
    },

    /// Array of objects
    ClassCollection {
        /// Item members
        #[serde(default)]
        members: Vec<MemberSchema>,
    },
}

impl Schema {
    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, has an unknown extension,
    /// or is not a valid schema
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let schema = match extension.as_str() {
            "json" => Self::from_json_str(&text)?,
            "yaml" | "yml" => Self::from_yaml_str(&text)?,
            other => return Err(SchemaError::UnsupportedFormat(other.to_string())),
        };
        tracing::debug!(path = %path.display(), schema = %schema.name, "schema loaded");
        Ok(schema)
    }

    /// Build a serializer for JSON objects described by this schema
    ///
    /// The schema prefix is applied when `config` does not set one.
    ///
    /// # Errors
    /// Returns error if the schema does not compile or the config is invalid
    pub fn serializer(
        &self,
        mut config: SerializerConfig,
    ) -> Result<KeyValueSerializer<Value>, SchemaError> {
        let mapping = self.compile()?;
        if config.naming.prefix.is_none() {
            config.naming.prefix.clone_from(&self.prefix);
        }
        Ok(KeyValueSerializer::new(mapping).with_config(config)?)
    }
}
