//! Serializer facade
//!
//! [`KeyValueSerializer`] pairs a root [`ClassMapping`] with a
//! [`SerializerConfig`] and runs the read/write walks.

use std::fmt;

use kvs_key::{KeyValueCollection, SharedNamingPolicy};

use crate::config::SerializerConfig;
use crate::context::{ReadContext, Report, Scope, WriteContext};
use crate::error::SerializeError;
use crate::mapping::{ClassMapping, KeyDescription};

/// Serializes `T` to and from flat key/value collections
///
/// # Example
///
/// ```rust
/// use kvs_core::prelude::*;
///
/// #[derive(Default)]
/// struct Search {
///     query: Option<String>,
///     page: Option<u32>,
/// }
///
/// let mapping = ClassMappingHelper::<Search>::with_default()
///     .simple("q", |s: &Search| s.query.as_ref(), |s, v| s.query = Some(v), |m| m.mandatory())
///     .simple("page", |s: &Search| s.page.as_ref(), |s, v| s.page = Some(v), |m| m)
///     .build()
///     .unwrap();
/// let serializer = KeyValueSerializer::new(mapping);
///
/// let search = serializer.deserialize_query("q=rust+serde&page=2").unwrap().unwrap();
/// assert_eq!(search.query.as_deref(), Some("rust serde"));
/// assert_eq!(search.page, Some(2));
///
/// assert_eq!(serializer.serialize_query(&search).unwrap(), "q=rust+serde&page=2");
/// ```
pub struct KeyValueSerializer<T> {
    mapping: ClassMapping<T>,
    config: SerializerConfig,
    policy: SharedNamingPolicy,
}

impl<T: 'static> KeyValueSerializer<T> {
    /// Create serializer with default configuration
    #[must_use]
    pub fn new(mapping: ClassMapping<T>) -> Self {
        let config = SerializerConfig::default();
        Self {
            policy: config.naming_policy(),
            mapping,
            config,
        }
    }

    /// Use `config`, also replacing the naming policy with the configured one
    ///
    /// # Errors
    /// Returns error if the configuration fails validation
    pub fn with_config(mut self, config: SerializerConfig) -> Result<Self, SerializeError> {
        config.validate()?;
        self.policy = config.naming_policy();
        self.config = config;
        Ok(self)
    }

    /// Use a custom naming policy
    #[must_use]
    pub fn with_naming_policy(mut self, policy: SharedNamingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Root mapping
    #[inline]
    #[must_use]
    pub fn mapping(&self) -> &ClassMapping<T> {
        &self.mapping
    }

    fn root_scope(&self) -> Scope<'_> {
        Scope::root(self.mapping.naming().unwrap_or(&*self.policy))
    }

    /// Read an instance
    ///
    /// Returns `Ok(None)` when no mapped value is present.
    ///
    /// # Errors
    /// Returns error when a mandatory root member is absent or invalid, or
    /// a collection exceeds the configured limit.
    pub fn deserialize(&self, input: &KeyValueCollection) -> Result<Option<T>, SerializeError> {
        self.deserialize_with_report(input).map(Report::into_value)
    }

    /// Read an instance, keeping the diagnostics
    ///
    /// # Errors
    /// Same as [`deserialize`](Self::deserialize).
    pub fn deserialize_with_report(
        &self,
        input: &KeyValueCollection,
    ) -> Result<Report<Option<T>>, SerializeError> {
        tracing::debug!(keys = input.len(), "deserialize");
        let mut ctx = ReadContext::new(input, &self.config);
        let value = self.mapping.read_instance(&self.root_scope(), &mut ctx)?;
        let diagnostics = ctx.into_diagnostics();
        tracing::debug!(
            present = value.is_some(),
            diagnostics = diagnostics.len(),
            "deserialize finished"
        );
        Ok(Report { value, diagnostics })
    }

    /// Write an instance
    ///
    /// # Errors
    /// Returns error when a mandatory root member has no value, or a
    /// collection exceeds the configured limit.
    pub fn serialize(&self, source: &T) -> Result<KeyValueCollection, SerializeError> {
        self.serialize_with_report(source).map(Report::into_value)
    }

    /// Write an instance, keeping the diagnostics
    ///
    /// # Errors
    /// Same as [`serialize`](Self::serialize).
    pub fn serialize_with_report(
        &self,
        source: &T,
    ) -> Result<Report<KeyValueCollection>, SerializeError> {
        let mut ctx = WriteContext::new(&self.config);
        self.mapping.write_instance(source, &self.root_scope(), &mut ctx)?;
        let (value, diagnostics) = ctx.finish();
        tracing::debug!(
            keys = value.len(),
            diagnostics = diagnostics.len(),
            "serialize finished"
        );
        Ok(Report { value, diagnostics })
    }

    /// Read an instance from form-urlencoded text
    ///
    /// # Errors
    /// Same as [`deserialize`](Self::deserialize).
    pub fn deserialize_query(&self, query: &str) -> Result<Option<T>, SerializeError> {
        self.deserialize(&KeyValueCollection::from_query(query))
    }

    /// Write an instance as form-urlencoded text
    ///
    /// # Errors
    /// Same as [`serialize`](Self::serialize).
    pub fn serialize_query(&self, source: &T) -> Result<String, SerializeError> {
        Ok(self.serialize(source)?.to_query_string())
    }

    /// Keys the mapping reads and writes, in declaration order
    ///
    /// Members of class collection items are listed under index 0.
    #[must_use]
    pub fn describe(&self) -> Vec<KeyDescription> {
        let mut out = Vec::new();
        self.mapping.describe(&self.root_scope(), &mut out);
        out
    }
}

impl<T> fmt::Debug for KeyValueSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValueSerializer")
            .field("mapping", &self.mapping)
            .field("config", &self.config)
            .field("policy", &self.policy.name())
            .finish()
    }
}
