//! Key naming policies
//!
//! Provides the [`KeyNamingPolicy`] trait that turns a structural
//! [`KeyPath`] into the concrete string key stored in a flat collection.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::path::{KeyPath, KeySegment};

/// Policy object shared between mapping nodes
pub type SharedNamingPolicy = Arc<dyn KeyNamingPolicy>;

/// Strategy for naming dictionary keys
///
/// Implementations must be deterministic: the key rendered for a path is
/// the key that will be looked up when reading it back, and
/// [`index_in`](KeyNamingPolicy::index_in) must recognise every key that
/// [`key_for`](KeyNamingPolicy::key_for) renders below a collection path.
pub trait KeyNamingPolicy: Send + Sync + Debug {
    /// Render the dictionary key for a node path
    ///
    /// A trailing [`KeySegment::Component`] names one component of a
    /// composite value.
    fn key_for(&self, path: &KeyPath) -> String;

    /// Recognise a collection item key
    ///
    /// Given the rendered key of a collection and any key of the input,
    /// returns the item index when `key` addresses that item or something
    /// below it.
    fn index_in(&self, collection_key: &str, key: &str) -> Option<usize>;

    /// Policy name (for debugging/diagnostics)
    fn name(&self) -> &'static str;
}

/// Dotted naming with bracketed indices
///
/// # Examples
/// - `Address.Street`
/// - `Pets[0].Name`
/// - `Birthday.Day` (composite component)
/// - `person.Name` (with prefix `person`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultKeyNamingPolicy {
    separator: String,
    component_separator: String,
    index_open: String,
    index_close: String,
    prefix: Option<String>,
}

impl DefaultKeyNamingPolicy {
    /// Create policy with default delimiters
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            separator: ".".to_string(),
            component_separator: ".".to_string(),
            index_open: "[".to_string(),
            index_close: "]".to_string(),
            prefix: None,
        }
    }

    /// Set property separator
    #[inline]
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set composite component separator
    #[inline]
    #[must_use]
    pub fn with_component_separator(mut self, separator: impl Into<String>) -> Self {
        self.component_separator = separator.into();
        self
    }

    /// Set index delimiters
    #[inline]
    #[must_use]
    pub fn with_index_delimiters(
        mut self,
        open: impl Into<String>,
        close: impl Into<String>,
    ) -> Self {
        self.index_open = open.into();
        self.index_close = close.into();
        self
    }

    /// Set root prefix
    #[inline]
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Property separator
    #[inline]
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Root prefix (if any)
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Wrap into a shared policy
    #[inline]
    #[must_use]
    pub fn shared(self) -> SharedNamingPolicy {
        Arc::new(self)
    }
}

impl Default for DefaultKeyNamingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyNamingPolicy for DefaultKeyNamingPolicy {
    fn key_for(&self, path: &KeyPath) -> String {
        let mut key = self.prefix.clone().unwrap_or_default();

        for segment in path.iter() {
            match segment {
                KeySegment::Property(name) => {
                    if !key.is_empty() {
                        key.push_str(&self.separator);
                    }
                    key.push_str(name);
                }
                KeySegment::Component(id) => {
                    if !key.is_empty() {
                        key.push_str(&self.component_separator);
                    }
                    key.push_str(id);
                }
                KeySegment::Index(index) => {
                    key.push_str(&self.index_open);
                    key.push_str(&index.to_string());
                    key.push_str(&self.index_close);
                }
            }
        }

        key
    }

    fn index_in(&self, collection_key: &str, key: &str) -> Option<usize> {
        let rest = key
            .strip_prefix(collection_key)?
            .strip_prefix(self.index_open.as_str())?;

        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let index = rest[..digits].parse::<usize>().ok()?;

        let tail = rest[digits..].strip_prefix(self.index_close.as_str())?;
        let continues = tail.is_empty()
            || tail.starts_with(self.separator.as_str())
            || tail.starts_with(self.index_open.as_str())
            || tail.starts_with(self.component_separator.as_str());

        continues.then_some(index)
    }

    fn name(&self) -> &'static str {
        "default"
    }
}

/// Serializable settings for [`DefaultKeyNamingPolicy`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyNamingConfig {
    /// Separator between property names
    pub separator: String,

    /// Separator before a composite component identifier
    pub component_separator: String,

    /// Opening index delimiter
    pub index_open: String,

    /// Closing index delimiter
    pub index_close: String,

    /// Prefix prepended to every key
    pub prefix: Option<String>,
}

impl KeyNamingConfig {
    /// Check delimiters are usable
    ///
    /// # Errors
    /// Returns error if a delimiter is empty or an index delimiter contains
    /// digits (which would make indices ambiguous).
    pub fn validate(&self) -> Result<(), NamingError> {
        for (field, value) in [
            ("separator", &self.separator),
            ("component_separator", &self.component_separator),
            ("index_open", &self.index_open),
            ("index_close", &self.index_close),
        ] {
            if value.is_empty() {
                return Err(NamingError::EmptyDelimiter(field));
            }
        }

        let has_digit = |s: &str| s.chars().any(|c| c.is_ascii_digit());
        if has_digit(&self.index_open) || has_digit(&self.index_close) {
            return Err(NamingError::DigitInIndexDelimiter);
        }

        if matches!(&self.prefix, Some(prefix) if prefix.is_empty()) {
            return Err(NamingError::EmptyDelimiter("prefix"));
        }

        Ok(())
    }

    /// Build the policy described by this config
    #[must_use]
    pub fn to_policy(&self) -> DefaultKeyNamingPolicy {
        let policy = DefaultKeyNamingPolicy::new()
            .with_separator(self.separator.clone())
            .with_component_separator(self.component_separator.clone())
            .with_index_delimiters(self.index_open.clone(), self.index_close.clone());

        match &self.prefix {
            Some(prefix) => policy.with_prefix(prefix.clone()),
            None => policy,
        }
    }
}

impl Default for KeyNamingConfig {
    fn default() -> Self {
        Self {
            separator: ".".to_string(),
            component_separator: ".".to_string(),
            index_open: "[".to_string(),
            index_close: "]".to_string(),
            prefix: None,
        }
    }
}

/// Errors in naming settings
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NamingError {
    /// Delimiter or prefix is empty
    #[error("{0} must not be empty")]
    EmptyDelimiter(&'static str),

    /// Index delimiters must not contain digits
    #[error("index delimiters must not contain digits")]
    DigitInIndexDelimiter,
}
