//! Flat key/value collections
//!
//! Provides [`KeyValueCollection`], the insertion-ordered string dictionary
//! that mappings read from and write to, with form-urlencoded helpers.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Separator used when a query string repeats a key
pub const REPEATED_KEY_SEPARATOR: char = ',';

/// Insertion-ordered `String → String` dictionary
///
/// Serialization output preserves the declaration order of the mapping that
/// produced it, so rendered query strings are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValueCollection(IndexMap<String, String>);

impl KeyValueCollection {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Create empty collection with capacity
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    /// Parse `application/x-www-form-urlencoded` text
    ///
    /// A leading `?` is ignored and pairs with an empty key are dropped.
    /// Repeated keys are joined with [`REPEATED_KEY_SEPARATOR`] in order of
    /// appearance, which is how multi-select form fields arrive.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut collection = Self::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            match collection.0.get_mut(&*key) {
                Some(existing) => {
                    existing.push(REPEATED_KEY_SEPARATOR);
                    existing.push_str(&value);
                }
                None => {
                    collection.0.insert(key.into_owned(), value.into_owned());
                }
            }
        }

        collection
    }

    /// Render as `application/x-www-form-urlencoded` text
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Get value for key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Check if key is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert value, returning the previous one
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove key, preserving the order of the remaining entries
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    /// Drop every entry after the first `len`
    ///
    /// Used to roll back everything written since a known length.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if collection is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in insertion order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over keys in insertion order
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Consume into the underlying map
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, String> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueCollection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for KeyValueCollection {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.0.insert(key.into(), value.into());
        }
    }
}

impl IntoIterator for KeyValueCollection {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<HashMap<String, String>> for KeyValueCollection {
    /// Hash maps have no order; keys are sorted for a stable result
    fn from(map: HashMap<String, String>) -> Self {
        let mut entries: Vec<_> = map.into_iter().collect();
        entries.sort();
        entries.into_iter().collect()
    }
}

impl From<BTreeMap<String, String>> for KeyValueCollection {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<IndexMap<String, String>> for KeyValueCollection {
    fn from(map: IndexMap<String, String>) -> Self {
        Self(map)
    }
}
