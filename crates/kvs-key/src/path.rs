//! Structural key paths
//!
//! Provides [`KeyPath`] for addressing a mapping node inside the flat
//! key/value space, independently of how a naming policy renders it.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One step of a [`KeyPath`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeySegment {
    /// Named property of a class
    Property(String),

    /// Position of an item inside a collection
    Index(usize),

    /// Identifier of one component of a composite value
    Component(String),
}

impl KeySegment {
    /// Name carried by a property or component segment
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Property(name) | Self::Component(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    /// Check if this is an index segment
    #[inline]
    #[must_use]
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

/// Path of a mapping node from the root mapping
///
/// The root mapping has the empty path. Properties, collection indices and
/// composite components append segments.
///
/// # Examples
/// - `[Property("Address"), Property("Street")]` → `Address.Street`
/// - `[Property("Pets"), Index(0), Property("Name")]` → `Pets[0].Name`
/// - `[Property("Birthday"), Component("Day")]` → `Birthday.Day`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeyPath(Vec<KeySegment>);

impl KeyPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<KeySegment>) -> Self {
        Self(segments)
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create path from a single property name
    #[inline]
    #[must_use]
    pub fn single(name: impl Into<String>) -> Self {
        Self(vec![KeySegment::Property(name.into())])
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a property segment, returning new path
    #[inline]
    #[must_use]
    pub fn property(&self, name: impl Into<String>) -> Self {
        self.with(KeySegment::Property(name.into()))
    }

    /// Append an index segment, returning new path
    #[inline]
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.with(KeySegment::Index(index))
    }

    /// Append a component segment, returning new path
    #[inline]
    #[must_use]
    pub fn component(&self, id: impl Into<String>) -> Self {
        self.with(KeySegment::Component(id.into()))
    }

    fn with(&self, segment: KeySegment) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment);
        Self(segments)
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&KeySegment> {
        self.0.last()
    }

    /// Get first segment (if not root)
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&KeySegment> {
        self.0.first()
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Check if this path is an ancestor of another (strict prefix)
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &KeySegment> {
        self.0.iter()
    }
}

impl Display for KeyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            match segment {
                KeySegment::Property(name) | KeySegment::Component(name) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                KeySegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = PathError;

    /// Parse the canonical dotted form
    ///
    /// Composite components cannot be told apart from properties in text,
    /// so every name parses as [`KeySegment::Property`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in s.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(open) => part.split_at(open),
                None => (part, ""),
            };

            if name.is_empty() {
                return Err(PathError::EmptySegment);
            }
            if name.contains(|c: char| !c.is_alphanumeric() && c != '_') {
                return Err(PathError::InvalidSegment(name.to_string()));
            }
            segments.push(KeySegment::Property(name.to_string()));

            while !rest.is_empty() {
                let inner = rest
                    .strip_prefix('[')
                    .and_then(|r| r.split_once(']'))
                    .ok_or_else(|| PathError::MalformedIndex(part.to_string()))?;
                let index = inner
                    .0
                    .parse::<usize>()
                    .map_err(|_| PathError::MalformedIndex(part.to_string()))?;
                segments.push(KeySegment::Index(index));
                rest = inner.1;
            }
        }

        Ok(Self(segments))
    }
}

impl From<Vec<KeySegment>> for KeyPath {
    fn from(segments: Vec<KeySegment>) -> Self {
        Self(segments)
    }
}

/// Errors related to key paths
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Invalid segment characters
    #[error("invalid segment: {0} (must be alphanumeric or underscore)")]
    InvalidSegment(String),

    /// Index suffix that is not `[digits]`
    #[error("malformed index in segment: {0}")]
    MalformedIndex(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str) -> KeySegment {
        KeySegment::Property(name.to_string())
    }

    #[test]
    fn path_root() {
        let path = KeyPath::root();
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "");
        assert!(path.parent().is_none());
    }

    #[test]
    fn path_builders_append() {
        let path = KeyPath::root().property("Pets").index(2).property("Name");
        assert_eq!(
            path.segments(),
            &[prop("Pets"), KeySegment::Index(2), prop("Name")]
        );
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn path_display_renders_canonical_form() {
        let path = KeyPath::single("Pets").index(0).property("Name");
        assert_eq!(path.to_string(), "Pets[0].Name");

        let composite = KeyPath::single("Birthday").component("Day");
        assert_eq!(composite.to_string(), "Birthday.Day");
    }

    #[test]
    fn path_parent_and_last() {
        let path = KeyPath::single("Address").property("Street");
        assert_eq!(path.parent(), Some(KeyPath::single("Address")));
        assert_eq!(path.last(), Some(&prop("Street")));
        assert_eq!(path.first(), Some(&prop("Address")));
    }

    #[test]
    fn path_prefix_relations() {
        let parent = KeyPath::single("a");
        let child = parent.index(1).property("b");

        assert!(parent.is_prefix_of(&child));
        assert!(parent.is_ancestor_of(&child));
        assert!(parent.is_prefix_of(&parent));
        assert!(!parent.is_ancestor_of(&parent));
        assert!(!child.is_prefix_of(&parent));
    }

    #[test]
    fn path_from_str_with_indices() {
        let path: KeyPath = "Grid[1][2].Cell".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                prop("Grid"),
                KeySegment::Index(1),
                KeySegment::Index(2),
                prop("Cell")
            ]
        );
    }

    #[test]
    fn path_from_str_empty_is_root() {
        let path: KeyPath = "".parse().unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn path_from_str_rejects_bad_input() {
        assert_eq!("a..b".parse::<KeyPath>(), Err(PathError::EmptySegment));
        assert!(matches!(
            "a.b-c".parse::<KeyPath>(),
            Err(PathError::InvalidSegment(_))
        ));
        assert!(matches!(
            "a[x]".parse::<KeyPath>(),
            Err(PathError::MalformedIndex(_))
        ));
        assert!(matches!(
            "a[1".parse::<KeyPath>(),
            Err(PathError::MalformedIndex(_))
        ));
    }

    #[test]
    fn segment_helpers() {
        assert_eq!(prop("x").name(), Some("x"));
        assert_eq!(KeySegment::Index(3).name(), None);
        assert!(KeySegment::Index(3).is_index());
    }
}
