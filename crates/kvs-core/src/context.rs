//! Walk state shared by mapping nodes
//!
//! [`ReadContext`] and [`WriteContext`] carry the input/output collection,
//! the active [`SerializerConfig`] and the diagnostics gathered so far.
//! [`Scope`] tracks where in the key space a node sits.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use kvs_key::{KeyNamingPolicy, KeyPath, KeyValueCollection};

use crate::config::SerializerConfig;
use crate::mapping::{FlagKey, MappingOptions};

/// Non-fatal event recorded during a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Key of the node the event belongs to
    pub key: String,
    /// What happened
    pub kind: DiagnosticKind,
}

/// Kind of [`Diagnostic`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Optional value could not be converted and was dropped
    InvalidValue {
        /// Conversion failure
        reason: String,
    },

    /// Collection item dropped
    ItemSkipped {
        /// Item index (input index when reading, item position when writing)
        index: usize,
        /// Why it was dropped
        reason: String,
    },

    /// Optional branch abandoned because a mandatory node below it failed
    BranchAborted {
        /// Failure that caused the abort
        cause: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::InvalidValue { reason } => {
                write!(f, "{}: invalid value dropped ({reason})", self.key)
            }
            DiagnosticKind::ItemSkipped { index, reason } => {
                write!(f, "{}: item {index} skipped ({reason})", self.key)
            }
            DiagnosticKind::BranchAborted { cause } => {
                write!(f, "{}: branch aborted ({cause})", self.key)
            }
        }
    }
}

/// Result value paired with the diagnostics of the walk that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report<V> {
    /// Produced value
    pub value: V,
    /// Non-fatal events, in the order they happened
    pub diagnostics: Vec<Diagnostic>,
}

impl<V> Report<V> {
    /// Check if the walk recorded nothing
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Discard diagnostics
    #[inline]
    pub fn into_value(self) -> V {
        self.value
    }
}

/// Position of a node in the key space
///
/// Carries the structural path and the naming policy in effect for the
/// subtree. A node's naming override replaces the policy for itself and
/// everything below it.
#[derive(Debug, Clone)]
pub struct Scope<'p> {
    path: KeyPath,
    policy: &'p dyn KeyNamingPolicy,
}

impl<'p> Scope<'p> {
    /// Root scope
    #[inline]
    #[must_use]
    pub fn root(policy: &'p dyn KeyNamingPolicy) -> Self {
        Self {
            path: KeyPath::root(),
            policy,
        }
    }

    /// Structural path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    /// Naming policy in effect
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &'p dyn KeyNamingPolicy {
        self.policy
    }

    /// Rendered key of this scope
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        self.policy.key_for(&self.path)
    }

    /// Rendered key of a component below this scope
    #[inline]
    #[must_use]
    pub fn component_key(&self, id: &str) -> String {
        self.policy.key_for(&self.path.component(id))
    }

    /// Scope of a member described by `options`
    #[must_use]
    pub fn descend<'a>(&'a self, options: &'a MappingOptions) -> Scope<'a> {
        Scope {
            path: self.path.property(options.key()),
            policy: options.naming().unwrap_or(self.policy),
        }
    }

    /// Scope of a collection item
    #[inline]
    #[must_use]
    pub fn item(&self, index: usize) -> Self {
        Self {
            path: self.path.index(index),
            policy: self.policy,
        }
    }

    /// Rendered flag key of a member
    ///
    /// Flag keys are siblings of the member: they live under the parent
    /// path, named with the member's policy.
    #[inline]
    #[must_use]
    pub fn flag_key(&self, parent: &Scope<'_>, flag: &FlagKey) -> String {
        self.policy.key_for(&parent.path.property(flag.key()))
    }
}

/// State of a deserialization walk
#[derive(Debug)]
pub struct ReadContext<'a> {
    input: &'a KeyValueCollection,
    config: &'a SerializerConfig,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ReadContext<'a> {
    /// Create context over an input collection
    #[inline]
    #[must_use]
    pub fn new(input: &'a KeyValueCollection, config: &'a SerializerConfig) -> Self {
        Self {
            input,
            config,
            diagnostics: Vec::new(),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &'a SerializerConfig {
        self.config
    }

    /// Look up a key
    ///
    /// Empty values count as missing when
    /// [`empty_values_are_missing`](SerializerConfig::empty_values_are_missing)
    /// is set.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&'a str> {
        let value = self
            .input
            .get(key)
            .filter(|v| !(v.is_empty() && self.config.empty_values_are_missing));
        tracing::trace!(key, found = value.is_some(), "key lookup");
        value
    }

    /// Item indices present below a collection key, in ascending order
    #[must_use]
    pub fn indices(&self, policy: &dyn KeyNamingPolicy, collection_key: &str) -> BTreeSet<usize> {
        self.input
            .iter()
            .filter(|(_, v)| !(v.is_empty() && self.config.empty_values_are_missing))
            .filter_map(|(k, _)| policy.index_in(collection_key, k))
            .collect()
    }

    /// Record a non-fatal event
    pub fn record(&mut self, key: impl Into<String>, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            key: key.into(),
            kind,
        };
        tracing::debug!(%diagnostic, "deserialize");
        self.diagnostics.push(diagnostic);
    }

    /// Diagnostics recorded so far
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Finish the walk
    #[inline]
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// State of a serialization walk
#[derive(Debug)]
pub struct WriteContext<'a> {
    output: KeyValueCollection,
    config: &'a SerializerConfig,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> WriteContext<'a> {
    /// Create context with an empty output collection
    #[inline]
    #[must_use]
    pub fn new(config: &'a SerializerConfig) -> Self {
        Self {
            output: KeyValueCollection::new(),
            config,
            diagnostics: Vec::new(),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &'a SerializerConfig {
        self.config
    }

    /// Write a key
    pub fn write(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        tracing::trace!(key = %key, "key write");
        self.output.insert(key, value);
    }

    /// Current output length, for a later [`rollback`](Self::rollback)
    #[inline]
    #[must_use]
    pub fn mark(&self) -> usize {
        self.output.len()
    }

    /// Remove everything written since `mark`
    #[inline]
    pub fn rollback(&mut self, mark: usize) {
        self.output.truncate(mark);
    }

    /// Output written so far
    #[inline]
    #[must_use]
    pub fn output(&self) -> &KeyValueCollection {
        &self.output
    }

    /// Record a non-fatal event
    pub fn record(&mut self, key: impl Into<String>, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            key: key.into(),
            kind,
        };
        tracing::debug!(%diagnostic, "serialize");
        self.diagnostics.push(diagnostic);
    }

    /// Finish the walk
    #[inline]
    #[must_use]
    pub fn finish(self) -> (KeyValueCollection, Vec<Diagnostic>) {
        (self.output, self.diagnostics)
    }
}
