//! Mapping model
//!
//! A mapping tree describes how an object graph is laid out in a flat
//! key/value collection. The root is a [`ClassMapping`]; every property of
//! a class is a member node implementing [`MemberMapping`].
//!
//! # Node Kinds
//!
//! - [`SimpleMapping`]: one key holding one converted value
//! - [`NestedClassMapping`]: a class-typed property whose members live below it
//! - [`CompositeMapping`]: one value spread over several component keys
//! - [`ValueCollectionMapping`]: a `Vec` of values, aggregated or indexed
//! - [`ClassCollectionMapping`]: a `Vec` of classes, always indexed
//!
//! Mandatory and flag handling is shared by every kind and lives in this
//! module.

mod class;
mod collection;
mod composite;
mod simple;

pub use class::{ClassMapping, NestedClassMapping};
pub use collection::{ClassCollectionMapping, CollectionKeyType, ValueCollectionMapping};
pub use composite::{AssembleFn, CheckFn, Component, CompositeMapping, CompositeValues};
pub use simple::{FormatFn, ParseFn, SimpleMapping};

use std::fmt::{self, Display, Formatter};

use kvs_key::{KeyNamingPolicy, KeyPath, SharedNamingPolicy};

use crate::context::{DiagnosticKind, ReadContext, Scope, WriteContext};
use crate::error::MappingError;

/// Auxiliary key gating a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagKey {
    pub(crate) key: String,
    pub(crate) value: Option<String>,
}

impl FlagKey {
    /// Flag satisfied by any non-missing value
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    /// Flag satisfied only by `value`
    #[inline]
    #[must_use]
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Flag key name
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Required value (if any)
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Check if a looked-up value opens the gate
    #[inline]
    #[must_use]
    pub fn is_open(&self, found: Option<&str>) -> bool {
        match (found, &self.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(found), Some(expected)) => found == expected,
        }
    }
}

/// Options shared by every member node
#[derive(Debug, Clone)]
pub struct MappingOptions {
    pub(crate) key: String,
    pub(crate) mandatory: bool,
    pub(crate) flag: Option<FlagKey>,
    pub(crate) naming: Option<SharedNamingPolicy>,
}

impl MappingOptions {
    /// Optional member keyed by `key`
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            mandatory: false,
            flag: None,
            naming: None,
        }
    }

    /// Mark as mandatory
    #[inline]
    #[must_use]
    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    /// Gate behind a flag key
    #[inline]
    #[must_use]
    pub fn with_flag(mut self, flag: FlagKey) -> Self {
        self.flag = Some(flag);
        self
    }

    /// Override the naming policy for this subtree
    #[inline]
    #[must_use]
    pub fn with_naming(mut self, naming: SharedNamingPolicy) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Key name (relative to the parent)
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Check if the member is mandatory
    #[inline]
    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Flag key (if any)
    #[inline]
    #[must_use]
    pub fn flag(&self) -> Option<&FlagKey> {
        self.flag.as_ref()
    }

    /// Naming override (if any)
    #[inline]
    #[must_use]
    pub fn naming(&self) -> Option<&dyn KeyNamingPolicy> {
        self.naming.as_deref()
    }
}

/// Kind of mapping node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    /// Class (root or nested)
    Class,
    /// Single converted value
    Simple,
    /// Value spread over component keys
    Composite,
    /// Collection of values
    ValueCollection,
    /// Collection of classes
    ClassCollection,
}

impl Display for MappingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Class => "class",
            Self::Simple => "simple",
            Self::Composite => "composite",
            Self::ValueCollection => "value_collection",
            Self::ClassCollection => "class_collection",
        })
    }
}

/// One key a mapping tree reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescription {
    /// Rendered key (collection keys are the collection's own key)
    pub key: String,
    /// Node kind
    pub kind: MappingKind,
    /// Whether the node is mandatory
    pub mandatory: bool,
    /// Rendered flag key (if any)
    pub flag: Option<String>,
}

/// Member node of a class of type `T`
///
/// Implemented by every node kind. Object safe: a [`ClassMapping`] holds
/// its members as `Box<dyn MemberMapping<T>>`.
pub trait MemberMapping<T>: Send + Sync {
    /// Node options
    fn options(&self) -> &MappingOptions;

    /// Node kind
    fn kind(&self) -> MappingKind;

    /// Read the member from the input into `target`
    ///
    /// Returns whether a value was produced.
    ///
    /// # Errors
    /// Returns a branch abort when a mandatory node is absent or invalid,
    /// or a fatal error (limits, configuration).
    fn read(
        &self,
        target: &mut T,
        parent: &Scope<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<bool, MappingError>;

    /// Write the member of `source` to the output
    ///
    /// Returns whether anything was written.
    ///
    /// # Errors
    /// Same classification as [`read`](Self::read).
    fn write(
        &self,
        source: &T,
        parent: &Scope<'_>,
        ctx: &mut WriteContext<'_>,
    ) -> Result<bool, MappingError>;

    /// Collect configuration problems of this node (at `path`) and below
    fn validate(&self, path: &KeyPath, problems: &mut Vec<String>);

    /// Collect the keys of this node and below
    fn describe(&self, parent: &Scope<'_>, out: &mut Vec<KeyDescription>);
}

/// Describe a member by its own key
pub(crate) fn describe_self(
    options: &MappingOptions,
    kind: MappingKind,
    parent: &Scope<'_>,
) -> KeyDescription {
    let scope = parent.descend(options);
    KeyDescription {
        key: scope.key(),
        kind,
        mandatory: options.mandatory,
        flag: options.flag.as_ref().map(|flag| scope.flag_key(parent, flag)),
    }
}

/// Read one member, applying flag and mandatory rules
///
/// `read` receives the member scope, its rendered key, whether an explicit
/// flag gate was found open, and the context.
pub(crate) fn read_member<'i, V>(
    options: &MappingOptions,
    parent: &Scope<'_>,
    ctx: &mut ReadContext<'i>,
    read: impl FnOnce(&Scope<'_>, &str, bool, &mut ReadContext<'i>) -> Result<Option<V>, MappingError>,
) -> Result<Option<V>, MappingError> {
    let scope = parent.descend(options);
    let key = scope.key();

    let gate_open = match &options.flag {
        Some(flag) => {
            let flag_key = scope.flag_key(parent, flag);
            if !flag.is_open(ctx.value(&flag_key)) {
                tracing::trace!(key = %key, flag = %flag_key, "flag gate closed");
                return settle_read(options, &key, ctx, Ok(None));
            }
            true
        }
        None => false,
    };

    let result = read(&scope, &key, gate_open, ctx);
    settle_read(options, &key, ctx, result)
}

fn settle_read<V>(
    options: &MappingOptions,
    key: &str,
    ctx: &mut ReadContext<'_>,
    result: Result<Option<V>, MappingError>,
) -> Result<Option<V>, MappingError> {
    match result {
        Ok(Some(value)) => Ok(Some(value)),
        Ok(None) if options.mandatory => Err(MappingError::missing(key)),
        Ok(None) => Ok(None),
        Err(error) if error.is_branch_abort() && !options.mandatory => {
            ctx.record(key, absorbed(key, &error));
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

/// Write one member, applying flag, mandatory and rollback rules
///
/// `write` receives the member scope, its rendered key and the context, and
/// returns whether it wrote a value.
pub(crate) fn write_member<'o>(
    options: &MappingOptions,
    parent: &Scope<'_>,
    ctx: &mut WriteContext<'o>,
    write: impl FnOnce(&Scope<'_>, &str, &mut WriteContext<'o>) -> Result<bool, MappingError>,
) -> Result<bool, MappingError> {
    let scope = parent.descend(options);
    let key = scope.key();
    let mark = ctx.mark();

    match write(&scope, &key, ctx) {
        Ok(true) => {
            if let Some(flag) = &options.flag {
                let value = flag
                    .value
                    .clone()
                    .unwrap_or_else(|| ctx.config().default_flag_value.clone());
                ctx.write(scope.flag_key(parent, flag), value);
            }
            Ok(true)
        }
        Ok(false) if options.mandatory => Err(MappingError::missing(key)),
        Ok(false) => Ok(false),
        Err(error) => {
            ctx.rollback(mark);
            if error.is_branch_abort() && !options.mandatory {
                ctx.record(key.as_str(), absorbed(&key, &error));
                Ok(false)
            } else {
                Err(error)
            }
        }
    }
}

/// Diagnostic for an abort absorbed by an optional node
fn absorbed(key: &str, error: &MappingError) -> DiagnosticKind {
    match error {
        MappingError::InvalidValue {
            key: failed,
            reason,
        } if failed == key => DiagnosticKind::InvalidValue {
            reason: reason.clone(),
        },
        other => DiagnosticKind::BranchAborted {
            cause: other.to_string(),
        },
    }
}

/// Check the number of collection items against the configured limit
pub(crate) fn check_limit(key: &str, count: usize, limit: usize) -> Result<(), MappingError> {
    if count > limit {
        tracing::warn!(key, count, limit, "collection limit exceeded");
        return Err(MappingError::LimitExceeded {
            key: key.to_string(),
            count,
            limit,
        });
    }
    Ok(())
}

/// Validate the sibling members of one class
pub(crate) fn validate_members<T>(
    members: &[Box<dyn MemberMapping<T>>],
    path: &KeyPath,
    problems: &mut Vec<String>,
) {
    let location = |key: &str| {
        if path.is_empty() {
            key.to_string()
        } else {
            format!("{path}.{key}")
        }
    };

    let mut seen: Vec<&str> = Vec::with_capacity(members.len());
    for member in members {
        let options = member.options();
        if options.key.is_empty() {
            problems.push(format!("{}: empty key", location("<unnamed>")));
            continue;
        }
        if seen.contains(&options.key.as_str()) {
            problems.push(format!("{}: duplicate key", location(&options.key)));
        }
        seen.push(&options.key);

        if let Some(flag) = &options.flag {
            if flag.key.is_empty() {
                problems.push(format!("{}: empty flag key", location(&options.key)));
            }
            if matches!(&flag.value, Some(value) if value.is_empty()) {
                problems.push(format!("{}: empty flag value", location(&options.key)));
            }
        }

        member.validate(&path.property(options.key.as_str()), problems);
    }

    for member in members {
        if let Some(flag) = &member.options().flag {
            if seen.contains(&flag.key.as_str()) {
                problems.push(format!(
                    "{}: flag key collides with a member key",
                    location(&flag.key)
                ));
            }
        }
    }
}
