//! Fluent mapping helpers
//!
//! Helpers are configuration-time builders. A [`ClassMappingHelper`] collects
//! members through the [`MapMembers`] adders; each adder hands a per-kind
//! helper to a configure closure, then turns it into a mapping node.
//! [`ClassMappingHelper::build`] validates the finished tree.
//!
//! # Example
//!
//! ```rust
//! use kvs_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Login {
//!     user: Option<String>,
//!     remember: Option<bool>,
//! }
//!
//! let mapping = ClassMappingHelper::<Login>::with_default()
//!     .simple("User", |l: &Login| l.user.as_ref(), |l, v| l.user = Some(v), |m| m.mandatory())
//!     .simple("Remember", |l: &Login| l.remember.as_ref(), |l, v| l.remember = Some(v), |m| {
//!         m.parse_with(kvs_core::convert::parse_bool)
//!     })
//!     .build()
//!     .unwrap();
//! assert_eq!(mapping.members().len(), 2);
//! ```

mod class;
mod collection;
mod composite;
mod simple;

pub use class::NestedClassMappingHelper;
pub use collection::{ClassCollectionMappingHelper, ValueCollectionMappingHelper};
pub use composite::CompositeMappingHelper;
pub use simple::SimpleMappingHelper;

use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

use kvs_key::{KeyPath, SharedNamingPolicy};

use crate::convert::{format_display, parse_from_str};
use crate::error::MappingError;
use crate::mapping::{ClassMapping, FlagKey, MappingOptions, MemberMapping};
use crate::property::Property;

/// Chainable options shared by every member helper
pub trait HelperOptions: Sized {
    /// Options being configured
    fn options_mut(&mut self) -> &mut MappingOptions;

    /// Absence or invalidity aborts the enclosing class
    #[must_use]
    fn mandatory(mut self) -> Self {
        self.options_mut().mandatory = true;
        self
    }

    /// Absence is allowed (the default)
    #[must_use]
    fn optional(mut self) -> Self {
        self.options_mut().mandatory = false;
        self
    }

    /// Key name, replacing the property name
    #[must_use]
    fn key(mut self, key: impl Into<String>) -> Self {
        self.options_mut().key = key.into();
        self
    }

    /// Gate behind a sibling flag key that must be present
    #[must_use]
    fn flag(mut self, key: impl Into<String>) -> Self {
        self.options_mut().flag = Some(FlagKey::new(key));
        self
    }

    /// Gate behind a sibling flag key that must hold `value`
    ///
    /// `value` must not be empty; `build()` rejects it.
    #[must_use]
    fn flag_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options_mut().flag = Some(FlagKey::with_value(key, value));
        self
    }

    /// Naming policy for this member and everything below it
    #[must_use]
    fn naming_policy(mut self, policy: SharedNamingPolicy) -> Self {
        self.options_mut().naming = Some(policy);
        self
    }
}

/// Member adders for helpers describing a class of type `T`
///
/// Every adder takes the property name (also the default key), a getter, a
/// setter and a closure configuring the member's helper.
pub trait MapMembers<T: 'static>: Sized {
    /// Append a finished member node
    fn push_member(&mut self, member: Box<dyn MemberMapping<T>>);

    /// Single value converted with [`FromStr`] and [`Display`]
    #[must_use]
    fn simple<V, G, S>(
        mut self,
        name: impl Into<String>,
        get: G,
        set: S,
        configure: impl FnOnce(SimpleMappingHelper<T, V>) -> SimpleMappingHelper<T, V>,
    ) -> Self
    where
        V: FromStr + Display + 'static,
        V::Err: Display,
        G: Fn(&T) -> Option<&V> + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let helper = SimpleMappingHelper::new(Property::new(name, get, set))
            .parse_with(parse_from_str::<V>)
            .format_with(format_display::<V>);
        self.push_member(Box::new(configure(helper).into_mapping()));
        self
    }

    /// Single value with converters supplied by `configure`
    #[must_use]
    fn simple_with<V, G, S>(
        mut self,
        name: impl Into<String>,
        get: G,
        set: S,
        configure: impl FnOnce(SimpleMappingHelper<T, V>) -> SimpleMappingHelper<T, V>,
    ) -> Self
    where
        V: 'static,
        G: Fn(&T) -> Option<&V> + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let helper = SimpleMappingHelper::new(Property::new(name, get, set));
        self.push_member(Box::new(configure(helper).into_mapping()));
        self
    }

    /// Nested class created with [`Default`]
    #[must_use]
    fn class<C, G, S>(
        self,
        name: impl Into<String>,
        get: G,
        set: S,
        configure: impl FnOnce(NestedClassMappingHelper<T, C>) -> NestedClassMappingHelper<T, C>,
    ) -> Self
    where
        C: Default + 'static,
        G: Fn(&T) -> Option<&C> + Send + Sync + 'static,
        S: Fn(&mut T, C) + Send + Sync + 'static,
    {
        self.class_with(name, C::default, get, set, configure)
    }

    /// Nested class created by `factory`
    #[must_use]
    fn class_with<C, F, G, S>(
        mut self,
        name: impl Into<String>,
        factory: F,
        get: G,
        set: S,
        configure: impl FnOnce(NestedClassMappingHelper<T, C>) -> NestedClassMappingHelper<T, C>,
    ) -> Self
    where
        C: 'static,
        F: Fn() -> C + Send + Sync + 'static,
        G: Fn(&T) -> Option<&C> + Send + Sync + 'static,
        S: Fn(&mut T, C) + Send + Sync + 'static,
    {
        let helper = NestedClassMappingHelper::new(
            Property::new(name, get, set),
            ClassMappingHelper::new(factory),
        );
        self.push_member(Box::new(configure(helper).into_mapping()));
        self
    }

    /// Value spread over component keys
    #[must_use]
    fn composite<V, G, S>(
        mut self,
        name: impl Into<String>,
        get: G,
        set: S,
        configure: impl FnOnce(CompositeMappingHelper<T, V>) -> CompositeMappingHelper<T, V>,
    ) -> Self
    where
        V: 'static,
        G: Fn(&T) -> Option<&V> + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let helper = CompositeMappingHelper::new(Property::new(name, get, set));
        self.push_member(Box::new(configure(helper).into_mapping()));
        self
    }

    /// Collection of values converted with [`FromStr`] and [`Display`]
    #[must_use]
    fn value_collection<V, G, S>(
        mut self,
        name: impl Into<String>,
        get: G,
        set: S,
        configure: impl FnOnce(ValueCollectionMappingHelper<T, V>) -> ValueCollectionMappingHelper<T, V>,
    ) -> Self
    where
        V: FromStr + Display + 'static,
        V::Err: Display,
        G: Fn(&T) -> Option<&Vec<V>> + Send + Sync + 'static,
        S: Fn(&mut T, Vec<V>) + Send + Sync + 'static,
    {
        let helper = ValueCollectionMappingHelper::new(Property::new(name, get, set))
            .parse_with(parse_from_str::<V>)
            .format_with(format_display::<V>);
        self.push_member(Box::new(configure(helper).into_mapping()));
        self
    }

    /// Collection of values with converters supplied by `configure`
    #[must_use]
    fn value_collection_with<V, G, S>(
        mut self,
        name: impl Into<String>,
        get: G,
        set: S,
        configure: impl FnOnce(ValueCollectionMappingHelper<T, V>) -> ValueCollectionMappingHelper<T, V>,
    ) -> Self
    where
        V: 'static,
        G: Fn(&T) -> Option<&Vec<V>> + Send + Sync + 'static,
        S: Fn(&mut T, Vec<V>) + Send + Sync + 'static,
    {
        let helper = ValueCollectionMappingHelper::new(Property::new(name, get, set));
        self.push_member(Box::new(configure(helper).into_mapping()));
        self
    }

    /// Collection of classes created with [`Default`]
    #[must_use]
    fn class_collection<C, G, S>(
        mut self,
        name: impl Into<String>,
        get: G,
        set: S,
        configure: impl FnOnce(ClassCollectionMappingHelper<T, C>) -> ClassCollectionMappingHelper<T, C>,
    ) -> Self
    where
        C: Default + 'static,
        G: Fn(&T) -> Option<&Vec<C>> + Send + Sync + 'static,
        S: Fn(&mut T, Vec<C>) + Send + Sync + 'static,
    {
        let helper = ClassCollectionMappingHelper::new(
            Property::new(name, get, set),
            ClassMappingHelper::new(C::default),
        );
        self.push_member(Box::new(configure(helper).into_mapping()));
        self
    }
}

/// Builder of a [`ClassMapping`]
pub struct ClassMappingHelper<T> {
    factory: Arc<dyn Fn() -> T + Send + Sync>,
    members: Vec<Box<dyn MemberMapping<T>>>,
    naming: Option<SharedNamingPolicy>,
}

impl<T: 'static> ClassMappingHelper<T> {
    /// Start a class whose instances are created by `factory`
    #[must_use]
    pub fn new(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
            members: Vec::new(),
            naming: None,
        }
    }

    /// Start a class whose instances are created with [`Default`]
    #[must_use]
    pub fn with_default() -> Self
    where
        T: Default,
    {
        Self::new(T::default)
    }

    /// Replace the instance factory
    #[must_use]
    pub fn factory(mut self, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// Naming policy for the whole tree, overriding the serializer's
    #[must_use]
    pub fn naming_policy(mut self, policy: SharedNamingPolicy) -> Self {
        self.naming = Some(policy);
        self
    }

    /// Validate and finish the mapping
    ///
    /// # Errors
    /// Returns [`MappingError::Configuration`] listing every problem found:
    /// missing converters, composites without components or reassembly,
    /// empty or duplicate sibling keys, flag keys colliding with members.
    pub fn build(self) -> Result<ClassMapping<T>, MappingError> {
        let mapping = self.into_mapping();

        let mut problems = Vec::new();
        mapping.validate(&KeyPath::root(), &mut problems);
        if !problems.is_empty() {
            tracing::warn!(count = problems.len(), "mapping rejected");
            return Err(MappingError::Configuration(problems.join("; ")));
        }

        tracing::debug!(members = mapping.members().len(), "mapping built");
        Ok(mapping)
    }

    pub(crate) fn into_mapping(self) -> ClassMapping<T> {
        ClassMapping::new(self.factory, self.members, self.naming)
    }

    pub(crate) fn take_naming(&mut self) -> Option<SharedNamingPolicy> {
        self.naming.take()
    }
}

impl<T: 'static> MapMembers<T> for ClassMappingHelper<T> {
    fn push_member(&mut self, member: Box<dyn MemberMapping<T>>) {
        self.members.push(member);
    }
}

impl<T> fmt::Debug for ClassMappingHelper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMappingHelper")
            .field("members", &self.members.len())
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}
