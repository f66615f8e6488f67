//! KVS Core
//!
//! Mapping model, fluent helpers and serializer engine for flat key/value
//! collections such as query strings and form posts.
//!
//! # Core Concepts
//!
//! - [`ClassMapping`]: Root of a mapping tree, built with [`ClassMappingHelper`]
//! - [`MemberMapping`]: One node per mapped property (simple, class,
//!   composite, value collection, class collection)
//! - [`KeyValueSerializer`]: Reads and writes object graphs with a mapping
//! - [`SerializerConfig`]: Separators, flag defaults and limits
//!
//! # Mandatory and Flag Semantics
//!
//! An absent or invalid mandatory member aborts its enclosing class. The
//! nearest optional ancestor becomes absent and a [`Diagnostic`] is
//! recorded; at the root the abort is returned as an error. A member with a
//! flag key is only read when the sibling flag key is present (and holds
//! the configured value, if any), and writing it also writes the flag.
//!
//! # Example
//!
//! ```rust
//! use kvs_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Address {
//!     street: Option<String>,
//!     city: Option<String>,
//! }
//!
//! #[derive(Default)]
//! struct Person {
//!     name: Option<String>,
//!     address: Option<Address>,
//!     tags: Option<Vec<String>>,
//! }
//!
//! let mapping = ClassMappingHelper::<Person>::with_default()
//!     .simple("Name", |p: &Person| p.name.as_ref(), |p, v| p.name = Some(v), |m| m.mandatory())
//!     .class("Address", |p: &Person| p.address.as_ref(), |p, v| p.address = Some(v), |a| {
//!         a.simple("Street", |a: &Address| a.street.as_ref(), |a, v| a.street = Some(v), |m| m.mandatory())
//!             .simple("City", |a: &Address| a.city.as_ref(), |a, v| a.city = Some(v), |m| m)
//!     })
//!     .value_collection("Tags", |p: &Person| p.tags.as_ref(), |p, v| p.tags = Some(v), |m| m)
//!     .build()
//!     .unwrap();
//!
//! let serializer = KeyValueSerializer::new(mapping);
//! let person = serializer
//!     .deserialize_query("Name=Ann&Address.City=Oslo&Tags=a,b")
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(person.name.as_deref(), Some("Ann"));
//! // Street is mandatory, so the address branch was dropped
//! assert!(person.address.is_none());
//! assert_eq!(person.tags, Some(vec!["a".to_string(), "b".to_string()]));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod context;
pub mod convert;
mod error;
pub mod helpers;
pub mod mapping;
mod property;
mod serializer;

pub use config::SerializerConfig;
pub use context::{Diagnostic, DiagnosticKind, ReadContext, Report, Scope, WriteContext};
pub use error::{ConfigError, MappingError, SerializeError};
pub use helpers::{
    ClassCollectionMappingHelper, ClassMappingHelper, CompositeMappingHelper, HelperOptions,
    MapMembers, NestedClassMappingHelper, SimpleMappingHelper, ValueCollectionMappingHelper,
};
pub use mapping::{
    ClassCollectionMapping, ClassMapping, CollectionKeyType, CompositeMapping, CompositeValues,
    FlagKey, KeyDescription, MappingKind, MappingOptions, MemberMapping, NestedClassMapping,
    SimpleMapping, ValueCollectionMapping,
};
pub use property::Property;
pub use serializer::KeyValueSerializer;

pub use kvs_key::{
    DefaultKeyNamingPolicy, KeyNamingConfig, KeyNamingPolicy, KeyPath, KeyValueCollection,
    SharedNamingPolicy,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for declaring mappings
pub mod prelude {
    pub use crate::config::SerializerConfig;
    pub use crate::helpers::{ClassMappingHelper, HelperOptions, MapMembers};
    pub use crate::mapping::{ClassMapping, CollectionKeyType};
    pub use crate::serializer::KeyValueSerializer;
    pub use kvs_key::{DefaultKeyNamingPolicy, KeyValueCollection};
}
