//! KVS Schema
//!
//! Declarative mapping trees for untyped data. A YAML or JSON [`Schema`]
//! compiles into a [`ClassMapping`](kvs_core::ClassMapping) over
//! `serde_json::Value`, so query strings and form posts can be decoded
//! without writing accessor code.
//!
//! # Core Concepts
//!
//! - [`Schema`]: Schema document (name, optional key prefix, members)
//! - [`MemberSchema`]: One member, tagged by `kind`
//! - [`ValueType`]: Scalar type of simple members and collection items
//!
//! # Example
//!
//! ```rust
//! use kvs_core::SerializerConfig;
//! use kvs_schema::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::from_yaml_str(r"
//! name: search
//! members:
//!   - { name: q, kind: simple, mandatory: true }
//!   - { name: page, kind: simple, type: integer }
//!   - { name: tags, kind: value_collection }
//! ").unwrap();
//!
//! let serializer = schema.serializer(SerializerConfig::default()).unwrap();
//! let value = serializer.deserialize_query("q=kvs&page=2&tags=a,b").unwrap();
//! assert_eq!(value, Some(json!({"q": "kvs", "page": 2, "tags": ["a", "b"]})));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod compile;
mod error;
mod schema;
mod value;

pub use error::SchemaError;
pub use schema::{FlagSchema, MemberKind, MemberSchema, Schema};
pub use value::{scalar_to_string, ValueType};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
