//! KVS Keys
//!
//! Addressing and storage primitives for the key/value serializer.
//!
//! # Core Concepts
//!
//! - [`KeyPath`]: Structural path of a mapping node (properties, indices, components)
//! - [`KeyNamingPolicy`]: Strategy rendering a path into a dictionary key
//! - [`DefaultKeyNamingPolicy`]: Dotted names with bracketed indices
//! - [`KeyValueCollection`]: Ordered flat dictionary with query-string helpers
//!
//! # Example
//!
//! ```rust
//! use kvs_key::{DefaultKeyNamingPolicy, KeyNamingPolicy, KeyPath, KeyValueCollection};
//!
//! let policy = DefaultKeyNamingPolicy::new();
//! let path = KeyPath::single("Pets").index(0).property("Name");
//! assert_eq!(policy.key_for(&path), "Pets[0].Name");
//!
//! let kv = KeyValueCollection::from_query("Pets%5B0%5D.Name=Rex");
//! assert_eq!(kv.get("Pets[0].Name"), Some("Rex"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod collection;
mod naming;
mod path;

pub use collection::{KeyValueCollection, REPEATED_KEY_SEPARATOR};
pub use naming::{
    DefaultKeyNamingPolicy, KeyNamingConfig, KeyNamingPolicy, NamingError, SharedNamingPolicy,
};
pub use path::{KeyPath, KeySegment, PathError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
