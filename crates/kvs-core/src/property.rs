//! Property accessors
//!
//! A [`Property`] pairs a getter and a setter for one field of a target
//! type. Mappings never inspect types themselves; they only call these
//! closures.

use std::fmt;
use std::sync::Arc;

/// Shared getter closure
pub type Getter<T, V> = Arc<dyn Fn(&T) -> Option<&V> + Send + Sync>;

/// Shared setter closure
pub type Setter<T, V> = Arc<dyn Fn(&mut T, V) + Send + Sync>;

/// Accessor pair for a field of `T` holding a `V`
///
/// A getter returning `None` means "no value": nothing is serialized for
/// the field.
pub struct Property<T, V> {
    name: String,
    get: Getter<T, V>,
    set: Setter<T, V>,
}

impl<T: 'static, V: 'static> Property<T, V> {
    /// Create property from accessor closures
    #[must_use]
    pub fn new<G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Option<&V> + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Property name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the current value
    #[inline]
    pub fn get<'a>(&self, target: &'a T) -> Option<&'a V> {
        (self.get)(target)
    }

    /// Store a value
    #[inline]
    pub fn set(&self, target: &mut T, value: V) {
        (self.set)(target, value);
    }
}

impl<T, V> Clone for Property<T, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<T, V> fmt::Debug for Property<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property").field("name", &self.name).finish()
    }
}
