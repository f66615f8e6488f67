//! Composite mappings
//!
//! A composite value is stored as several component keys, each rendered
//! from the value by its own formatter, and reassembled from whichever
//! components were present.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use kvs_key::KeyPath;

use super::{
    read_member, write_member, KeyDescription, MappingKind, MappingOptions, MemberMapping,
};
use crate::context::{ReadContext, Scope, WriteContext};
use crate::error::MappingError;
use crate::mapping::simple::FormatFn;
use crate::property::Property;

/// Function rebuilding a value from its components
pub type AssembleFn<V> = Arc<dyn Fn(&CompositeValues) -> Result<V, String> + Send + Sync>;

/// Function rejecting a value that cannot be split into components
pub type CheckFn<V> = Arc<dyn Fn(&V) -> Result<(), String> + Send + Sync>;

/// Component values found in the input, keyed by component identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeValues(IndexMap<String, String>);

impl CompositeValues {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component value
    #[inline]
    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.0.insert(id.into(), value.into());
    }

    /// Raw component value (if present)
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    /// Raw component value, failing when absent
    ///
    /// # Errors
    /// Returns a message naming the missing component
    pub fn require(&self, id: &str) -> Result<&str, String> {
        self.get(id).ok_or_else(|| format!("missing component {id}"))
    }

    /// Parse a required component
    ///
    /// # Errors
    /// Returns a message when the component is absent or does not parse
    pub fn parse<F>(&self, id: &str) -> Result<F, String>
    where
        F: FromStr,
        F::Err: fmt::Display,
    {
        self.require(id)?
            .parse::<F>()
            .map_err(|e| format!("component {id}: {e}"))
    }

    /// Number of components present
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no component is present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(id, value)` in component declaration order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One component of a composite value
pub struct Component<V> {
    id: String,
    format: FormatFn<V>,
}

impl<V> Component<V> {
    /// Create component
    #[must_use]
    pub fn new(id: impl Into<String>, format: FormatFn<V>) -> Self {
        Self {
            id: id.into(),
            format,
        }
    }

    /// Component identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Property stored under several component keys
pub struct CompositeMapping<T, V> {
    property: Property<T, V>,
    options: MappingOptions,
    components: Vec<Component<V>>,
    assemble: Option<AssembleFn<V>>,
    check: Option<CheckFn<V>>,
}

impl<T: 'static, V: 'static> CompositeMapping<T, V> {
    /// Create mapping without components
    #[must_use]
    pub fn new(property: Property<T, V>, options: MappingOptions) -> Self {
        Self {
            property,
            options,
            components: Vec::new(),
            assemble: None,
            check: None,
        }
    }

    /// Add a component
    #[inline]
    #[must_use]
    pub fn with_component(mut self, component: Component<V>) -> Self {
        self.components.push(component);
        self
    }

    /// With reassembly function
    #[inline]
    #[must_use]
    pub fn with_assemble(mut self, assemble: AssembleFn<V>) -> Self {
        self.assemble = Some(assemble);
        self
    }

    /// With a check run before a value is written
    ///
    /// A rejected value is an invalid value for the composite key.
    #[inline]
    #[must_use]
    pub fn with_check(mut self, check: CheckFn<V>) -> Self {
        self.check = Some(check);
        self
    }
}

impl<T: 'static, V: 'static> MemberMapping<T> for CompositeMapping<T, V> {
    fn options(&self) -> &MappingOptions {
        &self.options
    }

    fn kind(&self) -> MappingKind {
        MappingKind::Composite
    }

    fn read(
        &self,
        target: &mut T,
        parent: &Scope<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<bool, MappingError> {
        let assemble = self.assemble.as_ref().ok_or_else(|| {
            MappingError::Configuration(format!("{}: no reassembly function", self.options.key))
        })?;

        let value = read_member(&self.options, parent, ctx, |scope, key, _, ctx| {
            let mut values = CompositeValues::new();
            for component in &self.components {
                if let Some(raw) = ctx.value(&scope.component_key(&component.id)) {
                    values.insert(component.id.as_str(), raw);
                }
            }
            if values.is_empty() {
                return Ok(None);
            }
            assemble(&values)
                .map(Some)
                .map_err(|reason| MappingError::invalid(key, reason))
        })?;

        Ok(match value {
            Some(value) => {
                self.property.set(target, value);
                true
            }
            None => false,
        })
    }

    fn write(
        &self,
        source: &T,
        parent: &Scope<'_>,
        ctx: &mut WriteContext<'_>,
    ) -> Result<bool, MappingError> {
        write_member(&self.options, parent, ctx, |scope, key, ctx| {
            let Some(value) = self.property.get(source) else {
                return Ok(false);
            };
            if let Some(check) = &self.check {
                check(value).map_err(|reason| MappingError::invalid(key, reason))?;
            }
            let skip_empty = ctx.config().empty_values_are_missing;
            let mut wrote = false;
            for component in &self.components {
                match (component.format)(value) {
                    Some(raw) if !(raw.is_empty() && skip_empty) => {
                        ctx.write(scope.component_key(&component.id), raw);
                        wrote = true;
                    }
                    _ => {}
                }
            }
            Ok(wrote)
        })
    }

    fn validate(&self, path: &KeyPath, problems: &mut Vec<String>) {
        if self.components.is_empty() {
            problems.push(format!("{path}: composite mapping has no components"));
        }
        if self.assemble.is_none() {
            problems.push(format!("{path}: composite mapping has no reassembly function"));
        }
        let mut seen: Vec<&str> = Vec::with_capacity(self.components.len());
        for component in &self.components {
            if component.id.is_empty() {
                problems.push(format!("{path}: empty component identifier"));
            } else if seen.contains(&component.id.as_str()) {
                problems.push(format!("{path}: duplicate component {}", component.id));
            }
            seen.push(&component.id);
        }
    }

    fn describe(&self, parent: &Scope<'_>, out: &mut Vec<KeyDescription>) {
        let scope = parent.descend(&self.options);
        let flag = self
            .options
            .flag
            .as_ref()
            .map(|flag| scope.flag_key(parent, flag));
        for component in &self.components {
            out.push(KeyDescription {
                key: scope.component_key(&component.id),
                kind: MappingKind::Composite,
                mandatory: self.options.mandatory,
                flag: flag.clone(),
            });
        }
    }
}

impl<V> fmt::Debug for Component<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").field("id", &self.id).finish()
    }
}

impl<T, V> fmt::Debug for CompositeMapping<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeMapping")
            .field("property", &self.property)
            .field("options", &self.options)
            .field("components", &self.components)
            .finish_non_exhaustive()
    }
}
