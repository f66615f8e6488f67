//! Composite mapping helper

use std::sync::Arc;

use super::HelperOptions;
use crate::mapping::{
    AssembleFn, CheckFn, Component, CompositeMapping, CompositeValues, MappingOptions,
};
use crate::property::Property;

/// Configures a [`CompositeMapping`]
pub struct CompositeMappingHelper<T, V> {
    property: Property<T, V>,
    options: MappingOptions,
    components: Vec<Component<V>>,
    assemble: Option<AssembleFn<V>>,
    check: Option<CheckFn<V>>,
}

impl<T: 'static, V: 'static> CompositeMappingHelper<T, V> {
    pub(crate) fn new(property: Property<T, V>) -> Self {
        Self {
            options: MappingOptions::new(property.name()),
            property,
            components: Vec::new(),
            assemble: None,
            check: None,
        }
    }

    /// Add a component key rendered by `format`
    ///
    /// Components are written in the order they are added. A component
    /// whose formatter returns `None` is not written.
    #[must_use]
    pub fn component(
        mut self,
        id: impl Into<String>,
        format: impl Fn(&V) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.components.push(Component::new(id, Arc::new(format)));
        self
    }

    /// Rebuild the value from the components found
    ///
    /// Called only when at least one component is present.
    #[must_use]
    pub fn deserialize_with(
        mut self,
        assemble: impl Fn(&CompositeValues) -> Result<V, String> + Send + Sync + 'static,
    ) -> Self {
        self.assemble = Some(Arc::new(assemble));
        self
    }

    /// Reject values that do not split into the components
    ///
    /// Runs before any component is written; an error makes the value
    /// invalid instead of writing a partial set of components.
    #[must_use]
    pub fn check_with(
        mut self,
        check: impl Fn(&V) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.check = Some(Arc::new(check));
        self
    }

    pub(crate) fn into_mapping(self) -> CompositeMapping<T, V> {
        let mut mapping = self
            .components
            .into_iter()
            .fold(CompositeMapping::new(self.property, self.options), |m, c| {
                m.with_component(c)
            });
        if let Some(assemble) = self.assemble {
            mapping = mapping.with_assemble(assemble);
        }
        if let Some(check) = self.check {
            mapping = mapping.with_check(check);
        }
        mapping
    }
}

impl<T, V> HelperOptions for CompositeMappingHelper<T, V> {
    fn options_mut(&mut self) -> &mut MappingOptions {
        &mut self.options
    }
}
