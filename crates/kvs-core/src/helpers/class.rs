//! Nested class mapping helper

use super::{ClassMappingHelper, HelperOptions, MapMembers};
use crate::mapping::{MappingOptions, MemberMapping, NestedClassMapping};
use crate::property::Property;

/// Configures a [`NestedClassMapping`]
///
/// Members of the child class are added directly on this helper.
pub struct NestedClassMappingHelper<P, C> {
    property: Property<P, C>,
    options: MappingOptions,
    class: ClassMappingHelper<C>,
}

impl<P: 'static, C: 'static> NestedClassMappingHelper<P, C> {
    pub(crate) fn new(property: Property<P, C>, class: ClassMappingHelper<C>) -> Self {
        Self {
            options: MappingOptions::new(property.name()),
            property,
            class,
        }
    }

    /// Replace the child instance factory
    #[must_use]
    pub fn factory(mut self, factory: impl Fn() -> C + Send + Sync + 'static) -> Self {
        self.class = self.class.factory(factory);
        self
    }

    /// Configure the child class as a whole
    #[must_use]
    pub fn members(
        mut self,
        configure: impl FnOnce(ClassMappingHelper<C>) -> ClassMappingHelper<C>,
    ) -> Self {
        self.class = configure(self.class);
        self
    }

    pub(crate) fn into_mapping(mut self) -> NestedClassMapping<P, C> {
        if let Some(naming) = self.class.take_naming() {
            self.options.naming.get_or_insert(naming);
        }
        NestedClassMapping::new(self.property, self.options, self.class.into_mapping())
    }
}

impl<P, C> HelperOptions for NestedClassMappingHelper<P, C> {
    fn options_mut(&mut self) -> &mut MappingOptions {
        &mut self.options
    }
}

impl<P: 'static, C: 'static> MapMembers<C> for NestedClassMappingHelper<P, C> {
    fn push_member(&mut self, member: Box<dyn MemberMapping<C>>) {
        self.class.push_member(member);
    }
}
