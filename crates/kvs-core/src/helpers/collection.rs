//! Collection mapping helpers

use std::sync::Arc;

use super::{ClassMappingHelper, HelperOptions, MapMembers};
use crate::mapping::{
    ClassCollectionMapping, CollectionKeyType, FormatFn, MappingOptions, MemberMapping, ParseFn,
    ValueCollectionMapping,
};
use crate::property::Property;

/// Configures a [`ValueCollectionMapping`]
///
/// Collections are aggregated into a single key unless
/// [`separate`](Self::separate) is called.
pub struct ValueCollectionMappingHelper<T, V> {
    property: Property<T, Vec<V>>,
    options: MappingOptions,
    key_type: CollectionKeyType,
    separator: Option<String>,
    parse: Option<ParseFn<V>>,
    format: Option<FormatFn<V>>,
}

impl<T: 'static, V: 'static> ValueCollectionMappingHelper<T, V> {
    pub(crate) fn new(property: Property<T, Vec<V>>) -> Self {
        Self {
            options: MappingOptions::new(property.name()),
            property,
            key_type: CollectionKeyType::Aggregate,
            separator: None,
            parse: None,
            format: None,
        }
    }

    /// Store all items in one key, joined by the configured separator
    #[must_use]
    pub fn aggregate(mut self) -> Self {
        self.key_type = CollectionKeyType::Aggregate;
        self.separator = None;
        self
    }

    /// Store all items in one key, joined by `separator`
    #[must_use]
    pub fn aggregate_with(mut self, separator: impl Into<String>) -> Self {
        self.key_type = CollectionKeyType::Aggregate;
        self.separator = Some(separator.into());
        self
    }

    /// Store one indexed key per item
    #[must_use]
    pub fn separate(mut self) -> Self {
        self.key_type = CollectionKeyType::Separate;
        self
    }

    /// Parse items with `parse`
    #[must_use]
    pub fn parse_with(
        mut self,
        parse: impl Fn(&str) -> Result<V, String> + Send + Sync + 'static,
    ) -> Self {
        self.parse = Some(Arc::new(parse));
        self
    }

    /// Format items with `format`; items formatted to `None` are skipped
    #[must_use]
    pub fn format_with(
        mut self,
        format: impl Fn(&V) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.format = Some(Arc::new(format));
        self
    }

    pub(crate) fn into_mapping(self) -> ValueCollectionMapping<T, V> {
        let mut mapping =
            ValueCollectionMapping::new(self.property, self.options).with_key_type(self.key_type);
        if let Some(separator) = self.separator {
            mapping = mapping.with_separator(separator);
        }
        if let Some(parse) = self.parse {
            mapping = mapping.with_parse(parse);
        }
        if let Some(format) = self.format {
            mapping = mapping.with_format(format);
        }
        mapping
    }
}

impl<T, V> HelperOptions for ValueCollectionMappingHelper<T, V> {
    fn options_mut(&mut self) -> &mut MappingOptions {
        &mut self.options
    }
}

/// Configures a [`ClassCollectionMapping`]
///
/// Members of the item class are added directly on this helper.
pub struct ClassCollectionMappingHelper<T, C> {
    property: Property<T, Vec<C>>,
    options: MappingOptions,
    class: ClassMappingHelper<C>,
}

impl<T: 'static, C: 'static> ClassCollectionMappingHelper<T, C> {
    pub(crate) fn new(property: Property<T, Vec<C>>, class: ClassMappingHelper<C>) -> Self {
        Self {
            options: MappingOptions::new(property.name()),
            property,
            class,
        }
    }

    /// Replace the item factory
    #[must_use]
    pub fn factory(mut self, factory: impl Fn() -> C + Send + Sync + 'static) -> Self {
        self.class = self.class.factory(factory);
        self
    }

    /// Configure the item class as a whole
    #[must_use]
    pub fn members(
        mut self,
        configure: impl FnOnce(ClassMappingHelper<C>) -> ClassMappingHelper<C>,
    ) -> Self {
        self.class = configure(self.class);
        self
    }

    pub(crate) fn into_mapping(mut self) -> ClassCollectionMapping<T, C> {
        if let Some(naming) = self.class.take_naming() {
            self.options.naming.get_or_insert(naming);
        }
        ClassCollectionMapping::new(self.property, self.options, self.class.into_mapping())
    }
}

impl<T, C> HelperOptions for ClassCollectionMappingHelper<T, C> {
    fn options_mut(&mut self) -> &mut MappingOptions {
        &mut self.options
    }
}

impl<T: 'static, C: 'static> MapMembers<C> for ClassCollectionMappingHelper<T, C> {
    fn push_member(&mut self, member: Box<dyn MemberMapping<C>>) {
        self.class.push_member(member);
    }
}
