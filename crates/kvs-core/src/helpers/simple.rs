//! Simple mapping helper

use std::sync::Arc;

use super::HelperOptions;
use crate::mapping::{FormatFn, MappingOptions, ParseFn, SimpleMapping};
use crate::property::Property;

/// Configures a [`SimpleMapping`]
pub struct SimpleMappingHelper<T, V> {
    property: Property<T, V>,
    options: MappingOptions,
    parse: Option<ParseFn<V>>,
    format: Option<FormatFn<V>>,
}

impl<T: 'static, V: 'static> SimpleMappingHelper<T, V> {
    pub(crate) fn new(property: Property<T, V>) -> Self {
        Self {
            options: MappingOptions::new(property.name()),
            property,
            parse: None,
            format: None,
        }
    }

    /// Parse raw values with `parse`
    #[must_use]
    pub fn parse_with(
        mut self,
        parse: impl Fn(&str) -> Result<V, String> + Send + Sync + 'static,
    ) -> Self {
        self.parse = Some(Arc::new(parse));
        self
    }

    /// Format values with `format`; returning `None` writes nothing
    #[must_use]
    pub fn format_with(
        mut self,
        format: impl Fn(&V) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.format = Some(Arc::new(format));
        self
    }

    pub(crate) fn into_mapping(self) -> SimpleMapping<T, V> {
        let mut mapping = SimpleMapping::new(self.property, self.options);
        if let Some(parse) = self.parse {
            mapping = mapping.with_parse(parse);
        }
        if let Some(format) = self.format {
            mapping = mapping.with_format(format);
        }
        mapping
    }
}

impl<T, V> HelperOptions for SimpleMappingHelper<T, V> {
    fn options_mut(&mut self) -> &mut MappingOptions {
        &mut self.options
    }
}
