//! Single-key value mappings

use std::fmt;
use std::sync::Arc;

use kvs_key::KeyPath;

use super::{
    describe_self, read_member, write_member, KeyDescription, MappingKind, MappingOptions,
    MemberMapping,
};
use crate::context::{ReadContext, Scope, WriteContext};
use crate::error::MappingError;
use crate::property::Property;

/// Parser turning a raw string into a value
pub type ParseFn<V> = Arc<dyn Fn(&str) -> Result<V, String> + Send + Sync>;

/// Formatter turning a value into a raw string (`None` writes nothing)
pub type FormatFn<V> = Arc<dyn Fn(&V) -> Option<String> + Send + Sync>;

/// Property stored under a single key
pub struct SimpleMapping<T, V> {
    property: Property<T, V>,
    options: MappingOptions,
    parse: Option<ParseFn<V>>,
    format: Option<FormatFn<V>>,
}

impl<T: 'static, V: 'static> SimpleMapping<T, V> {
    /// Create mapping without converters
    #[must_use]
    pub fn new(property: Property<T, V>, options: MappingOptions) -> Self {
        Self {
            property,
            options,
            parse: None,
            format: None,
        }
    }

    /// With parser
    #[inline]
    #[must_use]
    pub fn with_parse(mut self, parse: ParseFn<V>) -> Self {
        self.parse = Some(parse);
        self
    }

    /// With formatter
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: FormatFn<V>) -> Self {
        self.format = Some(format);
        self
    }
}

impl<T: 'static, V: 'static> MemberMapping<T> for SimpleMapping<T, V> {
    fn options(&self) -> &MappingOptions {
        &self.options
    }

    fn kind(&self) -> MappingKind {
        MappingKind::Simple
    }

    fn read(
        &self,
        target: &mut T,
        parent: &Scope<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<bool, MappingError> {
        let parse = self
            .parse
            .as_ref()
            .ok_or_else(|| MappingError::Configuration(format!("{}: no parser", self.options.key)))?;

        let value = read_member(&self.options, parent, ctx, |_, key, _, ctx| {
            match ctx.value(key) {
                None => Ok(None),
                Some(raw) => parse(raw)
                    .map(Some)
                    .map_err(|reason| MappingError::invalid(key, reason)),
            }
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
        let format = self.format.as_ref().ok_or_else(|| {
            MappingError::Configuration(format!("{}: no formatter", self.options.key))
        })?;

        write_member(&self.options, parent, ctx, |_, key, ctx| {
            let Some(raw) = self.property.get(source).and_then(|value| format(value)) else {
                return Ok(false);
            };
            if raw.is_empty() && ctx.config().empty_values_are_missing {
                return Ok(false);
            }
            ctx.write(key, raw);
            Ok(true)
        })
    }

    fn validate(&self, path: &KeyPath, problems: &mut Vec<String>) {
        if self.parse.is_none() {
            problems.push(format!("{path}: simple mapping has no parser"));
        }
        if self.format.is_none() {
            problems.push(format!("{path}: simple mapping has no formatter"));
        }
    }

    fn describe(&self, parent: &Scope<'_>, out: &mut Vec<KeyDescription>) {
        out.push(describe_self(&self.options, MappingKind::Simple, parent));
    }
}

impl<T, V> fmt::Debug for SimpleMapping<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleMapping")
            .field("property", &self.property)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
