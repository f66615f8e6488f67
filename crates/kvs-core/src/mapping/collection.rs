//! Collection mappings
//!
//! Value collections are stored either as one key with joined items
//! ([`CollectionKeyType::Aggregate`]) or as one key per item
//! ([`CollectionKeyType::Separate`]). Class collections are always
//! separate: every item is a class rooted at the item's indexed path.
//!
//! When reading separate collections, indices are discovered from the
//! input keys. Gaps are allowed; items are ordered by index and compacted.

use std::fmt;

use kvs_key::KeyPath;
use serde::{Deserialize, Serialize};

use super::class::ClassMapping;
use super::simple::{FormatFn, ParseFn};
use super::{
    check_limit, describe_self, read_member, write_member, KeyDescription, MappingKind,
    MappingOptions, MemberMapping,
};
use crate::context::{DiagnosticKind, ReadContext, Scope, WriteContext};
use crate::error::MappingError;
use crate::property::Property;

/// How collection items are laid out in the key space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKeyType {
    /// All items in one key, joined by a separator
    #[default]
    Aggregate,
    /// One indexed key per item
    Separate,
}

/// `Vec` of values
pub struct ValueCollectionMapping<T, V> {
    property: Property<T, Vec<V>>,
    options: MappingOptions,
    key_type: CollectionKeyType,
    separator: Option<String>,
    parse: Option<ParseFn<V>>,
    format: Option<FormatFn<V>>,
}

impl<T: 'static, V: 'static> ValueCollectionMapping<T, V> {
    /// Create aggregate mapping without converters
    #[must_use]
    pub fn new(property: Property<T, Vec<V>>, options: MappingOptions) -> Self {
        Self {
            property,
            options,
            key_type: CollectionKeyType::default(),
            separator: None,
            parse: None,
            format: None,
        }
    }

    /// With key layout
    #[inline]
    #[must_use]
    pub fn with_key_type(mut self, key_type: CollectionKeyType) -> Self {
        self.key_type = key_type;
        self
    }

    /// With aggregate separator overriding the configured one
    #[inline]
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// With item parser
    #[inline]
    #[must_use]
    pub fn with_parse(mut self, parse: ParseFn<V>) -> Self {
        self.parse = Some(parse);
        self
    }

    /// With item formatter
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: FormatFn<V>) -> Self {
        self.format = Some(format);
        self
    }

    /// Key layout
    #[inline]
    #[must_use]
    pub fn key_type(&self) -> CollectionKeyType {
        self.key_type
    }

    fn missing_converter(&self, what: &str) -> MappingError {
        MappingError::Configuration(format!("{}: no item {what}", self.options.key))
    }

    fn read_aggregate(
        &self,
        parse: &ParseFn<V>,
        key: &str,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Vec<V>, MappingError> {
        let Some(raw) = ctx.value(key) else {
            return Ok(Vec::new());
        };
        let config = ctx.config();
        let separator = self
            .separator
            .as_deref()
            .unwrap_or(&config.aggregate_separator);

        let parts: Vec<&str> = raw.split(separator).filter(|p| !p.is_empty()).collect();
        check_limit(key, parts.len(), config.max_collection_items)?;

        let mut items = Vec::with_capacity(parts.len());
        for (index, part) in parts.into_iter().enumerate() {
            match parse(part) {
                Ok(item) => items.push(item),
                Err(reason) => ctx.record(key, DiagnosticKind::ItemSkipped { index, reason }),
            }
        }
        Ok(items)
    }

    fn read_separate(
        &self,
        parse: &ParseFn<V>,
        scope: &Scope<'_>,
        key: &str,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Vec<V>, MappingError> {
        let indices = ctx.indices(scope.policy(), key);
        check_limit(key, indices.len(), ctx.config().max_collection_items)?;

        let mut items = Vec::with_capacity(indices.len());
        for index in indices {
            let Some(raw) = ctx.value(&scope.item(index).key()) else {
                continue;
            };
            match parse(raw) {
                Ok(item) => items.push(item),
                Err(reason) => ctx.record(key, DiagnosticKind::ItemSkipped { index, reason }),
            }
        }
        Ok(items)
    }
}

impl<T: 'static, V: 'static> MemberMapping<T> for ValueCollectionMapping<T, V> {
    fn options(&self) -> &MappingOptions {
        &self.options
    }

    fn kind(&self) -> MappingKind {
        MappingKind::ValueCollection
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
            .ok_or_else(|| self.missing_converter("parser"))?;

        let items = read_member(&self.options, parent, ctx, |scope, key, _, ctx| {
            let items = match self.key_type {
                CollectionKeyType::Aggregate => self.read_aggregate(parse, key, ctx)?,
                CollectionKeyType::Separate => self.read_separate(parse, scope, key, ctx)?,
            };
            Ok((!items.is_empty()).then_some(items))
        })?;

        Ok(match items {
            Some(items) => {
                self.property.set(target, items);
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
        let format = self
            .format
            .as_ref()
            .ok_or_else(|| self.missing_converter("formatter"))?;

        write_member(&self.options, parent, ctx, |scope, key, ctx| {
            let Some(items) = self.property.get(source) else {
                return Ok(false);
            };
            let config = ctx.config();
            check_limit(key, items.len(), config.max_collection_items)?;

            let formatted = items
                .iter()
                .filter_map(|item| format(item))
                .filter(|raw| !(raw.is_empty() && config.empty_values_are_missing));

            match self.key_type {
                CollectionKeyType::Aggregate => {
                    let separator = self
                        .separator
                        .as_deref()
                        .unwrap_or(&config.aggregate_separator);
                    let mut parts = Vec::with_capacity(items.len());
                    for raw in formatted {
                        if raw.contains(separator) {
                            return Err(MappingError::invalid(
                                key,
                                format!("item {raw:?} contains the separator {separator:?}"),
                            ));
                        }
                        if !raw.is_empty() {
                            parts.push(raw);
                        }
                    }
                    if parts.is_empty() {
                        return Ok(false);
                    }
                    ctx.write(key, parts.join(separator));
                    Ok(true)
                }
                CollectionKeyType::Separate => {
                    let mut written = 0;
                    for raw in formatted {
                        ctx.write(scope.item(written).key(), raw);
                        written += 1;
                    }
                    Ok(written > 0)
                }
            }
        })
    }

    fn validate(&self, path: &KeyPath, problems: &mut Vec<String>) {
        if self.parse.is_none() {
            problems.push(format!("{path}: value collection has no item parser"));
        }
        if self.format.is_none() {
            problems.push(format!("{path}: value collection has no item formatter"));
        }
        if matches!(&self.separator, Some(separator) if separator.is_empty()) {
            problems.push(format!("{path}: empty aggregate separator"));
        }
    }

    fn describe(&self, parent: &Scope<'_>, out: &mut Vec<KeyDescription>) {
        out.push(describe_self(
            &self.options,
            MappingKind::ValueCollection,
            parent,
        ));
    }
}

impl<T, V> fmt::Debug for ValueCollectionMapping<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCollectionMapping")
            .field("property", &self.property)
            .field("options", &self.options)
            .field("key_type", &self.key_type)
            .field("separator", &self.separator)
            .finish_non_exhaustive()
    }
}

/// `Vec` of classes, one indexed subtree per item
pub struct ClassCollectionMapping<T, C> {
    property: Property<T, Vec<C>>,
    options: MappingOptions,
    mapping: ClassMapping<C>,
}

impl<T: 'static, C: 'static> ClassCollectionMapping<T, C> {
    /// Create mapping
    #[must_use]
    pub fn new(
        property: Property<T, Vec<C>>,
        options: MappingOptions,
        mapping: ClassMapping<C>,
    ) -> Self {
        Self {
            property,
            options,
            mapping,
        }
    }

    /// Mapping of each item
    #[inline]
    #[must_use]
    pub fn mapping(&self) -> &ClassMapping<C> {
        &self.mapping
    }
}

impl<T: 'static, C: 'static> MemberMapping<T> for ClassCollectionMapping<T, C> {
    fn options(&self) -> &MappingOptions {
        &self.options
    }

    fn kind(&self) -> MappingKind {
        MappingKind::ClassCollection
    }

    fn read(
        &self,
        target: &mut T,
        parent: &Scope<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<bool, MappingError> {
        let items = read_member(&self.options, parent, ctx, |scope, key, _, ctx| {
            let indices = ctx.indices(scope.policy(), key);
            check_limit(key, indices.len(), ctx.config().max_collection_items)?;

            let mut items = Vec::with_capacity(indices.len());
            for index in indices {
                match self.mapping.read_instance(&scope.item(index), ctx) {
                    Ok(Some(item)) => items.push(item),
                    Ok(None) => ctx.record(
                        key,
                        DiagnosticKind::ItemSkipped {
                            index,
                            reason: "no values".to_string(),
                        },
                    ),
                    Err(error) if error.is_branch_abort() => ctx.record(
                        key,
                        DiagnosticKind::ItemSkipped {
                            index,
                            reason: error.to_string(),
                        },
                    ),
                    Err(error) => return Err(error),
                }
            }
            Ok((!items.is_empty()).then_some(items))
        })?;

        Ok(match items {
            Some(items) => {
                self.property.set(target, items);
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
            let Some(items) = self.property.get(source) else {
                return Ok(false);
            };
            check_limit(key, items.len(), ctx.config().max_collection_items)?;

            let mut written = 0;
            for (position, item) in items.iter().enumerate() {
                match self.mapping.write_instance(item, &scope.item(written), ctx) {
                    Ok(true) => written += 1,
                    Ok(false) => ctx.record(
                        key,
                        DiagnosticKind::ItemSkipped {
                            index: position,
                            reason: "no values".to_string(),
                        },
                    ),
                    Err(error) if error.is_branch_abort() => ctx.record(
                        key,
                        DiagnosticKind::ItemSkipped {
                            index: position,
                            reason: error.to_string(),
                        },
                    ),
                    Err(error) => return Err(error),
                }
            }
            Ok(written > 0)
        })
    }

    fn validate(&self, path: &KeyPath, problems: &mut Vec<String>) {
        self.mapping.validate(&path.index(0), problems);
    }

    /// Item members are described at index 0
    fn describe(&self, parent: &Scope<'_>, out: &mut Vec<KeyDescription>) {
        out.push(describe_self(
            &self.options,
            MappingKind::ClassCollection,
            parent,
        ));
        let scope = parent.descend(&self.options);
        self.mapping.describe(&scope.item(0), out);
    }
}

impl<T, C> fmt::Debug for ClassCollectionMapping<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassCollectionMapping")
            .field("property", &self.property)
            .field("options", &self.options)
            .field("mapping", &self.mapping)
            .finish()
    }
}
