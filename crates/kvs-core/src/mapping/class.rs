//! Class mappings (root and nested)

use std::fmt;
use std::sync::Arc;

use kvs_key::{KeyNamingPolicy, KeyPath, SharedNamingPolicy};

use super::{
    describe_self, read_member, validate_members, write_member, KeyDescription, MappingKind,
    MappingOptions, MemberMapping,
};
use crate::context::{ReadContext, Scope, WriteContext};
use crate::error::MappingError;
use crate::property::Property;

/// Factory creating empty instances
pub(crate) type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Mapping of a class: a factory and an ordered list of members
///
/// Used directly as the root of a mapping tree and as the item mapping of
/// nested classes and class collections.
pub struct ClassMapping<T> {
    factory: Factory<T>,
    members: Vec<Box<dyn MemberMapping<T>>>,
    naming: Option<SharedNamingPolicy>,
}

impl<T: 'static> ClassMapping<T> {
    pub(crate) fn new(
        factory: Factory<T>,
        members: Vec<Box<dyn MemberMapping<T>>>,
        naming: Option<SharedNamingPolicy>,
    ) -> Self {
        Self {
            factory,
            members,
            naming,
        }
    }

    /// Member nodes in declaration order
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[Box<dyn MemberMapping<T>>] {
        &self.members
    }

    /// Naming override of this class (if any)
    #[inline]
    #[must_use]
    pub fn naming(&self) -> Option<&dyn KeyNamingPolicy> {
        self.naming.as_deref()
    }

    /// Create an empty instance
    #[inline]
    #[must_use]
    pub fn create(&self) -> T {
        (self.factory)()
    }

    /// Read an instance rooted at `scope`
    ///
    /// Returns `None` when no member produced a value.
    ///
    /// # Errors
    /// Propagates member aborts and fatal errors.
    pub fn read_instance(
        &self,
        scope: &Scope<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<T>, MappingError> {
        let mut instance = self.create();
        let mut present = false;
        for member in &self.members {
            present |= member.read(&mut instance, scope, ctx)?;
        }
        Ok(present.then_some(instance))
    }

    /// Write an instance rooted at `scope`
    ///
    /// Returns whether any member wrote a value. On error everything this
    /// instance wrote is rolled back.
    ///
    /// # Errors
    /// Propagates member aborts and fatal errors.
    pub fn write_instance(
        &self,
        source: &T,
        scope: &Scope<'_>,
        ctx: &mut WriteContext<'_>,
    ) -> Result<bool, MappingError> {
        let mark = ctx.mark();
        let mut wrote = false;
        for member in &self.members {
            match member.write(source, scope, ctx) {
                Ok(written) => wrote |= written,
                Err(error) => {
                    ctx.rollback(mark);
                    return Err(error);
                }
            }
        }
        Ok(wrote)
    }

    /// Collect configuration problems of the members rooted at `path`
    pub fn validate(&self, path: &KeyPath, problems: &mut Vec<String>) {
        validate_members(&self.members, path, problems);
    }

    /// Collect the keys of the members rooted at `scope`
    pub fn describe(&self, scope: &Scope<'_>, out: &mut Vec<KeyDescription>) {
        for member in &self.members {
            member.describe(scope, out);
        }
    }
}

impl<T> fmt::Debug for ClassMapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMapping")
            .field("members", &self.members.len())
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}

/// Class-typed property of a parent class `P`
///
/// The child's members are keyed below the property's own key. With a flag
/// key, an open gate alone makes the child present (as an empty instance).
pub struct NestedClassMapping<P, C> {
    property: Property<P, C>,
    options: MappingOptions,
    mapping: ClassMapping<C>,
}

impl<P: 'static, C: 'static> NestedClassMapping<P, C> {
    /// Create nested mapping
    #[must_use]
    pub fn new(property: Property<P, C>, options: MappingOptions, mapping: ClassMapping<C>) -> Self {
        Self {
            property,
            options,
            mapping,
        }
    }

    /// Mapping of the child class
    #[inline]
    #[must_use]
    pub fn mapping(&self) -> &ClassMapping<C> {
        &self.mapping
    }
}

impl<P: 'static, C: 'static> MemberMapping<P> for NestedClassMapping<P, C> {
    fn options(&self) -> &MappingOptions {
        &self.options
    }

    fn kind(&self) -> MappingKind {
        MappingKind::Class
    }

    fn read(
        &self,
        target: &mut P,
        parent: &Scope<'_>,
        ctx: &mut ReadContext<'_>,
    ) -> Result<bool, MappingError> {
        let child = read_member(&self.options, parent, ctx, |scope, _, gate_open, ctx| {
            let instance = self.mapping.read_instance(scope, ctx)?;
            Ok(instance.or_else(|| gate_open.then(|| self.mapping.create())))
        })?;

        Ok(match child {
            Some(child) => {
                self.property.set(target, child);
                true
            }
            None => false,
        })
    }

    fn write(
        &self,
        source: &P,
        parent: &Scope<'_>,
        ctx: &mut WriteContext<'_>,
    ) -> Result<bool, MappingError> {
        write_member(&self.options, parent, ctx, |scope, _, ctx| {
            let Some(child) = self.property.get(source) else {
                return Ok(false);
            };
            let wrote = self.mapping.write_instance(child, scope, ctx)?;
            Ok(wrote || self.options.flag.is_some())
        })
    }

    fn validate(&self, path: &KeyPath, problems: &mut Vec<String>) {
        self.mapping.validate(path, problems);
    }

    fn describe(&self, parent: &Scope<'_>, out: &mut Vec<KeyDescription>) {
        out.push(describe_self(&self.options, MappingKind::Class, parent));
        let scope = parent.descend(&self.options);
        self.mapping.describe(&scope, out);
    }
}

impl<P, C> fmt::Debug for NestedClassMapping<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedClassMapping")
            .field("property", &self.property)
            .field("options", &self.options)
            .field("mapping", &self.mapping)
            .finish()
    }
}
