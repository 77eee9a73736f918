use crate::context::PersistenceContext;
use crate::engine::embedded::{self, EmbedSource};
use crate::mapping::{ColumnBinding, EmbeddedStrategy};
use crate::member::{Lens, Member, MemberPath, Property};
use crate::primitive::{EnumEncoding, MappedEnum, Primitive};
use crate::Result;

use trellis_core::schema::naming::ColumnNaming;

use std::sync::Arc;

/// Property-to-column mappings of a value type, without identity.
///
/// ```ignore
/// let timestamp = Embeddable::new()
///     .add(property!(Timestamp, created))
///     .add_as(property!(Timestamp, modified), "modificationDate");
/// ```
pub struct Embeddable<E> {
    pub(crate) declarations: Vec<Declaration<E>>,
    pub(crate) embeds: Vec<Box<dyn EmbedSource<E>>>,
    pub(crate) super_classes: Vec<Box<dyn EmbedSource<E>>>,
    pub(crate) column_naming: Option<Arc<dyn ColumnNaming>>,
}

/// One directly declared property.
pub(crate) struct Declaration<E> {
    /// Bound to the member name until naming resolves the column.
    pub(crate) binding: ColumnBinding<E>,
    pub(crate) column: Option<String>,

    /// The column must already exist in a pre-supplied table.
    pub(crate) required: bool,
}

impl<E: 'static> Embeddable<E> {
    pub fn new() -> Self {
        Embeddable {
            declarations: vec![],
            embeds: vec![],
            super_classes: vec![],
            column_naming: None,
        }
    }

    /// Maps `property` to a column named by the column naming strategy.
    pub fn add<V: Primitive>(self, property: Property<E, V>) -> Self {
        self.declare(ColumnBinding::property(&property, member_name(&property)), None, false)
    }

    /// Maps `property` to `column`.
    pub fn add_as<V: Primitive>(self, property: Property<E, V>, column: impl Into<String>) -> Self {
        let binding = ColumnBinding::property(&property, member_name(&property));
        self.declare(binding, Some(column.into()), false)
    }

    pub fn add_enum<M: MappedEnum>(self, property: Property<E, M>, encoding: EnumEncoding) -> Self {
        let binding = ColumnBinding::enumeration(&property, member_name(&property), encoding);
        self.declare(binding, None, false)
    }

    /// Flattens the columns of `config` into the owning table, reading the
    /// embedded value through `lens`.
    pub fn embed<V: 'static>(self, lens: Lens<E, V>, config: Embeddable<V>) -> Self {
        self.embed_with(Embedded::new(lens, config))
    }

    /// Like [`embed`](Embeddable::embed), with column overrides.
    pub fn embed_with<V: 'static>(mut self, embedded: Embedded<E, V>) -> Self {
        self.embeds.push(Box::new(embedded));
        self
    }

    /// Contributes the mappings of a parent part as if declared here. A
    /// property declared here for the same member takes precedence.
    pub fn map_super_class<P: 'static>(mut self, lens: Lens<E, P>, config: Embeddable<P>) -> Self {
        self.super_classes.push(Box::new(SuperClass { lens, config }));
        self
    }

    /// Names the columns of this level. Nested levels without a strategy of
    /// their own inherit it.
    pub fn column_naming(mut self, naming: impl ColumnNaming + 'static) -> Self {
        self.column_naming = Some(Arc::new(naming));
        self
    }

    /// Compiles the mappings with the context's naming strategies.
    pub fn build(self, cx: &PersistenceContext) -> Result<EmbeddedStrategy<E>> {
        let compiled = embedded::compile(self, &cx.naming().column)?;
        Ok(EmbeddedStrategy::new(compiled.bindings))
    }

    pub(crate) fn declare(
        mut self,
        binding: ColumnBinding<E>,
        column: Option<String>,
        required: bool,
    ) -> Self {
        self.declarations.push(Declaration {
            binding,
            column,
            required,
        });
        self
    }
}

impl<E: 'static> Default for Embeddable<E> {
    fn default() -> Self {
        Embeddable::new()
    }
}

pub(crate) fn member_name(member: &impl Member) -> String {
    member.definition().name().to_string()
}

/// An embedded value with per-column overrides.
pub struct Embedded<E, V> {
    pub(crate) lens: Lens<E, V>,
    pub(crate) config: Embeddable<V>,
    pub(crate) overrides: Vec<(MemberPath, String)>,
    pub(crate) excludes: Vec<MemberPath>,
}

impl<E: 'static, V: 'static> Embedded<E, V> {
    pub fn new(lens: Lens<E, V>, config: Embeddable<V>) -> Self {
        Embedded {
            lens,
            config,
            overrides: vec![],
            excludes: vec![],
        }
    }

    /// Names the column of an embedded member, designated relative to the
    /// embedded type.
    pub fn override_name(mut self, member: &impl Member, column: impl Into<String>) -> Self {
        self.overrides.push((member.path().clone(), column.into()));
        self
    }

    /// Leaves an embedded member unmapped.
    pub fn exclude(mut self, member: &impl Member) -> Self {
        self.excludes.push(member.path().clone());
        self
    }
}

impl<E: 'static, V: 'static> EmbedSource<E> for Embedded<E, V> {
    fn compile(self: Box<Self>, naming: &Arc<dyn ColumnNaming>) -> Result<Vec<ColumnBinding<E>>> {
        let Embedded {
            lens,
            config,
            overrides,
            excludes,
        } = *self;

        let compiled = embedded::compile(config, naming)?;
        embedded::apply_overrides(&lens, compiled.bindings, &overrides, &excludes)
    }
}

struct SuperClass<E, P> {
    lens: Lens<E, P>,
    config: Embeddable<P>,
}

impl<E: 'static, P: 'static> EmbedSource<E> for SuperClass<E, P> {
    fn compile(self: Box<Self>, naming: &Arc<dyn ColumnNaming>) -> Result<Vec<ColumnBinding<E>>> {
        let compiled = embedded::compile(self.config, naming)?;
        Ok(compiled
            .bindings
            .iter()
            .map(|binding| binding.lift(&self.lens))
            .collect())
    }

    fn is_super_class(&self) -> bool {
        true
    }
}
