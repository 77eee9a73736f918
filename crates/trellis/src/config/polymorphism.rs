use super::Embeddable;
use crate::engine::polymorphism::SubclassSource;
use crate::member::{Lens, PartialLens, Property};
use crate::primitive::{EnumEncoding, MappedEnum, Primitive};
use crate::Entity;

use trellis_core::schema::naming::ColumnNaming;

use std::fmt;
use std::sync::Arc;

/// How the subtypes of a polymorphic entity are laid out in tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolymorphismKind {
    /// Each subtype adds a table joined to its parent's by primary key.
    JoinedTables,

    /// Subtype columns share the parent's table; a discriminator column tells
    /// rows apart.
    SingleTable,

    /// Each concrete subtype has a complete table of its own.
    TablePerClass,
}

impl PolymorphismKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            PolymorphismKind::JoinedTables => "joined-tables",
            PolymorphismKind::SingleTable => "single-table",
            PolymorphismKind::TablePerClass => "table-per-class",
        }
    }
}

impl fmt::Display for PolymorphismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The subtypes of a polymorphic entity and their layout.
///
/// Subtypes are typically the variants of an enum:
///
/// ```ignore
/// let policy = PolymorphismPolicy::joined_tables()
///     .add_sub_class(
///         SubEntity::new(Vehicle::as_car, Vehicle::as_car_mut, Vehicle::Car)
///             .add(property!(Car, doors)),
///     );
/// ```
pub struct PolymorphismPolicy<E> {
    pub(crate) kind: PolymorphismKind,
    pub(crate) subclasses: Vec<Box<dyn SubclassSource<E>>>,
    pub(crate) discriminator_column: Option<String>,
}

impl<E: Entity> PolymorphismPolicy<E> {
    pub fn new(kind: PolymorphismKind) -> Self {
        PolymorphismPolicy {
            kind,
            subclasses: vec![],
            discriminator_column: None,
        }
    }

    pub fn joined_tables() -> Self {
        PolymorphismPolicy::new(PolymorphismKind::JoinedTables)
    }

    pub fn single_table() -> Self {
        PolymorphismPolicy::new(PolymorphismKind::SingleTable)
    }

    pub fn table_per_class() -> Self {
        PolymorphismPolicy::new(PolymorphismKind::TablePerClass)
    }

    pub fn add_sub_class<S: Entity>(mut self, subclass: SubEntity<E, S>) -> Self {
        self.subclasses.push(Box::new(subclass));
        self
    }

    /// Names the discriminator column of single-table layouts.
    pub fn discriminator_column(mut self, column: impl Into<String>) -> Self {
        self.discriminator_column = Some(column.into());
        self
    }

    pub fn kind(&self) -> PolymorphismKind {
        self.kind
    }
}

/// The mapping of one subtype `S` of the polymorphic type `P`.
///
/// `downcast` and `downcast_mut` yield the subtype part of a `P` when it is
/// an `S`; `upcast` wraps a new `S` into a `P`.
pub struct SubEntity<P, S> {
    pub(crate) downcast: PartialLens<P, S>,
    pub(crate) upcast: Arc<dyn Fn(S) -> P + Send + Sync>,
    pub(crate) properties: Embeddable<S>,
    pub(crate) discriminator: Option<String>,
    pub(crate) polymorphism: Option<PolymorphismPolicy<S>>,
    pub(crate) table_name: Option<String>,
}

impl<P: Entity, S: Entity> SubEntity<P, S> {
    pub fn new<D, M, U>(downcast: D, downcast_mut: M, upcast: U) -> Self
    where
        D: Fn(&P) -> Option<&S> + Send + Sync + 'static,
        M: Fn(&mut P) -> Option<&mut S> + Send + Sync + 'static,
        U: Fn(S) -> P + Send + Sync + 'static,
    {
        SubEntity {
            downcast: PartialLens::new(downcast, downcast_mut),
            upcast: Arc::new(upcast),
            properties: Embeddable::new(),
            discriminator: None,
            polymorphism: None,
            table_name: None,
        }
    }

    pub fn add<V: Primitive>(mut self, property: Property<S, V>) -> Self {
        self.properties = self.properties.add(property);
        self
    }

    pub fn add_as<V: Primitive>(mut self, property: Property<S, V>, column: impl Into<String>) -> Self {
        self.properties = self.properties.add_as(property, column);
        self
    }

    pub fn add_enum<M: MappedEnum>(mut self, property: Property<S, M>, encoding: EnumEncoding) -> Self {
        self.properties = self.properties.add_enum(property, encoding);
        self
    }

    pub fn embed<V: 'static>(mut self, lens: Lens<S, V>, config: Embeddable<V>) -> Self {
        self.properties = self.properties.embed(lens, config);
        self
    }

    pub fn map_super_class<Q: 'static>(mut self, lens: Lens<S, Q>, config: Embeddable<Q>) -> Self {
        self.properties = self.properties.map_super_class(lens, config);
        self
    }

    /// The discriminator value of this subtype; defaults to its type name.
    pub fn discriminator(mut self, value: impl Into<String>) -> Self {
        self.discriminator = Some(value.into());
        self
    }

    /// Splits this subtype further.
    pub fn map_polymorphism(mut self, policy: PolymorphismPolicy<S>) -> Self {
        self.polymorphism = Some(policy);
        self
    }

    /// The table of this subtype in joined layouts.
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn column_naming(mut self, naming: impl ColumnNaming + 'static) -> Self {
        self.properties = self.properties.column_naming(naming);
        self
    }
}
