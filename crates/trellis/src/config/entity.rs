use super::embeddable::member_name;
use super::{
    Embeddable, Embedded, IdentifierPolicy, Inheritance, OneToMany, OneToOne, PolymorphismPolicy,
    VersionSequence,
};
use crate::cascade::RelationConfig;
use crate::context::PersistenceContext;
use crate::engine::{self, entity::InheritanceSource};
use crate::mapping::ColumnBinding;
use crate::member::{Lens, Property};
use crate::persister::{EntityPersister, PersistListener};
use crate::primitive::{EnumEncoding, MappedEnum, Primitive};
use crate::{Entity, Result};

use trellis_core::schema::db;
use trellis_core::schema::naming::{ColumnNaming, ForeignKeyNaming, JoinColumnNaming};

use std::sync::Arc;

/// The mapping configuration of an entity: an identified type stored in its
/// own table.
///
/// ```ignore
/// let country = EntityMapping::new()
///     .identifier(property!(Country, id), IdentifierPolicy::after_insert())
///     .add(property!(Country, name))
///     .build(&mut cx)?;
/// ```
pub struct EntityMapping<E> {
    pub(crate) identifier: Option<(ColumnBinding<E>, IdentifierPolicy<E>)>,
    pub(crate) properties: Embeddable<E>,
    pub(crate) relations: Vec<Box<dyn RelationConfig<E>>>,
    pub(crate) inheritance: Option<Box<dyn InheritanceSource<E>>>,
    pub(crate) polymorphism: Option<PolymorphismPolicy<E>>,
    pub(crate) version: Option<(ColumnBinding<E>, Arc<dyn VersionSequence>)>,
    pub(crate) table_name: Option<String>,
    pub(crate) foreign_key_naming: Option<Arc<dyn ForeignKeyNaming>>,
    pub(crate) join_column_naming: Option<Arc<dyn JoinColumnNaming>>,
    pub(crate) listeners: Vec<Arc<dyn PersistListener<E>>>,
}

impl<E: Entity> EntityMapping<E> {
    pub fn new() -> Self {
        EntityMapping {
            identifier: None,
            properties: Embeddable::new(),
            relations: vec![],
            inheritance: None,
            polymorphism: None,
            version: None,
            table_name: None,
            foreign_key_naming: None,
            join_column_naming: None,
            listeners: vec![],
        }
    }

    /// Declares the identifier property and how its values are produced.
    pub fn identifier<I: Primitive>(
        mut self,
        property: Property<E, I>,
        policy: IdentifierPolicy<E>,
    ) -> Self {
        let binding = ColumnBinding::property(&property, member_name(&property));
        self.identifier = Some((binding, policy));
        self
    }

    pub fn add<V: Primitive>(mut self, property: Property<E, V>) -> Self {
        self.properties = self.properties.add(property);
        self
    }

    pub fn add_as<V: Primitive>(mut self, property: Property<E, V>, column: impl Into<String>) -> Self {
        self.properties = self.properties.add_as(property, column);
        self
    }

    /// Maps `property` to `column`, which a table passed to
    /// [`build_with_table`](EntityMapping::build_with_table) must define.
    pub fn add_to<V: Primitive>(mut self, property: Property<E, V>, column: impl Into<String>) -> Self {
        let binding = ColumnBinding::property(&property, member_name(&property));
        self.properties = self.properties.declare(binding, Some(column.into()), true);
        self
    }

    pub fn add_enum<M: MappedEnum>(mut self, property: Property<E, M>, encoding: EnumEncoding) -> Self {
        self.properties = self.properties.add_enum(property, encoding);
        self
    }

    pub fn embed<V: 'static>(mut self, lens: Lens<E, V>, config: Embeddable<V>) -> Self {
        self.properties = self.properties.embed(lens, config);
        self
    }

    pub fn embed_with<V: 'static>(mut self, embedded: Embedded<E, V>) -> Self {
        self.properties = self.properties.embed_with(embedded);
        self
    }

    /// Contributes the property mappings of a parent part that has no table
    /// of its own.
    pub fn map_super_class<P: 'static>(mut self, lens: Lens<E, P>, config: Embeddable<P>) -> Self {
        self.properties = self.properties.map_super_class(lens, config);
        self
    }

    pub fn add_one_to_one<T: Entity>(mut self, relation: OneToOne<E, T>) -> Self {
        self.relations.push(Box::new(relation));
        self
    }

    pub fn add_one_to_many<T: Entity>(mut self, relation: OneToMany<E, T>) -> Self {
        self.relations.push(Box::new(relation));
        self
    }

    /// Inherits the identifier, properties, and version of a parent entity.
    pub fn map_inheritance<P: Entity>(mut self, inheritance: Inheritance<E, P>) -> Self {
        self.inheritance = Some(Box::new(inheritance));
        self
    }

    pub fn map_polymorphism(mut self, policy: PolymorphismPolicy<E>) -> Self {
        self.polymorphism = Some(policy);
        self
    }

    /// Enables optimistic locking on `property`.
    pub fn versioned_by<V: Primitive>(
        mut self,
        property: Property<E, V>,
        sequence: impl VersionSequence + 'static,
    ) -> Self {
        let binding = ColumnBinding::property(&property, member_name(&property));
        self.version = Some((binding, Arc::new(sequence)));
        self
    }

    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    pub fn column_naming(mut self, naming: impl ColumnNaming + 'static) -> Self {
        self.properties = self.properties.column_naming(naming);
        self
    }

    pub fn foreign_key_naming(mut self, naming: impl ForeignKeyNaming + 'static) -> Self {
        self.foreign_key_naming = Some(Arc::new(naming));
        self
    }

    pub fn join_column_naming(mut self, naming: impl JoinColumnNaming + 'static) -> Self {
        self.join_column_naming = Some(Arc::new(naming));
        self
    }

    /// Registers a listener notified around every persistence operation.
    pub fn add_listener(mut self, listener: impl PersistListener<E> + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Compiles the configuration, with everything it relates to, and
    /// registers the resulting persisters in `cx`.
    ///
    /// Nothing is registered when the build fails.
    pub fn build(self, cx: &mut PersistenceContext) -> Result<Arc<EntityPersister<E>>> {
        cx.build(|scope| engine::entity::build(self, None, scope))
    }

    /// Like [`build`](EntityMapping::build), storing the entity in `table`.
    ///
    /// Columns of the mapping missing from `table` are added; columns it
    /// already defines must agree with the mapped types.
    pub fn build_with_table(
        self,
        cx: &mut PersistenceContext,
        table: db::Table,
    ) -> Result<Arc<EntityPersister<E>>> {
        cx.build(|scope| engine::entity::build(self, Some(table), scope))
    }
}

impl<E: Entity> Default for EntityMapping<E> {
    fn default() -> Self {
        EntityMapping::new()
    }
}
