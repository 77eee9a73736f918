//! Compilation of an entity configuration into an
//! [`EntityPersister`](crate::persister::EntityPersister).

use super::polymorphism;
use super::{embedded, table, BuildScope};
use crate::cascade::{RelationConfig, RelationScope};
use crate::config::{EntityMapping, IdentifierPolicy, PolymorphismPolicy, VersionSequence};
use crate::mapping::{
    ClassMappingStrategy, ColumnBinding, Generation, IdentifierStrategy, VersionStrategy,
};
use crate::member::{Lens, TypeRef};
use crate::persister::{EntityPersister, Parts, PersistListener, Variant};
use crate::{Entity, Result};

use trellis_core::schema::db;
use trellis_core::schema::naming::{ForeignKeyNaming, JoinColumnNaming};
use trellis_core::Error;

use std::sync::Arc;
use tracing::debug;

/// The table-forming part of an entity configuration.
pub(crate) struct Level<E> {
    identifier: Option<(ColumnBinding<E>, IdentifierPolicy<E>)>,
    properties: crate::config::Embeddable<E>,
    inheritance: Option<Box<dyn InheritanceSource<E>>>,
    version: Option<(ColumnBinding<E>, Arc<dyn VersionSequence>)>,
    table_name: Option<String>,

    /// Name of a supplied table, used verbatim.
    supplied_table: Option<String>,
}

/// Everything in an entity configuration that is not inherited.
pub(crate) struct Extras<E> {
    relations: Vec<Box<dyn RelationConfig<E>>>,
    polymorphism: Option<PolymorphismPolicy<E>>,
    foreign_key_naming: Option<Arc<dyn ForeignKeyNaming>>,
    join_column_naming: Option<Arc<dyn JoinColumnNaming>>,
    listeners: Vec<Arc<dyn PersistListener<E>>>,
}

impl<E> Extras<E> {
    pub(crate) fn is_empty(&self) -> bool {
        self.relations.is_empty() && self.polymorphism.is_none() && self.listeners.is_empty()
    }
}

pub(crate) fn split<E>(mapping: EntityMapping<E>) -> (Level<E>, Extras<E>) {
    let EntityMapping {
        identifier,
        properties,
        relations,
        inheritance,
        polymorphism,
        version,
        table_name,
        foreign_key_naming,
        join_column_naming,
        listeners,
    } = mapping;

    (
        Level {
            identifier,
            properties,
            inheritance,
            version,
            table_name,
            supplied_table: None,
        },
        Extras {
            relations,
            polymorphism,
            foreign_key_naming,
            join_column_naming,
            listeners,
        },
    )
}

/// The tables of an entity and of its inherited parents, root first.
pub(crate) struct Hierarchy<E> {
    pub(crate) identifier: IdentifierStrategy<E>,
    pub(crate) tables: Vec<ClassMappingStrategy<E>>,
    pub(crate) version: Option<VersionStrategy<E>>,

    /// Columns of the last table that a supplied table must define.
    pub(crate) required: Vec<String>,
}

impl<E: 'static> Hierarchy<E> {
    pub(crate) fn lift<C: 'static>(&self, lens: &Lens<C, E>) -> Hierarchy<C> {
        Hierarchy {
            identifier: self.identifier.lift(lens),
            tables: self.tables.iter().map(|table| table.lift(lens)).collect(),
            version: self.version.as_ref().map(|version| version.lift(lens)),
            required: self.required.clone(),
        }
    }
}

/// A parent entity configuration, erased over the parent type.
pub(crate) trait InheritanceSource<E> {
    fn compile(self: Box<Self>, scope: &mut BuildScope<'_>) -> Result<Parent<E>>;
}

pub(crate) struct Parent<E> {
    pub(crate) hierarchy: Hierarchy<E>,

    /// Whether the child's table joins the parent's rather than absorbing it.
    pub(crate) joined: bool,
}

/// Builds and registers the persister of `E`.
pub(crate) fn build<E: Entity>(
    mapping: EntityMapping<E>,
    supplied: Option<db::Table>,
    scope: &mut BuildScope<'_>,
) -> Result<Arc<EntityPersister<E>>> {
    let entity = TypeRef::of::<E>();
    if scope.persister::<E>().is_some() {
        return Err(Error::invalid_mapping(format!(
            "{} is already mapped",
            entity.simple_name()
        )));
    }

    let (mut level, extras) = split(mapping);
    if let Some(table) = &supplied {
        level.supplied_table = Some(table.name.clone());
    }

    let hierarchy = compile_hierarchy(level, scope)?;
    let own_index = hierarchy.tables.len() - 1;

    let mut variants = match extras.polymorphism {
        Some(policy) => polymorphism::compile(policy, &hierarchy, scope)?,
        None => vec![Variant::monomorphic(hierarchy.tables.clone())],
    };

    table::allocate(scope, &hierarchy, &variants, supplied)?;

    let own_table = hierarchy.tables[own_index].table.clone();
    let mut relations = RelationScope::new(
        scope,
        entity,
        own_table,
        hierarchy.identifier.clone(),
        extras.foreign_key_naming,
        extras.join_column_naming,
    );
    for relation in extras.relations {
        relation.configure(&mut relations)?;
    }
    let (shadow, cascades) = relations.finish();

    for variant in &mut variants {
        variant.tables[own_index].bindings.extend(shadow.iter().cloned());
    }

    let mut listeners = extras.listeners;
    listeners.extend(cascades);

    let tables: Vec<_> = variants
        .iter()
        .flat_map(|variant| variant.tables.iter().map(|table| table.table.clone()))
        .collect::<indexmap::IndexSet<_>>()
        .into_iter()
        .collect();

    let persister = Arc::new(EntityPersister::new(Parts {
        entity,
        identifier: hierarchy.identifier,
        variants,
        own_index,
        version: hierarchy.version,
        listeners,
    }));
    scope.register(persister.clone())?;

    debug!(
        entity = %entity.simple_name(),
        ?tables,
        variants = persister.variants().len(),
        "compiled entity mapping"
    );

    Ok(persister)
}

/// Compiles the inheritance chain ending at `level`.
pub(crate) fn compile_hierarchy<E: Entity>(
    level: Level<E>,
    scope: &mut BuildScope<'_>,
) -> Result<Hierarchy<E>> {
    let entity = TypeRef::of::<E>();
    let naming = level
        .properties
        .column_naming
        .clone()
        .unwrap_or_else(|| scope.naming().column.clone());

    let parent = match level.inheritance {
        Some(source) => Some(source.compile(scope)?),
        None => None,
    };

    let compiled = embedded::compile(level.properties, &naming)?;
    let mut bindings = compiled.bindings;

    let identifier = match (level.identifier, &parent) {
        (Some(_), Some(_)) => {
            return Err(Error::invalid_mapping(format!(
                "identifier of {} is already defined by its parent",
                entity.simple_name()
            )))
        }
        (None, None) => {
            return Err(Error::invalid_mapping(format!(
                "no identifier is mapped for {}",
                entity.simple_name()
            )))
        }
        (Some((binding, policy)), None) => {
            let column = naming.column_name(binding.column());
            identifier_strategy(binding.with_column(column).with_nullable(false), policy, scope)?
        }
        (None, Some(parent)) => parent.hierarchy.identifier.clone(),
    };

    let table = match level.supplied_table {
        Some(table) => table,
        None => scope.table_name(level.table_name.as_deref(), entity),
    };

    let mut version = match (level.version, &parent) {
        (Some(_), Some(parent)) if parent.hierarchy.version.is_some() => {
            return Err(Error::invalid_mapping(format!(
                "version of {} is already defined by its parent",
                entity.simple_name()
            )))
        }
        (Some((binding, sequence)), _) => {
            let column = naming.column_name(binding.column());
            let binding = binding.with_column(column).with_nullable(false);
            bindings.push(binding.clone());
            Some(VersionStrategy {
                table: table.clone(),
                binding,
                sequence,
            })
        }
        (None, Some(parent)) => parent.hierarchy.version.clone(),
        (None, None) => None,
    };

    let tables = match parent {
        None => vec![ClassMappingStrategy {
            table: table.clone(),
            identifier: identifier.binding.clone(),
            bindings,
            discriminator: None,
            parent: None,
        }],
        Some(Parent { hierarchy, joined }) => {
            let mut tables = hierarchy.tables;
            let Some(last) = tables.pop() else {
                return Err(Error::invalid_mapping("inherited entity has no table"));
            };

            if joined {
                let parent_table = last.table.clone();
                tables.push(last);
                tables.push(ClassMappingStrategy {
                    table: table.clone(),
                    identifier: identifier.binding.clone(),
                    bindings,
                    discriminator: None,
                    parent: Some(parent_table),
                });
            } else {
                // The parent's own table is absorbed into this one.
                if let Some(version) = version.as_mut().filter(|v| v.table == last.table) {
                    version.table = table.clone();
                }

                let mut merged = last.bindings;
                merged.retain(|inherited| {
                    !bindings.iter().any(|own| own.member().is_some() && own.member() == inherited.member())
                });
                merged.extend(bindings);
                tables.push(ClassMappingStrategy {
                    table: table.clone(),
                    identifier: last.identifier,
                    bindings: merged,
                    discriminator: None,
                    parent: last.parent,
                });
            }
            tables
        }
    };

    if let Some(own) = tables.last() {
        let mut columns = vec![own.identifier.clone()];
        columns.extend(own.bindings.iter().cloned());
        embedded::check_conflicts(&columns)?;
    }

    Ok(Hierarchy {
        identifier,
        tables,
        version,
        required: compiled.required,
    })
}

fn identifier_strategy<E: Entity>(
    binding: ColumnBinding<E>,
    policy: IdentifierPolicy<E>,
    scope: &BuildScope<'_>,
) -> Result<IdentifierStrategy<E>> {
    Ok(match policy {
        IdentifierPolicy::AlreadyAssigned {
            is_persisted,
            mark_persisted,
        } => IdentifierStrategy::assigned(binding, is_persisted, mark_persisted),
        IdentifierPolicy::BeforeInsert(sequence) => {
            IdentifierStrategy::generated(binding, Generation::BeforeInsert(sequence))
        }
        IdentifierPolicy::AfterInsert => {
            if !scope.cx().capability().auto_increment {
                return Err(Error::unsupported_feature(
                    "the database does not generate identifiers on insert",
                ));
            }
            IdentifierStrategy::generated(binding, Generation::AfterInsert)
        }
    })
}
