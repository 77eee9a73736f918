//! Allocation of the database tables an entity maps to.

use super::entity::Hierarchy;
use crate::persister::Variant;
use super::BuildScope;
use crate::mapping::{ClassMappingStrategy, ColumnBinding, Generation};
use crate::member::MemberPath;
use crate::Result;

use trellis_core::schema::db;
use trellis_core::stmt;
use trellis_core::Error;

use indexmap::IndexMap;
use std::collections::HashMap;

/// A table being allocated, with the member that claimed each column.
struct Draft {
    table: db::Table,
    owners: HashMap<String, Owner>,
}

#[derive(Debug, Clone, PartialEq)]
enum Owner {
    /// Defined by the supplied table.
    Supplied,
    Identifier,
    Discriminator,
    Member(Option<MemberPath>),
}

/// Creates the tables of every variant in `scope.schema`.
///
/// The own table of the hierarchy starts from `supplied` when given.
pub(crate) fn allocate<E: 'static>(
    scope: &mut BuildScope<'_>,
    hierarchy: &Hierarchy<E>,
    variants: &[Variant<E>],
    supplied: Option<db::Table>,
) -> Result<()> {
    let own_table = hierarchy
        .tables
        .last()
        .map(|table| table.table.clone())
        .unwrap_or_default();

    let mut drafts: IndexMap<String, Draft> = IndexMap::new();
    let mut supplied_columns: Vec<String> = vec![];
    if let Some(table) = supplied {
        supplied_columns = table.columns.iter().map(|column| column.name.clone()).collect();
        let owners = table
            .columns
            .iter()
            .map(|column| (column.name.clone(), Owner::Supplied))
            .collect();
        drafts.insert(table.name.clone(), Draft { table, owners });
    }

    let after_insert = matches!(hierarchy.identifier.generation, Generation::AfterInsert);

    for variant in variants {
        for (depth, strategy) in variant.tables.iter().enumerate() {
            let draft = drafts
                .entry(strategy.table.clone())
                .or_insert_with(|| Draft {
                    table: db::Table::new(strategy.table.clone()),
                    owners: HashMap::new(),
                });

            allocate_identifier(scope, draft, strategy, depth == 0 && after_insert)?;
            for binding in &strategy.bindings {
                allocate_binding(scope, draft, binding)?;
            }
            if let Some(discriminator) = &strategy.discriminator {
                let column = scope
                    .column(&discriminator.column, stmt::Type::String)?
                    .nullable(false);
                claim(draft, column, Owner::Discriminator)?;
            }
            if let Some(parent) = &strategy.parent {
                let exists = draft.table.foreign_keys.iter().any(|fk| &fk.target_table == parent);
                if !exists {
                    let id = strategy.id_column();
                    draft.table.add_foreign_key(db::ForeignKey {
                        name: scope.naming().foreign_key.foreign_key_name(
                            &strategy.table,
                            id,
                            parent,
                            id,
                        ),
                        table: strategy.table.clone(),
                        columns: vec![id.to_string()],
                        target_table: parent.clone(),
                        target_columns: vec![id.to_string()],
                    });
                }
            }
        }
    }

    for column in &hierarchy.required {
        if !supplied_columns.contains(column) {
            return Err(Error::invalid_mapping(format!(
                "column {column} is not present in table {own_table}"
            )));
        }
    }

    for (_, draft) in drafts {
        scope.schema.add(draft.table)?;
    }
    Ok(())
}

fn allocate_identifier<E: 'static>(
    scope: &BuildScope<'_>,
    draft: &mut Draft,
    strategy: &ClassMappingStrategy<E>,
    auto_increment: bool,
) -> Result<()> {
    let mut column = scope
        .column(strategy.id_column(), strategy.identifier.ty())?
        .primary_key();
    if auto_increment {
        column = column.auto_increment();
    }
    claim(draft, column, Owner::Identifier)
}

fn allocate_binding<E: 'static>(
    scope: &BuildScope<'_>,
    draft: &mut Draft,
    binding: &ColumnBinding<E>,
) -> Result<()> {
    let column = scope
        .column(binding.column(), binding.ty())?
        .nullable(binding.nullable());
    claim(draft, column, Owner::Member(binding.member().cloned()))
}

/// Adds `column` to the draft unless the same owner already claimed it.
fn claim(draft: &mut Draft, column: db::Column, owner: Owner) -> Result<()> {
    match draft.owners.get(&column.name) {
        None => {
            draft.owners.insert(column.name.clone(), owner);
            draft.table.add_column(column)
        }
        Some(Owner::Supplied) => {
            let table = draft.table.name.clone();
            let existing = draft.table.column_mut(&column.name);
            match existing {
                Some(existing) if existing.ty == column.ty => {
                    if column.primary_key {
                        existing.primary_key = true;
                        existing.nullable = false;
                    }
                    draft.owners.insert(column.name.clone(), owner);
                    Ok(())
                }
                Some(existing) => Err(Error::invalid_mapping(format!(
                    "column {} of table {} has type {:?}, mapped as {:?}",
                    existing.name, table, existing.ty, column.ty
                ))),
                None => draft.table.add_column(column),
            }
        }
        Some(previous) if *previous == owner => Ok(()),
        Some(_) => Err(Error::invalid_mapping(format!(
            "mapping already defined for column {} in table {}",
            column.name, draft.table.name
        ))),
    }
}
