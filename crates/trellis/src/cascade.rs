//! Relations, compiled into persist listeners that propagate operations from
//! an owner to the entities it relates to.

mod indexed;

mod one_to_many;

mod one_to_one;

use crate::config::RelationTarget;
use crate::engine::{entity, BuildScope};
use crate::mapping::{ColumnBinding, IdentifierStrategy};
use crate::member::{MemberPath, TypeRef};
use crate::persister::{EntityPersister, PersistListener};
use crate::session::Session;
use crate::{Entity, Result};

use trellis_core::driver::operation::Update;
use trellis_core::schema::db;
use trellis_core::schema::naming::{ForeignKeyNaming, JoinColumnNaming};
use trellis_core::stmt::{Filter, Record, Type, Value};
use trellis_core::Error;

use std::sync::Arc;

/// A relation configuration, erased over the target type.
pub(crate) trait RelationConfig<E> {
    fn configure(self: Box<Self>, scope: &mut RelationScope<'_, '_, E>) -> Result<()>;
}

/// What relations of one owner contribute to its build.
pub(crate) struct RelationScope<'a, 'cx, E> {
    scope: &'a mut BuildScope<'cx>,
    owner: TypeRef,
    owner_table: String,
    owner_identifier: IdentifierStrategy<E>,
    foreign_key_naming: Arc<dyn ForeignKeyNaming>,
    join_column_naming: Arc<dyn JoinColumnNaming>,
    shadow: Vec<ColumnBinding<E>>,
    listeners: Vec<Arc<dyn PersistListener<E>>>,
}

impl<'a, 'cx, E: Entity> RelationScope<'a, 'cx, E> {
    pub(crate) fn new(
        scope: &'a mut BuildScope<'cx>,
        owner: TypeRef,
        owner_table: String,
        owner_identifier: IdentifierStrategy<E>,
        foreign_key_naming: Option<Arc<dyn ForeignKeyNaming>>,
        join_column_naming: Option<Arc<dyn JoinColumnNaming>>,
    ) -> Self {
        let naming = scope.naming();
        RelationScope {
            foreign_key_naming: foreign_key_naming.unwrap_or_else(|| naming.foreign_key.clone()),
            join_column_naming: join_column_naming.unwrap_or_else(|| naming.join_column.clone()),
            scope,
            owner,
            owner_table,
            owner_identifier,
            shadow: vec![],
            listeners: vec![],
        }
    }

    pub(crate) fn scope(&self) -> &BuildScope<'cx> {
        self.scope
    }

    pub(crate) fn owner_table(&self) -> &str {
        &self.owner_table
    }

    pub(crate) fn owner_id(&self) -> &ColumnBinding<E> {
        &self.owner_identifier.binding
    }

    pub(crate) fn join_column_naming(&self) -> &dyn JoinColumnNaming {
        &*self.join_column_naming
    }

    /// `Owner::member`, as relation errors name it.
    pub(crate) fn relation_name(&self, member: &MemberPath) -> String {
        format!("{}::{}", self.owner.simple_name(), member_name(member))
    }

    /// The persister of the relation's target, built if needed.
    pub(crate) fn target<T: Entity>(
        &mut self,
        target: RelationTarget<T>,
    ) -> Result<Arc<EntityPersister<T>>> {
        if let Some(persister) = self.scope.persister::<T>() {
            return Ok(persister);
        }

        match target {
            RelationTarget::Mapping(mapping) => entity::build(mapping, None, self.scope),
            RelationTarget::Registered => Err(Error::invalid_mapping(format!(
                "{} is not mapped",
                TypeRef::of::<T>().simple_name()
            ))),
        }
    }

    /// Adds a relation column to `table`. With `shared`, a column the target
    /// already maps is reused, provided the types agree.
    pub(crate) fn add_column(
        &mut self,
        table: &str,
        column: &str,
        ty: Type,
        nullable: bool,
        shared: bool,
    ) -> Result<()> {
        let new_column = self.scope.column(column, ty)?.nullable(nullable);
        let Some(db_table) = self.scope.schema.table_mut(table) else {
            return Err(Error::invalid_mapping(format!("table {table} is not mapped")));
        };

        match db_table.column(column) {
            Some(existing) if shared && existing.ty == ty => Ok(()),
            Some(existing) if shared => Err(Error::invalid_mapping(format!(
                "column {column} of table {table} has type {:?}, the relation needs {ty:?}",
                existing.ty
            ))),
            _ => db_table.add_column(new_column),
        }
    }

    /// Makes `table.column` reference `target_table.target_column`.
    pub(crate) fn add_foreign_key(
        &mut self,
        table: &str,
        column: &str,
        target_table: &str,
        target_column: &str,
    ) -> Result<()> {
        let name = self
            .foreign_key_naming
            .foreign_key_name(table, column, target_table, target_column);
        let Some(db_table) = self.scope.schema.table_mut(table) else {
            return Err(Error::invalid_mapping(format!("table {table} is not mapped")));
        };

        db_table.add_foreign_key(db::ForeignKey {
            name,
            table: table.to_string(),
            columns: vec![column.to_string()],
            target_table: target_table.to_string(),
            target_columns: vec![target_column.to_string()],
        });
        Ok(())
    }

    pub(crate) fn add_table(&mut self, table: db::Table) -> Result<()> {
        self.scope.schema.add(table)
    }

    /// A column of the owner's table written from the relation.
    pub(crate) fn add_shadow(&mut self, binding: ColumnBinding<E>) {
        self.shadow.push(binding);
    }

    pub(crate) fn add_listener(&mut self, listener: impl PersistListener<E> + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    pub(crate) fn finish(self) -> (Vec<ColumnBinding<E>>, Vec<Arc<dyn PersistListener<E>>>) {
        (self.shadow, self.listeners)
    }
}

pub(crate) fn member_name(member: &MemberPath) -> &str {
    member.terminal().name()
}

/// `UPDATE table SET assignments WHERE id_column = id`.
pub(crate) fn update_row(
    session: &mut Session,
    table: &str,
    id_column: &str,
    id: Value,
    assignments: Record,
) -> Result<()> {
    session.exec(Update {
        table: table.to_string(),
        assignments,
        filter: Filter::eq(id_column, id),
    })?;
    Ok(())
}
