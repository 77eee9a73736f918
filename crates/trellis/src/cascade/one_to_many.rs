use super::indexed::{self, index_value};
use super::{member_name, update_row, RelationConfig, RelationScope};
use crate::config::{BackRef, CascadeType, CascadeTypes, CollectionKind, OneToMany};
use crate::mapping::ColumnBinding;
use crate::member::{Lens, Member};
use crate::persister::{EntityPersister, PersistListener, Persister};
use crate::session::Session;
use crate::{Entity, Result};

use trellis_core::driver::operation::{Delete, Insert, Select, Update};
use trellis_core::schema::db;
use trellis_core::stmt::{Filter, Record, Type, Value};
use trellis_core::Error;

use std::sync::Arc;

/// Propagates operations along a one-to-many relation.
struct OneToManyCascade<E, T> {
    lens: Lens<E, Vec<T>>,
    target: Arc<EntityPersister<T>>,
    owner_id: ColumnBinding<E>,
    cascade: CascadeTypes,
    orphan_removal: bool,
    index_column: Option<String>,
    storage: Storage<T>,
}

/// Where the links between owner and elements live.
enum Storage<T> {
    /// A foreign key in the element's table.
    Reverse {
        column: String,
        back_ref: Option<BackRef<T>>,
    },

    /// Rows of a dedicated table.
    Association(AssociationTable),
}

struct AssociationTable {
    name: String,
    owner_column: String,
    target_column: String,
}

/// One row of an association table.
#[derive(Debug, Clone, PartialEq)]
struct AssociationRecord {
    owner: Value,
    target: Value,
    index: Option<Value>,
}

impl<E: Entity, T: Entity> RelationConfig<E> for OneToMany<E, T> {
    fn configure(self: Box<Self>, scope: &mut RelationScope<'_, '_, E>) -> Result<()> {
        let OneToMany {
            lens,
            target,
            kind,
            cascade,
            orphan_removal,
            mapped_by,
            reverse_column,
            index_column,
            association_table,
        } = *self;

        let relation = scope.relation_name(lens.path());
        let member = member_name(lens.path()).to_string();

        if index_column.is_some() && kind == CollectionKind::Set {
            return Err(Error::invalid_mapping(format!(
                "{relation} is a set; only lists can be indexed"
            )));
        }

        let target = scope.target(target)?;
        let owner_table = scope.owner_table().to_string();
        let owner_id = scope.owner_id().clone();
        let target_id = target.identifier().binding().clone();
        let naming = scope.scope().naming();

        let index_column = index_column.map(|column| {
            column.unwrap_or_else(|| naming.index_column.index_column_name(&member))
        });

        let storage = if mapped_by.is_some() || reverse_column.is_some() {
            if association_table.is_some() {
                return Err(Error::invalid_mapping(format!(
                    "{relation} cannot have both an association table and a reverse column"
                )));
            }

            let mapped_column = mapped_by
                .as_ref()
                .and_then(|mapped_by| target.column_for(&mapped_by.member))
                .map(str::to_string);
            let Some(column) = reverse_column.or(mapped_column) else {
                return Err(Error::invalid_mapping(format!(
                    "{relation} is mapped by a member that {} does not map",
                    target.entity().simple_name()
                )));
            };

            scope.add_column(target.table(), &column, owner_id.ty(), true, true)?;
            scope.add_foreign_key(target.table(), &column, &owner_table, owner_id.column())?;
            if let Some(index) = &index_column {
                scope.add_column(target.table(), index, Type::I32, true, false)?;
            }

            Storage::Reverse {
                column,
                back_ref: mapped_by.map(|mapped_by| mapped_by.write),
            }
        } else {
            let name = association_table.unwrap_or_else(|| {
                naming.association_table.table_name(&owner_table, &member)
            });
            let table = AssociationTable {
                owner_column: naming
                    .association_table
                    .owner_column(&owner_table, owner_id.column()),
                target_column: naming
                    .association_table
                    .target_column(&member, target_id.column()),
                name,
            };

            let mut db_table = db::Table::new(&table.name);
            db_table.add_column(scope.scope().column(&table.owner_column, owner_id.ty())?.primary_key())?;
            db_table.add_column(scope.scope().column(&table.target_column, target_id.ty())?.primary_key())?;
            if let Some(index) = &index_column {
                db_table.add_column(scope.scope().column(index, Type::I32)?.nullable(false))?;
            }
            scope.add_table(db_table)?;
            scope.add_foreign_key(&table.name, &table.owner_column, &owner_table, owner_id.column())?;
            scope.add_foreign_key(
                &table.name,
                &table.target_column,
                target.table(),
                target_id.column(),
            )?;

            Storage::Association(table)
        };

        scope.add_listener(OneToManyCascade {
            lens,
            target,
            owner_id,
            cascade,
            orphan_removal,
            index_column,
            storage,
        });
        Ok(())
    }
}

impl<E: Entity, T: Entity> OneToManyCascade<E, T> {
    fn identify(&self, element: &T) -> Option<Value> {
        self.target
            .is_persisted(element)
            .then(|| self.target.id_of(element))
    }

    /// Links `element` at `position` to the owner, inserting it first if it
    /// is new.
    fn attach(
        &self,
        session: &mut Session,
        element: &mut T,
        owner_id: &Value,
        position: usize,
    ) -> Result<()> {
        match &self.storage {
            Storage::Reverse { column, back_ref } => {
                if let Some(back_ref) = back_ref {
                    back_ref(element, owner_id.clone())?;
                }

                let mut link = Record::new();
                link.insert(column, owner_id.clone());
                if let Some(index) = &self.index_column {
                    link.insert(index, index_value(position)?);
                }

                if !self.target.is_persisted(element) {
                    if self.cascade.contains(CascadeType::Insert) {
                        self.target.insert_with(session, element, &link)?;
                    }
                    Ok(())
                } else {
                    self.update_element(session, element, link)
                }
            }
            Storage::Association(table) => {
                if !self.target.is_persisted(element) {
                    if !self.cascade.contains(CascadeType::Insert) {
                        return Ok(());
                    }
                    self.target.insert(session, element)?;
                }

                let record = AssociationRecord {
                    owner: owner_id.clone(),
                    target: self.target.id_of(element),
                    index: self
                        .index_column
                        .as_ref()
                        .map(|_| index_value(position))
                        .transpose()?,
                };
                self.insert_association(session, table, record)
            }
        }
    }

    /// Unlinks `element`, or deletes it with orphan removal.
    fn detach(&self, session: &mut Session, element: &T, owner_id: &Value) -> Result<()> {
        match &self.storage {
            Storage::Reverse { column, .. } => {
                if self.orphan_removal {
                    return self.target.delete(session, element);
                }

                let mut unlink = Record::new();
                unlink.insert(column, Value::Null);
                if let Some(index) = &self.index_column {
                    unlink.insert(index, Value::Null);
                }
                self.update_element(session, element, unlink)
            }
            Storage::Association(table) => {
                let filter = Filter::eq(&table.owner_column, owner_id.clone())
                    .and_eq(&table.target_column, self.target.id_of(element));
                session.exec(Delete {
                    table: table.name.clone(),
                    filter,
                })?;

                if self.orphan_removal {
                    self.target.delete(session, element)?;
                }
                Ok(())
            }
        }
    }

    /// Stores the new position of a held element.
    fn reindex(
        &self,
        session: &mut Session,
        element: &T,
        owner_id: &Value,
        position: usize,
    ) -> Result<()> {
        let Some(index) = &self.index_column else {
            return Ok(());
        };

        let mut assignments = Record::new();
        assignments.insert(index, index_value(position)?);

        match &self.storage {
            Storage::Reverse { .. } => self.update_element(session, element, assignments),
            Storage::Association(table) => {
                session.exec(Update {
                    table: table.name.clone(),
                    assignments,
                    filter: Filter::eq(&table.owner_column, owner_id.clone())
                        .and_eq(&table.target_column, self.target.id_of(element)),
                })?;
                Ok(())
            }
        }
    }

    fn update_element(&self, session: &mut Session, element: &T, assignments: Record) -> Result<()> {
        update_row(
            session,
            self.target.table(),
            self.target.id_column(),
            self.target.id_of(element),
            assignments,
        )
    }

    fn insert_association(
        &self,
        session: &mut Session,
        table: &AssociationTable,
        record: AssociationRecord,
    ) -> Result<()> {
        let mut values = Record::new();
        values.insert(&table.owner_column, record.owner);
        values.insert(&table.target_column, record.target);
        if let (Some(column), Some(index)) = (&self.index_column, record.index) {
            values.insert(column, index);
        }

        session.exec(Insert {
            table: table.name.clone(),
            values,
            returning: None,
        })?;
        Ok(())
    }

    fn select_associations(
        &self,
        session: &mut Session,
        table: &AssociationTable,
        owner_id: Value,
    ) -> Result<Vec<AssociationRecord>> {
        let mut columns = vec![table.owner_column.clone(), table.target_column.clone()];
        columns.extend(self.index_column.clone());

        let rows = session
            .exec(Select {
                table: table.name.clone(),
                columns,
                filter: Filter::eq(&table.owner_column, owner_id),
                order_by: self.index_column.clone(),
            })?
            .rows
            .into_values()?;

        Ok(rows
            .into_iter()
            .map(|mut row| AssociationRecord {
                owner: row.take(&table.owner_column),
                target: row.take(&table.target_column),
                index: self.index_column.as_ref().map(|column| row.take(column)),
            })
            .collect())
    }
}

impl<E: Entity, T: Entity> PersistListener<E> for OneToManyCascade<E, T> {
    fn after_insert(&self, session: &mut Session, owner: &mut E) -> Result<()> {
        let owner_id = self.owner_id.read(owner);
        for (position, element) in self.lens.get_mut(owner).iter_mut().enumerate() {
            self.attach(session, element, &owner_id, position)?;
        }
        Ok(())
    }

    fn after_update(&self, session: &mut Session, modified: &mut E, original: &E) -> Result<()> {
        let owner_id = self.owner_id.read(modified);
        let snapshot = self.lens.get(original);
        let current = self.lens.get_mut(modified);

        let diff = indexed::diff(current, snapshot, |element| self.identify(element));

        for &position in &diff.removed {
            self.detach(session, &snapshot[position], &owner_id)?;
        }

        if self.cascade.contains(CascadeType::Update) {
            for &(position, previous) in &diff.held {
                self.target
                    .update(session, &mut current[position], &snapshot[previous], false)?;
            }
        }

        for position in diff.moved() {
            self.reindex(session, &current[position], &owner_id, position)?;
        }

        for &position in &diff.added {
            self.attach(session, &mut current[position], &owner_id, position)?;
        }
        Ok(())
    }

    fn before_delete(&self, session: &mut Session, owner: &E) -> Result<()> {
        let owner_id = self.owner_id.read(owner);
        let delete_elements = self.cascade.contains(CascadeType::Delete) || self.orphan_removal;

        if let Storage::Association(table) = &self.storage {
            session.exec(Delete {
                table: table.name.clone(),
                filter: Filter::eq(&table.owner_column, owner_id.clone()),
            })?;
        }

        for element in self.lens.get(owner) {
            if !self.target.is_persisted(element) {
                continue;
            }

            match &self.storage {
                _ if delete_elements => self.target.delete(session, element)?,
                Storage::Reverse { column, .. } => {
                    let mut unlink = Record::new();
                    unlink.insert(column, Value::Null);
                    if let Some(index) = &self.index_column {
                        unlink.insert(index, Value::Null);
                    }
                    self.update_element(session, element, unlink)?;
                }
                Storage::Association(_) => {}
            }
        }
        Ok(())
    }

    fn after_select(&self, session: &mut Session, owner: &mut E, _row: &Record) -> Result<()> {
        if !self.cascade.contains(CascadeType::Select) {
            return Ok(());
        }

        let owner_id = self.owner_id.read(owner);
        let elements = match &self.storage {
            Storage::Reverse { column, back_ref } => {
                let filter = Filter::eq(column, owner_id.clone());
                let mut elements =
                    self.target
                        .select_where(session, filter, self.index_column.as_deref())?;
                if let Some(back_ref) = back_ref {
                    for element in &mut elements {
                        back_ref(element, owner_id.clone())?;
                    }
                }
                elements
            }
            Storage::Association(table) => {
                let records = self.select_associations(session, table, owner_id)?;
                let ids: Vec<_> = records.into_iter().map(|record| record.target).collect();
                self.target.select_all(session, &ids)?
            }
        };

        *self.lens.get_mut(owner) = elements;
        Ok(())
    }
}
