use super::{member_name, update_row, RelationConfig, RelationScope};
use crate::config::{BackRef, CascadeType, CascadeTypes, OneToOne};
use crate::mapping::ColumnBinding;
use crate::member::{Lens, Member};
use crate::persister::{EntityPersister, PersistListener, Persister};
use crate::session::Session;
use crate::{Entity, Result};

use trellis_core::stmt::{Filter, Record, Value};
use trellis_core::Error;

use std::sync::Arc;

/// Propagates operations along a one-to-one relation.
struct OneToOneCascade<E, T> {
    relation: String,
    lens: Lens<E, Option<T>>,
    target: Arc<EntityPersister<T>>,
    cascade: CascadeTypes,
    mandatory: bool,
    side: Side<E, T>,
}

/// Which table carries the foreign key.
enum Side<E, T> {
    /// The owner's table, in `column`.
    Owner { column: String },

    /// The target's table, in `column`, referencing `owner_id`.
    Target {
        column: String,
        owner_id: ColumnBinding<E>,
        back_ref: Option<BackRef<T>>,
    },
}

impl<E: Entity, T: Entity> RelationConfig<E> for OneToOne<E, T> {
    fn configure(self: Box<Self>, scope: &mut RelationScope<'_, '_, E>) -> Result<()> {
        let OneToOne {
            lens,
            target,
            cascade,
            mandatory,
            mapped_by,
            reverse_column,
            join_column,
        } = *self;

        let relation = scope.relation_name(lens.path());
        let target = scope.target(target)?;
        let owner_table = scope.owner_table().to_string();
        let owner_id = scope.owner_id().clone();

        let side = if mapped_by.is_some() || reverse_column.is_some() {
            if join_column.is_some() {
                return Err(Error::invalid_mapping(format!(
                    "{relation} cannot have both a join column and a reverse column"
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

            Side::Target {
                column,
                owner_id,
                back_ref: mapped_by.map(|mapped_by| mapped_by.write),
            }
        } else {
            let target_id = target.identifier().binding().clone();
            let column = join_column.unwrap_or_else(|| {
                scope
                    .join_column_naming()
                    .join_column_name(member_name(lens.path()), target_id.column())
            });

            scope.add_column(&owner_table, &column, target_id.ty(), !mandatory, false)?;
            scope.add_foreign_key(&owner_table, &column, target.table(), target_id.column())?;

            let read = lens.clone();
            scope.add_shadow(
                ColumnBinding::shadow(column.clone(), target_id.ty(), move |owner: &E| {
                    read.get(owner)
                        .as_ref()
                        .map(|target| target_id.read(target))
                        .unwrap_or_default()
                })
                .with_nullable(!mandatory),
            );

            Side::Owner { column }
        };

        scope.add_listener(OneToOneCascade {
            relation,
            lens,
            target,
            cascade,
            mandatory,
            side,
        });
        Ok(())
    }
}

impl<E: Entity, T: Entity> OneToOneCascade<E, T> {
    fn check_mandatory(&self, owner: &E) -> Result<()> {
        if self.mandatory && self.lens.get(owner).is_none() {
            return Err(Error::mandatory_relation(&self.relation, format!("{owner:?}")));
        }
        Ok(())
    }

    /// Points the foreign key of a persisted target at `owner_id`.
    fn link(&self, session: &mut Session, target: &T, column: &str, owner_id: Value) -> Result<()> {
        let mut assignments = Record::new();
        assignments.insert(column, owner_id);
        update_row(
            session,
            self.target.table(),
            self.target.id_column(),
            self.target.id_of(target),
            assignments,
        )
    }

    /// Inserts or links the target of `owner` when the target's table holds
    /// the key.
    fn attach(
        &self,
        session: &mut Session,
        owner: &mut E,
        original: Option<&T>,
        column: &str,
        owner_id: &ColumnBinding<E>,
        back_ref: Option<&BackRef<T>>,
    ) -> Result<Option<Value>> {
        let id = owner_id.read(owner);
        let Some(target) = self.lens.get_mut(owner).as_mut() else {
            return Ok(None);
        };

        if let Some(back_ref) = back_ref {
            back_ref(target, id.clone())?;
        }

        if !self.target.is_persisted(target) {
            if self.cascade.contains(CascadeType::Insert) {
                let mut extra = Record::new();
                extra.insert(column, id);
                self.target.insert_with(session, target, &extra)?;
            }
        } else {
            let target_id = self.target.id_of(target);
            match original.filter(|original| self.target.id_of(original) == target_id) {
                Some(original) if self.cascade.contains(CascadeType::Update) => {
                    self.target.update(session, target, original, false)?;
                }
                Some(_) => {}
                None => self.link(session, target, column, id)?,
            }
        }

        Ok(Some(self.target.id_of(target)).filter(|id| !id.is_null()))
    }
}

impl<E: Entity, T: Entity> PersistListener<E> for OneToOneCascade<E, T> {
    fn before_insert(&self, session: &mut Session, owner: &mut E) -> Result<()> {
        self.check_mandatory(owner)?;

        if let Side::Owner { .. } = self.side {
            if let Some(target) = self.lens.get_mut(owner).as_mut() {
                if !self.target.is_persisted(target) && self.cascade.contains(CascadeType::Insert) {
                    self.target.insert(session, target)?;
                }
            }
        }
        Ok(())
    }

    fn after_insert(&self, session: &mut Session, owner: &mut E) -> Result<()> {
        if let Side::Target {
            column,
            owner_id,
            back_ref,
        } = &self.side
        {
            self.attach(session, owner, None, column, owner_id, back_ref.as_ref())?;
        }
        Ok(())
    }

    fn before_update(&self, session: &mut Session, modified: &mut E, original: &E) -> Result<()> {
        self.check_mandatory(modified)?;

        if let Side::Owner { .. } = self.side {
            let previous = self.lens.get(original).as_ref();
            if let Some(target) = self.lens.get_mut(modified).as_mut() {
                if !self.target.is_persisted(target) {
                    if self.cascade.contains(CascadeType::Insert) {
                        self.target.insert(session, target)?;
                    }
                } else if self.cascade.contains(CascadeType::Update) {
                    let id = self.target.id_of(target);
                    if let Some(previous) = previous.filter(|p| self.target.id_of(p) == id) {
                        self.target.update(session, target, previous, false)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn after_update(&self, session: &mut Session, modified: &mut E, original: &E) -> Result<()> {
        let Side::Target {
            column,
            owner_id,
            back_ref,
        } = &self.side
        else {
            return Ok(());
        };

        let previous = self.lens.get(original).as_ref();
        let current = self.attach(session, modified, previous, column, owner_id, back_ref.as_ref())?;

        if let Some(previous) = previous.filter(|p| self.target.is_persisted(p)) {
            let previous_id = self.target.id_of(previous);
            if current.as_ref() != Some(&previous_id) {
                self.link(session, previous, column, Value::Null)?;
            }
        }
        Ok(())
    }

    fn before_delete(&self, session: &mut Session, owner: &E) -> Result<()> {
        let Side::Target { column, .. } = &self.side else {
            return Ok(());
        };

        if let Some(target) = self.lens.get(owner).as_ref() {
            if self.target.is_persisted(target) {
                if self.cascade.contains(CascadeType::Delete) {
                    self.target.delete(session, target)?;
                } else {
                    self.link(session, target, column, Value::Null)?;
                }
            }
        }
        Ok(())
    }

    fn after_delete(&self, session: &mut Session, owner: &E) -> Result<()> {
        if let Side::Owner { .. } = self.side {
            if let Some(target) = self.lens.get(owner).as_ref() {
                if self.target.is_persisted(target) && self.cascade.contains(CascadeType::Delete) {
                    self.target.delete(session, target)?;
                }
            }
        }
        Ok(())
    }

    fn after_select(&self, session: &mut Session, owner: &mut E, row: &Record) -> Result<()> {
        if !self.cascade.contains(CascadeType::Select) {
            return Ok(());
        }

        let target = match &self.side {
            Side::Owner { column } => self.target.select(session, row.get(column).clone())?,
            Side::Target {
                column,
                owner_id,
                back_ref,
            } => {
                let id = owner_id.read(owner);
                let filter = Filter::eq(column, id.clone());
                let mut target = self.target.select_where(session, filter, None)?.into_iter().next();
                if let (Some(target), Some(back_ref)) = (target.as_mut(), back_ref) {
                    back_ref(target, id)?;
                }
                target
            }
        };

        *self.lens.get_mut(owner) = target;
        Ok(())
    }
}
