use super::{PersistListener, Persister};
use crate::mapping::{ClassMappingStrategy, Generation, IdentifierStrategy, VersionStrategy};
use crate::member::{MemberPath, TypeRef};
use crate::session::Session;
use crate::{Entity, Result};

use trellis_core::driver::operation::{Delete, Insert, Select, Update};
use trellis_core::stmt::{Filter, Record, Value};
use trellis_core::Error;

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

type Matcher<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type Factory<E> = Arc<dyn Fn() -> E + Send + Sync>;

/// One concrete type the rows of an entity may hold.
pub struct Variant<E> {
    pub(crate) entity: TypeRef,
    pub(crate) matches: Matcher<E>,
    pub(crate) instantiate: Factory<E>,

    /// Root table first.
    pub(crate) tables: Vec<ClassMappingStrategy<E>>,
}

impl<E> Variant<E> {
    pub fn entity(&self) -> TypeRef {
        self.entity
    }

    pub fn tables(&self) -> &[ClassMappingStrategy<E>] {
        &self.tables
    }

    /// Whether `entity` is an instance of this variant.
    pub fn matches(&self, entity: &E) -> bool {
        (self.matches)(entity)
    }
}

impl<E: Entity> Variant<E> {
    /// The only variant of a non-polymorphic entity.
    pub(crate) fn monomorphic(tables: Vec<ClassMappingStrategy<E>>) -> Self {
        Variant {
            entity: TypeRef::of::<E>(),
            matches: Arc::new(|_| true),
            instantiate: Arc::new(E::default),
            tables,
        }
    }
}

impl<E> Clone for Variant<E> {
    fn clone(&self) -> Self {
        Variant {
            entity: self.entity,
            matches: self.matches.clone(),
            instantiate: self.instantiate.clone(),
            tables: self.tables.clone(),
        }
    }
}

impl<E> fmt::Debug for Variant<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("entity", &self.entity)
            .field("tables", &self.tables)
            .finish()
    }
}

pub(crate) struct Parts<E> {
    pub(crate) entity: TypeRef,
    pub(crate) identifier: IdentifierStrategy<E>,
    pub(crate) variants: Vec<Variant<E>>,
    pub(crate) own_index: usize,
    pub(crate) version: Option<VersionStrategy<E>>,
    pub(crate) listeners: Vec<Arc<dyn PersistListener<E>>>,
}

/// The persistence strategy of an entity type: its tables, identifier,
/// version, and listeners, ready to execute.
pub struct EntityPersister<E> {
    entity: TypeRef,
    identifier: IdentifierStrategy<E>,
    variants: Vec<Variant<E>>,

    /// Index, in every variant, of the entity's own table.
    own_index: usize,

    version: Option<VersionStrategy<E>>,
    listeners: Vec<Arc<dyn PersistListener<E>>>,

    /// Per table, the key column and every column any variant reads.
    columns: IndexMap<String, (String, Vec<String>)>,
}

impl<E: Entity> EntityPersister<E> {
    pub(crate) fn new(parts: Parts<E>) -> Self {
        let mut columns: IndexMap<String, (String, Vec<String>)> = IndexMap::new();
        for table in parts.variants.iter().flat_map(|variant| &variant.tables) {
            let entry = columns
                .entry(table.table.clone())
                .or_insert_with(|| (table.id_column().to_string(), vec![]));
            for column in table.select_columns() {
                if !entry.1.contains(&column) {
                    entry.1.push(column);
                }
            }
        }

        EntityPersister {
            entity: parts.entity,
            identifier: parts.identifier,
            variants: parts.variants,
            own_index: parts.own_index,
            version: parts.version,
            listeners: parts.listeners,
            columns,
        }
    }

    pub fn entity(&self) -> TypeRef {
        self.entity
    }

    pub fn identifier(&self) -> &IdentifierStrategy<E> {
        &self.identifier
    }

    pub fn variants(&self) -> &[Variant<E>] {
        &self.variants
    }

    pub fn version(&self) -> Option<&VersionStrategy<E>> {
        self.version.as_ref()
    }

    /// The table holding the entity's own columns and its relation keys.
    pub fn table(&self) -> &str {
        &self.variants[0].tables[self.own_index].table
    }

    /// Every table of every variant, root first.
    pub fn tables(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn id_column(&self) -> &str {
        self.identifier.binding.column()
    }

    /// The column `member` is mapped to, in any table.
    pub fn column_for(&self, member: &MemberPath) -> Option<&str> {
        self.variants
            .iter()
            .flat_map(|variant| &variant.tables)
            .find_map(|table| table.column_for(member))
    }

    fn variant_of(&self, entity: &E) -> Result<&Variant<E>> {
        self.variants
            .iter()
            .find(|variant| variant.matches(entity))
            .ok_or_else(|| {
                trellis_core::err!(
                    "{:?} is not an instance of any mapped subtype of {}",
                    entity,
                    self.entity.simple_name()
                )
            })
    }

    fn write_id(&self, entity: &mut E, id: Value) -> Result<()> {
        let id = id.cast(self.identifier.binding.ty())?;
        self.identifier.binding.write(entity, id)
    }

    fn insert_rows(&self, session: &mut Session, entity: &mut E, extra: &Record) -> Result<()> {
        for listener in &self.listeners {
            listener.before_insert(session, entity)?;
        }

        if let Generation::BeforeInsert(sequence) = &self.identifier.generation {
            if self.identifier.id_of(entity).is_null() {
                let id = sequence.next(session)?;
                self.write_id(entity, id)?;
            }
        }

        if let Some(version) = &self.version {
            let current = version.binding.read(entity);
            if current.is_null() {
                let initial = version.sequence.next(&current)?.cast(version.binding.ty())?;
                version.binding.write(entity, initial)?;
            }
        }

        let generated = matches!(self.identifier.generation, Generation::AfterInsert);
        let variant = self.variant_of(entity)?;

        for (index, table) in variant.tables.iter().enumerate() {
            let mut values = table.insert_values(entity);
            if index == self.own_index {
                values.merge(extra);
            }

            if index == 0 && generated && values.get(table.id_column()).is_null() {
                values.remove(table.id_column());
                let rows = session
                    .exec(Insert {
                        table: table.table.clone(),
                        values,
                        returning: Some(table.id_column().to_string()),
                    })?
                    .rows
                    .into_values()?;

                let id = rows
                    .into_iter()
                    .next()
                    .map(|mut row| row.take(table.id_column()))
                    .filter(|id| !id.is_null())
                    .ok_or_else(|| {
                        Error::invalid_result(format!(
                            "no identifier generated for table {}",
                            table.table
                        ))
                    })?;
                self.write_id(entity, id)?;
            } else {
                let count = session
                    .exec(Insert {
                        table: table.table.clone(),
                        values,
                        returning: None,
                    })?
                    .rows
                    .into_count()?;

                if count != 1 {
                    return Err(Error::invalid_result(format!(
                        "expected 1 row inserted into {}, got {count}",
                        table.table
                    )));
                }
            }
        }

        self.identifier.mark_persisted(entity);

        for listener in &self.listeners {
            listener.after_insert(session, entity)?;
        }
        Ok(())
    }

    /// Writes the changed columns of `entity`, bumping its version when
    /// anything changed.
    fn update_rows(
        &self,
        session: &mut Session,
        variant: &Variant<E>,
        entity: &mut E,
        original: Option<&E>,
    ) -> Result<()> {
        let mut changes = Vec::with_capacity(variant.tables.len());
        for table in &variant.tables {
            let mut values = table.update_values(entity);
            if let Some(original) = original {
                values = values.diff(&table.update_values(original));
            }
            if let Some(version) = self.version.as_ref().filter(|v| v.table == table.table) {
                values.remove(version.column());
            }
            changes.push((table, values));
        }

        if changes.iter().all(|(_, values)| values.is_empty()) {
            return Ok(());
        }

        let id = self.identifier.id_of(entity);
        let mut bumped = None;

        for (table, mut assignments) in changes {
            let mut filter = Filter::eq(table.id_column(), id.clone());

            let version = self.version.as_ref().filter(|v| v.table == table.table);
            if let Some(version) = version {
                let current = version.binding.read(entity);
                let next = version.sequence.next(&current)?.cast(version.binding.ty())?;
                assignments.insert(version.column(), next.clone());
                filter = filter.and_eq(version.column(), current.clone());
                bumped = Some((current, next));
            }

            if assignments.is_empty() {
                continue;
            }

            let count = session
                .exec(Update {
                    table: table.table.clone(),
                    assignments,
                    filter,
                })?
                .rows
                .into_count()?;

            if count != 1 {
                if version.is_some() {
                    warn!(
                        entity = %self.entity.simple_name(),
                        table = %table.table,
                        %id,
                        count,
                        "stale object on update"
                    );
                }
                return Err(Error::stale_object(&table.table, 1, count));
            }
        }

        if let (Some(version), Some((previous, next))) = (&self.version, bumped) {
            version.binding.write(entity, next)?;
            self.journal_version(session, id, previous);
        }
        Ok(())
    }

    /// Records how to revert the in-memory version should the enclosing
    /// transaction roll back.
    fn journal_version(&self, session: &mut Session, id: Value, previous: Value) {
        let Some(version) = &self.version else {
            return;
        };
        let binding = version.binding.clone();
        let identifier = self.identifier.binding.clone();

        session.journal::<E>(move |entity| {
            identifier.read(entity) == id && binding.write(entity, previous.clone()).is_ok()
        });
    }

    /// Updates `modified` and its owned sub-graph. Cascades compare against
    /// `original`; the rows themselves are diffed against `original_values`,
    /// or written in full when it is `None`.
    fn update_graph(
        &self,
        session: &mut Session,
        modified: &mut E,
        original: &E,
        original_values: Option<&E>,
    ) -> Result<()> {
        let variant = self.variant_of(modified)?;
        let previous = self.variant_of(original)?;
        if variant.entity != previous.entity {
            return Err(Error::unsupported_feature(format!(
                "changing a {} from {} to {} is not supported",
                self.entity.simple_name(),
                previous.entity.simple_name(),
                variant.entity.simple_name()
            )));
        }

        for listener in &self.listeners {
            listener.before_update(session, modified, original)?;
        }

        self.update_rows(session, variant, modified, original_values)?;

        for listener in &self.listeners {
            listener.after_update(session, modified, original)?;
        }
        Ok(())
    }

    fn delete_graph(&self, session: &mut Session, entity: &E, versioned: bool) -> Result<()> {
        for listener in &self.listeners {
            listener.before_delete(session, entity)?;
        }

        self.delete_rows(session, entity, versioned)?;

        for listener in &self.listeners {
            listener.after_delete(session, entity)?;
        }
        Ok(())
    }

    /// Deletes the rows of `entity`, child tables first. Unless `versioned`
    /// is false, the version column joins the filter.
    fn delete_rows(&self, session: &mut Session, entity: &E, versioned: bool) -> Result<()> {
        let variant = self.variant_of(entity)?;
        let id = self.identifier.id_of(entity);

        for table in variant.tables.iter().rev() {
            let mut filter = Filter::eq(table.id_column(), id.clone());

            let version = self
                .version
                .as_ref()
                .filter(|v| versioned && v.table == table.table);
            if let Some(version) = version {
                filter = filter.and_eq(version.column(), version.binding.read(entity));
            }

            let count = session
                .exec(Delete {
                    table: table.table.clone(),
                    filter,
                })?
                .rows
                .into_count()?;

            if count == 0 && !versioned {
                return Err(Error::record_not_found(format!(
                    "table={} id={id}",
                    table.table
                )));
            }

            if count != 1 {
                if version.is_some() {
                    warn!(
                        entity = %self.entity.simple_name(),
                        table = %table.table,
                        %id,
                        count,
                        "stale object on delete"
                    );
                }
                return Err(Error::stale_object(&table.table, 1, count));
            }
        }
        Ok(())
    }

    fn fetch(&self, session: &mut Session, table: &str, id: &Value) -> Result<Option<Record>> {
        let Some((id_column, columns)) = self.columns.get(table) else {
            return Ok(None);
        };

        let mut rows = session
            .exec(Select {
                table: table.to_string(),
                columns: columns.clone(),
                filter: Filter::eq(id_column, id.clone()),
                order_by: None,
            })?
            .rows
            .into_values()?;

        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    fn load(&self, session: &mut Session, id: Value) -> Result<Option<E>> {
        let root = self.variants[0].tables[0].table.as_str();
        let Some(row) = self.fetch(session, root, &id)? else {
            return Ok(None);
        };

        let mut rows: HashMap<&str, Option<Record>> = HashMap::new();
        rows.insert(root, Some(row));

        for variant in &self.variants {
            let mut matched = true;
            for table in &variant.tables {
                let name = table.table.as_str();
                if !rows.contains_key(name) {
                    let row = self.fetch(session, name, &id)?;
                    rows.insert(name, row);
                }

                match rows.get(name) {
                    Some(Some(row)) if table.matches_row(row) => {}
                    _ => {
                        matched = false;
                        break;
                    }
                }
            }

            if matched {
                return self.instantiate(session, variant, &rows, id).map(Some);
            }
        }

        Err(Error::invalid_result(format!(
            "row {id} of table {root} matches no mapped subtype of {}",
            self.entity.simple_name()
        )))
    }

    fn instantiate(
        &self,
        session: &mut Session,
        variant: &Variant<E>,
        rows: &HashMap<&str, Option<Record>>,
        id: Value,
    ) -> Result<E> {
        let mut entity = (variant.instantiate)();
        self.write_id(&mut entity, id)?;

        let mut merged = Record::new();
        for table in &variant.tables {
            if let Some(Some(row)) = rows.get(table.table.as_str()) {
                table.apply_row(&mut entity, row)?;
                merged.merge(row);
            }
        }
        self.identifier.mark_persisted(&mut entity);

        for listener in &self.listeners {
            listener.after_select(session, &mut entity, &merged)?;
        }
        Ok(entity)
    }
}

impl<E: Entity> Persister<E> for EntityPersister<E> {
    fn insert(&self, session: &mut Session, entity: &mut E) -> Result<()> {
        self.insert_rows(session, entity, &Record::new())
    }

    fn insert_with(&self, session: &mut Session, entity: &mut E, extra: &Record) -> Result<()> {
        self.insert_rows(session, entity, extra)
    }

    fn update(
        &self,
        session: &mut Session,
        modified: &mut E,
        original: &E,
        all_columns: bool,
    ) -> Result<()> {
        let original_values = if all_columns { None } else { Some(original) };
        self.update_graph(session, modified, original, original_values)
    }

    fn update_by_id(&self, session: &mut Session, entity: &mut E) -> Result<()> {
        let snapshot = entity.clone();
        self.update_graph(session, entity, &snapshot, None)
    }

    fn select(&self, session: &mut Session, id: Value) -> Result<Option<E>> {
        if id.is_null() {
            return Ok(None);
        }
        self.load(session, id)
    }

    fn select_where(
        &self,
        session: &mut Session,
        filter: Filter,
        order_by: Option<&str>,
    ) -> Result<Vec<E>> {
        let rows = session
            .exec(Select {
                table: self.table().to_string(),
                columns: vec![self.id_column().to_string()],
                filter,
                order_by: order_by.map(str::to_string),
            })?
            .rows
            .into_values()?;

        let ids: Vec<_> = rows
            .into_iter()
            .map(|mut row| row.take(self.id_column()))
            .collect();
        self.select_all(session, &ids)
    }

    fn delete(&self, session: &mut Session, entity: &E) -> Result<()> {
        self.delete_graph(session, entity, true)
    }

    fn delete_by_id(&self, session: &mut Session, entity: &E) -> Result<()> {
        self.delete_graph(session, entity, false)
    }

    fn id_of(&self, entity: &E) -> Value {
        self.identifier.id_of(entity)
    }

    fn is_persisted(&self, entity: &E) -> bool {
        self.identifier.is_persisted(entity)
    }
}

impl<E> fmt::Debug for EntityPersister<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityPersister")
            .field("entity", &self.entity)
            .field("identifier", &self.identifier)
            .field("variants", &self.variants)
            .field("version", &self.version)
            .finish()
    }
}
