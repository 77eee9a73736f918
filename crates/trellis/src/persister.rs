//! Runtime CRUD over compiled mappings.

mod entity;
pub use entity::{EntityPersister, Variant};
pub(crate) use entity::Parts;

mod listener;
pub use listener::PersistListener;

use crate::session::Session;
use crate::Result;

use trellis_core::stmt::{Filter, Record, Value};

/// Persistence operations on entities of type `E`.
pub trait Persister<E> {
    /// Inserts `entity` and, through cascades, what it relates to.
    ///
    /// Generated identifiers and initial versions are written back to
    /// `entity`.
    fn insert(&self, session: &mut Session, entity: &mut E) -> Result<()>;

    /// Inserts every entity, each under the session's retry policy.
    fn insert_all(&self, session: &mut Session, entities: &mut [E]) -> Result<()> {
        for entity in entities {
            session.retrying(|session| self.insert(session, entity))?;
        }
        Ok(())
    }

    /// Inserts `entity` with additional column values for its own table.
    fn insert_with(&self, session: &mut Session, entity: &mut E, extra: &Record) -> Result<()>;

    /// Writes the changes between `original` and `modified`. With
    /// `all_columns`, every column is written.
    fn update(
        &self,
        session: &mut Session,
        modified: &mut E,
        original: &E,
        all_columns: bool,
    ) -> Result<()>;

    /// Writes every column of `entity`. Cascades see `entity` as its own
    /// snapshot: new related instances are inserted, nothing is unlinked.
    fn update_by_id(&self, session: &mut Session, entity: &mut E) -> Result<()>;

    fn select(&self, session: &mut Session, id: Value) -> Result<Option<E>>;

    /// Selects every entity in `ids` that exists, in order.
    fn select_all(&self, session: &mut Session, ids: &[Value]) -> Result<Vec<E>> {
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.select(session, id.clone())? {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    /// Selects the entities whose own-table row matches `filter`.
    fn select_where(
        &self,
        session: &mut Session,
        filter: Filter,
        order_by: Option<&str>,
    ) -> Result<Vec<E>>;

    fn delete(&self, session: &mut Session, entity: &E) -> Result<()>;

    /// Deletes `entity` and its owned sub-graph by identifier alone, ignoring
    /// the version. A missing row is a record-not-found error.
    fn delete_by_id(&self, session: &mut Session, entity: &E) -> Result<()>;

    fn id_of(&self, entity: &E) -> Value;

    fn is_persisted(&self, entity: &E) -> bool;
}
