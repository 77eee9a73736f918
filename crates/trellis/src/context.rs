//! The registry of compiled mappings and the schema they produced.

mod builder;
pub use builder::Builder;

use crate::engine::{BuildScope, Registration};
use crate::member::TypeRef;
use crate::persister::EntityPersister;
use crate::session::Session;
use crate::{Entity, Result};

use trellis_core::driver::Capability;
use trellis_core::schema::db;
use trellis_core::schema::naming::{
    AssociationTableNaming, ColumnNaming, ForeignKeyNaming, IndexColumnNaming, JoinColumnNaming,
    TableNaming,
};

use indexmap::IndexMap;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Holds every persister built so far and the database schema backing them.
///
/// Persisters are registered by [`EntityMapping::build`]; a failed build
/// leaves the context untouched.
///
/// [`EntityMapping::build`]: crate::EntityMapping::build
pub struct PersistenceContext {
    capability: &'static Capability,
    naming: Naming,
    table_name_prefix: Option<String>,
    discriminator_column: String,
    schema: db::Schema,
    persisters: IndexMap<TypeId, Registration>,
}

/// The naming strategies applied when a mapping does not override them.
#[derive(Clone)]
pub struct Naming {
    pub table: Arc<dyn TableNaming>,
    pub column: Arc<dyn ColumnNaming>,
    pub join_column: Arc<dyn JoinColumnNaming>,
    pub foreign_key: Arc<dyn ForeignKeyNaming>,
    pub association_table: Arc<dyn AssociationTableNaming>,
    pub index_column: Arc<dyn IndexColumnNaming>,
}

impl PersistenceContext {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn capability(&self) -> &'static Capability {
        self.capability
    }

    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    pub fn table_name_prefix(&self) -> Option<&str> {
        self.table_name_prefix.as_deref()
    }

    /// Default name of discriminator columns.
    pub fn discriminator_column(&self) -> &str {
        &self.discriminator_column
    }

    pub fn schema(&self) -> &db::Schema {
        &self.schema
    }

    /// The persister registered for `E`.
    pub fn persister<E: Entity>(&self) -> Option<Arc<EntityPersister<E>>> {
        self.persisters
            .get(&TypeId::of::<E>())?
            .persister
            .clone()
            .downcast()
            .ok()
    }

    pub fn is_registered<E: 'static>(&self) -> bool {
        self.persisters.contains_key(&TypeId::of::<E>())
    }

    /// Every registered entity type, in registration order.
    pub fn entities(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.persisters.values().map(|registration| registration.entity)
    }

    /// Creates the schema's tables through `session`.
    pub fn push_schema(&self, session: &mut Session) -> Result<()> {
        debug!(tables = self.schema.len(), "pushing schema");
        session.connection().push_schema(&self.schema)
    }

    pub(crate) fn registration(&self, entity: TypeId) -> Option<&Registration> {
        self.persisters.get(&entity)
    }

    /// Runs `f` against a scratch scope, committing its tables and
    /// persisters only when `f` succeeds and the resulting schema verifies.
    pub(crate) fn build<T>(&mut self, f: impl FnOnce(&mut BuildScope<'_>) -> Result<T>) -> Result<T> {
        let mut scope = BuildScope::new(self);
        let value = f(&mut scope)?;
        scope.schema.verify()?;

        let (schema, persisters) = scope.into_parts();
        self.schema = schema;
        self.persisters.extend(persisters);
        Ok(value)
    }
}

impl fmt::Debug for PersistenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceContext")
            .field("capability", &self.capability)
            .field("table_name_prefix", &self.table_name_prefix)
            .field("schema", &self.schema)
            .field("entities", &self.entities().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Debug for Naming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Naming").finish_non_exhaustive()
    }
}
