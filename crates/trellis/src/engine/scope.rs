use crate::context::{Naming, PersistenceContext};
use crate::member::TypeRef;
use crate::persister::EntityPersister;
use crate::{Entity, Result};

use trellis_core::schema::db;
use trellis_core::Error;

use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Scratch space of one build. Dropping it discards everything it holds.
pub(crate) struct BuildScope<'cx> {
    cx: &'cx PersistenceContext,

    /// The context's schema plus every table allocated so far.
    pub(crate) schema: db::Schema,

    persisters: IndexMap<TypeId, Registration>,
}

/// A persister registered under its entity type.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) entity: TypeRef,
    pub(crate) persister: Arc<dyn Any + Send + Sync>,
}

impl<'cx> BuildScope<'cx> {
    pub(crate) fn new(cx: &'cx PersistenceContext) -> Self {
        BuildScope {
            cx,
            schema: cx.schema().clone(),
            persisters: IndexMap::new(),
        }
    }

    pub(crate) fn cx(&self) -> &'cx PersistenceContext {
        self.cx
    }

    pub(crate) fn naming(&self) -> &'cx Naming {
        self.cx.naming()
    }

    /// The persister of `E`, built in this scope or registered before.
    pub(crate) fn persister<E: Entity>(&self) -> Option<Arc<EntityPersister<E>>> {
        let registration = self
            .persisters
            .get(&TypeId::of::<E>())
            .or_else(|| self.cx.registration(TypeId::of::<E>()))?;

        registration.persister.clone().downcast().ok()
    }

    pub(crate) fn register<E: Entity>(&mut self, persister: Arc<EntityPersister<E>>) -> Result<()> {
        let entity = TypeRef::of::<E>();
        if self.persister::<E>().is_some() {
            return Err(Error::invalid_mapping(format!(
                "{} is already mapped",
                entity.simple_name()
            )));
        }

        self.persisters.insert(
            entity.id(),
            Registration {
                entity,
                persister,
            },
        );
        Ok(())
    }

    /// The name of the table of `entity`: the explicit name, or the one the
    /// table naming strategy derives, behind the context's prefix.
    pub(crate) fn table_name(&self, explicit: Option<&str>, entity: TypeRef) -> String {
        let name = match explicit {
            Some(name) => name.to_string(),
            None => self.naming().table.table_name(entity.name()),
        };

        match self.cx.table_name_prefix() {
            Some(prefix) => format!("{prefix}{name}"),
            None => name,
        }
    }

    /// A column whose storage type follows the database capability.
    pub(crate) fn column(
        &self,
        name: impl Into<String>,
        ty: trellis_core::stmt::Type,
    ) -> Result<db::Column> {
        let storage_ty = db::Type::from_app(ty, None, &self.cx.capability().storage_types)?;
        Ok(db::Column::new(name, ty).storage_ty(storage_ty))
    }

    pub(crate) fn into_parts(self) -> (db::Schema, IndexMap<TypeId, Registration>) {
        (self.schema, self.persisters)
    }
}
