use super::EntityMapping;
use crate::member::{Member, MemberPath, Property};
use crate::primitive::Primitive;
use crate::Result;

use trellis_core::stmt::Value;

use std::sync::Arc;

/// The entity a relation points at.
pub enum RelationTarget<T> {
    /// Built along with the owner, unless already registered.
    Mapping(EntityMapping<T>),

    /// Must already be registered in the context.
    Registered,
}

impl<T> From<EntityMapping<T>> for RelationTarget<T> {
    fn from(mapping: EntityMapping<T>) -> Self {
        RelationTarget::Mapping(mapping)
    }
}

pub(crate) type BackRef<T> = Arc<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;

/// A property of the target entity holding the owner's identifier.
pub(crate) struct MappedBy<T> {
    pub(crate) member: MemberPath,
    pub(crate) write: BackRef<T>,
}

impl<T: 'static> MappedBy<T> {
    pub(crate) fn new<V: Primitive>(property: Property<T, V>) -> Self {
        MappedBy {
            member: property.path().clone(),
            write: Arc::new(move |target: &mut T, value: Value| {
                let value = value.cast(V::TYPE)?;
                property.set(target, V::load(value)?);
                Ok(())
            }),
        }
    }
}
