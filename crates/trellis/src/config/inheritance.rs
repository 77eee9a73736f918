use super::EntityMapping;
use crate::engine::entity::{self, InheritanceSource, Parent};
use crate::engine::BuildScope;
use crate::member::{Lens, TypeRef};
use crate::{Entity, Result};

use trellis_core::Error;

/// Inheritance of a parent entity's mappings.
///
/// The child holds its parent part as a value reached through `lens`. By
/// default parent and child columns share the child's table; with
/// [`with_joined_table`](Inheritance::with_joined_table) the parent keeps its
/// own tables and the child's table references them by primary key.
pub struct Inheritance<E, P> {
    lens: Lens<E, P>,
    parent: EntityMapping<P>,
    joined: bool,
}

impl<E: Entity, P: Entity> Inheritance<E, P> {
    pub fn new(lens: Lens<E, P>, parent: EntityMapping<P>) -> Self {
        Inheritance {
            lens,
            parent,
            joined: false,
        }
    }

    pub fn with_joined_table(mut self) -> Self {
        self.joined = true;
        self
    }
}

impl<E: Entity, P: Entity> InheritanceSource<E> for Inheritance<E, P> {
    fn compile(self: Box<Self>, scope: &mut BuildScope<'_>) -> Result<Parent<E>> {
        let Inheritance {
            lens,
            parent,
            joined,
        } = *self;

        let (level, extras) = entity::split(parent);
        if !extras.is_empty() {
            return Err(Error::unsupported_feature(format!(
                "relations and polymorphism of {} cannot be inherited",
                TypeRef::of::<P>().simple_name()
            )));
        }

        let hierarchy = entity::compile_hierarchy(level, scope)?;
        Ok(Parent {
            hierarchy: hierarchy.lift(&lens),
            joined,
        })
    }
}
