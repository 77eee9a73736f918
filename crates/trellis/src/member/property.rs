use super::{Accessor, Member, MemberPath, Mutator};
use crate::Result;

use trellis_core::Error;

use std::fmt;

/// An accessor and a mutator for the same member.
pub struct Property<E, V> {
    accessor: Accessor<E, V>,
    mutator: Mutator<E, V>,
}

impl<E: 'static, V: 'static> Property<E, V> {
    /// Pairs an accessor with a mutator. Both must designate the same member.
    pub fn new(accessor: Accessor<E, V>, mutator: Mutator<E, V>) -> Result<Property<E, V>> {
        if accessor.definition() != mutator.definition() {
            return Err(Error::invalid_mapping(format!(
                "accessor {} and mutator {} designate different members",
                accessor.definition(),
                mutator.definition()
            )));
        }

        Ok(Property { accessor, mutator })
    }

    /// A property reading and assigning field `name`.
    pub fn field<G, S>(name: &str, get: G, set: S) -> Property<E, V>
    where
        G: Fn(&E) -> V + Send + Sync + 'static,
        S: Fn(&mut E, V) + Send + Sync + 'static,
    {
        Property {
            accessor: Accessor::field(name, get),
            mutator: Mutator::field(name, set),
        }
    }

    pub(crate) fn from_parts<G, S>(path: MemberPath, get: G, set: S) -> Property<E, V>
    where
        G: Fn(&E) -> V + Send + Sync + 'static,
        S: Fn(&mut E, V) + Send + Sync + 'static,
    {
        let name = path.terminal().name().to_string();
        let mut property = Property::field(&name, get, set);
        property.accessor = property.accessor.with_path(path.clone());
        property.mutator = property.mutator.with_path(path);
        property
    }

    /// Chains `next` after this property. Writing through the chain reads the
    /// intermediate value, updates it, and writes it back.
    pub fn through<W: 'static>(self, next: Property<V, W>) -> Property<E, W>
    where
        V: Clone,
    {
        let path = self.accessor.path().join(next.accessor.path());
        let outer_get = self.accessor.getter();
        let outer_set = self.mutator.setter();
        let inner_get = next.accessor.getter();
        let inner_set = next.mutator.setter();
        let outer_read = outer_get.clone();

        Property::from_parts(
            path,
            move |entity: &E| inner_get(&outer_read(entity)),
            move |entity: &mut E, value: W| {
                let mut intermediate = outer_get(entity);
                inner_set(&mut intermediate, value);
                outer_set(entity, intermediate);
            },
        )
    }

    pub fn get(&self, entity: &E) -> V {
        self.accessor.get(entity)
    }

    pub fn set(&self, entity: &mut E, value: V) {
        self.mutator.set(entity, value)
    }

    pub fn accessor(&self) -> &Accessor<E, V> {
        &self.accessor
    }

    pub fn mutator(&self) -> &Mutator<E, V> {
        &self.mutator
    }
}

impl<E, V> Member for Property<E, V> {
    fn path(&self) -> &MemberPath {
        self.accessor.path()
    }
}

impl<E, V> Clone for Property<E, V> {
    fn clone(&self) -> Self {
        Property {
            accessor: self.accessor.clone(),
            mutator: self.mutator.clone(),
        }
    }
}

impl<E, V> fmt::Debug for Property<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(self.path()).finish()
    }
}
