use super::{property_name, Member, MemberDefinition, MemberPath, TypeRef};

use std::fmt;
use std::sync::Arc;

type Getter<E, V> = Arc<dyn Fn(&E) -> V + Send + Sync>;
type Setter<E, V> = Arc<dyn Fn(&mut E, V) + Send + Sync>;

/// Reads a property of `E`.
pub struct Accessor<E, V> {
    path: MemberPath,
    get: Getter<E, V>,
}

impl<E: 'static, V: 'static> Accessor<E, V> {
    /// An accessor reading field `name`.
    pub fn field<F>(name: &str, get: F) -> Accessor<E, V>
    where
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        Accessor::named(name.to_string(), get)
    }

    /// An accessor calling a getter. `getName`, `isName`, `get_name` all
    /// designate property `name`.
    pub fn method<F>(method: &str, get: F) -> Accessor<E, V>
    where
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        Accessor::named(property_name(method), get)
    }

    fn named<F>(name: String, get: F) -> Accessor<E, V>
    where
        F: Fn(&E) -> V + Send + Sync + 'static,
    {
        let definition = MemberDefinition::new(TypeRef::of::<E>(), name, TypeRef::of::<V>());
        Accessor {
            path: MemberPath::new(definition),
            get: Arc::new(get),
        }
    }

    /// Chains `next` after this accessor. The chain is defined by its
    /// terminal member, declared on `V`.
    pub fn chain<W: 'static>(self, next: Accessor<V, W>) -> Accessor<E, W> {
        let outer = self.get;
        let inner = next.get;
        Accessor {
            path: self.path.join(&next.path),
            get: Arc::new(move |entity: &E| inner(&outer(entity))),
        }
    }

    pub fn get(&self, entity: &E) -> V {
        (self.get)(entity)
    }

    pub(crate) fn getter(&self) -> Getter<E, V> {
        self.get.clone()
    }

    pub(crate) fn with_path(self, path: MemberPath) -> Accessor<E, V> {
        Accessor { path, ..self }
    }
}

impl<E, V> Member for Accessor<E, V> {
    fn path(&self) -> &MemberPath {
        &self.path
    }
}

impl<E, V> Clone for Accessor<E, V> {
    fn clone(&self) -> Self {
        Accessor {
            path: self.path.clone(),
            get: self.get.clone(),
        }
    }
}

impl<E, V> fmt::Debug for Accessor<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Accessor").field(&self.path).finish()
    }
}

/// Writes a property of `E`.
pub struct Mutator<E, V> {
    path: MemberPath,
    set: Setter<E, V>,
}

impl<E: 'static, V: 'static> Mutator<E, V> {
    /// A mutator assigning field `name`.
    pub fn field<F>(name: &str, set: F) -> Mutator<E, V>
    where
        F: Fn(&mut E, V) + Send + Sync + 'static,
    {
        Mutator::named(name.to_string(), set)
    }

    /// A mutator calling a setter. `setName` and `set_name` designate
    /// property `name`.
    pub fn method<F>(method: &str, set: F) -> Mutator<E, V>
    where
        F: Fn(&mut E, V) + Send + Sync + 'static,
    {
        Mutator::named(property_name(method), set)
    }

    fn named<F>(name: String, set: F) -> Mutator<E, V>
    where
        F: Fn(&mut E, V) + Send + Sync + 'static,
    {
        let definition = MemberDefinition::new(TypeRef::of::<E>(), name, TypeRef::of::<V>());
        Mutator {
            path: MemberPath::new(definition),
            set: Arc::new(set),
        }
    }

    pub fn set(&self, entity: &mut E, value: V) {
        (self.set)(entity, value)
    }

    pub(crate) fn setter(&self) -> Setter<E, V> {
        self.set.clone()
    }

    pub(crate) fn with_path(self, path: MemberPath) -> Mutator<E, V> {
        Mutator { path, ..self }
    }
}

impl<E, V> Member for Mutator<E, V> {
    fn path(&self) -> &MemberPath {
        &self.path
    }
}

impl<E, V> Clone for Mutator<E, V> {
    fn clone(&self) -> Self {
        Mutator {
            path: self.path.clone(),
            set: self.set.clone(),
        }
    }
}

impl<E, V> fmt::Debug for Mutator<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mutator").field(&self.path).finish()
    }
}
