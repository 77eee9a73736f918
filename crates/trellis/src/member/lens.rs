use super::{Member, MemberDefinition, MemberPath, Property, TypeRef};

use std::fmt;
use std::sync::Arc;

type Get<E, V> = Arc<dyn Fn(&E) -> &V + Send + Sync>;
type GetMut<E, V> = Arc<dyn Fn(&mut E) -> &mut V + Send + Sync>;

/// Borrowing access to a value nested inside `E`.
///
/// Lenses address embedded values, relations, and parent parts of an entity.
pub struct Lens<E, V> {
    path: MemberPath,
    get: Get<E, V>,
    get_mut: GetMut<E, V>,
}

impl<E: 'static, V: 'static> Lens<E, V> {
    pub fn field<G, M>(name: &str, get: G, get_mut: M) -> Lens<E, V>
    where
        G: Fn(&E) -> &V + Send + Sync + 'static,
        M: Fn(&mut E) -> &mut V + Send + Sync + 'static,
    {
        let definition = MemberDefinition::new(TypeRef::of::<E>(), name, TypeRef::of::<V>());
        Lens {
            path: MemberPath::new(definition),
            get: getter(get),
            get_mut: getter_mut(get_mut),
        }
    }

    pub fn get<'a>(&self, entity: &'a E) -> &'a V {
        (self.get)(entity)
    }

    pub fn get_mut<'a>(&self, entity: &'a mut E) -> &'a mut V {
        (self.get_mut)(entity)
    }

    /// A property reading and assigning the focused value.
    pub fn property(&self) -> Property<E, V>
    where
        V: Clone,
    {
        let get = self.get.clone();
        let get_mut = self.get_mut.clone();
        Property::from_parts(
            self.path.clone(),
            move |entity: &E| get(entity).clone(),
            move |entity: &mut E, value: V| *get_mut(entity) = value,
        )
    }
}

impl<E, V> Member for Lens<E, V> {
    fn path(&self) -> &MemberPath {
        &self.path
    }
}

impl<E, V> Clone for Lens<E, V> {
    fn clone(&self) -> Self {
        Lens {
            path: self.path.clone(),
            get: self.get.clone(),
            get_mut: self.get_mut.clone(),
        }
    }
}

impl<E, V> fmt::Debug for Lens<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lens").field(&self.path).finish()
    }
}

fn getter<E, V, F>(f: F) -> Get<E, V>
where
    F: Fn(&E) -> &V + Send + Sync + 'static,
{
    Arc::new(f)
}

fn getter_mut<E, V, F>(f: F) -> GetMut<E, V>
where
    F: Fn(&mut E) -> &mut V + Send + Sync + 'static,
{
    Arc::new(f)
}

type PartialGet<E, V> = Arc<dyn Fn(&E) -> Option<&V> + Send + Sync>;
type PartialGetMut<E, V> = Arc<dyn Fn(&mut E) -> Option<&mut V> + Send + Sync>;

/// A lens that may not focus anything, such as a downcast from a polymorphic
/// root to one of its subtypes.
pub(crate) struct PartialLens<E, V> {
    get: PartialGet<E, V>,
    get_mut: PartialGetMut<E, V>,
}

impl<E: 'static, V: 'static> PartialLens<E, V> {
    pub(crate) fn new<G, M>(get: G, get_mut: M) -> PartialLens<E, V>
    where
        G: Fn(&E) -> Option<&V> + Send + Sync + 'static,
        M: Fn(&mut E) -> Option<&mut V> + Send + Sync + 'static,
    {
        PartialLens {
            get: Arc::new(get),
            get_mut: Arc::new(get_mut),
        }
    }

    pub(crate) fn get<'a>(&self, entity: &'a E) -> Option<&'a V> {
        (self.get)(entity)
    }

    pub(crate) fn get_mut<'a>(&self, entity: &'a mut E) -> Option<&'a mut V> {
        (self.get_mut)(entity)
    }
}

impl<E, V> Clone for PartialLens<E, V> {
    fn clone(&self) -> Self {
        PartialLens {
            get: self.get.clone(),
            get_mut: self.get_mut.clone(),
        }
    }
}
