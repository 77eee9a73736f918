use super::{CascadeType, CascadeTypes, MappedBy, RelationTarget};
use crate::member::{Lens, Property};
use crate::primitive::Primitive;
use crate::Entity;

/// Whether element order is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Set,
    List,
}

/// A relation from an owner `E` to a collection of `T`.
///
/// Without a reverse column, elements are linked through an association
/// table named after the owner's table and the member.
pub struct OneToMany<E, T> {
    pub(crate) lens: Lens<E, Vec<T>>,
    pub(crate) target: RelationTarget<T>,
    pub(crate) kind: CollectionKind,
    pub(crate) cascade: CascadeTypes,
    pub(crate) orphan_removal: bool,
    pub(crate) mapped_by: Option<MappedBy<T>>,
    pub(crate) reverse_column: Option<String>,

    /// `Some(None)` stores positions in a column named by the index naming
    /// strategy.
    pub(crate) index_column: Option<Option<String>>,
    pub(crate) association_table: Option<String>,
}

impl<E: Entity, T: Entity> OneToMany<E, T> {
    /// An unordered collection.
    pub fn set(lens: Lens<E, Vec<T>>, target: impl Into<RelationTarget<T>>) -> Self {
        OneToMany::new(lens, target.into(), CollectionKind::Set)
    }

    /// An ordered collection.
    pub fn list(lens: Lens<E, Vec<T>>, target: impl Into<RelationTarget<T>>) -> Self {
        OneToMany::new(lens, target.into(), CollectionKind::List)
    }

    fn new(lens: Lens<E, Vec<T>>, target: RelationTarget<T>, kind: CollectionKind) -> Self {
        OneToMany {
            lens,
            target,
            kind,
            cascade: CascadeTypes::ALL,
            orphan_removal: false,
            mapped_by: None,
            reverse_column: None,
            index_column: None,
            association_table: None,
        }
    }

    pub fn cascading(mut self, types: &[CascadeType]) -> Self {
        self.cascade = types.iter().collect();
        self
    }

    /// Deletes elements removed from the collection instead of unlinking
    /// them.
    pub fn orphan_removal(mut self) -> Self {
        self.orphan_removal = true;
        self
    }

    /// Stores the relation in the target's table, in the column `property`
    /// is mapped to.
    pub fn mapped_by<V: Primitive>(mut self, property: Property<T, V>) -> Self {
        self.mapped_by = Some(MappedBy::new(property));
        self
    }

    pub fn reverse_column(mut self, column: impl Into<String>) -> Self {
        self.reverse_column = Some(column.into());
        self
    }

    /// Persists element positions. Only lists can be indexed.
    pub fn indexed(mut self) -> Self {
        self.index_column = Some(None);
        self
    }

    pub fn indexed_by(mut self, column: impl Into<String>) -> Self {
        self.index_column = Some(Some(column.into()));
        self
    }

    pub fn association_table(mut self, table: impl Into<String>) -> Self {
        self.association_table = Some(table.into());
        self
    }
}
