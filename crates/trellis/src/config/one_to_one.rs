use super::{CascadeType, CascadeTypes, MappedBy, RelationTarget};
use crate::member::{Lens, Property};
use crate::primitive::Primitive;
use crate::Entity;

/// A relation from an owner `E` to at most one `T`.
///
/// By default the owner's table carries the foreign key. With
/// [`mapped_by`](OneToOne::mapped_by) or
/// [`reverse_column`](OneToOne::reverse_column), the target's table carries
/// it instead.
pub struct OneToOne<E, T> {
    pub(crate) lens: Lens<E, Option<T>>,
    pub(crate) target: RelationTarget<T>,
    pub(crate) cascade: CascadeTypes,
    pub(crate) mandatory: bool,
    pub(crate) mapped_by: Option<MappedBy<T>>,
    pub(crate) reverse_column: Option<String>,
    pub(crate) join_column: Option<String>,
}

impl<E: Entity, T: Entity> OneToOne<E, T> {
    pub fn new(lens: Lens<E, Option<T>>, target: impl Into<RelationTarget<T>>) -> Self {
        OneToOne {
            lens,
            target: target.into(),
            cascade: CascadeTypes::ALL,
            mandatory: false,
            mapped_by: None,
            reverse_column: None,
            join_column: None,
        }
    }

    /// Restricts the operations propagated to the target.
    pub fn cascading(mut self, types: &[CascadeType]) -> Self {
        self.cascade = types.iter().collect();
        self
    }

    /// Rejects owners without a target.
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Stores the relation in the target's table, in the column `property`
    /// is mapped to. The property is set to the owner's identifier.
    pub fn mapped_by<V: Primitive>(mut self, property: Property<T, V>) -> Self {
        self.mapped_by = Some(MappedBy::new(property));
        self
    }

    /// Stores the relation in `column` of the target's table.
    pub fn reverse_column(mut self, column: impl Into<String>) -> Self {
        self.reverse_column = Some(column.into());
        self
    }

    /// Names the owner-side foreign key column.
    pub fn join_column(mut self, column: impl Into<String>) -> Self {
        self.join_column = Some(column.into());
        self
    }
}
