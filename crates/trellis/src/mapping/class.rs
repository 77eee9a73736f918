use super::ColumnBinding;
use crate::member::{Lens, MemberPath};
use crate::Result;

use trellis_core::stmt::{Record, Value};

use std::fmt;

/// The mapping of an entity onto one table.
///
/// An entity spread over joined tables has one strategy per table, all
/// sharing the identifier value.
pub struct ClassMappingStrategy<E> {
    pub(crate) table: String,
    pub(crate) identifier: ColumnBinding<E>,
    pub(crate) bindings: Vec<ColumnBinding<E>>,
    pub(crate) discriminator: Option<Discriminator>,

    /// Table this one is joined to by primary key.
    pub(crate) parent: Option<String>,
}

/// A stored value telling single-table subtypes apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminator {
    pub column: String,
    pub value: Value,
}

impl<E: 'static> ClassMappingStrategy<E> {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_column(&self) -> &str {
        self.identifier.column()
    }

    pub fn bindings(&self) -> &[ColumnBinding<E>] {
        &self.bindings
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn id_of(&self, entity: &E) -> Value {
        self.identifier.read(entity)
    }

    pub fn column_for(&self, member: &MemberPath) -> Option<&str> {
        if self.identifier.member() == Some(member) {
            return Some(self.identifier.column());
        }

        self.bindings
            .iter()
            .find(|binding| binding.member() == Some(member))
            .map(ColumnBinding::column)
    }

    /// Every column value of the row `entity` maps to, identifier and
    /// discriminator included.
    pub fn insert_values(&self, entity: &E) -> Record {
        let mut record = Record::new();
        record.insert(self.identifier.column(), self.identifier.read(entity));
        for binding in &self.bindings {
            record.insert(binding.column(), binding.read(entity));
        }
        if let Some(discriminator) = &self.discriminator {
            record.insert(&discriminator.column, discriminator.value.clone());
        }
        record
    }

    /// The updatable column values: everything but the identifier and the
    /// discriminator.
    pub fn update_values(&self, entity: &E) -> Record {
        self.bindings
            .iter()
            .map(|binding| (binding.column().to_string(), binding.read(entity)))
            .collect()
    }

    /// Assigns the values of `row` to `entity`.
    pub fn apply_row(&self, entity: &mut E, row: &Record) -> Result<()> {
        for binding in &self.bindings {
            if row.contains(binding.column()) {
                binding.write(entity, row.get(binding.column()).clone())?;
            }
        }
        Ok(())
    }

    /// Whether `row` belongs to this strategy's subtype.
    pub fn matches_row(&self, row: &Record) -> bool {
        match &self.discriminator {
            Some(discriminator) => row.get(&discriminator.column) == &discriminator.value,
            None => true,
        }
    }

    pub(crate) fn lift<P: 'static>(&self, lens: &Lens<P, E>) -> ClassMappingStrategy<P> {
        ClassMappingStrategy {
            table: self.table.clone(),
            identifier: self.identifier.lift(lens),
            bindings: self.bindings.iter().map(|binding| binding.lift(lens)).collect(),
            discriminator: self.discriminator.clone(),
            parent: self.parent.clone(),
        }
    }

    /// Columns a select of this table fetches.
    pub(crate) fn select_columns(&self) -> Vec<String> {
        let mut columns = vec![self.identifier.column().to_string()];
        columns.extend(self.bindings.iter().map(|b| b.column().to_string()));
        if let Some(discriminator) = &self.discriminator {
            columns.push(discriminator.column.clone());
        }
        columns
    }
}

impl<E> Clone for ClassMappingStrategy<E> {
    fn clone(&self) -> Self {
        ClassMappingStrategy {
            table: self.table.clone(),
            identifier: self.identifier.clone(),
            bindings: self.bindings.clone(),
            discriminator: self.discriminator.clone(),
            parent: self.parent.clone(),
        }
    }
}

impl<E> fmt::Debug for ClassMappingStrategy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMappingStrategy")
            .field("table", &self.table)
            .field("identifier", &self.identifier)
            .field("bindings", &self.bindings)
            .field("discriminator", &self.discriminator)
            .field("parent", &self.parent)
            .finish()
    }
}
