use super::ColumnBinding;
use crate::member::MemberPath;
use crate::Result;

use trellis_core::stmt::Record;

use std::fmt;

/// A compiled set of property-to-column bindings, free of identity and
/// cascade concerns.
pub struct EmbeddedStrategy<E> {
    bindings: Vec<ColumnBinding<E>>,
}

impl<E: 'static> EmbeddedStrategy<E> {
    pub(crate) fn new(bindings: Vec<ColumnBinding<E>>) -> Self {
        EmbeddedStrategy { bindings }
    }

    pub fn bindings(&self) -> &[ColumnBinding<E>] {
        &self.bindings
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.bindings.iter().map(ColumnBinding::column)
    }

    /// The column bound to `member`.
    pub fn column_for(&self, member: &MemberPath) -> Option<&str> {
        self.bindings
            .iter()
            .find(|binding| binding.member() == Some(member))
            .map(ColumnBinding::column)
    }

    /// Extracts the column values of `entity`.
    pub fn to_record(&self, entity: &E) -> Record {
        self.bindings
            .iter()
            .map(|binding| (binding.column().to_string(), binding.read(entity)))
            .collect()
    }

    /// Assigns the values of `row` to `entity`. Columns absent from the row
    /// are left untouched.
    pub fn apply(&self, entity: &mut E, row: &Record) -> Result<()> {
        for binding in &self.bindings {
            if row.contains(binding.column()) {
                binding.write(entity, row.get(binding.column()).clone())?;
            }
        }
        Ok(())
    }

    /// Builds a new value from `row`.
    pub fn transform(&self, row: &Record) -> Result<E>
    where
        E: Default,
    {
        let mut entity = E::default();
        self.apply(&mut entity, row)?;
        Ok(entity)
    }
}

impl<E> fmt::Debug for EmbeddedStrategy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.bindings).finish()
    }
}
