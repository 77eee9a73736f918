use super::ColumnBinding;
use crate::config::VersionSequence;
use crate::member::Lens;

use std::fmt;
use std::sync::Arc;

/// The optimistic-locking column of an entity and how its next value is
/// computed.
pub struct VersionStrategy<E> {
    /// Table holding the version column.
    pub(crate) table: String,
    pub(crate) binding: ColumnBinding<E>,
    pub(crate) sequence: Arc<dyn VersionSequence>,
}

impl<E: 'static> VersionStrategy<E> {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        self.binding.column()
    }

    pub(crate) fn lift<P: 'static>(&self, lens: &Lens<P, E>) -> VersionStrategy<P> {
        VersionStrategy {
            table: self.table.clone(),
            binding: self.binding.lift(lens),
            sequence: self.sequence.clone(),
        }
    }
}

impl<E> Clone for VersionStrategy<E> {
    fn clone(&self) -> Self {
        VersionStrategy {
            table: self.table.clone(),
            binding: self.binding.clone(),
            sequence: self.sequence.clone(),
        }
    }
}

impl<E> fmt::Debug for VersionStrategy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionStrategy")
            .field("table", &self.table)
            .field("binding", &self.binding)
            .field("sequence", &self.sequence)
            .finish()
    }
}
