//! Element tracking for collection relations.
//!
//! Collections are compared by identifier: an element of the current
//! collection whose identifier appears in the snapshot is *held*; any other
//! element is *added*; snapshot elements no longer present are *removed*.
//! Positions are the element's index in the collection, starting at zero.

use trellis_core::stmt::Value;
use trellis_core::Result;

use std::collections::HashMap;

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CollectionDiff {
    /// Positions in the current collection.
    pub(crate) added: Vec<usize>,

    /// `(current, snapshot)` positions.
    pub(crate) held: Vec<(usize, usize)>,

    /// Positions in the snapshot.
    pub(crate) removed: Vec<usize>,
}

impl CollectionDiff {
    /// Held elements whose position changed.
    pub(crate) fn moved(&self) -> impl Iterator<Item = usize> + '_ {
        self.held
            .iter()
            .filter(|(current, snapshot)| current != snapshot)
            .map(|(current, _)| *current)
    }
}

/// Compares two states of a collection. `identify` yields the identifier of
/// persisted elements and `None` for new ones.
pub(crate) fn diff<T>(
    current: &[T],
    snapshot: &[T],
    identify: impl Fn(&T) -> Option<Value>,
) -> CollectionDiff {
    let mut positions: HashMap<Value, usize> = snapshot
        .iter()
        .enumerate()
        .filter_map(|(position, element)| identify(element).map(|id| (id, position)))
        .collect();

    let mut diff = CollectionDiff::default();
    for (position, element) in current.iter().enumerate() {
        match identify(element).and_then(|id| positions.remove(&id)) {
            Some(previous) => diff.held.push((position, previous)),
            None => diff.added.push(position),
        }
    }

    diff.removed = positions.into_values().collect();
    diff.removed.sort_unstable();
    diff
}

/// The stored value of position `position`.
pub(crate) fn index_value(position: usize) -> Result<Value> {
    i32::try_from(position)
        .map(Value::I32)
        .map_err(|_| trellis_core::err!("position {position} does not fit an index column"))
}
