use super::Operation;
use crate::stmt::Filter;

#[derive(Debug, Clone)]
pub struct Delete {
    /// Which table to delete from
    pub table: String,

    /// Only delete rows that match the filter
    pub filter: Filter,
}

impl From<Delete> for Operation {
    fn from(value: Delete) -> Self {
        Self::Delete(value)
    }
}
