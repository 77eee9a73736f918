use super::Operation;
use crate::stmt::{Filter, Record};

#[derive(Debug, Clone)]
pub struct Update {
    /// Which table to update
    pub table: String,

    /// Column assignments
    pub assignments: Record,

    /// Only update rows that match the filter
    pub filter: Filter,
}

impl From<Update> for Operation {
    fn from(value: Update) -> Self {
        Self::Update(value)
    }
}
