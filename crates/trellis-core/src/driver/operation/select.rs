use super::Operation;
use crate::stmt::Filter;

#[derive(Debug, Clone)]
pub struct Select {
    /// Which table to read from
    pub table: String,

    /// Columns to return, in order
    pub columns: Vec<String>,

    /// Only return rows that match the filter
    pub filter: Filter,

    /// Sort returned rows by this column, ascending. Rows are otherwise
    /// returned in insertion order.
    pub order_by: Option<String>,
}

impl From<Select> for Operation {
    fn from(value: Select) -> Self {
        Self::Select(value)
    }
}
