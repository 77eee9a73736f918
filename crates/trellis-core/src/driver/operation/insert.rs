use super::Operation;
use crate::stmt::Record;

#[derive(Debug, Clone)]
pub struct Insert {
    /// Which table to insert into
    pub table: String,

    /// Column values of the new row
    pub values: Record,

    /// When set, the database generates this column's value and returns it
    /// as a one-column record.
    pub returning: Option<String>,
}

impl From<Insert> for Operation {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}
