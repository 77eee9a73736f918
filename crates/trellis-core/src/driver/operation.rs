mod delete;
pub use delete::Delete;

mod insert;
pub use insert::Insert;

mod next_value;
pub use next_value::NextValue;

mod select;
pub use select::Select;

mod transaction;
pub use transaction::Transaction;

mod update;
pub use update::Update;

use std::fmt;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Create a new record.
    Insert(Insert),

    /// Update the records matching a filter
    Update(Update),

    /// Delete the records matching a filter
    Delete(Delete),

    /// Read the records matching a filter
    Select(Select),

    /// Fetch the next value of a database sequence
    NextValue(NextValue),

    /// Execute a transaction lifecycle op
    Transaction(Transaction),
}

impl Operation {
    /// The table the operation targets, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            Operation::Insert(op) => Some(&op.table),
            Operation::Update(op) => Some(&op.table),
            Operation::Delete(op) => Some(&op.table),
            Operation::Select(op) => Some(&op.table),
            Operation::NextValue(_) | Operation::Transaction(_) => None,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Operation::Insert(_))
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Operation::Update(_))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Operation::Delete(_))
    }

    pub fn is_select(&self) -> bool {
        matches!(self, Operation::Select(_))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Insert(op) => write!(f, "INSERT INTO {} {}", op.table, op.values),
            Operation::Update(op) => write!(
                f,
                "UPDATE {} SET {} WHERE {}",
                op.table, op.assignments, op.filter
            ),
            Operation::Delete(op) => write!(f, "DELETE FROM {} WHERE {}", op.table, op.filter),
            Operation::Select(op) => write!(
                f,
                "SELECT {} FROM {} WHERE {}",
                op.columns.join(", "),
                op.table,
                op.filter
            ),
            Operation::NextValue(op) => write!(f, "NEXT VALUE FOR {}", op.sequence),
            Operation::Transaction(op) => write!(f, "{op:?}"),
        }
    }
}
