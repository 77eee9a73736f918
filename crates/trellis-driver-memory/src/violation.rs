use std::fmt;

/// A write rejected by a table constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    NoSuchTable(String),
    NoSuchColumn { table: String, column: String },
    NotNull { table: String, column: String },
    DuplicateKey { table: String },
    ForeignKey { constraint: String },
    Restrict { constraint: String },
    Transaction(&'static str),
}

impl std::error::Error for Violation {}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NoSuchTable(table) => write!(f, "no such table: {table}"),
            Violation::NoSuchColumn { table, column } => {
                write!(f, "table {table} has no column {column}")
            }
            Violation::NotNull { table, column } => {
                write!(f, "NOT NULL constraint failed: {table}.{column}")
            }
            Violation::DuplicateKey { table } => {
                write!(f, "UNIQUE constraint failed: primary key of {table}")
            }
            Violation::ForeignKey { constraint } => {
                write!(f, "FOREIGN KEY constraint failed: {constraint}")
            }
            Violation::Restrict { constraint } => {
                write!(f, "row is still referenced through {constraint}")
            }
            Violation::Transaction(message) => f.write_str(message),
        }
    }
}
