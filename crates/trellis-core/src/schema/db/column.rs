use super::Type;
use crate::stmt;

/// A table column.
///
/// Columns are owned by exactly one [`Table`](super::Table) and their name is
/// unique within it.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// The name of the column in the database.
    pub name: String,

    /// The column type, from Trellis' point of view.
    pub ty: stmt::Type,

    /// The database storage type of the column.
    pub storage_ty: Type,

    /// Whether or not the column is nullable
    pub nullable: bool,

    /// True if the column is part of the table's primary key
    pub primary_key: bool,

    /// True if the database generates the column's value on insert.
    pub auto_increment: bool,
}

impl Column {
    /// Creates a nullable, non-key column whose storage type is the default
    /// mapping of `ty`.
    pub fn new(name: impl Into<String>, ty: stmt::Type) -> Column {
        Column {
            name: name.into(),
            ty,
            storage_ty: Type::default_for(ty),
            nullable: true,
            primary_key: false,
            auto_increment: false,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Column {
        self.nullable = nullable;
        self
    }

    /// Marks the column as part of the primary key. Key columns are never
    /// nullable.
    pub fn primary_key(mut self) -> Column {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Column {
        self.auto_increment = true;
        self
    }

    pub fn storage_ty(mut self, storage_ty: Type) -> Column {
        self.storage_ty = storage_ty;
        self
    }
}
