use super::{Column, ForeignKey};
use crate::Result;

use std::fmt;

/// A database table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Name of the table
    pub name: String,

    /// The table's columns, in allocation order
    pub columns: Vec<Column>,

    /// Foreign keys declared on this table
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Table {
        Table {
            name: name.into(),
            columns: vec![],
            foreign_keys: vec![],
        }
    }

    /// Appends a column. A column name may only be allocated once per table.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.column(&column.name).is_some() {
            return Err(crate::Error::invalid_mapping(format!(
                "mapping already defined for column {} in table {}",
                column.name, self.name
            )));
        }

        self.columns.push(column);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|column| column.name == name)
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(|column| column.primary_key)
    }

    pub fn add_foreign_key(&mut self, foreign_key: ForeignKey) {
        debug_assert_eq!(foreign_key.table, self.name);
        self.foreign_keys.push(foreign_key);
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&column.name)?;
            if column.primary_key {
                f.write_str(" PK")?;
            }
        }
        f.write_str(")")
    }
}
