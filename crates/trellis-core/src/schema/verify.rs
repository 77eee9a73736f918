use super::db::{Schema, Table};
use crate::{Error, Result};

use std::collections::HashSet;

struct Verify<'a> {
    schema: &'a Schema,
}

impl Schema {
    /// Checks the structural invariants of a compiled schema: unique column
    /// names, a primary key on every table, and foreign keys whose columns
    /// exist on both sides and pair up one to one.
    pub fn verify(&self) -> Result<()> {
        Verify { schema: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        for table in self.schema.tables() {
            self.verify_column_names_are_unique(table)?;
            self.verify_table_has_primary_key(table)?;
            self.verify_foreign_keys(table)?;
        }
        Ok(())
    }

    fn verify_column_names_are_unique(&self, table: &Table) -> Result<()> {
        let mut names = HashSet::new();

        for column in &table.columns {
            if !names.insert(&column.name) {
                return Err(Error::invalid_mapping(format!(
                    "mapping already defined for column {} in table {}",
                    column.name, table.name
                )));
            }
        }
        Ok(())
    }

    fn verify_table_has_primary_key(&self, table: &Table) -> Result<()> {
        if table.primary_key_columns().next().is_none() {
            return Err(Error::invalid_mapping(format!(
                "table {} has no primary key",
                table.name
            )));
        }

        for column in table.primary_key_columns() {
            assert!(!column.nullable, "primary key column {} is nullable", column.name);
        }
        Ok(())
    }

    fn verify_foreign_keys(&self, table: &Table) -> Result<()> {
        for foreign_key in &table.foreign_keys {
            if foreign_key.columns.len() != foreign_key.target_columns.len() {
                return Err(Error::invalid_mapping(format!(
                    "foreign key {} relates {} column(s) to {}",
                    foreign_key.name,
                    foreign_key.columns.len(),
                    foreign_key.target_columns.len()
                )));
            }

            let Some(target) = self.schema.table(&foreign_key.target_table) else {
                return Err(Error::invalid_mapping(format!(
                    "foreign key {} references unknown table {}",
                    foreign_key.name, foreign_key.target_table
                )));
            };

            for (source, target_column) in foreign_key.pairs() {
                if table.column(source).is_none() || target.column(target_column).is_none() {
                    return Err(Error::invalid_mapping(format!(
                        "foreign key {} references unknown column",
                        foreign_key.name
                    )));
                }
            }
        }
        Ok(())
    }
}
