use super::Table;
use crate::Result;

use indexmap::IndexMap;

/// The set of tables produced by a mapping build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    tables: IndexMap<String, Table>,
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Registers a table. Table names are unique across the schema.
    pub fn add(&mut self, table: Table) -> Result<()> {
        if self.tables.contains_key(&table.name) {
            return Err(crate::Error::invalid_mapping(format!(
                "table {} is already mapped",
                table.name
            )));
        }

        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    pub fn tables(&self) -> impl ExactSizeIterator<Item = &Table> + '_ {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
