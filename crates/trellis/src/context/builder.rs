use super::{Naming, PersistenceContext};

use trellis_core::driver::Capability;
use trellis_core::schema::naming::{
    AssociationTableNaming, ColumnNaming, DefaultAssociationTableNaming, DefaultColumnNaming,
    DefaultForeignKeyNaming, DefaultIndexColumnNaming, DefaultJoinColumnNaming,
    DefaultTableNaming, ForeignKeyNaming, IndexColumnNaming, JoinColumnNaming, TableNaming,
};

use indexmap::IndexMap;
use std::sync::Arc;

/// Configures a [`PersistenceContext`].
pub struct Builder {
    capability: &'static Capability,
    naming: Naming,
    table_name_prefix: Option<String>,
    discriminator_column: String,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            capability: &Capability::DEFAULT,
            naming: Naming {
                table: Arc::new(DefaultTableNaming),
                column: Arc::new(DefaultColumnNaming),
                join_column: Arc::new(DefaultJoinColumnNaming),
                foreign_key: Arc::new(DefaultForeignKeyNaming),
                association_table: Arc::new(DefaultAssociationTableNaming),
                index_column: Arc::new(DefaultIndexColumnNaming),
            },
            table_name_prefix: None,
            discriminator_column: "DTYPE".to_string(),
        }
    }
}

impl Builder {
    /// The capabilities of the database the context maps to.
    pub fn capability(&mut self, capability: &'static Capability) -> &mut Self {
        self.capability = capability;
        self
    }

    /// Set the table name prefix for all tables
    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.table_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn discriminator_column(&mut self, column: &str) -> &mut Self {
        self.discriminator_column = column.to_string();
        self
    }

    pub fn table_naming(&mut self, naming: impl TableNaming + 'static) -> &mut Self {
        self.naming.table = Arc::new(naming);
        self
    }

    pub fn column_naming(&mut self, naming: impl ColumnNaming + 'static) -> &mut Self {
        self.naming.column = Arc::new(naming);
        self
    }

    pub fn join_column_naming(&mut self, naming: impl JoinColumnNaming + 'static) -> &mut Self {
        self.naming.join_column = Arc::new(naming);
        self
    }

    pub fn foreign_key_naming(&mut self, naming: impl ForeignKeyNaming + 'static) -> &mut Self {
        self.naming.foreign_key = Arc::new(naming);
        self
    }

    pub fn association_table_naming(
        &mut self,
        naming: impl AssociationTableNaming + 'static,
    ) -> &mut Self {
        self.naming.association_table = Arc::new(naming);
        self
    }

    pub fn index_column_naming(&mut self, naming: impl IndexColumnNaming + 'static) -> &mut Self {
        self.naming.index_column = Arc::new(naming);
        self
    }

    pub fn build(&self) -> PersistenceContext {
        PersistenceContext {
            capability: self.capability,
            naming: self.naming.clone(),
            table_name_prefix: self.table_name_prefix.clone(),
            discriminator_column: self.discriminator_column.clone(),
            schema: Default::default(),
            persisters: IndexMap::new(),
        }
    }
}
