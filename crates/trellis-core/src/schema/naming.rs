//! Pluggable naming strategies used when tables, columns, and constraints are
//! allocated.
//!
//! Every strategy is a small trait with a default implementation matching the
//! conventional layout. Column and table strategies are also implemented for
//! plain closures.

use super::Name;

/// Names the table of an entity type.
pub trait TableNaming: Send + Sync {
    /// `type_name` is the full Rust type name, as returned by
    /// [`std::any::type_name`].
    fn table_name(&self, type_name: &str) -> String;
}

/// Names the column of a mapped property.
pub trait ColumnNaming: Send + Sync {
    fn column_name(&self, member: &str) -> String;
}

/// Names the foreign-key column an owner table carries for a relation.
pub trait JoinColumnNaming: Send + Sync {
    fn join_column_name(&self, member: &str, target_column: &str) -> String;
}

/// Names foreign-key constraints.
pub trait ForeignKeyNaming: Send + Sync {
    fn foreign_key_name(
        &self,
        table: &str,
        column: &str,
        target_table: &str,
        target_column: &str,
    ) -> String;
}

/// Names association tables and their columns.
pub trait AssociationTableNaming: Send + Sync {
    fn table_name(&self, owner_table: &str, member: &str) -> String;

    /// Column referencing the owner's identifier.
    fn owner_column(&self, owner_table: &str, owner_id_column: &str) -> String;

    /// Column referencing the target's identifier.
    fn target_column(&self, member: &str, target_id_column: &str) -> String;
}

/// Names the index column of ordered collections.
pub trait IndexColumnNaming: Send + Sync {
    fn index_column_name(&self, member: &str) -> String;
}

/// Simple type name: `app::model::Country` maps to `Country`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTableNaming;

impl TableNaming for DefaultTableNaming {
    fn table_name(&self, type_name: &str) -> String {
        Name::from_type_name(type_name).upper_camel_case()
    }
}

/// Snake-cased simple type name: `app::model::PersonAddress` maps to
/// `person_address`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnakeCaseTableNaming;

impl TableNaming for SnakeCaseTableNaming {
    fn table_name(&self, type_name: &str) -> String {
        Name::from_type_name(type_name).snake_case()
    }
}

/// The member name, unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultColumnNaming;

impl ColumnNaming for DefaultColumnNaming {
    fn column_name(&self, member: &str) -> String {
        member.to_string()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SnakeCaseColumnNaming;

impl ColumnNaming for SnakeCaseColumnNaming {
    fn column_name(&self, member: &str) -> String {
        Name::new(member).snake_case()
    }
}

/// `<member>Id`, whatever the target column is called.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultJoinColumnNaming;

impl JoinColumnNaming for DefaultJoinColumnNaming {
    fn join_column_name(&self, member: &str, _target_column: &str) -> String {
        format!("{member}Id")
    }
}

/// `FK_<table>_<column>_<targetTable>_<targetColumn>`
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultForeignKeyNaming;

impl ForeignKeyNaming for DefaultForeignKeyNaming {
    fn foreign_key_name(
        &self,
        table: &str,
        column: &str,
        target_table: &str,
        target_column: &str,
    ) -> String {
        format!("FK_{table}_{column}_{target_table}_{target_column}")
    }
}

/// `<ownerTable>_<member>` with `<ownerTable>_<id>` and `<member>_<id>`
/// columns.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAssociationTableNaming;

impl AssociationTableNaming for DefaultAssociationTableNaming {
    fn table_name(&self, owner_table: &str, member: &str) -> String {
        format!("{owner_table}_{member}")
    }

    fn owner_column(&self, owner_table: &str, owner_id_column: &str) -> String {
        format!("{owner_table}_{owner_id_column}")
    }

    fn target_column(&self, member: &str, target_id_column: &str) -> String {
        format!("{member}_{target_id_column}")
    }
}

/// Always `idx`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultIndexColumnNaming;

impl IndexColumnNaming for DefaultIndexColumnNaming {
    fn index_column_name(&self, _member: &str) -> String {
        "idx".to_string()
    }
}

impl<F> TableNaming for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn table_name(&self, type_name: &str) -> String {
        self(type_name)
    }
}

impl<F> ColumnNaming for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn column_name(&self, member: &str) -> String {
        self(member)
    }
}
