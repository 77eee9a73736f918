//! Database-level schema: tables, columns, and foreign keys.

mod column;
pub use column::Column;

mod foreign_key;
pub use foreign_key::ForeignKey;

mod schema;
pub use schema::Schema;

mod table;
pub use table::Table;

mod ty;
pub use ty::Type;
