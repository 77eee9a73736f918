mod capability;
pub use capability::{Capability, StorageTypes};

mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::schema::db::Schema;

use std::fmt::Debug;

/// A connection to a database.
///
/// Statement execution, parameter binding, and dialect handling live behind
/// this trait. Every call is blocking; a connection is used by one thread of
/// execution at a time.
pub trait Connection: Debug + Send {
    /// Describes the database's capability, which informs column allocation.
    fn capability(&self) -> &'static Capability;

    /// Register the schema with the connection.
    ///
    /// This does not deploy anything. Connections use the schema to know
    /// which tables exist and which constraints to enforce.
    fn push_schema(&mut self, schema: &Schema) -> crate::Result<()>;

    /// Execute a database operation
    fn exec(&mut self, op: Operation) -> crate::Result<Response>;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn capability(&self) -> &'static Capability {
        (**self).capability()
    }

    fn push_schema(&mut self, schema: &Schema) -> crate::Result<()> {
        (**self).push_schema(schema)
    }

    fn exec(&mut self, op: Operation) -> crate::Result<Response> {
        (**self).exec(op)
    }
}
