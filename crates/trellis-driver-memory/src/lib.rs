//! An in-process [`Connection`] storing rows in memory.
//!
//! Once a schema is pushed, writes are checked against it: unknown tables
//! and columns, `NOT NULL` columns, primary keys, and foreign keys (which
//! restrict deletes of referenced rows). Clones share the same store, so a
//! test can hand one clone to a session and inspect rows through another.

mod store;
use store::Store;

mod violation;
pub use violation::Violation;

use trellis_core::driver::operation::Operation;
use trellis_core::driver::{Capability, Connection, Response};
use trellis_core::schema::db::Schema;
use trellis_core::stmt::Record;
use trellis_core::Result;

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct Memory {
    capability: &'static Capability,
    store: Arc<Mutex<Store>>,
}

impl Memory {
    pub fn new() -> Self {
        Memory::with_capability(&Capability::DEFAULT)
    }

    /// A store that reports `capability` to the mapping compiler.
    pub fn with_capability(capability: &'static Capability) -> Self {
        Memory {
            capability,
            store: Arc::default(),
        }
    }

    /// Every row of `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.store().rows(table)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.store().rows(table).len()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        // Operations validate before mutating; a poisoned store is consistent.
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}

impl Connection for Memory {
    fn capability(&self) -> &'static Capability {
        self.capability
    }

    fn push_schema(&mut self, schema: &Schema) -> Result<()> {
        trace!(tables = schema.len(), "push schema");
        self.store().push_schema(schema);
        Ok(())
    }

    fn exec(&mut self, op: Operation) -> Result<Response> {
        let mut store = self.store();
        match op {
            Operation::Insert(op) => store.insert(op),
            Operation::Update(op) => store.update(op),
            Operation::Delete(op) => store.delete(op),
            Operation::Select(op) => store.select(op),
            Operation::NextValue(op) => Ok(store.next_value(op)),
            Operation::Transaction(op) => store.transaction(op),
        }
    }
}
