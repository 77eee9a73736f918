use crate::session::Session;
use crate::Result;

use trellis_core::driver::operation::NextValue;
use trellis_core::stmt::Value;
use trellis_core::Error;

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

type Persisted<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type MarkPersisted<E> = Arc<dyn Fn(&mut E) + Send + Sync>;

/// How identifier values of an entity come into existence.
pub enum IdentifierPolicy<E> {
    /// The caller assigns identifiers. Since an assigned identifier says
    /// nothing about whether the row exists, the entity tracks it.
    AlreadyAssigned {
        is_persisted: Persisted<E>,
        mark_persisted: MarkPersisted<E>,
    },

    /// Identifiers are drawn from a sequence right before the insert.
    BeforeInsert(Arc<dyn Sequence>),

    /// The database generates identifiers; they are read back after insert.
    AfterInsert,
}

impl<E> IdentifierPolicy<E> {
    pub fn already_assigned<P, M>(is_persisted: P, mark_persisted: M) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
        M: Fn(&mut E) + Send + Sync + 'static,
    {
        IdentifierPolicy::AlreadyAssigned {
            is_persisted: Arc::new(is_persisted),
            mark_persisted: Arc::new(mark_persisted),
        }
    }

    pub fn before_insert(sequence: impl Sequence + 'static) -> Self {
        IdentifierPolicy::BeforeInsert(Arc::new(sequence))
    }

    pub fn after_insert() -> Self {
        IdentifierPolicy::AfterInsert
    }
}

impl<E> fmt::Debug for IdentifierPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierPolicy::AlreadyAssigned { .. } => f.write_str("AlreadyAssigned"),
            IdentifierPolicy::BeforeInsert(sequence) => {
                f.debug_tuple("BeforeInsert").field(sequence).finish()
            }
            IdentifierPolicy::AfterInsert => f.write_str("AfterInsert"),
        }
    }
}

/// Produces identifier values ahead of inserts.
pub trait Sequence: fmt::Debug + Send + Sync {
    fn next(&self, session: &mut Session) -> Result<Value>;
}

/// A named sequence of the database.
#[derive(Debug, Clone)]
pub struct DatabaseSequence {
    name: String,
}

impl DatabaseSequence {
    pub fn new(name: impl Into<String>) -> Self {
        DatabaseSequence { name: name.into() }
    }
}

impl Sequence for DatabaseSequence {
    fn next(&self, session: &mut Session) -> Result<Value> {
        let rows = session
            .exec(NextValue {
                sequence: self.name.clone(),
            })?
            .rows
            .into_values()?;

        rows.into_iter()
            .next()
            .and_then(|record| record.into_iter().next())
            .map(|(_, value)| value)
            .ok_or_else(|| {
                Error::invalid_result(format!("sequence {} returned no value", self.name))
            })
    }
}

/// An in-process counter.
#[derive(Debug)]
pub struct IncrementSequence {
    next: AtomicI64,
}

impl IncrementSequence {
    pub fn new(start: i64) -> Self {
        IncrementSequence {
            next: AtomicI64::new(start),
        }
    }
}

impl Default for IncrementSequence {
    fn default() -> Self {
        IncrementSequence::new(1)
    }
}

impl Sequence for IncrementSequence {
    fn next(&self, _session: &mut Session) -> Result<Value> {
        Ok(Value::I64(self.next.fetch_add(1, Ordering::Relaxed)))
    }
}
