//! Connection-bound units of work.

mod retry;
pub use retry::{FixedInterval, NoRetry, RetryPolicy};

use crate::Result;

use trellis_core::driver::operation::{Operation, Transaction};
use trellis_core::driver::{Capability, Connection, Response};

use std::any::{Any, TypeId};
use std::fmt;
use tracing::{debug, trace, warn};

/// A connection plus the state of its current transaction.
///
/// Every persistence operation runs against a session. Versions bumped
/// inside a transaction are journaled, so a rollback can hand the previous
/// values back to the in-memory entities.
pub struct Session {
    connection: Box<dyn Connection>,
    in_transaction: bool,
    journal: Vec<Revert>,
    retry: Box<dyn RetryPolicy>,
}

struct Revert {
    entity: TypeId,
    apply: Box<dyn Fn(&mut dyn Any) -> bool + Send + Sync>,
}

impl Session {
    pub fn new(connection: impl Connection + 'static) -> Self {
        Session {
            connection: Box::new(connection),
            in_transaction: false,
            journal: vec![],
            retry: Box::new(NoRetry),
        }
    }

    /// Sets the policy [`Persister::insert_all`](crate::Persister::insert_all)
    /// retries failed inserts with.
    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry = Box::new(policy);
        self
    }

    pub fn capability(&self) -> &'static Capability {
        self.connection.capability()
    }

    pub fn connection(&mut self) -> &mut dyn Connection {
        &mut *self.connection
    }

    pub fn exec(&mut self, op: impl Into<Operation>) -> Result<Response> {
        let op = op.into();
        trace!(%op, "exec");
        self.connection.exec(op)
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.in_transaction {
            trellis_core::bail!("a transaction is already active");
        }

        self.exec(Transaction::Start)?;
        self.in_transaction = true;
        debug!("transaction started");
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            trellis_core::bail!("no transaction to commit");
        }

        self.exec(Transaction::Commit)?;
        self.in_transaction = false;
        self.journal.clear();
        debug!("transaction committed");
        Ok(())
    }

    /// Rolls the transaction back. The returned value restores the versions
    /// of entities updated during the transaction.
    pub fn rollback(&mut self) -> Result<RolledBack> {
        if !self.in_transaction {
            trellis_core::bail!("no transaction to roll back");
        }

        self.exec(Transaction::Rollback)?;
        self.in_transaction = false;
        let journal = std::mem::take(&mut self.journal);
        debug!(journaled = journal.len(), "transaction rolled back");
        Ok(RolledBack { journal })
    }

    /// Journals an in-memory change of an `E` to undo on rollback. Outside
    /// a transaction there is nothing to undo.
    pub(crate) fn journal<E: 'static>(
        &mut self,
        revert: impl Fn(&mut E) -> bool + Send + Sync + 'static,
    ) {
        if !self.in_transaction {
            return;
        }

        self.journal.push(Revert {
            entity: TypeId::of::<E>(),
            apply: Box::new(move |entity: &mut dyn Any| {
                entity.downcast_mut::<E>().is_some_and(|entity| revert(entity))
            }),
        });
    }

    /// Runs `op` under the session's retry policy.
    pub(crate) fn retrying<T>(&mut self, mut op: impl FnMut(&mut Session) -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            match op(self) {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(attempts = attempt + 1, "operation succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    let delay = self.retry.delay(attempt);
                    warn!(attempt = attempt + 1, %err, ?delay, "operation failed; retrying");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.connection)
            .field("in_transaction", &self.in_transaction)
            .field("journaled", &self.journal.len())
            .finish()
    }
}

/// The in-memory changes a rolled back transaction left behind.
pub struct RolledBack {
    journal: Vec<Revert>,
}

impl RolledBack {
    /// Reverts the journaled changes of `entity`, most recent first. Returns
    /// whether anything was restored.
    pub fn restore<E: 'static>(&self, entity: &mut E) -> bool {
        let mut restored = false;
        for revert in self.journal.iter().rev() {
            if revert.entity == TypeId::of::<E>() && (revert.apply)(entity) {
                restored = true;
            }
        }
        restored
    }

    pub fn len(&self) -> usize {
        self.journal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }
}

impl fmt::Debug for RolledBack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RolledBack")
            .field("journaled", &self.journal.len())
            .finish()
    }
}
