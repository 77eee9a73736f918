use crate::session::Session;
use crate::Result;

use trellis_core::stmt::Record;

/// Hooks around the persistence operations of `E`.
///
/// Relations are implemented as listeners; applications may register their
/// own. Errors abort the operation.
#[allow(unused_variables)]
pub trait PersistListener<E>: Send + Sync {
    fn before_insert(&self, session: &mut Session, entity: &mut E) -> Result<()> {
        Ok(())
    }

    fn after_insert(&self, session: &mut Session, entity: &mut E) -> Result<()> {
        Ok(())
    }

    fn before_update(&self, session: &mut Session, modified: &mut E, original: &E) -> Result<()> {
        Ok(())
    }

    fn after_update(&self, session: &mut Session, modified: &mut E, original: &E) -> Result<()> {
        Ok(())
    }

    fn before_delete(&self, session: &mut Session, entity: &E) -> Result<()> {
        Ok(())
    }

    fn after_delete(&self, session: &mut Session, entity: &E) -> Result<()> {
        Ok(())
    }

    /// Called with the merged rows `entity` was loaded from.
    fn after_select(&self, session: &mut Session, entity: &mut E, row: &Record) -> Result<()> {
        Ok(())
    }
}
