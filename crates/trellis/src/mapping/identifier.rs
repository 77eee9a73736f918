use super::ColumnBinding;
use crate::config::Sequence;
use crate::member::Lens;

use trellis_core::stmt::Value;

use std::fmt;
use std::sync::Arc;

type Persisted<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type MarkPersisted<E> = Arc<dyn Fn(&mut E) + Send + Sync>;

/// How the identifier of an entity is read, written, and generated.
pub struct IdentifierStrategy<E> {
    pub(crate) binding: ColumnBinding<E>,
    pub(crate) generation: Generation,
    pub(crate) is_persisted: Persisted<E>,
    pub(crate) mark_persisted: Option<MarkPersisted<E>>,
}

/// When identifier values come into existence.
#[derive(Clone)]
pub enum Generation {
    /// The caller sets the identifier before inserting.
    Assigned,

    /// The identifier is drawn from a sequence before the insert statement.
    BeforeInsert(Arc<dyn Sequence>),

    /// The database generates the identifier, read back after insert.
    AfterInsert,
}

impl<E: 'static> IdentifierStrategy<E> {
    /// A generated identifier: the entity is persisted once it has one.
    pub(crate) fn generated(binding: ColumnBinding<E>, generation: Generation) -> Self {
        let read = binding.clone();
        IdentifierStrategy {
            binding,
            generation,
            is_persisted: Arc::new(move |entity: &E| !read.read(entity).is_null()),
            mark_persisted: None,
        }
    }

    pub(crate) fn assigned(
        binding: ColumnBinding<E>,
        is_persisted: Persisted<E>,
        mark_persisted: MarkPersisted<E>,
    ) -> Self {
        IdentifierStrategy {
            binding,
            generation: Generation::Assigned,
            is_persisted,
            mark_persisted: Some(mark_persisted),
        }
    }

    pub fn binding(&self) -> &ColumnBinding<E> {
        &self.binding
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub fn id_of(&self, entity: &E) -> Value {
        self.binding.read(entity)
    }

    pub fn is_persisted(&self, entity: &E) -> bool {
        (self.is_persisted)(entity)
    }

    pub(crate) fn mark_persisted(&self, entity: &mut E) {
        if let Some(mark) = &self.mark_persisted {
            mark(entity);
        }
    }

    pub(crate) fn lift<P: 'static>(&self, lens: &Lens<P, E>) -> IdentifierStrategy<P> {
        let is_persisted = self.is_persisted.clone();
        let focus = lens.clone();

        IdentifierStrategy {
            binding: self.binding.lift(lens),
            generation: self.generation.clone(),
            is_persisted: Arc::new(move |entity: &P| is_persisted(focus.get(entity))),
            mark_persisted: self.mark_persisted.clone().map(|mark| -> MarkPersisted<P> {
                let focus = lens.clone();
                Arc::new(move |entity: &mut P| mark(focus.get_mut(entity)))
            }),
        }
    }
}

impl<E> Clone for IdentifierStrategy<E> {
    fn clone(&self) -> Self {
        IdentifierStrategy {
            binding: self.binding.clone(),
            generation: self.generation.clone(),
            is_persisted: self.is_persisted.clone(),
            mark_persisted: self.mark_persisted.clone(),
        }
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::Assigned => f.write_str("Assigned"),
            Generation::BeforeInsert(sequence) => {
                f.debug_tuple("BeforeInsert").field(sequence).finish()
            }
            Generation::AfterInsert => f.write_str("AfterInsert"),
        }
    }
}

impl<E> fmt::Debug for IdentifierStrategy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierStrategy")
            .field("binding", &self.binding)
            .field("generation", &self.generation)
            .finish()
    }
}
