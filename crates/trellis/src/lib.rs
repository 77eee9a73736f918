//! Maps Rust types onto relational tables.
//!
//! Mappings are described with the fluent builders of [`config`], compiled
//! by [`EntityMapping::build`] into an [`EntityPersister`], and executed
//! against a [`Session`].

mod cascade;

pub mod config;
pub use config::{
    CascadeType, CollectionKind, Embeddable, Embedded, EntityMapping, IdentifierPolicy,
    Inheritance, OneToMany, OneToOne, PolymorphismKind, PolymorphismPolicy, RelationTarget,
    SubEntity,
};

mod context;
pub use context::{Builder, Naming, PersistenceContext};

pub mod engine;

mod macros;

pub mod mapping;

pub mod member;

pub mod persister;
pub use persister::{EntityPersister, PersistListener, Persister};

mod primitive;
pub use primitive::{EnumEncoding, MappedEnum, Primitive};

pub mod session;
pub use session::Session;

pub use trellis_core::{driver, schema, stmt, Error, Result};

use std::fmt::Debug;

/// A type that can be mapped to tables.
///
/// Loading creates instances with [`Default`] and fills them column by
/// column; [`Clone`] gives callers the snapshot `update` compares against.
pub trait Entity: Default + Clone + Debug + Send + Sync + 'static {}

impl<T: Default + Clone + Debug + Send + Sync + 'static> Entity for T {}
