//! The mapping compiler.
//!
//! Building an entity walks its configuration level by level: the embedded
//! properties of each level, the inheritance chain, the polymorphic subtypes,
//! then the relations. Every table and persister produced along the way lands
//! in a [`BuildScope`] first and reaches the
//! [`PersistenceContext`](crate::PersistenceContext) only once the whole
//! graph compiled.

pub(crate) mod embedded;

pub(crate) mod entity;

pub mod polymorphism;
pub use polymorphism::Compatibility;

mod scope;
pub(crate) use scope::{BuildScope, Registration};

mod table;
