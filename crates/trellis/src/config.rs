//! The fluent configuration surface.
//!
//! Configurations are plain values assembled with by-value builder methods.
//! Nothing is validated until `build()`, which hands the whole description to
//! the [`engine`](crate::engine).

mod cascade_type;
pub use cascade_type::{CascadeType, CascadeTypes};

mod embeddable;
pub use embeddable::{Embeddable, Embedded};

mod entity;
pub use entity::EntityMapping;

mod identifier;
pub use identifier::{DatabaseSequence, IdentifierPolicy, IncrementSequence, Sequence};

mod inheritance;
pub use inheritance::Inheritance;

mod one_to_many;
pub use one_to_many::{CollectionKind, OneToMany};

mod one_to_one;
pub use one_to_one::OneToOne;

mod polymorphism;
pub use polymorphism::{PolymorphismKind, PolymorphismPolicy, SubEntity};

mod relation;
pub use relation::RelationTarget;
pub(crate) use relation::{BackRef, MappedBy};

mod version;
pub use version::{IntegerVersion, TimestampVersion, VersionSequence};
