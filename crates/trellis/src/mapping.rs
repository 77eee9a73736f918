//! Compiled, runtime-usable mappings.
//!
//! Everything here is produced by the [`engine`](crate::engine) and never
//! mutated structurally afterwards; only entity data flows through it.

mod binding;
pub use binding::ColumnBinding;

mod class;
pub use class::{ClassMappingStrategy, Discriminator};

mod embedded;
pub use embedded::EmbeddedStrategy;

mod identifier;
pub use identifier::{Generation, IdentifierStrategy};

mod version;
pub use version::VersionStrategy;
