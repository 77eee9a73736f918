//! Values flowing between mapped entities and connections.

mod filter;
pub use filter::{Condition, Filter};

mod record;
pub use record::Record;

mod ty;
pub use ty::Type;

mod value;
pub use value::Value;
