//! Resolution of accessors, mutators, and lenses to canonical member
//! definitions.
//!
//! Rust has no runtime reflection, so every member reference carries its
//! logical name alongside the function that reads or writes it. Two references
//! denote the same mapped property when their [`MemberDefinition`]s are equal,
//! regardless of whether they were written as a field access or a method.

mod accessor;
pub use accessor::{Accessor, Mutator};

mod definition;
pub use definition::{MemberDefinition, MemberPath, TypeRef};

mod lens;
pub use lens::Lens;
pub(crate) use lens::PartialLens;

mod property;
pub use property::Property;

/// Anything that designates a member: accessors, mutators, properties, and
/// lenses.
pub trait Member {
    /// The full path from the root type to the member.
    fn path(&self) -> &MemberPath;

    /// The definition of the terminal member.
    fn definition(&self) -> &MemberDefinition {
        self.path().terminal()
    }
}

/// Reduces a method name to the property it designates: `getName`, `isName`,
/// and `setName` designate `name`, as do `get_name`, `is_name`, and
/// `set_name`. Any other name designates itself.
pub fn property_name(method: &str) -> String {
    for prefix in ["get_", "set_", "is_"] {
        if let Some(rest) = method.strip_prefix(prefix) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }

    for prefix in ["get", "set", "is"] {
        if let Some(rest) = method.strip_prefix(prefix) {
            let mut chars = rest.chars();
            if let Some(first) = chars.next().filter(|c| c.is_uppercase()) {
                return first.to_lowercase().chain(chars).collect();
            }
        }
    }

    method.to_string()
}
