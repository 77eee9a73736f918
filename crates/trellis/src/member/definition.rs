use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use trellis_core::schema::Name;

/// A reference to a Rust type, compared by [`TypeId`].
#[derive(Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    name: &'static str,
}

impl TypeRef {
    pub fn of<T: ?Sized + 'static>() -> TypeRef {
        TypeRef {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full type name, as returned by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path or generic arguments.
    pub fn simple_name(&self) -> String {
        Name::from_type_name(self.name).upper_camel_case()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &TypeRef) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Canonical identity of a mapped property: declaring type, logical name, and
/// value type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MemberDefinition {
    declaring: TypeRef,
    name: String,
    value: TypeRef,
}

impl MemberDefinition {
    pub fn new(declaring: TypeRef, name: impl Into<String>, value: TypeRef) -> MemberDefinition {
        MemberDefinition {
            declaring,
            name: name.into(),
            value,
        }
    }

    pub fn declaring(&self) -> TypeRef {
        self.declaring
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> TypeRef {
        self.value
    }
}

impl fmt::Display for MemberDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring.simple_name(), self.name)
    }
}

impl fmt::Debug for MemberDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self, self.value)
    }
}

/// The chain of members leading from a root type to a terminal member.
///
/// A path is never empty. Its [`terminal`](MemberPath::terminal) definition
/// is the one chains are compared by.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MemberPath {
    members: Vec<MemberDefinition>,
}

impl MemberPath {
    pub fn new(member: MemberDefinition) -> MemberPath {
        MemberPath {
            members: vec![member],
        }
    }

    /// `self` followed by `next`.
    pub fn join(&self, next: &MemberPath) -> MemberPath {
        let mut members = self.members.clone();
        members.extend(next.members.iter().cloned());
        MemberPath { members }
    }

    pub fn terminal(&self) -> &MemberDefinition {
        // Paths are built from at least one member and only ever grow.
        &self.members[self.members.len() - 1]
    }

    pub fn root(&self) -> &MemberDefinition {
        &self.members[0]
    }

    pub fn members(&self) -> &[MemberDefinition] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Strips `prefix` from the front of the path, if it is one.
    pub fn strip_prefix(&self, prefix: &MemberPath) -> Option<MemberPath> {
        if prefix.len() < self.len() && self.members.starts_with(&prefix.members) {
            Some(MemberPath {
                members: self.members[prefix.len()..].to_vec(),
            })
        } else {
            None
        }
    }
}

impl From<MemberDefinition> for MemberPath {
    fn from(member: MemberDefinition) -> MemberPath {
        MemberPath::new(member)
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root())?;
        for member in &self.members[1..] {
            write!(f, ".{}", member.name())?;
        }
        Ok(())
    }
}

impl fmt::Debug for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
