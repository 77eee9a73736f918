use std::fmt;

/// An operation a relation propagates from its owner to the related
/// entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeType {
    Insert,
    Update,
    Delete,
    Select,
}

/// A set of [`CascadeType`]s.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CascadeTypes {
    bits: u8,
}

impl CascadeType {
    const fn bit(self) -> u8 {
        match self {
            CascadeType::Insert => 1,
            CascadeType::Update => 2,
            CascadeType::Delete => 4,
            CascadeType::Select => 8,
        }
    }
}

impl CascadeTypes {
    pub const ALL: CascadeTypes = CascadeTypes { bits: 0b1111 };
    pub const NONE: CascadeTypes = CascadeTypes { bits: 0 };

    pub fn contains(self, ty: CascadeType) -> bool {
        self.bits & ty.bit() != 0
    }
}

impl Default for CascadeTypes {
    fn default() -> Self {
        CascadeTypes::ALL
    }
}

impl<'a> FromIterator<&'a CascadeType> for CascadeTypes {
    fn from_iter<I: IntoIterator<Item = &'a CascadeType>>(iter: I) -> Self {
        let bits = iter.into_iter().fold(0, |bits, ty| bits | ty.bit());
        CascadeTypes { bits }
    }
}

impl fmt::Debug for CascadeTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let all = [
            CascadeType::Insert,
            CascadeType::Update,
            CascadeType::Delete,
            CascadeType::Select,
        ];
        f.debug_set()
            .entries(all.iter().filter(|ty| self.contains(**ty)))
            .finish()
    }
}
