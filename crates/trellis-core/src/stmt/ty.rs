use std::fmt;

/// A value type, from Trellis' point of view.
///
/// Every mapped property resolves to one of these. The storage type used by
/// the database is derived from it by [`db::Type::from_app`].
///
/// [`db::Type::from_app`]: crate::schema::db::Type::from_app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean value
    Bool,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// 64-bit floating point number
    F64,

    /// String type
    String,

    /// 128-bit universally unique identifier
    Uuid,

    /// An instant in time, UTC
    Timestamp,
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::F64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::I32 | Self::I64)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F64 => "f64",
            Self::String => "String",
            Self::Uuid => "Uuid",
            Self::Timestamp => "Timestamp",
        };
        f.write_str(name)
    }
}
