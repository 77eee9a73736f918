use super::Type;
use crate::{Error, Result};

use chrono::{DateTime, Utc};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// A single column value.
///
/// Floating point values compare and hash by their bit pattern so that
/// `Value` can key maps (identifier lookups, snapshot diffs).
#[derive(Debug, Default, Clone)]
pub enum Value {
    /// Boolean value
    Bool(bool),

    /// Signed 32-bit integer
    I32(i32),

    /// Signed 64-bit integer
    I64(i64),

    /// 64-bit floating point number
    F64(f64),

    /// String value
    String(String),

    /// UUID value
    Uuid(uuid::Uuid),

    /// Timestamp value
    Timestamp(DateTime<Utc>),

    /// Null value
    #[default]
    Null,
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The type of the value, `None` for `Null`.
    pub fn ty(&self) -> Option<Type> {
        Some(match self {
            Self::Bool(_) => Type::Bool,
            Self::I32(_) => Type::I32,
            Self::I64(_) => Type::I64,
            Self::F64(_) => Type::F64,
            Self::String(_) => Type::String,
            Self::Uuid(_) => Type::Uuid,
            Self::Timestamp(_) => Type::Timestamp,
            Self::Null => return None,
        })
    }

    /// Returns `true` if the value is `Null` or of type `ty`.
    pub fn is_a(&self, ty: Type) -> bool {
        match self.ty() {
            Some(actual) => actual == ty,
            None => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I32(v) => Some(v as i64),
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Casts an integer value to `ty`. Non-integer values are returned
    /// unchanged when they already have the requested type.
    pub fn cast(self, ty: Type) -> Result<Value> {
        if self.is_null() || self.is_a(ty) {
            return Ok(self);
        }

        match (self, ty) {
            (Value::I64(v), Type::I32) => i32::try_from(v)
                .map(Value::I32)
                .map_err(|_| Error::type_conversion(Value::I64(v), "i32")),
            (Value::I32(v), Type::I64) => Ok(Value::I64(v as i64)),
            (value, _) => Err(Error::type_conversion(value, type_name(ty))),
        }
    }
}

fn type_name(ty: Type) -> &'static str {
    match ty {
        Type::Bool => "bool",
        Type::I32 => "i32",
        Type::I64 => "i64",
        Type::F64 => "f64",
        Type::String => "String",
        Type::Uuid => "Uuid",
        Type::Timestamp => "Timestamp",
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Null, Self::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Self::Bool(v) => v.hash(state),
            Self::I32(v) => v.hash(state),
            Self::I64(v) => v.hash(state),
            Self::F64(v) => v.to_bits().hash(state),
            Self::String(v) => v.hash(state),
            Self::Uuid(v) => v.hash(state),
            Self::Timestamp(v) => v.hash(state),
            Self::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => v.fmt(f),
            Self::I32(v) => v.fmt(f),
            Self::I64(v) => v.fmt(f),
            Self::F64(v) => v.fmt(f),
            Self::String(v) => write!(f, "'{v}'"),
            Self::Uuid(v) => v.fmt(f),
            Self::Timestamp(v) => v.fmt(f),
            Self::Null => f.write_str("NULL"),
        }
    }
}

macro_rules! impl_value_conversions {
    ( $( $variant:ident($ty:ty) => $name:literal ),* $(,)? ) => {
        $(
            impl From<$ty> for Value {
                fn from(src: $ty) -> Self {
                    Self::$variant(src)
                }
            }

            impl TryFrom<Value> for $ty {
                type Error = Error;

                fn try_from(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        _ => Err(Error::type_conversion(value, $name)),
                    }
                }
            }
        )*
    };
}

impl_value_conversions! {
    Bool(bool) => "bool",
    F64(f64) => "f64",
    String(String) => "String",
    Uuid(uuid::Uuid) => "Uuid",
    Timestamp(DateTime<Utc>) => "Timestamp",
}

impl From<i32> for Value {
    fn from(src: i32) -> Self {
        Self::I32(src)
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Self::I64(src)
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(src: Option<T>) -> Self {
        src.map(Into::into).unwrap_or(Value::Null)
    }
}

// Integers are widened or narrowed on load: drivers do not always preserve
// the declared width.
impl TryFrom<Value> for i32 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::I32(v) => Ok(v),
            Value::I64(v) => i32::try_from(v).map_err(|_| Error::type_conversion(value, "i32")),
            _ => Err(Error::type_conversion(value, "i32")),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::I32(v) => Ok(v as i64),
            Value::I64(v) => Ok(v),
            _ => Err(Error::type_conversion(value, "i64")),
        }
    }
}
