use crate::Result;

use trellis_core::{stmt, Error};

use chrono::{DateTime, Utc};

/// A value type that maps to a single column.
pub trait Primitive: Sized + Clone + Send + Sync + 'static {
    const TYPE: stmt::Type;
    const NULLABLE: bool = false;

    fn into_value(self) -> stmt::Value;

    fn load(value: stmt::Value) -> Result<Self>;
}

macro_rules! impl_primitive {
    ( $( $ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl Primitive for $ty {
                const TYPE: stmt::Type = stmt::Type::$variant;

                fn into_value(self) -> stmt::Value {
                    self.into()
                }

                fn load(value: stmt::Value) -> Result<Self> {
                    value.try_into()
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    f64 => F64,
    String => String,
    uuid::Uuid => Uuid,
    DateTime<Utc> => Timestamp,
}

impl<T: Primitive> Primitive for Option<T> {
    const TYPE: stmt::Type = T::TYPE;
    const NULLABLE: bool = true;

    fn into_value(self) -> stmt::Value {
        match self {
            Some(value) => value.into_value(),
            None => stmt::Value::Null,
        }
    }

    fn load(value: stmt::Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(T::load(value)?))
        }
    }
}

/// An enum stored in a single column.
///
/// Variants are listed in declaration order; a variant's ordinal is its
/// position in [`MappedEnum::VARIANTS`].
pub trait MappedEnum: Sized + Copy + PartialEq + Send + Sync + 'static {
    const VARIANTS: &'static [Self];

    fn name(&self) -> &'static str;
}

/// How an enum is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnumEncoding {
    /// The variant name, as a string column
    #[default]
    ByName,

    /// The variant position, as an integer column
    ByOrdinal,
}

impl EnumEncoding {
    pub(crate) fn ty(self) -> stmt::Type {
        match self {
            EnumEncoding::ByName => stmt::Type::String,
            EnumEncoding::ByOrdinal => stmt::Type::I32,
        }
    }

    pub(crate) fn encode<M: MappedEnum>(self, value: M) -> stmt::Value {
        match self {
            EnumEncoding::ByName => stmt::Value::from(value.name()),
            EnumEncoding::ByOrdinal => {
                let ordinal = M::VARIANTS
                    .iter()
                    .position(|variant| *variant == value)
                    .unwrap_or_default();
                stmt::Value::I32(ordinal as i32)
            }
        }
    }

    pub(crate) fn decode<M: MappedEnum>(self, value: stmt::Value) -> Result<M> {
        let found = match (self, &value) {
            (EnumEncoding::ByName, stmt::Value::String(name)) => M::VARIANTS
                .iter()
                .find(|variant| variant.name() == name.as_str()),
            (EnumEncoding::ByOrdinal, _) => value
                .as_i64()
                .and_then(|ordinal| usize::try_from(ordinal).ok())
                .and_then(|ordinal| M::VARIANTS.get(ordinal)),
            _ => None,
        };

        found
            .copied()
            .ok_or_else(|| Error::type_conversion(value, std::any::type_name::<M>()))
    }
}
