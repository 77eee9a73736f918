use crate::{driver, stmt, Result};

/// Database-level storage types representing how values are stored in the
/// target database.
///
/// Trellis has two distinct type systems:
///
/// 1. **[`stmt::Type`]**: the type of a mapped property's value, as the
///    mapping compiler sees it (`I64`, `String`, ...).
/// 2. **`db::Type`** (this type): the column type the database uses to store
///    it (`Integer(8)`, `Text`, `VarChar(n)`, ...).
///
/// The mapping from one to the other happens when a column is allocated,
/// through [`Type::from_app`] and the connection's [`driver::StorageTypes`]:
///
/// ```text
/// stmt::Type::String  →  db::Type::Text         (default for most databases)
///                     →  db::Type::VarChar(255)  (if specified in the mapping)
///
/// stmt::Type::I64     →  db::Type::Integer(8)
/// stmt::Type::I32     →  db::Type::Integer(4)
/// stmt::Type::Bool    →  db::Type::Boolean
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// A boolean value
    Boolean,

    /// A signed integer of `n` bytes
    Integer(u8),

    /// A floating point number of `n` bytes
    Float(u8),

    /// Unconstrained text type
    Text,

    /// Text type with an explicit maximum length
    VarChar(u64),

    /// 128-bit universally unique identifier (UUID)
    Uuid,

    /// An instant in time with fractional seconds precision (0-9 digits).
    Timestamp(u8),
}

impl Type {
    /// Maps an application-level type to a database-level storage type.
    ///
    /// `hint` is an explicit storage type requested by the mapping; it wins
    /// when present, provided the database supports it.
    pub fn from_app(
        ty: stmt::Type,
        hint: Option<&Type>,
        db: &driver::StorageTypes,
    ) -> Result<Type> {
        let storage_ty = match hint {
            Some(ty) => ty.clone(),
            None => Type::default_mapping(ty, db),
        };

        storage_ty.verify(db)?;
        Ok(storage_ty)
    }

    /// The storage type used when no capability is at hand.
    pub fn default_for(ty: stmt::Type) -> Type {
        Type::default_mapping(ty, &driver::StorageTypes::DEFAULT)
    }

    fn default_mapping(ty: stmt::Type, db: &driver::StorageTypes) -> Type {
        match ty {
            stmt::Type::Bool => Type::Boolean,
            stmt::Type::I32 => Type::Integer(4),
            stmt::Type::I64 => Type::Integer(8),
            stmt::Type::F64 => Type::Float(8),
            stmt::Type::String => db.default_string_type.clone(),
            stmt::Type::Uuid => db.default_uuid_type.clone(),
            stmt::Type::Timestamp => Type::Timestamp(6),
        }
    }

    fn verify(&self, db: &driver::StorageTypes) -> Result<()> {
        match *self {
            Type::VarChar(size) => match db.varchar {
                Some(max) if size > max => Err(crate::Error::unsupported_feature(format!(
                    "VARCHAR({}) exceeds database maximum of {}",
                    size, max
                ))),
                None => Err(crate::Error::unsupported_feature(
                    "VARCHAR type is not supported by this database",
                )),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}
