use super::Error;

/// Error when an entity mapping configuration is invalid.
///
/// This occurs when:
/// - The same member, or two members targeting the same column, are mapped twice
/// - No identifier, or more than one identifier, is declared across a hierarchy
/// - A column is not present in a pre-supplied table
/// - A relation is declared in a shape the compiler cannot wire
///
/// These errors are raised synchronously by `build()` and are never retried.
#[derive(Debug)]
pub(super) struct InvalidMapping {
    message: Box<str>,
}

impl std::error::Error for InvalidMapping {}

impl core::fmt::Display for InvalidMapping {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid mapping: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid mapping error.
    pub fn invalid_mapping(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidMapping(InvalidMapping {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid mapping error.
    pub fn is_invalid_mapping(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidMapping(_))
    }
}
