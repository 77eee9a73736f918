use super::Error;

/// Error when a versioned update or delete affects a different number of
/// rows than expected, meaning the row was modified or removed concurrently.
#[derive(Debug)]
pub(super) struct StaleObject {
    table: Box<str>,
    expected: u64,
    actual: u64,
}

impl std::error::Error for StaleObject {}

impl core::fmt::Display for StaleObject {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "stale object: expected {} row(s) to be affected in table {}, but {} were",
            self.expected, self.table, self.actual
        )
    }
}

impl Error {
    /// Creates a stale object error.
    pub fn stale_object(table: impl Into<String>, expected: u64, actual: u64) -> Error {
        Error::from(super::ErrorKind::StaleObject(StaleObject {
            table: table.into().into(),
            expected,
            actual,
        }))
    }

    /// Returns `true` if this error is a stale object error.
    pub fn is_stale_object(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::StaleObject(_))
    }
}
