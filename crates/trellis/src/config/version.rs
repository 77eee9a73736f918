use crate::Result;

use trellis_core::stmt::Value;
use trellis_core::Error;

use chrono::{Duration, Utc};
use std::fmt;

/// Computes the next version of an optimistically locked entity.
pub trait VersionSequence: fmt::Debug + Send + Sync {
    /// The version following `current`. `current` is `NULL` for an entity
    /// that was never versioned.
    fn next(&self, current: &Value) -> Result<Value>;
}

/// Versions counting up from 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegerVersion;

impl VersionSequence for IntegerVersion {
    fn next(&self, current: &Value) -> Result<Value> {
        match *current {
            Value::Null => Ok(Value::I64(1)),
            Value::I32(version) => version
                .checked_add(1)
                .map(Value::I32)
                .ok_or_else(|| exhausted(current)),
            Value::I64(version) => version
                .checked_add(1)
                .map(Value::I64)
                .ok_or_else(|| exhausted(current)),
            _ => Err(Error::type_conversion(current.clone(), "integer version")),
        }
    }
}

fn exhausted(current: &Value) -> Error {
    trellis_core::err!("version {current} cannot be incremented any further")
}

/// Versions holding the time of the last change. The next version is always
/// later than the current one, even when the clock did not move.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampVersion;

impl VersionSequence for TimestampVersion {
    fn next(&self, current: &Value) -> Result<Value> {
        let now = Utc::now();
        match *current {
            Value::Null => Ok(Value::Timestamp(now)),
            Value::Timestamp(version) => {
                Ok(Value::Timestamp(now.max(version + Duration::microseconds(1))))
            }
            _ => Err(Error::type_conversion(current.clone(), "timestamp version")),
        }
    }
}
