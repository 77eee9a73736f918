use super::{Record, Value};

use std::fmt;

/// A conjunction of column conditions restricting the rows an operation
/// applies to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `column = value`
    Eq(String, Value),

    /// `column IS NULL`
    IsNull(String),
}

impl Filter {
    /// A filter matching every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// `column = value`. A `Null` value becomes `column IS NULL`.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(column, value)
    }

    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let condition = match value.into() {
            Value::Null => Condition::IsNull(column),
            value => Condition::Eq(column, value),
        };
        self.conditions.push(condition);
        self
    }

    /// Adds one `column = value` condition per entry of `record`.
    pub fn and_record(self, record: &Record) -> Self {
        record
            .iter()
            .fold(self, |filter, (column, value)| filter.and_eq(column, value.clone()))
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluates the filter against a row.
    pub fn matches(&self, row: &Record) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq(column, value) => row.get(column) == value,
            Condition::IsNull(column) => row.get(column).is_null(),
        })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return f.write_str("TRUE");
        }

        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            match condition {
                Condition::Eq(column, value) => write!(f, "{column} = {value}")?,
                Condition::IsNull(column) => write!(f, "{column} IS NULL")?,
            }
        }
        Ok(())
    }
}
