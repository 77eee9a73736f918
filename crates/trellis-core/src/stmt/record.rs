use super::Value;

use indexmap::IndexMap;
use std::fmt;

/// A row: column values keyed by column name, in column order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of `column`, returning the previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(column.into(), value.into())
    }

    /// Returns the value of `column`. Missing columns read as `Null`.
    pub fn get(&self, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(column).unwrap_or(&NULL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.fields.shift_remove(column)
    }

    pub fn take(&mut self, column: &str) -> Value {
        self.remove(column).unwrap_or_default()
    }

    pub fn columns(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copies every column of `other` into this record, overwriting values
    /// already present.
    pub fn merge(&mut self, other: &Record) {
        for (column, value) in other.iter() {
            self.fields.insert(column.to_string(), value.clone());
        }
    }

    /// Keeps only the columns whose value differs in `other`.
    pub fn diff(&self, other: &Record) -> Record {
        self.iter()
            .filter(|(column, value)| other.get(column) != *value)
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Value>) {
        self.fields.into_iter().unzip()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (column, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{column}: {value}")?;
        }
        f.write_str("}")
    }
}
