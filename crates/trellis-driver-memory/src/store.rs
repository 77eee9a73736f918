use crate::Violation;

use trellis_core::driver::operation::{Delete, Insert, NextValue, Select, Transaction, Update};
use trellis_core::driver::Response;
use trellis_core::schema::db::{Schema, Table};
use trellis_core::stmt::{Condition, Filter, Record, Value};
use trellis_core::{Error, Result};

use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashMap;

type Tables = IndexMap<String, Vec<Record>>;

/// Rows of every table, plus what a rollback restores them to.
#[derive(Debug, Default)]
pub(crate) struct Store {
    /// Constraints are only enforced once a schema is pushed.
    schema: Option<Schema>,
    tables: Tables,
    keys: HashMap<String, i64>,
    sequences: HashMap<String, i64>,
    snapshot: Option<Tables>,
}

impl Store {
    pub(crate) fn push_schema(&mut self, schema: &Schema) {
        for table in schema.tables() {
            self.tables.entry(table.name.clone()).or_default();
        }
        self.schema = Some(schema.clone());
    }

    pub(crate) fn rows(&self, table: &str) -> Vec<Record> {
        self.tables.get(table).cloned().unwrap_or_default()
    }

    pub(crate) fn insert(&mut self, op: Insert) -> Result<Response> {
        let Insert {
            table,
            mut values,
            returning,
        } = op;
        self.check_table(&table)?;

        let generated = match &returning {
            Some(column) => {
                let key = self.next_key(&table, column)?;
                values.insert(column, key.clone());
                Some((column.clone(), key))
            }
            None => None,
        };

        let row = self.normalize(&table, values)?;
        self.check_row(&table, &row)?;
        self.check_unique(&table, &row, None)?;
        self.tables.entry(table).or_default().push(row);

        Ok(match generated {
            Some((column, key)) => Response::values(vec![Record::from_iter([(column, key)])]),
            None => Response::count(1),
        })
    }

    pub(crate) fn update(&mut self, op: Update) -> Result<Response> {
        let Update {
            table,
            assignments,
            filter,
        } = op;
        self.check_table(&table)?;

        let mut updated = vec![];
        for (index, row) in self.table_rows(&table).iter().enumerate() {
            if matches(&filter, row) {
                let mut row = row.clone();
                row.merge(&assignments);
                updated.push((index, self.normalize(&table, row)?));
            }
        }

        for (index, row) in &updated {
            self.check_row(&table, row)?;
            self.check_unique(&table, row, Some(*index))?;
        }

        let count = updated.len() as u64;
        let rows = self.tables.entry(table).or_default();
        for (index, row) in updated {
            rows[index] = row;
        }
        Ok(Response::count(count))
    }

    pub(crate) fn delete(&mut self, op: Delete) -> Result<Response> {
        let Delete { table, filter } = op;
        self.check_table(&table)?;

        let (deleted, kept): (Vec<_>, Vec<_>) = self
            .table_rows(&table)
            .iter()
            .cloned()
            .partition(|row| matches(&filter, row));

        for row in &deleted {
            self.check_restrict(&table, row, &kept)?;
        }

        let count = deleted.len() as u64;
        self.tables.insert(table, kept);
        Ok(Response::count(count))
    }

    pub(crate) fn select(&self, op: Select) -> Result<Response> {
        self.check_table(&op.table)?;

        let mut rows: Vec<&Record> = self
            .table_rows(&op.table)
            .iter()
            .filter(|row| matches(&op.filter, row))
            .collect();

        if let Some(column) = &op.order_by {
            rows.sort_by(|a, b| compare(a.get(column), b.get(column)));
        }

        let rows: Vec<Record> = rows
            .into_iter()
            .map(|row| {
                op.columns
                    .iter()
                    .map(|column| (column.clone(), row.get(column).clone()))
                    .collect()
            })
            .collect();
        Ok(Response::values(rows))
    }

    pub(crate) fn next_value(&mut self, op: NextValue) -> Response {
        let value = self.sequences.entry(op.sequence).or_insert(0);
        *value += 1;
        Response::values(vec![Record::from_iter([("value", Value::I64(*value))])])
    }

    pub(crate) fn transaction(&mut self, op: Transaction) -> Result<Response> {
        match op {
            Transaction::Start => {
                if self.snapshot.is_some() {
                    return Err(Error::driver(Violation::Transaction(
                        "a transaction is already open",
                    )));
                }
                self.snapshot = Some(self.tables.clone());
            }
            Transaction::Commit => {
                if self.snapshot.take().is_none() {
                    return Err(Error::driver(Violation::Transaction("no open transaction")));
                }
            }
            Transaction::Rollback => match self.snapshot.take() {
                Some(tables) => self.tables = tables,
                None => {
                    return Err(Error::driver(Violation::Transaction("no open transaction")));
                }
            },
        }
        Ok(Response::count(0))
    }

    fn table_rows(&self, table: &str) -> &[Record] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    fn table_schema(&self, table: &str) -> Option<&Table> {
        self.schema.as_ref().and_then(|schema| schema.table(table))
    }

    fn check_table(&self, table: &str) -> Result<()> {
        match &self.schema {
            Some(schema) if !schema.contains(table) => {
                Err(Error::driver(Violation::NoSuchTable(table.to_string())))
            }
            _ => Ok(()),
        }
    }

    /// Generated keys continue after the largest key already stored.
    fn next_key(&mut self, table: &str, column: &str) -> Result<Value> {
        let stored = self
            .table_rows(table)
            .iter()
            .filter_map(|row| row.get(column).as_i64())
            .max()
            .unwrap_or(0);

        let counter = self.keys.entry(table.to_string()).or_insert(0);
        *counter = (*counter).max(stored) + 1;

        let key = Value::I64(*counter);
        match self.table_schema(table).and_then(|table| table.column(column)) {
            Some(column) => key.cast(column.ty),
            None => Ok(key),
        }
    }

    /// Casts every value to the type of its column.
    fn normalize(&self, table: &str, row: Record) -> Result<Record> {
        let Some(schema) = self.table_schema(table) else {
            return Ok(row);
        };

        row.into_iter()
            .map(|(column, value)| match schema.column(&column) {
                Some(def) => Ok((column, value.cast(def.ty)?)),
                None => Err(Error::driver(Violation::NoSuchColumn {
                    table: table.to_string(),
                    column,
                })),
            })
            .collect()
    }

    fn check_row(&self, table: &str, row: &Record) -> Result<()> {
        let Some(schema) = self.table_schema(table) else {
            return Ok(());
        };

        for column in &schema.columns {
            if !column.nullable && row.get(&column.name).is_null() {
                return Err(Error::driver(Violation::NotNull {
                    table: table.to_string(),
                    column: column.name.clone(),
                }));
            }
        }

        for foreign_key in &schema.foreign_keys {
            let referenced = foreign_key.pairs().all(|(source, _)| row.get(source).is_null())
                || self.table_rows(&foreign_key.target_table).iter().any(|target| {
                    foreign_key
                        .pairs()
                        .all(|(source, column)| target.get(column) == row.get(source))
                });

            if !referenced {
                return Err(Error::driver(Violation::ForeignKey {
                    constraint: foreign_key.name.clone(),
                }));
            }
        }
        Ok(())
    }

    fn check_unique(&self, table: &str, row: &Record, skip: Option<usize>) -> Result<()> {
        let Some(schema) = self.table_schema(table) else {
            return Ok(());
        };

        let key: Vec<&str> = schema
            .primary_key_columns()
            .map(|column| column.name.as_str())
            .collect();
        if key.is_empty() {
            return Ok(());
        }

        let duplicate = self
            .table_rows(table)
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != skip)
            .any(|(_, other)| key.iter().all(|column| other.get(column) == row.get(column)));

        if duplicate {
            return Err(Error::driver(Violation::DuplicateKey {
                table: table.to_string(),
            }));
        }
        Ok(())
    }

    /// Fails if a row outside the deleted set still references `row`.
    fn check_restrict(&self, table: &str, row: &Record, kept: &[Record]) -> Result<()> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };

        for referencing in schema.tables() {
            for foreign_key in &referencing.foreign_keys {
                if foreign_key.target_table != table {
                    continue;
                }

                let rows = if referencing.name == table {
                    kept
                } else {
                    self.table_rows(&referencing.name)
                };

                let referenced = rows.iter().any(|other| {
                    foreign_key.pairs().all(|(source, target)| {
                        !row.get(target).is_null() && other.get(source) == row.get(target)
                    })
                });

                if referenced {
                    return Err(Error::driver(Violation::Restrict {
                        constraint: foreign_key.name.clone(),
                    }));
                }
            }
        }
        Ok(())
    }
}

/// Like [`Filter::matches`], comparing integers across widths.
fn matches(filter: &Filter, row: &Record) -> bool {
    filter.conditions().iter().all(|condition| match condition {
        Condition::Eq(column, value) => compare(row.get(column), value) == Ordering::Equal,
        Condition::IsNull(column) => row.get(column).is_null(),
    })
}

/// Orders values of the same type; `Null` sorts first.
fn compare(a: &Value, b: &Value) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.cmp(&b);
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::F64(a), Value::F64(b)) => a.total_cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        _ if a == b => Ordering::Equal,
        _ => a.to_string().cmp(&b.to_string()),
    }
}
