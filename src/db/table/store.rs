use serde::{Deserialize, Serialize};

use super::{ID_COLUMN, column_def::ColumnDef, record::Record};
use crate::{
    DatabaseError,
    core::types::Value,
    sql::predicate::{Assignments, Predicate},
};

/// The ordered record collection of one table.
///
/// Identifiers are derived from the collection itself: the next id is one
/// past the largest id present, so ids only grow while the highest record
/// survives. The store trusts its caller to hand it validated values; the
/// engine checks arity and types first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableStore {
    records: Vec<Record>,
}

impl TableStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `1` for an empty table, otherwise one past the largest id.
    pub fn next_id(&self) -> Result<i64, DatabaseError> {
        match self.records.iter().filter_map(Record::id).max() {
            None => Ok(1),
            Some(max) => max
                .checked_add(1)
                .ok_or(DatabaseError::IdentifierExhausted),
        }
    }

    /// Appends a record built from `values`, aligned by position with
    /// `non_id_columns`, and returns its id.
    pub fn insert(
        &mut self,
        non_id_columns: &[ColumnDef],
        values: Vec<Value>,
    ) -> Result<i64, DatabaseError> {
        let id = self.next_id()?;

        let mut fields = Vec::with_capacity(non_id_columns.len() + 1);
        fields.push((ID_COLUMN.to_owned(), Value::Integer(id)));
        fields.extend(
            non_id_columns
                .iter()
                .map(|column| column.name.clone())
                .zip(values),
        );

        self.records.push(Record::new(fields));
        Ok(id)
    }

    /// Records matching `predicate`; everything when it is absent or empty.
    pub fn select(&self, predicate: Option<&Predicate>) -> Vec<Record> {
        match predicate {
            Some(predicate) if !predicate.is_empty() => self
                .records
                .iter()
                .filter(|record| predicate.matches(record))
                .cloned()
                .collect(),
            _ => self.records.clone(),
        }
    }

    /// Applies `assignments` to every matching record and returns the ids of
    /// the records it touched. Fields a record does not have are skipped.
    pub fn update(
        &mut self,
        assignments: &Assignments,
        predicate: Option<&Predicate>,
    ) -> Vec<i64> {
        let mut updated = Vec::new();

        for record in &mut self.records {
            if predicate.is_some_and(|p| !p.matches(record)) {
                continue;
            }

            for (column, value) in assignments.iter() {
                record.set(column, value.clone());
            }

            if let Some(id) = record.id() {
                updated.push(id);
            }
        }

        updated
    }

    /// Removes every record matching `predicate` and returns how many went.
    pub fn delete(&mut self, predicate: &Predicate) -> usize {
        let before = self.records.len();
        self.records.retain(|record| !predicate.matches(record));
        before - self.records.len()
    }
}
