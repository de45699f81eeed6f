use std::collections::BTreeMap;

use crate::{DatabaseError, Record, Schema, Value, db::table::ID_COLUMN};

/// A conjunction of `column = value` equalities.
///
/// The command grammar only produces single-term predicates, but any number
/// of terms is supported. An empty predicate matches every record.
///
/// # Example
///
/// ```
/// use primdb::{Predicate, Record, Value};
///
/// let record = Record::new(vec![
///     ("id".to_string(), Value::Integer(1)),
///     ("age".to_string(), Value::Integer(30)),
/// ]);
///
/// assert!(Predicate::equals("age", Value::Integer(30)).matches(&record));
/// assert!(!Predicate::equals("age", Value::Integer(31)).matches(&record));
/// assert!(Predicate::new().matches(&record));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    terms: BTreeMap<String, Value>,
}

impl Predicate {
    /// Creates an empty predicate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single-term predicate.
    pub fn equals(column: impl Into<String>, value: Value) -> Self {
        Self::new().and(column, value)
    }

    /// Adds a term. A repeated column keeps the last value.
    pub fn and(mut self, column: impl Into<String>, value: Value) -> Self {
        self.terms.insert(column.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.terms.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// True when every term equals the record's stored value.
    pub fn matches(&self, record: &Record) -> bool {
        self.terms
            .iter()
            .all(|(column, value)| record.get(column) == Some(value))
    }

    /// Checks every term against `schema`.
    pub fn validate(&self, table: &str, schema: &Schema) -> Result<(), DatabaseError> {
        validate_pairs(table, schema, self.terms())
    }

    /// Canonical form used as the result cache key.
    ///
    /// Terms are ordered by column and rendered as a JSON object, so
    /// `Integer(1)` and `Text("1")` produce different keys.
    pub fn cache_key(&self) -> String {
        let object: serde_json::Map<String, serde_json::Value> = self
            .terms
            .iter()
            .map(|(column, value)| (column.clone(), json_scalar(value)))
            .collect();

        serde_json::Value::Object(object).to_string()
    }
}

/// The `SET` side of an update: columns to overwrite with new values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignments {
    values: BTreeMap<String, Value>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single assignment.
    pub fn set(column: impl Into<String>, value: Value) -> Self {
        Self::new().and(column, value)
    }

    pub fn and(mut self, column: impl Into<String>, value: Value) -> Self {
        self.values.insert(column.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Checks every assignment against `schema`. The identifier column is
    /// never writable.
    pub fn validate(&self, table: &str, schema: &Schema) -> Result<(), DatabaseError> {
        if self.values.contains_key(ID_COLUMN) {
            return Err(DatabaseError::IdentifierNotWritable);
        }
        validate_pairs(table, schema, self.iter())
    }
}

fn validate_pairs<'a>(
    table: &str,
    schema: &Schema,
    pairs: impl Iterator<Item = (&'a str, &'a Value)>,
) -> Result<(), DatabaseError> {
    for (column, value) in pairs {
        let column_def = schema
            .column(column)
            .ok_or_else(|| DatabaseError::UnknownColumn {
                table: table.to_owned(),
                column: column.to_owned(),
            })?;
        value.check_type(column, column_def.data_type)?;
    }
    Ok(())
}

fn json_scalar(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Text(s) => serde_json::Value::from(s.as_str()),
        Value::Boolean(b) => serde_json::Value::from(*b),
    }
}
