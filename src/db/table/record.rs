use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};

use super::{ID_COLUMN, schema::Schema};
use crate::core::types::Value;

/// A record: one value per schema column, kept in column order.
///
/// # Example
///
/// ```
/// use primdb::{Record, Value};
///
/// let record = Record::new(vec![
///     ("id".to_string(), Value::Integer(1)),
///     ("name".to_string(), Value::Text("Ann".to_string())),
/// ]);
///
/// assert_eq!(record.id(), Some(1));
/// assert_eq!(record.get("name"), Some(&Value::Text("Ann".to_string())));
/// assert_eq!(record.get("age"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates a record from ordered `(column, value)` pairs.
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    /// The record's identifier, if it carries a valid one.
    pub fn id(&self) -> Option<i64> {
        self.get(ID_COLUMN).and_then(Value::as_integer)
    }

    /// Gets the value stored under `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Overwrites `column` if the record has it. Returns whether it did.
    pub fn set(&mut self, column: &str, value: Value) -> bool {
        match self.fields.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Checks that the record has exactly the schema's columns, in order,
    /// with matching value types.
    pub fn conforms_to(&self, schema: &Schema) -> Result<(), String> {
        if self.fields.len() != schema.columns.len() {
            return Err(format!(
                "record has {} fields, schema has {} columns",
                self.fields.len(),
                schema.columns.len()
            ));
        }

        for ((name, value), column) in self.fields.iter().zip(&schema.columns) {
            if *name != column.name {
                return Err(format!("expected field `{}`, found `{name}`", column.name));
            }
            if value.data_type() != column.data_type {
                return Err(format!(
                    "field `{name}` holds {}, column is {}",
                    value.data_type(),
                    column.data_type
                ));
            }
        }

        Ok(())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping column names to scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut fields: Vec<(String, Value)> = Vec::with_capacity(access.size_hint().unwrap_or(0));

        while let Some((name, value)) = access.next_entry::<String, Value>()? {
            if fields.iter().any(|(existing, _)| *existing == name) {
                return Err(de::Error::custom(format!("duplicate field `{name}`")));
            }
            fields.push((name, value));
        }

        Ok(Record { fields })
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}
