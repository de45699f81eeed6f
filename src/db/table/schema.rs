use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};

use super::{ID_COLUMN, column_def::ColumnDef};
use crate::core::types::DataType;

/// A table schema: the ordered list of column definitions.
///
/// The first column is always the Integer identifier column `id`. In the
/// catalog document a schema is an object mapping column names to type tags,
/// written and read back in column order.
///
/// # Example
///
/// ```
/// use primdb::{ColumnDef, DataType, Schema};
///
/// let schema = Schema::with_identifier(vec![ColumnDef::new("name", DataType::Text)]);
///
/// assert_eq!(schema.columns.len(), 2);
/// assert_eq!(schema.columns[0].name, "id");
/// assert_eq!(schema.column("name").map(|c| c.data_type), Some(DataType::Text));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// The ordered list of column definitions.
    pub columns: Vec<ColumnDef>,
}

impl Schema {
    /// Creates a schema from user columns, prepending the identifier column.
    pub fn with_identifier(columns: Vec<ColumnDef>) -> Self {
        let mut all = Vec::with_capacity(columns.len() + 1);
        all.push(ColumnDef::identifier());
        all.extend(columns);
        Self { columns: all }
    }

    /// Finds a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// The user-declared columns, i.e. everything after `id`.
    pub fn data_columns(&self) -> &[ColumnDef] {
        self.columns.get(1..).unwrap_or_default()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|col| col.name.as_str())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, column) in self.columns.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", column.name, column.data_type)?;
        }
        Ok(())
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            map.serialize_entry(&column.name, &column.data_type)?;
        }
        map.end()
    }
}

struct SchemaVisitor;

impl<'de> Visitor<'de> for SchemaVisitor {
    type Value = Schema;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping column names to type tags")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Schema, A::Error> {
        let mut columns: Vec<ColumnDef> = Vec::with_capacity(access.size_hint().unwrap_or(0));

        while let Some((name, data_type)) = access.next_entry::<String, DataType>()? {
            if columns.iter().any(|col| col.name == name) {
                return Err(de::Error::custom(format!("duplicate column `{name}`")));
            }
            columns.push(ColumnDef { name, data_type });
        }

        match columns.first() {
            Some(first) if first.name == ID_COLUMN && first.data_type == DataType::Integer => {
                Ok(Schema { columns })
            }
            _ => Err(de::Error::custom(format!(
                "first column must be `{ID_COLUMN}` of type int"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SchemaVisitor)
    }
}
