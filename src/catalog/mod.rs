//! The catalog: every table's name and schema.

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    DatabaseError,
    core::types::DataType,
    db::table::{ColumnDef, ID_COLUMN, Schema},
};

/// Table name → schema.
///
/// Names are stored lowercased. The catalog itself never touches storage;
/// the caller persists it after a successful create or drop.
///
/// # Example
///
/// ```
/// use primdb::Catalog;
///
/// let mut catalog = Catalog::new();
/// catalog.create_table("Users", &["name:str", "age:int"]).unwrap();
///
/// assert!(catalog.contains("users"));
/// assert_eq!(catalog.get("users").unwrap().to_string(), "id:int, name:str, age:int");
/// assert!(catalog.create_table("users", &["x:int"]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    tables: BTreeMap<String, Schema>,
}

/// Lowercases and trims a table or column name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&normalize_name(name))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Gets a table's schema.
    pub fn get(&self, name: &str) -> Result<&Schema, DatabaseError> {
        let name = normalize_name(name);
        self.tables
            .get(&name)
            .ok_or(DatabaseError::UnknownTable(name))
    }

    /// Creates a table from `name:type` column specs.
    ///
    /// The identifier column is always prepended. A spec naming `id` is
    /// dropped so the table keeps exactly one Integer `id`. When a column is
    /// declared twice, it keeps its first position and the last type.
    pub fn create_table<S: AsRef<str>>(
        &mut self,
        name: &str,
        column_specs: &[S],
    ) -> Result<&Schema, DatabaseError> {
        let name = normalize_name(name);
        if !is_valid_table_name(&name) {
            return Err(DatabaseError::InvalidTableName(name));
        }
        if self.tables.contains_key(&name) {
            return Err(DatabaseError::DuplicateTable(name));
        }

        let mut columns: Vec<ColumnDef> = Vec::with_capacity(column_specs.len());
        for spec in column_specs {
            let column = parse_column_spec(spec.as_ref())?;

            if column.name == ID_COLUMN {
                warn!(
                    table = %name,
                    spec = spec.as_ref(),
                    "ignoring user-declared identifier column"
                );
                continue;
            }

            match columns.iter_mut().find(|c| c.name == column.name) {
                Some(existing) => existing.data_type = column.data_type,
                None => columns.push(column),
            }
        }

        Ok(self
            .tables
            .entry(name)
            .or_insert(Schema::with_identifier(columns)))
    }

    /// Removes a table and returns its schema.
    pub fn drop_table(&mut self, name: &str) -> Result<Schema, DatabaseError> {
        let name = normalize_name(name);
        self.tables
            .remove(&name)
            .ok_or(DatabaseError::UnknownTable(name))
    }

    /// Table names in catalog order.
    ///
    /// The iterator borrows the catalog, so each call walks the current
    /// contents again.
    pub fn list_tables(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.tables.keys().map(String::as_str)
    }
}

/// Parses one `name:type` column spec.
pub fn parse_column_spec(spec: &str) -> Result<ColumnDef, DatabaseError> {
    let Some((name, tag)) = spec.split_once(':') else {
        return Err(DatabaseError::InvalidColumnSpec(spec.to_owned()));
    };

    let name = normalize_name(name);
    let tag = tag.trim();
    if name.is_empty() || tag.is_empty() {
        return Err(DatabaseError::InvalidColumnSpec(spec.to_owned()));
    }

    let data_type =
        DataType::from_str(tag).map_err(|_| DatabaseError::UnsupportedType(tag.to_owned()))?;

    Ok(ColumnDef::new(&name, data_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_prepends_identifier() {
        let mut catalog = Catalog::new();
        let schema = catalog.create_table("users", &["name:str", "age:int"]).unwrap();

        assert_eq!(schema.columns[0], ColumnDef::new("id", DataType::Integer));
        assert_eq!(schema.columns[1], ColumnDef::new("name", DataType::Text));
        assert_eq!(schema.columns[2], ColumnDef::new("age", DataType::Integer));
    }

    #[test]
    fn test_user_identifier_column_is_ignored() {
        let mut catalog = Catalog::new();
        let schema = catalog.create_table("t", &["id:str", "ID:bool", "x:int"]).unwrap();

        let ids: Vec<_> = schema.columns.iter().filter(|c| c.name == "id").collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(schema.columns[0].data_type, DataType::Integer);
        assert_eq!(schema.columns.len(), 2);
    }

    #[test]
    fn test_repeated_column_last_type_wins() {
        let mut catalog = Catalog::new();
        let schema = catalog.create_table("t", &["a:int", "b:str", "a:bool"]).unwrap();
        assert_eq!(schema.to_string(), "id:int, a:bool, b:str");
    }

    #[test]
    fn test_duplicate_table_is_rejected() {
        let mut catalog = Catalog::new();
        catalog.create_table("users", &["name:str"]).unwrap();

        let err = catalog.create_table("USERS", &["name:str"]).unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateTable(name) if name == "users"));
    }

    #[test]
    fn test_invalid_column_spec() {
        let mut catalog = Catalog::new();
        for spec in ["name", ":int", "name:", "name str"] {
            let err = catalog.create_table("t", &[spec]).unwrap_err();
            assert!(
                matches!(err, DatabaseError::InvalidColumnSpec(_)),
                "{spec} should be an invalid spec"
            );
        }
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_unsupported_type() {
        let mut catalog = Catalog::new();
        let err = catalog.create_table("t", &["ok:int", "score:float"]).unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedType(tag) if tag == "float"));
        assert!(!catalog.contains("t"));
    }

    #[test]
    fn test_invalid_table_name() {
        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.create_table("../etc", &["a:int"]),
            Err(DatabaseError::InvalidTableName(_))
        ));
        assert!(matches!(
            catalog.create_table("", &["a:int"]),
            Err(DatabaseError::InvalidTableName(_))
        ));
    }

    #[test]
    fn test_drop_table() {
        let mut catalog = Catalog::new();
        catalog.create_table("users", &["name:str"]).unwrap();

        assert!(catalog.drop_table("users").is_ok());
        assert!(!catalog.contains("users"));
        assert!(matches!(
            catalog.drop_table("users"),
            Err(DatabaseError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_list_tables_is_restartable() {
        let mut catalog = Catalog::new();
        catalog.create_table("b", &["x:int"]).unwrap();
        catalog.create_table("a", &["x:int"]).unwrap();

        let names = catalog.list_tables();
        assert_eq!(names.clone().count(), 2);
        assert_eq!(names.collect::<Vec<_>>(), vec!["a", "b"]);

        catalog.drop_table("a").unwrap();
        assert_eq!(catalog.list_tables().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_catalog_document_shape() {
        let mut catalog = Catalog::new();
        catalog.create_table("users", &["name:str", "active:bool"]).unwrap();

        let json = serde_json::to_string(&catalog).unwrap();
        assert_eq!(json, r#"{"users":{"id":"int","name":"str","active":"bool"}}"#);

        let decoded: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, catalog);
    }
}
