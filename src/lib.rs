//! A small embedded record store with a line-oriented command language.
//!
//! Tables have a fixed schema of `int`, `str` and `bool` columns plus an
//! auto-assigned integer `id`. The catalog and every table's records are
//! kept as JSON documents, and SELECT results are memoized per table until
//! the next write.
//!
//! ```
//! use primdb::{Database, MemoryStore, Predicate, Value};
//!
//! let mut db = Database::new(MemoryStore::new());
//! db.create_table("users", &["name:str", "age:int"]).unwrap();
//! db.insert("users", &["Ann", "30"]).unwrap();
//!
//! let result = db.select("users", Some(&Predicate::equals("age", Value::Integer(30)))).unwrap();
//! assert_eq!(result.records[0].get("name"), Some(&Value::Text("Ann".into())));
//! ```

pub(crate) mod cache;
pub(crate) mod catalog;
pub(crate) mod common;
pub(crate) mod core;
pub(crate) mod db;
pub mod shell;
pub(crate) mod sql;
pub(crate) mod storage;

pub use cache::{CacheStats, ResultCache};
pub use catalog::{Catalog, normalize_name, parse_column_spec};
pub use common::{config::DatabaseConfig, error::DatabaseError};
pub use crate::core::types::{BooleanMode, DataType, Value, validate_value, validate_value_with};
pub use db::{
    database::{Database, QueryResponse, TableInfo},
    table::*,
};
pub use sql::{
    keyword::Keyword,
    lexer::{Token, tokenize},
    parser::{Clause, Command, CommandParser, parse_command},
    predicate::{Assignments, Predicate},
};
pub use storage::{DocumentKey, DocumentStore, JsonFileStore, MemoryStore};
