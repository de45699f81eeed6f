use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::types::DataType;

/// Every failure the engine can surface to a caller.
///
/// Validation errors are raised before any record is touched. Once a
/// mutation has started, only the storage variants can still occur.
#[derive(Debug, Error, Diagnostic)]
pub enum DatabaseError {
    #[error("Table \"{0}\" already exists")]
    #[diagnostic(
        code(primdb::catalog::duplicate_table),
        help("Drop the existing table first or pick another name")
    )]
    DuplicateTable(String),

    #[error("Table \"{0}\" does not exist")]
    #[diagnostic(
        code(primdb::catalog::unknown_table),
        help("Run `list_tables` to see the existing tables")
    )]
    UnknownTable(String),

    #[error("Invalid table name \"{0}\"")]
    #[diagnostic(
        code(primdb::catalog::invalid_table_name),
        help("Table names start with a letter or `_` and contain only letters, digits and `_`")
    )]
    InvalidTableName(String),

    #[error("Invalid column spec \"{0}\"")]
    #[diagnostic(
        code(primdb::catalog::invalid_column_spec),
        help("Columns are declared as `name:type`, e.g. `age:int`")
    )]
    InvalidColumnSpec(String),

    #[error("Unsupported type \"{0}\"")]
    #[diagnostic(
        code(primdb::catalog::unsupported_type),
        help("Supported types: int, str, bool")
    )]
    UnsupportedType(String),

    #[error("Expected {expected} values, got {found}")]
    #[diagnostic(
        code(primdb::query::arity_mismatch),
        help("Provide one value per column, excluding `id`")
    )]
    ArityMismatch { expected: usize, found: usize },

    #[error("Column \"{column}\" does not exist in table \"{table}\"")]
    #[diagnostic(
        code(primdb::query::unknown_column),
        help("Run `info <table>` to see its columns")
    )]
    UnknownColumn { table: String, column: String },

    #[error("Column \"{column}\" holds {expected} values, got {found}")]
    #[diagnostic(code(primdb::query::type_mismatch))]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: DataType,
    },

    #[error("Cannot read \"{value}\" as {data_type}")]
    #[diagnostic(code(primdb::query::invalid_value))]
    InvalidValue { value: String, data_type: DataType },

    #[error("Column \"id\" is assigned automatically and cannot be set")]
    #[diagnostic(code(primdb::query::identifier_not_writable))]
    IdentifierNotWritable,

    #[error("No identifiers left: the table already holds the largest possible id")]
    #[diagnostic(
        code(primdb::query::identifier_exhausted),
        help("Delete the record with the largest id before inserting")
    )]
    IdentifierExhausted,

    #[error("Malformed {clause} clause: {reason}")]
    #[diagnostic(
        code(primdb::parser::malformed_predicate),
        help("Write the clause as `<column> = <value>`")
    )]
    MalformedPredicate {
        clause: &'static str,
        reason: String,
    },

    #[error("Invalid command: {0}")]
    #[diagnostic(
        code(primdb::parser::invalid_command),
        help("Type `help` for the list of commands")
    )]
    InvalidCommand(String),

    #[error("Storage unavailable: {0}")]
    #[diagnostic(
        code(primdb::storage::unavailable),
        help("Check that the data directory exists and is writable")
    )]
    StorageUnavailable(#[from] std::io::Error),

    #[error("Document {key} is corrupt: {reason}")]
    #[diagnostic(code(primdb::storage::corrupt))]
    StorageCorrupt { key: String, reason: String },

    #[error("Invalid configuration in {}: {reason}", path.display())]
    #[diagnostic(code(primdb::config::invalid))]
    Config { path: PathBuf, reason: String },
}
