use crate::core::types::DataType;

/// Definition of a single column in a table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// The column name, lowercased.
    pub name: String,

    /// The data type for values in this column.
    pub data_type: DataType,
}

impl ColumnDef {
    /// Creates a new column definition.
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_owned(),
            data_type,
        }
    }

    /// The synthetic identifier column every table starts with.
    pub fn identifier() -> Self {
        Self::new(super::ID_COLUMN, DataType::Integer)
    }
}
