pub mod column_def;
pub mod record;
pub mod schema;
pub mod store;

pub use column_def::ColumnDef;
pub use record::Record;
pub use schema::Schema;
pub use store::TableStore;

/// Name of the synthetic identifier column present on every table.
pub const ID_COLUMN: &str = "id";
