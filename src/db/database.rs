use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::{
    DatabaseConfig, DatabaseError,
    cache::{CacheStats, ResultCache},
    catalog::{Catalog, normalize_name},
    core::types::{BooleanMode, Value, validate_value_with},
    db::table::{Record, Schema, TableStore},
    sql::predicate::{Assignments, Predicate},
    storage::{DocumentKey, DocumentStore, JsonFileStore},
};

/// Result of a SELECT.
///
/// Contains the table schema and the matching records. `records` is shared
/// with the result cache, so repeating a query between writes hands back the
/// same allocation.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    /// The normalized table name.
    pub table: String,

    pub schema: Schema,

    /// The records returned by the query, in insertion order.
    pub records: Rc<Vec<Record>>,
}

/// Schema and size of one table, as reported by `info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub schema: Schema,
    pub record_count: usize,
}

/// The main database handle.
///
/// `Database` is the engine behind every command. It owns:
/// - the [`DocumentStore`] holding the catalog and the table documents
/// - the [`ResultCache`] for SELECT results
///
/// # Architecture
///
/// Every operation starts by loading the catalog (and, when it needs them,
/// the table's records) from the store, and every mutation writes the whole
/// document back before returning. The only state kept between operations is
/// the result cache, which each write to a table clears for that table.
///
/// All preconditions (table exists, arity, column names, types) are checked
/// before any record is touched. A failed save is reported as
/// [`DatabaseError::StorageUnavailable`]; the unsaved change is dropped with
/// the loaded copy, so the next operation sees the last saved state.
#[derive(Debug)]
pub struct Database<S = JsonFileStore> {
    store: S,
    cache: ResultCache<Vec<Record>>,
    boolean_mode: BooleanMode,
}

impl Database<JsonFileStore> {
    /// Opens (creating if needed) the on-disk database described by `config`.
    pub fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&config.data_dir)?;
        info!(data_dir = %config.data_dir.display(), "opening database");
        Ok(Self::with_config(JsonFileStore::from_config(config), config))
    }
}

impl<S: DocumentStore> Database<S> {
    /// Creates a database over `store` with default settings.
    pub fn new(store: S) -> Self {
        Self::with_config(store, &DatabaseConfig::default())
    }

    pub fn with_config(store: S, config: &DatabaseConfig) -> Self {
        let cache = if config.cache_enabled {
            ResultCache::new()
        } else {
            ResultCache::disabled()
        };

        Self {
            store,
            cache,
            boolean_mode: config.boolean_mode(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn boolean_mode(&self) -> BooleanMode {
        self.boolean_mode
    }

    /// Result cache counters since the database was opened.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Loads the current catalog.
    pub fn catalog(&self) -> Result<Catalog, DatabaseError> {
        self.store.load(&DocumentKey::Catalog)
    }

    /// Loads one table's schema.
    pub fn schema(&self, table: &str) -> Result<Schema, DatabaseError> {
        self.catalog()?.get(table).cloned()
    }

    /// Creates a table from `name:type` column specs and returns its schema.
    pub fn create_table<C: AsRef<str>>(
        &mut self,
        name: &str,
        column_specs: &[C],
    ) -> Result<Schema, DatabaseError> {
        let mut catalog = self.catalog()?;
        let schema = catalog.create_table(name, column_specs)?.clone();
        let table = normalize_name(name);

        // A new table never inherits records from an earlier one of the same name.
        self.store.remove(&DocumentKey::Table(table.clone()))?;
        self.store.save(&DocumentKey::Catalog, &catalog)?;
        self.cache.invalidate(&table);

        info!(table, columns = %schema, "table created");
        Ok(schema)
    }

    /// Drops a table and its records.
    pub fn drop_table(&mut self, name: &str) -> Result<(), DatabaseError> {
        let mut catalog = self.catalog()?;
        catalog.drop_table(name)?;
        let table = normalize_name(name);

        self.store.save(&DocumentKey::Catalog, &catalog)?;
        self.cache.invalidate(&table);
        self.store.remove(&DocumentKey::Table(table.clone()))?;

        info!(table, "table dropped");
        Ok(())
    }

    /// Names of all tables.
    pub fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(self.catalog()?.list_tables().map(str::to_owned).collect())
    }

    /// Schema and record count of one table.
    pub fn info(&self, name: &str) -> Result<TableInfo, DatabaseError> {
        let table = normalize_name(name);
        let schema = self.schema(&table)?;
        let records = Self::load_records(&self.store, &table, &schema)?;

        Ok(TableInfo {
            name: table,
            record_count: records.len(),
            schema,
        })
    }

    /// Inserts a record from raw text values, one per non-`id` column in
    /// schema order, and returns the new record's id.
    pub fn insert<V: AsRef<str>>(
        &mut self,
        table: &str,
        values: &[V],
    ) -> Result<i64, DatabaseError> {
        let table = normalize_name(table);
        let catalog = self.catalog()?;
        let schema = catalog.get(&table)?;
        check_arity(schema, values.len())?;

        let typed = values
            .iter()
            .zip(schema.data_columns())
            .map(|(raw, column)| {
                validate_value_with(raw.as_ref(), column.data_type, self.boolean_mode)
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.append(&table, schema, typed)
    }

    /// Inserts an already typed record. Each value must match its column's
    /// type.
    pub fn insert_values(
        &mut self,
        table: &str,
        values: Vec<Value>,
    ) -> Result<i64, DatabaseError> {
        let table = normalize_name(table);
        let catalog = self.catalog()?;
        let schema = catalog.get(&table)?;
        check_arity(schema, values.len())?;

        for (value, column) in values.iter().zip(schema.data_columns()) {
            value.check_type(&column.name, column.data_type)?;
        }

        self.append(&table, schema, values)
    }

    /// Records matching `predicate`, or every record when it is `None` or
    /// empty. Served from the result cache when possible.
    pub fn select(
        &mut self,
        table: &str,
        predicate: Option<&Predicate>,
    ) -> Result<QueryResponse, DatabaseError> {
        let table = normalize_name(table);
        let schema = self.schema(&table)?;
        if let Some(predicate) = predicate {
            predicate.validate(&table, &schema)?;
        }

        let key = predicate.map_or_else(|| Predicate::new().cache_key(), Predicate::cache_key);

        let Self { store, cache, .. } = self;
        let records = cache.get_or_compute(&table, &key, || {
            Self::load_records(store, &table, &schema).map(|records| records.select(predicate))
        })?;

        let stats = cache.stats();
        debug!(
            table,
            key,
            rows = records.len(),
            cache_hits = stats.hits,
            cache_misses = stats.misses,
            cache_hit_rate = stats.hit_rate(),
            "select"
        );
        Ok(QueryResponse {
            table,
            schema,
            records,
        })
    }

    /// Applies `assignments` to the records matching `predicate` (all records
    /// when `None`) and returns the ids it changed.
    ///
    /// Every assigned column must exist and match its type; `id` cannot be
    /// assigned.
    pub fn update(
        &mut self,
        table: &str,
        assignments: &Assignments,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<i64>, DatabaseError> {
        let table = normalize_name(table);
        let schema = self.schema(&table)?;

        if assignments.is_empty() {
            return Err(DatabaseError::MalformedPredicate {
                clause: "SET",
                reason: "update needs at least one assignment".to_string(),
            });
        }
        assignments.validate(&table, &schema)?;
        if let Some(predicate) = predicate {
            predicate.validate(&table, &schema)?;
        }

        let mut records = Self::load_records(&self.store, &table, &schema)?;
        let updated = records.update(assignments, predicate);
        if !updated.is_empty() {
            self.commit(&table, &records)?;
        }

        debug!(table, count = updated.len(), "records updated");
        Ok(updated)
    }

    /// Deletes the records matching `predicate` and returns how many went.
    /// The predicate must not be empty.
    pub fn delete(&mut self, table: &str, predicate: &Predicate) -> Result<usize, DatabaseError> {
        let table = normalize_name(table);
        let schema = self.schema(&table)?;

        if predicate.is_empty() {
            return Err(DatabaseError::MalformedPredicate {
                clause: "WHERE",
                reason: "delete requires a WHERE clause".to_string(),
            });
        }
        predicate.validate(&table, &schema)?;

        let mut records = Self::load_records(&self.store, &table, &schema)?;
        let removed = records.delete(predicate);
        if removed > 0 {
            self.commit(&table, &records)?;
        }

        debug!(table, count = removed, "records deleted");
        Ok(removed)
    }

    fn append(
        &mut self,
        table: &str,
        schema: &Schema,
        values: Vec<Value>,
    ) -> Result<i64, DatabaseError> {
        let mut records = Self::load_records(&self.store, table, schema)?;
        let id = records.insert(schema.data_columns(), values)?;
        self.commit(table, &records)?;

        debug!(table, id, "record inserted");
        Ok(id)
    }

    fn load_records(store: &S, table: &str, schema: &Schema) -> Result<TableStore, DatabaseError> {
        let key = DocumentKey::Table(table.to_owned());
        let records: TableStore = store.load(&key)?;

        for record in records.records() {
            record
                .conforms_to(schema)
                .map_err(|reason| DatabaseError::StorageCorrupt {
                    key: key.to_string(),
                    reason,
                })?;
        }

        Ok(records)
    }

    /// Saves a table's records and drops its cached results, whether or not
    /// the save succeeded.
    fn commit(&mut self, table: &str, records: &TableStore) -> Result<(), DatabaseError> {
        let result = self.store.save(&DocumentKey::Table(table.to_owned()), records);
        self.cache.invalidate(table);

        if let Err(err) = &result {
            warn!(table, error = %err, "failed to persist table");
        }
        result
    }
}

fn check_arity(schema: &Schema, found: usize) -> Result<(), DatabaseError> {
    let expected = schema.data_columns().len();
    if expected == found {
        Ok(())
    } else {
        Err(DatabaseError::ArityMismatch { expected, found })
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::storage::MemoryStore;

    fn users_db() -> Database<MemoryStore> {
        let mut db = Database::new(MemoryStore::new());
        db.create_table("users", &["name:str", "age:int"]).unwrap();
        db
    }

    fn age(value: i64) -> Predicate {
        Predicate::equals("age", Value::Integer(value))
    }

    fn id(value: i64) -> Predicate {
        Predicate::equals("id", Value::Integer(value))
    }

    /// A store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: bool,
    }

    impl DocumentStore for FlakyStore {
        fn read(&self, key: &DocumentKey) -> Result<Option<String>, DatabaseError> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &DocumentKey, contents: &str) -> Result<(), DatabaseError> {
            if self.fail_writes {
                return Err(io::Error::other("disk full").into());
            }
            self.inner.write(key, contents)
        }

        fn remove(&mut self, key: &DocumentKey) -> Result<(), DatabaseError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_insert_and_select_scenario() {
        let mut db = users_db();
        assert_eq!(db.insert("users", &["Ann", "30"]).unwrap(), 1);
        assert_eq!(db.insert("users", &["Bo", "25"]).unwrap(), 2);

        let result = db.select("users", Some(&age(30))).unwrap();
        assert_eq!(result.records.len(), 1);

        let ann = &result.records[0];
        assert_eq!(ann.id(), Some(1));
        assert_eq!(ann.get("name"), Some(&Value::Text("Ann".into())));
        assert_eq!(ann.get("age"), Some(&Value::Integer(30)));
    }

    #[test]
    fn test_delete_then_insert_scenario() {
        let mut db = users_db();
        db.insert("users", &["Ann", "30"]).unwrap();
        db.insert("users", &["Bo", "25"]).unwrap();

        assert_eq!(db.delete("users", &id(1)).unwrap(), 1);

        let remaining = db.select("users", None).unwrap();
        assert_eq!(remaining.records.len(), 1);
        assert_eq!(remaining.records[0].id(), Some(2));
        assert_eq!(remaining.records[0].get("name"), Some(&Value::Text("Bo".into())));

        assert_eq!(db.insert("users", &["Cy", "40"]).unwrap(), 3);
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut db = users_db();
        let ids: Vec<i64> = (0..5)
            .map(|n| db.insert("users", &["x".to_string(), n.to_string()]).unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_select_all_matches_store_size() {
        let mut db = users_db();
        db.insert("users", &["Ann", "30"]).unwrap();
        db.insert("users", &["Bo", "25"]).unwrap();

        assert_eq!(db.select("users", None).unwrap().records.len(), 2);
        assert_eq!(db.info("users").unwrap().record_count, 2);
    }

    #[test]
    fn test_repeat_select_is_cached_until_write() {
        let mut db = users_db();
        db.insert("users", &["Ann", "30"]).unwrap();

        let first = db.select("users", Some(&age(30))).unwrap();
        let second = db.select("users", Some(&age(30))).unwrap();
        assert!(Rc::ptr_eq(&first.records, &second.records));

        db.insert("users", &["Cy", "30"]).unwrap();

        let third = db.select("users", Some(&age(30))).unwrap();
        assert!(!Rc::ptr_eq(&first.records, &third.records));
        assert_eq!(third.records.len(), 2);
    }

    #[test]
    fn test_update_and_delete_force_recompute() {
        let mut db = users_db();
        db.insert("users", &["Ann", "30"]).unwrap();
        db.insert("users", &["Bo", "25"]).unwrap();

        let before = db.select("users", None).unwrap();
        db.update("users", &Assignments::set("age", Value::Integer(31)), Some(&id(1)))
            .unwrap();
        let after_update = db.select("users", None).unwrap();
        assert!(!Rc::ptr_eq(&before.records, &after_update.records));
        assert_eq!(after_update.records[0].get("age"), Some(&Value::Integer(31)));

        db.delete("users", &id(2)).unwrap();
        let after_delete = db.select("users", None).unwrap();
        assert!(!Rc::ptr_eq(&after_update.records, &after_delete.records));
        assert_eq!(after_delete.records.len(), 1);
    }

    #[test]
    fn test_recreated_table_is_not_served_from_cache() {
        let mut db = users_db();
        db.insert("users", &["Ann", "30"]).unwrap();
        let old = db.select("users", None).unwrap();

        db.drop_table("users").unwrap();
        db.create_table("users", &["name:str", "age:int"]).unwrap();

        let new = db.select("users", None).unwrap();
        assert!(!Rc::ptr_eq(&old.records, &new.records));
        assert!(new.records.is_empty());
    }

    #[test]
    fn test_writes_matching_nothing_keep_cached_result() {
        let mut db = users_db();
        db.insert("users", &["Ann", "30"]).unwrap();
        let first = db.select("users", None).unwrap();

        let updated = db
            .update("users", &Assignments::set("age", Value::Integer(99)), Some(&id(7)))
            .unwrap();
        assert!(updated.is_empty());
        assert_eq!(db.delete("users", &id(7)).unwrap(), 0);

        let second = db.select("users", None).unwrap();
        assert!(Rc::ptr_eq(&first.records, &second.records));
    }

    #[test]
    fn test_cache_stats_count_hits_and_misses() {
        let mut db = users_db();
        db.select("users", None).unwrap();
        db.select("users", None).unwrap();
        db.select("users", Some(&age(30))).unwrap();

        let stats = db.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);

        db.insert("users", &["Ann", "30"]).unwrap();
        assert_eq!(db.cache_stats().invalidations, 1);
    }

    #[test]
    fn test_insert_after_largest_id_is_rejected() {
        let mut db = Database::new(MemoryStore::new());
        db.create_table("users", &["name:str"]).unwrap();
        db.store
            .write(
                &DocumentKey::Table("users".into()),
                r#"[{"id":9223372036854775807,"name":"Ann"}]"#,
            )
            .unwrap();

        let err = db.insert("users", &["Bo"]).unwrap_err();
        assert!(matches!(err, DatabaseError::IdentifierExhausted));
        assert_eq!(db.info("users").unwrap().record_count, 1);
    }

    #[test]
    fn test_absent_and_empty_predicate_share_cache_entry() {
        let mut db = users_db();
        let a = db.select("users", None).unwrap();
        let b = db.select("users", Some(&Predicate::new())).unwrap();
        assert!(Rc::ptr_eq(&a.records, &b.records));
    }

    #[test]
    fn test_disabled_cache_recomputes() {
        let config = DatabaseConfig {
            cache_enabled: false,
            ..DatabaseConfig::default()
        };
        let mut db = Database::with_config(MemoryStore::new(), &config);
        db.create_table("users", &["name:str"]).unwrap();

        let a = db.select("users", None).unwrap();
        let b = db.select("users", None).unwrap();
        assert!(!Rc::ptr_eq(&a.records, &b.records));
    }

    #[test]
    fn test_insert_arity_mismatch() {
        let mut db = users_db();
        let err = db.insert("users", &["Ann"]).unwrap_err();
        assert!(matches!(err, DatabaseError::ArityMismatch { expected: 2, found: 1 }));
        assert!(db.select("users", None).unwrap().records.is_empty());
    }

    #[test]
    fn test_insert_invalid_value_writes_nothing() {
        let mut db = users_db();
        let err = db.insert("users", &["Ann", "thirty"]).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidValue { .. }));
        assert_eq!(db.info("users").unwrap().record_count, 0);
    }

    #[test]
    fn test_insert_values_type_checks() {
        let mut db = users_db();
        let err = db
            .insert_values("users", vec![Value::Text("Ann".into()), Value::Boolean(true)])
            .unwrap_err();
        assert!(matches!(err, DatabaseError::TypeMismatch { .. }));

        let id = db
            .insert_values("users", vec![Value::Text("Ann".into()), Value::Integer(30)])
            .unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_unknown_table() {
        let mut db = users_db();
        assert!(matches!(
            db.insert("ghosts", &["x"]),
            Err(DatabaseError::UnknownTable(_))
        ));
        assert!(matches!(
            db.select("ghosts", None),
            Err(DatabaseError::UnknownTable(_))
        ));
        assert!(matches!(
            db.drop_table("ghosts"),
            Err(DatabaseError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_select_validates_predicate() {
        let mut db = users_db();
        assert!(matches!(
            db.select("users", Some(&Predicate::equals("email", Value::Text("x".into())))),
            Err(DatabaseError::UnknownColumn { .. })
        ));
        assert!(matches!(
            db.select("users", Some(&Predicate::equals("age", Value::Text("x".into())))),
            Err(DatabaseError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_update_matching_records() {
        let mut db = users_db();
        db.insert("users", &["Ann", "30"]).unwrap();
        db.insert("users", &["Bo", "25"]).unwrap();

        let updated = db
            .update(
                "users",
                &Assignments::set("name", Value::Text("Bob".into())),
                Some(&id(2)),
            )
            .unwrap();
        assert_eq!(updated, vec![2]);

        let bo = db.select("users", Some(&id(2))).unwrap();
        assert_eq!(bo.records[0].get("name"), Some(&Value::Text("Bob".into())));
    }

    #[test]
    fn test_update_without_matches_leaves_table_unchanged() {
        let mut db = users_db();
        db.insert("users", &["Ann", "30"]).unwrap();
        let before = db.select("users", None).unwrap();

        let updated = db
            .update("users", &Assignments::set("age", Value::Integer(99)), Some(&age(1)))
            .unwrap();
        assert!(updated.is_empty());

        let after = db.select("users", None).unwrap();
        assert_eq!(*before.records, *after.records);
    }

    #[test]
    fn test_update_rejects_unknown_and_identifier_columns() {
        let mut db = users_db();
        db.insert("users", &["Ann", "30"]).unwrap();

        assert!(matches!(
            db.update("users", &Assignments::set("email", Value::Text("a".into())), None),
            Err(DatabaseError::UnknownColumn { .. })
        ));
        assert!(matches!(
            db.update("users", &Assignments::set("id", Value::Integer(7)), None),
            Err(DatabaseError::IdentifierNotWritable)
        ));
        assert!(matches!(
            db.update("users", &Assignments::new(), None),
            Err(DatabaseError::MalformedPredicate { .. })
        ));
    }

    #[test]
    fn test_delete_requires_predicate() {
        let mut db = users_db();
        assert!(matches!(
            db.delete("users", &Predicate::new()),
            Err(DatabaseError::MalformedPredicate { .. })
        ));
    }

    #[test]
    fn test_drop_table_removes_records_and_cache() {
        let mut db = users_db();
        db.insert("users", &["Ann", "30"]).unwrap();
        db.select("users", None).unwrap();

        db.drop_table("users").unwrap();
        assert!(db.list_tables().unwrap().is_empty());
        assert_eq!(db.store().len(), 1);

        db.create_table("users", &["name:str", "age:int"]).unwrap();
        assert!(db.select("users", None).unwrap().records.is_empty());
    }

    #[test]
    fn test_table_names_are_case_normalized() {
        let mut db = Database::new(MemoryStore::new());
        db.create_table("Users", &["Name:str"]).unwrap();

        assert_eq!(db.list_tables().unwrap(), vec!["users".to_string()]);
        assert_eq!(db.insert("USERS", &["Ann"]).unwrap(), 1);

        let all = db.select("users", None).unwrap();
        assert_eq!(all.records[0].get("name"), Some(&Value::Text("Ann".into())));
    }

    #[test]
    fn test_failed_save_is_reported_and_not_observed() {
        let mut db = Database::new(FlakyStore::default());
        db.create_table("users", &["name:str", "age:int"]).unwrap();
        db.insert("users", &["Ann", "30"]).unwrap();
        db.select("users", None).unwrap();

        db.store.fail_writes = true;
        let err = db.insert("users", &["Bo", "25"]).unwrap_err();
        assert!(matches!(err, DatabaseError::StorageUnavailable(_)));

        db.store.fail_writes = false;
        let all = db.select("users", None).unwrap();
        assert_eq!(all.records.len(), 1);
        assert_eq!(db.insert("users", &["Bo", "25"]).unwrap(), 2);
    }

    #[test]
    fn test_corrupt_table_document() {
        let mut db = users_db();
        db.store
            .write(&DocumentKey::Table("users".into()), r#"[{"id":1,"name":"Ann","age":"old"}]"#)
            .unwrap();

        assert!(matches!(
            db.select("users", None),
            Err(DatabaseError::StorageCorrupt { .. })
        ));
    }
}
