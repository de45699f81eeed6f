//! Read-through memoization of SELECT results.
//!
//! Entries are grouped per table, and any write to a table drops that
//! table's whole group. There is no partial invalidation, so an entry can
//! never outlive a write to its table.

use std::{collections::HashMap, rc::Rc};

use tracing::trace;

pub mod stats;

pub use stats::CacheStats;

/// Two-level cache: table name → (predicate key → shared result).
///
/// Results are handed out as [`Rc`], so two lookups between writes return
/// the same allocation.
///
/// # Example
///
/// ```
/// use primdb::ResultCache;
///
/// let mut cache: ResultCache<Vec<i32>> = ResultCache::new();
///
/// let first = cache.get_or_compute("users", "{}", || Ok::<_, ()>(vec![1, 2])).unwrap();
/// let second = cache.get_or_compute("users", "{}", || Ok::<_, ()>(vec![9])).unwrap();
/// assert!(std::rc::Rc::ptr_eq(&first, &second));
///
/// cache.invalidate("users");
/// let third = cache.get_or_compute("users", "{}", || Ok::<_, ()>(vec![3])).unwrap();
/// assert_eq!(*third, vec![3]);
/// ```
#[derive(Debug)]
pub struct ResultCache<R> {
    tables: HashMap<String, HashMap<String, Rc<R>>>,
    enabled: bool,
    stats: CacheStats,
}

impl<R> Default for ResultCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ResultCache<R> {
    /// Creates an enabled, empty cache.
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            enabled: true,
            stats: CacheStats::default(),
        }
    }

    /// Creates a cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Returns the cached result for `(table, key)`, computing and storing it
    /// on a miss. A failed computation stores nothing.
    pub fn get_or_compute<E, F>(
        &mut self,
        table: &str,
        key: &str,
        compute: F,
    ) -> Result<Rc<R>, E>
    where
        F: FnOnce() -> Result<R, E>,
    {
        if !self.enabled {
            self.stats.misses += 1;
            return compute().map(Rc::new);
        }

        let entries = self.tables.entry(table.to_owned()).or_default();
        if let Some(hit) = entries.get(key) {
            self.stats.hits += 1;
            trace!(table, key, "result cache hit");
            return Ok(Rc::clone(hit));
        }

        self.stats.misses += 1;
        trace!(table, key, "result cache miss");

        let result = Rc::new(compute()?);
        entries.insert(key.to_owned(), Rc::clone(&result));
        Ok(result)
    }

    /// Looks up an entry without computing.
    pub fn get(&self, table: &str, key: &str) -> Option<Rc<R>> {
        self.tables.get(table)?.get(key).cloned()
    }

    /// Drops every entry for `table`. No-op for unseen tables.
    pub fn invalidate(&mut self, table: &str) {
        if self.tables.remove(table).is_some() {
            self.stats.invalidations += 1;
            trace!(table, "result cache invalidated");
        }
    }

    /// Total number of cached results across all tables.
    pub fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
