use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::MappingResult;
use crate::partition::PartitionPrefix;
use crate::rule::Rule;

/// Resolved mapping of one table onto its matched rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingInfo {
    /// The rule that applies to the table.
    pub rule: Arc<Rule>,
    /// Index of the rule's source column, or [`None`] if the rule reads its target column.
    pub source_position: Option<usize>,
    /// Index of the rule's target column.
    pub target_position: usize,
    /// Pre-shifted shard identity, all zero unless the rule packs partition ids.
    pub partition: PartitionPrefix,
}

impl MappingInfo {
    /// Returns the index of the column the expression reads.
    ///
    /// `PartitionId` packs the target's own value, so its source column is never read.
    pub fn input_position(&self) -> usize {
        match self.source_position {
            Some(position) if !self.rule.is_partition_id() => position,
            _ => self.target_position,
        }
    }
}

/// Cached outcome of matching a table against the rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnInfo {
    /// No rule applies; rows and DDL pass through untouched.
    NoMatch,
    /// A rule applies with the given resolved mapping.
    Matched(MappingInfo),
}

impl ColumnInfo {
    /// Returns the resolved mapping if a rule matched.
    pub fn mapping(&self) -> Option<&MappingInfo> {
        match self {
            ColumnInfo::NoMatch => None,
            ColumnInfo::Matched(info) => Some(info),
        }
    }
}

/// Storage for the cache, keyed by schema then table so lookups need no allocation.
#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, HashMap<String, Arc<ColumnInfo>>>,
}

impl Inner {
    fn get(&self, schema: &str, table: &str) -> Option<&Arc<ColumnInfo>> {
        self.tables.get(schema)?.get(table)
    }

    fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }
}

/// Thread-safe memo of [`ColumnInfo`] per (schema, table).
///
/// Negative outcomes are cached too, since most tables in a merge have no rule. Entries live
/// until [`MappingCache::remove`] or [`MappingCache::clear`]; the key space is bounded by the
/// number of source tables. Failed resolutions are not cached.
#[derive(Debug, Default)]
pub struct MappingCache {
    inner: RwLock<Inner>,
}

impl MappingCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry for the table.
    pub fn get(&self, schema: &str, table: &str) -> Option<Arc<ColumnInfo>> {
        self.inner.read().get(schema, table).cloned()
    }

    /// Returns the cached entry for the table, computing and storing it on a miss.
    ///
    /// Lookups take the shared lock. A miss takes the upgradable lock, which admits concurrent
    /// readers but only one resolver, so concurrent misses for one table run `resolve` once.
    /// Misses for different tables are serialized as well, while hits keep being served. Each
    /// table misses once per cache generation, so resolution stays off the steady-state path.
    /// The lock is released before returning.
    pub fn get_or_try_insert_with<F>(
        &self,
        schema: &str,
        table: &str,
        resolve: F,
    ) -> MappingResult<Arc<ColumnInfo>>
    where
        F: FnOnce() -> MappingResult<ColumnInfo>,
    {
        if let Some(info) = self.get(schema, table) {
            return Ok(info);
        }

        let inner = self.inner.upgradable_read();
        if let Some(info) = inner.get(schema, table) {
            return Ok(Arc::clone(info));
        }

        let info = Arc::new(resolve()?);

        let mut inner = RwLockUpgradableReadGuard::upgrade(inner);
        inner
            .tables
            .entry(schema.to_string())
            .or_default()
            .insert(table.to_string(), Arc::clone(&info));

        Ok(info)
    }

    /// Removes the entry for one table, returning whether it was cached.
    pub fn remove(&self, schema: &str, table: &str) -> bool {
        let mut inner = self.inner.write();
        let Some(tables) = inner.tables.get_mut(schema) else {
            return false;
        };

        let removed = tables.remove(table).is_some();
        if tables.is_empty() {
            inner.tables.remove(schema);
        }

        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.write().tables.clear();
    }

    /// Returns the number of cached tables.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.inner.read().tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mapping_error;
    use crate::types::Expression;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    fn matched() -> ColumnInfo {
        ColumnInfo::Matched(MappingInfo {
            rule: Arc::new(Rule::new(
                "test*",
                "xxx*",
                "",
                "id",
                Expression::AddPrefix,
                ["instance_id:"],
            )),
            source_position: None,
            target_position: 1,
            partition: PartitionPrefix::default(),
        })
    }

    #[test]
    fn test_negative_and_positive_entries() {
        let cache = MappingCache::new();
        assert!(cache.is_empty());

        let info = cache
            .get_or_try_insert_with("abc", "xxx", || Ok(ColumnInfo::NoMatch))
            .unwrap();
        assert_eq!(*info, ColumnInfo::NoMatch);
        assert!(info.mapping().is_none());

        let info = cache
            .get_or_try_insert_with("test", "xxx", || Ok(matched()))
            .unwrap();
        assert_eq!(info.mapping().unwrap().target_position, 1);
        assert_eq!(cache.len(), 2);

        // Hits never call the resolver.
        let info = cache
            .get_or_try_insert_with("test", "xxx", || panic!("resolved twice"))
            .unwrap();
        assert_eq!(*info, matched());
    }

    #[test]
    fn test_hits_are_served_while_another_table_resolves() {
        let cache = MappingCache::new();
        cache
            .get_or_try_insert_with("test", "xxx", || Ok(matched()))
            .unwrap();

        let info = cache
            .get_or_try_insert_with("abc", "xxx", || {
                assert_eq!(cache.get("test", "xxx").as_deref(), Some(&matched()));
                Ok(ColumnInfo::NoMatch)
            })
            .unwrap();
        assert_eq!(*info, ColumnInfo::NoMatch);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_keys_are_exact() {
        let cache = MappingCache::new();
        cache
            .get_or_try_insert_with("test", "xxx", || Ok(matched()))
            .unwrap();

        assert!(cache.get("test", "xxx").is_some());
        assert!(cache.get("Test", "xxx").is_none());
        assert!(cache.get("testx", "xx").is_none());
        assert!(cache.get("test", "xxx ").is_none());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = MappingCache::new();
        let err = cache
            .get_or_try_insert_with("test", "xxx", || {
                Err(mapping_error!(ErrorKind::ColumnNotFound, "Column not found"))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ColumnNotFound);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = MappingCache::new();
        for table in ["a", "b"] {
            cache
                .get_or_try_insert_with("s", table, || Ok(ColumnInfo::NoMatch))
                .unwrap();
        }

        assert!(cache.remove("s", "a"));
        assert!(!cache.remove("s", "a"));
        assert!(!cache.remove("other", "a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("s", "b").is_none());
    }

    #[test]
    fn test_concurrent_misses_resolve_once() {
        let cache = MappingCache::new();
        let resolutions = AtomicUsize::new(0);
        let barrier = Barrier::new(8);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    barrier.wait();
                    let info = cache
                        .get_or_try_insert_with("test", "xxx", || {
                            resolutions.fetch_add(1, Ordering::SeqCst);
                            Ok(matched())
                        })
                        .unwrap();
                    assert_eq!(*info, matched());
                });
            }
        });

        assert_eq!(resolutions.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }
}
