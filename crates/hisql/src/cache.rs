//! Generated statement cache.
//!
//! Statement text for the fixed-shape operations depends only on the entity type and
//! the operation, so it is built once and shared. Builders compute text outside the
//! lock and insert it only if absent; two threads racing on the same key both produce
//! identical text and one of them wins.

use crate::error::OrmResult;
use std::any::TypeId;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Fixed-shape statements that can be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementOp {
    SelectByKey,
    /// `IN` list with the given number of slots.
    SelectByKeys(usize),
    Insert,
    UpdateAll,
    DeleteByKey,
    DeleteByKeys(usize),
    /// Column list shared by literal inserts.
    LiteralInsertColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementKey {
    pub entity: TypeId,
    pub op: StatementOp,
}

impl StatementKey {
    pub fn of<T: 'static>(op: StatementOp) -> Self {
        Self {
            entity: TypeId::of::<T>(),
            op,
        }
    }
}

/// Immutable statement text plus the fields bound to its slots, in slot order.
///
/// `slots` is empty for statements whose arguments are supplied by the caller (keys).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStatement {
    pub sql: Arc<str>,
    pub slots: Vec<&'static str>,
}

impl GeneratedStatement {
    pub fn new(sql: impl Into<Arc<str>>, slots: Vec<&'static str>) -> Self {
        Self {
            sql: sql.into(),
            slots,
        }
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Concurrent `(entity type, operation) -> statement` cache.
///
/// Unbounded unless a capacity is given; a bounded cache evicts the oldest entry.
#[derive(Debug, Default)]
pub struct StatementCache {
    inner: RwLock<CacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Default)]
struct CacheInner {
    capacity: Option<usize>,
    map: HashMap<StatementKey, Arc<GeneratedStatement>>,
    order: VecDeque<StatementKey>,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` statements. Zero disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                capacity: Some(capacity),
                ..CacheInner::default()
            }),
            ..Self::default()
        }
    }

    pub fn get(&self, key: &StatementKey) -> Option<Arc<GeneratedStatement>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.map.get(key).cloned()
    }

    /// Insert unless an entry already exists; returns the entry that ends up cached.
    pub fn insert_if_absent(
        &self,
        key: StatementKey,
        stmt: GeneratedStatement,
    ) -> Arc<GeneratedStatement> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = inner.map.get(&key) {
            return Arc::clone(existing);
        }
        let stmt = Arc::new(stmt);
        inner.map.insert(key, Arc::clone(&stmt));
        inner.order.push_back(key);
        inner.evict_if_needed();
        stmt
    }

    /// Return the cached statement or build, insert and return it.
    ///
    /// `build` runs without any lock held. Errors are returned and nothing is cached.
    pub fn get_or_try_insert_with<F>(
        &self,
        key: StatementKey,
        build: F,
    ) -> OrmResult<Arc<GeneratedStatement>>
    where
        F: FnOnce() -> OrmResult<GeneratedStatement>,
    {
        if let Some(stmt) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(stmt);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(target: "hisql.sql", op = ?key.op, "statement cache miss");
        let stmt = build()?;
        Ok(self.insert_if_absent(key, stmt))
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl CacheInner {
    fn evict_if_needed(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };
        while self.map.len() > capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.map.remove(&oldest);
        }
    }
}
