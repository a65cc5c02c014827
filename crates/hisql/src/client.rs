//! Execution facade.
//!
//! [`SqlClient`] ties the pieces together for every call: build the statement,
//! acquire a connection, bind and run, release, then materialize or count.

use crate::builder::{SqlBuilder, Statement, question_marks};
use crate::cache::StatementCache;
use crate::config::ClientConfig;
use crate::connection::{ConnectionSource, PooledConnection};
use crate::dialect::{DbVersion, SqlDialect};
use crate::entity::{Entity, MetadataResolver};
use crate::error::{BoxError, OrmError, OrmResult};
use crate::log::SqlLogger;
use crate::row::{FromRow, Row};
use crate::value::Value;
use std::sync::Arc;

/// Synchronous mapping client over an external [`ConnectionSource`].
///
/// The client is `Send + Sync` whenever the source is, and can be shared behind an
/// `Arc`. Each call holds one connection for exactly one statement.
pub struct SqlClient<S> {
    source: S,
    db_version: DbVersion,
    dialect: &'static dyn SqlDialect,
    cache: Arc<StatementCache>,
    resolver: MetadataResolver,
    logger: SqlLogger,
}

impl<S: ConnectionSource> SqlClient<S> {
    /// Create a client with its own statement cache.
    pub fn new(source: S, config: ClientConfig) -> Self {
        let cache = match config.statement_cache.capacity {
            Some(capacity) => StatementCache::with_capacity(capacity),
            None => StatementCache::new(),
        };
        Self::with_cache(source, config, Arc::new(cache))
    }

    /// Create a client sharing an existing statement cache.
    ///
    /// Cached text depends on the dialect-independent statement shape and the
    /// identifier case policy, so clients sharing a cache must agree on the latter.
    pub fn with_cache(source: S, config: ClientConfig, cache: Arc<StatementCache>) -> Self {
        Self {
            source,
            db_version: config.db_version,
            dialect: config.db_version.dialect(),
            cache,
            resolver: MetadataResolver::new(config.identifier_case),
            logger: SqlLogger::new(config.log_sql, config.max_logged_sql_length),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn db_version(&self) -> DbVersion {
        self.db_version
    }

    pub fn cache(&self) -> &Arc<StatementCache> {
        &self.cache
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    /// Toggle verbose SQL logging.
    pub fn set_log_sql(&self, enabled: bool) {
        self.logger.set_enabled(enabled);
    }

    pub fn is_log_sql(&self) -> bool {
        self.logger.is_enabled()
    }

    pub fn builder(&self) -> SqlBuilder<'_> {
        SqlBuilder::new(self.dialect, &self.cache, &self.resolver)
    }

    /// `n` comma-separated `?` placeholders, `None` when `n` is zero.
    pub fn question_marks(&self, n: usize) -> Option<String> {
        question_marks(n)
    }

    // ── execution primitives ────────────────────────────────────────────────

    fn prepare(&self, operation: &'static str, stmt: &Statement) -> Vec<Value> {
        let args: Vec<Value> = stmt
            .args
            .iter()
            .cloned()
            .map(|v| self.dialect.convert_arg(v))
            .collect();
        self.logger
            .statement(self.dialect.name(), operation, &stmt.sql, &args);
        args
    }

    fn fail(&self, operation: &'static str, sql: &str, err: BoxError) -> OrmError {
        self.logger.failure(operation, sql, &*err);
        OrmError::execution(operation, None, err)
    }

    fn fetch_rows(&self, operation: &'static str, stmt: &Statement) -> OrmResult<Vec<Row>> {
        let args = self.prepare(operation, stmt);
        let mut conn =
            PooledConnection::acquire(&self.source).map_err(|e| self.fail(operation, &stmt.sql, e))?;
        conn.query(&stmt.sql, &args)
            .map_err(|e| self.fail(operation, &stmt.sql, e))
    }

    fn run_query<T: FromRow>(&self, operation: &'static str, stmt: &Statement) -> OrmResult<Vec<T>> {
        self.fetch_rows(operation, stmt)?
            .into_iter()
            .map(T::from_row)
            .collect::<OrmResult<Vec<T>>>()
            .map_err(|e| e.in_operation(operation))
    }

    /// Run a statement, returning the affected count and any generated key.
    fn run_execute(
        &self,
        operation: &'static str,
        stmt: &Statement,
    ) -> OrmResult<(u64, Option<i64>)> {
        let args = self.prepare(operation, stmt);
        let mut conn =
            PooledConnection::acquire(&self.source).map_err(|e| self.fail(operation, &stmt.sql, e))?;
        let affected = conn
            .execute(&stmt.sql, &args)
            .map_err(|e| self.fail(operation, &stmt.sql, e))?;
        Ok((affected, conn.last_insert_id()))
    }

    fn execute_for<T: Entity>(&self, operation: &'static str, stmt: &Statement) -> OrmResult<u64> {
        self.run_execute(operation, stmt)
            .map(|(affected, _)| affected)
            .map_err(|e| e.in_context(operation, T::descriptor().type_name))
    }

    fn query_for<T: Entity>(&self, operation: &'static str, stmt: &Statement) -> OrmResult<Vec<T>> {
        self.run_query(operation, stmt)
            .map_err(|e| e.in_context(operation, T::descriptor().type_name))
    }

    // ── raw SQL ─────────────────────────────────────────────────────────────

    /// Run a query and materialize every row.
    pub fn query<T: FromRow>(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<T>> {
        self.run_query("query", &Statement::new(sql, args.to_vec()))
    }

    /// Run a query restricted to one page starting at the 1-based `start_row`.
    pub fn query_paged<T: FromRow>(
        &self,
        sql: &str,
        args: &[Value],
        start_row: u32,
        count: u32,
    ) -> OrmResult<Vec<T>> {
        let stmt = self
            .builder()
            .paginate(Statement::new(sql, args.to_vec()), start_row, count);
        self.run_query("query_paged", &stmt)
    }

    /// Run a query and materialize its first row, if any.
    pub fn query_for_object<T: FromRow>(&self, sql: &str, args: &[Value]) -> OrmResult<Option<T>> {
        let rows = self.fetch_rows("query_for_object", &Statement::new(sql, args.to_vec()))?;
        rows.into_iter()
            .next()
            .map(T::from_row)
            .transpose()
            .map_err(|e| e.in_operation("query_for_object"))
    }

    /// Run a statement and return the affected row count.
    pub fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<u64> {
        self.run_execute("execute", &Statement::new(sql, args.to_vec()))
            .map(|(affected, _)| affected)
    }

    // ── entity operations ───────────────────────────────────────────────────

    /// Load one entity by key.
    pub fn get<T: Entity>(&self, key: i64) -> OrmResult<Option<T>> {
        let stmt = self.builder().select_by_key::<T>(key)?;
        Ok(self.query_for::<T>("get", &stmt)?.into_iter().next())
    }

    /// Load the entities whose keys are listed. An empty list is an error.
    pub fn get_many<T: Entity>(&self, keys: &[i64]) -> OrmResult<Vec<T>> {
        let stmt = self.builder().select_by_keys::<T>(keys)?;
        self.query_for("get_many", &stmt)
    }

    /// Load the entities matching every `column = value` pair.
    ///
    /// No predicates means no query: the result is empty.
    pub fn get_by<T: Entity>(&self, predicates: &[(&str, Value)]) -> OrmResult<Vec<T>> {
        match self.builder().select_by_predicates::<T>(predicates)? {
            Some(stmt) => self.query_for("get_by", &stmt),
            None => Ok(Vec::new()),
        }
    }

    /// Paged variant of [`SqlClient::get_by`].
    pub fn get_by_paged<T: Entity>(
        &self,
        predicates: &[(&str, Value)],
        start_row: u32,
        count: u32,
    ) -> OrmResult<Vec<T>> {
        let builder = self.builder();
        match builder.select_by_predicates::<T>(predicates)? {
            Some(stmt) => self.query_for("get_by_paged", &builder.paginate(stmt, start_row, count)),
            None => Ok(Vec::new()),
        }
    }

    /// Insert an entity. When the driver reports a generated key it is written back
    /// into the entity.
    pub fn insert<T: Entity>(&self, entity: &mut T) -> OrmResult<u64> {
        let stmt = self.builder().insert(entity)?;
        let (affected, generated) = self
            .run_execute("insert", &stmt)
            .map_err(|e| e.in_context("insert", T::descriptor().type_name))?;
        if let Some(key) = generated {
            entity.set_key_value(key)?;
        }
        Ok(affected)
    }

    /// Update every persistent field of an entity.
    pub fn update<T: Entity>(&self, entity: &T) -> OrmResult<u64> {
        let stmt = self.builder().update_all(entity)?;
        self.execute_for::<T>("update", &stmt)
    }

    /// Update only the named fields of an entity.
    pub fn update_fields<T: Entity>(&self, entity: &T, fields: &[&str]) -> OrmResult<u64> {
        let stmt = self.builder().update_fields(entity, fields)?;
        self.execute_for::<T>("update_fields", &stmt)
    }

    /// Update the row with the given key from `column = value` pairs.
    ///
    /// No pairs means no statement: the result is 0.
    pub fn update_by_map<T: Entity>(&self, key: i64, values: &[(&str, Value)]) -> OrmResult<u64> {
        match self.builder().update_by_map::<T>(key, values)? {
            Some(stmt) => self.execute_for::<T>("update_by_map", &stmt),
            None => Ok(0),
        }
    }

    /// Delete the row with the given key.
    pub fn delete<T: Entity>(&self, key: i64) -> OrmResult<u64> {
        let stmt = self.builder().delete_by_key::<T>(key)?;
        self.execute_for::<T>("delete", &stmt)
    }

    /// Delete the rows with the given keys. An empty list deletes nothing.
    pub fn delete_many<T: Entity>(&self, keys: &[i64]) -> OrmResult<u64> {
        match self.builder().delete_by_keys::<T>(keys)? {
            Some(stmt) => self.execute_for::<T>("delete_many", &stmt),
            None => Ok(0),
        }
    }

    // ── literal SQL ─────────────────────────────────────────────────────────

    /// A fully literal `INSERT` for one entity, for bulk-load scripts.
    pub fn insert_literal_sql<T: Entity>(&self, entity: &T) -> OrmResult<String> {
        self.builder().insert_literal(entity)
    }

    /// One literal `INSERT` per entity, joined with `separator`.
    pub fn bulk_insert_literal_sql<T: Entity>(
        &self,
        entities: &[T],
        separator: &str,
    ) -> OrmResult<String> {
        self.builder().bulk_insert_literal(entities, separator)
    }
}

impl<S> std::fmt::Debug for SqlClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlClient")
            .field("db_version", &self.db_version)
            .field("cache", &self.cache.stats())
            .field("log_sql", &self.logger.is_enabled())
            .finish_non_exhaustive()
    }
}
