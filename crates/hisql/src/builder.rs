//! SQL statement construction.
//!
//! [`SqlBuilder`] turns entity metadata into statement text plus an ordered argument
//! list. Statements whose text depends only on the entity type go through the
//! [`StatementCache`]; statements shaped by caller input are built fresh.

use crate::cache::{GeneratedStatement, StatementCache, StatementKey, StatementOp};
use crate::coerce::render_literal;
use crate::dialect::SqlDialect;
use crate::entity::{Entity, EntityMeta, MetadataResolver};
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::value::Value;
use std::sync::Arc;

/// Statement text with its bound arguments in `?`-slot order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: Arc<str>,
    pub args: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<Arc<str>>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// `n` comma-separated `?` placeholders, `None` when `n` is zero.
pub fn question_marks(n: usize) -> Option<String> {
    if n < 1 {
        return None;
    }
    let mut out = String::with_capacity(n * 2 - 1);
    for i in 0..n {
        if i > 0 {
            out.push(',');
        }
        out.push('?');
    }
    Some(out)
}

fn key_args(keys: &[i64]) -> Vec<Value> {
    keys.iter().copied().map(Value::BigInt).collect()
}

/// Read the bound fields of an entity in slot order. Absent fields bind as null.
fn slot_args<T: Entity>(entity: &T, slots: &[&'static str]) -> Vec<Value> {
    slots
        .iter()
        .map(|f| entity.field_value(f).unwrap_or(Value::Null))
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct SqlBuilder<'a> {
    dialect: &'a dyn SqlDialect,
    cache: &'a StatementCache,
    resolver: &'a MetadataResolver,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(
        dialect: &'a dyn SqlDialect,
        cache: &'a StatementCache,
        resolver: &'a MetadataResolver,
    ) -> Self {
        Self {
            dialect,
            cache,
            resolver,
        }
    }

    pub fn dialect(&self) -> &'a dyn SqlDialect {
        self.dialect
    }

    fn meta<T: Entity>(&self) -> OrmResult<EntityMeta> {
        self.resolver.resolve(T::descriptor())
    }

    fn cached<T: Entity>(
        &self,
        op: StatementOp,
        build: impl FnOnce(EntityMeta) -> OrmResult<GeneratedStatement>,
    ) -> OrmResult<Arc<GeneratedStatement>> {
        self.cache
            .get_or_try_insert_with(StatementKey::of::<T>(op), || build(self.meta::<T>()?))
    }

    /// `SELECT * FROM t WHERE k=?`
    pub fn select_by_key<T: Entity>(&self, key: i64) -> OrmResult<Statement> {
        let stmt = self.cached::<T>(StatementOp::SelectByKey, |m| {
            Ok(GeneratedStatement::new(
                format!("SELECT * FROM {} WHERE {}=?", m.table, m.key),
                vec![],
            ))
        })?;
        Ok(Statement::new(Arc::clone(&stmt.sql), vec![Value::BigInt(key)]))
    }

    /// `SELECT * FROM t WHERE k IN (?,..)`
    pub fn select_by_keys<T: Entity>(&self, keys: &[i64]) -> OrmResult<Statement> {
        let Some(marks) = question_marks(keys.len()) else {
            return Err(OrmError::EmptyKeySet {
                entity: T::descriptor().type_name,
                operation: "select_by_keys",
            });
        };
        let stmt = self.cached::<T>(StatementOp::SelectByKeys(keys.len()), |m| {
            Ok(GeneratedStatement::new(
                format!("SELECT * FROM {} WHERE {} IN ({marks})", m.table, m.key),
                vec![],
            ))
        })?;
        Ok(Statement::new(Arc::clone(&stmt.sql), key_args(keys)))
    }

    /// `SELECT * FROM t WHERE c1=? AND c2=?` in predicate order.
    ///
    /// Returns `None` when there are no predicates.
    pub fn select_by_predicates<T: Entity>(
        &self,
        predicates: &[(&str, Value)],
    ) -> OrmResult<Option<Statement>> {
        if predicates.is_empty() {
            return Ok(None);
        }
        let meta = self.meta::<T>()?;
        let mut sql = format!("SELECT * FROM {} WHERE ", meta.table);
        let mut args = Vec::with_capacity(predicates.len());
        for (i, (column, value)) in predicates.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            sql.push_str(ident::column(column)?);
            sql.push_str("=?");
            args.push(value.clone());
        }
        Ok(Some(Statement::new(sql, args)))
    }

    /// Rewrite a statement to return one page starting at the 1-based `start_row`.
    /// Page arguments follow the existing ones.
    pub fn paginate(&self, stmt: Statement, start_row: u32, count: u32) -> Statement {
        let sql = self.dialect.paginate(&stmt.sql);
        let mut args = stmt.args;
        args.extend(self.dialect.page_args(start_row, count));
        Statement::new(sql, args)
    }

    /// `INSERT INTO t (c1,c2) VALUES (?,?)` over the non-key persistent fields.
    pub fn insert<T: Entity>(&self, entity: &T) -> OrmResult<Statement> {
        let stmt = self.cached::<T>(StatementOp::Insert, |m| {
            let (columns, slots): (Vec<_>, Vec<_>) = m
                .value_columns()
                .map(|c| (c.column.as_str(), c.field))
                .unzip();
            let marks = question_marks(columns.len()).ok_or(OrmError::NoPersistentFields {
                entity: m.entity,
            })?;
            Ok(GeneratedStatement::new(
                format!("INSERT INTO {} ({}) VALUES ({marks})", m.table, columns.join(",")),
                slots,
            ))
        })?;
        Ok(Statement::new(
            Arc::clone(&stmt.sql),
            slot_args(entity, &stmt.slots),
        ))
    }

    /// `UPDATE t SET c1=?,c2=? WHERE k=?` over the non-key persistent fields, key last.
    pub fn update_all<T: Entity>(&self, entity: &T) -> OrmResult<Statement> {
        let key = require_key(entity, "update")?;
        let stmt = self.cached::<T>(StatementOp::UpdateAll, |m| {
            let (sets, slots): (Vec<_>, Vec<_>) = m
                .value_columns()
                .map(|c| (format!("{}=?", c.column), c.field))
                .unzip();
            if sets.is_empty() {
                return Err(OrmError::NoPersistentFields { entity: m.entity });
            }
            Ok(GeneratedStatement::new(
                format!("UPDATE {} SET {} WHERE {}=?", m.table, sets.join(","), m.key),
                slots,
            ))
        })?;
        let mut args = slot_args(entity, &stmt.slots);
        args.push(Value::BigInt(key));
        Ok(Statement::new(Arc::clone(&stmt.sql), args))
    }

    /// Update only the named fields. Names equal to the key are skipped.
    pub fn update_fields<T: Entity>(&self, entity: &T, fields: &[&str]) -> OrmResult<Statement> {
        let key = require_key(entity, "update_fields")?;
        let meta = self.meta::<T>()?;
        let mut sets = Vec::with_capacity(fields.len());
        let mut args = Vec::with_capacity(fields.len() + 1);
        for name in fields {
            let name = name.trim();
            if meta.is_key(name) {
                continue;
            }
            let mapping = meta.find(name).ok_or_else(|| OrmError::UnknownField {
                entity: meta.entity,
                field: name.to_string(),
            })?;
            sets.push(format!("{}=?", mapping.column));
            args.push(entity.field_value(mapping.field).unwrap_or(Value::Null));
        }
        if sets.is_empty() {
            return Err(OrmError::NoUpdatableFields {
                entity: meta.entity,
            });
        }
        args.push(Value::BigInt(key));
        Ok(Statement::new(
            format!("UPDATE {} SET {} WHERE {}=?", meta.table, sets.join(","), meta.key),
            args,
        ))
    }

    /// `UPDATE t SET c1=?,.. WHERE k=?` from column/value pairs, key last.
    ///
    /// Returns `None` when there is nothing to set.
    pub fn update_by_map<T: Entity>(
        &self,
        key: i64,
        values: &[(&str, Value)],
    ) -> OrmResult<Option<Statement>> {
        if values.is_empty() {
            return Ok(None);
        }
        let meta = self.meta::<T>()?;
        let mut sets = Vec::with_capacity(values.len());
        let mut args = Vec::with_capacity(values.len() + 1);
        for (column, value) in values {
            sets.push(format!("{}=?", ident::column(column)?));
            args.push(value.clone());
        }
        args.push(Value::BigInt(key));
        Ok(Some(Statement::new(
            format!("UPDATE {} SET {} WHERE {}=?", meta.table, sets.join(","), meta.key),
            args,
        )))
    }

    /// `DELETE FROM t WHERE k=?`
    pub fn delete_by_key<T: Entity>(&self, key: i64) -> OrmResult<Statement> {
        let stmt = self.cached::<T>(StatementOp::DeleteByKey, |m| {
            Ok(GeneratedStatement::new(
                format!("DELETE FROM {} WHERE {}=?", m.table, m.key),
                vec![],
            ))
        })?;
        Ok(Statement::new(Arc::clone(&stmt.sql), vec![Value::BigInt(key)]))
    }

    /// `DELETE FROM t WHERE k IN (?,..)`, `None` for an empty key list.
    pub fn delete_by_keys<T: Entity>(&self, keys: &[i64]) -> OrmResult<Option<Statement>> {
        let Some(marks) = question_marks(keys.len()) else {
            return Ok(None);
        };
        let stmt = self.cached::<T>(StatementOp::DeleteByKeys(keys.len()), |m| {
            Ok(GeneratedStatement::new(
                format!("DELETE FROM {} WHERE {} IN ({marks})", m.table, m.key),
                vec![],
            ))
        })?;
        Ok(Some(Statement::new(Arc::clone(&stmt.sql), key_args(keys))))
    }

    /// `INSERT INTO t (c1,c2) ` prefix shared by literal inserts, over every persistent
    /// field including the key.
    fn literal_prefix<T: Entity>(&self) -> OrmResult<Arc<GeneratedStatement>> {
        self.cached::<T>(StatementOp::LiteralInsertColumns, |m| {
            if m.columns.is_empty() {
                return Err(OrmError::NoPersistentFields { entity: m.entity });
            }
            let (columns, slots): (Vec<_>, Vec<_>) = m
                .columns
                .iter()
                .map(|c| (c.column.as_str(), c.field))
                .unzip();
            Ok(GeneratedStatement::new(
                format!("INSERT INTO {} ({})", m.table, columns.join(",")),
                slots,
            ))
        })
    }

    fn literal_values<T: Entity>(&self, entity: &T, slots: &[&'static str]) -> String {
        slot_args(entity, slots)
            .iter()
            .map(|v| render_literal(v, self.dialect))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// A fully literal `INSERT` for one entity.
    pub fn insert_literal<T: Entity>(&self, entity: &T) -> OrmResult<String> {
        let prefix = self.literal_prefix::<T>()?;
        Ok(format!(
            "{} VALUES ({})",
            prefix.sql,
            self.literal_values(entity, &prefix.slots)
        ))
    }

    /// One literal `INSERT` per entity, joined with `separator`.
    pub fn bulk_insert_literal<T: Entity>(
        &self,
        entities: &[T],
        separator: &str,
    ) -> OrmResult<String> {
        if entities.is_empty() {
            return Ok(String::new());
        }
        let prefix = self.literal_prefix::<T>()?;
        let statements: Vec<String> = entities
            .iter()
            .map(|e| format!("{} VALUES ({})", prefix.sql, self.literal_values(e, &prefix.slots)))
            .collect();
        Ok(statements.join(separator))
    }
}

fn require_key<T: Entity>(entity: &T, operation: &'static str) -> OrmResult<i64> {
    entity.key_value().ok_or(OrmError::EmptyKeyValue {
        entity: T::descriptor().type_name,
        operation,
    })
}
