//! Driver rows and row mapping.

use crate::coerce::FromValue;
use crate::entity::Entity;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// One result row as handed back by a driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row from parallel column name and value lists. Extra entries on the
    /// longer side are dropped.
    pub fn new(mut columns: Vec<String>, mut values: Vec<Value>) -> Self {
        let n = columns.len().min(values.len());
        columns.truncate(n);
        values.truncate(n);
        Self { columns, values }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at a 0-based position.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Value of a column, matched case-insensitively.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|i| self.values.get(i))
    }

    /// Consume the row into a lower-cased column name map. Later duplicates win.
    pub fn into_lowercase_map(self) -> HashMap<String, Value> {
        self.columns
            .into_iter()
            .map(|c| c.to_lowercase())
            .zip(self.values)
            .collect()
    }

    fn into_first(self) -> Option<Value> {
        self.values.into_iter().next()
    }
}

/// Types that can be built from a result row.
pub trait FromRow: Sized {
    fn from_row(row: Row) -> OrmResult<Self>;
}

/// Entities are filled field by field from a lower-cased column map. Null columns
/// and columns without a matching field are skipped. A value the field cannot hold
/// fails with [`OrmError::FieldMapping`].
impl<T: Entity> FromRow for T {
    fn from_row(row: Row) -> OrmResult<Self> {
        let mut map = row.into_lowercase_map();
        let mut entity = T::default();
        let desc = T::descriptor();
        for field in desc.fields {
            let Some(column) = field.declared_column() else {
                continue;
            };
            match map.remove(&column.to_lowercase()) {
                Some(value) if !value.is_null() => entity
                    .set_field_value(field.name, value)
                    .map_err(|e| OrmError::field_mapping(desc.type_name, field.name, e))?,
                _ => {}
            }
        }
        Ok(entity)
    }
}

macro_rules! impl_scalar_from_row {
    ($($ty:ty),* $(,)?) => {
        $(
            /// Reads the first column.
            impl FromRow for $ty {
                fn from_row(row: Row) -> OrmResult<Self> {
                    let value = row.into_first().unwrap_or(Value::Null);
                    <$ty>::from_value(value)
                }
            }
        )*
    };
}

impl_scalar_from_row!(
    i8,
    i16,
    i32,
    i64,
    f32,
    f64,
    bool,
    String,
    NaiveDate,
    NaiveDateTime,
    Vec<u8>,
    Value,
);

#[cfg(feature = "rust_decimal")]
impl_scalar_from_row!(rust_decimal::Decimal);

/// First column, `None` when it is null or the row has no columns.
impl<T: FromValue> FromRow for Option<T> {
    fn from_row(row: Row) -> OrmResult<Self> {
        match row.into_first() {
            Some(value) => Option::<T>::from_value(value),
            None => Ok(None),
        }
    }
}
